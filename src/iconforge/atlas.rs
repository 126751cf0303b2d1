use crate::{
    config::Quality,
    error::{Error, Result},
};
use image::RgbaImage;
use indexmap::IndexMap;
use serde::Deserialize;
use std::{collections::HashMap, path::Path};
use tracy_full::zone;

/// A sprite sheet and the named regions inside it.
#[derive(Debug)]
pub struct Atlas {
    pub base_name: String,
    pub quality: Quality,
    pub sheet: RgbaImage,
    pub frames: IndexMap<String, FrameDescriptor>,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct SourceRect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct FrameDescriptor {
    pub rect: SourceRect,
    /// The sheet stores this frame turned a quarter counter-clockwise.
    pub rotated: bool,
    /// Center of the frame in bottom-up icon space.
    pub offset: (i32, i32),
}

#[derive(Deserialize)]
struct PlistDocument {
    frames: IndexMap<String, PlistFrame>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PlistFrame {
    #[serde(alias = "frame", default)]
    texture_rect: Option<String>,
    #[serde(alias = "offset", default)]
    sprite_offset: Option<String>,
    #[serde(alias = "rotated", default)]
    texture_rotated: bool,
}

/// Reads the numbers out of `{a,b}` or `{{x,y},{w,h}}`.
pub fn parse_numbers(text: &str) -> Option<Vec<f32>> {
    let cleaned: String = text
        .chars()
        .filter(|c| !matches!(c, '{' | '}') && !c.is_whitespace())
        .collect();
    if cleaned.is_empty() {
        return None;
    }
    cleaned
        .split(',')
        .map(|part| part.parse::<f32>().ok())
        .collect()
}

fn parse_ints<const N: usize>(text: &str) -> Option<[i32; N]> {
    let numbers = parse_numbers(text)?;
    if numbers.len() != N {
        return None;
    }
    let mut out = [0; N];
    for (slot, value) in out.iter_mut().zip(numbers) {
        *slot = value.trunc() as i32;
    }
    Some(out)
}

/// Parses the `frames` dictionary of a sprite sheet property list.
pub fn parse_frames(bytes: &[u8], path: &Path) -> Result<IndexMap<String, FrameDescriptor>> {
    zone!("parse_frames");
    let document: PlistDocument =
        plist::from_bytes(bytes).map_err(|err| Error::malformed(path, err.to_string()))?;
    let mut frames = IndexMap::with_capacity(document.frames.len());
    for (name, frame) in document.frames {
        let rect = match frame.texture_rect.as_deref() {
            Some(text) => parse_ints::<4>(text).ok_or_else(|| {
                Error::malformed(path, format!("bad textureRect '{text}' for frame {name}"))
            })?,
            None => [0; 4],
        };
        let offset = match frame.sprite_offset.as_deref() {
            Some(text) => parse_ints::<2>(text).ok_or_else(|| {
                Error::malformed(path, format!("bad spriteOffset '{text}' for frame {name}"))
            })?,
            None => [0; 2],
        };
        frames.insert(
            name,
            FrameDescriptor {
                rect: SourceRect {
                    x: rect[0],
                    y: rect[1],
                    width: rect[2],
                    height: rect[3],
                },
                rotated: frame.texture_rotated,
                offset: (offset[0], offset[1]),
            },
        );
    }
    Ok(frames)
}

#[derive(Deserialize)]
struct PaletteEntry {
    id: u32,
    r: u8,
    g: u8,
    b: u8,
}

/// Color id to RGB, as listed in `colors.json`.
#[derive(Clone, Debug, Default)]
pub struct Palette {
    colors: HashMap<u32, [u8; 3]>,
}

impl Palette {
    pub const FALLBACK: [u8; 3] = [255, 255, 255];

    pub fn from_json(text: &str) -> Result<Palette> {
        let entries: Vec<PaletteEntry> = serde_json::from_str(text)?;
        Ok(Palette {
            colors: entries
                .into_iter()
                .map(|entry| (entry.id, [entry.r, entry.g, entry.b]))
                .collect(),
        })
    }

    /// Unknown ids come back white.
    pub fn get(&self, id: u32) -> [u8; 3] {
        self.colors.get(&id).copied().unwrap_or(Self::FALLBACK)
    }

    pub fn len(&self) -> usize {
        self.colors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }
}
