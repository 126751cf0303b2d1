use super::{
    atlas::{parse_frames, Atlas, Palette},
    cosmetics::{IconKind, ALL_KINDS},
    rig::RigLayouts,
};
use crate::{
    config::{Config, Quality},
    error::{Error, Result},
};
use dashmap::DashMap;
use image::RgbaImage;
use once_cell::sync::Lazy;
use std::{
    fs,
    hash::BuildHasherDefault,
    path::{Path, PathBuf},
    sync::Arc,
};
use tracy_full::zone;
use twox_hash::XxHash64;

type Cache<K, V> = DashMap<K, Arc<V>, BuildHasherDefault<XxHash64>>;

fn new_cache<K: Eq + std::hash::Hash, V>() -> Cache<K, V> {
    DashMap::with_hasher(BuildHasherDefault::<XxHash64>::default())
}

#[derive(Clone, Debug, Eq, PartialEq, Hash)]
struct AtlasKey {
    root: PathBuf,
    kind: IconKind,
    id: u32,
    quality: Quality,
}

/// Atlases keyed by the quality that was actually found on disk.
static ATLASES: Lazy<Cache<AtlasKey, Atlas>> = Lazy::new(new_cache);
/// Resources root -> palette.
static PALETTES: Lazy<Cache<PathBuf, Palette>> = Lazy::new(new_cache);
/// Resources root -> rig layout table.
static RIG_LAYOUTS: Lazy<Cache<PathBuf, RigLayouts>> = Lazy::new(new_cache);
/// Image path -> badge image.
static BADGES: Lazy<Cache<PathBuf, RgbaImage>> = Lazy::new(new_cache);
/// Icons directory -> highest id per kind.
static ICON_LIMITS: Lazy<Cache<PathBuf, IconLimits>> = Lazy::new(new_cache);

pub fn clear_caches() {
    ATLASES.clear();
    PALETTES.clear();
    RIG_LAYOUTS.clear();
    BADGES.clear();
    ICON_LIMITS.clear();
}

/// Metadata and sheet paths for one quality variant.
pub fn atlas_paths(config: &Config, base_name: &str, quality: Quality) -> (PathBuf, PathBuf) {
    let stem = format!("{base_name}{}", quality.file_suffix());
    let dir = config.icons_dir();
    (
        dir.join(format!("{stem}.plist")),
        dir.join(format!("{stem}.png")),
    )
}

/// Loads the atlas for a cosmetic, trying the configured quality first and falling back
/// to medium, low and high in that order. A variant with unreadable metadata counts as missing.
pub fn load_atlas(config: &Config, kind: IconKind, id: u32) -> Result<Arc<Atlas>> {
    zone!("load_atlas");
    let base_name = kind.base_name(id);
    for quality in config.quality.fallback_order() {
        let key = AtlasKey {
            root: config.resources.clone(),
            kind,
            id,
            quality,
        };
        if let Some(found) = ATLASES.get(&key) {
            return Ok(found.value().clone());
        }
        let (plist_path, png_path) = atlas_paths(config, &base_name, quality);
        if !plist_path.is_file() || !png_path.is_file() {
            continue;
        }
        let atlas = match read_atlas(&base_name, quality, &plist_path, &png_path) {
            Ok(atlas) => atlas,
            Err(err @ Error::MalformedDescriptor { .. }) => {
                log::debug!("{base_name}: skipping {quality} variant: {err}");
                continue;
            }
            Err(err) => return Err(err),
        };
        if quality != config.quality {
            log::debug!("{base_name}: no {} variant, using {quality}", config.quality);
        }
        let cached = ATLASES
            .entry(key)
            .or_insert_with(|| Arc::new(atlas))
            .value()
            .clone();
        return Ok(cached);
    }
    Err(Error::AssetNotFound(base_name))
}

fn read_atlas(
    base_name: &str,
    quality: Quality,
    plist_path: &Path,
    png_path: &Path,
) -> Result<Atlas> {
    zone!("read_atlas");
    let frames = parse_frames(&fs::read(plist_path)?, plist_path)?;
    let sheet = {
        zone!("decode_sheet");
        image::open(png_path)?.into_rgba8()
    };
    Ok(Atlas {
        base_name: base_name.to_owned(),
        quality,
        sheet,
        frames,
    })
}

pub fn load_palette(config: &Config) -> Result<Arc<Palette>> {
    zone!("load_palette");
    if let Some(found) = PALETTES.get(&config.resources) {
        return Ok(found.value().clone());
    }
    let path = config.resources.join("colors.json");
    if !path.is_file() {
        return Err(Error::AssetNotFound(path.display().to_string()));
    }
    let palette = Palette::from_json(&fs::read_to_string(&path)?)?;
    Ok(PALETTES
        .entry(config.resources.clone())
        .or_insert_with(|| Arc::new(palette))
        .value()
        .clone())
}

pub fn load_rig_layouts(config: &Config) -> Result<Arc<RigLayouts>> {
    zone!("load_rig_layouts");
    if let Some(found) = RIG_LAYOUTS.get(&config.resources) {
        return Ok(found.value().clone());
    }
    let path = config.resources.join("rig_layouts.json");
    if !path.is_file() {
        return Err(Error::AssetNotFound(path.display().to_string()));
    }
    let layouts = RigLayouts::from_json(&fs::read_to_string(&path)?, &path)?;
    Ok(RIG_LAYOUTS
        .entry(config.resources.clone())
        .or_insert_with(|| Arc::new(layouts))
        .value()
        .clone())
}

/// Loads `{resources}/{name}.png`.
pub fn load_badge(config: &Config, name: &str) -> Result<Arc<RgbaImage>> {
    zone!("load_badge");
    let path = config.resources.join(format!("{name}.png"));
    if let Some(found) = BADGES.get(&path) {
        return Ok(found.value().clone());
    }
    if !path.is_file() {
        return Err(Error::AssetNotFound(path.display().to_string()));
    }
    let image = image::open(&path)?.into_rgba8();
    Ok(BADGES
        .entry(path)
        .or_insert_with(|| Arc::new(image))
        .value()
        .clone())
}

/// Highest cosmetic id available on disk for every kind.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct IconLimits {
    max_ids: [u32; ALL_KINDS.len()],
}

impl IconLimits {
    pub fn max_id(&self, kind: IconKind) -> u32 {
        self.max_ids[kind as usize]
    }

    pub fn contains(&self, kind: IconKind, id: u32) -> bool {
        id >= 1 && id <= self.max_id(kind)
    }
}

impl Default for IconLimits {
    fn default() -> Self {
        IconLimits {
            max_ids: [1; ALL_KINDS.len()],
        }
    }
}

/// Parses `player_ball_12-hd.plist` into `(Ball, 12)`.
fn atlas_file_id(file_name: &str, kind: IconKind) -> Option<u32> {
    let stem = file_name.strip_suffix(".plist")?;
    let stem = stem
        .strip_suffix("-uhd")
        .or_else(|| stem.strip_suffix("-hd"))
        .unwrap_or(stem);
    let digits = stem.strip_prefix(kind.type_name())?.strip_prefix('_')?;
    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

/// Scans the icons directory once. Kinds with nothing on disk report 1.
pub fn icon_limits(config: &Config) -> Arc<IconLimits> {
    zone!("icon_limits");
    let dir = config.icons_dir();
    if let Some(found) = ICON_LIMITS.get(&dir) {
        return found.value().clone();
    }
    let mut limits = IconLimits::default();
    match fs::read_dir(&dir) {
        Ok(entries) => {
            let names: Vec<String> = entries
                .filter_map(|entry| entry.ok())
                .map(|entry| entry.file_name().to_string_lossy().into_owned())
                .collect();
            for kind in ALL_KINDS {
                let max = names
                    .iter()
                    .filter_map(|name| atlas_file_id(name, kind))
                    .max()
                    .unwrap_or(0);
                if max > 0 {
                    limits.max_ids[kind as usize] = max;
                }
            }
        }
        Err(err) => {
            log::warn!("Could not scan icons in {}: {err}", dir.display());
            return Arc::new(limits);
        }
    }
    ICON_LIMITS
        .entry(dir)
        .or_insert_with(|| Arc::new(limits))
        .value()
        .clone()
}
