use super::{
    assembler::{assemble_fragments, pick_part},
    atlas::{parse_numbers, Atlas, Palette},
    blending::BlendMode,
    cosmetics::{IconColors, IconKind},
    icon_operations::{
        blend_icon, crop_to_visible, darken, flip_horizontal, flip_vertical, normalize_degrees,
        scale, turn,
    },
    image_cache::{load_atlas, load_palette, load_rig_layouts},
    sprite::{collect_fragments, FrameSelection, PartId, RoleFilter},
};
use crate::{
    config::{Config, Quality},
    error::{Error, Result},
};
use image::RgbaImage;
use indexmap::IndexMap;
use rayon::iter::{IntoParallelRefIterator, ParallelIterator};
use serde::Deserialize;
use std::path::Path;
use tracy_full::zone;

/// Nominal edge of an icon in game points.
pub const ICON_SIZE_POINTS: f32 = 30.0;
/// Free space kept around the rig before the final crop, in game points.
pub const PADDING_POINTS: f32 = 10.0;
pub const DARKEN_FACTOR: f32 = 0.5;
pub const DARKENED_PIECES: usize = 3;
/// The leg joint. It is placed without the center adjustment and needs extra room below.
pub const ARTICULATION_PIECE: u8 = 2;

/// Pose of one sprite slot.
#[derive(Clone, Debug, PartialEq)]
pub struct RigSlot {
    pub name: String,
    pub piece: u8,
    pub position: (f32, f32),
    pub scale: (f32, f32),
    pub rotation: f32,
    pub flipped: (bool, bool),
    pub z_value: i32,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum LooseNumber {
    Number(f32),
    Text(String),
}

impl LooseNumber {
    fn value(&self) -> Option<f32> {
        match self {
            LooseNumber::Number(value) => Some(*value),
            LooseNumber::Text(text) => text.trim().parse().ok(),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum LoosePair {
    Numbers([f32; 2]),
    Text(String),
}

impl LoosePair {
    fn value(&self) -> Option<(f32, f32)> {
        match self {
            LoosePair::Numbers([a, b]) => Some((*a, *b)),
            LoosePair::Text(text) => match parse_numbers(text)?.as_slice() {
                [a, b] => Some((*a, *b)),
                _ => None,
            },
        }
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawSlot {
    piece: LooseNumber,
    #[serde(default)]
    position: Option<LoosePair>,
    #[serde(default)]
    scale: Option<LoosePair>,
    #[serde(default)]
    rotation: Option<LooseNumber>,
    #[serde(default)]
    flipped: Option<LoosePair>,
    #[serde(default)]
    z_value: Option<LooseNumber>,
}

impl RawSlot {
    fn into_slot(self, name: String, path: &Path) -> Result<RigSlot> {
        let bad = |field: &str| Error::malformed(path, format!("bad {field} in slot {name}"));
        let piece = self.piece.value().ok_or_else(|| bad("piece"))?;
        let pair = |field: &str, value: Option<LoosePair>, default: (f32, f32)| match value {
            Some(pair) => pair.value().ok_or_else(|| bad(field)),
            None => Ok(default),
        };
        let number = |field: &str, value: Option<LooseNumber>| match value {
            Some(number) => number.value().ok_or_else(|| bad(field)),
            None => Ok(0.0),
        };
        let position = pair("position", self.position, (0.0, 0.0))?;
        let scale = pair("scale", self.scale, (1.0, 1.0))?;
        let flipped = pair("flipped", self.flipped, (0.0, 0.0))?;
        let rotation = number("rotation", self.rotation)?;
        let z_value = number("zValue", self.z_value)?;
        Ok(RigSlot {
            piece: piece as u8,
            position,
            scale,
            rotation,
            flipped: (flipped.0 != 0.0, flipped.1 != 0.0),
            z_value: z_value as i32,
            name,
        })
    }
}

/// Slot poses keyed by rig kind (`robot`) or by a single cosmetic (`robot_05`).
#[derive(Clone, Debug, Default)]
pub struct RigLayouts {
    entries: IndexMap<String, Vec<RigSlot>>,
}

impl RigLayouts {
    pub fn from_json(text: &str, path: &Path) -> Result<RigLayouts> {
        zone!("parse_rig_layouts");
        let raw: IndexMap<String, IndexMap<String, RawSlot>> = serde_json::from_str(text)?;
        let mut entries = IndexMap::with_capacity(raw.len());
        for (key, slots) in raw {
            let slots = slots
                .into_iter()
                .map(|(name, slot)| slot.into_slot(name, path))
                .collect::<Result<Vec<_>>>()?;
            entries.insert(key, slots);
        }
        Ok(RigLayouts { entries })
    }

    /// The cosmetic's own entry when present, else the one for its kind.
    pub fn slots_for(&self, kind: IconKind, id: u32) -> &[RigSlot] {
        self.entries
            .get(&kind.base_name(id))
            .or_else(|| self.entries.get(kind.type_name()))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

/// A posed piece ready to be placed on the rig canvas.
#[derive(Clone, Debug)]
pub struct RigSprite {
    pub image: RgbaImage,
    pub piece: u8,
    pub position: (f32, f32),
    pub scale: (f32, f32),
    pub rotation: f32,
    pub flip_x: bool,
    pub depth: i32,
    pub is_glow: bool,
}

impl RigSprite {
    /// Where the sprite's center lands, y pointing down.
    pub fn center(&self, quality: Quality) -> (f32, f32) {
        let k = quality.scale_factor();
        let x = self.position.0 * k;
        let y = -self.position.1 * k;
        if self.piece == ARTICULATION_PIECE {
            return (x, y);
        }
        let icon_size = ICON_SIZE_POINTS * k;
        let mut adjust_x = icon_size * (1.0 / (2.0 * self.scale.0) - 0.5);
        let adjust_y = icon_size * (1.0 / (2.0 * self.scale.1) - 0.5);
        if self.flip_x {
            adjust_x = -adjust_x;
        }
        (x + adjust_x, y + adjust_y)
    }

    /// Half extents used for bounds. Rotated sprites reserve their half diagonal both ways.
    fn half_extents(&self) -> (f32, f32) {
        let w = self.image.width() as f32;
        let h = self.image.height() as f32;
        if self.rotation != 0.0 {
            let half_diagonal = (w * w + h * h).sqrt() / 2.0;
            (half_diagonal, half_diagonal)
        } else {
            (w / 2.0, h / 2.0)
        }
    }
}

/// Crops, scales, flips and turns one piece according to its slot.
/// A zero scale on either axis leaves nothing to draw.
pub fn pose_piece(image: &RgbaImage, slot: &RigSlot) -> Result<RgbaImage> {
    zone!("pose_piece");
    let (scale_x, scale_y) = slot.scale;
    if scale_x == 0.0 || scale_y == 0.0 {
        return Err(Error::DegenerateFrame(slot.name.clone()));
    }
    let mut posed = crop_to_visible(image);
    let width = ((posed.width() as f32 * scale_x.abs()).round() as u32).max(1);
    let height = ((posed.height() as f32 * scale_y.abs()).round() as u32).max(1);
    scale(&mut posed, width, height);
    // Negative scales mirror on top of the declared flips.
    if slot.flipped.0 != (scale_x < 0.0) {
        flip_horizontal(&mut posed);
    }
    if slot.flipped.1 != (scale_y < 0.0) {
        flip_vertical(&mut posed);
    }
    let rotation = normalize_degrees(slot.rotation);
    if rotation != 0.0 {
        turn(&mut posed, rotation);
    }
    Ok(posed)
}

fn piece_image(
    atlas: &Atlas,
    kind: IconKind,
    palette: &Palette,
    colors: &IconColors,
    slot: &RigSlot,
    roles: RoleFilter,
) -> Result<RgbaImage> {
    let selection = FrameSelection::piece(slot.piece, roles);
    let fragments = collect_fragments(atlas, kind, palette, colors, true, &selection);
    let mut parts = assemble_fragments(fragments);
    parts
        .shift_remove(&PartId::Piece(slot.piece))
        .or_else(|| pick_part(parts))
        .ok_or_else(|| Error::EmptyResult(format!("{} piece {:02}", atlas.base_name, slot.piece)))
}

fn slot_sprites(
    atlas: &Atlas,
    kind: IconKind,
    palette: &Palette,
    colors: &IconColors,
    glow: bool,
    slot: &RigSlot,
) -> Vec<RigSprite> {
    let sprite = |roles: RoleFilter, is_glow: bool| -> Result<RigSprite> {
        let image = piece_image(atlas, kind, palette, colors, slot, roles)?;
        Ok(RigSprite {
            image: pose_piece(&image, slot)?,
            piece: slot.piece,
            position: slot.position,
            scale: slot.scale,
            rotation: normalize_degrees(slot.rotation),
            flip_x: slot.flipped.0,
            depth: slot.z_value,
            is_glow,
        })
    };
    let mut sprites = Vec::with_capacity(2);
    if glow {
        match sprite(RoleFilter::GlowOnly, true) {
            Ok(twin) => sprites.push(twin),
            Err(err) => log::debug!("{}: no glow for slot {}: {err}", atlas.base_name, slot.name),
        }
    }
    match sprite(RoleFilter::WithoutGlow, false) {
        Ok(main) => sprites.push(main),
        Err(err) => log::warn!("{}: skipping slot {}: {err}", atlas.base_name, slot.name),
    }
    sprites
}

/// Puts glow twins behind every other piece and sorts by depth.
/// Glow twins come first so equal depths keep them underneath.
pub fn order_sprites(sprites: Vec<RigSprite>) -> Vec<RigSprite> {
    let (mut ordered, main): (Vec<_>, Vec<_>) = sprites.into_iter().partition(|s| s.is_glow);
    let behind = main.iter().map(|s| s.depth).min().unwrap_or(0) - 1;
    for twin in &mut ordered {
        twin.depth = behind;
    }
    ordered.extend(main);
    ordered.sort_by_key(|sprite| sprite.depth);
    ordered
}

/// Shades the first few sprites at depth zero or above, which sit behind the body.
/// Glow twins never count, whatever depth they ended up at.
pub fn darken_back_pieces(sprites: &mut [RigSprite]) {
    for sprite in sprites
        .iter_mut()
        .filter(|sprite| !sprite.is_glow && sprite.depth >= 0)
        .take(DARKENED_PIECES)
    {
        darken(&mut sprite.image, DARKEN_FACTOR);
    }
}

/// Extent of a rig around its sprite centers, in pixels, before padding.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RigBounds {
    pub min_x: f32,
    pub max_x: f32,
    pub min_y: f32,
    pub max_y: f32,
}

impl RigBounds {
    pub fn of(sprites: &[RigSprite], quality: Quality) -> RigBounds {
        let mut bounds = RigBounds {
            min_x: f32::MAX,
            max_x: f32::MIN,
            min_y: f32::MAX,
            max_y: f32::MIN,
        };
        for sprite in sprites {
            let (x, y) = sprite.center(quality);
            let (half_width, half_height) = sprite.half_extents();
            bounds.min_x = bounds.min_x.min(x - half_width);
            bounds.max_x = bounds.max_x.max(x + half_width);
            bounds.min_y = bounds.min_y.min(y - half_height);
            bounds.max_y = bounds.max_y.max(y + half_height);
            if sprite.piece == ARTICULATION_PIECE {
                let room = sprite.image.height() as f32 * 0.5;
                bounds.max_y = bounds.max_y.max(y + half_height + room);
            }
        }
        bounds
    }

    pub fn width(&self) -> f32 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f32 {
        self.max_y - self.min_y
    }
}

/// Places depth-ordered sprites on one canvas and crops the result.
pub fn compose(sprites: &[RigSprite], quality: Quality) -> Result<RgbaImage> {
    zone!("compose_rig");
    if sprites.is_empty() {
        return Err(Error::EmptyResult(String::from("rig without sprites")));
    }
    let bounds = RigBounds::of(sprites, quality);
    let padding = PADDING_POINTS * quality.scale_factor();
    let width = bounds.width().ceil() + padding * 2.0;
    let height = bounds.height().ceil() + padding * 2.0;
    let mut canvas = RgbaImage::new(width as u32, height as u32);
    for sprite in sprites {
        let (x, y) = sprite.center(quality);
        let left = x - sprite.image.width() as f32 / 2.0 - bounds.min_x + padding;
        let top = y - sprite.image.height() as f32 / 2.0 - bounds.min_y + padding;
        blend_icon(
            &mut canvas,
            &sprite.image,
            &BlendMode::Over,
            (left.round() as i32, top.round() as i32),
        );
    }
    Ok(crop_to_visible(&canvas))
}

/// Renders a robot or spider from its slot layout.
pub fn assemble_rig(
    config: &Config,
    kind: IconKind,
    id: u32,
    colors: &IconColors,
    glow: bool,
) -> Result<RgbaImage> {
    zone!("assemble_rig");
    let layouts = load_rig_layouts(config)?;
    let slots = layouts.slots_for(kind, id);
    if slots.is_empty() {
        return Err(Error::EmptyResult(format!(
            "{}: no rig layout",
            kind.base_name(id)
        )));
    }
    let atlas = load_atlas(config, kind, id)?;
    let palette = load_palette(config)?;

    let sprites: Vec<RigSprite> = slots
        .par_iter()
        .map(|slot| slot_sprites(&atlas, kind, &palette, colors, glow, slot))
        .collect::<Vec<_>>()
        .into_iter()
        .flatten()
        .collect();
    if sprites.is_empty() {
        return Err(Error::EmptyResult(atlas.base_name.clone()));
    }

    let mut sprites = order_sprites(sprites);
    darken_back_pieces(&mut sprites);
    compose(&sprites, atlas.quality)
}
