use super::{
    blending::BlendMode,
    cosmetics::{IconColors, IconKind},
    icon_operations::blend_icon,
    image_cache::{load_atlas, load_palette},
    sprite::{collect_fragments, Fragment, FrameSelection, PartId},
};
use crate::{
    config::Config,
    error::{Error, Result},
};
use image::RgbaImage;
use indexmap::IndexMap;
use tracy_full::zone;

/// Renders every sub-part of a cosmetic. Parts appear in the order their first frame
/// appears in the atlas.
pub fn assemble_simple(
    config: &Config,
    kind: IconKind,
    id: u32,
    colors: &IconColors,
    glow: bool,
    selection: &FrameSelection,
) -> Result<IndexMap<PartId, RgbaImage>> {
    zone!("assemble_simple");
    let atlas = load_atlas(config, kind, id)?;
    let palette = load_palette(config)?;
    let fragments = collect_fragments(&atlas, kind, &palette, colors, glow, selection);
    let parts = assemble_fragments(fragments);
    if parts.is_empty() {
        return Err(Error::EmptyResult(atlas.base_name.clone()));
    }
    Ok(parts)
}

/// Like [`assemble_simple`], keeping only the part a caller would display.
pub fn assemble_simple_icon(
    config: &Config,
    kind: IconKind,
    id: u32,
    colors: &IconColors,
    glow: bool,
    selection: &FrameSelection,
) -> Result<RgbaImage> {
    let parts = assemble_simple(config, kind, id, colors, glow, selection)?;
    pick_part(parts).ok_or_else(|| Error::EmptyResult(kind.base_name(id)))
}

/// `full` when there is one, otherwise the first part.
pub fn pick_part(mut parts: IndexMap<PartId, RgbaImage>) -> Option<RgbaImage> {
    parts
        .shift_remove(&PartId::Full)
        .or_else(|| parts.shift_remove_index(0).map(|(_, image)| image))
}

/// Groups fragments by part and composites each group.
pub fn assemble_fragments(fragments: Vec<Fragment>) -> IndexMap<PartId, RgbaImage> {
    let mut groups: IndexMap<PartId, Vec<Fragment>> = IndexMap::new();
    for fragment in fragments {
        groups.entry(fragment.part).or_default().push(fragment);
    }
    groups
        .into_iter()
        .map(|(part, group)| (part, composite_group(group)))
        .collect()
}

/// Lays fragments out around their offsets on the smallest canvas that holds them all.
/// Offsets are bottom-up, the canvas is top-down.
pub fn composite_group(mut group: Vec<Fragment>) -> RgbaImage {
    zone!("composite_group");
    if group.is_empty() {
        return RgbaImage::new(1, 1);
    }
    group.sort_by_key(Fragment::order);

    let mut min_x = f32::MAX;
    let mut max_x = f32::MIN;
    let mut min_y = f32::MAX;
    let mut max_y = f32::MIN;
    for fragment in &group {
        let half_width = fragment.image.width() as f32 / 2.0;
        let half_height = fragment.image.height() as f32 / 2.0;
        let (x, y) = (fragment.offset.0 as f32, fragment.offset.1 as f32);
        min_x = min_x.min(x - half_width);
        max_x = max_x.max(x + half_width);
        min_y = min_y.min(y - half_height);
        max_y = max_y.max(y + half_height);
    }

    let width = (max_x - min_x).ceil() as u32;
    let height = (max_y - min_y).ceil() as u32;
    let mut canvas = RgbaImage::new(width.max(1), height.max(1));
    for fragment in &group {
        let w = fragment.image.width() as f32;
        let h = fragment.image.height() as f32;
        let (x, y) = (fragment.offset.0 as f32, fragment.offset.1 as f32);
        let pos_x = (x - w / 2.0 - min_x).round() as i32;
        let pos_y = (height as f32 - ((y + h / 2.0) - min_y)).round() as i32;
        blend_icon(&mut canvas, &fragment.image, &BlendMode::Over, (pos_x, pos_y));
    }
    canvas
}
