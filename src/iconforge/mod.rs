// Geometry Dash icon renderer: atlas parsing, tinting and layered assembly
pub mod assembler;
pub mod atlas;
pub mod blending;
pub mod cosmetics;
pub mod icon_operations;
pub mod image_cache;
pub mod page;
pub mod rig;
pub mod sprite;

use crate::{
    config::Config,
    error::{Error, Result},
};
use cosmetics::{CosmeticSelection, IconColors, IconKind};
use image::RgbaImage;
use png::{BitDepth, ColorType, Encoder};
use sprite::FrameSelection;
use tracy_full::zone;

/// Logs a failed render. Missing assets are routine, anything else is worth a warning.
pub(crate) fn report(what: &str, err: &Error) {
    if err.is_expected() {
        log::debug!("{what}: {err}");
    } else {
        log::warn!("{what}: {err}");
    }
}

/// Renders one cosmetic, cropped to its visible pixels.
pub fn build_icon(
    config: &Config,
    kind: IconKind,
    id: u32,
    colors: &IconColors,
    glow: bool,
) -> Option<RgbaImage> {
    zone!("build_icon");
    let result = if kind.is_rig() {
        rig::assemble_rig(config, kind, id, colors, glow)
    } else {
        assembler::assemble_simple_icon(config, kind, id, colors, glow, &FrameSelection::default())
            .map(|image| icon_operations::crop_to_visible(&image))
    };
    match result {
        Ok(image) => Some(image),
        Err(err) => {
            report(&kind.base_name(id), &err);
            None
        }
    }
}

/// 8-bit RGBA PNG.
pub fn encode_png(image: &RgbaImage) -> Result<Vec<u8>> {
    zone!("encode_png");
    let mut bytes = Vec::new();
    {
        let mut encoder = Encoder::new(&mut bytes, image.width(), image.height());
        encoder.set_color(ColorType::Rgba);
        encoder.set_depth(BitDepth::Eight);
        let mut writer = encoder.write_header()?;
        writer.write_image_data(image.as_raw())?;
    }
    Ok(bytes)
}

fn encode_or_report(what: &str, image: Option<RgbaImage>) -> Option<Vec<u8>> {
    match encode_png(&image?) {
        Ok(bytes) => Some(bytes),
        Err(err) => {
            report(what, &err);
            None
        }
    }
}

pub fn render_icon_png(
    config: &Config,
    kind: IconKind,
    id: u32,
    colors: &IconColors,
    glow: bool,
) -> Option<Vec<u8>> {
    encode_or_report(
        &kind.base_name(id),
        build_icon(config, kind, id, colors, glow),
    )
}

/// The icon a user has equipped, as PNG.
pub fn render_profile_icon(config: &Config, selection: &CosmeticSelection) -> Option<Vec<u8>> {
    let (kind, id) = selection.equipped();
    render_icon_png(config, kind, id, &selection.colors(), selection.glow)
}

/// Every category the user has picked, side by side, as PNG.
pub fn render_profile_icon_set(
    config: &Config,
    selection: &CosmeticSelection,
    exclude_equipped: bool,
) -> Option<Vec<u8>> {
    let icons = selection.icon_set(exclude_equipped);
    let strip = page::render_icon_strip(config, &icons, &selection.colors(), selection.glow);
    encode_or_report("icon set", strip)
}
