use super::{
    blending::BlendMode,
    build_icon,
    cosmetics::{IconColors, IconKind, LevelRating},
    icon_operations::{blend_icon, scale},
    image_cache::load_badge,
    report,
};
use crate::{config::Config, error::Result};
use image::RgbaImage;
use tracy_full::zone;

/// Places icons left to right, `spacing` apart, each centered vertically.
pub fn compose_strip(icons: &[RgbaImage], spacing: u32) -> Option<RgbaImage> {
    zone!("compose_strip");
    if icons.is_empty() {
        return None;
    }
    let height = icons.iter().map(RgbaImage::height).max().unwrap_or(0);
    let width = icons.iter().map(RgbaImage::width).sum::<u32>()
        + spacing * (icons.len() as u32 - 1);
    let mut strip = RgbaImage::new(width, height);
    let mut x = 0;
    for icon in icons {
        let y = (height - icon.height()) / 2;
        blend_icon(&mut strip, icon, &BlendMode::Over, (x as i32, y as i32));
        x += icon.width() + spacing;
    }
    Some(strip)
}

/// Builds each icon and lays the ones that rendered out in a strip.
pub fn render_icon_strip(
    config: &Config,
    icons: &[(IconKind, u32)],
    colors: &IconColors,
    glow: bool,
) -> Option<RgbaImage> {
    zone!("render_icon_strip");
    let rendered: Vec<RgbaImage> = icons
        .iter()
        .filter_map(|&(kind, id)| build_icon(config, kind, id, colors, glow))
        .collect();
    compose_strip(&rendered, config.quality.icon_spacing())
}

/// Badge names that make up a level's difficulty thumbnail, back to front.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ThumbnailAssets {
    pub background: String,
    pub face: String,
    pub stars: String,
}

impl ThumbnailAssets {
    pub fn for_rating(rating: &LevelRating) -> ThumbnailAssets {
        let background = match rating.epic {
            1 => "rateepic",
            2 => "ratelegendary",
            3 => "ratemythic",
            _ if rating.featured => "ratefeat",
            _ => "ratena",
        };
        let face = if rating.demon {
            match rating.demon_difficulty {
                d @ (0 | 3 | 4 | 5 | 6) => format!("demon{d}"),
                _ => String::from("demon0"),
            }
        } else if rating.auto {
            String::from("auto")
        } else {
            format!("diff{}", rating.difficulty)
        };
        ThumbnailAssets {
            background: background.to_owned(),
            face,
            stars: format!("str{}", rating.stars.clamp(0, 10)),
        }
    }

    pub fn layers(&self) -> [&str; 3] {
        [
            self.background.as_str(),
            self.face.as_str(),
            self.stars.as_str(),
        ]
    }
}

/// Stacks the three badges on a canvas the size of the background.
pub fn compose_thumbnail(assets: &ThumbnailAssets, config: &Config) -> Result<RgbaImage> {
    zone!("compose_thumbnail");
    let background = load_badge(config, &assets.background)?;
    let mut canvas = RgbaImage::new(background.width(), background.height());
    for name in assets.layers() {
        let mut layer = (*load_badge(config, name)?).clone();
        scale(&mut layer, canvas.width(), canvas.height());
        blend_icon(&mut canvas, &layer, &BlendMode::Over, (0, 0));
    }
    Ok(canvas)
}

pub fn render_difficulty_thumbnail(config: &Config, rating: &LevelRating) -> Option<RgbaImage> {
    let assets = ThumbnailAssets::for_rating(rating);
    match compose_thumbnail(&assets, config) {
        Ok(image) => Some(image),
        Err(err) => {
            report("difficulty thumbnail", &err);
            None
        }
    }
}
