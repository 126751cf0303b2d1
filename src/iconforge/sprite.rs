use super::{
    atlas::{Atlas, FrameDescriptor, Palette},
    cosmetics::{IconColors, IconKind},
    icon_operations::tint,
};
use crate::error::{Error, Result};
use image::{imageops, RgbaImage};
use rayon::iter::{IntoParallelRefIterator, ParallelIterator};
use std::fmt;
use tracy_full::zone;

/// Which layer a frame paints, derived from keywords in its name.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum LayerRole {
    Glow,
    Tertiary,
    Secondary,
    Primary,
    Extra,
}

impl LayerRole {
    pub fn classify(frame_name: &str) -> LayerRole {
        let name = frame_name.to_ascii_lowercase();
        if name.contains("glow") {
            LayerRole::Glow
        } else if name.contains("_3_") {
            LayerRole::Tertiary
        } else if name.contains("_2_") {
            LayerRole::Secondary
        } else if name.contains("extra") {
            LayerRole::Extra
        } else {
            LayerRole::Primary
        }
    }

    /// Paint order inside a part, lowest first.
    pub fn order(self) -> u8 {
        match self {
            LayerRole::Glow => 1,
            LayerRole::Tertiary => 2,
            LayerRole::Secondary => 3,
            LayerRole::Primary => 4,
            LayerRole::Extra => 5,
        }
    }

    /// Palette id used to tint this layer, `None` for layers drawn as-is.
    pub fn tint_color(self, colors: &IconColors) -> Option<u32> {
        match self {
            LayerRole::Glow => Some(colors.glow),
            LayerRole::Secondary => Some(colors.secondary),
            LayerRole::Primary => Some(colors.primary),
            LayerRole::Tertiary | LayerRole::Extra => None,
        }
    }
}

/// Sub-part a fragment is grouped under.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub enum PartId {
    Full,
    Piece(u8),
}

impl fmt::Display for PartId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            PartId::Full => write!(f, "full"),
            PartId::Piece(number) => write!(f, "{number:02}"),
        }
    }
}

/// The two digits right after `{base_name}_`, as in `robot_01_03_001.png`.
pub fn piece_number(frame_name: &str, base_name: &str) -> Option<u8> {
    let prefix = format!("{base_name}_");
    let start = frame_name.find(&prefix)? + prefix.len();
    let digits = frame_name.get(start..start + 2)?;
    if !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum RoleFilter {
    #[default]
    All,
    WithoutGlow,
    GlowOnly,
}

impl RoleFilter {
    fn admits(self, role: LayerRole) -> bool {
        match self {
            RoleFilter::All => true,
            RoleFilter::WithoutGlow => role != LayerRole::Glow,
            RoleFilter::GlowOnly => role == LayerRole::Glow,
        }
    }
}

/// Which frames of an atlas take part in an assembly.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct FrameSelection {
    /// Keep only this piece plus the frames shared by every piece.
    pub piece: Option<u8>,
    pub roles: RoleFilter,
}

impl FrameSelection {
    pub fn piece(piece: u8, roles: RoleFilter) -> Self {
        FrameSelection {
            piece: Some(piece),
            roles,
        }
    }
}

/// An extracted, tinted sprite region and where it sits relative to its siblings.
#[derive(Clone, Debug)]
pub struct Fragment {
    pub image: RgbaImage,
    /// Center in bottom-up coordinates.
    pub offset: (i32, i32),
    pub part: PartId,
    pub role: LayerRole,
}

impl Fragment {
    pub fn order(&self) -> u8 {
        self.role.order()
    }
}

/// Copies a frame out of the sheet. Frames stored sideways come back upright, sized
/// `rect.width` by `rect.height`. Parts of the rect outside the sheet are left transparent.
pub fn extract(atlas: &Atlas, name: &str, frame: &FrameDescriptor) -> Result<RgbaImage> {
    zone!("extract");
    let rect = frame.rect;
    let (stored_width, stored_height) = if frame.rotated {
        (rect.height, rect.width)
    } else {
        (rect.width, rect.height)
    };
    if stored_width <= 0 || stored_height <= 0 {
        return Err(Error::DegenerateFrame(name.to_owned()));
    }
    let (x, y) = (rect.x as i64, rect.y as i64);
    let left = x.max(0);
    let top = y.max(0);
    let right = (x + stored_width as i64).min(atlas.sheet.width() as i64);
    let bottom = (y + stored_height as i64).min(atlas.sheet.height() as i64);
    if right <= left || bottom <= top {
        return Err(Error::DegenerateFrame(name.to_owned()));
    }
    let visible = imageops::crop_imm(
        &atlas.sheet,
        left as u32,
        top as u32,
        (right - left) as u32,
        (bottom - top) as u32,
    )
    .to_image();
    let block = if visible.dimensions() == (stored_width as u32, stored_height as u32) {
        visible
    } else {
        // whatever hangs off the sheet stays transparent
        let mut block = RgbaImage::new(stored_width as u32, stored_height as u32);
        imageops::replace(&mut block, &visible, left - x, top - y);
        block
    };
    if frame.rotated {
        Ok(imageops::rotate90(&block))
    } else {
        Ok(block)
    }
}

/// Extracts and tints every frame that passes `selection`, in atlas order.
/// Frames that cannot be extracted are logged and left out.
pub fn collect_fragments(
    atlas: &Atlas,
    kind: IconKind,
    palette: &Palette,
    colors: &IconColors,
    glow: bool,
    selection: &FrameSelection,
) -> Vec<Fragment> {
    zone!("collect_fragments");
    atlas
        .frames
        .par_iter()
        .filter_map(|(name, frame)| {
            let role = LayerRole::classify(name);
            if !selection.roles.admits(role) || (role == LayerRole::Glow && !glow) {
                return None;
            }
            let part = if kind.is_rig() {
                piece_number(name, &atlas.base_name).map_or(PartId::Full, PartId::Piece)
            } else {
                PartId::Full
            };
            if let (Some(wanted), PartId::Piece(found)) = (selection.piece, part) {
                if wanted != found {
                    return None;
                }
            }
            let mut image = match extract(atlas, name, frame) {
                Ok(image) => image,
                Err(err) => {
                    log::debug!("{}: skipping frame: {err}", atlas.base_name);
                    return None;
                }
            };
            if let Some(color_id) = role.tint_color(colors) {
                tint(&mut image, palette.get(color_id));
            }
            Some(Fragment {
                image,
                offset: frame.offset,
                part,
                role,
            })
        })
        .collect()
}
