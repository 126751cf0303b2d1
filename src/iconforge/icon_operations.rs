use super::blending::{BlendMode, Rgba as BlendRgba};
use image::{imageops, RgbaImage};
use rayon::{iter::IndexedParallelIterator, iter::ParallelIterator, slice::ParallelSliceMut};
use std::ops::Range;
use tracy_full::zone;

/// Pixels with alpha at or below this are treated as empty when cropping.
pub const VISIBLE_ALPHA_THRESHOLD: u8 = 2;

/// Multiplies RGB by a palette color. Alpha is kept and fully transparent pixels are left alone.
pub fn tint(image: &mut RgbaImage, color: [u8; 3]) {
    zone!("tint");
    if image.width() == 0 || image.height() == 0 {
        return;
    }
    let color = [color[0], color[1], color[2], 255];
    let image_buf: &mut [u8] = image.as_mut();
    image_buf.par_chunks_exact_mut(4).for_each(|px| {
        if px[3] == 0 {
            return;
        }
        let blended = BlendRgba::blend_u8(px, &color, &BlendMode::Multiply);
        px[..3].copy_from_slice(&blended[..3]);
    });
}

/// Scales RGB by `factor`, alpha untouched.
pub fn darken(image: &mut RgbaImage, factor: f32) {
    zone!("darken");
    let image_buf: &mut [u8] = image.as_mut();
    image_buf.par_chunks_exact_mut(4).for_each(|px| {
        for channel in &mut px[..3] {
            *channel = (*channel as f32 * factor).round().clamp(0.0, 255.0) as u8;
        }
    });
}

/// Draws `other_image` onto `image` with its top-left corner at `position`.
/// Pixels landing outside of `image` are dropped.
pub fn blend_icon(
    image: &mut RgbaImage,
    other_image: &RgbaImage,
    blend_mode: &BlendMode,
    position: (i32, i32),
) {
    zone!("blend_icon");
    let (x_offset, y_offset) = position;

    let image_width = image.width() as i32;
    let image_height = image.height() as i32;
    let other_width = other_image.width() as i32;
    let other_height = other_image.height() as i32;

    let image_buf: &mut [u8] = image.as_mut();
    let other_buf = other_image.as_raw();

    for y in 0..other_height {
        let target_y = y + y_offset;
        if target_y < 0 || target_y >= image_height {
            continue;
        }
        for x in 0..other_width {
            let target_x = x + x_offset;
            if target_x < 0 || target_x >= image_width {
                continue;
            }

            let target_index = ((target_y * image_width + target_x) * 4) as usize;
            let source_index = ((y * other_width + x) * 4) as usize;

            let px2 = &other_buf[source_index..source_index + 4];
            if px2[3] == 0 && *blend_mode == BlendMode::Over {
                continue;
            }
            let px1 = &mut image_buf[target_index..target_index + 4];

            let blended = BlendRgba::blend_u8(px1, px2, blend_mode);
            px1.copy_from_slice(&blended);
        }
    }
}

/// Smallest rectangle `(x, y, width, height)` holding every visible pixel.
pub fn visible_bounds(image: &RgbaImage) -> Option<(u32, u32, u32, u32)> {
    zone!("visible_bounds");
    let mut min_x = u32::MAX;
    let mut min_y = u32::MAX;
    let mut max_x = 0;
    let mut max_y = 0;
    let mut found = false;
    for (x, y, pixel) in image.enumerate_pixels() {
        if pixel.0[3] > VISIBLE_ALPHA_THRESHOLD {
            found = true;
            min_x = min_x.min(x);
            min_y = min_y.min(y);
            max_x = max_x.max(x);
            max_y = max_y.max(y);
        }
    }
    if !found {
        return None;
    }
    Some((min_x, min_y, max_x - min_x + 1, max_y - min_y + 1))
}

/// Trims the transparent border. Images without visible pixels come back unchanged.
pub fn crop_to_visible(image: &RgbaImage) -> RgbaImage {
    zone!("crop_to_visible");
    match visible_bounds(image) {
        Some((x, y, width, height)) => {
            if x == 0 && y == 0 && width == image.width() && height == image.height() {
                return image.clone();
            }
            imageops::crop_imm(image, x, y, width, height).to_image()
        }
        None => image.clone(),
    }
}

/// Resizes by averaging the source pixels each target pixel covers. Color is averaged over
/// the non-transparent samples only, alpha over the whole covered area.
pub fn scale(image: &mut RgbaImage, target_width: u32, target_height: u32) {
    zone!("scale");
    let (width, height) = image.dimensions();
    if (width, height) == (target_width, target_height) {
        return;
    }
    let mut output = RgbaImage::new(target_width, target_height);
    if width == 0 || height == 0 || target_width == 0 || target_height == 0 {
        *image = output;
        return;
    }
    let columns: Vec<Range<u32>> = (0..target_width)
        .map(|tx| source_span(tx, width, target_width))
        .collect();
    let source: &RgbaImage = image;
    let output_buf: &mut [u8] = output.as_mut();
    output_buf
        .par_chunks_exact_mut(target_width as usize * 4)
        .enumerate()
        .for_each(|(ty, row)| {
            let rows = source_span(ty as u32, height, target_height);
            for (px, columns) in row.chunks_exact_mut(4).zip(&columns) {
                px.copy_from_slice(&average(source, columns.clone(), rows.clone()));
            }
        });
    *image = output;
}

/// Source indices under target index `t`. Upscaling samples a single source pixel.
fn source_span(t: u32, source: u32, target: u32) -> Range<u32> {
    let ratio = source as f32 / target as f32;
    let start = (t as f32 * ratio).floor() as u32;
    let end = if target >= source {
        start + 1
    } else {
        ((t + 1) as f32 * ratio).ceil() as u32
    };
    start..end.min(source)
}

fn average(image: &RgbaImage, columns: Range<u32>, rows: Range<u32>) -> [u8; 4] {
    let area = (columns.len().max(1) * rows.len().max(1)) as u32;
    let mut sums = [0u32; 4];
    let mut samples = 0u32;
    for y in rows {
        for x in columns.clone() {
            let px = image.get_pixel(x, y).0;
            if px[3] == 0 {
                continue;
            }
            for (sum, channel) in sums.iter_mut().zip(px) {
                *sum += channel as u32;
            }
            samples += 1;
        }
    }
    if samples == 0 {
        return [0; 4];
    }
    [
        (sums[0] / samples) as u8,
        (sums[1] / samples) as u8,
        (sums[2] / samples) as u8,
        (sums[3] / area) as u8,
    ]
}

pub fn flip_horizontal(image: &mut RgbaImage) {
    imageops::flip_horizontal_in_place(image);
}

pub fn flip_vertical(image: &mut RgbaImage) {
    imageops::flip_vertical_in_place(image);
}

/// Maps any angle onto (-180, 180].
pub fn normalize_degrees(angle: f32) -> f32 {
    let mut angle = angle % 360.0;
    if angle > 180.0 {
        angle -= 360.0;
    } else if angle <= -180.0 {
        angle += 360.0;
    }
    angle
}

/// Rotates clockwise by `angle` degrees around the image center.
/// The canvas grows so that no corner is clipped.
pub fn turn(image: &mut RgbaImage, angle: f32) {
    zone!("turn");
    let angle = normalize_degrees(angle);
    // Optimized rotations
    if angle == 0.0 {
        return;
    } else if angle == 90.0 {
        *image = imageops::rotate90(image);
        return;
    } else if angle == -90.0 {
        *image = imageops::rotate270(image);
        return;
    } else if angle == 180.0 {
        *image = imageops::rotate180(image);
        return;
    }
    // Arbitrary rotations
    let rad = -angle.to_radians();
    let sin_rad = rad.sin();
    let cos_rad = rad.cos();
    let image_width = image.width();
    let image_height = image.height();
    let output_width = rotated_extent(image_width, image_height, cos_rad, sin_rad);
    let output_height = rotated_extent(image_height, image_width, cos_rad, sin_rad);
    let center_x = (image_width as f32 - 1.0) / 2.0;
    let center_y = (image_height as f32 - 1.0) / 2.0;
    let out_center_x = (output_width as f32 - 1.0) / 2.0;
    let out_center_y = (output_height as f32 - 1.0) / 2.0;
    let src_buf = image.as_raw();
    let mut output = RgbaImage::new(output_width, output_height);
    let output_buf: &mut [u8] = output.as_mut();

    output_buf
        .par_chunks_exact_mut(4)
        .enumerate()
        .for_each(|(i, out_pixel)| {
            let dst_x = (i % output_width as usize) as f32;
            let dst_y = (i / output_width as usize) as f32;
            let dx = dst_x - out_center_x;
            let dy = dst_y - out_center_y;
            let src_x = (dx * cos_rad - dy * sin_rad + center_x).round() as i32;
            let src_y = (dx * sin_rad + dy * cos_rad + center_y).round() as i32;
            if src_x >= 0 && src_x < image_width as i32 && src_y >= 0 && src_y < image_height as i32 {
                let src_i = (src_y as usize * image_width as usize + src_x as usize) * 4;
                out_pixel.copy_from_slice(&src_buf[src_i..src_i + 4]);
            } else {
                out_pixel.copy_from_slice(&[0, 0, 0, 0]);
            }
        });
    *image = output
}

fn rotated_extent(along: u32, across: u32, cos_rad: f32, sin_rad: f32) -> u32 {
    let extent = along as f32 * cos_rad.abs() + across as f32 * sin_rad.abs();
    ((extent - 1e-3).ceil() as u32).max(1)
}
