use super::fixtures::{pixel, solid, CLEAR, RED, WHITE};
use gdps_iconforge::iconforge::{
    atlas::Palette,
    blending::{BlendMode, Rgba as BlendRgba},
    icon_operations::{
        blend_icon, crop_to_visible, darken, normalize_degrees, scale, tint, turn, visible_bounds,
    },
};
use image::{Rgba, RgbaImage};

#[test]
fn tint_multiplies_rgb_and_keeps_alpha() {
    let mut image = RgbaImage::new(2, 1);
    image.put_pixel(0, 0, Rgba([200, 100, 50, 128]));
    image.put_pixel(1, 0, Rgba([10, 20, 30, 0]));
    tint(&mut image, [128, 255, 0]);
    assert_eq!(pixel(&image, 0, 0), [100, 100, 0, 128]);
    // fully transparent pixels are not touched at all
    assert_eq!(pixel(&image, 1, 0), [10, 20, 30, 0]);
}

#[test]
fn tint_with_white_is_identity() {
    let mut image = solid(3, 3, [12, 34, 56, 200]);
    let before = image.clone();
    tint(&mut image, [255, 255, 255]);
    assert_eq!(image, before);
}

#[test]
fn unknown_palette_ids_are_white() {
    let palette = Palette::from_json(r#"[{"id": 1, "r": 0, "g": 0, "b": 255}]"#).unwrap();
    assert_eq!(palette.len(), 1);
    assert_eq!(palette.get(1), [0, 0, 255]);
    assert_eq!(palette.get(99), [255, 255, 255]);

    let mut image = solid(2, 2, [90, 80, 70, 255]);
    tint(&mut image, palette.get(99));
    assert_eq!(pixel(&image, 1, 1), [90, 80, 70, 255]);
}

#[test]
fn multiply_blend_caps_at_255() {
    let blended = BlendRgba::blend_u8(&[255, 128, 0, 255], &[255, 255, 255, 255], &BlendMode::Multiply);
    assert_eq!(blended, [255, 128, 0, 255]);
}

#[test]
fn over_blend_mixes_partial_alpha() {
    let blended = BlendRgba::blend_u8(&[0, 0, 255, 255], &[255, 0, 0, 128], &BlendMode::Over);
    assert_eq!(blended[3], 255);
    assert!(blended[0] > 120 && blended[0] < 136);
    assert!(blended[2] > 120 && blended[2] < 136);
}

#[test]
fn crop_trims_transparent_border() {
    let mut image = RgbaImage::new(10, 8);
    image.put_pixel(3, 2, Rgba(RED));
    image.put_pixel(6, 5, Rgba(RED));
    // at or below the visibility threshold
    image.put_pixel(0, 0, Rgba([255, 255, 255, 2]));
    assert_eq!(visible_bounds(&image), Some((3, 2, 4, 4)));

    let cropped = crop_to_visible(&image);
    assert_eq!(cropped.dimensions(), (4, 4));
    assert_eq!(pixel(&cropped, 0, 0), RED);
    assert_eq!(pixel(&cropped, 3, 3), RED);
}

#[test]
fn crop_is_idempotent() {
    let mut image = RgbaImage::new(16, 16);
    for x in 4..9 {
        image.put_pixel(x, 7, Rgba(WHITE));
    }
    image.put_pixel(5, 12, Rgba([1, 2, 3, 3]));
    let once = crop_to_visible(&image);
    let twice = crop_to_visible(&once);
    assert_eq!(once, twice);
    assert_eq!(once.dimensions(), (5, 6));
}

#[test]
fn crop_of_invisible_image_is_unchanged() {
    let image = solid(5, 4, [255, 255, 255, 1]);
    assert_eq!(visible_bounds(&image), None);
    assert_eq!(crop_to_visible(&image), image);
}

#[test]
fn darken_halves_rgb_only() {
    let mut image = solid(2, 2, [200, 100, 51, 77]);
    darken(&mut image, 0.5);
    assert_eq!(pixel(&image, 0, 0), [100, 50, 26, 77]);
}

#[test]
fn blend_icon_clips_to_canvas() {
    let mut canvas = RgbaImage::new(4, 4);
    blend_icon(&mut canvas, &solid(3, 3, RED), &BlendMode::Over, (-1, 2));
    assert_eq!(pixel(&canvas, 0, 2), RED);
    assert_eq!(pixel(&canvas, 1, 3), RED);
    assert_eq!(pixel(&canvas, 2, 2), CLEAR);
    assert_eq!(pixel(&canvas, 0, 1), CLEAR);
}

#[test]
fn blend_icon_keeps_destination_under_transparent_source() {
    let mut canvas = solid(2, 2, RED);
    blend_icon(&mut canvas, &RgbaImage::new(2, 2), &BlendMode::Over, (0, 0));
    assert_eq!(pixel(&canvas, 1, 1), RED);
}

#[test]
fn scale_resizes_both_ways() {
    let mut image = solid(4, 2, RED);
    scale(&mut image, 8, 4);
    assert_eq!(image.dimensions(), (8, 4));
    assert_eq!(pixel(&image, 7, 3), RED);
    scale(&mut image, 2, 1);
    assert_eq!(image.dimensions(), (2, 1));
    assert_eq!(pixel(&image, 0, 0), RED);
}

#[test]
fn scale_averages_color_over_opaque_samples() {
    let mut image = RgbaImage::new(2, 1);
    image.put_pixel(0, 0, Rgba(RED));
    scale(&mut image, 1, 1);
    assert_eq!(pixel(&image, 0, 0), [255, 0, 0, 127]);

    let mut empty = RgbaImage::new(0, 0);
    scale(&mut empty, 3, 2);
    assert_eq!(empty.dimensions(), (3, 2));
}

#[test]
fn degrees_normalize_into_half_open_range() {
    assert_eq!(normalize_degrees(0.0), 0.0);
    assert_eq!(normalize_degrees(270.0), -90.0);
    assert_eq!(normalize_degrees(-180.0), 180.0);
    assert_eq!(normalize_degrees(540.0), 180.0);
    assert_eq!(normalize_degrees(-450.0), -90.0);
}

#[test]
fn turn_rotates_clockwise() {
    let mut image = RgbaImage::new(3, 2);
    image.put_pixel(0, 0, Rgba(RED));
    turn(&mut image, 90.0);
    assert_eq!(image.dimensions(), (2, 3));
    // the top-left corner ends up top-right
    assert_eq!(pixel(&image, 1, 0), RED);

    let mut image = RgbaImage::new(3, 2);
    image.put_pixel(0, 0, Rgba(RED));
    turn(&mut image, -90.0);
    // and bottom-left the other way round
    assert_eq!(pixel(&image, 0, 2), RED);
}

#[test]
fn turn_grows_canvas_for_arbitrary_angles() {
    let mut image = solid(10, 10, WHITE);
    turn(&mut image, 45.0);
    assert!(image.width() >= 14 && image.width() <= 15);
    assert_eq!(image.width(), image.height());
    let center = image.width() / 2;
    assert_eq!(pixel(&image, center, center), WHITE);
    assert_eq!(pixel(&image, 0, 0), CLEAR);
}
