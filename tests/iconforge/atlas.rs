use super::fixtures::{pixel, plist_xml, solid, SheetFrame, Fixture, BLUE, CLEAR, GREEN, RED};
use gdps_iconforge::{
    iconforge::{
        atlas::{parse_frames, parse_numbers, Atlas, FrameDescriptor, SourceRect},
        cosmetics::{CosmeticSelection, IconKind, LevelRating},
        image_cache::{clear_caches, icon_limits, load_atlas, load_palette},
        sprite::{extract, piece_number, LayerRole, PartId},
    },
    Error, Quality,
};
use image::{Rgba, RgbaImage};
use indexmap::IndexMap;
use std::path::Path;

fn atlas_with(sheet: RgbaImage) -> Atlas {
    Atlas {
        base_name: String::from("player_01"),
        quality: Quality::Medium,
        sheet,
        frames: IndexMap::new(),
    }
}

fn frame(rect: (i32, i32, i32, i32), rotated: bool) -> FrameDescriptor {
    FrameDescriptor {
        rect: SourceRect {
            x: rect.0,
            y: rect.1,
            width: rect.2,
            height: rect.3,
        },
        rotated,
        offset: (0, 0),
    }
}

#[test]
fn numbers_are_read_out_of_braces() {
    assert_eq!(
        parse_numbers("{{69, 2},{61,60}}"),
        Some(vec![69.0, 2.0, 61.0, 60.0])
    );
    assert_eq!(parse_numbers("{-1.5,3}"), Some(vec![-1.5, 3.0]));
    assert_eq!(parse_numbers("{}"), None);
    assert_eq!(parse_numbers("{a,b}"), None);
}

#[test]
fn frames_parse_in_order() {
    let mut rotated = SheetFrame::new("player_01_2_001.png", (12, 0, 6, 4), (-1, 3));
    rotated.rotated = true;
    let xml = plist_xml(&[
        SheetFrame::new("player_01_001.png", (0, 0, 10, 12), (2, -1)),
        rotated,
    ]);
    let frames = parse_frames(xml.as_bytes(), Path::new("player_01-hd.plist")).unwrap();
    let names: Vec<&str> = frames.keys().map(String::as_str).collect();
    assert_eq!(names, ["player_01_001.png", "player_01_2_001.png"]);

    let first = &frames["player_01_001.png"];
    assert_eq!(first.rect, SourceRect { x: 0, y: 0, width: 10, height: 12 });
    assert_eq!(first.offset, (2, -1));
    assert!(!first.rotated);

    let second = &frames["player_01_2_001.png"];
    assert!(second.rotated);
    assert_eq!(second.offset, (-1, 3));
}

#[test]
fn fractional_offsets_truncate() {
    let xml = plist_xml(&[SheetFrame::new("a.png", (0, 0, 1, 1), (0, 0))])
        .replace("<string>{0,0}</string>", "<string>{-2.75, 1.5}</string>");
    let frames = parse_frames(xml.as_bytes(), Path::new("a.plist")).unwrap();
    assert_eq!(frames["a.png"].offset, (-2, 1));
}

#[test]
fn malformed_rect_is_reported() {
    let xml = plist_xml(&[SheetFrame::new("a.png", (0, 0, 1, 1), (0, 0))])
        .replace("{{0,0},{1,1}}", "{{0,0},{one,1}}");
    let err = parse_frames(xml.as_bytes(), Path::new("a.plist")).unwrap_err();
    assert!(matches!(err, Error::MalformedDescriptor { .. }), "{err}");

    let err = parse_frames(b"not a property list", Path::new("b.plist")).unwrap_err();
    assert!(matches!(err, Error::MalformedDescriptor { .. }), "{err}");
}

#[test]
fn extract_copies_the_declared_rect() {
    let mut sheet = RgbaImage::new(8, 8);
    sheet.put_pixel(2, 3, Rgba(RED));
    let atlas = atlas_with(sheet);
    let image = extract(&atlas, "a", &frame((2, 3, 4, 2), false)).unwrap();
    assert_eq!(image.dimensions(), (4, 2));
    assert_eq!(pixel(&image, 0, 0), RED);
}

#[test]
fn rotated_frame_comes_back_upright() {
    // stored sideways as a 2x4 block
    let mut sheet = RgbaImage::new(6, 6);
    sheet.put_pixel(1, 1, Rgba(RED));
    sheet.put_pixel(2, 1, Rgba(GREEN));
    sheet.put_pixel(1, 4, Rgba(BLUE));
    let atlas = atlas_with(sheet);
    let image = extract(&atlas, "a", &frame((1, 1, 4, 2), true)).unwrap();
    assert_eq!(image.dimensions(), (4, 2));
    assert_eq!(pixel(&image, 3, 0), RED);
    assert_eq!(pixel(&image, 3, 1), GREEN);
    assert_eq!(pixel(&image, 0, 0), BLUE);
}

#[test]
fn degenerate_frames_are_rejected() {
    let atlas = atlas_with(solid(8, 8, RED));
    for (rect, rotated) in [
        ((0, 0, 0, 4), false),
        ((0, 0, 4, -1), true),
        ((8, 0, 4, 4), false),
        ((0, 9, 2, 4), false),
        ((-2, 0, 2, 2), false),
        ((0, -6, 2, 4), true),
    ] {
        let err = extract(&atlas, "bad", &frame(rect, rotated)).unwrap_err();
        assert!(matches!(err, Error::DegenerateFrame(_)), "{rect:?}: {err}");
    }
}

#[test]
fn frames_off_the_sheet_are_clipped() {
    let atlas = atlas_with(solid(8, 8, RED));

    let image = extract(&atlas, "right", &frame((6, 0, 4, 4), false)).unwrap();
    assert_eq!(image.dimensions(), (4, 4));
    assert_eq!(pixel(&image, 0, 0), RED);
    assert_eq!(pixel(&image, 1, 3), RED);
    assert_eq!(pixel(&image, 2, 0), CLEAR);
    assert_eq!(pixel(&image, 3, 3), CLEAR);

    let image = extract(&atlas, "left", &frame((-1, 0, 2, 2), false)).unwrap();
    assert_eq!(pixel(&image, 0, 0), CLEAR);
    assert_eq!(pixel(&image, 1, 1), RED);

    // stored sideways as 4x2 hanging off the bottom
    let image = extract(&atlas, "rotated", &frame((0, 7, 2, 4), true)).unwrap();
    assert_eq!(image.dimensions(), (2, 4));
    assert_eq!(image.pixels().filter(|px| px.0 == RED).count(), 4);
}

#[test]
fn layer_roles_follow_frame_names() {
    let cases = [
        ("player_01_glow_001.png", LayerRole::Glow, 1),
        ("player_01_3_001.png", LayerRole::Tertiary, 2),
        ("player_01_2_001.png", LayerRole::Secondary, 3),
        ("player_01_001.png", LayerRole::Primary, 4),
        ("player_01_Extra_001.png", LayerRole::Extra, 5),
        ("robot_01_02_GLOW_001.png", LayerRole::Glow, 1),
    ];
    for (name, role, order) in cases {
        assert_eq!(LayerRole::classify(name), role, "{name}");
        assert_eq!(role.order(), order);
    }
}

#[test]
fn piece_numbers_come_after_base_name() {
    assert_eq!(piece_number("robot_05_03_001.png", "robot_05"), Some(3));
    assert_eq!(piece_number("robot_05_glow_001.png", "robot_05"), None);
    assert_eq!(piece_number("spider_12_04_2_001.png", "spider_12"), Some(4));
    assert_eq!(piece_number("robot_06_03_001.png", "robot_05"), None);
    assert_eq!(PartId::Piece(3).to_string(), "03");
    assert_eq!(PartId::Full.to_string(), "full");
}

#[test]
fn atlas_falls_back_to_medium() {
    let fixture = Fixture::new("atlas_falls_back_to_medium");
    fixture.atlas(
        "player_01-hd",
        &solid(4, 4, RED),
        &[SheetFrame::new("player_01_001.png", (0, 0, 4, 4), (0, 0))],
    );

    let atlas = load_atlas(&fixture.config(Quality::Medium), IconKind::Cube, 1).unwrap();
    assert_eq!(atlas.quality, Quality::Medium);
    assert_eq!(atlas.base_name, "player_01");
    assert_eq!(atlas.frames.len(), 1);

    for requested in [Quality::High, Quality::Low] {
        let atlas = load_atlas(&fixture.config(requested), IconKind::Cube, 1).unwrap();
        assert_eq!(atlas.quality, Quality::Medium);
    }

    let err = load_atlas(&fixture.config(Quality::High), IconKind::Cube, 2).unwrap_err();
    assert!(matches!(err, Error::AssetNotFound(ref name) if name == "player_02"));
}

#[test]
fn atlas_prefers_requested_quality() {
    let fixture = Fixture::new("atlas_prefers_requested_quality");
    let frames = [SheetFrame::new("ship_03_001.png", (0, 0, 2, 2), (0, 0))];
    fixture
        .atlas("ship_03-hd", &solid(2, 2, RED), &frames)
        .atlas("ship_03-uhd", &solid(2, 2, BLUE), &frames);
    // a sheet without metadata does not count
    solid(2, 2, GREEN)
        .save(fixture.root.join("icons/ship_03.png"))
        .unwrap();

    let high = load_atlas(&fixture.config(Quality::High), IconKind::Ship, 3).unwrap();
    assert_eq!(high.quality, Quality::High);
    assert_eq!(pixel(&high.sheet, 0, 0), BLUE);

    let low = load_atlas(&fixture.config(Quality::Low), IconKind::Ship, 3).unwrap();
    assert_eq!(low.quality, Quality::Medium);
}

#[test]
fn unreadable_metadata_falls_through_to_next_quality() {
    let fixture = Fixture::new("unreadable_metadata_falls_through_to_next_quality");
    let frames = [SheetFrame::new("player_01_001.png", (0, 0, 2, 2), (0, 0))];
    fixture
        .atlas("player_01-hd", &solid(2, 2, RED), &frames)
        .atlas("player_01-uhd", &solid(2, 2, BLUE), &frames);
    std::fs::write(
        fixture.root.join("icons/player_01-uhd.plist"),
        "<plist><string>frames</string></plist>",
    )
    .unwrap();

    let atlas = load_atlas(&fixture.config(Quality::High), IconKind::Cube, 1).unwrap();
    assert_eq!(atlas.quality, Quality::Medium);
    assert_eq!(pixel(&atlas.sheet, 0, 0), RED);
}

#[test]
fn palette_loads_from_resources() {
    let fixture = Fixture::new("palette_loads_from_resources");
    fixture.palette(&[(0, [125, 255, 0]), (12, [0, 0, 0])]);
    let palette = load_palette(&fixture.config(Quality::Medium)).unwrap();
    assert_eq!(palette.get(0), [125, 255, 0]);
    assert_eq!(palette.get(12), [0, 0, 0]);
    assert_eq!(palette.get(3), [255, 255, 255]);

    let missing = Fixture::new("palette_missing");
    let err = load_palette(&missing.config(Quality::Medium)).unwrap_err();
    assert!(err.is_expected());
}

#[test]
fn palette_is_cached_until_cleared() {
    let fixture = Fixture::new("palette_is_cached_until_cleared");
    let config = fixture.config(Quality::Medium);
    fixture.palette(&[(1, [1, 2, 3])]);
    assert_eq!(load_palette(&config).unwrap().get(1), [1, 2, 3]);

    fixture.palette(&[(1, [9, 9, 9])]);
    assert_eq!(load_palette(&config).unwrap().get(1), [1, 2, 3]);

    clear_caches();
    assert_eq!(load_palette(&config).unwrap().get(1), [9, 9, 9]);
}

#[test]
fn icon_limits_scan_icon_directory() {
    let fixture = Fixture::new("icon_limits_scan_icon_directory");
    let icons = fixture.root.join("icons");
    for name in [
        "player_01-hd.plist",
        "player_12.plist",
        "player_07-uhd.plist",
        "player_ball_03-uhd.plist",
        "player_99-hd.png",
        "player_extra.plist",
        "robot_04-hd.plist",
    ] {
        std::fs::write(icons.join(name), "").unwrap();
    }
    let limits = icon_limits(&fixture.config(Quality::Medium));
    assert_eq!(limits.max_id(IconKind::Cube), 12);
    assert_eq!(limits.max_id(IconKind::Ball), 3);
    assert_eq!(limits.max_id(IconKind::Robot), 4);
    assert_eq!(limits.max_id(IconKind::Ship), 1);
    assert!(limits.contains(IconKind::Cube, 12));
    assert!(!limits.contains(IconKind::Cube, 13));
    assert!(!limits.contains(IconKind::Ship, 0));
}

#[test]
fn kinds_deserialize_from_numbers() {
    let kinds: Vec<IconKind> = serde_json::from_str("[0, 3, 5, 8]").unwrap();
    assert_eq!(
        kinds,
        [IconKind::Cube, IconKind::Ufo, IconKind::Robot, IconKind::Jetpack]
    );
    assert_eq!(IconKind::from_u8(42), IconKind::Cube);
    assert_eq!(IconKind::Ball.base_name(7), "player_ball_07");
    assert_eq!(IconKind::Wave.base_name(123), "dart_123");
}

#[test]
fn selection_reads_user_rows() {
    let row = serde_json::json!({
        "iconType": 6,
        "accIcon": 4, "accShip": 2, "accBall": 9, "accBird": 1, "accDart": 3,
        "accRobot": 5, "accSpider": 7, "accSwing": 2,
        "color1": 10, "color2": 11, "color3": 12,
        "accGlow": "1"
    });
    let selection: CosmeticSelection = serde_json::from_value(row).unwrap();
    assert_eq!(selection.equipped(), (IconKind::Spider, 7));
    assert!(selection.glow);
    assert_eq!(selection.colors().glow, 12);
    let set = selection.icon_set(true);
    assert_eq!(set.len(), 7);
    assert!(set.iter().all(|(kind, _)| *kind != IconKind::Spider));
    assert_eq!(set[0], (IconKind::Cube, 4));
    assert_eq!(selection.icon_set(false).len(), 8);

    let row = serde_json::json!({
        "iconType": 99,
        "accIcon": 4, "accShip": 2, "accBall": 9, "accBird": 1, "accDart": 3,
        "accRobot": 5, "accSpider": 7, "accSwing": 2, "accJetpack": 6,
        "color1": 10, "color2": 11, "accGlow": 0
    });
    let selection: CosmeticSelection = serde_json::from_value(row).unwrap();
    assert_eq!(selection.equipped(), (IconKind::Cube, 4));
    assert!(!selection.glow);
    assert_eq!(selection.icon_set(false).last(), Some(&(IconKind::Jetpack, 6)));
}

#[test]
fn rating_reads_level_rows() {
    let row = serde_json::json!({
        "starStars": 7, "starFeatured": 1, "starEpic": 2, "starDifficulty": 3,
        "starAuto": 0, "starDemon": false, "starDemonDiff": 0
    });
    let rating: LevelRating = serde_json::from_value(row).unwrap();
    assert_eq!(rating.stars, 7);
    assert!(rating.featured);
    assert_eq!(rating.epic, 2);
    assert!(!rating.auto && !rating.demon);
}
