use serde::Deserialize;
use serde_repr::Deserialize_repr;

/// Gamemode a cosmetic belongs to, numbered the way the game server stores `iconType`.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, PartialOrd, Ord, Deserialize_repr)]
#[repr(u8)]
pub enum IconKind {
    Cube = 0,
    Ship = 1,
    Ball = 2,
    Ufo = 3,
    Wave = 4,
    Robot = 5,
    Spider = 6,
    Swing = 7,
    Jetpack = 8,
}

pub const ALL_KINDS: [IconKind; 9] = [
    IconKind::Cube,
    IconKind::Ship,
    IconKind::Ball,
    IconKind::Ufo,
    IconKind::Wave,
    IconKind::Robot,
    IconKind::Spider,
    IconKind::Swing,
    IconKind::Jetpack,
];

impl IconKind {
    /// Unknown values render as a cube.
    pub fn from_u8(value: u8) -> IconKind {
        ALL_KINDS
            .get(value as usize)
            .copied()
            .unwrap_or(IconKind::Cube)
    }

    /// Prefix of the atlas files for this kind.
    pub fn type_name(self) -> &'static str {
        match self {
            IconKind::Cube => "player",
            IconKind::Ship => "ship",
            IconKind::Ball => "player_ball",
            IconKind::Ufo => "bird",
            IconKind::Wave => "dart",
            IconKind::Robot => "robot",
            IconKind::Spider => "spider",
            IconKind::Swing => "swing",
            IconKind::Jetpack => "jetpack",
        }
    }

    /// Robots and spiders are assembled from separately posed pieces.
    pub fn is_rig(self) -> bool {
        matches!(self, IconKind::Robot | IconKind::Spider)
    }

    pub fn base_name(self, id: u32) -> String {
        format!("{}_{id:02}", self.type_name())
    }
}

/// Palette ids for the three colorable layers.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash)]
pub struct IconColors {
    pub primary: u32,
    pub secondary: u32,
    pub glow: u32,
}

impl IconColors {
    pub fn new(primary: u32, secondary: u32, glow: u32) -> Self {
        IconColors {
            primary,
            secondary,
            glow,
        }
    }
}

/// Everything a user has equipped, as read from the `users` table.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CosmeticSelection {
    #[serde(deserialize_with = "lenient_kind")]
    pub icon_type: IconKind,
    #[serde(rename = "accIcon")]
    pub cube: u32,
    #[serde(rename = "accShip")]
    pub ship: u32,
    #[serde(rename = "accBall")]
    pub ball: u32,
    #[serde(rename = "accBird")]
    pub ufo: u32,
    #[serde(rename = "accDart")]
    pub wave: u32,
    #[serde(rename = "accRobot")]
    pub robot: u32,
    #[serde(rename = "accSpider")]
    pub spider: u32,
    #[serde(rename = "accSwing")]
    pub swing: u32,
    #[serde(rename = "accJetpack", default)]
    pub jetpack: Option<u32>,
    pub color1: u32,
    pub color2: u32,
    #[serde(default)]
    pub color3: u32,
    #[serde(rename = "accGlow", default, deserialize_with = "flag")]
    pub glow: bool,
}

impl CosmeticSelection {
    pub fn id_for(&self, kind: IconKind) -> Option<u32> {
        match kind {
            IconKind::Cube => Some(self.cube),
            IconKind::Ship => Some(self.ship),
            IconKind::Ball => Some(self.ball),
            IconKind::Ufo => Some(self.ufo),
            IconKind::Wave => Some(self.wave),
            IconKind::Robot => Some(self.robot),
            IconKind::Spider => Some(self.spider),
            IconKind::Swing => Some(self.swing),
            IconKind::Jetpack => self.jetpack,
        }
    }

    pub fn colors(&self) -> IconColors {
        IconColors::new(self.color1, self.color2, self.color3)
    }

    /// The kind and id shown as the user's main icon.
    pub fn equipped(&self) -> (IconKind, u32) {
        let kind = self.icon_type;
        (kind, self.id_for(kind).unwrap_or(1))
    }

    /// Every category the user has a selection for, in kind order.
    pub fn icon_set(&self, exclude_equipped: bool) -> Vec<(IconKind, u32)> {
        ALL_KINDS
            .iter()
            .filter(|kind| !(exclude_equipped && **kind == self.icon_type))
            .filter_map(|kind| self.id_for(*kind).map(|id| (*kind, id)))
            .collect()
    }
}

/// Rating columns of a row in the `levels` table.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct LevelRating {
    #[serde(rename = "starStars", default)]
    pub stars: i32,
    #[serde(rename = "starFeatured", default, deserialize_with = "flag")]
    pub featured: bool,
    #[serde(rename = "starEpic", default)]
    pub epic: u8,
    #[serde(rename = "starDifficulty", default)]
    pub difficulty: u8,
    #[serde(rename = "starAuto", default, deserialize_with = "flag")]
    pub auto: bool,
    #[serde(rename = "starDemon", default, deserialize_with = "flag")]
    pub demon: bool,
    #[serde(rename = "starDemonDiff", default)]
    pub demon_difficulty: u8,
}

fn lenient_kind<'de, D>(deserializer: D) -> Result<IconKind, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = i64::deserialize(deserializer)?;
    Ok(u8::try_from(value).map_or(IconKind::Cube, IconKind::from_u8))
}

/// The data store hands out booleans as 0/1 integers, numeric strings or real booleans.
fn flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Flag {
        Bool(bool),
        Int(i64),
        Text(String),
    }
    Ok(match Flag::deserialize(deserializer)? {
        Flag::Bool(value) => value,
        Flag::Int(value) => value == 1,
        Flag::Text(value) => value.trim() == "1",
    })
}
