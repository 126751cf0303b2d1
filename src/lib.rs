pub mod config;
pub mod error;
pub mod iconforge;
pub mod jobs;
pub mod logging;

pub use config::{Config, Quality};
pub use error::{Error, Result};
pub use iconforge::{
    build_icon, encode_png, render_icon_png, render_profile_icon, render_profile_icon_set,
};
