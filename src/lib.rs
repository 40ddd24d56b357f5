use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub mod color;
pub mod font;
pub mod layout;
pub mod persistence;
pub mod render;
pub mod reveal;
pub mod session;
pub mod startup_checks;

use color::HexColor;
use layout::Rotation;
use render::WatermarkStyle;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub app: AppConfig,
    #[serde(default)]
    pub watermark: WatermarkConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AppConfig {
    pub name: String,
    pub log_level: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct WatermarkConfig {
    pub font_path: PathBuf,
    pub font_size: u32,
    pub rotation: Rotation,
    pub color: HexColor,
    pub outline_color: HexColor,
    pub outline_width: u32,
    /// Keep the watermark centered on the bottom edge.
    pub lock_bottom: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Sub-folder (next to the images) that receives `.bak` copies.
    pub backup_directory: String,
    pub jpeg_quality: u8,
    /// Highest `(n)` suffix tried before giving up on a free file name.
    pub max_collision_suffix: u32,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            name: "Renameimg".to_string(),
            log_level: "info".to_string(),
        }
    }
}

impl Default for WatermarkConfig {
    fn default() -> Self {
        Self {
            font_path: PathBuf::from("static/DejaVuSans.ttf"),
            font_size: 100,
            rotation: Rotation::Deg0,
            color: HexColor::WHITE,
            outline_color: HexColor::BLACK,
            outline_width: 4,
            lock_bottom: true,
        }
    }
}

impl WatermarkConfig {
    pub fn style(&self) -> WatermarkStyle {
        WatermarkStyle {
            fill: self.color.rgba(),
            outline: self.outline_color.rgba(),
            outline_width: self.outline_width,
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            backup_directory: "backup".to_string(),
            jpeg_quality: 100,
            max_collision_suffix: 10_000,
        }
    }
}
