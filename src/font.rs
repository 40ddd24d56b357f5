use crate::layout::{GlyphPainter, TextMeasure};
use ab_glyph::{FontVec, PxScale};
use image::{Rgba, RgbaImage};
use imageproc::drawing::{draw_text_mut, text_size};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum FontError {
    #[error("Font file not found: {0:?}")]
    NotFound(PathBuf),

    #[error("Failed to read font file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse font file {0:?}")]
    Invalid(PathBuf),
}

/// A TrueType/OpenType font used to measure and draw watermark text.
pub struct WatermarkFont {
    font: FontVec,
}

impl WatermarkFont {
    // Loaded at runtime so the font stays a deployment choice.
    pub fn load(path: &Path) -> Result<Self, FontError> {
        if !path.exists() {
            return Err(FontError::NotFound(path.to_path_buf()));
        }

        let font_data = std::fs::read(path)?;
        let font =
            FontVec::try_from_vec(font_data).map_err(|_| FontError::Invalid(path.to_path_buf()))?;
        debug!("Loaded watermark font from {:?}", path);

        Ok(Self { font })
    }

    fn scale(font_size: u32) -> PxScale {
        PxScale::from(font_size as f32)
    }
}

impl TextMeasure for WatermarkFont {
    fn measure(&self, text: &str, font_size: u32) -> (u32, u32) {
        text_size(Self::scale(font_size), &self.font, text)
    }
}

impl GlyphPainter for WatermarkFont {
    fn paint(
        &self,
        layer: &mut RgbaImage,
        text: &str,
        font_size: u32,
        x: i32,
        y: i32,
        color: Rgba<u8>,
    ) {
        draw_text_mut(layer, color, x, y, Self::scale(font_size), &self.font, text);
    }
}
