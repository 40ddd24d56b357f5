use image::{Rgba, RgbaImage};

/// Measures rendered text. Sizes are pixel heights of the font's em box.
pub trait TextMeasure {
    /// Width and height of `text` drawn at `font_size`.
    fn measure(&self, text: &str, font_size: u32) -> (u32, u32);
}

/// Draws text onto an RGBA layer.
pub trait GlyphPainter: TextMeasure {
    /// Draw `text` with its top-left corner at `(x, y)`.
    fn paint(
        &self,
        layer: &mut RgbaImage,
        text: &str,
        font_size: u32,
        x: i32,
        y: i32,
        color: Rgba<u8>,
    );
}
