use crate::layout::{GlyphPainter, Placement, outline_padding};
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::{CompressionType, FilterType, PngEncoder};
use image::{DynamicImage, ExtendedColorType, ImageEncoder, ImageError, ImageFormat, Rgba, RgbaImage};
use imageproc::geometric_transformations::{Interpolation, rotate_about_center};
use std::io::Cursor;
use std::path::Path;
use tracing::debug;

/// Raster formats the tool reads and writes, keyed by file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Jpeg,
    Png,
    Bmp,
    Gif,
}

impl OutputFormat {
    pub const EXTENSIONS: [&'static str; 5] = ["jpg", "jpeg", "png", "bmp", "gif"];

    /// Format implied by the extension of `path`, ignoring case.
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "jpg" | "jpeg" => Some(OutputFormat::Jpeg),
            "png" => Some(OutputFormat::Png),
            "bmp" => Some(OutputFormat::Bmp),
            "gif" => Some(OutputFormat::Gif),
            _ => None,
        }
    }

    pub fn image_format(&self) -> ImageFormat {
        match self {
            OutputFormat::Jpeg => ImageFormat::Jpeg,
            OutputFormat::Png => ImageFormat::Png,
            OutputFormat::Bmp => ImageFormat::Bmp,
            OutputFormat::Gif => ImageFormat::Gif,
        }
    }
}

/// Colors of the watermark glyphs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WatermarkStyle {
    pub fill: Rgba<u8>,
    pub outline: Rgba<u8>,
    pub outline_width: u32,
}

impl Default for WatermarkStyle {
    fn default() -> Self {
        Self {
            fill: Rgba([255, 255, 255, 255]),
            outline: Rgba([0, 0, 0, 255]),
            outline_width: 4,
        }
    }
}

/// Text positioned on a specific image.
#[derive(Debug, Clone, Copy)]
pub struct Watermark<'a> {
    pub text: &'a str,
    pub placement: Placement,
    pub style: WatermarkStyle,
}

/// Draw the outlined text onto a transparent layer the size of the text box.
pub fn render_text_layer<P: GlyphPainter + ?Sized>(painter: &P, watermark: &Watermark) -> RgbaImage {
    let placement = &watermark.placement;
    let width = placement.text_box.width.ceil().max(1.0) as u32;
    let height = placement.text_box.height.ceil().max(1.0) as u32;
    let mut layer = RgbaImage::new(width, height);

    let pad = outline_padding(watermark.style.outline_width) as i32;
    let size = placement.font_size;

    // Stroke by stamping the glyphs around a disc, then fill on top.
    if pad > 0 {
        for dy in -pad..=pad {
            for dx in -pad..=pad {
                if dx * dx + dy * dy > pad * pad {
                    continue;
                }
                painter.paint(
                    &mut layer,
                    watermark.text,
                    size,
                    pad + dx,
                    pad + dy,
                    watermark.style.outline,
                );
            }
        }
    }
    painter.paint(&mut layer, watermark.text, size, pad, pad, watermark.style.fill);

    layer
}

/// Rotate a text layer clockwise about its center, returning its bounding box.
pub fn rotate_layer(layer: &RgbaImage, placement: &Placement) -> RgbaImage {
    if placement.rotation.is_upright() {
        return layer.clone();
    }

    let (w, h) = layer.dimensions();
    let side = ((w as f32).hypot(h as f32)).ceil() as u32;
    let mut square = RgbaImage::new(side, side);
    image::imageops::overlay(
        &mut square,
        layer,
        ((side - w) / 2) as i64,
        ((side - h) / 2) as i64,
    );

    let rotated = rotate_about_center(
        &square,
        placement.rotation.radians(),
        Interpolation::Bilinear,
        Rgba([0, 0, 0, 0]),
    );

    let bounds = placement.bounds();
    let crop_w = (bounds.width.ceil() as u32).clamp(1, side);
    let crop_h = (bounds.height.ceil() as u32).clamp(1, side);
    image::imageops::crop_imm(
        &rotated,
        (side - crop_w) / 2,
        (side - crop_h) / 2,
        crop_w,
        crop_h,
    )
    .to_image()
}

/// Composite the base image and the watermark into a buffer of the base size.
///
/// Uncovered pixels stay transparent.
pub fn flatten<P: GlyphPainter + ?Sized>(
    base: &DynamicImage,
    watermark: Option<&Watermark>,
    painter: &P,
) -> RgbaImage {
    let mut canvas = RgbaImage::new(base.width(), base.height());
    image::imageops::overlay(&mut canvas, &base.to_rgba8(), 0, 0);

    if let Some(watermark) = watermark {
        let layer = render_text_layer(painter, watermark);
        let layer = rotate_layer(&layer, &watermark.placement);
        let bounds = watermark.placement.bounds();
        debug!(
            "Drawing watermark {:?} at ({:.1}, {:.1}) size {} rotation {}",
            watermark.text,
            bounds.x,
            bounds.y,
            watermark.placement.font_size,
            watermark.placement.rotation
        );
        image::imageops::overlay(
            &mut canvas,
            &layer,
            bounds.x.round() as i64,
            bounds.y.round() as i64,
        );
    }

    canvas
}

/// Encode at the highest quality the format offers.
pub fn encode(image: &RgbaImage, format: OutputFormat, jpeg_quality: u8) -> Result<Vec<u8>, ImageError> {
    let mut buffer = Cursor::new(Vec::new());

    match format {
        OutputFormat::Jpeg => {
            // JPEG doesn't support alpha channel, so convert to RGB
            let rgb_image = DynamicImage::ImageRgba8(image.clone()).to_rgb8();
            let encoder = JpegEncoder::new_with_quality(&mut buffer, jpeg_quality);
            encoder.write_image(
                &rgb_image,
                rgb_image.width(),
                rgb_image.height(),
                ExtendedColorType::Rgb8,
            )?;
        }
        OutputFormat::Png => {
            let encoder =
                PngEncoder::new_with_quality(&mut buffer, CompressionType::Best, FilterType::Adaptive);
            encoder.write_image(image, image.width(), image.height(), ExtendedColorType::Rgba8)?;
        }
        OutputFormat::Bmp => {
            let rgb_image = DynamicImage::ImageRgba8(image.clone()).to_rgb8();
            DynamicImage::ImageRgb8(rgb_image).write_to(&mut buffer, format.image_format())?;
        }
        OutputFormat::Gif => {
            DynamicImage::ImageRgba8(image.clone()).write_to(&mut buffer, format.image_format())?;
        }
    }

    Ok(buffer.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::{Point, Rotation, Size, TextMeasure};

    /// Paints each glyph as a solid block `size / 2` wide and `size` tall.
    struct BlockGlyphs;

    impl TextMeasure for BlockGlyphs {
        fn measure(&self, text: &str, font_size: u32) -> (u32, u32) {
            (text.chars().count() as u32 * font_size / 2, font_size)
        }
    }

    impl GlyphPainter for BlockGlyphs {
        fn paint(&self, layer: &mut RgbaImage, text: &str, font_size: u32, x: i32, y: i32, color: Rgba<u8>) {
            let (w, h) = self.measure(text, font_size);
            for py in y.max(0)..(y + h as i32).min(layer.height() as i32) {
                for px in x.max(0)..(x + w as i32).min(layer.width() as i32) {
                    layer.put_pixel(px as u32, py as u32, color);
                }
            }
        }
    }

    fn watermark(origin: Point, rotation: Rotation, outline_width: u32) -> Watermark<'static> {
        let pad = outline_padding(outline_width) as f32 * 2.0;
        Watermark {
            text: "abcd",
            placement: Placement {
                origin,
                font_size: 10,
                rotation,
                text_box: Size::new(20.0 + pad, 10.0 + pad),
            },
            style: WatermarkStyle {
                fill: Rgba([255, 0, 0, 255]),
                outline: Rgba([0, 0, 255, 255]),
                outline_width,
            },
        }
    }

    #[test]
    fn test_output_format_from_path() {
        assert_eq!(OutputFormat::from_path(Path::new("a/b.JPG")), Some(OutputFormat::Jpeg));
        assert_eq!(OutputFormat::from_path(Path::new("b.jpeg")), Some(OutputFormat::Jpeg));
        assert_eq!(OutputFormat::from_path(Path::new("b.Gif")), Some(OutputFormat::Gif));
        assert_eq!(OutputFormat::from_path(Path::new("b.webp")), None);
        assert_eq!(OutputFormat::from_path(Path::new("noext")), None);
    }

    #[test]
    fn test_text_layer_has_outline_and_fill() {
        let wm = watermark(Point::new(0.0, 0.0), Rotation::Deg0, 4);
        let layer = render_text_layer(&BlockGlyphs, &wm);

        assert_eq!(layer.dimensions(), (24, 14));
        assert_eq!(layer.get_pixel(0, 7), &Rgba([0, 0, 255, 255]));
        assert_eq!(layer.get_pixel(12, 7), &Rgba([255, 0, 0, 255]));
    }

    #[test]
    fn test_flatten_keeps_base_size_and_places_text() {
        let base = DynamicImage::ImageRgba8(RgbaImage::from_pixel(100, 50, Rgba([0, 255, 0, 255])));
        let wm = watermark(Point::new(10.0, 20.0), Rotation::Deg0, 0);

        let out = flatten(&base, Some(&wm), &BlockGlyphs);

        assert_eq!(out.dimensions(), (100, 50));
        assert_eq!(out.get_pixel(15, 25), &Rgba([255, 0, 0, 255]));
        assert_eq!(out.get_pixel(5, 5), &Rgba([0, 255, 0, 255]));
        assert_eq!(out.get_pixel(35, 25), &Rgba([0, 255, 0, 255]));
    }

    #[test]
    fn test_flatten_without_watermark_copies_base() {
        let base = DynamicImage::ImageRgba8(RgbaImage::from_pixel(8, 8, Rgba([0, 0, 255, 255])));
        let out = flatten(&base, None, &BlockGlyphs);
        assert!(out.pixels().all(|p| *p == Rgba([0, 0, 255, 255])));
    }

    #[test]
    fn test_flatten_preserves_transparency() {
        let base = DynamicImage::ImageRgba8(RgbaImage::from_pixel(8, 8, Rgba([0, 0, 0, 0])));
        let out = flatten(&base, None, &BlockGlyphs);
        assert_eq!(out.get_pixel(4, 4)[3], 0);
    }

    #[test]
    fn test_rotated_layer_matches_bounds() {
        let wm = watermark(Point::new(40.0, 40.0), Rotation::Deg90, 0);
        let layer = render_text_layer(&BlockGlyphs, &wm);
        let rotated = rotate_layer(&layer, &wm.placement);

        assert_eq!(rotated.dimensions(), (10, 20));
        // Upright text column is filled through its middle.
        assert!(rotated.get_pixel(5, 10)[3] > 200);
    }

    #[test]
    fn test_encode_formats_decode_back() {
        let img = RgbaImage::from_pixel(16, 12, Rgba([200, 100, 50, 255]));
        for format in [OutputFormat::Jpeg, OutputFormat::Png, OutputFormat::Bmp, OutputFormat::Gif] {
            let bytes = encode(&img, format, 100).unwrap();
            let decoded = image::load_from_memory_with_format(&bytes, format.image_format()).unwrap();
            assert_eq!((decoded.width(), decoded.height()), (16, 12), "{:?}", format);
        }
    }
}
