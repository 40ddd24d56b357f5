pub mod metrics;
pub mod rotation;

pub use metrics::{GlyphPainter, TextMeasure};
pub use rotation::Rotation;

use tracing::debug;

/// Smallest font size bottom-center fitting will shrink to.
pub const MIN_FONT_SIZE: u32 = 10;

/// Largest font size the style controls accept.
pub const MAX_FONT_SIZE: u32 = 800;

/// Share of the image width the auto-fitted text may occupy.
pub const MAX_WIDTH_RATIO: f32 = 0.96;

/// Gap between the text box and the bottom edge, as a share of image height.
pub const BOTTOM_MARGIN_RATIO: f32 = 0.01;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Size {
    pub width: f32,
    pub height: f32,
}

impl Size {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// Image dimensions as reported by the decoder.
    pub fn from_pixels(width: u32, height: u32) -> Self {
        Self::new(width as f32, height as f32)
    }
}

/// Axis-aligned rectangle in canvas coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }
}

/// Where and how large the watermark text is drawn.
///
/// `origin` is the top-left corner of the unrotated text box; the rotation is
/// applied about the box center.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    pub origin: Point,
    pub font_size: u32,
    pub rotation: Rotation,
    pub text_box: Size,
}

impl Placement {
    pub fn center(&self) -> Point {
        Point::new(
            self.origin.x + self.text_box.width / 2.0,
            self.origin.y + self.text_box.height / 2.0,
        )
    }

    /// Bounding box of the rotated text box.
    pub fn bounds(&self) -> Rect {
        let rotated = self.rotation.bounding_size(self.text_box);
        let center = self.center();
        Rect {
            x: center.x - rotated.width / 2.0,
            y: center.y - rotated.height / 2.0,
            width: rotated.width,
            height: rotated.height,
        }
    }
}

/// Extent of the drawn text at `font_size`, including the glyph outline.
pub fn text_box<M: TextMeasure + ?Sized>(
    measure: &M,
    text: &str,
    font_size: u32,
    outline_width: u32,
) -> Size {
    let (width, height) = measure.measure(text, font_size);
    let pad = outline_padding(outline_width) * 2;
    Size::from_pixels(width + pad, height + pad)
}

/// Pixels the outline stroke extends past the glyphs on each side.
pub fn outline_padding(outline_width: u32) -> u32 {
    outline_width.div_ceil(2)
}

/// Keep a box of `size` inside `canvas` by moving `proposed` as little as possible.
///
/// When the box is larger than the canvas on an axis it is pinned to 0 on that axis.
pub fn clamp(proposed: Point, size: Size, canvas: Size) -> Point {
    Point::new(
        clamp_axis(proposed.x, size.width, canvas.width),
        clamp_axis(proposed.y, size.height, canvas.height),
    )
}

fn clamp_axis(start: f32, extent: f32, limit: f32) -> f32 {
    if start < 0.0 {
        0.0
    } else if start + extent > limit {
        (limit - extent).max(0.0)
    } else {
        start
    }
}

/// Free placement: move the text so its rotated bounds stay on the canvas.
pub fn clamp_placement(placement: Placement, canvas: Size) -> Placement {
    let bounds = placement.bounds();
    let clamped = clamp(
        Point::new(bounds.x, bounds.y),
        Size::new(bounds.width, bounds.height),
        canvas,
    );
    Placement {
        origin: Point::new(
            placement.origin.x + (clamped.x - bounds.x),
            placement.origin.y + (clamped.y - bounds.y),
        ),
        ..placement
    }
}

/// Place text at a proposed origin, clamped to the canvas.
pub fn place_free<M: TextMeasure + ?Sized>(
    measure: &M,
    text: &str,
    request: &LayoutRequest,
    proposed: Point,
) -> Option<Placement> {
    if text.is_empty() {
        return None;
    }
    let placement = Placement {
        origin: proposed,
        font_size: request.font_size,
        rotation: request.rotation,
        text_box: text_box(measure, text, request.font_size, request.outline_width),
    };
    Some(clamp_placement(placement, request.canvas))
}

/// Inputs shared by both placement policies.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayoutRequest {
    pub canvas: Size,
    pub font_size: u32,
    pub rotation: Rotation,
    pub outline_width: u32,
}

/// Center the text horizontally and anchor it just above the bottom edge.
///
/// Text wider than the allowed width is shrunk once, proportionally, to no
/// less than [`MIN_FONT_SIZE`]. The returned placement carries the effective
/// font size so callers can update the visible size control. Layout math runs
/// on the unrotated box; the requested rotation is applied afterwards.
pub fn place_bottom_center<M: TextMeasure + ?Sized>(
    measure: &M,
    text: &str,
    request: &LayoutRequest,
) -> Option<Placement> {
    if text.is_empty() {
        return None;
    }

    let canvas = request.canvas;
    let max_allowed_width = canvas.width * MAX_WIDTH_RATIO;

    let mut font_size = request.font_size;
    let mut size = text_box(measure, text, font_size, request.outline_width);

    if size.width > max_allowed_width {
        // The outline padding does not scale with the font size.
        let pad = (outline_padding(request.outline_width) * 2) as f32;
        let glyph_width = size.width - pad;
        let available = max_allowed_width - pad;
        font_size = if available > 0.0 && glyph_width > 0.0 {
            ((request.font_size as f32 * available / glyph_width).floor() as u32)
                .max(MIN_FONT_SIZE)
        } else {
            MIN_FONT_SIZE
        };
        size = text_box(measure, text, font_size, request.outline_width);

        // Real fonts measure with rounding, so step down until the box fits.
        while size.width > max_allowed_width && font_size > MIN_FONT_SIZE {
            font_size -= 1;
            size = text_box(measure, text, font_size, request.outline_width);
        }
        debug!(
            "Shrinking watermark from {} to {} to fit {}px",
            request.font_size, font_size, canvas.width
        );
    }

    let margin = canvas.height * BOTTOM_MARGIN_RATIO;
    let origin = Point::new(
        (canvas.width - size.width) / 2.0,
        canvas.height - size.height - margin,
    );

    Some(Placement {
        origin,
        font_size,
        rotation: request.rotation,
        text_box: size,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Every glyph is `size / 2` wide and the line is `size` tall.
    struct HalfEm;

    impl TextMeasure for HalfEm {
        fn measure(&self, text: &str, font_size: u32) -> (u32, u32) {
            (text.chars().count() as u32 * font_size / 2, font_size)
        }
    }

    fn request(width: u32, height: u32, font_size: u32) -> LayoutRequest {
        LayoutRequest {
            canvas: Size::from_pixels(width, height),
            font_size,
            rotation: Rotation::Deg0,
            outline_width: 0,
        }
    }

    #[test]
    fn test_clamp_inside_is_unchanged() {
        let p = clamp(
            Point::new(10.0, 20.0),
            Size::new(50.0, 30.0),
            Size::new(200.0, 100.0),
        );
        assert_eq!(p, Point::new(10.0, 20.0));
    }

    #[test]
    fn test_clamp_every_edge() {
        let size = Size::new(50.0, 30.0);
        let canvas = Size::new(200.0, 100.0);

        assert_eq!(clamp(Point::new(-5.0, -1.0), size, canvas), Point::new(0.0, 0.0));
        assert_eq!(clamp(Point::new(190.0, 90.0), size, canvas), Point::new(150.0, 70.0));
    }

    #[test]
    fn test_clamp_keeps_box_on_canvas() {
        let size = Size::new(37.0, 13.0);
        let canvas = Size::new(120.0, 80.0);
        for x in (-200..300).step_by(17) {
            for y in (-200..300).step_by(23) {
                let p = clamp(Point::new(x as f32, y as f32), size, canvas);
                assert!(p.x >= 0.0 && p.x + size.width <= canvas.width);
                assert!(p.y >= 0.0 && p.y + size.height <= canvas.height);
            }
        }
    }

    #[test]
    fn test_clamp_oversized_box_pins_to_origin() {
        let p = clamp(
            Point::new(40.0, 5.0),
            Size::new(300.0, 10.0),
            Size::new(200.0, 100.0),
        );
        assert_eq!(p, Point::new(0.0, 5.0));
    }

    #[test]
    fn test_clamp_rotated_placement_uses_rotated_bounds() {
        let placement = Placement {
            origin: Point::new(0.0, 0.0),
            font_size: 20,
            rotation: Rotation::Deg90,
            text_box: Size::new(60.0, 20.0),
        };
        let clamped = clamp_placement(placement, Size::new(200.0, 200.0));
        let bounds = clamped.bounds();
        // Standing upright the box pokes 20px above the top edge.
        assert!((bounds.x - 20.0).abs() < 1e-3);
        assert!((bounds.y - 0.0).abs() < 1e-3);
        assert!((clamped.origin.y - 20.0).abs() < 1e-3);
        assert!((bounds.width - 20.0).abs() < 1e-3);
        assert!((bounds.height - 60.0).abs() < 1e-3);
    }

    #[test]
    fn test_bottom_center_no_shrink() {
        let req = request(1000, 500, 40);
        let placement = place_bottom_center(&HalfEm, "hello", &req).unwrap();

        assert_eq!(placement.font_size, 40);
        assert_eq!(placement.text_box, Size::new(100.0, 40.0));
        assert!((placement.origin.x - 450.0).abs() < 1e-3);
        assert!((placement.origin.y - (500.0 - 40.0 - 5.0)).abs() < 1e-3);
    }

    #[test]
    fn test_bottom_center_shrinks_once() {
        let req = request(200, 100, 100);
        // 10 glyphs * 50px = 500px, far wider than 192px.
        let placement = place_bottom_center(&HalfEm, "abcdefghij", &req).unwrap();

        assert!(placement.font_size < 100);
        assert!(placement.font_size >= MIN_FONT_SIZE);
        assert_eq!(placement.font_size, 38);
        assert!(placement.text_box.width <= 200.0 * MAX_WIDTH_RATIO);
    }

    #[test]
    fn test_bottom_center_shrink_accounts_for_outline() {
        let mut req = request(200, 100, 100);
        req.outline_width = 4;
        let placement = place_bottom_center(&HalfEm, "abcdefghij", &req).unwrap();

        // 188px left for glyphs after 2px of outline on each side.
        assert_eq!(placement.font_size, 37);
        assert_eq!(placement.text_box.width, 189.0);
        assert!(placement.text_box.width <= 200.0 * MAX_WIDTH_RATIO);

        // Laying out again at the shrunk size keeps it.
        req.font_size = placement.font_size;
        assert_eq!(place_bottom_center(&HalfEm, "abcdefghij", &req), Some(placement));
    }

    #[test]
    fn test_bottom_center_minimum_size_may_overflow() {
        let req = request(50, 50, 100);
        let text = "a very long watermark that cannot possibly fit";
        let placement = place_bottom_center(&HalfEm, text, &req).unwrap();

        assert_eq!(placement.font_size, MIN_FONT_SIZE);
        assert!(placement.text_box.width > 50.0);
        assert!(placement.origin.x < 0.0);
    }

    #[test]
    fn test_empty_text_has_no_placement() {
        let req = request(100, 100, 20);
        assert!(place_bottom_center(&HalfEm, "", &req).is_none());
        assert!(place_free(&HalfEm, "", &req, Point::new(0.0, 0.0)).is_none());
    }

    #[test]
    fn test_bottom_center_keeps_requested_rotation() {
        let mut req = request(1000, 500, 40);
        req.rotation = Rotation::Deg45;
        let straight = place_bottom_center(&HalfEm, "hello", &request(1000, 500, 40)).unwrap();
        let rotated = place_bottom_center(&HalfEm, "hello", &req).unwrap();

        assert_eq!(rotated.rotation, Rotation::Deg45);
        assert_eq!(rotated.origin, straight.origin);
    }

    #[test]
    fn test_text_box_includes_outline() {
        let size = text_box(&HalfEm, "ab", 20, 4);
        assert_eq!(size, Size::new(24.0, 24.0));
        assert_eq!(outline_padding(3), 2);
    }
}
