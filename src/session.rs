//! Editing state for one folder of images.
//!
//! A [`Session`] owns the working set, the image being edited and the
//! watermark controls. Every mutation of text, size, rotation or the
//! lock-bottom flag ends in [`Session::reconcile_placement`], which is the
//! only place the watermark gets laid out.
//!
//! Remembered text and position are carried from one image to the next and
//! reset when a folder is loaded.

pub mod error;
pub mod scan;

pub use error::SessionError;
pub use scan::scan_folder;

use crate::layout::{
    self, GlyphPainter, LayoutRequest, MAX_FONT_SIZE, MIN_FONT_SIZE, Placement, Point, Rotation, Size,
};
use crate::persistence::{self, SaveError, SaveOutcome, SaveRequest, file_stem};
use crate::render::{Watermark, WatermarkStyle};
use crate::{OutputConfig, WatermarkConfig};
use image::{DynamicImage, ImageReader, Rgba};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Relative position used for free placement before anything is remembered.
pub const DEFAULT_POSITION_RATIO: (f32, f32) = (0.5, 0.9);

/// Highest zoom slider value; 0 is the 1:1 view.
pub const MAX_ZOOM: u16 = 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Navigation {
    Moved(usize),
    AtStart,
    AtEnd,
    Empty,
}

pub struct Session<F> {
    font: F,
    style: WatermarkStyle,
    output: OutputConfig,

    images: Vec<PathBuf>,
    index: Option<usize>,
    image: Option<DynamicImage>,

    text: String,
    output_stem: String,
    remembered_text: String,
    remembered_ratio: (f32, f32),

    lock_bottom: bool,
    font_size: u32,
    rotation: Rotation,
    zoom: u16,
    placement: Option<Placement>,
}

impl<F: GlyphPainter> Session<F> {
    pub fn new(font: F, watermark: &WatermarkConfig, output: &OutputConfig) -> Self {
        Self {
            font,
            style: watermark.style(),
            output: output.clone(),
            images: Vec::new(),
            index: None,
            image: None,
            text: String::new(),
            output_stem: String::new(),
            remembered_text: String::new(),
            remembered_ratio: DEFAULT_POSITION_RATIO,
            lock_bottom: watermark.lock_bottom,
            font_size: watermark.font_size.clamp(MIN_FONT_SIZE, MAX_FONT_SIZE),
            rotation: watermark.rotation,
            zoom: 0,
            placement: None,
        }
    }

    /// Replace the working set with the images in `dir` and open the first.
    ///
    /// An empty folder leaves the session untouched.
    pub fn load_folder(&mut self, dir: &Path) -> Result<usize, SessionError> {
        let images = scan_folder(dir)?;
        if images.is_empty() {
            warn!("No images in {:?}", dir);
            return Err(SessionError::NoImages(dir.to_path_buf()));
        }

        info!("Loaded {} images from {:?}", images.len(), dir);
        self.images = images;
        self.index = Some(0);
        self.remembered_text.clear();
        self.remembered_ratio = DEFAULT_POSITION_RATIO;
        self.load_current();

        Ok(self.images.len())
    }

    /// Decode the current image and restore the remembered watermark on it.
    ///
    /// An unreadable image leaves the session without a canvas; navigation
    /// still works but nothing can be saved.
    pub fn load_current(&mut self) {
        let Some(path) = self.current_path().map(Path::to_path_buf) else {
            return;
        };

        self.zoom = 0;
        self.placement = None;
        self.image = match decode(&path) {
            Ok(image) => Some(image),
            Err(e) => {
                warn!("Skipping unreadable image {:?}: {}", path, e);
                None
            }
        };

        self.text = self.remembered_text.clone();
        self.output_stem = if self.remembered_text.is_empty() {
            file_stem(&path)
        } else {
            self.remembered_text.clone()
        };

        debug!(
            "Opened {:?} ({}/{})",
            path,
            self.index.map_or(0, |i| i + 1),
            self.images.len()
        );
        self.reconcile_placement();
    }

    /// Lay the watermark out again from the current controls.
    ///
    /// Safe to call any number of times; the result only depends on the
    /// current text, size, rotation, lock flag and position.
    pub fn reconcile_placement(&mut self) {
        let Some(canvas) = self.canvas() else {
            self.placement = None;
            return;
        };
        if self.text.is_empty() {
            self.placement = None;
            return;
        }

        let request = self.layout_request(canvas);
        self.placement = if self.lock_bottom {
            self.bottom_center(&request)
        } else {
            let origin = self
                .placement
                .map(|p| p.origin)
                .unwrap_or_else(|| self.remembered_origin(canvas));
            layout::place_free(&self.font, &self.text, &request, origin)
        };
    }

    /// Snap the watermark to the bottom center once, whatever the lock flag.
    pub fn move_to_bottom_center(&mut self) {
        let Some(canvas) = self.canvas() else {
            return;
        };
        let request = self.layout_request(canvas);
        if let Some(placement) = self.bottom_center(&request) {
            self.placement = Some(placement);
        }
    }

    fn bottom_center(&mut self, request: &LayoutRequest) -> Option<Placement> {
        let placement = layout::place_bottom_center(&self.font, &self.text, request)?;
        if placement.font_size != self.font_size {
            info!(
                "Font size reduced from {} to {} to fit the image",
                self.font_size, placement.font_size
            );
            self.font_size = placement.font_size;
        }
        Some(placement)
    }

    fn layout_request(&self, canvas: Size) -> LayoutRequest {
        LayoutRequest {
            canvas,
            font_size: self.font_size,
            rotation: self.rotation,
            outline_width: self.style.outline_width,
        }
    }

    fn remembered_origin(&self, canvas: Size) -> Point {
        Point::new(
            canvas.width * self.remembered_ratio.0,
            canvas.height * self.remembered_ratio.1,
        )
    }

    pub fn set_text(&mut self, text: &str) -> Result<(), SessionError> {
        if self.is_zoomed() {
            return Err(SessionError::Zoomed);
        }
        self.text = text.to_string();
        self.output_stem = text.to_string();
        self.reconcile_placement();
        Ok(())
    }

    /// Output name without extension; follows the text until set explicitly.
    pub fn set_output_stem(&mut self, stem: &str) {
        self.output_stem = stem.to_string();
    }

    pub fn set_font_size(&mut self, size: u32) {
        self.font_size = size.clamp(MIN_FONT_SIZE, MAX_FONT_SIZE);
        self.reconcile_placement();
    }

    pub fn set_rotation(&mut self, rotation: Rotation) {
        self.rotation = rotation;
        self.reconcile_placement();
    }

    pub fn set_fill_color(&mut self, color: Rgba<u8>) {
        self.style.fill = color;
        self.reconcile_placement();
    }

    pub fn set_lock_bottom(&mut self, locked: bool) {
        self.lock_bottom = locked;
        self.reconcile_placement();
    }

    /// Move the watermark by hand. Under lock-bottom it snaps back.
    pub fn drag_to(&mut self, proposed: Point) -> Option<Placement> {
        if self.is_zoomed() {
            return self.placement;
        }
        let canvas = self.canvas()?;
        let placement = self.placement?;

        self.placement = Some(layout::clamp_placement(
            Placement {
                origin: proposed,
                ..placement
            },
            canvas,
        ));
        if self.lock_bottom {
            self.reconcile_placement();
        }
        self.placement
    }

    /// Zoom slider position, `0..=MAX_ZOOM`. Editing and saving are refused
    /// while it is above 0.
    pub fn set_zoom(&mut self, level: u16) {
        self.zoom = level.min(MAX_ZOOM);
    }

    pub fn zoom_scale(&self) -> f32 {
        1.0 + (self.zoom as f32 / MAX_ZOOM as f32) * 3.0
    }

    pub fn is_zoomed(&self) -> bool {
        self.zoom != 0
    }

    pub fn next(&mut self) -> Navigation {
        match self.index {
            None => Navigation::Empty,
            Some(i) if i + 1 >= self.images.len() => Navigation::AtEnd,
            Some(i) => {
                self.index = Some(i + 1);
                self.load_current();
                Navigation::Moved(i + 1)
            }
        }
    }

    pub fn prev(&mut self) -> Navigation {
        match self.index {
            None => Navigation::Empty,
            Some(0) => Navigation::AtStart,
            Some(i) => {
                self.index = Some(i - 1);
                self.load_current();
                Navigation::Moved(i - 1)
            }
        }
    }

    pub fn select(&mut self, index: usize) -> Result<(), SessionError> {
        if index >= self.images.len() {
            return Err(SessionError::IndexOutOfRange {
                index,
                len: self.images.len(),
            });
        }
        if self.index != Some(index) {
            self.index = Some(index);
            self.load_current();
        }
        Ok(())
    }

    /// Remember where the free-placed watermark sits, relative to the image.
    fn remember_position(&mut self) {
        if self.is_zoomed() || self.lock_bottom {
            return;
        }
        if let (Some(canvas), Some(placement)) = (self.canvas(), self.placement)
            && canvas.width > 0.0
            && canvas.height > 0.0
        {
            self.remembered_ratio = (
                placement.origin.x / canvas.width,
                placement.origin.y / canvas.height,
            );
        }
    }

    /// Write the current image with its watermark, then open the next one.
    ///
    /// The working-set entry is replaced by the saved path.
    pub fn save_and_next(&mut self) -> Result<(SaveOutcome, Navigation), SaveError> {
        if self.is_zoomed() {
            warn!("Save refused while zoomed in");
            return Err(SaveError::ZoomedView);
        }
        let index = self.index.ok_or(SaveError::NoImage)?;
        if self.image.is_none() {
            return Err(SaveError::NoImage);
        }
        if self.output_stem.trim().is_empty() {
            return Err(SaveError::EmptyName);
        }

        self.remembered_text = self.text.clone();
        self.remember_position();

        let source = self.images[index].clone();
        let outcome = {
            let Some(image) = self.image.as_ref() else {
                return Err(SaveError::NoImage);
            };
            let watermark = self.placement.map(|placement| Watermark {
                text: &self.text,
                placement,
                style: self.style,
            });
            let request = SaveRequest {
                source: &source,
                stem: &self.output_stem,
                image,
                watermark,
            };
            persistence::save(&request, &self.font, &self.output)?
        };

        self.images[index] = outcome.destination.clone();
        let navigation = self.next();
        if navigation == Navigation::AtEnd {
            info!("That was the last image");
        }

        Ok((outcome, navigation))
    }

    pub fn images(&self) -> &[PathBuf] {
        &self.images
    }

    pub fn index(&self) -> Option<usize> {
        self.index
    }

    pub fn current_path(&self) -> Option<&Path> {
        self.index.and_then(|i| self.images.get(i)).map(PathBuf::as_path)
    }

    pub fn image(&self) -> Option<&DynamicImage> {
        self.image.as_ref()
    }

    pub fn canvas(&self) -> Option<Size> {
        self.image
            .as_ref()
            .map(|image| Size::from_pixels(image.width(), image.height()))
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn output_stem(&self) -> &str {
        &self.output_stem
    }

    pub fn remembered_text(&self) -> &str {
        &self.remembered_text
    }

    pub fn remembered_ratio(&self) -> (f32, f32) {
        self.remembered_ratio
    }

    pub fn font_size(&self) -> u32 {
        self.font_size
    }

    pub fn rotation(&self) -> Rotation {
        self.rotation
    }

    pub fn lock_bottom(&self) -> bool {
        self.lock_bottom
    }

    pub fn style(&self) -> WatermarkStyle {
        self.style
    }

    pub fn placement(&self) -> Option<Placement> {
        self.placement
    }
}

fn decode(path: &Path) -> Result<DynamicImage, image::ImageError> {
    ImageReader::open(path)?.with_guessed_format()?.decode()
}
