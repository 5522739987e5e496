use image::{imageops, Rgba, RgbaImage};
use imageproc::drawing::draw_line_segment_mut;

use super::Color;

const BOTTOM_LINE_COLOR: Color = Color::new(220, 40, 40);
const TOP_LINE_COLOR: Color = Color::new(40, 90, 220);
/// Share of a row's pixels that must be dark for the row to count as text.
const MIN_ROW_INK_RATIO: f64 = 0.01;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LineLayer {
    Bottom,
    Top,
}

impl LineLayer {
    pub const ALL: [LineLayer; 2] = [LineLayer::Bottom, LineLayer::Top];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineDetectionOptions {
    /// Luma below which a pixel counts as ink.
    pub dark_threshold: u8,
    /// Shortest band of text rows reported as a line.
    pub min_line_height: u32,
}

impl Default for LineDetectionOptions {
    fn default() -> Self {
        Self {
            dark_threshold: 128,
            min_line_height: 4,
        }
    }
}

/// One detected text line. `top` and `bottom` are inclusive rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextLine {
    pub top: u32,
    pub bottom: u32,
    pub left: u32,
    pub right: u32,
}

pub trait LineDetector {
    fn set_image(&mut self, image: &RgbaImage);
    /// Runs detection on the bound image; returns the number of lines found.
    fn detect(&mut self, options: &LineDetectionOptions) -> usize;
    fn has_detected_lines(&self) -> bool;
    fn bottom_lines_overlay(&self) -> Option<&RgbaImage>;
    fn top_lines_overlay(&self) -> Option<&RgbaImage>;
}

/// Finds text lines from the horizontal projection profile of dark pixels.
#[derive(Debug, Default)]
pub struct ProjectionLineDetector {
    image: Option<RgbaImage>,
    lines: Vec<TextLine>,
    bottom_overlay: Option<RgbaImage>,
    top_overlay: Option<RgbaImage>,
}

impl ProjectionLineDetector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> &[TextLine] {
        &self.lines
    }

    fn render_overlay(
        width: u32,
        height: u32,
        rows: impl Iterator<Item = (u32, u32, u32)>,
        color: Color,
    ) -> RgbaImage {
        let mut overlay = RgbaImage::from_pixel(width, height, Rgba([0, 0, 0, 0]));
        for (y, left, right) in rows {
            draw_line_segment_mut(
                &mut overlay,
                (left as f32, y as f32),
                (right as f32, y as f32),
                color.to_rgba(255),
            );
        }
        overlay
    }
}

impl LineDetector for ProjectionLineDetector {
    fn set_image(&mut self, image: &RgbaImage) {
        self.image = Some(image.clone());
        self.lines.clear();
        self.bottom_overlay = None;
        self.top_overlay = None;
    }

    fn detect(&mut self, options: &LineDetectionOptions) -> usize {
        let Some(image) = self.image.as_ref() else {
            tracing::warn!("line detection requested without an image");
            return 0;
        };

        let lines = find_text_lines(image, options);
        let (width, height) = image.dimensions();
        self.bottom_overlay = Some(Self::render_overlay(
            width,
            height,
            lines.iter().map(|line| (line.bottom, line.left, line.right)),
            BOTTOM_LINE_COLOR,
        ));
        self.top_overlay = Some(Self::render_overlay(
            width,
            height,
            lines.iter().map(|line| (line.top, line.left, line.right)),
            TOP_LINE_COLOR,
        ));
        tracing::debug!(
            lines = lines.len(),
            dark_threshold = options.dark_threshold,
            min_line_height = options.min_line_height,
            "text line detection finished"
        );
        self.lines = lines;
        self.lines.len()
    }

    fn has_detected_lines(&self) -> bool {
        !self.lines.is_empty()
    }

    fn bottom_lines_overlay(&self) -> Option<&RgbaImage> {
        self.bottom_overlay.as_ref()
    }

    fn top_lines_overlay(&self) -> Option<&RgbaImage> {
        self.top_overlay.as_ref()
    }
}

fn find_text_lines(image: &RgbaImage, options: &LineDetectionOptions) -> Vec<TextLine> {
    let gray = imageops::grayscale(image);
    let (width, height) = gray.dimensions();
    let min_ink = ((f64::from(width) * MIN_ROW_INK_RATIO).ceil() as u32).max(1);

    // Per row: dark pixel count and horizontal extent.
    let rows: Vec<Option<(u32, u32)>> = (0..height)
        .map(|y| {
            let mut count = 0_u32;
            let mut extent: Option<(u32, u32)> = None;
            for x in 0..width {
                if gray.get_pixel(x, y).0[0] < options.dark_threshold {
                    count += 1;
                    extent = Some(extent.map_or((x, x), |(left, _)| (left, x)));
                }
            }
            extent.filter(|_| count >= min_ink)
        })
        .collect();

    let mut lines = Vec::new();
    let mut band: Option<TextLine> = None;
    for (y, row) in rows.iter().enumerate() {
        let y = y as u32;
        match (*row, band.as_mut()) {
            (Some((left, right)), Some(current)) => {
                current.bottom = y;
                current.left = current.left.min(left);
                current.right = current.right.max(right);
            }
            (Some((left, right)), None) => {
                band = Some(TextLine {
                    top: y,
                    bottom: y,
                    left,
                    right,
                });
            }
            (None, _) => {
                if let Some(finished) = band.take() {
                    lines.push(finished);
                }
            }
        }
    }
    lines.extend(band);
    lines.retain(|line| line.bottom - line.top + 1 >= options.min_line_height);
    lines
}
