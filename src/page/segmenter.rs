use image::{imageops, GrayImage, Rgba, RgbaImage};
use imageproc::drawing::draw_line_segment_mut;
use imageproc::edges::canny;
use imageproc::filter::gaussian_blur_f32;
use imageproc::geometric_transformations::{warp_into, Interpolation, Projection};
use imageproc::hough::{detect_lines, LineDetectionOptions as HoughOptions, PolarLine};

use super::hypothesis::{deduplicate_hypotheses, PageHypothesis, Quad};
use crate::geometry::{Color, ImageBounds, PointF};

/// Smallest page, as a share of the image area.
pub const MIN_PAGE_AREA_RATIO: f64 = 0.10;
/// Corner distance, as a share of the image diagonal, under which two
/// hypotheses describe the same page.
pub const DUPLICATE_CORNER_RATIO: f64 = 0.02;

/// Page boundary detection and the two ways of applying it.
pub trait PageSegmenter {
    fn compute(&self, image: &RgbaImage) -> Vec<PageHypothesis>;
    fn deduplicate(
        &self,
        hypotheses: Vec<PageHypothesis>,
        bounds: ImageBounds,
    ) -> Vec<PageHypothesis>;
    fn crop_to_hypothesis(&self, image: &RgbaImage, hypothesis: &PageHypothesis) -> RgbaImage;
    fn draw_hypotheses(&self, image: &RgbaImage, hypotheses: &[PageHypothesis]) -> RgbaImage;
}

#[derive(Debug, Clone, PartialEq)]
pub struct HoughPageSegmenter {
    /// One detection pass per blur strength.
    pub blur_sigmas: Vec<f32>,
    pub canny_low: f32,
    pub canny_high: f32,
    pub suppression_radius: u32,
    /// Degrees a line may deviate from horizontal or vertical.
    pub angle_tolerance: u32,
    pub line_width: u32,
    pub line_color: Color,
}

impl Default for HoughPageSegmenter {
    fn default() -> Self {
        Self {
            blur_sigmas: vec![2.0, 3.5],
            canny_low: 50.0,
            canny_high: 150.0,
            suppression_radius: 8,
            angle_tolerance: 20,
            line_width: 3,
            line_color: Color::new(255, 0, 0),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Side {
    Top,
    Bottom,
    Left,
    Right,
}

impl HoughPageSegmenter {
    pub fn new() -> Self {
        Self::default()
    }

    fn detect_quad(&self, gray: &GrayImage, sigma: f32) -> Option<PageHypothesis> {
        let (width, height) = gray.dimensions();
        let blurred = gaussian_blur_f32(gray, sigma);
        let edges = canny(&blurred, self.canny_low, self.canny_high);

        let diagonal = f64::from(width).hypot(f64::from(height));
        let options = HoughOptions {
            vote_threshold: (diagonal * 0.25).max(80.0) as u32,
            suppression_radius: self.suppression_radius,
        };
        let lines = detect_lines(&edges, options);
        let (horizontal, vertical) = self.classify(&lines);
        tracing::debug!(
            sigma,
            lines = lines.len(),
            horizontal = horizontal.len(),
            vertical = vertical.len(),
            "hough pass"
        );
        if horizontal.len() < 2 || vertical.len() < 2 {
            return None;
        }

        let center = PointF::new(f64::from(width) / 2.0, f64::from(height) / 2.0);
        let top = extreme_line(&horizontal, center, Side::Top)?;
        let bottom = extreme_line(&horizontal, center, Side::Bottom)?;
        let left = extreme_line(&vertical, center, Side::Left)?;
        let right = extreme_line(&vertical, center, Side::Right)?;

        let quad = Quad::new([
            intersect(&top, &left)?,
            intersect(&top, &right)?,
            intersect(&bottom, &right)?,
            intersect(&bottom, &left)?,
        ]);
        let image_area = f64::from(width) * f64::from(height);
        let area = quad.area();
        if area < image_area * MIN_PAGE_AREA_RATIO {
            tracing::debug!(area, image_area, "page candidate too small");
            return None;
        }
        Some(PageHypothesis::new(quad, area / image_area))
    }

    /// Splits lines into (horizontal, vertical). A polar angle near 90 degrees
    /// is a horizontal line, near 0 or 180 a vertical one.
    fn classify(&self, lines: &[PolarLine]) -> (Vec<PolarLine>, Vec<PolarLine>) {
        let tolerance = self.angle_tolerance;
        let horizontal = lines
            .iter()
            .copied()
            .filter(|line| line.angle_in_degrees.abs_diff(90) <= tolerance)
            .collect();
        let vertical = lines
            .iter()
            .copied()
            .filter(|line| {
                line.angle_in_degrees <= tolerance || line.angle_in_degrees >= 180 - tolerance
            })
            .collect();
        (horizontal, vertical)
    }

    fn draw_edge(&self, canvas: &mut RgbaImage, from: PointF, to: PointF) {
        let color = self.line_color.to_rgba(255);
        let half = (self.line_width.max(1) / 2) as i32;
        for offset in -half..=half {
            let offset = offset as f32;
            draw_line_segment_mut(
                canvas,
                (from.x as f32 + offset, from.y as f32),
                (to.x as f32 + offset, to.y as f32),
                color,
            );
            draw_line_segment_mut(
                canvas,
                (from.x as f32, from.y as f32 + offset),
                (to.x as f32, to.y as f32 + offset),
                color,
            );
        }
    }
}

impl PageSegmenter for HoughPageSegmenter {
    fn compute(&self, image: &RgbaImage) -> Vec<PageHypothesis> {
        let (width, height) = image.dimensions();
        if width < 3 || height < 3 {
            return Vec::new();
        }
        let gray = imageops::grayscale(image);
        self.blur_sigmas
            .iter()
            .filter_map(|sigma| self.detect_quad(&gray, *sigma))
            .collect()
    }

    fn deduplicate(
        &self,
        hypotheses: Vec<PageHypothesis>,
        bounds: ImageBounds,
    ) -> Vec<PageHypothesis> {
        let diagonal = f64::from(bounds.width).hypot(f64::from(bounds.height));
        deduplicate_hypotheses(hypotheses, diagonal * DUPLICATE_CORNER_RATIO)
    }

    fn crop_to_hypothesis(&self, image: &RgbaImage, hypothesis: &PageHypothesis) -> RgbaImage {
        let quad = &hypothesis.quad;
        let (width, height) = image.dimensions();

        if quad.is_axis_aligned(1.0) {
            let (min_x, min_y, max_x, max_y) = quad.bounding_box();
            let x = min_x.round().clamp(0.0, f64::from(width)) as u32;
            let y = min_y.round().clamp(0.0, f64::from(height)) as u32;
            let right = max_x.round().clamp(0.0, f64::from(width)) as u32;
            let bottom = max_y.round().clamp(0.0, f64::from(height)) as u32;
            if right <= x || bottom <= y {
                return image.clone();
            }
            return imageops::crop_imm(image, x, y, right - x, bottom - y).to_image();
        }

        let [top_left, top_right, bottom_right, bottom_left] = quad.corners;
        let out_width = top_left
            .distance_to(top_right)
            .max(bottom_left.distance_to(bottom_right))
            .round()
            .max(1.0);
        let out_height = top_left
            .distance_to(bottom_left)
            .max(top_right.distance_to(bottom_right))
            .round()
            .max(1.0);

        let source = quad.corners.map(|corner| (corner.x as f32, corner.y as f32));
        let target = [
            (0.0, 0.0),
            (out_width as f32, 0.0),
            (out_width as f32, out_height as f32),
            (0.0, out_height as f32),
        ];
        let Some(projection) = Projection::from_control_points(source, target) else {
            tracing::warn!(quad = ?quad, "degenerate page quad; keeping original");
            return image.clone();
        };

        let mut output = RgbaImage::new(out_width as u32, out_height as u32);
        warp_into(
            image,
            &projection,
            Interpolation::Bilinear,
            Rgba([255, 255, 255, 255]),
            &mut output,
        );
        output
    }

    fn draw_hypotheses(&self, image: &RgbaImage, hypotheses: &[PageHypothesis]) -> RgbaImage {
        let mut canvas = image.clone();
        for hypothesis in hypotheses {
            for (from, to) in hypothesis.quad.edges() {
                self.draw_edge(&mut canvas, from, to);
            }
        }
        canvas
    }
}

/// Position of `line` where it crosses the centre row (vertical lines) or
/// centre column (horizontal lines).
fn position_at_center(line: &PolarLine, center: PointF, horizontal: bool) -> Option<f64> {
    let theta = f64::from(line.angle_in_degrees).to_radians();
    let (sin, cos) = theta.sin_cos();
    let r = f64::from(line.r);
    if horizontal {
        (sin.abs() > 1e-6).then(|| (r - center.x * cos) / sin)
    } else {
        (cos.abs() > 1e-6).then(|| (r - center.y * sin) / cos)
    }
}

fn extreme_line(lines: &[PolarLine], center: PointF, side: Side) -> Option<PolarLine> {
    let horizontal = matches!(side, Side::Top | Side::Bottom);
    let positioned = lines
        .iter()
        .filter_map(|line| position_at_center(line, center, horizontal).map(|pos| (pos, *line)));
    let pick = match side {
        Side::Top | Side::Left => positioned.min_by(|a, b| a.0.total_cmp(&b.0)),
        Side::Bottom | Side::Right => positioned.max_by(|a, b| a.0.total_cmp(&b.0)),
    };
    pick.map(|(_, line)| line)
}

/// Intersection of two lines `x cos(t) + y sin(t) = r`; `None` when parallel.
fn intersect(a: &PolarLine, b: &PolarLine) -> Option<PointF> {
    let (sin_a, cos_a) = f64::from(a.angle_in_degrees).to_radians().sin_cos();
    let (sin_b, cos_b) = f64::from(b.angle_in_degrees).to_radians().sin_cos();
    let denom = cos_a * sin_b - sin_a * cos_b;
    if denom.abs() < 1e-6 {
        return None;
    }
    let (r_a, r_b) = (f64::from(a.r), f64::from(b.r));
    Some(PointF::new(
        (r_a * sin_b - r_b * sin_a) / denom,
        (r_b * cos_a - r_a * cos_b) / denom,
    ))
}
