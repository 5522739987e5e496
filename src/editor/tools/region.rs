use image::{GrayImage, Luma, Rgba, RgbaImage};
use imageproc::contours::find_contours;
use thiserror::Error;

use super::{Color, CoordinateMapper, ImageBounds, ToolBounds, ToolPoint};

/// Largest share of the image a single grown region may cover.
pub const MAX_SELECTION_AREA_RATIO: f64 = 0.5;
pub const DEFAULT_TOLERANCE: u8 = 40;

const CONTOUR_DASH_LENGTH: f64 = 6.0;
const CONTOUR_DASH_STEP: f64 = 3.0;
const CONTOUR_WIDTH: f64 = 1.0;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GrowError {
    #[error("no image bound to the region selector")]
    NoImage,
    #[error("seed {x},{y} lies outside the image")]
    SeedOutOfBounds { x: i32, y: i32 },
    #[error("selected area of {area} pixels exceeds the limit of {limit}")]
    AreaTooLarge { area: u64, limit: u64 },
}

/// Closed outline of a selected region in image pixel coordinates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContourPath {
    pub points: Vec<ToolPoint>,
}

/// Stroke used for selection outlines. `dash_offset` moves on every animation
/// tick to produce the marching-ants effect; `width` is in screen pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContourStyle {
    pub color: Color,
    pub width: f64,
    pub dash: [f64; 2],
    pub dash_offset: f64,
}

/// Pixels of the current selection cropped to their bounding box. Pixels
/// outside the selection are fully transparent.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectionCut {
    pub image: RgbaImage,
    pub bounds: ToolBounds,
}

/// Region-growing selection with undo history.
pub trait RegionSelector {
    fn set_image(&mut self, image: &RgbaImage, view: &CoordinateMapper);
    fn set_view(&mut self, view: &CoordinateMapper);
    fn grow(&mut self, seed: ToolPoint) -> Result<(), GrowError>;
    /// Removes the region touching `pixel`; returns whether one was removed.
    fn subtract_at(&mut self, pixel: ToolPoint) -> bool;
    /// Removes the newest region; returns whether regions remain.
    fn undo_last(&mut self) -> bool;
    fn clear_all(&mut self);
    fn set_tolerance(&mut self, tolerance: u8);
    fn tolerance(&self) -> u8;
    fn has_contours(&self) -> bool;
    fn contour_paths(&self) -> Vec<ContourPath>;
    fn contour_style(&self) -> ContourStyle;
    fn advance_animation(&mut self);
    fn extract_cut(&self) -> Option<SelectionCut>;
}

#[derive(Debug, Clone)]
struct SelectedRegion {
    bounds: ToolBounds,
    mask: GrayImage,
    contours: Vec<ContourPath>,
}

impl SelectedRegion {
    fn contains(&self, pixel: ToolPoint) -> bool {
        let local_x = pixel.x - self.bounds.x;
        let local_y = pixel.y - self.bounds.y;
        if local_x < 0 || local_y < 0 {
            return false;
        }
        let (local_x, local_y) = (local_x as u32, local_y as u32);
        local_x < self.mask.width()
            && local_y < self.mask.height()
            && self.mask.get_pixel(local_x, local_y).0[0] > 0
    }
}

/// 4-connected flood fill over colours within `tolerance` of the seed colour.
#[derive(Debug, Clone)]
pub struct FloodFillSelector {
    image: Option<RgbaImage>,
    tolerance: u8,
    regions: Vec<SelectedRegion>,
    dash_offset: f64,
    zoom: f64,
}

impl Default for FloodFillSelector {
    fn default() -> Self {
        Self::new()
    }
}

impl FloodFillSelector {
    pub fn new() -> Self {
        Self {
            image: None,
            tolerance: DEFAULT_TOLERANCE,
            regions: Vec::new(),
            dash_offset: 0.0,
            zoom: 1.0,
        }
    }

    pub fn region_count(&self) -> usize {
        self.regions.len()
    }

    fn area_limit(bounds: ImageBounds) -> u64 {
        let total = f64::from(bounds.width.max(0)) * f64::from(bounds.height.max(0));
        (total * MAX_SELECTION_AREA_RATIO) as u64
    }
}

impl RegionSelector for FloodFillSelector {
    fn set_image(&mut self, image: &RgbaImage, view: &CoordinateMapper) {
        self.image = Some(image.clone());
        self.regions.clear();
        self.set_view(view);
    }

    fn set_view(&mut self, view: &CoordinateMapper) {
        let zoom = view.zoom();
        self.zoom = if zoom.is_finite() && zoom > 0.0 { zoom } else { 1.0 };
    }

    fn grow(&mut self, seed: ToolPoint) -> Result<(), GrowError> {
        let image = self.image.as_ref().ok_or(GrowError::NoImage)?;
        let bounds = ImageBounds::of_image(image);
        if !bounds.contains_pixel(seed) {
            return Err(GrowError::SeedOutOfBounds {
                x: seed.x,
                y: seed.y,
            });
        }

        let limit = Self::area_limit(bounds);
        let fill = flood_fill(image, seed, self.tolerance);
        if fill.area > limit {
            tracing::debug!(area = fill.area, limit, "grown region rejected");
            return Err(GrowError::AreaTooLarge {
                area: fill.area,
                limit,
            });
        }

        let region = region_from_fill(&fill, image.width());
        tracing::debug!(
            seed = ?seed,
            area = fill.area,
            contours = region.contours.len(),
            "region added to selection"
        );
        self.regions.push(region);
        Ok(())
    }

    fn subtract_at(&mut self, pixel: ToolPoint) -> bool {
        match self.regions.iter().rposition(|region| region.contains(pixel)) {
            Some(index) => {
                self.regions.remove(index);
                true
            }
            None => false,
        }
    }

    fn undo_last(&mut self) -> bool {
        self.regions.pop();
        !self.regions.is_empty()
    }

    fn clear_all(&mut self) {
        self.regions.clear();
    }

    fn set_tolerance(&mut self, tolerance: u8) {
        self.tolerance = tolerance;
    }

    fn tolerance(&self) -> u8 {
        self.tolerance
    }

    fn has_contours(&self) -> bool {
        !self.regions.is_empty()
    }

    fn contour_paths(&self) -> Vec<ContourPath> {
        self.regions
            .iter()
            .flat_map(|region| region.contours.iter().cloned())
            .collect()
    }

    fn contour_style(&self) -> ContourStyle {
        ContourStyle {
            color: Color::BLACK,
            width: CONTOUR_WIDTH,
            dash: [CONTOUR_DASH_LENGTH, CONTOUR_DASH_LENGTH],
            dash_offset: self.dash_offset,
        }
    }

    fn advance_animation(&mut self) {
        self.dash_offset = (self.dash_offset + CONTOUR_DASH_STEP) % (CONTOUR_DASH_LENGTH * 2.0);
    }

    fn extract_cut(&self) -> Option<SelectionCut> {
        let image = self.image.as_ref()?;
        let bounds = self
            .regions
            .iter()
            .map(|region| region.bounds)
            .reduce(union_bounds)?;

        let mut cut = RgbaImage::from_pixel(bounds.width, bounds.height, Rgba([0, 0, 0, 0]));
        for (x, y, pixel) in cut.enumerate_pixels_mut() {
            let source = ToolPoint::new(bounds.x + x as i32, bounds.y + y as i32);
            if self.regions.iter().any(|region| region.contains(source)) {
                *pixel = *image.get_pixel(source.x as u32, source.y as u32);
            }
        }
        tracing::debug!(bounds = ?bounds, "selection cut extracted");
        Some(SelectionCut {
            image: cut,
            bounds,
        })
    }
}

struct FloodFill {
    mask: Vec<bool>,
    area: u64,
    min: (u32, u32),
    max: (u32, u32),
}

fn colors_within(a: Rgba<u8>, b: Rgba<u8>, tolerance: u8) -> bool {
    a.0.iter()
        .zip(b.0.iter())
        .take(3)
        .all(|(left, right)| left.abs_diff(*right) <= tolerance)
}

fn flood_fill(image: &RgbaImage, seed: ToolPoint, tolerance: u8) -> FloodFill {
    let (width, height) = image.dimensions();
    let stride = width as usize;
    let mut mask = vec![false; stride * height as usize];
    let (seed_x, seed_y) = (seed.x as u32, seed.y as u32);
    let target = *image.get_pixel(seed_x, seed_y);

    let mut min = (seed_x, seed_y);
    let mut max = (seed_x, seed_y);
    let mut area = 0_u64;
    let mut stack = vec![(seed_x, seed_y)];
    mask[seed_y as usize * stride + seed_x as usize] = true;

    while let Some((x, y)) = stack.pop() {
        area += 1;
        min = (min.0.min(x), min.1.min(y));
        max = (max.0.max(x), max.1.max(y));

        let neighbours = [
            (x.checked_sub(1), Some(y)),
            (x.checked_add(1).filter(|nx| *nx < width), Some(y)),
            (Some(x), y.checked_sub(1)),
            (Some(x), y.checked_add(1).filter(|ny| *ny < height)),
        ];
        for (nx, ny) in neighbours {
            let (Some(nx), Some(ny)) = (nx, ny) else {
                continue;
            };
            let index = ny as usize * stride + nx as usize;
            if !mask[index] && colors_within(*image.get_pixel(nx, ny), target, tolerance) {
                mask[index] = true;
                stack.push((nx, ny));
            }
        }
    }

    FloodFill {
        mask,
        area,
        min,
        max,
    }
}

fn region_from_fill(fill: &FloodFill, image_width: u32) -> SelectedRegion {
    let width = fill.max.0 - fill.min.0 + 1;
    let height = fill.max.1 - fill.min.1 + 1;
    let stride = image_width as usize;

    // One pixel of padding keeps border tracing away from the mask edge.
    let mut padded = GrayImage::new(width + 2, height + 2);
    let mut mask = GrayImage::new(width, height);
    for y in 0..height {
        for x in 0..width {
            let source = (fill.min.1 + y) as usize * stride + (fill.min.0 + x) as usize;
            if fill.mask[source] {
                mask.put_pixel(x, y, Luma([255]));
                padded.put_pixel(x + 1, y + 1, Luma([255]));
            }
        }
    }

    let origin_x = fill.min.0 as i32 - 1;
    let origin_y = fill.min.1 as i32 - 1;
    let contours = find_contours::<u32>(&padded)
        .into_iter()
        .filter(|contour| !contour.points.is_empty())
        .map(|contour| ContourPath {
            points: contour
                .points
                .iter()
                .map(|point| ToolPoint::new(origin_x + point.x as i32, origin_y + point.y as i32))
                .collect(),
        })
        .collect();

    SelectedRegion {
        bounds: ToolBounds::new(fill.min.0 as i32, fill.min.1 as i32, width, height),
        mask,
        contours,
    }
}

fn union_bounds(a: ToolBounds, b: ToolBounds) -> ToolBounds {
    let left = a.x.min(b.x);
    let top = a.y.min(b.y);
    let right = (a.x + a.width as i32).max(b.x + b.width as i32);
    let bottom = (a.y + a.height as i32).max(b.y + b.height as i32);
    ToolBounds::new(left, top, (right - left) as u32, (bottom - top) as u32)
}
