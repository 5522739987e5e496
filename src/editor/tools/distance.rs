use serde::Deserialize;

use super::{PointF, ToolPoint};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LengthUnit {
    #[default]
    Centimeter,
    Inch,
}

impl LengthUnit {
    pub const fn suffix(self) -> &'static str {
        match self {
            Self::Centimeter => "cm",
            Self::Inch => "in",
        }
    }

    const fn units_per_inch(self) -> f64 {
        match self {
            Self::Centimeter => 2.54,
            Self::Inch => 1.0,
        }
    }
}

/// Physical resolution of the bound image: pixels per `unit`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Resolution {
    pub dots_per_unit: f64,
    pub unit: LengthUnit,
}

impl Resolution {
    pub const fn new(dots_per_unit: f64, unit: LengthUnit) -> Self {
        Self {
            dots_per_unit,
            unit,
        }
    }

    pub const fn dpi(dots_per_inch: f64) -> Self {
        Self::new(dots_per_inch, LengthUnit::Inch)
    }

    pub const fn per_centimeter(dots_per_centimeter: f64) -> Self {
        Self::new(dots_per_centimeter, LengthUnit::Centimeter)
    }

    pub fn is_usable(&self) -> bool {
        self.dots_per_unit.is_finite() && self.dots_per_unit > 0.0
    }

    pub fn to_length(&self, pixels: f64) -> f64 {
        pixels / self.dots_per_unit
    }

    pub fn to_length_in(&self, pixels: f64, unit: LengthUnit) -> f64 {
        let inches = self.to_length(pixels) / self.unit.units_per_inch();
        inches * unit.units_per_inch()
    }
}

/// Two-point measurement on the bound image.
pub trait DistanceTool {
    fn reset(&mut self);
    fn commit_point(&mut self, pixel: ToolPoint);
    fn set_provisional_point(&mut self, pixel: ToolPoint);
    fn has_start(&self) -> bool;
    fn has_both(&self) -> bool;
    fn start_point(&self) -> Option<ToolPoint>;
    /// Committed end point, or the provisional one while only the start exists.
    fn current_point(&self) -> Option<ToolPoint>;
    fn distance_pixels(&self) -> f64;
    fn distance_in_physical_units(&self) -> Option<f64>;
    fn distance_in(&self, unit: LengthUnit) -> Option<f64>;
    fn set_snap(&mut self, snap: bool);
    fn is_snapping(&self) -> bool;
    fn bind_resolution(&mut self, resolution: Option<Resolution>);
    fn resolution(&self) -> Option<Resolution>;
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct DistanceMeasure {
    start: Option<ToolPoint>,
    end: Option<ToolPoint>,
    pointer: Option<ToolPoint>,
    provisional: Option<ToolPoint>,
    snapping: bool,
    resolution: Option<Resolution>,
}

impl DistanceMeasure {
    pub fn new() -> Self {
        Self::default()
    }

    fn constrain(&self, pixel: ToolPoint) -> ToolPoint {
        match self.start {
            Some(start) if self.snapping => snap_to_octant(start, pixel),
            _ => pixel,
        }
    }
}

/// Projects `pixel` onto the nearest horizontal, vertical or diagonal ray
/// through `start`.
fn snap_to_octant(start: ToolPoint, pixel: ToolPoint) -> ToolPoint {
    let dx = f64::from(pixel.x - start.x);
    let dy = f64::from(pixel.y - start.y);
    if dx == 0.0 && dy == 0.0 {
        return pixel;
    }

    let step = std::f64::consts::FRAC_PI_4;
    let angle = (dy.atan2(dx) / step).round() * step;
    let (sin, cos) = angle.sin_cos();
    let projected = dx * cos + dy * sin;
    let snapped = PointF::new(
        f64::from(start.x) + projected * cos,
        f64::from(start.y) + projected * sin,
    );
    ToolPoint::new(snapped.x.round() as i32, snapped.y.round() as i32)
}

impl DistanceTool for DistanceMeasure {
    /// Clears the points. Snapping follows the held modifier and survives.
    fn reset(&mut self) {
        self.start = None;
        self.end = None;
        self.pointer = None;
        self.provisional = None;
    }

    fn commit_point(&mut self, pixel: ToolPoint) {
        if self.has_both() {
            self.reset();
        }
        if self.start.is_none() {
            self.start = Some(pixel);
            self.provisional = None;
            tracing::debug!(start = ?pixel, "measurement start committed");
        } else {
            let end = self.constrain(pixel);
            self.end = Some(end);
            tracing::debug!(end = ?end, pixels = self.distance_pixels(), "measurement end committed");
        }
    }

    fn set_provisional_point(&mut self, pixel: ToolPoint) {
        self.pointer = Some(pixel);
        if self.start.is_some() && self.end.is_none() {
            self.provisional = Some(self.constrain(pixel));
        }
    }

    fn has_start(&self) -> bool {
        self.start.is_some()
    }

    fn has_both(&self) -> bool {
        self.start.is_some() && self.end.is_some()
    }

    fn start_point(&self) -> Option<ToolPoint> {
        self.start
    }

    fn current_point(&self) -> Option<ToolPoint> {
        self.end.or(self.provisional)
    }

    fn distance_pixels(&self) -> f64 {
        match (self.start, self.current_point()) {
            (Some(start), Some(current)) => start.distance_to(current),
            _ => 0.0,
        }
    }

    fn distance_in_physical_units(&self) -> Option<f64> {
        self.resolution
            .map(|resolution| resolution.to_length(self.distance_pixels()))
    }

    fn distance_in(&self, unit: LengthUnit) -> Option<f64> {
        self.resolution
            .map(|resolution| resolution.to_length_in(self.distance_pixels(), unit))
    }

    fn set_snap(&mut self, snap: bool) {
        self.snapping = snap;
        if self.end.is_none() && self.start.is_some() {
            if let Some(pointer) = self.pointer {
                self.provisional = Some(self.constrain(pointer));
            }
        }
    }

    fn is_snapping(&self) -> bool {
        self.snapping
    }

    fn bind_resolution(&mut self, resolution: Option<Resolution>) {
        self.resolution = resolution.filter(Resolution::is_usable);
    }

    fn resolution(&self) -> Option<Resolution> {
        self.resolution
    }
}
