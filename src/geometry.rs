//! Shared geometric and color primitives used across editor, tools and page modules.

/// Integer pixel position in image space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ToolPoint {
    pub x: i32,
    pub y: i32,
}

impl ToolPoint {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub fn to_f64(self) -> PointF {
        PointF::new(f64::from(self.x), f64::from(self.y))
    }

    pub fn distance_to(self, other: ToolPoint) -> f64 {
        self.to_f64().distance_to(other.to_f64())
    }
}

/// Sub-pixel position, used for pointer input and screen-space rendering.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointF {
    pub x: f64,
    pub y: f64,
}

impl PointF {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance_to(self, other: PointF) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }

    /// Pixel containing this position.
    pub fn to_pixel(self) -> ToolPoint {
        ToolPoint::new(self.x.floor() as i32, self.y.floor() as i32)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ToolBounds {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl ToolBounds {
    pub const fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageBounds {
    pub width: i32,
    pub height: i32,
}

impl ImageBounds {
    pub const fn new(width: i32, height: i32) -> Self {
        Self { width, height }
    }

    pub fn of_image(image: &image::RgbaImage) -> Self {
        Self::new(
            i32::try_from(image.width()).unwrap_or(i32::MAX),
            i32::try_from(image.height()).unwrap_or(i32::MAX),
        )
    }

    pub const fn is_empty(&self) -> bool {
        self.width <= 0 || self.height <= 0
    }

    pub fn contains(&self, point: PointF) -> bool {
        point.x >= 0.0
            && point.y >= 0.0
            && point.x < f64::from(self.width)
            && point.y < f64::from(self.height)
    }

    pub const fn contains_pixel(&self, point: ToolPoint) -> bool {
        point.x >= 0 && point.y >= 0 && point.x < self.width && point.y < self.height
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const BLACK: Color = Color::new(0, 0, 0);
    pub const WHITE: Color = Color::new(255, 255, 255);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    pub const fn to_rgba(self, alpha: u8) -> image::Rgba<u8> {
        image::Rgba([self.r, self.g, self.b, alpha])
    }
}

/// 2D affine transform: `x' = xx*x + xy*y + x0`, `y' = yx*x + yy*y + y0`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Affine {
    pub xx: f64,
    pub yx: f64,
    pub xy: f64,
    pub yy: f64,
    pub x0: f64,
    pub y0: f64,
}

impl Default for Affine {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Affine {
    pub const IDENTITY: Affine = Affine {
        xx: 1.0,
        yx: 0.0,
        xy: 0.0,
        yy: 1.0,
        x0: 0.0,
        y0: 0.0,
    };

    pub const fn scale_translate(scale: f64, dx: f64, dy: f64) -> Self {
        Self {
            xx: scale,
            yx: 0.0,
            xy: 0.0,
            yy: scale,
            x0: dx,
            y0: dy,
        }
    }

    pub fn apply(&self, point: PointF) -> PointF {
        PointF::new(
            self.xx * point.x + self.xy * point.y + self.x0,
            self.yx * point.x + self.yy * point.y + self.y0,
        )
    }

    /// Transform that applies `self` first and `next` afterwards.
    pub fn then(&self, next: &Affine) -> Affine {
        Affine {
            xx: next.xx * self.xx + next.xy * self.yx,
            yx: next.yx * self.xx + next.yy * self.yx,
            xy: next.xx * self.xy + next.xy * self.yy,
            yy: next.yx * self.xy + next.yy * self.yy,
            x0: next.xx * self.x0 + next.xy * self.y0 + next.x0,
            y0: next.yx * self.x0 + next.yy * self.y0 + next.y0,
        }
    }

    pub fn determinant(&self) -> f64 {
        self.xx * self.yy - self.xy * self.yx
    }

    pub fn invert(&self) -> Option<Affine> {
        let det = self.determinant();
        if det.abs() < f64::EPSILON {
            return None;
        }
        let xx = self.yy / det;
        let xy = -self.xy / det;
        let yx = -self.yx / det;
        let yy = self.xx / det;
        Some(Affine {
            xx,
            yx,
            xy,
            yy,
            x0: -(xx * self.x0 + xy * self.y0),
            y0: -(yx * self.x0 + yy * self.y0),
        })
    }

    /// Uniform zoom factor of the transform.
    pub fn scale_factor(&self) -> f64 {
        self.determinant().abs().sqrt()
    }
}

/// Maps between display (widget) coordinates and image pixel coordinates.
///
/// The host view places the image with `image_matrix` (fit-to-widget) and then
/// applies `world_matrix` (zoom and pan). Display = world(image_matrix(p)).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CoordinateMapper {
    image_matrix: Affine,
    world_matrix: Affine,
}

impl CoordinateMapper {
    pub const fn new(image_matrix: Affine, world_matrix: Affine) -> Self {
        Self {
            image_matrix,
            world_matrix,
        }
    }

    pub const fn identity() -> Self {
        Self::new(Affine::IDENTITY, Affine::IDENTITY)
    }

    pub fn view_transform(&self) -> Affine {
        self.image_matrix.then(&self.world_matrix)
    }

    pub fn to_display(&self, image_point: PointF) -> PointF {
        self.view_transform().apply(image_point)
    }

    /// Display position in image space, or `None` for a degenerate view.
    pub fn to_image(&self, display_point: PointF) -> Option<PointF> {
        self.view_transform()
            .invert()
            .map(|inverse| inverse.apply(display_point))
    }

    pub fn zoom(&self) -> f64 {
        self.view_transform().scale_factor()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(actual: PointF, expected: PointF) {
        assert!(
            actual.distance_to(expected) < 1e-9,
            "expected {expected:?}, got {actual:?}"
        );
    }

    #[test]
    fn affine_then_applies_left_transform_first() {
        let scale = Affine::scale_translate(2.0, 0.0, 0.0);
        let shift = Affine::scale_translate(1.0, 10.0, 5.0);

        let combined = scale.then(&shift);
        assert_close(combined.apply(PointF::new(3.0, 4.0)), PointF::new(16.0, 13.0));

        let reversed = shift.then(&scale);
        assert_close(reversed.apply(PointF::new(3.0, 4.0)), PointF::new(26.0, 18.0));
    }

    #[test]
    fn affine_invert_round_trips_points() {
        let transform = Affine {
            xx: 1.5,
            yx: 0.25,
            xy: -0.5,
            yy: 2.0,
            x0: 12.0,
            y0: -7.0,
        };
        let inverse = transform.invert().expect("transform is invertible");
        let point = PointF::new(42.0, -3.5);
        assert_close(inverse.apply(transform.apply(point)), point);
    }

    #[test]
    fn affine_invert_rejects_degenerate_matrix() {
        let degenerate = Affine::scale_translate(0.0, 4.0, 4.0);
        assert!(degenerate.invert().is_none());
    }

    #[test]
    fn coordinate_mapper_combines_image_and_world_matrices() {
        let mapper = CoordinateMapper::new(
            Affine::scale_translate(0.5, 20.0, 10.0),
            Affine::scale_translate(2.0, -5.0, 0.0),
        );

        let display = mapper.to_display(PointF::new(100.0, 40.0));
        assert_close(display, PointF::new(135.0, 60.0));

        let image = mapper.to_image(display).expect("mapper is invertible");
        assert_close(image, PointF::new(100.0, 40.0));
        assert!((mapper.zoom() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn image_bounds_contains_is_half_open() {
        let bounds = ImageBounds::new(10, 5);
        assert!(bounds.contains(PointF::new(0.0, 0.0)));
        assert!(bounds.contains(PointF::new(9.99, 4.99)));
        assert!(!bounds.contains(PointF::new(10.0, 2.0)));
        assert!(!bounds.contains(PointF::new(-0.01, 2.0)));
        assert!(bounds.contains_pixel(ToolPoint::new(9, 4)));
        assert!(!bounds.contains_pixel(ToolPoint::new(9, 5)));
    }

    #[test]
    fn point_to_pixel_floors_fractional_positions() {
        assert_eq!(PointF::new(3.9, 7.1).to_pixel(), ToolPoint::new(3, 7));
        assert_eq!(PointF::new(-0.5, 0.0).to_pixel(), ToolPoint::new(-1, 0));
    }
}
