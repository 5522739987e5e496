use image::RgbaImage;

use crate::geometry::Color;

/// Below this normalised luma the overlay switches to the high-contrast colour.
pub const BRIGHTNESS_THRESHOLD: f64 = 0.3;

pub const OVERLAY_COLOR: Color = Color::BLACK;
pub const HIGH_CONTRAST_OVERLAY_COLOR: Color = Color::WHITE;

/// Mean BT.601 luma of the image, normalised to `[0, 1]`. Empty images count
/// as fully bright.
pub fn average_brightness(image: &RgbaImage) -> f64 {
    let count = u64::from(image.width()) * u64::from(image.height());
    if count == 0 {
        return 1.0;
    }
    let total: f64 = image
        .pixels()
        .map(|pixel| {
            let [r, g, b, _] = pixel.0;
            0.299 * f64::from(r) + 0.587 * f64::from(g) + 0.114 * f64::from(b)
        })
        .sum();
    (total / count as f64 / 255.0).clamp(0.0, 1.0)
}

pub fn overlay_color(brightness: f64) -> Color {
    if brightness < BRIGHTNESS_THRESHOLD {
        HIGH_CONTRAST_OVERLAY_COLOR
    } else {
        OVERLAY_COLOR
    }
}
