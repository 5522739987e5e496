use image::RgbaImage;

use crate::geometry::{Affine, Color, CoordinateMapper, PointF};

use super::tools::{ContourPath, ContourStyle, DistanceTool, LengthUnit, LineLayer};

/// Half the arm length of the measurement end markers, in screen pixels.
pub const CROSS_HALF_SIZE: f64 = 7.0;
pub const LABEL_FONT_SIZE: f64 = 12.0;
pub const MEASUREMENT_LINE_WIDTH: f64 = 1.0;
const LABEL_CHAR_WIDTH_RATIO: f64 = 0.62;

/// One drawing instruction for the host canvas. Image-space commands carry the
/// view transform; the rest are already in screen space.
#[derive(Debug, Clone, PartialEq)]
pub enum OverlayCommand<'a> {
    LineLayer {
        layer: LineLayer,
        image: &'a RgbaImage,
        transform: Affine,
    },
    Contours {
        paths: Vec<ContourPath>,
        style: ContourStyle,
        transform: Affine,
    },
    Segment {
        from: PointF,
        to: PointF,
        color: Color,
        width: f64,
    },
    Cross {
        center: PointF,
        half_size: f64,
        color: Color,
    },
    Label {
        text: String,
        position: PointF,
        color: Color,
        font_size: f64,
    },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LabelSize {
    pub width: f64,
    pub height: f64,
}

impl LabelSize {
    pub fn estimate(text: &str, font_size: f64) -> Self {
        Self {
            width: text.chars().count() as f64 * font_size * LABEL_CHAR_WIDTH_RATIO,
            height: font_size,
        }
    }
}

/// Keeps the label beside the end point, on the side away from the start.
pub fn label_position(start: PointF, end: PointF, size: LabelSize) -> PointF {
    let x = if end.x < start.x {
        end.x
    } else {
        end.x - size.width
    };
    let y = if end.y > start.y {
        end.y + size.height
    } else {
        end.y
    };
    PointF::new(x, y)
}

pub fn distance_label(tool: &dyn DistanceTool, unit: LengthUnit) -> String {
    match tool.distance_in(unit) {
        Some(length) => format!("{length:.2} {}", unit.suffix()),
        None => format!("{:.2} px", tool.distance_pixels()),
    }
}

/// Measurement line, end markers and label for the distance tool. Nothing is
/// drawn before a start point exists.
pub fn measurement_commands(
    tool: &dyn DistanceTool,
    mapper: &CoordinateMapper,
    unit: LengthUnit,
    color: Color,
) -> Vec<OverlayCommand<'static>> {
    let Some(start) = tool.start_point() else {
        return Vec::new();
    };
    let end = tool.current_point().unwrap_or(start);
    let start = mapper.to_display(start.to_f64());
    let end = mapper.to_display(end.to_f64());

    let text = distance_label(tool, unit);
    let size = LabelSize::estimate(&text, LABEL_FONT_SIZE);
    vec![
        OverlayCommand::Segment {
            from: start,
            to: end,
            color,
            width: MEASUREMENT_LINE_WIDTH,
        },
        OverlayCommand::Cross {
            center: start,
            half_size: CROSS_HALF_SIZE,
            color,
        },
        OverlayCommand::Cross {
            center: end,
            half_size: CROSS_HALF_SIZE,
            color,
        },
        OverlayCommand::Label {
            position: label_position(start, end, size),
            text,
            color,
            font_size: LABEL_FONT_SIZE,
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::editor::tools::{DistanceMeasure, Resolution};
    use crate::geometry::ToolPoint;

    const SIZE: LabelSize = LabelSize {
        width: 40.0,
        height: 12.0,
    };

    #[test]
    fn label_sits_left_of_end_when_measuring_rightwards() {
        let position = label_position(PointF::new(0.0, 50.0), PointF::new(100.0, 50.0), SIZE);
        assert_eq!(position, PointF::new(60.0, 50.0));
    }

    #[test]
    fn label_drops_below_end_when_measuring_downwards() {
        let position = label_position(PointF::new(100.0, 0.0), PointF::new(20.0, 80.0), SIZE);
        assert_eq!(position, PointF::new(20.0, 92.0));
    }

    #[test]
    fn label_text_uses_resolution_or_falls_back_to_pixels() {
        let mut measure = DistanceMeasure::new();
        measure.commit_point(ToolPoint::new(10, 10));
        measure.commit_point(ToolPoint::new(110, 10));
        assert_eq!(distance_label(&measure, LengthUnit::Centimeter), "100.00 px");

        measure.bind_resolution(Some(Resolution::per_centimeter(100.0)));
        assert_eq!(distance_label(&measure, LengthUnit::Centimeter), "1.00 cm");
        assert_eq!(distance_label(&measure, LengthUnit::Inch), "0.39 in");
    }

    #[test]
    fn crosses_keep_screen_size_under_zoom() {
        let mut measure = DistanceMeasure::new();
        measure.commit_point(ToolPoint::new(10, 10));
        measure.commit_point(ToolPoint::new(20, 10));
        let zoomed = CoordinateMapper::new(Affine::scale_translate(4.0, 0.0, 0.0), Affine::IDENTITY);

        let commands = measurement_commands(&measure, &zoomed, LengthUnit::Centimeter, Color::BLACK);
        assert_eq!(commands.len(), 4);
        assert_eq!(
            commands[2],
            OverlayCommand::Cross {
                center: PointF::new(80.0, 40.0),
                half_size: CROSS_HALF_SIZE,
                color: Color::BLACK,
            }
        );
    }

    #[test]
    fn nothing_drawn_without_start_point() {
        let measure = DistanceMeasure::new();
        assert!(measurement_commands(
            &measure,
            &CoordinateMapper::identity(),
            LengthUnit::Centimeter,
            Color::BLACK
        )
        .is_empty());
    }
}
