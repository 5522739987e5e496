mod distance;
mod lines;
mod region;

pub use crate::geometry::{Color, CoordinateMapper, ImageBounds, PointF, ToolBounds, ToolPoint};
pub use distance::{DistanceMeasure, DistanceTool, LengthUnit, Resolution};
pub use lines::{LineDetectionOptions, LineDetector, LineLayer, ProjectionLineDetector, TextLine};
pub use region::{
    ContourPath, ContourStyle, FloodFillSelector, GrowError, RegionSelector, SelectionCut,
    DEFAULT_TOLERANCE, MAX_SELECTION_AREA_RATIO,
};
