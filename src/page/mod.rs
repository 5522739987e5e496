//! Batch page extraction: segment, deduplicate, then crop or draw.

mod hypothesis;
mod segmenter;

use image::RgbaImage;

use crate::geometry::ImageBounds;

pub use hypothesis::{deduplicate_hypotheses, PageHypothesis, Quad};
pub use segmenter::{
    HoughPageSegmenter, PageSegmenter, DUPLICATE_CORNER_RATIO, MIN_PAGE_AREA_RATIO,
};

pub const CROP_RUN_ID: &str = "1638a7f56b814ee48c6eb8a7710e74b4";
pub const DRAW_RUN_ID: &str = "2af5c9f018ce4a0fbfaacc5e3a48a4b5";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageOperation {
    CropToPage,
    DrawToPage,
}

impl PageOperation {
    /// Resolves a command name or its registered run id.
    pub fn from_run_id(run_id: &str) -> Option<Self> {
        match run_id.trim() {
            "crop" | "crop-to-page" | CROP_RUN_ID => Some(Self::CropToPage),
            "draw" | "draw-to-page" | DRAW_RUN_ID => Some(Self::DrawToPage),
            _ => None,
        }
    }

    pub const fn run_id(self) -> &'static str {
        match self {
            Self::CropToPage => CROP_RUN_ID,
            Self::DrawToPage => DRAW_RUN_ID,
        }
    }
}

/// Stateless between calls; `run` is a pure function of its inputs.
#[derive(Debug, Clone, Default)]
pub struct PageExtractionPipeline<S: PageSegmenter = HoughPageSegmenter> {
    segmenter: S,
}

impl<S: PageSegmenter> PageExtractionPipeline<S> {
    pub fn new(segmenter: S) -> Self {
        Self { segmenter }
    }

    pub fn segmenter(&self) -> &S {
        &self.segmenter
    }

    /// Unknown operations return the input unchanged.
    pub fn run(&self, run_id: &str, image: &RgbaImage) -> RgbaImage {
        match PageOperation::from_run_id(run_id) {
            Some(operation) => self.apply(operation, image),
            None => {
                tracing::warn!(run_id, "unknown page operation; returning input unchanged");
                image.clone()
            }
        }
    }

    pub fn apply(&self, operation: PageOperation, image: &RgbaImage) -> RgbaImage {
        let hypotheses = self.segmenter.compute(image);
        let found = hypotheses.len();
        let retained = self
            .segmenter
            .deduplicate(hypotheses, ImageBounds::of_image(image));
        tracing::debug!(?operation, found, retained = retained.len(), "page segmentation");

        match operation {
            PageOperation::CropToPage => match best_hypothesis(&retained) {
                Some(best) => self.segmenter.crop_to_hypothesis(image, best),
                None => {
                    tracing::info!("no page found; keeping original");
                    image.clone()
                }
            },
            PageOperation::DrawToPage if retained.is_empty() => {
                tracing::info!("no page found; keeping original");
                image.clone()
            }
            PageOperation::DrawToPage => self.segmenter.draw_hypotheses(image, &retained),
        }
    }
}

/// Highest score, earliest on ties.
fn best_hypothesis(hypotheses: &[PageHypothesis]) -> Option<&PageHypothesis> {
    hypotheses.iter().fold(None, |best, candidate| match best {
        Some(current) if current.score >= candidate.score => Some(current),
        _ => Some(candidate),
    })
}
