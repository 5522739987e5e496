use std::path::PathBuf;

use image::RgbaImage;
use thiserror::Error;

use crate::error::{AppError, AppResult};
use crate::page::{HoughPageSegmenter, PageExtractionPipeline, PageOperation};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CliError {
    #[error("usage: docanalysis <crop|draw|run-id> <input> <output>")]
    Usage,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageCommand {
    pub operation: String,
    pub input: PathBuf,
    pub output: PathBuf,
}

impl PageCommand {
    pub fn parse<I>(args: I) -> Result<Self, CliError>
    where
        I: IntoIterator<Item = String>,
    {
        let mut args = args.into_iter();
        let (Some(operation), Some(input), Some(output), None) =
            (args.next(), args.next(), args.next(), args.next())
        else {
            return Err(CliError::Usage);
        };
        Ok(Self {
            operation,
            input: PathBuf::from(input),
            output: PathBuf::from(output),
        })
    }

    /// Runs the page pipeline over `input` and writes `output`. Unlike the
    /// pipeline itself, an unknown operation name is an error here.
    pub fn execute(&self) -> AppResult<()> {
        let operation = PageOperation::from_run_id(&self.operation)
            .ok_or_else(|| AppError::UnknownOperation(self.operation.clone()))?;
        let image: RgbaImage = image::open(&self.input)?.to_rgba8();
        tracing::info!(
            input = %self.input.display(),
            ?operation,
            width = image.width(),
            height = image.height(),
            "page command"
        );

        let pipeline = PageExtractionPipeline::new(HoughPageSegmenter::new());
        let result = pipeline.run(operation.run_id(), &image);
        result.save(&self.output)?;
        tracing::info!(output = %self.output.display(), "page command finished");
        Ok(())
    }
}
