use crate::cli::CliError;
use crate::editor::tools::GrowError;
use crate::state::StateError;
use crate::storage::StorageError;
use thiserror::Error;

pub type AppResult<T> = std::result::Result<T, AppError>;

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Cli(#[from] CliError),
    #[error(transparent)]
    State(#[from] StateError),
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error(transparent)]
    Selection(#[from] GrowError),
    #[error("image error: {0}")]
    Image(#[from] image::ImageError),
    #[error("unknown page operation {0:?}")]
    UnknownOperation(String),
}
