use super::event::ModeEvent;
use super::model::EditMode;
use thiserror::Error;

pub type StateResult<T> = std::result::Result<T, StateError>;

#[derive(Debug, Error)]
pub enum StateError {
    #[error("invalid mode transition: from {from:?} using event {event:?}")]
    InvalidModeTransition { from: EditMode, event: ModeEvent },
}
