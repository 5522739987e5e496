use std::cell::RefCell;
use std::rc::Rc;

use crate::input::CursorShape;
use crate::state::EditMode;

use super::tools::{LineLayer, SelectionCut};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notice {
    SelectionTooLarge,
    MissingResolution,
    MissingImage,
    CutSaveFailed,
}

impl Notice {
    pub const fn message(self) -> &'static str {
        match self {
            Self::SelectionTooLarge => "The selected area is too large. Try a lower tolerance.",
            Self::MissingResolution => {
                "The image has no resolution metadata; distances are shown in pixels."
            }
            Self::MissingImage => "No image is loaded.",
            Self::CutSaveFailed => "The selected region could not be saved.",
        }
    }
}

/// Notifications the editing session sends to its host.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    ModeEntered(EditMode),
    /// A tool was vacated by cross-cancellation or Escape.
    ModeCancelled(EditMode),
    /// A tool was switched off from its own toggle.
    ModeExited(EditMode),
    SelectionAvailabilityChanged(bool),
    TextLinesAvailable(bool),
    TextLinesVisibilityChanged { layer: LineLayer, visible: bool },
    RepaintRequested,
    CursorChanged(CursorShape),
    Notice(Notice),
    SaveCutRequested(SelectionCut),
}

pub trait SessionObserver {
    fn notify(&mut self, event: SessionEvent);
}

/// Observer that keeps every event; the shared log stays readable from outside.
#[derive(Debug, Clone, Default)]
pub struct RecordingObserver {
    events: Rc<RefCell<Vec<SessionEvent>>>,
}

impl RecordingObserver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<SessionEvent> {
        self.events.borrow().clone()
    }

    pub fn take(&self) -> Vec<SessionEvent> {
        self.events.borrow_mut().drain(..).collect()
    }
}

impl SessionObserver for RecordingObserver {
    fn notify(&mut self, event: SessionEvent) {
        self.events.borrow_mut().push(event);
    }
}
