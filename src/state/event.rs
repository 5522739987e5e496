use super::model::EditMode;

/// Requests that drive the edit-mode machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModeEvent {
    /// Toolbar button checked, shortcut, or programmatic start of a tool.
    Enter(EditMode),
    /// Toolbar button of the active tool unchecked.
    ToggleOff(EditMode),
    /// Escape key, explicit stop, or session close.
    Cancel,
}

/// A resolved transition. `cancelled` names the mode that must be torn down
/// before `to` becomes live.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModeTransition {
    pub from: EditMode,
    pub event: ModeEvent,
    pub to: EditMode,
    pub cancelled: Option<EditMode>,
}

impl ModeTransition {
    pub const fn new(
        from: EditMode,
        event: ModeEvent,
        to: EditMode,
        cancelled: Option<EditMode>,
    ) -> Self {
        Self {
            from,
            event,
            to,
            cancelled,
        }
    }

    pub fn is_noop(&self) -> bool {
        self.from == self.to && self.cancelled.is_none()
    }
}
