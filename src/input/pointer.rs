use super::ShortcutAction;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerButton {
    Primary,
    Secondary,
    Middle,
}

/// Cursor shape requested from the host view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CursorShape {
    #[default]
    Default,
    PointingHand,
    Cross,
    Blank,
}

/// What the host should do with an input event after the coordinator saw it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputResponse {
    /// Handled; do not forward.
    Consumed,
    /// Not handled; forward to the host view (panning, fullscreen toggle, ...).
    Ignored,
    /// Needs host UI the coordinator does not own (a configuration dialog).
    Delegated(ShortcutAction),
}

impl InputResponse {
    pub const fn is_consumed(self) -> bool {
        matches!(self, Self::Consumed)
    }
}
