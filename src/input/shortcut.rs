use crate::state::EditMode;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShortcutKey {
    Character(char),
    Enter,
    Escape,
    /// The Shift key pressed on its own.
    Shift,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ShortcutModifiers {
    pub ctrl: bool,
    pub shift: bool,
    pub alt: bool,
}

impl ShortcutModifiers {
    pub const fn new(ctrl: bool, shift: bool, alt: bool) -> Self {
        Self { ctrl, shift, alt }
    }

    pub const fn shift() -> Self {
        Self::new(false, true, false)
    }

    pub const fn alt() -> Self {
        Self::new(false, false, true)
    }

    pub const fn ctrl() -> Self {
        Self::new(true, false, false)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct InputContext {
    pub dialog_open: bool,
    pub mode: EditMode,
    pub is_auto_repeat: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShortcutAction {
    CancelMode,
    SaveCut,
    EnableSnapping,
    ToggleDistance,
    ToggleSeedpoint,
    ToggleCancelSeedpoint,
    UndoSelection,
    ClearSelection,
    DetectTextLines,
    ToggleBottomLines,
    ToggleTopLines,
}

fn resolve_mode_shortcut(key: ShortcutKey, context: InputContext) -> Option<ShortcutAction> {
    match (key, context.mode) {
        (ShortcutKey::Escape, mode) if mode.is_tool() => Some(ShortcutAction::CancelMode),
        (ShortcutKey::Shift, EditMode::PickDistance) => Some(ShortcutAction::EnableSnapping),
        _ => None,
    }
}

fn resolve_toolbar_shortcut(
    key: ShortcutKey,
    modifiers: ShortcutModifiers,
    context: InputContext,
) -> Option<ShortcutAction> {
    let ShortcutModifiers { ctrl, shift, alt } = modifiers;
    match (key, ctrl, shift, alt) {
        // Alt + Enter distinguishes the region cut from an ordinary crop confirm.
        (ShortcutKey::Enter, false, false, true) if !context.is_auto_repeat => {
            Some(ShortcutAction::SaveCut)
        }
        (ShortcutKey::Character('d'), true, true, false) => Some(ShortcutAction::ToggleDistance),
        (ShortcutKey::Character('d'), false, true, false) => Some(ShortcutAction::DetectTextLines),
        (ShortcutKey::Character('l'), false, true, false) => {
            Some(ShortcutAction::ToggleBottomLines)
        }
        (ShortcutKey::Character('u'), false, true, false) => Some(ShortcutAction::ToggleTopLines),
        (ShortcutKey::Character('s'), false, true, false) => Some(ShortcutAction::ToggleSeedpoint),
        (ShortcutKey::Character('c'), false, true, false) => {
            Some(ShortcutAction::ToggleCancelSeedpoint)
        }
        (ShortcutKey::Character('c'), false, false, true) => Some(ShortcutAction::ClearSelection),
        (ShortcutKey::Character('z'), true, false, false) => Some(ShortcutAction::UndoSelection),
        _ => None,
    }
}

pub fn resolve_shortcut(
    key: ShortcutKey,
    modifiers: ShortcutModifiers,
    context: InputContext,
) -> Option<ShortcutAction> {
    if context.dialog_open {
        return None;
    }

    let key = match key {
        ShortcutKey::Character(ch) => ShortcutKey::Character(ch.to_ascii_lowercase()),
        other => other,
    };

    resolve_mode_shortcut(key, context).or_else(|| resolve_toolbar_shortcut(key, modifiers, context))
}
