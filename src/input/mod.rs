mod pointer;
mod shortcut;

pub use pointer::{CursorShape, InputResponse, PointerButton};
pub use shortcut::{
    resolve_shortcut, InputContext, ShortcutAction, ShortcutKey, ShortcutModifiers,
};
