/// Interactive edit mode. Exactly one is live at any time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum EditMode {
    #[default]
    Default,
    PickSeedpoint,
    CancelSeedpoint,
    PickDistance,
}

impl EditMode {
    pub const ALL: [EditMode; 4] = [
        Self::Default,
        Self::PickSeedpoint,
        Self::CancelSeedpoint,
        Self::PickDistance,
    ];

    pub const fn is_tool(self) -> bool {
        !matches!(self, Self::Default)
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Default => "default",
            Self::PickSeedpoint => "pick seedpoint",
            Self::CancelSeedpoint => "clear single region",
            Self::PickDistance => "measure distance",
        }
    }
}
