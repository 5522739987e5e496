use super::error::{StateError, StateResult};
use super::{EditMode, ModeEvent, ModeTransition};

/// Single-active-tool state machine.
///
/// Resolving a transition is pure (`next_transition`); the caller applies the
/// teardown of `cancelled` and only then calls `commit`, so no input is ever
/// routed to a half-cancelled tool.
#[derive(Debug)]
pub struct ModeMachine {
    mode: EditMode,
    transition_history: Vec<ModeTransition>,
}

impl ModeMachine {
    pub fn new() -> Self {
        Self {
            mode: EditMode::default(),
            transition_history: Vec::new(),
        }
    }

    pub fn mode(&self) -> EditMode {
        self.mode
    }

    pub fn is_editing(&self) -> bool {
        self.mode.is_tool()
    }

    pub fn can_transition(&self, event: ModeEvent) -> bool {
        self.next_transition(event).is_ok()
    }

    pub fn next_transition(&self, event: ModeEvent) -> StateResult<ModeTransition> {
        let from = self.mode;
        let vacated = from.is_tool().then_some(from);
        let transition = match event {
            ModeEvent::Enter(EditMode::Default) => {
                return Err(StateError::InvalidModeTransition { from, event });
            }
            ModeEvent::Enter(target) if target == from => {
                ModeTransition::new(from, event, from, None)
            }
            ModeEvent::Enter(target) => ModeTransition::new(from, event, target, vacated),
            ModeEvent::ToggleOff(target) if target.is_tool() && target == from => {
                ModeTransition::new(from, event, EditMode::Default, None)
            }
            ModeEvent::ToggleOff(_) => {
                return Err(StateError::InvalidModeTransition { from, event });
            }
            ModeEvent::Cancel => ModeTransition::new(from, event, EditMode::Default, vacated),
        };
        Ok(transition)
    }

    /// Makes a resolved transition live. Stale transitions resolved against a
    /// different mode are rejected.
    pub fn commit(&mut self, transition: ModeTransition) -> StateResult<EditMode> {
        if transition.from != self.mode {
            tracing::warn!(
                expected = ?transition.from,
                actual = ?self.mode,
                "stale mode transition rejected"
            );
            return Err(StateError::InvalidModeTransition {
                from: self.mode,
                event: transition.event,
            });
        }
        if transition.is_noop() {
            return Ok(self.mode);
        }

        tracing::debug!(
            from = ?transition.from,
            to = ?transition.to,
            cancelled = ?transition.cancelled,
            "edit mode transition"
        );
        self.mode = transition.to;
        self.transition_history.push(transition);
        Ok(self.mode)
    }

    pub fn transition(&mut self, event: ModeEvent) -> StateResult<ModeTransition> {
        let transition = self.next_transition(event).inspect_err(|_| {
            tracing::warn!(from = ?self.mode, event = ?event, "invalid mode transition requested");
        })?;
        self.commit(transition)?;
        Ok(transition)
    }

    pub fn history(&self) -> &[ModeTransition] {
        &self.transition_history
    }
}

impl Default for ModeMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ModeMachine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "EditMode::{:?}", self.mode)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOOLS: [EditMode; 3] = [
        EditMode::PickSeedpoint,
        EditMode::CancelSeedpoint,
        EditMode::PickDistance,
    ];

    #[test]
    fn entering_from_default_cancels_nothing() {
        for tool in TOOLS {
            let mut machine = ModeMachine::new();
            let transition = machine
                .transition(ModeEvent::Enter(tool))
                .expect("enter from default");
            assert_eq!(transition.cancelled, None);
            assert_eq!(machine.mode(), tool);
        }
    }

    #[test]
    fn switching_tools_cancels_exactly_the_vacated_mode() {
        for from in TOOLS {
            for to in TOOLS.into_iter().filter(|to| *to != from) {
                let mut machine = ModeMachine::new();
                machine.transition(ModeEvent::Enter(from)).unwrap();
                let transition = machine.transition(ModeEvent::Enter(to)).unwrap();
                assert_eq!(transition.cancelled, Some(from), "{from:?} -> {to:?}");
                assert_eq!(machine.mode(), to);
            }
        }
    }

    #[test]
    fn re_entering_active_mode_is_a_noop() {
        let mut machine = ModeMachine::new();
        machine
            .transition(ModeEvent::Enter(EditMode::PickDistance))
            .unwrap();
        let transition = machine
            .transition(ModeEvent::Enter(EditMode::PickDistance))
            .unwrap();
        assert!(transition.is_noop());
        assert_eq!(machine.history().len(), 1);
    }

    #[test]
    fn cancel_returns_to_default_and_names_vacated_mode() {
        let mut machine = ModeMachine::new();
        machine
            .transition(ModeEvent::Enter(EditMode::CancelSeedpoint))
            .unwrap();
        let transition = machine.transition(ModeEvent::Cancel).unwrap();
        assert_eq!(transition.cancelled, Some(EditMode::CancelSeedpoint));
        assert_eq!(machine.mode(), EditMode::Default);

        let idle = machine.transition(ModeEvent::Cancel).unwrap();
        assert!(idle.is_noop());
    }

    #[test]
    fn toggle_off_of_active_tool_cancels_nothing() {
        let mut machine = ModeMachine::new();
        machine
            .transition(ModeEvent::Enter(EditMode::PickSeedpoint))
            .unwrap();
        let transition = machine
            .transition(ModeEvent::ToggleOff(EditMode::PickSeedpoint))
            .unwrap();
        assert_eq!(transition.cancelled, None);
        assert_eq!(machine.mode(), EditMode::Default);
    }

    #[test]
    fn toggle_off_of_inactive_tool_is_rejected_without_mutation() {
        let mut machine = ModeMachine::new();
        machine
            .transition(ModeEvent::Enter(EditMode::PickDistance))
            .unwrap();

        let err = machine
            .transition(ModeEvent::ToggleOff(EditMode::PickSeedpoint))
            .expect_err("stale toggle-off");
        assert!(matches!(
            err,
            StateError::InvalidModeTransition {
                from: EditMode::PickDistance,
                event: ModeEvent::ToggleOff(EditMode::PickSeedpoint)
            }
        ));
        assert_eq!(machine.mode(), EditMode::PickDistance);
        assert_eq!(machine.history().len(), 1);
        assert!(!machine.can_transition(ModeEvent::Enter(EditMode::Default)));
    }

    #[test]
    fn commit_rejects_transition_resolved_against_another_mode() {
        let mut machine = ModeMachine::new();
        let stale = machine
            .next_transition(ModeEvent::Enter(EditMode::PickSeedpoint))
            .unwrap();
        machine
            .transition(ModeEvent::Enter(EditMode::PickDistance))
            .unwrap();

        assert!(machine.commit(stale).is_err());
        assert_eq!(machine.mode(), EditMode::PickDistance);
    }

    #[test]
    fn at_most_one_mode_is_live_for_any_enter_sequence() {
        let sequence = [
            EditMode::PickSeedpoint,
            EditMode::PickDistance,
            EditMode::PickDistance,
            EditMode::CancelSeedpoint,
            EditMode::PickSeedpoint,
            EditMode::CancelSeedpoint,
            EditMode::PickDistance,
        ];
        let mut machine = ModeMachine::new();
        let mut previous = EditMode::Default;
        for target in sequence {
            let transition = machine.transition(ModeEvent::Enter(target)).unwrap();
            let expected_cancel = (previous.is_tool() && previous != target).then_some(previous);
            assert_eq!(transition.cancelled, expected_cancel);
            assert_eq!(machine.mode(), target);
            previous = target;
        }
    }
}
