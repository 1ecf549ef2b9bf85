//! # Mode transitions
//!
//! ## Overview
//!
//! The [ModeMachine] tracks the current [ModeState], and decides where mode change requests
//! lead. It remembers the mode to go back to after the temporary Operator-Pending and
//! Command-Line modes.
//!
//! The `selectmode` and `keymodel` options change how Visual and Select mode get started and
//! stopped, so the decisions here read them through an [OptionValueAccessor].
use engine_types::prelude::{CommandFlags, Mode, ModeChange, ModeState, Register, SubMode};

use crate::options::{vim, OptionValueAccessor};
use crate::registers::register_to_char;

/// Tracks the current mode.
#[derive(Clone, Debug, Default)]
pub struct ModeMachine {
    state: ModeState,
    saved: Vec<ModeState>,
}

impl ModeMachine {
    /// The current mode.
    pub fn state(&self) -> ModeState {
        self.state
    }

    /// The current mode, without its submode.
    pub fn mode(&self) -> Mode {
        self.state.mode()
    }

    /// Change to a new mode, forgetting any saved modes.
    ///
    /// Returns the old and new mode if they differ.
    pub fn set(&mut self, state: ModeState) -> Option<(ModeState, ModeState)> {
        self.saved.clear();
        self.replace(state)
    }

    fn replace(&mut self, state: ModeState) -> Option<(ModeState, ModeState)> {
        let old = std::mem::replace(&mut self.state, state);

        if old == state {
            None
        } else {
            log::debug!("mode change: {old:?} -> {state:?}");
            Some((old, state))
        }
    }

    /// Enter a temporary mode, remembering the current one.
    pub fn push(&mut self, mode: Mode) -> Option<(ModeState, ModeState)> {
        self.saved.push(self.state);
        self.replace(mode.into())
    }

    /// Leave a temporary mode, returning to the mode it was entered from.
    pub fn pop(&mut self) -> Option<(ModeState, ModeState)> {
        let prev = self.saved.pop()?;

        self.replace(prev)
    }

    /// The mode that a temporary mode will return to.
    pub fn base(&self) -> ModeState {
        self.saved.first().copied().unwrap_or(self.state)
    }

    /// Whether the current mode is a temporary one.
    pub fn is_temporary(&self) -> bool {
        !self.saved.is_empty()
    }

    /// Decide which mode a request made from the current mode leads to.
    pub fn target(&self, change: ModeChange, opts: &OptionValueAccessor<'_>) -> ModeState {
        let curr = self.base();

        match change {
            ModeChange::None => curr,
            ModeChange::Normal => Mode::Normal.into(),
            ModeChange::Insert => Mode::Insert.into(),
            ModeChange::Replace => Mode::Replace.into(),
            ModeChange::Visual(sub) => {
                match curr.mode() {
                    Mode::Visual | Mode::Select if curr.submode() == sub => Mode::Normal.into(),
                    Mode::Visual | Mode::Select => ModeState::new(curr.mode(), sub),
                    _ if opts.has_value(vim::SELECTMODE, "cmd") => {
                        ModeState::new(Mode::Select, sub)
                    },
                    _ => ModeState::new(Mode::Visual, sub),
                }
            },
            ModeChange::Select(sub) => {
                match curr.mode() {
                    Mode::Select if curr.submode() == sub => Mode::Normal.into(),
                    _ => ModeState::new(Mode::Select, sub),
                }
            },
            ModeChange::SwapVisualSelect => {
                match curr.mode() {
                    Mode::Visual => ModeState::new(Mode::Select, curr.submode()),
                    Mode::Select => ModeState::new(Mode::Visual, curr.submode()),
                    _ => curr,
                }
            },
        }
    }

    /// Decide whether a command's special-key flags start or stop a selection.
    ///
    /// This applies the `keymodel` option to unshifted special keys, which can stop a selection,
    /// and to shifted special keys, which can start one.
    pub fn keymodel_target(
        &self,
        flags: CommandFlags,
        opts: &OptionValueAccessor<'_>,
    ) -> Option<ModeState> {
        let curr = self.base();
        let km = |v: &str| opts.has_value(vim::KEYMODEL, v);

        if flags.contains(CommandFlags::KEYMODEL) {
            let stop = match curr.mode() {
                Mode::Select => km("stopsel") || km("stopselect"),
                Mode::Visual => km("stopsel") || km("stopvisual"),
                _ => false,
            };

            if stop {
                return Some(Mode::Normal.into());
            }
        }

        if flags.contains(CommandFlags::SHIFT_SELECT) && km("startsel") {
            match curr.mode() {
                Mode::Normal | Mode::Insert | Mode::Replace => {
                    let mode = if opts.has_value(vim::SELECTMODE, "key") {
                        Mode::Select
                    } else {
                        Mode::Visual
                    };

                    return Some(ModeState::new(mode, SubMode::VisualCharacter));
                },
                _ => {},
            }
        }

        None
    }

    /// The message shown for the current mode when `showmode` is on.
    pub fn show_mode(&self, recording: Option<&Register>) -> String {
        let state = self.base();

        let shape = match state.submode() {
            SubMode::VisualLine => " LINE",
            SubMode::VisualBlock => " BLOCK",
            SubMode::VisualCharacter | SubMode::None => "",
        };

        let msg = match state.mode() {
            Mode::Insert => "-- INSERT --".to_string(),
            Mode::Replace => "-- REPLACE --".to_string(),
            Mode::Visual => format!("-- VISUAL{shape} --"),
            Mode::Select => format!("-- SELECT{shape} --"),
            Mode::Normal | Mode::OperatorPending | Mode::CommandLine => String::new(),
        };

        let rec = recording.and_then(|r| register_to_char(r, false));

        match (msg.is_empty(), rec) {
            (_, None) => msg,
            (true, Some(c)) => format!("recording @{c}"),
            (false, Some(c)) => format!("{msg}recording @{c}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::{OptionScope, OptionStore, SetOperation};

    fn store(opts: &[(&str, &str)]) -> OptionStore {
        let mut store = OptionStore::default();

        for (name, value) in opts {
            store
                .set_str(name, OptionScope::Global, SetOperation::Assign, value)
                .unwrap();
        }

        store
    }

    fn machine(mode: Mode, sub: SubMode) -> ModeMachine {
        let mut mm = ModeMachine::default();
        mm.set(ModeState::new(mode, sub));
        mm
    }

    #[test]
    fn test_visual_toggle() {
        let opts = store(&[]);
        let opts = opts.accessor(OptionScope::Global);
        let v = ModeChange::Visual(SubMode::VisualCharacter);
        let vl = ModeChange::Visual(SubMode::VisualLine);

        let mm = machine(Mode::Normal, SubMode::None);
        assert_eq!(mm.target(v, &opts), ModeState::new(Mode::Visual, SubMode::VisualCharacter));

        let mm = machine(Mode::Visual, SubMode::VisualCharacter);
        assert_eq!(mm.target(v, &opts), ModeState::from(Mode::Normal));
        assert_eq!(mm.target(vl, &opts), ModeState::new(Mode::Visual, SubMode::VisualLine));
        assert_eq!(
            mm.target(ModeChange::SwapVisualSelect, &opts),
            ModeState::new(Mode::Select, SubMode::VisualCharacter)
        );
    }

    #[test]
    fn test_selectmode_cmd() {
        let opts = store(&[("selectmode", "cmd")]);
        let opts = opts.accessor(OptionScope::Global);

        let mm = machine(Mode::Normal, SubMode::None);
        assert_eq!(
            mm.target(ModeChange::Visual(SubMode::VisualLine), &opts),
            ModeState::new(Mode::Select, SubMode::VisualLine)
        );
    }

    #[test]
    fn test_keymodel_stop() {
        let opts = store(&[("keymodel", "stopselect")]);
        let opts = opts.accessor(OptionScope::Global);

        let mm = machine(Mode::Select, SubMode::VisualCharacter);
        assert_eq!(
            mm.keymodel_target(CommandFlags::KEYMODEL, &opts),
            Some(ModeState::from(Mode::Normal))
        );

        // stopselect doesn't affect Visual mode.
        let mm = machine(Mode::Visual, SubMode::VisualCharacter);
        assert_eq!(mm.keymodel_target(CommandFlags::KEYMODEL, &opts), None);

        let opts = store(&[("keymodel", "stopsel")]);
        let opts = opts.accessor(OptionScope::Global);
        assert_eq!(
            mm.keymodel_target(CommandFlags::KEYMODEL, &opts),
            Some(ModeState::from(Mode::Normal))
        );
        assert_eq!(mm.keymodel_target(CommandFlags::NONE, &opts), None);
    }

    #[test]
    fn test_keymodel_start() {
        let opts = store(&[("keymodel", "startsel")]);
        let opts = opts.accessor(OptionScope::Global);

        let mm = machine(Mode::Normal, SubMode::None);
        assert_eq!(
            mm.keymodel_target(CommandFlags::SHIFT_SELECT, &opts),
            Some(ModeState::new(Mode::Visual, SubMode::VisualCharacter))
        );

        let opts = store(&[("keymodel", "startsel"), ("selectmode", "key")]);
        let opts = opts.accessor(OptionScope::Global);
        let mm = machine(Mode::Insert, SubMode::None);
        assert_eq!(
            mm.keymodel_target(CommandFlags::SHIFT_SELECT, &opts),
            Some(ModeState::new(Mode::Select, SubMode::VisualCharacter))
        );

        // Without startsel, shifted keys are plain motions.
        let opts = store(&[]);
        let opts = opts.accessor(OptionScope::Global);
        assert_eq!(mm.keymodel_target(CommandFlags::SHIFT_SELECT, &opts), None);
    }

    #[test]
    fn test_push_pop() {
        let mut mm = machine(Mode::Visual, SubMode::VisualLine);

        let visual = ModeState::new(Mode::Visual, SubMode::VisualLine);
        let cmdline = ModeState::from(Mode::CommandLine);

        assert_eq!(mm.push(Mode::CommandLine), Some((visual, cmdline)));
        assert!(mm.is_temporary());
        assert_eq!(mm.base(), visual);
        assert_eq!(mm.pop(), Some((cmdline, visual)));
        assert_eq!(mm.pop(), None);
        assert!(!mm.is_temporary());
    }

    #[test]
    fn test_show_mode() {
        let mm = machine(Mode::Visual, SubMode::VisualLine);
        assert_eq!(mm.show_mode(None), "-- VISUAL LINE --");

        let mm = machine(Mode::Insert, SubMode::None);
        assert_eq!(mm.show_mode(Some(&Register::Named('q'))), "-- INSERT --recording @q");

        let mm = machine(Mode::Normal, SubMode::None);
        assert_eq!(mm.show_mode(None), "");
        assert_eq!(mm.show_mode(Some(&Register::Named('a'))), "recording @a");
    }
}
