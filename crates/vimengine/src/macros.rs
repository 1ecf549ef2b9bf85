//! # Macro recording and replay
//!
//! ## Overview
//!
//! The [MacroRecorder] records the keys typed at the terminal while recording is active, and
//! holds the keys of macros being replayed until the engine asks for them.
//!
//! Replayed keys are handed out one at a time between dispatched commands, and any key actually
//! typed at the terminal clears whatever replay keys remain. This gives stop-on-error behaviour
//! and lets `<Esc>` interrupt a long replay.
//!
//! Keys are recorded as they were typed, before any mapping expansion. The keys of the command
//! that stops a recording (usually `q`) are held back as pending until another command
//! completes, so that they never end up in the register.
use std::collections::VecDeque;

use engine_types::prelude::Register;

use crate::errors::MacroError;
use crate::key::TerminalKey;

/// How deeply macros may invoke other macros before replay is aborted.
pub const MAX_MACRO_EXEC_DEPTH: usize = 100;

/// Records typed keys, and feeds replayed ones.
#[derive(Debug, Default)]
pub struct MacroRecorder {
    keystack: VecDeque<TerminalKey>,

    recording: Option<(Register, bool)>,
    exec_depth: usize,
    commit_on_input: bool,
    committed: Vec<TerminalKey>,
    pending: Vec<TerminalKey>,
}

impl MacroRecorder {
    /// Note a key typed at the terminal.
    ///
    /// This records the key if recording is active, and interrupts any replay in progress.
    pub fn typed(&mut self, key: TerminalKey) {
        self.exec_depth = 0;

        if self.recording.is_some() {
            if self.commit_on_input {
                let pending = std::mem::replace(&mut self.pending, vec![key]);
                self.committed.extend(pending);
                self.commit_on_input = false;
            } else {
                self.pending.push(key);
            }
        }

        if !self.keystack.is_empty() {
            log::debug!("interrupting macro replay with {} keys left", self.keystack.len());
            self.keystack.clear();
        }
    }

    /// Note that a command finished resolving, so the keys typed for it can be kept.
    pub fn command_completed(&mut self) {
        self.commit_on_input = true;
    }

    /// The register being recorded into, if recording is active.
    pub fn recording(&self) -> Option<&Register> {
        self.recording.as_ref().map(|(reg, _)| reg)
    }

    /// Start recording into a register.
    pub fn start(&mut self, register: Register, append: bool) {
        log::debug!("started recording into {register:?} (append: {append})");

        self.recording = Some((register, append));
        self.commit_on_input = false;
        self.committed.clear();
        self.pending.clear();
    }

    /// Stop recording, returning the register and the recorded keys.
    pub fn finish(&mut self) -> Option<(Register, bool, Vec<TerminalKey>)> {
        let (register, append) = self.recording.take()?;
        let keys = std::mem::take(&mut self.committed);

        self.commit_on_input = false;
        self.pending.clear();

        log::debug!("finished recording {} keys into {register:?}", keys.len());

        Some((register, append, keys))
    }

    /// Queue up the keys of a macro to be replayed `count` times.
    ///
    /// Replay keys are placed ahead of any keys already waiting, so a macro that runs another
    /// macro finishes the inner one first.
    pub fn execute(&mut self, keys: &[TerminalKey], count: usize) -> Result<(), MacroError> {
        self.exec_depth += 1;

        if self.exec_depth >= MAX_MACRO_EXEC_DEPTH {
            let err = MacroError::LoopingMacro(self.exec_depth);
            self.interrupt();

            return Err(err);
        }

        for _ in 0..count {
            let mut queued: VecDeque<TerminalKey> = keys.iter().copied().collect();
            queued.append(&mut self.keystack);
            self.keystack = queued;
        }

        Ok(())
    }

    /// Take the next replayed key.
    pub fn next_key(&mut self) -> Option<TerminalKey> {
        self.keystack.pop_front()
    }

    /// Whether replayed keys are waiting.
    pub fn is_replaying(&self) -> bool {
        !self.keystack.is_empty()
    }

    /// Drop any remaining replay keys.
    pub fn interrupt(&mut self) {
        self.keystack.clear();
        self.exec_depth = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn type_command(rec: &mut MacroRecorder, keys: &str) {
        for key in keys!(keys) {
            rec.typed(key);
        }

        rec.command_completed();
    }

    #[test]
    fn test_record() {
        let mut rec = MacroRecorder::default();

        // "qa" is typed before recording begins.
        rec.start(Register::Named('a'), false);
        type_command(&mut rec, "3dw");
        type_command(&mut rec, "j");

        // The "q" that stops recording is never committed.
        rec.typed(key!('q'));

        let (reg, append, keys) = rec.finish().unwrap();
        assert_eq!(reg, Register::Named('a'));
        assert_eq!(append, false);
        assert_eq!(keys, keys!("3dwj"));

        assert_eq!(rec.recording(), None);
        assert_eq!(rec.finish(), None);
    }

    #[test]
    fn test_replay_count() {
        let mut rec = MacroRecorder::default();

        rec.execute(&keys!("dw"), 2).unwrap();
        assert!(rec.is_replaying());

        let mut seen = vec![];

        while let Some(key) = rec.next_key() {
            seen.push(key);
        }

        assert_eq!(seen, keys!("dwdw"));
    }

    #[test]
    fn test_nested_replay_order() {
        let mut rec = MacroRecorder::default();

        rec.execute(&keys!("ab"), 1).unwrap();
        assert_eq!(rec.next_key(), Some(key!('a')));

        rec.execute(&keys!("xy"), 1).unwrap();
        assert_eq!(rec.next_key(), Some(key!('x')));
        assert_eq!(rec.next_key(), Some(key!('y')));
        assert_eq!(rec.next_key(), Some(key!('b')));
        assert_eq!(rec.next_key(), None);
    }

    #[test]
    fn test_typed_key_interrupts() {
        let mut rec = MacroRecorder::default();

        rec.execute(&keys!("dwdwdw"), 1).unwrap();
        rec.next_key();
        rec.typed(key!(crossterm::event::KeyCode::Esc));

        assert!(!rec.is_replaying());
        assert_eq!(rec.next_key(), None);
    }

    #[test]
    fn test_looping_macro() {
        let mut rec = MacroRecorder::default();

        for _ in 1..MAX_MACRO_EXEC_DEPTH {
            rec.execute(&keys!("@a"), 1).unwrap();
        }

        assert_eq!(
            rec.execute(&keys!("@a"), 1),
            Err(MacroError::LoopingMacro(MAX_MACRO_EXEC_DEPTH))
        );
        assert!(!rec.is_replaying());
    }
}
