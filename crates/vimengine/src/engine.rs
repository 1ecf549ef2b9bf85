//! # Engine
//!
//! ## Overview
//!
//! The [Engine] ties the pieces of this crate together. It owns the option store, the key
//! resolver, the macro recorder and the ex command table, and drives an [EditorHost] with the
//! commands that typed keys resolve into.
//!
//! Keys go in through [Engine::input_key]. Each call runs every command that the key completes
//! before returning, and reports whether more keys are expected. When the keys typed so far are
//! ambiguous, the returned [InputStatus] carries the `timeoutlen` to wait before calling
//! [Engine::timeout_expired].
//!
//! ## Example
//!
//! ```
//! use vimengine::prelude::*;
//!
//! #[derive(Default)]
//! struct Recorder(Vec<String>);
//!
//! impl EditorHost for Recorder {
//!     type Caret = usize;
//!
//!     fn execute(&mut self, cmd: &Command, _: &OperatorArguments) -> bool {
//!         self.0.push(cmd.action().name().to_string());
//!         true
//!     }
//!
//!     fn carets(&self) -> Vec<usize> {
//!         vec![0]
//!     }
//!
//!     fn execute_for_caret(&mut self, _: &usize, cmd: &Command, args: &OperatorArguments) -> bool {
//!         self.execute(cmd, args)
//!     }
//! }
//!
//! let mut engine = Engine::new(Recorder::default());
//!
//! for key in "2dw".chars() {
//!     engine.input_key(TerminalKey::from(key));
//! }
//!
//! assert_eq!(engine.host().0, vec!["operator.delete"]);
//! ```
use std::sync::Arc;
use std::time::Duration;

use engine_types::prelude::*;
use engine_types::{ActionSpec, Argument, Command};

use crate::commands::{CommandContext, CommandMachine};
use crate::errors::{
    CommandError,
    EngineError,
    EngineResult,
    MacroError,
    MappingError,
    MappingResult,
};
use crate::host::{EditorHost, ExpressionEvaluator, NoExpressions};
use crate::key::{keys_to_string, parse_keys, TerminalKey};
use crate::keybindings::{CommandKeys, EX_COMMAND};
use crate::machine::{EngineEvent, ResolvedCommand, VimMachine};
use crate::macros::MacroRecorder;
use crate::mapping::{MappedModes, MappingRhs, MappingStore};
use crate::options::guicursor::{self, GuiCursorAttributes, GuiCursorMode};
use crate::options::{vim, EditorId, OptionScope, OptionStore, OptionValueAccessor};
use crate::registers::{char_to_register, is_recordable};

/// Whether the engine expects more keys.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum InputStatus {
    /// Nothing is pending.
    Idle,

    /// Keys have been typed that haven't finished resolving.
    Pending {
        /// How long to wait for another key before calling [Engine::timeout_expired], if the
        /// pending keys are ambiguous.
        timeout: Option<Duration>,
    },
}

/// A Vim command engine driving an [EditorHost].
pub struct Engine<H: EditorHost> {
    host: H,
    options: OptionStore,
    machine: VimMachine,
    recorder: MacroRecorder,
    commands: CommandMachine,
    eval: Box<dyn ExpressionEvaluator>,
    editor: EditorId,

    undo_open: bool,
    last_macro: Option<Register>,
    visual: Option<(SubMode, bool)>,
}

impl<H: EditorHost> Engine<H> {
    /// Create an engine with the default Vim keys and options.
    pub fn new(host: H) -> Self {
        Engine::with_keys(host, CommandKeys::default())
    }

    /// Create an engine that resolves commands from a custom table of keys.
    pub fn with_keys(host: H, keys: CommandKeys) -> Self {
        Engine {
            host,
            options: OptionStore::default(),
            machine: VimMachine::new(keys),
            recorder: MacroRecorder::default(),
            commands: CommandMachine::default(),
            eval: Box::new(NoExpressions),
            editor: EditorId::default(),

            undo_open: false,
            last_macro: None,
            visual: None,
        }
    }

    /// Use an evaluator for the right-hand side of `<expr>` mappings.
    pub fn with_evaluator(mut self, eval: Box<dyn ExpressionEvaluator>) -> Self {
        self.eval = eval;
        self
    }

    /// The host being driven.
    pub fn host(&self) -> &H {
        &self.host
    }

    /// Mutable access to the host being driven.
    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    /// The option store.
    pub fn options(&self) -> &OptionStore {
        &self.options
    }

    /// Mutable access to the option store.
    pub fn options_mut(&mut self) -> &mut OptionStore {
        &mut self.options
    }

    /// The user's mappings.
    pub fn mappings(&self) -> &MappingStore {
        self.machine.mappings()
    }

    /// Mutable access to the table of built-in command keys.
    pub fn command_keys_mut(&mut self) -> &mut CommandKeys {
        self.machine.command_keys_mut()
    }

    /// The editor whose local option values are used.
    pub fn editor(&self) -> EditorId {
        self.editor
    }

    /// Switch to another editor's local option values.
    pub fn set_editor(&mut self, editor: EditorId) {
        self.editor = editor;
    }

    /// Typed reads of the current option values.
    pub fn accessor(&self) -> OptionValueAccessor<'_> {
        self.options.accessor(OptionScope::Local(self.editor))
    }

    /// The current mode.
    pub fn mode(&self) -> ModeState {
        self.machine.state()
    }

    /// Process a typed key.
    pub fn input_key(&mut self, key: TerminalKey) -> InputStatus {
        self.recorder.typed(key);

        let opts = self.options.accessor(OptionScope::Local(self.editor));
        self.machine.input_key(key, &opts, self.eval.as_mut());

        self.run();
        self.status()
    }

    /// Resolve ambiguous keys after `timeoutlen` has passed without more input.
    pub fn timeout_expired(&mut self) -> InputStatus {
        let opts = self.options.accessor(OptionScope::Local(self.editor));
        self.machine.timeout_expired(&opts, self.eval.as_mut());

        self.run();
        self.status()
    }

    /// Supply the offsets that a pending command is waiting for.
    ///
    /// Returns `false` if no command is waiting for offsets.
    pub fn supply_offsets(&mut self, offsets: Vec<isize>) -> bool {
        let opts = self.options.accessor(OptionScope::Local(self.editor));
        let supplied = self.machine.supply_offsets(offsets, &opts, self.eval.as_mut());

        self.run();
        supplied
    }

    /// Drop anything pending, and stop any macro being replayed.
    pub fn cancel(&mut self) {
        self.recorder.interrupt();
        self.machine.cancel();
        self.run();
    }

    /// Switch modes directly, dropping anything pending.
    pub fn set_mode(&mut self, state: ModeState) {
        self.machine.set_mode(state);
        self.run();
    }

    /// The message to show for the current mode, when `showmode` is on.
    pub fn show_mode(&self) -> String {
        if self.accessor().is_set(vim::SHOWMODE) {
            self.machine.show_mode(self.recorder.recording())
        } else {
            String::new()
        }
    }

    /// The keys of the command being typed, when `showcmd` is on.
    pub fn show_cmd(&self) -> String {
        if self.accessor().is_set(vim::SHOWCMD) {
            self.machine.show_cmd()
        } else {
            String::new()
        }
    }

    /// The contents of the command line, while one is being typed.
    pub fn command_line(&self) -> Option<String> {
        self.machine.command_line()
    }

    /// What the cursor should look like in the current mode.
    pub fn cursor_shape(&self) -> GuiCursorAttributes {
        let opts = self.accessor();
        let exclusive = opts.get_string(vim::SELECTION) == "exclusive";
        let mode = GuiCursorMode::from_mode(self.machine.state(), exclusive);

        match guicursor::parse(&opts.get_string(vim::GUICURSOR)) {
            Ok(entries) => guicursor::attributes(&entries, mode),
            Err(e) => {
                log::warn!("unusable guicursor value: {e}");
                GuiCursorAttributes::default()
            },
        }
    }

    /// Map keys written in key notation.
    pub fn map(&mut self, modes: MappedModes, lhs: &str, rhs: &str, noremap: bool) -> MappingResult<()> {
        self.machine.mappings_mut().add_str(modes, lhs, rhs, noremap, false)
    }

    /// Map keys directly to an action.
    pub fn map_action(
        &mut self,
        modes: MappedModes,
        lhs: &str,
        action: Arc<ActionSpec>,
    ) -> MappingResult<()> {
        let keys = parse_keys(lhs)
            .map_err(|_| MappingError::InvalidKeys(lhs.to_string()))?;

        self.machine.mappings_mut().add(modes, keys, MappingRhs::Action(action), true)
    }

    /// Remove a mapping.
    pub fn unmap(&mut self, modes: MappedModes, lhs: &str) -> MappingResult<()> {
        self.machine.mappings_mut().remove_str(modes, lhs)
    }

    /// Run an ex command line.
    ///
    /// Commands that the engine doesn't handle itself are passed to
    /// [EditorHost::execute_ex]. Failures are reported to the host, and return `false`.
    pub fn execute_ex(&mut self, cmdline: &str) -> bool {
        match self.run_ex(cmdline) {
            Ok(()) => true,
            Err(e) => {
                self.report(e);
                false
            },
        }
    }

    /// Run each line of a configuration file, like a `.vimrc`.
    ///
    /// Blank lines and comment lines starting with `"` are skipped. A failing line is reported to
    /// the host, and doesn't stop the lines after it from running. The first failure is returned.
    pub fn source(&mut self, text: &str) -> EngineResult<()> {
        let mut first = None;

        for (n, line) in text.lines().enumerate() {
            let line = line.trim();

            if line.is_empty() || line.starts_with('"') {
                continue;
            }

            if let Err(e) = self.run_ex(line) {
                log::debug!("line {}: {e}", n + 1);
                self.report(e.clone());
                first.get_or_insert(e);
            }
        }

        match first {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    fn run_ex(&mut self, cmdline: &str) -> EngineResult<()> {
        if !self.commands.is_command(cmdline) {
            if self.host.execute_ex(cmdline) {
                return Ok(());
            }

            let name = cmdline.trim().trim_start_matches(':').trim_start();
            return Err(CommandError::InvalidCommand(name.to_string()).into());
        }

        let mut ctx =
            CommandContext::new(&mut self.options, self.machine.mappings_mut(), self.editor);
        let output = self.commands.input_cmd(cmdline, &mut ctx)?;

        for line in output {
            self.host.show_message(&line);
        }

        Ok(())
    }

    fn status(&self) -> InputStatus {
        if !self.machine.is_pending() {
            return InputStatus::Idle;
        }

        let opts = self.accessor();
        let timeout = if self.machine.needs_timeout() && opts.is_set(vim::TIMEOUT) {
            let ms = u64::try_from(opts.get_int(vim::TIMEOUTLEN)).unwrap_or(0);
            Some(Duration::from_millis(ms))
        } else {
            None
        };

        InputStatus::Pending { timeout }
    }

    /// Dispatch events, feeding in replayed macro keys between them.
    fn run(&mut self) {
        loop {
            while let Some(ev) = self.machine.pop() {
                self.dispatch(ev);
            }

            if self.machine.is_awaiting_offsets() {
                break;
            }

            if self.recorder.is_replaying() && self.host.should_interrupt() {
                log::info!("Macro replay interrupted");
                self.recorder.interrupt();
                self.machine.cancel();
                continue;
            }

            let Some(key) = self.recorder.next_key() else {
                break;
            };

            let opts = self.options.accessor(OptionScope::Local(self.editor));
            self.machine.input_key(key, &opts, self.eval.as_mut());
        }
    }

    fn report(&mut self, err: EngineError) {
        self.host.report_error(&err);
    }

    fn dispatch(&mut self, ev: EngineEvent) {
        match ev {
            EngineEvent::ModeChanged(old, new) => {
                self.mode_changed(old, new);
            },
            EngineEvent::Error(err) => {
                self.recorder.interrupt();
                self.report(err);
            },
            EngineEvent::Command(rc) => {
                let ok = self.execute(&rc);
                self.recorder.command_completed();

                if !ok {
                    self.recorder.interrupt();
                }
            },
        }
    }

    fn mode_changed(&mut self, old: ModeState, new: ModeState) {
        match new.mode() {
            Mode::Visual | Mode::Select => {
                let visual = (new.submode(), new.mode() == Mode::Select);

                if self.visual != Some(visual) {
                    self.visual = Some(visual);
                    self.host.enter_visual_mode(visual.0, visual.1);
                }
            },
            // The selection is still there while typing a command or a motion.
            Mode::CommandLine | Mode::OperatorPending => {},
            Mode::Normal | Mode::Insert | Mode::Replace => {
                if self.visual.take().is_some() {
                    self.host.exit_visual_mode();
                }
            },
        }

        if self.undo_open && old.mode().is_inserting() && !new.mode().is_inserting() {
            self.undo_open = false;
            self.host.finish_undo_group();
        }

        self.host.mode_changed(old, new);
    }

    fn execute(&mut self, rc: &ResolvedCommand) -> bool {
        let cmd = &rc.command;

        if let Some(builtin) = cmd.action().builtin_action() {
            return self.builtin(builtin, rc);
        }

        // Operators in Visual and Select mode apply to the selection instead of a motion.
        let on_selection = cmd.action().is_operator() && rc.args.mode.is_selecting();

        if !cmd.is_complete() && !on_selection {
            let action = cmd.action();
            log::warn!("{} is missing its {:?} argument", action.name(), action.argument_type());
            return false;
        }

        let target = cmd.motion().unwrap_or(cmd);

        if target.flags().contains(CommandFlags::MARK) {
            if let Some(Argument::Character(mark)) = target.argument() {
                if self.host.mark_offset(*mark).is_none() {
                    self.report(EngineError::MarkNotSet(*mark));
                    return false;
                }
            }
        }

        if let Some(Argument::ExString(line)) = target.argument() {
            if target.action().name() == EX_COMMAND {
                self.host.set_register(&Register::LastCommand, line.clone(), false);
                return self.execute_ex(line);
            }

            self.host.set_register(&Register::LastSearch, line.clone(), false);
        }

        if cmd.flags().contains(CommandFlags::MULTIKEY_UNDO) && !self.undo_open {
            self.undo_open = true;
            self.host.start_undo_group();
        }

        match cmd.action().execution_strategy() {
            ExecutionStrategy::SingleExecution => self.host.execute(cmd, &rc.args),
            ExecutionStrategy::ForEachCaret => {
                let mut ok = true;

                for caret in self.host.carets() {
                    ok &= self.host.execute_for_caret(&caret, cmd, &rc.args);
                }

                ok
            },
        }
    }

    fn builtin(&mut self, builtin: BuiltinAction, rc: &ResolvedCommand) -> bool {
        let cmd = &rc.command;

        match builtin {
            BuiltinAction::ToggleRecording => {
                if let Some((reg, append, keys)) = self.recorder.finish() {
                    self.machine.set_recording(false);
                    self.host.set_register(&reg, keys_to_string(&keys), append);
                    return true;
                }

                let Some(Argument::Character(c)) = cmd.argument() else {
                    return false;
                };

                match char_to_register(*c) {
                    Some((reg, append)) if is_recordable(&reg) => {
                        self.recorder.start(reg, append);
                        self.machine.set_recording(true);
                        true
                    },
                    _ => {
                        self.report(MacroError::InvalidRegister(*c).into());
                        false
                    },
                }
            },
            BuiltinAction::ExecuteMacro => {
                let Some(Argument::Character(c)) = cmd.argument() else {
                    return false;
                };

                let reg = if *c == '@' {
                    self.last_macro.ok_or(MacroError::NoPreviousRegister)
                } else {
                    char_to_register(*c)
                        .map(|(reg, _)| reg)
                        .ok_or(MacroError::InvalidRegister(*c))
                };

                match reg {
                    Ok(reg) => self.run_macro(reg, rc.args.count1()),
                    Err(e) => {
                        self.report(e.into());
                        false
                    },
                }
            },
            BuiltinAction::RepeatMacro => {
                match self.last_macro {
                    Some(reg) => self.run_macro(reg, rc.args.count1()),
                    None => {
                        self.report(MacroError::NoPreviousRegister.into());
                        false
                    },
                }
            },
            BuiltinAction::Filter => {
                self.host.start_filter_command(&rc.args);
                self.host.execute(cmd, &rc.args)
            },
        }
    }

    fn run_macro(&mut self, reg: Register, count: usize) -> bool {
        let text = match self.host.get_register(&reg) {
            Some(text) if !text.is_empty() => text,
            _ => {
                self.report(MacroError::EmptyRegister(reg).into());
                return false;
            },
        };

        self.last_macro = Some(reg);

        if reg == Register::LastCommand {
            return (0..count).all(|_| self.execute_ex(&text));
        }

        let res = parse_keys(&text).and_then(|keys| self.recorder.execute(&keys, count));

        match res {
            Ok(()) => {
                log::debug!("replaying {reg:?} {count} time(s)");
                true
            },
            Err(e) => {
                self.report(e.into());
                false
            },
        }
    }
}
