//! # Key resolution
//!
//! ## Overview
//!
//! The [VimMachine] turns typed keys into [Command] values, in two layers:
//!
//! - The mapping layer matches typed keys against the user's mappings for the current mode, and
//!   expands them. Keys that aren't mapped, or are exempt from mapping, pass through to the
//!   command layer.
//! - The command layer collects counts, a register prefix, the keys of a built-in command and
//!   whatever argument that command still needs.
//!
//! Resolved commands come out of [VimMachine::pop] as [EngineEvent] values, interleaved with the
//! mode changes they cause, in the order that they should be applied.
//!
//! When typed keys could either complete a mapping or be the start of a longer one, the machine
//! holds them and reports that it [needs a timeout](VimMachine::needs_timeout). The caller then
//! either types more keys, or calls [VimMachine::timeout_expired] once `timeoutlen` has passed.
use std::collections::VecDeque;
use std::sync::Arc;

use engine_types::prelude::*;
use engine_types::{compose_counts, ActionSpec, Argument, Command, OperatorArguments};
use keymap::{InputKey, Lookup};

use crossterm::event::KeyCode;

use crate::errors::{EngineError, MacroError, MappingError};
use crate::host::ExpressionEvaluator;
use crate::key::{keys_to_string, parse_keys, TerminalKey};
use crate::keybindings::{self, CommandKeys};
use crate::mapping::{MappedModes, MappingInfo, MappingRhs, MappingStore};
use crate::mode::ModeMachine;
use crate::options::{vim, OptionValueAccessor};
use crate::registers::{key_to_register, RegisterSpec};
use crate::util::push_digit;

/// A command that finished resolving, along with the state it was resolved in.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ResolvedCommand {
    /// The command to run.
    pub command: Command,

    /// The resolver state to run it with.
    pub args: OperatorArguments,
}

/// Output of the [VimMachine].
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum EngineEvent {
    /// A command is ready to run.
    Command(ResolvedCommand),

    /// The mode changed from the first state to the second.
    ModeChanged(ModeState, ModeState),

    /// Resolution failed, and pending state was reset.
    Error(EngineError),
}

#[derive(Clone, Copy, Debug)]
struct TypedKey {
    key: TerminalKey,
    remap: bool,
    depth: usize,
}

impl TypedKey {
    fn typed(key: TerminalKey) -> Self {
        TypedKey { key, remap: true, depth: 0 }
    }

    fn unmapped(key: TerminalKey) -> Self {
        TypedKey { key, remap: false, depth: 0 }
    }
}

#[derive(Debug)]
enum Awaiting {
    Register,
    Character(Command),
    ExString { cmd: Command, prompt: String, line: String },
    Offsets(Command),
}

#[derive(Debug, Default)]
struct PendingCommand {
    count: Option<usize>,
    /// Count typed before the register, like the 2 in `2"a3yy`.
    register_count: Option<usize>,
    register: Option<RegisterSpec>,
    keys: Vec<TerminalKey>,
    held: Option<(Arc<ActionSpec>, usize)>,

    operator: Option<(Command, Vec<TerminalKey>)>,
    motion_count: Option<usize>,

    awaiting: Option<Awaiting>,
    shown: Vec<TerminalKey>,
}

impl PendingCommand {
    fn is_empty(&self) -> bool {
        self.count.is_none() &&
            self.register_count.is_none() &&
            self.register.is_none() &&
            self.keys.is_empty() &&
            self.operator.is_none() &&
            self.motion_count.is_none() &&
            self.awaiting.is_none()
    }

    fn count_slot(&mut self) -> &mut Option<usize> {
        if self.operator.is_some() {
            &mut self.motion_count
        } else {
            &mut self.count
        }
    }

    /// Whether the next key is an argument that mappings don't apply to.
    fn awaits_literal(&self) -> bool {
        matches!(self.awaiting, Some(Awaiting::Register | Awaiting::Character(_)))
    }

    /// Whether `keys` repeat the pending operator, like the second `d` in `dd` or the `~` in
    /// `g~~`.
    fn repeats_operator(&self) -> bool {
        match &self.operator {
            Some((_, op)) => {
                self.keys == *op || (op.len() == 2 && self.keys.len() == 1 && self.keys[0] == op[1])
            },
            None => false,
        }
    }
}

#[derive(Debug)]
struct BuiltinActions {
    current_line: Arc<ActionSpec>,
    insert_type: Arc<ActionSpec>,
    replace_type: Arc<ActionSpec>,
    select_type: Arc<ActionSpec>,
}

impl Default for BuiltinActions {
    fn default() -> Self {
        BuiltinActions {
            current_line: Arc::new(keybindings::current_line_action()),
            insert_type: Arc::new(keybindings::insert_type_action()),
            replace_type: Arc::new(keybindings::replace_type_action()),
            select_type: Arc::new(keybindings::select_type_action()),
        }
    }
}

/// Resolves typed keys into commands.
#[derive(Debug)]
pub struct VimMachine {
    keys: CommandKeys,
    mappings: MappingStore,
    modes: ModeMachine,
    builtins: BuiltinActions,

    typeahead: VecDeque<TypedKey>,
    trail: Vec<TypedKey>,
    trail_match: Option<(Arc<MappingInfo>, usize)>,

    cmd: PendingCommand,
    recording: bool,
    events: VecDeque<EngineEvent>,
}

impl VimMachine {
    /// Create a machine that resolves commands using `keys`.
    pub fn new(keys: CommandKeys) -> Self {
        VimMachine {
            keys,
            mappings: MappingStore::default(),
            modes: ModeMachine::default(),
            builtins: BuiltinActions::default(),

            typeahead: VecDeque::new(),
            trail: vec![],
            trail_match: None,

            cmd: PendingCommand::default(),
            recording: false,
            events: VecDeque::new(),
        }
    }

    /// The user's mappings.
    pub fn mappings(&self) -> &MappingStore {
        &self.mappings
    }

    /// Mutable access to the user's mappings.
    pub fn mappings_mut(&mut self) -> &mut MappingStore {
        &mut self.mappings
    }

    /// The table of built-in command keys.
    pub fn command_keys(&self) -> &CommandKeys {
        &self.keys
    }

    /// Mutable access to the table of built-in command keys.
    pub fn command_keys_mut(&mut self) -> &mut CommandKeys {
        &mut self.keys
    }

    /// The current mode.
    pub fn state(&self) -> ModeState {
        self.modes.state()
    }

    /// The current mode, without its submode.
    pub fn mode(&self) -> Mode {
        self.modes.mode()
    }

    /// The message shown for the current mode.
    pub fn show_mode(&self, recording: Option<&Register>) -> String {
        self.modes.show_mode(recording)
    }

    /// Tell the machine whether a macro is being recorded, which changes what `q` expects.
    pub fn set_recording(&mut self, recording: bool) {
        self.recording = recording;
    }

    /// Switch modes directly, dropping anything pending.
    pub fn set_mode(&mut self, state: ModeState) {
        self.abort();
        self.trail.clear();
        self.trail_match = None;

        if let Some((old, new)) = self.modes.set(state) {
            self.events.push_back(EngineEvent::ModeChanged(old, new));
        }
    }

    /// Take the next event produced by the keys typed so far.
    pub fn pop(&mut self) -> Option<EngineEvent> {
        self.events.pop_front()
    }

    /// Whether keys have been typed that haven't produced a command yet.
    pub fn is_pending(&self) -> bool {
        !self.trail.is_empty() || !self.typeahead.is_empty() || !self.cmd.is_empty()
    }

    /// Whether the typed keys are ambiguous, and should be resolved after `timeoutlen`.
    pub fn needs_timeout(&self) -> bool {
        !self.trail.is_empty() || self.cmd.held.is_some()
    }

    /// Whether a command is waiting for [VimMachine::supply_offsets].
    pub fn is_awaiting_offsets(&self) -> bool {
        matches!(self.cmd.awaiting, Some(Awaiting::Offsets(_)))
    }

    /// The contents of the command line, including its prompt, while one is being typed.
    pub fn command_line(&self) -> Option<String> {
        match &self.cmd.awaiting {
            Some(Awaiting::ExString { prompt, line, .. }) => Some(format!("{prompt}{line}")),
            _ => None,
        }
    }

    /// The keys of the command typed so far, for `showcmd`.
    pub fn show_cmd(&self) -> String {
        let mut keys = self.cmd.shown.clone();
        keys.extend(self.trail.iter().map(|tk| tk.key));

        keys_to_string(&keys)
    }

    /// Process a typed key.
    pub fn input_key(
        &mut self,
        key: TerminalKey,
        opts: &OptionValueAccessor<'_>,
        eval: &mut dyn ExpressionEvaluator,
    ) {
        if self.is_awaiting_offsets() && key.is_escape() {
            self.cancel();
            return;
        }

        self.typeahead.push_back(TypedKey::typed(key));
        self.process(opts, eval);
    }

    /// Resolve ambiguous keys once `timeoutlen` has passed without more input.
    ///
    /// A complete mapping that was waiting for a longer one fires, and keys that were only the
    /// start of a mapping are handled as if they weren't mapped.
    pub fn timeout_expired(
        &mut self,
        opts: &OptionValueAccessor<'_>,
        eval: &mut dyn ExpressionEvaluator,
    ) {
        if !self.trail.is_empty() {
            let trail = std::mem::take(&mut self.trail);

            match self.trail_match.take() {
                Some((info, len)) => {
                    let (lhs, rest) = trail.split_at(len);
                    self.requeue(rest.to_vec());
                    self.expand(info, lhs, opts, eval);
                },
                None => {
                    let flushed = trail.into_iter().map(|tk| TypedKey { remap: false, ..tk });
                    self.requeue(flushed.collect());
                },
            }

            self.process(opts, eval);
        }

        if self.typeahead.is_empty() && self.cmd.held.is_some() {
            self.fire_held(opts);
            self.process(opts, eval);
        }
    }

    /// Drop all pending keys and state, returning from any temporary mode.
    pub fn cancel(&mut self) {
        self.typeahead.clear();
        self.trail.clear();
        self.trail_match = None;
        self.abort();
    }

    /// Supply the offsets that a pending command is waiting for.
    ///
    /// Returns `false` if no command is waiting for offsets.
    pub fn supply_offsets(
        &mut self,
        offsets: Vec<isize>,
        opts: &OptionValueAccessor<'_>,
        eval: &mut dyn ExpressionEvaluator,
    ) -> bool {
        match self.cmd.awaiting.take() {
            Some(Awaiting::Offsets(cmd)) => {
                self.argument_done(cmd.with_argument(Argument::Offsets(offsets)), opts);
                self.process(opts, eval);
                true
            },
            awaiting => {
                self.cmd.awaiting = awaiting;
                false
            },
        }
    }

    fn process(&mut self, opts: &OptionValueAccessor<'_>, eval: &mut dyn ExpressionEvaluator) {
        while !self.is_awaiting_offsets() {
            let Some(tk) = self.typeahead.pop_front() else {
                break;
            };

            self.map_key(tk, opts, eval);
        }
    }

    fn requeue(&mut self, keys: Vec<TypedKey>) {
        for tk in keys.into_iter().rev() {
            self.typeahead.push_front(tk);
        }
    }

    fn error(&mut self, err: EngineError) {
        log::debug!("resolution failed: {err}");
        self.events.push_back(EngineEvent::Error(err));
    }

    /*
     * Mapping layer
     */

    fn map_key(
        &mut self,
        tk: TypedKey,
        opts: &OptionValueAccessor<'_>,
        eval: &mut dyn ExpressionEvaluator,
    ) {
        if !tk.remap || self.cmd.awaits_literal() || !self.cmd.keys.is_empty() {
            if !self.trail.is_empty() {
                // This key can't extend the trail, so finish with the trail first.
                self.typeahead.push_front(tk);
                self.end_trail(opts, eval);
                return;
            }

            self.command_key(tk.key, opts);
            return;
        }

        self.trail.push(tk);

        let mode = MappedModes::from(self.modes.state());
        let lhs: Vec<TerminalKey> = self.trail.iter().map(|tk| tk.key).collect();

        match self.mappings.lookup(mode, &lhs) {
            Lookup::Complete(info) => {
                let info = info.clone();
                let trail = std::mem::take(&mut self.trail);
                self.trail_match = None;
                self.expand(info, &trail, opts, eval);
            },
            Lookup::Ambiguous(info) => {
                let info = info.clone();

                if opts.is_set(vim::TIMEOUT) {
                    self.trail_match = Some((info, self.trail.len()));
                } else {
                    let trail = std::mem::take(&mut self.trail);
                    self.trail_match = None;
                    self.expand(info, &trail, opts, eval);
                }
            },
            Lookup::Partial => {},
            Lookup::Unmapped => {
                self.end_trail(opts, eval);
            },
        }
    }

    /// Handle a trail that can't be extended any further.
    fn end_trail(&mut self, opts: &OptionValueAccessor<'_>, eval: &mut dyn ExpressionEvaluator) {
        let mut trail = std::mem::take(&mut self.trail);

        if let Some((info, len)) = self.trail_match.take() {
            let rest = trail.split_off(len);
            self.requeue(rest);
            self.expand(info, &trail, opts, eval);
            return;
        }

        if trail.is_empty() {
            return;
        }

        // For mappings "jj" and "kk", typing "jkk" sends "j" on unmapped, and then
        // starts over at "k".
        let first = trail.remove(0);
        self.requeue(trail);
        self.command_key(first.key, opts);
    }

    /// Expand a mapping that the keys in `lhs` triggered.
    fn expand(
        &mut self,
        info: Arc<MappingInfo>,
        lhs: &[TypedKey],
        opts: &OptionValueAccessor<'_>,
        eval: &mut dyn ExpressionEvaluator,
    ) {
        let depth = lhs.iter().map(|tk| tk.depth).max().unwrap_or(0) + 1;
        let max = usize::try_from(opts.get_int(vim::MAXMAPDEPTH)).unwrap_or(0).max(1);

        if depth > max {
            self.cancel();
            self.error(MappingError::RecursiveMapping.into());
            return;
        }

        log::debug!("expanding {} to {} (depth {depth})", keys_to_string(&info.lhs), info.rhs);

        let keys = match &info.rhs {
            MappingRhs::Keys(keys) => keys.clone(),
            MappingRhs::Action(action) => {
                self.command_resolved(action.clone(), vec![], opts);
                return;
            },
            MappingRhs::Expression(expr) => {
                let res = eval
                    .evaluate(expr)
                    .and_then(|s| parse_keys(&s).map_err(|_| s));

                match res {
                    Ok(keys) => keys,
                    Err(msg) => {
                        self.cancel();
                        self.error(MappingError::InvalidExpression(msg).into());
                        return;
                    },
                }
            },
        };

        let remap = !info.noremap && opts.is_set(vim::REMAP);
        let prefix = if remap && keys.starts_with(&info.lhs) {
            info.lhs.len()
        } else {
            0
        };

        let expanded = keys
            .into_iter()
            .enumerate()
            .map(|(i, key)| TypedKey { key, remap: remap && i >= prefix, depth })
            .collect();

        self.requeue(expanded);
    }

    /*
     * Command layer
     */

    fn command_key(&mut self, key: TerminalKey, opts: &OptionValueAccessor<'_>) {
        if let Some(awaiting) = self.cmd.awaiting.take() {
            self.argument_key(awaiting, key, opts);
            return;
        }

        if key.is_escape() && !self.cmd.is_empty() {
            log::debug!("cancelling {:?}", keys_to_string(&self.cmd.shown));
            self.abort();
            return;
        }

        self.cmd.shown.push(key);

        let mode = self.modes.mode();
        let counts = matches!(mode, Mode::Normal | Mode::Visual | Mode::OperatorPending);

        if counts && self.cmd.keys.is_empty() {
            if let Some(digit) = key.get_digit() {
                let slot = self.cmd.count_slot();

                // A leading 0 is a motion, not a count.
                if digit != 0 || slot.is_some() {
                    *slot = Some(push_digit(slot.unwrap_or(0), digit));
                    return;
                }
            }

            if mode != Mode::OperatorPending && key.get_char() == Some('"') {
                self.cmd.awaiting = Some(Awaiting::Register);
                return;
            }
        }

        self.cmd.keys.push(key);

        if self.cmd.repeats_operator() {
            self.cmd.keys.clear();
            self.cmd.held = None;

            let count = self.cmd.motion_count.take().unwrap_or(0);
            let motion = Command::new(self.builtins.current_line.clone(), count);
            self.argument_done(motion, opts);
            return;
        }

        let mode = MappedModes::from(self.modes.state());

        match self.keys.lookup(mode, &self.cmd.keys) {
            Lookup::Complete(action) => {
                let action = action.clone();
                let keys = std::mem::take(&mut self.cmd.keys);
                self.cmd.held = None;
                self.command_resolved(action, keys, opts);
            },
            Lookup::Ambiguous(action) => {
                self.cmd.held = Some((action.clone(), self.cmd.keys.len()));
            },
            Lookup::Partial => {},
            Lookup::Unmapped => {
                self.unmapped(opts);
            },
        }
    }

    fn fire_held(&mut self, opts: &OptionValueAccessor<'_>) {
        let Some((action, len)) = self.cmd.held.take() else {
            return;
        };

        let mut keys = std::mem::take(&mut self.cmd.keys);
        let rest = keys.split_off(len.min(keys.len()));

        self.requeue(rest.into_iter().map(TypedKey::unmapped).collect());
        self.command_resolved(action, keys, opts);
    }

    fn unmapped(&mut self, opts: &OptionValueAccessor<'_>) {
        if self.cmd.held.is_some() {
            self.fire_held(opts);
            return;
        }

        let mut keys = std::mem::take(&mut self.cmd.keys);

        if let [key] = keys.as_mut_slice() {
            // Terminals can deliver a quick <Esc> and key as a single Alt-modified key.
            if let Some(first) = key.decompose() {
                let second = *key;
                self.cmd.shown.pop();
                self.requeue(vec![TypedKey::unmapped(first), TypedKey::unmapped(second)]);
                return;
            }

            let state = self.modes.state();
            let action = match state.mode() {
                Mode::Insert => Some(&self.builtins.insert_type),
                Mode::Replace => Some(&self.builtins.replace_type),
                Mode::Select => Some(&self.builtins.select_type),
                _ => None,
            };

            if let (Some(action), Some(c)) = (action, key.get_char()) {
                let cmd = Command::new(action.clone(), 0).with_argument(Argument::Character(c));
                self.complete(cmd, opts);
                return;
            }
        }

        log::debug!("discarding unmapped keys {:?}", keys_to_string(&keys));
        self.abort();
    }

    fn argument_key(&mut self, awaiting: Awaiting, key: TerminalKey, opts: &OptionValueAccessor<'_>) {
        match awaiting {
            Awaiting::Register => {
                if key.is_escape() {
                    self.abort();
                    return;
                }

                self.cmd.shown.push(key);

                match key_to_register(&key) {
                    Some(spec) => {
                        if let Some(n) = self.cmd.count.take() {
                            let outer = self.cmd.register_count.unwrap_or(0);
                            self.cmd.register_count = Some(compose_counts(outer, n));
                        }

                        self.cmd.register = Some(spec);
                    },
                    None => {
                        let c = key.get_literal_char();
                        self.abort();

                        if let Some(c) = c {
                            self.error(MacroError::InvalidRegister(c).into());
                        }
                    },
                }
            },
            Awaiting::Character(cmd) => {
                if key.is_escape() {
                    self.abort();
                    return;
                }

                match key.get_literal_char() {
                    Some(c) => {
                        self.argument_done(cmd.with_argument(Argument::Character(c)), opts);
                    },
                    None => {
                        log::debug!("discarding non-character argument {key}");
                        self.abort();
                    },
                }
            },
            Awaiting::ExString { cmd, prompt, mut line } => {
                let backspace = key.code() == KeyCode::Backspace || key == ctl!('h');

                if key.is_enter() {
                    self.pop_mode();
                    self.argument_done(cmd.with_argument(Argument::ExString(line)), opts);
                    return;
                }

                if key.is_escape() || (backspace && line.is_empty()) {
                    self.abort();
                    return;
                }

                if backspace {
                    line.pop();
                } else if key == ctl!('u') {
                    line.clear();
                } else if key == ctl!('w') {
                    let trimmed = line.trim_end().len();
                    line.truncate(trimmed);

                    let start = line
                        .char_indices()
                        .rev()
                        .find(|(_, c)| c.is_whitespace())
                        .map(|(i, c)| i + c.len_utf8())
                        .unwrap_or(0);
                    line.truncate(start);
                } else if let Some(c) = key.get_char() {
                    line.push(c);
                } else if key.code() == KeyCode::Tab {
                    line.push('\t');
                }

                self.cmd.awaiting = Some(Awaiting::ExString { cmd, prompt, line });
            },
            Awaiting::Offsets(cmd) => {
                // Keys are queued up until the offsets arrive.
                self.cmd.awaiting = Some(Awaiting::Offsets(cmd));
                self.typeahead.push_front(TypedKey::unmapped(key));
            },
        }
    }

    fn command_resolved(
        &mut self,
        action: Arc<ActionSpec>,
        keys: Vec<TerminalKey>,
        opts: &OptionValueAccessor<'_>,
    ) {
        log::debug!("resolved {:?} to {}", keys_to_string(&keys), action.name());

        let state = self.modes.state();

        if state.mode() == Mode::OperatorPending {
            let count = self.cmd.motion_count.take().unwrap_or(0);
            self.collect_argument(Command::new(action, count), &keys, opts);
            return;
        }

        let count = compose_counts(
            self.cmd.register_count.take().unwrap_or(0),
            self.cmd.count.take().unwrap_or(0),
        );
        let register = self.cmd.register.take().map(command_register);
        let cmd = Command::new(action, count).with_register(register);

        if cmd.action().is_operator() && !state.mode().is_selecting() {
            self.cmd.operator = Some((cmd, keys));
            self.push_mode(Mode::OperatorPending);
            return;
        }

        self.collect_argument(cmd, &keys, opts);
    }

    fn collect_argument(
        &mut self,
        cmd: Command,
        keys: &[TerminalKey],
        opts: &OptionValueAccessor<'_>,
    ) {
        match cmd.action().argument_type() {
            // Operators in Visual and Select mode apply to the selection.
            ArgumentType::None | ArgumentType::Motion => {
                self.argument_done(cmd, opts);
            },
            ArgumentType::Character => {
                let stops_recording = self.recording &&
                    cmd.action().builtin_action() == Some(BuiltinAction::ToggleRecording);

                if stops_recording {
                    self.argument_done(cmd, opts);
                } else {
                    self.cmd.awaiting = Some(Awaiting::Character(cmd));
                }
            },
            ArgumentType::ExString => {
                let prompt = keys
                    .last()
                    .and_then(TerminalKey::get_char)
                    .unwrap_or(':')
                    .to_string();

                self.push_mode(Mode::CommandLine);
                self.cmd.awaiting = Some(Awaiting::ExString { cmd, prompt, line: String::new() });
            },
            ArgumentType::Offsets => {
                self.cmd.awaiting = Some(Awaiting::Offsets(cmd));
            },
        }
    }

    fn argument_done(&mut self, cmd: Command, opts: &OptionValueAccessor<'_>) {
        match self.cmd.operator.take() {
            Some((op, _)) => self.finish_operator(op, cmd, opts),
            None => self.complete(cmd, opts),
        }
    }

    fn finish_operator(&mut self, op: Command, motion: Command, opts: &OptionValueAccessor<'_>) {
        let count = compose_counts(op.count(), motion.count());
        let motion = motion.with_count(count);
        let op = op.with_count(count).with_argument(Argument::Motion(Box::new(motion)));

        while self.modes.is_temporary() {
            self.pop_mode();
        }

        let args = OperatorArguments::new(true, count, Mode::OperatorPending.into());
        self.events.push_back(EngineEvent::Command(ResolvedCommand { command: op.clone(), args }));
        self.apply_mode_change(&op, opts);
        self.reset();
    }

    fn complete(&mut self, cmd: Command, opts: &OptionValueAccessor<'_>) {
        if let Some(state) = self.modes.keymodel_target(cmd.flags(), opts) {
            self.change_mode(state);
        }

        let args = OperatorArguments::new(false, cmd.count(), self.modes.state());
        self.events.push_back(EngineEvent::Command(ResolvedCommand { command: cmd.clone(), args }));
        self.apply_mode_change(&cmd, opts);
        self.reset();
    }

    fn apply_mode_change(&mut self, cmd: &Command, opts: &OptionValueAccessor<'_>) {
        let curr = self.modes.state();
        let selecting = curr.mode().is_selecting();

        let target = match cmd.action().requested_mode() {
            ModeChange::None
                if selecting &&
                    (cmd.flags().contains(CommandFlags::EXIT_VISUAL) ||
                        cmd.action().is_operator()) =>
            {
                Mode::Normal.into()
            },
            ModeChange::None => return,
            change => self.modes.target(change, opts),
        };

        self.change_mode(target);
    }

    fn change_mode(&mut self, state: ModeState) {
        if let Some((old, new)) = self.modes.set(state) {
            self.events.push_back(EngineEvent::ModeChanged(old, new));
        }
    }

    fn push_mode(&mut self, mode: Mode) {
        if let Some((old, new)) = self.modes.push(mode) {
            self.events.push_back(EngineEvent::ModeChanged(old, new));
        }
    }

    fn pop_mode(&mut self) {
        if let Some((old, new)) = self.modes.pop() {
            self.events.push_back(EngineEvent::ModeChanged(old, new));
        }
    }

    fn reset(&mut self) {
        self.cmd = PendingCommand::default();
    }

    /// Drop the command being typed, and leave any temporary modes.
    fn abort(&mut self) {
        self.reset();

        while self.modes.is_temporary() {
            self.pop_mode();
        }
    }
}

impl Default for VimMachine {
    fn default() -> Self {
        VimMachine::new(CommandKeys::default())
    }
}

/// Uppercase register names in a [Command] mean "append".
fn command_register((reg, append): RegisterSpec) -> Register {
    match reg {
        Register::Named(c) if append => Register::Named(c.to_ascii_uppercase()),
        reg => reg,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::NoExpressions;
    use crate::options::{OptionScope, OptionStore, SetOperation};
    use test_log::test;

    struct Harness {
        vm: VimMachine,
        store: OptionStore,
        keys: CommandKeys,
    }

    impl Harness {
        fn new() -> Self {
            Harness {
                vm: VimMachine::default(),
                store: OptionStore::default(),
                keys: CommandKeys::default(),
            }
        }

        fn set(&mut self, name: &str, value: &str) {
            self.store
                .set_str(name, OptionScope::Global, SetOperation::Assign, value)
                .unwrap();
        }

        fn map(&mut self, modes: MappedModes, lhs: &str, rhs: &str, noremap: bool, expr: bool) {
            self.vm.mappings_mut().add_str(modes, lhs, rhs, noremap, expr).unwrap();
        }

        fn input(&mut self, keys: &str) {
            let opts = self.store.accessor(OptionScope::Global);

            for key in keys!(keys) {
                self.vm.input_key(key, &opts, &mut NoExpressions);
            }
        }

        fn timeout(&mut self) {
            let opts = self.store.accessor(OptionScope::Global);
            self.vm.timeout_expired(&opts, &mut NoExpressions);
        }

        fn action(&self, mode: MappedModes, keys: &str) -> Arc<ActionSpec> {
            self.keys.get(mode, keys).unwrap()
        }

        fn events(&mut self) -> Vec<EngineEvent> {
            std::iter::from_fn(|| self.vm.pop()).collect()
        }

        fn commands(&mut self) -> Vec<Command> {
            self.events()
                .into_iter()
                .filter_map(|ev| {
                    match ev {
                        EngineEvent::Command(rc) => Some(rc.command),
                        _ => None,
                    }
                })
                .collect()
        }
    }

    fn cmd(action: Arc<ActionSpec>, count: usize) -> Command {
        Command::new(action, count)
    }

    fn resolved(command: Command, args: OperatorArguments) -> EngineEvent {
        EngineEvent::Command(ResolvedCommand { command, args })
    }

    fn normal() -> ModeState {
        ModeState::from(Mode::Normal)
    }

    #[test]
    fn test_count() {
        let mut h = Harness::new();
        let w = h.action(MappedModes::N, "w");

        h.input("3w");
        assert_eq!(h.events(), vec![resolved(
            cmd(w.clone(), 3),
            OperatorArguments::new(false, 3, normal())
        )]);

        h.input("w");
        assert_eq!(h.events(), vec![resolved(cmd(w, 0), OperatorArguments::new(false, 0, normal()))]);
    }

    #[test]
    fn test_zero_motion() {
        let mut h = Harness::new();
        let zero = h.action(MappedModes::N, "0");
        let j = h.action(MappedModes::N, "j");

        h.input("0");
        assert_eq!(h.commands(), vec![cmd(zero, 0)]);

        h.input("10j");
        assert_eq!(h.commands(), vec![cmd(j, 10)]);
    }

    #[test]
    fn test_operator_count_composition() {
        let mut h = Harness::new();
        let d = h.action(MappedModes::N, "d");
        let w = h.action(MappedModes::O, "w");
        let op = ModeState::from(Mode::OperatorPending);

        h.input("2d");
        assert_eq!(h.vm.mode(), Mode::OperatorPending);
        assert!(h.vm.is_pending());

        h.input("3w");
        assert_eq!(h.vm.mode(), Mode::Normal);

        let motion = cmd(w, 6);
        let expected = cmd(d, 6).with_argument(Argument::Motion(Box::new(motion)));

        assert_eq!(h.events(), vec![
            EngineEvent::ModeChanged(normal(), op),
            EngineEvent::ModeChanged(op, normal()),
            resolved(expected, OperatorArguments::new(true, 6, op)),
        ]);
        assert!(!h.vm.is_pending());
    }

    #[test]
    fn test_doubled_operator() {
        let mut h = Harness::new();
        let d = h.action(MappedModes::N, "d");
        let tilde = h.action(MappedModes::N, "g~");
        let line = Arc::new(keybindings::current_line_action());

        h.input("3dd");
        let expected = cmd(d, 3).with_argument(Argument::Motion(Box::new(cmd(line.clone(), 3))));
        assert_eq!(h.commands(), vec![expected]);

        h.input("g~~");
        let expected = cmd(tilde.clone(), 0).with_argument(Argument::Motion(Box::new(cmd(line.clone(), 0))));
        assert_eq!(h.commands(), vec![expected.clone()]);

        h.input("g~g~");
        assert_eq!(h.commands(), vec![expected]);
    }

    #[test]
    fn test_change_enters_insert() {
        let mut h = Harness::new();

        h.input("cw");
        assert_eq!(h.vm.mode(), Mode::Insert);

        let events = h.events();
        assert_eq!(
            events.last(),
            Some(&EngineEvent::ModeChanged(normal(), ModeState::from(Mode::Insert)))
        );
    }

    #[test]
    fn test_register_prefix() {
        let mut h = Harness::new();
        let y = h.action(MappedModes::N, "y");
        let line = Arc::new(keybindings::current_line_action());

        h.input("\"ayy");
        let expected = cmd(y.clone(), 0)
            .with_register(Some(Register::Named('a')))
            .with_argument(Argument::Motion(Box::new(cmd(line.clone(), 0))));
        assert_eq!(h.commands(), vec![expected]);

        h.input("\"Ayy");
        let expected = cmd(y, 0)
            .with_register(Some(Register::Named('A')))
            .with_argument(Argument::Motion(Box::new(cmd(line, 0))));
        assert_eq!(h.commands(), vec![expected]);

        h.input("\"<Tab>");
        assert_eq!(h.events(), vec![EngineEvent::Error(MacroError::InvalidRegister('\t').into())]);
        assert!(!h.vm.is_pending());
    }

    #[test]
    fn test_register_prefix_counts() {
        let mut h = Harness::new();
        let y = h.action(MappedModes::N, "y");
        let x = h.action(MappedModes::N, "x");
        let line = Arc::new(keybindings::current_line_action());

        // Counts on either side of the register multiply.
        h.input("2\"a3yy");
        let expected = cmd(y.clone(), 6)
            .with_register(Some(Register::Named('a')))
            .with_argument(Argument::Motion(Box::new(cmd(line.clone(), 6))));
        assert_eq!(h.commands(), vec![expected]);

        h.input("4\"ayy");
        let expected = cmd(y, 4)
            .with_register(Some(Register::Named('a')))
            .with_argument(Argument::Motion(Box::new(cmd(line, 4))));
        assert_eq!(h.commands(), vec![expected]);

        h.input("2\"b5x");
        let expected = cmd(x, 10).with_register(Some(Register::Named('b')));
        assert_eq!(h.commands(), vec![expected]);
        assert!(!h.vm.is_pending());
    }

    #[test]
    fn test_escape_cancels() {
        let mut h = Harness::new();
        let op = ModeState::from(Mode::OperatorPending);

        h.input("2d<Esc>");
        assert_eq!(h.events(), vec![
            EngineEvent::ModeChanged(normal(), op),
            EngineEvent::ModeChanged(op, normal()),
        ]);
        assert!(!h.vm.is_pending());

        // The count was dropped.
        let x = h.action(MappedModes::N, "x");
        h.input("x");
        assert_eq!(h.commands(), vec![cmd(x, 0)]);
    }

    #[test]
    fn test_unknown_keys_discarded() {
        let mut h = Harness::new();

        h.input("zq");
        assert_eq!(h.events(), vec![]);
        assert!(!h.vm.is_pending());

        h.input("d<C-K>");
        assert_eq!(h.vm.mode(), Mode::Normal);
        assert_eq!(h.commands(), vec![]);
    }

    #[test]
    fn test_character_argument() {
        let mut h = Harness::new();
        let d = h.action(MappedModes::N, "d");
        let f = h.action(MappedModes::N, "f");

        h.input("fx");
        assert_eq!(h.commands(), vec![cmd(f.clone(), 0).with_argument(Argument::Character('x'))]);

        h.input("dtx");
        let t = h.action(MappedModes::O, "t");
        let motion = cmd(t, 0).with_argument(Argument::Character('x'));
        let expected = cmd(d, 0).with_argument(Argument::Motion(Box::new(motion)));
        assert_eq!(h.commands(), vec![expected]);

        // Mappings don't apply to character arguments.
        h.map(MappedModes::N, "x", "dd", false, false);
        h.input("fx");
        assert_eq!(h.commands(), vec![cmd(f, 0).with_argument(Argument::Character('x'))]);
    }

    #[test]
    fn test_insert_typing() {
        let mut h = Harness::new();
        let insert = ModeState::from(Mode::Insert);
        let typed = Arc::new(keybindings::insert_type_action());
        let exit = h.action(MappedModes::I, "<Esc>");

        h.input("i");
        assert_eq!(h.vm.mode(), Mode::Insert);
        h.events();

        h.input("a1<Esc>");
        assert_eq!(h.events(), vec![
            resolved(
                cmd(typed.clone(), 0).with_argument(Argument::Character('a')),
                OperatorArguments::new(false, 0, insert)
            ),
            resolved(
                cmd(typed, 0).with_argument(Argument::Character('1')),
                OperatorArguments::new(false, 0, insert)
            ),
            resolved(cmd(exit, 0), OperatorArguments::new(false, 0, insert)),
            EngineEvent::ModeChanged(insert, normal()),
        ]);
    }

    #[test]
    fn test_command_line() {
        let mut h = Harness::new();
        let colon = h.action(MappedModes::N, ":");
        let cmdline = ModeState::from(Mode::CommandLine);

        h.input(":");
        assert_eq!(h.vm.mode(), Mode::CommandLine);
        assert_eq!(h.vm.command_line(), Some(":".into()));

        h.input("set  tw<BS>s foo<C-W>");
        assert_eq!(h.vm.command_line(), Some(":set  ts ".into()));

        h.input("<CR>");
        assert_eq!(h.vm.mode(), Mode::Normal);
        assert_eq!(h.vm.command_line(), None);
        assert_eq!(h.events(), vec![
            EngineEvent::ModeChanged(normal(), cmdline),
            EngineEvent::ModeChanged(cmdline, normal()),
            resolved(
                cmd(colon, 0).with_argument(Argument::ExString("set  ts ".into())),
                OperatorArguments::new(false, 0, normal())
            ),
        ]);

        // Backspace on an empty line cancels.
        h.input(":a<BS><BS>");
        assert_eq!(h.vm.mode(), Mode::Normal);
        assert_eq!(h.commands(), vec![]);
    }

    #[test]
    fn test_search_motion() {
        let mut h = Harness::new();
        let d = h.action(MappedModes::N, "d");
        let search = h.action(MappedModes::O, "/");

        h.input("d/");
        assert_eq!(h.vm.command_line(), Some("/".into()));
        h.input("foo<CR>");

        let motion = cmd(search, 0).with_argument(Argument::ExString("foo".into()));
        let expected = cmd(d, 0).with_argument(Argument::Motion(Box::new(motion)));
        assert_eq!(h.commands(), vec![expected]);
        assert_eq!(h.vm.mode(), Mode::Normal);
        assert!(!h.vm.is_pending());
    }

    #[test]
    fn test_visual_operator() {
        let mut h = Harness::new();
        let visual = ModeState::new(Mode::Visual, SubMode::VisualCharacter);
        let v = h.action(MappedModes::N, "v");
        let d = h.action(MappedModes::X, "d");

        h.input("v");
        assert_eq!(h.events(), vec![
            resolved(cmd(v, 0), OperatorArguments::new(false, 0, normal())),
            EngineEvent::ModeChanged(normal(), visual),
        ]);

        h.input("V");
        assert_eq!(h.vm.state(), ModeState::new(Mode::Visual, SubMode::VisualLine));
        h.events();

        h.input("d");
        let line = ModeState::new(Mode::Visual, SubMode::VisualLine);
        assert_eq!(h.events(), vec![
            resolved(cmd(d, 0), OperatorArguments::new(false, 0, line)),
            EngineEvent::ModeChanged(line, normal()),
        ]);
    }

    #[test]
    fn test_keymodel_startsel() {
        let mut h = Harness::new();
        h.set("keymodel", "startsel,stopsel");

        let visual = ModeState::new(Mode::Visual, SubMode::VisualCharacter);
        let shifted = h.action(MappedModes::N, "<S-Right>");
        let left = h.action(MappedModes::X, "<Left>");

        h.input("<S-Right>");
        assert_eq!(h.events(), vec![
            EngineEvent::ModeChanged(normal(), visual),
            resolved(cmd(shifted, 0), OperatorArguments::new(false, 0, visual)),
        ]);

        h.input("<Left>");
        assert_eq!(h.events(), vec![
            EngineEvent::ModeChanged(visual, normal()),
            resolved(cmd(left, 0), OperatorArguments::new(false, 0, normal())),
        ]);
    }

    #[test]
    fn test_select_typing() {
        let mut h = Harness::new();
        let select = ModeState::new(Mode::Select, SubMode::VisualCharacter);
        let typed = Arc::new(keybindings::select_type_action());

        h.input("gh");
        assert_eq!(h.vm.state(), select);
        h.events();

        h.input("x");
        assert_eq!(h.events(), vec![
            resolved(
                cmd(typed, 0).with_argument(Argument::Character('x')),
                OperatorArguments::new(false, 0, select)
            ),
            EngineEvent::ModeChanged(select, ModeState::from(Mode::Insert)),
        ]);
    }

    #[test]
    fn test_mapping_unmapped_prefix() {
        let mut h = Harness::new();
        let j = h.action(MappedModes::N, "j");
        let x = h.action(MappedModes::N, "x");

        h.map(MappedModes::N, "jj", "X", false, false);
        h.map(MappedModes::N, "kk", "x", false, false);

        h.input("j");
        assert!(h.vm.needs_timeout());
        assert_eq!(h.vm.show_cmd(), "j");

        h.input("kk");
        assert_eq!(h.commands(), vec![cmd(j, 0), cmd(x, 0)]);
        assert!(!h.vm.is_pending());
    }

    #[test]
    fn test_mapping_timeout() {
        let mut h = Harness::new();
        let x = h.action(MappedModes::N, "x");
        let big_x = h.action(MappedModes::N, "X");

        h.map(MappedModes::N, "d", "x", false, false);
        h.map(MappedModes::N, "dd", "X", false, false);

        h.input("d");
        assert!(h.vm.needs_timeout());
        assert_eq!(h.commands(), vec![]);

        h.timeout();
        assert_eq!(h.commands(), vec![cmd(x.clone(), 0)]);
        assert!(!h.vm.is_pending());

        h.input("dd");
        assert_eq!(h.commands(), vec![cmd(big_x, 0)]);

        // A key that can't extend the mapping fires the shorter one.
        let w = h.action(MappedModes::N, "w");
        h.input("dw");
        assert_eq!(h.commands(), vec![cmd(x.clone(), 0), cmd(w, 0)]);

        // Without timeouts, the shorter mapping fires right away.
        h.store.unset_toggle("timeout", OptionScope::Global).unwrap();
        h.input("d");
        assert_eq!(h.commands(), vec![cmd(x, 0)]);
    }

    #[test]
    fn test_partial_mapping_timeout() {
        let mut h = Harness::new();
        let g = h.action(MappedModes::N, "gg");

        h.map(MappedModes::N, "gx", "x", false, false);

        h.input("g");
        assert!(h.vm.needs_timeout());

        // The held keys are handled unmapped.
        h.timeout();
        assert!(!h.vm.needs_timeout());
        h.input("g");
        assert_eq!(h.commands(), vec![cmd(g, 0)]);
    }

    #[test]
    fn test_noremap() {
        let mut h = Harness::new();
        let x = h.action(MappedModes::N, "x");
        let j = h.action(MappedModes::N, "j");

        h.map(MappedModes::N, "x", "j", false, false);
        h.map(MappedModes::N, "y", "x", true, false);
        h.map(MappedModes::N, "z", "x", false, false);

        h.input("y");
        assert_eq!(h.commands(), vec![cmd(x, 0)]);

        h.input("z");
        assert_eq!(h.commands(), vec![cmd(j, 0)]);
    }

    #[test]
    fn test_rhs_starting_with_lhs() {
        let mut h = Harness::new();
        let j = h.action(MappedModes::N, "j");
        let x = h.action(MappedModes::N, "x");

        h.map(MappedModes::N, "j", "jx", false, false);
        h.input("j");
        assert_eq!(h.commands(), vec![cmd(j, 0), cmd(x, 0)]);
    }

    #[test]
    fn test_recursive_mapping() {
        let mut h = Harness::new();
        h.set("maxmapdepth", "20");

        h.map(MappedModes::N, "a", "b", false, false);
        h.map(MappedModes::N, "b", "a", false, false);

        h.input("a");
        assert_eq!(h.events(), vec![EngineEvent::Error(MappingError::RecursiveMapping.into())]);
        assert!(!h.vm.is_pending());
    }

    #[test]
    fn test_expression_mapping() {
        let mut h = Harness::new();
        let d = h.action(MappedModes::N, "d");
        let line = Arc::new(keybindings::current_line_action());

        h.map(MappedModes::N, "Q", "'dd'", false, true);
        h.input("Q");

        let expected = cmd(d, 0).with_argument(Argument::Motion(Box::new(cmd(line, 0))));
        assert_eq!(h.commands(), vec![expected]);

        h.map(MappedModes::N, "Q", "line('.')", false, true);
        h.input("Q");
        assert_eq!(h.events(), vec![EngineEvent::Error(
            MappingError::InvalidExpression("line('.')".into()).into()
        )]);
    }

    #[test]
    fn test_action_mapping() {
        let mut h = Harness::new();
        let w = h.action(MappedModes::N, "w");

        h.vm.mappings_mut()
            .add(MappedModes::N, keys!("<C-K>"), MappingRhs::Action(w.clone()), true)
            .unwrap();

        h.input("4<C-K>");
        assert_eq!(h.commands(), vec![cmd(w, 4)]);
    }

    #[test]
    fn test_stop_recording() {
        let mut h = Harness::new();
        let q = h.action(MappedModes::N, "q");

        h.input("qa");
        assert_eq!(h.commands(), vec![cmd(q.clone(), 0).with_argument(Argument::Character('a'))]);

        h.vm.set_recording(true);
        h.input("q");
        assert_eq!(h.commands(), vec![cmd(q, 0)]);
    }

    #[test]
    fn test_offsets() {
        let mut h = Harness::new();
        let action = Arc::new(
            ActionSpec::new("test.offsets", CommandType::OtherReadonly)
                .argument(ArgumentType::Offsets),
        );
        h.vm.command_keys_mut().add(MappedModes::N, "<C-K>", action.clone()).unwrap();

        h.input("<C-K>x");
        assert!(h.vm.is_awaiting_offsets());
        assert_eq!(h.commands(), vec![]);

        let opts = h.store.accessor(OptionScope::Global);
        assert!(h.vm.supply_offsets(vec![1, -2], &opts, &mut NoExpressions));
        assert!(!h.vm.supply_offsets(vec![], &opts, &mut NoExpressions));

        let x = h.action(MappedModes::N, "x");
        assert_eq!(h.commands(), vec![
            cmd(action, 0).with_argument(Argument::Offsets(vec![1, -2])),
            cmd(x, 0),
        ]);
    }

    #[test]
    fn test_show_cmd() {
        let mut h = Harness::new();

        h.input("2\"ad3");
        assert_eq!(h.vm.show_cmd(), "2\"ad3");

        h.input("<Esc>");
        assert_eq!(h.vm.show_cmd(), "");
    }
}
