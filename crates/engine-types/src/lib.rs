//! # Engine Types
//!
//! ## Overview
//!
//! The types in this crate describe fully resolved Vim commands. A key resolver produces a
//! [Command] once all of its keys, its count, its register and its [Argument] have been typed, and
//! hands it to whatever executes the [ActionSpec] it refers to.
//!
//! ## Examples
//!
//! ```
//! use std::sync::Arc;
//! use engine_types::{ActionSpec, Argument, Command};
//! use engine_types::prelude::*;
//!
//! let delete = Arc::new(ActionSpec::new("delete", CommandType::Delete).argument(ArgumentType::Motion));
//! let word = Arc::new(
//!     ActionSpec::new("motion.word", CommandType::Motion).flags(CommandFlags::MOT_EXCLUSIVE),
//! );
//!
//! // "2d3w" deletes six words.
//! let motion = Command::new(word, 6);
//! let cmd = Command::new(delete, 6).with_argument(Argument::Motion(Box::new(motion)));
//!
//! assert_eq!(cmd.count(), 6);
//! assert!(cmd.argument().is_some());
//! ```

// Require docs for public APIs, and disable the more annoying clippy lints.
#![deny(missing_docs)]
#![allow(clippy::bool_to_int_with_if)]
#![allow(clippy::field_reassign_with_default)]
#![allow(clippy::len_without_is_empty)]
#![allow(clippy::manual_range_contains)]
#![allow(clippy::match_like_matches_macro)]
#![allow(clippy::needless_return)]
#![allow(clippy::too_many_arguments)]
#![allow(clippy::type_complexity)]
pub mod prelude;

use std::sync::Arc;

use self::prelude::*;

/// Description of a command handler, and what it needs before it can run.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ActionSpec {
    name: String,
    ctype: CommandType,
    argument: ArgumentType,
    flags: CommandFlags,
    strategy: ExecutionStrategy,
    mode_change: ModeChange,
    builtin: Option<BuiltinAction>,
}

impl ActionSpec {
    /// Create a handler description that needs no argument and runs once.
    pub fn new<S: Into<String>>(name: S, ctype: CommandType) -> Self {
        ActionSpec {
            name: name.into(),
            ctype,
            argument: ArgumentType::None,
            flags: CommandFlags::NONE,
            strategy: ExecutionStrategy::SingleExecution,
            mode_change: ModeChange::None,
            builtin: None,
        }
    }

    /// Set the kind of [Argument] this handler needs.
    pub fn argument(mut self, argument: ArgumentType) -> Self {
        self.argument = argument;
        self
    }

    /// Set the flags this handler declares.
    pub fn flags(mut self, flags: CommandFlags) -> Self {
        self.flags = flags;
        self
    }

    /// Set how this handler wants to be invoked when there are several carets.
    pub fn strategy(mut self, strategy: ExecutionStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Set the mode transition that happens when this handler is resolved.
    pub fn mode_change(mut self, change: ModeChange) -> Self {
        self.mode_change = change;
        self
    }

    /// Mark this handler as one carried out by the engine itself.
    pub fn builtin(mut self, builtin: BuiltinAction) -> Self {
        self.builtin = Some(builtin);
        self
    }

    /// The handler's name.
    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    /// The category of work the handler performs.
    pub fn command_type(&self) -> CommandType {
        self.ctype
    }

    /// The kind of argument the handler needs.
    pub fn argument_type(&self) -> ArgumentType {
        self.argument
    }

    /// The handler's declared flags.
    pub fn command_flags(&self) -> CommandFlags {
        self.flags
    }

    /// The handler's execution strategy.
    pub fn execution_strategy(&self) -> ExecutionStrategy {
        self.strategy
    }

    /// The mode transition the handler requests.
    pub fn requested_mode(&self) -> ModeChange {
        self.mode_change
    }

    /// The engine builtin this handler stands for, if any.
    pub fn builtin_action(&self) -> Option<BuiltinAction> {
        self.builtin
    }

    /// Whether this handler is an operator waiting on a motion.
    pub fn is_operator(&self) -> bool {
        self.argument == ArgumentType::Motion
    }
}

/// The extra input a [Command] needs beyond its keys.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Argument {
    /// The motion an operator applies to.
    Motion(Box<Command>),

    /// A single typed character.
    Character(char),

    /// A list of offsets supplied from outside the engine.
    Offsets(Vec<isize>),

    /// A line entered on the command line.
    ExString(String),
}

impl Argument {
    /// The [ArgumentType] that this value satisfies.
    pub fn argument_type(&self) -> ArgumentType {
        match self {
            Argument::Motion(_) => ArgumentType::Motion,
            Argument::Character(_) => ArgumentType::Character,
            Argument::Offsets(_) => ArgumentType::Offsets,
            Argument::ExString(_) => ArgumentType::ExString,
        }
    }
}

/// A fully resolved command.
///
/// Commands are never modified after they have been built; [Command::with_count],
/// [Command::with_argument] and [Command::with_register] return updated copies.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Command {
    count: usize,
    action: Arc<ActionSpec>,
    ctype: CommandType,
    flags: CommandFlags,
    argument: Option<Argument>,
    register: Option<Register>,
}

impl Command {
    /// Create a command for a handler, taking its type and flags from the [ActionSpec].
    pub fn new(action: Arc<ActionSpec>, count: usize) -> Self {
        let ctype = action.command_type();
        let flags = action.command_flags();

        Command { count, action, ctype, flags, argument: None, register: None }
    }

    /// The raw count typed for this command, or 0 if none was typed.
    pub fn count(&self) -> usize {
        self.count
    }

    /// The handler this command runs.
    pub fn action(&self) -> &Arc<ActionSpec> {
        &self.action
    }

    /// The command's type.
    pub fn command_type(&self) -> CommandType {
        self.ctype
    }

    /// The command's flags.
    pub fn flags(&self) -> CommandFlags {
        self.flags
    }

    /// The command's argument, if it has one.
    pub fn argument(&self) -> Option<&Argument> {
        self.argument.as_ref()
    }

    /// The register selected for this command.
    pub fn register(&self) -> Option<Register> {
        self.register
    }

    /// The motion an operator applies to.
    pub fn motion(&self) -> Option<&Command> {
        match &self.argument {
            Some(Argument::Motion(m)) => Some(m.as_ref()),
            _ => None,
        }
    }

    /// Whether the handler's required argument is present.
    pub fn is_complete(&self) -> bool {
        match self.action.argument_type() {
            ArgumentType::None => true,
            at => self.argument.as_ref().map(Argument::argument_type) == Some(at),
        }
    }

    /// Return a copy of this command with a different count.
    pub fn with_count(&self, count: usize) -> Self {
        Command { count, ..self.clone() }
    }

    /// Return a copy of this command with an argument.
    pub fn with_argument(&self, argument: Argument) -> Self {
        Command { argument: Some(argument), ..self.clone() }
    }

    /// Return a copy of this command that uses a register.
    pub fn with_register(&self, register: Option<Register>) -> Self {
        Command { register, ..self.clone() }
    }

    /// Return a copy of this command with additional flags.
    pub fn with_flags(&self, flags: CommandFlags) -> Self {
        Command { flags: self.flags | flags, ..self.clone() }
    }
}

/// A snapshot of resolver state handed to a handler along with its [Command].
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct OperatorArguments {
    /// Whether the command is running as part of an operator.
    pub is_operator_pending: bool,

    /// The raw count, where 0 means no count was typed.
    pub count0: usize,

    /// The mode the command was resolved in.
    pub mode: Mode,

    /// The submode the command was resolved in.
    pub submode: SubMode,
}

impl OperatorArguments {
    /// Create a new snapshot.
    pub fn new(is_operator_pending: bool, count0: usize, state: ModeState) -> Self {
        OperatorArguments {
            is_operator_pending,
            count0,
            mode: state.mode(),
            submode: state.submode(),
        }
    }

    /// The count, treating a missing count as 1.
    pub fn count1(&self) -> usize {
        self.count0.max(1)
    }

    /// Return a copy of these arguments with a different raw count.
    pub fn with_count0(&self, count0: usize) -> Self {
        OperatorArguments { count0, ..*self }
    }
}

/// Combine an operator's count with its motion's count.
///
/// When neither count was typed the result is 0. Otherwise a missing count is treated as 1 and
/// the two are multiplied, so that `2d3w` deletes six words.
pub fn compose_counts(outer: usize, inner: usize) -> usize {
    if outer == 0 && inner == 0 {
        return 0;
    }

    outer.max(1).saturating_mul(inner.max(1))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn word() -> Arc<ActionSpec> {
        Arc::new(ActionSpec::new("motion.word", CommandType::Motion))
    }

    fn delete() -> Arc<ActionSpec> {
        Arc::new(
            ActionSpec::new("delete", CommandType::Delete)
                .argument(ArgumentType::Motion)
                .strategy(ExecutionStrategy::ForEachCaret),
        )
    }

    #[test]
    fn test_count1() {
        let args = OperatorArguments::default();
        assert_eq!(args.count0, 0);
        assert_eq!(args.count1(), 1);

        let args = args.with_count0(5);
        assert_eq!(args.count0, 5);
        assert_eq!(args.count1(), 5);
        assert_eq!(args.mode, Mode::Normal);
    }

    #[test]
    fn test_compose_counts() {
        assert_eq!(compose_counts(0, 0), 0);
        assert_eq!(compose_counts(2, 3), 6);
        assert_eq!(compose_counts(0, 3), 3);
        assert_eq!(compose_counts(4, 0), 4);
        assert_eq!(compose_counts(usize::MAX, 2), usize::MAX);
    }

    #[test]
    fn test_command_copies() {
        let cmd = Command::new(delete(), 0);
        assert_eq!(cmd.is_complete(), false);
        assert_eq!(cmd.command_type(), CommandType::Delete);

        let motion = Command::new(word(), 3);
        let full = cmd.with_count(2).with_argument(Argument::Motion(Box::new(motion.clone())));

        // The original is left untouched.
        assert_eq!(cmd.count(), 0);
        assert_eq!(cmd.argument(), None);

        assert_eq!(full.count(), 2);
        assert_eq!(full.motion(), Some(&motion));
        assert_eq!(full.is_complete(), true);
        assert_eq!(full.action().execution_strategy(), ExecutionStrategy::ForEachCaret);
    }

    #[test]
    fn test_wrong_argument_incomplete() {
        let cmd = Command::new(delete(), 1).with_argument(Argument::Character('x'));
        assert_eq!(cmd.is_complete(), false);

        let cmd = Command::new(word(), 1).with_register(Some(Register::Named('a')));
        assert_eq!(cmd.is_complete(), true);
        assert_eq!(cmd.register(), Some(Register::Named('a')));
    }
}
