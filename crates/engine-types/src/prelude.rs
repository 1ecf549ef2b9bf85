//! # Common set of types used for describing commands
//!
//! ## Overview
//!
//! These types describe the modes an editing context can be in, and the properties that
//! handlers declare about the [Command] values they execute.
//!
//! Usually you will just want to import everything in this module into your application via:
//!
//! ```
//! use engine_types::prelude::*;
//! ```
//!
//! [Command]: crate::Command
use bitflags::bitflags;

/// The editing modes.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub enum Mode {
    /// Keys are interpreted as commands.
    #[default]
    Normal,

    /// Typed characters are inserted into the text.
    Insert,

    /// Typed characters overwrite existing text.
    Replace,

    /// Commands apply to a selection that follows the cursor.
    Visual,

    /// Typed characters replace the selection, and special keys extend it.
    Select,

    /// Text is being entered on the command line.
    CommandLine,

    /// An operator has been entered and is waiting for a motion.
    OperatorPending,
}

impl Mode {
    /// Whether this mode has a selection whose shape is described by a [SubMode].
    pub fn is_selecting(&self) -> bool {
        matches!(self, Mode::Visual | Mode::Select)
    }

    /// Whether typed characters go into the text in this mode.
    pub fn is_inserting(&self) -> bool {
        matches!(self, Mode::Insert | Mode::Replace)
    }
}

/// The shape of a selection in [Mode::Visual] and [Mode::Select].
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub enum SubMode {
    /// No selection.
    #[default]
    None,

    /// A series of characters.
    VisualCharacter,

    /// A series of lines.
    VisualLine,

    /// A block of characters between two opposite corners.
    VisualBlock,
}

/// A [Mode] together with the [SubMode] that is meaningful for it.
///
/// The pair is normalized on construction: the submode is [SubMode::None] outside of
/// [Mode::Visual] and [Mode::Select], and is never [SubMode::None] inside of them.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub struct ModeState {
    mode: Mode,
    submode: SubMode,
}

impl ModeState {
    /// Create a normalized mode and submode pair.
    pub fn new(mode: Mode, submode: SubMode) -> Self {
        let submode = match (mode.is_selecting(), submode) {
            (false, _) => SubMode::None,
            (true, SubMode::None) => SubMode::VisualCharacter,
            (true, sub) => sub,
        };

        ModeState { mode, submode }
    }

    /// The current mode.
    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// The current submode.
    pub fn submode(&self) -> SubMode {
        self.submode
    }
}

impl From<Mode> for ModeState {
    fn from(mode: Mode) -> Self {
        ModeState::new(mode, SubMode::None)
    }
}

/// The category of work a handler performs.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub enum CommandType {
    /// The category has not been declared.
    #[default]
    Undefined,

    /// Computes a new cursor position, or a range when used as an operator's argument.
    Motion,

    /// Starts inserting text.
    Insert,

    /// Deletes text.
    Delete,

    /// Changes text.
    Change,

    /// Copies text into a register.
    Copy,

    /// Puts text from a register.
    Paste,

    /// Only reads editor state.
    OtherReadonly,

    /// Modifies editor state without being an edit.
    OtherWritable,
}

/// What kind of [Argument](crate::Argument) a handler needs before it can run.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub enum ArgumentType {
    /// The handler runs as soon as its keys are typed.
    #[default]
    None,

    /// The handler is an operator, and needs a motion to know its extent.
    Motion,

    /// The handler needs a single typed character.
    Character,

    /// The handler needs a list of offsets supplied by an extension.
    Offsets,

    /// The handler needs a line of text from the command line.
    ExString,
}

bitflags! {
    /// Properties a handler declares about the commands it runs.
    #[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
    pub struct CommandFlags: u32 {
        /// No flags set.
        const NONE = 0;

        /// The motion covers whole lines.
        const MOT_LINEWISE = 1 << 0;

        /// The motion covers characters.
        const MOT_CHARACTERWISE = 1 << 1;

        /// The motion includes its final character.
        const MOT_INCLUSIVE = 1 << 2;

        /// The motion excludes its final character.
        const MOT_EXCLUSIVE = 1 << 3;

        /// The previous cursor position goes into the jump list.
        const SAVE_JUMP = 1 << 4;

        /// Text inserted after this command is undone as a single step.
        const MULTIKEY_UNDO = 1 << 5;

        /// A count doesn't repeat the inserted text.
        const NO_REPEAT_INSERT = 1 << 6;

        /// Visual mode is exited after the command runs.
        const EXIT_VISUAL = 1 << 7;

        /// An unshifted special key whose behaviour in Visual and Select depends on `keymodel`.
        const KEYMODEL = 1 << 8;

        /// A shifted special key that can start a selection, depending on `keymodel`.
        const SHIFT_SELECT = 1 << 9;

        /// The character argument names a mark.
        const MARK = 1 << 10;
    }
}

/// How a handler wants to be invoked when there are multiple carets.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub enum ExecutionStrategy {
    /// Run once for the whole editing context.
    #[default]
    SingleExecution,

    /// Run independently for every caret.
    ForEachCaret,
}

/// A mode transition requested by a handler.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub enum ModeChange {
    /// Stay in the current mode.
    #[default]
    None,

    /// Return to [Mode::Normal].
    Normal,

    /// Enter [Mode::Insert].
    Insert,

    /// Enter [Mode::Replace].
    Replace,

    /// Start, switch the shape of, or leave Visual mode.
    Visual(SubMode),

    /// Start, switch the shape of, or leave Select mode.
    Select(SubMode),

    /// Swap between Visual and Select mode, keeping the selection.
    SwapVisualSelect,
}

/// Commands that the engine carries out itself instead of handing to the host.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum BuiltinAction {
    /// Start recording a macro into the register named by the argument, or stop recording.
    ToggleRecording,

    /// Replay the macro stored in the register named by the argument.
    ExecuteMacro,

    /// Replay the most recently executed macro.
    RepeatMacro,

    /// Prompt for a shell command to filter text through.
    Filter,
}

/// Locations for temporarily storing text and macros.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
#[non_exhaustive]
pub enum Register {
    /// The default register.
    ///
    /// For example, `""` in Vim.
    Unnamed,

    /// Recently deleted text.
    ///
    /// The index of the most recent deletion is 0, the second most recent deletion is 1, and so
    /// on.
    ///
    /// For example, `"[1-9]` in Vim.
    RecentlyDeleted(usize),

    /// Most recently deleted text that was shorter than a line.
    ///
    /// For example, `"-` in Vim.
    SmallDelete,

    /// A register containing the last inserted text.
    ///
    /// For example, `".` in Vim.
    LastInserted,

    /// A register containing the last command line.
    ///
    /// For example, `":` in Vim.
    LastCommand,

    /// A register containing the last search pattern.
    ///
    /// For example, `"/` in Vim.
    LastSearch,

    /// A register containing the last copied text.
    ///
    /// For example, `"0` in Vim.
    LastYanked,

    /// A register named by `char`.
    ///
    /// For example, `"[a-z]` in Vim.
    Named(char),

    /// A read-only register containing the alternate buffer name.
    ///
    /// For example, `"#` in Vim.
    AltBufName,

    /// A read-only register containing the current buffer name.
    ///
    /// For example, `"%` in Vim.
    CurBufName,

    /// A register that discards all content written to it.
    ///
    /// For example, `"_` in Vim.
    Blackhole,

    /// The windowing environment's most recently selected text.
    ///
    /// For example, `"*` in Vim.
    SelectionPrimary,

    /// The windowing environment's most recently copied text.
    ///
    /// For example, `"+` in Vim.
    SelectionClipboard,
}

impl Register {
    /// Whether values can be written into this register.
    pub fn is_writable(&self) -> bool {
        match self {
            Register::AltBufName | Register::CurBufName => false,
            Register::LastInserted | Register::LastCommand => false,
            _ => true,
        }
    }
}
