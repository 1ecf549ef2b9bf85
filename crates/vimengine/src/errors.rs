//! # Error Types
//!
//! ## Overview
//!
//! This module contains the errors returned by the engine's components. Every error carries the
//! Vim error code that gets shown to the user alongside its message, available through each
//! type's `code` method.
use engine_types::prelude::Register;

use crate::registers::register_to_char;

fn register_name(reg: &Register) -> String {
    match register_to_char(reg, false) {
        Some(c) => c.to_string(),
        None => format!("{reg:?}"),
    }
}

/// Errors from reading, writing and validating options.
#[derive(thiserror::Error, Clone, Debug, Eq, PartialEq)]
#[non_exhaustive]
pub enum OptionError {
    /// The option name isn't known.
    #[error("E518: Unknown option: {0}")]
    UnknownOption(String),

    /// The value isn't accepted by the option.
    #[error("E474: Invalid argument: {0}")]
    InvalidArgument(String),

    /// A negative value was given to an unsigned option.
    #[error("E487: Argument must be positive: {0}")]
    MustBePositive(String),

    /// A value that isn't a number was given to a number option.
    #[error("E521: Number required after =: {0}")]
    NumberRequired(String),

    /// A `guicursor` entry has no mode list.
    #[error("E545: Missing colon: {0}")]
    MissingColon(String),

    /// A `guicursor` entry has an unknown mode, or too many colons.
    #[error("E546: Illegal mode: {0}")]
    IllegalMode(String),

    /// A `guicursor` shape is missing its thickness.
    #[error("E548: Digit expected: {0}")]
    DigitExpected(String),

    /// A `guicursor` thickness is outside of 1 to 100.
    #[error("E549: Illegal percentage: {0}")]
    IllegalPercentage(String),
}

impl OptionError {
    /// The Vim error code.
    pub fn code(&self) -> &'static str {
        match self {
            OptionError::UnknownOption(_) => "E518",
            OptionError::InvalidArgument(_) => "E474",
            OptionError::MustBePositive(_) => "E487",
            OptionError::NumberRequired(_) => "E521",
            OptionError::MissingColon(_) => "E545",
            OptionError::IllegalMode(_) => "E546",
            OptionError::DigitExpected(_) => "E548",
            OptionError::IllegalPercentage(_) => "E549",
        }
    }
}

/// Errors from defining and expanding mappings.
#[derive(thiserror::Error, Clone, Debug, Eq, PartialEq)]
#[non_exhaustive]
pub enum MappingError {
    /// Mappings expanded into each other more than `maxmapdepth` times.
    #[error("E223: recursive mapping")]
    RecursiveMapping,

    /// There's no mapping to remove.
    #[error("E31: No such mapping")]
    NoSuchMapping,

    /// The left-hand side of a mapping was empty or unparseable.
    #[error("E474: Invalid argument: {0}")]
    InvalidKeys(String),

    /// Evaluating an `<expr>` mapping failed.
    #[error("E15: Invalid expression: {0}")]
    InvalidExpression(String),
}

impl MappingError {
    /// The Vim error code.
    pub fn code(&self) -> &'static str {
        match self {
            MappingError::RecursiveMapping => "E223",
            MappingError::NoSuchMapping => "E31",
            MappingError::InvalidKeys(_) => "E474",
            MappingError::InvalidExpression(_) => "E15",
        }
    }
}

/// Errors that occur while trying to use macros.
#[derive(thiserror::Error, Clone, Debug, Eq, PartialEq)]
#[non_exhaustive]
pub enum MacroError {
    /// Failure to interpret macro string.
    #[error("E474: Invalid macro string: {0:?}")]
    InvalidMacro(String),

    /// Empty macro string.
    #[error("E474: Empty macro string")]
    EmptyMacro,

    /// A macro that seems to be looping.
    #[error("E169: Command too recursive; macro run {0} times w/o keyboard input")]
    LoopingMacro(usize),

    /// The character doesn't name a register that can hold a macro.
    #[error("E354: Invalid register name: '{0}'")]
    InvalidRegister(char),

    /// `@@` was used before any macro had been executed.
    #[error("E748: No previously used register")]
    NoPreviousRegister,

    /// The register holds nothing to execute.
    #[error("E353: Nothing in register {}", register_name(.0))]
    EmptyRegister(Register),
}

impl MacroError {
    /// The Vim error code.
    pub fn code(&self) -> &'static str {
        match self {
            MacroError::InvalidMacro(_) | MacroError::EmptyMacro => "E474",
            MacroError::LoopingMacro(_) => "E169",
            MacroError::InvalidRegister(_) => "E354",
            MacroError::NoPreviousRegister => "E748",
            MacroError::EmptyRegister(_) => "E353",
        }
    }
}

/// Errors that can be encountered during command processing.
#[derive(thiserror::Error, Clone, Debug, Eq, PartialEq)]
#[non_exhaustive]
pub enum CommandError {
    /// Error for unmapped commands.
    #[error("E492: Not an editor command: {0}")]
    InvalidCommand(String),

    /// Error for bad command arguments.
    #[error("E474: Invalid argument: {0}")]
    InvalidArgument(String),

    /// Error for command parse failures.
    #[error("E488: Trailing characters: {0}")]
    ParseFailed(String),
}

impl CommandError {
    /// The Vim error code.
    pub fn code(&self) -> &'static str {
        match self {
            CommandError::InvalidCommand(_) => "E492",
            CommandError::InvalidArgument(_) => "E474",
            CommandError::ParseFailed(_) => "E488",
        }
    }
}

/// Wrapper for the errors that the engine reports to the host.
#[derive(thiserror::Error, Clone, Debug, Eq, PartialEq)]
#[non_exhaustive]
pub enum EngineError {
    /// Failure while reading or writing an option.
    #[error("{0}")]
    Option(#[from] OptionError),

    /// Failure while defining or expanding a mapping.
    #[error("{0}")]
    Mapping(#[from] MappingError),

    /// Failure while recording or executing a macro.
    #[error("{0}")]
    Macro(#[from] MacroError),

    /// Failure while running an ex command.
    #[error("{0}")]
    Command(#[from] CommandError),

    /// A command referred to a mark that the host doesn't know.
    #[error("E20: Mark not set")]
    MarkNotSet(char),
}

impl EngineError {
    /// The Vim error code.
    pub fn code(&self) -> &'static str {
        match self {
            EngineError::Option(e) => e.code(),
            EngineError::Mapping(e) => e.code(),
            EngineError::Macro(e) => e.code(),
            EngineError::Command(e) => e.code(),
            EngineError::MarkNotSet(_) => "E20",
        }
    }
}

/// Common result type for option operations.
pub type OptionResult<V> = Result<V, OptionError>;

/// Common result type for mapping operations.
pub type MappingResult<V> = Result<V, MappingError>;

/// Common result type for engine operations.
pub type EngineResult<V> = Result<V, EngineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages() {
        let err = OptionError::MissingColon("whatever".into());
        assert_eq!(err.to_string(), "E545: Missing colon: whatever");

        let err = OptionError::IllegalPercentage("n:ver0-Cursor".into());
        assert_eq!(err.to_string(), "E549: Illegal percentage: n:ver0-Cursor");

        let err = EngineError::from(OptionError::MustBePositive("history=-1".into()));
        assert_eq!(err.to_string(), "E487: Argument must be positive: history=-1");
        assert_eq!(err.code(), "E487");

        let err = EngineError::from(MacroError::InvalidRegister('!'));
        assert_eq!(err.code(), "E354");
        assert_eq!(EngineError::MarkNotSet('a').to_string(), "E20: Mark not set");

        let err = MacroError::EmptyRegister(Register::Named('q'));
        assert_eq!(err.to_string(), "E353: Nothing in register q");

        let err = MacroError::EmptyRegister(Register::LastCommand);
        assert_eq!(err.to_string(), "E353: Nothing in register :");
    }
}
