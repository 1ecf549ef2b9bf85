//! # Common types
//!
//! Re-exports of the types most hosts need, for glob importing.
pub use engine_types::prelude::*;
pub use engine_types::{ActionSpec, Argument, Command, OperatorArguments};

pub use crate::engine::{Engine, InputStatus};
pub use crate::errors::EngineError;
pub use crate::host::{EditorHost, ExpressionEvaluator, NoExpressions};
pub use crate::key::TerminalKey;
pub use crate::mapping::MappedModes;
pub use crate::options::{EditorId, LocalListener, OptionScope, OptionStore, OptionValue};
