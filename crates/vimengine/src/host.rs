//! # Host capabilities
//!
//! ## Overview
//!
//! The engine doesn't own any text. Everything it needs from the editor it runs inside of goes
//! through the [EditorHost] trait: running resolved commands, reading and writing registers,
//! looking up marks, and being told about mode changes and errors.
//!
//! Only the methods for running commands are required. Everything else has a default that does
//! nothing, so that a host can start small.
use engine_types::prelude::{ModeState, Register, SubMode};
use engine_types::{Command, OperatorArguments};

use crate::errors::EngineError;

/// The editor that the engine drives.
pub trait EditorHost {
    /// A cursor position in the host's text.
    type Caret: Clone;

    /// Run a command once for the whole editing context.
    ///
    /// Returns `false` if the command couldn't run, which stops any macro being replayed.
    fn execute(&mut self, cmd: &Command, args: &OperatorArguments) -> bool;

    /// The carets that a command declared with [ForEachCaret] runs on.
    ///
    /// [ForEachCaret]: engine_types::prelude::ExecutionStrategy::ForEachCaret
    fn carets(&self) -> Vec<Self::Caret>;

    /// Run a command for a single caret.
    fn execute_for_caret(
        &mut self,
        caret: &Self::Caret,
        cmd: &Command,
        args: &OperatorArguments,
    ) -> bool;

    /// Read the text stored in a register.
    fn get_register(&self, register: &Register) -> Option<String> {
        let _ = register;
        None
    }

    /// Store text in a register, or append to what it holds.
    fn set_register(&mut self, register: &Register, text: String, append: bool) {
        let _ = (register, text, append);
    }

    /// Look up where a mark is, if it's set.
    fn mark_offset(&self, mark: char) -> Option<usize> {
        let _ = mark;
        None
    }

    /// Prompt for a shell command to filter text through.
    fn start_filter_command(&mut self, args: &OperatorArguments) {
        let _ = args;
    }

    /// Called after Visual or Select mode starts, or changes its shape.
    fn enter_visual_mode(&mut self, submode: SubMode, select: bool) {
        let _ = (submode, select);
    }

    /// Called after Visual or Select mode ends.
    fn exit_visual_mode(&mut self) {}

    /// Called after every mode change.
    fn mode_changed(&mut self, old: ModeState, new: ModeState) {
        let _ = (old, new);
    }

    /// Start grouping changes into a single undo step.
    fn start_undo_group(&mut self) {}

    /// Finish the current undo step.
    fn finish_undo_group(&mut self) {}

    /// Show an error to the user.
    fn report_error(&mut self, err: &EngineError) {
        log::warn!("{err}");
    }

    /// Show a message to the user.
    fn show_message(&mut self, msg: &str) {
        let _ = msg;
    }

    /// Run an ex command that the engine doesn't handle itself.
    ///
    /// Returns `false` if the host doesn't recognize the command either.
    fn execute_ex(&mut self, cmdline: &str) -> bool {
        let _ = cmdline;
        false
    }

    /// Polled between replayed macro keys; returning `true` stops the replay.
    fn should_interrupt(&mut self) -> bool {
        false
    }
}

/// Evaluates the right-hand side of `<expr>` mappings.
pub trait ExpressionEvaluator {
    /// Evaluate an expression into keys in key notation, or fail with a message.
    fn evaluate(&mut self, expr: &str) -> Result<String, String>;
}

/// An evaluator for hosts without an expression language.
///
/// Quoted strings evaluate to their contents, and everything else fails.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoExpressions;

impl ExpressionEvaluator for NoExpressions {
    fn evaluate(&mut self, expr: &str) -> Result<String, String> {
        let expr = expr.trim();

        for q in ['"', '\''] {
            if let Some(s) = expr.strip_prefix(q).and_then(|s| s.strip_suffix(q)) {
                return Ok(s.to_string());
            }
        }

        Err(expr.to_string())
    }
}
