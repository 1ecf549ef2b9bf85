//! # vimengine
//!
//! ## Overview
//!
//! This crate turns keys typed at a terminal into the commands of a Vim-like editor, without
//! owning any text itself. It resolves counts, registers, operators, motions and their arguments,
//! expands user mappings, tracks modes, records and replays macros, and keeps a store of typed
//! options that `:set` reads and writes.
//!
//! An editor embeds an [engine::Engine] and implements [host::EditorHost], which receives each
//! resolved command along with the state it was resolved in. The [keybindings] module holds the
//! default Vim keys, and [commands] the ex commands the engine handles itself (`:set` and the
//! `:map` family).
//!
//! ## Example
//!
//! ```
//! use vimengine::prelude::*;
//!
//! struct Host;
//!
//! impl EditorHost for Host {
//!     type Caret = ();
//!
//!     fn execute(&mut self, _: &Command, _: &OperatorArguments) -> bool {
//!         true
//!     }
//!
//!     fn carets(&self) -> Vec<()> {
//!         vec![()]
//!     }
//!
//!     fn execute_for_caret(&mut self, _: &(), _: &Command, _: &OperatorArguments) -> bool {
//!         true
//!     }
//! }
//!
//! let mut engine = Engine::new(Host);
//! engine.source("set notimeout\ninoremap jk <Esc>").unwrap();
//!
//! for key in "ijk".chars() {
//!     engine.input_key(TerminalKey::from(key));
//! }
//!
//! assert_eq!(engine.mode(), ModeState::from(Mode::Normal));
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

#[macro_use]
mod util;

pub mod commands;
pub mod engine;
pub mod errors;
pub mod host;
pub mod key;
pub mod keybindings;
pub mod machine;
pub mod macros;
pub mod mapping;
pub mod mode;
pub mod options;
pub mod prelude;
pub mod registers;

pub use crossterm;
pub use engine_types;
pub use keymap;
