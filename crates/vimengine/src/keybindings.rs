//! # Vim command keys
//!
//! ## Overview
//!
//! This module contains the table of built-in command keys that the resolver falls back to once
//! user mappings have been expanded, and the default Vim keys that fill it.
//!
//! Each entry maps a key sequence in one or more modes to an [ActionSpec], which says what kind
//! of command the keys produce and what argument it still needs.
//!
//! ## Example
//!
//! ```
//! use vimengine::keybindings::CommandKeys;
//! use vimengine::mapping::MappedModes;
//! use engine_types::prelude::ArgumentType;
//!
//! let keys = CommandKeys::default();
//!
//! let delete = keys.get(MappedModes::N, "d").unwrap();
//! assert_eq!(delete.argument_type(), ArgumentType::Motion);
//!
//! let find = keys.get(MappedModes::O, "f").unwrap();
//! assert_eq!(find.argument_type(), ArgumentType::Character);
//! ```
use std::sync::Arc;

use engine_types::prelude::*;
use engine_types::ActionSpec;
use keymap::{Lookup, MappingTable};

use crate::errors::MacroError;
use crate::key::{parse_keys, TerminalKey};
use crate::mapping::MappedModes;

/// The name of the command that `:` produces.
pub const EX_COMMAND: &str = "ex.command";

const N: MappedModes = MappedModes::N;
const X: MappedModes = MappedModes::X;
const S: MappedModes = MappedModes::S;
const O: MappedModes = MappedModes::O;
const I: MappedModes = MappedModes::I;

const V: MappedModes = MappedModes::V;
const MAP: MappedModes = MappedModes::NVO;
const NX: MappedModes = MappedModes::N.union(MappedModes::X);
const XO: MappedModes = MappedModes::X.union(MappedModes::O);
const NXO: MappedModes = NX.union(MappedModes::O);
const MAPI: MappedModes = MAP.union(MappedModes::I);
const NVI: MappedModes = MappedModes::N.union(V).union(MappedModes::I);

macro_rules! spec {
    ($name: literal, $ct: ident) => {
        ActionSpec::new($name, CommandType::$ct)
    };
}

macro_rules! motion {
    ($name: literal) => {
        motion!($name, CommandFlags::MOT_EXCLUSIVE)
    };
    ($name: literal, $flags: expr) => {
        spec!($name, Motion).flags($flags).strategy(ExecutionStrategy::ForEachCaret)
    };
}

macro_rules! linewise {
    ($name: literal) => {
        motion!($name, CommandFlags::MOT_LINEWISE)
    };
}

macro_rules! inclusive {
    ($name: literal) => {
        motion!($name, CommandFlags::MOT_INCLUSIVE)
    };
}

macro_rules! jump {
    ($name: literal, $flags: expr) => {
        motion!($name, $flags | CommandFlags::SAVE_JUMP)
    };
}

macro_rules! special {
    ($name: literal, $flags: expr) => {
        motion!($name, $flags | CommandFlags::KEYMODEL)
    };
}

macro_rules! shifted {
    ($name: literal) => {
        motion!($name, CommandFlags::MOT_EXCLUSIVE | CommandFlags::SHIFT_SELECT)
    };
}

macro_rules! charsearch {
    ($name: literal, $flags: expr) => {
        motion!($name, $flags).argument(ArgumentType::Character)
    };
}

macro_rules! mark {
    ($name: literal, $flags: expr) => {
        jump!($name, $flags | CommandFlags::MARK).argument(ArgumentType::Character)
    };
}

macro_rules! search {
    ($name: literal) => {
        jump!($name, CommandFlags::MOT_EXCLUSIVE).argument(ArgumentType::ExString)
    };
}

macro_rules! object {
    ($name: literal) => {
        motion!($name, CommandFlags::MOT_CHARACTERWISE)
    };
}

macro_rules! operator {
    ($name: literal, $ct: ident) => {
        spec!($name, $ct).argument(ArgumentType::Motion)
    };
}

macro_rules! edit {
    ($name: literal, $ct: ident) => {
        spec!($name, $ct).strategy(ExecutionStrategy::ForEachCaret)
    };
}

macro_rules! insert {
    ($name: literal, $ct: ident) => {
        edit!($name, $ct).flags(CommandFlags::MULTIKEY_UNDO).mode_change(ModeChange::Insert)
    };
}

macro_rules! change {
    ($name: literal) => {
        edit!($name, Change)
            .flags(CommandFlags::MULTIKEY_UNDO | CommandFlags::NO_REPEAT_INSERT)
            .mode_change(ModeChange::Insert)
    };
}

macro_rules! visual {
    ($name: literal, $sub: ident) => {
        spec!($name, OtherReadonly).mode_change(ModeChange::Visual(SubMode::$sub))
    };
}

macro_rules! select {
    ($name: literal, $sub: ident) => {
        spec!($name, OtherReadonly).mode_change(ModeChange::Select(SubMode::$sub))
    };
}

macro_rules! normal {
    ($name: literal) => {
        spec!($name, OtherReadonly).mode_change(ModeChange::Normal)
    };
}

macro_rules! builtin {
    ($name: literal, $b: ident) => {
        spec!($name, OtherReadonly).builtin(BuiltinAction::$b)
    };
}

#[rustfmt::skip]
fn default_keys() -> Vec<(MappedModes, &'static str, ActionSpec)> {
    [
        // Unshifted special keys, which keymodel can make stop a selection
        ( MAPI, "<Left>", special!("motion.left", CommandFlags::MOT_EXCLUSIVE) ),
        ( MAPI, "<Right>", special!("motion.right", CommandFlags::MOT_EXCLUSIVE) ),
        ( MAPI, "<Up>", special!("motion.up", CommandFlags::MOT_LINEWISE) ),
        ( MAPI, "<Down>", special!("motion.down", CommandFlags::MOT_LINEWISE) ),
        ( MAPI, "<Home>", special!("motion.line-start", CommandFlags::MOT_EXCLUSIVE) ),
        ( MAPI, "<End>", special!("motion.line-end", CommandFlags::MOT_INCLUSIVE) ),
        ( MAPI, "<PageUp>", special!("scroll.page-up", CommandFlags::MOT_LINEWISE) ),
        ( MAPI, "<PageDown>", special!("scroll.page-down", CommandFlags::MOT_LINEWISE) ),

        // Shifted special keys, which keymodel can make start a selection
        ( NVI, "<S-Left>", shifted!("motion.shift-left") ),
        ( NVI, "<S-Right>", shifted!("motion.shift-right") ),
        ( NVI, "<S-Up>", shifted!("motion.shift-up") ),
        ( NVI, "<S-Down>", shifted!("motion.shift-down") ),
        ( NVI, "<S-Home>", shifted!("motion.shift-home") ),
        ( NVI, "<S-End>", shifted!("motion.shift-end") ),

        // Normal, Visual, Operator-Pending mode motions
        ( NXO, "h", motion!("motion.left") ),
        ( NXO, "<BS>", motion!("motion.left") ),
        ( NXO, "<C-H>", motion!("motion.left") ),
        ( NXO, "l", motion!("motion.right") ),
        ( NXO, "<Space>", motion!("motion.right") ),
        ( NXO, "j", linewise!("motion.down") ),
        ( NXO, "<C-J>", linewise!("motion.down") ),
        ( NXO, "<C-N>", linewise!("motion.down") ),
        ( NXO, "k", linewise!("motion.up") ),
        ( NXO, "<C-P>", linewise!("motion.up") ),
        ( NXO, "gj", motion!("motion.screen-down") ),
        ( NXO, "gk", motion!("motion.screen-up") ),
        ( NXO, "w", motion!("motion.word") ),
        ( NXO, "W", motion!("motion.big-word") ),
        ( NXO, "b", motion!("motion.word-back") ),
        ( NXO, "B", motion!("motion.big-word-back") ),
        ( NXO, "e", inclusive!("motion.word-end") ),
        ( NXO, "E", inclusive!("motion.big-word-end") ),
        ( NXO, "ge", inclusive!("motion.word-end-back") ),
        ( NXO, "gE", inclusive!("motion.big-word-end-back") ),
        ( NXO, "0", motion!("motion.line-start") ),
        ( NXO, "^", motion!("motion.first-nonblank") ),
        ( NXO, "$", inclusive!("motion.line-end") ),
        ( NXO, "g_", inclusive!("motion.last-nonblank") ),
        ( NXO, "|", motion!("motion.column") ),
        ( NXO, "gg", jump!("motion.file-start", CommandFlags::MOT_LINEWISE) ),
        ( NXO, "G", jump!("motion.file-end", CommandFlags::MOT_LINEWISE) ),
        ( NXO, "H", jump!("motion.screen-top", CommandFlags::MOT_LINEWISE) ),
        ( NXO, "M", jump!("motion.screen-middle", CommandFlags::MOT_LINEWISE) ),
        ( NXO, "L", jump!("motion.screen-bottom", CommandFlags::MOT_LINEWISE) ),
        ( NXO, "%", jump!("motion.match-pair", CommandFlags::MOT_INCLUSIVE) ),
        ( NXO, "(", jump!("motion.sentence-back", CommandFlags::MOT_EXCLUSIVE) ),
        ( NXO, ")", jump!("motion.sentence", CommandFlags::MOT_EXCLUSIVE) ),
        ( NXO, "{", jump!("motion.paragraph-back", CommandFlags::MOT_EXCLUSIVE) ),
        ( NXO, "}", jump!("motion.paragraph", CommandFlags::MOT_EXCLUSIVE) ),
        ( NXO, "f", charsearch!("motion.find-char", CommandFlags::MOT_INCLUSIVE) ),
        ( NXO, "F", charsearch!("motion.find-char-back", CommandFlags::MOT_EXCLUSIVE) ),
        ( NXO, "t", charsearch!("motion.till-char", CommandFlags::MOT_INCLUSIVE) ),
        ( NXO, "T", charsearch!("motion.till-char-back", CommandFlags::MOT_EXCLUSIVE) ),
        ( NXO, ";", inclusive!("motion.repeat-find") ),
        ( NXO, ",", motion!("motion.repeat-find-back") ),
        ( NXO, "`", mark!("motion.goto-mark", CommandFlags::MOT_EXCLUSIVE) ),
        ( NXO, "'", mark!("motion.goto-mark-line", CommandFlags::MOT_LINEWISE) ),
        ( NXO, "/", search!("motion.search-forward") ),
        ( NXO, "?", search!("motion.search-backward") ),
        ( NXO, "n", jump!("motion.search-next", CommandFlags::MOT_EXCLUSIVE) ),
        ( NXO, "N", jump!("motion.search-previous", CommandFlags::MOT_EXCLUSIVE) ),
        ( NXO, "*", jump!("motion.search-word-forward", CommandFlags::MOT_EXCLUSIVE) ),
        ( NXO, "#", jump!("motion.search-word-backward", CommandFlags::MOT_EXCLUSIVE) ),

        // Visual, Operator-Pending mode text objects
        ( XO, "iw", object!("object.inner-word") ),
        ( XO, "aw", object!("object.a-word") ),
        ( XO, "iW", object!("object.inner-big-word") ),
        ( XO, "aW", object!("object.a-big-word") ),
        ( XO, "is", object!("object.inner-sentence") ),
        ( XO, "as", object!("object.a-sentence") ),
        ( XO, "ip", object!("object.inner-paragraph") ),
        ( XO, "ap", object!("object.a-paragraph") ),
        ( XO, "i(", object!("object.inner-paren") ),
        ( XO, "a(", object!("object.a-paren") ),
        ( XO, "i)", object!("object.inner-paren") ),
        ( XO, "a)", object!("object.a-paren") ),
        ( XO, "ib", object!("object.inner-paren") ),
        ( XO, "ab", object!("object.a-paren") ),
        ( XO, "i{", object!("object.inner-brace") ),
        ( XO, "a{", object!("object.a-brace") ),
        ( XO, "i}", object!("object.inner-brace") ),
        ( XO, "a}", object!("object.a-brace") ),
        ( XO, "iB", object!("object.inner-brace") ),
        ( XO, "aB", object!("object.a-brace") ),
        ( XO, "i[", object!("object.inner-bracket") ),
        ( XO, "a[", object!("object.a-bracket") ),
        ( XO, "i]", object!("object.inner-bracket") ),
        ( XO, "a]", object!("object.a-bracket") ),
        ( XO, "i<lt>", object!("object.inner-angle") ),
        ( XO, "a<lt>", object!("object.a-angle") ),
        ( XO, "i>", object!("object.inner-angle") ),
        ( XO, "a>", object!("object.a-angle") ),
        ( XO, "i\"", object!("object.inner-double-quote") ),
        ( XO, "a\"", object!("object.a-double-quote") ),
        ( XO, "i'", object!("object.inner-single-quote") ),
        ( XO, "a'", object!("object.a-single-quote") ),
        ( XO, "i`", object!("object.inner-back-quote") ),
        ( XO, "a`", object!("object.a-back-quote") ),
        ( XO, "it", object!("object.inner-tag") ),
        ( XO, "at", object!("object.a-tag") ),

        // Normal, Visual mode operators
        ( NX, "d", operator!("operator.delete", Delete) ),
        ( NX, "y", operator!("operator.yank", Copy) ),
        ( NX, "c", operator!("operator.change", Change)
            .flags(CommandFlags::MULTIKEY_UNDO | CommandFlags::NO_REPEAT_INSERT)
            .mode_change(ModeChange::Insert) ),
        ( NX, "<lt>", operator!("operator.shift-left", OtherWritable) ),
        ( NX, ">", operator!("operator.shift-right", OtherWritable) ),
        ( NX, "=", operator!("operator.reindent", OtherWritable) ),
        ( NX, "g~", operator!("operator.toggle-case", OtherWritable) ),
        ( NX, "gu", operator!("operator.lowercase", OtherWritable) ),
        ( NX, "gU", operator!("operator.uppercase", OtherWritable) ),
        ( NX, "g?", operator!("operator.rot13", OtherWritable) ),
        ( NX, "gq", operator!("operator.format", OtherWritable) ),
        ( NX, "gw", operator!("operator.format-keep-cursor", OtherWritable) ),
        ( NX, "!", operator!("operator.filter", OtherWritable).builtin(BuiltinAction::Filter) ),

        // Normal mode edits
        ( N, "x", edit!("edit.delete-char", Delete) ),
        ( N, "<Del>", edit!("edit.delete-char", Delete) ),
        ( N, "X", edit!("edit.delete-char-back", Delete) ),
        ( N, "D", edit!("edit.delete-to-end", Delete) ),
        ( N, "Y", edit!("edit.yank-line", Copy) ),
        ( N, "J", edit!("edit.join-lines", OtherWritable) ),
        ( N, "gJ", edit!("edit.join-lines-raw", OtherWritable) ),
        ( N, "r", edit!("edit.replace-char", OtherWritable).argument(ArgumentType::Character) ),
        ( N, "~", edit!("edit.toggle-case-char", OtherWritable) ),
        ( N, "<C-A>", edit!("edit.increment", OtherWritable) ),
        ( N, "<C-X>", edit!("edit.decrement", OtherWritable) ),
        ( N, "u", spec!("history.undo", OtherWritable) ),
        ( N, "<C-R>", spec!("history.redo", OtherWritable) ),
        ( N, ".", spec!("history.repeat-change", OtherWritable) ),
        ( N, "<C-O>", spec!("jump.older", OtherReadonly) ),
        ( N, "<C-I>", spec!("jump.newer", OtherReadonly) ),
        ( N, "m", spec!("mark.set", OtherReadonly).argument(ArgumentType::Character) ),
        ( N, "zz", spec!("scroll.cursor-middle", OtherReadonly) ),
        ( N, "zt", spec!("scroll.cursor-top", OtherReadonly) ),
        ( N, "zb", spec!("scroll.cursor-bottom", OtherReadonly) ),
        ( N, "<C-E>", spec!("scroll.line-down", OtherReadonly) ),
        ( N, "<C-Y>", spec!("scroll.line-up", OtherReadonly) ),
        ( N, "<C-D>", spec!("scroll.half-page-down", OtherReadonly) ),
        ( N, "<C-U>", spec!("scroll.half-page-up", OtherReadonly) ),
        ( N, "<C-F>", spec!("scroll.page-down", OtherReadonly) ),
        ( N, "<C-B>", spec!("scroll.page-up", OtherReadonly) ),
        ( NX, "p", edit!("edit.put-after", Paste) ),
        ( NX, "P", edit!("edit.put-before", Paste) ),

        // Normal mode insertion
        ( N, "i", insert!("insert.before-cursor", Insert) ),
        ( N, "<Insert>", insert!("insert.before-cursor", Insert) ),
        ( N, "a", insert!("insert.after-cursor", Insert) ),
        ( N, "I", insert!("insert.line-start", Insert) ),
        ( N, "gI", insert!("insert.column-zero", Insert) ),
        ( N, "A", insert!("insert.line-end", Insert) ),
        ( N, "o", insert!("insert.open-below", Insert) ),
        ( N, "O", insert!("insert.open-above", Insert) ),
        ( N, "s", insert!("insert.substitute-char", Change) ),
        ( N, "C", change!("insert.change-to-end") ),
        ( N, "S", change!("insert.change-line") ),
        ( N, "R", edit!("replace.start", Insert)
            .flags(CommandFlags::MULTIKEY_UNDO)
            .mode_change(ModeChange::Replace) ),

        // Starting and switching Visual and Select mode
        ( NX, "v", visual!("visual.toggle-character", VisualCharacter) ),
        ( NX, "V", visual!("visual.toggle-line", VisualLine) ),
        ( NX, "<C-V>", visual!("visual.toggle-block", VisualBlock) ),
        ( N, "gh", select!("select.start-character", VisualCharacter) ),
        ( N, "gH", select!("select.start-line", VisualLine) ),
        ( N, "g<C-H>", select!("select.start-block", VisualBlock) ),
        ( V, "<C-G>", spec!("visual.swap-select", OtherReadonly).mode_change(ModeChange::SwapVisualSelect) ),
        ( X, "o", spec!("visual.swap-ends", OtherReadonly) ),
        ( X, "O", spec!("visual.swap-ends-horizontal", OtherReadonly) ),
        ( X, "u", edit!("visual.lowercase", OtherWritable).flags(CommandFlags::EXIT_VISUAL) ),
        ( X, "U", edit!("visual.uppercase", OtherWritable).flags(CommandFlags::EXIT_VISUAL) ),
        ( X, "~", edit!("visual.toggle-case", OtherWritable).flags(CommandFlags::EXIT_VISUAL) ),
        ( X, "J", edit!("visual.join-lines", OtherWritable).flags(CommandFlags::EXIT_VISUAL) ),
        ( X, "r", edit!("visual.replace-chars", OtherWritable)
            .argument(ArgumentType::Character)
            .flags(CommandFlags::EXIT_VISUAL) ),

        // Select mode edits
        ( S, "<BS>", insert!("select.delete", Delete) ),
        ( S, "<C-H>", insert!("select.delete", Delete) ),
        ( S, "<Del>", insert!("select.delete", Delete) ),

        // Command line and macros
        ( NX, ":", spec!("ex.command", OtherWritable)
            .argument(ArgumentType::ExString)
            .flags(CommandFlags::EXIT_VISUAL) ),
        ( N, "q", builtin!("macro.toggle-recording", ToggleRecording).argument(ArgumentType::Character) ),
        ( N, "@", builtin!("macro.execute", ExecuteMacro).argument(ArgumentType::Character) ),
        ( N, "Q", builtin!("macro.repeat", RepeatMacro) ),

        // Insert and Replace mode keys
        ( I, "<BS>", edit!("insert.delete-back", Delete) ),
        ( I, "<C-H>", edit!("insert.delete-back", Delete) ),
        ( I, "<Del>", edit!("insert.delete-forward", Delete) ),
        ( I, "<CR>", edit!("insert.newline", Insert) ),
        ( I, "<C-J>", edit!("insert.newline", Insert) ),
        ( I, "<C-M>", edit!("insert.newline", Insert) ),
        ( I, "<Tab>", edit!("insert.tab", Insert) ),
        ( I, "<C-W>", edit!("insert.delete-word", Delete) ),
        ( I, "<C-U>", edit!("insert.delete-line", Delete) ),
        ( I, "<C-T>", edit!("insert.indent", OtherWritable) ),
        ( I, "<C-D>", edit!("insert.dedent", OtherWritable) ),
        ( I, "<C-R>", edit!("insert.register", Paste).argument(ArgumentType::Character) ),
        ( I, "<C-V>", edit!("insert.literal", Insert).argument(ArgumentType::Character) ),
        ( I, "<C-Q>", edit!("insert.literal", Insert).argument(ArgumentType::Character) ),

        // Leaving modes
        ( N, "<Esc>", spec!("normal.escape", OtherReadonly) ),
        ( V, "<Esc>", normal!("visual.exit") ),
        ( V, "<C-C>", normal!("visual.exit") ),
        ( I, "<Esc>", normal!("insert.exit") ),
        ( I, "<C-C>", normal!("insert.exit") ),
    ].into_iter().collect()
}

/// The motion that a repeated operator key applies to, like the second `d` in `dd`.
pub fn current_line_action() -> ActionSpec {
    linewise!("motion.current-line")
}

/// The command produced by an unmapped printable key in Insert mode.
pub fn insert_type_action() -> ActionSpec {
    edit!("insert.type", Insert).argument(ArgumentType::Character)
}

/// The command produced by an unmapped printable key in Replace mode.
pub fn replace_type_action() -> ActionSpec {
    edit!("replace.type", Insert).argument(ArgumentType::Character)
}

/// The command produced by an unmapped printable key in Select mode.
pub fn select_type_action() -> ActionSpec {
    insert!("select.type", Change).argument(ArgumentType::Character)
}

/// A table of command keys.
#[derive(Debug)]
pub struct CommandKeys {
    table: MappingTable<MappedModes, TerminalKey, Arc<ActionSpec>>,
}

impl CommandKeys {
    /// Create a table without any keys.
    pub fn empty() -> Self {
        CommandKeys { table: MappingTable::default() }
    }

    /// Bind keys written in key notation in every mode in `modes`.
    pub fn add(
        &mut self,
        modes: MappedModes,
        keys: &str,
        action: Arc<ActionSpec>,
    ) -> Result<(), MacroError> {
        let keys = parse_keys(keys)?;

        if keys.is_empty() {
            return Err(MacroError::EmptyMacro);
        }

        for mode in modes.split() {
            self.table.insert(mode, &keys, action.clone());
        }

        Ok(())
    }

    /// Unbind keys in every mode in `modes`, returning whether any mode had them bound.
    pub fn remove(&mut self, modes: MappedModes, keys: &str) -> Result<bool, MacroError> {
        let keys = parse_keys(keys)?;
        let mut removed = false;

        for mode in modes.split() {
            removed |= self.table.remove(mode, &keys).is_some();
        }

        Ok(removed)
    }

    /// Look up typed keys in a single mode.
    pub fn lookup(&self, mode: MappedModes, keys: &[TerminalKey]) -> Lookup<'_, Arc<ActionSpec>> {
        self.table.lookup(mode, keys)
    }

    /// Get the action bound to keys written in key notation, in a single mode.
    pub fn get(&self, mode: MappedModes, keys: &str) -> Option<Arc<ActionSpec>> {
        let keys = parse_keys(keys).ok()?;

        self.table.get(mode, &keys).cloned()
    }
}

impl Default for CommandKeys {
    fn default() -> Self {
        default_vim_keys()
    }
}

/// Build the table of default Vim keys.
pub fn default_vim_keys() -> CommandKeys {
    let mut keys = CommandKeys::empty();

    for (modes, seq, action) in default_keys() {
        if let Err(e) = keys.add(modes, seq, Arc::new(action)) {
            log::warn!("failed to bind {seq:?}: {e}");
        }
    }

    keys
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_keys_parse() {
        for (_, seq, _) in default_keys() {
            assert!(parse_keys(seq).is_ok(), "invalid key sequence: {seq:?}");
        }
    }

    #[test]
    fn test_operators() {
        let keys = CommandKeys::default();

        for op in ["d", "c", "y", "<lt>", ">", "g~", "gu", "gU", "!"] {
            let action = keys.get(N, op).unwrap();
            assert!(action.is_operator(), "{op} should be an operator");
            assert_eq!(keys.get(X, op), Some(action));
            assert_eq!(keys.get(O, op), None);
        }

        let change = keys.get(N, "c").unwrap();
        assert_eq!(change.requested_mode(), ModeChange::Insert);
        assert!(change.command_flags().contains(CommandFlags::MULTIKEY_UNDO));
        assert!(change.command_flags().contains(CommandFlags::NO_REPEAT_INSERT));
    }

    #[test]
    fn test_ambiguous_prefixes() {
        let keys = CommandKeys::default();

        assert_eq!(keys.lookup(N, &keys!("g")), Lookup::Partial);
        assert!(matches!(keys.lookup(O, &keys!("i")), Lookup::Partial));
        assert!(matches!(keys.lookup(N, &keys!("i")), Lookup::Complete(_)));
        assert_eq!(keys.lookup(N, &keys!("gz")), Lookup::Unmapped);
    }

    #[test]
    fn test_keymodel_flags() {
        let keys = CommandKeys::default();

        let right = keys.get(S, "<Right>").unwrap();
        assert!(right.command_flags().contains(CommandFlags::KEYMODEL));

        let right = keys.get(I, "<S-Right>").unwrap();
        assert!(right.command_flags().contains(CommandFlags::SHIFT_SELECT));

        let l = keys.get(N, "l").unwrap();
        assert!(!l.command_flags().contains(CommandFlags::KEYMODEL));
    }

    #[test]
    fn test_argument_types() {
        let keys = CommandKeys::default();

        assert_eq!(keys.get(N, ":").unwrap().name(), EX_COMMAND);
        assert_eq!(keys.get(N, ":").unwrap().argument_type(), ArgumentType::ExString);
        assert_eq!(keys.get(O, "/").unwrap().argument_type(), ArgumentType::ExString);
        assert_eq!(keys.get(N, "/").unwrap().command_type(), CommandType::Motion);
        assert_eq!(keys.get(N, "r").unwrap().argument_type(), ArgumentType::Character);
        assert_eq!(keys.get(N, "q").unwrap().builtin_action(), Some(BuiltinAction::ToggleRecording));

        let mark = keys.get(N, "'").unwrap();
        assert!(mark.command_flags().contains(CommandFlags::MARK));
    }

    #[test]
    fn test_add_remove() {
        let mut keys = CommandKeys::empty();
        let action = Arc::new(spec!("custom.action", OtherReadonly));

        keys.add(NX, "<C-K>", action.clone()).unwrap();
        assert_eq!(keys.get(X, "<C-K>"), Some(action));

        assert_eq!(keys.remove(N, "<C-K>"), Ok(true));
        assert_eq!(keys.remove(N, "<C-K>"), Ok(false));
        assert!(keys.get(X, "<C-K>").is_some());

        assert_eq!(keys.add(N, "", Arc::new(spec!("empty", OtherReadonly))), Err(MacroError::EmptyMacro));
    }
}
