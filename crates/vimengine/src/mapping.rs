//! # User mappings
//!
//! ## Overview
//!
//! This module contains the [MappingStore], which holds the mappings created with `:map` and its
//! variants, and the [MappedModes] flags that say which modes a mapping applies to.
//!
//! ## Example
//!
//! ```
//! use vimengine::mapping::{MappedModes, MappingRhs, MappingStore};
//! use vimengine::key::parse_keys;
//! use keymap::Lookup;
//!
//! let mut store = MappingStore::default();
//! store.add_str(MappedModes::I, "jk", "<Esc>", true, false).unwrap();
//!
//! let lhs = parse_keys("jk").unwrap();
//! let info = store.lookup(MappedModes::I, &lhs).value().cloned().unwrap();
//! assert_eq!(info.rhs, MappingRhs::Keys(parse_keys("<Esc>").unwrap()));
//!
//! assert_eq!(store.lookup(MappedModes::N, &lhs), Lookup::Unmapped);
//! ```
use std::fmt;
use std::sync::Arc;

use bitflags::bitflags;

use engine_types::prelude::{Mode, ModeState};
use engine_types::ActionSpec;
use keymap::{Lookup, MappingTable};

use crate::errors::{MappingError, MappingResult};
use crate::key::{keys_to_string, parse_keys, TerminalKey};

bitflags! {
    /// The modes that a mapping applies to.
    #[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
    pub struct MappedModes: u32 {
        /// Normal mode.
        const N = 0b0000001;
        /// Visual mode.
        const X = 0b0000010;
        /// Select mode.
        const S = 0b0000100;
        /// Operator-pending mode.
        const O = 0b0001000;
        /// Insert and Replace mode.
        const I = 0b0010000;
        /// Command-line mode.
        const C = 0b0100000;

        /// Visual and Select mode.
        const V = MappedModes::X.bits() | MappedModes::S.bits();
        /// The modes used by `:map`.
        const NVO = MappedModes::N.bits() | MappedModes::V.bits() | MappedModes::O.bits();
        /// The modes used by `:map!`.
        const IC = MappedModes::I.bits() | MappedModes::C.bits();
    }
}

impl MappedModes {
    /// Split into the single modes that make up this set.
    pub fn split(&self) -> Vec<MappedModes> {
        [
            MappedModes::N,
            MappedModes::X,
            MappedModes::S,
            MappedModes::O,
            MappedModes::I,
            MappedModes::C,
        ]
        .into_iter()
        .filter(|m| self.contains(*m))
        .collect()
    }

    /// The mode column shown when listing mappings.
    pub fn letters(&self) -> String {
        if *self == MappedModes::NVO {
            return " ".into();
        }

        if *self == MappedModes::IC {
            return "!".into();
        }

        let mut s = String::new();

        if self.contains(MappedModes::N) {
            s.push('n');
        }

        if self.contains(MappedModes::V) {
            s.push('v');
        } else if self.contains(MappedModes::X) {
            s.push('x');
        } else if self.contains(MappedModes::S) {
            s.push('s');
        }

        if self.contains(MappedModes::O) {
            s.push('o');
        }

        if self.contains(MappedModes::I) {
            s.push('i');
        }

        if self.contains(MappedModes::C) {
            s.push('c');
        }

        s
    }
}

impl From<ModeState> for MappedModes {
    fn from(state: ModeState) -> Self {
        match state.mode() {
            Mode::Normal => MappedModes::N,
            Mode::Visual => MappedModes::X,
            Mode::Select => MappedModes::S,
            Mode::OperatorPending => MappedModes::O,
            Mode::Insert | Mode::Replace => MappedModes::I,
            Mode::CommandLine => MappedModes::C,
        }
    }
}

/// What a mapping expands into.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum MappingRhs {
    /// Keys to feed back into the resolver.
    Keys(Vec<TerminalKey>),

    /// A command to run directly.
    Action(Arc<ActionSpec>),

    /// An expression whose value is the keys to feed back into the resolver.
    Expression(String),
}

impl fmt::Display for MappingRhs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MappingRhs::Keys(keys) if keys.is_empty() => write!(f, "<Nop>"),
            MappingRhs::Keys(keys) => write!(f, "{}", keys_to_string(keys)),
            MappingRhs::Action(action) => write!(f, "<Action>({})", action.name()),
            MappingRhs::Expression(expr) => write!(f, "{expr}"),
        }
    }
}

/// A single user mapping.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct MappingInfo {
    /// The keys that trigger this mapping.
    pub lhs: Vec<TerminalKey>,

    /// What the keys expand into.
    pub rhs: MappingRhs,

    /// The modes the mapping was created for.
    pub modes: MappedModes,

    /// Whether the expanded keys are exempt from further mapping.
    pub noremap: bool,
}

impl MappingInfo {
    /// Whether the expansion is an expression to evaluate.
    pub fn is_expr(&self) -> bool {
        matches!(self.rhs, MappingRhs::Expression(_))
    }
}

/// The mappings defined by the user.
#[derive(Debug, Default)]
pub struct MappingStore {
    table: MappingTable<MappedModes, TerminalKey, Arc<MappingInfo>>,
}

impl MappingStore {
    /// Map keys in every mode in `modes`, replacing any earlier mappings of the same keys.
    pub fn add(
        &mut self,
        modes: MappedModes,
        lhs: Vec<TerminalKey>,
        rhs: MappingRhs,
        noremap: bool,
    ) -> MappingResult<()> {
        if lhs.is_empty() {
            return Err(MappingError::InvalidKeys(String::new()));
        }

        log::debug!("mapping {} in {:?} to {rhs}", keys_to_string(&lhs), modes);

        let info = Arc::new(MappingInfo { lhs: lhs.clone(), rhs, modes, noremap });

        for mode in modes.split() {
            self.table.insert(mode, &lhs, info.clone());
        }

        Ok(())
    }

    /// Map keys written in key notation.
    ///
    /// When `expr` is true, `rhs` is an expression instead of keys. An `rhs` of `<Nop>` maps the
    /// keys to nothing.
    pub fn add_str(
        &mut self,
        modes: MappedModes,
        lhs: &str,
        rhs: &str,
        noremap: bool,
        expr: bool,
    ) -> MappingResult<()> {
        let lhs_keys =
            parse_keys(lhs).map_err(|_| MappingError::InvalidKeys(lhs.to_string()))?;

        if lhs_keys.is_empty() {
            return Err(MappingError::InvalidKeys(lhs.to_string()));
        }

        let rhs = if expr {
            if rhs.trim().is_empty() {
                return Err(MappingError::InvalidExpression(rhs.to_string()));
            }

            MappingRhs::Expression(rhs.to_string())
        } else if rhs.eq_ignore_ascii_case("<nop>") {
            MappingRhs::Keys(vec![])
        } else {
            let keys = parse_keys(rhs).map_err(|_| MappingError::InvalidKeys(rhs.to_string()))?;
            MappingRhs::Keys(keys)
        };

        self.add(modes, lhs_keys, rhs, noremap)
    }

    /// Remove the mappings of `lhs` in every mode in `modes`.
    ///
    /// Fails if none of the modes had a mapping for these keys.
    pub fn remove(&mut self, modes: MappedModes, lhs: &[TerminalKey]) -> MappingResult<()> {
        let mut removed = false;

        for mode in modes.split() {
            removed |= self.table.remove(mode, lhs).is_some();
        }

        if removed {
            Ok(())
        } else {
            Err(MappingError::NoSuchMapping)
        }
    }

    /// Remove mappings of keys written in key notation.
    pub fn remove_str(&mut self, modes: MappedModes, lhs: &str) -> MappingResult<()> {
        let keys = parse_keys(lhs).map_err(|_| MappingError::InvalidKeys(lhs.to_string()))?;

        self.remove(modes, &keys)
    }

    /// Remove every mapping in `modes`.
    pub fn clear(&mut self, modes: MappedModes) {
        for mode in modes.split() {
            self.table.clear_mode(mode);
        }
    }

    /// Look up typed keys in a single mode.
    pub fn lookup(&self, mode: MappedModes, keys: &[TerminalKey]) -> Lookup<'_, Arc<MappingInfo>> {
        self.table.lookup(mode, keys)
    }

    /// Whether a single mode has no mappings.
    pub fn is_empty(&self, mode: MappedModes) -> bool {
        self.table.is_mode_empty(mode)
    }

    /// Get the mappings in `modes` whose keys start with `prefix`, sorted by their keys.
    pub fn mappings(&self, modes: MappedModes, prefix: &[TerminalKey]) -> Vec<Arc<MappingInfo>> {
        let mut res: Vec<Arc<MappingInfo>> = vec![];

        for mode in modes.split() {
            for (keys, info) in self.table.entries(mode) {
                if !keys.starts_with(prefix) {
                    continue;
                }

                if res.iter().any(|i| Arc::ptr_eq(i, info)) {
                    continue;
                }

                res.push(info.clone());
            }
        }

        res.sort_by_key(|info| keys_to_string(&info.lhs));
        res
    }

    /// Show the mappings in `modes` whose keys start with `prefix`, as `:map` lists them.
    pub fn list(&self, modes: MappedModes, prefix: &[TerminalKey]) -> Vec<String> {
        self.mappings(modes, prefix)
            .into_iter()
            .map(|info| {
                let lhs = keys_to_string(&info.lhs);
                let star = if info.noremap { "*" } else { " " };

                format!("{:<3}{:<12} {star} {}", info.modes.letters(), lhs, info.rhs)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use engine_types::prelude::{CommandType, SubMode};

    #[test]
    fn test_split_and_letters() {
        assert_eq!(MappedModes::NVO.split(), vec![
            MappedModes::N,
            MappedModes::X,
            MappedModes::S,
            MappedModes::O
        ]);
        assert_eq!(MappedModes::NVO.letters(), " ");
        assert_eq!(MappedModes::IC.letters(), "!");
        assert_eq!(MappedModes::V.letters(), "v");
        assert_eq!(MappedModes::X.letters(), "x");
        assert_eq!((MappedModes::N | MappedModes::I).letters(), "ni");
    }

    #[test]
    fn test_from_mode() {
        let visual = ModeState::new(Mode::Visual, SubMode::VisualLine);

        assert_eq!(MappedModes::from(visual), MappedModes::X);
        assert_eq!(MappedModes::from(ModeState::from(Mode::Replace)), MappedModes::I);
        assert_eq!(MappedModes::from(ModeState::from(Mode::CommandLine)), MappedModes::C);
    }

    #[test]
    fn test_add_lookup_remove() {
        let mut store = MappingStore::default();

        store.add_str(MappedModes::NVO, "gx", "dd", false, false).unwrap();
        store.add_str(MappedModes::N, "g", "<Nop>", true, false).unwrap();

        let info = store.lookup(MappedModes::X, &keys!("gx")).value().cloned().unwrap();
        assert_eq!(info.rhs, MappingRhs::Keys(keys!("dd")));
        assert_eq!(info.noremap, false);

        match store.lookup(MappedModes::N, &keys!("g")) {
            Lookup::Ambiguous(info) => assert_eq!(info.rhs, MappingRhs::Keys(vec![])),
            other => panic!("unexpected lookup: {other:?}"),
        }

        // Removing from some modes leaves the others.
        store.remove_str(MappedModes::X, "gx").unwrap();
        assert_eq!(store.lookup(MappedModes::X, &keys!("gx")), Lookup::Unmapped);
        assert!(store.lookup(MappedModes::O, &keys!("gx")).value().is_some());

        assert_eq!(
            store.remove_str(MappedModes::X, "gx"),
            Err(MappingError::NoSuchMapping)
        );
    }

    #[test]
    fn test_replace_mapping() {
        let mut store = MappingStore::default();

        store.add_str(MappedModes::I, "jk", "<Esc>", false, false).unwrap();
        store.add_str(MappedModes::I, "jk", "<C-c>", true, false).unwrap();

        let info = store.lookup(MappedModes::I, &keys!("jk")).value().cloned().unwrap();
        assert_eq!(info.rhs, MappingRhs::Keys(keys!("<C-c>")));
        assert_eq!(store.mappings(MappedModes::I, &[]).len(), 1);
    }

    #[test]
    fn test_actions_and_expressions() {
        let mut store = MappingStore::default();
        let action = Arc::new(ActionSpec::new("editor.save", CommandType::OtherReadonly));

        store
            .add(MappedModes::N, keys!("<Space>w"), MappingRhs::Action(action.clone()), true)
            .unwrap();
        store.add_str(MappedModes::N, "<F2>", "'dd'", true, true).unwrap();

        let info = store.lookup(MappedModes::N, &keys!("<Space>w")).value().cloned().unwrap();
        assert_eq!(info.rhs, MappingRhs::Action(action));

        let info = store.lookup(MappedModes::N, &keys!("<F2>")).value().cloned().unwrap();
        assert!(info.is_expr());

        assert_eq!(
            store.add_str(MappedModes::N, "<F3>", " ", true, true),
            Err(MappingError::InvalidExpression(" ".into()))
        );
        assert_eq!(
            store.add_str(MappedModes::N, "", "x", true, false),
            Err(MappingError::InvalidKeys("".into()))
        );
    }

    #[test]
    fn test_list() {
        let mut store = MappingStore::default();

        store.add_str(MappedModes::NVO, "gx", "dd", false, false).unwrap();
        store.add_str(MappedModes::IC, "jk", "<Esc>", true, false).unwrap();
        store.add_str(MappedModes::N, "Y", "y$", true, false).unwrap();

        assert_eq!(store.list(MappedModes::N, &[]), strs![
            "n  Y            * y$",
            "   gx             dd"
        ]);
        assert_eq!(store.list(MappedModes::I, &keys!("j")), strs!["!  jk           * <Esc>"]);

        store.clear(MappedModes::N);
        assert_eq!(store.list(MappedModes::N, &[]).len(), 0);
        assert!(store.is_empty(MappedModes::N));
        assert!(!store.is_empty(MappedModes::X));
    }
}
