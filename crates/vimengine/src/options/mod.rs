//! # Typed options
//!
//! ## Overview
//!
//! This module contains the [OptionStore], which holds the definition and current values of
//! every option, validates writes, and notifies listeners about each write.
//!
//! Options hold a string, a number, or a toggle. String options can be lists of comma-separated
//! tokens, and can be restricted to a fixed set of tokens. Each option is either global, local to
//! an editor, or global-local, where a local value overrides the global one when it's set.
//!
//! ## Example
//!
//! ```
//! use vimengine::options::{OptionScope, OptionStore, OptionValue, SetOperation};
//!
//! let mut store = OptionStore::default();
//!
//! store.set_str("km", OptionScope::Global, SetOperation::Assign, "startsel").unwrap();
//! store.set_str("km", OptionScope::Global, SetOperation::Append, "stopsel").unwrap();
//!
//! let value = store.get("keymodel", OptionScope::Global).unwrap();
//! assert_eq!(value, &OptionValue::String("startsel,stopsel".into()));
//!
//! // Adding a token that's already present does nothing.
//! store.set_str("km", OptionScope::Global, SetOperation::Append, "stopsel").unwrap();
//! assert!(store.accessor(OptionScope::Global).has_value("keymodel", "stopsel"));
//! ```
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use radix_trie::Trie;

use crate::errors::{OptionError, OptionResult};
use crate::util::completion_keys;

pub mod guicursor;
pub mod set;
pub mod vim;

/// Identifies an editing context that can have its own local option values.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct EditorId(pub u64);

/// The value of an option.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub enum OptionValue {
    /// A string, possibly a comma-separated list.
    String(String),

    /// A number.
    Number(i64),

    /// A boolean.
    Toggle(bool),
}

impl OptionValue {
    /// The value of a string option.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            OptionValue::String(s) => Some(s.as_str()),
            _ => None,
        }
    }

    /// The value of a number option.
    pub fn as_number(&self) -> Option<i64> {
        match self {
            OptionValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// The value of a toggle option.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            OptionValue::Toggle(b) => Some(*b),
            _ => None,
        }
    }
}

impl fmt::Display for OptionValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OptionValue::String(s) => write!(f, "{s}"),
            OptionValue::Number(n) => write!(f, "{n}"),
            OptionValue::Toggle(b) => write!(f, "{}", *b as u8),
        }
    }
}

/// Which values an option has.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub enum ScopeKind {
    /// One value shared by every editor.
    #[default]
    Global,

    /// One value per editor. The global value is what new editors start with.
    Local,

    /// A global value, which editors can override with a local one.
    GlobalLocal,
}

/// Where a read or a write happens.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum OptionScope {
    /// The global value.
    Global,

    /// The value seen from an editor.
    Local(EditorId),
}

/// A check run on every new value of a string option.
pub type Validator = fn(&str) -> OptionResult<()>;

/// The type of an option, and the constraints on its values.
#[derive(Clone, Debug)]
pub enum OptionKind {
    /// A string option.
    String {
        /// Whether the value is a comma-separated list.
        list: bool,

        /// The only tokens the value may contain.
        bounded: Option<&'static [&'static str]>,

        /// An additional check on new values.
        validator: Option<Validator>,
    },

    /// A number option.
    Number {
        /// Whether negative values are refused.
        unsigned: bool,
    },

    /// A toggle option.
    Toggle,
}

/// How a `:set` argument combines its value with the current one.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum SetOperation {
    /// `name=value`: replace the value.
    Assign,

    /// `name+=value`: append a token to a string, or add to a number.
    Append,

    /// `name^=value`: prepend a token to a string, or multiply a number.
    Prepend,

    /// `name-=value`: remove tokens from a string, or subtract from a number.
    Remove,
}

impl SetOperation {
    /// The operator as written in a `:set` argument.
    pub fn symbol(&self) -> &'static str {
        match self {
            SetOperation::Assign => "=",
            SetOperation::Append => "+=",
            SetOperation::Prepend => "^=",
            SetOperation::Remove => "-=",
        }
    }
}

/// The definition of an option.
#[derive(Clone, Debug)]
pub struct OptionDef {
    name: String,
    abbrev: String,
    default: OptionValue,
    kind: OptionKind,
    scope: ScopeKind,
}

impl OptionDef {
    fn new(name: &str, abbrev: &str, default: OptionValue, kind: OptionKind) -> Self {
        OptionDef {
            name: name.to_string(),
            abbrev: abbrev.to_string(),
            default,
            kind,
            scope: ScopeKind::Global,
        }
    }

    /// Define a toggle option.
    pub fn toggle(name: &str, abbrev: &str, default: bool) -> Self {
        Self::new(name, abbrev, OptionValue::Toggle(default), OptionKind::Toggle)
    }

    /// Define a number option that allows negative values.
    pub fn number(name: &str, abbrev: &str, default: i64) -> Self {
        let kind = OptionKind::Number { unsigned: false };
        Self::new(name, abbrev, OptionValue::Number(default), kind)
    }

    /// Define a number option that refuses negative values.
    pub fn unsigned(name: &str, abbrev: &str, default: i64) -> Self {
        let kind = OptionKind::Number { unsigned: true };
        Self::new(name, abbrev, OptionValue::Number(default), kind)
    }

    /// Define a string option.
    pub fn string(name: &str, abbrev: &str, default: &str) -> Self {
        let kind = OptionKind::String { list: false, bounded: None, validator: None };
        Self::new(name, abbrev, OptionValue::String(default.into()), kind)
    }

    /// Define a string option holding a comma-separated list.
    pub fn list(name: &str, abbrev: &str, default: &str) -> Self {
        let kind = OptionKind::String { list: true, bounded: None, validator: None };
        Self::new(name, abbrev, OptionValue::String(default.into()), kind)
    }

    /// Restrict a string option to a fixed set of tokens.
    pub fn bounded(mut self, values: &'static [&'static str]) -> Self {
        if let OptionKind::String { bounded, .. } = &mut self.kind {
            *bounded = Some(values);
        }

        self
    }

    /// Run an additional check on new values of a string option.
    pub fn validator(mut self, check: Validator) -> Self {
        if let OptionKind::String { validator, .. } = &mut self.kind {
            *validator = Some(check);
        }

        self
    }

    /// Set which values this option has.
    pub fn scope(mut self, scope: ScopeKind) -> Self {
        self.scope = scope;
        self
    }

    /// The option's full name.
    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    /// The option's short name, if it has one.
    pub fn abbrev(&self) -> Option<&str> {
        if self.abbrev.is_empty() {
            None
        } else {
            Some(self.abbrev.as_str())
        }
    }

    /// The option's default value.
    pub fn default_value(&self) -> &OptionValue {
        &self.default
    }

    /// The option's type.
    pub fn kind(&self) -> &OptionKind {
        &self.kind
    }

    /// Which values the option has.
    pub fn scope_kind(&self) -> ScopeKind {
        self.scope
    }

    /// Whether this is a toggle option.
    pub fn is_toggle(&self) -> bool {
        matches!(self.kind, OptionKind::Toggle)
    }

    /// Whether this is a list option.
    pub fn is_list(&self) -> bool {
        matches!(self.kind, OptionKind::String { list: true, .. })
    }

    /// Split a string value into its tokens.
    pub fn split<'a>(&self, value: &'a str) -> Vec<&'a str> {
        if self.is_list() {
            value.split(',').collect()
        } else {
            vec![value]
        }
    }

    /// Check that a value may be stored in this option.
    ///
    /// `token` is what gets shown in the error message.
    pub fn check(&self, value: &OptionValue, token: &str) -> OptionResult<()> {
        match (&self.kind, value) {
            (OptionKind::Toggle, OptionValue::Toggle(_)) => Ok(()),
            (OptionKind::Toggle, _) => Err(OptionError::InvalidArgument(token.into())),
            (OptionKind::Number { unsigned }, OptionValue::Number(n)) => {
                if *unsigned && *n < 0 {
                    Err(OptionError::MustBePositive(token.into()))
                } else {
                    Ok(())
                }
            },
            (OptionKind::Number { .. }, _) => Err(OptionError::NumberRequired(token.into())),
            (OptionKind::String { bounded, validator, .. }, OptionValue::String(s)) => {
                if s.is_empty() {
                    return Ok(());
                }

                if let Some(bounded) = bounded {
                    if self.split(s).iter().any(|t| !bounded.contains(t)) {
                        return Err(OptionError::InvalidArgument(token.into()));
                    }
                }

                if let Some(validator) = validator {
                    validator(s)?;
                }

                Ok(())
            },
            (OptionKind::String { .. }, _) => Err(OptionError::InvalidArgument(token.into())),
        }
    }

    /// Parse text typed after `=` in a `:set` argument.
    pub fn parse_value(&self, value: &str, token: &str) -> OptionResult<OptionValue> {
        match self.kind {
            OptionKind::Toggle => Err(OptionError::InvalidArgument(token.into())),
            OptionKind::Number { .. } => {
                parse_number(value)
                    .map(OptionValue::Number)
                    .ok_or_else(|| OptionError::NumberRequired(token.into()))
            },
            OptionKind::String { .. } => Ok(OptionValue::String(value.into())),
        }
    }

    fn join(&self, first: &str, second: &str) -> String {
        if self.is_list() && !first.is_empty() {
            format!("{first},{second}")
        } else {
            format!("{first}{second}")
        }
    }

    /// Combine the current value with an operand, as done by `+=`, `^=` and `-=`.
    pub fn combine(
        &self,
        op: SetOperation,
        current: &OptionValue,
        operand: &OptionValue,
    ) -> Option<OptionValue> {
        match (current, operand) {
            (OptionValue::Number(a), OptionValue::Number(b)) => {
                let n = match op {
                    SetOperation::Assign => *b,
                    SetOperation::Append => a.saturating_add(*b),
                    SetOperation::Prepend => a.saturating_mul(*b),
                    SetOperation::Remove => a.saturating_sub(*b),
                };

                Some(OptionValue::Number(n))
            },
            (OptionValue::String(a), OptionValue::String(b)) => {
                let s = match op {
                    SetOperation::Assign => b.clone(),
                    SetOperation::Append | SetOperation::Prepend
                        if self.split(a).contains(&b.as_str()) =>
                    {
                        a.clone()
                    },
                    SetOperation::Append => self.join(a, b),
                    SetOperation::Prepend => self.join(b, a),
                    SetOperation::Remove if self.is_list() => {
                        let mut tokens = self.split(a);
                        let remove = self.split(b);

                        if let Some(idx) = find_sublist(&tokens, &remove) {
                            tokens.drain(idx..idx + remove.len());
                        }

                        tokens.join(",")
                    },
                    SetOperation::Remove => a.replace(b.as_str(), ""),
                };

                Some(OptionValue::String(s))
            },
            (_, b @ OptionValue::Toggle(_)) if op == SetOperation::Assign => Some(b.clone()),
            _ => None,
        }
    }
}

fn find_sublist(haystack: &[&str], needle: &[&str]) -> Option<usize> {
    if needle.is_empty() || needle.len() > haystack.len() {
        return None;
    }

    haystack.windows(needle.len()).position(|w| w == needle)
}

/// Parse a number the way Vim does, accepting hexadecimal with a `0x` prefix.
fn parse_number(value: &str) -> Option<i64> {
    let (neg, digits) = match value.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, value),
    };

    let n = if let Some(hex) = digits.strip_prefix("0x").or_else(|| digits.strip_prefix("0X")) {
        i64::from_str_radix(hex, 16).ok()?
    } else {
        digits.parse::<i64>().ok()?
    };

    Some(if neg { -n } else { n })
}

/// Something to notify when an option's value changes.
///
/// Listeners run synchronously inside of the write that triggered them, while the store is
/// still borrowed, so they cannot write to the store themselves.
pub trait OptionChangeListener {
    /// Called after a value has been written to `name`, even if it didn't change.
    ///
    /// `scope` is [OptionScope::Local] when only one editor's value changed and the listener is
    /// [local-aware](OptionChangeListener::local_aware). Other listeners always see
    /// [OptionScope::Global].
    fn option_changed(&self, name: &str, old: &OptionValue, new: &OptionValue, scope: OptionScope);

    /// Whether this listener wants to know which editor a local write went to.
    fn local_aware(&self) -> bool {
        false
    }
}

/// Wraps a closure so that it gets told which editor a local write went to.
pub struct LocalListener<F>(pub F);

impl<F> OptionChangeListener for LocalListener<F>
where
    F: Fn(&str, &OptionValue, &OptionValue, OptionScope),
{
    fn option_changed(&self, name: &str, old: &OptionValue, new: &OptionValue, scope: OptionScope) {
        (self.0)(name, old, new, scope)
    }

    fn local_aware(&self) -> bool {
        true
    }
}

impl<F> OptionChangeListener for F
where
    F: Fn(&str, &OptionValue, &OptionValue, OptionScope),
{
    fn option_changed(&self, name: &str, old: &OptionValue, new: &OptionValue, scope: OptionScope) {
        (self)(name, old, new, scope)
    }
}

/// Identifies a registered listener so it can be removed.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct ListenerId(u64);

/// The definitions and values of every option.
pub struct OptionStore {
    defs: HashMap<String, OptionDef>,
    abbrevs: HashMap<String, String>,
    names: Trie<String, ()>,

    global: HashMap<String, OptionValue>,
    local: HashMap<(EditorId, String), OptionValue>,

    listeners: HashMap<String, Vec<(ListenerId, Rc<dyn OptionChangeListener>)>>,
    next_listener: u64,
}

impl OptionStore {
    /// Create a store without any options.
    pub fn new() -> Self {
        OptionStore {
            defs: HashMap::new(),
            abbrevs: HashMap::new(),
            names: Trie::new(),
            global: HashMap::new(),
            local: HashMap::new(),
            listeners: HashMap::new(),
            next_listener: 0,
        }
    }

    /// Add an option, replacing any earlier option with the same name.
    pub fn define(&mut self, def: OptionDef) {
        let name = def.name.clone();

        if let Some(abbrev) = def.abbrev() {
            self.abbrevs.insert(abbrev.to_string(), name.clone());
        }

        self.local.retain(|(_, n), _| n != &name);
        self.global.insert(name.clone(), def.default.clone());
        self.names.insert(name.clone(), ());
        self.defs.insert(name, def);
    }

    /// Look up an option by its full or short name.
    pub fn get_def(&self, name: &str) -> OptionResult<&OptionDef> {
        if let Some(def) = self.defs.get(name) {
            return Ok(def);
        }

        self.abbrevs
            .get(name)
            .and_then(|full| self.defs.get(full))
            .ok_or_else(|| OptionError::UnknownOption(name.into()))
    }

    /// Whether an option exists with this full or short name.
    pub fn is_option(&self, name: &str) -> bool {
        self.get_def(name).is_ok()
    }

    /// Complete a prefix into full option names.
    pub fn complete_name(&self, prefix: &str) -> Vec<String> {
        let mut names = completion_keys(&self.names, prefix);
        names.sort();
        names
    }

    /// Every option's definition, sorted by name.
    pub fn definitions(&self) -> Vec<&OptionDef> {
        let mut defs: Vec<&OptionDef> = self.defs.values().collect();
        defs.sort_by(|a, b| a.name.cmp(&b.name));
        defs
    }

    fn local_key(&self, def: &OptionDef, scope: OptionScope) -> Option<(EditorId, String)> {
        match (def.scope, scope) {
            (ScopeKind::Global, _) | (_, OptionScope::Global) => None,
            (_, OptionScope::Local(id)) => Some((id, def.name.clone())),
        }
    }

    fn value_at<'a>(&'a self, def: &'a OptionDef, scope: OptionScope) -> &'a OptionValue {
        if let Some(key) = self.local_key(def, scope) {
            if let Some(v) = self.local.get(&key) {
                return v;
            }
        }

        self.global.get(&def.name).unwrap_or(&def.default)
    }

    /// Get an option's value as seen from a scope.
    ///
    /// Local reads fall back to the global value when the editor has no value of its own.
    pub fn get(&self, name: &str, scope: OptionScope) -> OptionResult<&OptionValue> {
        let def = self.get_def(name)?;

        Ok(self.value_at(def, scope))
    }

    /// Whether an editor has its own value for an option.
    pub fn has_local(&self, name: &str, editor: EditorId) -> bool {
        match self.get_def(name) {
            Ok(def) => self.local.contains_key(&(editor, def.name.clone())),
            Err(_) => false,
        }
    }

    /// Replace an option's value.
    pub fn set(&mut self, name: &str, scope: OptionScope, value: OptionValue) -> OptionResult<()> {
        let def = self.get_def(name)?;
        let token = format!("{name}={value}");

        def.check(&value, &token)?;

        let name = def.name.clone();
        self.write(&name, scope, value);

        Ok(())
    }

    /// Parse and apply a `:set` style operation.
    pub fn set_str(
        &mut self,
        name: &str,
        scope: OptionScope,
        op: SetOperation,
        value: &str,
    ) -> OptionResult<()> {
        let def = self.get_def(name)?;
        let token = format!("{name}{}{value}", op.symbol());

        let operand = def.parse_value(value, &token)?;
        def.check(&operand, &token)?;

        let current = self.value_at(def, scope);
        let new = def
            .combine(op, current, &operand)
            .ok_or_else(|| OptionError::InvalidArgument(token.clone()))?;

        if op != SetOperation::Assign {
            def.check(&new, &token)?;
        }

        let name = def.name.clone();
        self.write(&name, scope, new);

        Ok(())
    }

    fn write(&mut self, name: &str, scope: OptionScope, value: OptionValue) {
        let Some(def) = self.defs.get(name) else {
            return;
        };

        let old = self.value_at(def, scope).clone();
        let key = self.local_key(def, scope);
        let scope = if key.is_some() { scope } else { OptionScope::Global };

        match key {
            Some(key) => self.local.insert(key, value.clone()),
            None => self.global.insert(name.to_string(), value.clone()),
        };

        log::debug!("option {name} set from {old:?} to {value:?} ({scope:?})");
        self.notify(name, &old, &value, scope);
    }

    fn notify(&self, name: &str, old: &OptionValue, new: &OptionValue, scope: OptionScope) {
        if let Some(ls) = self.listeners.get(name) {
            for (_, listener) in ls.iter() {
                let scope = if listener.local_aware() { scope } else { OptionScope::Global };

                listener.option_changed(name, old, new, scope);
            }
        }
    }

    /// Remove an editor's own value for an option, so that it sees the global value again.
    pub fn unset_local(&mut self, name: &str, editor: EditorId) -> OptionResult<()> {
        let def = self.get_def(name)?;
        let name = def.name.clone();
        let default = def.default.clone();

        if let Some(old) = self.local.remove(&(editor, name.clone())) {
            let new = self.global.get(&name).cloned().unwrap_or(default);

            self.notify(&name, &old, &new, OptionScope::Local(editor));
        }

        Ok(())
    }

    /// Reset an option to its default value.
    pub fn reset(&mut self, name: &str, scope: OptionScope) -> OptionResult<()> {
        let def = self.get_def(name)?;
        let name = def.name.clone();
        let default = def.default.clone();

        self.write(&name, scope, default);

        Ok(())
    }

    /// Reset every option's global value to its default, and remove every local value.
    pub fn reset_all(&mut self) {
        let mut names: Vec<String> = self.defs.keys().cloned().collect();
        names.sort();

        let locals: Vec<(EditorId, String)> = self.local.keys().cloned().collect();

        for (editor, name) in locals {
            if let Err(e) = self.unset_local(&name, editor) {
                log::warn!("failed to remove local value of {name}: {e}");
            }
        }

        for name in names {
            if let Err(e) = self.reset(&name, OptionScope::Global) {
                log::warn!("failed to reset {name}: {e}");
            }
        }
    }

    /// Whether an option has its default value in a scope.
    pub fn is_default(&self, name: &str, scope: OptionScope) -> OptionResult<bool> {
        let def = self.get_def(name)?;

        Ok(self.value_at(def, scope) == &def.default)
    }

    fn toggle_def(&self, name: &str) -> OptionResult<String> {
        let def = self.get_def(name)?;

        if !def.is_toggle() {
            return Err(OptionError::InvalidArgument(name.into()));
        }

        Ok(def.name.clone())
    }

    /// Turn a toggle option on.
    pub fn set_toggle(&mut self, name: &str, scope: OptionScope) -> OptionResult<()> {
        let name = self.toggle_def(name)?;
        self.write(&name, scope, OptionValue::Toggle(true));
        Ok(())
    }

    /// Turn a toggle option off.
    pub fn unset_toggle(&mut self, name: &str, scope: OptionScope) -> OptionResult<()> {
        let name = self.toggle_def(name)?;
        self.write(&name, scope, OptionValue::Toggle(false));
        Ok(())
    }

    /// Flip a toggle option.
    pub fn invert_toggle(&mut self, name: &str, scope: OptionScope) -> OptionResult<()> {
        let name = self.toggle_def(name)?;
        let on = self.get(&name, scope)?.as_bool().unwrap_or(false);
        self.write(&name, scope, OptionValue::Toggle(!on));
        Ok(())
    }

    /// Register a listener for changes to an option.
    ///
    /// When `execute_on_add` is true, the listener is called once right away with the current
    /// global value as both the old and new value.
    pub fn add_listener(
        &mut self,
        name: &str,
        listener: Rc<dyn OptionChangeListener>,
        execute_on_add: bool,
    ) -> OptionResult<ListenerId> {
        let def = self.get_def(name)?;
        let name = def.name.clone();

        if execute_on_add {
            let value = self.value_at(def, OptionScope::Global);
            listener.option_changed(&name, value, value, OptionScope::Global);
        }

        let id = ListenerId(self.next_listener);
        self.next_listener += 1;
        self.listeners.entry(name).or_default().push((id, listener));

        Ok(id)
    }

    /// Remove a listener.
    pub fn remove_listener(&mut self, id: ListenerId) {
        for ls in self.listeners.values_mut() {
            ls.retain(|(lid, _)| *lid != id);
        }
    }

    /// Get an object for reading typed values as seen from a scope.
    pub fn accessor(&self, scope: OptionScope) -> OptionValueAccessor<'_> {
        OptionValueAccessor { store: self, scope }
    }
}

impl Default for OptionStore {
    fn default() -> Self {
        let mut store = OptionStore::new();

        for def in vim::default_options() {
            store.define(def);
        }

        store
    }
}

impl fmt::Debug for OptionStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OptionStore")
            .field("global", &self.global)
            .field("local", &self.local)
            .finish()
    }
}

/// Typed reads of option values.
///
/// Reading an unknown option, or one of another type, logs a warning and returns an empty value.
pub struct OptionValueAccessor<'a> {
    store: &'a OptionStore,
    scope: OptionScope,
}

impl<'a> OptionValueAccessor<'a> {
    fn value(&self, name: &str) -> Option<&'a OptionValue> {
        match self.store.get(name, self.scope) {
            Ok(v) => Some(v),
            Err(e) => {
                log::warn!("failed to read option: {e}");
                None
            },
        }
    }

    /// Read a number option.
    pub fn get_int(&self, name: &str) -> i64 {
        self.value(name).and_then(OptionValue::as_number).unwrap_or_default()
    }

    /// Read a string option.
    pub fn get_string(&self, name: &str) -> String {
        self.value(name).and_then(OptionValue::as_str).unwrap_or_default().to_string()
    }

    /// Read the tokens of a list option.
    pub fn get_string_list(&self, name: &str) -> Vec<String> {
        let value = self.get_string(name);

        if value.is_empty() {
            return vec![];
        }

        value.split(',').map(String::from).collect()
    }

    /// Read a toggle option.
    pub fn is_set(&self, name: &str) -> bool {
        self.value(name).and_then(OptionValue::as_bool).unwrap_or(false)
    }

    /// Whether a list option contains a token.
    pub fn has_value(&self, name: &str, token: &str) -> bool {
        self.value(name)
            .and_then(OptionValue::as_str)
            .map(|s| s.split(',').any(|t| t == token))
            .unwrap_or(false)
    }
}
