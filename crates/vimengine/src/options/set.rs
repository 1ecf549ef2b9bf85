//! # `:set` arguments
//!
//! ## Overview
//!
//! Parsing and execution of the arguments to `:set`, `:setlocal` and `:setglobal`.
//!
//! Arguments are separated by whitespace. A backslash escapes a space or another backslash inside
//! of a value, and is otherwise kept as typed.
use nom::{
    branch::alt,
    bytes::complete::{is_not, tag, take_while1},
    character::complete::{anychar, char, multispace0, multispace1},
    combinator::{all_consuming, eof, opt, recognize, value},
    multi::{many1, separated_list0},
    sequence::{pair, terminated},
    IResult,
};

use super::{EditorId, OptionDef, OptionScope, OptionStore, OptionValue, ScopeKind, SetOperation};
use crate::errors::{OptionError, OptionResult};

/// Which of the `:set` commands is running.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum SetCommand {
    /// `:set`, which updates the global value and the current editor's value.
    Set,

    /// `:setlocal`, which only updates the current editor's value.
    SetLocal,

    /// `:setglobal`, which only updates the global value.
    SetGlobal,
}

/// A single argument to a `:set` command.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum SetArg {
    /// `all`: show every option.
    ShowAll,

    /// `all&`: reset every option.
    ResetAll,

    /// `name`, `noname` or `invname`.
    Bare(String),

    /// `name?`: show the value.
    Query(String),

    /// `name!`: flip a toggle.
    Invert(String),

    /// `name&`: reset to the default value.
    Reset(String),

    /// `name<`: use the global value.
    CopyGlobal(String),

    /// `name=value`, `name+=value`, `name^=value` or `name-=value`.
    Assign(String, SetOperation, String),
}

fn is_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

fn parse_name(input: &str) -> IResult<&str, String> {
    let (input, name) = take_while1(is_name_char)(input)?;

    Ok((input, name.to_string()))
}

fn parse_operation(input: &str) -> IResult<&str, SetOperation> {
    alt((
        value(SetOperation::Append, tag("+=")),
        value(SetOperation::Prepend, tag("^=")),
        value(SetOperation::Remove, tag("-=")),
        value(SetOperation::Assign, tag("=")),
        value(SetOperation::Assign, tag(":")),
    ))(input)
}

fn unescape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars().peekable();

    while let Some(c) = chars.next() {
        match (c, chars.peek()) {
            ('\\', Some(&n)) if n == '\\' || n.is_whitespace() => {
                out.push(n);
                chars.next();
            },
            (c, _) => out.push(c),
        }
    }

    out
}

fn parse_assign(input: &str) -> IResult<&str, SetArg> {
    let (input, name) = parse_name(input)?;
    let (input, op) = parse_operation(input)?;

    Ok(("", SetArg::Assign(name, op, unescape(input))))
}

fn parse_suffixed(input: &str) -> IResult<&str, SetArg> {
    let (input, name) = parse_name(input)?;
    let (input, suffix) = opt(alt((char('?'), char('!'), char('&'), char('<'))))(input)?;

    let arg = match suffix {
        Some('?') => SetArg::Query(name),
        Some('!') => SetArg::Invert(name),
        Some('&') if name == "all" => SetArg::ResetAll,
        Some('&') => SetArg::Reset(name),
        Some('<') => SetArg::CopyGlobal(name),
        _ if name == "all" => SetArg::ShowAll,
        _ => SetArg::Bare(name),
    };

    // `&vi` and `&vim` also reset to the default value.
    let (input, _) = match arg {
        SetArg::Reset(_) | SetArg::ResetAll => opt(alt((tag("vim"), tag("vi"))))(input)?,
        _ => (input, None),
    };

    Ok((input, arg))
}

fn parse_arg(input: &str) -> IResult<&str, SetArg> {
    all_consuming(alt((parse_assign, parse_suffixed)))(input)
}

fn parse_raw_arg(input: &str) -> IResult<&str, &str> {
    recognize(many1(alt((recognize(pair(char('\\'), anychar)), is_not(" \t\\")))))(input)
}

fn parse_raw_args(input: &str) -> IResult<&str, Vec<&str>> {
    let (input, _) = multispace0(input)?;
    let (input, args) = separated_list0(multispace1, parse_raw_arg)(input)?;
    let (input, _) = terminated(multispace0, eof)(input)?;

    Ok((input, args))
}

/// Parse the arguments to a `:set` command.
pub fn parse_args(input: &str) -> OptionResult<Vec<SetArg>> {
    let (_, raw) =
        parse_raw_args(input).map_err(|_| OptionError::InvalidArgument(input.trim().into()))?;

    raw.into_iter()
        .map(|token| {
            parse_arg(token)
                .map(|(_, arg)| arg)
                .map_err(|_| OptionError::UnknownOption(token.into()))
        })
        .collect()
}

fn show(def: &OptionDef, value: &OptionValue) -> String {
    match value {
        OptionValue::Toggle(true) => def.name().to_string(),
        OptionValue::Toggle(false) => format!("no{}", def.name()),
        v => format!("{}={v}", def.name()),
    }
}

/// Runs `:set` arguments against an [OptionStore] on behalf of an editor.
pub struct SetExecutor<'a> {
    store: &'a mut OptionStore,
    cmd: SetCommand,
    editor: EditorId,
    output: Vec<String>,
}

impl<'a> SetExecutor<'a> {
    /// Create an executor for one of the `:set` commands.
    pub fn new(store: &'a mut OptionStore, cmd: SetCommand, editor: EditorId) -> Self {
        SetExecutor { store, cmd, editor, output: vec![] }
    }

    fn read_scope(&self) -> OptionScope {
        match self.cmd {
            SetCommand::SetGlobal => OptionScope::Global,
            SetCommand::Set | SetCommand::SetLocal => OptionScope::Local(self.editor),
        }
    }

    /// Look up a toggle named with a `no` or `inv` prefix.
    fn prefixed_toggle(&self, name: &str, prefix: &str) -> Option<String> {
        let rest = name.strip_prefix(prefix)?;
        let def = self.store.get_def(rest).ok()?;

        def.is_toggle().then(|| def.name().to_string())
    }

    /// Apply a write to the scopes this command updates.
    fn write<F>(&mut self, name: &str, mut f: F) -> OptionResult<()>
    where
        F: FnMut(&mut OptionStore, OptionScope) -> OptionResult<()>,
    {
        let kind = self.store.get_def(name)?.scope_kind();
        let local = OptionScope::Local(self.editor);

        match (self.cmd, kind) {
            (_, ScopeKind::Global) | (SetCommand::SetGlobal, _) => f(self.store, OptionScope::Global),
            (SetCommand::SetLocal, _) => f(self.store, local),
            (SetCommand::Set, ScopeKind::Local) => {
                f(self.store, local)?;

                let value = self.store.get(name, local)?.clone();
                self.store.set(name, OptionScope::Global, value)
            },
            (SetCommand::Set, ScopeKind::GlobalLocal) => {
                f(self.store, OptionScope::Global)?;
                self.store.unset_local(name, self.editor)
            },
        }
    }

    fn query(&mut self, name: &str) -> OptionResult<()> {
        let scope = self.read_scope();
        let def = self.store.get_def(name)?;
        let value = self.store.get(name, scope)?;

        self.output.push(show(def, value));

        Ok(())
    }

    fn show_options(&mut self, all: bool) {
        let scope = self.read_scope();
        let mut lines = vec!["--- Options ---".to_string()];

        for def in self.store.definitions() {
            let Ok(value) = self.store.get(def.name(), scope) else {
                continue;
            };

            if all || value != def.default_value() {
                lines.push(show(def, value));
            }
        }

        self.output.extend(lines);
    }

    fn run(&mut self, arg: SetArg) -> OptionResult<()> {
        match arg {
            SetArg::ShowAll => self.show_options(true),
            SetArg::ResetAll => self.store.reset_all(),
            SetArg::Bare(name) => {
                if let Ok(def) = self.store.get_def(&name) {
                    if def.is_toggle() {
                        return self.write(&name, |s, scope| s.set_toggle(&name, scope));
                    }

                    return self.query(&name);
                }

                if let Some(full) = self.prefixed_toggle(&name, "no") {
                    return self.write(&full, |s, scope| s.unset_toggle(&full, scope));
                }

                if let Some(full) = self.prefixed_toggle(&name, "inv") {
                    return self.write(&full, |s, scope| s.invert_toggle(&full, scope));
                }

                return Err(OptionError::UnknownOption(name));
            },
            SetArg::Query(name) => self.query(&name)?,
            SetArg::Invert(name) => {
                self.write(&name, |s, scope| s.invert_toggle(&name, scope))?;
            },
            SetArg::Reset(name) => {
                self.write(&name, |s, scope| s.reset(&name, scope))?;
            },
            SetArg::CopyGlobal(name) => {
                let def = self.store.get_def(&name)?;
                let full = def.name().to_string();

                match def.scope_kind() {
                    ScopeKind::Global => {},
                    ScopeKind::GlobalLocal => self.store.unset_local(&full, self.editor)?,
                    ScopeKind::Local => {
                        let value = self.store.get(&full, OptionScope::Global)?.clone();
                        self.store.set(&full, OptionScope::Local(self.editor), value)?;
                    },
                }
            },
            SetArg::Assign(name, op, value) => {
                self.write(&name, |s, scope| s.set_str(&name, scope, op, &value))?;
            },
        }

        Ok(())
    }

    /// Run each argument in order, stopping at the first error.
    ///
    /// Without any arguments, this shows every option that differs from its default value.
    pub fn execute(mut self, args: &str) -> OptionResult<Vec<String>> {
        let args = parse_args(args)?;

        if args.is_empty() {
            self.show_options(false);
        }

        for arg in args {
            self.run(arg)?;
        }

        Ok(self.output)
    }
}

/// Run a `:set`, `:setlocal` or `:setglobal` command, returning any lines to show the user.
pub fn execute(
    store: &mut OptionStore,
    cmd: SetCommand,
    editor: EditorId,
    args: &str,
) -> OptionResult<Vec<String>> {
    SetExecutor::new(store, cmd, editor).execute(args)
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_log::test;

    const ED1: EditorId = EditorId(1);
    const ED2: EditorId = EditorId(2);

    fn set(store: &mut OptionStore, args: &str) -> OptionResult<Vec<String>> {
        execute(store, SetCommand::Set, ED1, args)
    }

    #[test]
    fn test_parse_args() {
        assert_eq!(parse_args("").unwrap(), vec![]);
        assert_eq!(parse_args("  all  ").unwrap(), vec![SetArg::ShowAll]);
        assert_eq!(parse_args("all&").unwrap(), vec![SetArg::ResetAll]);
        assert_eq!(parse_args("nowrap hi? to! so& so&vim isk<").unwrap(), vec![
            SetArg::Bare("nowrap".into()),
            SetArg::Query("hi".into()),
            SetArg::Invert("to".into()),
            SetArg::Reset("so".into()),
            SetArg::Reset("so".into()),
            SetArg::CopyGlobal("isk".into()),
        ]);
        assert_eq!(parse_args("km+=startsel hi^=2 km-=stopsel tm:10").unwrap(), vec![
            SetArg::Assign("km".into(), SetOperation::Append, "startsel".into()),
            SetArg::Assign("hi".into(), SetOperation::Prepend, "2".into()),
            SetArg::Assign("km".into(), SetOperation::Remove, "stopsel".into()),
            SetArg::Assign("tm".into(), SetOperation::Assign, "10".into()),
        ]);
    }

    #[test]
    fn test_parse_escapes() {
        assert_eq!(parse_args("cb=a\\ b\\\\c\\|d").unwrap(), vec![SetArg::Assign(
            "cb".into(),
            SetOperation::Assign,
            "a b\\c\\|d".into()
        )]);
        assert_eq!(parse_args("hi=").unwrap(), vec![SetArg::Assign(
            "hi".into(),
            SetOperation::Assign,
            "".into()
        )]);
        assert_eq!(parse_args("wrap%"), Err(OptionError::UnknownOption("wrap%".into())));
        assert_eq!(parse_args("=5"), Err(OptionError::UnknownOption("=5".into())));
    }

    #[test]
    fn test_toggles() {
        let mut store = OptionStore::default();

        set(&mut store, "notimeout").unwrap();
        assert_eq!(store.accessor(OptionScope::Global).is_set("timeout"), false);

        set(&mut store, "invto").unwrap();
        assert_eq!(store.accessor(OptionScope::Global).is_set("timeout"), true);

        set(&mut store, "to!").unwrap();
        assert_eq!(set(&mut store, "to?").unwrap(), strs!["notimeout"]);

        set(&mut store, "timeout").unwrap();
        assert_eq!(set(&mut store, "timeout?").unwrap(), strs!["timeout"]);

        assert_eq!(set(&mut store, "nohistory"), Err(OptionError::UnknownOption("nohistory".into())));
        assert_eq!(
            set(&mut store, "wrap=1"),
            Err(OptionError::InvalidArgument("wrap=1".into()))
        );
    }

    #[test]
    fn test_values() {
        let mut store = OptionStore::default();

        assert_eq!(set(&mut store, "hi").unwrap(), strs!["history=50"]);

        set(&mut store, "hi=20 hi+=5").unwrap();
        assert_eq!(set(&mut store, "hi?").unwrap(), strs!["history=25"]);

        set(&mut store, "hi&").unwrap();
        assert_eq!(store.accessor(OptionScope::Global).get_int("history"), 50);
    }

    #[test]
    fn test_stop_at_first_error() {
        let mut store = OptionStore::default();

        assert_eq!(
            set(&mut store, "hi=5 bogus=1 tm=5"),
            Err(OptionError::UnknownOption("bogus".into()))
        );
        assert_eq!(store.accessor(OptionScope::Global).get_int("history"), 5);
        assert_eq!(store.accessor(OptionScope::Global).get_int("timeoutlen"), 1000);

        assert_eq!(
            set(&mut store, "hi=abc"),
            Err(OptionError::NumberRequired("hi=abc".into()))
        );
    }

    #[test]
    fn test_scopes() {
        let mut store = OptionStore::default();

        // :setlocal only changes this editor.
        execute(&mut store, SetCommand::SetLocal, ED1, "nowrap").unwrap();
        assert_eq!(store.accessor(OptionScope::Local(ED1)).is_set("wrap"), false);
        assert_eq!(store.accessor(OptionScope::Local(ED2)).is_set("wrap"), true);

        // :set on a local option changes this editor and the global value.
        execute(&mut store, SetCommand::Set, ED2, "sw=4").unwrap();
        assert_eq!(store.accessor(OptionScope::Local(ED2)).get_int("sw"), 4);
        assert_eq!(store.accessor(OptionScope::Global).get_int("sw"), 4);

        // :setglobal leaves the editors alone.
        execute(&mut store, SetCommand::SetGlobal, ED2, "sw=2").unwrap();
        assert_eq!(store.accessor(OptionScope::Local(ED2)).get_int("sw"), 4);
        assert_eq!(
            execute(&mut store, SetCommand::SetGlobal, ED2, "sw?").unwrap(),
            strs!["shiftwidth=2"]
        );

        // name< copies the global value.
        execute(&mut store, SetCommand::SetLocal, ED2, "sw<").unwrap();
        assert_eq!(store.accessor(OptionScope::Local(ED2)).get_int("sw"), 2);

        // :set on a global-local option removes the local value.
        execute(&mut store, SetCommand::SetLocal, ED1, "so=3").unwrap();
        assert_eq!(store.has_local("so", ED1), true);
        execute(&mut store, SetCommand::Set, ED1, "so=7").unwrap();
        assert_eq!(store.has_local("so", ED1), false);
        assert_eq!(store.accessor(OptionScope::Local(ED1)).get_int("so"), 7);
    }

    #[test]
    fn test_show_changed() {
        let mut store = OptionStore::default();

        assert_eq!(set(&mut store, "").unwrap(), strs!["--- Options ---"]);

        set(&mut store, "hi=10 notimeout").unwrap();
        assert_eq!(set(&mut store, "").unwrap(), strs![
            "--- Options ---",
            "history=10",
            "notimeout"
        ]);

        set(&mut store, "all&").unwrap();
        assert_eq!(set(&mut store, "").unwrap(), strs!["--- Options ---"]);

        let all = set(&mut store, "all").unwrap();
        assert_eq!(all.len(), store.definitions().len() + 1);
    }
}
