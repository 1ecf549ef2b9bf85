//! # Ex commands
//!
//! ## Overview
//!
//! This module contains the [CommandMachine], which runs the ex commands that change the engine's
//! own configuration: `:set` and its scoped variants, and the `:map` family of commands for
//! adding, removing and listing mappings.
//!
//! Commands can be abbreviated the way Vim allows, down to a fixed minimum: `:se`, `:setl`,
//! `:nn`, `:ino`, and so on.
//!
//! ## Example
//!
//! ```
//! use vimengine::commands::{CommandContext, CommandMachine};
//! use vimengine::mapping::{MappedModes, MappingStore};
//! use vimengine::options::{EditorId, OptionScope, OptionStore, OptionValue};
//!
//! let mut cmds = CommandMachine::default();
//! let mut options = OptionStore::default();
//! let mut mappings = MappingStore::default();
//!
//! let mut ctx = CommandContext::new(&mut options, &mut mappings, EditorId(0));
//! cmds.input_cmd("se history=200", &mut ctx).unwrap();
//! cmds.input_cmd("nnoremap <silent> Y y$", &mut ctx).unwrap();
//!
//! assert_eq!(options.get("history", OptionScope::Global), Ok(&OptionValue::Number(200)));
//! assert_eq!(mappings.mappings(MappedModes::N, &[]).len(), 1);
//! ```
use nom::{
    bytes::complete::take_while,
    character::complete::{alpha1, char},
    combinator::opt,
    sequence::{pair, preceded},
    IResult,
};
use radix_trie::{Trie, TrieCommon};

use crate::errors::{CommandError, EngineResult};
use crate::key::{parse_keys, TerminalKey};
use crate::mapping::{MappedModes, MappingStore};
use crate::options::set::{self, SetCommand};
use crate::options::{EditorId, OptionStore};
use crate::util::completion_keys;

/// Arguments to the `:map` commands that are accepted and then ignored.
const IGNORED_MAP_ARGS: [&str; 6] =
    ["<buffer>", "<nowait>", "<silent>", "<special>", "<script>", "<unique>"];

/// What an ex command does.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ExCommand {
    /// Show or change options.
    Set(SetCommand),

    /// Add or list mappings.
    Map {
        /// The modes the command maps in.
        modes: MappedModes,

        /// Whether the mappings it adds are exempt from remapping.
        noremap: bool,
    },

    /// Remove a mapping.
    Unmap {
        /// The modes to remove the mapping from.
        modes: MappedModes,
    },

    /// Remove all mappings.
    MapClear {
        /// The modes to remove mappings from.
        modes: MappedModes,
    },
}

impl ExCommand {
    /// The form of this command written with a `!`, if it has one.
    fn with_bang(self) -> Option<ExCommand> {
        let ic = MappedModes::IC;

        match self {
            ExCommand::Map { modes, noremap } if modes == MappedModes::NVO => {
                Some(ExCommand::Map { modes: ic, noremap })
            },
            ExCommand::Unmap { modes } if modes == MappedModes::NVO => {
                Some(ExCommand::Unmap { modes: ic })
            },
            ExCommand::MapClear { modes } if modes == MappedModes::NVO => {
                Some(ExCommand::MapClear { modes: ic })
            },
            _ => None,
        }
    }
}

/// The state that ex commands operate on.
pub struct CommandContext<'a> {
    options: &'a mut OptionStore,
    mappings: &'a mut MappingStore,
    editor: EditorId,
}

impl<'a> CommandContext<'a> {
    /// Create a context for running commands on behalf of an editor.
    pub fn new(
        options: &'a mut OptionStore,
        mappings: &'a mut MappingStore,
        editor: EditorId,
    ) -> Self {
        CommandContext { options, mappings, editor }
    }
}

/// Track mapped commands and handle their execution.
#[derive(Debug)]
pub struct CommandMachine {
    names: Trie<String, ExCommand>,
    abbrevs: Trie<String, String>,
    last_cmd: String,
}

impl CommandMachine {
    /// Create a new instance without any commands.
    pub fn new() -> Self {
        let names = Trie::new();
        let abbrevs = Trie::new();
        let last_cmd = "".to_string();

        CommandMachine { names, abbrevs, last_cmd }
    }

    /// Map a command under its full name, and allow abbreviating it down to `abbrev`.
    pub fn add_command(&mut self, name: &str, abbrev: &str, cmd: ExCommand) {
        if abbrev != name {
            self.abbrevs.insert(abbrev.to_string(), name.to_string());
        }

        self.names.insert(name.to_string(), cmd);
    }

    /// Generate a list of completion candidates for command names.
    pub fn complete_name(&self, prefix: &str) -> Vec<String> {
        let mut names = completion_keys(&self.names, prefix);
        names.sort();
        names
    }

    /// Look up a command by its name, or an abbreviation of its name.
    pub fn get(&self, name: &str) -> Result<ExCommand, CommandError> {
        if let Some(cmd) = self.names.get(name) {
            return Ok(*cmd);
        }

        for (abbrev, full) in self.abbrevs.iter() {
            if name.starts_with(abbrev.as_str()) && full.starts_with(name) {
                if let Some(cmd) = self.names.get(full) {
                    return Ok(*cmd);
                }
            }
        }

        Err(CommandError::InvalidCommand(name.into()))
    }

    /// Get the previously executed command.
    pub fn get_last_command(&self) -> String {
        self.last_cmd.clone()
    }

    /// Whether a command line names one of the commands this machine runs.
    pub fn is_command(&self, input: &str) -> bool {
        match parse_cmdline(input) {
            Ok((_, (name, _))) => self.get(name).is_ok(),
            Err(_) => false,
        }
    }

    /// Parse and execute a command string, returning any lines to show the user.
    pub fn input_cmd(&mut self, input: &str, ctx: &mut CommandContext<'_>) -> EngineResult<Vec<String>> {
        let Ok((args, (name, bang))) = parse_cmdline(input) else {
            // Only colons and whitespace.
            return Ok(vec![]);
        };

        self.last_cmd = input.to_string();

        if !args.is_empty() && !args.starts_with(char::is_whitespace) {
            return Err(CommandError::ParseFailed(args.to_string()).into());
        }

        let mut cmd = self.get(name)?;

        if bang {
            cmd = cmd
                .with_bang()
                .ok_or_else(|| CommandError::InvalidArgument(format!("{name}!")))?;
        }

        log::debug!("running {name}{} ({cmd:?})", if bang { "!" } else { "" });

        match cmd {
            ExCommand::Set(scmd) => {
                let output = set::execute(ctx.options, scmd, ctx.editor, args.trim())?;

                Ok(output)
            },
            ExCommand::Map { modes, noremap } => {
                let (expr, args) = map_args(args);
                let (lhs, rhs) = split_lhs(args);

                if rhs.is_empty() {
                    let prefix = parse_keys(lhs)
                        .map_err(|_| CommandError::InvalidArgument(lhs.to_string()))?;

                    return Ok(list(ctx.mappings, modes, &prefix));
                }

                ctx.mappings.add_str(modes, lhs, rhs, noremap, expr)?;

                Ok(vec![])
            },
            ExCommand::Unmap { modes } => {
                let (_, lhs) = map_args(args);
                let lhs = lhs.trim();

                if lhs.is_empty() {
                    return Err(CommandError::InvalidArgument(name.to_string()).into());
                }

                ctx.mappings.remove_str(modes, lhs)?;

                Ok(vec![])
            },
            ExCommand::MapClear { modes } => {
                let (_, rest) = map_args(args);

                if !rest.trim().is_empty() {
                    return Err(CommandError::ParseFailed(rest.trim().to_string()).into());
                }

                ctx.mappings.clear(modes);

                Ok(vec![])
            },
        }
    }
}

impl Default for CommandMachine {
    fn default() -> Self {
        let mut cmds = CommandMachine::new();
        default_commands(&mut cmds);
        cmds
    }
}

#[rustfmt::skip]
fn default_commands(cmds: &mut CommandMachine) {
    use MappedModes as M;

    cmds.add_command("set", "se", ExCommand::Set(SetCommand::Set));
    cmds.add_command("setlocal", "setl", ExCommand::Set(SetCommand::SetLocal));
    cmds.add_command("setglobal", "setg", ExCommand::Set(SetCommand::SetGlobal));

    let families = [
        (M::NVO, "map", "map", "noremap", "no", "unmap", "unm", "mapclear", "mapc"),
        (M::N, "nmap", "nm", "nnoremap", "nn", "nunmap", "nun", "nmapclear", "nmapc"),
        (M::V, "vmap", "vm", "vnoremap", "vn", "vunmap", "vu", "vmapclear", "vmapc"),
        (M::X, "xmap", "xm", "xnoremap", "xn", "xunmap", "xu", "xmapclear", "xmapc"),
        (M::S, "smap", "smap", "snoremap", "snor", "sunmap", "sunm", "smapclear", "smapc"),
        (M::O, "omap", "om", "onoremap", "ono", "ounmap", "ou", "omapclear", "omapc"),
        (M::I, "imap", "im", "inoremap", "ino", "iunmap", "iu", "imapclear", "imapc"),
        (M::C, "cmap", "cm", "cnoremap", "cno", "cunmap", "cu", "cmapclear", "cmapc"),
    ];

    for (modes, map, map_ab, nore, nore_ab, unmap, unmap_ab, clear, clear_ab) in families {
        cmds.add_command(map, map_ab, ExCommand::Map { modes, noremap: false });
        cmds.add_command(nore, nore_ab, ExCommand::Map { modes, noremap: true });
        cmds.add_command(unmap, unmap_ab, ExCommand::Unmap { modes });
        cmds.add_command(clear, clear_ab, ExCommand::MapClear { modes });
    }
}

/// Split a command line into its name, whether it has a `!`, and its arguments.
fn parse_cmdline(input: &str) -> IResult<&str, (&str, bool)> {
    let (input, (name, bang)) = preceded(
        take_while(|c: char| c == ':' || c.is_whitespace()),
        pair(alpha1, opt(char('!'))),
    )(input)?;

    Ok((input, (name, bang.is_some())))
}

/// Strip the special arguments from the start of a `:map` command, noting whether `<expr>` was
/// one of them.
fn map_args(mut args: &str) -> (bool, &str) {
    let mut expr = false;

    loop {
        args = args.trim_start();

        if let Some(rest) = args.strip_prefix("<expr>") {
            expr = true;
            args = rest;
            continue;
        }

        match IGNORED_MAP_ARGS.iter().find_map(|a| args.strip_prefix(a)) {
            Some(rest) => args = rest,
            None => return (expr, args),
        }
    }
}

/// The left-hand side ends at the first whitespace.
fn split_lhs(args: &str) -> (&str, &str) {
    match args.find(char::is_whitespace) {
        Some(i) => (&args[..i], args[i..].trim_start()),
        None => (args, ""),
    }
}

fn list(mappings: &MappingStore, modes: MappedModes, prefix: &[TerminalKey]) -> Vec<String> {
    let lines = mappings.list(modes, prefix);

    if lines.is_empty() {
        vec!["No mapping found".to_string()]
    } else {
        lines
    }
}
