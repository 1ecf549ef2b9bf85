//! # Vim options
//!
//! ## Overview
//!
//! The names and default values of the options that the engine defines on startup.
use super::{guicursor, OptionDef, ScopeKind};

/// Whether mappings time out (`timeout`, `to`).
pub const TIMEOUT: &str = "timeout";
/// How long to wait for an ambiguous mapping, in milliseconds (`timeoutlen`, `tm`).
pub const TIMEOUTLEN: &str = "timeoutlen";
/// How many times mappings may expand into each other (`maxmapdepth`, `mmd`).
pub const MAXMAPDEPTH: &str = "maxmapdepth";
/// Whether mappings are expanded recursively (`remap`).
pub const REMAP: &str = "remap";
/// How special keys start and stop selections (`keymodel`, `km`).
pub const KEYMODEL: &str = "keymodel";
/// When to start Select mode instead of Visual mode (`selectmode`, `slm`).
pub const SELECTMODE: &str = "selectmode";
/// How the end of a selection is treated (`selection`, `sel`).
pub const SELECTION: &str = "selection";
/// Cursor shapes per mode (`guicursor`, `gcr`).
pub const GUICURSOR: &str = "guicursor";
/// Whether to show the current mode (`showmode`, `smd`).
pub const SHOWMODE: &str = "showmode";
/// Whether to show pending keys (`showcmd`, `sc`).
pub const SHOWCMD: &str = "showcmd";
/// Command line history size (`history`, `hi`).
pub const HISTORY: &str = "history";
/// Clipboard behaviour (`clipboard`, `cb`).
pub const CLIPBOARD: &str = "clipboard";
/// Bracket pairs for `%` (`matchpairs`, `mps`).
pub const MATCHPAIRS: &str = "matchpairs";
/// Lines kept visible around the cursor (`scrolloff`, `so`).
pub const SCROLLOFF: &str = "scrolloff";
/// Maximum number of undoable changes (`undolevels`, `ul`).
pub const UNDOLEVELS: &str = "undolevels";
/// Show line numbers (`number`, `nu`).
pub const NUMBER: &str = "number";
/// Show relative line numbers (`relativenumber`, `rnu`).
pub const RELATIVENUMBER: &str = "relativenumber";
/// Wrap long lines (`wrap`).
pub const WRAP: &str = "wrap";
/// Width of an indent step (`shiftwidth`, `sw`).
pub const SHIFTWIDTH: &str = "shiftwidth";
/// Characters that make up keywords (`iskeyword`, `isk`).
pub const ISKEYWORD: &str = "iskeyword";

/// The default value of `guicursor`.
pub const GUICURSOR_DEFAULT: &str = "n-v-c:block-Cursor/lCursor,\
    ve:ver35-Cursor,\
    o:hor50-Cursor,\
    i-ci:ver25-Cursor/lCursor,\
    r-cr:hor20-Cursor/lCursor,\
    sm:block-Cursor-blinkwait175-blinkoff150-blinkon175";

const KEYMODEL_VALUES: &[&str] =
    &["startsel", "stopsel", "stopselect", "stopvisual", "continueselect", "continuevisual"];
const SELECTMODE_VALUES: &[&str] = &["mouse", "key", "cmd"];
const SELECTION_VALUES: &[&str] = &["old", "inclusive", "exclusive"];

/// The options defined when an engine starts.
pub fn default_options() -> Vec<OptionDef> {
    vec![
        OptionDef::toggle(TIMEOUT, "to", true),
        OptionDef::unsigned(TIMEOUTLEN, "tm", 1000),
        OptionDef::unsigned(MAXMAPDEPTH, "mmd", 1000),
        OptionDef::toggle(REMAP, "", true),
        OptionDef::list(KEYMODEL, "km", "continueselect,stopselect").bounded(KEYMODEL_VALUES),
        OptionDef::list(SELECTMODE, "slm", "").bounded(SELECTMODE_VALUES),
        OptionDef::string(SELECTION, "sel", "inclusive").bounded(SELECTION_VALUES),
        OptionDef::list(GUICURSOR, "gcr", GUICURSOR_DEFAULT).validator(guicursor::validate),
        OptionDef::toggle(SHOWMODE, "smd", true),
        OptionDef::toggle(SHOWCMD, "sc", true),
        OptionDef::unsigned(HISTORY, "hi", 50),
        OptionDef::list(CLIPBOARD, "cb", "autoselect,exclude:cons\\|linux"),
        OptionDef::list(MATCHPAIRS, "mps", "(:),{:},[:]"),
        OptionDef::unsigned(SCROLLOFF, "so", 0).scope(ScopeKind::GlobalLocal),
        OptionDef::number(UNDOLEVELS, "ul", 1000).scope(ScopeKind::GlobalLocal),
        OptionDef::toggle(NUMBER, "nu", false).scope(ScopeKind::Local),
        OptionDef::toggle(RELATIVENUMBER, "rnu", false).scope(ScopeKind::Local),
        OptionDef::toggle(WRAP, "", true).scope(ScopeKind::Local),
        OptionDef::unsigned(SHIFTWIDTH, "sw", 8).scope(ScopeKind::Local),
        OptionDef::list(ISKEYWORD, "isk", "@,48-57,_").scope(ScopeKind::Local),
    ]
}
