//! # Cursor shapes
//!
//! ## Overview
//!
//! The `guicursor` option describes what the cursor looks like in each mode, as a
//! comma-separated list of entries like `n-v-c:block-Cursor/lCursor` or `i:ver25`. Later entries
//! override earlier ones for the modes they name, and the `a` mode token applies to every mode.
use nom::{
    branch::alt,
    bytes::complete::tag,
    character::complete::digit1,
    combinator::{all_consuming, value},
    IResult,
};

use engine_types::prelude::{Mode, ModeState};

use crate::errors::{OptionError, OptionResult};

/// The modes that `guicursor` entries can apply to.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum GuiCursorMode {
    /// Normal mode (`n`).
    Normal,
    /// Visual mode (`v`).
    Visual,
    /// Visual mode with `selection=exclusive` (`ve`).
    VisualExclusive,
    /// Operator-pending mode (`o`).
    OpPending,
    /// Insert mode (`i`).
    Insert,
    /// Replace mode (`r`).
    Replace,
    /// Command-line mode (`c`).
    CmdLine,
    /// Inserting on the command line (`ci`).
    CmdLineInsert,
    /// Replacing on the command line (`cr`).
    CmdLineReplace,
    /// Showing a matching bracket (`sm`).
    ShowMatch,
    /// Every mode (`a`).
    All,
}

impl GuiCursorMode {
    /// The token used for this mode in `guicursor` entries.
    pub fn token(&self) -> &'static str {
        match self {
            GuiCursorMode::Normal => "n",
            GuiCursorMode::Visual => "v",
            GuiCursorMode::VisualExclusive => "ve",
            GuiCursorMode::OpPending => "o",
            GuiCursorMode::Insert => "i",
            GuiCursorMode::Replace => "r",
            GuiCursorMode::CmdLine => "c",
            GuiCursorMode::CmdLineInsert => "ci",
            GuiCursorMode::CmdLineReplace => "cr",
            GuiCursorMode::ShowMatch => "sm",
            GuiCursorMode::All => "a",
        }
    }

    /// Look up a mode by its token.
    pub fn from_token(token: &str) -> Option<Self> {
        let mode = match token {
            "n" => GuiCursorMode::Normal,
            "v" => GuiCursorMode::Visual,
            "ve" => GuiCursorMode::VisualExclusive,
            "o" => GuiCursorMode::OpPending,
            "i" => GuiCursorMode::Insert,
            "r" => GuiCursorMode::Replace,
            "c" => GuiCursorMode::CmdLine,
            "ci" => GuiCursorMode::CmdLineInsert,
            "cr" => GuiCursorMode::CmdLineReplace,
            "sm" => GuiCursorMode::ShowMatch,
            "a" => GuiCursorMode::All,
            _ => return None,
        };

        Some(mode)
    }

    /// The cursor mode for an editing mode.
    ///
    /// `exclusive` is whether the `selection` option is `exclusive`.
    pub fn from_mode(state: ModeState, exclusive: bool) -> Self {
        match state.mode() {
            Mode::Normal => GuiCursorMode::Normal,
            Mode::Visual | Mode::Select if exclusive => GuiCursorMode::VisualExclusive,
            Mode::Visual | Mode::Select => GuiCursorMode::Visual,
            Mode::OperatorPending => GuiCursorMode::OpPending,
            Mode::Insert => GuiCursorMode::Insert,
            Mode::Replace => GuiCursorMode::Replace,
            Mode::CommandLine => GuiCursorMode::CmdLine,
        }
    }
}

/// The shape of the cursor.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub enum GuiCursorType {
    /// A block covering the character.
    #[default]
    Block,
    /// A vertical bar, a percentage of the character's width.
    Ver,
    /// A horizontal bar, a percentage of the character's height.
    Hor,
}

/// A single parsed `guicursor` entry.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct GuiCursorEntry {
    /// The modes this entry applies to.
    pub modes: Vec<GuiCursorMode>,
    /// The shape, if the entry sets one.
    pub cursor_type: Option<GuiCursorType>,
    /// The thickness percentage for [GuiCursorType::Ver] and [GuiCursorType::Hor].
    pub thickness: Option<u32>,
    /// The highlight group, or an empty string.
    pub highlight_group: String,
    /// The highlight group used when language mappings are active, or an empty string.
    pub lmap_highlight_group: String,
    /// Blink settings, like `blinkwait175`.
    pub blink_modes: Vec<String>,
}

/// The effective cursor look for a mode.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct GuiCursorAttributes {
    /// The shape.
    pub cursor_type: GuiCursorType,
    /// The thickness percentage; always 100 for a block.
    pub thickness: u32,
    /// The highlight group.
    pub highlight_group: String,
    /// The language mapping highlight group.
    pub lmap_highlight_group: String,
    /// Blink settings.
    pub blink_modes: Vec<String>,
}

impl Default for GuiCursorAttributes {
    fn default() -> Self {
        GuiCursorAttributes {
            cursor_type: GuiCursorType::Block,
            thickness: 100,
            highlight_group: String::new(),
            lmap_highlight_group: String::new(),
            blink_modes: vec![],
        }
    }
}

fn parse_bar_type(input: &str) -> IResult<&str, GuiCursorType> {
    alt((
        value(GuiCursorType::Ver, tag("ver")),
        value(GuiCursorType::Hor, tag("hor")),
    ))(input)
}

fn parse_percentage(input: &str) -> IResult<&str, &str> {
    all_consuming(digit1)(input)
}

fn parse_shape(arg: &str, token: &str) -> OptionResult<Option<(GuiCursorType, Option<u32>)>> {
    if arg == "block" {
        return Ok(Some((GuiCursorType::Block, None)));
    }

    let Ok((rest, ctype)) = parse_bar_type(arg) else {
        return Ok(None);
    };

    let Ok((_, digits)) = parse_percentage(rest) else {
        return Err(OptionError::DigitExpected(token.to_string()));
    };

    match digits.parse::<u32>() {
        Ok(n) if n >= 1 && n <= 100 => Ok(Some((ctype, Some(n)))),
        _ => Err(OptionError::IllegalPercentage(token.to_string())),
    }
}

/// Parse a single entry, like `i-ci:ver25-Cursor/lCursor`.
pub fn parse_entry(token: &str) -> OptionResult<GuiCursorEntry> {
    let parts: Vec<&str> = token.split(':').collect();

    let (modes, args) = match parts.as_slice() {
        [_] => return Err(OptionError::MissingColon(token.to_string())),
        [modes, args] => (*modes, *args),
        _ => return Err(OptionError::IllegalMode(token.to_string())),
    };

    let modes = modes
        .split('-')
        .map(|m| GuiCursorMode::from_token(m).ok_or_else(|| OptionError::IllegalMode(token.into())))
        .collect::<OptionResult<Vec<_>>>()?;

    let mut entry = GuiCursorEntry {
        modes,
        cursor_type: None,
        thickness: None,
        highlight_group: String::new(),
        lmap_highlight_group: String::new(),
        blink_modes: vec![],
    };

    for arg in args.split('-') {
        if let Some((ctype, thickness)) = parse_shape(arg, token)? {
            entry.cursor_type = Some(ctype);
            entry.thickness = thickness;
        } else if arg.starts_with("blink") {
            entry.blink_modes.push(arg.to_string());
        } else if let Some((hl, lmap)) = arg.split_once('/') {
            entry.highlight_group = hl.to_string();
            entry.lmap_highlight_group = lmap.to_string();
        } else {
            entry.highlight_group = arg.to_string();
        }
    }

    Ok(entry)
}

/// Parse a whole `guicursor` value.
pub fn parse(value: &str) -> OptionResult<Vec<GuiCursorEntry>> {
    value.split(',').filter(|t| !t.is_empty()).map(parse_entry).collect()
}

/// Check that a value can be parsed, for use as an option validator.
pub fn validate(value: &str) -> OptionResult<()> {
    parse(value).map(|_| ())
}

/// Compute the effective attributes for a mode.
pub fn attributes(entries: &[GuiCursorEntry], mode: GuiCursorMode) -> GuiCursorAttributes {
    // "ve" falls back to "v" when no entry names it.
    let mode = if mode == GuiCursorMode::VisualExclusive &&
        !entries.iter().any(|e| e.modes.contains(&GuiCursorMode::VisualExclusive))
    {
        GuiCursorMode::Visual
    } else {
        mode
    };

    let mut attrs = GuiCursorAttributes::default();

    for entry in entries {
        if !entry.modes.contains(&mode) && !entry.modes.contains(&GuiCursorMode::All) {
            continue;
        }

        if let Some(ctype) = entry.cursor_type {
            attrs.cursor_type = ctype;
            attrs.thickness = entry.thickness.unwrap_or(100);
        }

        if !entry.highlight_group.is_empty() {
            attrs.highlight_group = entry.highlight_group.clone();
        }

        if !entry.lmap_highlight_group.is_empty() {
            attrs.lmap_highlight_group = entry.lmap_highlight_group.clone();
        }

        if !entry.blink_modes.is_empty() {
            attrs.blink_modes = entry.blink_modes.clone();
        }
    }

    attrs
}
