//! # Input keys
//!
//! ## Overview
//!
//! This module contains code for representing keys, and for reading and writing them in Vim's
//! key notation (`<C-w>`, `<Esc>`, `<lt>`, ...), which is used by mappings and stored macros.
//!
use std::fmt;
use std::hash::Hash;
use std::str::FromStr;

use self::parse::{parse_key_str, parse_macro_str};
use crate::errors::MacroError;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use keymap::InputKey;

pub(crate) mod parse;

/// A key pressed in a terminal.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct TerminalKey {
    code: KeyCode,
    modifiers: KeyModifiers,
}

impl TerminalKey {
    /// Create a new key.
    pub fn new(code: KeyCode, mut modifiers: KeyModifiers) -> Self {
        if let KeyCode::Char(_) = code {
            // SHIFT is already reflected in the character itself.
            modifiers -= KeyModifiers::SHIFT;
        }

        Self { code, modifiers }
    }

    /// The key's code.
    pub fn code(&self) -> KeyCode {
        self.code
    }

    /// The modifiers held down with the key.
    pub fn modifiers(&self) -> KeyModifiers {
        self.modifiers
    }

    /// Whether this key is `<Esc>`, or one of its control-key spellings.
    pub fn is_escape(&self) -> bool {
        match self.code {
            KeyCode::Esc => true,
            KeyCode::Char('c') => self.modifiers == KeyModifiers::CONTROL,
            _ => false,
        }
    }

    /// Whether this key confirms a line of input.
    pub fn is_enter(&self) -> bool {
        match self.code {
            KeyCode::Enter => true,
            KeyCode::Char('\n') => self.modifiers.is_empty(),
            _ => false,
        }
    }

    /// The digit this key types, if it is an unmodified digit.
    pub fn get_digit(&self) -> Option<usize> {
        let c = self.get_char()?;

        c.to_digit(10).map(|d| d as usize)
    }

    /// Return this key's representation as a single codepoint, if it exists.
    pub fn get_literal_char(&self) -> Option<char> {
        match self.code {
            KeyCode::Char(c) => {
                if self.modifiers.is_empty() {
                    return Some(c);
                }

                if self.modifiers == KeyModifiers::CONTROL {
                    let cp = match c {
                        'a'..='z' => c as u32 - b'a' as u32 + 0x01,
                        ' ' | '@' => 0x0,
                        '4'..='7' => c as u32 - b'4' as u32 + 0x1C,
                        _ => return None,
                    };

                    return char::from_u32(cp);
                }

                return None;
            },
            KeyCode::Tab if self.modifiers.is_empty() => Some('\u{09}'),
            KeyCode::Enter => Some('\u{0D}'),
            KeyCode::Esc => Some('\u{1B}'),
            KeyCode::Backspace => Some('\u{7F}'),
            _ => None,
        }
    }
}

impl FromStr for TerminalKey {
    type Err = MacroError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        if input.is_empty() {
            return Err(MacroError::EmptyMacro);
        }

        match parse_key_str(input) {
            Ok((_, key)) => Ok(key),
            Err(_) => Err(MacroError::InvalidMacro(input.to_string())),
        }
    }
}

impl fmt::Display for TerminalKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let named = |f: &mut fmt::Formatter<'_>, name: &str| {
            let mut mods = String::new();

            if self.modifiers.contains(KeyModifiers::CONTROL) {
                mods.push_str("C-");
            }

            if self.modifiers.contains(KeyModifiers::SHIFT) {
                mods.push_str("S-");
            }

            if self.modifiers.contains(KeyModifiers::ALT) {
                mods.push_str("A-");
            }

            write!(f, "<{mods}{name}>")
        };

        match self.code {
            KeyCode::Left => named(f, "Left"),
            KeyCode::Right => named(f, "Right"),
            KeyCode::Up => named(f, "Up"),
            KeyCode::Down => named(f, "Down"),
            KeyCode::Backspace => named(f, "BS"),
            KeyCode::Enter => named(f, "CR"),
            KeyCode::Home => named(f, "Home"),
            KeyCode::End => named(f, "End"),
            KeyCode::PageUp => named(f, "PageUp"),
            KeyCode::PageDown => named(f, "PageDown"),
            KeyCode::Null => named(f, "Nul"),
            KeyCode::Esc => named(f, "Esc"),
            KeyCode::Delete => named(f, "Del"),
            KeyCode::Insert => named(f, "Insert"),
            KeyCode::Pause => named(f, "Pause"),
            KeyCode::PrintScreen => named(f, "PrintScreen"),
            KeyCode::Tab => named(f, "Tab"),
            KeyCode::BackTab => write!(f, "<S-Tab>"),
            KeyCode::F(n) => named(f, &format!("F{n}")),
            KeyCode::Char(c) if self.modifiers.is_empty() => {
                match c {
                    '<' => write!(f, "<lt>"),
                    ' ' => write!(f, "<Space>"),
                    '\n' => write!(f, "<NL>"),
                    c => write!(f, "{c}"),
                }
            },
            KeyCode::Char(c) => {
                match c {
                    '4' if self.modifiers.contains(KeyModifiers::CONTROL) => named(f, "\\"),
                    '5' if self.modifiers.contains(KeyModifiers::CONTROL) => named(f, "]"),
                    '6' if self.modifiers.contains(KeyModifiers::CONTROL) => named(f, "^"),
                    '7' if self.modifiers.contains(KeyModifiers::CONTROL) => named(f, "_"),
                    ' ' => named(f, "Space"),
                    '<' => named(f, "lt"),
                    c if self.modifiers.contains(KeyModifiers::CONTROL) => {
                        named(f, &c.to_uppercase().to_string())
                    },
                    c => named(f, &c.to_string()),
                }
            },
            _ => Ok(()),
        }
    }
}

impl InputKey for TerminalKey {
    type Error = MacroError;

    fn decompose(&mut self) -> Option<Self> {
        if let KeyCode::Char(_) = self.code {
            if self.modifiers.contains(KeyModifiers::ALT) {
                self.modifiers -= KeyModifiers::ALT;

                return Some(Self::from(KeyCode::Esc));
            }
        }

        return None;
    }

    fn from_macro_str(input: &str) -> Result<Vec<Self>, MacroError> {
        if input.is_empty() {
            return Err(MacroError::EmptyMacro);
        }

        match parse_macro_str(input) {
            Ok((_, keys)) => Ok(keys),
            Err(_) => Err(MacroError::InvalidMacro(input.to_string())),
        }
    }

    fn get_char(&self) -> Option<char> {
        if let KeyCode::Char(c) = self.code {
            if self.modifiers.is_empty() {
                return Some(c);
            }
        }

        None
    }
}

impl From<KeyCode> for TerminalKey {
    fn from(code: KeyCode) -> Self {
        TerminalKey::new(code, KeyModifiers::NONE)
    }
}

impl From<char> for TerminalKey {
    fn from(c: char) -> Self {
        TerminalKey::new(KeyCode::Char(c), KeyModifiers::NONE)
    }
}

impl From<KeyEvent> for TerminalKey {
    fn from(ke: KeyEvent) -> Self {
        TerminalKey::new(ke.code, ke.modifiers)
    }
}

/// Write a series of keys in key notation.
pub fn keys_to_string(keys: &[TerminalKey]) -> String {
    keys.iter().map(ToString::to_string).collect()
}

/// Parse a series of keys written in key notation.
///
/// Unlike [InputKey::from_macro_str], an empty string is an empty series of keys.
pub fn parse_keys(input: &str) -> Result<Vec<TerminalKey>, MacroError> {
    if input.is_empty() {
        return Ok(vec![]);
    }

    TerminalKey::from_macro_str(input)
}
