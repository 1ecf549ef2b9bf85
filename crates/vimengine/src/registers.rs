//! # Register names
//!
//! ## Overview
//!
//! Conversions between the characters typed after `"`, `q` and `@`, and [Register] values.
//! Typing an uppercase letter names the same register as its lowercase form, but appends to it
//! instead of replacing its contents.
use engine_types::prelude::Register;

use crate::key::TerminalKey;
use keymap::InputKey;

/// A register, along with whether writes should append to it.
pub type RegisterSpec = (Register, bool);

/// Get the register named by a character.
pub fn char_to_register(c: char) -> Option<RegisterSpec> {
    let reg = match c {
        '0' => Register::LastYanked,
        '1'..='9' => Register::RecentlyDeleted(c as usize - '1' as usize),

        'a'..='z' => Register::Named(c),
        'A'..='Z' => return Some((Register::Named(c.to_ascii_lowercase()), true)),

        '"' => Register::Unnamed,
        '-' => Register::SmallDelete,
        '#' => Register::AltBufName,
        '%' => Register::CurBufName,
        '_' => Register::Blackhole,
        ':' => Register::LastCommand,
        '/' => Register::LastSearch,
        '.' => Register::LastInserted,
        '*' => Register::SelectionPrimary,
        '+' => Register::SelectionClipboard,

        _ => return None,
    };

    Some((reg, false))
}

/// Get the register named by a typed key.
pub fn key_to_register(key: &TerminalKey) -> Option<RegisterSpec> {
    key.get_char().and_then(char_to_register)
}

/// Get the character that names a register.
pub fn register_to_char(reg: &Register, append: bool) -> Option<char> {
    let c = match reg {
        Register::Named(c) if append => c.to_ascii_uppercase(),
        Register::Named(c) => *c,
        Register::RecentlyDeleted(n) if *n < 9 => char::from_digit(*n as u32 + 1, 10)?,
        Register::RecentlyDeleted(_) => return None,

        Register::Unnamed => '"',
        Register::SmallDelete => '-',
        Register::LastCommand => ':',
        Register::LastSearch => '/',
        Register::LastInserted => '.',
        Register::LastYanked => '0',
        Register::AltBufName => '#',
        Register::CurBufName => '%',
        Register::Blackhole => '_',
        Register::SelectionPrimary => '*',
        Register::SelectionClipboard => '+',

        _ => return None,
    };

    Some(c)
}

/// Whether a register can hold a recorded macro.
pub fn is_recordable(reg: &Register) -> bool {
    match reg {
        Register::Named(_) | Register::RecentlyDeleted(_) | Register::LastYanked => true,
        Register::Unnamed => true,
        _ => false,
    }
}
