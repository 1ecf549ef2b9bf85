use std::ops::BitOr;

use crossterm::event::{KeyCode, KeyModifiers};

use nom::{
    branch::alt,
    bytes::complete::{tag_no_case, take_while1},
    character::complete::{anychar, char, digit1},
    combinator::{eof, map_opt, map_res, value},
    multi::{many0, many1},
    sequence::preceded,
    IResult,
};

use super::TerminalKey;

/// Names understood inside of `<...>`, matched without regard to case.
const KEY_NAMES: &[(&str, KeyCode)] = &[
    ("Left", KeyCode::Left),
    ("Right", KeyCode::Right),
    ("Up", KeyCode::Up),
    ("Down", KeyCode::Down),
    ("PageUp", KeyCode::PageUp),
    ("PageDown", KeyCode::PageDown),
    ("Home", KeyCode::Home),
    ("End", KeyCode::End),
    ("Insert", KeyCode::Insert),
    ("Ins", KeyCode::Insert),
    ("Delete", KeyCode::Delete),
    ("Del", KeyCode::Delete),
    ("Esc", KeyCode::Esc),
    ("Tab", KeyCode::Tab),
    ("BS", KeyCode::Backspace),
    ("BackSpace", KeyCode::Backspace),
    ("CR", KeyCode::Enter),
    ("Return", KeyCode::Enter),
    ("Enter", KeyCode::Enter),
    ("NL", KeyCode::Char('\n')),
    ("NewLine", KeyCode::Char('\n')),
    ("LineFeed", KeyCode::Char('\n')),
    ("LF", KeyCode::Char('\n')),
    ("Nul", KeyCode::Null),
    ("Space", KeyCode::Char(' ')),
    ("Bar", KeyCode::Char('|')),
    ("Bslash", KeyCode::Char('\\')),
    ("lt", KeyCode::Char('<')),
    ("Pause", KeyCode::Pause),
    ("PrintScreen", KeyCode::PrintScreen),
    ("Undo", KeyCode::F(14)),
    ("Help", KeyCode::F(15)),
];

fn lookup_name(name: &str) -> Option<KeyCode> {
    KEY_NAMES
        .iter()
        .find(|(n, _)| n.eq_ignore_ascii_case(name))
        .map(|(_, code)| *code)
}

fn parse_modifier(input: &str) -> IResult<&str, KeyModifiers> {
    alt((
        value(KeyModifiers::ALT, tag_no_case("A-")),
        value(KeyModifiers::ALT, tag_no_case("M-")),
        value(KeyModifiers::CONTROL, tag_no_case("C-")),
        value(KeyModifiers::SHIFT, tag_no_case("S-")),
    ))(input)
}

fn parse_function(input: &str) -> IResult<&str, KeyCode> {
    let (input, n) = preceded(
        alt((char('F'), char('f'))),
        map_res(digit1, |s: &str| s.parse::<u8>()),
    )(input)?;

    Ok((input, KeyCode::F(n)))
}

fn parse_keyname(input: &str) -> IResult<&str, KeyCode> {
    map_opt(take_while1(|c: char| c.is_ascii_alphanumeric()), lookup_name)(input)
}

fn parse_anychar(input: &str) -> IResult<&str, KeyCode> {
    let (input, c) = anychar(input)?;

    Ok((input, KeyCode::Char(c)))
}

/// Apply the modifiers from a `<...>` to a plain character.
fn modify_char(c: char, mut m: KeyModifiers) -> TerminalKey {
    if m.contains(KeyModifiers::CONTROL) {
        m -= KeyModifiers::SHIFT;

        return match c.to_ascii_lowercase() {
            'i' if m == KeyModifiers::CONTROL => TerminalKey::from(KeyCode::Tab),
            'j' if m == KeyModifiers::CONTROL => TerminalKey::from(KeyCode::Char('\n')),
            'm' if m == KeyModifiers::CONTROL => TerminalKey::from(KeyCode::Enter),
            '[' if m == KeyModifiers::CONTROL => TerminalKey::from(KeyCode::Esc),
            '?' => TerminalKey::from(KeyCode::Backspace),
            '\\' => TerminalKey::new(KeyCode::Char('4'), m),
            ']' => TerminalKey::new(KeyCode::Char('5'), m),
            '^' => TerminalKey::new(KeyCode::Char('6'), m),
            '_' => TerminalKey::new(KeyCode::Char('7'), m),
            '@' => TerminalKey::new(KeyCode::Char(' '), m),
            c => TerminalKey::new(KeyCode::Char(c), m),
        };
    }

    let c = if m.contains(KeyModifiers::SHIFT) {
        c.to_ascii_uppercase()
    } else {
        c
    };

    TerminalKey::new(KeyCode::Char(c), m)
}

pub fn parse_special(input: &str) -> IResult<&str, TerminalKey> {
    let (input, _) = char('<')(input)?;
    let (input, m) = many0(parse_modifier)(input)?;
    let (input, k) = alt((parse_keyname, parse_function, parse_anychar))(input)?;
    let (input, _) = char('>')(input)?;

    let m = m.into_iter().fold(KeyModifiers::NONE, BitOr::bitor);

    let key = match k {
        KeyCode::Char(c) => modify_char(c, m),
        KeyCode::Tab if m == KeyModifiers::SHIFT => TerminalKey::from(KeyCode::BackTab),
        k => TerminalKey::new(k, m),
    };

    Ok((input, key))
}

pub fn parse_simple(input: &str) -> IResult<&str, TerminalKey> {
    let (input, c) = anychar(input)?;

    Ok((input, TerminalKey::from(KeyCode::Char(c))))
}

pub fn parse_key_str(input: &str) -> IResult<&str, TerminalKey> {
    let (input, res) = alt((parse_special, parse_simple))(input)?;
    let (input, _) = eof(input)?;

    Ok((input, res))
}

pub fn parse_macro_str(input: &str) -> IResult<&str, Vec<TerminalKey>> {
    let (input, res) = many1(alt((parse_special, parse_simple)))(input)?;
    let (input, _) = eof(input)?;

    Ok((input, res))
}
