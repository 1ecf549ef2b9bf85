use std::borrow::Borrow;

use radix_trie::{SubTrie, Trie, TrieCommon, TrieKey};

#[allow(unused_macros)]
macro_rules! key {
    ($ch: literal) => {
        $crate::key::TerminalKey::from($ch)
    };
    ($kc: expr) => {
        $crate::key::TerminalKey::from($kc)
    };
    ($kc: expr, $km: expr) => {
        $crate::key::TerminalKey::new($kc, $km)
    };
}

#[allow(unused_macros)]
macro_rules! ctl {
    ($ch: literal) => {
        key!(
            crossterm::event::KeyCode::Char($ch.to_ascii_lowercase()),
            crossterm::event::KeyModifiers::CONTROL
        )
    };
}

#[allow(unused_macros)]
macro_rules! keys {
    ($s: expr) => {
        $crate::key::parse_keys($s).unwrap()
    };
}

#[allow(unused_macros)]
macro_rules! strs {
    ( $( $ss: expr ),* ) => {
        vec![ $( String::from($ss), )* ]
    };
}

/// Internal upper limit on number of completions to return.
pub(crate) const MAX_COMPLETIONS: usize = 500;

#[inline]
pub(crate) fn subtrie_keys<K, V>(subtrie: SubTrie<K, V>) -> Vec<K>
where
    K: Clone + TrieKey,
{
    subtrie.keys().take(MAX_COMPLETIONS).cloned().collect()
}

#[inline]
pub(crate) fn completion_keys<K, V>(trie: &Trie<K, V>, prefix: &str) -> Vec<K>
where
    K: Borrow<str> + Clone + TrieKey,
{
    let mut keys = trie.get_raw_descendant(prefix).map(subtrie_keys).unwrap_or_default();

    // The closest descendant can have keys that only share part of the prefix.
    keys.retain(|k| k.borrow().starts_with(prefix));
    keys
}

/// Append a typed digit to a count.
#[inline]
pub(crate) fn push_digit(count: usize, digit: usize) -> usize {
    count.saturating_mul(10).saturating_add(digit)
}
