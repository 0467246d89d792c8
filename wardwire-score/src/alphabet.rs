//! The 62-symbol challenge alphabet and secret generation.

use rand::Rng;

/// Challenge alphabet: A–Z, a–z, 0–9, in that order.
pub const ALPHABET: &str = "ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";

/// Number of symbols in the alphabet.
pub const ALPHABET_LEN: usize = 62;

/// Fixed challenge secret length.
pub const SECRET_LEN: usize = 16;

/// Index of a symbol in the alphabet, or `None` for anything else.
pub fn symbol_index(c: char) -> Option<usize> {
    match c {
        'A'..='Z' => Some(c as usize - 'A' as usize),
        'a'..='z' => Some(c as usize - 'a' as usize + 26),
        '0'..='9' => Some(c as usize - '0' as usize + 52),
        _ => None,
    }
}

/// Symbol at an alphabet index. The index is taken mod [`ALPHABET_LEN`], so
/// shifted-index arithmetic can feed in directly.
pub fn symbol_at(index: usize) -> char {
    let index = index % ALPHABET_LEN;
    // The alphabet is pure ASCII, one byte per symbol.
    ALPHABET.as_bytes()[index] as char
}

/// True iff every character of `s` is an alphabet symbol.
pub fn is_well_formed(s: &str) -> bool {
    s.chars().all(|c| symbol_index(c).is_some())
}

/// Draw a uniformly random secret of `len` symbols.
pub fn generate_secret(rng: &mut impl Rng, len: usize) -> String {
    (0..len)
        .map(|_| symbol_at(rng.gen_range(0..ALPHABET_LEN)))
        .collect()
}
