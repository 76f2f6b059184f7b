// OCR clean-up shared by the field extractors

use lazy_static::lazy_static;
use std::collections::HashSet;

lazy_static! {
    /// Words printed on the card itself that never belong to a holder's name.
    pub static ref NON_NAME_WORDS: HashSet<&'static str> = [
        "REPUBLIC", "OF", "KENYA", "KENYAN", "JAMHURI", "YA", "THE", "AND",
        "NATIONAL", "IDENTITY", "IDENTIFICATION", "CARD", "KITAMBULISHO", "CHA", "TAIFA",
        "ID", "NO", "NUMBER", "SERIAL", "FULL", "NAMES", "NAME", "SURNAME", "GIVEN",
        "DATE", "BIRTH", "DOB", "SEX", "MALE", "FEMALE", "DISTRICT", "PLACE", "ISSUE",
        "ISSUED", "EXPIRY", "HOLDER", "HOLDERS", "SIGN", "SIGNATURE", "PRINCIPAL",
        "REGISTRAR", "NATIONALITY", "CITIZEN", "COUNTY", "LOCATION", "DIVISION",
        "SUB", "OFFICE", "HUDUMA", "NAMBA",
    ]
    .into_iter()
    .collect();
}

/// Map letters OCR commonly reads in place of digits back to digits.
///
/// None of the outputs is itself a source character, so applying this
/// twice is the same as applying it once.
pub fn fix_digits(text: &str) -> String {
    text.chars()
        .map(|c| match c {
            'O' => '0',
            'I' | 'l' => '1',
            'Z' => '2',
            'S' => '5',
            'B' => '8',
            _ => c,
        })
        .collect()
}

/// Read a whitespace token as a number, tolerating OCR letter swaps.
///
/// Surrounding punctuation is stripped. The token must be mostly real
/// digits already so words like `SOB` are not turned into numbers.
pub fn numeric_token(token: &str) -> Option<String> {
    let trimmed = token.trim_matches(|c: char| !c.is_alphanumeric());
    if trimmed.is_empty() {
        return None;
    }
    let real_digits = trimmed.chars().filter(|c| c.is_ascii_digit()).count();
    if real_digits * 2 < trimmed.chars().count() {
        return None;
    }
    let fixed = fix_digits(trimmed);
    if fixed.chars().all(|c| c.is_ascii_digit()) {
        Some(fixed)
    } else {
        None
    }
}

/// All numeric tokens of a line with a digit count in `lengths`.
pub fn numeric_tokens(line: &str, lengths: std::ops::RangeInclusive<usize>) -> Vec<String> {
    line.split_whitespace()
        .filter_map(numeric_token)
        .filter(|digits| lengths.contains(&digits.len()))
        .collect()
}

/// Normalize a name fragment into upper-case tokens.
///
/// Keeps letters, apostrophes and hyphens, collapses whitespace and drops
/// card vocabulary listed in [`NON_NAME_WORDS`].
pub fn clean_name_tokens(raw: &str) -> Vec<String> {
    let letters_only: String = raw
        .chars()
        .map(|c| {
            if c.is_alphabetic() || c == '\'' || c == '-' {
                c
            } else {
                ' '
            }
        })
        .collect();

    letters_only
        .split_whitespace()
        .map(|token| token.trim_matches(|c| c == '\'' || c == '-').to_uppercase())
        .filter(|token| !token.is_empty() && !is_non_name_word(token))
        .collect()
}

pub fn is_non_name_word(token: &str) -> bool {
    NON_NAME_WORDS.contains(token.to_uppercase().as_str())
}
