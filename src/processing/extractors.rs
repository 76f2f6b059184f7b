// Field extraction for Kenyan national ID cards.
//
// Every field has an ordered list of independent strategies. The selector
// in `strategy.rs` runs them all and keeps the best scoring value, so the
// fallback order lives in the tables below rather than in control flow.

use crate::models::{ExtractedFields, NameParts, OcrText, Sex};
use crate::processing::strategy::{select, Strategy, SCORE_FALLBACK, SCORE_LABELLED, SCORE_LINE};
use crate::processing::text_correction::{
    clean_name_tokens, is_non_name_word, numeric_token, numeric_tokens,
};
use chrono::NaiveDate;
use lazy_static::lazy_static;
use log::debug;
use regex::Regex;
use std::ops::RangeInclusive;

pub const BIRTH_YEARS: RangeInclusive<i32> = 1920..=2015;
pub const ISSUE_YEARS: RangeInclusive<i32> = 2000..=2030;

const ID_DIGITS: RangeInclusive<usize> = 7..=8;
const SERIAL_DIGITS: RangeInclusive<usize> = 8..=9;
const ID_SCAN_LINES: usize = 8;
const SERIAL_SCAN_LINES: usize = 5;
const DATE_WINDOW: usize = 2;

lazy_static! {
    // Only the label is case-insensitive; the capture admits the letters
    // OCR confuses with digits so they can be fixed up afterwards.
    static ref ID_NUMBER_LABEL: Regex = Regex::new(
        r"(?i:\bID\s*(?:NUMBER|NUM|NO)\b\.?|\bOMENS?\b)\s*[:.#\-]?\s*([0-9OIlZSB]{7,8})\b"
    ).unwrap();
    static ref SERIAL_NUMBER_LABEL: Regex = Regex::new(
        r"(?i:\bSERIAL\s*(?:NUMBER|NUM|NO)?\b\.?|\bSEA\s*NOMSER\b)\s*[:.#\-]?\s*([0-9OIlZSB]{8,9})\b"
    ).unwrap();
    static ref ID_WORD: Regex = Regex::new(r"\bID\b").unwrap();
    static ref SERIAL_WORD: Regex = Regex::new(r"(?i)\bSERIAL\b").unwrap();
    // ID label as OCR tends to mangle it: 1D, lD, omens.
    static ref ID_LIKE: Regex = Regex::new(r"(?i)\b[1Il|]D\b|\bOMENS?\b").unwrap();

    static ref SURNAME_LABEL: Regex = Regex::new(r"(?i)\bSURNAME\b").unwrap();
    static ref GIVEN_NAMES_LABEL: Regex = Regex::new(r"(?i)\bGIVEN\s*NAMES?\b").unwrap();
    static ref FULL_NAMES_LABEL: Regex = Regex::new(r"(?i)\bFULL\s*NAMES?\b").unwrap();
    static ref CAPITAL_WORD: Regex = Regex::new(r"^[A-Z][A-Z'\-]+$").unwrap();

    static ref DATE_VALUE: Regex = Regex::new(
        r"(?:^|[^0-9])([0-9OIlZSB]{1,2})\s*[./\- ]\s*([0-9OIlZSB]{1,2})\s*[./\- ]\s*([0-9OIlZSB]{4})\b"
    ).unwrap();
    static ref BIRTH_DATE_LABEL: Regex =
        Regex::new(r"(?i)\bDATE\s*OF\s*BIRTH\b|\bD\.?O\.?B\b").unwrap();
    static ref BIRTH_WORD: Regex = Regex::new(r"(?i)\bBIRTH\b").unwrap();
    static ref ISSUE_DATE_LABEL: Regex =
        Regex::new(r"(?i)\bDATE\s*OF\s*ISSUE\b|\bISSUED\b").unwrap();
    static ref ISSUE_WORD: Regex = Regex::new(r"(?i)\bISSUE\b").unwrap();
    static ref LOCATION_WORD: Regex = Regex::new(r"(?i)\b(?:DISTRICT|PLACE)\b").unwrap();

    static ref SEX_LABEL: Regex = Regex::new(r"(?i)\bSEX\b").unwrap();
    static ref FEMALE_WORD: Regex = Regex::new(r"(?i)\bFEMALE\b").unwrap();
    static ref MALE_WORD: Regex = Regex::new(r"(?i)\bMALE\b").unwrap();

    static ref DISTRICT_LABEL: Regex = Regex::new(r"(?i)\bDISTRICT\s*OF\s*BIRTH\b").unwrap();
    static ref PLACE_OF_ISSUE_LABEL: Regex = Regex::new(r"(?i)\bPLACE\s*OF\s*ISSUE\b").unwrap();
    static ref LETTERS_ONLY: Regex = Regex::new(r"^[A-Za-z\s]+$").unwrap();

    // Any line carrying one of these is a label, never a value.
    static ref FIELD_LABEL: Regex = Regex::new(
        r"(?i)\b(?:SURNAME|GIVEN\s*NAMES?|FULL\s*NAMES?|DATE|BIRTH|D\.?O\.?B|SEX|DISTRICT|PLACE|ISSUE|ISSUED|SERIAL|ID\s*(?:NUMBER|NO)|SIGNATURE|HOLDER'?S?|NATIONALITY)\b"
    ).unwrap();
}

pub static ID_NUMBER_STRATEGIES: [Strategy<String>; 3] = [
    Strategy { name: "id-label", score: SCORE_LABELLED, run: id_from_label },
    Strategy { name: "id-line", score: SCORE_LINE, run: id_from_id_line },
    Strategy { name: "id-top-lines", score: SCORE_FALLBACK, run: id_from_top_lines },
];

pub static SERIAL_NUMBER_STRATEGIES: [Strategy<String>; 3] = [
    Strategy { name: "serial-label", score: SCORE_LABELLED, run: serial_from_label },
    Strategy { name: "serial-line", score: SCORE_LINE, run: serial_from_serial_line },
    Strategy { name: "serial-top-lines", score: SCORE_FALLBACK, run: serial_from_top_lines },
];

pub static NAME_STRATEGIES: [Strategy<NameParts>; 3] = [
    Strategy { name: "surname-given-layout", score: SCORE_LABELLED, run: names_from_surname_layout },
    Strategy { name: "full-names-layout", score: SCORE_LABELLED, run: names_from_full_names_layout },
    Strategy { name: "capital-run", score: SCORE_FALLBACK, run: names_from_capital_run },
];

pub static BIRTH_DATE_STRATEGIES: [Strategy<String>; 2] = [
    Strategy { name: "birth-label", score: SCORE_LABELLED, run: birth_date_from_label },
    Strategy { name: "birth-anywhere", score: SCORE_FALLBACK, run: birth_date_anywhere },
];

pub static ISSUE_DATE_STRATEGIES: [Strategy<String>; 2] = [
    Strategy { name: "issue-label", score: SCORE_LABELLED, run: issue_date_from_label },
    Strategy { name: "issue-anywhere", score: SCORE_FALLBACK, run: issue_date_anywhere },
];

pub static SEX_STRATEGIES: [Strategy<Sex>; 2] = [
    Strategy { name: "sex-label", score: SCORE_LABELLED, run: sex_from_label },
    Strategy { name: "sex-anywhere", score: SCORE_FALLBACK, run: sex_anywhere },
];

pub static DISTRICT_STRATEGIES: [Strategy<String>; 2] = [
    Strategy { name: "district-next-line", score: SCORE_LABELLED, run: district_from_next_line },
    Strategy { name: "district-inline", score: SCORE_LINE, run: district_inline },
];

pub static PLACE_OF_ISSUE_STRATEGIES: [Strategy<String>; 2] = [
    Strategy { name: "place-next-line", score: SCORE_LABELLED, run: place_from_next_line },
    Strategy { name: "place-inline", score: SCORE_LINE, run: place_inline },
];

pub struct FieldExtractor;

impl FieldExtractor {
    /// Run every field's strategies over the same text.
    pub fn extract_all(text: &OcrText) -> ExtractedFields {
        let id_number = Self::extract_id_number(text);
        let mut serial_number = Self::extract_serial_number(text);
        if serial_number.is_some() && serial_number == id_number {
            debug!("Serial number equals ID number, dropping serial");
            serial_number = None;
        }

        ExtractedFields {
            id_number,
            serial_number,
            names: Self::extract_names(text),
            date_of_birth: Self::extract_date_of_birth(text),
            date_of_issue: Self::extract_date_of_issue(text),
            sex: Self::extract_sex(text),
            district_of_birth: Self::extract_district_of_birth(text),
            place_of_issue: Self::extract_place_of_issue(text),
        }
    }

    pub fn extract_id_number(text: &OcrText) -> Option<String> {
        select("id_number", &ID_NUMBER_STRATEGIES, text).map(|c| c.value)
    }

    pub fn extract_serial_number(text: &OcrText) -> Option<String> {
        select("serial_number", &SERIAL_NUMBER_STRATEGIES, text).map(|c| c.value)
    }

    pub fn extract_names(text: &OcrText) -> Option<NameParts> {
        select("names", &NAME_STRATEGIES, text).map(|c| c.value)
    }

    pub fn extract_date_of_birth(text: &OcrText) -> Option<String> {
        select("date_of_birth", &BIRTH_DATE_STRATEGIES, text).map(|c| c.value)
    }

    pub fn extract_date_of_issue(text: &OcrText) -> Option<String> {
        select("date_of_issue", &ISSUE_DATE_STRATEGIES, text).map(|c| c.value)
    }

    pub fn extract_sex(text: &OcrText) -> Option<Sex> {
        select("sex", &SEX_STRATEGIES, text).map(|c| c.value)
    }

    pub fn extract_district_of_birth(text: &OcrText) -> Option<String> {
        select("district_of_birth", &DISTRICT_STRATEGIES, text).map(|c| c.value)
    }

    pub fn extract_place_of_issue(text: &OcrText) -> Option<String> {
        select("place_of_issue", &PLACE_OF_ISSUE_STRATEGIES, text).map(|c| c.value)
    }
}

fn is_label_line(line: &str) -> bool {
    FIELD_LABEL.is_match(line)
}

// ---- ID number ----

fn id_from_label(text: &OcrText) -> Option<String> {
    ID_NUMBER_LABEL
        .captures_iter(&text.full_text)
        .filter_map(|caps| numeric_token(&caps[1]))
        .find(|digits| ID_DIGITS.contains(&digits.len()))
}

fn id_from_id_line(text: &OcrText) -> Option<String> {
    text.lines
        .iter()
        .filter(|line| ID_WORD.is_match(line) && !SERIAL_WORD.is_match(line))
        .find_map(|line| numeric_tokens(line, ID_DIGITS).into_iter().next())
}

// Nine digit serial candidates never pass the ID length filter, so an
// eight digit value is kept here even when the serial strategies took it.
fn id_from_top_lines(text: &OcrText) -> Option<String> {
    text.lines
        .iter()
        .take(ID_SCAN_LINES)
        .flat_map(|line| numeric_tokens(line, ID_DIGITS))
        .next()
}

// ---- Serial number ----

fn serial_from_label(text: &OcrText) -> Option<String> {
    SERIAL_NUMBER_LABEL
        .captures_iter(&text.full_text)
        .filter_map(|caps| numeric_token(&caps[1]))
        .find(|digits| SERIAL_DIGITS.contains(&digits.len()))
}

fn serial_from_serial_line(text: &OcrText) -> Option<String> {
    let index = text.lines.iter().position(|line| SERIAL_WORD.is_match(line))?;
    text.lines[index..]
        .iter()
        .take(2)
        .enumerate()
        .find_map(|(offset, line)| {
            let tokens = numeric_tokens(line, SERIAL_DIGITS);
            // A nine digit token is the serial even when an eight digit
            // ID number shares the line.
            let nine = tokens.iter().find(|digits| digits.len() == 9);
            // On the next line an eight digit token under an ID label is the ID.
            if offset > 0 && ID_LIKE.is_match(line) {
                return nine.cloned();
            }
            nine.or_else(|| tokens.first()).cloned()
        })
}

fn serial_from_top_lines(text: &OcrText) -> Option<String> {
    text.lines
        .iter()
        .take(SERIAL_SCAN_LINES)
        .flat_map(|line| numeric_tokens(line, 9..=9))
        .next()
}

// ---- Names ----

/// Name tokens for the label on `lines[index]`: the rest of the label
/// line, or else the next line when it is not another label. Returns the
/// tokens and the index of the last line consumed.
fn name_value_at(lines: &[String], index: usize, label: &Regex) -> Option<(Vec<String>, usize)> {
    let line = &lines[index];
    if let Some(found) = label.find(line) {
        let inline = clean_name_tokens(&line[found.end()..]);
        if !inline.is_empty() {
            return Some((inline, index));
        }
    }
    let next = lines.get(index + 1)?;
    if is_label_line(next) {
        return None;
    }
    let tokens = clean_name_tokens(next);
    if tokens.is_empty() {
        None
    } else {
        Some((tokens, index + 1))
    }
}

/// Tokens of the line after `index` when it reads as a wrapped name.
fn name_continuation(lines: &[String], index: usize) -> Vec<String> {
    match lines.get(index + 1) {
        Some(next) if !is_label_line(next) => {
            let tokens = clean_name_tokens(next);
            if tokens.iter().all(|t| t.chars().count() >= 2) {
                tokens
            } else {
                Vec::new()
            }
        }
        _ => Vec::new(),
    }
}

fn names_from_surname_layout(text: &OcrText) -> Option<NameParts> {
    let lines = &text.lines;
    let surname_index = lines.iter().position(|l| SURNAME_LABEL.is_match(l))?;
    let surname = name_value_at(lines, surname_index, &SURNAME_LABEL)
        .map(|(tokens, _)| tokens)
        .unwrap_or_default();

    let mut given = Vec::new();
    if let Some(given_index) = lines.iter().position(|l| GIVEN_NAMES_LABEL.is_match(l)) {
        if let Some((tokens, last)) = name_value_at(lines, given_index, &GIVEN_NAMES_LABEL) {
            given = tokens;
            let more = name_continuation(lines, last);
            if given.len() + more.len() <= 4 {
                given.extend(more);
            }
        }
    }

    NameParts::from_given_and_surname(&given, &surname)
}

fn names_from_full_names_layout(text: &OcrText) -> Option<NameParts> {
    let lines = &text.lines;
    let index = lines.iter().position(|l| FULL_NAMES_LABEL.is_match(l))?;
    let (mut tokens, last) = name_value_at(lines, index, &FULL_NAMES_LABEL)?;
    if tokens.len() < 3 {
        let more = name_continuation(lines, last);
        if tokens.len() + more.len() <= 4 {
            tokens.extend(more);
        }
    }
    NameParts::from_tokens(&tokens)
}

fn names_from_capital_run(text: &OcrText) -> Option<NameParts> {
    for line in &text.lines {
        let mut run: Vec<String> = Vec::new();
        for raw in line.split_whitespace() {
            let token = raw.trim_matches(|c: char| !c.is_alphabetic());
            if CAPITAL_WORD.is_match(token) && !is_non_name_word(token) {
                run.push(token.to_string());
                if run.len() == 4 {
                    break;
                }
            } else if run.len() >= 2 {
                break;
            } else {
                run.clear();
            }
        }
        if run.len() >= 2 {
            return NameParts::from_tokens(&run);
        }
    }
    None
}

// ---- Dates ----

/// First calendar-valid date in `line` whose year is in `years`, as
/// `YYYY-MM-DD`.
fn date_in_line(line: &str, years: &RangeInclusive<i32>) -> Option<String> {
    DATE_VALUE.captures_iter(line).find_map(|caps| {
        let day: u32 = numeric_token(&caps[1])?.parse().ok()?;
        let month: u32 = numeric_token(&caps[2])?.parse().ok()?;
        let year: i32 = numeric_token(&caps[3])?.parse().ok()?;
        if !years.contains(&year) {
            debug!("Discarding date {}.{}.{} outside {:?}", day, month, year, years);
            return None;
        }
        NaiveDate::from_ymd_opt(year, month, day).map(|d| d.format("%Y-%m-%d").to_string())
    })
}

/// Index of the label line for a date: strong labels first, then the
/// bare keyword on a line that is not a district/place label.
fn date_label_index(lines: &[String], strong: &Regex, weak: &Regex) -> Option<usize> {
    lines.iter().position(|l| strong.is_match(l)).or_else(|| {
        lines
            .iter()
            .position(|l| weak.is_match(l) && !LOCATION_WORD.is_match(l))
    })
}

/// Search the label line and the next lines, stopping at the label of the
/// other date.
fn date_near_label(
    lines: &[String],
    index: usize,
    other_label: &Regex,
    years: &RangeInclusive<i32>,
) -> Option<String> {
    lines
        .iter()
        .enumerate()
        .skip(index)
        .take(DATE_WINDOW + 1)
        .take_while(|(i, line)| *i == index || !other_label.is_match(line))
        .find_map(|(_, line)| date_in_line(line, years))
}

fn birth_date_from_label(text: &OcrText) -> Option<String> {
    let index = date_label_index(&text.lines, &BIRTH_DATE_LABEL, &BIRTH_WORD)?;
    date_near_label(&text.lines, index, &ISSUE_WORD, &BIRTH_YEARS)
}

fn birth_date_anywhere(text: &OcrText) -> Option<String> {
    if date_label_index(&text.lines, &BIRTH_DATE_LABEL, &BIRTH_WORD).is_some() {
        return None;
    }
    text.lines.iter().find_map(|line| date_in_line(line, &BIRTH_YEARS))
}

fn issue_date_from_label(text: &OcrText) -> Option<String> {
    let index = date_label_index(&text.lines, &ISSUE_DATE_LABEL, &ISSUE_WORD)?;
    date_near_label(&text.lines, index, &BIRTH_WORD, &ISSUE_YEARS)
}

fn issue_date_anywhere(text: &OcrText) -> Option<String> {
    if date_label_index(&text.lines, &ISSUE_DATE_LABEL, &ISSUE_WORD).is_some() {
        return None;
    }
    text.lines.iter().find_map(|line| date_in_line(line, &ISSUE_YEARS))
}

// ---- Sex ----

fn sex_in(line: &str) -> Option<Sex> {
    // FEMALE contains MALE, so it has to be tested first.
    if FEMALE_WORD.is_match(line) {
        Some(Sex::Female)
    } else if MALE_WORD.is_match(line) {
        Some(Sex::Male)
    } else {
        None
    }
}

fn sex_from_label(text: &OcrText) -> Option<Sex> {
    let index = text.lines.iter().position(|l| SEX_LABEL.is_match(l))?;
    text.lines[index..].iter().take(2).find_map(|line| sex_in(line))
}

fn sex_anywhere(text: &OcrText) -> Option<Sex> {
    sex_in(&text.full_text)
}

// ---- District of birth / place of issue ----

fn place_name(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || !LETTERS_ONLY.is_match(trimmed) || is_label_line(trimmed) {
        return None;
    }
    Some(
        trimmed
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
            .to_uppercase(),
    )
}

fn value_on_next_line(text: &OcrText, label: &Regex) -> Option<String> {
    let index = text.lines.iter().position(|l| label.is_match(l))?;
    place_name(text.lines.get(index + 1)?)
}

fn value_after_label(text: &OcrText, label: &Regex) -> Option<String> {
    text.lines.iter().find_map(|line| {
        let found = label.find(line)?;
        place_name(line[found.end()..].trim_start_matches(|c: char| c == ':' || c.is_whitespace()))
    })
}

fn district_from_next_line(text: &OcrText) -> Option<String> {
    value_on_next_line(text, &DISTRICT_LABEL)
}

fn district_inline(text: &OcrText) -> Option<String> {
    value_after_label(text, &DISTRICT_LABEL)
}

fn place_from_next_line(text: &OcrText) -> Option<String> {
    value_on_next_line(text, &PLACE_OF_ISSUE_LABEL)
}

fn place_inline(text: &OcrText) -> Option<String> {
    value_after_label(text, &PLACE_OF_ISSUE_LABEL)
}
