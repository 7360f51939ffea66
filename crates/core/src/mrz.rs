//! Passport machine-readable zone (ICAO 9303 TD3) parsing.
//!
//! Turns the two 44-character MRZ lines printed at the bottom of a passport
//! data page into a CV prefill. Every check digit is verified; the OCR that
//! produces the text happens elsewhere.

use chrono::{Datelike, NaiveDate};
use serde::Serialize;

use crate::cv::{GENDER_FEMALE, GENDER_MALE};
use crate::error::CoreError;

/// Characters per TD3 line.
pub const TD3_LINE_LEN: usize = 44;

const WEIGHTS: [u32; 3] = [7, 3, 1];

/// Fields extracted from a passport MRZ.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MrzData {
    pub document_type: String,
    pub issuing_country: String,
    pub surname: String,
    pub given_names: String,
    pub passport_number: String,
    pub nationality: String,
    pub date_of_birth: NaiveDate,
    /// `"male"`, `"female"`, or `None` when unspecified (`<` / `X`).
    pub gender: Option<String>,
    pub expiry_date: NaiveDate,
}

impl MrzData {
    /// Given names followed by surname, the way CVs store `full_name`.
    pub fn full_name(&self) -> String {
        if self.given_names.is_empty() {
            self.surname.clone()
        } else {
            format!("{} {}", self.given_names, self.surname)
        }
    }
}

/// Compute the ICAO 9303 check digit for a field.
pub fn check_digit(field: &str) -> Result<u32, CoreError> {
    let mut sum = 0u32;
    for (i, c) in field.chars().enumerate() {
        sum += char_value(c)? * WEIGHTS[i % 3];
    }
    Ok(sum % 10)
}

fn char_value(c: char) -> Result<u32, CoreError> {
    match c {
        '0'..='9' => Ok(c as u32 - '0' as u32),
        'A'..='Z' => Ok(c as u32 - 'A' as u32 + 10),
        '<' => Ok(0),
        other => Err(CoreError::Validation(format!(
            "Invalid MRZ character '{other}'"
        ))),
    }
}

fn verify(field_name: &str, field: &str, digit: char) -> Result<(), CoreError> {
    // An all-filler optional field may carry '<' as its check digit.
    if digit == '<' && field.chars().all(|c| c == '<') {
        return Ok(());
    }
    let expected = check_digit(field)?;
    let actual = digit.to_digit(10).ok_or_else(|| {
        CoreError::Validation(format!("Check digit for {field_name} is not numeric"))
    })?;
    if expected == actual {
        Ok(())
    } else {
        Err(CoreError::Validation(format!(
            "Check digit mismatch for {field_name}"
        )))
    }
}

/// Parse a TD3 MRZ. `today` resolves two-digit birth years.
pub fn parse_td3(text: &str, today: NaiveDate) -> Result<MrzData, CoreError> {
    let lines: Vec<String> = text
        .lines()
        .map(|l| l.chars().filter(|c| !c.is_whitespace()).collect::<String>())
        .filter(|l| !l.is_empty())
        .map(|l| l.to_uppercase())
        .collect();

    let [line1, line2] = lines.as_slice() else {
        return Err(CoreError::Validation(format!(
            "Expected 2 MRZ lines, got {}",
            lines.len()
        )));
    };
    for line in [line1, line2] {
        if line.len() != TD3_LINE_LEN || !line.is_ascii() {
            return Err(CoreError::Validation(format!(
                "MRZ lines must be {TD3_LINE_LEN} ASCII characters"
            )));
        }
    }
    if !line1.starts_with('P') {
        return Err(CoreError::Validation(
            "Not a passport MRZ (first character must be 'P')".into(),
        ));
    }

    let document_type = strip_filler(&line1[0..2]);
    let issuing_country = strip_filler(&line1[2..5]);
    let (surname, given_names) = split_names(&line1[5..]);

    let number = &line2[0..9];
    verify("passport number", number, char_at(line2, 9))?;
    let nationality = strip_filler(&line2[10..13]);
    let dob = &line2[13..19];
    verify("date of birth", dob, char_at(line2, 19))?;
    let sex = char_at(line2, 20);
    let expiry = &line2[21..27];
    verify("expiry date", expiry, char_at(line2, 27))?;
    verify("personal number", &line2[28..42], char_at(line2, 42))?;

    let composite = format!("{}{}{}", &line2[0..10], &line2[13..20], &line2[21..43]);
    verify("composite", &composite, char_at(line2, 43))?;

    let date_of_birth = parse_date(dob, DateKind::Birth, today)?;
    let expiry_date = parse_date(expiry, DateKind::Expiry, today)?;

    let gender = match sex {
        'M' => Some(GENDER_MALE.to_string()),
        'F' => Some(GENDER_FEMALE.to_string()),
        '<' | 'X' => None,
        other => {
            return Err(CoreError::Validation(format!(
                "Invalid sex marker '{other}'"
            )))
        }
    };

    Ok(MrzData {
        document_type,
        issuing_country,
        surname,
        given_names,
        passport_number: strip_filler(number),
        nationality,
        date_of_birth,
        gender,
        expiry_date,
    })
}

enum DateKind {
    Birth,
    Expiry,
}

fn parse_date(yymmdd: &str, kind: DateKind, today: NaiveDate) -> Result<NaiveDate, CoreError> {
    let invalid = || CoreError::Validation(format!("Invalid MRZ date '{yymmdd}'"));
    let yy: i32 = yymmdd[0..2].parse().map_err(|_| invalid())?;
    let mm: u32 = yymmdd[2..4].parse().map_err(|_| invalid())?;
    let dd: u32 = yymmdd[4..6].parse().map_err(|_| invalid())?;

    let century = today.year() / 100 * 100;
    let year = match kind {
        // Birth years in the future belong to the previous century.
        DateKind::Birth if century + yy > today.year() => century - 100 + yy,
        DateKind::Birth => century + yy,
        DateKind::Expiry => century + yy,
    };
    NaiveDate::from_ymd_opt(year, mm, dd).ok_or_else(invalid)
}

fn split_names(field: &str) -> (String, String) {
    let (surname, given) = field.split_once("<<").unwrap_or((field, ""));
    (to_words(surname), to_words(given))
}

fn to_words(field: &str) -> String {
    field
        .split('<')
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

fn strip_filler(field: &str) -> String {
    field.trim_end_matches('<').replace('<', " ")
}

fn char_at(line: &str, idx: usize) -> char {
    line.as_bytes()[idx] as char
}
