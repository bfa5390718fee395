//! Sample metadata encoded in histogram names.
//!
//! Two naming conventions are in use:
//!
//! * [`NamingConvention::TokenCount`] (default): `_` separated tokens,
//!   `date_Te%_PPO_ratio_A` (5 tokens), `date_Te%_PPO_A` (4 tokens, blank sample)
//!   or `date_LAB` (2 tokens, pure reference sample).
//! * [`NamingConvention::Suffix`]: the date is taken from the digits of the first
//!   8 characters, concentration and label from whatever follows the last `_`.
//!
//! One convention is applied to a whole batch; they are never mixed.

use chrono::NaiveDate;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::error::{AnalysisError, Result};

/// Label given to every pure reference (no stabiliser) sample.
pub const PURE_SAMPLE_LABEL: &str = "Pure_LAB";
/// Concentration assigned to blank samples.
pub const BLANK_CONCENTRATION: &str = "0.0";
/// Concentration of pure reference samples. Full records must carry digits in
/// their ratio field so they never collide with this.
pub const PURE_CONCENTRATION: &str = "";

/// A chrono format plus the digit group widths (split on `-`) it accepts.
/// chrono alone reads `%y` as 1-2 digits and `%Y` as any width.
struct DateFormat {
    format: &'static str,
    groups: &'static [usize],
}

const TOKEN_DATE_FORMATS: [DateFormat; 4] = [
    DateFormat { format: "%d%m%y", groups: &[6] },
    DateFormat { format: "%d%m%Y", groups: &[8] },
    DateFormat { format: "%d-%m-%y", groups: &[2, 2, 2] },
    DateFormat { format: "%d-%m-%Y", groups: &[2, 2, 4] },
];
const DIGIT_DATE_FORMATS: [DateFormat; 2] = [
    DateFormat { format: "%d%m%y", groups: &[6] },
    DateFormat { format: "%d%m%Y", groups: &[8] },
];

const TOKEN_PATTERN: &str = "date_Te%_PPO_ratio_A/B, date_Te%_PPO_A/B or date_LAB";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum NamingConvention {
    #[default]
    TokenCount,
    Suffix,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SampleMeta {
    pub date: NaiveDate,
    pub concentration: String,
    pub sample_label: String,
    pub identifier: String,
}

impl SampleMeta {
    fn new(date: NaiveDate, concentration: String, sample_label: String) -> Self {
        let identifier = format!("{concentration}{sample_label}");
        SampleMeta {
            date,
            concentration,
            sample_label,
            identifier,
        }
    }

    /// Pure reference samples carry no concentration at all.
    pub fn is_pure(&self) -> bool {
        self.concentration == PURE_CONCENTRATION
    }
}

impl NamingConvention {
    pub fn parse(&self, name: &str) -> Result<SampleMeta> {
        match self {
            NamingConvention::TokenCount => parse_token_count(name),
            NamingConvention::Suffix => parse_suffix(name),
        }
    }
}

fn parse_token_count(name: &str) -> Result<SampleMeta> {
    let tokens = name.split('_').collect::<Vec<_>>();

    let naming_error = || AnalysisError::NamingConvention {
        name: name.to_owned(),
        expected: TOKEN_PATTERN,
    };

    let date = match tokens.len() {
        5 | 4 | 2 => parse_date(name, tokens[0], &TOKEN_DATE_FORMATS)?,
        _ => return Err(naming_error()),
    };

    let last = tokens[tokens.len() - 1];
    let (concentration, sample_label) = match tokens.len() {
        5 => match digits_as_decimal(tokens[3]) {
            digits if digits.is_empty() => return Err(naming_error()),
            digits => (digits, last.to_owned()),
        },
        4 => (BLANK_CONCENTRATION.to_owned(), last.to_owned()),
        _ => (PURE_CONCENTRATION.to_owned(), PURE_SAMPLE_LABEL.to_owned()),
    };

    Ok(SampleMeta::new(date, concentration, sample_label))
}

fn parse_suffix(name: &str) -> Result<SampleMeta> {
    let date = {
        let head = name.chars().take(8).collect::<String>();
        let digits = head.chars().filter(char::is_ascii_digit).collect::<String>();
        parse_date(name, &digits, &DIGIT_DATE_FORMATS)?
    };

    let suffix = name.rsplit('_').next().unwrap_or(name);
    let Some(sample_label) = suffix.chars().last() else {
        return Err(AnalysisError::NamingConvention {
            name: name.to_owned(),
            expected: "date..._<ratio><label>",
        });
    };

    let concentration = match digits_as_decimal(suffix) {
        digits if digits.is_empty() => BLANK_CONCENTRATION.to_owned(),
        digits => digits,
    };

    Ok(SampleMeta::new(date, concentration, sample_label.to_string()))
}

fn parse_date(name: &str, input: &str, formats: &[DateFormat]) -> Result<NaiveDate> {
    let groups = input.split('-').collect::<Vec<_>>();
    let all_digits = groups
        .iter()
        .all(|group| group.chars().all(|ch| ch.is_ascii_digit()));

    formats
        .iter()
        .filter(|date_format| {
            all_digits
                && groups.len() == date_format.groups.len()
                && groups
                    .iter()
                    .zip(date_format.groups)
                    .all(|(group, width)| group.len() == *width)
        })
        .find_map(|date_format| NaiveDate::parse_from_str(input, date_format.format).ok())
        .ok_or_else(|| AnalysisError::MetadataParse {
            name: name.to_owned(),
            input: input.to_owned(),
            tried: formats
                .iter()
                .map(|date_format| date_format.format)
                .collect::<Vec<_>>()
                .join(", "),
        })
}

/// Runs of digits joined with `.`: `"2p5"` -> `"2.5"`, `"12"` -> `"12"`.
fn digits_as_decimal(field: &str) -> String {
    let mut groups: Vec<String> = vec![];
    let mut in_digits = false;
    for ch in field.chars() {
        if ch.is_ascii_digit() {
            if !in_digits {
                groups.push(String::new());
            }
            if let Some(group) = groups.last_mut() {
                group.push(ch);
            }
            in_digits = true;
        } else {
            in_digits = false;
        }
    }
    groups.join(".")
}
