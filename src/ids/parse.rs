//! Parsing of formatted identifiers back into their parts.
//!
//! Accepts only the canonical rendering: exact prefix, the date segment the
//! sequence uses, and a number padded to exactly the sequence width (or
//! wider without leading zeros).

use chrono::{Datelike, NaiveDate};
use serde::Serialize;

use super::error::IdError;
use super::sequence::{DateComponent, Sequence};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParsedIdentifier {
    pub sequence: Sequence,
    pub year: Option<i32>,
    pub date: Option<NaiveDate>,
    pub value: u64,
}

pub fn parse_identifier(input: &str) -> Result<ParsedIdentifier, IdError> {
    let invalid = || IdError::InvalidIdentifier(input.to_string());

    let mut parts = input.split('-');
    let prefix = parts.next().ok_or_else(invalid)?;
    let sequence = Sequence::from_prefix(prefix).ok_or_else(invalid)?;
    let format = sequence.format();

    let (year, date) = match format.date {
        DateComponent::None => (None, None),
        DateComponent::Year => {
            let segment = parts.next().ok_or_else(invalid)?;
            if segment.len() != 4 || !all_digits(segment) {
                return Err(invalid());
            }
            let year: i32 = segment.parse().map_err(|_| invalid())?;
            (Some(year), None)
        }
        DateComponent::Date => {
            let segment = parts.next().ok_or_else(invalid)?;
            if segment.len() != 8 || !all_digits(segment) {
                return Err(invalid());
            }
            let date = NaiveDate::parse_from_str(segment, "%Y%m%d").map_err(|_| invalid())?;
            (Some(date.year()), Some(date))
        }
    };

    let number = parts.next().ok_or_else(invalid)?;
    if parts.next().is_some() || !all_digits(number) {
        return Err(invalid());
    }
    let value: u64 = number.parse().map_err(|_| invalid())?;
    let width = format.width;
    if value == 0 || format!("{value:0width$}") != number {
        return Err(invalid());
    }

    Ok(ParsedIdentifier {
        sequence,
        year,
        date,
        value,
    })
}

fn all_digits(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}
