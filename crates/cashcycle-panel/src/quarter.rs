//! Quarter Codec
//!
//! Parses and formats `YYYYQ#` period labels and maps them onto a dense,
//! zero-based integer index that is shared by the whole panel.

use crate::columns::{Q_INDEX, QUARTER};
use crate::error::{PanelError, Result};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A calendar quarter such as `2020Q3`.
///
/// Ordering is chronological.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Quarter {
    year: i32,
    quarter: u8,
}

impl Quarter {
    /// Create a quarter, `quarter` must be in `1..=4`.
    pub fn new(year: i32, quarter: u8) -> Result<Self> {
        if (1..=4).contains(&quarter) && (0..=9999).contains(&year) {
            Ok(Self { year, quarter })
        } else {
            Err(PanelError::MalformedPeriod(format!("{year}Q{quarter}")))
        }
    }

    /// Parse a label of exactly four digits, `Q`, and a digit 1 to 4.
    pub fn parse(label: &str) -> Result<Self> {
        let malformed = || PanelError::MalformedPeriod(label.to_string());
        let bytes = label.as_bytes();

        if bytes.len() != 6 || bytes[4] != b'Q' || !bytes[..4].iter().all(u8::is_ascii_digit) {
            return Err(malformed());
        }

        let quarter = match bytes[5] {
            d @ b'1'..=b'4' => d - b'0',
            _ => return Err(malformed()),
        };
        let year = label[..4].parse::<i32>().map_err(|_| malformed())?;

        Ok(Self { year, quarter })
    }

    /// Calendar year.
    pub const fn year(&self) -> i32 {
        self.year
    }

    /// Quarter number, 1 to 4.
    pub const fn quarter(&self) -> u8 {
        self.quarter
    }

    /// Absolute position on the quarter line: `year * 4 + (quarter - 1)`.
    pub const fn ordinal(&self) -> i64 {
        self.year as i64 * 4 + (self.quarter as i64 - 1)
    }

    /// Inverse of [`Quarter::ordinal`].
    pub fn from_ordinal(ordinal: i64) -> Result<Self> {
        let year = ordinal.div_euclid(4);
        let quarter = ordinal.rem_euclid(4) + 1;
        let year = i32::try_from(year)
            .map_err(|_| PanelError::MalformedPeriod(format!("ordinal {ordinal}")))?;
        Self::new(year, quarter as u8)
    }

    /// The quarter `n` quarters later (earlier when negative).
    pub fn offset(&self, n: i64) -> Result<Self> {
        Self::from_ordinal(self.ordinal() + n)
    }
}

impl fmt::Display for Quarter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}Q{}", self.year, self.quarter)
    }
}

impl FromStr for Quarter {
    type Err = PanelError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

/// Dense quarter index anchored at the earliest year of a panel.
///
/// `index_of(q) = (q.year - min_year) * 4 + (q.quarter - 1)`, so distances
/// between indices equal distances between quarters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuarterIndex {
    min_year: i32,
}

impl QuarterIndex {
    /// Anchor an index at `min_year`.
    pub const fn new(min_year: i32) -> Self {
        Self { min_year }
    }

    /// Compute the anchor over the full set of labels.
    ///
    /// Returns `Ok(None)` when `labels` is empty.
    pub fn from_labels<'a, I>(labels: I) -> Result<Option<Self>>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut min_year: Option<i32> = None;
        for label in labels {
            let q = Quarter::parse(label)?;
            min_year = Some(min_year.map_or(q.year, |m| m.min(q.year)));
        }
        Ok(min_year.map(Self::new))
    }

    /// Earliest year in the panel.
    pub const fn min_year(&self) -> i32 {
        self.min_year
    }

    /// Index of `quarter`, negative for quarters before the anchor year.
    pub const fn index_of(&self, quarter: &Quarter) -> i64 {
        quarter.ordinal() - self.min_year as i64 * 4
    }
}

/// Parse every label of the `quarter` column.
///
/// A null label is reported as malformed.
pub fn parse_quarter_column(frame: &DataFrame) -> Result<Vec<Quarter>> {
    frame
        .column(QUARTER)?
        .str()?
        .into_iter()
        .map(|label| Quarter::parse(label.unwrap_or_default()))
        .collect()
}

/// Append the `q_index` column (Int64) to `frame`.
///
/// The anchor year is computed once over every row, so the same quarter
/// always maps to the same index.
pub fn add_quarter_index(frame: DataFrame) -> Result<(DataFrame, QuarterIndex)> {
    let labels = frame.column(QUARTER)?.str()?;
    let index = QuarterIndex::from_labels(labels.into_iter().map(Option::unwrap_or_default))?
        .unwrap_or(QuarterIndex::new(0));

    let q_index: Vec<i64> = parse_quarter_column(&frame)?
        .iter()
        .map(|q| index.index_of(q))
        .collect();

    let mut frame = frame;
    frame.with_column(Series::new(Q_INDEX.into(), q_index))?;

    Ok((frame, index))
}
