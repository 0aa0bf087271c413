//! Data structures parsed from dataset file names
//!
//! File names follow `<subject>_<role>_<laterality>_<date>.<ext>`, e.g.
//! `10231_FP_OS_20190412.png` pairs with `10231_HVF_OS_20190412.png`.

use chrono::NaiveDate;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use crate::error::Error;

/// Token separator used in every dataset file name
pub const DELIMITER: char = '_';

/// Which eye an image was taken of
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Laterality {
    /// Oculus sinister, coded `OS`
    Left,
    /// Oculus dexter, coded `OD`
    Right,
}

impl Laterality {
    /// Code used in file names
    pub fn code(&self) -> &'static str {
        match self {
            Laterality::Left => "OS",
            Laterality::Right => "OD",
        }
    }
}

impl FromStr for Laterality {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "OS" => Ok(Laterality::Left),
            "OD" => Ok(Laterality::Right),
            other => Err(format!("unknown laterality {other:?}, expected OS or OD")),
        }
    }
}

impl fmt::Display for Laterality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// The four tokens of a dataset file name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SampleRecord {
    pub subject_id: String,
    /// Role marker, e.g. "FP" or "HVF"
    pub role: String,
    pub laterality: Laterality,
    /// Date token exactly as written, extension included
    pub date_token: String,
}

impl SampleRecord {
    /// Parse a file name that must split into exactly four `_`-separated tokens
    pub fn parse(file_name: &str) -> Result<Self, Error> {
        let tokens: Vec<&str> = file_name.split(DELIMITER).collect();
        let [subject_id, role, laterality, date_token] = tokens.as_slice() else {
            return Err(Error::format(
                file_name,
                format!("expected 4 '{DELIMITER}'-separated tokens, found {}", tokens.len()),
            ));
        };

        if subject_id.is_empty() || role.is_empty() || date_token.is_empty() {
            return Err(Error::format(file_name, "empty token"));
        }
        let laterality = laterality
            .parse::<Laterality>()
            .map_err(|reason| Error::format(file_name, reason))?;

        Ok(Self {
            subject_id: subject_id.to_string(),
            role: role.to_string(),
            laterality,
            date_token: date_token.to_string(),
        })
    }

    /// Same subject, eye and date under a different role
    pub fn with_role(&self, role: &str) -> Self {
        Self {
            role: role.to_string(),
            ..self.clone()
        }
    }

    /// Rebuild the file name from the tokens
    pub fn file_name(&self) -> String {
        format!(
            "{}{d}{}{d}{}{d}{}",
            self.subject_id,
            self.role,
            self.laterality,
            self.date_token,
            d = DELIMITER
        )
    }

    /// Visit date, if the date token holds one
    ///
    /// Accepts `YYYYMMDD` and `YYYY-MM-DD`; the file extension is ignored.
    pub fn date(&self) -> Option<NaiveDate> {
        let stem = self
            .date_token
            .split_once('.')
            .map_or(self.date_token.as_str(), |(stem, _)| stem);
        ["%Y%m%d", "%Y-%m-%d"]
            .iter()
            .find_map(|fmt| NaiveDate::parse_from_str(stem, fmt).ok())
    }
}

/// A discovered (input, target) pair; both files exist on disk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImagePair {
    pub input: PathBuf,
    pub target: PathBuf,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_tokens() {
        let record = SampleRecord::parse("10231_FP_OS_20190412.png").unwrap();
        assert_eq!(record.subject_id, "10231");
        assert_eq!(record.role, "FP");
        assert_eq!(record.laterality, Laterality::Left);
        assert_eq!(record.date_token, "20190412.png");
        assert_eq!(record.date(), NaiveDate::from_ymd_opt(2019, 4, 12));
    }

    #[test]
    fn test_counterpart_name() {
        let record = SampleRecord::parse("10231_FP_OD_20190412.jpg").unwrap();
        let target = record.with_role("HVF");
        assert_eq!(target.file_name(), "10231_HVF_OD_20190412.jpg");
        assert_eq!(target.laterality, record.laterality);
        assert_eq!(target.date_token, record.date_token);
    }

    #[test]
    fn test_wrong_token_count_is_format_error() {
        let err = SampleRecord::parse("10231_FP_OS.png").unwrap_err();
        assert!(matches!(err, Error::Format { .. }));

        let err = SampleRecord::parse("10231_FP_OS_2019_04_12.png").unwrap_err();
        assert!(matches!(err, Error::Format { .. }));
    }

    #[test]
    fn test_unknown_laterality_is_format_error() {
        let err = SampleRecord::parse("10231_FP_OU_20190412.png").unwrap_err();
        assert!(err.to_string().contains("OU"));
    }

    #[test]
    fn test_undated_token_is_kept() {
        let record = SampleRecord::parse("7_FP_OD_visit3.png").unwrap();
        assert_eq!(record.date(), None);
        assert_eq!(record.file_name(), "7_FP_OD_visit3.png");

        let dashed = SampleRecord::parse("7_FP_OD_2020-01-31.png").unwrap();
        assert_eq!(dashed.date(), NaiveDate::from_ymd_opt(2020, 1, 31));
    }
}
