use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Change to a column width.
///
/// Parsed from `"800"` (set pixels), `"60%"` (set proportion), `"+50"` /
/// `"-50"` (adjust pixels) and `"+10%"` / `"-10%"` (adjust proportion).
/// Percentages are stored as given, 0 to 100.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum SizeChange {
    SetFixed(f64),
    SetProportion(f64),
    AdjustFixed(f64),
    AdjustProportion(f64),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid size change '{0}'")]
pub struct ParseSizeChangeError(String);

impl FromStr for SizeChange {
    type Err = ParseSizeChangeError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let err = || ParseSizeChangeError(raw.to_string());
        let trimmed = raw.trim();
        let (value, percent) = match trimmed.strip_suffix('%') {
            Some(value) => (value.trim_end(), true),
            None => (trimmed, false),
        };
        let adjust = value.starts_with('+') || value.starts_with('-');
        let number: f64 = value.parse().map_err(|_| err())?;
        if !number.is_finite() || (!adjust && number < 0.0) {
            return Err(err());
        }
        Ok(match (adjust, percent) {
            (false, false) => SizeChange::SetFixed(number),
            (false, true) => SizeChange::SetProportion(number),
            (true, false) => SizeChange::AdjustFixed(number),
            (true, true) => SizeChange::AdjustProportion(number),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_all_forms() {
        assert_eq!("800".parse::<SizeChange>(), Ok(SizeChange::SetFixed(800.0)));
        assert_eq!("60%".parse::<SizeChange>(), Ok(SizeChange::SetProportion(60.0)));
        assert_eq!("+10%".parse::<SizeChange>(), Ok(SizeChange::AdjustProportion(10.0)));
        assert_eq!(" -50 ".parse::<SizeChange>(), Ok(SizeChange::AdjustFixed(-50.0)));
        assert_eq!("+12.5".parse::<SizeChange>(), Ok(SizeChange::AdjustFixed(12.5)));
    }

    #[test]
    fn rejects_garbage() {
        for raw in ["", "%", "abc", "10px", "inf", "--5"] {
            assert!(raw.parse::<SizeChange>().is_err(), "{raw}");
        }
    }
}
