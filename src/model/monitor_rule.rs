use std::fmt;
use std::str::FromStr;

use regex::{Regex, RegexBuilder};

use crate::sys::geometry::ScreenPoint;
use crate::sys::screen::{Monitor, sorted_by_position};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MonitorRuleError {
    #[error("monitor description must not be empty")]
    Empty,
    #[error("monitor sequence numbers start at 1")]
    ZeroSequence,
    #[error("invalid monitor name pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },
}

/// One way of naming a monitor in a forced workspace assignment.
#[derive(Debug, Clone)]
pub enum MonitorDescription {
    /// The monitor whose frame starts at the origin.
    Main,
    /// Any monitor other than the main one; the leftmost wins.
    Secondary,
    /// 1-based position, counting left to right then top to bottom.
    Sequence(usize),
    /// Case-insensitive match on the monitor name.
    Pattern(Regex),
}

impl PartialEq for MonitorDescription {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Main, Self::Main) | (Self::Secondary, Self::Secondary) => true,
            (Self::Sequence(a), Self::Sequence(b)) => a == b,
            (Self::Pattern(a), Self::Pattern(b)) => a.as_str() == b.as_str(),
            _ => false,
        }
    }
}

impl FromStr for MonitorDescription {
    type Err = MonitorRuleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(MonitorRuleError::Empty);
        }
        if s.eq_ignore_ascii_case("main") {
            return Ok(Self::Main);
        }
        if s.eq_ignore_ascii_case("secondary") {
            return Ok(Self::Secondary);
        }
        if let Ok(n) = s.parse::<usize>() {
            return if n == 0 {
                Err(MonitorRuleError::ZeroSequence)
            } else {
                Ok(Self::Sequence(n))
            };
        }
        RegexBuilder::new(s)
            .case_insensitive(true)
            .build()
            .map(Self::Pattern)
            .map_err(|err| MonitorRuleError::InvalidPattern {
                pattern: s.to_string(),
                reason: err.to_string(),
            })
    }
}

impl fmt::Display for MonitorDescription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Main => f.write_str("main"),
            Self::Secondary => f.write_str("secondary"),
            Self::Sequence(n) => write!(f, "{n}"),
            Self::Pattern(re) => f.write_str(re.as_str()),
        }
    }
}

impl MonitorDescription {
    pub fn resolve<'a>(&self, monitors: &'a [Monitor]) -> Option<&'a Monitor> {
        match self {
            Self::Main => monitors.iter().find(|m| m.is_main()),
            Self::Secondary => sorted_by_position(monitors).into_iter().find(|m| !m.is_main()),
            Self::Sequence(n) => {
                n.checked_sub(1).and_then(|i| sorted_by_position(monitors).get(i).copied())
            }
            Self::Pattern(re) => monitors.iter().find(|m| re.is_match(&m.name)),
        }
    }
}

/// Anchor of the first monitor matched by any of `descriptions`, in order.
pub fn resolve_forced_point(
    descriptions: &[MonitorDescription],
    monitors: &[Monitor],
) -> Option<ScreenPoint> {
    descriptions.iter().find_map(|d| d.resolve(monitors)).map(Monitor::anchor)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sys::screen::test_monitor;

    fn monitors() -> Vec<Monitor> {
        vec![
            test_monitor(1, 0.0, 0.0, "Built-in Retina Display"),
            test_monitor(2, 1920.0, 0.0, "DELL U2720Q"),
            test_monitor(3, -1920.0, 0.0, "LG HDR 4K"),
        ]
    }

    fn resolve(desc: &str) -> Option<String> {
        let monitors = monitors();
        let desc: MonitorDescription = desc.parse().unwrap();
        desc.resolve(&monitors).map(|m| m.name.clone())
    }

    #[test]
    fn parses_descriptions() {
        assert_eq!("Main".parse::<MonitorDescription>(), Ok(MonitorDescription::Main));
        assert_eq!("secondary".parse::<MonitorDescription>(), Ok(MonitorDescription::Secondary));
        assert_eq!("2".parse::<MonitorDescription>(), Ok(MonitorDescription::Sequence(2)));
        assert_eq!(
            "0".parse::<MonitorDescription>(),
            Err(MonitorRuleError::ZeroSequence)
        );
        assert_eq!(" ".parse::<MonitorDescription>(), Err(MonitorRuleError::Empty));
        assert!(matches!(
            "[".parse::<MonitorDescription>(),
            Err(MonitorRuleError::InvalidPattern { .. })
        ));
    }

    #[test]
    fn resolves_against_monitors() {
        assert_eq!(resolve("main").as_deref(), Some("Built-in Retina Display"));
        assert_eq!(resolve("secondary").as_deref(), Some("LG HDR 4K"));
        assert_eq!(resolve("1").as_deref(), Some("LG HDR 4K"));
        assert_eq!(resolve("3").as_deref(), Some("DELL U2720Q"));
        assert_eq!(resolve("4"), None);
        assert_eq!(resolve("dell").as_deref(), Some("DELL U2720Q"));
        assert_eq!(resolve("^sony"), None);
        assert!(MonitorDescription::Sequence(0).resolve(&monitors()).is_none());
    }

    #[test]
    fn first_matching_description_wins() {
        let monitors = monitors();
        let descriptions: Vec<MonitorDescription> =
            ["samsung", "dell", "main"].iter().map(|d| d.parse().unwrap()).collect();
        assert_eq!(
            resolve_forced_point(&descriptions, &monitors),
            Some(ScreenPoint::new(1920, 0))
        );
        assert_eq!(resolve_forced_point(&descriptions[..1], &monitors), None);
    }
}
