//! Log level definitions

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[derive(Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogLevel {
    Trace = 0,
    Debug = 1,
    #[default]
    Info = 2,
    Warn = 3,
    Error = 4,
}

impl LogLevel {
    /// All levels in ascending order of severity
    pub const ALL: [LogLevel; 5] = [
        LogLevel::Trace,
        LogLevel::Debug,
        LogLevel::Info,
        LogLevel::Warn,
        LogLevel::Error,
    ];

    pub fn to_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "TRACE",
            LogLevel::Debug => "DEBUG",
            LogLevel::Info => "INFO",
            LogLevel::Warn => "WARN",
            LogLevel::Error => "ERROR",
        }
    }

    /// Integer rank used for threshold comparison
    #[inline]
    pub const fn rank(self) -> u8 {
        self as u8
    }

    /// Level for a numeric rank, if one exists
    pub fn from_rank(rank: u8) -> Option<Self> {
        Self::ALL.get(rank as usize).copied()
    }

    /// Whether an entry at this level passes the given threshold
    #[inline]
    pub const fn passes(self, threshold: LogLevel) -> bool {
        self.rank() >= threshold.rank()
    }

    /// Levels at which flat payloads are rendered inline
    #[inline]
    pub const fn is_verbose(self) -> bool {
        matches!(self, LogLevel::Trace | LogLevel::Debug)
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.to_str())
    }
}

impl FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if let Ok(rank) = trimmed.parse::<u8>() {
            return Self::from_rank(rank)
                .ok_or_else(|| format!("Invalid log level rank: {}", rank));
        }

        match trimmed.to_uppercase().as_str() {
            "TRACE" => Ok(LogLevel::Trace),
            "DEBUG" => Ok(LogLevel::Debug),
            "INFO" => Ok(LogLevel::Info),
            "WARN" | "WARNING" => Ok(LogLevel::Warn),
            "ERROR" => Ok(LogLevel::Error),
            _ => Err(format!("Invalid log level: '{}'", s)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_total_order() {
        assert!(LogLevel::Trace < LogLevel::Debug);
        assert!(LogLevel::Debug < LogLevel::Info);
        assert!(LogLevel::Info < LogLevel::Warn);
        assert!(LogLevel::Warn < LogLevel::Error);
    }

    #[test]
    fn test_passes_matches_rank() {
        for threshold in LogLevel::ALL {
            for level in LogLevel::ALL {
                assert_eq!(level.passes(threshold), level.rank() >= threshold.rank());
            }
        }
    }

    #[test]
    fn test_parse_names_and_ranks() {
        assert_eq!("debug".parse::<LogLevel>(), Ok(LogLevel::Debug));
        assert_eq!("Warning".parse::<LogLevel>(), Ok(LogLevel::Warn));
        assert_eq!(" ERROR ".parse::<LogLevel>(), Ok(LogLevel::Error));
        assert_eq!("0".parse::<LogLevel>(), Ok(LogLevel::Trace));
        assert_eq!("4".parse::<LogLevel>(), Ok(LogLevel::Error));
        assert!("5".parse::<LogLevel>().is_err());
        assert!("fatal".parse::<LogLevel>().is_err());
    }

    #[test]
    fn test_serde_uses_uppercase_names() {
        let json = serde_json::to_string(&LogLevel::Warn).unwrap();
        assert_eq!(json, "\"WARN\"");
        let level: LogLevel = serde_json::from_str("\"TRACE\"").unwrap();
        assert_eq!(level, LogLevel::Trace);
    }

    #[test]
    fn test_verbose_levels() {
        assert!(LogLevel::Trace.is_verbose());
        assert!(LogLevel::Debug.is_verbose());
        assert!(!LogLevel::Info.is_verbose());
        assert!(!LogLevel::Error.is_verbose());
    }
}
