//! Top-N truncation
//!
//! `-1` is the "show everything" sentinel and is checked explicitly; it must
//! never reach a slice bound where it would drop the last record.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Raw selector value meaning "no limit"
pub const UNLIMITED: i64 = -1;

/// Values offered by the top-N selector
pub const TOP_N_CHOICES: [TopN; 6] = [
    TopN::Limit(5),
    TopN::Limit(10),
    TopN::Limit(20),
    TopN::Limit(50),
    TopN::Limit(100),
    TopN::All,
];

/// Maximum number of ranked records to show
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TopN {
    #[default]
    All,
    Limit(usize),
}

impl TopN {
    /// Interpret a raw selector value
    ///
    /// Non-sentinel negatives are clamped to `All` rather than producing a
    /// negative-length slice.
    pub fn from_raw(n: i64) -> Self {
        match n {
            UNLIMITED => TopN::All,
            n if n >= 0 => TopN::Limit(usize::try_from(n).unwrap_or(usize::MAX)),
            n => {
                tracing::warn!(top_n = n, "Invalid top-N value, showing all records");
                TopN::All
            }
        }
    }

    /// Interpret a possibly fractional selector value (e.g. from JSON)
    pub fn from_f64(n: f64) -> Self {
        if n.is_finite() && n.fract() == 0.0 && n >= i64::MIN as f64 && n <= i64::MAX as f64 {
            Self::from_raw(n as i64)
        } else {
            tracing::warn!(top_n = n, "Non-integer top-N value, showing all records");
            TopN::All
        }
    }

    /// Raw selector value, `-1` for `All`
    pub fn as_raw(&self) -> i64 {
        match self {
            TopN::All => UNLIMITED,
            TopN::Limit(n) => i64::try_from(*n).unwrap_or(i64::MAX),
        }
    }

    pub fn limit(&self) -> Option<usize> {
        match self {
            TopN::All => None,
            TopN::Limit(n) => Some(*n),
        }
    }

    /// First `n` records, or all of them
    pub fn apply<T: Clone>(&self, records: &[T]) -> Vec<T> {
        match self {
            TopN::All => records.to_vec(),
            TopN::Limit(n) => records.iter().take(*n).cloned().collect(),
        }
    }

    /// Owned variant of [`TopN::apply`]
    pub fn apply_owned<T>(&self, mut records: Vec<T>) -> Vec<T> {
        if let TopN::Limit(n) = self {
            records.truncate(*n);
        }
        records
    }
}

impl fmt::Display for TopN {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TopN::All => write!(f, "all"),
            TopN::Limit(n) => write!(f, "{}", n),
        }
    }
}

impl FromStr for TopN {
    type Err = std::convert::Infallible;

    /// Lenient parse: anything unusable becomes `All`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() || s.eq_ignore_ascii_case("all") {
            return Ok(TopN::All);
        }
        if let Ok(n) = s.parse::<i64>() {
            return Ok(TopN::from_raw(n));
        }
        match s.parse::<f64>() {
            Ok(n) => Ok(TopN::from_f64(n)),
            Err(_) => {
                tracing::warn!(top_n = s, "Unparseable top-N value, showing all records");
                Ok(TopN::All)
            }
        }
    }
}

impl Serialize for TopN {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_i64(self.as_raw())
    }
}

impl<'de> Deserialize<'de> for TopN {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = f64::deserialize(deserializer)?;
        Ok(TopN::from_f64(value))
    }
}

/// Truncate to the first `n` records; `n == -1` is the identity
pub fn truncate<T: Clone>(records: &[T], n: i64) -> Vec<T> {
    TopN::from_raw(n).apply(records)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sentinel_is_identity() {
        let records = vec![1, 2, 3, 4];
        assert_eq!(truncate(&records, -1), records);
    }

    #[test]
    fn test_length_is_min_of_n_and_len() {
        let records: Vec<i32> = (0..7).collect();
        for n in 0..12 {
            assert_eq!(truncate(&records, n).len(), (n as usize).min(records.len()));
        }
    }

    #[test]
    fn test_top_three_of_ten_keeps_order() {
        let sorted: Vec<i32> = (0..10).rev().collect();
        assert_eq!(truncate(&sorted, 3), vec![9, 8, 7]);
    }

    #[test]
    fn test_other_negatives_clamp_to_all() {
        let records = vec!['a', 'b', 'c'];
        assert_eq!(truncate(&records, -2), records);
        assert_eq!(truncate(&records, i64::MIN), records);
        assert_eq!(TopN::from_raw(-5), TopN::All);
    }

    #[test]
    fn test_non_integer_clamps_to_all() {
        assert_eq!(TopN::from_f64(2.5), TopN::All);
        assert_eq!(TopN::from_f64(f64::NAN), TopN::All);
        assert_eq!(TopN::from_f64(10.0), TopN::Limit(10));
        assert_eq!("2.5".parse::<TopN>().unwrap(), TopN::All);
    }

    #[test]
    fn test_parse() {
        assert_eq!("all".parse::<TopN>().unwrap(), TopN::All);
        assert_eq!("-1".parse::<TopN>().unwrap(), TopN::All);
        assert_eq!("20".parse::<TopN>().unwrap(), TopN::Limit(20));
        assert_eq!("abc".parse::<TopN>().unwrap(), TopN::All);
    }

    #[test]
    fn test_serde_uses_raw_value() {
        assert_eq!(serde_json::to_string(&TopN::All).unwrap(), "-1");
        assert_eq!(serde_json::to_string(&TopN::Limit(5)).unwrap(), "5");
        let parsed: TopN = serde_json::from_str("10").unwrap();
        assert_eq!(parsed, TopN::Limit(10));
        let clamped: TopN = serde_json::from_str("-3").unwrap();
        assert_eq!(clamped, TopN::All);
    }

    #[test]
    fn test_empty_input() {
        let empty: Vec<u8> = vec![];
        assert!(truncate(&empty, 5).is_empty());
        assert!(TopN::Limit(3).apply_owned(empty).is_empty());
    }
}
