//! Exact media timestamps and time ranges
//!
//! Cut-point math compares timestamps against probed keyframe times, so the
//! representation must be exact: a binary float that drifts by one ULP at a
//! keyframe boundary turns a lossless copy into a needless re-encode. A
//! `Timestamp` is therefore a fixed-point decimal (`units * 10^-scale`),
//! which losslessly holds every value ffprobe or the CLI can hand us.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{TrimError, TrimResult};

/// Maximum number of fractional decimal digits accepted; ffprobe emits six.
/// Together with `MAX_INT_DIGITS` this keeps scale alignment inside i128.
const MAX_SCALE: u32 = 9;

/// Maximum number of integer digits accepted when parsing
const MAX_INT_DIGITS: usize = 12;

/// Exact non-negative timestamp in seconds, stored as `units * 10^-scale`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Timestamp {
    units: i128,
    scale: u32,
}

impl Timestamp {
    /// The zero timestamp
    pub fn zero() -> Self {
        Self::default()
    }

    /// Create a timestamp from whole seconds
    pub fn from_secs(seconds: u64) -> Self {
        Self {
            units: seconds as i128,
            scale: 0,
        }
    }

    /// Create a timestamp from raw units and a decimal scale
    pub fn new(units: i128, scale: u32) -> TrimResult<Self> {
        if units < 0 {
            return Err(TrimError::InvalidTimeFormat {
                time: format!("{}e-{}", units, scale),
            });
        }
        if scale > MAX_SCALE {
            return Err(TrimError::InvalidTimeFormat {
                time: format!("{}e-{}", units, scale),
            });
        }
        Ok(Self { units, scale }.normalized())
    }

    /// Parse a time string: plain decimal seconds, MM:SS.ms, or HH:MM:SS.ms
    pub fn parse(time_str: &str) -> TrimResult<Self> {
        let trimmed = time_str.trim();
        if trimmed.is_empty() {
            return Err(TrimError::InvalidTimeFormat {
                time: time_str.to_string(),
            });
        }

        let parts: Vec<&str> = trimmed.split(':').collect();
        match parts.len() {
            1 => Self::parse_decimal(trimmed),
            2 => {
                // MM:SS.ms
                let minutes = Self::parse_component(parts[0], trimmed)?;
                let seconds = Self::parse_sexagesimal_seconds(parts[1], trimmed)?;
                Self::from_secs(minutes * 60)
                    .checked_add(&seconds)
                    .ok_or_else(|| TrimError::InvalidTimeFormat {
                        time: trimmed.to_string(),
                    })
            }
            3 => {
                // HH:MM:SS.ms
                let hours = Self::parse_component(parts[0], trimmed)?;
                let minutes = Self::parse_component(parts[1], trimmed)?;
                if minutes >= 60 {
                    return Err(TrimError::InvalidTimeFormat {
                        time: trimmed.to_string(),
                    });
                }
                let seconds = Self::parse_sexagesimal_seconds(parts[2], trimmed)?;
                Self::from_secs(hours * 3600 + minutes * 60)
                    .checked_add(&seconds)
                    .ok_or_else(|| TrimError::InvalidTimeFormat {
                        time: trimmed.to_string(),
                    })
            }
            _ => Err(TrimError::InvalidTimeFormat {
                time: trimmed.to_string(),
            }),
        }
    }

    /// Checked addition, exact at the wider of the two scales
    pub fn checked_add(&self, other: &Self) -> Option<Self> {
        let (a, b, scale) = Self::aligned(self, other)?;
        let units = a.checked_add(b)?;
        Some(Self { units, scale }.normalized())
    }

    /// Checked subtraction; `None` when the result would be negative
    pub fn checked_sub(&self, other: &Self) -> Option<Self> {
        let (a, b, scale) = Self::aligned(self, other)?;
        let units = a.checked_sub(b)?;
        if units < 0 {
            return None;
        }
        Some(Self { units, scale }.normalized())
    }

    fn normalized(mut self) -> Self {
        while self.scale > 0 && self.units % 10 == 0 {
            self.units /= 10;
            self.scale -= 1;
        }
        if self.units == 0 {
            self.scale = 0;
        }
        self
    }

    /// Bring both operands to a common scale
    fn aligned(a: &Self, b: &Self) -> Option<(i128, i128, u32)> {
        let scale = a.scale.max(b.scale);
        let au = a.units.checked_mul(pow10(scale - a.scale)?)?;
        let bu = b.units.checked_mul(pow10(scale - b.scale)?)?;
        Some((au, bu, scale))
    }

    fn parse_component(part: &str, whole: &str) -> TrimResult<u64> {
        part.parse::<u32>()
            .map(u64::from)
            .map_err(|_| TrimError::InvalidTimeFormat {
                time: whole.to_string(),
            })
    }

    fn parse_sexagesimal_seconds(part: &str, whole: &str) -> TrimResult<Self> {
        let seconds = Self::parse_decimal(part)?;
        if seconds >= Self::from_secs(60) {
            return Err(TrimError::InvalidTimeFormat {
                time: whole.to_string(),
            });
        }
        Ok(seconds)
    }

    fn parse_decimal(s: &str) -> TrimResult<Self> {
        let invalid = || TrimError::InvalidTimeFormat {
            time: s.to_string(),
        };

        let (int_part, frac_part) = match s.split_once('.') {
            Some((i, f)) => (i, f),
            None => (s, ""),
        };
        if int_part.is_empty() && frac_part.is_empty() {
            return Err(invalid());
        }
        if !int_part.chars().all(|c| c.is_ascii_digit())
            || !frac_part.chars().all(|c| c.is_ascii_digit())
        {
            return Err(invalid());
        }
        if int_part.len() > MAX_INT_DIGITS || frac_part.len() > MAX_SCALE as usize {
            return Err(invalid());
        }

        let scale = frac_part.len() as u32;
        let int_units: i128 = if int_part.is_empty() {
            0
        } else {
            int_part.parse().map_err(|_| invalid())?
        };
        let frac_units: i128 = if frac_part.is_empty() {
            0
        } else {
            frac_part.parse().map_err(|_| invalid())?
        };

        let units = int_units
            .checked_mul(pow10(scale).ok_or_else(invalid)?)
            .and_then(|u| u.checked_add(frac_units))
            .ok_or_else(invalid)?;

        Ok(Self { units, scale }.normalized())
    }
}

fn pow10(exp: u32) -> Option<i128> {
    10i128.checked_pow(exp)
}

impl Ord for Timestamp {
    fn cmp(&self, other: &Self) -> Ordering {
        // Parsing bounds operands so alignment cannot overflow; absurd raw
        // units fall back to comparing whole seconds
        match Self::aligned(self, other) {
            Some((a, b, _)) => a.cmp(&b),
            None => self
                .units
                .checked_div(pow10(self.scale).unwrap_or(1))
                .cmp(&other.units.checked_div(pow10(other.scale).unwrap_or(1))),
        }
    }
}

impl PartialOrd for Timestamp {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.scale == 0 {
            return write!(f, "{}", self.units);
        }
        let divisor = pow10(self.scale).unwrap_or(1);
        let int = self.units / divisor;
        let frac = self.units % divisor;
        write!(f, "{}.{:0width$}", int, frac, width = self.scale as usize)
    }
}

impl FromStr for Timestamp {
    type Err = TrimError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for Timestamp {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Timestamp {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(D::Error::custom)
    }
}

/// Half-open time interval `[start, end)` with `start <= end`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeRange {
    pub start: Timestamp,
    pub end: Timestamp,
}

impl TimeRange {
    /// Create a time range, rejecting inverted bounds
    pub fn new(start: Timestamp, end: Timestamp) -> TrimResult<Self> {
        if start > end {
            return Err(TrimError::InvalidRange {
                start: start.to_string(),
                end: end.to_string(),
            });
        }
        Ok(Self { start, end })
    }

    /// Clamp both bounds into `bounds`; clamping preserves `start <= end`
    pub fn clamp_to(&self, bounds: &TimeRange) -> TimeRange {
        TimeRange {
            start: self.start.max(bounds.start).min(bounds.end),
            end: self.end.max(bounds.start).min(bounds.end),
        }
    }

    /// Length of the interval
    pub fn duration(&self) -> Timestamp {
        self.end.checked_sub(&self.start).unwrap_or_default()
    }

    /// True when the interval contains no time at all
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

impl fmt::Display for TimeRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {})", self.start, self.end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ts(s: &str) -> Timestamp {
        Timestamp::parse(s).unwrap()
    }

    #[test]
    fn parse_plain_seconds() {
        assert_eq!(ts("0"), Timestamp::zero());
        assert_eq!(ts("90"), Timestamp::from_secs(90));
        assert_eq!(ts("1.5"), Timestamp::new(15, 1).unwrap());
        assert_eq!(ts("0.000001"), Timestamp::new(1, 6).unwrap());
    }

    #[test]
    fn parse_normalizes_trailing_zeros() {
        assert_eq!(ts("2.000000"), Timestamp::from_secs(2));
        assert_eq!(ts("1.50"), ts("1.5"));
        assert_eq!(ts("0.0"), Timestamp::zero());
    }

    #[test]
    fn parse_hms_formats() {
        assert_eq!(ts("1:30"), Timestamp::from_secs(90));
        assert_eq!(ts("2:30.5"), ts("150.5"));
        assert_eq!(ts("1:02:30.5"), ts("3750.5"));
        assert_eq!(ts("00:00:00"), Timestamp::zero());
    }

    #[test]
    fn parse_rejects_bad_input() {
        assert!(Timestamp::parse("").is_err());
        assert!(Timestamp::parse("-1").is_err());
        assert!(Timestamp::parse("abc").is_err());
        assert!(Timestamp::parse("1:75").is_err());
        assert!(Timestamp::parse("1:75:00").is_err());
        assert!(Timestamp::parse("1:2:3:4").is_err());
        assert!(Timestamp::parse("1.0000000000000000000").is_err());
    }

    #[test]
    fn ordering_is_exact_across_scales() {
        assert!(ts("1.999999") < ts("2"));
        assert!(ts("2.000001") > ts("2"));
        assert_eq!(ts("2.0").cmp(&ts("2")), Ordering::Equal);
        assert!(ts("0.1") < ts("0.15"));
    }

    #[test]
    fn arithmetic_is_exact() {
        assert_eq!(ts("0.1").checked_add(&ts("0.2")), Some(ts("0.3")));
        assert_eq!(ts("7").checked_sub(&ts("6.5")), Some(ts("0.5")));
        assert_eq!(ts("1").checked_sub(&ts("1.5")), None);
    }

    #[test]
    fn display_round_trips() {
        for raw in ["0", "2", "1.5", "0.000001", "3750.5"] {
            assert_eq!(ts(raw).to_string(), raw);
        }
    }

    #[test]
    fn range_rejects_inverted_bounds() {
        assert!(TimeRange::new(ts("2"), ts("1")).is_err());
        assert!(TimeRange::new(ts("1"), ts("1")).is_ok());
    }

    #[test]
    fn range_clamps_into_bounds() {
        let bounds = TimeRange::new(ts("1"), ts("9")).unwrap();
        let wide = TimeRange::new(ts("0"), ts("20")).unwrap();
        assert_eq!(wide.clamp_to(&bounds), bounds);

        let outside = TimeRange::new(ts("10"), ts("20")).unwrap();
        let clamped = outside.clamp_to(&bounds);
        assert!(clamped.is_empty());
        assert_eq!(clamped.start, ts("9"));
    }

    #[test]
    fn range_duration() {
        let r = TimeRange::new(ts("1.25"), ts("7")).unwrap();
        assert_eq!(r.duration(), ts("5.75"));
    }
}
