//! Timestamps rendered for people.
//!
//! Documents store UTC instants. [`Stamp`] shows them in the system time zone
//! by default, at a precision chosen per call site: listings only need the
//! day, note logs the minute, entity details the full second with zone.

use std::fmt;

use jiff::{tz::TimeZone, Timestamp};

/// How much of a timestamp is shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Precision {
    /// `2025-03-01`
    Day,
    /// `2025-03-01 12:30`
    Minute,
    /// `2025-03-01 12:30:45 UTC`
    #[default]
    Second,
}

impl Precision {
    fn pattern(self) -> &'static str {
        match self {
            Precision::Day => "%Y-%m-%d",
            Precision::Minute => "%Y-%m-%d %H:%M",
            Precision::Second => "%Y-%m-%d %H:%M:%S %Z",
        }
    }
}

/// A borrowed timestamp with a display zone and precision.
#[derive(Debug, Clone)]
pub struct Stamp<'a> {
    at: &'a Timestamp,
    zone: Option<TimeZone>,
    precision: Precision,
}

impl<'a> Stamp<'a> {
    /// Full precision in the system time zone.
    pub fn new(at: &'a Timestamp) -> Self {
        Self {
            at,
            zone: None,
            precision: Precision::default(),
        }
    }

    pub fn day(at: &'a Timestamp) -> Self {
        Self::new(at).with_precision(Precision::Day)
    }

    pub fn minute(at: &'a Timestamp) -> Self {
        Self::new(at).with_precision(Precision::Minute)
    }

    pub fn with_precision(mut self, precision: Precision) -> Self {
        self.precision = precision;
        self
    }

    /// Renders in `zone` instead of the system time zone.
    pub fn in_zone(mut self, zone: TimeZone) -> Self {
        self.zone = Some(zone);
        self
    }
}

impl fmt::Display for Stamp<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let zone = self.zone.clone().unwrap_or_else(TimeZone::system);
        let zoned = self.at.to_zoned(zone);
        write!(f, "{}", zoned.strftime(self.precision.pattern()))
    }
}

#[cfg(test)]
mod tests {
    use jiff::tz;

    use super::*;

    fn at(s: &str) -> Timestamp {
        s.parse().unwrap()
    }

    #[test]
    fn test_precisions_in_utc() {
        let ts = at("2025-03-01T12:30:45Z");
        assert_eq!(
            Stamp::new(&ts).in_zone(TimeZone::UTC).to_string(),
            "2025-03-01 12:30:45 UTC"
        );
        assert_eq!(
            Stamp::minute(&ts).in_zone(TimeZone::UTC).to_string(),
            "2025-03-01 12:30"
        );
        assert_eq!(Stamp::day(&ts).in_zone(TimeZone::UTC).to_string(), "2025-03-01");
    }

    #[test]
    fn test_zone_can_move_the_date() {
        let ts = at("2025-03-01T20:00:00Z");
        let tokyo = TimeZone::fixed(tz::offset(9));
        assert_eq!(Stamp::day(&ts).in_zone(tokyo.clone()).to_string(), "2025-03-02");
        assert_eq!(Stamp::minute(&ts).in_zone(tokyo).to_string(), "2025-03-02 05:00");
    }

    #[test]
    fn test_system_zone_shape() {
        let ts = at("2025-03-01T12:30:45Z");
        let formatted = Stamp::new(&ts).to_string();
        let parts: Vec<&str> = formatted.splitn(3, ' ').collect();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0].len(), "2025-03-01".len());
        assert_eq!(parts[1].len(), "12:30:45".len());
    }
}
