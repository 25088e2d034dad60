use std::sync::atomic::{AtomicI64, Ordering};

use chrono::{DateTime, Local, SecondsFormat, TimeDelta, Utc};

/// Source of wall-clock time for version ids and relative ages.
///
/// Injected into the history store so tests can pin and advance time.
pub trait Clock: Send + Sync {
    /// The current instant.
    fn now(&self) -> DateTime<Utc>;

    /// The current instant as milliseconds since the UNIX epoch.
    fn now_millis(&self) -> u64 {
        self.now().timestamp_millis().max(0) as u64
    }
}

/// Clock backed by the operating system.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    millis: AtomicI64,
}

impl ManualClock {
    /// Create a clock frozen at `millis` since the UNIX epoch.
    pub fn at_millis(millis: i64) -> Self {
        Self {
            millis: AtomicI64::new(millis),
        }
    }

    /// Create a clock frozen at the given instant.
    pub fn at(instant: DateTime<Utc>) -> Self {
        Self::at_millis(instant.timestamp_millis())
    }

    /// Move the clock forward (or backward, for a negative delta).
    pub fn advance(&self, delta: TimeDelta) {
        self.millis
            .fetch_add(delta.num_milliseconds(), Ordering::SeqCst);
    }

    /// Jump to an absolute millisecond value.
    pub fn set_millis(&self, millis: i64) {
        self.millis.store(millis, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        DateTime::from_timestamp_millis(self.millis.load(Ordering::SeqCst)).unwrap_or_default()
    }
}

/// Coarse human-readable age of `then` as seen from `now`.
///
/// Buckets are floored, never rounded, and never re-pluralized:
/// under a minute is `"Just now"`, then `"N minutes ago"`, `"N hours ago"`,
/// `"N days ago"` up to a week, and past that the local calendar date in
/// `M/D/YYYY` form. Instants in the future count as `"Just now"`.
pub fn relative_age(then: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let seconds = now.signed_duration_since(then).num_seconds();

    if seconds < 60 {
        return "Just now".to_string();
    }
    if seconds < 3_600 {
        return format!("{} minutes ago", seconds / 60);
    }
    if seconds < 86_400 {
        return format!("{} hours ago", seconds / 3_600);
    }
    if seconds < 604_800 {
        return format!("{} days ago", seconds / 86_400);
    }
    then.with_timezone(&Local).format("%-m/%-d/%Y").to_string()
}

/// Serde adapter writing `DateTime<Utc>` as `YYYY-MM-DDTHH:MM:SS.mmmZ`.
pub mod iso_millis {
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&super::to_iso_millis(value))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        DateTime::parse_from_rfc3339(&raw)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(serde::de::Error::custom)
    }
}

/// Format an instant the way browsers print `Date.prototype.toISOString()`.
pub fn to_iso_millis(value: &DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::Millis, true)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> DateTime<Utc> {
        DateTime::from_timestamp_millis(1_700_000_000_000).unwrap()
    }

    fn age_after(seconds: i64) -> String {
        relative_age(base(), base() + TimeDelta::seconds(seconds))
    }

    // -----------------------------------------------------------------------
    // Relative age buckets
    // -----------------------------------------------------------------------

    #[test]
    fn thirty_seconds_is_just_now() {
        assert_eq!(age_after(30), "Just now");
    }

    #[test]
    fn fifty_nine_seconds_is_still_just_now() {
        assert_eq!(age_after(59), "Just now");
    }

    #[test]
    fn minutes_are_floored() {
        assert_eq!(age_after(60), "1 minutes ago");
        assert_eq!(age_after(119), "1 minutes ago");
        assert_eq!(age_after(3_599), "59 minutes ago");
    }

    #[test]
    fn one_hour_keeps_plural_wording() {
        assert_eq!(age_after(3_660), "1 hours ago");
    }

    #[test]
    fn days_within_a_week() {
        assert_eq!(age_after(86_400), "1 days ago");
        assert_eq!(age_after(604_799), "6 days ago");
    }

    #[test]
    fn past_a_week_prints_calendar_date() {
        let rendered = age_after(604_800);
        let parts: Vec<&str> = rendered.split('/').collect();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[2], "2023");
        assert!(parts[0].parse::<u32>().is_ok());
        assert!(parts[1].parse::<u32>().is_ok());
    }

    #[test]
    fn future_timestamps_are_just_now() {
        assert_eq!(age_after(-500), "Just now");
    }

    // -----------------------------------------------------------------------
    // Clocks
    // -----------------------------------------------------------------------

    #[test]
    fn manual_clock_advances() {
        let clock = ManualClock::at_millis(1_000);
        assert_eq!(clock.now_millis(), 1_000);
        clock.advance(TimeDelta::milliseconds(250));
        assert_eq!(clock.now_millis(), 1_250);
        clock.set_millis(42);
        assert_eq!(clock.now_millis(), 42);
    }

    #[test]
    fn system_clock_is_after_2020() {
        assert!(SystemClock.now_millis() > 1_577_836_800_000);
    }

    #[test]
    fn iso_millis_format() {
        assert_eq!(to_iso_millis(&base()), "2023-11-14T22:13:20.000Z");
    }

    proptest::proptest! {
        #[test]
        fn under_a_minute_is_just_now(seconds in -86_400i64..60) {
            proptest::prop_assert_eq!(age_after(seconds), "Just now");
        }

        #[test]
        fn within_a_week_uses_units(seconds in 60i64..7 * 86_400) {
            let age = age_after(seconds);
            proptest::prop_assert!(age.ends_with(" ago"), "got {}", age);
        }
    }
}
