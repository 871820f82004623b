//! Offset-aware instants.
//!
//! Backends disagree about which timezone their timestamps are in. A
//! `TemporalValue` pins down the absolute instant and carries the UTC offset
//! that was in effect *at that instant* as presentation metadata, or one of
//! three sentinels when the backend could not tell us.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::ops::{Add, Sub};

use chrono::{DateTime, Duration, FixedOffset, Offset, TimeZone, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

/// Raw offset value: the caller must apply the venue-local zone.
pub const UNKNOWN_LOCATION_SPECIFIC_OFFSET: i32 = i32::MIN;

/// Raw offset value: the local device zone applies.
pub const SYSTEM_OFFSET: i32 = i32::MIN + 1;

/// Raw offset value: the server-reported zone applies.
pub const NETWORK_OFFSET: i32 = i32::MIN + 2;

/// The offset tag attached to an instant.
///
/// Converts losslessly to and from the raw `i32` representation used on the
/// wire, where the three sentinels occupy the bottom of the `i32` range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "i32", into = "i32")]
pub enum OffsetTag {
    /// Minutes east of UTC, as in effect at the tagged instant.
    Minutes(i32),
    /// Offset unknown; interpret in the zone of the location.
    UnknownLocationSpecific,
    /// Interpret in the system (device) zone.
    System,
    /// Interpret in the zone reported by the network.
    Network,
}

impl OffsetTag {
    /// Returns the concrete offset in minutes, if this is not a sentinel.
    pub fn minutes(self) -> Option<i32> {
        match self {
            OffsetTag::Minutes(m) => Some(m),
            _ => None,
        }
    }
}

impl From<i32> for OffsetTag {
    fn from(raw: i32) -> Self {
        match raw {
            UNKNOWN_LOCATION_SPECIFIC_OFFSET => OffsetTag::UnknownLocationSpecific,
            SYSTEM_OFFSET => OffsetTag::System,
            NETWORK_OFFSET => OffsetTag::Network,
            m => OffsetTag::Minutes(m),
        }
    }
}

impl From<OffsetTag> for i32 {
    fn from(tag: OffsetTag) -> Self {
        match tag {
            OffsetTag::Minutes(m) => m,
            OffsetTag::UnknownLocationSpecific => UNKNOWN_LOCATION_SPECIFIC_OFFSET,
            OffsetTag::System => SYSTEM_OFFSET,
            OffsetTag::Network => NETWORK_OFFSET,
        }
    }
}

/// An absolute instant plus the offset tag it was reported with.
///
/// Ordering, equality and hashing look at the instant only. Two values for
/// the same instant reported in different zones compare equal.
///
/// # Examples
///
/// ```
/// use transit_trips::domain::TemporalValue;
///
/// // 2024-03-15 08:00 UTC, reported as CET (+60)
/// let cet = TemporalValue::new(1_710_489_600_000, 60);
/// let utc = TemporalValue::new(1_710_489_600_000, 0);
///
/// assert_eq!(cet, utc);
/// assert_eq!(cet.offset_minutes(), Some(60));
/// assert_eq!(cet.to_string(), "2024-03-15 09:00+01:00");
/// ```
#[derive(Clone, Copy, Serialize, Deserialize)]
pub struct TemporalValue {
    instant: i64,
    offset: OffsetTag,
}

impl TemporalValue {
    /// Create a value from epoch milliseconds and a raw offset.
    ///
    /// `raw_offset` is minutes east of UTC, or one of the sentinel constants.
    pub fn new(instant_millis: i64, raw_offset: i32) -> Self {
        Self {
            instant: instant_millis,
            offset: OffsetTag::from(raw_offset),
        }
    }

    /// Create a value with an explicit offset tag.
    pub fn with_tag(instant_millis: i64, offset: OffsetTag) -> Self {
        Self {
            instant: instant_millis,
            offset,
        }
    }

    /// Create a value whose offset is the one `tz` has in effect at the
    /// instant, so daylight saving transitions are baked in.
    ///
    /// # Examples
    ///
    /// ```
    /// use transit_trips::domain::TemporalValue;
    ///
    /// let berlin: chrono_tz::Tz = "Europe/Berlin".parse().unwrap();
    ///
    /// // January: CET
    /// let winter = TemporalValue::in_timezone(1_705_312_800_000, &berlin);
    /// assert_eq!(winter.offset_minutes(), Some(60));
    ///
    /// // July: CEST
    /// let summer = TemporalValue::in_timezone(1_720_000_000_000, &berlin);
    /// assert_eq!(summer.offset_minutes(), Some(120));
    /// ```
    pub fn in_timezone(instant_millis: i64, tz: &Tz) -> Self {
        let offset = DateTime::<Utc>::from_timestamp_millis(instant_millis)
            .map(|utc| {
                let minutes = tz
                    .offset_from_utc_datetime(&utc.naive_utc())
                    .fix()
                    .local_minus_utc()
                    / 60;
                OffsetTag::Minutes(minutes)
            })
            .unwrap_or(OffsetTag::UnknownLocationSpecific);

        Self {
            instant: instant_millis,
            offset,
        }
    }

    /// Create a value from a zoned datetime, keeping its offset.
    pub fn from_datetime<Z: TimeZone>(dt: &DateTime<Z>) -> Self {
        Self {
            instant: dt.timestamp_millis(),
            offset: OffsetTag::Minutes(dt.offset().fix().local_minus_utc() / 60),
        }
    }

    /// Create a value whose offset must be taken from the venue's zone.
    pub fn location_specific(instant_millis: i64) -> Self {
        Self::with_tag(instant_millis, OffsetTag::UnknownLocationSpecific)
    }

    /// Create a value to be shown in the device zone.
    pub fn system(instant_millis: i64) -> Self {
        Self::with_tag(instant_millis, OffsetTag::System)
    }

    /// Create a value to be shown in the network's zone.
    pub fn network(instant_millis: i64) -> Self {
        Self::with_tag(instant_millis, OffsetTag::Network)
    }

    /// Epoch milliseconds.
    pub fn instant_millis(&self) -> i64 {
        self.instant
    }

    /// Whole minutes since the epoch (floored).
    pub fn epoch_minute(&self) -> i64 {
        self.instant.div_euclid(60_000)
    }

    /// The offset tag.
    pub fn offset(&self) -> OffsetTag {
        self.offset
    }

    /// The raw offset, including sentinels.
    pub fn raw_offset(&self) -> i32 {
        self.offset.into()
    }

    /// Concrete offset in minutes, or `None` for a sentinel.
    pub fn offset_minutes(&self) -> Option<i32> {
        self.offset.minutes()
    }

    pub fn is_unknown_location_specific(&self) -> bool {
        self.offset == OffsetTag::UnknownLocationSpecific
    }

    pub fn is_system_offset(&self) -> bool {
        self.offset == OffsetTag::System
    }

    pub fn is_network_offset(&self) -> bool {
        self.offset == OffsetTag::Network
    }

    /// Whether a raw offset value is the location-specific sentinel.
    pub fn offset_is_unknown_location_specific(raw_offset: i32) -> bool {
        raw_offset == UNKNOWN_LOCATION_SPECIFIC_OFFSET
    }

    /// Whether a raw offset value is the system sentinel.
    pub fn offset_is_system(raw_offset: i32) -> bool {
        raw_offset == SYSTEM_OFFSET
    }

    /// Whether a raw offset value is the network sentinel.
    pub fn offset_is_network(raw_offset: i32) -> bool {
        raw_offset == NETWORK_OFFSET
    }

    /// The instant in UTC. `None` only for instants outside chrono's range.
    pub fn to_utc(&self) -> Option<DateTime<Utc>> {
        DateTime::<Utc>::from_timestamp_millis(self.instant)
    }

    /// The instant at its concrete offset. `None` for sentinel offsets.
    pub fn to_fixed(&self) -> Option<DateTime<FixedOffset>> {
        let minutes = self.offset_minutes()?;
        let offset = FixedOffset::east_opt(minutes.checked_mul(60)?)?;
        Some(self.to_utc()?.with_timezone(&offset))
    }

    /// Add a duration, keeping the offset tag.
    pub fn checked_add(&self, duration: Duration) -> Option<Self> {
        Some(Self {
            instant: self.instant.checked_add(duration.num_milliseconds())?,
            offset: self.offset,
        })
    }

    /// Subtract a duration, keeping the offset tag.
    pub fn checked_sub(&self, duration: Duration) -> Option<Self> {
        Some(Self {
            instant: self.instant.checked_sub(duration.num_milliseconds())?,
            offset: self.offset,
        })
    }

    /// Returns the duration between two values.
    ///
    /// Returns a negative duration if `other` is after `self`. Saturates at
    /// the bounds of [`Duration`].
    pub fn signed_duration_since(&self, other: Self) -> Duration {
        let millis = self.instant.saturating_sub(other.instant);
        Duration::try_milliseconds(millis).unwrap_or(if millis < 0 {
            Duration::MIN
        } else {
            Duration::MAX
        })
    }
}

impl Add<Duration> for TemporalValue {
    type Output = Self;

    fn add(self, rhs: Duration) -> Self::Output {
        Self {
            instant: self.instant.saturating_add(rhs.num_milliseconds()),
            offset: self.offset,
        }
    }
}

impl Sub for TemporalValue {
    type Output = Duration;

    fn sub(self, rhs: Self) -> Self::Output {
        self.signed_duration_since(rhs)
    }
}

impl PartialEq for TemporalValue {
    fn eq(&self, other: &Self) -> bool {
        self.instant == other.instant
    }
}

impl Eq for TemporalValue {}

impl Hash for TemporalValue {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.instant.hash(state);
    }
}

impl Ord for TemporalValue {
    fn cmp(&self, other: &Self) -> Ordering {
        self.instant.cmp(&other.instant)
    }
}

impl PartialOrd for TemporalValue {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Debug for TemporalValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TemporalValue({self} [{}])", self.instant)
    }
}

impl fmt::Display for TemporalValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(dt) = self.to_fixed() {
            return write!(f, "{}", dt.format("%Y-%m-%d %H:%M%:z"));
        }
        let Some(utc) = self.to_utc() else {
            return write!(f, "@{}ms", self.instant);
        };
        let tag = match self.offset {
            OffsetTag::UnknownLocationSpecific => "location",
            OffsetTag::System => "system",
            OffsetTag::Network => "network",
            OffsetTag::Minutes(_) => "invalid offset",
        };
        write!(f, "{} UTC ({tag})", utc.format("%Y-%m-%d %H:%M"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 2024-03-15 08:00:00 UTC
    const BASE: i64 = 1_710_489_600_000;

    #[test]
    fn equality_ignores_offset() {
        let a = TemporalValue::new(BASE, 60);
        let b = TemporalValue::new(BASE, -300);
        let c = TemporalValue::system(BASE);

        assert_eq!(a, b);
        assert_eq!(a, c);
        assert_ne!(a, TemporalValue::new(BASE + 1, 60));
    }

    #[test]
    fn hash_consistent_with_equality() {
        use std::collections::HashSet;

        let mut set = HashSet::new();
        set.insert(TemporalValue::new(BASE, 60));

        assert!(set.contains(&TemporalValue::network(BASE)));
        assert!(!set.contains(&TemporalValue::new(BASE + 60_000, 60)));
    }

    #[test]
    fn ordering_by_instant() {
        // Earlier instant with a large offset still sorts first
        let early = TemporalValue::new(BASE, 600);
        let late = TemporalValue::new(BASE + 60_000, -600);

        assert!(early < late);
        assert_eq!(early.cmp(&early), Ordering::Equal);
    }

    #[test]
    fn offset_from_timezone_tracks_dst() {
        let berlin: Tz = "Europe/Berlin".parse().unwrap();

        // 2024-03-31 00:59 UTC is 01:59 CET, one minute before the switch
        let before = TemporalValue::in_timezone(1_711_846_740_000, &berlin);
        // 2024-03-31 01:00 UTC is 03:00 CEST
        let after = TemporalValue::in_timezone(1_711_846_800_000, &berlin);

        assert_eq!(before.offset_minutes(), Some(60));
        assert_eq!(after.offset_minutes(), Some(120));
    }

    #[test]
    fn sentinel_predicates() {
        let v = TemporalValue::location_specific(BASE);
        assert!(v.is_unknown_location_specific());
        assert!(!v.is_system_offset());
        assert!(!v.is_network_offset());
        assert_eq!(v.offset_minutes(), None);

        assert!(TemporalValue::system(BASE).is_system_offset());
        assert!(TemporalValue::network(BASE).is_network_offset());

        assert!(TemporalValue::offset_is_unknown_location_specific(
            UNKNOWN_LOCATION_SPECIFIC_OFFSET
        ));
        assert!(TemporalValue::offset_is_system(SYSTEM_OFFSET));
        assert!(TemporalValue::offset_is_network(NETWORK_OFFSET));
        assert!(!TemporalValue::offset_is_network(0));
    }

    #[test]
    fn raw_offset_roundtrip() {
        for raw in [
            0,
            60,
            -300,
            UNKNOWN_LOCATION_SPECIFIC_OFFSET,
            SYSTEM_OFFSET,
            NETWORK_OFFSET,
        ] {
            assert_eq!(TemporalValue::new(BASE, raw).raw_offset(), raw);
        }
    }

    #[test]
    fn display_format() {
        assert_eq!(
            TemporalValue::new(BASE, 60).to_string(),
            "2024-03-15 09:00+01:00"
        );
        assert_eq!(
            TemporalValue::new(BASE, -330).to_string(),
            "2024-03-15 02:30-05:30"
        );
        assert_eq!(
            TemporalValue::network(BASE).to_string(),
            "2024-03-15 08:00 UTC (network)"
        );
    }

    #[test]
    fn duration_arithmetic() {
        let t = TemporalValue::new(BASE, 60);
        let later = t + Duration::minutes(42);

        assert_eq!(later.signed_duration_since(t), Duration::minutes(42));
        assert_eq!(t - later, -Duration::minutes(42));
        assert_eq!(later.offset_minutes(), Some(60));
        assert_eq!(later.checked_sub(Duration::minutes(42)), Some(t));
    }

    #[test]
    fn duration_saturates_at_extremes() {
        let max = TemporalValue::new(i64::MAX, 0);
        let before_epoch = TemporalValue::new(-1, 0);

        assert_eq!(before_epoch - max, Duration::MIN);
        assert_eq!(max - TemporalValue::new(i64::MIN, 0), Duration::MAX);
    }

    #[test]
    fn epoch_minute_floors() {
        assert_eq!(TemporalValue::new(59_999, 0).epoch_minute(), 0);
        assert_eq!(TemporalValue::new(60_000, 0).epoch_minute(), 1);
        assert_eq!(TemporalValue::new(-1, 0).epoch_minute(), -1);
    }

    #[test]
    fn from_datetime_keeps_offset() {
        let offset = FixedOffset::east_opt(2 * 3600).unwrap();
        let dt = offset.with_ymd_and_hms(2024, 7, 1, 10, 0, 0).unwrap();
        let v = TemporalValue::from_datetime(&dt);

        assert_eq!(v.offset_minutes(), Some(120));
        assert_eq!(v.to_fixed(), Some(dt));
    }

    #[test]
    fn serde_shape() {
        let v = TemporalValue::new(BASE, 60);
        let json = serde_json::to_string(&v).unwrap();
        assert_eq!(json, r#"{"instant":1710489600000,"offset":60}"#);

        let sentinel: TemporalValue =
            serde_json::from_str(&format!(r#"{{"instant":{BASE},"offset":{SYSTEM_OFFSET}}}"#))
                .unwrap();
        assert!(sentinel.is_system_offset());
    }
}
