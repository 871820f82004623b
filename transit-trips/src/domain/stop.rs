//! Stop type.
//!
//! A `Stop` is one location within a scheduled leg, with planned ("booked")
//! and predicted (realtime) arrival/departure state. Backends disagree about
//! which of the two is authoritative, so callers choose per query whether to
//! prefer the planned value.

use chrono::Duration;
use serde::{Deserialize, Serialize};

use super::{Location, Position, TemporalValue};

/// Planned and predicted state at one location.
///
/// # Time Semantics
///
/// - For the first stop of a leg only the departure side is meaningful
/// - For the last stop only the arrival side is meaningful
/// - Either of planned/predicted may be missing on each side
/// - Cancellation is tracked per side
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stop {
    /// Where the stop is
    pub location: Location,
    /// Timetabled arrival
    #[serde(default)]
    pub planned_arrival: Option<TemporalValue>,
    /// Realtime arrival estimate
    #[serde(default)]
    pub predicted_arrival: Option<TemporalValue>,
    /// Timetabled arrival platform
    #[serde(default)]
    pub planned_arrival_position: Option<Position>,
    /// Realtime arrival platform
    #[serde(default)]
    pub predicted_arrival_position: Option<Position>,
    /// Whether the arrival is cancelled
    #[serde(default)]
    pub arrival_cancelled: bool,
    /// Timetabled departure
    #[serde(default)]
    pub planned_departure: Option<TemporalValue>,
    /// Realtime departure estimate
    #[serde(default)]
    pub predicted_departure: Option<TemporalValue>,
    /// Timetabled departure platform
    #[serde(default)]
    pub planned_departure_position: Option<Position>,
    /// Realtime departure platform
    #[serde(default)]
    pub predicted_departure_position: Option<Position>,
    /// Whether the departure is cancelled
    #[serde(default)]
    pub departure_cancelled: bool,
}

/// Pick between a planned and a predicted value.
///
/// Planned wins only when preferred and present; otherwise predicted wins if
/// present; otherwise planned (which may be absent too).
fn resolve<T: Clone>(planned: &Option<T>, predicted: &Option<T>, prefer_planned: bool) -> Option<T> {
    if prefer_planned && planned.is_some() {
        planned.clone()
    } else if predicted.is_some() {
        predicted.clone()
    } else {
        planned.clone()
    }
}

fn delay(planned: Option<TemporalValue>, predicted: Option<TemporalValue>) -> Option<Duration> {
    match (planned, predicted) {
        (Some(planned), Some(predicted)) => Some(predicted.signed_duration_since(planned)),
        _ => None,
    }
}

impl Stop {
    /// Creates a stop at a location with no times.
    pub fn new(location: Location) -> Self {
        Self {
            location,
            planned_arrival: None,
            predicted_arrival: None,
            planned_arrival_position: None,
            predicted_arrival_position: None,
            arrival_cancelled: false,
            planned_departure: None,
            predicted_departure: None,
            planned_departure_position: None,
            predicted_departure_position: None,
            departure_cancelled: false,
        }
    }

    /// Set planned and predicted arrival.
    pub fn with_arrival(
        mut self,
        planned: Option<TemporalValue>,
        predicted: Option<TemporalValue>,
    ) -> Self {
        self.planned_arrival = planned;
        self.predicted_arrival = predicted;
        self
    }

    /// Set planned and predicted departure.
    pub fn with_departure(
        mut self,
        planned: Option<TemporalValue>,
        predicted: Option<TemporalValue>,
    ) -> Self {
        self.planned_departure = planned;
        self.predicted_departure = predicted;
        self
    }

    /// Returns the arrival time, choosing between planned and predicted.
    ///
    /// # Examples
    ///
    /// ```
    /// use transit_trips::domain::{Location, Stop, TemporalValue};
    ///
    /// let planned = TemporalValue::new(1_710_489_600_000, 60);
    /// let predicted = TemporalValue::new(1_710_489_780_000, 60);
    ///
    /// let stop = Stop::new(Location::station("1", "Alexanderplatz"))
    ///     .with_arrival(Some(planned), Some(predicted));
    ///
    /// assert_eq!(stop.resolve_arrival(false), Some(predicted));
    /// assert_eq!(stop.resolve_arrival(true), Some(planned));
    /// assert!(stop.is_arrival_predicted(false));
    /// assert_eq!(stop.arrival_delay(), Some(chrono::Duration::minutes(3)));
    /// ```
    pub fn resolve_arrival(&self, prefer_planned: bool) -> Option<TemporalValue> {
        resolve(&self.planned_arrival, &self.predicted_arrival, prefer_planned)
    }

    /// Returns true if `resolve_arrival` would return the predicted value.
    pub fn is_arrival_predicted(&self, prefer_planned: bool) -> bool {
        !(prefer_planned && self.planned_arrival.is_some()) && self.predicted_arrival.is_some()
    }

    /// Returns the departure time, choosing between planned and predicted.
    pub fn resolve_departure(&self, prefer_planned: bool) -> Option<TemporalValue> {
        resolve(&self.planned_departure, &self.predicted_departure, prefer_planned)
    }

    /// Returns true if `resolve_departure` would return the predicted value.
    pub fn is_departure_predicted(&self, prefer_planned: bool) -> bool {
        !(prefer_planned && self.planned_departure.is_some()) && self.predicted_departure.is_some()
    }

    /// Predicted minus planned arrival.
    ///
    /// `None` unless both are known: a missing side means the delay is
    /// unknown, not zero. Negative when early.
    pub fn arrival_delay(&self) -> Option<Duration> {
        delay(self.planned_arrival, self.predicted_arrival)
    }

    /// Predicted minus planned departure. See [`Stop::arrival_delay`].
    pub fn departure_delay(&self) -> Option<Duration> {
        delay(self.planned_departure, self.predicted_departure)
    }

    /// Arrival platform, choosing between planned and predicted.
    pub fn resolve_arrival_position(&self, prefer_planned: bool) -> Option<Position> {
        resolve(
            &self.planned_arrival_position,
            &self.predicted_arrival_position,
            prefer_planned,
        )
    }

    /// Departure platform, choosing between planned and predicted.
    pub fn resolve_departure_position(&self, prefer_planned: bool) -> Option<Position> {
        resolve(
            &self.planned_departure_position,
            &self.predicted_departure_position,
            prefer_planned,
        )
    }

    /// Returns true if the predicted departure platform differs from the plan.
    pub fn is_departure_position_changed(&self) -> bool {
        matches!(
            (&self.planned_departure_position, &self.predicted_departure_position),
            (Some(planned), Some(predicted)) if planned != predicted
        )
    }

    /// Earliest plausible departure: the earlier of planned and predicted.
    pub fn min_time(&self) -> Option<TemporalValue> {
        match (self.planned_departure, self.predicted_departure) {
            (Some(planned), Some(predicted)) => Some(planned.min(predicted)),
            (planned, predicted) => planned.or(predicted),
        }
    }

    /// Latest plausible arrival: the later of planned and predicted.
    pub fn max_time(&self) -> Option<TemporalValue> {
        match (self.planned_arrival, self.predicted_arrival) {
            (Some(planned), Some(predicted)) => Some(planned.max(predicted)),
            (planned, predicted) => planned.or(predicted),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 2024-03-15 08:00 UTC
    const BASE: i64 = 1_710_489_600_000;

    fn at(minutes: i64) -> TemporalValue {
        TemporalValue::new(BASE + minutes * 60_000, 60)
    }

    fn stop() -> Stop {
        Stop::new(Location::station("900100003", "S+U Alexanderplatz"))
    }

    #[test]
    fn new_has_no_times() {
        let s = stop();
        assert!(s.resolve_arrival(false).is_none());
        assert!(s.resolve_departure(true).is_none());
        assert!(!s.arrival_cancelled);
        assert!(!s.departure_cancelled);
        assert!(s.min_time().is_none());
        assert!(s.max_time().is_none());
    }

    #[test]
    fn resolve_prefers_predicted_by_default() {
        let s = stop().with_arrival(Some(at(0)), Some(at(3)));

        assert_eq!(s.resolve_arrival(false), Some(at(3)));
        assert!(s.is_arrival_predicted(false));

        assert_eq!(s.resolve_arrival(true), Some(at(0)));
        assert!(!s.is_arrival_predicted(true));
    }

    #[test]
    fn resolve_falls_back_either_way() {
        let planned_only = stop().with_departure(Some(at(0)), None);
        assert_eq!(planned_only.resolve_departure(false), Some(at(0)));
        assert!(!planned_only.is_departure_predicted(false));

        let predicted_only = stop().with_departure(None, Some(at(2)));
        assert_eq!(predicted_only.resolve_departure(true), Some(at(2)));
        assert!(predicted_only.is_departure_predicted(true));
    }

    #[test]
    fn delay_requires_both_sides() {
        let late = stop().with_arrival(Some(at(0)), Some(at(3)));
        assert_eq!(late.arrival_delay(), Some(Duration::minutes(3)));

        let early = stop().with_departure(Some(at(10)), Some(at(9)));
        assert_eq!(early.departure_delay(), Some(Duration::minutes(-1)));

        let on_time = stop().with_departure(Some(at(10)), Some(at(10)));
        assert_eq!(on_time.departure_delay(), Some(Duration::zero()));

        assert_eq!(stop().with_arrival(Some(at(0)), None).arrival_delay(), None);
        assert_eq!(stop().with_arrival(None, Some(at(0))).arrival_delay(), None);
    }

    #[test]
    fn min_and_max_time_bound_revisions() {
        // Departure brought forward: min is the predicted time
        let s = stop().with_departure(Some(at(10)), Some(at(8)));
        assert_eq!(s.min_time(), Some(at(8)));

        // Departure delayed: min stays at the plan
        let s = stop().with_departure(Some(at(10)), Some(at(15)));
        assert_eq!(s.min_time(), Some(at(10)));

        // Arrival delayed: max is the predicted time
        let s = stop().with_arrival(Some(at(30)), Some(at(34)));
        assert_eq!(s.max_time(), Some(at(34)));

        // Only one side known
        let s = stop().with_arrival(None, Some(at(31)));
        assert_eq!(s.max_time(), Some(at(31)));
    }

    #[test]
    fn positions_resolve_like_times() {
        let mut s = stop();
        s.planned_departure_position = Some(Position::new("1").unwrap());
        s.predicted_departure_position = Some(Position::new("4").unwrap());

        assert_eq!(s.resolve_departure_position(false), Position::new("4").ok());
        assert_eq!(s.resolve_departure_position(true), Position::new("1").ok());
        assert!(s.is_departure_position_changed());

        s.predicted_departure_position = None;
        assert_eq!(s.resolve_departure_position(false), Position::new("1").ok());
        assert!(!s.is_departure_position_changed());
        assert_eq!(s.resolve_arrival_position(false), None);
    }
}
