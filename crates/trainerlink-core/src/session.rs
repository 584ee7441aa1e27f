//! Session state: the single aggregate of a live training session.
//!
//! A [`SessionState`] is a value. The reducer never edits one in place; every
//! accepted event produces a new version, and consumers hold `Arc`s to whichever
//! version they last saw.

use std::collections::VecDeque;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::metric::{MetricKind, MetricSnapshot};

/// Number of history points retained per power series.
pub const HISTORY_CAPACITY: usize = 50;

/// Which feed the dashboard is currently showing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActiveSource {
    Real,
    #[default]
    Simulated,
}

impl ActiveSource {
    pub fn toggled(self) -> Self {
        match self {
            Self::Real => Self::Simulated,
            Self::Simulated => Self::Real,
        }
    }
}

impl std::fmt::Display for ActiveSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Real => write!(f, "real"),
            Self::Simulated => write!(f, "simulated"),
        }
    }
}

/// How history points are placed on the time axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ElapsedClock {
    /// One accepted real update counts as one second.
    #[default]
    ArrivalCount,
    /// Use the event's offset from session start.
    WallClock,
}

/// One charted point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryPoint {
    pub time_offset_minutes: f64,
    pub value: f64,
}

/// FIFO buffer that drops its oldest points beyond a fixed capacity.
#[derive(Debug, Clone, PartialEq)]
pub struct History {
    points: VecDeque<HistoryPoint>,
    capacity: usize,
}

impl History {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            points: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Copy of this history with `point` appended and the oldest points evicted.
    pub fn appended(&self, point: HistoryPoint) -> Self {
        let mut next = self.clone();
        next.points.push_back(point);
        while next.points.len() > next.capacity {
            next.points.pop_front();
        }
        next
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &HistoryPoint> + ExactSizeIterator {
        self.points.iter()
    }

    pub fn last(&self) -> Option<&HistoryPoint> {
        self.points.back()
    }

    pub fn values(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.value).collect()
    }

    /// `(time, value)` pairs ready for a line chart.
    pub fn to_xy(&self) -> Vec<(f64, f64)> {
        self.points
            .iter()
            .map(|p| (p.time_offset_minutes, p.value))
            .collect()
    }
}

/// The live session aggregate.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionState {
    /// Last known real value per metric; zero until the first real sample.
    pub real_values: MetricSnapshot,
    /// Last simulated sample set.
    pub simulated_values: MetricSnapshot,
    /// Last generator output, kept only to seed a restarted simulated feed.
    pub previous_simulated_values: Option<MetricSnapshot>,
    /// Real power series.
    pub power_history: History,
    /// Simulated power series.
    pub simulated_power_history: History,
    /// Accepted real updates so far.
    pub total_elapsed_ticks: u64,
    /// Offset of the latest accepted real update.
    pub last_real_at: Option<Duration>,
    pub active_source: ActiveSource,
    pub clock: ElapsedClock,
}

impl Default for SessionState {
    fn default() -> Self {
        Self::new(HISTORY_CAPACITY, ElapsedClock::default())
    }
}

impl SessionState {
    /// All-zero state with empty histories.
    pub fn new(history_capacity: usize, clock: ElapsedClock) -> Self {
        Self {
            real_values: MetricSnapshot::default(),
            simulated_values: MetricSnapshot::default(),
            previous_simulated_values: None,
            power_history: History::with_capacity(history_capacity),
            simulated_power_history: History::with_capacity(history_capacity),
            total_elapsed_ticks: 0,
            last_real_at: None,
            active_source: ActiveSource::default(),
            clock,
        }
    }

    /// Values of whichever feed is active.
    pub fn displayed_values(&self) -> &MetricSnapshot {
        match self.active_source {
            ActiveSource::Real => &self.real_values,
            ActiveSource::Simulated => &self.simulated_values,
        }
    }

    pub fn displayed(&self, kind: MetricKind) -> f64 {
        self.displayed_values().get(kind)
    }

    /// Time-axis position for an event received at `at`.
    pub fn time_offset_minutes(&self, at: Duration) -> f64 {
        match self.clock {
            ElapsedClock::ArrivalCount => self.total_elapsed_ticks as f64 / 60.0,
            ElapsedClock::WallClock => at.as_secs_f64() / 60.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point(t: f64, v: f64) -> HistoryPoint {
        HistoryPoint {
            time_offset_minutes: t,
            value: v,
        }
    }

    #[test]
    fn history_evicts_oldest_first() {
        let mut h = History::with_capacity(3);
        for i in 0..5 {
            h = h.appended(point(i as f64, i as f64 * 10.0));
        }
        assert_eq!(h.len(), 3);
        assert_eq!(h.values(), vec![20.0, 30.0, 40.0]);
    }

    #[test]
    fn appended_does_not_touch_previous_version() {
        let a = History::with_capacity(2).appended(point(0.0, 1.0));
        let b = a.appended(point(1.0, 2.0));
        assert_eq!(a.len(), 1);
        assert_eq!(b.len(), 2);
    }

    #[test]
    fn new_state_is_zeroed_and_simulated() {
        let s = SessionState::default();
        assert_eq!(s.real_values, MetricSnapshot::default());
        assert!(s.power_history.is_empty());
        assert_eq!(s.power_history.capacity(), HISTORY_CAPACITY);
        assert_eq!(s.total_elapsed_ticks, 0);
        assert_eq!(s.active_source, ActiveSource::Simulated);
        assert!(s.previous_simulated_values.is_none());
    }

    #[test]
    fn displayed_values_follow_active_source() {
        let mut s = SessionState::default();
        s.real_values.power = 150.0;
        s.simulated_values.power = 220.0;
        assert_eq!(s.displayed(MetricKind::Power), 220.0);
        s.active_source = ActiveSource::Real;
        assert_eq!(s.displayed(MetricKind::Power), 150.0);
    }

    #[test]
    fn time_offset_depends_on_clock() {
        let mut s = SessionState::new(HISTORY_CAPACITY, ElapsedClock::ArrivalCount);
        s.total_elapsed_ticks = 30;
        assert_eq!(s.time_offset_minutes(Duration::from_secs(600)), 0.5);
        s.clock = ElapsedClock::WallClock;
        assert_eq!(s.time_offset_minutes(Duration::from_secs(90)), 1.5);
    }

    #[test]
    fn toggled_flips() {
        assert_eq!(ActiveSource::Real.toggled(), ActiveSource::Simulated);
        assert_eq!(ActiveSource::Simulated.toggled().toggled(), ActiveSource::Simulated);
    }
}
