//! Derived, read-only session statistics: elapsed time, power summaries, trend.

use std::time::Duration;

use crate::session::{History, SessionState};

/// Number of newest history points compared against the window before them.
pub const TREND_WINDOW: usize = 5;

/// Relative change in mean power treated as noise rather than a trend.
pub const TREND_TOLERANCE: f64 = 0.02;

/// Direction of recent power.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PowerTrend {
    Rising,
    Falling,
    Steady,
    /// Not enough history to tell.
    Unknown,
}

impl PowerTrend {
    pub fn arrow(self) -> &'static str {
        match self {
            Self::Rising => "↑",
            Self::Falling => "↓",
            Self::Steady => "→",
            Self::Unknown => "·",
        }
    }
}

impl std::fmt::Display for PowerTrend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Rising => write!(f, "rising"),
            Self::Falling => write!(f, "falling"),
            Self::Steady => write!(f, "steady"),
            Self::Unknown => write!(f, "unknown"),
        }
    }
}

/// Summary of one power series.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SeriesSummary {
    pub latest: Option<f64>,
    pub average: Option<f64>,
    pub max: Option<f64>,
    pub samples: usize,
    pub trend: PowerTrend,
}

impl SeriesSummary {
    pub fn from_history(history: &History) -> Self {
        let values = history.values();
        if values.is_empty() {
            return Self {
                latest: None,
                average: None,
                max: None,
                samples: 0,
                trend: PowerTrend::Unknown,
            };
        }
        let n = values.len() as f64;
        Self {
            latest: values.last().copied(),
            average: Some(values.iter().sum::<f64>() / n),
            max: Some(values.iter().copied().fold(f64::MIN, f64::max)),
            samples: values.len(),
            trend: trend(&values, TREND_WINDOW),
        }
    }
}

/// Statistics computed from one session version.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionStats {
    pub elapsed_ticks: u64,
    /// Elapsed time assuming one real update per second.
    pub elapsed: Duration,
    /// Offset of the latest real update, if any arrived.
    pub wall_elapsed: Option<Duration>,
    pub real_power: SeriesSummary,
    pub simulated_power: SeriesSummary,
}

impl SessionStats {
    pub fn from_state(state: &SessionState) -> Self {
        Self {
            elapsed_ticks: state.total_elapsed_ticks,
            elapsed: Duration::from_secs(state.total_elapsed_ticks),
            wall_elapsed: state.last_real_at,
            real_power: SeriesSummary::from_history(&state.power_history),
            simulated_power: SeriesSummary::from_history(&state.simulated_power_history),
        }
    }

    /// Difference between wall-clock and tick-count elapsed time, in seconds.
    ///
    /// Positive when the real feed runs slower than one update per second.
    pub fn clock_drift_secs(&self) -> Option<f64> {
        self.wall_elapsed
            .map(|wall| wall.as_secs_f64() - self.elapsed.as_secs_f64())
    }
}

/// Compare the mean of the newest `window` values with the `window` before them.
pub fn trend(values: &[f64], window: usize) -> PowerTrend {
    if window == 0 || values.len() < window * 2 {
        return PowerTrend::Unknown;
    }
    let recent = &values[values.len() - window..];
    let before = &values[values.len() - window * 2..values.len() - window];
    let mean = |w: &[f64]| w.iter().sum::<f64>() / w.len() as f64;
    let (now, then) = (mean(recent), mean(before));

    let scale = then.abs().max(1e-9);
    let change = (now - then) / scale;
    if change > TREND_TOLERANCE {
        PowerTrend::Rising
    } else if change < -TREND_TOLERANCE {
        PowerTrend::Falling
    } else {
        PowerTrend::Steady
    }
}

/// Format a duration as `mm:ss`, or `h:mm:ss` past the hour.
pub fn format_elapsed(d: Duration) -> String {
    let total = d.as_secs();
    let (h, m, s) = (total / 3600, (total / 60) % 60, total % 60);
    if h > 0 {
        format!("{h}:{m:02}:{s:02}")
    } else {
        format!("{m:02}:{s:02}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metric::MetricSnapshot;
    use crate::reducer::{Event, reduce_all};

    #[test]
    fn trend_needs_two_windows() {
        assert_eq!(trend(&[1.0, 2.0, 3.0], 5), PowerTrend::Unknown);
        assert_eq!(trend(&[], 0), PowerTrend::Unknown);
    }

    #[test]
    fn trend_detects_direction() {
        let rising: Vec<f64> = (0..10).map(|i| 100.0 + 10.0 * i as f64).collect();
        assert_eq!(trend(&rising, 5), PowerTrend::Rising);
        let falling: Vec<f64> = rising.iter().rev().copied().collect();
        assert_eq!(trend(&falling, 5), PowerTrend::Falling);
        assert_eq!(trend(&[200.0; 10], 5), PowerTrend::Steady);
    }

    #[test]
    fn trend_ignores_small_wobble() {
        let vals = [200.0, 201.0, 199.0, 200.0, 200.0, 201.0, 202.0, 200.0, 199.0, 201.0];
        assert_eq!(trend(&vals, 5), PowerTrend::Steady);
    }

    #[test]
    fn stats_from_state() {
        let events: Vec<_> = (0..12)
            .map(|i| {
                Event::real(
                    MetricSnapshot::new(100.0 + 20.0 * i as f64, 0.0, 0.0, 0.0),
                    Duration::from_secs(2 * i),
                )
            })
            .collect();
        let state = reduce_all(&SessionState::default(), &events);
        let stats = SessionStats::from_state(&state);

        assert_eq!(stats.elapsed_ticks, 12);
        assert_eq!(stats.elapsed, Duration::from_secs(12));
        assert_eq!(stats.wall_elapsed, Some(Duration::from_secs(22)));
        assert_eq!(stats.clock_drift_secs(), Some(10.0));
        assert_eq!(stats.real_power.samples, 12);
        assert_eq!(stats.real_power.latest, Some(320.0));
        assert_eq!(stats.real_power.max, Some(320.0));
        assert_eq!(stats.real_power.average, Some(210.0));
        assert_eq!(stats.real_power.trend, PowerTrend::Rising);
        assert_eq!(stats.simulated_power.samples, 0);
        assert_eq!(stats.simulated_power.trend, PowerTrend::Unknown);
    }

    #[test]
    fn format_elapsed_minutes_and_hours() {
        assert_eq!(format_elapsed(Duration::from_secs(0)), "00:00");
        assert_eq!(format_elapsed(Duration::from_secs(75)), "01:15");
        assert_eq!(format_elapsed(Duration::from_secs(3725)), "1:02:05");
    }
}
