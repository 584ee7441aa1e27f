//! Bounded random-walk sample generator.
//!
//! Without a previous value the generator draws uniformly from the metric's
//! range. With one, it steps by at most ±5% of the range and clamps, so the
//! synthetic signal drifts like a physiological one instead of jittering.

use rand::Rng;

use crate::metric::{MetricKind, MetricSnapshot};

/// Maximum step of the random walk, as a fraction of the range width.
pub const WALK_STEP_FRACTION: f64 = 0.05;

/// Inclusive value range for a metric.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MetricRange {
    pub min: f64,
    pub max: f64,
}

impl MetricRange {
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    pub fn width(&self) -> f64 {
        self.max - self.min
    }

    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }
}

/// Generate the next value for a metric in `[min, max]`.
///
/// `min <= max` is assumed; there are no failure conditions.
pub fn generate<R: Rng + ?Sized>(rng: &mut R, min: f64, max: f64, previous: Option<f64>) -> f64 {
    match previous {
        None => rng.random_range(min..=max),
        Some(prev) => {
            let half = WALK_STEP_FRACTION * (max - min);
            let noise = rng.random_range(-half..=half);
            (prev + noise).clamp(min, max)
        }
    }
}

/// Fixed ranges used by the simulated feed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimulationProfile {
    pub power: MetricRange,
    pub heart_rate: MetricRange,
    pub cadence: MetricRange,
    pub speed: MetricRange,
}

impl Default for SimulationProfile {
    fn default() -> Self {
        Self {
            power: MetricRange::new(100.0, 300.0),
            heart_rate: MetricRange::new(60.0, 180.0),
            cadence: MetricRange::new(50.0, 120.0),
            speed: MetricRange::new(20.0, 40.0),
        }
    }
}

impl SimulationProfile {
    pub fn range(&self, kind: MetricKind) -> MetricRange {
        match kind {
            MetricKind::Power => self.power,
            MetricKind::HeartRate => self.heart_rate,
            MetricKind::Cadence => self.cadence,
            MetricKind::Speed => self.speed,
        }
    }

    /// Generate one value for `kind`, rounded the way it is reported.
    pub fn sample<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        kind: MetricKind,
        previous: Option<f64>,
    ) -> f64 {
        let range = self.range(kind);
        round_for_display(kind, generate(rng, range.min, range.max, previous))
    }

    /// Generate a full sample set seeded from the previous set, if any.
    pub fn next_snapshot<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        previous: Option<&MetricSnapshot>,
    ) -> MetricSnapshot {
        let mut next = MetricSnapshot::default();
        for kind in MetricKind::ALL {
            let seed = previous.map(|p| p.get(kind));
            next.set(kind, self.sample(rng, kind, seed));
        }
        next
    }
}

/// Speed is reported to one decimal place; every other metric to the nearest integer.
pub fn round_for_display(kind: MetricKind, value: f64) -> f64 {
    match kind {
        MetricKind::Speed => (value * 10.0).round() / 10.0,
        _ => value.round(),
    }
}
