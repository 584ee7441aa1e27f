//! Session reducer: `(state, event) -> state`.
//!
//! This is the only place session invariants are enforced:
//! - history buffers never exceed their capacity and evict oldest-first;
//! - `total_elapsed_ticks` advances by exactly one per real update and never
//!   otherwise;
//! - toggling touches nothing but `active_source`.
//!
//! The reducer is total. Events it does not recognise leave the state as is.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::metric::MetricSnapshot;
use crate::session::{HistoryPoint, SessionState};

/// A full sample set and the offset from session start at which it was produced.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DataUpdate {
    pub values: MetricSnapshot,
    pub at: Duration,
}

/// Inputs to the reducer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    #[serde(rename = "UPDATE_REAL_DATA")]
    UpdateRealData(DataUpdate),
    #[serde(rename = "UPDATE_SIMULATED_DATA")]
    UpdateSimulatedData(DataUpdate),
    #[serde(rename = "TOGGLE_SIMULATION")]
    ToggleSimulation,
    /// Any event kind this version does not know about.
    #[serde(other)]
    Unrecognized,
}

impl Event {
    pub fn real(values: MetricSnapshot, at: Duration) -> Self {
        Self::UpdateRealData(DataUpdate { values, at })
    }

    pub fn simulated(values: MetricSnapshot, at: Duration) -> Self {
        Self::UpdateSimulatedData(DataUpdate { values, at })
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::UpdateRealData(_) => "UPDATE_REAL_DATA",
            Self::UpdateSimulatedData(_) => "UPDATE_SIMULATED_DATA",
            Self::ToggleSimulation => "TOGGLE_SIMULATION",
            Self::Unrecognized => "UNRECOGNIZED",
        }
    }
}

/// Apply one event, producing the next state version.
pub fn reduce(state: &SessionState, event: &Event) -> SessionState {
    match event {
        Event::UpdateRealData(update) => {
            let point = HistoryPoint {
                time_offset_minutes: state.time_offset_minutes(update.at),
                value: update.values.power,
            };
            SessionState {
                real_values: update.values,
                power_history: state.power_history.appended(point),
                total_elapsed_ticks: state.total_elapsed_ticks + 1,
                last_real_at: Some(update.at),
                ..state.clone()
            }
        }
        Event::UpdateSimulatedData(update) => {
            // Shares the real feed's time axis so both series line up on one chart.
            let point = HistoryPoint {
                time_offset_minutes: state.time_offset_minutes(update.at),
                value: update.values.power,
            };
            SessionState {
                simulated_values: update.values,
                previous_simulated_values: Some(update.values),
                simulated_power_history: state.simulated_power_history.appended(point),
                ..state.clone()
            }
        }
        Event::ToggleSimulation => SessionState {
            active_source: state.active_source.toggled(),
            ..state.clone()
        },
        Event::Unrecognized => state.clone(),
    }
}

/// Fold a sequence of events over `initial`.
pub fn reduce_all<'a, I>(initial: &SessionState, events: I) -> SessionState
where
    I: IntoIterator<Item = &'a Event>,
{
    events
        .into_iter()
        .fold(initial.clone(), |state, event| reduce(&state, event))
}
