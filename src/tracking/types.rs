use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::geometry::SatellitePosition;
use crate::predict::{OrbitalElements, PropagationError};
use crate::presenter::Presenter;

#[derive(Debug)]
pub struct SatelliteSpec {
    pub id: String,
    pub elements: OrbitalElements,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TrackState {
    Uninitialized,
    Tracking {
        position: SatellitePosition,
        updated_at: DateTime<Utc>,
        /// Latest propagation failed; `position` is from an earlier tick.
        stale: bool,
    },
}

/// What a successful refresh did to a satellite.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
#[strum(serialize_all = "snake_case")]
pub enum Transition {
    Acquired,
    Updated,
}

#[derive(Debug)]
pub struct TrackedSatellite {
    pub id: String,
    pub elements: OrbitalElements,
    pub state: TrackState,
}

impl TrackedSatellite {
    pub fn new(spec: SatelliteSpec) -> Self {
        Self {
            id: spec.id,
            elements: spec.elements,
            state: TrackState::Uninitialized,
        }
    }

    pub fn last_position(&self) -> Option<&SatellitePosition> {
        match &self.state {
            TrackState::Uninitialized => None,
            TrackState::Tracking { position, .. } => Some(position),
        }
    }

    pub fn is_stale(&self) -> bool {
        matches!(self.state, TrackState::Tracking { stale: true, .. })
    }

    pub fn status(&self) -> SatelliteStatus {
        let (position, updated_at) = match &self.state {
            TrackState::Uninitialized => (None, None),
            TrackState::Tracking {
                position,
                updated_at,
                ..
            } => (Some(*position), Some(*updated_at)),
        };
        SatelliteStatus {
            id: self.id.clone(),
            norad_id: self.elements.norad_id(),
            position,
            updated_at,
            stale: self.is_stale(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SatelliteStatus {
    pub id: String,
    pub norad_id: u32,
    pub position: Option<SatellitePosition>,
    pub updated_at: Option<DateTime<Utc>>,
    pub stale: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RefreshSummary {
    pub updated: usize,
    pub stale: usize,
}

impl RefreshSummary {
    pub fn of(events: &[RefreshEvent]) -> Self {
        events.iter().fold(Self::default(), |mut summary, event| {
            match event {
                RefreshEvent::Updated { .. } => summary.updated += 1,
                RefreshEvent::Stale { .. } => summary.stale += 1,
            }
            summary
        })
    }
}

/// Outcome of one satellite in one refresh, in roster order.
#[derive(Debug, Clone, PartialEq)]
pub enum RefreshEvent {
    Updated {
        id: String,
        position: SatellitePosition,
        transition: Transition,
    },
    Stale {
        id: String,
        error: PropagationError,
    },
}

impl RefreshEvent {
    pub fn present(&self, presenter: &dyn Presenter) {
        match self {
            RefreshEvent::Updated {
                id,
                position,
                transition,
            } => presenter.position_updated(id, position, *transition),
            RefreshEvent::Stale { id, error } => presenter.position_stale(id, error),
        }
    }
}
