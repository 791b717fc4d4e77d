use chrono::{DateTime, Utc};

use crate::geometry::{self, LookAngle};
use crate::observer::ObserverState;
use crate::predict::Propagator;
use crate::presenter::LookAngleReport;
use crate::tracking::error::LookAngleError;
use crate::tracking::types::{
    RefreshEvent, SatelliteSpec, SatelliteStatus, TrackState, TrackedSatellite, Transition,
};

/// The satellites of one session, in a stable order.
#[derive(Debug, Default)]
pub struct Roster {
    satellites: Vec<TrackedSatellite>,
}

impl Roster {
    /// Replaces the whole roster. Later specs win over earlier ones with the same id.
    pub fn initialize(&mut self, specs: Vec<SatelliteSpec>) {
        self.satellites.clear();
        for spec in specs {
            match self.satellites.iter().position(|s| s.id == spec.id) {
                Some(index) => {
                    log::warn!("duplicate satellite id {}, using the later entry", spec.id);
                    self.satellites[index] = TrackedSatellite::new(spec);
                }
                None => self.satellites.push(TrackedSatellite::new(spec)),
            }
        }
        log::info!("Tracking {} satellites", self.satellites.len());
    }

    pub fn len(&self) -> usize {
        self.satellites.len()
    }

    pub fn get(&self, id: &str) -> Option<&TrackedSatellite> {
        self.satellites.iter().find(|s| s.id == id)
    }

    /// Propagates every satellite to `now`. The returned events are meant to
    /// be presented once the roster is no longer borrowed.
    pub fn refresh_all(
        &mut self,
        now: DateTime<Utc>,
        propagator: &dyn Propagator,
    ) -> Vec<RefreshEvent> {
        let mut events = Vec::with_capacity(self.satellites.len());

        for satellite in &mut self.satellites {
            match propagator.propagate(&satellite.elements, now) {
                Ok(position) => {
                    let transition = match satellite.state {
                        TrackState::Uninitialized => Transition::Acquired,
                        TrackState::Tracking { .. } => Transition::Updated,
                    };
                    satellite.state = TrackState::Tracking {
                        position,
                        updated_at: now,
                        stale: false,
                    };
                    events.push(RefreshEvent::Updated {
                        id: satellite.id.clone(),
                        position,
                        transition,
                    });
                }
                Err(error) => {
                    if let TrackState::Tracking { stale, .. } = &mut satellite.state {
                        *stale = true;
                    }
                    events.push(RefreshEvent::Stale {
                        id: satellite.id.clone(),
                        error,
                    });
                }
            }
        }

        events
    }

    pub fn compute_look_angle(
        &self,
        observer: &ObserverState,
        id: &str,
    ) -> Result<LookAngle, LookAngleError> {
        self.report(observer, id).map(|report| report.look_angle)
    }

    pub fn report(
        &self,
        observer: &ObserverState,
        id: &str,
    ) -> Result<LookAngleReport, LookAngleError> {
        let observer = observer
            .position
            .ok_or(LookAngleError::NoObserverPosition)?;
        let satellite = self
            .get(id)
            .ok_or_else(|| LookAngleError::UnknownSatellite(id.to_string()))?;

        match &satellite.state {
            TrackState::Uninitialized => Err(LookAngleError::NotPropagated(id.to_string())),
            TrackState::Tracking {
                position,
                updated_at,
                stale,
            } => Ok(LookAngleReport {
                satellite: satellite.id.clone(),
                position_time: *updated_at,
                stale: *stale,
                observer,
                position: *position,
                look_angle: geometry::look_angle(&observer, position),
            }),
        }
    }

    pub fn statuses(&self) -> Vec<SatelliteStatus> {
        self.satellites.iter().map(TrackedSatellite::status).collect()
    }
}
