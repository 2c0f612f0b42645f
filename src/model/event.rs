//! Event records: the simulator's output timeline per vehicle.

use serde::{Deserialize, Serialize};

use super::area::AreaId;
use super::rotation::RotationId;
use super::vehicle::VehicleId;
use super::Time;

/// The kind of an [`Event`]: every [`crate::model::ProcessKind`] plus the
/// two synthesized kinds `spec.md` §3 adds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventKind {
    Shunt,
    Clean,
    Charge,
    Precondition,
    Standby,
    StandbyDeparture,
    /// Synthesized from a [`crate::model::Trip`] — not produced by walking
    /// the depot plan.
    Driving,
    /// A CHARGE event after C8 has reshaped its power-vs-time profile.
    ChargingDepot,
}

impl From<crate::model::ProcessKind> for EventKind {
    fn from(kind: crate::model::ProcessKind) -> Self {
        use crate::model::process::ServiceKind;
        use crate::model::ProcessKind as PK;
        match kind {
            PK::Service(ServiceKind::Shunt) => EventKind::Shunt,
            PK::Service(ServiceKind::Clean) => EventKind::Clean,
            PK::Charge => EventKind::Charge,
            PK::Precondition => EventKind::Precondition,
            PK::Standby => EventKind::Standby,
            PK::StandbyDeparture => EventKind::StandbyDeparture,
        }
    }
}

/// One point in a vehicle's SoC-vs-time series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SocPoint {
    pub time: Time,
    pub soc: f64,
}

/// An immutable result record: one phase of one vehicle's depot stay or
/// driving leg.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub vehicle: VehicleId,
    pub rotation: Option<RotationId>,
    pub kind: EventKind,
    /// `None` for DRIVING events.
    pub area: Option<AreaId>,
    pub slot_index: Option<u32>,
    pub time_start: Time,
    pub time_end: Time,
    pub soc_start: f64,
    pub soc_end: f64,
    /// Present for CHARGE/CHARGING_DEPOT events once a detailed profile is
    /// known (post-C8, or from C4's closed-form integration).
    pub soc_timeseries: Option<Vec<SocPoint>>,
}

impl Event {
    pub fn duration(&self) -> Time {
        self.time_end - self.time_start
    }

    pub fn is_zero_duration(&self) -> bool {
        self.time_start == self.time_end
    }
}
