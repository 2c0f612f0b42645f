//! Process kinds: the phases of the depot pipeline a bus traverses.

use serde::{Deserialize, Serialize};

use super::Time;

/// Distinguishes the two service-type processes that share the
/// `(duration, None)` shape (`spec.md` §3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ServiceKind {
    Shunt,
    Clean,
}

/// The kind of a [`Process`], disambiguated from `(duration, electric_power)`
/// presence exactly as `SPEC_FULL.md` §4.4 describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProcessKind {
    Service(ServiceKind),
    Charge,
    Precondition,
    Standby,
    StandbyDeparture,
}

impl ProcessKind {
    /// Resolves the kind from the `(duration, electric_power, dispatchable)`
    /// triple, matching `original_source`'s `process_type`.
    pub fn from_attributes(
        duration: Option<std::time::Duration>,
        electric_power: Option<f64>,
        dispatchable: bool,
        service_kind: Option<ServiceKind>,
    ) -> Self {
        match (duration, electric_power) {
            (Some(_), None) => ProcessKind::Service(service_kind.unwrap_or(ServiceKind::Clean)),
            (None, Some(_)) => ProcessKind::Charge,
            (Some(_), Some(_)) => ProcessKind::Precondition,
            (None, None) => {
                if dispatchable {
                    ProcessKind::StandbyDeparture
                } else {
                    ProcessKind::Standby
                }
            }
        }
    }

}

/// Resource-switch window: a period during which a shared resource's
/// effective capacity is reduced (worker breaks). See `SPEC_FULL.md` §3.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceSwitch {
    /// `(start, end)` windows, relative to the simulation's recurring
    /// period (e.g. seconds since midnight).
    pub windows: Vec<(Time, Time)>,
    /// Whether an in-progress acquire may be revoked when a window starts.
    pub preempt: bool,
    /// How many capacity units are removed during the window. `None` means
    /// the whole resource becomes unavailable.
    pub strength: Option<u32>,
    /// Whether a revoked task's remaining duration is preserved and
    /// rescheduled after the window ends.
    pub resume: bool,
    /// Lower value = more urgent when re-queued after preemption.
    pub priority: i32,
}

/// One phase in the depot pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Process {
    pub kind: ProcessKind,
    /// Fixed duration, for SHUNT/CLEAN/PRECONDITION.
    pub duration: Option<std::time::Duration>,
    /// Rated power, for CHARGE/PRECONDITION, kW.
    pub electric_power_kw: Option<f64>,
    /// Shared resource capacity required to run this process (e.g. worker
    /// pool size). `None` means no shared resource is needed beyond the
    /// area slot itself.
    pub resource_capacity: Option<u32>,
    pub resource_switch: Option<ResourceSwitch>,
    /// Whether the shared resource may preempt an in-progress hold for a
    /// break — independent of `resource_switch.preempt`, which only
    /// controls whether a break *triggers* preemption at all; this flag
    /// gates whether this particular process type is preemptable.
    pub preemptable: bool,
    /// Whether the dispatch strategy may claim a vehicle parked here
    /// (`original_source/eflips/depot/api/private/depot.py:495-505`:
    /// STANDBY_DEPARTURE is always built this way, and a CHARGE process
    /// may opt in too — a vehicle mid-charge can be claimed, cutting its
    /// charge short, per `spec.md` §4.4/§5). A field in its own right
    /// rather than derived from `kind`, since two processes of the same
    /// kind can differ on this (an overnight-only CHARGE area vs. one that
    /// also feeds daytime dispatch).
    pub dispatchable: bool,
}

impl Process {
    pub fn dispatchable(&self) -> bool {
        self.dispatchable
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn duration_only_is_service() {
        let kind = ProcessKind::from_attributes(
            Some(Duration::from_secs(300)),
            None,
            false,
            Some(ServiceKind::Shunt),
        );
        assert_eq!(kind, ProcessKind::Service(ServiceKind::Shunt));
    }

    #[test]
    fn power_only_is_charge() {
        let kind = ProcessKind::from_attributes(None, Some(90.0), false, None);
        assert_eq!(kind, ProcessKind::Charge);
    }

    #[test]
    fn both_present_is_precondition() {
        let kind = ProcessKind::from_attributes(Some(Duration::from_secs(600)), Some(10.0), false, None);
        assert_eq!(kind, ProcessKind::Precondition);
    }

    #[test]
    fn neither_dispatchable_is_standby() {
        let kind = ProcessKind::from_attributes(None, None, false, None);
        assert_eq!(kind, ProcessKind::Standby);
    }

    #[test]
    fn neither_and_dispatchable_is_standby_departure() {
        let kind = ProcessKind::from_attributes(None, None, true, None);
        assert_eq!(kind, ProcessKind::StandbyDeparture);
    }

    #[test]
    fn dispatchable_is_a_field_independent_of_kind() {
        let charge = Process {
            kind: ProcessKind::Charge,
            duration: None,
            electric_power_kw: Some(90.0),
            resource_capacity: None,
            resource_switch: None,
            preemptable: false,
            dispatchable: true,
        };
        assert!(charge.dispatchable());
    }
}
