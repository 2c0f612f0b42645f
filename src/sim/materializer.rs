//! C5: collapses one simulator run's raw event log into a steady-state
//! result bundle — clipped to a single repetition window and summarized
//! by a sweep-line occupancy pass (`spec.md` §4.5).
//!
//! The engine (C4) runs three repetitions back to back
//! (`[-P,0) -> [0,T) -> [T,T+P)`) so that boundary events are fully formed
//! before the middle window is extracted; this module does the extracting.

use std::collections::HashMap;

use serde::Serialize;

use crate::model::area::AreaId;
use crate::model::event::Event;
use crate::model::vehicle::{Vehicle, VehicleId};
use crate::model::Time;

/// The highest number of vehicles simultaneously occupying one area over
/// the windowed run, and when that peak first occurred.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AreaOccupancyPeak {
    pub area: AreaId,
    pub peak: u32,
    pub at: Time,
}

/// The windowed, summarized output of one steady-state simulator run.
#[derive(Debug)]
pub struct ResultBundle {
    pub events: Vec<Event>,
    pub period: Time,
    pub area_peaks: Vec<AreaOccupancyPeak>,
}

impl ResultBundle {
    pub fn area_peak(&self, area: AreaId) -> u32 {
        self.area_peaks
            .iter()
            .find(|p| p.area == area)
            .map_or(0, |p| p.peak)
    }

    pub fn events_for(&self, vehicle: VehicleId) -> impl Iterator<Item = &Event> {
        self.events.iter().filter(move |e| e.vehicle == vehicle)
    }
}

/// Clips `raw_events` to `[0, period)`, interpolating the state of charge
/// at any boundary an event straddles from `vehicles`' battery logs, and
/// summarizes area occupancy with a sweep line.
pub fn materialize(raw_events: Vec<Event>, vehicles: &[Vehicle], period: Time) -> ResultBundle {
    let by_vehicle: HashMap<VehicleId, &Vehicle> = vehicles.iter().map(|v| (v.id, v)).collect();

    let mut events: Vec<Event> = raw_events
        .into_iter()
        .filter(|e| e.time_end > 0 && e.time_start < period)
        .map(|mut e| {
            if e.time_start < 0 {
                e.time_start = 0;
                if let Some(v) = by_vehicle.get(&e.vehicle) {
                    e.soc_start = v.interpolated_soc_at(0);
                }
            }
            if e.time_end > period {
                e.time_end = period;
                if let Some(v) = by_vehicle.get(&e.vehicle) {
                    e.soc_end = v.interpolated_soc_at(period);
                }
            }
            if let Some(series) = &mut e.soc_timeseries {
                series.retain(|p| p.time >= e.time_start && p.time <= e.time_end);
            }
            e
        })
        .collect();

    events.sort_by_key(|e| (e.time_start, e.vehicle.0));
    let area_peaks = sweep_area_peaks(&events);
    ResultBundle {
        events,
        period,
        area_peaks,
    }
}

/// For each area touched by `events`, a sweep line over `(start, +1)` /
/// `(end, -1)` deltas tracking the running occupancy, reporting its peak.
/// Departures are processed before arrivals at an identical instant, so a
/// same-instant handover is never double-counted.
///
/// `pub(crate)` so [`crate::smart_charging`] can recompute peaks after
/// reshaping CHARGE events without re-running the simulator.
pub(crate) fn sweep_area_peaks(events: &[Event]) -> Vec<AreaOccupancyPeak> {
    let mut deltas_by_area: HashMap<AreaId, Vec<(Time, i32)>> = HashMap::new();
    for e in events {
        if let Some(area) = e.area {
            let deltas = deltas_by_area.entry(area).or_default();
            deltas.push((e.time_start, 1));
            deltas.push((e.time_end, -1));
        }
    }

    let mut peaks: Vec<AreaOccupancyPeak> = deltas_by_area
        .into_iter()
        .map(|(area, mut deltas)| {
            deltas.sort_by_key(|&(t, d)| (t, d));
            let mut running = 0i32;
            let mut peak = 0i32;
            let mut peak_at = 0;
            for (t, d) in deltas {
                running += d;
                if running > peak {
                    peak = running;
                    peak_at = t;
                }
            }
            AreaOccupancyPeak {
                area,
                peak: peak.max(0) as u32,
                at: peak_at,
            }
        })
        .collect();
    peaks.sort_by_key(|p| p.area.0);
    peaks
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::event::EventKind;
    use crate::model::vehicle_type::VehicleTypeId;

    fn event(vehicle: u32, area: u32, start: Time, end: Time) -> Event {
        Event {
            vehicle: VehicleId(vehicle),
            rotation: None,
            kind: EventKind::Charge,
            area: Some(AreaId(area)),
            slot_index: Some(0),
            time_start: start,
            time_end: end,
            soc_start: 0.5,
            soc_end: 0.6,
            soc_timeseries: None,
        }
    }

    #[test]
    fn drops_events_entirely_outside_window() {
        let events = vec![event(1, 1, -500, -100), event(2, 1, 1000, 1100)];
        let bundle = materialize(events, &[], 900);
        assert!(bundle.events.is_empty());
    }

    #[test]
    fn boundary_event_is_clipped_and_soc_interpolated() {
        let mut v = Vehicle::new(VehicleId(1), VehicleTypeId(1), 1.0, -100);
        v.log_soc(100, 0.0);
        let events = vec![event(1, 1, -100, 100)];
        let bundle = materialize(events, std::slice::from_ref(&v), 0);
        assert_eq!(bundle.events.len(), 1);
        let e = &bundle.events[0];
        assert_eq!(e.time_start, 0);
        assert_eq!(e.time_end, 0);
        assert!((e.soc_end - 0.5).abs() < 1e-9);
    }

    #[test]
    fn peak_occupancy_counts_overlap_not_handover() {
        let events = vec![
            event(1, 1, 0, 100),
            event(2, 1, 50, 150),
            event(3, 1, 150, 200),
        ];
        let bundle = materialize(events, &[], 500);
        assert_eq!(bundle.area_peak(AreaId(1)), 2);
    }
}
