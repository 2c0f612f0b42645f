//! C3: parking and dispatch strategy — which area a newly-arrived vehicle
//! should occupy, and which parked vehicle to pull out to cover an
//! upcoming rotation (`spec.md` §4.3).
//!
//! Both are pure ranking functions over [`DepotGraph`] queries; the engine
//! (C4) owns all suspension and scheduling and simply calls these when a
//! parking or dispatch decision is due.

use crate::model::area::{AreaId, AreaType};
use crate::model::process::ProcessKind;
use crate::model::vehicle::VehicleId;
use crate::model::vehicle_type::VehicleTypeId;
use crate::model::Process;

use super::graph::DepotGraph;

/// Chooses where an arriving vehicle should park for `process`, among the
/// areas that accept it and leave the rest of `remaining_plan` reachable.
///
/// DIRECT areas are preferred over LINE areas whenever any DIRECT
/// candidate exists (ties broken toward the emptier area, then lowest id);
/// among LINE areas the one whose next entry position is shallowest — i.e.
/// has the fewest vacant slots left in its lane, so the fewest future
/// arrivals can stack in front of this vehicle and trap it — wins
/// (`SPEC_FULL.md` §4.3).
pub fn choose_parking_area(
    graph: &DepotGraph,
    vehicle_type: VehicleTypeId,
    process: ProcessKind,
    remaining_plan: &[Process],
) -> Option<AreaId> {
    let candidates: Vec<AreaId> = graph
        .areas_for(vehicle_type, process)
        .into_iter()
        .filter(|&id| graph.can_park(vehicle_type, id, remaining_plan))
        .collect();

    let mut direct: Vec<AreaId> = Vec::new();
    let mut line: Vec<AreaId> = Vec::new();
    for id in candidates {
        match graph.area(id).map(|a| a.area_type) {
            Some(AreaType::DirectOneside) | Some(AreaType::DirectTwoside) => direct.push(id),
            Some(AreaType::Line { .. }) => line.push(id),
            None => {}
        }
    }

    if !direct.is_empty() {
        return direct
            .into_iter()
            .min_by_key(|&id| (graph.occupancy(id), id.0));
    }
    line.into_iter()
        .min_by_key(|&id| (graph.shallowest_entry_depth(id).unwrap_or(usize::MAX), id.0))
}

/// A parked vehicle eligible to be claimed for an upcoming rotation; the
/// caller (the engine) has already filtered by vehicle type and minimum
/// state of charge before ranking.
#[derive(Debug, Clone, Copy)]
pub struct DispatchCandidate {
    pub vehicle: VehicleId,
    pub area: AreaId,
    pub slot_index: u32,
}

/// Among `candidates`, picks the vehicle whose departure frees the most
/// other vehicles from blocking — i.e. the one sitting deepest in front of
/// the largest stack in a LINE lane. Ties break toward the lowest vehicle
/// id, for determinism. `None` if `candidates` is empty, signalling the
/// caller should fall back to creating a new vehicle (surplus).
pub fn choose_dispatch_vehicle(
    graph: &DepotGraph,
    candidates: &[DispatchCandidate],
) -> Option<VehicleId> {
    candidates
        .iter()
        .max_by_key(|c| {
            (
                graph.blocking_score(c.area, c.slot_index),
                std::cmp::Reverse(c.vehicle.0),
            )
        })
        .map(|c| c.vehicle)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Area, AreaId as ModelAreaId, Depot, Plan};

    fn make_depot() -> Depot {
        let direct = Area::new(
            ModelAreaId(1),
            AreaType::DirectOneside,
            2,
            None,
            vec![ProcessKind::StandbyDeparture],
            true,
        )
        .unwrap();
        let line = Area::new(
            ModelAreaId(2),
            AreaType::Line { block_length: 2 },
            2,
            None,
            vec![ProcessKind::StandbyDeparture],
            true,
        )
        .unwrap();
        Depot::new("central", Plan::new(vec![]), vec![direct, line])
    }

    #[test]
    fn prefers_direct_over_line_when_available() {
        let graph = DepotGraph::new(make_depot());
        let area = choose_parking_area(
            &graph,
            VehicleTypeId(1),
            ProcessKind::StandbyDeparture,
            &[],
        );
        assert_eq!(area, Some(AreaId(1)));
    }

    #[test]
    fn falls_back_to_shallowest_line_lane() {
        let mut graph = DepotGraph::new(make_depot());
        // fill the direct area so the next vehicle must go to the line area
        graph.enter(AreaId(1), VehicleId(1)).unwrap();
        graph.enter(AreaId(1), VehicleId(2)).unwrap();
        let area = choose_parking_area(
            &graph,
            VehicleTypeId(1),
            ProcessKind::StandbyDeparture,
            &[],
        );
        assert_eq!(area, Some(AreaId(2)));
    }

    #[test]
    fn dispatch_prefers_vehicle_blocking_more_others() {
        let mut graph = DepotGraph::new(make_depot());
        graph.enter(AreaId(1), VehicleId(1)).unwrap();
        graph.enter(AreaId(1), VehicleId(2)).unwrap();
        let a = graph.enter(AreaId(2), VehicleId(3)).unwrap();
        let b = graph.enter(AreaId(2), VehicleId(4)).unwrap();
        let (back_vehicle, back_slot, front_vehicle, front_slot) = if a < b {
            (VehicleId(3), a, VehicleId(4), b)
        } else {
            (VehicleId(4), b, VehicleId(3), a)
        };
        let candidates = vec![
            DispatchCandidate {
                vehicle: back_vehicle,
                area: AreaId(2),
                slot_index: back_slot,
            },
            DispatchCandidate {
                vehicle: front_vehicle,
                area: AreaId(2),
                slot_index: front_slot,
            },
        ];
        assert_eq!(
            choose_dispatch_vehicle(&graph, &candidates),
            Some(front_vehicle)
        );
    }

    #[test]
    fn dispatch_returns_none_when_no_candidates() {
        let graph = DepotGraph::new(make_depot());
        assert_eq!(choose_dispatch_vehicle(&graph, &[]), None);
    }
}
