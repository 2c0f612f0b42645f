//! C2: the depot graph — areas, their runtime occupancy stores, and the
//! queries the simulator (C4) and dispatch strategy (C3) need: which areas
//! accept a vehicle for a process, and whether a vehicle may park somewhere
//! at all given the rest of its plan (`spec.md` §4.2).

use std::collections::HashMap;

use crate::model::area::{Area, AreaId, AreaType};
use crate::model::process::ProcessKind;
use crate::model::vehicle::VehicleId;
use crate::model::vehicle_type::VehicleTypeId;
use crate::model::{Depot, Process};

use super::store::{LineStore, PositionalStore, Side};

/// Vehicles enter a LINE lane at the `Back` border and are dispatched from
/// the `Front` border — a fixed convention rather than a per-area field,
/// since `spec.md` §3 never varies it across areas.
const LANE_ENTRY: Side = Side::Back;
const LANE_EXIT: Side = Side::Front;

/// Runtime occupancy store backing one [`Area`].
enum AreaStore {
    /// DIRECT areas: each slot independently accessible.
    Direct(PositionalStore<VehicleId>),
    /// LINE areas: `capacity / block_length` nose-to-tail lanes.
    Line {
        block_length: u32,
        lanes: Vec<LineStore<VehicleId>>,
    },
}

impl AreaStore {
    fn new(area: &Area) -> Self {
        match area.area_type {
            AreaType::Line { block_length } => {
                let lane_count = area.capacity / block_length;
                AreaStore::Line {
                    block_length,
                    lanes: (0..lane_count)
                        .map(|_| LineStore::new(block_length as usize))
                        .collect(),
                }
            }
            AreaType::DirectOneside | AreaType::DirectTwoside => {
                AreaStore::Direct(PositionalStore::new(area.capacity as usize))
            }
        }
    }

    fn occupancy(&self) -> u32 {
        match self {
            AreaStore::Direct(s) => (s.capacity() - s.vacant()) as u32,
            AreaStore::Line { lanes, .. } => lanes
                .iter()
                .map(|l| (l.capacity() - l.vacant()) as u32)
                .sum(),
        }
    }

    fn capacity(&self) -> u32 {
        match self {
            AreaStore::Direct(s) => s.capacity() as u32,
            AreaStore::Line {
                lanes,
                block_length,
            } => lanes.len() as u32 * block_length,
        }
    }

    fn has_free_accessible_slot(&self) -> bool {
        match self {
            AreaStore::Direct(s) => s.vacant() > 0,
            AreaStore::Line { lanes, .. } => lanes.iter().any(|l| !l.is_full()),
        }
    }

    /// The shallowest occupied-from-entry depth across this area's lanes,
    /// `None` for DIRECT areas (no lane depth concept) — used by C3's
    /// "prefer the area whose deepest-accessible slot is shallowest" rule.
    fn shallowest_entry_depth(&self) -> Option<usize> {
        match self {
            AreaStore::Direct(_) => None,
            AreaStore::Line { lanes, .. } => lanes
                .iter()
                .filter(|l| !l.is_full())
                .map(|l| l.vacant())
                .min(),
        }
    }

    /// Places `vehicle` into the first lane/slot with room, returning the
    /// slot index (`lane * block_length + position` for LINE areas).
    fn put(&mut self, vehicle: VehicleId) -> Option<u32> {
        match self {
            AreaStore::Direct(s) => s.put(vehicle).map(|i| i as u32),
            AreaStore::Line {
                block_length,
                lanes,
            } => {
                for (lane_idx, lane) in lanes.iter_mut().enumerate() {
                    if let Ok(pos) = lane.put_side(vehicle, LANE_ENTRY) {
                        return Some(lane_idx as u32 * *block_length + pos as u32);
                    }
                }
                None
            }
        }
    }

    /// Removes `vehicle` by slot index (DIRECT) or by scanning accessible
    /// lane fronts for it (LINE; fails if the vehicle is blocked).
    fn remove(&mut self, vehicle: VehicleId, slot_index: u32) -> Option<VehicleId>
    where
        VehicleId: PartialEq,
    {
        match self {
            AreaStore::Direct(s) => s.get(slot_index as usize),
            AreaStore::Line {
                block_length,
                lanes,
            } => {
                let lane_idx = (slot_index / *block_length) as usize;
                let lane = lanes.get_mut(lane_idx)?;
                lane.get_side(LANE_EXIT, |&v| v == vehicle)
            }
        }
    }

    /// True if `vehicle` at `slot_index` is currently reachable for exit
    /// without moving any other vehicle (LINE areas only block).
    fn is_accessible(&self, slot_index: u32) -> bool {
        match self {
            AreaStore::Direct(_) => true,
            AreaStore::Line {
                block_length,
                lanes,
            } => {
                let lane_idx = (slot_index / *block_length) as usize;
                let pos = (slot_index % *block_length) as usize;
                lanes
                    .get(lane_idx)
                    .is_some_and(|l| !l.is_blocked(pos, LANE_EXIT))
            }
        }
    }
}

/// Holds a [`Depot`]'s areas together with their runtime occupancy, and
/// answers the structural queries C3/C4 need (`spec.md` §4.2).
pub struct DepotGraph {
    depot: Depot,
    stores: HashMap<AreaId, AreaStore>,
}

impl DepotGraph {
    pub fn new(depot: Depot) -> Self {
        let stores = depot
            .areas
            .iter()
            .map(|a| (a.id, AreaStore::new(a)))
            .collect();
        Self { depot, stores }
    }

    pub fn depot(&self) -> &Depot {
        &self.depot
    }

    pub fn area(&self, id: AreaId) -> Option<&Area> {
        self.depot.areas.iter().find(|a| a.id == id)
    }

    pub fn occupancy(&self, id: AreaId) -> u32 {
        self.stores.get(&id).map_or(0, AreaStore::occupancy)
    }

    pub fn capacity(&self, id: AreaId) -> u32 {
        self.stores.get(&id).map_or(0, AreaStore::capacity)
    }

    fn accepts(area: &Area, vehicle_type: VehicleTypeId, process: ProcessKind) -> bool {
        area.vehicle_type.is_none_or(|vt| vt == vehicle_type)
            && area.permitted_processes.contains(&process)
    }

    /// Areas that accept `vehicle_type` for `process`, in C2's selection
    /// priority (`SPEC_FULL.md` §4.2): DIRECT areas (ascending occupancy)
    /// first, then LINE areas, tie-broken by area id for determinism. C3
    /// further ranks this candidate set by expected blocking.
    pub fn areas_for(&self, vehicle_type: VehicleTypeId, process: ProcessKind) -> Vec<AreaId> {
        let mut direct = Vec::new();
        let mut line = Vec::new();
        for area in &self.depot.areas {
            if !Self::accepts(area, vehicle_type, process) {
                continue;
            }
            match area.area_type {
                AreaType::Line { .. } => line.push(area.id),
                AreaType::DirectOneside | AreaType::DirectTwoside => direct.push(area.id),
            }
        }
        direct.sort_by_key(|id| (self.occupancy(*id), id.0));
        line.sort_by_key(|id| id.0);
        direct.into_iter().chain(line).collect()
    }

    /// True iff `vehicle_type` can enter `area` right now: the type matches,
    /// a free accessible slot exists, and — if the plan has more processes
    /// after this one — some area in the depot can host each of them, and
    /// if the plan is exhausted the area must be a valid dispatch point
    /// (`issink`). `spec.md` §4.2 / `SPEC_FULL.md` §4.2.
    pub fn can_park(
        &self,
        vehicle_type: VehicleTypeId,
        area_id: AreaId,
        remaining_plan: &[Process],
    ) -> bool {
        let Some(area) = self.area(area_id) else {
            return false;
        };
        let Some(store) = self.stores.get(&area_id) else {
            return false;
        };
        if area.vehicle_type.is_some_and(|vt| vt != vehicle_type) {
            return false;
        }
        if !store.has_free_accessible_slot() {
            return false;
        }
        if remaining_plan.is_empty() {
            return area.issink;
        }
        remaining_plan.iter().all(|p| {
            self.depot
                .areas
                .iter()
                .any(|a| Self::accepts(a, vehicle_type, p.kind))
        })
    }

    /// The shallowest-entry-depth ranking value C3 uses to prefer the
    /// line area least likely to trap this vehicle; `None` for DIRECT.
    pub fn shallowest_entry_depth(&self, area_id: AreaId) -> Option<usize> {
        self.stores.get(&area_id).and_then(AreaStore::shallowest_entry_depth)
    }

    /// Places `vehicle` into `area_id`, returning its slot index.
    pub fn enter(&mut self, area_id: AreaId, vehicle: VehicleId) -> Option<u32> {
        self.stores.get_mut(&area_id)?.put(vehicle)
    }

    /// Removes `vehicle` from `area_id` at `slot_index`.
    pub fn leave(&mut self, area_id: AreaId, vehicle: VehicleId, slot_index: u32) -> bool {
        self.stores
            .get_mut(&area_id)
            .and_then(|s| s.remove(vehicle, slot_index))
            .is_some()
    }

    pub fn is_accessible(&self, area_id: AreaId, slot_index: u32) -> bool {
        self.stores
            .get(&area_id)
            .is_some_and(|s| s.is_accessible(slot_index))
    }

    /// Number of other vehicles this one currently blocks from exiting —
    /// zero for DIRECT areas (no blocking), and for LINE areas the count of
    /// occupied slots strictly behind it (farther from the exit border)
    /// in its lane. Used by C3's dispatch strategy to prefer claiming the
    /// vehicle that "blocks the most other vehicles" (`spec.md` §4.3).
    pub fn blocking_score(&self, area_id: AreaId, slot_index: u32) -> u32 {
        match self.stores.get(&area_id) {
            Some(AreaStore::Line {
                block_length,
                lanes,
            }) => {
                let lane_idx = (slot_index / *block_length) as usize;
                let pos = (slot_index % *block_length) as usize;
                lanes.get(lane_idx).map_or(0, |lane| {
                    (0..pos).filter(|&i| lane.is_occupied(i)).count() as u32
                })
            }
            _ => 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::area::AreaId;
    use crate::model::process::ServiceKind;
    use crate::model::{Area, Plan};

    fn make_depot() -> Depot {
        let direct = Area::new(
            AreaId(1),
            AreaType::DirectOneside,
            3,
            None,
            vec![ProcessKind::StandbyDeparture],
            true,
        )
        .unwrap();
        let line = Area::new(
            AreaId(2),
            AreaType::Line { block_length: 2 },
            4,
            None,
            vec![ProcessKind::Charge],
            false,
        )
        .unwrap();
        Depot::new("central", Plan::new(vec![]), vec![direct, line])
    }

    #[test]
    fn areas_for_orders_direct_before_line() {
        let depot = make_depot();
        let graph = DepotGraph::new(depot);
        let ids = graph.areas_for(VehicleTypeId(1), ProcessKind::StandbyDeparture);
        assert_eq!(ids, vec![AreaId(1)]);
        let ids = graph.areas_for(VehicleTypeId(1), ProcessKind::Charge);
        assert_eq!(ids, vec![AreaId(2)]);
    }

    #[test]
    fn enter_and_leave_round_trip_direct_area() {
        let mut graph = DepotGraph::new(make_depot());
        let slot = graph.enter(AreaId(1), VehicleId(1)).unwrap();
        assert_eq!(graph.occupancy(AreaId(1)), 1);
        assert!(graph.leave(AreaId(1), VehicleId(1), slot));
        assert_eq!(graph.occupancy(AreaId(1)), 0);
    }

    #[test]
    fn line_area_blocks_exit_until_front_vacated() {
        let mut graph = DepotGraph::new(make_depot());
        let a = graph.enter(AreaId(2), VehicleId(1)).unwrap();
        let b = graph.enter(AreaId(2), VehicleId(2)).unwrap();
        // both land in the same lane (lane 0, slots 0 and 1): the one at
        // the back (a) is blocked until the front one (b) leaves.
        if a % 2 == 0 {
            assert!(!graph.is_accessible(AreaId(2), a));
            assert!(graph.leave(AreaId(2), VehicleId(2), b));
            assert!(graph.is_accessible(AreaId(2), a));
        }
    }

    #[test]
    fn can_park_requires_issink_when_plan_exhausted() {
        let graph = DepotGraph::new(make_depot());
        assert!(graph.can_park(VehicleTypeId(1), AreaId(1), &[]));
        assert!(!graph.can_park(VehicleTypeId(1), AreaId(2), &[]));
    }

    #[test]
    fn blocking_score_counts_occupants_behind() {
        let mut graph = DepotGraph::new(make_depot());
        let a = graph.enter(AreaId(2), VehicleId(1)).unwrap();
        let b = graph.enter(AreaId(2), VehicleId(2)).unwrap();
        // b entered after a, in the same lane, so b sits in front of a.
        let (back, front) = if a < b { (a, b) } else { (b, a) };
        assert_eq!(graph.blocking_score(AreaId(2), back), 0);
        assert_eq!(graph.blocking_score(AreaId(2), front), 1);
    }

    #[test]
    fn can_park_checks_plan_suffix_reachability() {
        let graph = DepotGraph::new(make_depot());
        let clean = Process {
            kind: ProcessKind::Service(ServiceKind::Clean),
            duration: Some(std::time::Duration::from_secs(60)),
            electric_power_kw: None,
            resource_capacity: None,
            resource_switch: None,
            preemptable: false,
            dispatchable: false,
        };
        // no area in this depot hosts CLEAN, so it's unreachable
        assert!(!graph.can_park(VehicleTypeId(1), AreaId(2), std::slice::from_ref(&clean)));
    }
}
