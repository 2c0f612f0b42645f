//! C6: the capacity sizer — converges on the smallest depot configuration
//! that can sustain a fleet schedule indefinitely.
//!
//! Two phases per vehicle type (`spec.md` §4.6): Phase A measures peak
//! concurrent parking demand against a single, effectively unbounded DIRECT
//! area. Phase B then sweeps `i = 1..max_lines` mixed configurations — `i`
//! LINE rows for this vehicle type plus a DIRECT overflow area plus buffer
//! LINE areas for every other vehicle type sharing the depot — rejecting any
//! configuration that needs more vehicles than Phase A, and keeping the `i`
//! with the smallest total floor area.
//!
//! Grounded on `original_source/eflips/depot/api/private/capacity_estimation.py`:
//! its two-pass "give back peak usage" + "iterate configurations" search
//! (`calc_num_of_line_parking_spaces`, `simulations_loop`), generalized from
//! Python's `simpy`-driven loop into direct calls against
//! [`crate::sim::engine::simulate`].

use std::collections::HashMap;

use serde::Serialize;

use crate::config::SizingParams;
use crate::error::{SimOutcome, SizingError};
use crate::model::area::{Area, AreaId, AreaType};
use crate::model::depot::{Depot, Plan};
use crate::model::process::{Process, ProcessKind, ServiceKind};
use crate::model::rotation::Rotation;
use crate::model::vehicle_type::{VehicleType, VehicleTypeId};
use crate::sim::engine::simulate;
use crate::sim::materializer::ResultBundle;

/// Defaults lifted from `generate_depot`'s plan template (`SPEC_FULL.md`
/// §4.4) — not folded into [`SizingParams`] since that record is already a
/// stable, validated schema; kept local to avoid widening it for a detail
/// only this module needs (see `DESIGN.md`).
const DEFAULT_SHUNTING_DURATION_S: u64 = 5 * 60;
const DEFAULT_NUM_SHUNTING_SLOTS: u32 = 10;
const DEFAULT_CLEANING_DURATION_S: u64 = 30 * 60;
const DEFAULT_NUM_CLEANING_SLOTS: u32 = 10;
const DEFAULT_CHARGING_POWER_KW: f64 = 90.0;

const SHUNT_AREA: AreaId = AreaId(1);
const CLEAN_AREA: AreaId = AreaId(2);
const CHARGE_AREA: AreaId = AreaId(3);
const STANDBY_AREA: AreaId = AreaId(4);

/// The floor-area footprint, in meters, needed to park `capacity` vehicles
/// of `vehicle_type` in an area of `area_type` (`SPEC_FULL.md` §4.6).
/// Margins are the layout engine's (C7) concern, not this formula's.
pub fn area_needed_for_vehicle_parking(
    area_type: AreaType,
    vehicle_type: &VehicleType,
    capacity: u32,
    sizing: &SizingParams,
) -> Result<(f64, f64), SizingError> {
    match area_type {
        AreaType::Line { block_length } => {
            let rows = capacity.div_ceil(block_length.max(1));
            let spacing = sizing.side_by_side_spacing;
            let area_height = vehicle_type.length_m * block_length as f64
                + spacing * block_length.saturating_sub(1) as f64;
            let area_width =
                vehicle_type.width_m * rows as f64 + spacing * rows.saturating_sub(1) as f64;
            Ok((area_width, area_height))
        }
        AreaType::DirectOneside => {
            let angle = sizing.angle_deg.to_radians();
            let w = vehicle_type.width_m;
            let l = vehicle_type.length_m;
            if angle.tan() > l / w {
                return Err(SizingError::Unsupported(
                    "DIRECT_ONESIDE angle too steep for vehicle geometry",
                ));
            }
            let b0 = angle.cos() * w + angle.sin() * l;
            let h = w / angle.cos();
            let width = h * capacity as f64 + sizing.front_to_back_spacing * capacity.saturating_sub(1) as f64;
            Ok((width, b0))
        }
        AreaType::DirectTwoside => Err(SizingError::Unsupported("DIRECT_TWOSIDE synthesis")),
    }
}

/// The fixed pipeline every arriving bus traverses (`SPEC_FULL.md` §4.4):
/// `Shunting(arrival) -> Cleaning -> Shunting(departure-prep) -> Charging ->
/// Standby(pre-departure)`.
fn default_plan(shunt_slots: u32, clean_slots: u32) -> Plan {
    Plan::new(vec![
        Process {
            kind: ProcessKind::Service(ServiceKind::Shunt),
            duration: Some(std::time::Duration::from_secs(DEFAULT_SHUNTING_DURATION_S)),
            electric_power_kw: None,
            resource_capacity: Some(shunt_slots),
            resource_switch: None,
            preemptable: false,
            dispatchable: false,
        },
        Process {
            kind: ProcessKind::Service(ServiceKind::Clean),
            duration: Some(std::time::Duration::from_secs(DEFAULT_CLEANING_DURATION_S)),
            electric_power_kw: None,
            resource_capacity: Some(clean_slots),
            resource_switch: None,
            preemptable: false,
            dispatchable: false,
        },
        Process {
            kind: ProcessKind::Service(ServiceKind::Shunt),
            duration: Some(std::time::Duration::from_secs(DEFAULT_SHUNTING_DURATION_S)),
            electric_power_kw: None,
            resource_capacity: Some(shunt_slots),
            resource_switch: None,
            preemptable: false,
            dispatchable: false,
        },
        Process {
            kind: ProcessKind::Charge,
            duration: None,
            electric_power_kw: Some(DEFAULT_CHARGING_POWER_KW),
            resource_capacity: None,
            resource_switch: None,
            preemptable: false,
            dispatchable: true,
        },
        Process {
            kind: ProcessKind::StandbyDeparture,
            duration: None,
            electric_power_kw: None,
            resource_capacity: None,
            resource_switch: None,
            preemptable: false,
            dispatchable: true,
        },
    ])
}

/// Builds a single-vehicle-type depot with the standby/parking area at
/// `area_type`/`capacity` and the shared process areas sized generously
/// (`buffer_slots` covers contention from other vehicle types sharing the
/// real depot). Used by Phase A's probe and by the exact-fleet-count
/// re-simulation; Phase B builds its own mixed depot (see
/// [`build_phase_b_depot`]).
fn build_depot(
    vt: &VehicleType,
    area_type: AreaType,
    capacity: u32,
    sizing: &SizingParams,
) -> Result<Depot, SizingError> {
    let shunt_slots = DEFAULT_NUM_SHUNTING_SLOTS + sizing.buffer_slots;
    let clean_slots = DEFAULT_NUM_CLEANING_SLOTS + sizing.buffer_slots;
    let shunt_area = Area::new(
        SHUNT_AREA,
        AreaType::DirectOneside,
        shunt_slots,
        None,
        vec![ProcessKind::Service(ServiceKind::Shunt)],
        false,
    )
    .map_err(|_| SizingError::NoFeasibleConfiguration)?;
    let clean_area = Area::new(
        CLEAN_AREA,
        AreaType::DirectOneside,
        clean_slots,
        None,
        vec![ProcessKind::Service(ServiceKind::Clean)],
        false,
    )
    .map_err(|_| SizingError::NoFeasibleConfiguration)?;
    let charge_area = Area::new(
        CHARGE_AREA,
        AreaType::DirectOneside,
        shunt_slots,
        None,
        vec![ProcessKind::Charge],
        false,
    )
    .map_err(|_| SizingError::NoFeasibleConfiguration)?;
    let standby_area = Area::new(
        STANDBY_AREA,
        area_type,
        capacity,
        Some(vt.id),
        vec![ProcessKind::StandbyDeparture],
        true,
    )
    .map_err(|_| SizingError::NoFeasibleConfiguration)?;

    Ok(Depot::new(
        "sized",
        default_plan(shunt_slots, clean_slots),
        vec![shunt_area, clean_area, charge_area, standby_area],
    ))
}

fn distinct_vehicle_count_in_areas(bundle: &ResultBundle, area_ids: &[AreaId]) -> u32 {
    let mut ids: Vec<u32> = bundle
        .events
        .iter()
        .filter(|e| e.area.is_some_and(|a| area_ids.contains(&a)))
        .map(|e| e.vehicle.0)
        .collect();
    ids.sort_unstable();
    ids.dedup();
    ids.len().max(1) as u32
}

/// Phase A's result for one vehicle type: the peak concurrent standby
/// occupancy against an effectively unbounded DIRECT area, and the distinct
/// fleet size that peak required — Phase B's ceiling on acceptable vehicle
/// count, and the input to every other vehicle type's buffer-area sizing.
#[derive(Debug, Clone, Copy)]
struct PeakDemand {
    peak_direct: u32,
    vehicle_count: u32,
}

/// Phase A: peak concurrent standby-departure occupancy against an
/// effectively unbounded DIRECT area — the minimum any layout must cover.
fn peak_parking_demand(
    vt: &VehicleType,
    rotations: &[Rotation],
    sizing: &SizingParams,
) -> Result<PeakDemand, SizingError> {
    let probe_capacity = (rotations.len() as u32 + 1) * 2;
    let depot = build_depot(vt, AreaType::DirectOneside, probe_capacity, sizing)?;
    match simulate(&depot, std::slice::from_ref(vt), rotations, sizing) {
        SimOutcome::Ok(bundle) => Ok(PeakDemand {
            peak_direct: bundle.area_peak(STANDBY_AREA).max(1),
            vehicle_count: distinct_vehicle_count_in_areas(&bundle, &[STANDBY_AREA]),
        }),
        _ => Err(SizingError::NoFeasibleConfiguration),
    }
}

/// Phase B's line-row plan for one vehicle type: the largest line count
/// `max_lines` worth sweeping, and — when the peak doesn't divide evenly
/// into `max_lines` full rows of `block_length` — the shortened capacity of
/// the final "extra line" row (Open Question Q1: a short row is its own
/// `Area` with `block_length` equal to its own capacity, filled last).
///
/// Grounded directly on `capacity_estimation.py::calc_num_of_line_parking_spaces`:
/// `max_line_buses = floor(direct_area / vehicle_cell_area)`, then divided
/// into rows of `block_length`, with a remainder of exactly 0 or 1 absorbed
/// into the last full row rather than spun out as its own area (a
/// single-vehicle LINE row is meaningless).
fn line_row_plan(
    vt: &VehicleType,
    peak_direct: u32,
    block_length: u32,
    sizing: &SizingParams,
) -> Result<(u32, Option<u32>), SizingError> {
    let (direct_w, direct_h) =
        area_needed_for_vehicle_parking(AreaType::DirectOneside, vt, peak_direct.max(1), sizing)?;
    let direct_area = direct_w * direct_h;
    let cell_area = vt.width_m * vt.length_m;
    let max_line_buses = (direct_area / cell_area).floor().max(0.0) as u32;

    let mut max_rows = max_line_buses / block_length.max(1);
    let remainder = max_line_buses % block_length.max(1);
    let extra_line_length = if remainder != 0 && remainder != 1 {
        max_rows += 1;
        Some(remainder)
    } else {
        None
    };

    Ok((max_rows.max(1), extra_line_length))
}

/// One other vehicle type sharing the depot, supplying a buffer area for
/// Phase B's mixed-configuration simulation.
struct Sibling<'a> {
    vehicle_type: &'a VehicleType,
    rotations: &'a [Rotation],
    peak_direct: u32,
}

/// One sized area in a vehicle type's winning Phase B configuration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SizedArea {
    pub area_type: AreaType,
    pub capacity: u32,
    pub width_m: f64,
    pub height_m: f64,
}

impl SizedArea {
    pub fn floor_area_m2(&self) -> f64 {
        self.width_m * self.height_m
    }
}

/// The sized standby/parking configuration for one vehicle type. Usually
/// more than one [`SizedArea`]: Phase B's winning `i` mixes `i` LINE rows
/// with a DIRECT overflow area (`spec.md` §4.6).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VehicleTypeSizing {
    pub vehicle_type: VehicleTypeId,
    pub areas: Vec<SizedArea>,
    /// Distinct vehicles the fleet actually needs; equals `total_capacity()`
    /// unless `calculate_exact_vehicle_count` is set.
    pub fleet_size: u32,
}

impl VehicleTypeSizing {
    pub fn total_capacity(&self) -> u32 {
        self.areas.iter().map(|a| a.capacity).sum()
    }

    pub fn floor_area_m2(&self) -> f64 {
        self.areas.iter().map(|a| a.floor_area_m2()).sum()
    }
}

/// Builds one Phase B candidate's depot: `target_rows` LINE rows plus one
/// DIRECT overflow area of `direct_capacity` for `vt`, plus one buffer LINE
/// area per sibling sized at `peak_direct + 5` (`spec.md` §4.6 step 3).
/// Returns the depot along with the area ids belonging to `vt`, so the
/// caller can measure `vt`'s own occupancy/vehicle-count after simulating.
fn build_phase_b_depot(
    vt: &VehicleType,
    target_rows: &[u32],
    direct_capacity: u32,
    siblings: &[Sibling],
    sizing: &SizingParams,
) -> Result<(Depot, Vec<AreaId>, AreaId), SizingError> {
    let shunt_slots = DEFAULT_NUM_SHUNTING_SLOTS + sizing.buffer_slots;
    let clean_slots = DEFAULT_NUM_CLEANING_SLOTS + sizing.buffer_slots;
    let target_line_total: u32 = target_rows.iter().sum();
    let sibling_total: u32 = siblings.iter().map(|s| s.peak_direct + 5).sum();
    let charge_slots = shunt_slots.max(target_line_total + direct_capacity + sibling_total);

    let shunt_area = Area::new(
        SHUNT_AREA,
        AreaType::DirectOneside,
        shunt_slots,
        None,
        vec![ProcessKind::Service(ServiceKind::Shunt)],
        false,
    )
    .map_err(|_| SizingError::NoFeasibleConfiguration)?;
    let clean_area = Area::new(
        CLEAN_AREA,
        AreaType::DirectOneside,
        clean_slots,
        None,
        vec![ProcessKind::Service(ServiceKind::Clean)],
        false,
    )
    .map_err(|_| SizingError::NoFeasibleConfiguration)?;
    let charge_area = Area::new(
        CHARGE_AREA,
        AreaType::DirectOneside,
        charge_slots,
        None,
        vec![ProcessKind::Charge],
        false,
    )
    .map_err(|_| SizingError::NoFeasibleConfiguration)?;

    let mut areas = vec![shunt_area, clean_area, charge_area];
    let mut next_id = 10u32;
    let mut target_area_ids = Vec::with_capacity(target_rows.len() + 1);

    for &row_capacity in target_rows {
        let id = AreaId(next_id);
        next_id += 1;
        let area = Area::new(
            id,
            AreaType::Line { block_length: row_capacity.max(1) },
            row_capacity.max(1),
            Some(vt.id),
            vec![ProcessKind::StandbyDeparture],
            true,
        )
        .map_err(|_| SizingError::NoFeasibleConfiguration)?;
        areas.push(area);
        target_area_ids.push(id);
    }

    let direct_id = AreaId(next_id);
    next_id += 1;
    let direct_area = Area::new(
        direct_id,
        AreaType::DirectOneside,
        direct_capacity.max(1),
        Some(vt.id),
        vec![ProcessKind::StandbyDeparture],
        true,
    )
    .map_err(|_| SizingError::NoFeasibleConfiguration)?;
    areas.push(direct_area);
    target_area_ids.push(direct_id);

    for sibling in siblings {
        let capacity = (sibling.peak_direct + 5).max(1);
        let id = AreaId(next_id);
        next_id += 1;
        let buffer = Area::new(
            id,
            AreaType::Line { block_length: capacity },
            capacity,
            Some(sibling.vehicle_type.id),
            vec![ProcessKind::StandbyDeparture],
            true,
        )
        .map_err(|_| SizingError::NoFeasibleConfiguration)?;
        areas.push(buffer);
    }

    let depot = Depot::new("phase-b", default_plan(shunt_slots, clean_slots), areas);
    Ok((depot, target_area_ids, direct_id))
}

/// Runs one Phase B candidate (`i` LINE rows for `vt`) and returns its
/// total floor area and resolved area list, or `None` if the candidate is
/// rejected — infeasible, or needing more vehicles than Phase A measured
/// (`spec.md` §4.6 step 5).
fn evaluate_phase_b_candidate(
    vt: &VehicleType,
    target_rows: &[u32],
    peak_direct: u32,
    siblings: &[Sibling],
    all_vehicle_types: &[VehicleType],
    combined_rotations: &[Rotation],
    phase_a_vehicle_count: u32,
    sizing: &SizingParams,
) -> Result<Option<(f64, Vec<SizedArea>)>, SizingError> {
    let (depot, target_area_ids, direct_id) =
        build_phase_b_depot(vt, target_rows, peak_direct, siblings, sizing)?;

    let bundle = match simulate(&depot, all_vehicle_types, combined_rotations, sizing) {
        SimOutcome::Ok(bundle) => bundle,
        _ => return Ok(None),
    };

    let vehicle_count = distinct_vehicle_count_in_areas(&bundle, &target_area_ids);
    if vehicle_count > phase_a_vehicle_count {
        return Ok(None);
    }

    let mut resolved = Vec::with_capacity(target_rows.len() + 1);
    for &row_capacity in target_rows {
        let (w, h) = area_needed_for_vehicle_parking(
            AreaType::Line { block_length: row_capacity.max(1) },
            vt,
            row_capacity.max(1),
            sizing,
        )?;
        resolved.push(SizedArea {
            area_type: AreaType::Line { block_length: row_capacity.max(1) },
            capacity: row_capacity.max(1),
            width_m: w,
            height_m: h,
        });
    }

    let cur_direct_peak = bundle.area_peak(direct_id);
    if cur_direct_peak > 0 {
        let (w, h) = area_needed_for_vehicle_parking(AreaType::DirectOneside, vt, cur_direct_peak, sizing)?;
        resolved.push(SizedArea {
            area_type: AreaType::DirectOneside,
            capacity: cur_direct_peak,
            width_m: w,
            height_m: h,
        });
    }

    let total_area: f64 = resolved.iter().map(|a| a.floor_area_m2()).sum();
    Ok(Some((total_area, resolved)))
}

/// Re-simulates `vt` alone at its Phase B winning configuration to count
/// the distinct vehicles actually created — the "exact" fleet size
/// `SizingParams::calculate_exact_vehicle_count` asks for, as opposed to
/// the summed area capacity.
fn count_exact_fleet_size(
    vt: &VehicleType,
    areas: &[SizedArea],
    rotations: &[Rotation],
    sizing: &SizingParams,
) -> Result<u32, SizingError> {
    let shunt_slots = DEFAULT_NUM_SHUNTING_SLOTS + sizing.buffer_slots;
    let clean_slots = DEFAULT_NUM_CLEANING_SLOTS + sizing.buffer_slots;
    let total_capacity: u32 = areas.iter().map(|a| a.capacity).sum();
    let charge_slots = shunt_slots.max(total_capacity);

    let shunt_area = Area::new(
        SHUNT_AREA,
        AreaType::DirectOneside,
        shunt_slots,
        None,
        vec![ProcessKind::Service(ServiceKind::Shunt)],
        false,
    )
    .map_err(|_| SizingError::NoFeasibleConfiguration)?;
    let clean_area = Area::new(
        CLEAN_AREA,
        AreaType::DirectOneside,
        clean_slots,
        None,
        vec![ProcessKind::Service(ServiceKind::Clean)],
        false,
    )
    .map_err(|_| SizingError::NoFeasibleConfiguration)?;
    let charge_area = Area::new(
        CHARGE_AREA,
        AreaType::DirectOneside,
        charge_slots,
        None,
        vec![ProcessKind::Charge],
        false,
    )
    .map_err(|_| SizingError::NoFeasibleConfiguration)?;

    let mut depot_areas = vec![shunt_area, clean_area, charge_area];
    let mut next_id = 10u32;
    let mut standby_ids = Vec::with_capacity(areas.len());
    for a in areas {
        let id = AreaId(next_id);
        next_id += 1;
        depot_areas.push(
            Area::new(id, a.area_type, a.capacity.max(1), Some(vt.id), vec![ProcessKind::StandbyDeparture], true)
                .map_err(|_| SizingError::NoFeasibleConfiguration)?,
        );
        standby_ids.push(id);
    }

    let depot = Depot::new("exact-count", default_plan(shunt_slots, clean_slots), depot_areas);
    match simulate(&depot, std::slice::from_ref(vt), rotations, sizing) {
        SimOutcome::Ok(bundle) => Ok(distinct_vehicle_count_in_areas(&bundle, &standby_ids)),
        _ => Err(SizingError::NoFeasibleConfiguration),
    }
}

/// Sizes one vehicle type's standby/parking area against `siblings`' own
/// Phase A peaks, running Phase A itself unless `cached_peak` already holds
/// it (supplied by [`size_fleet`], which computes every type's Phase A peak
/// up front so every other type's buffer areas can be sized without
/// re-running C4).
fn size_vehicle_type_with_siblings(
    vt: &VehicleType,
    rotations: &[Rotation],
    siblings: &[Sibling],
    cached_peak: Option<PeakDemand>,
    sizing: &SizingParams,
) -> Result<VehicleTypeSizing, SizingError> {
    let peak = match cached_peak {
        Some(p) => p,
        None => peak_parking_demand(vt, rotations, sizing)?,
    };
    let peak_direct = peak.peak_direct;

    let block_length = sizing.standard_block_length.min(peak_direct.max(1)).max(1);
    let (max_rows, extra_line_length) = line_row_plan(vt, peak_direct, block_length, sizing)?;

    let all_vehicle_types: Vec<VehicleType> = std::iter::once(vt.clone())
        .chain(siblings.iter().map(|s| s.vehicle_type.clone()))
        .collect();
    let mut combined_rotations: Vec<Rotation> = rotations.to_vec();
    for sibling in siblings {
        combined_rotations.extend(sibling.rotations.iter().cloned());
    }

    let mut best: Option<(f64, Vec<SizedArea>)> = None;
    for i in 1..=max_rows {
        let mut target_rows = Vec::with_capacity(i as usize);
        for row in 0..i {
            let is_last_short = row + 1 == i && extra_line_length.is_some();
            target_rows.push(if is_last_short { extra_line_length.unwrap() } else { block_length });
        }

        let candidate = evaluate_phase_b_candidate(
            vt,
            &target_rows,
            peak_direct,
            siblings,
            &all_vehicle_types,
            &combined_rotations,
            peak.vehicle_count,
            sizing,
        )?;

        if let Some((area, areas)) = candidate {
            if best.as_ref().is_none_or(|(best_area, _)| area < *best_area) {
                best = Some((area, areas));
            }
        }
    }

    // Phase B found nothing non-regressive (e.g. every mixed configuration
    // needed more vehicles than Phase A) — fall back to the all-DIRECT
    // baseline Phase A itself already validated feasible.
    let areas = match best {
        Some((_, areas)) => areas,
        None => {
            let (w, h) = area_needed_for_vehicle_parking(AreaType::DirectOneside, vt, peak_direct, sizing)?;
            vec![SizedArea { area_type: AreaType::DirectOneside, capacity: peak_direct, width_m: w, height_m: h }]
        }
    };

    let fleet_size = if sizing.calculate_exact_vehicle_count {
        count_exact_fleet_size(vt, &areas, rotations, sizing)?
    } else {
        areas.iter().map(|a| a.capacity).sum()
    };

    Ok(VehicleTypeSizing { vehicle_type: vt.id, areas, fleet_size })
}

/// Sizes one vehicle type's standby/parking area in isolation (no sibling
/// buffer areas) — the entry point for callers sizing a single type on its
/// own, e.g. tests and ad hoc exploration. [`size_fleet`] is the entry
/// point for a full depot shared by several types.
pub fn size_vehicle_type(
    vt: &VehicleType,
    rotations: &[Rotation],
    sizing: &SizingParams,
) -> Result<VehicleTypeSizing, SizingError> {
    size_vehicle_type_with_siblings(vt, rotations, &[], None, sizing)
}

/// Sizes every vehicle type present in one depot, returning one
/// [`VehicleTypeSizing`] per entry in `vehicle_types`. Runs Phase A for
/// every type up front so each type's Phase B sweep can size buffer areas
/// for its siblings without re-measuring them (`spec.md` §4.6 step 3).
pub fn size_fleet(
    vehicle_types: &[VehicleType],
    rotations_by_type: &HashMap<VehicleTypeId, Vec<Rotation>>,
    sizing: &SizingParams,
) -> Result<Vec<VehicleTypeSizing>, SizingError> {
    let empty = Vec::new();

    let mut peaks: HashMap<VehicleTypeId, PeakDemand> = HashMap::new();
    for vt in vehicle_types {
        let rotations = rotations_by_type.get(&vt.id).unwrap_or(&empty);
        peaks.insert(vt.id, peak_parking_demand(vt, rotations, sizing)?);
    }

    vehicle_types
        .iter()
        .map(|vt| {
            let rotations = rotations_by_type.get(&vt.id).unwrap_or(&empty);
            let siblings: Vec<Sibling> = vehicle_types
                .iter()
                .filter(|other| other.id != vt.id)
                .map(|other| Sibling {
                    vehicle_type: other,
                    rotations: rotations_by_type.get(&other.id).unwrap_or(&empty),
                    peak_direct: peaks[&other.id].peak_direct,
                })
                .collect();
            size_vehicle_type_with_siblings(vt, rotations, &siblings, Some(peaks[&vt.id]), sizing)
        })
        .collect()
}
