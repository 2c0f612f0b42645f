//! depot-sim entry point — CLI wiring: scenario repository → sizer (C6) →
//! simulator (C4) → optional peak-shaving (C8) → layout (C7) → export/report.

use std::collections::HashMap;
use std::path::Path;
use std::process;
use std::time::Duration;

use depot_sim::cli::{self, RepetitionPeriodArg};
use depot_sim::config::{RepetitionPeriod, SimConfig, SizingParams, SmartChargingStrategy};
use depot_sim::error::{SimOutcome, SizingError};
use depot_sim::io::export::{export_events_csv, export_layout_csv};
use depot_sim::layout::{self, LayoutResult};
use depot_sim::model::area::{Area, AreaId, AreaType};
use depot_sim::model::depot::{Depot, Plan};
use depot_sim::model::event::Event;
use depot_sim::model::process::{Process, ProcessKind, ServiceKind};
use depot_sim::model::rotation::RotationId;
use depot_sim::model::vehicle::VehicleId;
use depot_sim::model::vehicle_type::{VehicleType, VehicleTypeId};
use depot_sim::reporting;
use depot_sim::scenario::ScenarioSnapshot;
use depot_sim::sim::engine::simulate;
use depot_sim::sim::materializer::ResultBundle;
use depot_sim::sizing::{area_needed_for_vehicle_parking, size_fleet, VehicleTypeSizing};
use depot_sim::smart_charging;

const SHUNT_SLOTS_DEFAULT: u32 = 10;
const CLEAN_SLOTS_DEFAULT: u32 = 10;
const CHARGING_POWER_KW_DEFAULT: f64 = 90.0;
const SHUNT_DURATION_S: u64 = 5 * 60;
const CLEAN_DURATION_S: u64 = 30 * 60;

const SHUNT_AREA: AreaId = AreaId(1);
const CLEAN_AREA: AreaId = AreaId(2);
const CHARGE_AREA: AreaId = AreaId(3);

fn repetition_period_from_arg(arg: RepetitionPeriodArg) -> RepetitionPeriod {
    match arg {
        RepetitionPeriodArg::Day => RepetitionPeriod::Day,
        RepetitionPeriodArg::Week => RepetitionPeriod::Week,
        RepetitionPeriodArg::Auto => RepetitionPeriod::Auto,
    }
}

/// Assembles one multi-vehicle-type depot from `size_fleet`'s per-type
/// results: a shared SHUNT/CLEAN/CHARGE area sized to cover the combined
/// fleet, plus one STANDBY_DEPARTURE area per [`depot_sim::sizing::SizedArea`]
/// each vehicle type's Phase B configuration converged on.
fn build_combined_depot(
    sizes: &[VehicleTypeSizing],
    vehicle_types: &[VehicleType],
    sizing_params: &SizingParams,
) -> Result<(Depot, Vec<(Area, f64, f64)>), SizingError> {
    let total_capacity: u32 = sizes.iter().map(|s| s.total_capacity()).sum::<u32>().max(1);
    let shunt_slots = SHUNT_SLOTS_DEFAULT + sizing_params.buffer_slots;
    let clean_slots = CLEAN_SLOTS_DEFAULT + sizing_params.buffer_slots;
    let charge_slots = total_capacity;

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

    let reference_vt = vehicle_types
        .first()
        .ok_or(SizingError::NoFeasibleConfiguration)?;
    let (shunt_w, shunt_h) =
        area_needed_for_vehicle_parking(AreaType::DirectOneside, reference_vt, shunt_slots, sizing_params)?;
    let (clean_w, clean_h) =
        area_needed_for_vehicle_parking(AreaType::DirectOneside, reference_vt, clean_slots, sizing_params)?;
    let (charge_w, charge_h) =
        area_needed_for_vehicle_parking(AreaType::DirectOneside, reference_vt, charge_slots, sizing_params)?;

    let mut areas = vec![shunt_area.clone(), clean_area.clone(), charge_area.clone()];
    let mut footprint_areas = vec![
        (shunt_area, shunt_w, shunt_h),
        (clean_area, clean_w, clean_h),
        (charge_area, charge_w, charge_h),
    ];

    let mut next_id = 100u32;
    for s in sizes {
        for sized_area in &s.areas {
            let area_id = AreaId(next_id);
            next_id += 1;
            let standby_area = Area::new(
                area_id,
                sized_area.area_type,
                sized_area.capacity.max(1),
                Some(s.vehicle_type),
                vec![ProcessKind::StandbyDeparture],
                true,
            )
            .map_err(|_| SizingError::NoFeasibleConfiguration)?;
            areas.push(standby_area.clone());
            footprint_areas.push((standby_area, sized_area.width_m, sized_area.height_m));
        }
    }

    let plan = Plan::new(vec![
        Process {
            kind: ProcessKind::Service(ServiceKind::Shunt),
            duration: Some(Duration::from_secs(SHUNT_DURATION_S)),
            electric_power_kw: None,
            resource_capacity: Some(shunt_slots),
            resource_switch: None,
            preemptable: false,
            dispatchable: false,
        },
        Process {
            kind: ProcessKind::Service(ServiceKind::Clean),
            duration: Some(Duration::from_secs(CLEAN_DURATION_S)),
            electric_power_kw: None,
            resource_capacity: Some(clean_slots),
            resource_switch: None,
            preemptable: false,
            dispatchable: false,
        },
        Process {
            kind: ProcessKind::Service(ServiceKind::Shunt),
            duration: Some(Duration::from_secs(SHUNT_DURATION_S)),
            electric_power_kw: None,
            resource_capacity: Some(shunt_slots),
            resource_switch: None,
            preemptable: false,
            dispatchable: false,
        },
        Process {
            kind: ProcessKind::Charge,
            duration: None,
            electric_power_kw: Some(CHARGING_POWER_KW_DEFAULT),
            resource_capacity: None,
            resource_switch: None,
            preemptable: false,
            // A vehicle mid-charge may be claimed by the dispatch strategy,
            // cutting its charge short (`original_source/eflips/depot/api/
            // private/depot.py:495-505`).
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
    ]);

    Ok((Depot::new("combined", plan, areas), footprint_areas))
}

/// Maps each event's vehicle to the vehicle type of the rotation it is
/// running — `Event` doesn't carry `vehicle_type` directly, but every
/// rotation pins one, and a vehicle only ever runs rotations of its own type.
fn vehicle_type_of_map(events: &[Event], rotations: &[depot_sim::model::rotation::Rotation]) -> HashMap<VehicleId, VehicleTypeId> {
    let rotation_vt: HashMap<RotationId, VehicleTypeId> =
        rotations.iter().map(|r| (r.id, r.vehicle_type)).collect();
    events
        .iter()
        .filter_map(|e| e.rotation.and_then(|r| rotation_vt.get(&r)).map(|vt| (e.vehicle, *vt)))
        .collect()
}

fn main() {
    let opts = cli::parse_args().unwrap_or_else(|e| {
        eprintln!("error: {e}");
        cli::print_usage();
        process::exit(1);
    });

    let (snapshot, mut config) = if let Some(ref path) = opts.scenario {
        match ScenarioSnapshot::from_toml_file(Path::new(path)) {
            Ok(pair) => pair,
            Err(e) => {
                eprintln!("{e}");
                process::exit(1);
            }
        }
    } else {
        let preset_name = opts.preset.as_deref().unwrap_or("single_type_demo");
        let config = SimConfig::from_preset(preset_name).unwrap_or_else(|e| {
            eprintln!("{e}");
            process::exit(1);
        });
        let snapshot = ScenarioSnapshot::from_preset(preset_name).unwrap_or_else(|e| {
            eprintln!("{e}");
            process::exit(1);
        });
        (snapshot, config)
    };

    if let Some(period_arg) = opts.repetition_period {
        config.sizing.repetition_period = repetition_period_from_arg(period_arg);
    }
    if opts.smart_charging {
        config.smart_charging.strategy = SmartChargingStrategy::Even;
    }

    let errors = config.validate();
    if !errors.is_empty() {
        for e in &errors {
            eprintln!("{e}");
        }
        process::exit(1);
    }

    let rotations_by_type = snapshot.rotations_by_type();
    let sizes = size_fleet(&snapshot.vehicle_types, &rotations_by_type, &config.sizing).unwrap_or_else(|e| {
        eprintln!("sizing failed: {e}");
        process::exit(1);
    });
    reporting::print_sizing_report(&sizes);

    let (depot, footprint_areas) =
        build_combined_depot(&sizes, &snapshot.vehicle_types, &config.sizing).unwrap_or_else(|e| {
            eprintln!("failed to assemble combined depot: {e}");
            process::exit(1);
        });

    let outcome = simulate(&depot, &snapshot.vehicle_types, &snapshot.rotations, &config.sizing);
    let bundle: ResultBundle = match outcome {
        SimOutcome::Ok(bundle) => *bundle,
        other => {
            eprintln!("simulation did not reach a feasible steady state: {other}");
            process::exit(1);
        }
    };
    reporting::print_area_occupancy_report(&bundle);

    let vt_by_id: HashMap<VehicleTypeId, &VehicleType> =
        snapshot.vehicle_types.iter().map(|vt| (vt.id, vt)).collect();
    let vehicle_type_of = vehicle_type_of_map(&bundle.events, &snapshot.rotations);

    let before_kw = smart_charging::peak_charging_power_kw(
        &bundle.events,
        &vehicle_type_of,
        &vt_by_id,
        bundle.period,
        config.smart_charging.time_step_s,
    );

    let final_bundle = if config.smart_charging.strategy == SmartChargingStrategy::None {
        bundle
    } else {
        match smart_charging::optimize(&bundle, &vehicle_type_of, &snapshot.vehicle_types, &config.smart_charging) {
            Ok(optimized) => optimized,
            Err(e) => {
                eprintln!("smart charging optimization failed, keeping unoptimized schedule: {e}");
                bundle
            }
        }
    };
    let after_kw = smart_charging::peak_charging_power_kw(
        &final_bundle.events,
        &vehicle_type_of,
        &vt_by_id,
        final_bundle.period,
        config.smart_charging.time_step_s,
    );
    reporting::print_smart_charging_report(before_kw, after_kw);

    let layout_result: LayoutResult = layout::layout_depot(
        &footprint_areas,
        None,
        &config.packing,
        config.sizing.driving_lane_width,
    )
    .unwrap_or_else(|e| {
        eprintln!("layout failed: {e}");
        process::exit(1);
    });
    reporting::print_layout_report(&layout_result);

    if let Some(ref path) = opts.export_events {
        if let Err(e) = export_events_csv(&final_bundle.events, Path::new(path)) {
            eprintln!("error: failed to write events CSV: {e}");
            process::exit(1);
        }
        eprintln!("Events written to {}", path.display());
    }

    if let Some(ref path) = opts.export_layout {
        if let Err(e) = export_layout_csv(&layout_result, Path::new(path)) {
            eprintln!("error: failed to write layout CSV: {e}");
            process::exit(1);
        }
        eprintln!("Layout written to {}", path.display());
    }

    #[cfg(feature = "tui")]
    if opts.tui {
        let state = depot_sim::tui::AppState {
            bundle: final_bundle,
            layout: layout_result,
            sizes,
        };
        depot_sim::tui::run(&state);
        return;
    }

    #[cfg(feature = "api")]
    if let Some(ref bind) = opts.api_bind {
        use std::sync::Arc;

        let addr: std::net::SocketAddr = bind.parse().unwrap_or_else(|e| {
            eprintln!("error: invalid --api-bind address \"{bind}\": {e}");
            process::exit(1);
        });
        let state = Arc::new(depot_sim::api::AppState {
            bundle: final_bundle,
            layout: layout_result,
            sizes,
        });
        let rt = tokio::runtime::Runtime::new().unwrap_or_else(|e| {
            eprintln!("error: failed to create tokio runtime: {e}");
            process::exit(1);
        });
        rt.block_on(depot_sim::api::serve(state, addr));
    }
}
