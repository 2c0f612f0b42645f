//! A2: the scenario repository. Loads an immutable [`ScenarioSnapshot`]
//! from CSV (fleet data) or TOML (a full scenario including the depot
//! template) instead of mutating a live, ORM-backed model — `spec.md` §9's
//! redesign note: split "the relational schema of scenarios/routes/trips"
//! into plain data domain entities (`crate::model`) plus a thin repository
//! layer (this module).

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::fs;
use std::io::Read;
use std::path::Path;

use serde::Deserialize;

use crate::config::SimConfig;
use crate::error::InvalidConfig;
use crate::model::area::{Area, AreaId, AreaType};
use crate::model::depot::{Depot, Plan};
use crate::model::process::Process;
use crate::model::process::ProcessKind;
use crate::model::rotation::{Rotation, RotationId, Trip};
use crate::model::vehicle_type::{ChargeCurvePoint, VehicleType, VehicleTypeId};

/// Error loading or validating a scenario.
#[derive(Debug, Clone, PartialEq)]
pub enum ScenarioError {
    Io(String),
    Csv(String),
    Toml(String),
    Invalid(InvalidConfig),
}

impl fmt::Display for ScenarioError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScenarioError::Io(msg) => write!(f, "scenario io error: {msg}"),
            ScenarioError::Csv(msg) => write!(f, "scenario csv error: {msg}"),
            ScenarioError::Toml(msg) => write!(f, "scenario toml error: {msg}"),
            ScenarioError::Invalid(inner) => write!(f, "scenario {inner}"),
        }
    }
}

impl std::error::Error for ScenarioError {}

impl From<InvalidConfig> for ScenarioError {
    fn from(inner: InvalidConfig) -> Self {
        ScenarioError::Invalid(inner)
    }
}

/// An immutable, cheaply-`Clone`-able bundle of a fleet and (optionally)
/// the depot it turns around — the in-memory stand-in for "the database"
/// (`spec.md` §1, §9). `depot` is `None` for scenarios loaded from a CSV
/// directory that describes only the fleet; the CLI pipeline sizes and
/// lays one out via [`crate::sizing`]/[`crate::layout`] in that case.
#[derive(Debug, Clone)]
pub struct ScenarioSnapshot {
    pub vehicle_types: Vec<VehicleType>,
    pub depot: Option<Depot>,
    pub rotations: Vec<Rotation>,
}

impl ScenarioSnapshot {
    /// Groups rotations by vehicle type — the shape
    /// [`crate::sizing::size_fleet`] and per-type simulation want.
    pub fn rotations_by_type(&self) -> HashMap<VehicleTypeId, Vec<Rotation>> {
        let mut by_type: HashMap<VehicleTypeId, Vec<Rotation>> = HashMap::new();
        for r in &self.rotations {
            by_type.entry(r.vehicle_type).or_default().push(r.clone());
        }
        by_type
    }

    /// Derives a depot with one area's capacity overridden, rather than
    /// mutating `self.depot` in place — the literal replacement for
    /// "transactional rollback" each C6 sizing iteration otherwise needs
    /// (`spec.md` §9).
    pub fn with_area_capacity(&self, area: AreaId, capacity: u32) -> Result<Depot, InvalidConfig> {
        let depot = self
            .depot
            .as_ref()
            .expect("with_area_capacity requires a snapshot with a depot");
        let areas = depot
            .areas
            .iter()
            .map(|a| {
                if a.id == area {
                    Area::new(
                        a.id,
                        a.area_type,
                        capacity,
                        a.vehicle_type,
                        a.permitted_processes.clone(),
                        a.issink,
                    )
                } else {
                    Ok(a.clone())
                }
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Depot::new(depot.station.clone(), depot.plan.clone(), areas))
    }

    /// Reads `vehicle_types.csv` and `trips.csv` from `dir`, grouping trips
    /// into rotations by `rotation_id` (`spec.md` §11). An optional
    /// `rotations.csv` is cross-checked against the trips if present; an
    /// optional `depot.toml` supplies the depot template if present.
    pub fn from_csv_dir(dir: &Path) -> Result<Self, ScenarioError> {
        let vehicle_types = read_vehicle_types_csv(&dir.join("vehicle_types.csv"))?;
        let vt_by_id: HashMap<VehicleTypeId, &VehicleType> =
            vehicle_types.iter().map(|vt| (vt.id, vt)).collect();

        let trip_rows = read_trip_rows_csv(&dir.join("trips.csv"))?;

        let rotations_csv_path = dir.join("rotations.csv");
        if rotations_csv_path.exists() {
            let declared = read_rotation_ids_csv(&rotations_csv_path)?;
            let present: std::collections::HashSet<u32> =
                trip_rows.iter().map(|r| r.rotation_id).collect();
            for id in declared {
                if !present.contains(&id) {
                    return Err(ScenarioError::Csv(format!(
                        "rotations.csv declares rotation {id} with no trips in trips.csv"
                    )));
                }
            }
        }

        let rotations = group_trip_rows_into_rotations(trip_rows, &vt_by_id)?;

        let depot_toml_path = dir.join("depot.toml");
        let depot = if depot_toml_path.exists() {
            let raw = fs::read_to_string(&depot_toml_path).map_err(|e| ScenarioError::Io(e.to_string()))?;
            let spec: DepotSpec = toml::from_str(&raw).map_err(|e| ScenarioError::Toml(e.to_string()))?;
            Some(spec.build()?)
        } else {
            None
        };

        Ok(Self {
            vehicle_types,
            depot,
            rotations,
        })
    }

    /// Parses a single omnibus TOML file holding `vehicle_types`, `depot`,
    /// and `rotations` sections, plus the optional `sizing`/`packing`/
    /// `smart_charging` sections `--scenario` loads in one pass instead of
    /// requiring a separate config file. Returns the fleet snapshot paired
    /// with the [`SimConfig`] those sections describe (defaults if absent).
    pub fn from_toml_file(path: &Path) -> Result<(Self, SimConfig), ScenarioError> {
        let raw = fs::read_to_string(path).map_err(|e| ScenarioError::Io(e.to_string()))?;
        Self::from_toml_str(&raw)
    }

    pub fn from_toml_str(raw: &str) -> Result<(Self, SimConfig), ScenarioError> {
        let file: ScenarioFile = toml::from_str(raw).map_err(|e| ScenarioError::Toml(e.to_string()))?;

        let vehicle_types = file
            .vehicle_types
            .into_iter()
            .map(VehicleTypeSpec::build)
            .collect::<Result<Vec<_>, _>>()?;

        let depot = file.depot.build()?;

        let rotations = file
            .rotations
            .into_iter()
            .map(RotationSpec::build)
            .collect::<Result<Vec<_>, _>>()?;

        let snapshot = Self {
            vehicle_types,
            depot: Some(depot),
            rotations,
        };
        let config = SimConfig {
            sizing: file.sizing,
            packing: file.packing,
            smart_charging: file.smart_charging,
        };
        Ok((snapshot, config))
    }

    /// A built-in fleet fixture matching one of [`SimConfig::PRESETS`] by
    /// name, used by the CLI when no `--scenario` path is given.
    pub fn from_preset(name: &str) -> Result<Self, ScenarioError> {
        match name {
            "baseline" => Ok(builtin_baseline_scenario()),
            "single_type_demo" => Ok(builtin_single_type_demo_scenario()),
            _ => Err(ScenarioError::Invalid(InvalidConfig {
                field: "preset",
                message: format!("unknown scenario preset \"{name}\""),
            })),
        }
    }
}

fn standard_vehicle_type(id: u32, name: &str) -> VehicleType {
    VehicleType::new(
        VehicleTypeId(id),
        name,
        300.0,
        vec![
            ChargeCurvePoint { soc: 0.0, power_kw: 150.0 },
            ChargeCurvePoint { soc: 0.8, power_kw: 150.0 },
            ChargeCurvePoint { soc: 1.0, power_kw: 20.0 },
        ],
        1.2,
        18.0,
        2.55,
        false,
    )
    .expect("built-in vehicle type is valid")
}

fn demo_rotation(id: u32, vehicle_type: u32, departure: i64, arrival: i64, distance_km: f64) -> Rotation {
    Rotation::new(
        RotationId(id),
        VehicleTypeId(vehicle_type),
        vec![Trip {
            departure,
            arrival,
            distance_km,
            route: format!("route_{id}"),
            soc_start: None,
            soc_end: None,
        }],
    )
    .expect("built-in rotation is valid")
}

/// A single articulated-bus type with three staggered rotations — small
/// enough for the CLI demo and integration tests to run quickly.
fn builtin_single_type_demo_scenario() -> ScenarioSnapshot {
    ScenarioSnapshot {
        vehicle_types: vec![standard_vehicle_type(1, "articulated_18m")],
        depot: None,
        rotations: vec![
            demo_rotation(1, 1, 6 * 3600, 14 * 3600, 120.0),
            demo_rotation(2, 1, 7 * 3600, 15 * 3600, 110.0),
            demo_rotation(3, 1, 16 * 3600, 23 * 3600, 100.0),
        ],
    }
}

/// Two vehicle types sharing one depot — exercises `size_fleet`'s
/// per-type isolation and the layout engine's multi-area packing.
fn builtin_baseline_scenario() -> ScenarioSnapshot {
    ScenarioSnapshot {
        vehicle_types: vec![
            standard_vehicle_type(1, "articulated_18m"),
            standard_vehicle_type(2, "standard_12m"),
        ],
        depot: None,
        rotations: vec![
            demo_rotation(1, 1, 6 * 3600, 14 * 3600, 120.0),
            demo_rotation(2, 1, 16 * 3600, 23 * 3600, 100.0),
            demo_rotation(3, 2, 5 * 3600, 13 * 3600, 90.0),
            demo_rotation(4, 2, 14 * 3600, 22 * 3600, 95.0),
        ],
    }
}

fn group_trip_rows_into_rotations(
    trip_rows: Vec<TripRow>,
    vt_by_id: &HashMap<VehicleTypeId, &VehicleType>,
) -> Result<Vec<Rotation>, ScenarioError> {
    let mut grouped: BTreeMap<u32, (u32, Vec<TripRow>)> = BTreeMap::new();
    for row in trip_rows {
        grouped
            .entry(row.rotation_id)
            .or_insert_with(|| (row.vehicle_type, Vec::new()))
            .1
            .push(row);
    }

    let mut rotations = Vec::with_capacity(grouped.len());
    for (rotation_id, (vehicle_type, mut rows)) in grouped {
        rows.sort_by_key(|r| r.departure);
        let vt_id = VehicleTypeId(vehicle_type);
        if !vt_by_id.contains_key(&vt_id) {
            return Err(ScenarioError::Csv(format!(
                "trips.csv rotation {rotation_id} references unknown vehicle_type {vehicle_type}"
            )));
        }
        let trips = rows
            .into_iter()
            .map(|r| Trip {
                departure: r.departure,
                arrival: r.arrival,
                distance_km: r.distance_km,
                route: r.route,
                soc_start: r.soc_start,
                soc_end: r.soc_end,
            })
            .collect();
        rotations.push(Rotation::new(RotationId(rotation_id), vt_id, trips)?);
    }
    Ok(rotations)
}

// --- CSV row shapes and reader-based parsing, mirroring the teacher's
// `io/export.rs` read/write split so the parsing logic is testable without
// touching the filesystem. ---

#[derive(Debug, Deserialize)]
struct VehicleTypeCsvRow {
    id: u32,
    name: String,
    battery_capacity_kwh: f64,
    /// Flattens the charge curve to a single constant rate — sufficient
    /// for fleets whose CSV-described vehicle types don't need a tapered
    /// curve; `from_toml_file` supports the full piecewise-linear curve.
    charge_power_kw: f64,
    consumption_kwh_per_km: f64,
    length_m: f64,
    width_m: f64,
    #[serde(default)]
    opportunity_charging_capable: bool,
}

fn vehicle_types_from_reader<R: Read>(reader: R) -> Result<Vec<VehicleType>, ScenarioError> {
    let mut rdr = csv::Reader::from_reader(reader);
    let mut out = Vec::new();
    for result in rdr.deserialize() {
        let row: VehicleTypeCsvRow = result.map_err(|e| ScenarioError::Csv(e.to_string()))?;
        let vt = VehicleType::new(
            VehicleTypeId(row.id),
            row.name,
            row.battery_capacity_kwh,
            vec![
                ChargeCurvePoint {
                    soc: 0.0,
                    power_kw: row.charge_power_kw,
                },
                ChargeCurvePoint {
                    soc: 1.0,
                    power_kw: row.charge_power_kw,
                },
            ],
            row.consumption_kwh_per_km,
            row.length_m,
            row.width_m,
            row.opportunity_charging_capable,
        )?;
        out.push(vt);
    }
    Ok(out)
}

fn read_vehicle_types_csv(path: &Path) -> Result<Vec<VehicleType>, ScenarioError> {
    let file = fs::File::open(path).map_err(|e| ScenarioError::Io(e.to_string()))?;
    vehicle_types_from_reader(file)
}

#[derive(Debug, Deserialize)]
struct TripRow {
    rotation_id: u32,
    vehicle_type: u32,
    departure: i64,
    arrival: i64,
    distance_km: f64,
    route: String,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    soc_start: Option<f64>,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    soc_end: Option<f64>,
}

fn trip_rows_from_reader<R: Read>(reader: R) -> Result<Vec<TripRow>, ScenarioError> {
    let mut rdr = csv::Reader::from_reader(reader);
    rdr.deserialize()
        .map(|r| r.map_err(|e| ScenarioError::Csv(e.to_string())))
        .collect()
}

fn read_trip_rows_csv(path: &Path) -> Result<Vec<TripRow>, ScenarioError> {
    let file = fs::File::open(path).map_err(|e| ScenarioError::Io(e.to_string()))?;
    trip_rows_from_reader(file)
}

#[derive(Debug, Deserialize)]
struct RotationIdRow {
    rotation_id: u32,
    #[allow(dead_code)]
    vehicle_type: u32,
}

fn read_rotation_ids_csv(path: &Path) -> Result<Vec<u32>, ScenarioError> {
    let file = fs::File::open(path).map_err(|e| ScenarioError::Io(e.to_string()))?;
    let mut rdr = csv::Reader::from_reader(file);
    rdr.deserialize()
        .map(|r: Result<RotationIdRow, csv::Error>| {
            r.map(|row| row.rotation_id).map_err(|e| ScenarioError::Csv(e.to_string()))
        })
        .collect()
}

// --- TOML scenario file DTOs, converted through the model's validating
// constructors rather than deserialized straight into the domain types. ---

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ScenarioFile {
    vehicle_types: Vec<VehicleTypeSpec>,
    depot: DepotSpec,
    rotations: Vec<RotationSpec>,
    #[serde(default)]
    sizing: crate::config::SizingParams,
    #[serde(default)]
    packing: crate::config::PackingParams,
    #[serde(default)]
    smart_charging: crate::config::SmartChargingParams,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct VehicleTypeSpec {
    id: u32,
    name: String,
    battery_capacity_kwh: f64,
    charge_curve: Vec<ChargeCurvePoint>,
    consumption_kwh_per_km: f64,
    length_m: f64,
    width_m: f64,
    #[serde(default)]
    opportunity_charging_capable: bool,
}

impl VehicleTypeSpec {
    fn build(self) -> Result<VehicleType, InvalidConfig> {
        VehicleType::new(
            VehicleTypeId(self.id),
            self.name,
            self.battery_capacity_kwh,
            self.charge_curve,
            self.consumption_kwh_per_km,
            self.length_m,
            self.width_m,
            self.opportunity_charging_capable,
        )
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ProcessSpec {
    kind: ProcessKind,
    #[serde(default)]
    duration_s: Option<u64>,
    #[serde(default)]
    electric_power_kw: Option<f64>,
    #[serde(default)]
    resource_capacity: Option<u32>,
    #[serde(default)]
    preemptable: bool,
    #[serde(default)]
    dispatchable: Option<bool>,
}

impl ProcessSpec {
    fn build(self) -> Process {
        let kind = self.kind;
        Process {
            kind,
            duration: self.duration_s.map(std::time::Duration::from_secs),
            electric_power_kw: self.electric_power_kw,
            resource_capacity: self.resource_capacity,
            resource_switch: None,
            preemptable: self.preemptable,
            dispatchable: self
                .dispatchable
                .unwrap_or(matches!(kind, ProcessKind::StandbyDeparture)),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct AreaSpec {
    id: u32,
    area_type: AreaType,
    capacity: u32,
    #[serde(default)]
    vehicle_type: Option<u32>,
    #[serde(default)]
    permitted_processes: Vec<ProcessKind>,
    #[serde(default)]
    issink: bool,
}

impl AreaSpec {
    fn build(self) -> Result<Area, InvalidConfig> {
        Area::new(
            AreaId(self.id),
            self.area_type,
            self.capacity,
            self.vehicle_type.map(VehicleTypeId),
            self.permitted_processes,
            self.issink,
        )
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct DepotSpec {
    station: String,
    plan: Vec<ProcessSpec>,
    areas: Vec<AreaSpec>,
}

impl DepotSpec {
    fn build(self) -> Result<Depot, InvalidConfig> {
        let areas = self
            .areas
            .into_iter()
            .map(AreaSpec::build)
            .collect::<Result<Vec<_>, _>>()?;
        let plan = Plan::new(self.plan.into_iter().map(ProcessSpec::build).collect());
        Ok(Depot::new(self.station, plan, areas))
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct TripSpec {
    departure: i64,
    arrival: i64,
    distance_km: f64,
    route: String,
    #[serde(default)]
    soc_start: Option<f64>,
    #[serde(default)]
    soc_end: Option<f64>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RotationSpec {
    id: u32,
    vehicle_type: u32,
    trips: Vec<TripSpec>,
}

impl RotationSpec {
    fn build(self) -> Result<Rotation, InvalidConfig> {
        let trips = self
            .trips
            .into_iter()
            .map(|t| Trip {
                departure: t.departure,
                arrival: t.arrival,
                distance_km: t.distance_km,
                route: t.route,
                soc_start: t.soc_start,
                soc_end: t.soc_end,
            })
            .collect();
        Rotation::new(RotationId(self.id), VehicleTypeId(self.vehicle_type), trips)
    }
}
