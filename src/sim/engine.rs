//! C4: the depot simulator — drives every vehicle's plan through the FEL.
//!
//! Grounded on `jdhoffa-vpp-sim/src/sim/engine.rs`'s driver-loop shape (own
//! the clock, advance it, dispatch to handlers), generalized from a
//! fixed-timestep power balance into an event-queue-driven vehicle/process
//! state machine, and on `original_source/eflips/simpy_ext.py` for the
//! suspension-point semantics each handler below implements by hand.
//!
//! The cooperative coroutines the original builds on top of `simpy`
//! (`acquire`/`get`/`put`/`wait`) have no direct Rust counterpart without
//! async generators, so each suspension point is represented as an explicit
//! retry: a vehicle that cannot enter its next process is parked on
//! [`SimState::blocked`] and retried every time something in the depot frees
//! up, rather than literally yielding a future.

use std::collections::{HashMap, VecDeque};

use crate::config::SizingParams;
use crate::error::SimOutcome;
use crate::model::area::AreaId;
use crate::model::event::SocPoint;
use crate::model::{
    Depot, Event, EventKind, Process, ProcessKind, Rotation, Time, Vehicle, VehicleId,
    VehicleLocation, VehicleType, VehicleTypeId,
};

use super::clock::{FutureEventQueue, TaskId};
use super::graph::DepotGraph;
use super::materializer;
use super::resource::Resource;
use super::strategy::{choose_dispatch_vehicle, choose_parking_area, DispatchCandidate};

/// Runs the three-window steady-state replay (`spec.md` §4.4:
/// `[-P,0) -> [0,T) -> [T,T+P)`) and returns the feasibility outcome.
pub fn simulate(
    depot: &Depot,
    vehicle_types: &[VehicleType],
    rotations: &[Rotation],
    sizing: &SizingParams,
) -> SimOutcome {
    if rotations.is_empty() {
        return SimOutcome::Ok(Box::new(materializer::materialize(Vec::new(), &[], 0)));
    }

    let span = rotations.iter().map(Rotation::arrival).max().unwrap()
        - rotations.iter().map(Rotation::departure).min().unwrap();
    let period = sizing.repetition_period.resolve_seconds(span.max(1));

    let vehicle_types_map: HashMap<VehicleTypeId, &VehicleType> =
        vehicle_types.iter().map(|vt| (vt.id, vt)).collect();
    let resources: Vec<Option<Resource>> = depot
        .plan
        .processes
        .iter()
        .map(|p| p.resource_capacity.map(Resource::new))
        .collect();

    let mut state = SimState {
        graph: DepotGraph::new(depot.clone()),
        plan: &depot.plan.processes,
        vehicle_types: vehicle_types_map,
        resources,
        vehicles: HashMap::new(),
        plan_cursor: HashMap::new(),
        standby_entry: HashMap::new(),
        pending_charge: HashMap::new(),
        process_started: HashMap::new(),
        active_completion: HashMap::new(),
        preempted: HashMap::new(),
        blocked: VecDeque::new(),
        events: Vec::new(),
        next_vehicle_id: 1,
        departure_soc_min: sizing.departure_soc_min,
        period,
        fel: FutureEventQueue::starting_at(-period),
        next_task_id: 0,
        pending: HashMap::new(),
    };

    // Schedule every rotation's departure, and every resource-switch window
    // boundary, across all three repetitions of the period.
    for rep in -1..=1i64 {
        let base = rep * period;
        for (rotation_idx, rotation) in rotations.iter().enumerate() {
            state.push_task(
                rotation.departure() + base,
                SimTask::RotationDeparture { rotation_idx },
            );
        }
        for (plan_index, process) in depot.plan.processes.iter().enumerate() {
            if let Some(rs) = &process.resource_switch {
                let reduction = rs
                    .strength
                    .unwrap_or_else(|| process.resource_capacity.unwrap_or(0));
                for &(start, end) in &rs.windows {
                    state.push_task(
                        start + base,
                        SimTask::SwitchToggle {
                            plan_index,
                            begin: true,
                            reduction,
                        },
                    );
                    state.push_task(
                        end + base,
                        SimTask::SwitchToggle {
                            plan_index,
                            begin: false,
                            reduction,
                        },
                    );
                }
            }
        }
    }

    while let Some(task_id) = state.fel.advance() {
        let now = state.fel.now();
        // A task cancelled by preemption (`SimState::cancel_task`) is
        // dropped from `pending` but its heap entry lives on; skip it
        // rather than resuming a completion that no longer applies.
        let Some(task) = state.pending.remove(&task_id) else {
            continue;
        };
        match task {
            SimTask::RotationDeparture { rotation_idx } => {
                if let Err(outcome) =
                    state.handle_rotation_departure(now, &rotations[rotation_idx])
                {
                    return outcome;
                }
            }
            SimTask::RotationArrival { vehicle } => state.handle_rotation_arrival(now, vehicle),
            SimTask::ProcessComplete {
                vehicle,
                plan_index,
            } => state.on_process_complete(now, vehicle, plan_index),
            SimTask::SwitchToggle {
                plan_index,
                begin,
                reduction,
            } => state.handle_switch_toggle(now, plan_index, begin, reduction),
        }
    }

    let vehicles: Vec<Vehicle> = state.vehicles.into_values().collect();
    SimOutcome::Ok(Box::new(materializer::materialize(
        state.events,
        &vehicles,
        period,
    )))
}

/// A task resumed by the FEL. Carries enough information to re-derive the
/// vehicle's current plan position rather than capturing a closure, since
/// Rust has no stackful coroutines to suspend mid-function.
enum SimTask {
    RotationDeparture {
        rotation_idx: usize,
    },
    RotationArrival {
        vehicle: VehicleId,
    },
    ProcessComplete {
        vehicle: VehicleId,
        plan_index: usize,
    },
    SwitchToggle {
        plan_index: usize,
        begin: bool,
        reduction: u32,
    },
}

/// Bookkeeping for a vehicle evicted mid-process by a resource-switch
/// window (`spec.md` §3/§4.1), kept so `end_switch`'s wakeup can either
/// resume the remaining hold (`resume = true`) or restart it in full.
struct PreemptionRecord {
    plan_index: usize,
    resume: bool,
    /// Seconds of this hold still owed when it was evicted.
    remaining: Time,
    /// Seconds of this hold already spent before eviction — `remaining +
    /// elapsed_before_pause` reconstructs the full original duration for a
    /// non-resuming restart.
    elapsed_before_pause: Time,
}

struct SimState<'a> {
    graph: DepotGraph,
    plan: &'a [Process],
    vehicle_types: HashMap<VehicleTypeId, &'a VehicleType>,
    /// One shared resource per plan index, `None` when that process needs
    /// no shared resource beyond the area slot itself.
    resources: Vec<Option<Resource>>,
    vehicles: HashMap<VehicleId, Vehicle>,
    /// Plan index a vehicle currently occupies or is waiting to enter.
    plan_cursor: HashMap<VehicleId, usize>,
    /// When a vehicle entered its STANDBY_DEPARTURE slot — needed to emit
    /// its dwell event once the dispatch strategy claims it.
    standby_entry: HashMap<VehicleId, Time>,
    /// `(soc_at_start, time_started)` for an in-progress CHARGE.
    pending_charge: HashMap<VehicleId, (f64, Time)>,
    /// When a vehicle entered its current timed process — needed to report
    /// the correct `time_start` for a process whose completion was
    /// rescheduled after a preemption.
    process_started: HashMap<VehicleId, Time>,
    /// The scheduled `ProcessComplete` for a vehicle's current timed
    /// process, so a resource-switch window can cancel and reschedule it.
    active_completion: HashMap<VehicleId, (TaskId, Time)>,
    /// Vehicles currently evicted from a shared resource by a preempting
    /// switch window, awaiting `end_switch`'s wakeup.
    preempted: HashMap<VehicleId, PreemptionRecord>,
    /// Vehicles that could not enter their next process, FIFO — the
    /// single-threaded stand-in for a suspended `acquire`/`get`.
    blocked: VecDeque<VehicleId>,
    events: Vec<Event>,
    next_vehicle_id: u32,
    departure_soc_min: f64,
    period: Time,
    fel: FutureEventQueue,
    next_task_id: u64,
    pending: HashMap<TaskId, SimTask>,
}

impl<'a> SimState<'a> {
    fn push_task(&mut self, time: Time, task: SimTask) -> TaskId {
        let id = TaskId(self.next_task_id);
        self.next_task_id += 1;
        self.pending.insert(id, task);
        self.fel.schedule(time, id);
        id
    }

    /// Drops a scheduled task without resuming it — the main loop's
    /// `pending.remove` returning `None` is how it notices.
    fn cancel_task(&mut self, task_id: TaskId) {
        self.pending.remove(&task_id);
    }

    /// Handles a `SwitchToggle`: on window start, reduces the resource's
    /// effective capacity and (if `preempt`) evicts enough holders to fit;
    /// on window end, restores capacity and resumes or restarts whichever
    /// evicted holders the resource wakes (`spec.md` §3/§4.1).
    fn handle_switch_toggle(&mut self, now: Time, plan_index: usize, begin: bool, reduction: u32) {
        let rs = self.plan[plan_index]
            .resource_switch
            .as_ref()
            .expect("SwitchToggle is only scheduled for a process with a resource_switch");
        let (preempt, resume, priority) = (rs.preempt, rs.resume, rs.priority);

        if begin {
            let evicted = match self.resources[plan_index].as_mut() {
                Some(res) => res.begin_switch(reduction, preempt, priority),
                None => Vec::new(),
            };
            for holder in evicted {
                let vid = VehicleId(holder as u32);
                let Some((task_id, due)) = self.active_completion.remove(&vid) else {
                    continue;
                };
                self.cancel_task(task_id);
                let elapsed_before_pause = self
                    .process_started
                    .get(&vid)
                    .map(|&start| now - start)
                    .unwrap_or(0);
                self.preempted.insert(
                    vid,
                    PreemptionRecord {
                        plan_index,
                        resume,
                        remaining: (due - now).max(0),
                        elapsed_before_pause,
                    },
                );
            }
        } else {
            let woken = match self.resources[plan_index].as_mut() {
                Some(res) => res.end_switch(reduction),
                None => Vec::new(),
            };
            for holder in woken {
                let vid = VehicleId(holder as u32);
                let Some(record) = self.preempted.remove(&vid) else {
                    continue;
                };
                let remaining = if record.resume {
                    record.remaining
                } else {
                    record.remaining + record.elapsed_before_pause
                };
                let start = if record.resume {
                    now - record.elapsed_before_pause
                } else {
                    now
                };
                self.process_started.insert(vid, start);
                if let Some((soc_start, _)) = self.pending_charge.get(&vid).copied() {
                    self.pending_charge.insert(vid, (soc_start, start));
                }
                let due = now + remaining;
                let task_id = self.push_task(
                    due,
                    SimTask::ProcessComplete {
                        vehicle: vid,
                        plan_index: record.plan_index,
                    },
                );
                self.active_completion.insert(vid, (task_id, due));
            }
            self.retry_blocked(now);
        }
    }

    /// A rotation's scheduled departure: claim a dispatchable vehicle (or
    /// create a surplus one), drive its trips, and schedule its depot
    /// re-entry at the rotation's arrival time.
    fn handle_rotation_departure(
        &mut self,
        now: Time,
        rotation: &Rotation,
    ) -> Result<(), SimOutcome> {
        let vt = *self
            .vehicle_types
            .get(&rotation.vehicle_type)
            .expect("rotation references a known vehicle type");
        let required_soc =
            vt.energy_for_distance_kwh(rotation.total_distance_km()) / vt.battery_capacity_kwh;

        // A vehicle is a dispatch candidate if it's parked at a dispatchable
        // process (`spec.md` §4.4/§5) — STANDBY_DEPARTURE always, and a
        // CHARGE process when its area opts in (`Process::dispatchable`).
        // A vehicle mid-charge is evaluated against its *projected* SoC at
        // `now`, not the stale value logged when charging began.
        let mut candidates = Vec::new();
        for (&vid, vehicle) in self.vehicles.iter() {
            if vehicle.vehicle_type != rotation.vehicle_type {
                continue;
            }
            let Some(&idx) = self.plan_cursor.get(&vid) else {
                continue;
            };
            let process = &self.plan[idx];
            if !process.dispatchable() {
                continue;
            }
            let projected_soc = if process.kind == ProcessKind::Charge {
                match self.pending_charge.get(&vid) {
                    Some(&(soc_start, start_time)) => {
                        soc_after_charging(vt, process.electric_power_kw, soc_start, (now - start_time) as f64)
                            .min(1.0)
                    }
                    None => vehicle.soc,
                }
            } else {
                vehicle.soc
            };
            if projected_soc < self.departure_soc_min || projected_soc - required_soc < 0.0 {
                continue;
            }
            let VehicleLocation::InSlot { area, slot } = vehicle.location else {
                continue;
            };
            candidates.push(DispatchCandidate {
                vehicle: vid,
                area,
                slot_index: slot,
            });
        }

        let vehicle_id = match choose_dispatch_vehicle(&self.graph, &candidates) {
            Some(vid) => {
                let idx = self
                    .plan_cursor
                    .remove(&vid)
                    .expect("dispatch candidate always has a plan position");
                let process = &self.plan[idx];
                let (area, slot) = match self.vehicles[&vid].location {
                    VehicleLocation::InSlot { area, slot } => (area, slot),
                    _ => unreachable!("dispatch candidates are always parked"),
                };
                self.graph.leave(area, vid, slot);
                if let Some(res) = self.resources[idx].as_mut() {
                    res.release(vid.0 as u64);
                }
                if let Some((task_id, _)) = self.active_completion.remove(&vid) {
                    self.cancel_task(task_id);
                }
                self.preempted.remove(&vid);
                self.process_started.remove(&vid);
                if process.kind == ProcessKind::Charge {
                    // Claimed mid-charge: cut the charge short, preserving
                    // the partial work as the CHARGE event (`spec.md` §5).
                    if let Some((soc_start, start_time)) = self.pending_charge.remove(&vid) {
                        let elapsed = (now - start_time) as f64;
                        let soc_now =
                            soc_after_charging(vt, process.electric_power_kw, soc_start, elapsed)
                                .min(1.0);
                        let series = sample_charge_series(
                            vt,
                            process.electric_power_kw,
                            soc_start,
                            start_time,
                            now,
                        );
                        self.vehicles.get_mut(&vid).unwrap().log_soc(now, soc_now);
                        self.events.push(Event {
                            vehicle: vid,
                            rotation: None,
                            kind: EventKind::from(ProcessKind::Charge),
                            area: Some(area),
                            slot_index: Some(slot),
                            time_start: start_time,
                            time_end: now,
                            soc_start,
                            soc_end: soc_now,
                            soc_timeseries: Some(series),
                        });
                    }
                }
                if let Some(entry) = self.standby_entry.remove(&vid) {
                    if entry < now {
                        let soc = self.vehicles[&vid].soc;
                        self.events.push(Event {
                            vehicle: vid,
                            rotation: Some(rotation.id),
                            kind: EventKind::StandbyDeparture,
                            area: Some(area),
                            slot_index: Some(slot),
                            time_start: entry,
                            time_end: now,
                            soc_start: soc,
                            soc_end: soc,
                            soc_timeseries: None,
                        });
                    }
                }
                self.retry_blocked(now);
                vid
            }
            None => {
                if now >= 0 && now < self.period {
                    return Err(SimOutcome::Unstable);
                }
                let vid = VehicleId(self.next_vehicle_id);
                self.next_vehicle_id += 1;
                self.vehicles
                    .insert(vid, Vehicle::new(vid, rotation.vehicle_type, 1.0, now));
                vid
            }
        };

        let mut soc = self.vehicles[&vehicle_id].soc;
        for trip in &rotation.trips {
            let trip_start = now + (trip.departure - rotation.departure());
            let trip_end = now + (trip.arrival - rotation.departure());
            let delta = match (trip.soc_start, trip.soc_end) {
                (Some(start), Some(end)) => start - end,
                _ => vt.energy_for_distance_kwh(trip.distance_km) / vt.battery_capacity_kwh,
            };
            let soc_end = soc - delta;
            if soc_end < 0.0 {
                return Err(SimOutcome::SocUnderflow {
                    vehicle: vehicle_id,
                    at: trip_end,
                });
            }
            self.events.push(Event {
                vehicle: vehicle_id,
                rotation: Some(rotation.id),
                kind: EventKind::Driving,
                area: None,
                slot_index: None,
                time_start: trip_start,
                time_end: trip_end,
                soc_start: soc,
                soc_end,
                soc_timeseries: None,
            });
            soc = soc_end;
        }

        let arrival_time = now + (rotation.arrival() - rotation.departure());
        {
            let vehicle = self.vehicles.get_mut(&vehicle_id).unwrap();
            vehicle.location = VehicleLocation::OnTrip;
            vehicle.log_soc(arrival_time, soc);
        }
        self.push_task(
            arrival_time,
            SimTask::RotationArrival {
                vehicle: vehicle_id,
            },
        );
        Ok(())
    }

    fn handle_rotation_arrival(&mut self, now: Time, vid: VehicleId) {
        if let Some(v) = self.vehicles.get_mut(&vid) {
            v.location = VehicleLocation::Waiting;
        }
        self.enter_or_block(now, vid, 0);
    }

    /// Attempts to enter `idx`; on failure records the vehicle as blocked
    /// at that plan position for [`SimState::retry_blocked`] to retry.
    fn enter_or_block(&mut self, now: Time, vid: VehicleId, idx: usize) {
        self.plan_cursor.insert(vid, idx);
        if !self.try_enter(now, vid, idx) {
            if let Some(v) = self.vehicles.get_mut(&vid) {
                v.location = VehicleLocation::Waiting;
            }
            self.blocked.push_back(vid);
        }
    }

    /// Tries to park `vid` for the process at `idx`. Area slot and shared
    /// resource are claimed atomically: either both are free and the
    /// vehicle proceeds, or neither is touched and the caller must retry
    /// later (`spec.md` §4.1/§4.2).
    fn try_enter(&mut self, now: Time, vid: VehicleId, idx: usize) -> bool {
        if idx >= self.plan.len() {
            return true;
        }
        let process = &self.plan[idx];
        let kind = process.kind;
        let vt_id = self.vehicles[&vid].vehicle_type;
        let remaining = &self.plan[idx + 1..];

        let Some(area_id) = choose_parking_area(&self.graph, vt_id, kind, remaining) else {
            return false;
        };
        if let Some(res) = self.resources[idx].as_ref() {
            if res.available() == 0 {
                return false;
            }
        }
        let Some(slot) = self.graph.enter(area_id, vid) else {
            return false;
        };
        if let Some(res) = self.resources[idx].as_mut() {
            res.try_acquire(vid.0 as u64, 0);
        }

        self.plan_cursor.insert(vid, idx);
        self.vehicles.get_mut(&vid).unwrap().location = VehicleLocation::InSlot {
            area: area_id,
            slot,
        };

        match kind {
            ProcessKind::StandbyDeparture => {
                self.standby_entry.insert(vid, now);
            }
            ProcessKind::Standby => {
                // No duration and not dispatchable: a pass-through buffer
                // state (`spec.md` §9 Open Question Q2), not a real stay.
                let soc = self.vehicles[&vid].soc;
                self.graph.leave(area_id, vid, slot);
                if process.resource_capacity.is_some() {
                    if let Some(res) = self.resources[idx].as_mut() {
                        res.release(vid.0 as u64);
                    }
                }
                self.events.push(Event {
                    vehicle: vid,
                    rotation: None,
                    kind: EventKind::Standby,
                    area: Some(area_id),
                    slot_index: Some(slot),
                    time_start: now,
                    time_end: now,
                    soc_start: soc,
                    soc_end: soc,
                    soc_timeseries: None,
                });
                self.enter_or_block(now, vid, idx + 1);
            }
            ProcessKind::Charge => {
                let vt = *self.vehicle_types.get(&vt_id).unwrap();
                let soc_start = self.vehicles[&vid].soc;
                let duration =
                    charge_duration_seconds(vt, process.electric_power_kw, soc_start, 1.0)
                        .round() as Time;
                self.pending_charge.insert(vid, (soc_start, now));
                self.process_started.insert(vid, now);
                let due = now + duration.max(0);
                let task_id = self.push_task(
                    due,
                    SimTask::ProcessComplete {
                        vehicle: vid,
                        plan_index: idx,
                    },
                );
                self.active_completion.insert(vid, (task_id, due));
            }
            _ => {
                let duration = process.duration.map(|d| d.as_secs() as Time).unwrap_or(0);
                self.process_started.insert(vid, now);
                let due = now + duration;
                let task_id = self.push_task(
                    due,
                    SimTask::ProcessComplete {
                        vehicle: vid,
                        plan_index: idx,
                    },
                );
                self.active_completion.insert(vid, (task_id, due));
            }
        }
        true
    }

    fn on_process_complete(&mut self, now: Time, vid: VehicleId, idx: usize) {
        let process = &self.plan[idx];
        let kind = EventKind::from(process.kind);
        let (area, slot) = match self.vehicles[&vid].location {
            VehicleLocation::InSlot { area, slot } => (area, slot),
            _ => return,
        };

        self.active_completion.remove(&vid);
        self.preempted.remove(&vid);
        let started = self.process_started.remove(&vid);
        let is_charge = process.kind == ProcessKind::Charge;
        let (soc_start, start_time) = if is_charge {
            self.pending_charge
                .remove(&vid)
                .unwrap_or((self.vehicles[&vid].soc, now))
        } else {
            let duration = process.duration.map(|d| d.as_secs() as Time).unwrap_or(0);
            (self.vehicles[&vid].soc, started.unwrap_or(now - duration))
        };

        let (soc_end, soc_timeseries) = if is_charge {
            let vt = *self
                .vehicle_types
                .get(&self.vehicles[&vid].vehicle_type)
                .unwrap();
            let elapsed = (now - start_time) as f64;
            let soc_end =
                soc_after_charging(vt, process.electric_power_kw, soc_start, elapsed).min(1.0);
            let series =
                sample_charge_series(vt, process.electric_power_kw, soc_start, start_time, now);
            (soc_end, Some(series))
        } else {
            (soc_start, None)
        };

        self.graph.leave(area, vid, slot);
        if process.resource_capacity.is_some() {
            if let Some(res) = self.resources[idx].as_mut() {
                res.release(vid.0 as u64);
            }
        }
        self.vehicles.get_mut(&vid).unwrap().log_soc(now, soc_end);
        self.events.push(Event {
            vehicle: vid,
            rotation: None,
            kind,
            area: Some(area),
            slot_index: Some(slot),
            time_start: start_time,
            time_end: now,
            soc_start,
            soc_end,
            soc_timeseries,
        });

        self.retry_blocked(now);
        self.enter_or_block(now, vid, idx + 1);
    }

    /// Retries every blocked vehicle once, FIFO. A vehicle that succeeds is
    /// dropped from the queue; the rest stay, in order, for the next trigger
    /// (`spec.md` §5: contention resolved FIFO).
    fn retry_blocked(&mut self, now: Time) {
        let pending: Vec<VehicleId> = self.blocked.drain(..).collect();
        for vid in pending {
            let idx = *self
                .plan_cursor
                .get(&vid)
                .expect("blocked vehicle always has a plan position");
            if !self.try_enter(now, vid, idx) {
                self.blocked.push_back(vid);
            }
        }
    }
}

/// Breakpoints of `min(vehicle_type.charge_curve, power_cap)` as a
/// piecewise-linear function of SoC — the original curve, with an extra
/// breakpoint inserted wherever it crosses the process's power cap
/// (`SPEC_FULL.md` §4.4).
fn effective_power_breakpoints(vt: &VehicleType, power_cap_kw: Option<f64>) -> Vec<(f64, f64)> {
    let cap = power_cap_kw.unwrap_or(f64::INFINITY);
    let curve = &vt.charge_curve;
    let mut points = Vec::with_capacity(curve.len() + 2);
    for w in curve.windows(2) {
        let (a, b) = (w[0], w[1]);
        points.push((a.soc, a.power_kw.min(cap)));
        if (a.power_kw - cap) * (b.power_kw - cap) < 0.0 && (b.power_kw - a.power_kw).abs() > 1e-12
        {
            let t = (cap - a.power_kw) / (b.power_kw - a.power_kw);
            points.push((a.soc + t * (b.soc - a.soc), cap));
        }
    }
    let last = curve.last().expect("charge curve validated non-empty");
    points.push((last.soc, last.power_kw.min(cap)));
    points
}

const MIN_CHARGE_POWER_KW: f64 = 1e-6;

/// Closed-form time (seconds) to charge from `soc_start` to `soc_target`
/// under the capped piecewise-linear power curve, integrating
/// `d(soc)/dt = power(soc) / (battery_capacity_kwh * 3600)` segment by
/// segment (`SPEC_FULL.md` §4.4).
fn charge_duration_seconds(
    vt: &VehicleType,
    power_cap_kw: Option<f64>,
    soc_start: f64,
    soc_target: f64,
) -> f64 {
    if soc_target <= soc_start {
        return 0.0;
    }
    let breakpoints = effective_power_breakpoints(vt, power_cap_kw);
    let battery_seconds = vt.battery_capacity_kwh * 3600.0;
    let mut total = 0.0;
    for w in breakpoints.windows(2) {
        let (s0, p0) = w[0];
        let (s1, p1) = w[1];
        if s1 <= soc_start || s0 >= soc_target || s1 <= s0 {
            continue;
        }
        let lo = s0.max(soc_start);
        let hi = s1.min(soc_target);
        if hi <= lo {
            continue;
        }
        let frac_lo = (lo - s0) / (s1 - s0);
        let frac_hi = (hi - s0) / (s1 - s0);
        let p_lo = (p0 + frac_lo * (p1 - p0)).max(MIN_CHARGE_POWER_KW);
        let p_hi = (p0 + frac_hi * (p1 - p0)).max(MIN_CHARGE_POWER_KW);
        total += if (p1 - p0).abs() < 1e-9 {
            battery_seconds * (hi - lo) / p_lo
        } else {
            let k = (p1 - p0) / (s1 - s0);
            battery_seconds / k * (p_hi.ln() - p_lo.ln())
        };
    }
    total.max(0.0)
}

/// Inverse of [`charge_duration_seconds`]: the SoC reached after charging
/// for `elapsed_s` seconds starting from `soc_start` — used when a CHARGE is
/// cut short because the dispatch strategy claims the vehicle first.
fn soc_after_charging(
    vt: &VehicleType,
    power_cap_kw: Option<f64>,
    soc_start: f64,
    elapsed_s: f64,
) -> f64 {
    if elapsed_s <= 0.0 {
        return soc_start;
    }
    let breakpoints = effective_power_breakpoints(vt, power_cap_kw);
    let battery_seconds = vt.battery_capacity_kwh * 3600.0;
    let mut remaining = elapsed_s;
    let mut current = soc_start;
    for w in breakpoints.windows(2) {
        let (s0, p0) = w[0];
        let (s1, p1) = w[1];
        if s1 <= current || s1 <= s0 {
            continue;
        }
        let lo = s0.max(current);
        if lo >= s1 {
            continue;
        }
        let frac_lo = (lo - s0) / (s1 - s0);
        let p_lo = (p0 + frac_lo * (p1 - p0)).max(MIN_CHARGE_POWER_KW);
        let p_hi = p1.max(MIN_CHARGE_POWER_KW);
        let seg_time = if (p1 - p0).abs() < 1e-9 {
            battery_seconds * (s1 - lo) / p_lo
        } else {
            let k = (p1 - p0) / (s1 - s0);
            battery_seconds / k * (p_hi.ln() - p_lo.ln())
        };
        if seg_time <= remaining {
            remaining -= seg_time;
            current = s1;
        } else if (p1 - p0).abs() < 1e-9 {
            current = lo + remaining * p_lo / battery_seconds;
            remaining = 0.0;
            break;
        } else {
            let k = (p1 - p0) / (s1 - s0);
            let p_target = p_lo * (k * remaining / battery_seconds).exp();
            current = lo + (p_target - p_lo) / k;
            remaining = 0.0;
            break;
        }
    }
    current.min(1.0)
}

/// A handful of sample points across a CHARGE event, for the result's
/// `soc_timeseries` (`spec.md` §3: "present for CHARGE events once a
/// detailed profile is known").
fn sample_charge_series(
    vt: &VehicleType,
    power_cap_kw: Option<f64>,
    soc_start: f64,
    start_time: Time,
    end_time: Time,
) -> Vec<SocPoint> {
    const SAMPLES: i64 = 5;
    let total = (end_time - start_time).max(0);
    (0..=SAMPLES)
        .map(|i| {
            let t = start_time + total * i / SAMPLES;
            let elapsed = (t - start_time) as f64;
            SocPoint {
                time: t,
                soc: soc_after_charging(vt, power_cap_kw, soc_start, elapsed),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{RepetitionPeriod, SizingParams};
    use crate::model::area::{Area, AreaType};
    use crate::model::depot::Plan;
    use crate::model::process::ServiceKind;
    use crate::model::rotation::Trip;
    use crate::model::vehicle_type::ChargeCurvePoint;
    use crate::model::RotationId;
    use std::time::Duration;

    fn vehicle_type() -> VehicleType {
        VehicleType::new(
            VehicleTypeId(1),
            "std",
            300.0,
            vec![
                ChargeCurvePoint {
                    soc: 0.0,
                    power_kw: 150.0,
                },
                ChargeCurvePoint {
                    soc: 0.8,
                    power_kw: 150.0,
                },
                ChargeCurvePoint {
                    soc: 1.0,
                    power_kw: 20.0,
                },
            ],
            1.2,
            12.0,
            2.55,
            false,
        )
        .unwrap()
    }

    fn simple_depot() -> Depot {
        let shunt = Process {
            kind: ProcessKind::Service(ServiceKind::Shunt),
            duration: Some(Duration::from_secs(300)),
            electric_power_kw: None,
            resource_capacity: Some(2),
            resource_switch: None,
            preemptable: false,
            dispatchable: false,
        };
        let charge = Process {
            kind: ProcessKind::Charge,
            duration: None,
            electric_power_kw: Some(150.0),
            resource_capacity: None,
            resource_switch: None,
            preemptable: false,
            dispatchable: false,
        };
        let standby_departure = Process {
            kind: ProcessKind::StandbyDeparture,
            duration: None,
            electric_power_kw: None,
            resource_capacity: None,
            resource_switch: None,
            preemptable: false,
            dispatchable: true,
        };
        let shunt_area = Area::new(
            AreaId(1),
            AreaType::DirectOneside,
            4,
            None,
            vec![shunt.kind],
            false,
        )
        .unwrap();
        let charge_area = Area::new(
            AreaId(2),
            AreaType::DirectOneside,
            4,
            None,
            vec![charge.kind],
            false,
        )
        .unwrap();
        let standby_area = Area::new(
            AreaId(3),
            AreaType::DirectOneside,
            4,
            None,
            vec![standby_departure.kind],
            true,
        )
        .unwrap();
        Depot::new(
            "central",
            Plan::new(vec![shunt, charge, standby_departure]),
            vec![shunt_area, charge_area, standby_area],
        )
    }

    fn rotation(id: u32, departure: Time, arrival: Time, distance_km: f64) -> Rotation {
        Rotation::new(
            RotationId(id),
            VehicleTypeId(1),
            vec![Trip {
                departure,
                arrival,
                distance_km,
                route: "1".to_string(),
                soc_start: None,
                soc_end: None,
            }],
        )
        .unwrap()
    }

    fn day_sizing() -> SizingParams {
        SizingParams {
            repetition_period: RepetitionPeriod::Day,
            ..SizingParams::default()
        }
    }

    #[test]
    fn steady_cycle_is_feasible() {
        let depot = simple_depot();
        let vt = vehicle_type();
        let rotations = vec![rotation(1, 8 * 3600, 9 * 3600, 20.0)];
        let outcome = simulate(&depot, &[vt], &rotations, &day_sizing());
        assert!(
            outcome.is_feasible(),
            "expected feasible outcome, got {outcome}"
        );
    }

    #[test]
    fn insufficient_fleet_is_unstable() {
        let depot = simple_depot();
        let vt = vehicle_type();
        // Two rotations departing seconds apart leave no time for the first
        // vehicle to complete shunt+charge+standby before the second needs
        // one, so the engine must fabricate a vehicle mid-window.
        let rotations = vec![
            rotation(1, 8 * 3600, 9 * 3600, 20.0),
            rotation(2, 8 * 3600 + 5, 9 * 3600, 20.0),
        ];
        let outcome = simulate(&depot, &[vt], &rotations, &day_sizing());
        assert!(!outcome.is_feasible());
        assert!(matches!(outcome, SimOutcome::Unstable));
    }

    #[test]
    fn long_rotation_drains_more_than_full_battery_underflows() {
        let depot = simple_depot();
        let vt = vehicle_type();
        // 300 kWh battery at 1.2 kWh/km gives 250 km range; 1000 km can't be
        // covered by a single charge.
        let rotations = vec![rotation(1, 8 * 3600, 9 * 3600, 1000.0)];
        let outcome = simulate(&depot, &[vt], &rotations, &day_sizing());
        assert!(matches!(outcome, SimOutcome::SocUnderflow { .. }));
    }

    #[test]
    fn charge_duration_matches_constant_power_segment() {
        let vt = vehicle_type();
        // Below soc 0.8 the curve is flat at 150 kW, capped at 150 kW too:
        // charging 0.0 -> 0.5 should take battery_kwh*0.5/150 hours.
        let seconds = charge_duration_seconds(&vt, Some(150.0), 0.0, 0.5);
        let expected = 300.0 * 0.5 / 150.0 * 3600.0;
        assert!((seconds - expected).abs() < 1.0);
    }

    #[test]
    fn soc_after_charging_is_inverse_of_duration() {
        let vt = vehicle_type();
        let total = charge_duration_seconds(&vt, Some(90.0), 0.2, 0.9);
        let soc = soc_after_charging(&vt, Some(90.0), 0.2, total);
        assert!((soc - 0.9).abs() < 1e-6);
    }
}
