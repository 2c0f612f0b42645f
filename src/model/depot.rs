//! Depot and plan: the fixed pipeline every arriving bus traverses.

use serde::{Deserialize, Serialize};

use super::area::Area;
use super::process::Process;

/// The ordered list of processes every arriving bus traverses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Plan {
    pub processes: Vec<Process>,
}

impl Plan {
    pub fn new(processes: Vec<Process>) -> Self {
        Self { processes }
    }

    pub fn len(&self) -> usize {
        self.processes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.processes.is_empty()
    }

    /// The remaining process kinds after the one at `from_index`, used by
    /// `can_park` (C2) to check reachability of the rest of the plan.
    pub fn suffix(&self, from_index: usize) -> &[Process] {
        if from_index >= self.processes.len() {
            &[]
        } else {
            &self.processes[from_index..]
        }
    }
}

/// A depot: a station, its areas, and the plan every bus follows.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Depot {
    pub station: String,
    pub plan: Plan,
    pub areas: Vec<Area>,
}

impl Depot {
    pub fn new(station: impl Into<String>, plan: Plan, areas: Vec<Area>) -> Self {
        Self {
            station: station.into(),
            plan,
            areas,
        }
    }
}
