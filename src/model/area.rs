//! Parking areas: typed, capacity-bounded containers of vehicles.

use serde::{Deserialize, Serialize};

use super::process::ProcessKind;
use super::vehicle_type::VehicleTypeId;

/// Identifies an [`Area`] within a [`crate::model::Depot`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AreaId(pub u32);

/// The geometric parking pattern of an [`Area`] (`spec.md` §3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AreaType {
    /// Nose-to-tail lanes; capacity must be a multiple of `block_length`.
    Line { block_length: u32 },
    /// Angled parking, each slot independently accessible.
    DirectOneside,
    /// Angled parking, accessible from both sides; capacity must be even.
    DirectTwoside,
}

impl AreaType {
    pub fn is_line(&self) -> bool {
        matches!(self, AreaType::Line { .. })
    }
}

/// A contiguous piece of depot floor holding vehicles of one uniform
/// parking pattern.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Area {
    pub id: AreaId,
    pub area_type: AreaType,
    /// Total parking slots.
    pub capacity: u32,
    /// `None` means any vehicle type is permitted.
    pub vehicle_type: Option<VehicleTypeId>,
    /// Processes this area can host, in no particular order.
    pub permitted_processes: Vec<ProcessKind>,
    /// True for areas that may serve as a rotation-start point
    /// (`STANDBY_DEPARTURE`-hosting areas) — `SPEC_FULL.md` §3.
    pub issink: bool,
    /// Per-slot charging-interface identifiers, one per capacity unit, for
    /// CHARGE-capable areas (`SPEC_FULL.md` §3). Empty for non-charging
    /// areas.
    pub charging_interfaces: Vec<String>,
}

impl Area {
    /// Builds an area, validating the capacity/block-length and
    /// capacity/parity constraints from `spec.md` §3 and §7
    /// (`InvalidConfig`, fatal, never reached at runtime).
    pub fn new(
        id: AreaId,
        area_type: AreaType,
        capacity: u32,
        vehicle_type: Option<VehicleTypeId>,
        permitted_processes: Vec<ProcessKind>,
        issink: bool,
    ) -> Result<Self, crate::error::InvalidConfig> {
        if capacity == 0 {
            return Err(crate::error::InvalidConfig {
                field: "area.capacity",
                message: "must be > 0".to_string(),
            });
        }
        match area_type {
            AreaType::Line { block_length } => {
                if block_length == 0 {
                    return Err(crate::error::InvalidConfig {
                        field: "area.block_length",
                        message: "must be > 0".to_string(),
                    });
                }
                if capacity % block_length != 0 {
                    return Err(crate::error::InvalidConfig {
                        field: "area.capacity",
                        message: format!(
                            "LINE area capacity ({capacity}) must be a multiple of block_length ({block_length})"
                        ),
                    });
                }
            }
            AreaType::DirectTwoside => {
                if capacity % 2 != 0 {
                    return Err(crate::error::InvalidConfig {
                        field: "area.capacity",
                        message: "DIRECT_TWOSIDE capacity must be even".to_string(),
                    });
                }
            }
            AreaType::DirectOneside => {}
        }
        let charging_interfaces = if permitted_processes.contains(&ProcessKind::Charge) {
            (0..capacity).map(|i| format!("ci_{i}")).collect()
        } else {
            Vec::new()
        };
        Ok(Self {
            id,
            area_type,
            capacity,
            vehicle_type,
            permitted_processes,
            issink,
            charging_interfaces,
        })
    }

    pub fn accepts(&self, vehicle_type: VehicleTypeId) -> bool {
        self.vehicle_type.is_none_or(|vt| vt == vehicle_type)
    }

    pub fn hosts(&self, kind: ProcessKind) -> bool {
        self.permitted_processes.contains(&kind)
    }

    pub fn row_count(&self) -> u32 {
        match self.area_type {
            AreaType::Line { block_length } => self.capacity.div_ceil(block_length),
            AreaType::DirectOneside | AreaType::DirectTwoside => 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_zero_capacity() {
        let err = Area::new(AreaId(1), AreaType::DirectOneside, 0, None, vec![], false);
        assert!(err.is_err());
    }

    #[test]
    fn rejects_line_capacity_not_multiple_of_block_length() {
        let err = Area::new(
            AreaId(1),
            AreaType::Line { block_length: 6 },
            10,
            None,
            vec![],
            false,
        );
        assert!(err.is_err());
    }

    #[test]
    fn accepts_line_capacity_multiple_of_block_length() {
        let area = Area::new(
            AreaId(1),
            AreaType::Line { block_length: 6 },
            12,
            None,
            vec![],
            false,
        )
        .unwrap();
        assert_eq!(area.row_count(), 2);
    }

    #[test]
    fn rejects_odd_direct_twoside_capacity() {
        let err = Area::new(AreaId(1), AreaType::DirectTwoside, 5, None, vec![], false);
        assert!(err.is_err());
    }

    #[test]
    fn charge_capable_area_gets_one_interface_per_slot() {
        let area = Area::new(
            AreaId(1),
            AreaType::DirectOneside,
            4,
            None,
            vec![ProcessKind::Charge],
            true,
        )
        .unwrap();
        assert_eq!(area.charging_interfaces.len(), 4);
        assert_eq!(area.charging_interfaces[0], "ci_0");
    }

    #[test]
    fn accepts_matches_vehicle_type_filter() {
        let area = Area::new(
            AreaId(1),
            AreaType::DirectOneside,
            4,
            Some(VehicleTypeId(7)),
            vec![],
            false,
        )
        .unwrap();
        assert!(area.accepts(VehicleTypeId(7)));
        assert!(!area.accepts(VehicleTypeId(8)));
    }
}
