//! C7: bin-packing layout engine. Turns the area footprints [`crate::sizing`]
//! computes into a concrete floor plan — positions for every area plus the
//! border driveway rectangles vehicles use to enter and leave them.

pub mod packer;
pub mod rect;
pub mod shrink;

use crate::config::PackingParams;
use crate::error::PackingError;
use crate::model::area::{Area, AreaId};

use packer::PlacementRequest;
use rect::Rect;

/// A placed area, or a border driveway rectangle (`area == AreaId(0)`,
/// `is_driveway == true`) carved out before packing begins.
#[derive(Debug, Clone, Copy)]
pub struct PlacedArea {
    pub area: AreaId,
    pub rect: Rect,
    pub is_driveway: bool,
}

#[derive(Debug, Clone)]
pub struct LayoutResult {
    pub footprint: Rect,
    pub placements: Vec<PlacedArea>,
}

/// `create_bin`'s auto-sizing heuristic (`spec.md` §4.7): a square-ish
/// footprint sized from total rectangle area, clamped up so the largest
/// single rectangle is always guaranteed to fit.
fn auto_bin_size(rects: &[(f64, f64)]) -> (f64, f64) {
    let total_area: f64 = rects.iter().map(|(w, h)| w * h).sum();
    let max_w = rects.iter().map(|(w, _)| *w).fold(0.0, f64::max);
    let max_h = rects.iter().map(|(_, h)| *h).fold(0.0, f64::max);

    let width = (total_area.sqrt() * 1.4).ceil().max(max_w * 1.5);
    let height = (max_h * 1.5).max(max_h * 1.5);
    (width, height)
}

/// Lays out `areas` (each already sized to `(width, height)` by
/// [`crate::sizing`]) on a depot floor. When `footprint` is `None`,
/// auto-sizes it with [`auto_bin_size`]. Border driveway rectangles of
/// thickness `ceil(driving_lane_width / 2)` are carved from the four edges
/// before packing and reported back tagged `is_driveway: true`.
pub fn layout_depot(
    areas: &[(Area, f64, f64)],
    footprint: Option<(f64, f64)>,
    packing: &PackingParams,
    driving_lane_width: f64,
) -> Result<LayoutResult, PackingError> {
    let dims: Vec<(f64, f64)> = areas.iter().map(|(_, w, h)| (*w, *h)).collect();
    let (width, height) = footprint.unwrap_or_else(|| auto_bin_size(&dims));

    let border = (driving_lane_width / 2.0).ceil();
    let inner = Rect::new(
        border,
        border,
        (width - 2.0 * border).max(0.0),
        (height - 2.0 * border).max(0.0),
    );

    let requests: Vec<PlacementRequest> = areas
        .iter()
        .map(|(area, w, h)| {
            let margins = packing.margins_for(area.area_type);
            PlacementRequest {
                key: area.id.0,
                w: w + margins.left + margins.right,
                h: h + margins.top + margins.bottom,
                is_line: area.area_type.is_line(),
            }
        })
        .collect();

    let (packed_footprint, placed) =
        shrink::shrink_to_fit(&requests, inner, packing.reduction_step, packing.min_free_rect_size)?;

    let mut placements: Vec<PlacedArea> = placed
        .into_iter()
        .map(|p| PlacedArea {
            area: AreaId(p.key),
            rect: p.rect,
            is_driveway: false,
        })
        .collect();

    let total_w = packed_footprint.w + 2.0 * border;
    let total_h = packed_footprint.h + 2.0 * border;

    placements.push(PlacedArea {
        area: AreaId(0),
        rect: Rect::new(0.0, 0.0, total_w, border),
        is_driveway: true,
    });
    placements.push(PlacedArea {
        area: AreaId(0),
        rect: Rect::new(0.0, total_h - border, total_w, border),
        is_driveway: true,
    });
    placements.push(PlacedArea {
        area: AreaId(0),
        rect: Rect::new(0.0, 0.0, border, total_h),
        is_driveway: true,
    });
    placements.push(PlacedArea {
        area: AreaId(0),
        rect: Rect::new(total_w - border, 0.0, border, total_h),
        is_driveway: true,
    });

    Ok(LayoutResult {
        footprint: Rect::new(0.0, 0.0, total_w, total_h),
        placements,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::area::AreaType;
    use crate::model::process::ProcessKind;

    fn direct_area(id: u32, capacity: u32) -> Area {
        Area::new(AreaId(id), AreaType::DirectOneside, capacity, None, vec![ProcessKind::Standby], false).unwrap()
    }

    #[test]
    fn auto_sized_layout_places_all_areas_and_four_driveways() {
        let areas = vec![
            (direct_area(1, 4), 10.0, 8.0),
            (direct_area(2, 6), 12.0, 9.0),
        ];
        let packing = PackingParams::default();
        let result = layout_depot(&areas, None, &packing, 8.0).unwrap();

        let driveways = result.placements.iter().filter(|p| p.is_driveway).count();
        let placed_areas = result.placements.iter().filter(|p| !p.is_driveway).count();
        assert_eq!(driveways, 4);
        assert_eq!(placed_areas, 2);
    }

    #[test]
    fn explicit_footprint_too_small_fails() {
        let areas = vec![(direct_area(1, 4), 100.0, 100.0)];
        let packing = PackingParams::default();
        let err = layout_depot(&areas, Some((10.0, 10.0)), &packing, 8.0).unwrap_err();
        assert!(matches!(err, PackingError::PlacementFailed { .. }));
    }
}
