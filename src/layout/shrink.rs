//! Three-phase footprint shrink: once a footprint packs successfully, try
//! to shrink it further to cut wasted floor area (`spec.md` §4.7).

use super::packer::{pack, PlacedRect, PlacementRequest};
use super::rect::Rect;
use crate::error::PackingError;

#[derive(Clone, Copy)]
enum ShrinkAxis {
    Both,
    WidthOnly,
    HeightOnly,
}

fn candidate(footprint: Rect, axis: ShrinkAxis, step: f64) -> Rect {
    match axis {
        ShrinkAxis::Both => Rect::new(footprint.x, footprint.y, footprint.w - step, footprint.h - step),
        ShrinkAxis::WidthOnly => Rect::new(footprint.x, footprint.y, footprint.w - step, footprint.h),
        ShrinkAxis::HeightOnly => Rect::new(footprint.x, footprint.y, footprint.w, footprint.h - step),
    }
}

/// Packs `requests` into `initial_footprint`, then repeatedly shrinks by
/// `reduction_step` — first both dimensions, then width-only, then
/// height-only — keeping the smallest footprint that still packs at each
/// phase before moving to the next. Fails only if the initial footprint
/// itself can't be packed.
pub fn shrink_to_fit(
    requests: &[PlacementRequest],
    initial_footprint: Rect,
    reduction_step: f64,
    min_free_rect_size: f64,
) -> Result<(Rect, Vec<PlacedRect>), PackingError> {
    let mut best = (
        initial_footprint,
        pack(requests, initial_footprint, min_free_rect_size)?,
    );

    for axis in [ShrinkAxis::Both, ShrinkAxis::WidthOnly, ShrinkAxis::HeightOnly] {
        loop {
            let next = candidate(best.0, axis, reduction_step);
            if next.w <= 0.0 || next.h <= 0.0 {
                break;
            }
            match pack(requests, next, min_free_rect_size) {
                Ok(placed) => best = (next, placed),
                Err(_) => break,
            }
        }
    }

    Ok(best)
}
