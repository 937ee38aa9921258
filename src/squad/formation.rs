//! Formation geometry around a squad leader
//!
//! Followers stand on a ring around the leader. Slot 0 is directly behind
//! the leader; the rest spread evenly around the circle.

use std::f32::consts::TAU;

use glam::Vec3;

/// Ideal position of follower `index` of `count` on a ring of radius `size`
pub fn formation_slot(leader: Vec3, facing: Vec3, index: usize, count: usize, size: f32) -> Vec3 {
    if count == 0 {
        return leader;
    }

    let mut forward = Vec3::new(facing.x, facing.y, 0.0).normalize_or_zero();
    if forward == Vec3::ZERO {
        forward = Vec3::X;
    }
    let base = forward.y.atan2(forward.x) + TAU / 2.0;
    let angle = base + TAU * index as f32 / count as f32;

    leader + Vec3::new(angle.cos(), angle.sin(), 0.0) * size
}

/// Horizontal distance from the slot in units of the formation size
///
/// 0.0 is on the slot, 1.0 is a whole formation radius away.
pub fn formation_error(position: Vec3, slot: Vec3, size: f32) -> f32 {
    if size <= 0.0 {
        return 0.0;
    }
    let mut offset = position - slot;
    offset.z = 0.0;
    offset.length() / size
}
