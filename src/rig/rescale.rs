//! Viewport rescaling: re-derive the rig's geometry in place when the
//! viewport changes, without rebuilding it.

use glam::Vec2;

use crate::core::physics::{PhysicsWorld, SpringDesc};
use crate::rig::builder::RigConfig;
use crate::rig::registry::RigRegistry;

/// Current viewport dimensions. Written only by the rescale pass, read by
/// the builder for initial placement.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
}

impl Viewport {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// Scale factor from this viewport to a new width. A zero or
    /// degenerate previous width falls back to identity rather than
    /// dividing by zero.
    pub fn scale_to(&self, new_width: f32) -> f32 {
        if self.width <= 0.0 {
            return 1.0;
        }
        let scale = new_width / self.width;
        if scale.is_finite() && scale > 0.0 {
            scale
        } else {
            1.0
        }
    }
}

/// Rescale every live body and anchor around the new horizontal center.
///
/// Bodies keep their offset-from-center proportionally, their vertical
/// position and extents scale uniformly, hanging constraints are
/// re-registered with scaled attachment offsets and rest lengths, anchors
/// stretch horizontally only, and fallen glyphs are clamped back above the
/// floor. Boundaries are the caller's (they are rebuilt, not scaled).
pub fn rescale(
    physics: &mut PhysicsWorld,
    registry: &mut RigRegistry,
    viewport: &mut Viewport,
    cfg: &RigConfig,
    new_width: f32,
    new_height: f32,
) {
    let scale = viewport.scale_to(new_width);
    let old_center = viewport.width / 2.0;
    let new_center = new_width / 2.0;

    // Glyph bodies, both pools: recenter, scale, keep rotation.
    for entry in registry.live_mut() {
        let Some((pos, rot)) = physics.body_position(&entry.body) else {
            continue;
        };
        let offset = pos.x - old_center;
        let new_pos = Vec2::new(new_center + offset * scale, pos.y * scale);
        physics.set_position(&entry.body, new_pos, rot);
        physics.scale_collider(&entry.body, scale, scale);
        entry.half *= scale;
        entry.anchor_local *= scale;
        entry.rest_length *= scale;
        // Mass scales with collider area (scale²); stiffness scaling by
        // `scale` keeps the equilibrium stretch proportional to the rig.
        entry.stiffness *= scale;
    }

    // Fallen glyphs must not end up under the floor.
    for entry in registry.fallen_mut() {
        let Some((pos, rot)) = physics.body_position(&entry.body) else {
            continue;
        };
        let max_y = new_height - entry.half.y;
        if pos.y > max_y {
            physics.set_position(&entry.body, Vec2::new(pos.x, max_y), rot);
        }
    }

    // Anchors recenter and stretch horizontally; they stay thin.
    let anchors: Vec<_> = registry
        .anchors()
        .iter()
        .map(|a| (a.line, a.body))
        .collect();
    for (_, body) in &anchors {
        if let Some((pos, rot)) = physics.body_position(body) {
            physics.set_position(body, Vec2::new(new_center, pos.y * scale), rot);
            physics.scale_collider(body, scale, 1.0);
        }
    }

    // Re-register every still-live constraint with the scaled geometry.
    for entry in registry.hanging_mut() {
        let Some(anchor_body) = anchors
            .iter()
            .find(|(line, _)| *line == entry.line)
            .map(|(_, body)| *body)
        else {
            continue;
        };
        if let Some(old) = entry.constraint.take() {
            physics.remove_spring(old);
        }
        entry.constraint = Some(physics.create_spring(
            &anchor_body,
            &entry.body,
            &SpringDesc {
                anchor_a: entry.anchor_local,
                anchor_b: Vec2::new(0.0, -entry.half.y),
                rest_length: entry.rest_length,
                stiffness: entry.stiffness,
                damping: cfg.spring_damping,
            },
        ));
    }

    log::debug!(
        "rescaled {}x{} -> {new_width}x{new_height} (factor {scale:.3})",
        viewport.width,
        viewport.height
    );
    viewport.width = new_width;
    viewport.height = new_height;
}
