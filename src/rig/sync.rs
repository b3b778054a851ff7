//! Frame synchronizer: copy body transforms into display placements.

use crate::core::physics::PhysicsWorld;
use crate::display::{DisplaySink, Placement};
use crate::rig::registry::RigRegistry;

/// Run once per display frame over hanging ∪ fallen. Reads each live
/// body's position/rotation and writes a centered placement to its paired
/// element. Never mutates physics state; entries whose body or element
/// vanished between a lifecycle transition and this pass are skipped.
pub fn sync_frame(registry: &RigRegistry, physics: &PhysicsWorld, sink: &mut dyn DisplaySink) {
    for entry in registry.live() {
        let Some((pos, rot)) = physics.body_position(&entry.body) else {
            continue;
        };
        // A false return means the sink no longer holds the element;
        // the next lifecycle pass owns the cleanup.
        let _ = sink.set_placement(
            entry.element,
            Placement {
                x: pos.x,
                y: pos.y,
                rotation: rot,
            },
        );
    }
}
