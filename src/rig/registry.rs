//! The rig registry: exclusive owner of every character rig entry and the
//! anchors their constraints hang from.
//!
//! Entries live in exactly one of two ordered pools — hanging (anchored,
//! swaying) or fallen (cut loose) — and are destroyed outright on
//! retirement, which keeps the three lifecycle states disjoint by
//! construction. All pool mutation happens here, atomically within one
//! call; the synchronizer and wind loop only ever read.

use glam::Vec2;

use crate::api::types::{ElementId, EntryId};
use crate::core::physics::{PhysicsBody, PhysicsWorld, SpringHandle};
use crate::display::DisplaySink;
use crate::systems::wind::{self, Rng, WindConfig};

/// One glyph's simulation unit: body + element + (while hanging) the
/// spring to its line's anchor. Body and element are created together and
/// destroyed together, always through the registry.
#[derive(Debug)]
pub struct RigEntry {
    pub id: EntryId,
    pub ch: char,
    /// Index of the line this glyph was laid out on.
    pub line: usize,
    pub body: PhysicsBody,
    pub element: ElementId,
    pub constraint: Option<SpringHandle>,
    /// Attachment point in the anchor body's local space.
    pub anchor_local: Vec2,
    pub rest_length: f32,
    /// Weight-derived spring stiffness, kept so rescaling can re-register
    /// the constraint without re-deriving it.
    pub stiffness: f32,
    /// Current collider half extents, tracked for rescaling and clamping.
    pub half: Vec2,
}

/// The invisible static body one line of glyphs hangs from.
#[derive(Debug)]
pub struct LineAnchor {
    pub line: usize,
    pub body: PhysicsBody,
}

#[derive(Debug, Default)]
pub struct RigRegistry {
    hanging: Vec<RigEntry>,
    fallen: Vec<RigEntry>,
    anchors: Vec<LineAnchor>,
    retired: usize,
    next_id: u32,
}

impl RigRegistry {
    pub fn new() -> Self {
        Self {
            hanging: Vec::new(),
            fallen: Vec::new(),
            anchors: Vec::new(),
            retired: 0,
            next_id: 1,
        }
    }

    /// Hand out the next entry id (never `EntryId::NONE`).
    pub fn alloc_id(&mut self) -> EntryId {
        let id = EntryId(self.next_id);
        self.next_id += 1;
        id
    }

    /// Adopt a freshly built entry into the hanging pool.
    pub fn adopt(&mut self, entry: RigEntry) {
        self.hanging.push(entry);
    }

    pub fn add_anchor(&mut self, anchor: LineAnchor) {
        self.anchors.push(anchor);
    }

    pub fn hanging(&self) -> &[RigEntry] {
        &self.hanging
    }

    pub fn fallen(&self) -> &[RigEntry] {
        &self.fallen
    }

    pub fn anchors(&self) -> &[LineAnchor] {
        &self.anchors
    }

    pub(crate) fn hanging_mut(&mut self) -> &mut [RigEntry] {
        &mut self.hanging
    }

    pub(crate) fn fallen_mut(&mut self) -> &mut [RigEntry] {
        &mut self.fallen
    }

    pub(crate) fn live_mut(&mut self) -> impl Iterator<Item = &mut RigEntry> {
        self.hanging.iter_mut().chain(self.fallen.iter_mut())
    }

    /// Entries visible to the synchronizer and the wind: hanging ∪ fallen.
    pub fn live(&self) -> impl Iterator<Item = &RigEntry> {
        self.hanging.iter().chain(self.fallen.iter())
    }

    /// Body handles of every live entry, for force application.
    pub fn live_bodies(&self) -> impl Iterator<Item = PhysicsBody> + '_ {
        self.live().map(|e| e.body)
    }

    /// Number of entries retired by `retire_all` over this registry's
    /// lifetime. Retired entries hold no body or element, so only the
    /// count remains. Entries destroyed by `clear` are replaced, not
    /// retired, and are not counted here.
    pub fn retired_count(&self) -> usize {
        self.retired
    }

    /// Destroy every hanging entry (constraint, body, element) and every
    /// anchor. The fallen pool is untouched — glyphs already on the floor
    /// stay where they lie.
    pub fn clear(&mut self, physics: &mut PhysicsWorld, sink: &mut dyn DisplaySink) {
        let hanging = std::mem::take(&mut self.hanging);
        let count = hanging.len();
        for mut entry in hanging {
            if let Some(spring) = entry.constraint.take() {
                physics.remove_spring(spring);
            }
            physics.remove_body(&entry.body);
            sink.remove_element(entry.element);
        }
        self.remove_anchors(physics);
        if count > 0 {
            log::info!("cleared {count} hanging glyphs");
        }
    }

    /// Cut every hanging glyph loose: remove its constraint and anchor,
    /// drop its air friction to `fallen_damping`, flutter it, and move it
    /// to the fallen pool.
    pub fn detach_to_fallen(
        &mut self,
        physics: &mut PhysicsWorld,
        rng: &mut Rng,
        cfg: &WindConfig,
        fallen_damping: f32,
    ) {
        // Snapshot-drain before mutating so nothing iterates a pool that
        // is changing under it.
        let detached = std::mem::take(&mut self.hanging);
        let count = detached.len();
        for mut entry in detached {
            if let Some(spring) = entry.constraint.take() {
                physics.remove_spring(spring);
            }
            physics.set_linear_damping(&entry.body, fallen_damping);
            wind::flutter(physics, rng, &entry.body, cfg);
            self.fallen.push(entry);
        }
        self.remove_anchors(physics);
        if count > 0 {
            log::info!("detached {count} glyphs to fallen");
        }
    }

    /// Destroy everything in both pools. Pools end empty; the entries are
    /// gone from simulation and display.
    pub fn retire_all(&mut self, physics: &mut PhysicsWorld, sink: &mut dyn DisplaySink) {
        let all = std::mem::take(&mut self.hanging)
            .into_iter()
            .chain(std::mem::take(&mut self.fallen));
        let mut count = 0;
        for mut entry in all {
            if let Some(spring) = entry.constraint.take() {
                physics.remove_spring(spring);
            }
            physics.remove_body(&entry.body);
            sink.remove_element(entry.element);
            self.retired += 1;
            count += 1;
        }
        self.remove_anchors(physics);
        if count > 0 {
            log::info!("retired {count} glyphs");
        }
    }

    fn remove_anchors(&mut self, physics: &mut PhysicsWorld) {
        for anchor in std::mem::take(&mut self.anchors) {
            physics.remove_body(&anchor.body);
        }
    }
}
