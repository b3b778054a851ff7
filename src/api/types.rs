/// Unique identifier for a character rig entry.
///
/// Ids are handed out by the registry and stored in the physics engine's
/// `user_data` so collision events can be mapped back to entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EntryId(pub u32);

impl EntryId {
    /// Reserved id for bodies that are not rig entries (anchors, walls,
    /// the pointer). Collision events involving them still fire; lookups
    /// simply find no entry.
    pub const NONE: EntryId = EntryId(0);

    pub fn is_none(self) -> bool {
        self.0 == 0
    }
}

/// Identifier for a visual element in the display sink.
/// Allocated by the sink, paired 1:1 with a rig entry's body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ElementId(pub u32);
