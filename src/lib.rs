pub mod api;
pub mod audio;
pub mod core;
pub mod display;
pub mod input;
pub mod rig;
pub mod systems;
pub mod text;

// Re-export key types at crate root for convenience
pub use api::stage::{Stage, StageConfig};
pub use api::types::{ElementId, EntryId};
pub use audio::{AudioConfig, ImpactAudio, NullTone, ToneSink};
pub use core::physics::{
    BodyDesc, BodyType, ColliderDesc, ColliderMaterial, Impact, PhysicsBody, PhysicsWorld,
    SpringDesc, SpringHandle,
};
pub use core::time::{Debounce, FixedTimestep};
pub use display::{BufferSink, DisplaySink, GlyphStyle, Placement};
pub use input::queue::{ControlEvent, ControlQueue};
pub use rig::builder::RigConfig;
pub use rig::registry::{LineAnchor, RigEntry, RigRegistry};
pub use rig::rescale::Viewport;
pub use systems::wind::{Rng, Wind, WindConfig, WindState};
pub use text::glyph::{Glyph, MonoMetrics, Script, TextMetrics};
pub use text::wrap::Line;
