//! The stage: owns the physics world, the registry, and every clock, and
//! exposes the four user actions plus resize and pointer input.
//!
//! Everything runs on one logical thread. The host calls `frame` once per
//! display refresh with its frame delta; the stage drains control events,
//! fires the debounced rescale, advances physics on its fixed clock,
//! forwards impacts to the tone service, ticks the wind, and synchronizes
//! the display list.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::audio::{AudioConfig, ImpactAudio, ToneSink};
use crate::core::physics::{
    BodyDesc, ColliderDesc, ColliderMaterial, Impact, PhysicsBody, PhysicsWorld,
};
use crate::core::time::{Debounce, FixedTimestep};
use crate::display::DisplaySink;
use crate::input::queue::{ControlEvent, ControlQueue};
use crate::rig::builder::{self, RigConfig};
use crate::rig::registry::RigRegistry;
use crate::rig::rescale::{self, Viewport};
use crate::rig::sync::sync_frame;
use crate::systems::wind::{Wind, WindConfig};
use crate::text::glyph::TextMetrics;

/// Full stage tuning. Every field has a default; hosts usually override a
/// handful via `from_json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StageConfig {
    pub viewport_width: f32,
    pub viewport_height: f32,
    /// Downward gravity in px/s² (y-down coordinates).
    pub gravity_y: f32,
    /// Physics timestep in seconds.
    pub fixed_dt: f32,
    /// Quiet period for the resize debounce, in seconds.
    pub debounce_window: f32,
    /// Half thickness of the floor and walls.
    pub wall_thickness: f32,
    /// Rig rebuilt by a full reset.
    pub default_text: String,
    pub wind_seed: u64,
    pub rig: RigConfig,
    pub wind: WindConfig,
    pub audio: AudioConfig,
}

impl Default for StageConfig {
    fn default() -> Self {
        Self {
            viewport_width: 800.0,
            viewport_height: 600.0,
            gravity_y: 981.0,
            fixed_dt: 1.0 / 60.0,
            debounce_window: 0.25,
            wall_thickness: 60.0,
            default_text: "hang in there".to_string(),
            wind_seed: 42,
            rig: RigConfig::default(),
            wind: WindConfig::default(),
            audio: AudioConfig::default(),
        }
    }
}

impl StageConfig {
    /// Parse a config from a JSON string; missing fields keep defaults.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

/// The orchestrator. The registry, physics world, clocks, and audio gate
/// all live here; the host supplies metrics, display, and tone seams.
pub struct Stage {
    config: StageConfig,
    physics: PhysicsWorld,
    registry: RigRegistry,
    viewport: Viewport,
    wind: Wind,
    debounce: Debounce<(f32, f32)>,
    timestep: FixedTimestep,
    audio: ImpactAudio,
    bounds: Vec<PhysicsBody>,
    impacts: Vec<Impact>,
}

impl Stage {
    pub fn new(config: StageConfig) -> Self {
        let mut physics = PhysicsWorld::new(Vec2::new(0.0, config.gravity_y));
        physics.set_dt(config.fixed_dt);
        let bounds = Self::make_bounds(
            &mut physics,
            config.viewport_width,
            config.viewport_height,
            config.wall_thickness,
        );
        Self {
            viewport: Viewport::new(config.viewport_width, config.viewport_height),
            wind: Wind::new(config.wind, config.wind_seed),
            debounce: Debounce::new(config.debounce_window),
            timestep: FixedTimestep::new(config.fixed_dt),
            audio: ImpactAudio::new(config.audio),
            physics,
            registry: RigRegistry::new(),
            bounds,
            impacts: Vec::new(),
            config,
        }
    }

    pub fn config(&self) -> &StageConfig {
        &self.config
    }

    pub fn registry(&self) -> &RigRegistry {
        &self.registry
    }

    pub fn physics(&self) -> &PhysicsWorld {
        &self.physics
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn is_muted(&self) -> bool {
        self.audio.is_muted()
    }

    /// Floor and side walls: cheap static geometry, rebuilt (not scaled)
    /// on every resize. No ceiling — plucked glyphs may pop out the top.
    fn make_bounds(
        physics: &mut PhysicsWorld,
        width: f32,
        height: f32,
        thickness: f32,
    ) -> Vec<PhysicsBody> {
        use crate::api::types::EntryId;
        let floor = physics.create_body(
            EntryId::NONE,
            &BodyDesc::fixed(ColliderDesc::Cuboid {
                half_width: width / 2.0 + 2.0 * thickness,
                half_height: thickness,
            })
            .with_position(Vec2::new(width / 2.0, height + thickness)),
            ColliderMaterial::default(),
        );
        let left = physics.create_body(
            EntryId::NONE,
            &BodyDesc::fixed(ColliderDesc::Cuboid {
                half_width: thickness,
                half_height: height * 2.0,
            })
            .with_position(Vec2::new(-thickness, height / 2.0)),
            ColliderMaterial::default(),
        );
        let right = physics.create_body(
            EntryId::NONE,
            &BodyDesc::fixed(ColliderDesc::Cuboid {
                half_width: thickness,
                half_height: height * 2.0,
            })
            .with_position(Vec2::new(width + thickness, height / 2.0)),
            ColliderMaterial::default(),
        );
        vec![floor, left, right]
    }

    fn rebuild_bounds(&mut self, width: f32, height: f32) {
        for body in std::mem::take(&mut self.bounds) {
            self.physics.remove_body(&body);
        }
        self.bounds = Self::make_bounds(
            &mut self.physics,
            width,
            height,
            self.config.wall_thickness,
        );
    }

    // -- User actions --

    /// Replace the hanging rig with one built from `text`. The stage is
    /// cleared first, so an empty or whitespace-only submission leaves it
    /// cleared. Returns the number of glyphs rigged.
    pub fn submit_text(
        &mut self,
        text: &str,
        metrics: &dyn TextMetrics,
        sink: &mut dyn DisplaySink,
    ) -> usize {
        self.registry.clear(&mut self.physics, sink);
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return 0;
        }
        builder::build(
            &mut self.physics,
            &mut self.registry,
            sink,
            metrics,
            self.wind.rng_mut(),
            trimmed,
            &self.viewport,
            &self.config.rig,
            &self.config.wind,
        )
    }

    /// Cut the hanging rig loose into the fallen pool.
    pub fn pluck(&mut self) {
        self.registry.detach_to_fallen(
            &mut self.physics,
            self.wind.rng_mut(),
            &self.config.wind,
            self.config.rig.fallen_damping,
        );
    }

    /// Remove everything, hanging and fallen, from simulation and display.
    pub fn retire_all(&mut self, sink: &mut dyn DisplaySink) {
        self.registry.retire_all(&mut self.physics, sink);
    }

    /// Full reset: retire everything, then rig the default text.
    pub fn reset_all(&mut self, metrics: &dyn TextMetrics, sink: &mut dyn DisplaySink) {
        self.retire_all(sink);
        let text = self.config.default_text.clone();
        self.submit_text(&text, metrics, sink);
    }

    /// Toggle collision audio; returns the new muted state.
    pub fn toggle_mute(&mut self) -> bool {
        self.audio.toggle_mute()
    }

    /// Host reports the user gesture that unlocks audio output.
    pub fn activate_audio(&mut self) {
        self.audio.activate();
    }

    /// Record a viewport-size signal. The rescale runs only after signals
    /// stop arriving for the debounce window.
    pub fn resize(&mut self, width: f32, height: f32) {
        self.debounce.signal((width, height));
    }

    pub fn pointer_down(&mut self, x: f32, y: f32) -> bool {
        self.physics.pointer_down(Vec2::new(x, y))
    }

    pub fn pointer_move(&mut self, x: f32, y: f32) {
        self.physics.pointer_move(Vec2::new(x, y));
    }

    pub fn pointer_up(&mut self) {
        self.physics.pointer_up();
    }

    fn apply_resize(&mut self, width: f32, height: f32) {
        self.rebuild_bounds(width, height);
        rescale::rescale(
            &mut self.physics,
            &mut self.registry,
            &mut self.viewport,
            &self.config.rig,
            width,
            height,
        );
    }

    // -- Frame loop --

    /// One display frame: drain control events, run the debounce, advance
    /// physics on its fixed clock, forward impacts to the tone service,
    /// tick the wind, and synchronize placements.
    pub fn frame(
        &mut self,
        dt: f32,
        queue: &mut ControlQueue,
        metrics: &dyn TextMetrics,
        sink: &mut dyn DisplaySink,
        tone: &mut dyn ToneSink,
    ) {
        for event in queue.drain() {
            match event {
                ControlEvent::SubmitText(text) => {
                    self.submit_text(&text, metrics, sink);
                }
                ControlEvent::Pluck => self.pluck(),
                ControlEvent::Reset => self.reset_all(metrics, sink),
                ControlEvent::ToggleMute => {
                    self.toggle_mute();
                }
                ControlEvent::Resize { width, height } => self.resize(width, height),
                ControlEvent::PointerDown { x, y } => {
                    self.pointer_down(x, y);
                }
                ControlEvent::PointerMove { x, y } => self.pointer_move(x, y),
                ControlEvent::PointerUp => self.pointer_up(),
            }
        }

        if let Some((width, height)) = self.debounce.tick(dt) {
            self.apply_resize(width, height);
        }

        self.impacts.clear();
        let steps = self.timestep.accumulate(dt);
        for _ in 0..steps {
            self.physics.step_into(&mut self.impacts);
        }
        for impact in &self.impacts {
            self.audio.impact(impact.speed, impact.size, tone);
        }

        self.wind.tick(&mut self.physics, self.registry.live_bodies());
        sync_frame(&self.registry, &self.physics, sink);
    }
}
