//! Disturbance engine: the three impulse policies (settle-in, flutter,
//! wind gusts) that keep the rig from looking like a screenshot.
//!
//! All randomness flows through a seeded xorshift generator, so every
//! policy is reproducible under test. Forces land on glyph bodies only,
//! never on anchors.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::core::physics::{PhysicsBody, PhysicsWorld};

/// Seedable pseudo-random number generator (xorshift64).
/// Deterministic, fast, no-std compatible.
#[derive(Debug, Clone)]
pub struct Rng {
    state: u64,
}

impl Rng {
    pub fn new(seed: u64) -> Self {
        Rng {
            state: if seed == 0 { 1 } else { seed },
        }
    }

    fn next_u64(&mut self) -> u64 {
        let mut x = self.state;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.state = x;
        x
    }

    /// Generate a random number in [0, upper_bound).
    pub fn next_int(&mut self, upper_bound: u32) -> u32 {
        (self.next_u64() % upper_bound as u64) as u32
    }

    /// Generate a random float in [0, 1).
    pub fn next_f32(&mut self) -> f32 {
        (self.next_u64() >> 40) as f32 / (1u64 << 24) as f32
    }

    /// Generate a random float in [lo, hi).
    pub fn range(&mut self, lo: f32, hi: f32) -> f32 {
        lo + (hi - lo) * self.next_f32()
    }

    /// Random sign: -1.0 or +1.0.
    pub fn sign(&mut self) -> f32 {
        if self.next_u64() & 1 == 0 {
            1.0
        } else {
            -1.0
        }
    }
}

/// Tuning for all three disturbance policies.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct WindConfig {
    /// Display frames between the end of one gust and the start of the next.
    pub gap_frames: u32,
    /// Gust duration bounds, in display frames.
    pub min_gust_frames: u32,
    pub max_gust_frames: u32,
    /// Base horizontal gust force, scaled by the per-gust intensity.
    pub base_force: f32,
    /// Per-gust intensity multiplier bounds.
    pub intensity_min: f32,
    pub intensity_max: f32,
    /// Fresh per-frame random force added on both axes while blowing.
    pub turbulence: f32,
    /// Random offset of the force application point from the body center;
    /// off-center application is what makes glyphs twist in the wind.
    pub point_jitter: f32,
    /// Settle-in: one-shot impulse magnitude and max spin at rig creation.
    pub settle_impulse: f32,
    pub settle_spin: f32,
    /// Flutter: near-zero horizontal scatter, upward pop, and spin applied
    /// when a glyph is detached.
    pub flutter_scatter: f32,
    pub flutter_lift: f32,
    pub flutter_spin: f32,
}

impl Default for WindConfig {
    fn default() -> Self {
        Self {
            gap_frames: 360,
            min_gust_frames: 45,
            max_gust_frames: 150,
            base_force: 550.0,
            intensity_min: 0.6,
            intensity_max: 1.6,
            turbulence: 140.0,
            point_jitter: 10.0,
            settle_impulse: 120.0,
            settle_spin: 1.5,
            flutter_scatter: 12.0,
            flutter_lift: 220.0,
            flutter_spin: 4.0,
        }
    }
}

/// One-shot settle-in shake for a freshly built rig: a small random
/// impulse and spin per body so the line never starts perfectly still.
pub fn settle_in(physics: &mut PhysicsWorld, rng: &mut Rng, bodies: &[PhysicsBody], cfg: &WindConfig) {
    for body in bodies {
        let impulse = Vec2::new(
            rng.range(-1.0, 1.0) * cfg.settle_impulse,
            rng.range(-0.5, 0.5) * cfg.settle_impulse,
        );
        physics.apply_impulse(body, impulse);
        physics.set_angular_velocity(body, rng.range(-1.0, 1.0) * cfg.settle_spin);
    }
}

/// One-shot flutter for a glyph leaving the line: barely any horizontal
/// scatter, a small upward pop (y-down, so negative), and a bigger spin
/// than settle-in. The caller drops the body's air friction alongside.
pub fn flutter(physics: &mut PhysicsWorld, rng: &mut Rng, body: &PhysicsBody, cfg: &WindConfig) {
    let impulse = Vec2::new(
        rng.range(-1.0, 1.0) * cfg.flutter_scatter,
        -rng.range(0.5, 1.0) * cfg.flutter_lift,
    );
    physics.apply_impulse(body, impulse);
    physics.set_angular_velocity(body, rng.range(-1.0, 1.0) * cfg.flutter_spin);
}

/// Gust scheduler state. Explicit frame counts instead of self-scheduling
/// callbacks keep it restartable and testable without a display clock.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum WindState {
    /// Waiting out the gap before the next gust.
    Idle { frames_left: u32 },
    /// A gust in progress with its chosen direction and strength.
    Blowing {
        frames_left: u32,
        dir: f32,
        intensity: f32,
    },
}

/// The recurring wind gust loop. Ticked once per display frame; a finished
/// gust schedules the next one after the fixed gap, chaining forever.
pub struct Wind {
    cfg: WindConfig,
    rng: Rng,
    state: WindState,
}

impl Wind {
    pub fn new(cfg: WindConfig, seed: u64) -> Self {
        let gap = cfg.gap_frames;
        Self {
            cfg,
            rng: Rng::new(seed),
            state: WindState::Idle { frames_left: gap },
        }
    }

    pub fn state(&self) -> WindState {
        self.state
    }

    pub fn is_blowing(&self) -> bool {
        matches!(self.state, WindState::Blowing { .. })
    }

    /// The shared random source for the one-shot policies.
    pub fn rng_mut(&mut self) -> &mut Rng {
        &mut self.rng
    }

    /// Start a gust immediately with fresh random direction, intensity,
    /// and duration. Also used by the scheduler when the gap elapses.
    pub fn start_gust(&mut self) {
        let dir = self.rng.sign();
        let intensity = self.rng.range(self.cfg.intensity_min, self.cfg.intensity_max);
        let frames = self.cfg.min_gust_frames
            + self
                .rng
                .next_int(self.cfg.max_gust_frames.saturating_sub(self.cfg.min_gust_frames).max(1));
        log::debug!("gust: dir={dir} intensity={intensity:.2} frames={frames}");
        self.state = WindState::Blowing {
            frames_left: frames,
            dir,
            intensity,
        };
    }

    /// Advance the scheduler by one display frame, applying gust forces to
    /// every live body. Bodies removed mid-gust are simply absent from the
    /// iterator next frame; the gust itself always runs to completion.
    pub fn tick(
        &mut self,
        physics: &mut PhysicsWorld,
        bodies: impl Iterator<Item = PhysicsBody>,
    ) {
        match self.state {
            WindState::Idle { frames_left } => {
                if frames_left <= 1 {
                    self.start_gust();
                } else {
                    self.state = WindState::Idle {
                        frames_left: frames_left - 1,
                    };
                }
            }
            WindState::Blowing {
                frames_left,
                dir,
                intensity,
            } => {
                for body in bodies {
                    let Some((pos, _)) = physics.body_position(&body) else {
                        continue;
                    };
                    let force = Vec2::new(
                        dir * self.cfg.base_force * intensity
                            + self.rng.range(-1.0, 1.0) * self.cfg.turbulence,
                        self.rng.range(-1.0, 1.0) * self.cfg.turbulence * 0.5,
                    );
                    let point = pos
                        + Vec2::new(
                            self.rng.range(-1.0, 1.0) * self.cfg.point_jitter,
                            self.rng.range(-1.0, 1.0) * self.cfg.point_jitter,
                        );
                    physics.apply_force_at_point(&body, force, point);
                }
                if frames_left <= 1 {
                    self.state = WindState::Idle {
                        frames_left: self.cfg.gap_frames,
                    };
                } else {
                    self.state = WindState::Blowing {
                        frames_left: frames_left - 1,
                        dir,
                        intensity,
                    };
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::types::EntryId;
    use crate::core::physics::{BodyDesc, ColliderDesc, ColliderMaterial};

    fn small_cfg() -> WindConfig {
        WindConfig {
            gap_frames: 3,
            min_gust_frames: 2,
            max_gust_frames: 4,
            ..WindConfig::default()
        }
    }

    fn spawn_glyph(world: &mut PhysicsWorld) -> PhysicsBody {
        world.create_body(
            EntryId(1),
            &BodyDesc::dynamic(ColliderDesc::Cuboid {
                half_width: 20.0,
                half_height: 40.0,
            }),
            ColliderMaterial::default(),
        )
    }

    #[test]
    fn rng_is_deterministic_per_seed() {
        let mut a = Rng::new(7);
        let mut b = Rng::new(7);
        for _ in 0..32 {
            assert_eq!(a.next_u64(), b.next_u64());
        }
        let f = Rng::new(9).next_f32();
        assert!((0.0..1.0).contains(&f));
    }

    #[test]
    fn range_stays_in_bounds() {
        let mut rng = Rng::new(11);
        for _ in 0..256 {
            let v = rng.range(-3.0, 5.0);
            assert!((-3.0..5.0).contains(&v));
        }
    }

    #[test]
    fn idle_counts_down_then_blows() {
        let mut world = PhysicsWorld::new(Vec2::ZERO);
        let mut wind = Wind::new(small_cfg(), 42);

        wind.tick(&mut world, std::iter::empty());
        wind.tick(&mut world, std::iter::empty());
        assert!(!wind.is_blowing());
        wind.tick(&mut world, std::iter::empty());
        assert!(wind.is_blowing(), "gap of 3 frames should end in a gust");
    }

    #[test]
    fn gust_ends_and_reschedules_with_fixed_gap() {
        let mut world = PhysicsWorld::new(Vec2::ZERO);
        let mut wind = Wind::new(small_cfg(), 42);
        wind.start_gust();

        let WindState::Blowing { frames_left, .. } = wind.state() else {
            panic!("expected a gust");
        };
        assert!((2..=5).contains(&frames_left));

        for _ in 0..frames_left {
            wind.tick(&mut world, std::iter::empty());
        }
        assert_eq!(wind.state(), WindState::Idle { frames_left: 3 });

        // The chain continues: the next gap also ends in a gust.
        for _ in 0..3 {
            wind.tick(&mut world, std::iter::empty());
        }
        assert!(wind.is_blowing());
    }

    #[test]
    fn gust_direction_is_consistent_within_one_gust() {
        let mut world = PhysicsWorld::new(Vec2::ZERO);
        world.set_dt(1.0 / 60.0);
        let body = spawn_glyph(&mut world);

        let mut wind = Wind::new(WindConfig::default(), 1234);
        wind.start_gust();
        let WindState::Blowing { dir, .. } = wind.state() else {
            panic!("expected a gust");
        };

        let mut impacts = Vec::new();
        for _ in 0..30 {
            wind.tick(&mut world, std::iter::once(body));
            world.step_into(&mut impacts);
        }
        let v = world.velocity(&body);
        assert!(
            v.x * dir > 0.0,
            "body should drift with the gust: dir={dir} vx={}",
            v.x
        );
    }

    #[test]
    fn gust_tolerates_removed_bodies() {
        let mut world = PhysicsWorld::new(Vec2::ZERO);
        let body = spawn_glyph(&mut world);
        world.remove_body(&body);

        let mut wind = Wind::new(WindConfig::default(), 5);
        wind.start_gust();
        // Must skip the stale handle without panicking.
        wind.tick(&mut world, std::iter::once(body));
    }

    #[test]
    fn settle_in_moves_every_body() {
        let mut world = PhysicsWorld::new(Vec2::ZERO);
        let a = spawn_glyph(&mut world);
        let b = spawn_glyph(&mut world);
        let mut rng = Rng::new(99);

        settle_in(&mut world, &mut rng, &[a, b], &WindConfig::default());
        assert!(world.velocity(&a).length() > 0.0);
        assert!(world.velocity(&b).length() > 0.0);
    }

    #[test]
    fn flutter_pops_upward() {
        let mut world = PhysicsWorld::new(Vec2::ZERO);
        let body = spawn_glyph(&mut world);
        let mut rng = Rng::new(3);

        flutter(&mut world, &mut rng, &body, &WindConfig::default());
        let v = world.velocity(&body);
        assert!(v.y < 0.0, "flutter should bias upward (y-down): vy={}", v.y);
    }
}
