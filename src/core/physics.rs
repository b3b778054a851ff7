use glam::Vec2;
use rapier2d::prelude::*;
use std::sync::Mutex;

use crate::api::types::EntryId;

// ---------------------------------------------------------------------------
// Conversion helpers (private) — glam ↔ nalgebra
// ---------------------------------------------------------------------------

fn vec2_to_na(v: Vec2) -> nalgebra::Vector2<f32> {
    nalgebra::Vector2::new(v.x, v.y)
}

fn na_to_vec2(v: &nalgebra::Vector2<f32>) -> Vec2 {
    Vec2::new(v.x, v.y)
}

fn na_iso_to_pos_rot(iso: &nalgebra::Isometry2<f32>) -> (Vec2, f32) {
    let pos = Vec2::new(iso.translation.x, iso.translation.y);
    let rot = iso.rotation.angle();
    (pos, rot)
}

// ---------------------------------------------------------------------------
// Public types
// ---------------------------------------------------------------------------

/// The kind of rigid body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyType {
    Dynamic,
    Fixed,
    KinematicPositionBased,
}

impl BodyType {
    fn to_rapier(self) -> RigidBodyType {
        match self {
            BodyType::Dynamic => RigidBodyType::Dynamic,
            BodyType::Fixed => RigidBodyType::Fixed,
            BodyType::KinematicPositionBased => RigidBodyType::KinematicPositionBased,
        }
    }
}

/// Shape description for a collider.
#[derive(Debug, Clone, Copy)]
pub enum ColliderDesc {
    Ball { radius: f32 },
    Cuboid { half_width: f32, half_height: f32 },
}

impl ColliderDesc {
    fn build_collider(&self) -> ColliderBuilder {
        match *self {
            ColliderDesc::Ball { radius } => ColliderBuilder::ball(radius),
            ColliderDesc::Cuboid { half_width, half_height } => {
                ColliderBuilder::cuboid(half_width, half_height)
            }
        }
    }
}

/// Physical material properties for a collider.
#[derive(Debug, Clone, Copy)]
pub struct ColliderMaterial {
    pub restitution: f32,
    pub friction: f32,
    pub density: f32,
}

impl Default for ColliderMaterial {
    fn default() -> Self {
        Self {
            restitution: 0.3,
            friction: 0.5,
            density: 1.0,
        }
    }
}

/// Builder for describing a rigid body before creation.
#[derive(Debug, Clone)]
pub struct BodyDesc {
    pub body_type: BodyType,
    pub position: Vec2,
    pub rotation: f32,
    pub velocity: Vec2,
    pub gravity_scale: f32,
    pub sensor: bool,
    pub collider: ColliderDesc,
    pub linear_damping: f32,
    pub angular_damping: f32,
}

impl BodyDesc {
    /// Create a dynamic body description with the given collider shape.
    pub fn dynamic(collider: ColliderDesc) -> Self {
        Self {
            body_type: BodyType::Dynamic,
            position: Vec2::ZERO,
            rotation: 0.0,
            velocity: Vec2::ZERO,
            gravity_scale: 1.0,
            sensor: false,
            collider,
            linear_damping: 0.0,
            angular_damping: 0.0,
        }
    }

    /// Create a fixed (static) body description with the given collider shape.
    pub fn fixed(collider: ColliderDesc) -> Self {
        Self {
            body_type: BodyType::Fixed,
            position: Vec2::ZERO,
            rotation: 0.0,
            velocity: Vec2::ZERO,
            gravity_scale: 0.0,
            sensor: false,
            collider,
            linear_damping: 0.0,
            angular_damping: 0.0,
        }
    }

    /// Create a kinematic body description (used for the pointer proxy).
    pub fn kinematic(collider: ColliderDesc) -> Self {
        Self {
            body_type: BodyType::KinematicPositionBased,
            ..Self::fixed(collider)
        }
    }

    pub fn with_position(mut self, pos: Vec2) -> Self {
        self.position = pos;
        self
    }

    pub fn with_velocity(mut self, vel: Vec2) -> Self {
        self.velocity = vel;
        self
    }

    /// Mark the collider as a sensor: it occupies space for queries but
    /// never produces contact forces. Line anchors are sensors so glyphs
    /// hang through them instead of resting on them.
    pub fn with_sensor(mut self, sensor: bool) -> Self {
        self.sensor = sensor;
        self
    }

    /// Set the linear damping (velocity decay). This is the "air friction"
    /// knob: hanging glyphs carry a high value to move like cloth, fallen
    /// glyphs a low one so they tumble.
    pub fn with_linear_damping(mut self, damping: f32) -> Self {
        self.linear_damping = damping;
        self
    }

    /// Set the angular damping (rotation decay).
    pub fn with_angular_damping(mut self, damping: f32) -> Self {
        self.angular_damping = damping;
        self
    }
}

/// Handle pair referencing Rapier internals for one body.
#[derive(Debug, Clone, Copy)]
pub struct PhysicsBody {
    pub body_handle: RigidBodyHandle,
    pub collider_handle: ColliderHandle,
}

/// Handle to a spring constraint in the simulation.
#[derive(Debug, Clone, Copy)]
pub struct SpringHandle(pub(crate) ImpulseJointHandle);

/// Description of a spring constraint between two bodies.
///
/// Anchors are local offsets from each body's center of mass. A non-zero
/// rest length leaves visible sag — a rope, not a rigid hinge.
#[derive(Debug, Clone, Copy)]
pub struct SpringDesc {
    pub anchor_a: Vec2,
    pub anchor_b: Vec2,
    pub rest_length: f32,
    pub stiffness: f32,
    pub damping: f32,
}

/// A collision-start event, annotated with what the tone service needs:
/// relative impact speed and the smaller collider's characteristic size.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Impact {
    pub entry_a: EntryId,
    pub entry_b: EntryId,
    pub speed: f32,
    pub size: f32,
}

// ---------------------------------------------------------------------------
// Event collector
// ---------------------------------------------------------------------------

struct DirectEventCollector {
    collisions: Mutex<Vec<CollisionEvent>>,
}

impl DirectEventCollector {
    fn new() -> Self {
        Self {
            collisions: Mutex::new(Vec::new()),
        }
    }

    fn drain_collisions(&self) -> Vec<CollisionEvent> {
        std::mem::take(&mut *self.collisions.lock().unwrap())
    }
}

impl EventHandler for DirectEventCollector {
    fn handle_collision_event(
        &self,
        _bodies: &RigidBodySet,
        _colliders: &ColliderSet,
        event: CollisionEvent,
        _contact_pair: Option<&ContactPair>,
    ) {
        self.collisions.lock().unwrap().push(event);
    }

    fn handle_contact_force_event(
        &self,
        _dt: f32,
        _bodies: &RigidBodySet,
        _colliders: &ColliderSet,
        _contact_pair: &ContactPair,
        _total_force_magnitude: f32,
    ) {
        // Impact speed is derived from body velocities instead.
    }
}

// ---------------------------------------------------------------------------
// Pointer drag
// ---------------------------------------------------------------------------

struct PointerDrag {
    proxy: PhysicsBody,
    spring: SpringHandle,
}

// ---------------------------------------------------------------------------
// PhysicsWorld
// ---------------------------------------------------------------------------

/// Wraps all Rapier2D boilerplate into a single struct. This is the whole
/// seam to the rigid-body engine: the rigging layer never touches Rapier
/// types directly, so any engine with this capability set could sit here.
pub struct PhysicsWorld {
    gravity: nalgebra::Vector2<f32>,
    integration_parameters: IntegrationParameters,
    physics_pipeline: PhysicsPipeline,
    island_manager: IslandManager,
    broad_phase: DefaultBroadPhase,
    narrow_phase: NarrowPhase,
    bodies: RigidBodySet,
    colliders: ColliderSet,
    impulse_joints: ImpulseJointSet,
    multibody_joints: MultibodyJointSet,
    ccd_solver: CCDSolver,
    query_pipeline: QueryPipeline,
    event_collector: DirectEventCollector,
    drag: Option<PointerDrag>,
}

impl PhysicsWorld {
    /// Create a new physics world with the given gravity vector.
    /// Coordinates are Y-down screen pixels, so downward gravity is
    /// positive Y (e.g. `Vec2::new(0.0, 981.0)`).
    pub fn new(gravity: Vec2) -> Self {
        Self {
            gravity: vec2_to_na(gravity),
            integration_parameters: IntegrationParameters::default(),
            physics_pipeline: PhysicsPipeline::new(),
            island_manager: IslandManager::new(),
            broad_phase: DefaultBroadPhase::new(),
            narrow_phase: NarrowPhase::new(),
            bodies: RigidBodySet::new(),
            colliders: ColliderSet::new(),
            impulse_joints: ImpulseJointSet::new(),
            multibody_joints: MultibodyJointSet::new(),
            ccd_solver: CCDSolver::new(),
            query_pipeline: QueryPipeline::new(),
            event_collector: DirectEventCollector::new(),
            drag: None,
        }
    }

    /// Set the integration timestep.
    pub fn set_dt(&mut self, dt: f32) {
        self.integration_parameters.dt = dt;
    }

    /// The world's gravity vector.
    pub fn gravity(&self) -> Vec2 {
        na_to_vec2(&self.gravity)
    }

    /// Create a rigid body + collider and return handles.
    /// The EntryId is stored in the body's `user_data` for collision lookups;
    /// use `EntryId::NONE` for scenery (anchors, walls, pointer proxy).
    pub fn create_body(
        &mut self,
        entry_id: EntryId,
        desc: &BodyDesc,
        material: ColliderMaterial,
    ) -> PhysicsBody {
        let rb = RigidBodyBuilder::new(desc.body_type.to_rapier())
            .translation(nalgebra::Vector2::new(desc.position.x, desc.position.y))
            .rotation(desc.rotation)
            .linvel(nalgebra::Vector2::new(desc.velocity.x, desc.velocity.y))
            .gravity_scale(desc.gravity_scale)
            .linear_damping(desc.linear_damping)
            .angular_damping(desc.angular_damping)
            .user_data(entry_id.0 as u128)
            .build();

        let body_handle = self.bodies.insert(rb);

        // Sensors (anchors, pointer proxy) stay silent: only solid
        // colliders feed the impact event stream.
        let events = if desc.sensor {
            ActiveEvents::empty()
        } else {
            ActiveEvents::COLLISION_EVENTS
        };
        let collider = desc
            .collider
            .build_collider()
            .restitution(material.restitution)
            .friction(material.friction)
            .density(material.density)
            .sensor(desc.sensor)
            .active_events(events)
            .build();

        let collider_handle =
            self.colliders
                .insert_with_parent(collider, body_handle, &mut self.bodies);

        PhysicsBody {
            body_handle,
            collider_handle,
        }
    }

    /// Remove a body, its colliders, and any joints attached to it.
    pub fn remove_body(&mut self, body: &PhysicsBody) {
        self.bodies.remove(
            body.body_handle,
            &mut self.island_manager,
            &mut self.colliders,
            &mut self.impulse_joints,
            &mut self.multibody_joints,
            true,
        );
    }

    /// Whether the body still exists in the simulation.
    pub fn contains(&self, body: &PhysicsBody) -> bool {
        self.bodies.get(body.body_handle).is_some()
    }

    /// Step the simulation and collect collision-start events into the
    /// provided Vec. Forces accumulated since the previous step are applied
    /// by this step and then cleared, so per-frame forces (wind) must be
    /// re-applied every frame.
    pub fn step_into(&mut self, impacts: &mut Vec<Impact>) {
        self.physics_pipeline.step(
            &self.gravity,
            &self.integration_parameters,
            &mut self.island_manager,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.bodies,
            &mut self.colliders,
            &mut self.impulse_joints,
            &mut self.multibody_joints,
            &mut self.ccd_solver,
            Some(&mut self.query_pipeline),
            &(),
            &self.event_collector,
        );

        for (_, rb) in self.bodies.iter_mut() {
            rb.reset_forces(false);
        }

        for event in self.event_collector.drain_collisions() {
            let (h1, h2) = match event {
                CollisionEvent::Started(h1, h2, _) => (h1, h2),
                CollisionEvent::Stopped(..) => continue,
            };
            if let Some(impact) = self.impact_for(h1, h2) {
                impacts.push(impact);
            }
        }
    }

    fn impact_for(&self, h1: ColliderHandle, h2: ColliderHandle) -> Option<Impact> {
        let (entry_a, speed_a, size_a) = self.collider_info(h1)?;
        let (entry_b, speed_b, size_b) = self.collider_info(h2)?;
        Some(Impact {
            entry_a,
            entry_b,
            speed: (speed_a - speed_b).length(),
            size: size_a.min(size_b),
        })
    }

    /// Resolve a collider to (owning entry, velocity, characteristic size).
    fn collider_info(&self, handle: ColliderHandle) -> Option<(EntryId, Vec2, f32)> {
        let collider = self.colliders.get(handle)?;
        let body_handle = collider.parent()?;
        let body = self.bodies.get(body_handle)?;
        let size = {
            let shape = collider.shape();
            if let Some(ball) = shape.as_ball() {
                ball.radius * 2.0
            } else if let Some(cuboid) = shape.as_cuboid() {
                cuboid.half_extents.x.min(cuboid.half_extents.y) * 2.0
            } else {
                f32::MAX
            }
        };
        Some((EntryId(body.user_data as u32), na_to_vec2(body.linvel()), size))
    }

    /// Apply a force to a body, cleared after the next step.
    pub fn apply_force(&mut self, body: &PhysicsBody, force: Vec2) {
        if let Some(rb) = self.bodies.get_mut(body.body_handle) {
            rb.add_force(vec2_to_na(force), true);
        }
    }

    /// Apply a force at a world-space point, cleared after the next step.
    /// Off-center application induces torque.
    pub fn apply_force_at_point(&mut self, body: &PhysicsBody, force: Vec2, point: Vec2) {
        if let Some(rb) = self.bodies.get_mut(body.body_handle) {
            rb.add_force_at_point(
                vec2_to_na(force),
                nalgebra::Point2::new(point.x, point.y),
                true,
            );
        }
    }

    /// Apply an instantaneous linear impulse to a body.
    pub fn apply_impulse(&mut self, body: &PhysicsBody, impulse: Vec2) {
        if let Some(rb) = self.bodies.get_mut(body.body_handle) {
            rb.apply_impulse(vec2_to_na(impulse), true);
        }
    }

    /// Set the angular velocity of a body directly.
    pub fn set_angular_velocity(&mut self, body: &PhysicsBody, angvel: f32) {
        if let Some(rb) = self.bodies.get_mut(body.body_handle) {
            rb.set_angvel(angvel, true);
        }
    }

    /// Get the current linear velocity of a body.
    pub fn velocity(&self, body: &PhysicsBody) -> Vec2 {
        self.bodies
            .get(body.body_handle)
            .map(|rb| na_to_vec2(rb.linvel()))
            .unwrap_or(Vec2::ZERO)
    }

    /// Change a body's linear damping in place (the flutter policy drops
    /// air friction on detached glyphs).
    pub fn set_linear_damping(&mut self, body: &PhysicsBody, damping: f32) {
        if let Some(rb) = self.bodies.get_mut(body.body_handle) {
            rb.set_linear_damping(damping);
        }
    }

    /// Current linear damping of a body, if it still exists.
    pub fn linear_damping(&self, body: &PhysicsBody) -> Option<f32> {
        self.bodies.get(body.body_handle).map(|rb| rb.linear_damping())
    }

    /// Teleport a body, keeping its velocity.
    pub fn set_position(&mut self, body: &PhysicsBody, pos: Vec2, rotation: f32) {
        if let Some(rb) = self.bodies.get_mut(body.body_handle) {
            rb.set_position(
                nalgebra::Isometry2::new(nalgebra::Vector2::new(pos.x, pos.y), rotation),
                true,
            );
        }
    }

    /// Get the current position and rotation of a body, `None` once removed.
    pub fn body_position(&self, body: &PhysicsBody) -> Option<(Vec2, f32)> {
        self.bodies
            .get(body.body_handle)
            .map(|rb| na_iso_to_pos_rot(rb.position()))
    }

    /// Mass of a body (0 for fixed bodies), `None` once removed.
    pub fn body_mass(&self, body: &PhysicsBody) -> Option<f32> {
        self.bodies.get(body.body_handle).map(|rb| rb.mass())
    }

    /// Cuboid half extents of a body's collider, `None` for other shapes.
    pub fn half_extents(&self, body: &PhysicsBody) -> Option<Vec2> {
        let collider = self.colliders.get(body.collider_handle)?;
        let cuboid = collider.shape().as_cuboid()?;
        Some(Vec2::new(cuboid.half_extents.x, cuboid.half_extents.y))
    }

    /// Scale a cuboid collider's extents in place. Mass properties are
    /// re-derived from the collider density. Per-axis factors let anchors
    /// stretch horizontally without thickening.
    pub fn scale_collider(&mut self, body: &PhysicsBody, sx: f32, sy: f32) {
        let Some(half) = self.half_extents(body) else {
            return;
        };
        if let Some(collider) = self.colliders.get_mut(body.collider_handle) {
            collider.set_shape(SharedShape::cuboid(half.x * sx, half.y * sy));
        }
    }

    /// Number of rigid bodies in the simulation.
    pub fn body_count(&self) -> usize {
        self.bodies.len()
    }

    // -- Spring constraints --

    /// Create a spring constraint between two bodies.
    pub fn create_spring(
        &mut self,
        body_a: &PhysicsBody,
        body_b: &PhysicsBody,
        desc: &SpringDesc,
    ) -> SpringHandle {
        let joint = SpringJointBuilder::new(desc.rest_length, desc.stiffness, desc.damping)
            .local_anchor1(nalgebra::Point2::new(desc.anchor_a.x, desc.anchor_a.y))
            .local_anchor2(nalgebra::Point2::new(desc.anchor_b.x, desc.anchor_b.y))
            .build();
        SpringHandle(
            self.impulse_joints
                .insert(body_a.body_handle, body_b.body_handle, joint, true),
        )
    }

    /// Remove a spring constraint from the simulation.
    pub fn remove_spring(&mut self, handle: SpringHandle) {
        self.impulse_joints.remove(handle.0, true);
    }

    /// Number of constraints in the simulation.
    pub fn spring_count(&self) -> usize {
        self.impulse_joints.len()
    }

    // -- Pointer drag --
    //
    // The engine-side pointer constraint: a kinematic proxy body follows
    // the pointer, tied to the grabbed glyph by a stiff short spring.

    /// Try to grab a dynamic body at the given point. Returns whether
    /// anything was grabbed. A previous grab is released first.
    pub fn pointer_down(&mut self, point: Vec2) -> bool {
        self.pointer_up();

        let mut hit: Option<ColliderHandle> = None;
        let filter = QueryFilter::from(
            QueryFilterFlags::ONLY_DYNAMIC | QueryFilterFlags::EXCLUDE_SENSORS,
        );
        // The query pipeline is refreshed by step_into, which is current
        // enough for pointer input arriving between frames.
        self.query_pipeline.intersections_with_point(
            &self.bodies,
            &self.colliders,
            &nalgebra::Point2::new(point.x, point.y),
            filter,
            |handle| {
                hit = Some(handle);
                false
            },
        );

        let Some(collider_handle) = hit else {
            return false;
        };
        let Some(body_handle) = self.colliders.get(collider_handle).and_then(|c| c.parent())
        else {
            return false;
        };
        let Some(mass) = self.bodies.get(body_handle).map(|rb| rb.mass()) else {
            return false;
        };

        let proxy = self.create_body(
            EntryId::NONE,
            &BodyDesc::kinematic(ColliderDesc::Ball { radius: 1.0 })
                .with_position(point)
                .with_sensor(true),
            ColliderMaterial::default(),
        );
        let target = PhysicsBody {
            body_handle,
            collider_handle,
        };
        // The drag spring scales with the grabbed mass (critically damped),
        // so every glyph follows the pointer at the same rate.
        let mass = mass.max(f32::EPSILON);
        let spring = self.create_spring(
            &proxy,
            &target,
            &SpringDesc {
                anchor_a: Vec2::ZERO,
                anchor_b: Vec2::ZERO,
                rest_length: 0.0,
                stiffness: mass * 400.0,
                damping: mass * 40.0,
            },
        );
        self.drag = Some(PointerDrag { proxy, spring });
        true
    }

    /// Move the pointer proxy while dragging. No-op when nothing is held.
    pub fn pointer_move(&mut self, point: Vec2) {
        if let Some(drag) = &self.drag {
            if let Some(rb) = self.bodies.get_mut(drag.proxy.body_handle) {
                rb.set_next_kinematic_position(nalgebra::Isometry2::new(
                    nalgebra::Vector2::new(point.x, point.y),
                    0.0,
                ));
            }
        }
    }

    /// Release the current grab, if any.
    pub fn pointer_up(&mut self) {
        if let Some(drag) = self.drag.take() {
            self.remove_spring(drag.spring);
            self.remove_body(&drag.proxy);
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
