//! The per-frame collision solver.
//!
//! The controller owns every registered node and hands out [`ColliderId`]
//! handles. Each frame it moves dynamic nodes by their velocity, resolving
//! blocking contacts one axis at a time (X fully, then Y) so diagonal motion
//! into a corner cannot clip through it. Sensor contacts are evaluated after
//! movement and never displace anything.
//!
//! Contact changes come back from [`CollisionController::update`] as
//! [`CollisionEvent`] values, in collider registration order.

use ahash::AHashMap;
use fletch_common::{Axis, ColliderId, IdAllocator, Vec2};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::geometry::{contact_offset, slide_velocity, Hit};
use crate::node::{CollisionNode, CollisionType, TagSet};
use crate::shape::CollisionShape;

/// A contact starting or ending between two colliders.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollisionEvent {
    /// Collider whose active tags matched
    pub collider: ColliderId,
    /// Collider it touched
    pub other: ColliderId,
    /// Active tags of `collider` that matched passive tags of `other`
    pub tags: TagSet,
    /// True when contact started, false when it ended
    pub entering: bool,
}

/// Where a dynamic node started this frame and how far it actually moved.
#[derive(Debug, Clone)]
struct FrameMotion {
    start: CollisionShape,
    displacement: Vec2,
}

/// Registry and solver for collision nodes.
#[derive(Debug, Default)]
pub struct CollisionController {
    nodes: AHashMap<ColliderId, CollisionNode>,
    statics: Vec<ColliderId>,
    dynamics: Vec<ColliderId>,
    ids: IdAllocator,
    pending_removals: Vec<ColliderId>,
}

impl CollisionController {
    /// Creates an empty controller.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a node and returns its handle.
    ///
    /// The node is moved in, so it can only ever sit in one bucket.
    pub fn add_collider(&mut self, node: CollisionNode) -> ColliderId {
        let id = ColliderId::from_raw(self.ids.next());
        match node.collision_type() {
            CollisionType::Static => self.statics.push(id),
            CollisionType::Dynamic => self.dynamics.push(id),
        }
        debug!(
            collider = %id,
            kind = ?node.collision_type(),
            sensor = node.is_sensor(),
            "Collider added"
        );
        self.nodes.insert(id, node);
        id
    }

    /// Deregisters a node and hands it back.
    ///
    /// Returns `None` if the id is not registered, so removing twice is
    /// harmless. Other nodes forget the removed one without an exit event.
    pub fn remove_collider(&mut self, id: ColliderId) -> Option<CollisionNode> {
        let node = self.nodes.remove(&id)?;
        self.statics.retain(|other| *other != id);
        self.dynamics.retain(|other| *other != id);
        self.pending_removals.retain(|other| *other != id);

        for other in self.nodes.values_mut() {
            other.forget(id);
        }

        debug!(collider = %id, "Collider removed");
        Some(node)
    }

    /// Queues a removal for the start of the next [`update`](Self::update)
    /// or an explicit [`flush_removals`](Self::flush_removals).
    pub fn defer_removal(&mut self, id: ColliderId) {
        if !self.pending_removals.contains(&id) {
            self.pending_removals.push(id);
        }
    }

    /// Applies queued removals.
    pub fn flush_removals(&mut self) {
        for id in std::mem::take(&mut self.pending_removals) {
            self.remove_collider(id);
        }
    }

    /// Drops every node (scene teardown).
    pub fn clear(&mut self) {
        let count = self.nodes.len();
        self.nodes.clear();
        self.statics.clear();
        self.dynamics.clear();
        self.pending_removals.clear();
        debug!(count, "Collision controller cleared");
    }

    /// Node registered under `id`.
    #[must_use]
    pub fn node(&self, id: ColliderId) -> Option<&CollisionNode> {
        self.nodes.get(&id)
    }

    /// Mutable node registered under `id`.
    pub fn node_mut(&mut self, id: ColliderId) -> Option<&mut CollisionNode> {
        self.nodes.get_mut(&id)
    }

    /// Checks if `id` is registered.
    #[must_use]
    pub fn contains(&self, id: ColliderId) -> bool {
        self.nodes.contains_key(&id)
    }

    /// Number of registered nodes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Checks if no node is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Ids of one type, in registration order.
    #[must_use]
    pub fn ids(&self, collision_type: CollisionType) -> &[ColliderId] {
        match collision_type {
            CollisionType::Static => &self.statics,
            CollisionType::Dynamic => &self.dynamics,
        }
    }

    /// Runs one solve pass over `dt` seconds.
    ///
    /// Velocities are in units per second. After the pass each dynamic
    /// node's velocity holds only the slide response left over from its hits;
    /// callers set a fresh velocity every frame.
    pub fn update(&mut self, dt: f32) -> Vec<CollisionEvent> {
        self.flush_removals();
        for node in self.nodes.values_mut() {
            node.drain_transitions();
        }

        let dynamics = self.dynamics.clone();
        let mut motions: AHashMap<ColliderId, FrameMotion> = AHashMap::default();

        for &id in &dynamics {
            let Some(mut node) = self.nodes.remove(&id) else {
                continue;
            };

            let start = node.shape().clone();
            if node.is_sensor() {
                node.translate(node.velocity() * dt);
                node.set_velocity(Vec2::ZERO);
            } else {
                self.solve_blocking(id, &mut node, dt);
            }

            let motion = FrameMotion {
                displacement: node.position() - start.position(),
                start,
            };
            self.sense_from(id, &mut node, &motion);
            motions.insert(id, motion);
            self.nodes.insert(id, node);
        }

        self.sense_static_sensors(&motions);
        self.drain_events()
    }

    /// Moves a solid dynamic node along X then Y, stopping at the nearest
    /// blocking hit of each pass. A stopped node is snapped onto the face it
    /// hit.
    fn solve_blocking(&self, id: ColliderId, node: &mut CollisionNode, dt: f32) {
        let velocity = node.velocity();
        let mut residual = Vec2::ZERO;
        let mut contacts: Vec<ColliderId> = Vec::new();

        for axis in Axis::ALL {
            let axis_velocity = axis.mask(velocity);
            let motion = axis_velocity * dt;
            if motion == Vec2::ZERO {
                continue;
            }

            let mut nearest: Option<Hit> = None;
            let mut hit_ids: Vec<ColliderId> = Vec::new();
            for &static_id in &self.statics {
                let Some(obstacle) = self.nodes.get(&static_id) else {
                    continue;
                };
                if obstacle.is_sensor() {
                    continue;
                }
                let Some(hit) = node.sweep(obstacle, motion) else {
                    continue;
                };
                if hit.time >= 1.0 {
                    continue;
                }

                match nearest {
                    Some(best) if hit.time > best.time => {}
                    Some(best) if hit.time == best.time => hit_ids.push(static_id),
                    _ => {
                        nearest = Some(hit);
                        hit_ids.clear();
                        hit_ids.push(static_id);
                    }
                }
            }

            if let Some(hit) = nearest {
                trace!(
                    collider = %id,
                    obstacles = ?hit_ids,
                    ?axis,
                    time = hit.time,
                    normal = ?hit.normal,
                    "Blocking hit"
                );
                node.translate(hit.delta);
                if let Some(obstacle) = hit_ids.first().and_then(|first| self.nodes.get(first)) {
                    let face = obstacle.shape().bounds();
                    node.translate(contact_offset(&node.shape().bounds(), &face, hit.normal));
                }
                residual += slide_velocity(axis_velocity, &hit);
                for hit_id in hit_ids {
                    if !contacts.contains(&hit_id) {
                        contacts.push(hit_id);
                    }
                }
            } else {
                node.translate(motion);
            }
        }

        node.set_velocity(residual);

        for &static_id in &self.statics {
            let Some(obstacle) = self.nodes.get(&static_id) else {
                continue;
            };
            if obstacle.is_sensor() || !node.matches(obstacle) {
                continue;
            }
            node.track_contact(static_id, contacts.contains(&static_id));
        }
    }

    /// Contact tracking for pairs where a sensor is involved, with the
    /// dynamic node as the initiator.
    fn sense_from(&self, id: ColliderId, node: &mut CollisionNode, motion: &FrameMotion) {
        let mut others: Vec<ColliderId> = self.nodes.keys().copied().collect();
        others.sort_unstable();

        for other_id in others {
            if other_id == id {
                continue;
            }
            let Some(other) = self.nodes.get(&other_id) else {
                continue;
            };
            if !(node.is_sensor() || other.is_sensor()) || !node.matches(other) {
                continue;
            }
            let touching = touching(motion, node.shape(), other.shape());
            node.track_contact(other_id, touching);
        }
    }

    /// Contact tracking for static sensors that react to dynamic nodes.
    fn sense_static_sensors(&mut self, motions: &AHashMap<ColliderId, FrameMotion>) {
        let statics = self.statics.clone();

        for sensor_id in statics {
            let Some(mut sensor) = self.nodes.remove(&sensor_id) else {
                continue;
            };
            if sensor.is_sensor() && !sensor.active_tags().is_empty() {
                for &dynamic_id in &self.dynamics {
                    let (Some(other), Some(motion)) =
                        (self.nodes.get(&dynamic_id), motions.get(&dynamic_id))
                    else {
                        continue;
                    };
                    if !sensor.matches(other) {
                        continue;
                    }
                    let touching = touching(motion, other.shape(), sensor.shape());
                    sensor.track_contact(dynamic_id, touching);
                }
            }
            self.nodes.insert(sensor_id, sensor);
        }
    }

    /// Turns recorded contact changes into events, by collider id order.
    fn drain_events(&mut self) -> Vec<CollisionEvent> {
        let mut ids: Vec<ColliderId> = self.nodes.keys().copied().collect();
        ids.sort_unstable();

        let mut events = Vec::new();
        for id in ids {
            let Some(transitions) = self.nodes.get_mut(&id).map(CollisionNode::drain_transitions)
            else {
                continue;
            };
            let Some(node) = self.nodes.get(&id) else {
                continue;
            };
            for (other_id, entering) in transitions {
                let Some(other) = self.nodes.get(&other_id) else {
                    continue;
                };
                events.push(CollisionEvent {
                    collider: id,
                    other: other_id,
                    tags: node.shared_tags(other),
                    entering,
                });
            }
        }

        if !events.is_empty() {
            debug!(count = events.len(), "Collision events");
        }
        events
    }
}

/// Whether a moving shape touched `other` this frame: either its path from
/// the start position crossed into it, or it overlaps at the end.
fn touching(motion: &FrameMotion, current: &CollisionShape, other: &CollisionShape) -> bool {
    let swept = motion.displacement != Vec2::ZERO
        && motion.start.sweep(other, motion.displacement).is_some();
    swept || current.overlap(other)
}
