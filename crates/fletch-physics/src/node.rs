//! Collision nodes.
//!
//! A node owns one shape and decides, through its tags, which other nodes it
//! reacts to. Filtering is one-directional: a node collides with another only
//! when its own active tags intersect the other's passive tags.
//!
//! Nodes also remember which colliders they currently touch, so the
//! controller can turn contact changes into a single enter and a single exit
//! notification.

use std::collections::BTreeSet;

use fletch_common::{ColliderId, Vec2};
use serde::{Deserialize, Serialize};

use crate::error::CollisionError;
use crate::geometry::Hit;
use crate::shape::CollisionShape;

/// Set of collision tags, ordered so event payloads are deterministic.
pub type TagSet = BTreeSet<String>;

/// Builds a [`TagSet`] from string-like values.
pub fn tags<I, S>(values: I) -> TagSet
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    values.into_iter().map(Into::into).collect()
}

/// Whether a node is moved by the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CollisionType {
    /// Never moved; blocks or senses dynamic nodes
    Static,
    /// Moved by its velocity each frame and resolved against static nodes
    Dynamic,
}

/// A shape plus tag filtering and contact bookkeeping.
#[derive(Debug, Clone)]
pub struct CollisionNode {
    shape: CollisionShape,
    collision_type: CollisionType,
    sensor: bool,
    active_tags: TagSet,
    passive_tags: TagSet,
    collisions: BTreeSet<ColliderId>,
    transitions: Vec<(ColliderId, bool)>,
}

impl CollisionNode {
    /// Creates a non-sensor node with no tags.
    #[must_use]
    pub fn new(shape: CollisionShape, collision_type: CollisionType) -> Self {
        Self {
            shape,
            collision_type,
            sensor: false,
            active_tags: TagSet::new(),
            passive_tags: TagSet::new(),
            collisions: BTreeSet::new(),
            transitions: Vec::new(),
        }
    }

    /// Starts a builder.
    #[must_use]
    pub fn builder(collision_type: CollisionType) -> CollisionNodeBuilder {
        CollisionNodeBuilder::new(collision_type)
    }

    /// Marks the node as a sensor.
    #[must_use]
    pub fn with_sensor(mut self, sensor: bool) -> Self {
        self.sensor = sensor;
        self
    }

    /// Sets the tags this node reacts to.
    #[must_use]
    pub fn with_active_tags(mut self, tags: TagSet) -> Self {
        self.active_tags = tags;
        self
    }

    /// Sets the tags this node is seen as.
    #[must_use]
    pub fn with_passive_tags(mut self, tags: TagSet) -> Self {
        self.passive_tags = tags;
        self
    }

    /// Owned shape.
    #[must_use]
    pub fn shape(&self) -> &CollisionShape {
        &self.shape
    }

    /// Static or dynamic.
    #[must_use]
    pub fn collision_type(&self) -> CollisionType {
        self.collision_type
    }

    /// Checks if this node only reports contacts.
    #[must_use]
    pub fn is_sensor(&self) -> bool {
        self.sensor
    }

    /// Tags this node reacts to.
    #[must_use]
    pub fn active_tags(&self) -> &TagSet {
        &self.active_tags
    }

    /// Tags this node is seen as.
    #[must_use]
    pub fn passive_tags(&self) -> &TagSet {
        &self.passive_tags
    }

    /// Current position.
    #[must_use]
    pub fn position(&self) -> Vec2 {
        self.shape.position()
    }

    /// Moves the node and its shape.
    pub fn set_position(&mut self, position: Vec2) {
        self.shape.set_position(position);
    }

    /// Moves the node by `offset`.
    pub fn translate(&mut self, offset: Vec2) {
        self.shape.set_position(self.shape.position() + offset);
    }

    /// Current velocity.
    #[must_use]
    pub fn velocity(&self) -> Vec2 {
        self.shape.velocity()
    }

    /// Replaces the velocity.
    pub fn set_velocity(&mut self, velocity: Vec2) {
        self.shape.set_velocity(velocity);
    }

    /// Accumulates into the velocity.
    pub fn add_velocity(&mut self, velocity: Vec2) {
        self.shape.add_velocity(velocity);
    }

    /// Checks if this node's active tags intersect `other`'s passive tags.
    #[must_use]
    pub fn matches(&self, other: &CollisionNode) -> bool {
        !self.active_tags.is_disjoint(&other.passive_tags)
    }

    /// Tags shared between this node's active set and `other`'s passive set.
    #[must_use]
    pub fn shared_tags(&self, other: &CollisionNode) -> TagSet {
        self.active_tags
            .intersection(&other.passive_tags)
            .cloned()
            .collect()
    }

    /// Tag-filtered sweep along `delta`. Membership is left untouched.
    #[must_use]
    pub fn sweep(&self, other: &CollisionNode, delta: Vec2) -> Option<Hit> {
        if !self.matches(other) {
            return None;
        }
        self.shape.sweep(&other.shape, delta)
    }

    /// Sweeps this node along its own velocity against `other` and records
    /// the contact change.
    ///
    /// Returns the hit, or `None` when the tags do not match or the shapes
    /// do not meet this frame.
    pub fn collide(&mut self, other_id: ColliderId, other: &CollisionNode) -> Option<Hit> {
        let hit = self.sweep(other, self.velocity());
        self.track_contact(other_id, hit.is_some());
        hit
    }

    /// Updates membership for `other`.
    ///
    /// Returns `Some(true)` when contact starts, `Some(false)` when it ends
    /// and `None` when nothing changed.
    pub fn track_contact(&mut self, other: ColliderId, touching: bool) -> Option<bool> {
        let changed = if touching {
            self.collisions.insert(other)
        } else {
            self.collisions.remove(&other)
        };

        if changed {
            self.transitions.push((other, touching));
            Some(touching)
        } else {
            None
        }
    }

    /// Colliders currently touching this node.
    pub fn contacts(&self) -> impl Iterator<Item = ColliderId> + '_ {
        self.collisions.iter().copied()
    }

    /// Checks if `other` is currently touching this node.
    #[must_use]
    pub fn is_touching(&self, other: ColliderId) -> bool {
        self.collisions.contains(&other)
    }

    /// Drops every trace of `other` without reporting an exit.
    pub fn forget(&mut self, other: ColliderId) {
        self.collisions.remove(&other);
        self.transitions.retain(|(id, _)| *id != other);
    }

    /// Contact changes recorded since the last drain, in order.
    #[must_use]
    pub fn transitions(&self) -> &[(ColliderId, bool)] {
        &self.transitions
    }

    /// Takes the recorded contact changes.
    pub fn drain_transitions(&mut self) -> Vec<(ColliderId, bool)> {
        std::mem::take(&mut self.transitions)
    }
}

/// Step-by-step construction of a [`CollisionNode`].
#[derive(Debug, Clone)]
pub struct CollisionNodeBuilder {
    shape: Option<CollisionShape>,
    position: Option<Vec2>,
    collision_type: CollisionType,
    sensor: bool,
    active_tags: TagSet,
    passive_tags: TagSet,
}

impl CollisionNodeBuilder {
    /// Creates an empty builder.
    #[must_use]
    pub fn new(collision_type: CollisionType) -> Self {
        Self {
            shape: None,
            position: None,
            collision_type,
            sensor: false,
            active_tags: TagSet::new(),
            passive_tags: TagSet::new(),
        }
    }

    /// Sets the shape.
    #[must_use]
    pub fn shape(mut self, shape: CollisionShape) -> Self {
        self.shape = Some(shape);
        self
    }

    /// Sets the starting position.
    #[must_use]
    pub fn position(mut self, position: Vec2) -> Self {
        self.position = Some(position);
        self
    }

    /// Marks the node as a sensor.
    #[must_use]
    pub fn sensor(mut self, sensor: bool) -> Self {
        self.sensor = sensor;
        self
    }

    /// Sets the active tags.
    #[must_use]
    pub fn active_tags(mut self, tags: TagSet) -> Self {
        self.active_tags = tags;
        self
    }

    /// Sets the passive tags.
    #[must_use]
    pub fn passive_tags(mut self, tags: TagSet) -> Self {
        self.passive_tags = tags;
        self
    }

    /// Builds the node.
    ///
    /// Fails when no shape was given or the shape is degenerate.
    pub fn build(self) -> Result<CollisionNode, CollisionError> {
        let mut shape = self.shape.ok_or(CollisionError::MissingShape)?;
        if let Some(position) = self.position {
            shape.set_position(position);
        }
        shape.validate()?;

        Ok(CollisionNode::new(shape, self.collision_type)
            .with_sensor(self.sensor)
            .with_active_tags(self.active_tags)
            .with_passive_tags(self.passive_tags))
    }
}
