// Domain-level physics entities: vectors, impulse chains, objects and the world.

use std::collections::HashMap;
use std::collections::hash_map::{Values, ValuesMut};
use std::fmt;
use std::ops::{AddAssign, Mul};

/// Magnitude below which an impulse component, or a floor distance, is treated as zero.
pub const NEGLIGIBLE: f64 = 0.01;

/// Object identity. Server-assigned ids are positive; clients usually pick negative ones.
pub type ObjectId = i32;

/// Two-component vector used for sizes, velocities and positions.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Vector {
    pub x: f64,
    pub y: f64,
}

impl Vector {
    pub const ZERO: Vector = Vector { x: 0.0, y: 0.0 };

    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// True when both components are below [`NEGLIGIBLE`] in absolute value.
    pub fn is_negligible(self) -> bool {
        self.x.abs() < NEGLIGIBLE && self.y.abs() < NEGLIGIBLE
    }

    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl AddAssign for Vector {
    fn add_assign(&mut self, rhs: Vector) {
        self.x += rhs.x;
        self.y += rhs.y;
    }
}

impl Mul<f64> for Vector {
    type Output = Vector;

    fn mul(self, rhs: f64) -> Vector {
        Vector::new(self.x * rhs, self.y * rhs)
    }
}

/// A decaying directional velocity contribution attached to an object.
///
/// `damping` is the fraction of `direction` kept per second of elapsed time:
/// - `1.0` keeps the impulse constant (steady acceleration),
/// - `0.95..0.99` decays slowly (arrows, drag-like motion),
/// - `0.8..0.9` suits jumps and debris,
/// - `0.1..0.5` fades almost at once (hits, explosions),
/// - anything `<= NEGLIGIBLE` acts for a single integration pass.
pub struct Impulse {
    pub direction: Vector,
    pub damping: f64,
    pub(crate) next: Option<Box<Impulse>>,
}

impl Impulse {
    pub fn new(direction: Vector, damping: f64) -> Self {
        Self {
            direction,
            damping,
            next: None,
        }
    }
}

// Node equality ignores the link; chains compare node by node.
impl PartialEq for Impulse {
    fn eq(&self, other: &Self) -> bool {
        self.direction == other.direction && self.damping == other.damping
    }
}

impl fmt::Debug for Impulse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Impulse")
            .field("direction", &self.direction)
            .field("damping", &self.damping)
            .finish()
    }
}

/// Owned, singly linked list of impulses. The most recently added impulse is the head.
///
/// Drop, clone and comparison walk the list iteratively, so long chains never
/// recurse through the nested boxes.
#[derive(Default)]
pub struct ImpulseChain {
    pub(crate) head: Option<Box<Impulse>>,
}

impl ImpulseChain {
    pub fn new() -> Self {
        Self { head: None }
    }

    /// Links `impulse` in front of the current head.
    pub fn push_front(&mut self, impulse: Impulse) {
        let mut node = Box::new(impulse);
        node.next = self.head.take();
        self.head = Some(node);
    }

    pub fn iter(&self) -> Iter<'_> {
        Iter {
            cursor: self.head.as_deref(),
        }
    }

    pub fn len(&self) -> usize {
        self.iter().count()
    }

    pub fn is_empty(&self) -> bool {
        self.head.is_none()
    }

    pub fn clear(&mut self) {
        let mut rest = self.head.take();
        while let Some(mut node) = rest {
            rest = node.next.take();
        }
    }
}

impl Drop for ImpulseChain {
    fn drop(&mut self) {
        self.clear();
    }
}

impl Clone for ImpulseChain {
    fn clone(&self) -> Self {
        self.iter()
            .map(|impulse| Impulse::new(impulse.direction, impulse.damping))
            .collect()
    }
}

impl PartialEq for ImpulseChain {
    fn eq(&self, other: &Self) -> bool {
        self.iter().eq(other.iter())
    }
}

impl fmt::Debug for ImpulseChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

/// Builds a chain whose head is the first yielded impulse.
impl FromIterator<Impulse> for ImpulseChain {
    fn from_iter<I: IntoIterator<Item = Impulse>>(iter: I) -> Self {
        let nodes: Vec<Impulse> = iter.into_iter().collect();
        let mut chain = ImpulseChain::new();
        for impulse in nodes.into_iter().rev() {
            chain.push_front(impulse);
        }
        chain
    }
}

/// Head-to-tail iterator over an [`ImpulseChain`].
pub struct Iter<'a> {
    cursor: Option<&'a Impulse>,
}

impl<'a> Iterator for Iter<'a> {
    type Item = &'a Impulse;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.cursor?;
        self.cursor = node.next.as_deref();
        Some(node)
    }
}

/// Object category. The numeric value is the wire tag.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ObjectType {
    /// Generic entity that fits no other category.
    #[default]
    Other = 0,
    /// Players, enemies, NPCs. Kept inside the world bounds.
    Creature = 1,
    /// Bullets, arrows, missiles. May leave the world sideways but stop on the floor.
    Projectile = 2,
    /// Smoke, sparks, explosions. Fly freely and are despawned by clients.
    Effect = 3,
    /// Ground, walls, platforms.
    Terrain = 4,
    /// Buildings, trees.
    Structure = 5,
    /// Pickups such as coins or weapons. Kept inside the world bounds.
    Item = 6,
}

impl ObjectType {
    pub const ALL: [ObjectType; 7] = [
        ObjectType::Other,
        ObjectType::Creature,
        ObjectType::Projectile,
        ObjectType::Effect,
        ObjectType::Terrain,
        ObjectType::Structure,
        ObjectType::Item,
    ];

    pub fn tag(self) -> u8 {
        self as u8
    }

    pub fn from_tag(tag: u8) -> Option<Self> {
        Self::ALL.get(usize::from(tag)).copied()
    }
}

/// A simulated game object.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Object {
    pub id: ObjectId,
    pub kind: ObjectType,
    /// Created locally by a client rather than by the authoritative server.
    pub client_created: bool,
    /// Width and height.
    pub size: Vector,
    pub velocity: Vector,
    /// Height above the floor on `y`.
    pub position: Vector,
    /// Anchor offset from `position`.
    pub anchor: Vector,
    /// 0 = no gravity, 1 = full, 2 = double, negative = inverted.
    pub gravity_factor: f64,
    pub impulses: ImpulseChain,
}

impl Object {
    /// A resting object at the origin with full gravity.
    pub fn new(id: ObjectId, kind: ObjectType) -> Self {
        Self {
            id,
            kind,
            gravity_factor: 1.0,
            ..Self::default()
        }
    }

    pub fn with_size(mut self, size: Vector) -> Self {
        self.size = size;
        self
    }

    pub fn with_position(mut self, position: Vector) -> Self {
        self.position = position;
        self
    }

    pub fn with_velocity(mut self, velocity: Vector) -> Self {
        self.velocity = velocity;
        self
    }

    pub fn with_anchor(mut self, anchor: Vector) -> Self {
        self.anchor = anchor;
        self
    }

    pub fn with_gravity_factor(mut self, gravity_factor: f64) -> Self {
        self.gravity_factor = gravity_factor;
        self
    }

    pub fn with_client_created(mut self, client_created: bool) -> Self {
        self.client_created = client_created;
        self
    }

    pub fn with_impulses(mut self, impulses: ImpulseChain) -> Self {
        self.impulses = impulses;
        self
    }

    pub fn on_the_floor(&self) -> bool {
        self.position.y.abs() < NEGLIGIBLE
    }

    pub fn moving_downward(&self) -> bool {
        self.velocity.y < 0.0
    }

    pub fn is_finite(&self) -> bool {
        self.position.is_finite() && self.velocity.is_finite()
    }
}

/// The simulated world: gravity, extents and the object table.
///
/// Every key of the object table equals the `id` of the object stored under it.
#[derive(Debug, Clone, PartialEq)]
pub struct World {
    /// Positive gravity pulls objects toward the floor (decreasing `y`).
    pub gravity: f64,
    /// Width and height of the playable area.
    pub boundary: Vector,
    objects: HashMap<ObjectId, Object>,
}

impl World {
    pub fn new(gravity: f64, boundary: Vector) -> Self {
        Self {
            gravity,
            boundary,
            objects: HashMap::new(),
        }
    }

    pub fn with_objects(mut self, objects: impl IntoIterator<Item = Object>) -> Self {
        for object in objects {
            self.upsert(object);
        }
        self
    }

    /// Inserts `object` under its own id, returning the object it replaced.
    pub fn upsert(&mut self, object: Object) -> Option<Object> {
        self.objects.insert(object.id, object)
    }

    pub fn remove(&mut self, id: ObjectId) -> Option<Object> {
        self.objects.remove(&id)
    }

    pub fn object(&self, id: ObjectId) -> Option<&Object> {
        self.objects.get(&id)
    }

    // Callers must not change `id` through this reference.
    pub(crate) fn object_mut(&mut self, id: ObjectId) -> Option<&mut Object> {
        self.objects.get_mut(&id)
    }

    pub fn objects(&self) -> Values<'_, ObjectId, Object> {
        self.objects.values()
    }

    pub(crate) fn objects_mut(&mut self) -> ValuesMut<'_, ObjectId, Object> {
        self.objects.values_mut()
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chain_of(directions: &[(f64, f64)]) -> ImpulseChain {
        directions
            .iter()
            .map(|&(x, y)| Impulse::new(Vector::new(x, y), 0.5))
            .collect()
    }

    #[test]
    fn when_impulses_are_pushed_then_latest_is_head() {
        let mut chain = ImpulseChain::new();
        chain.push_front(Impulse::new(Vector::new(1.0, 0.0), 0.9));
        chain.push_front(Impulse::new(Vector::new(2.0, 0.0), 0.9));

        let heads: Vec<f64> = chain.iter().map(|i| i.direction.x).collect();
        assert_eq!(heads, vec![2.0, 1.0]);
        assert_eq!(chain.len(), 2);
    }

    #[test]
    fn when_chain_is_collected_then_iteration_order_is_kept() {
        let chain = chain_of(&[(1.0, 0.0), (2.0, 0.0), (3.0, 0.0)]);
        let xs: Vec<f64> = chain.iter().map(|i| i.direction.x).collect();
        assert_eq!(xs, vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn when_chain_is_cloned_then_copy_is_equal_and_independent() {
        let original = chain_of(&[(1.0, 2.0), (3.0, 4.0)]);
        let mut copy = original.clone();
        assert_eq!(copy, original);

        copy.push_front(Impulse::new(Vector::new(9.0, 9.0), 1.0));
        assert_ne!(copy, original);
        assert_eq!(original.len(), 2);
    }

    #[test]
    fn when_chain_is_very_long_then_drop_does_not_overflow() {
        let mut chain = ImpulseChain::new();
        for i in 0..200_000 {
            chain.push_front(Impulse::new(Vector::new(f64::from(i), 0.0), 0.9));
        }
        assert_eq!(chain.len(), 200_000);
        drop(chain);
    }

    #[test]
    fn when_object_is_upserted_then_key_matches_id() {
        let mut world = World::new(9.8, Vector::new(100.0, 100.0));
        world.upsert(Object::new(7, ObjectType::Creature));
        let replaced = world.upsert(Object::new(7, ObjectType::Item));

        assert_eq!(world.len(), 1);
        assert_eq!(replaced.map(|o| o.kind), Some(ObjectType::Creature));
        assert_eq!(world.object(7).map(|o| o.id), Some(7));
        assert!(world.objects().all(|o| world.object(o.id).is_some()));
    }

    #[test]
    fn when_tag_is_known_then_type_round_trips() {
        for kind in ObjectType::ALL {
            assert_eq!(ObjectType::from_tag(kind.tag()), Some(kind));
        }
        assert_eq!(ObjectType::from_tag(7), None);
    }
}
