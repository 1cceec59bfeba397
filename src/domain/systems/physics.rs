// Per-type kinematics: gravity, impulses, extrapolation, bounds and floor contact.

use crate::domain::impulse::apply_impulses;
use crate::domain::model::{Object, ObjectId, ObjectType, Vector, World};

/// Physics behaviour selected by an object's category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MotionProfile {
    /// Moves, stays inside the world and stops on the floor.
    Bounded,
    /// Moves, may leave the world sideways, stops on the floor.
    FloorStop,
    /// Moves without any constraint.
    Free,
    /// Never moves under physics.
    Static,
}

impl ObjectType {
    pub fn motion_profile(self) -> MotionProfile {
        match self {
            ObjectType::Creature | ObjectType::Item => MotionProfile::Bounded,
            ObjectType::Projectile => MotionProfile::FloorStop,
            ObjectType::Effect => MotionProfile::Free,
            ObjectType::Terrain | ObjectType::Structure | ObjectType::Other => {
                MotionProfile::Static
            }
        }
    }
}

/// Outcome of one integration pass over a world.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StepReport {
    pub objects_moved: usize,
    pub impulses_expired: usize,
    /// Objects whose position or velocity is no longer finite.
    pub non_finite: Vec<ObjectId>,
}

/// Advances every object of `world` by `elapsed` seconds.
///
/// The step is variable-size Euler; results depend on how wall-clock time was sliced.
pub fn step_world(world: &mut World, elapsed: f64) -> StepReport {
    let mut report = StepReport::default();
    let gravity = world.gravity;
    let boundary = world.boundary;

    for object in world.objects_mut() {
        let Some(expired) = step_object(object, gravity, boundary, elapsed) else {
            continue;
        };
        report.objects_moved += 1;
        report.impulses_expired += expired;
        if !object.is_finite() {
            report.non_finite.push(object.id);
        }
    }
    report
}

/// Advances a single object. Returns the number of expired impulses, or `None`
/// when the object does not move (static category or non-positive `elapsed`).
pub fn step_object(
    object: &mut Object,
    gravity: f64,
    boundary: Vector,
    elapsed: f64,
) -> Option<usize> {
    if elapsed.is_nan() || elapsed <= 0.0 {
        return None;
    }

    let profile = object.kind.motion_profile();
    if profile == MotionProfile::Static {
        return None;
    }

    apply_gravity(object, gravity);
    let expired = apply_impulses(&mut object.impulses, &mut object.velocity, elapsed);
    object.position += object.velocity * elapsed;

    match profile {
        MotionProfile::Bounded => {
            clamp_to_boundary(object, boundary);
            stop_on_floor(object);
        }
        MotionProfile::FloorStop => stop_on_floor(object),
        MotionProfile::Free | MotionProfile::Static => {}
    }
    Some(expired)
}

// Gravity is a per-pass velocity change, not scaled by elapsed time.
fn apply_gravity(object: &mut Object, gravity: f64) {
    if object.gravity_factor != 0.0 {
        object.velocity.y += -gravity * object.gravity_factor;
    }
}

fn clamp_to_boundary(object: &mut Object, boundary: Vector) {
    let half_width = object.size.x / 2.0;
    object.position.x = clamp(object.position.x, half_width, boundary.x - half_width);
    object.position.y = clamp(object.position.y, 0.0, boundary.y - object.size.y);
}

fn stop_on_floor(object: &mut Object) {
    if object.on_the_floor() && object.moving_downward() {
        object.velocity.y = 0.0;
        object.position.y = 0.0;
    }
}

// Lower bound wins when the bounds cross (object larger than the world).
fn clamp(value: f64, min: f64, max: f64) -> f64 {
    if value < min {
        min
    } else if value > max {
        max
    } else {
        value
    }
}
