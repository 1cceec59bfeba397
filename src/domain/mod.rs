// Domain layer: core simulation types and rules.

pub mod impulse;
pub mod model;
pub mod ports;
pub mod systems;

pub use impulse::apply_impulses;
pub use model::{Impulse, ImpulseChain, NEGLIGIBLE, Object, ObjectId, ObjectType, Vector, World};
pub use ports::Clock;
pub use systems::physics::{MotionProfile, StepReport, step_object, step_world};
