pub mod domain;
pub mod frameworks;
pub mod interface_adapters;
pub mod use_cases;

pub use domain::{Impulse, ImpulseChain, Object, ObjectId, ObjectType, Vector, World};
pub use frameworks::config::{ConfigError, EngineConfig};
pub use frameworks::runner::{run_until, run_with_config};
pub use interface_adapters::codec::{CodecError, decode, encode};
pub use use_cases::{Engine, EngineSettings};
