// Interface adapters: snapshot codec, JSON view and clock.

pub mod clock;
pub mod codec;
pub mod protocol;
