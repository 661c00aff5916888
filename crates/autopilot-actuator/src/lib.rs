pub mod keypress;
pub mod noop;
pub mod traits;

pub use keypress::KeypressActuator;
pub use noop::NoOpActuator;
pub use traits::Actuator;
