use async_trait::async_trait;
use autopilot_foundation::ActuatorError;

/// Translates a navigator decision into synthetic input. `Stay` never calls
/// this; `Forward(n)` calls `advance(n - previous_position)` once.
#[async_trait]
pub trait Actuator: Send + Sync {
    async fn advance(&self, count: u32) -> Result<(), ActuatorError>;
}
