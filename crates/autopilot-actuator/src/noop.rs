use crate::traits::Actuator;
use async_trait::async_trait;
use autopilot_foundation::ActuatorError;
use tracing::trace;

/// Records advances instead of acting on them. Used in tests and in any
/// headless/dry-run mode.
#[derive(Default)]
pub struct NoOpActuator {
    calls: std::sync::atomic::AtomicU32,
}

impl NoOpActuator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(std::sync::atomic::Ordering::Relaxed)
    }
}

#[async_trait]
impl Actuator for NoOpActuator {
    async fn advance(&self, count: u32) -> Result<(), ActuatorError> {
        trace!(count, "NoOpActuator: pretending to advance");
        self.calls
            .fetch_add(count, std::sync::atomic::Ordering::Relaxed);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn accumulates_advance_counts() {
        let actuator = NoOpActuator::new();
        actuator.advance(2).await.unwrap();
        actuator.advance(1).await.unwrap();
        assert_eq!(actuator.calls(), 3);
    }
}
