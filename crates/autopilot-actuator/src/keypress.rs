use crate::traits::Actuator;
use async_trait::async_trait;
use autopilot_foundation::ActuatorError;
use enigo::{Direction::Click, Enigo, Key, Keyboard, Settings};
use tracing::{info, warn};

/// Maps `Forward(n)` advances onto synthetic right-arrow keypresses
/// delivered to the focused window, via `enigo`.
pub struct KeypressActuator {
    is_available: bool,
}

impl KeypressActuator {
    pub fn new() -> Self {
        Self {
            is_available: Self::check_availability(),
        }
    }

    fn check_availability() -> bool {
        Enigo::new(&Settings::default()).is_ok()
    }

    pub fn is_available(&self) -> bool {
        self.is_available
    }
}

impl Default for KeypressActuator {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Actuator for KeypressActuator {
    async fn advance(&self, count: u32) -> Result<(), ActuatorError> {
        if count == 0 {
            return Ok(());
        }
        if !self.is_available {
            return Err(ActuatorError::Unavailable(
                "enigo backend unavailable on this session".into(),
            ));
        }

        let result = tokio::task::spawn_blocking(move || -> Result<(), String> {
            let mut enigo =
                Enigo::new(&Settings::default()).map_err(|e| format!("enigo init: {e}"))?;
            for _ in 0..count {
                enigo
                    .key(Key::RightArrow, Click)
                    .map_err(|e| format!("key click: {e}"))?;
            }
            Ok(())
        })
        .await;

        match result {
            Ok(Ok(())) => {
                info!(count, "advanced slides via synthetic keypress");
                Ok(())
            }
            Ok(Err(message)) => {
                warn!(error = %message, "keypress advance failed");
                Err(ActuatorError::AdvanceFailed(message))
            }
            Err(join_err) => {
                warn!(error = %join_err, "keypress task panicked");
                Err(ActuatorError::AdvanceFailed(join_err.to_string()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn zero_count_is_a_noop_even_when_unavailable() {
        let actuator = KeypressActuator {
            is_available: false,
        };
        assert!(actuator.advance(0).await.is_ok());
    }

    #[tokio::test]
    async fn reports_unavailable_backend() {
        let actuator = KeypressActuator {
            is_available: false,
        };
        let err = actuator.advance(1).await.unwrap_err();
        assert!(matches!(err, ActuatorError::Unavailable(_)));
    }
}

