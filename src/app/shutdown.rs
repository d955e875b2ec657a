use super::{ComponentState, KioskOrchestrator};
use crate::error::{KioskError, Result};
use std::time::Duration;
use tokio::time::timeout;
use tracing::{error, info};

impl KioskOrchestrator {
    /// Perform graceful shutdown of all components
    pub async fn shutdown(&mut self) -> Result<i32> {
        info!("Beginning graceful shutdown");

        // Stops the display task and any loop still waiting
        self.cancellation_token.cancel();

        let mut exit_code = 0;

        if self.console_enabled {
            if let Err(e) = self.stop_component("console").await {
                error!("Error stopping console: {}", e);
                exit_code = 1;
            }
        }

        // Orphans any in-flight submission
        self.controller.reset().await;
        self.next_tick = None;
        self.success_deadline = None;

        for component in ["camera", "display"] {
            if let Err(e) = self.stop_component(component).await {
                error!("Error stopping {}: {}", component, e);
                exit_code = 1;
            }
        }

        info!("Graceful shutdown completed with exit code: {}", exit_code);
        Ok(exit_code)
    }

    async fn stop_component(&mut self, component: &str) -> Result<()> {
        info!("Stopping {} component", component);
        self.set_component_state(component, ComponentState::Stopping)
            .await;

        let result = match component {
            "console" => match &self.console {
                Some(console) => match timeout(Duration::from_secs(2), console.stop()).await {
                    Ok(result) => result,
                    Err(_) => Err(KioskError::system(format!(
                        "{} component stop timeout",
                        component
                    ))),
                },
                None => Ok(()),
            },
            "camera" => {
                self.controller.stop_camera();
                Ok(())
            }
            _ => Ok(()),
        };

        match &result {
            Ok(()) => {
                self.set_component_state(component, ComponentState::Stopped)
                    .await;
                info!("{} component stopped", component);
            }
            Err(e) => {
                self.set_component_state(component, ComponentState::Failed)
                    .await;
                error!("Error stopping {} component: {}", component, e);
            }
        }

        result
    }
}
