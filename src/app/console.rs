use super::types::{KioskCommand, CONSOLE_HELP};
use crate::error::Result;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Line-oriented operator console reading commands from stdin
pub struct ConsoleInputHandler {
    command_sender: mpsc::Sender<KioskCommand>,
    cancellation_token: CancellationToken,
}

impl ConsoleInputHandler {
    pub fn new(command_sender: mpsc::Sender<KioskCommand>) -> Self {
        Self {
            command_sender,
            cancellation_token: CancellationToken::new(),
        }
    }

    /// Start listening for console input
    pub async fn start(&self) -> Result<()> {
        info!("Starting console input handler");
        println!("{}", CONSOLE_HELP);

        let sender = self.command_sender.clone();
        let cancellation_token = self.cancellation_token.clone();

        tokio::spawn(async move {
            let mut lines = BufReader::new(tokio::io::stdin()).lines();

            loop {
                let line = tokio::select! {
                    _ = cancellation_token.cancelled() => {
                        debug!("Console input handler stopping");
                        break;
                    }
                    line = lines.next_line() => line,
                };

                match line {
                    Ok(Some(line)) if line.trim().is_empty() => continue,
                    Ok(Some(line)) => match line.parse::<KioskCommand>() {
                        Ok(command) => {
                            debug!("Console command: {:?}", command);
                            if sender.send(command).await.is_err() {
                                debug!("Command channel closed");
                                break;
                            }
                        }
                        Err(e) => {
                            println!("{}", e);
                            println!("{}", CONSOLE_HELP);
                        }
                    },
                    Ok(None) => {
                        info!("Console input closed");
                        break;
                    }
                    Err(e) => {
                        warn!("Error reading console input: {}", e);
                        break;
                    }
                }
            }

            debug!("Console input handler task exited");
        });

        Ok(())
    }

    /// Stop the console input handler
    pub async fn stop(&self) -> Result<()> {
        info!("Stopping console input handler");
        self.cancellation_token.cancel();

        // Give the reader task a moment to observe cancellation
        tokio::time::sleep(Duration::from_millis(50)).await;

        Ok(())
    }
}
