//! Wake-word assistant loop
//!
//! ```text
//! WaitingForWake ──wake word──▶ AwaitingCommand ──action──▶ WaitingForWake
//!                                      │
//!                                 exit command ──▶ Terminated
//! ```
//!
//! [`Assistant::step`] performs one transition so the loop can be driven
//! from tests; [`Assistant::run_until`] repeats it until an exit command
//! or the shutdown future fires.

use std::future::Future;

use chrono::Timelike;

use crate::Result;
use crate::actions::{Handlers, Outcome};
use crate::config::{AssistantConfig, ListenConfig};
use crate::dispatch::dispatch;
use crate::error::RecognitionError;
use crate::voice::{CaptureBounds, Speaker, SpeechInput};

const ACKNOWLEDGEMENT: &str = "Yes? How can I help you?";
const MISSED_COMMAND: &str = "I did not catch that. Please try again.";
const FAREWELL: &str = "Shutting down. Goodbye.";

/// Where the loop is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    WaitingForWake,
    AwaitingCommand,
    Terminated,
}

/// Result of one capture after error collapsing
enum Heard {
    Text(String),
    Nothing,
    Closed,
}

/// The assistant: input, output and handlers tied together by the loop
pub struct Assistant {
    config: AssistantConfig,
    listen: ListenConfig,
    input: Box<dyn SpeechInput>,
    speaker: Speaker,
    handlers: Handlers,
    state: LoopState,
}

impl Assistant {
    #[must_use]
    pub fn new(
        config: AssistantConfig,
        listen: ListenConfig,
        input: Box<dyn SpeechInput>,
        speaker: Speaker,
        handlers: Handlers,
    ) -> Self {
        Self {
            config,
            listen,
            input,
            speaker,
            handlers,
            state: LoopState::WaitingForWake,
        }
    }

    #[must_use]
    pub const fn state(&self) -> LoopState {
        self.state
    }

    /// Speak the startup greeting
    #[allow(clippy::future_not_send)]
    pub async fn greet(&mut self) {
        let hour = chrono::Local::now().hour();
        let line = format!(
            "{}, {}. I am ready. Say '{}' to wake me, or press Ctrl+C to exit.",
            greeting_for_hour(hour),
            self.config.user_name(),
            self.config.wake_word()
        );
        self.speaker.speak(&line).await;
    }

    /// Perform one state transition
    #[allow(clippy::future_not_send)]
    pub async fn step(&mut self) -> Outcome {
        match self.state {
            LoopState::WaitingForWake => match self.capture(self.listen.wake).await {
                Heard::Text(text) if self.config.is_wake(&text) => {
                    tracing::debug!("wake word detected");
                    self.state = LoopState::AwaitingCommand;
                    Outcome::Continue
                }
                Heard::Text(_) | Heard::Nothing => Outcome::Continue,
                Heard::Closed => self.close().await,
            },
            LoopState::AwaitingCommand => {
                self.speaker.speak(ACKNOWLEDGEMENT).await;

                let outcome = match self.capture(self.listen.command).await {
                    Heard::Text(command) => {
                        let action = dispatch(&command);
                        self.handlers.perform(&action, &mut self.speaker).await
                    }
                    Heard::Nothing => {
                        self.speaker.speak(MISSED_COMMAND).await;
                        Outcome::Continue
                    }
                    Heard::Closed => return self.close().await,
                };

                self.state = match outcome {
                    Outcome::Continue => LoopState::WaitingForWake,
                    Outcome::Terminate => LoopState::Terminated,
                };
                outcome
            }
            LoopState::Terminated => Outcome::Terminate,
        }
    }

    /// Greet, then step until terminated or `shutdown` completes
    ///
    /// # Errors
    ///
    /// Currently infallible; every failure inside the loop is spoken and logged
    #[allow(clippy::future_not_send)]
    pub async fn run_until<F>(&mut self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);

        self.greet().await;
        tracing::info!(wake_word = self.config.wake_word(), "listening for wake word");

        while self.state != LoopState::Terminated {
            let interrupted = tokio::select! {
                biased;
                () = &mut shutdown => true,
                _ = self.step() => false,
            };

            if interrupted {
                tracing::info!("shutdown requested");
                self.speaker.speak(FAREWELL).await;
                self.state = LoopState::Terminated;
            }
        }

        tracing::info!("assistant stopped");
        Ok(())
    }

    /// Run until an exit command or Ctrl+C
    ///
    /// # Errors
    ///
    /// Currently infallible; see [`Assistant::run_until`]
    #[allow(clippy::future_not_send)]
    pub async fn run(&mut self) -> Result<()> {
        self.run_until(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "failed to listen for Ctrl+C");
                std::future::pending::<()>().await;
            }
        })
        .await
    }

    #[allow(clippy::future_not_send)]
    async fn capture(&mut self, bounds: CaptureBounds) -> Heard {
        match self.input.recognize(bounds).await {
            Ok(text) => {
                let text = text.trim().to_lowercase();
                println!("You: {text}");
                Heard::Text(text)
            }
            Err(RecognitionError::Timeout | RecognitionError::Unintelligible) => Heard::Nothing,
            Err(RecognitionError::Service(e)) => {
                tracing::warn!(error = %e, "speech recognition failed");
                Heard::Nothing
            }
            Err(RecognitionError::Closed) => Heard::Closed,
        }
    }

    #[allow(clippy::future_not_send)]
    async fn close(&mut self) -> Outcome {
        tracing::info!("input closed");
        self.speaker.speak(FAREWELL).await;
        self.state = LoopState::Terminated;
        Outcome::Terminate
    }
}

/// Salutation for a local hour (0-23)
#[must_use]
pub const fn greeting_for_hour(hour: u32) -> &'static str {
    if hour < 12 {
        "Good morning"
    } else if hour < 18 {
        "Good afternoon"
    } else {
        "Good evening"
    }
}
