//! Hark - a wake-word voice assistant for the desktop
//!
//! Hark waits for its wake word, listens for one spoken command, and
//! carries it out: telling the time or date, opening websites and desktop
//! applications, searching the web, playing local music or telling a joke.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────┐
//! │                   Assistant loop                     │
//! │   SpeechInput  │  dispatch  │  Handlers  │  Speaker  │
//! └────────┬─────────────────────────┬───────────────────┘
//!          │                         │
//! ┌────────▼──────────┐   ┌──────────▼────────────────────┐
//! │ Voice             │   │ Actions                       │
//! │ capture │ STT     │   │ browser │ launcher │ mixer    │
//! │ TTS │ playback    │   │ jokes                         │
//! └───────────────────┘   └───────────────────────────────┘
//! ```

pub mod actions;
pub mod assistant;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod voice;

pub use actions::{Handlers, Outcome};
pub use assistant::{Assistant, LoopState};
pub use config::Config;
pub use dispatch::{Action, dispatch};
pub use error::{Error, Result};
