//! Command handlers
//!
//! Each [`Action`] produced by the dispatcher is carried out here against
//! a set of boxed capabilities, so tests can swap the desktop for fakes.

mod browser;
mod jokes;
mod launcher;
mod music;

use std::path::PathBuf;

use chrono::NaiveDateTime;

use crate::dispatch::{Action, YOUTUBE_URL, search_url};
use crate::error::PlaybackError;
use crate::voice::Speaker;

pub use browser::{BrowserLauncher, SystemBrowser};
pub use jokes::{BuiltinJokes, JokeSource};
pub use launcher::{
    AppTable, LaunchDescriptor, LaunchMethod, Launched, ProcessLauncher, SystemLauncher,
    default_app_table,
};
pub use music::{Mixer, find_first_track, is_track};

/// Whether the assistant keeps going after an action
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Continue,
    Terminate,
}

/// Capabilities the handlers act through
pub struct Handlers {
    browser: Box<dyn BrowserLauncher>,
    launcher: Box<dyn ProcessLauncher>,
    mixer: Option<Box<dyn Mixer>>,
    jokes: Box<dyn JokeSource>,
    music_dir: PathBuf,
}

impl Handlers {
    /// `mixer` is `None` when no output device could be opened
    #[must_use]
    pub fn new(
        browser: Box<dyn BrowserLauncher>,
        launcher: Box<dyn ProcessLauncher>,
        mixer: Option<Box<dyn Mixer>>,
        jokes: Box<dyn JokeSource>,
        music_dir: PathBuf,
    ) -> Self {
        Self {
            browser,
            launcher,
            mixer,
            jokes,
            music_dir,
        }
    }

    /// Carry out one action, speaking the result
    #[allow(clippy::future_not_send)]
    pub async fn perform(&mut self, action: &Action, speaker: &mut Speaker) -> Outcome {
        tracing::debug!(?action, "performing");

        match action {
            Action::TellTime => {
                let now = chrono::Local::now().naive_local();
                speaker
                    .speak(&format!("The current time is {}.", format_time(&now)))
                    .await;
            }
            Action::TellDate => {
                let now = chrono::Local::now().naive_local();
                speaker
                    .speak(&format!("Today is {}.", format_date(&now)))
                    .await;
            }
            Action::OpenYouTube => {
                speaker.speak("Opening YouTube").await;
                self.open_in_browser(YOUTUBE_URL, speaker).await;
            }
            Action::OpenUrl(url) => self.open_url(url, speaker).await,
            Action::LaunchApp(name) => self.launch_app(name, speaker).await,
            Action::Search(query) => {
                self.open_in_browser(&search_url(query), speaker).await;
                speaker
                    .speak(&format!("Searching Google for {query}"))
                    .await;
            }
            Action::AskSearchQuery => speaker.speak("What should I search for?").await,
            Action::PlayMusic => self.play_music(speaker).await,
            Action::StopMusic => self.stop_music(speaker).await,
            Action::TellJoke => {
                let joke = self.jokes.joke();
                speaker.speak(&joke).await;
            }
            Action::Exit => {
                speaker.speak("Goodbye.").await;
                return Outcome::Terminate;
            }
            Action::Fallback(command) => {
                speaker
                    .speak("I can not perform that command yet. I will search the web for you.")
                    .await;
                self.open_in_browser(&search_url(command), speaker).await;
            }
        }

        Outcome::Continue
    }

    #[allow(clippy::future_not_send)]
    async fn open_url(&mut self, url: &str, speaker: &mut Speaker) {
        if let Err(e) = url::Url::parse(url) {
            tracing::warn!(url, error = %e, "not a valid URL");
            speaker
                .speak(&format!("I could not make sense of the address {url}."))
                .await;
            return;
        }

        self.open_in_browser(url, speaker).await;
        speaker.speak(&format!("Opening {url}")).await;
    }

    #[allow(clippy::future_not_send)]
    async fn open_in_browser(&mut self, url: &str, speaker: &mut Speaker) {
        if let Err(e) = self.browser.open(url) {
            tracing::warn!(error = %e, "failed to open browser");
            speaker.speak("I could not open the browser.").await;
        }
    }

    #[allow(clippy::future_not_send)]
    async fn launch_app(&mut self, name: &str, speaker: &mut Speaker) {
        let known = self.launcher.is_known(name);
        let line = match (self.launcher.launch(name), known) {
            (Ok(_), true) => format!("Launching {name}"),
            (Ok(_), false) => format!("Attempting to open {name}"),
            (Err(e), true) => {
                tracing::warn!(app = name, error = %e, "launch failed");
                format!("Failed to launch {name}: {e}")
            }
            (Err(e), false) => {
                tracing::warn!(app = name, error = %e, "launch failed");
                format!("Could not open {name}: {e}")
            }
        };
        speaker.speak(&line).await;
    }

    #[allow(clippy::future_not_send)]
    async fn play_music(&mut self, speaker: &mut Speaker) {
        let line = match self.start_first_track().await {
            Ok(Some(file)) => format!("Playing {file}"),
            Ok(None) => format!("No music files found in {}.", self.music_dir.display()),
            Err(e) => self.music_failure(&e),
        };
        speaker.speak(&line).await;
    }

    /// Load and start the first track in the music folder
    ///
    /// `Ok(None)` means the folder holds nothing playable.
    #[allow(clippy::future_not_send)]
    async fn start_first_track(&mut self) -> Result<Option<String>, PlaybackError> {
        let mixer = self.mixer.as_mut().ok_or(PlaybackError::Unavailable)?;

        let track = find_first_track(&self.music_dir).map_err(|e| {
            tracing::warn!(dir = %self.music_dir.display(), error = %e, "music folder unreadable");
            PlaybackError::Unavailable
        })?;
        let Some(track) = track else {
            return Ok(None);
        };

        mixer.load(&track).await?;
        mixer.play()?;

        tracing::info!(track = %track.display(), "playing music");
        Ok(Some(
            track
                .file_name()
                .map(|f| f.to_string_lossy().into_owned())
                .unwrap_or_default(),
        ))
    }

    fn music_failure(&self, e: &PlaybackError) -> String {
        if matches!(e, PlaybackError::Unavailable) {
            return format!(
                "Music playback is not available. Ensure audio output works and there is a {} folder.",
                self.music_dir.display()
            );
        }

        tracing::warn!(error = %e, "music playback failed");
        format!("Failed to play music: {e}")
    }

    #[allow(clippy::future_not_send)]
    async fn stop_music(&mut self, speaker: &mut Speaker) {
        let line = match self.mixer.as_mut().ok_or(PlaybackError::Unavailable) {
            Ok(mixer) => {
                mixer.stop();
                "Music stopped."
            }
            Err(e) => {
                tracing::debug!(error = %e, "stop requested without a mixer");
                "Music module not available."
            }
        };
        speaker.speak(line).await;
    }
}

/// Local time as spoken, e.g. `02:05 PM`
#[must_use]
pub fn format_time(now: &NaiveDateTime) -> String {
    now.format("%I:%M %p").to_string()
}

/// Local date as spoken, e.g. `Saturday, March 09, 2024`
#[must_use]
pub fn format_date(now: &NaiveDateTime) -> String {
    now.format("%A, %B %d, %Y").to_string()
}
