//! Shared test utilities: scripted input and recording fakes for every capability

#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::{HashSet, VecDeque};
use std::path::{Path, PathBuf};
use std::rc::Rc;

use async_trait::async_trait;
use tokio::sync::oneshot;

use hark::actions::{
    BrowserLauncher, Handlers, JokeSource, LaunchMethod, Launched, Mixer, ProcessLauncher,
};
use hark::config::{AssistantConfig, ListenConfig};
use hark::error::{LaunchError, PlaybackError, RecognitionError};
use hark::voice::{CaptureBounds, Speaker, SpeechInput, SpeechOutput};
use hark::{Assistant, Error};

pub const USER: &str = "Tester";
pub const WAKE: &str = "jarvis";
pub const JOKE: &str = "Why do programmers prefer dark mode? Because light attracts bugs.";

/// Everything the fakes observed
#[derive(Clone, Default)]
pub struct Recorded {
    pub spoken: Rc<RefCell<Vec<String>>>,
    pub opened: Rc<RefCell<Vec<String>>>,
    pub launched: Rc<RefCell<Vec<String>>>,
    pub mixer: Rc<RefCell<Vec<String>>>,
    pub bounds: Rc<RefCell<Vec<CaptureBounds>>>,
}

impl Recorded {
    pub fn spoken(&self) -> Vec<String> {
        self.spoken.borrow().clone()
    }

    pub fn opened(&self) -> Vec<String> {
        self.opened.borrow().clone()
    }

    pub fn launched(&self) -> Vec<String> {
        self.launched.borrow().clone()
    }

    pub fn mixer(&self) -> Vec<String> {
        self.mixer.borrow().clone()
    }
}

/// Replays canned recognition results; reports `Closed` once exhausted
///
/// With `stall` set, the capture after the script instead signals on it and
/// never finishes, like a microphone nobody talks into.
pub struct ScriptedInput {
    replies: VecDeque<Result<String, RecognitionError>>,
    bounds: Rc<RefCell<Vec<CaptureBounds>>>,
    stall: Option<oneshot::Sender<()>>,
}

#[async_trait(?Send)]
impl SpeechInput for ScriptedInput {
    async fn recognize(&mut self, bounds: CaptureBounds) -> Result<String, RecognitionError> {
        self.bounds.borrow_mut().push(bounds);
        if let Some(reply) = self.replies.pop_front() {
            return reply;
        }

        match self.stall.take() {
            Some(listening) => {
                let _ = listening.send(());
                std::future::pending::<Result<String, RecognitionError>>().await
            }
            None => Err(RecognitionError::Closed),
        }
    }
}

/// Records every spoken line
pub struct RecordingOutput {
    lines: Rc<RefCell<Vec<String>>>,
}

#[async_trait(?Send)]
impl SpeechOutput for RecordingOutput {
    async fn say(&mut self, text: &str) -> hark::Result<()> {
        self.lines.borrow_mut().push(text.to_string());
        Ok(())
    }
}

pub struct FakeBrowser {
    opened: Rc<RefCell<Vec<String>>>,
    fail: bool,
}

impl BrowserLauncher for FakeBrowser {
    fn open(&mut self, url: &str) -> hark::Result<()> {
        if self.fail {
            return Err(Error::Browser("no display".to_string()));
        }
        self.opened.borrow_mut().push(url.to_string());
        Ok(())
    }
}

/// Knows a fixed set of names; launching anything else fails with `NotFound`
pub struct FakeLauncher {
    known: HashSet<String>,
    launched: Rc<RefCell<Vec<String>>>,
    fail_known: bool,
}

impl ProcessLauncher for FakeLauncher {
    fn is_known(&self, app_name: &str) -> bool {
        self.known.contains(app_name)
    }

    fn launch(&mut self, app_name: &str) -> Result<Launched, LaunchError> {
        self.launched.borrow_mut().push(app_name.to_string());

        if !self.known.contains(app_name) {
            return Err(LaunchError::NotFound(app_name.to_string()));
        }
        if self.fail_known {
            return Err(LaunchError::Spawn {
                program: app_name.to_string(),
                source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
            });
        }
        Ok(Launched {
            program: app_name.to_string(),
            method: LaunchMethod::Direct,
        })
    }
}

/// Logs `load <file>`, `play` and `stop` calls
pub struct FakeMixer {
    events: Rc<RefCell<Vec<String>>>,
    fail_load: bool,
}

#[async_trait(?Send)]
impl Mixer for FakeMixer {
    async fn load(&mut self, path: &Path) -> Result<(), PlaybackError> {
        let name = path
            .file_name()
            .map(|f| f.to_string_lossy().into_owned())
            .unwrap_or_default();
        self.events.borrow_mut().push(format!("load {name}"));

        if self.fail_load {
            return Err(PlaybackError::Decode {
                path: path.to_path_buf(),
                reason: "not audio".to_string(),
            });
        }
        Ok(())
    }

    fn play(&mut self) -> Result<(), PlaybackError> {
        self.events.borrow_mut().push("play".to_string());
        Ok(())
    }

    fn stop(&mut self) {
        self.events.borrow_mut().push("stop".to_string());
    }
}

pub struct FixedJoke;

impl JokeSource for FixedJoke {
    fn joke(&mut self) -> String {
        JOKE.to_string()
    }
}

/// Knobs for the fake capabilities
pub struct Rig {
    pub mixer: bool,
    pub fail_load: bool,
    pub fail_browser: bool,
    pub fail_known_launch: bool,
    pub known_apps: Vec<&'static str>,
    pub music_dir: PathBuf,
}

impl Default for Rig {
    fn default() -> Self {
        Self {
            mixer: true,
            fail_load: false,
            fail_browser: false,
            fail_known_launch: false,
            known_apps: vec!["calculator", "notepad"],
            music_dir: PathBuf::from("/nonexistent/hark-music"),
        }
    }
}

impl Rig {
    pub fn speaker(&self, recorded: &Recorded) -> Speaker {
        Speaker::new(Box::new(RecordingOutput {
            lines: recorded.spoken.clone(),
        }))
    }

    pub fn handlers(&self, recorded: &Recorded) -> Handlers {
        let mixer: Option<Box<dyn Mixer>> = if self.mixer {
            Some(Box::new(FakeMixer {
                events: recorded.mixer.clone(),
                fail_load: self.fail_load,
            }))
        } else {
            None
        };

        Handlers::new(
            Box::new(FakeBrowser {
                opened: recorded.opened.clone(),
                fail: self.fail_browser,
            }),
            Box::new(FakeLauncher {
                known: self.known_apps.iter().map(ToString::to_string).collect(),
                launched: recorded.launched.clone(),
                fail_known: self.fail_known_launch,
            }),
            mixer,
            Box::new(FixedJoke),
            self.music_dir.clone(),
        )
    }

    /// Assistant fed by `script`, with every output recorded
    pub fn assistant(&self, script: Vec<Result<String, RecognitionError>>) -> (Assistant, Recorded) {
        self.build(script, None)
    }

    /// Like [`Rig::assistant`], but the capture after the script hangs
    ///
    /// The receiver fires once that capture is underway.
    pub fn stalled_assistant(
        &self,
        script: Vec<Result<String, RecognitionError>>,
    ) -> (Assistant, Recorded, oneshot::Receiver<()>) {
        let (tx, rx) = oneshot::channel();
        let (assistant, recorded) = self.build(script, Some(tx));
        (assistant, recorded, rx)
    }

    fn build(
        &self,
        script: Vec<Result<String, RecognitionError>>,
        stall: Option<oneshot::Sender<()>>,
    ) -> (Assistant, Recorded) {
        let recorded = Recorded::default();
        let input = ScriptedInput {
            replies: script.into(),
            bounds: recorded.bounds.clone(),
            stall,
        };

        let assistant = Assistant::new(
            AssistantConfig::new(USER, WAKE).unwrap(),
            ListenConfig::default(),
            Box::new(input),
            self.speaker(&recorded),
            self.handlers(&recorded),
        );
        (assistant, recorded)
    }
}

/// Script that wakes the assistant and then gives one command
pub fn wake_then(command: &str) -> Vec<Result<String, RecognitionError>> {
    vec![Ok(format!("hey {WAKE}")), Ok(command.to_string())]
}
