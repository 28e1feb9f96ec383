//! Speech output adapters

use async_trait::async_trait;

use crate::Result;

use super::playback::AudioPlayback;
use super::tts::TextToSpeech;

/// Something that can say a line out loud
#[async_trait(?Send)]
pub trait SpeechOutput {
    /// Speak `text`, returning once it has been played
    async fn say(&mut self, text: &str) -> Result<()>;
}

/// Remote TTS synthesis played on the default output device
pub struct CloudSpeaker {
    tts: TextToSpeech,
    playback: AudioPlayback,
}

impl CloudSpeaker {
    #[must_use]
    pub const fn new(tts: TextToSpeech, playback: AudioPlayback) -> Self {
        Self { tts, playback }
    }
}

#[async_trait(?Send)]
impl SpeechOutput for CloudSpeaker {
    async fn say(&mut self, text: &str) -> Result<()> {
        let audio = self.tts.synthesize(text).await?;
        self.playback.play_mp3(&audio).await
    }
}

/// Silent output; the transcript line is all the user gets
pub struct ConsoleOutput;

#[async_trait(?Send)]
impl SpeechOutput for ConsoleOutput {
    async fn say(&mut self, _text: &str) -> Result<()> {
        Ok(())
    }
}

/// Prints and speaks lines, logging synthesis failures instead of returning them
pub struct Speaker {
    output: Box<dyn SpeechOutput>,
}

impl Speaker {
    #[must_use]
    pub fn new(output: Box<dyn SpeechOutput>) -> Self {
        Self { output }
    }

    /// Speak `text`; never fails
    #[allow(clippy::future_not_send)]
    pub async fn speak(&mut self, text: &str) {
        println!("Assistant: {text}");
        if let Err(e) = self.output.say(text).await {
            tracing::error!(error = %e, "TTS error");
        }
    }
}
