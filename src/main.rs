use std::process::ExitCode;
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use hark::actions::{BuiltinJokes, Handlers, Mixer, SystemBrowser, SystemLauncher};
use hark::config::Overrides;
use hark::voice::{
    AudioCapture, AudioPlayback, AudioSource, CloudSpeaker, ConsoleOutput, CpalMixer,
    MicrophoneInput, Pcm, Speaker, SpeechInput, SpeechOutput, SpeechToText, TextToSpeech,
    TypedInput, calculate_energy,
};
use hark::{Assistant, Config};

/// Hark - a wake-word voice assistant for the desktop
#[derive(Parser)]
#[command(name = "hark", version, about)]
struct Cli {
    /// Name used in the greeting
    #[arg(long, env = "HARK_USER_NAME")]
    name: Option<String>,

    /// Phrase that wakes the assistant
    #[arg(long, env = "HARK_WAKE_WORD")]
    wake_word: Option<String>,

    /// Read commands from stdin instead of the microphone
    #[arg(long)]
    typed: bool,

    /// Print replies instead of speaking them
    #[arg(long)]
    mute: bool,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
#[allow(clippy::enum_variant_names)]
enum Command {
    /// Print a microphone level meter
    TestMic {
        /// Duration in seconds
        #[arg(short, long, default_value = "5")]
        duration: u64,
    },
    /// Play a test tone
    TestSpeaker,
    /// Speak a phrase through the configured TTS provider
    TestTts {
        /// Text to speak
        #[arg(default_value = "Hello! This is a test of the text to speech system.")]
        text: String,
    },
    /// List the applications that can be opened by name
    Apps,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Set up logging based on verbosity
    let filter = match cli.verbose {
        0 => "info,hark=info",
        1 => "info,hark=debug",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("fatal: {e:#}");
            ExitCode::FAILURE
        }
    }
}

#[allow(clippy::future_not_send)]
async fn run(cli: Cli) -> anyhow::Result<()> {
    let overrides = Overrides {
        user_name: cli.name,
        wake_word: cli.wake_word,
    };

    if let Some(cmd) = cli.command {
        return match cmd {
            Command::TestMic { duration } => test_mic(duration).await,
            Command::TestSpeaker => test_speaker().await,
            Command::TestTts { text } => test_tts(&overrides, &text).await,
            Command::Apps => list_apps(&overrides),
        };
    }

    let config = Config::load(&overrides)?;
    tracing::debug!(?config, "loaded configuration");

    let input = build_input(&config, cli.typed)?;
    let speaker = Speaker::new(build_output(&config, cli.mute));

    let mixer: Option<Box<dyn Mixer>> = match CpalMixer::init() {
        Ok(mixer) => Some(Box::new(mixer)),
        Err(e) => {
            tracing::warn!(error = %e, "music playback unavailable");
            None
        }
    };

    let handlers = Handlers::new(
        Box::new(SystemBrowser::new()),
        Box::new(SystemLauncher::new(config.applications.clone())),
        mixer,
        Box::new(BuiltinJokes),
        config.music_dir.clone(),
    );

    tracing::info!(
        user = config.assistant.user_name(),
        wake_word = config.assistant.wake_word(),
        typed = cli.typed,
        mute = cli.mute,
        "starting hark"
    );

    let mut assistant = Assistant::new(
        config.assistant.clone(),
        config.listen,
        input,
        speaker,
        handlers,
    );
    assistant.run().await?;

    Ok(())
}

fn build_input(config: &Config, typed: bool) -> anyhow::Result<Box<dyn SpeechInput>> {
    if typed {
        println!("Type your phrases below (start with the wake word).");
        return Ok(Box::new(TypedInput::new()));
    }

    let provider = config.voice.stt_provider;
    let key = config.api_keys.for_stt(provider).unwrap_or_default();
    let stt = SpeechToText::new(provider, key.to_string(), config.voice.stt_model.clone())
        .context("speech recognition is not configured (or run with --typed)")?;
    let capture = AudioCapture::new().context("no microphone available (or run with --typed)")?;

    Ok(Box::new(MicrophoneInput::new(
        Box::new(capture),
        stt,
        config.listen.ambient,
    )))
}

fn build_output(config: &Config, mute: bool) -> Box<dyn SpeechOutput> {
    if mute {
        return Box::new(ConsoleOutput);
    }

    match cloud_speaker(config) {
        Ok(speaker) => Box::new(speaker),
        Err(e) => {
            tracing::warn!(error = %e, "speech output unavailable, printing replies only");
            Box::new(ConsoleOutput)
        }
    }
}

fn cloud_speaker(config: &Config) -> hark::Result<CloudSpeaker> {
    let tts = text_to_speech(config)?;
    Ok(CloudSpeaker::new(tts, AudioPlayback::new()?))
}

fn text_to_speech(config: &Config) -> hark::Result<TextToSpeech> {
    let provider = config.voice.tts_provider;
    let key = config.api_keys.for_tts(provider).unwrap_or_default();
    TextToSpeech::new(
        provider,
        key.to_string(),
        config.voice.tts_voice.clone(),
        config.voice.tts_speed,
        config.voice.tts_model.clone(),
    )
}

/// Print a level meter for the microphone, once a second
#[allow(clippy::future_not_send)]
async fn test_mic(duration: u64) -> anyhow::Result<()> {
    let mut capture = AudioCapture::new()?;
    capture.start()?;
    println!("Listening for {duration}s; speak to move the meter.");

    for second in 1..=duration {
        tokio::time::sleep(Duration::from_secs(1)).await;
        let level = calculate_energy(&capture.take_buffer()?);

        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let bars = (level * 100.0).min(50.0) as usize;
        println!("{second:>3}s {level:.4} {}", "|".repeat(bars));
    }

    capture.stop();
    Ok(())
}

/// Play a two second 440Hz tone
#[allow(clippy::future_not_send)]
async fn test_speaker() -> anyhow::Result<()> {
    const RATE: u32 = 24_000;

    #[allow(clippy::cast_precision_loss)]
    let samples = (0..RATE * 2)
        .map(|i| (std::f32::consts::TAU * 440.0 * i as f32 / RATE as f32).sin() * 0.3)
        .collect();

    println!("Playing a 440Hz tone.");
    AudioPlayback::new()?
        .play(Pcm {
            samples,
            sample_rate: RATE,
        })
        .await?;
    Ok(())
}

/// Speak `text` through the configured TTS provider
#[allow(clippy::future_not_send)]
async fn test_tts(overrides: &Overrides, text: &str) -> anyhow::Result<()> {
    let config = Config::load(overrides)?;
    let mp3_data = text_to_speech(&config)?.synthesize(text).await?;
    println!("Synthesized {} bytes, playing.", mp3_data.len());

    AudioPlayback::new()?.play_mp3(&mp3_data).await?;
    Ok(())
}

/// Print the effective application table
fn list_apps(overrides: &Overrides) -> anyhow::Result<()> {
    let config = Config::load(overrides)?;

    for (name, app) in &config.applications {
        if app.args.is_empty() {
            println!("{name:<16} {}", app.program);
        } else {
            println!("{name:<16} {} {}", app.program, app.args.join(" "));
        }
    }

    Ok(())
}
