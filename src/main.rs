use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use pantry_assistant::daemon::{self, Daemon};
use pantry_assistant::pantry::{RemovalMode, display_entry};
use pantry_assistant::pipeline::Turn;
use pantry_assistant::voice::{self, AudioCapture};
use pantry_assistant::{Config, Session};

/// Pantry - a voice-driven grocery list assistant
#[derive(Parser)]
#[command(name = "pantry", version, about)]
struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Pantry list file (overrides configuration)
    #[arg(long, global = true)]
    pantry_file: Option<PathBuf>,

    /// Item category dataset (overrides configuration)
    #[arg(long, global = true)]
    dataset: Option<PathBuf>,

    /// Only remove entries whose item name matches exactly
    #[arg(long, global = true)]
    exact_removal: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Serve the HTTP API
    Serve {
        /// Port to listen on
        #[arg(long)]
        port: Option<u16>,
        /// Also listen on the microphone
        #[arg(long)]
        listen: bool,
    },
    /// Listen on the microphone and answer spoken requests
    Listen,
    /// Ask the assistant something
    Ask {
        /// What to say
        #[arg(required = true)]
        text: Vec<String>,
        /// Speak the reply
        #[arg(long)]
        speak: bool,
    },
    /// Send a recorded WAV file to the assistant
    Voice {
        /// WAV file
        file: PathBuf,
        /// Speak the reply
        #[arg(long)]
        speak: bool,
    },
    /// Show the grocery list
    List,
    /// Add an item to the list
    Add {
        item: String,
    },
    /// Remove an item from the list
    Remove {
        item: String,
    },
    /// Empty the list
    Clear,
    /// Test microphone input
    TestMic {
        /// Duration in seconds
        #[arg(short, long, default_value = "5")]
        duration: u64,
    },
    /// Test TTS output
    TestTts {
        /// Text to speak
        #[arg(default_value = "Hello! This is a test of the text to speech system.")]
        text: String,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Set up logging based on verbosity
    let filter = match cli.verbose {
        0 => "info,pantry_assistant=info",
        1 => "info,pantry_assistant=debug",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_writer(std::io::stderr)
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
    let mut config = Config::load()?;
    if let Some(path) = cli.pantry_file {
        config.pantry_file = path;
    }
    if let Some(path) = cli.dataset {
        config.dataset_file = path;
    }
    if cli.exact_removal {
        config.removal = RemovalMode::Exact;
    }
    tracing::debug!(?config, "loaded configuration");

    match cli.command {
        Command::Serve { port, listen } => {
            if let Some(port) = port {
                config.api_server.port = port;
            }
            Daemon::new(config).run(listen).await?;
        }
        Command::Listen => Daemon::new(config).listen().await?,
        Command::Ask { text, speak } => ask(&config, &text.join(" "), speak).await?,
        Command::Voice { file, speak } => voice_file(&config, &file, speak).await?,
        Command::List => list(&config)?,
        Command::Add { item } => {
            let entry = daemon::open_pantry(&config).add(&item)?;
            println!("Added {}", display_entry(&entry));
        }
        Command::Remove { item } => {
            let removed = daemon::open_pantry(&config).remove(&item)?;
            println!("Removed {removed} item(s)");
        }
        Command::Clear => {
            daemon::open_pantry(&config).clear()?;
            println!("List cleared");
        }
        Command::TestMic { duration } => test_mic(duration).await?,
        Command::TestTts { text } => test_tts(&config, &text).await?,
    }

    Ok(())
}

/// Print the grocery list
fn list(config: &Config) -> anyhow::Result<()> {
    let items = daemon::open_pantry(config).read()?;
    if items.is_empty() {
        println!("Your list is empty.");
        return Ok(());
    }

    for item in &items {
        println!("- {}", display_entry(item));
    }
    Ok(())
}

async fn ask(config: &Config, text: &str, speak: bool) -> anyhow::Result<()> {
    let pipeline = daemon::build_pipeline(config);
    let mut session = Session::new();
    let turn = pipeline.handle_text(&mut session, text).await?;
    reply(config, &turn, speak).await
}

async fn voice_file(config: &Config, file: &Path, speak: bool) -> anyhow::Result<()> {
    let wav = std::fs::read(file).with_context(|| format!("reading {}", file.display()))?;

    let pipeline = daemon::build_pipeline(config);
    let mut session = Session::new();
    let turn = pipeline.handle_audio(&mut session, &wav).await?;

    if let Turn::Replied(exchange) = &turn {
        println!("You: {}", exchange.transcript);
    }
    reply(config, &turn, speak).await
}

/// Print a turn's reply, optionally speaking it
async fn reply(config: &Config, turn: &Turn, speak: bool) -> anyhow::Result<()> {
    let Some(text) = turn.spoken_text() else {
        return Ok(());
    };
    println!("{text}");

    if speak {
        let speaker = daemon::build_speaker(config)
            .context("no speech output configured (PANTRY_TTS_ENGINE)")?;
        speaker.speak(text).await?;
    }
    Ok(())
}

/// Test microphone input
#[allow(clippy::future_not_send)]
async fn test_mic(duration: u64) -> anyhow::Result<()> {
    println!("Testing microphone for {duration} seconds...");
    println!("Speak into your microphone!\n");

    let mut capture = AudioCapture::new()?;
    capture.start()?;

    println!("Sample rate: {} Hz", voice::SAMPLE_RATE);
    println!("Speech threshold: {:.4} RMS", voice::ENERGY_THRESHOLD);
    println!("---");

    for i in 0..duration {
        tokio::time::sleep(Duration::from_secs(1)).await;

        let samples = capture.take_buffer();
        let energy = voice::rms(&samples);
        let peak = samples.iter().map(|s| s.abs()).fold(0.0f32, f32::max);

        // Visual meter
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let meter_len = (energy * 100.0).min(50.0) as usize;
        let meter: String = "█".repeat(meter_len) + &" ".repeat(50 - meter_len);
        let marker = if energy > voice::ENERGY_THRESHOLD { "speech" } else { "" };

        println!(
            "[{:2}s] RMS: {:.4} | Peak: {:.4} | [{}] {}",
            i + 1,
            energy,
            peak,
            meter,
            marker
        );
    }

    capture.stop();

    println!("\n---");
    println!("If you saw movement in the meter, your mic is working!");
    println!("If RMS stayed near 0, check:");
    println!("  1. Is your mic plugged in?");
    println!("  2. Run: pactl info | grep 'Default Source'");
    println!("  3. Run: arecord -l (to list devices)");

    Ok(())
}

/// Test TTS output
async fn test_tts(config: &Config, text: &str) -> anyhow::Result<()> {
    println!("Testing TTS ({:?})...", config.voice.tts_engine);

    let speaker = daemon::build_speaker(config)
        .context("no speech output configured (PANTRY_TTS_ENGINE)")?;
    speaker.speak(text).await?;

    println!("TTS test complete!");
    Ok(())
}
