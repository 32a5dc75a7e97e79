use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use memegen::app::AppState;
use memegen::config::MemeConfig;
use memegen::error::{RecoveryStrategy, classify};
use memegen::session::{self, Session};
use memegen::speech::{VoiceCatalog, detect_synthesizer};
use memegen::{
    CanvasPreset, HasRecoverySuggestion, MemeError, MemeOptions, Recoverable, generate_meme,
};
use tracing_subscriber::EnvFilter;

/// Classic meme generator: fit an image into a square canvas, add top and bottom
/// captions, and optionally read them aloud.
#[derive(Parser, Debug)]
#[command(name = "meme")]
#[command(about = "🖼️  Caption images in the classic meme style")]
#[command(long_about = "Caption images in the classic meme style.
Images are scaled to fit the canvas with black bars, captions are drawn in bold white
with a black outline, and text can be read aloud through espeak-ng when it is installed.")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Caption one image and write a PNG
    Generate(GenerateArgs),
    /// List the speech synthesizer's voices
    Voices(ConfigArgs),
    /// Interactive session reading commands from stdin
    Session(ConfigArgs),
}

#[derive(Args, Debug)]
struct ConfigArgs {
    /// JSON configuration file
    #[arg(short, long, help = "JSON config file; unset fields keep their defaults")]
    config: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct GenerateArgs {
    /// Image to caption
    #[arg(help = "Input image (any format the image crate decodes)")]
    image: PathBuf,

    #[arg(short, long, default_value = "", help = "Top caption")]
    top: String,

    #[arg(short, long, default_value = "", help = "Bottom caption")]
    bottom: String,

    #[arg(short, long, help = "Output PNG path [default: meme.png or the config value]")]
    output: Option<PathBuf>,

    #[arg(short, long, value_enum, help = "Canvas size: classic (400), square (600), hd (1080)")]
    preset: Option<CanvasPreset>,

    #[command(flatten)]
    config: ConfigArgs,

    #[arg(long, help = "TrueType/OpenType font to use instead of the system bold sans-serif")]
    font: Option<PathBuf>,

    #[arg(long, help = "Read the captions aloud after generating")]
    speak: bool,

    #[arg(long, help = "Voice index from `meme voices`")]
    voice: Option<usize>,

    #[arg(long, value_parser = clap::value_parser!(u8).range(0..=100), help = "Volume 0-100")]
    volume: Option<u8>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let result = match cli.command {
        Command::Generate(args) => run_generate(args).await,
        Command::Voices(args) => run_voices(&args).await,
        Command::Session(args) => run_session(&args).await,
    };

    if let Err(err) = &result {
        if let Some(meme_err) = err.downcast_ref::<MemeError>() {
            print_recovery_hints(meme_err);
            if classify::is_fatal(meme_err) {
                eprintln!("Error: {:#}", err);
                std::process::exit(2);
            }
        }
    }
    result
}

/// Tell the user what to try next.
fn print_recovery_hints(error: &MemeError) {
    if let Some(hint) = error.recovery_suggestion() {
        eprintln!("💡 {}", hint);
    }
    for strategy in error.recovery_strategies() {
        match strategy {
            RecoveryStrategy::ChooseAnother { what } => eprintln!("💡 Try another {}", what),
            RecoveryStrategy::Fallback { description } => eprintln!("💡 {}", description),
            RecoveryStrategy::Skip { .. } => {}
        }
    }
}

fn load_config(path: Option<&Path>) -> Result<MemeConfig> {
    let config = match path {
        Some(path) => MemeConfig::from_json_file(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => MemeConfig::default(),
    };
    Ok(config)
}

async fn run_generate(args: GenerateArgs) -> Result<()> {
    let mut config = load_config(args.config.config.as_deref())?;
    if let Some(preset) = args.preset {
        let size = preset.to_size();
        config.canvas.width = size.w;
        config.canvas.height = size.h;
    }
    if let Some(output) = args.output {
        config.output = output;
    }
    if args.font.is_some() {
        config.font_path = args.font;
    }
    if let Some(volume) = args.volume {
        config.speech.volume_level = volume;
    }
    if args.voice.is_some() {
        config.speech.voice = args.voice;
    }
    config.validate()?;

    let report = generate_meme(MemeOptions {
        image: args.image,
        top: args.top,
        bottom: args.bottom,
        config,
        speak: args.speak,
    })
    .await?;

    println!(
        "✅ Wrote {} (image at {},{} size {}x{})",
        report.output.display(),
        report.pixels.x,
        report.pixels.y,
        report.pixels.w,
        report.pixels.h
    );
    if args.speak {
        match (report.spoken, report.spoken_with) {
            (true, Some(voice)) => println!("🔊 Read aloud with {}", voice),
            (true, None) => println!("🔊 Read aloud with the engine default voice"),
            (false, _) => println!("🔇 Speech unavailable; captions were not read"),
        }
    }
    Ok(())
}

async fn run_voices(args: &ConfigArgs) -> Result<()> {
    let config = load_config(args.config.as_deref())?;
    let synth = detect_synthesizer(&config.speech.program);
    let catalog = VoiceCatalog::load(synth.clone());
    let voices = catalog.ready().await?;
    if voices.is_empty() {
        println!("No voices available from '{}'", synth.name());
    }
    for (i, voice) in voices.iter().enumerate() {
        println!("{:>3}  {}", i, voice);
    }
    Ok(())
}

async fn run_session(args: &ConfigArgs) -> Result<()> {
    let config = load_config(args.config.as_deref())?;
    let synth = detect_synthesizer(&config.speech.program);
    let catalog = VoiceCatalog::load(synth.clone());
    let app = AppState::new(config, synth)?;
    let session = Session::new(app, &catalog);
    let stdin = tokio::io::BufReader::new(tokio::io::stdin());
    session::run(session, stdin, tokio::io::stdout()).await?;
    Ok(())
}
