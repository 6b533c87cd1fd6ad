//! arcade-tts server binary.

use std::path::PathBuf;
use std::sync::Arc;

use arcade_tts::api::{self, AppState};
use arcade_tts::audio::ensure_output_dir;
use arcade_tts::config::Config;
use arcade_tts::synth::{HttpSynthesizer, Synthesizer};
use arcade_tts::tags::TagInjector;
use clap::Parser;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "arcade-tts", about = "Voice-cloning TTS server with random tag injection")]
struct Args {
    /// Path to config.yaml
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Address to bind (overrides config and HOST)
    #[arg(long)]
    host: Option<String>,

    /// Port to bind (overrides config and PORT)
    #[arg(short, long)]
    port: Option<u16>,

    /// Fixed seed for tag injection
    #[arg(long)]
    seed: Option<u64>,

    /// Enable verbose (debug) logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let filter = if args.verbose {
        EnvFilter::new("debug,hyper=info,reqwest=info")
    } else {
        EnvFilter::new("info,hyper=warn,reqwest=warn")
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let mut config = Config::load(args.config.as_deref());
    config.apply_process_env();
    if let Some(host) = args.host {
        config.server.host = host;
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }
    if args.seed.is_some() {
        config.tags.seed = args.seed;
    }

    ensure_output_dir(&config.output.folder)?;

    let rng = match config.tags.seed {
        Some(seed) => {
            info!("Tag injection seeded with {seed}");
            StdRng::seed_from_u64(seed)
        }
        None => StdRng::from_entropy(),
    };
    let injector = TagInjector::new(config.tags.clone())?;

    info!("{}", "=".repeat(60));
    info!("ARCADE TTS SERVER");
    info!("{}", "=".repeat(60));
    info!("Model backend: {} (device: {})", config.model.backend_url, config.model.device);
    let synthesizer = Arc::new(HttpSynthesizer::new(&config.model)?);
    if synthesizer.ready().await {
        info!("Model loaded!");
    } else {
        warn!("Model backend not ready yet, requests will fail until it is");
    }
    info!("Voice reference: {}", config.voice.reference.display());
    info!("Output folder: {}", config.output.folder.display());
    info!("Tags: {:?} ({}-{} per request)", injector.tags(), config.tags.min_tags, config.tags.max_tags);

    let state = AppState::new(
        synthesizer,
        injector,
        rng,
        config.voice.reference.clone(),
        &config.output.output_file(),
    );

    let port = config.server.port;
    info!("Endpoints:");
    info!("  GET/POST http://localhost:{port}/speak?text=Your message here");
    info!("  GET/POST http://localhost:{port}/speak_raw?text=Your message here (no tags)");
    info!("  GET      http://localhost:{port}/health");

    api::serve(state, &config.server.host, port).await?;

    Ok(())
}
