/// Keyword spotter binary
///
/// Streams a 16 kHz mono WAV file through Porcupine and logs every keyword
/// detection.
///
/// Usage: keyword-spotter <input.wav> [config.json]

use anyhow::{bail, Context, Result};
use porcupine_session::{wav, EngineInfo, KeywordStream, NativeEngine, SpotterConfig};
use tracing::{error, info, warn};

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| {
                    tracing_subscriber::EnvFilter::new("porcupine_session=info,keyword_spotter=info")
                }),
        )
        .init();

    if let Err(e) = run().await {
        error!("{:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let mut args = std::env::args().skip(1);
    let input = args
        .next()
        .context("usage: keyword-spotter <input.wav> [config.json]")?;

    let config = match args.next() {
        Some(path) => SpotterConfig::from_file(&path),
        None => SpotterConfig::from_env(),
    }
    .context("Failed to load configuration")?;

    // Engine constants are known once an instance exists
    let mut stream = KeywordStream::open(NativeEngine, &config.model_file_path, &config.keywords)
        .context("Failed to create Porcupine session")?;
    let info = EngineInfo::query(stream.session().engine());
    info!(
        "Porcupine {} ({} Hz, {} samples per frame, {:.1} ms)",
        info.version,
        info.sample_rate,
        info.frame_length,
        info.frame_duration_ms()
    );

    let audio = wav::read_pcm(&input).with_context(|| format!("Failed to read {}", input))?;
    if audio.sample_rate != info.sample_rate {
        bail!(
            "{} is {} Hz, Porcupine requires {} Hz",
            input,
            audio.sample_rate,
            info.sample_rate
        );
    }
    info!("Loaded {:.2}s of audio from {}", audio.duration_secs(), input);

    let mut events = stream.subscribe();

    let reporter = tokio::spawn(async move {
        let mut count = 0u64;
        while let Some(event) = events.recv().await {
            count += 1;
            info!(
                "Keyword {} detected at {:.2}s",
                event.keyword_index,
                (event.frame + 1) as f32 * info.frame_duration_ms() / 1000.0
            );
        }
        count
    });

    let bytes = audio.to_le_bytes();
    let mut failed_chunks = 0u64;
    for (i, chunk) in bytes.chunks(config.chunk_bytes).enumerate() {
        // The chunk tail after a detection is handed back, not buffered
        let mut data = chunk.to_vec();
        loop {
            match stream.write(&data) {
                Ok(Some(event)) if !event.remainder.is_empty() => data = event.remainder,
                Ok(_) => break,
                Err(e) => {
                    warn!("Skipping rest of chunk {}: {}", i, e);
                    failed_chunks += 1;
                    break;
                }
            }
        }
    }

    let stats = stream.stats();
    stream.destroy();
    drop(stream);

    let detected = reporter.await.context("Event reporter task failed")?;
    info!(
        "Processed {} frames, {} keywords detected, {} chunks failed",
        stats.frames_processed, detected, failed_chunks
    );

    Ok(())
}
