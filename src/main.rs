use std::io::IsTerminal;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{ArgAction, Parser};
use rand::{SeedableRng, rngs::StdRng};
use spiral_photo_stream::catalog::Catalog;
use spiral_photo_stream::config::Configuration;
use spiral_photo_stream::events::{AssetEvent, EntryId, Key, LoadAsset, UserInput};
use spiral_photo_stream::lightbox::{Lightbox, QuoteSet, TracingView};
use spiral_photo_stream::metadata;
use spiral_photo_stream::scan;
use spiral_photo_stream::stream::PhotoStream;
use spiral_photo_stream::surface::TracingSurface;
use spiral_photo_stream::tasks;
use spiral_photo_stream::tasks::stream::StreamRuntime;
use spiral_photo_stream::widgets::anniversary::AnniversaryCounter;
use spiral_photo_stream::widgets::hearts;
use spiral_photo_stream::widgets::music::{MusicPlayer, TracingAudio};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::Level;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(
    name = "spiral-stream",
    version,
    about = "Headless spiral photo stream with lightbox"
)]
struct Args {
    /// Path to YAML config
    #[arg(value_name = "CONFIG")]
    config: PathBuf,
    /// Deterministic RNG seed for the catalog shuffle and quote draws
    #[arg(long, value_name = "SEED")]
    seed: Option<u64>,
    /// Keep the configured photo order
    #[arg(long)]
    no_shuffle: bool,
    /// Print the stream timeline as JSON lines for this long, without running live
    #[arg(long = "dry-run", value_name = "DURATION")]
    dry_run: Option<humantime::Duration>,
    /// Stop spawning new photos after this long and let the stream drain
    #[arg(long = "stop-after", value_name = "DURATION")]
    stop_after: Option<humantime::Duration>,
    /// Write photo capture timestamps (EXIF, else file time) as JSON and exit
    #[arg(long = "extract-metadata")]
    extract_metadata: bool,
    /// Output path for --extract-metadata [default: <photos-folder>/real_metadata.json]
    #[arg(long = "metadata-out", value_name = "PATH", requires = "extract_metadata")]
    metadata_out: Option<PathBuf>,
    /// Increase log verbosity (repeatable)
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count)]
    verbose: u8,
}

fn init_tracing(verbosity: u8) -> Result<()> {
    let level = match verbosity {
        0 => Level::INFO,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info"))
        .add_directive(
            format!("spiral_photo_stream={level}")
                .parse()
                .context("invalid log directive")?,
        );
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .with_writer(std::io::stderr)
        .init();
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.verbose)?;

    let cfg = Configuration::from_yaml_file(&args.config)
        .with_context(|| format!("failed to load configuration from {}", args.config.display()))?
        .validated()
        .context("invalid configuration values")?;
    tracing::debug!("Loaded configuration from {}:\n{:#?}", args.config.display(), cfg);

    let photo_files = if cfg.photo_files.is_empty() {
        scan::scan_photo_folder(&cfg.photos_folder)
            .with_context(|| format!("failed to scan {}", cfg.photos_folder.display()))?
    } else {
        cfg.photo_files.clone()
    };

    if args.extract_metadata {
        let out = args
            .metadata_out
            .clone()
            .unwrap_or_else(|| cfg.photos_folder.join(metadata::METADATA_FILE));
        let stamps = metadata::collect_timestamps(&cfg.photos_folder, &photo_files);
        metadata::write_timestamps(&out, &stamps)?;
        let summary = metadata::TimestampSummary::of(&stamps);
        tracing::info!(
            photos = photo_files.len(),
            timestamped = summary.total,
            exif = summary.exif,
            file_system = summary.file_system,
            earliest = ?summary.earliest,
            latest = ?summary.latest,
            span_days = ?summary.span_days(),
            out = %out.display(),
            "photo metadata written"
        );
        return Ok(());
    }

    let mut rng = match args.seed.or(cfg.shuffle_seed) {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };
    let catalog = if args.no_shuffle {
        Catalog::unshuffled(photo_files)
    } else {
        Catalog::shuffled(photo_files, &mut rng)
    };
    tracing::info!(photos = catalog.len(), "photo catalog ready");

    if let Some(horizon) = args.dry_run {
        let events = tasks::stream::simulate_stream(
            catalog,
            cfg.stream_options(),
            horizon.into(),
            args.stop_after.map(Into::into),
        )?;
        for event in events {
            println!("{}", serde_json::to_string(&event)?);
        }
        return Ok(());
    }

    let hearts = hearts::scatter(cfg.hearts.count, &cfg.hearts.emojis, &mut rng);
    if !hearts.is_empty() {
        tracing::info!(hearts = %hearts.concat(), "floating hearts");
    }

    let quotes = QuoteSet::new(cfg.lightbox.quotes_or_default())
        .context("invalid lightbox quotes")?;
    let lightbox = Lightbox::new(quotes, TracingView, StdRng::from_rng(&mut rng));
    let music = cfg.music.as_ref().map(|music_cfg| {
        let audio = TracingAudio::new(&music_cfg.path);
        let probe = audio.probe();
        let mut player = MusicPlayer::new(audio, music_cfg.volume);
        if let Err(err) = probe {
            player.disable(&err);
        }
        player
    });
    let stream = PhotoStream::new(
        catalog,
        cfg.stream_options(),
        TracingSurface::new(cfg.container.clone()),
    );
    let runtime = StreamRuntime::new(stream, lightbox, music);

    // Channels (small/bounded)
    let (input_tx, input_rx) = mpsc::channel::<UserInput>(16); // stdin/timers -> Stream
    let (to_load_tx, to_load_rx) = mpsc::channel::<LoadAsset>(64); // Stream -> Loader
    let (asset_tx, asset_rx) = mpsc::channel::<AssetEvent>(64); // Loader -> Stream

    let cancel = CancellationToken::new();

    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if let Err(err) = tokio::signal::ctrl_c().await {
                tracing::warn!("ctrl-c handler failed: {err}");
                return;
            }
            tracing::info!("ctrl-c received; initiating shutdown");
            cancel.cancel();
        });
    }

    // stdin commands; Ctrl-D on a terminal shuts down
    {
        let cancel = cancel.clone();
        let interactive = std::io::stdin().is_terminal();
        let input_tx = input_tx.clone();
        tokio::spawn(async move {
            let mut lines = BufReader::new(tokio::io::stdin()).lines();
            loop {
                let line = tokio::select! {
                    _ = cancel.cancelled() => break,
                    line = lines.next_line() => line,
                };
                match line {
                    Ok(Some(line)) => match parse_command(&line) {
                        Some(input) => {
                            if input_tx.send(input).await.is_err() {
                                break;
                            }
                        }
                        None => tracing::warn!(command = %line.trim(), "unknown command"),
                    },
                    Ok(None) if interactive => {
                        tracing::info!("stdin closed; initiating shutdown");
                        cancel.cancel();
                        break;
                    }
                    Ok(None) => {
                        tracing::debug!("stdin closed; no further commands");
                        break;
                    }
                    Err(err) => {
                        tracing::warn!("stdin watcher failed: {err}");
                        break;
                    }
                }
            }
        });
    }

    if let Some(after) = args.stop_after {
        let input_tx = input_tx.clone();
        let after: std::time::Duration = after.into();
        tokio::spawn(async move {
            tokio::time::sleep(after).await;
            let _ = input_tx.send(UserInput::StopStream).await;
        });
    }
    drop(input_tx);

    let mut tasks = JoinSet::new();

    tasks.spawn({
        let cancel = cancel.clone();
        let counter = AnniversaryCounter::new(cfg.anniversaries.clone());
        async move {
            let refreshes =
                tasks::anniversary::run(counter, tasks::anniversary::REFRESH_PERIOD, cancel)
                    .await
                    .context("anniversary task failed")?;
            tracing::debug!(refreshes, "anniversary task finished");
            Ok::<(), anyhow::Error>(())
        }
    });

    tasks.spawn({
        let cancel = cancel.clone();
        let max_in_flight = cfg.loader_max_concurrent_probes;
        async move {
            tasks::loader::run(to_load_rx, asset_tx, cancel, max_in_flight)
                .await
                .context("loader task failed")
        }
    });

    tasks.spawn({
        let cancel = cancel.clone();
        async move {
            let result = tasks::stream::run(runtime, input_rx, asset_rx, to_load_tx, cancel.clone())
                .await
                .context("stream task failed");
            // The stream is the heart of the program; nothing else is worth running without it.
            cancel.cancel();
            result.map(|_| ())
        }
    });

    // Drain JoinSet (wait for tasks to complete)
    while let Some(res) = tasks.join_next().await {
        match res {
            Ok(Ok(())) => {}
            Ok(Err(e)) => tracing::error!("task error: {e:?}"),
            Err(e) => tracing::error!("join error: {e}"),
        }
    }

    Ok(())
}

fn parse_command(line: &str) -> Option<UserInput> {
    let mut words = line.split_whitespace();
    let command = words.next()?;
    let input = match command {
        "click" => UserInput::PhotoClicked(EntryId(
            words.next()?.trim_start_matches('#').parse().ok()?,
        )),
        "close" => UserInput::CloseClicked,
        "overlay" => UserInput::OverlayClicked { on_image: false },
        "image" => UserInput::OverlayClicked { on_image: true },
        "esc" | "escape" => UserInput::KeyPressed(Key::Escape),
        "key" => UserInput::KeyPressed(Key::Other(words.next()?.to_string())),
        "music" => UserInput::ToggleMusic,
        "stop" => UserInput::StopStream,
        _ => return None,
    };
    Some(input)
}
