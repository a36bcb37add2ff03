use std::time::Duration;

use anyhow::{Context, Result};
use tokio::select;
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::mpsc::{Receiver, Sender};
use tokio::time::{Instant, sleep_until};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use crate::catalog::Catalog;
use crate::config::StreamOptions;
use crate::events::{AssetEvent, LoadAsset, StreamEvent, UserInput};
use crate::lightbox::{Lightbox, LightboxTrigger, LightboxView};
use crate::stream::PhotoStream;
use crate::surface::{RecordingSurface, RenderSurface};
use crate::widgets::music::{AudioSink, MusicPlayer};

/// Everything the stream task owns. Returned when the task ends so callers
/// can inspect the final state.
pub struct StreamRuntime<S, V, A> {
    pub stream: PhotoStream<S>,
    pub lightbox: Lightbox<V>,
    pub music: Option<MusicPlayer<A>>,
}

impl<S, V, A> StreamRuntime<S, V, A>
where
    S: RenderSurface,
    V: LightboxView,
    A: AudioSink,
{
    pub fn new(stream: PhotoStream<S>, lightbox: Lightbox<V>, music: Option<MusicPlayer<A>>) -> Self {
        Self {
            stream,
            lightbox,
            music,
        }
    }

    /// Interpret one user interaction.
    pub fn apply(&mut self, input: UserInput) {
        match input {
            UserInput::PhotoClicked(id) => {
                // Hidden photos cannot be clicked; their source is known to be bad.
                match self
                    .stream
                    .entry(id)
                    .filter(|entry| !entry.suppressed)
                    .and_then(|entry| entry.source.as_ref())
                {
                    Some(source) => {
                        let image = source.to_string_lossy().into_owned();
                        self.lightbox.open(&image);
                    }
                    None => debug!(%id, "click on a photo that is not visible"),
                }
            }
            UserInput::ToggleMusic => match self.music.as_mut() {
                Some(music) => {
                    music.toggle();
                }
                None => debug!("music toggle ignored; no track configured"),
            },
            UserInput::StopStream => self.stream.stop(),
            other => match LightboxTrigger::from_input(&other) {
                Some(trigger) => {
                    self.lightbox.handle(&trigger);
                }
                None => debug!(input = ?other, "input ignored"),
            },
        }
    }

    pub fn apply_asset(&mut self, event: AssetEvent) {
        match event {
            AssetEvent::Loaded { id, .. } => self.stream.asset_loaded(id),
            AssetEvent::Failed { id, error } => self.stream.asset_failed(id, &error),
        }
    }
}

/// Drives the stream against wall time.
///
/// Rules:
/// - Stream time zero is the moment the task starts.
/// - Sleeps until the scheduler's next deadline, user input, or an asset outcome,
///   whichever comes first, and handles them one at a time.
/// - Newly spawned photos are handed to the loader without waiting; a full
///   loader queue skips the probe rather than stalling the stream.
/// - A missing mount point fails the task before anything is spawned.
#[instrument(skip_all, fields(container = %runtime.stream.options().container))]
pub async fn run<S, V, A>(
    mut runtime: StreamRuntime<S, V, A>,
    mut input_rx: Receiver<UserInput>,
    mut asset_rx: Receiver<AssetEvent>,
    to_loader: Sender<LoadAsset>,
    cancel: CancellationToken,
) -> Result<StreamRuntime<S, V, A>>
where
    S: RenderSurface,
    V: LightboxView,
    A: AudioSink,
{
    let epoch = Instant::now();
    runtime
        .stream
        .start(Duration::ZERO)
        .context("photo stream failed to start")?;
    let mut loader_open = forward_spawns(&mut runtime.stream, &to_loader, true);
    let mut inputs_open = true;
    let mut drained_logged = false;

    loop {
        let deadline = runtime.stream.next_deadline();
        select! {
            _ = cancel.cancelled() => break,

            _ = sleep_until(epoch + deadline.unwrap_or_default()), if deadline.is_some() => {
                runtime.stream.advance(epoch.elapsed());
            }

            maybe_input = input_rx.recv(), if inputs_open => {
                match maybe_input {
                    Some(input) => runtime.apply(input),
                    None => {
                        debug!("input channel closed");
                        inputs_open = false;
                    }
                }
            }

            Some(event) = asset_rx.recv() => runtime.apply_asset(event),
        }

        loader_open = forward_spawns(&mut runtime.stream, &to_loader, loader_open);

        if !runtime.stream.is_running() && runtime.stream.live_count() == 0 && !drained_logged {
            info!(spawned = runtime.stream.spawned_count(), "photo stream drained");
            drained_logged = true;
        }
    }

    Ok(runtime)
}

fn forward_spawns<S: RenderSurface>(
    stream: &mut PhotoStream<S>,
    to_loader: &Sender<LoadAsset>,
    mut loader_open: bool,
) -> bool {
    for event in stream.drain_events() {
        let StreamEvent::Spawned {
            id,
            source: Some(path),
            ..
        } = event
        else {
            continue;
        };
        if !loader_open {
            continue;
        }
        match to_loader.try_send(LoadAsset { id, path }) {
            Ok(()) => {}
            Err(TrySendError::Full(req)) => {
                debug!(id = %req.id, "loader busy; probe skipped");
            }
            Err(TrySendError::Closed(_)) => {
                warn!("loader channel closed; photos will no longer be probed");
                loader_open = false;
            }
        }
    }
    loader_open
}

/// Run the scheduler against virtual time and collect its events.
///
/// Timers fire in deadline order up to and including `horizon`. With
/// `stop_at`, the refill cadence is cancelled at that instant and the
/// remaining entries drain normally.
pub fn simulate_stream(
    catalog: Catalog,
    options: StreamOptions,
    horizon: Duration,
    stop_at: Option<Duration>,
) -> Result<Vec<StreamEvent>> {
    let surface = RecordingSurface::with_container(options.container.clone());
    let mut stream = PhotoStream::new(catalog, options, surface);
    stream
        .start(Duration::ZERO)
        .context("photo stream failed to start")?;

    let mut events = stream.drain_events();
    let mut pending_stop = stop_at.filter(|at| *at <= horizon);
    loop {
        let next = stream.next_deadline().filter(|d| *d <= horizon);
        match (next, pending_stop) {
            (_, Some(stop)) if next.is_none_or(|d| stop < d) => {
                stream.advance(stop);
                stream.stop();
                pending_stop = None;
            }
            (Some(deadline), _) => stream.advance(deadline),
            (None, _) => break,
        }
        events.extend(stream.drain_events());
    }
    Ok(events)
}
