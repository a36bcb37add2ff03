use std::path::Path;

use anyhow::Result;
use tokio::select;
use tokio::sync::mpsc::{Receiver, Sender};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument, warn};

use crate::error::AssetError;
use crate::events::{AssetEvent, EntryId, LoadAsset};

/// Read just enough of an image to learn its dimensions.
pub fn probe_dimensions(path: &Path) -> Result<(u32, u32), AssetError> {
    if !path.is_file() {
        return Err(AssetError::Missing(path.to_path_buf()));
    }
    image::ImageReader::open(path)?
        .with_guessed_format()?
        .into_dimensions()
        .map_err(|err| AssetError::Undecodable {
            path: path.to_path_buf(),
            reason: err.to_string(),
        })
}

/// Probes photo assets off the stream's thread and reports each outcome.
///
/// - At most `max_in_flight` probes run at once; further requests wait in the channel.
/// - Outcomes are delivered in completion order, not request order.
/// - Exits on cancellation, or once the request channel closed and every probe finished.
#[instrument(skip(load_rx, to_stream, cancel))]
pub async fn run(
    mut load_rx: Receiver<LoadAsset>,
    to_stream: Sender<AssetEvent>,
    cancel: CancellationToken,
    max_in_flight: usize,
) -> Result<()> {
    let mut tasks: JoinSet<(EntryId, Result<(u32, u32), AssetError>)> = JoinSet::new();
    let mut requests_open = true;

    loop {
        if !requests_open && tasks.is_empty() {
            debug!("request channel closed and probes drained; loader exiting");
            break;
        }

        select! {
            _ = cancel.cancelled() => break,

            maybe_req = load_rx.recv(), if requests_open && tasks.len() < max_in_flight => {
                match maybe_req {
                    Some(LoadAsset { id, path }) => {
                        tasks.spawn(async move {
                            let probe_path = path.clone();
                            let outcome = tokio::task::spawn_blocking(move || probe_dimensions(&probe_path))
                                .await
                                .unwrap_or_else(|err| Err(AssetError::Undecodable {
                                    path,
                                    reason: err.to_string(),
                                }));
                            (id, outcome)
                        });
                    }
                    None => requests_open = false,
                }
            }

            Some(joined) = tasks.join_next() => {
                let event = match joined {
                    Ok((id, Ok((width, height)))) => {
                        debug!(%id, width, height, "asset probed");
                        AssetEvent::Loaded { id, width, height }
                    }
                    Ok((id, Err(error))) => AssetEvent::Failed { id, error },
                    Err(err) => {
                        warn!("probe task failed: {err}");
                        continue;
                    }
                };
                if to_stream.send(event).await.is_err() {
                    warn!("stream channel closed");
                    break;
                }
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_is_reported_as_missing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gone.jpg");
        assert!(matches!(probe_dimensions(&path), Err(AssetError::Missing(p)) if p == path));
    }

    #[test]
    fn garbage_is_undecodable() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.png");
        std::fs::write(&path, b"definitely not an image").unwrap();
        assert!(matches!(
            probe_dimensions(&path),
            Err(AssetError::Undecodable { .. })
        ));
    }

    #[test]
    fn png_dimensions_are_read() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tiny.png");
        image::RgbaImage::new(3, 2).save(&path).unwrap();
        assert_eq!(probe_dimensions(&path).unwrap(), (3, 2));
    }
}
