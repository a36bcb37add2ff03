//! Continuous photo stream: staggered creation, self-scheduled removal, and
//! an indefinite refill cadence.
//!
//! Rules:
//! - `start` creates the initial batch with delays `0, stagger, 2*stagger, …`
//!   and arms one repeating timer that spawns a fresh entry every `stagger`.
//! - Every entry arms its own one-shot removal at `spawned_at + delay + duration`.
//! - The catalog is walked cyclically by sequence number; it is never reshuffled.
//! - `stop` cancels the refill cadence only. Live entries drain on their own.
//! - A failed image load hides the entry but leaves its removal untouched.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

use tracing::{debug, info, trace, warn};

use crate::catalog::Catalog;
use crate::config::StreamOptions;
use crate::error::{AssetError, StreamError};
use crate::events::{EntryId, StreamEvent};
use crate::surface::{AnimationTiming, PhotoVisual, RenderSurface, VisualHandle};
use crate::timer::{TimerHandle, TimerQueue};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StreamTimer {
    Spawn,
    Removal(EntryId),
}

/// One in-flight photo.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamEntry {
    pub id: EntryId,
    /// Index into the catalog, `None` when the catalog is empty.
    pub photo_ref: Option<usize>,
    pub photo: Option<String>,
    pub source: Option<PathBuf>,
    pub delay: Duration,
    pub duration: Duration,
    pub spawned_at: Duration,
    pub visual: VisualHandle,
    pub suppressed: bool,
    removal_timer: TimerHandle,
}

impl StreamEntry {
    pub fn removal_at(&self) -> Duration {
        self.spawned_at
            .saturating_add(self.delay)
            .saturating_add(self.duration)
    }
}

pub struct PhotoStream<S> {
    catalog: Catalog,
    options: StreamOptions,
    surface: S,
    timers: TimerQueue<StreamTimer>,
    live: BTreeMap<EntryId, StreamEntry>,
    next_sequence: u64,
    spawn_timer: Option<TimerHandle>,
    now: Duration,
    events: Vec<StreamEvent>,
}

impl<S: RenderSurface> PhotoStream<S> {
    pub fn new(catalog: Catalog, options: StreamOptions, surface: S) -> Self {
        Self {
            catalog,
            options,
            surface,
            timers: TimerQueue::new(),
            live: BTreeMap::new(),
            next_sequence: 0,
            spawn_timer: None,
            now: Duration::ZERO,
            events: Vec::new(),
        }
    }

    /// Create the initial batch and arm the refill cadence.
    ///
    /// # Errors
    /// Returns [`StreamError::MissingMountPoint`] when the configured container
    /// is absent; nothing is spawned or armed in that case.
    pub fn start(&mut self, now: Duration) -> Result<(), StreamError> {
        if !self.surface.has_container(&self.options.container) {
            return Err(StreamError::MissingMountPoint(
                self.options.container.clone(),
            ));
        }
        if self.spawn_timer.is_some() {
            warn!("photo stream already running; ignoring start");
            return Ok(());
        }
        let first_tick = self.check_timing(now)?;
        self.now = self.now.max(now);
        if self.catalog.is_empty() {
            warn!("photo catalog is empty; entries will stay hidden");
        }

        let stagger = self.options.stagger_delay;
        let mut delay = Duration::ZERO;
        for _ in 0..self.options.initial_count {
            self.spawn(delay, now);
            delay = delay.saturating_add(stagger);
        }
        self.spawn_timer = Some(self.timers.every(first_tick, stagger, StreamTimer::Spawn));
        info!(
            photos = self.catalog.len(),
            initial = self.options.initial_count,
            stagger = ?stagger,
            duration = ?self.options.animation_duration,
            steady_state = self.options.steady_state_population(),
            "photo stream started"
        );
        Ok(())
    }

    /// Reject timings the scheduler cannot honour and return the first refill tick.
    fn check_timing(&self, now: Duration) -> Result<Duration, StreamError> {
        let StreamOptions {
            initial_count,
            animation_duration,
            stagger_delay,
            ..
        } = self.options;
        if stagger_delay.is_zero() {
            return Err(StreamError::ZeroStagger);
        }
        if animation_duration.is_zero() {
            return Err(StreamError::ZeroDuration);
        }
        let last_delay = u32::try_from(initial_count.saturating_sub(1))
            .ok()
            .and_then(|n| stagger_delay.checked_mul(n));
        let last_removal = last_delay
            .and_then(|delay| now.checked_add(delay))
            .and_then(|at| at.checked_add(animation_duration));
        match (last_removal, now.checked_add(stagger_delay)) {
            (Some(_), Some(first_tick)) => Ok(first_tick),
            _ => Err(StreamError::ScheduleOverflow {
                count: initial_count,
                stagger: stagger_delay,
            }),
        }
    }

    /// Create one entry whose animation begins `delay` after `now`.
    pub fn spawn(&mut self, delay: Duration, now: Duration) -> &StreamEntry {
        self.now = self.now.max(now);
        let sequence = self.next_sequence;
        self.next_sequence += 1;
        let id = EntryId(sequence);

        let (photo_ref, photo) = match self.catalog.photo_for(sequence) {
            Some((index, name)) => (Some(index), Some(name.to_string())),
            None => (None, None),
        };
        let source = photo
            .as_deref()
            .map(|name| self.options.photos_folder.join(name));
        let duration = self.options.animation_duration;
        let visual = VisualHandle::new(sequence);

        self.surface.attach(
            visual,
            &self.options.container,
            &PhotoVisual {
                source: source.clone(),
                alt: format!("Photo {}", sequence + 1),
                timing: AnimationTiming { delay, duration },
            },
        );

        let removal_at = now.saturating_add(delay).saturating_add(duration);
        let removal_timer = self.timers.once(removal_at, StreamTimer::Removal(id));
        debug!(%id, photo = ?photo, delay = ?delay, removal_at = ?removal_at, "entry spawned");
        self.events.push(StreamEvent::Spawned {
            id,
            at: now,
            photo: photo.clone(),
            source: source.clone(),
            delay,
            removal_at,
        });

        let mut entry = StreamEntry {
            id,
            photo_ref,
            photo,
            source,
            delay,
            duration,
            spawned_at: now,
            visual,
            suppressed: false,
            removal_timer,
        };
        if entry.source.is_none() {
            entry.suppressed = true;
            self.surface.suppress(visual);
            self.events.push(StreamEvent::Suppressed { id, at: now });
        }

        self.live.entry(id).or_insert(entry)
    }

    /// Retire an entry. Removing one that is already gone is a silent no-op.
    pub fn remove(&mut self, id: EntryId) -> bool {
        let Some(entry) = self.live.remove(&id) else {
            trace!(%id, "entry already removed");
            return false;
        };
        // Early removal leaves a pending timer behind; a fired one is already gone.
        self.timers.cancel(entry.removal_timer);
        self.surface.detach(entry.visual);
        debug!(%id, at = ?self.now, live = self.live.len(), "entry removed");
        self.events.push(StreamEvent::Removed { id, at: self.now });
        true
    }

    /// Cancel future spawns. Entries already on screen finish their course.
    pub fn stop(&mut self) {
        if let Some(handle) = self.spawn_timer.take() {
            self.timers.cancel(handle);
            info!(live = self.live.len(), "photo stream stopped; draining");
            self.events.push(StreamEvent::Stopped { at: self.now });
        }
    }

    /// Fire every timer due at or before `now`, each at its own deadline.
    pub fn advance(&mut self, now: Duration) {
        while let Some(fired) = self.timers.pop_due(now) {
            self.now = self.now.max(fired.at);
            match fired.event {
                StreamTimer::Spawn => {
                    self.spawn(Duration::ZERO, fired.at);
                }
                StreamTimer::Removal(id) => {
                    self.remove(id);
                }
            }
        }
        self.now = self.now.max(now);
    }

    pub fn asset_loaded(&mut self, id: EntryId) {
        if self.live.contains_key(&id) {
            trace!(%id, "photo loaded");
        }
    }

    /// Hide a photo whose asset failed to load. Its removal stays on schedule.
    pub fn asset_failed(&mut self, id: EntryId, error: &AssetError) {
        let Some(entry) = self.live.get_mut(&id) else {
            debug!(%id, %error, "load failure for a retired entry ignored");
            return;
        };
        warn!(%id, %error, "photo failed to load; hiding it");
        if !entry.suppressed {
            entry.suppressed = true;
            self.surface.suppress(entry.visual);
            self.events.push(StreamEvent::Suppressed { id, at: self.now });
        }
    }

    pub fn next_deadline(&self) -> Option<Duration> {
        self.timers.next_deadline()
    }

    pub fn is_running(&self) -> bool {
        self.spawn_timer.is_some()
    }

    pub fn entry(&self, id: EntryId) -> Option<&StreamEntry> {
        self.live.get(&id)
    }

    /// Live entries in spawn order.
    pub fn live_entries(&self) -> impl Iterator<Item = &StreamEntry> {
        self.live.values()
    }

    pub fn live_count(&self) -> usize {
        self.live.len()
    }

    /// Number of entries ever spawned.
    pub fn spawned_count(&self) -> u64 {
        self.next_sequence
    }

    pub fn now(&self) -> Duration {
        self.now
    }

    pub fn options(&self) -> &StreamOptions {
        &self.options
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    pub fn drain_events(&mut self) -> Vec<StreamEvent> {
        std::mem::take(&mut self.events)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::RecordingSurface;

    fn secs(s: u64) -> Duration {
        Duration::from_secs(s)
    }

    fn options(initial: usize) -> StreamOptions {
        StreamOptions {
            container: "stream".into(),
            photos_folder: PathBuf::from("pictures"),
            initial_count: initial,
            animation_duration: secs(10),
            stagger_delay: secs(2),
        }
    }

    fn stream(initial: usize) -> PhotoStream<RecordingSurface> {
        let catalog = Catalog::unshuffled(vec!["a".into(), "b".into(), "c".into()]);
        PhotoStream::new(catalog, options(initial), RecordingSurface::with_container("stream"))
    }

    #[test]
    fn initial_batch_is_staggered() {
        let mut s = stream(3);
        s.start(Duration::ZERO).unwrap();
        let delays: Vec<_> = s.live_entries().map(|e| e.delay).collect();
        assert_eq!(delays, vec![secs(0), secs(2), secs(4)]);
        let removals: Vec<_> = s.live_entries().map(|e| e.removal_at()).collect();
        assert_eq!(removals, vec![secs(10), secs(12), secs(14)]);
        assert_eq!(s.next_deadline(), Some(secs(2)));
    }

    #[test]
    fn spawn_resolves_source_against_folder() {
        let mut s = stream(0);
        let entry = s.spawn(Duration::ZERO, Duration::ZERO).clone();
        assert_eq!(entry.source, Some(PathBuf::from("pictures/a")));
        assert_eq!(entry.photo_ref, Some(0));
        let visual = &s.surface().attached()[&entry.visual];
        assert_eq!(visual.alt, "Photo 1");
        assert_eq!(visual.timing.duration, secs(10));
    }

    #[test]
    fn early_removal_cancels_the_pending_timer() {
        let mut s = stream(0);
        let id = s.spawn(Duration::ZERO, Duration::ZERO).id;
        assert!(s.remove(id));
        assert_eq!(s.next_deadline(), None);
        assert!(!s.remove(id));
    }

    #[test]
    fn empty_catalog_still_times_entries() {
        let mut s = PhotoStream::new(
            Catalog::unshuffled(Vec::new()),
            options(1),
            RecordingSurface::with_container("stream"),
        );
        s.start(Duration::ZERO).unwrap();
        let entry = s.live_entries().next().unwrap().clone();
        assert!(entry.suppressed);
        assert!(s.surface().is_suppressed(entry.visual));
        s.advance(secs(10));
        assert!(s.entry(entry.id).is_none());
    }

    #[test]
    fn zero_stagger_is_refused_before_spawning() {
        let mut opts = options(3);
        opts.stagger_delay = Duration::ZERO;
        let mut s = PhotoStream::new(
            Catalog::unshuffled(vec!["a".into()]),
            opts,
            RecordingSurface::with_container("stream"),
        );
        assert_eq!(s.start(Duration::ZERO), Err(StreamError::ZeroStagger));
        assert_eq!(s.spawned_count(), 0);
        assert_eq!(s.next_deadline(), None);
        assert!(!s.is_running());
    }

    #[test]
    fn oversized_timings_are_refused() {
        let mut opts = options(3);
        opts.stagger_delay = Duration::MAX;
        let mut s = PhotoStream::new(
            Catalog::unshuffled(vec!["a".into()]),
            opts,
            RecordingSurface::with_container("stream"),
        );
        assert!(matches!(
            s.start(Duration::ZERO),
            Err(StreamError::ScheduleOverflow { count: 3, .. })
        ));
        assert_eq!(s.spawned_count(), 0);

        let mut opts = options(1);
        opts.animation_duration = Duration::MAX;
        let mut s = PhotoStream::new(
            Catalog::unshuffled(vec!["a".into()]),
            opts,
            RecordingSurface::with_container("stream"),
        );
        s.start(secs(1)).unwrap_err();
    }

    #[test]
    fn spawn_far_in_the_future_saturates_instead_of_panicking() {
        let mut s = stream(0);
        let entry = s.spawn(Duration::MAX, secs(5)).clone();
        assert_eq!(entry.removal_at(), Duration::MAX);
        assert_eq!(s.next_deadline(), Some(Duration::MAX));
    }

    #[test]
    fn second_start_is_ignored() {
        let mut s = stream(2);
        s.start(Duration::ZERO).unwrap();
        s.start(Duration::ZERO).unwrap();
        assert_eq!(s.spawned_count(), 2);
    }
}
