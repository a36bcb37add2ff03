//! Boundary to the external renderer that draws the spiral animation.
//!
//! The stream never inspects what a [`VisualHandle`] refers to; it only asks
//! the surface to attach, detach, or hide it.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

use serde::Serialize;
use tracing::{debug, info};

/// Opaque token for one renderable element owned by the surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct VisualHandle(u64);

impl VisualHandle {
    pub(crate) fn new(raw: u64) -> Self {
        Self(raw)
    }
}

/// Keyframe timing applied by the surface to one element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AnimationTiming {
    #[serde(with = "humantime_serde")]
    pub delay: Duration,
    #[serde(with = "humantime_serde")]
    pub duration: Duration,
}

/// Everything the surface needs to draw one photo.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhotoVisual {
    /// Resolved location of the image, `None` when the catalog is empty.
    pub source: Option<PathBuf>,
    /// Alternate text, `Photo <n>` with a one-based sequence number.
    pub alt: String,
    pub timing: AnimationTiming,
}

pub trait RenderSurface {
    /// Whether the named container exists and can receive photos.
    fn has_container(&self, container: &str) -> bool;

    fn attach(&mut self, handle: VisualHandle, container: &str, visual: &PhotoVisual);

    /// Remove the element. Safe to call for handles that are not attached.
    fn detach(&mut self, handle: VisualHandle);

    /// Hide the element without removing it, e.g. after a failed image load.
    fn suppress(&mut self, handle: VisualHandle);
}

/// One call received by a [`RecordingSurface`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SurfaceCall {
    Attach {
        handle: VisualHandle,
        container: String,
        visual: PhotoVisual,
    },
    Detach(VisualHandle),
    Suppress(VisualHandle),
}

/// In-memory surface that keeps every call and the currently attached set.
#[derive(Debug, Clone, Default)]
pub struct RecordingSurface {
    containers: Vec<String>,
    attached: BTreeMap<VisualHandle, PhotoVisual>,
    suppressed: Vec<VisualHandle>,
    calls: Vec<SurfaceCall>,
}

impl RecordingSurface {
    pub fn with_container(container: impl Into<String>) -> Self {
        Self {
            containers: vec![container.into()],
            ..Self::default()
        }
    }

    pub fn attached(&self) -> &BTreeMap<VisualHandle, PhotoVisual> {
        &self.attached
    }

    pub fn is_attached(&self, handle: VisualHandle) -> bool {
        self.attached.contains_key(&handle)
    }

    pub fn is_suppressed(&self, handle: VisualHandle) -> bool {
        self.suppressed.contains(&handle)
    }

    pub fn calls(&self) -> &[SurfaceCall] {
        &self.calls
    }

    pub fn detach_count(&self, handle: VisualHandle) -> usize {
        self.calls
            .iter()
            .filter(|call| matches!(call, SurfaceCall::Detach(h) if *h == handle))
            .count()
    }
}

impl RenderSurface for RecordingSurface {
    fn has_container(&self, container: &str) -> bool {
        self.containers.iter().any(|c| c == container)
    }

    fn attach(&mut self, handle: VisualHandle, container: &str, visual: &PhotoVisual) {
        self.attached.insert(handle, visual.clone());
        self.calls.push(SurfaceCall::Attach {
            handle,
            container: container.to_string(),
            visual: visual.clone(),
        });
    }

    fn detach(&mut self, handle: VisualHandle) {
        self.attached.remove(&handle);
        self.calls.push(SurfaceCall::Detach(handle));
    }

    fn suppress(&mut self, handle: VisualHandle) {
        if !self.suppressed.contains(&handle) {
            self.suppressed.push(handle);
        }
        self.calls.push(SurfaceCall::Suppress(handle));
    }
}

/// Headless surface for the binary: every call becomes a trace event.
#[derive(Debug, Clone)]
pub struct TracingSurface {
    container: String,
    attached: usize,
}

impl TracingSurface {
    pub fn new(container: impl Into<String>) -> Self {
        Self {
            container: container.into(),
            attached: 0,
        }
    }
}

impl RenderSurface for TracingSurface {
    fn has_container(&self, container: &str) -> bool {
        self.container == container
    }

    fn attach(&mut self, handle: VisualHandle, container: &str, visual: &PhotoVisual) {
        self.attached += 1;
        info!(
            handle = ?handle,
            container,
            alt = %visual.alt,
            source = ?visual.source,
            delay = ?visual.timing.delay,
            duration = ?visual.timing.duration,
            attached = self.attached,
            "photo attached"
        );
    }

    fn detach(&mut self, handle: VisualHandle) {
        self.attached = self.attached.saturating_sub(1);
        debug!(handle = ?handle, attached = self.attached, "photo detached");
    }

    fn suppress(&mut self, handle: VisualHandle) {
        debug!(handle = ?handle, "photo hidden");
    }
}
