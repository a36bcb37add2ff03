//! Modal overlay showing one photo full size with a random quote.

use rand::Rng;
use rand::rngs::StdRng;
use tracing::{debug, info};

use crate::error::QuoteSetError;
use crate::events::{Key, UserInput};

/// Non-empty list of non-blank quotes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuoteSet(Vec<String>);

impl QuoteSet {
    pub fn new(quotes: Vec<String>) -> Result<Self, QuoteSetError> {
        if quotes.is_empty() {
            return Err(QuoteSetError::Empty);
        }
        if let Some(index) = quotes.iter().position(|q| q.trim().is_empty()) {
            return Err(QuoteSetError::Blank(index));
        }
        Ok(Self(quotes))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, quote: &str) -> bool {
        self.0.iter().any(|q| q == quote)
    }

    /// Uniform draw.
    pub fn pick<R: Rng + ?Sized>(&self, rng: &mut R) -> &str {
        &self.0[rng.random_range(0..self.0.len())]
    }
}

/// Presentation of the overlay and of the ambient animation pause.
pub trait LightboxView {
    fn show(&mut self, image: &str, quote: &str);
    fn hide(&mut self);
    fn set_ambient_paused(&mut self, paused: bool);
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LightboxState {
    pub is_open: bool,
    pub current_image: Option<String>,
    pub current_quote: Option<String>,
}

/// Interactions the lightbox understands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LightboxTrigger {
    CloseButton,
    /// A click inside the overlay; `on_image` when it landed on the photo itself.
    OverlayClick { on_image: bool },
    Key(Key),
}

impl LightboxTrigger {
    pub fn from_input(input: &UserInput) -> Option<Self> {
        match input {
            UserInput::CloseClicked => Some(Self::CloseButton),
            UserInput::OverlayClicked { on_image } => Some(Self::OverlayClick {
                on_image: *on_image,
            }),
            UserInput::KeyPressed(key) => Some(Self::Key(key.clone())),
            _ => None,
        }
    }

    fn dismisses(&self) -> bool {
        match self {
            Self::CloseButton => true,
            Self::OverlayClick { on_image } => !on_image,
            Self::Key(key) => *key == Key::Escape,
        }
    }
}

pub struct Lightbox<V> {
    state: LightboxState,
    quotes: QuoteSet,
    view: V,
    rng: StdRng,
}

impl<V: LightboxView> Lightbox<V> {
    pub fn new(quotes: QuoteSet, view: V, rng: StdRng) -> Self {
        Self {
            state: LightboxState::default(),
            quotes,
            view,
            rng,
        }
    }

    /// Show `image` with a freshly drawn quote. Re-entrant while open.
    pub fn open(&mut self, image: &str) {
        let quote = self.quotes.pick(&mut self.rng).to_string();
        self.view.show(image, &quote);
        if !self.state.is_open {
            self.view.set_ambient_paused(true);
        }
        info!(image, quote = %quote, "lightbox opened");
        self.state = LightboxState {
            is_open: true,
            current_image: Some(image.to_string()),
            current_quote: Some(quote),
        };
    }

    pub fn close(&mut self) {
        if !self.state.is_open {
            return;
        }
        self.view.hide();
        self.view.set_ambient_paused(false);
        self.state.is_open = false;
        info!("lightbox closed; ambient animation resumed");
    }

    /// Apply a trigger. Returns `true` if it closed the lightbox.
    pub fn handle(&mut self, trigger: &LightboxTrigger) -> bool {
        if !self.state.is_open || !trigger.dismisses() {
            debug!(?trigger, open = self.state.is_open, "lightbox trigger ignored");
            return false;
        }
        self.close();
        true
    }

    pub fn state(&self) -> &LightboxState {
        &self.state
    }

    pub fn is_open(&self) -> bool {
        self.state.is_open
    }

    pub fn is_ambient_paused(&self) -> bool {
        self.state.is_open
    }

    pub fn quotes(&self) -> &QuoteSet {
        &self.quotes
    }

    pub fn view(&self) -> &V {
        &self.view
    }
}

/// Keeps what is on screen, for tests and dry runs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordingView {
    pub shown: Option<(String, String)>,
    pub ambient_paused: bool,
    pub show_count: usize,
    pub hide_count: usize,
}

impl LightboxView for RecordingView {
    fn show(&mut self, image: &str, quote: &str) {
        self.shown = Some((image.to_string(), quote.to_string()));
        self.show_count += 1;
    }

    fn hide(&mut self) {
        self.shown = None;
        self.hide_count += 1;
    }

    fn set_ambient_paused(&mut self, paused: bool) {
        self.ambient_paused = paused;
    }
}

/// Headless view for the binary.
#[derive(Debug, Clone, Default)]
pub struct TracingView;

impl LightboxView for TracingView {
    fn show(&mut self, image: &str, quote: &str) {
        info!(image, quote, "overlay shown");
    }

    fn hide(&mut self) {
        debug!("overlay hidden");
    }

    fn set_ambient_paused(&mut self, paused: bool) {
        debug!(paused, "ambient animation pause");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    fn lightbox() -> Lightbox<RecordingView> {
        let quotes = QuoteSet::new(vec!["one".into(), "two".into(), "three".into()]).unwrap();
        Lightbox::new(quotes, RecordingView::default(), StdRng::seed_from_u64(3))
    }

    #[test]
    fn quote_set_rejects_empty_and_blank() {
        assert_eq!(QuoteSet::new(Vec::new()), Err(QuoteSetError::Empty));
        assert_eq!(
            QuoteSet::new(vec!["ok".into(), " ".into()]),
            Err(QuoteSetError::Blank(1))
        );
    }

    #[test]
    fn image_click_inside_overlay_keeps_it_open() {
        let mut lb = lightbox();
        lb.open("a.jpg");
        assert!(!lb.handle(&LightboxTrigger::OverlayClick { on_image: true }));
        assert!(lb.is_open());
        assert!(lb.handle(&LightboxTrigger::OverlayClick { on_image: false }));
        assert!(!lb.is_open());
        assert!(!lb.view().ambient_paused);
    }

    #[test]
    fn triggers_are_ignored_while_closed() {
        let mut lb = lightbox();
        assert!(!lb.handle(&LightboxTrigger::Key(Key::Escape)));
        assert!(!lb.handle(&LightboxTrigger::CloseButton));
        assert_eq!(lb.view().hide_count, 0);
    }

    #[test]
    fn other_keys_do_not_close() {
        let mut lb = lightbox();
        lb.open("a.jpg");
        assert!(!lb.handle(&LightboxTrigger::Key(Key::Other("Enter".into()))));
        assert!(lb.handle(&LightboxTrigger::Key(Key::Escape)));
    }
}
