pub mod catalog;
pub mod config;
pub mod error;
pub mod events;
pub mod lightbox;
pub mod metadata;
pub mod scan;
pub mod stream;
pub mod surface;
pub mod timer;
pub mod widgets;
pub mod tasks {
    pub mod anniversary;
    pub mod loader;
    pub mod stream;
}
