//! Small decorations living next to the photo stream. None of them share
//! state with the stream or the lightbox.

pub mod anniversary;
pub mod hearts;
pub mod music;
