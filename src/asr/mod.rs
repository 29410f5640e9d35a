//! ASR (Automatic Speech Recognition) module
//!
//! Transcribes uploaded audio with the speech service's IAT mode.

mod client;

pub use client::{AsrClient, DEFAULT_LANGUAGE};
