//! TTS (Text To Speech) module

mod client;

pub use client::{AudioEncoding, TtsClient, VoiceOptions};
