//! Cloud speech gateway client
//!
//! Signs and drives ASR (speech to text) and TTS (text to speech) sessions
//! against the remote speech service.

pub mod asr;
pub mod audio;
pub mod auth;
pub mod data;
pub mod error;
pub mod gateway;
pub mod session;
pub mod tts;

pub use asr::AsrClient;
pub use audio::{AudioAsset, AudioNormalizer, Normalize};
pub use auth::{AuthSigner, SignedRequestUrl};
pub use data::{Credentials, Endpoint, GatewayConfig};
pub use error::{AsrError, GatewayError, GatewayResult, TtsError};
pub use gateway::SpeechGateway;
pub use session::{Connector, FrameStream, StreamingSession, WsConnector};
pub use tts::{AudioEncoding, TtsClient, VoiceOptions};
