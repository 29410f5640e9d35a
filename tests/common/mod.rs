// Shared test doubles: a scripted upstream and a normalizer that needs no ffmpeg.

#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use care_speech_gateway::audio::normalized_path;
use care_speech_gateway::{
    AudioAsset, Connector, Credentials, FrameStream, GatewayConfig, GatewayError, GatewayResult,
    Normalize,
};

/// What the simulated upstream does next
#[derive(Debug, Clone)]
pub enum Reply {
    /// Deliver a text frame
    Frame(String),
    /// Never answer
    Stall,
}

pub fn frame(json: serde_json::Value) -> Reply {
    Reply::Frame(json.to_string())
}

/// Counters shared between a connector and the streams it opens
#[derive(Debug, Default)]
pub struct Stats {
    pub connects: AtomicUsize,
    pub closes: AtomicUsize,
    pub urls: Mutex<Vec<String>>,
    pub sent: Mutex<Vec<String>>,
}

impl Stats {
    pub fn connects(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }

    pub fn closes(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }

    pub fn sent(&self) -> Vec<String> {
        self.sent.lock().unwrap().clone()
    }

    pub fn sent_json(&self) -> Vec<serde_json::Value> {
        self.sent()
            .iter()
            .map(|s| serde_json::from_str(s).unwrap())
            .collect()
    }
}

/// Connector replaying the same script on every connection
pub struct ScriptedConnector {
    replies: Vec<Reply>,
    refuse: bool,
    pub stats: Arc<Stats>,
}

impl ScriptedConnector {
    pub fn new(replies: Vec<Reply>) -> Self {
        Self {
            replies,
            refuse: false,
            stats: Arc::new(Stats::default()),
        }
    }

    /// Every handshake fails
    pub fn refusing() -> Self {
        Self {
            replies: Vec::new(),
            refuse: true,
            stats: Arc::new(Stats::default()),
        }
    }
}

#[async_trait]
impl Connector for ScriptedConnector {
    async fn connect(&self, url: &str) -> GatewayResult<Box<dyn FrameStream>> {
        self.stats.connects.fetch_add(1, Ordering::SeqCst);
        self.stats.urls.lock().unwrap().push(url.to_string());
        if self.refuse {
            return Err(GatewayError::Connect("connection refused".to_string()));
        }
        Ok(Box::new(ScriptedStream {
            replies: self.replies.clone().into(),
            stats: self.stats.clone(),
        }))
    }
}

struct ScriptedStream {
    replies: VecDeque<Reply>,
    stats: Arc<Stats>,
}

#[async_trait]
impl FrameStream for ScriptedStream {
    async fn send_text(&mut self, text: String) -> GatewayResult<()> {
        self.stats.sent.lock().unwrap().push(text);
        Ok(())
    }

    async fn next_text(&mut self) -> Option<GatewayResult<String>> {
        match self.replies.pop_front()? {
            Reply::Frame(text) => Some(Ok(text)),
            Reply::Stall => std::future::pending().await,
        }
    }

    async fn close(&mut self) {
        self.stats.closes.fetch_add(1, Ordering::SeqCst);
    }
}

/// Writes a short canonical WAV next to the input, like the ffmpeg normalizer
#[derive(Default)]
pub struct FakeNormalizer {
    pub produced: Mutex<Vec<PathBuf>>,
}

#[async_trait]
impl Normalize for FakeNormalizer {
    async fn normalize(&self, input: &Path) -> GatewayResult<AudioAsset> {
        if !input.exists() {
            return Err(GatewayError::Transcode(format!(
                "input not found: {}",
                input.display()
            )));
        }
        let output = normalized_path(input);
        write_wav(&output, 16000, 1, &[0x0102, -1]);
        self.produced.lock().unwrap().push(output.clone());
        AudioAsset::inspect(&output)
    }
}

pub fn write_wav(path: &Path, sample_rate: u32, channels: u16, samples: &[i16]) {
    let spec = hound::WavSpec {
        channels,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(path, spec).unwrap();
    for s in samples {
        writer.write_sample(*s).unwrap();
    }
    writer.finalize().unwrap();
}

pub fn test_credentials() -> Credentials {
    Credentials::new("test-app", "test-key", "test-secret")
}

pub fn test_config() -> GatewayConfig {
    let mut config = GatewayConfig::default();
    config.credentials = test_credentials();
    config
}
