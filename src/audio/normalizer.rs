//! Audio Normalizer
//!
//! Transcodes arbitrary input audio to canonical 16 kHz / mono / 16-bit PCM WAV
//! using an external transcoder (ffmpeg).

use async_trait::async_trait;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;

use crate::error::{GatewayError, GatewayResult};
use crate::session::constants::{BIT_DEPTH, CHANNELS, SAMPLE_RATE};

/// Suffix appended to the input path to name the normalized file
pub const NORMALIZED_SUFFIX: &str = ".16k.wav";

/// Longest stderr excerpt kept in a transcode error
const STDERR_TAIL: usize = 400;

/// An audio file on disk and its PCM parameters
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioAsset {
    pub path: PathBuf,
    pub sample_rate: u32,
    pub channels: u16,
    pub bit_depth: u16,
}

impl AudioAsset {
    /// Read the WAV header at `path`
    pub fn inspect(path: &Path) -> GatewayResult<Self> {
        let reader = hound::WavReader::open(path).map_err(|e| {
            GatewayError::Transcode(format!("cannot read WAV {}: {}", path.display(), e))
        })?;
        let spec = reader.spec();
        let bit_depth = match spec.sample_format {
            hound::SampleFormat::Int => spec.bits_per_sample,
            // Float PCM never counts as canonical
            hound::SampleFormat::Float => 0,
        };
        Ok(Self {
            path: path.to_path_buf(),
            sample_rate: spec.sample_rate,
            channels: spec.channels,
            bit_depth,
        })
    }

    /// 16 kHz, mono, 16-bit integer PCM
    pub fn is_canonical(&self) -> bool {
        self.sample_rate == SAMPLE_RATE && self.channels == CHANNELS && self.bit_depth == BIT_DEPTH
    }

    /// Raw little-endian PCM samples with the WAV header stripped
    pub fn read_pcm(&self) -> GatewayResult<Vec<u8>> {
        let mut reader = hound::WavReader::open(&self.path).map_err(|e| {
            GatewayError::Transcode(format!("cannot read WAV {}: {}", self.path.display(), e))
        })?;
        let mut pcm = Vec::with_capacity(reader.len() as usize * 2);
        for sample in reader.samples::<i16>() {
            let sample = sample
                .map_err(|e| GatewayError::Transcode(format!("corrupt PCM data: {}", e)))?;
            pcm.extend_from_slice(&sample.to_le_bytes());
        }
        Ok(pcm)
    }
}

/// Output path for a normalized copy of `input`
pub fn normalized_path(input: &Path) -> PathBuf {
    let mut name = OsString::from(input.as_os_str());
    name.push(NORMALIZED_SUFFIX);
    PathBuf::from(name)
}

/// Produces a canonical asset from an arbitrary input file
#[async_trait]
pub trait Normalize: Send + Sync {
    /// Write a canonical copy of `input` and describe it. Never touches `input`.
    async fn normalize(&self, input: &Path) -> GatewayResult<AudioAsset>;
}

/// ffmpeg-backed normalizer
#[derive(Debug, Clone)]
pub struct AudioNormalizer {
    program: PathBuf,
}

impl AudioNormalizer {
    /// Create a normalizer invoking `program`
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    /// Fixed transcoder arguments for `input` -> `output`
    fn args(input: &Path, output: &Path) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec!["-y".into(), "-i".into(), input.into()];
        args.extend(
            [
                "-ar",
                "16000",
                "-ac",
                "1",
                "-acodec",
                "pcm_s16le",
                "-f",
                "wav",
            ]
            .into_iter()
            .map(OsString::from),
        );
        args.push(output.into());
        args
    }
}

impl Default for AudioNormalizer {
    fn default() -> Self {
        Self::new("ffmpeg")
    }
}

#[async_trait]
impl Normalize for AudioNormalizer {
    async fn normalize(&self, input: &Path) -> GatewayResult<AudioAsset> {
        if !tokio::fs::try_exists(input).await.unwrap_or(false) {
            return Err(GatewayError::Transcode(format!(
                "input not found: {}",
                input.display()
            )));
        }

        let output = normalized_path(input);
        tracing::debug!(
            "Normalizing {} -> {} with {}",
            input.display(),
            output.display(),
            self.program.display()
        );

        let result = Command::new(&self.program)
            .args(Self::args(input, &output))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| {
                GatewayError::Transcode(format!(
                    "failed to run {}: {}",
                    self.program.display(),
                    e
                ))
            })?;

        if !result.status.success() {
            let stderr = String::from_utf8_lossy(&result.stderr);
            return Err(GatewayError::Transcode(format!(
                "{} exited with {}: {}",
                self.program.display(),
                result.status,
                tail(stderr.trim(), STDERR_TAIL)
            )));
        }

        let inspect_path = output.clone();
        let asset = tokio::task::spawn_blocking(move || AudioAsset::inspect(&inspect_path))
            .await
            .map_err(|e| GatewayError::Transcode(format!("inspect task failed: {}", e)))??;

        if !asset.is_canonical() {
            return Err(GatewayError::Transcode(format!(
                "{} produced {} Hz / {} ch / {} bit, expected {} Hz / {} ch / {} bit",
                output.display(),
                asset.sample_rate,
                asset.channels,
                asset.bit_depth,
                SAMPLE_RATE,
                CHANNELS,
                BIT_DEPTH
            )));
        }

        tracing::debug!("Normalized audio written to {}", asset.path.display());
        Ok(asset)
    }
}

/// Last `max` bytes of `s`, cut on a char boundary
fn tail(s: &str, max: usize) -> &str {
    if s.len() <= max {
        return s;
    }
    let mut start = s.len() - max;
    while !s.is_char_boundary(start) {
        start += 1;
    }
    &s[start..]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_wav(path: &Path, sample_rate: u32, channels: u16, samples: &[i16]) {
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

    #[test]
    fn test_normalized_path_appends_suffix() {
        let path = normalized_path(Path::new("/tmp/upload-1.mp3"));
        assert_eq!(path, PathBuf::from("/tmp/upload-1.mp3.16k.wav"));
    }

    #[test]
    fn test_args_shape() {
        let args = AudioNormalizer::args(Path::new("in.mp3"), Path::new("in.mp3.16k.wav"));
        let args: Vec<String> = args
            .into_iter()
            .map(|a| a.to_string_lossy().into_owned())
            .collect();
        assert_eq!(
            args,
            vec![
                "-y", "-i", "in.mp3", "-ar", "16000", "-ac", "1", "-acodec", "pcm_s16le", "-f",
                "wav", "in.mp3.16k.wav"
            ]
        );
    }

    #[test]
    fn test_inspect_and_read_pcm() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("canonical.wav");
        write_wav(&path, 16000, 1, &[1, -2, 300]);

        let asset = AudioAsset::inspect(&path).unwrap();
        assert!(asset.is_canonical());
        assert_eq!(
            asset.read_pcm().unwrap(),
            vec![0x01, 0x00, 0xFE, 0xFF, 0x2C, 0x01]
        );
    }

    #[test]
    fn test_stereo_is_not_canonical() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stereo.wav");
        write_wav(&path, 44100, 2, &[0, 0, 0, 0]);

        let asset = AudioAsset::inspect(&path).unwrap();
        assert!(!asset.is_canonical());
        assert_eq!(asset.sample_rate, 44100);
        assert_eq!(asset.channels, 2);
    }

    #[test]
    fn test_inspect_rejects_non_wav() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("garbage.wav");
        std::fs::write(&path, b"not a wav file").unwrap();
        assert!(matches!(
            AudioAsset::inspect(&path),
            Err(GatewayError::Transcode(_))
        ));
    }

    #[test]
    fn test_tail_respects_char_boundaries() {
        assert_eq!(tail("abc", 10), "abc");
        assert_eq!(tail("abcdef", 3), "def");
        assert_eq!(tail("错误信息", 4), "息");
    }

    #[tokio::test]
    async fn test_missing_input() {
        let normalizer = AudioNormalizer::default();
        let err = normalizer
            .normalize(Path::new("/nonexistent/upload.mp3"))
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::Transcode(_)));
    }

    #[tokio::test]
    async fn test_missing_program() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("input.wav");
        write_wav(&input, 16000, 1, &[0; 16]);

        let normalizer = AudioNormalizer::new(dir.path().join("no-such-transcoder"));
        let err = normalizer.normalize(&input).await.unwrap_err();
        assert!(matches!(err, GatewayError::Transcode(_)));
        assert!(input.exists());
    }
}
