//! Audio normalization module

mod normalizer;

pub use normalizer::{normalized_path, AudioAsset, AudioNormalizer, Normalize, NORMALIZED_SUFFIX};
