//! PCM-to-WAV container encoding.
//!
//! The speech API returns base64-encoded raw PCM samples. This module wraps
//! them into a canonical 44-byte-header WAV container for streaming and
//! download, and converts them into the sample pairs the playback buffer
//! carries.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use byteorder::{LittleEndian, WriteBytesExt};
use bytes::Bytes;
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::buffer::Sample;

/// Size of the canonical PCM WAV header
pub const HEADER_SIZE: usize = 44;

/// MIME type of the produced container
pub const WAV_MIME: &str = "audio/wav";

#[derive(Debug, Error)]
pub enum AudioError {
    #[error("invalid WAV parameter: {0}")]
    InvalidParameter(&'static str),

    #[error("PCM payload too large for a WAV container")]
    PayloadTooLarge,

    #[error("malformed base64 PCM payload: {0}")]
    Decode(#[from] base64::DecodeError),
}

/// PCM format parameters written into the WAV header
#[derive(Clone, Copy, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct WavParams {
    #[serde(default = "default_sample_rate")]
    pub sample_rate: u32,

    #[serde(default = "default_channels")]
    pub channels: u16,

    #[serde(default = "default_bit_depth")]
    pub bit_depth: u16,
}

fn default_sample_rate() -> u32 {
    24000
}

fn default_channels() -> u16 {
    1
}

fn default_bit_depth() -> u16 {
    16
}

impl Default for WavParams {
    fn default() -> Self {
        WavParams {
            sample_rate: default_sample_rate(),
            channels: default_channels(),
            bit_depth: default_bit_depth(),
        }
    }
}

impl WavParams {
    /// Bytes of audio consumed per second of playback
    pub fn byte_rate(&self) -> u32 {
        self.sample_rate * self.channels as u32 * self.bit_depth as u32 / 8
    }

    /// Bytes per sample across all channels
    pub fn block_align(&self) -> u16 {
        self.channels * self.bit_depth / 8
    }

    pub fn validate(&self) -> Result<(), AudioError> {
        if self.sample_rate == 0 {
            return Err(AudioError::InvalidParameter("sample_rate must be > 0"));
        }
        if self.channels == 0 {
            return Err(AudioError::InvalidParameter("channels must be >= 1"));
        }
        if !matches!(self.bit_depth, 8 | 16 | 24 | 32) {
            return Err(AudioError::InvalidParameter(
                "bit_depth must be one of 8, 16, 24, 32",
            ));
        }
        Ok(())
    }
}

/// Builds the canonical 44-byte WAV header for an integer PCM payload of
/// `payload_len` bytes.
pub fn build_header(payload_len: u32, params: &WavParams) -> Result<[u8; HEADER_SIZE], AudioError> {
    params.validate()?;

    let mut header = Vec::with_capacity(HEADER_SIZE);

    // RIFF chunk descriptor
    header.extend_from_slice(b"RIFF");
    // File size minus the 8 bytes already written
    header
        .write_u32::<LittleEndian>(HEADER_SIZE as u32 + payload_len - 8)
        .unwrap();
    header.extend_from_slice(b"WAVE");

    // "fmt " sub-chunk: 16 bytes, audio format 1 = integer PCM
    header.extend_from_slice(b"fmt ");
    header.write_u32::<LittleEndian>(16).unwrap();
    header.write_u16::<LittleEndian>(1).unwrap();
    header.write_u16::<LittleEndian>(params.channels).unwrap();
    header.write_u32::<LittleEndian>(params.sample_rate).unwrap();
    header.write_u32::<LittleEndian>(params.byte_rate()).unwrap();
    header.write_u16::<LittleEndian>(params.block_align()).unwrap();
    header.write_u16::<LittleEndian>(params.bit_depth).unwrap();

    // "data" sub-chunk
    header.extend_from_slice(b"data");
    header.write_u32::<LittleEndian>(payload_len).unwrap();

    Ok(header.try_into().expect("header is exactly 44 bytes"))
}

/// Decodes a base64 PCM payload into raw bytes.
pub fn decode_base64(base64_pcm: &str) -> Result<Vec<u8>, AudioError> {
    Ok(BASE64.decode(base64_pcm)?)
}

/// Wraps raw PCM bytes into a complete WAV container.
pub fn encode_pcm(pcm: &[u8], params: &WavParams) -> Result<Bytes, AudioError> {
    let payload_len =
        u32::try_from(pcm.len()).map_err(|_| AudioError::PayloadTooLarge)?;
    if payload_len > u32::MAX - HEADER_SIZE as u32 {
        return Err(AudioError::PayloadTooLarge);
    }

    let header = build_header(payload_len, params)?;

    let mut out = Vec::with_capacity(HEADER_SIZE + pcm.len());
    out.extend_from_slice(&header);
    out.extend_from_slice(pcm);

    Ok(Bytes::from(out))
}

/// Decodes a base64 PCM payload and wraps it into a complete WAV container.
///
/// Deterministic: identical inputs always produce byte-identical output.
pub fn encode(base64_pcm: &str, params: &WavParams) -> Result<Bytes, AudioError> {
    let pcm = decode_base64(base64_pcm)?;
    encode_pcm(&pcm, params)
}

/// Converts little-endian 16-bit PCM bytes into stereo sample pairs.
///
/// Mono input is duplicated onto both channels; a trailing partial sample
/// is dropped.
pub fn samples_from_pcm16(pcm: &[u8], channels: u16) -> Vec<Sample> {
    let samples = pcm
        .chunks_exact(2)
        .map(|b| i16::from_le_bytes([b[0], b[1]]));

    if channels <= 1 {
        samples.map(|s| (s, s)).collect()
    } else {
        samples.tuples().collect()
    }
}
