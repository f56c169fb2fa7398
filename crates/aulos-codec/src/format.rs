//! Sample format descriptors.
//!
//! Two descriptors exist per codec session: the *native* format of the
//! container (as discovered by the decode engine, or declared to the encode
//! engine) and the *client* format exchanged at the reader/writer boundary,
//! which is always 32-bit float, non-interleaved, native-endian.

use symphonia::core::codecs::CodecParameters;
use symphonia::core::sample::SampleFormat as EngineSampleFormat;

use crate::error::{CodecError, CodecResult};

/// Byte order of samples within a container.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Endianness {
    Little,
    Big,
}

impl Endianness {
    /// The byte order of the host.
    pub fn native() -> Self {
        if cfg!(target_endian = "big") {
            Endianness::Big
        } else {
            Endianness::Little
        }
    }
}

/// Encoding and layout flags of a sample format.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FormatFlags {
    pub is_float: bool,
    pub is_signed_integer: bool,
    pub is_non_interleaved: bool,
    pub is_packed: bool,
    pub endianness: Endianness,
}

/// Description of the samples at one side of a codec session.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SampleFormat {
    pub sample_rate: f64,
    pub channels: u16,
    /// Bits per channel sample; 0 when the container does not say.
    pub bits_per_channel: u32,
    /// Frames per packet; 0 when unknown, 1 for uncompressed layouts.
    pub frames_per_packet: u32,
    /// Bytes per frame: per channel for non-interleaved layouts, across all
    /// channels for packed interleaved ones. 0 when unknown.
    pub bytes_per_frame: u32,
    pub flags: FormatFlags,
}

impl SampleFormat {
    /// The client format: 32-bit float, non-interleaved, native-endian.
    pub fn client_float(sample_rate: f64, channels: u16) -> Self {
        Self {
            sample_rate,
            channels,
            bits_per_channel: 32,
            frames_per_packet: 1,
            bytes_per_frame: std::mem::size_of::<f32>() as u32,
            flags: FormatFlags {
                is_float: true,
                is_signed_integer: false,
                is_non_interleaved: true,
                is_packed: false,
                endianness: Endianness::native(),
            },
        }
    }

    /// The writer's destination format: 16-bit signed integer, packed.
    pub fn packed_int16(sample_rate: f64, channels: u16) -> Self {
        Self {
            sample_rate,
            channels,
            bits_per_channel: 16,
            frames_per_packet: 1,
            bytes_per_frame: std::mem::size_of::<i16>() as u32 * channels as u32,
            flags: FormatFlags {
                is_float: false,
                is_signed_integer: true,
                is_non_interleaved: false,
                is_packed: true,
                endianness: Endianness::Little,
            },
        }
    }

    /// Native format as discovered from the decode engine's track parameters.
    ///
    /// Sample rate and channel count must be present; the session cannot be
    /// set up without them.
    pub(crate) fn from_codec_params(params: &CodecParameters) -> CodecResult<Self> {
        let sample_rate = params
            .sample_rate
            .ok_or_else(|| CodecError::InvalidData("container reports no sample rate".into()))?;

        let channels = params
            .channels
            .map(|c| c.count() as u16)
            .ok_or_else(|| CodecError::InvalidData("container reports no channel count".into()))?;
        if channels == 0 {
            return Err(CodecError::InvalidData("container reports zero channels".into()));
        }

        let (is_float, is_signed_integer) = match params.sample_format {
            Some(EngineSampleFormat::F32) | Some(EngineSampleFormat::F64) => (true, false),
            Some(EngineSampleFormat::U8)
            | Some(EngineSampleFormat::U16)
            | Some(EngineSampleFormat::U24)
            | Some(EngineSampleFormat::U32) => (false, false),
            Some(_) => (false, true),
            None => (false, false),
        };

        Ok(Self {
            sample_rate: sample_rate as f64,
            channels,
            bits_per_channel: params.bits_per_sample.unwrap_or(0),
            frames_per_packet: 0,
            bytes_per_frame: 0,
            flags: FormatFlags {
                is_float,
                is_signed_integer,
                is_non_interleaved: false,
                is_packed: true,
                endianness: Endianness::native(),
            },
        })
    }

    /// Spec handed to the encode engine for a destination format.
    pub(crate) fn to_wav_spec(&self) -> hound::WavSpec {
        hound::WavSpec {
            channels: self.channels,
            sample_rate: self.sample_rate as u32,
            bits_per_sample: self.bits_per_channel as u16,
            sample_format: if self.flags.is_float {
                hound::SampleFormat::Float
            } else {
                hound::SampleFormat::Int
            },
        }
    }
}
