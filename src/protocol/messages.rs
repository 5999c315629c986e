use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::borrow::Cow;

use super::codec::{DecodedMessage, Message};
use crate::error::ProtocolError;
use crate::view::{DataExtent, Extent};

// Client -> server
pub const REQUEST_FILE_SPECTROGRAM: &str = "request_file_spectrogram";
pub const REQUEST_DATA_SPECTROGRAM: &str = "request_data_spectrogram";
pub const STATUS: &str = "status";

// Server -> client
pub const SPECTROGRAM: &str = "spectrogram";
pub const LOADING_PROGRESS: &str = "loading_progress";
pub const INFORMATION: &str = "information";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileSpectrogramRequest {
    pub filename: String,
    pub nfft: usize,
    pub overlap: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataSpectrogramRequest {
    pub nfft: usize,
    pub overlap: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Status {
    pub message: String,
}

/// Header of a `spectrogram` message; the payload carries
/// `nblocks * nfreqs` f32 magnitudes, block-major.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpectrogramHeader {
    /// Frequency bounds `[min, max]` in Hz.
    pub extent: [f64; 2],
    /// Sample rate of the analysed audio.
    pub fs: f64,
    /// Duration in seconds.
    pub length: f64,
    pub nfreqs: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nblocks: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoadingProgress {
    pub progress: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Information {
    pub text: String,
}

/// What a progress bar should show for a `loading_progress` value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ProgressIndicator {
    Hidden,
    Visible(f64),
}

impl ProgressIndicator {
    /// 0 and 1 (and anything outside) mean no load is running.
    pub fn from_progress(progress: f64) -> Self {
        if progress > 0.0 && progress < 1.0 {
            ProgressIndicator::Visible(progress)
        } else {
            ProgressIndicator::Hidden
        }
    }
}

pub fn to_content<T: Serialize>(kind: &str, value: &T) -> Result<Map<String, Value>, ProtocolError> {
    match serde_json::to_value(value)? {
        Value::Object(map) => Ok(map),
        other => Err(ProtocolError::InvalidContent {
            kind: kind.to_string(),
            reason: format!("content must be an object, got {}", other),
        }),
    }
}

pub fn parse_content<T: DeserializeOwned>(kind: &str, content: &Map<String, Value>) -> Result<T, ProtocolError> {
    serde_json::from_value(Value::Object(content.clone())).map_err(|e| ProtocolError::InvalidContent {
        kind: kind.to_string(),
        reason: e.to_string(),
    })
}

pub fn request_file_spectrogram(filename: &str, nfft: usize, overlap: f64) -> Result<Message, ProtocolError> {
    let content = to_content(
        REQUEST_FILE_SPECTROGRAM,
        &FileSpectrogramRequest {
            filename: filename.to_string(),
            nfft,
            overlap,
        },
    )?;
    Ok(Message::new(REQUEST_FILE_SPECTROGRAM, content))
}

pub fn request_data_spectrogram(audio: Vec<u8>, nfft: usize, overlap: f64) -> Result<Message, ProtocolError> {
    let content = to_content(REQUEST_DATA_SPECTROGRAM, &DataSpectrogramRequest { nfft, overlap })?;
    Ok(Message::with_payload(REQUEST_DATA_SPECTROGRAM, content, audio))
}

pub fn status(message: &str) -> Result<Message, ProtocolError> {
    let content = to_content(STATUS, &Status { message: message.to_string() })?;
    Ok(Message::new(STATUS, content))
}

/// A validated `spectrogram` message.
#[derive(Debug, Clone)]
pub struct Spectrogram<'a> {
    pub header: SpectrogramHeader,
    pub nblocks: usize,
    pub samples: Cow<'a, [f32]>,
}

impl<'a> Spectrogram<'a> {
    pub fn parse(message: &DecodedMessage<'a>) -> Result<Self, ProtocolError> {
        let header: SpectrogramHeader = parse_content(SPECTROGRAM, &message.content)?;
        let invalid = |reason: String| ProtocolError::InvalidContent {
            kind: SPECTROGRAM.to_string(),
            reason,
        };

        let [min_f, max_f] = header.extent;
        if !(min_f.is_finite() && max_f.is_finite() && min_f <= max_f) {
            return Err(invalid(format!("bad frequency extent [{}, {}]", min_f, max_f)));
        }
        if !(header.length.is_finite() && header.length >= 0.0) {
            return Err(invalid(format!("bad length {}", header.length)));
        }
        if header.nfreqs == 0 {
            return Err(invalid("nfreqs must be positive".to_string()));
        }

        let samples = message.payload_f32()?;
        if samples.is_empty() || samples.len() % header.nfreqs != 0 {
            return Err(invalid(format!(
                "{} samples do not form whole blocks of {} frequencies",
                samples.len(),
                header.nfreqs
            )));
        }

        let nblocks = samples.len() / header.nfreqs;
        if let Some(expected) = header.nblocks {
            if expected != nblocks {
                return Err(invalid(format!("header says {} blocks, payload holds {}", expected, nblocks)));
            }
        }

        Ok(Self { header, nblocks, samples })
    }

    /// Time runs over `[0, length]` seconds, frequency over the header extent.
    pub fn data_extent(&self) -> DataExtent {
        let [min_f, max_f] = self.header.extent;
        DataExtent::new(
            Extent::planar(0.0, self.header.length, min_f, max_f),
            self.nblocks,
            self.header.nfreqs,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::codec::decode;
    use crate::view::Axis;

    fn spectrogram_message(header: &SpectrogramHeader, samples: &[f32]) -> Message {
        let content = to_content(SPECTROGRAM, header).unwrap();
        Message::with_payload(SPECTROGRAM, content, bytemuck::cast_slice(samples).to_vec())
    }

    fn header(nfreqs: usize, nblocks: Option<usize>) -> SpectrogramHeader {
        SpectrogramHeader {
            extent: [0.0, 22050.0],
            fs: 44100.0,
            length: 10.0,
            nfreqs,
            nblocks,
        }
    }

    #[test]
    fn test_request_builders() {
        let file = request_file_spectrogram("song.wav", 1024, 0.5).unwrap();
        assert_eq!(file.kind, REQUEST_FILE_SPECTROGRAM);
        assert_eq!(file.content["filename"], "song.wav");
        assert_eq!(file.content["nfft"], 1024);
        assert!(file.payload.is_none());

        let data = request_data_spectrogram(vec![1, 2, 3], 512, 0.75).unwrap();
        assert_eq!(data.content["overlap"], 0.75);
        assert_eq!(data.payload.as_deref(), Some(&[1u8, 2, 3][..]));
        assert!(data.encode().unwrap().is_binary());

        let status = status("ready").unwrap();
        assert!(!status.encode().unwrap().is_binary());
    }

    #[test]
    fn test_progress_indicator() {
        assert_eq!(ProgressIndicator::from_progress(0.0), ProgressIndicator::Hidden);
        assert_eq!(ProgressIndicator::from_progress(1.0), ProgressIndicator::Hidden);
        assert_eq!(ProgressIndicator::from_progress(0.4), ProgressIndicator::Visible(0.4));
    }

    #[test]
    fn test_spectrogram_parse() {
        let samples: Vec<f32> = (0..6).map(|i| i as f32).collect();
        let frame = spectrogram_message(&header(3, None), &samples).encode().unwrap();
        let decoded = decode(&frame).unwrap();

        let spectrogram = Spectrogram::parse(&decoded).unwrap();
        assert_eq!(spectrogram.nblocks, 2);
        assert_eq!(spectrogram.samples.as_ref(), samples.as_slice());

        let data = spectrogram.data_extent();
        assert_eq!(data.bounds().range(Axis::Time), [0.0, 10.0]);
        assert_eq!(data.bounds().range(Axis::Frequency), [0.0, 22050.0]);
        assert_eq!((data.num_t(), data.num_f()), (2, 3));
    }

    #[test]
    fn test_spectrogram_shape_mismatch() {
        let samples = [0.0f32; 7];
        let frame = spectrogram_message(&header(3, None), &samples).encode().unwrap();
        assert!(matches!(
            Spectrogram::parse(&decode(&frame).unwrap()),
            Err(ProtocolError::InvalidContent { .. })
        ));

        let frame = spectrogram_message(&header(3, Some(4)), &[0.0f32; 6]).encode().unwrap();
        assert!(Spectrogram::parse(&decode(&frame).unwrap()).is_err());
    }

    #[test]
    fn test_spectrogram_without_payload() {
        let content = to_content(SPECTROGRAM, &header(3, None)).unwrap();
        let frame = Message::new(SPECTROGRAM, content).encode().unwrap();
        assert!(matches!(
            Spectrogram::parse(&decode(&frame).unwrap()),
            Err(ProtocolError::MissingPayload(_))
        ));
    }

    #[test]
    fn test_spectrogram_missing_fields() {
        let mut content = Map::new();
        content.insert("fs".to_string(), Value::from(44100));
        let frame = Message::with_payload(SPECTROGRAM, content, vec![0; 8]).encode().unwrap();
        assert!(matches!(
            Spectrogram::parse(&decode(&frame).unwrap()),
            Err(ProtocolError::InvalidContent { .. })
        ));
    }
}
