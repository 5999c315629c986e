//! Hybrid JSON-header + binary-payload framing.
//!
//! Binary frame layout:
//! - Header length: i32, little-endian (4 bytes)
//! - Header: `{"type": ..., "content": ...}` as Latin-1 text, space padded
//! - Payload: raw bytes, starting on an 8-byte aligned offset
//!
//! Messages without a payload travel as plain UTF-8 JSON text frames.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::borrow::Cow;

use crate::error::ProtocolError;

pub const LENGTH_PREFIX_BYTES: usize = 4;
pub const PAYLOAD_ALIGNMENT: usize = 8;

/// One transport-level unit, as handed over by the socket.
#[derive(Debug, Clone, PartialEq)]
pub enum Frame {
    Text(String),
    Binary(Vec<u8>),
}

impl Frame {
    pub fn len(&self) -> usize {
        match self {
            Frame::Text(text) => text.len(),
            Frame::Binary(bytes) => bytes.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_binary(&self) -> bool {
        matches!(self, Frame::Binary(_))
    }
}

/// An owned message, ready to be encoded.
#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    pub kind: String,
    pub content: Map<String, Value>,
    pub payload: Option<Vec<u8>>,
}

impl Message {
    pub fn new(kind: impl Into<String>, content: Map<String, Value>) -> Self {
        Self {
            kind: kind.into(),
            content,
            payload: None,
        }
    }

    pub fn with_payload(kind: impl Into<String>, content: Map<String, Value>, payload: Vec<u8>) -> Self {
        Self {
            kind: kind.into(),
            content,
            payload: Some(payload),
        }
    }

    pub fn encode(&self) -> Result<Frame, ProtocolError> {
        encode(&self.kind, &self.content, self.payload.as_deref())
    }
}

/// A message decoded from a frame. The payload borrows from the frame buffer.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedMessage<'a> {
    pub kind: String,
    pub content: Map<String, Value>,
    pub payload: Option<&'a [u8]>,
}

impl<'a> DecodedMessage<'a> {
    pub fn into_owned(self) -> Message {
        Message {
            kind: self.kind,
            content: self.content,
            payload: self.payload.map(<[u8]>::to_vec),
        }
    }

    /// Payload interpreted as little-endian f32 samples.
    pub fn payload_f32(&self) -> Result<Cow<'a, [f32]>, ProtocolError> {
        let payload = self
            .payload
            .ok_or_else(|| ProtocolError::MissingPayload(self.kind.clone()))?;
        samples_f32(payload).map_err(|reason| ProtocolError::InvalidContent {
            kind: self.kind.clone(),
            reason,
        })
    }
}

#[derive(Serialize)]
struct HeaderRef<'a> {
    #[serde(rename = "type")]
    kind: &'a str,
    content: &'a Map<String, Value>,
}

#[derive(Deserialize)]
struct Header {
    #[serde(rename = "type")]
    kind: String,
    content: Map<String, Value>,
}

/// Number of spaces appended to a header of `header_len` bytes so that the
/// payload starts on an aligned offset. Always in `1..=8`; an already
/// aligned header still receives a full 8 spaces.
pub fn header_padding(header_len: usize) -> usize {
    PAYLOAD_ALIGNMENT - (header_len + LENGTH_PREFIX_BYTES) % PAYLOAD_ALIGNMENT
}

pub fn encode(kind: &str, content: &Map<String, Value>, payload: Option<&[u8]>) -> Result<Frame, ProtocolError> {
    let header = serde_json::to_string(&HeaderRef { kind, content })?;

    let payload = match payload {
        Some(payload) => payload,
        None => return Ok(Frame::Text(header)),
    };

    let mut header_bytes = latin1_bytes(&header)?;
    let padding = header_padding(header_bytes.len());
    header_bytes.resize(header_bytes.len() + padding, b' ');

    let header_len = i32::try_from(header_bytes.len()).map_err(|_| ProtocolError::InvalidContent {
        kind: kind.to_string(),
        reason: format!("header of {} bytes does not fit the length prefix", header_bytes.len()),
    })?;

    let mut buffer = Vec::with_capacity(LENGTH_PREFIX_BYTES + header_bytes.len() + payload.len());
    buffer.extend_from_slice(&header_len.to_le_bytes());
    buffer.extend_from_slice(&header_bytes);
    buffer.extend_from_slice(payload);

    Ok(Frame::Binary(buffer))
}

pub fn decode(frame: &Frame) -> Result<DecodedMessage<'_>, ProtocolError> {
    match frame {
        Frame::Text(text) => {
            let header: Header = serde_json::from_str(text)?;
            Ok(DecodedMessage {
                kind: header.kind,
                content: header.content,
                payload: None,
            })
        }
        Frame::Binary(bytes) => decode_binary(bytes),
    }
}

pub fn decode_binary(buffer: &[u8]) -> Result<DecodedMessage<'_>, ProtocolError> {
    let prefix: [u8; LENGTH_PREFIX_BYTES] = buffer
        .get(..LENGTH_PREFIX_BYTES)
        .and_then(|bytes| bytes.try_into().ok())
        .ok_or(ProtocolError::MissingLengthPrefix { len: buffer.len() })?;

    let raw_len = i32::from_le_bytes(prefix);
    let header_len = usize::try_from(raw_len).map_err(|_| ProtocolError::NegativeHeaderLength(raw_len))?;

    let rest = &buffer[LENGTH_PREFIX_BYTES..];
    if header_len > rest.len() {
        return Err(ProtocolError::HeaderOutOfBounds {
            header_len,
            available: rest.len(),
        });
    }

    let (header_bytes, payload) = rest.split_at(header_len);
    // Latin-1: every byte is exactly one code point
    let header_text: String = header_bytes.iter().map(|&b| char::from(b)).collect();
    let header: Header = serde_json::from_str(&header_text)?;

    Ok(DecodedMessage {
        kind: header.kind,
        content: header.content,
        payload: Some(payload),
    })
}

fn latin1_bytes(text: &str) -> Result<Vec<u8>, ProtocolError> {
    text.chars()
        .map(|c| u8::try_from(u32::from(c)).map_err(|_| ProtocolError::NonLatin1Header(c)))
        .collect()
}

/// View raw bytes as f32 samples without copying when the buffer is aligned,
/// otherwise decode them into a fresh vector.
pub fn samples_f32(bytes: &[u8]) -> Result<Cow<'_, [f32]>, String> {
    if bytes.len() % std::mem::size_of::<f32>() != 0 {
        return Err(format!("payload of {} bytes is not a whole number of f32 samples", bytes.len()));
    }

    if cfg!(target_endian = "little") {
        if let Ok(view) = bytemuck::try_cast_slice::<u8, f32>(bytes) {
            return Ok(Cow::Borrowed(view));
        }
    }

    Ok(Cow::Owned(
        bytes
            .chunks_exact(4)
            .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
            .collect(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn content(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            other => panic!("not an object: {other}"),
        }
    }

    fn header_len_of(frame: &Frame) -> usize {
        match frame {
            Frame::Binary(bytes) => i32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]) as usize,
            Frame::Text(_) => panic!("expected a binary frame"),
        }
    }

    #[test]
    fn test_padding_range() {
        for len in 0..64 {
            let pad = header_padding(len);
            assert!((1..=8).contains(&pad), "padding {} for length {}", pad, len);
            assert_eq!((len + pad + LENGTH_PREFIX_BYTES) % PAYLOAD_ALIGNMENT, 0);
        }
    }

    #[test]
    fn test_aligned_header_still_pads_full_block() {
        // 4 + 12 = 16 is already aligned
        assert_eq!(header_padding(12), 8);
        assert_eq!(header_padding(4), 8);
        assert_eq!(header_padding(11), 1);
    }

    #[test]
    fn test_text_frame_without_payload() {
        let frame = encode("status", &content(json!({"message": "hello"})), None).unwrap();
        assert_eq!(
            frame,
            Frame::Text(r#"{"type":"status","content":{"message":"hello"}}"#.to_string())
        );

        let decoded = decode(&frame).unwrap();
        assert_eq!(decoded.kind, "status");
        assert_eq!(decoded.content["message"], "hello");
        assert!(decoded.payload.is_none());
    }

    #[test]
    fn test_binary_frame_layout() {
        let payload = [1u8, 2, 3, 4, 5];
        let frame = encode("request_data_spectrogram", &content(json!({"nfft": 1024})), Some(&payload)).unwrap();

        let header_len = header_len_of(&frame);
        let Frame::Binary(bytes) = &frame else { unreachable!() };

        assert_eq!((LENGTH_PREFIX_BYTES + header_len) % PAYLOAD_ALIGNMENT, 0);
        assert_eq!(bytes.len(), LENGTH_PREFIX_BYTES + header_len + payload.len());
        assert_eq!(&bytes[LENGTH_PREFIX_BYTES + header_len..], &payload);

        let header = std::str::from_utf8(&bytes[4..4 + header_len]).unwrap();
        assert!(header.starts_with(r#"{"type":"request_data_spectrogram","content":{"nfft":1024}}"#));
        assert!(header.ends_with(' '));
    }

    #[test]
    fn test_binary_round_trip_keeps_content_order() {
        let original = Message::with_payload(
            "spectrogram",
            content(json!({"extent": [0.0, 22050.0], "fs": 44100, "length": 2.5, "nfreqs": 2})),
            vec![0, 0, 128, 63, 0, 0, 0, 64],
        );

        let frame = original.encode().unwrap();
        let decoded = decode(&frame).unwrap();

        let keys: Vec<&str> = decoded.content.keys().map(String::as_str).collect();
        assert_eq!(keys, ["extent", "fs", "length", "nfreqs"]);
        assert_eq!(decoded.payload_f32().unwrap().as_ref(), &[1.0, 2.0]);
        assert_eq!(decoded.into_owned(), original);
    }

    #[test]
    fn test_latin1_header_round_trip() {
        let message = Message::with_payload(
            "information",
            content(json!({"text": "café"})),
            vec![9, 9],
        );
        let decoded = decode(&message.encode().unwrap()).unwrap().into_owned();
        assert_eq!(decoded, message);
    }

    #[test]
    fn test_header_above_latin1_is_rejected() {
        let result = encode("information", &content(json!({"text": "snow ☃"})), Some(&[]));
        assert!(matches!(result, Err(ProtocolError::NonLatin1Header('☃'))));
    }

    #[test]
    fn test_short_frame_is_rejected() {
        let frame = Frame::Binary(vec![1, 0]);
        assert!(matches!(decode(&frame), Err(ProtocolError::MissingLengthPrefix { len: 2 })));
    }

    #[test]
    fn test_header_length_past_end_is_rejected() {
        let mut bytes = 100i32.to_le_bytes().to_vec();
        bytes.extend_from_slice(b"{}");
        assert!(matches!(
            decode_binary(&bytes),
            Err(ProtocolError::HeaderOutOfBounds { header_len: 100, available: 2 })
        ));
    }

    #[test]
    fn test_negative_header_length_is_rejected() {
        let bytes = (-5i32).to_le_bytes().to_vec();
        assert!(matches!(decode_binary(&bytes), Err(ProtocolError::NegativeHeaderLength(-5))));
    }

    #[test]
    fn test_malformed_json_is_reported() {
        assert!(matches!(
            decode(&Frame::Text("{not json".to_string())),
            Err(ProtocolError::Json(_))
        ));

        let mut bytes = 4i32.to_le_bytes().to_vec();
        bytes.extend_from_slice(b"nope\x00\x00");
        assert!(matches!(decode_binary(&bytes), Err(ProtocolError::Json(_))));
    }

    #[test]
    fn test_header_without_content_is_rejected() {
        assert!(matches!(
            decode(&Frame::Text(r#"{"type":"status"}"#.to_string())),
            Err(ProtocolError::Json(_))
        ));

        // 4 + 20 header bytes, already aligned
        let header = br#"{"type":"status"}   "#;
        let mut bytes = (header.len() as i32).to_le_bytes().to_vec();
        bytes.extend_from_slice(header);
        bytes.extend_from_slice(&[0; 8]);
        assert!(matches!(decode_binary(&bytes), Err(ProtocolError::Json(_))));
    }

    #[test]
    fn test_unaligned_samples_are_copied() {
        let mut bytes = vec![0u8];
        bytes.extend_from_slice(&1.5f32.to_le_bytes());
        bytes.extend_from_slice(&(-2.0f32).to_le_bytes());

        let samples = samples_f32(&bytes[1..]).unwrap();
        assert_eq!(samples.as_ref(), &[1.5, -2.0]);
        assert!(samples_f32(&bytes[..3]).is_err());
    }
}
