//! Framing codec for the sway/i3 IPC protocol.
//!
//! Wire format:
//! ```text
//! ["i3-ipc":6][payload_len:4][msg_type:4][payload:N]
//! ```
//! Total header size: 14 bytes.  Both integers use the host's native byte
//! order, because the socket never leaves the machine.  Payloads are UTF-8
//! JSON (or plain command text for `RUN_COMMAND` requests).

use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::protocol::messages::{MessageType, EVENT_MASK, HEADER_SIZE, MAGIC};

/// Errors that can occur during frame encoding or decoding.
#[derive(Debug, Error, PartialEq)]
pub enum ProtocolError {
    /// The byte slice is shorter than the minimum required length.
    #[error("insufficient data: need at least {needed} bytes, got {available}")]
    InsufficientData { needed: usize, available: usize },

    /// The frame does not start with `i3-ipc`.
    #[error("bad magic: expected \"i3-ipc\", got {0:02X?}")]
    BadMagic([u8; 6]),

    /// The declared payload length exceeds the data available.
    #[error("payload length mismatch: header says {declared}, available is {available}")]
    PayloadLengthMismatch { declared: usize, available: usize },

    /// The payload is too large for the 32-bit length field.
    #[error("payload too large: {0} bytes")]
    PayloadTooLarge(usize),

    /// The payload is not the JSON document the message type calls for.
    #[error("malformed payload: {0}")]
    MalformedPayload(String),
}

/// Decoded frame header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    pub payload_len: usize,
    pub message_type: u32,
}

impl Header {
    /// Returns `true` if the frame carries an event rather than a reply.
    pub fn is_event(&self) -> bool {
        self.message_type & EVENT_MASK != 0
    }
}

/// One decoded frame: the raw type code and its payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub message_type: u32,
    pub payload: Vec<u8>,
}

impl Frame {
    /// Returns `true` if the frame carries an event rather than a reply.
    pub fn is_event(&self) -> bool {
        self.message_type & EVENT_MASK != 0
    }
}

// ── Public API ────────────────────────────────────────────────────────────────

/// Encodes a request frame of type `msg_type` carrying `payload`.
///
/// # Errors
///
/// Returns [`ProtocolError::PayloadTooLarge`] if `payload` does not fit the
/// 32-bit length field.
///
/// # Examples
///
/// ```rust
/// use rezide_core::protocol::{decode_message, encode_message, MessageType};
///
/// let bytes = encode_message(MessageType::RunCommand, b"split vertical").unwrap();
/// let (frame, consumed) = decode_message(&bytes).unwrap();
/// assert_eq!(frame.message_type, MessageType::RunCommand as u32);
/// assert_eq!(frame.payload, b"split vertical");
/// assert_eq!(consumed, bytes.len());
/// ```
pub fn encode_message(msg_type: MessageType, payload: &[u8]) -> Result<Vec<u8>, ProtocolError> {
    let payload_len =
        u32::try_from(payload.len()).map_err(|_| ProtocolError::PayloadTooLarge(payload.len()))?;

    let mut buf = Vec::with_capacity(HEADER_SIZE + payload.len());
    buf.extend_from_slice(MAGIC);
    buf.extend_from_slice(&payload_len.to_ne_bytes());
    buf.extend_from_slice(&(msg_type as u32).to_ne_bytes());
    buf.extend_from_slice(payload);
    Ok(buf)
}

/// Decodes the 14-byte header at the start of `bytes`.
///
/// # Errors
///
/// Returns [`ProtocolError`] if fewer than 14 bytes are available or the
/// magic string is wrong.
pub fn decode_header(bytes: &[u8]) -> Result<Header, ProtocolError> {
    if bytes.len() < HEADER_SIZE {
        return Err(ProtocolError::InsufficientData {
            needed: HEADER_SIZE,
            available: bytes.len(),
        });
    }

    if &bytes[..6] != MAGIC {
        let mut magic = [0u8; 6];
        magic.copy_from_slice(&bytes[..6]);
        return Err(ProtocolError::BadMagic(magic));
    }

    let payload_len = u32::from_ne_bytes([bytes[6], bytes[7], bytes[8], bytes[9]]) as usize;
    let message_type = u32::from_ne_bytes([bytes[10], bytes[11], bytes[12], bytes[13]]);
    Ok(Header {
        payload_len,
        message_type,
    })
}

/// Decodes one frame from the beginning of `bytes`.
///
/// Returns the frame and the total number of bytes consumed (header +
/// payload), so the caller can advance their read cursor.
///
/// # Errors
///
/// Returns [`ProtocolError`] if the header is malformed or the payload is
/// truncated.
pub fn decode_message(bytes: &[u8]) -> Result<(Frame, usize), ProtocolError> {
    let header = decode_header(bytes)?;

    let total_needed = HEADER_SIZE + header.payload_len;
    if bytes.len() < total_needed {
        return Err(ProtocolError::PayloadLengthMismatch {
            declared: header.payload_len,
            available: bytes.len() - HEADER_SIZE,
        });
    }

    let frame = Frame {
        message_type: header.message_type,
        payload: bytes[HEADER_SIZE..total_needed].to_vec(),
    };
    Ok((frame, total_needed))
}

/// Parses a JSON reply or event payload into `T`.
///
/// # Errors
///
/// Returns [`ProtocolError::MalformedPayload`] if the payload is not valid
/// JSON for `T`.
pub fn parse_reply<T: DeserializeOwned>(payload: &[u8]) -> Result<T, ProtocolError> {
    serde_json::from_slice(payload).map_err(|e| ProtocolError::MalformedPayload(e.to_string()))
}

// ── Tests ─────────────────────────────────────────────────────────────────────
