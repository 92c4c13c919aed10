//! Connect protocol envelope framing for server-streaming JSON calls.
//!
//! Each frame is one flags byte, a big-endian `u32` payload length, and the
//! payload. The final frame of a stream carries [`END_STREAM_FLAG`] and an
//! optional error object instead of a message.

use serde::Deserialize;
use serde_json::Value;

use crate::error::{EdaError, Result};

pub const END_STREAM_FLAG: u8 = 0b0000_0010;
const HEADER_LEN: usize = 5;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub flags: u8,
    pub payload: Vec<u8>,
}

impl Frame {
    pub fn is_end_stream(&self) -> bool {
        self.flags & END_STREAM_FLAG != 0
    }
}

#[derive(Debug, Deserialize)]
struct EndStream {
    #[serde(default)]
    error: Option<EndStreamError>,
}

#[derive(Debug, Deserialize)]
struct EndStreamError {
    #[serde(default)]
    code: String,
    #[serde(default)]
    message: String,
}

/// Frame one JSON message.
pub fn encode(message: &Value) -> Result<Vec<u8>> {
    let payload = serde_json::to_vec(message)?;
    let len = u32::try_from(payload.len())
        .map_err(|_| EdaError::InvalidArgument("envelope payload too large".into()))?;
    let mut out = Vec::with_capacity(HEADER_LEN + payload.len());
    out.push(0);
    out.extend_from_slice(&len.to_be_bytes());
    out.extend_from_slice(&payload);
    Ok(out)
}

/// Split a complete response body into frames.
pub fn decode_all(mut buf: &[u8]) -> Result<Vec<Frame>> {
    let mut frames = Vec::new();
    while !buf.is_empty() {
        if buf.len() < HEADER_LEN {
            return Err(EdaError::Sandbox("truncated stream frame header".into()));
        }
        let flags = buf[0];
        let len = u32::from_be_bytes([buf[1], buf[2], buf[3], buf[4]]) as usize;
        let rest = &buf[HEADER_LEN..];
        if rest.len() < len {
            return Err(EdaError::Sandbox(format!(
                "truncated stream frame: expected {len} bytes, got {}",
                rest.len()
            )));
        }
        frames.push(Frame {
            flags,
            payload: rest[..len].to_vec(),
        });
        buf = &rest[len..];
    }
    Ok(frames)
}

/// Turn an end-of-stream frame into an error if it carries one.
pub fn check_end_stream(frame: &Frame) -> Result<()> {
    if frame.payload.is_empty() {
        return Ok(());
    }
    let end: EndStream = serde_json::from_slice(&frame.payload)?;
    match end.error {
        Some(err) => Err(EdaError::Sandbox(format!("{}: {}", err.code, err.message))),
        None => Ok(()),
    }
}
