//! wtSock frame types
//!
//! A frame is one map event: a logged or partially entered callsign, a DX
//! spot, or a gab chat message. Frames are immutable once built; the hub
//! shares a single `Arc<Frame>` between all subscriber queues.
//!
//! The JSON schema (field names and the `Frame` discriminator) is fixed by
//! the map clients and must not change.

pub mod codec;

use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

/// Kind discriminator carried in the `Frame` field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FrameKind {
    /// A callsign that was logged
    LoggedCall,
    /// A (partially) entered callsign
    PartialCall,
    /// A DX cluster spot
    DxSpot,
    /// A gab chat message
    Gab,
}

impl FrameKind {
    /// Wire name of this kind
    pub fn as_str(&self) -> &'static str {
        match self {
            FrameKind::LoggedCall => "LoggedCall",
            FrameKind::PartialCall => "PartialCall",
            FrameKind::DxSpot => "DXSpot",
            FrameKind::Gab => "Gab",
        }
    }
}

impl fmt::Display for FrameKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind-specific content of a frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "Frame")]
pub enum FramePayload {
    LoggedCall {
        #[serde(rename = "Call")]
        call: String,
        #[serde(rename = "Frequency")]
        frequency_khz: f64,
    },
    PartialCall {
        #[serde(rename = "Call")]
        call: String,
    },
    #[serde(rename = "DXSpot")]
    DxSpot {
        #[serde(rename = "Spot")]
        spot: String,
        #[serde(rename = "Spotter")]
        spotter: String,
        #[serde(rename = "Frequency")]
        frequency_khz: f64,
        #[serde(rename = "Comments")]
        comments: String,
    },
    Gab {
        #[serde(rename = "From")]
        from: String,
        #[serde(rename = "To")]
        to: String,
        #[serde(rename = "Message")]
        message: String,
    },
}

impl FramePayload {
    /// Kind of this payload
    pub fn kind(&self) -> FrameKind {
        match self {
            FramePayload::LoggedCall { .. } => FrameKind::LoggedCall,
            FramePayload::PartialCall { .. } => FrameKind::PartialCall,
            FramePayload::DxSpot { .. } => FrameKind::DxSpot,
            FramePayload::Gab { .. } => FrameKind::Gab,
        }
    }
}

/// A single map event ready for broadcast
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    #[serde(rename = "DateTime")]
    date_time: i64,
    #[serde(rename = "SourceAddr")]
    source_addr: String,
    #[serde(flatten)]
    payload: FramePayload,
}

impl Frame {
    /// Create a frame stamped with the current wall-clock time
    pub fn new(payload: FramePayload, source_addr: impl Into<String>) -> Self {
        Self::at(payload, source_addr, now_millis())
    }

    /// Create a frame with an explicit timestamp (milliseconds since the epoch)
    pub fn at(payload: FramePayload, source_addr: impl Into<String>, date_time: i64) -> Self {
        Self {
            date_time,
            source_addr: source_addr.into(),
            payload,
        }
    }

    /// Kind discriminator
    pub fn kind(&self) -> FrameKind {
        self.payload.kind()
    }

    /// Creation time in milliseconds since the Unix epoch
    pub fn date_time(&self) -> i64 {
        self.date_time
    }

    /// Listen address of the hub that produced this frame
    pub fn source_addr(&self) -> &str {
        &self.source_addr
    }

    /// Kind-specific content
    pub fn payload(&self) -> &FramePayload {
        &self.payload
    }
}

/// Milliseconds since the Unix epoch, 0 if the clock is before it
pub(crate) fn now_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_matches_payload() {
        let payload = FramePayload::DxSpot {
            spot: "DL3NEY".into(),
            spotter: "F5UII".into(),
            frequency_khz: 14025.0,
            comments: "cq test".into(),
        };
        let frame = Frame::at(payload, "127.0.0.1:12345", 1_700_000_000_000);

        assert_eq!(frame.kind(), FrameKind::DxSpot);
        assert_eq!(frame.kind().as_str(), "DXSpot");
        assert_eq!(frame.date_time(), 1_700_000_000_000);
        assert_eq!(frame.source_addr(), "127.0.0.1:12345");
    }

    #[test]
    fn test_new_stamps_current_time() {
        let before = now_millis();
        let frame = Frame::new(FramePayload::PartialCall { call: "W1AW".into() }, "hub");
        let after = now_millis();

        assert!(frame.date_time() >= before);
        assert!(frame.date_time() <= after);
    }

    #[test]
    fn test_gab_kind_is_gab() {
        let payload = FramePayload::Gab {
            from: "X".into(),
            to: "Y".into(),
            message: "hello".into(),
        };

        assert_eq!(payload.kind(), FrameKind::Gab);
        assert_eq!(payload.kind().to_string(), "Gab");
    }
}
