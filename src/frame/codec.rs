//! JSON encoding of frames
//!
//! Each frame travels as one JSON object per websocket text message, e.g.
//!
//! ```text
//! {"DateTime":1700000000000,"SourceAddr":"0.0.0.0:12345","Frame":"PartialCall","Call":"W1AW"}
//! ```

use crate::error::Result;

use super::Frame;

/// Encode a frame as a JSON object
pub fn encode(frame: &Frame) -> Result<String> {
    Ok(serde_json::to_string(frame)?)
}

/// Decode a frame from a JSON object
pub fn decode(text: &str) -> Result<Frame> {
    Ok(serde_json::from_str(text)?)
}

#[cfg(test)]
mod tests {
    use serde_json::Value;

    use super::*;
    use crate::frame::{FrameKind, FramePayload};

    fn encode_value(frame: &Frame) -> Value {
        serde_json::from_str(&encode(frame).unwrap()).unwrap()
    }

    #[test]
    fn test_logged_call_fields() {
        let frame = Frame::at(
            FramePayload::LoggedCall {
                call: "F5UII".into(),
                frequency_khz: 7012.5,
            },
            "0.0.0.0:12345",
            42,
        );
        let value = encode_value(&frame);

        assert_eq!(value["Frame"], "LoggedCall");
        assert_eq!(value["Call"], "F5UII");
        assert_eq!(value["Frequency"], 7012.5);
        assert_eq!(value["DateTime"], 42);
        assert_eq!(value["SourceAddr"], "0.0.0.0:12345");
        assert_eq!(value.as_object().unwrap().len(), 5);
    }

    #[test]
    fn test_dx_spot_fields() {
        let frame = Frame::at(
            FramePayload::DxSpot {
                spot: "ZL2CTM".into(),
                spotter: "DL3NEY".into(),
                frequency_khz: 21074.0,
                comments: "FT8".into(),
            },
            "hub",
            1,
        );
        let value = encode_value(&frame);

        assert_eq!(value["Frame"], "DXSpot");
        assert_eq!(value["Spot"], "ZL2CTM");
        assert_eq!(value["Spotter"], "DL3NEY");
        assert_eq!(value["Frequency"], 21074.0);
        assert_eq!(value["Comments"], "FT8");
    }

    #[test]
    fn test_gab_discriminator() {
        let frame = Frame::at(
            FramePayload::Gab {
                from: "X".into(),
                to: "Y".into(),
                message: "hello".into(),
            },
            "hub",
            1,
        );
        let value = encode_value(&frame);

        assert_eq!(value["Frame"], "Gab");
        assert_eq!(value["From"], "X");
        assert_eq!(value["To"], "Y");
        assert_eq!(value["Message"], "hello");
    }

    #[test]
    fn test_decode_partial_call() {
        let text = r#"{"Frame":"PartialCall","Call":"PY1PY","DateTime":7,"SourceAddr":"hub"}"#;
        let frame = decode(text).unwrap();

        assert_eq!(frame.kind(), FrameKind::PartialCall);
        assert_eq!(frame.date_time(), 7);
        assert_eq!(
            frame.payload(),
            &FramePayload::PartialCall {
                call: "PY1PY".into()
            }
        );
    }

    #[test]
    fn test_decode_unknown_kind_fails() {
        let text = r#"{"Frame":"Bogus","DateTime":7,"SourceAddr":"hub"}"#;
        assert!(decode(text).is_err());
    }
}
