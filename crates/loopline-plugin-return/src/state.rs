//! Session-state blob exchanged with the host.
//!
//! Fixed layout, little-endian, no version tag: delay ms (f32), feedback
//! percent (f32), anti-feedback (one byte, non-zero = on). Loading does not
//! validate beyond the clamps the runtime applies anyway.

pub const STATE_SIZE: usize = 9;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SessionState {
    pub delay_ms: f32,
    pub feedback_percent: f32,
    pub anti_feedback: bool,
}

impl SessionState {
    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(STATE_SIZE);
        out.extend_from_slice(&self.delay_ms.to_le_bytes());
        out.extend_from_slice(&self.feedback_percent.to_le_bytes());
        out.push(u8::from(self.anti_feedback));
        out
    }

    /// Returns `None` when the blob is too short to hold all three fields.
    /// Trailing bytes from any future extension are ignored.
    pub fn decode(bytes: &[u8]) -> Option<Self> {
        if bytes.len() < STATE_SIZE {
            return None;
        }
        let delay_ms = f32::from_le_bytes(bytes[0..4].try_into().ok()?);
        let feedback_percent = f32::from_le_bytes(bytes[4..8].try_into().ok()?);
        Some(Self {
            delay_ms,
            feedback_percent,
            anti_feedback: bytes[8] != 0,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blob_is_nine_bytes_in_field_order() {
        let state = SessionState {
            delay_ms: 750.0,
            feedback_percent: 40.0,
            anti_feedback: true,
        };
        let bytes = state.encode();
        assert_eq!(bytes.len(), STATE_SIZE);
        assert_eq!(&bytes[0..4], &750.0f32.to_le_bytes());
        assert_eq!(&bytes[4..8], &40.0f32.to_le_bytes());
        assert_eq!(bytes[8], 1);
    }

    #[test]
    fn decode_round_trips_encode() {
        let state = SessionState {
            delay_ms: 123.0,
            feedback_percent: 5.5,
            anti_feedback: false,
        };
        assert_eq!(SessionState::decode(&state.encode()), Some(state));
    }

    #[test]
    fn short_blob_is_rejected() {
        assert_eq!(SessionState::decode(&[0u8; 8]), None);
    }
}
