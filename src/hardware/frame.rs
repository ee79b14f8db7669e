//! Event frames delivered by the transport.

use std::fmt;
use std::sync::Arc;

/// Length of the sub-message signature at the start of every payload.
pub const SIGNATURE_LEN: usize = 3;

/// One decoded unit of device event data.
#[derive(Clone, PartialEq, Eq)]
pub struct Frame {
    /// Bus address of the device that sent the frame
    pub source: u16,
    /// Bus address the frame was sent to
    pub destination: u16,
    /// Raw payload, starting with the three-byte signature
    pub data: Vec<u8>,
}

impl Frame {
    /// Frame from `source` to `destination` carrying `data`.
    pub fn new(source: u16, destination: u16, data: impl Into<Vec<u8>>) -> Self {
        Self {
            source,
            destination,
            data: data.into(),
        }
    }

    /// The sub-message signature, if the payload is long enough to carry one.
    pub fn signature(&self) -> Option<[u8; SIGNATURE_LEN]> {
        self.data
            .get(..SIGNATURE_LEN)
            .and_then(|sig| sig.try_into().ok())
    }

    /// Payload bytes after the signature.
    pub fn body(&self) -> &[u8] {
        self.data.get(SIGNATURE_LEN..).unwrap_or(&[])
    }
}

impl fmt::Debug for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Frame {{ {:04x} -> {:04x}, data: {:02x?} }}",
            self.source, self.destination, self.data
        )
    }
}

/// Inclusive range of source addresses a handler subscribes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AddressRange {
    /// First address
    pub low: u16,
    /// Last address, inclusive
    pub high: u16,
}

impl AddressRange {
    /// Range `low..=high`.
    pub const fn new(low: u16, high: u16) -> Self {
        Self { low, high }
    }

    /// Whether `address` falls in the range.
    pub fn contains(&self, address: u16) -> bool {
        (self.low..=self.high).contains(&address)
    }
}

/// Callback invoked on the event-delivery path.
pub type FrameHandler = Arc<dyn Fn(&Frame) + Send + Sync>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signature_and_body_split() {
        let frame = Frame::new(0x5001, 0x2001, vec![0x00, 0x3e, 0x01, 0xaa, 0xbb]);
        assert_eq!(frame.signature(), Some([0x00, 0x3e, 0x01]));
        assert_eq!(frame.body(), &[0xaa, 0xbb]);
    }

    #[test]
    fn short_frames_have_no_signature() {
        let frame = Frame::new(0x5001, 0x2001, vec![0x00, 0x3e]);
        assert_eq!(frame.signature(), None);
        assert!(frame.body().is_empty());
    }

    #[test]
    fn range_is_inclusive() {
        let range = AddressRange::new(0x4000, 0x42ff);
        assert!(range.contains(0x4000));
        assert!(range.contains(0x42ff));
        assert!(!range.contains(0x4300));
        assert!(!range.contains(0x3fff));
    }
}
