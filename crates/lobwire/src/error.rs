//! Error types for the wire layer.

use thiserror::Error;

/// Failures surfaced by the framed decoder.
///
/// Malformed input — bad delimiter, bad checksum, oversized frame — is *not*
/// an error: the decoder recovers and reports the frame as absent. The only
/// error here is the byte source itself failing, which is fatal to the
/// pipeline.
#[derive(Debug, Error)]
pub enum WireError {
    /// The underlying byte source failed to deliver the requested bytes.
    #[error("byte source read failed: {0}")]
    Source(#[from] std::io::Error),
}

impl WireError {
    /// True when the source simply ran out of bytes — the cooperative
    /// end-of-stream case rather than a transport fault.
    #[inline]
    pub fn is_end_of_stream(&self) -> bool {
        matches!(self, Self::Source(e) if e.kind() == std::io::ErrorKind::UnexpectedEof)
    }
}
