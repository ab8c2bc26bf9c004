//! Scripted in-memory byte source for tests, benches and demos.

use crate::{ByteSource, OrderMessage};
use std::io;

/// One entry of a feed script.
#[derive(Clone, Debug)]
pub enum MockFrame {
    /// A well-formed frame for this message.
    Message(OrderMessage),
    /// Raw bytes spliced into the stream as-is (garbage injection).
    Raw(Vec<u8>),
}

/// Byte source backed by a pre-rendered image of frames.
///
/// Finite by default: once the image is drained, `recv` fails with
/// `UnexpectedEof`, which the pipeline treats as a clean end of stream.
/// [`cycled`](MockFeed::cycled) switches to endless replay for profiling.
#[derive(Debug)]
pub struct MockFeed {
    image: Vec<u8>,
    read_index: usize,
    cycle: bool,
}

impl MockFeed {
    /// Builds a feed from a frame script.
    pub fn from_frames(frames: Vec<MockFrame>) -> Self {
        let mut image = Vec::new();
        for frame in frames {
            match frame {
                MockFrame::Message(msg) => msg.encode_into(&mut image),
                MockFrame::Raw(bytes) => image.extend_from_slice(&bytes),
            }
        }
        Self::from_bytes(image)
    }

    /// Builds a feed of well-formed frames only.
    pub fn from_messages(messages: &[OrderMessage]) -> Self {
        Self::from_frames(messages.iter().copied().map(MockFrame::Message).collect())
    }

    /// Takes a raw byte image verbatim.
    pub fn from_bytes(image: Vec<u8>) -> Self {
        Self {
            image,
            read_index: 0,
            cycle: false,
        }
    }

    /// Replays the image endlessly instead of draining.
    pub fn cycled(mut self) -> Self {
        self.cycle = true;
        self
    }

    /// Bytes in one pass of the image.
    pub fn image_len(&self) -> usize {
        self.image.len()
    }
}

impl ByteSource for MockFeed {
    fn recv(&mut self, dest: &mut [u8]) -> io::Result<()> {
        if self.cycle {
            if self.image.is_empty() {
                return Err(io::Error::new(io::ErrorKind::UnexpectedEof, "empty feed"));
            }
            let mut written = 0;
            while written < dest.len() {
                let n = (dest.len() - written).min(self.image.len() - self.read_index);
                dest[written..written + n]
                    .copy_from_slice(&self.image[self.read_index..self.read_index + n]);
                written += n;
                self.read_index += n;
                if self.read_index == self.image.len() {
                    self.read_index = 0;
                }
            }
            return Ok(());
        }

        if self.read_index + dest.len() > self.image.len() {
            return Err(io::Error::new(io::ErrorKind::UnexpectedEof, "feed drained"));
        }
        dest.copy_from_slice(&self.image[self.read_index..self.read_index + dest.len()]);
        self.read_index += dest.len();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finite_feed_drains_to_eof() {
        let mut feed = MockFeed::from_bytes(vec![1, 2, 3, 4]);
        let mut buf = [0u8; 3];
        feed.recv(&mut buf).unwrap();
        assert_eq!(buf, [1, 2, 3]);
        let mut rest = [0u8; 2];
        let err = feed.recv(&mut rest).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);
    }

    #[test]
    fn cycled_feed_wraps() {
        let mut feed = MockFeed::from_bytes(vec![9, 8]).cycled();
        let mut buf = [0u8; 5];
        feed.recv(&mut buf).unwrap();
        assert_eq!(buf, [9, 8, 9, 8, 9]);
    }
}
