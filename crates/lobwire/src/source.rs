//! The byte-source contract consumed by the decoder.

use std::io::{self, Read};
use std::net::TcpStream;

/// A blocking source of exactly-sized reads.
///
/// `recv` fills `dest` completely or fails. Short reads do not exist at this
/// interface: an implementation either blocks until the bytes arrive or
/// returns an error, which the pipeline treats as fatal (except for a clean
/// end-of-stream, see [`WireError::is_end_of_stream`]).
///
/// [`WireError::is_end_of_stream`]: crate::WireError::is_end_of_stream
pub trait ByteSource {
    fn recv(&mut self, dest: &mut [u8]) -> io::Result<()>;
}

impl ByteSource for TcpStream {
    #[inline]
    fn recv(&mut self, dest: &mut [u8]) -> io::Result<()> {
        self.read_exact(dest)
    }
}

impl<S: ByteSource + ?Sized> ByteSource for &mut S {
    #[inline]
    fn recv(&mut self, dest: &mut [u8]) -> io::Result<()> {
        (**self).recv(dest)
    }
}
