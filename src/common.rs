use bytes::{Bytes, BytesMut};
use std::io;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio_util::codec::{Decoder, Encoder, Framed};

/// Upper bound on a single received frame.
pub const MAX_READ: usize = 1024;

/// Frames are not delimited on the wire: whatever one read delivered is one frame.
///
/// Both peers strictly alternate, so there is never more than one move in flight.
#[derive(Debug, Default, Clone, Copy)]
pub struct ChunkCodec;

impl Decoder for ChunkCodec {
    type Item = BytesMut;
    type Error = io::Error;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if src.is_empty() {
            return Ok(None);
        }
        let len = src.len().min(MAX_READ);
        Ok(Some(src.split_to(len)))
    }
}

impl Encoder<Bytes> for ChunkCodec {
    type Error = io::Error;

    fn encode(&mut self, item: Bytes, dst: &mut BytesMut) -> Result<(), Self::Error> {
        dst.extend_from_slice(&item);
        Ok(())
    }
}

pub type FramedStream<S> = Framed<S, ChunkCodec>;

pub fn bind_stream<S>(stream: S) -> FramedStream<S>
where
    S: AsyncRead + AsyncWrite,
{
    Framed::new(stream, ChunkCodec)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_buffer_yields_nothing() {
        let mut buf = BytesMut::new();
        assert!(ChunkCodec.decode(&mut buf).unwrap().is_none());
    }

    #[test]
    fn whole_buffer_is_one_frame() {
        let mut buf = BytesMut::from(&b"2,0"[..]);
        let frame = ChunkCodec.decode(&mut buf).unwrap().unwrap();
        assert_eq!(&frame[..], b"2,0");
        assert!(buf.is_empty());
    }

    #[test]
    fn frames_are_capped() {
        let mut buf = BytesMut::from(&[b'a'; MAX_READ + 10][..]);
        let frame = ChunkCodec.decode(&mut buf).unwrap().unwrap();
        assert_eq!(frame.len(), MAX_READ);
        assert_eq!(buf.len(), 10);
    }

    #[test]
    fn encode_writes_bytes_verbatim() {
        let mut dst = BytesMut::new();
        ChunkCodec
            .encode(Bytes::from_static(b"0,1"), &mut dst)
            .unwrap();
        assert_eq!(&dst[..], b"0,1");
    }
}
