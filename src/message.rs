use crate::board::{InvalidMoveError, Move};
use bytes::Bytes;
use std::str;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MessageError {
    #[error("received bytes are not valid UTF-8: {0}")]
    Utf8(#[from] str::Utf8Error),
    #[error("malformed move {0:?}: {1}")]
    Malformed(String, InvalidMoveError),
}

/// Something that travels over the wire as one frame.
pub trait Message {
    fn encode(&self) -> Bytes;

    fn decode(bytes: &[u8]) -> Result<Self, MessageError>
    where
        Self: Sized;
}

/// A move is the text token `"<row>,<col>"`, three ASCII bytes with no delimiter.
impl Message for Move {
    fn encode(&self) -> Bytes {
        Bytes::from(self.to_string())
    }

    fn decode(bytes: &[u8]) -> Result<Self, MessageError> {
        let text = str::from_utf8(bytes)?;
        text.parse()
            .map_err(|e| MessageError::Malformed(text.to_string(), e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encodes_as_row_comma_col() {
        let mv = Move::new(1, 2).unwrap();
        assert_eq!(mv.encode(), Bytes::from_static(b"1,2"));
    }

    #[test]
    fn every_move_survives_the_wire() {
        for row in 0..3 {
            for col in 0..3 {
                let mv = Move::new(row, col).unwrap();
                let bytes = mv.encode();
                assert_eq!(bytes.len(), 3);
                assert_eq!(Move::decode(&bytes).unwrap(), mv);
            }
        }
    }

    #[test]
    fn rejects_garbage() {
        let garbage: [&[u8]; 7] = [b"", b"12", b"1,2,0", b"x,1", b"1;2", b"7,0", b"\xff,\xfe"];
        for garbage in garbage {
            assert!(Move::decode(garbage).is_err(), "{garbage:?}");
        }
        assert!(matches!(Move::decode(b"\xff"), Err(MessageError::Utf8(_))));
        assert!(matches!(
            Move::decode(b"1,9"),
            Err(MessageError::Malformed(text, InvalidMoveError::OutOfRange { .. })) if text == "1,9"
        ));
    }
}
