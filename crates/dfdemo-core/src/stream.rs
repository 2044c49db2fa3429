//! Frames the raw demo file into its constituent messages.
//!
//! Each message is prefixed by an 8-byte little-endian `(sequence, length)` header; the
//! file ends either at EOF or at the `(-1, -1)` sentinel header ioquake3 writes when it
//! stops recording.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use byteorder::{LittleEndian, ReadBytesExt};

use crate::error::StreamError;
use crate::protocol::Q3_MESSAGE_MAX_SIZE;

pub struct DemoMessage {
    pub sequence: i32,
    pub size: i32,
    pub data: Vec<u8>,
}

pub struct MessageStream {
    handle: BufReader<File>,
}

impl MessageStream {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StreamError> {
        let file = File::open(path)?;
        Ok(Self {
            handle: BufReader::new(file),
        })
    }

    /// Returns `Ok(None)` at a clean end of stream (EOF or the `(-1,-1)` sentinel),
    /// `Err` if the length header is corrupt.
    pub fn next_message(&mut self) -> Result<Option<DemoMessage>, StreamError> {
        let mut header = [0u8; 8];
        match self.handle.read_exact(&mut header) {
            Ok(()) => {}
            Err(_) => return Ok(None),
        }
        let mut cursor = &header[..];
        let sequence = cursor.read_i32::<LittleEndian>().unwrap();
        let msg_length = cursor.read_i32::<LittleEndian>().unwrap();
        if sequence == -1 && msg_length == -1 {
            return Ok(None);
        }
        if msg_length < 0 || msg_length > Q3_MESSAGE_MAX_SIZE {
            return Err(StreamError::MessageTooLarge);
        }
        let mut data = vec![0u8; msg_length as usize];
        if self.handle.read_exact(&mut data).is_err() {
            return Ok(None);
        }
        Ok(Some(DemoMessage {
            sequence,
            size: msg_length,
            data,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn sentinel_header_ends_the_stream() {
        let mut path = std::env::temp_dir();
        path.push("dfdemo-core-stream-test-sentinel.bin");
        {
            let mut f = File::create(&path).unwrap();
            f.write_all(&(-1i32).to_le_bytes()).unwrap();
            f.write_all(&(-1i32).to_le_bytes()).unwrap();
        }
        let mut stream = MessageStream::open(&path).unwrap();
        assert!(stream.next_message().unwrap().is_none());
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn oversized_length_header_is_an_error() {
        let mut path = std::env::temp_dir();
        path.push("dfdemo-core-stream-test-oversized.bin");
        {
            let mut f = File::create(&path).unwrap();
            f.write_all(&1i32.to_le_bytes()).unwrap();
            f.write_all(&(Q3_MESSAGE_MAX_SIZE + 1).to_le_bytes()).unwrap();
        }
        let mut stream = MessageStream::open(&path).unwrap();
        assert!(stream.next_message().is_err());
        std::fs::remove_file(&path).ok();
    }
}
