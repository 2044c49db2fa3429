//! Top-level entry point: drains a demo file through [`crate::stream::MessageStream`]
//! and [`crate::snapshot::Engine`], then hands the result to [`crate::raw_info::RawInfo`].
//! Mirrors `original_source`'s `demoparser/parser.py::Q3DemoParser.parse_config`.

use std::path::Path;

use crate::error::StreamError;
use crate::raw_info::RawInfo;
use crate::snapshot::Engine;
use crate::stream::MessageStream;

/// Parses the demo file at `path` into a [`RawInfo`]. Only a corrupt message-length
/// header or an unreadable file aborts the parse; everything else the snapshot engine
/// considers recoverable is recorded into `RawInfo`'s inner error map instead.
pub fn parse_demo_file(path: impl AsRef<Path>) -> Result<RawInfo, StreamError> {
    let path = path.as_ref();
    let mut stream = MessageStream::open(path)?;
    let mut engine = Engine::new();
    while let Some(message) = stream.next_message()? {
        if !engine.parse(&message) {
            break;
        }
    }
    Ok(RawInfo::new(path.to_string_lossy().into_owned(), &engine.clc, &engine.client))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::io::Write;

    #[test]
    fn empty_sentinel_demo_parses_to_empty_raw_info() {
        let mut path = std::env::temp_dir();
        path.push("dfdemo-core-parser-test-empty.dm_68");
        {
            let mut f = File::create(&path).unwrap();
            f.write_all(&(-1i32).to_le_bytes()).unwrap();
            f.write_all(&(-1i32).to_le_bytes()).unwrap();
        }
        let raw = parse_demo_file(&path).unwrap();
        assert!(raw.client_events.is_empty());
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn missing_file_is_an_error() {
        assert!(parse_demo_file("/nonexistent/path/to/demo.dm_68").is_err());
    }
}
