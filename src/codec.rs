//! Inbound line framing
//!
//! Splits the client byte stream on `\n`. Bytes that are not valid UTF-8
//! are replaced rather than rejected, and there is no length cap unless
//! one is configured.

use bytes::BytesMut;
use tokio_util::codec::{AnyDelimiterCodec, AnyDelimiterCodecError, Decoder};

/// Newline-delimited decoder producing lossily decoded text lines
#[derive(Debug, Clone)]
pub struct ChatLineCodec {
    inner: AnyDelimiterCodec,
}

impl ChatLineCodec {
    /// `None` accepts lines of any length
    pub fn new(max_line_length: Option<usize>) -> Self {
        let inner = match max_line_length {
            Some(max) => AnyDelimiterCodec::new_with_max_length(b"\n".to_vec(), Vec::new(), max),
            None => AnyDelimiterCodec::new(b"\n".to_vec(), Vec::new()),
        };
        Self { inner }
    }
}

impl Default for ChatLineCodec {
    fn default() -> Self {
        Self::new(None)
    }
}

fn to_line(chunk: &[u8]) -> String {
    let chunk = chunk.strip_suffix(b"\r").unwrap_or(chunk);
    String::from_utf8_lossy(chunk).into_owned()
}

impl Decoder for ChatLineCodec {
    type Item = String;
    type Error = AnyDelimiterCodecError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<String>, Self::Error> {
        Ok(self.inner.decode(src)?.map(|chunk| to_line(&chunk)))
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<String>, Self::Error> {
        Ok(self.inner.decode_eof(src)?.map(|chunk| to_line(&chunk)))
    }
}
