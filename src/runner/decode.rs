/// Incremental, lossy UTF-8 decoder for process output read in chunks.
///
/// Multi-byte characters split across two reads are held back until the rest
/// arrives; invalid sequences become U+FFFD.
#[derive(Debug, Default)]
pub struct Utf8Decoder {
    pending: Vec<u8>,
}

impl Utf8Decoder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode the next chunk, returning every complete character so far.
    pub fn decode(&mut self, bytes: &[u8]) -> String {
        let mut buf = std::mem::take(&mut self.pending);
        buf.extend_from_slice(bytes);

        let mut out = String::with_capacity(buf.len());
        let mut rest = buf.as_slice();
        loop {
            match std::str::from_utf8(rest) {
                Ok(valid) => {
                    out.push_str(valid);
                    return out;
                }
                Err(e) => {
                    let (valid, tail) = rest.split_at(e.valid_up_to());
                    out.push_str(&String::from_utf8_lossy(valid));
                    match e.error_len() {
                        Some(len) => {
                            out.push(char::REPLACEMENT_CHARACTER);
                            rest = &tail[len..];
                        }
                        None => {
                            self.pending = tail.to_vec();
                            return out;
                        }
                    }
                }
            }
        }
    }

    /// Flush bytes still held back at end of stream.
    pub fn finish(&mut self) -> String {
        if self.pending.is_empty() {
            String::new()
        } else {
            self.pending.clear();
            char::REPLACEMENT_CHARACTER.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_multibyte_char() {
        let bytes = "æøå".as_bytes();
        let mut decoder = Utf8Decoder::new();
        let first = decoder.decode(&bytes[..3]);
        let second = decoder.decode(&bytes[3..]);
        assert_eq!(first, "æ");
        assert_eq!(second, "øå");
        assert_eq!(decoder.finish(), "");
    }

    #[test]
    fn test_invalid_bytes_are_replaced() {
        let mut decoder = Utf8Decoder::new();
        assert_eq!(decoder.decode(b"ok\xffok"), "ok\u{FFFD}ok");
    }

    #[test]
    fn test_truncated_tail_is_flushed() {
        let mut decoder = Utf8Decoder::new();
        assert_eq!(decoder.decode(b"a\xe2\x82"), "a");
        assert_eq!(decoder.finish(), "\u{FFFD}");
    }
}
