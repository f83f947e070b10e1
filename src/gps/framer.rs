// src/gps/framer.rs
//! Newline framing of a raw serial byte stream

use super::{
    data::Position,
    nmea::{self, SentenceKind},
};

/// Accumulates bytes from successive reads and hands out complete lines.
///
/// A sentence may arrive split over any number of reads; nothing is
/// returned until its terminating `\n` has been seen.
#[derive(Debug, Default)]
pub struct FrameBuffer {
    pending: String,
}

impl FrameBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a chunk, decoded as single-byte ASCII. Bytes above 0x7F become
    /// U+FFFD.
    pub fn push(&mut self, bytes: &[u8]) {
        self.pending.extend(bytes.iter().map(|&b| {
            if b.is_ascii() {
                b as char
            } else {
                char::REPLACEMENT_CHARACTER
            }
        }));
    }

    /// Remove and return the next complete line, trimmed. Blank lines are
    /// returned as empty strings; callers skip them.
    pub fn next_line(&mut self) -> Option<String> {
        let idx = self.pending.find('\n')?;
        let line = self.pending[..idx].trim().to_string();
        self.pending.drain(..=idx);
        Some(line)
    }

    /// Bytes held back waiting for a newline
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }
}

/// Per-line outcome of [`Ingest::feed`].
#[derive(Debug, Clone, PartialEq)]
pub enum LineOutcome {
    Fix(Position),
    Ignored(SentenceKind),
}

/// Framing followed by parsing, for callers that own the byte source.
#[derive(Debug, Default)]
pub struct Ingest {
    buffer: FrameBuffer,
}

impl Ingest {
    pub fn new() -> Self {
        Self::default()
    }

    /// Push one chunk and parse every line it completes, in stream order.
    pub fn feed(&mut self, bytes: &[u8]) -> Vec<LineOutcome> {
        self.buffer.push(bytes);

        let mut outcomes = Vec::new();
        while let Some(line) = self.buffer.next_line() {
            if line.is_empty() {
                continue;
            }
            outcomes.push(match nmea::parse(&line) {
                Some(pos) => LineOutcome::Fix(pos),
                None => LineOutcome::Ignored(SentenceKind::of(&line)),
            });
        }
        outcomes
    }

    /// Only the fixes from [`Ingest::feed`].
    pub fn feed_fixes(&mut self, bytes: &[u8]) -> Vec<Position> {
        self.feed(bytes)
            .into_iter()
            .filter_map(|outcome| match outcome {
                LineOutcome::Fix(pos) => Some(pos),
                LineOutcome::Ignored(_) => None,
            })
            .collect()
    }

    pub fn pending_len(&self) -> usize {
        self.buffer.pending_len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const GGA_LINE: &str = "$GPGGA,123519,4807.038,N,01131.000,E,1,08,0.9,545.4,M,46.9,M,,\n";

    #[test]
    fn test_single_chunk_single_fix() {
        let mut ingest = Ingest::new();
        let fixes = ingest.feed_fixes(GGA_LINE.as_bytes());

        assert_eq!(fixes.len(), 1);
        assert_eq!(fixes[0].altitude_m(), 545.4);
        assert_eq!(ingest.pending_len(), 0);
    }

    #[test]
    fn test_sentence_split_across_reads() {
        let mut ingest = Ingest::new();

        assert!(ingest.feed_fixes(b"$GPRMC,1235").is_empty());
        assert_eq!(ingest.pending_len(), 11);

        let fixes = ingest
            .feed_fixes(b"19,A,4807.038,N,01131.000,E,022.4,084.4,230394,003.1,W\n");
        assert_eq!(fixes.len(), 1);
        assert_eq!(ingest.pending_len(), 0);
    }

    #[test]
    fn test_byte_at_a_time() {
        let mut ingest = Ingest::new();
        let mut fixes = Vec::new();
        for b in GGA_LINE.as_bytes() {
            fixes.extend(ingest.feed_fixes(std::slice::from_ref(b)));
        }
        assert_eq!(fixes.len(), 1);
    }

    #[test]
    fn test_many_lines_in_one_read() {
        let chunk = format!(
            "{}\r\n$GPGSV,3,1,12,01,40,083,46\r\n{}\r\n$GPRMC,1235",
            GGA_LINE.trim_end(),
            GGA_LINE.trim_end()
        );
        let mut ingest = Ingest::new();
        let outcomes = ingest.feed(chunk.as_bytes());

        assert_eq!(outcomes.len(), 3);
        assert!(matches!(outcomes[0], LineOutcome::Fix(_)));
        assert_eq!(outcomes[1], LineOutcome::Ignored(SentenceKind::Other));
        assert!(matches!(outcomes[2], LineOutcome::Fix(_)));
        assert_eq!(ingest.pending_len(), "$GPRMC,1235".len());
    }

    #[test]
    fn test_garbage_and_blank_lines() {
        let mut ingest = Ingest::new();
        let outcomes = ingest.feed(b"\n\r\n   \nnoise without dollar\n$GPGGA,1,2\n");

        assert_eq!(
            outcomes,
            vec![
                LineOutcome::Ignored(SentenceKind::Other),
                LineOutcome::Ignored(SentenceKind::Gga),
            ]
        );
    }

    #[test]
    fn test_non_ascii_bytes_are_replaced() {
        let mut buffer = FrameBuffer::new();
        buffer.push(&[b'$', 0xB5, 0x62, b'\n']);

        assert_eq!(buffer.next_line().as_deref(), Some("$\u{FFFD}b"));
        assert_eq!(buffer.next_line(), None);
    }

    #[test]
    fn test_next_line_trims() {
        let mut buffer = FrameBuffer::new();
        buffer.push(b"  $GPGGA,x \r\nrest");

        assert_eq!(buffer.next_line().as_deref(), Some("$GPGGA,x"));
        assert_eq!(buffer.next_line(), None);
        assert_eq!(buffer.pending_len(), 4);
    }
}
