//! Splitting of oversized text into word-aligned chunks

use std::ops::Range;

use crate::error::{Error, Result};

use super::builder::chunk_id;

/// One slice of an oversized document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextChunk {
    /// 1-based position in the emitted sequence
    pub index: u32,
    /// `{base_id}_chunk{index}`
    pub id: String,
    /// Chunk text, untrimmed
    pub text: String,
    /// Byte range in the source text
    pub range: Range<usize>,
}

/// Byte-window chunker with space realignment at both ends
#[derive(Debug, Clone)]
pub struct ByteChunker {
    /// Window size in bytes
    max_size: usize,
    /// How many bytes to look back for a space
    scan_limit: usize,
}

impl ByteChunker {
    /// Create a chunker.
    ///
    /// The scan limit is capped below the window size so that every window
    /// moves the cut forward.
    pub fn new(max_size: usize, scan_limit: usize) -> Result<Self> {
        if max_size == 0 {
            return Err(Error::Config("chunk size must be > 0".into()));
        }
        Ok(Self {
            max_size,
            scan_limit: scan_limit.min(max_size - 1),
        })
    }

    pub fn max_size(&self) -> usize {
        self.max_size
    }

    /// Whether text of this encoded size must be chunked
    pub fn needs_chunking(&self, encoded_len: usize) -> bool {
        encoded_len > self.max_size
    }

    /// Split `text` into chunks no larger than the window (plus at most one
    /// UTF-8 character when no space is near a cut).
    ///
    /// Cuts land on spaces where one is within the scan limit. A chunk may
    /// start after the space that ended the previous one; any other gap is
    /// closed, so only whitespace is ever left out. Whitespace-only slices
    /// are not emitted and do not consume an index.
    pub fn chunk(&self, text: &str, base_id: &str) -> Vec<TextChunk> {
        let bytes = text.as_bytes();
        let len = bytes.len();
        let mut chunks = Vec::new();
        if len == 0 {
            return chunks;
        }

        let mut start = 0usize;
        let mut end = self.max_size;
        let mut prev_end = 0usize;
        let mut index = 1u32;

        loop {
            let mut s = start.min(len);
            if s > 0 && bytes.get(s) != Some(&b' ') {
                if let Some(space) = self.space_before(bytes, s) {
                    s = space + 1;
                }
            }
            if s < prev_end || !bytes[prev_end..s].iter().all(u8::is_ascii_whitespace) {
                s = prev_end;
            }

            let mut e = end.min(len);
            if e < len && bytes[e] != b' ' {
                match self.space_before(bytes, e) {
                    Some(space) if space > s => e = space,
                    _ => {
                        while e < len && !text.is_char_boundary(e) {
                            e += 1;
                        }
                    }
                }
            }
            let e = e.max(s);

            let piece = &text[s..e];
            if !piece.trim().is_empty() {
                chunks.push(TextChunk {
                    index,
                    id: chunk_id(base_id, index),
                    text: piece.to_string(),
                    range: s..e,
                });
                index += 1;
            }

            if e >= len {
                break;
            }
            prev_end = e;
            start = s + self.max_size;
            end = e + self.max_size;
        }

        chunks
    }

    /// Nearest space at or before `pos`, within the scan limit
    fn space_before(&self, bytes: &[u8], pos: usize) -> Option<usize> {
        (0..self.scan_limit)
            .take_while(|i| *i <= pos)
            .map(|i| pos - i)
            .find(|p| bytes.get(*p) == Some(&b' '))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn non_ws(text: &str) -> String {
        text.chars().filter(|c| !c.is_whitespace()).collect()
    }

    #[test]
    fn test_rejects_zero_window() {
        assert!(ByteChunker::new(0, 100).is_err());
    }

    #[test]
    fn test_small_text_single_chunk() {
        let chunker = ByteChunker::new(100, 10).unwrap();
        let chunks = chunker.chunk("short text", "doc");
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].index, 1);
        assert_eq!(chunks[0].id, "doc_chunk1");
        assert_eq!(chunks[0].text, "short text");
    }

    #[test]
    fn test_cuts_on_spaces() {
        let chunker = ByteChunker::new(10, 5).unwrap();
        let text = "aaaa bbbb cccc dddd eeee";
        let chunks = chunker.chunk(text, "doc");

        assert_eq!(chunks[0].text, "aaaa bbbb");
        for chunk in &chunks {
            assert!(!chunk.text.trim().is_empty());
            assert!(chunk.text.len() <= 10);
            let end = chunk.range.end;
            assert!(end == text.len() || text.as_bytes()[end] == b' ');
        }
        let joined: String = chunks.iter().map(|c| c.text.as_str()).collect();
        assert_eq!(non_ws(&joined), non_ws(text));
    }

    #[test]
    fn test_indices_sequential() {
        let chunker = ByteChunker::new(8, 4).unwrap();
        let text = "one two three four five six seven eight nine ten";
        let chunks = chunker.chunk(text, "n");
        for (i, chunk) in chunks.iter().enumerate() {
            assert_eq!(chunk.index, i as u32 + 1);
            assert_eq!(chunk.id, format!("n_chunk{}", i + 1));
        }
    }

    #[test]
    fn test_no_space_within_scan_limit() {
        let chunker = ByteChunker::new(10, 3).unwrap();
        let text = "abcdefghijklmnopqrstuvwxyz";
        let chunks = chunker.chunk(text, "x");
        let joined: String = chunks.iter().map(|c| c.text.as_str()).collect();
        assert_eq!(joined, text);
        assert_eq!(chunks[0].text, "abcdefghij");
    }

    #[test]
    fn test_multibyte_never_split() {
        let chunker = ByteChunker::new(5, 2).unwrap();
        let text = "ééééééééé";
        let chunks = chunker.chunk(text, "u");
        let joined: String = chunks.iter().map(|c| c.text.as_str()).collect();
        assert_eq!(joined, text);
        assert!(chunks.iter().all(|c| !c.text.contains('\u{FFFD}')));
    }

    #[test]
    fn test_whitespace_only_text() {
        let chunker = ByteChunker::new(4, 2).unwrap();
        assert!(chunker.chunk("          ", "w").is_empty());
        assert!(chunker.chunk("", "w").is_empty());
    }

    #[test]
    fn test_needs_chunking() {
        let chunker = ByteChunker::new(350 * 1024, 100).unwrap();
        assert!(!chunker.needs_chunking(350 * 1024));
        assert!(chunker.needs_chunking(350 * 1024 + 1));
    }
}
