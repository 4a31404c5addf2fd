//! Paragraph-respecting text chunking
//!
//! Chunks are contiguous, non-overlapping slices of the document: joining
//! their texts in order gives back the original text byte for byte. Blank
//! lines stay attached to the paragraph they follow.

use crate::pages::{page_in, to_page, PageMarkers};
use factsheet_domain::Page;
use serde::{Deserialize, Serialize};

/// One slice of the document sent to the extractor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    /// Position of the chunk in the document (0-based)
    pub index: usize,

    /// Chunk text, including trailing separators
    pub text: String,

    /// Character offset of the first character (inclusive)
    pub char_start: usize,

    /// Character offset after the last character (exclusive)
    pub char_end: usize,

    /// Page of the last marker at or before the chunk's first visible character
    pub page: Page,
}

impl Chunk {
    /// Number of characters in the chunk
    pub fn char_len(&self) -> usize {
        self.char_end - self.char_start
    }

    /// Whether the chunk holds nothing but whitespace
    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }
}

/// Splits documents into chunks of at most `max_chars` characters
#[derive(Debug, Clone)]
pub struct TextChunker {
    max_chars: usize,
    markers: PageMarkers,
}

impl TextChunker {
    /// Create a new text chunker with the default page markers
    pub fn new(max_chars: usize) -> Self {
        Self {
            max_chars: max_chars.max(1),
            markers: PageMarkers::default(),
        }
    }

    /// Use a custom page marker matcher
    pub fn with_page_markers(mut self, markers: PageMarkers) -> Self {
        self.markers = markers;
        self
    }

    /// Chunk the given text
    ///
    /// Paragraphs are packed greedily until adding the next one would exceed
    /// `max_chars`. A paragraph longer than `max_chars` on its own is cut
    /// into `max_chars`-sized pieces. An empty or whitespace-only document
    /// yields no chunks.
    pub fn chunk(&self, text: &str) -> Vec<Chunk> {
        if text.trim().is_empty() {
            return Vec::new();
        }

        let mut spans: Vec<(usize, usize, usize)> = Vec::new(); // byte start, byte end, chars
        let mut current: Option<(usize, usize, usize)> = None;

        for (seg_start, seg_end) in paragraph_spans(text) {
            let seg_chars = text[seg_start..seg_end].chars().count();

            if let Some((start, end, chars)) = current {
                if chars + seg_chars > self.max_chars {
                    spans.push((start, end, chars));
                    current = None;
                }
            }

            if seg_chars > self.max_chars {
                spans.extend(self.hard_split(text, seg_start, seg_end));
                continue;
            }

            current = Some(match current {
                Some((start, _, chars)) => (start, seg_end, chars + seg_chars),
                None => (seg_start, seg_end, seg_chars),
            });
        }
        if let Some(span) = current {
            spans.push(span);
        }

        let markers = self.markers.find_all(text);
        let mut char_pos = 0;
        spans
            .into_iter()
            .enumerate()
            .map(|(index, (start, end, chars))| {
                let slice = &text[start..end];
                let first_visible = start + (slice.len() - slice.trim_start().len());
                let chunk = Chunk {
                    index,
                    text: slice.to_string(),
                    char_start: char_pos,
                    char_end: char_pos + chars,
                    page: to_page(page_in(&markers, first_visible)),
                };
                char_pos += chars;
                chunk
            })
            .collect()
    }

    /// Cut an oversized paragraph into `max_chars`-character pieces
    fn hard_split(&self, text: &str, start: usize, end: usize) -> Vec<(usize, usize, usize)> {
        let mut pieces = Vec::new();
        let mut piece_start = start;
        let mut count = 0;

        for (offset, _) in text[start..end].char_indices() {
            if count == self.max_chars {
                pieces.push((piece_start, start + offset, count));
                piece_start = start + offset;
                count = 0;
            }
            count += 1;
        }
        if count > 0 {
            pieces.push((piece_start, end, count));
        }
        pieces
    }
}

/// Chunk `text` with default page markers
pub fn chunk(text: &str, max_chars: usize) -> Vec<Chunk> {
    TextChunker::new(max_chars).chunk(text)
}

/// Byte spans of paragraphs, each including the blank lines that follow it
fn paragraph_spans(text: &str) -> Vec<(usize, usize)> {
    let mut spans = Vec::new();
    let mut seg_start = 0;
    let mut pos = 0;
    let mut has_content = false;
    let mut saw_blank = false;

    for line in text.split_inclusive('\n') {
        let blank = line.trim().is_empty();
        if !blank && saw_blank && has_content {
            spans.push((seg_start, pos));
            seg_start = pos;
            saw_blank = false;
        }
        if blank {
            saw_blank |= has_content;
        } else {
            has_content = true;
        }
        pos += line.len();
    }
    if seg_start < text.len() {
        spans.push((seg_start, text.len()));
    }
    spans
}
