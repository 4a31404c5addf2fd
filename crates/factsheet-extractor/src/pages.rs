//! Page markers embedded by the document converter
//!
//! The converter places a marker token before each page's content. A piece
//! of text belongs to the page of the last marker at or before it.

use crate::error::ExtractorError;
use factsheet_domain::Page;
use regex::Regex;

/// Default marker: `<!-- page 12 -->` or `[page 12]`, case-insensitive
pub const DEFAULT_PAGE_MARKER_PATTERN: &str =
    r"(?i)(?:<!--\s*page[\s:]*(\d+)\s*-->|\[page[\s:]*(\d+)\])";

/// Compiled page marker matcher
#[derive(Debug, Clone)]
pub struct PageMarkers {
    regex: Regex,
}

impl PageMarkers {
    /// Compile a marker pattern; the first participating capture group must be the page number
    pub fn new(pattern: &str) -> Result<Self, ExtractorError> {
        Ok(Self {
            regex: Regex::new(pattern)?,
        })
    }

    /// All markers in `text` as (byte offset, page number), in order
    pub fn find_all(&self, text: &str) -> Vec<(usize, u32)> {
        self.regex
            .captures_iter(text)
            .filter_map(|caps| {
                let start = caps.get(0)?.start();
                let number = caps
                    .iter()
                    .skip(1)
                    .flatten()
                    .find_map(|m| m.as_str().parse().ok())?;
                Some((start, number))
            })
            .collect()
    }

    /// Page of the last marker in `text` starting at or before `offset`
    pub fn page_at(&self, text: &str, offset: usize) -> Option<u32> {
        page_in(&self.find_all(text), offset)
    }
}

impl Default for PageMarkers {
    fn default() -> Self {
        Self {
            regex: Regex::new(DEFAULT_PAGE_MARKER_PATTERN).expect("default page marker pattern compiles"),
        }
    }
}

/// Look up the page at `offset` in a marker list produced by [`PageMarkers::find_all`]
pub fn page_in(markers: &[(usize, u32)], offset: usize) -> Option<u32> {
    let idx = markers.partition_point(|(start, _)| *start <= offset);
    idx.checked_sub(1).map(|i| markers[i].1)
}

/// Convert an optional page number to a [`Page`]
pub fn to_page(number: Option<u32>) -> Page {
    number.map(Page::Number).unwrap_or(Page::Unknown)
}
