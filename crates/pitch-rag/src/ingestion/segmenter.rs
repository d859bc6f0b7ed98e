//! Text segmentation with boundary-aware cuts and overlap

use unicode_segmentation::UnicodeSegmentation;

use crate::config::SegmenterConfig;
use crate::error::{Error, Result};

/// Splits raw transcript text into overlapping units along preferred
/// boundary markers.
///
/// Markers are tried from most- to least-preferred; the cut is placed after
/// the last occurrence of the first marker found inside the size window.
/// When no marker lands in the window the text is hard-cut at `max_size`.
/// Each unit after the first re-includes up to `overlap` trailing characters
/// of the previous unit so context is not lost at cut points; the overlap is
/// counted against `max_size`, so no unit ever exceeds the bound.
#[derive(Debug, Clone)]
pub struct Segmenter {
    /// Upper bound in characters per unit
    max_size: usize,
    /// Characters re-included between consecutive units
    overlap: usize,
    /// Separator strings tried from most- to least-preferred
    markers: Vec<String>,
}

impl Segmenter {
    /// Create a new segmenter. Fails fast when `overlap >= max_size`, which
    /// would prevent the cut position from ever advancing.
    pub fn new(max_size: usize, overlap: usize, markers: Vec<String>) -> Result<Self> {
        if max_size == 0 {
            return Err(Error::segmentation("max_size must be positive"));
        }
        if overlap >= max_size {
            return Err(Error::Segmentation(format!(
                "overlap ({}) must be smaller than max_size ({})",
                overlap, max_size
            )));
        }

        Ok(Self {
            max_size,
            overlap,
            markers,
        })
    }

    /// Create a segmenter from configuration
    pub fn from_config(config: &SegmenterConfig) -> Result<Self> {
        Self::new(
            config.max_size,
            config.overlap,
            config.boundary_markers.clone(),
        )
    }

    /// Split `text` into ordered units. Empty input yields an empty sequence;
    /// input at or under `max_size` yields exactly one unit.
    ///
    /// Units preserve the source text verbatim: concatenating each unit's
    /// non-overlapping portion reproduces the input exactly.
    pub fn segment(&self, text: &str) -> Vec<String> {
        if text.is_empty() {
            return Vec::new();
        }

        // Byte offset of every char boundary, plus one past the end.
        let boundaries: Vec<usize> = text
            .char_indices()
            .map(|(i, _)| i)
            .chain(std::iter::once(text.len()))
            .collect();
        let total_chars = boundaries.len() - 1;

        if total_chars <= self.max_size {
            return vec![text.to_string()];
        }

        let mut units = Vec::new();
        // Char index of the last committed cut; unit N+1's fresh text starts here.
        let mut cut = 0usize;
        loop {
            let start = if cut == 0 {
                0
            } else {
                self.overlap_start(text, &boundaries, cut)
            };
            let window_end = (start + self.max_size).min(total_chars);
            if window_end == total_chars {
                units.push(text[boundaries[start]..].to_string());
                break;
            }

            let next = self.find_cut(text, &boundaries, cut, window_end);
            units.push(text[boundaries[start]..boundaries[next]].to_string());
            cut = next;
        }

        units
    }

    /// Find the cut position (char index) in `(cut, window_end]`.
    fn find_cut(&self, text: &str, boundaries: &[usize], cut: usize, window_end: usize) -> usize {
        let lo = boundaries[cut];
        let hi = boundaries[window_end];
        let window = &text[lo..hi];

        for marker in &self.markers {
            if marker.is_empty() {
                continue;
            }
            if let Some(pos) = window.rfind(marker.as_str()) {
                return char_index(boundaries, lo + pos + marker.len());
            }
        }

        self.hard_cut(text, boundaries, cut, window_end)
    }

    /// Hard cut at `window_end`, pulled back to a grapheme boundary so a
    /// cluster is never split in two.
    fn hard_cut(&self, text: &str, boundaries: &[usize], cut: usize, window_end: usize) -> usize {
        let lo = boundaries[cut];
        let hi = boundaries[window_end];

        let mut best = lo;
        for (offset, grapheme) in text[lo..].grapheme_indices(true) {
            let end = lo + offset + grapheme.len();
            if end > hi {
                break;
            }
            best = end;
            if best == hi {
                break;
            }
        }

        if best == lo {
            // A single grapheme wider than the whole window; cut it anyway.
            best = hi;
        }
        char_index(boundaries, best)
    }

    /// Char index where the overlap region of the unit after `cut` begins.
    ///
    /// Starts up to `overlap` characters before the cut, advanced to just
    /// past the first marker inside that tail when one exists, so the
    /// re-included text begins at a clean boundary.
    fn overlap_start(&self, text: &str, boundaries: &[usize], cut: usize) -> usize {
        if self.overlap == 0 {
            return cut;
        }

        let from = cut.saturating_sub(self.overlap);
        let lo = boundaries[from];
        let hi = boundaries[cut];
        let tail = &text[lo..hi];

        for marker in &self.markers {
            if marker.is_empty() {
                continue;
            }
            if let Some(pos) = tail.find(marker.as_str()) {
                let start = lo + pos + marker.len();
                if start < hi {
                    return char_index(boundaries, start);
                }
            }
        }

        from
    }
}

/// Map a byte offset that is known to be a char boundary back to its char index.
fn char_index(boundaries: &[usize], byte: usize) -> usize {
    boundaries.partition_point(|&b| b < byte)
}
