//! Overlapping character-window splitter.
//!
//! Splits raw book text into fixed-size segments where each segment shares its
//! leading characters with the tail of the previous one. The overlap keeps
//! sentences that straddle a cut boundary intact in at least one segment, so
//! no information is lost to the split itself.
//!
//! Sizes are measured in characters, not bytes: the corpus mixes Latin and
//! Devanagari script, and slicing on byte offsets would panic mid-codepoint.
//!
//! # Examples
//!
//! ```
//! use ritesmith::ingestion::overlapping_chunks;
//!
//! let chunks: Vec<&str> = overlapping_chunks("abcdefgh", 4, 2).collect();
//! assert_eq!(chunks, ["abcd", "cdef", "efgh"]);
//! ```

/// Returns a lazy iterator over overlapping windows of `text`.
///
/// Each window holds `size` characters except possibly the last, and
/// consecutive windows overlap by `overlap` characters. The windows cover the
/// whole input in order; an empty input yields no windows. The iterator is
/// `Clone`, so a traversal can be restarted from any saved position.
///
/// # Panics
///
/// Panics if `size` is zero or `overlap >= size`; both are programming errors
/// in the caller, not data-dependent conditions.
pub fn overlapping_chunks(text: &str, size: usize, overlap: usize) -> Chunks<'_> {
    assert!(size > 0, "chunk size must be positive");
    assert!(overlap < size, "overlap must be smaller than chunk size");
    Chunks {
        text,
        size,
        step: size - overlap,
        pos: 0,
        done: text.is_empty(),
    }
}

/// Iterator state for [`overlapping_chunks`].
#[derive(Clone, Debug)]
pub struct Chunks<'a> {
    text: &'a str,
    size: usize,
    step: usize,
    pos: usize,
    done: bool,
}

impl<'a> Iterator for Chunks<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<&'a str> {
        if self.done {
            return None;
        }
        let rest = &self.text[self.pos..];

        // Walk the next window's characters once, noting where the next
        // window starts (`step` chars in) and where this one ends.
        let mut step_bytes = None;
        let mut end_bytes = rest.len();
        for (count, (offset, _)) in rest.char_indices().enumerate() {
            if count == self.step {
                step_bytes = Some(offset);
            }
            if count == self.size {
                end_bytes = offset;
                break;
            }
        }

        let chunk = &rest[..end_bytes];
        if end_bytes == rest.len() {
            // Fewer than `size` characters remained: this window is the last.
            self.done = true;
        } else {
            // step < size, so the step offset was recorded before the break.
            self.pos += step_bytes.expect("step offset recorded before window end");
        }
        Some(chunk)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn covers_input_in_order() {
        let chunks: Vec<&str> = overlapping_chunks("abcdefghij", 4, 1).collect();
        assert_eq!(chunks, ["abcd", "defg", "ghij"]);
    }

    #[test]
    fn dropping_overlap_reconstructs_input() {
        let text = "The lamp is lit before sunrise. Flowers are offered next. \
                    Water is poured from the kalash while the mantra is recited.";
        let overlap = 7;
        let chunks: Vec<&str> = overlapping_chunks(text, 25, overlap).collect();

        let mut rebuilt = String::from(chunks[0]);
        for chunk in &chunks[1..] {
            rebuilt.extend(chunk.chars().skip(overlap));
        }
        assert_eq!(rebuilt, text);
    }

    #[test]
    fn short_input_yields_single_chunk() {
        let chunks: Vec<&str> = overlapping_chunks("short", 100, 10).collect();
        assert_eq!(chunks, ["short"]);
    }

    #[test]
    fn empty_input_yields_nothing() {
        assert_eq!(overlapping_chunks("", 10, 2).count(), 0);
    }

    #[test]
    fn exact_multiple_has_no_trailing_fragment() {
        let chunks: Vec<&str> = overlapping_chunks("abcdef", 4, 2).collect();
        assert_eq!(chunks, ["abcd", "cdef"]);
    }

    #[test]
    fn clone_restarts_traversal() {
        let iter = overlapping_chunks("abcdefghij", 4, 2);
        let first: Vec<&str> = iter.clone().collect();
        let second: Vec<&str> = iter.collect();
        assert_eq!(first, second);
    }

    #[test]
    fn devanagari_text_splits_on_character_boundaries() {
        let text = "ॐ नमः शिवाय ॐ नमः शिवाय ॐ नमः शिवाय";
        let chunks: Vec<&str> = overlapping_chunks(text, 10, 3).collect();
        assert!(!chunks.is_empty());
        for chunk in &chunks {
            assert!(chunk.chars().count() <= 10);
        }
        let mut rebuilt = String::from(chunks[0]);
        for chunk in &chunks[1..] {
            rebuilt.extend(chunk.chars().skip(3));
        }
        assert_eq!(rebuilt, text);
    }

    #[test]
    #[should_panic(expected = "overlap must be smaller")]
    fn rejects_overlap_equal_to_size() {
        overlapping_chunks("abc", 4, 4);
    }
}
