use crate::core::errors::ApiError;

/// Splits document text into ordered, non-overlapping retrieval units.
///
/// Fixed-size character windows, snapped back to the nearest sentence ending
/// in the last fifth of the window so units do not cut sentences in half.
/// Deterministic for identical input; whitespace-only windows are skipped.
#[derive(Debug, Clone)]
pub struct Chunker {
    chunk_size: usize,
}

impl Chunker {
    pub fn new(chunk_size: usize) -> Self {
        Self {
            chunk_size: chunk_size.max(1),
        }
    }

    pub fn chunk(&self, full_text: &str) -> Result<Vec<String>, ApiError> {
        if full_text.trim().is_empty() {
            return Err(ApiError::InvalidInput(
                "document text is empty".to_string(),
            ));
        }

        let chars: Vec<char> = full_text.chars().collect();
        let total = chars.len();

        let mut units = Vec::new();
        let mut start = 0;

        while start < total {
            let end = (start + self.chunk_size).min(total);
            let cut = if end < total {
                sentence_boundary(&chars[start..end])
                    .map(|rel| start + rel)
                    .unwrap_or(end)
            } else {
                end
            };

            let text: String = chars[start..cut].iter().collect();
            let trimmed = text.trim();
            if !trimmed.is_empty() {
                units.push(trimmed.to_string());
            }

            start = cut;
        }

        Ok(units)
    }
}

/// Find a cut point just after a sentence ending in the last 20% of the
/// window. Returns an offset relative to the window start, or None when the
/// window has no usable boundary.
fn sentence_boundary(window: &[char]) -> Option<usize> {
    let search_start = (window.len() * 80) / 100;

    let mut idx = window.len();
    while idx > search_start.max(1) {
        let prev = window[idx - 1];
        if matches!(prev, '.' | '!' | '?')
            && window.get(idx).map(|c| c.is_whitespace()).unwrap_or(false)
        {
            return Some(idx + 1);
        }
        idx -= 1;
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_empty_and_whitespace_input() {
        let chunker = Chunker::new(100);
        assert!(matches!(
            chunker.chunk(""),
            Err(ApiError::InvalidInput(_))
        ));
        assert!(matches!(
            chunker.chunk("   \n\t "),
            Err(ApiError::InvalidInput(_))
        ));
    }

    #[test]
    fn short_text_becomes_a_single_unit() {
        let chunker = Chunker::new(500);
        let units = chunker.chunk("A short document.").unwrap();
        assert_eq!(units, vec!["A short document.".to_string()]);
    }

    #[test]
    fn long_text_splits_into_ordered_nonempty_units() {
        let chunker = Chunker::new(100);
        let text = "This is a sentence about something. ".repeat(20);
        let units = chunker.chunk(&text).unwrap();

        assert!(units.len() > 1);
        assert!(units.iter().all(|u| !u.trim().is_empty()));

        // source order: each unit appears in the original at or after the
        // previous unit's position
        let mut cursor = 0;
        for unit in &units {
            let pos = text[cursor..]
                .find(unit.as_str())
                .expect("unit missing from source");
            cursor += pos + unit.len();
        }
    }

    #[test]
    fn splitting_is_deterministic() {
        let chunker = Chunker::new(120);
        let text = "One sentence here. Another one there! A question? ".repeat(10);
        assert_eq!(chunker.chunk(&text).unwrap(), chunker.chunk(&text).unwrap());
    }

    #[test]
    fn windows_snap_to_sentence_endings() {
        // sentence ends inside the last fifth of each 50-char window, so
        // every unit snaps back to exactly one sentence
        let sentence = "The quick brown fox jumps over the lazy dog.";
        let text = format!("{sentence} ").repeat(8);
        let chunker = Chunker::new(50);

        let units = chunker.chunk(&text).unwrap();
        assert_eq!(units, vec![sentence.to_string(); 8]);
    }
}
