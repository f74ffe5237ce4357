//! Character-window chunking for corpus ingestion.

use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::vector::Metadata;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkerConfig {
    /// Maximum chunk size in characters
    pub chunk_size: usize,
    /// Overlap between consecutive chunks
    pub chunk_overlap: usize,
}

impl Default for ChunkerConfig {
    fn default() -> Self {
        Self {
            chunk_size: 1000,
            chunk_overlap: 100,
        }
    }
}

/// A text chunk with source information.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextChunk {
    pub text: String,
    /// Source identifier (file name, URL, ...)
    pub source: String,
    /// Character offset in the original document
    pub start_offset: usize,
    pub chunk_index: usize,
}

impl TextChunk {
    pub fn metadata(&self) -> Metadata {
        let value = json!({
            "source": self.source,
            "chunk_index": self.chunk_index,
            "start_offset": self.start_offset,
        });
        value.as_object().cloned().unwrap_or_default()
    }
}

pub struct Chunker {
    config: ChunkerConfig,
}

impl Chunker {
    pub fn new(config: ChunkerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ChunkerConfig {
        &self.config
    }

    /// Split text into overlapping chunks, preferring sentence boundaries.
    pub fn split(&self, text: &str, source: &str) -> Vec<TextChunk> {
        let chunk_size = self.config.chunk_size.max(1);
        let overlap = self.config.chunk_overlap;

        let mut chunks = Vec::new();
        let chars: Vec<char> = text.chars().collect();
        let total_chars = chars.len();

        let mut start = 0;

        while start < total_chars {
            let end = (start + chunk_size).min(total_chars);
            let window: String = chars[start..end].iter().collect();
            let is_last = end == total_chars;

            let final_text = if is_last {
                window.as_str()
            } else {
                cut_at_sentence_boundary(&window)
            };

            let trimmed = final_text.trim();
            if !trimmed.is_empty() {
                let leading = final_text
                    .chars()
                    .take_while(|c| c.is_whitespace())
                    .count();
                chunks.push(TextChunk {
                    text: trimmed.to_string(),
                    source: source.to_string(),
                    start_offset: start + leading,
                    chunk_index: chunks.len(),
                });
            }

            if is_last {
                break;
            }
            // Next window starts from the cut, not the window end.
            let kept = final_text.chars().count();
            start += kept.saturating_sub(overlap).max(1);
        }

        chunks
    }
}

/// Cut after the last sentence ending in the final fifth of the window.
fn cut_at_sentence_boundary(text: &str) -> &str {
    let sentence_endings = [". ", "! ", "? ", ".\n", "!\n", "?\n"];

    let char_count = text.chars().count();
    let search_start = text
        .char_indices()
        .nth((char_count * 80) / 100)
        .map(|(idx, _)| idx)
        .unwrap_or(text.len());
    let search_text = &text[search_start..];

    sentence_endings
        .iter()
        .filter_map(|ending| search_text.rfind(ending).map(|pos| pos + ending.len()))
        .max()
        .map(|cut| &text[..search_start + cut])
        .unwrap_or(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_with_overlap_and_sequential_indices() {
        let chunker = Chunker::new(ChunkerConfig {
            chunk_size: 100,
            chunk_overlap: 20,
        });

        let text = "This is a test. ".repeat(20);
        let chunks = chunker.split(&text, "polity.txt");

        assert!(chunks.len() >= 4);
        for (index, chunk) in chunks.iter().enumerate() {
            assert_eq!(chunk.chunk_index, index);
            assert!(chunk.text.chars().count() <= 100);
            assert_eq!(chunk.source, "polity.txt");
        }
        assert_eq!(chunks[1].start_offset, 76);
    }

    #[test]
    fn prefers_sentence_endings_near_the_window_end() {
        let chunker = Chunker::new(ChunkerConfig {
            chunk_size: 40,
            chunk_overlap: 0,
        });
        let text = "Article 21 protects life. And personal liberty of all persons.";
        let chunks = chunker.split(text, "a21");
        assert_eq!(chunks[0].text, "Article 21 protects life. And personal l");
        let chunks = Chunker::new(ChunkerConfig { chunk_size: 30, chunk_overlap: 0 })
            .split(text, "a21");
        assert_eq!(chunks[0].text, "Article 21 protects life.");
    }

    #[test]
    fn text_after_a_sentence_cut_is_kept() {
        let text = "Article 21 protects life. And personal liberty of all persons.";
        let chunks = Chunker::new(ChunkerConfig {
            chunk_size: 30,
            chunk_overlap: 0,
        })
        .split(text, "a21");

        let texts: Vec<&str> = chunks.iter().map(|c| c.text.as_str()).collect();
        assert_eq!(
            texts,
            vec!["Article 21 protects life.", "And personal liberty of all pe", "rsons."]
        );
        assert_eq!(chunks[1].start_offset, 26);
    }

    #[test]
    fn without_overlap_chunks_cover_the_whole_input() {
        let text = "The Parliament may by law admit new States. It may form new States. \
            Article 3 covers alteration of areas! Is consent required? Only a reference. "
            .repeat(5);
        let chunks = Chunker::new(ChunkerConfig {
            chunk_size: 70,
            chunk_overlap: 0,
        })
        .split(&text, "part1.txt");

        let squash = |s: &str| s.chars().filter(|c| !c.is_whitespace()).collect::<String>();
        let joined: String = chunks.iter().map(|c| squash(&c.text)).collect();
        assert_eq!(joined, squash(&text));
        assert!(chunks.iter().any(|c| c.text.starts_with("Article 3")));
    }

    #[test]
    fn offsets_point_at_the_first_kept_character() {
        let text = "   Preamble. We the people of India, having solemnly resolved.";
        let chunks = Chunker::new(ChunkerConfig {
            chunk_size: 20,
            chunk_overlap: 0,
        })
        .split(text, "preamble.txt");

        for chunk in &chunks {
            let first = chunk.text.chars().next().unwrap();
            assert_eq!(text.chars().nth(chunk.start_offset), Some(first));
        }
        assert_eq!(chunks[0].start_offset, 3);
    }

    #[test]
    fn handles_multibyte_text() {
        let chunker = Chunker::new(ChunkerConfig {
            chunk_size: 10,
            chunk_overlap: 2,
        });
        let chunks = chunker.split("अनुच्छेद २१ जीवन और व्यक्तिगत स्वतंत्रता। ", "hi");
        assert!(!chunks.is_empty());
    }

    #[test]
    fn empty_text_yields_no_chunks() {
        let chunker = Chunker::new(ChunkerConfig::default());
        assert!(chunker.split("", "empty").is_empty());
        assert!(chunker.split("   \n  ", "blank").is_empty());
    }

    #[test]
    fn metadata_carries_source_and_index() {
        let chunk = TextChunk {
            text: "x".into(),
            source: "part3.txt".into(),
            start_offset: 0,
            chunk_index: 2,
        };
        let metadata = chunk.metadata();
        assert_eq!(metadata["source"], "part3.txt");
        assert_eq!(metadata["chunk_index"], 2);
    }
}
