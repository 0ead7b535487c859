use crate::error::IngestError;
use crate::models::Chunk;

pub const DEFAULT_CHUNK_SIZE: usize = 500;

const SENTENCE_SEPARATOR: &str = ". ";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkingConfig {
    pub target_size: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            target_size: DEFAULT_CHUNK_SIZE,
        }
    }
}

impl ChunkingConfig {
    pub fn validate(&self) -> Result<(), IngestError> {
        if self.target_size == 0 {
            return Err(IngestError::InvalidChunkConfig(
                "target_size must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

/// Splits `text` into pieces of at most `target_size` characters, preferring
/// sentence boundaries and falling back to fixed-width cuts.
///
/// Pieces are returned untrimmed; dropping blank pieces is the caller's job.
pub fn chunk_text(text: &str, target_size: usize) -> Vec<String> {
    if text.is_empty() {
        return Vec::new();
    }

    let target_size = target_size.max(1);
    if char_len(text) <= target_size {
        return vec![text.to_string()];
    }

    let flattened = text.replace('\n', " ");
    let sentences = flattened.split(SENTENCE_SEPARATOR).collect::<Vec<_>>();
    let last = sentences.len() - 1;

    let mut packed = Vec::new();
    let mut current = String::new();

    for (position, sentence) in sentences.iter().enumerate() {
        if !current.is_empty() && char_len(&current) + char_len(sentence) > target_size {
            packed.push(std::mem::take(&mut current));
        }

        current.push_str(sentence);
        if position < last {
            current.push_str(SENTENCE_SEPARATOR);
        }
    }

    if !current.is_empty() {
        packed.push(current);
    }

    let mut chunks = Vec::new();
    for chunk in packed {
        if char_len(&chunk) <= target_size {
            chunks.push(chunk);
            continue;
        }

        let chars: Vec<char> = chunk.chars().collect();
        chunks.extend(
            chars
                .chunks(target_size)
                .map(|piece| piece.iter().collect::<String>()),
        );
    }

    chunks
}

/// Chunks one page and keeps the non-blank pieces. `chunk_index` is the
/// piece's position before blanks are dropped, so indexes may have gaps.
pub fn build_page_chunks(
    page: u32,
    total_pages: u32,
    page_text: &str,
    config: &ChunkingConfig,
) -> Result<Vec<Chunk>, IngestError> {
    config.validate()?;

    let chunks = chunk_text(page_text, config.target_size)
        .into_iter()
        .enumerate()
        .map(|(index, piece)| (index, piece.trim().to_string()))
        .filter(|(_, text)| !text.is_empty())
        .map(|(index, text)| Chunk {
            text,
            page,
            chunk_index: index as u32,
            total_pages,
        })
        .collect();

    Ok(chunks)
}

fn char_len(text: &str) -> usize {
    text.chars().count()
}
