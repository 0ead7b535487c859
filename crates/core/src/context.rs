use crate::models::{Citation, RetrievedChunk, Source, SourceKey};
use std::collections::HashMap;

/// Chunks at or beyond this cosine distance are treated as unrelated.
pub const DEFAULT_SIMILARITY_THRESHOLD: f32 = 0.8;

/// Numbered, deduplicated sources ready to be placed in a prompt.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssembledContext {
    pub context: String,
    pub citations: Vec<Citation>,
    pub sources: Vec<Source>,
}

impl AssembledContext {
    pub fn source_count(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }
}

/// Keeps chunks whose distance is absent or strictly below `threshold`,
/// preserving rank order.
pub fn filter_relevant(chunks: Vec<RetrievedChunk>, threshold: f32) -> Vec<RetrievedChunk> {
    chunks
        .into_iter()
        .filter(|chunk| is_relevant(chunk, threshold))
        .collect()
}

fn is_relevant(chunk: &RetrievedChunk, threshold: f32) -> bool {
    chunk.distance.map_or(true, |distance| distance < threshold)
}

/// Drops chunks at or beyond `threshold`, then groups the rest by
/// `(document, page)` and numbers the groups in the order they are first seen.
pub fn assemble(chunks: &[RetrievedChunk], threshold: f32) -> AssembledContext {
    let mut positions = HashMap::<SourceKey, usize>::new();
    let mut sources = Vec::<Source>::new();

    for chunk in chunks.iter().filter(|chunk| is_relevant(chunk, threshold)) {
        let key = chunk.metadata.source_key();
        match positions.get(&key).copied() {
            Some(position) => sources[position].chunks.push(chunk.text.clone()),
            None => {
                positions.insert(key.clone(), sources.len());
                sources.push(Source {
                    source_num: sources.len() + 1,
                    key,
                    chunks: vec![chunk.text.clone()],
                });
            }
        }
    }

    let context = sources
        .iter()
        .map(|source| {
            format!(
                "[Source {} - Page {}]: {}",
                source.source_num,
                source.key.page,
                source.combined_text()
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n");

    let citations = sources.iter().map(Source::citation).collect();

    AssembledContext {
        context,
        citations,
        sources,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ChunkMetadata;

    fn retrieved(text: &str, document: &str, page: u32, distance: Option<f32>) -> RetrievedChunk {
        RetrievedChunk {
            text: text.to_string(),
            metadata: ChunkMetadata {
                source_document: document.to_string(),
                page,
                chunk_index: 0,
                total_pages: 10,
            },
            distance,
        }
    }

    #[test]
    fn threshold_is_exclusive_and_absent_distance_is_kept() {
        let chunks = vec![
            retrieved("at threshold", "a.pdf", 1, Some(0.8)),
            retrieved("just below", "a.pdf", 2, Some(0.79)),
            retrieved("no distance", "a.pdf", 3, None),
        ];

        let kept = filter_relevant(chunks, DEFAULT_SIMILARITY_THRESHOLD);

        let texts = kept.iter().map(|chunk| chunk.text.as_str()).collect::<Vec<_>>();
        assert_eq!(texts, vec!["just below", "no distance"]);
    }

    #[test]
    fn same_document_and_page_merge_into_one_source() {
        let chunks = vec![
            retrieved("First part.", "manual.pdf", 4, Some(0.2)),
            retrieved("Second part.", "manual.pdf", 4, Some(0.3)),
        ];

        let assembled = assemble(&chunks, DEFAULT_SIMILARITY_THRESHOLD);

        assert_eq!(assembled.source_count(), 1);
        assert_eq!(assembled.citations.len(), 1);
        assert_eq!(assembled.sources[0].combined_text(), "First part. Second part.");
        assert_eq!(
            assembled.context,
            "[Source 1 - Page 4]: First part. Second part."
        );
        assert_eq!(assembled.citations[0].text_snippet, "First part.");
    }

    #[test]
    fn sources_are_numbered_in_first_seen_order() {
        let chunks = vec![
            retrieved("b2", "b.pdf", 2, None),
            retrieved("a1", "a.pdf", 1, None),
            retrieved("b2 again", "b.pdf", 2, None),
            retrieved("a2", "a.pdf", 2, None),
        ];

        let assembled = assemble(&chunks, DEFAULT_SIMILARITY_THRESHOLD);

        let numbered = assembled
            .citations
            .iter()
            .map(|citation| (citation.source, citation.pdf_filename.as_str(), citation.page))
            .collect::<Vec<_>>();
        assert_eq!(numbered, vec![(1, "b.pdf", 2), (2, "a.pdf", 1), (3, "a.pdf", 2)]);
        assert_eq!(
            assembled.context,
            "[Source 1 - Page 2]: b2 b2 again\n\n[Source 2 - Page 1]: a1\n\n[Source 3 - Page 2]: a2"
        );
    }

    #[test]
    fn same_page_in_different_documents_stays_separate() {
        let chunks = vec![
            retrieved("x", "a.pdf", 1, None),
            retrieved("y", "b.pdf", 1, None),
        ];
        assert_eq!(assemble(&chunks, DEFAULT_SIMILARITY_THRESHOLD).source_count(), 2);
    }

    #[test]
    fn threshold_excluded_chunk_never_becomes_a_source() {
        let chunks = vec![
            retrieved("A", "doc.pdf", 1, Some(0.1)),
            retrieved("B", "doc.pdf", 2, Some(0.85)),
            retrieved("C", "doc.pdf", 1, Some(0.3)),
        ];

        let assembled = assemble(&chunks, DEFAULT_SIMILARITY_THRESHOLD);

        assert_eq!(assembled.source_count(), 1);
        assert_eq!(assembled.context, "[Source 1 - Page 1]: A C");
        assert_eq!(assembled.sources[0].combined_text(), "A C");
        assert!(!assembled.context.contains('B'));
        assert_eq!(assembled.citations[0].page, 1);
    }

    #[test]
    fn custom_threshold_is_honoured() {
        let chunks = vec![
            retrieved("close", "doc.pdf", 1, Some(0.2)),
            retrieved("loose", "doc.pdf", 2, Some(0.5)),
        ];

        let assembled = assemble(&chunks, 0.3);

        assert_eq!(assembled.source_count(), 1);
        assert_eq!(assembled.citations[0].page, 1);
    }

    #[test]
    fn empty_input_assembles_nothing() {
        let assembled = assemble(&[], DEFAULT_SIMILARITY_THRESHOLD);
        assert!(assembled.is_empty());
        assert!(assembled.context.is_empty());
        assert!(assembled.citations.is_empty());
    }
}
