//! Reconciles the `[Source N]` markers an LLM wrote with the sources it was given.
//!
//! Parsing is best effort: markers naming unknown sources are left alone and an
//! answer without any usable marker keeps every citation.

use crate::models::{Answer, Citation};
use regex::{Captures, Regex};
use std::collections::{BTreeSet, HashMap};
use std::sync::OnceLock;
use tracing::debug;

fn marker_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?i)\[Source\s+(\d+)\]").unwrap_or_else(|error| {
            unreachable!("citation marker pattern is a valid literal: {error}")
        })
    })
}

/// Source numbers referenced in `answer` that exist in `citations`.
pub fn cited_sources(answer: &str, citations: &[Citation]) -> BTreeSet<usize> {
    marker_pattern()
        .captures_iter(answer)
        .filter_map(|captures| captures.get(1)?.as_str().parse::<usize>().ok())
        .filter(|number| citations.iter().any(|citation| citation.source == *number))
        .collect()
}

/// Keeps only the cited sources, renumbers them densely from 1 in ascending
/// source order, and rewrites the markers in the answer to match.
pub fn reconcile(raw_answer: &str, citations: &[Citation]) -> Answer {
    let cited = cited_sources(raw_answer, citations);

    if cited.is_empty() {
        debug!(citations = citations.len(), "answer cites no known source, keeping all citations");
        return Answer {
            answer: raw_answer.to_string(),
            citations: citations.to_vec(),
        };
    }

    let mut kept = citations
        .iter()
        .filter(|citation| cited.contains(&citation.source))
        .cloned()
        .collect::<Vec<_>>();
    kept.sort_by_key(|citation| citation.source);
    kept.dedup_by_key(|citation| citation.source);

    let mut remap = HashMap::with_capacity(kept.len());
    for (position, citation) in kept.iter_mut().enumerate() {
        remap.insert(citation.source, position + 1);
        citation.source = position + 1;
    }

    let answer = marker_pattern()
        .replace_all(raw_answer, |captures: &Captures<'_>| {
            let renumbered = captures
                .get(1)
                .and_then(|number| number.as_str().parse::<usize>().ok())
                .and_then(|number| remap.get(&number));

            match renumbered {
                Some(number) => format!("[Source {number}]"),
                None => captures[0].to_string(),
            }
        })
        .into_owned();

    debug!(kept = kept.len(), offered = citations.len(), "reconciled citations");
    Answer {
        answer,
        citations: kept,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn citations(count: usize) -> Vec<Citation> {
        (1..=count)
            .map(|source| Citation {
                source,
                pdf_filename: format!("doc{source}.pdf"),
                page: source as u32,
                text_snippet: format!("snippet {source}"),
            })
            .collect()
    }

    #[test]
    fn answer_without_markers_keeps_everything_unchanged() {
        let offered = citations(3);
        let answer = reconcile("The pump runs at 5 bar.", &offered);

        assert_eq!(answer.answer, "The pump runs at 5 bar.");
        assert_eq!(answer.citations, offered);
    }

    #[test]
    fn only_unknown_markers_fall_back_to_all_citations() {
        let offered = citations(2);
        let answer = reconcile("See [Source 9].", &offered);

        assert_eq!(answer.answer, "See [Source 9].");
        assert_eq!(answer.citations, offered);
    }

    #[test]
    fn cited_sources_are_filtered_and_renumbered() {
        let offered = citations(5);
        let raw = "Pressure is 5 bar [Source 4]. Flow is steady [source 2]. Again [Source 4].";

        let answer = reconcile(raw, &offered);

        assert_eq!(
            answer.answer,
            "Pressure is 5 bar [Source 2]. Flow is steady [Source 1]. Again [Source 2]."
        );
        let kept = answer
            .citations
            .iter()
            .map(|citation| (citation.source, citation.pdf_filename.as_str()))
            .collect::<Vec<_>>();
        assert_eq!(kept, vec![(1, "doc2.pdf"), (2, "doc4.pdf")]);
    }

    #[test]
    fn unknown_markers_are_left_verbatim_next_to_valid_ones() {
        let offered = citations(3);
        let answer = reconcile("Known [Source 3], unknown [SOURCE 12].", &offered);

        assert_eq!(answer.answer, "Known [Source 1], unknown [SOURCE 12].");
        assert_eq!(answer.citations.len(), 1);
        assert_eq!(answer.citations[0].pdf_filename, "doc3.pdf");
    }

    #[test]
    fn renumbering_is_a_bijection_preserving_order() {
        let offered = citations(8);
        let answer = reconcile("[Source 7] [Source 2] [Source 5] [Source 2]", &offered);

        let numbers = answer.citations.iter().map(|c| c.source).collect::<Vec<_>>();
        let files = answer
            .citations
            .iter()
            .map(|c| c.pdf_filename.as_str())
            .collect::<Vec<_>>();
        assert_eq!(numbers, vec![1, 2, 3]);
        assert_eq!(files, vec!["doc2.pdf", "doc5.pdf", "doc7.pdf"]);
        assert_eq!(answer.answer, "[Source 3] [Source 1] [Source 2] [Source 1]");
    }

    #[test]
    fn overflowing_numbers_are_ignored() {
        let offered = citations(1);
        let raw = "[Source 99999999999999999999999] and [Source 1]";
        let answer = reconcile(raw, &offered);

        assert_eq!(answer.answer, raw);
        assert_eq!(answer.citations, offered);
    }

    #[test]
    fn extra_whitespace_inside_marker_is_accepted() {
        let offered = citations(2);
        let answer = reconcile("Fact [Source   2].", &offered);
        assert_eq!(answer.answer, "Fact [Source 1].");
        assert_eq!(answer.citations[0].pdf_filename, "doc2.pdf");
    }
}
