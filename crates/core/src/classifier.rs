//! Keyword-based question categories and the retrieval breadth each one gets.

use serde::{Deserialize, Serialize};
use std::fmt;

const SUMMARY_KEYWORDS: &[&str] = &[
    "summary",
    "summarize",
    "overview",
    "main points",
    "key findings",
    "conclusion",
    "what is the gist",
    "briefly explain",
];

const PROCEDURE_KEYWORDS: &[&str] = &[
    "step",
    "steps",
    "process",
    "procedure",
    "how to",
    "how do",
    "method",
    "way",
    "list",
    "sequence",
    "order",
    "workflow",
];

const COMPARE_KEYWORDS: &[&str] = &[
    "compare",
    "difference",
    "different",
    "versus",
    "vs",
    "vs.",
    "similar",
    "similarity",
    "analyze",
    "analysis",
    "contrast",
    "relationship",
    "between",
];

const FACT_KEYWORDS: &[&str] = &[
    "what is",
    "what are",
    "who is",
    "when",
    "where",
    "which",
    "define",
    "definition",
    "meaning",
];

/// Fact questions must stay below this many whitespace-separated words.
const FACT_MAX_WORDS: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum QuestionCategory {
    Summary,
    Fact,
    Procedure,
    CompareAnalyze,
    Default,
}

impl QuestionCategory {
    pub fn label(self) -> &'static str {
        match self {
            Self::Summary => "Summary",
            Self::Fact => "Fact",
            Self::Procedure => "Procedure",
            Self::CompareAnalyze => "Compare/Analyze",
            Self::Default => "Default",
        }
    }
}

impl fmt::Display for QuestionCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Number of chunks to retrieve per category.
///
/// The defaults are heuristics; corpora with very long or very short
/// documents usually want different values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetrievalProfile {
    pub summary: usize,
    pub procedure: usize,
    pub compare: usize,
    pub fact: usize,
    pub default: usize,
}

impl Default for RetrievalProfile {
    fn default() -> Self {
        Self {
            summary: 40,
            procedure: 40,
            compare: 30,
            fact: 8,
            default: 25,
        }
    }
}

impl RetrievalProfile {
    pub fn result_count(&self, category: QuestionCategory) -> usize {
        match category {
            QuestionCategory::Summary => self.summary,
            QuestionCategory::Fact => self.fact,
            QuestionCategory::Procedure => self.procedure,
            QuestionCategory::CompareAnalyze => self.compare,
            QuestionCategory::Default => self.default,
        }
    }

    pub fn classify(&self, question: &str) -> (QuestionCategory, usize) {
        let category = categorize(question);
        (category, self.result_count(category))
    }
}

/// Classifies with the default retrieval counts.
pub fn classify(question: &str) -> (QuestionCategory, usize) {
    RetrievalProfile::default().classify(question)
}

/// First matching keyword group wins: summary, procedure, compare, then fact.
pub fn categorize(question: &str) -> QuestionCategory {
    let lowered = question.to_lowercase();
    let mentions = |keywords: &[&str]| keywords.iter().any(|keyword| lowered.contains(keyword));

    if mentions(SUMMARY_KEYWORDS) {
        QuestionCategory::Summary
    } else if mentions(PROCEDURE_KEYWORDS) {
        QuestionCategory::Procedure
    } else if mentions(COMPARE_KEYWORDS) {
        QuestionCategory::CompareAnalyze
    } else if mentions(FACT_KEYWORDS) && question.split_whitespace().count() < FACT_MAX_WORDS {
        QuestionCategory::Fact
    } else {
        QuestionCategory::Default
    }
}
