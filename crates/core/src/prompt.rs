use crate::classifier::QuestionCategory;

pub const SYSTEM_PROMPT: &str = "You are a helpful assistant that answers questions based on provided context. \
Always format your answers using Markdown with proper spacing, bold text for key terms, lists, and clear paragraph breaks. \
Always cite your sources.";

const BASE_INSTRUCTIONS: &str = "You are a helpful assistant that answers questions based on the provided context from PDF documents.
CRITICAL: Use ONLY the information from the context to answer the question.

If the context does NOT contain relevant information to answer the question, you MUST clearly state:
\"I cannot answer this question based on the provided PDF documents. The documents do not contain information about [topic].\"

DO NOT make up information or use knowledge outside the provided context. If the question is about something not in the documents, explicitly say so.

IMPORTANT FORMATTING REQUIREMENTS:
1. Format your answer using Markdown for better readability:
   - Use **bold** for key terms and important concepts
   - Use bullet points (-) or numbered lists for multiple items
   - Use line breaks to separate paragraphs
   - Use headings (##) for main sections if the answer is long
2. Cite ALL relevant sources: Use [Source 1], [Source 2], etc. for each piece of information you reference.";

const SUMMARY_INSTRUCTIONS: &str = "SPECIFIC INSTRUCTIONS FOR SUMMARY QUESTIONS:
- Extract core conclusions and key findings
- Ignore minor details, focus on main points
- Keep the answer concise and well-structured
- Organize information logically (most important points first)
- Use bullet points or short paragraphs
- Cite sources for each main point";

const FACT_INSTRUCTIONS: &str = "SPECIFIC INSTRUCTIONS FOR FACTUAL QUESTIONS:
- Answer the specific question directly and precisely
- Cite the source for the fact
- Do not expand on unrelated information
- Keep the answer focused and concise
- If multiple sources mention the same fact, cite all relevant sources";

const PROCEDURE_INSTRUCTIONS: &str = "SPECIFIC INSTRUCTIONS FOR PROCEDURE/STEP QUESTIONS:
- List ALL steps in the correct sequence
- Use numbered lists (1., 2., 3., etc.) for sequential steps
- Include complete information from all relevant sources
- Read through ALL provided sources carefully to find every step
- If steps are mentioned across multiple sources, combine them in order
- Be thorough - do not skip any steps mentioned in the context
- Cite the source for each step or group of steps";

const COMPARE_INSTRUCTIONS: &str = "SPECIFIC INSTRUCTIONS FOR COMPARISON/ANALYSIS QUESTIONS:
- Compare different aspects clearly
- Provide structured analysis with clear sections
- Use headings or bullet points to organize comparisons
- Cite sources for each comparison point
- Maintain clarity and structure throughout
- Highlight key differences and similarities";

const DEFAULT_INSTRUCTIONS: &str = "SPECIFIC INSTRUCTIONS:
- Answer the question based on the context provided
- Structure your answer clearly with proper formatting
- Start with a brief direct answer, then provide details
- Use lists when listing multiple points
- Ensure accuracy by using only information from the context";

pub fn category_instructions(category: QuestionCategory) -> &'static str {
    match category {
        QuestionCategory::Summary => SUMMARY_INSTRUCTIONS,
        QuestionCategory::Fact => FACT_INSTRUCTIONS,
        QuestionCategory::Procedure => PROCEDURE_INSTRUCTIONS,
        QuestionCategory::CompareAnalyze => COMPARE_INSTRUCTIONS,
        QuestionCategory::Default => DEFAULT_INSTRUCTIONS,
    }
}

pub fn build_prompt(
    question: &str,
    category: QuestionCategory,
    context: &str,
    source_count: usize,
) -> String {
    format!(
        "{BASE_INSTRUCTIONS}\n\n{instructions}\n\nContext from PDF documents:\n{context}\n\n\
         Question: {question}\n\n\
         Answer the question based on the context above. Make sure to cite ALL relevant sources \
         (Source 1 through Source {source_count}) that contain information relevant to the answer:",
        instructions = category_instructions(category),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_contains_every_section_in_order() {
        let prompt = build_prompt(
            "How do I bleed the brakes?",
            QuestionCategory::Procedure,
            "[Source 1 - Page 3]: Open the bleed valve.",
            1,
        );

        let base = prompt.find("Use ONLY the information").expect("base instructions");
        let specific = prompt.find("PROCEDURE/STEP QUESTIONS").expect("category block");
        let context = prompt.find("[Source 1 - Page 3]").expect("context");
        let question = prompt.find("Question: How do I bleed the brakes?").expect("question");
        let closing = prompt.find("Source 1 through Source 1").expect("closing directive");

        assert!(base < specific && specific < context && context < question && question < closing);
    }

    #[test]
    fn every_category_has_distinct_instructions() {
        let categories = [
            QuestionCategory::Summary,
            QuestionCategory::Fact,
            QuestionCategory::Procedure,
            QuestionCategory::CompareAnalyze,
            QuestionCategory::Default,
        ];

        for (position, category) in categories.iter().enumerate() {
            for other in &categories[position + 1..] {
                assert_ne!(category_instructions(*category), category_instructions(*other));
            }
        }
    }

    #[test]
    fn procedure_block_warns_against_skipping_steps() {
        assert!(category_instructions(QuestionCategory::Procedure).contains("do not skip any steps"));
    }

    #[test]
    fn closing_directive_names_source_range() {
        let prompt = build_prompt("q", QuestionCategory::Default, "ctx", 7);
        assert!(prompt.ends_with(
            "(Source 1 through Source 7) that contain information relevant to the answer:"
        ));
    }
}
