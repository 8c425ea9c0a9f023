use std::collections::BTreeSet;

use super::types::ProtocolExcerpt;

/// Placeholder used when retrieval returned nothing.
pub const NO_CONTEXT: &str = "(no protocol excerpts retrieved)";

/// Render excerpts as numbered, source-labelled blocks in relevance order.
pub fn render_context(excerpts: &[ProtocolExcerpt]) -> String {
    if excerpts.is_empty() {
        return NO_CONTEXT.to_string();
    }

    excerpts
        .iter()
        .enumerate()
        .map(|(i, excerpt)| {
            format!(
                "[Excerpt {} | Source: {}]\n{}",
                i + 1,
                excerpt.source,
                excerpt.content.trim()
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// De-duplicated source identifiers. Iteration order is lexicographic.
pub fn collect_sources(excerpts: &[ProtocolExcerpt]) -> BTreeSet<String> {
    excerpts.iter().map(|e| e.source.clone()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blocks_are_numbered_and_labelled() {
        let rendered = render_context(&[
            ProtocolExcerpt::new("Hypoxemia is a severity sign.", "respiratory.md"),
            ProtocolExcerpt::new("  Reassess fever hourly. ", "fever.md"),
        ]);
        assert_eq!(
            rendered,
            "[Excerpt 1 | Source: respiratory.md]\nHypoxemia is a severity sign.\n\n\
             [Excerpt 2 | Source: fever.md]\nReassess fever hourly."
        );
    }

    #[test]
    fn empty_retrieval_renders_placeholder() {
        assert_eq!(render_context(&[]), NO_CONTEXT);
    }

    #[test]
    fn sources_sorted_and_deduplicated() {
        let sources = collect_sources(&[
            ProtocolExcerpt::new("a", "sepsis.md"),
            ProtocolExcerpt::new("b", "fever.md"),
            ProtocolExcerpt::new("c", "sepsis.md"),
        ]);
        let sources: Vec<_> = sources.into_iter().collect();
        assert_eq!(sources, vec!["fever.md", "sepsis.md"]);
    }
}
