//! Folding a fragment stream into message text.

use gonggan_ai::{Citation, ResponseFragment};

const SOURCES_HEADER: &str = "출처:";

/// Running state of one streamed reply.
///
/// Text accumulates in arrival order. The last non-empty citation set seen
/// wins and is only rendered once the stream is exhausted.
#[derive(Debug, Default, Clone)]
pub struct StreamMerge {
    text: String,
    citations: Option<Vec<Citation>>,
    fragments: usize,
}

impl StreamMerge {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply one fragment and return the new running total.
    pub fn push(&mut self, fragment: &ResponseFragment) -> &str {
        self.fragments += 1;
        self.text.push_str(&fragment.text);
        if let Some(citations) = &fragment.citations
            && !citations.is_empty()
        {
            self.citations = Some(citations.clone());
        }
        &self.text
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn fragments(&self) -> usize {
        self.fragments
    }

    /// Final text with the sources block appended, or `None` when there is
    /// nothing to add.
    pub fn finish(&self) -> Option<String> {
        let block = format_sources(self.citations.as_deref().unwrap_or_default())?;
        Some(format!("{}\n\n{}", self.text, block))
    }
}

/// Render a sources block, one Markdown link per citation carrying both a
/// title and a URL. Returns `None` when no citation qualifies.
pub fn format_sources(citations: &[Citation]) -> Option<String> {
    let links: Vec<String> = citations
        .iter()
        .filter_map(|c| {
            let title = c.title.as_deref().filter(|t| !t.is_empty())?;
            let url = c.url.as_deref().filter(|u| !u.is_empty())?;
            Some(format!("- [{title}]({url})"))
        })
        .collect();

    if links.is_empty() {
        None
    } else {
        Some(format!("{SOURCES_HEADER}\n{}", links.join("\n")))
    }
}

/// Every intermediate text a stream produces, one per fragment that carries
/// text, followed by the final text when a sources block is appended.
pub fn merge_fragments<'a, I>(fragments: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a ResponseFragment>,
{
    let mut merge = StreamMerge::new();
    let mut states: Vec<String> = fragments
        .into_iter()
        .filter_map(|fragment| {
            let text = merge.push(fragment);
            (!fragment.text.is_empty()).then(|| text.to_string())
        })
        .collect();
    if let Some(last) = merge.finish() {
        states.push(last);
    }
    states
}
