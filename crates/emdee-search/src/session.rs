use std::fmt::Write as _;
use std::ops::Range;

use emdee_view::{DocumentView, Segment, escape_text};
use regex::{Regex, RegexBuilder};

/// Class of every highlighted match.
pub const MARK_CLASS: &str = "find-bar__mark";

/// Extra class of the current match.
pub const ACTIVE_MARK_CLASS: &str = "find-bar__mark--active";

/// One occurrence of the query.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SearchMatch {
    /// Segment index of the text node in the view.
    pub node: usize,
    /// Byte range within the decoded text of that node.
    pub range: Range<usize>,
}

/// Text surrounding one match.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MatchContext<'a> {
    pub before: &'a str,
    pub matched: &'a str,
    pub after: &'a str,
}

/// Search state for the currently displayed document.
#[derive(Debug, Default)]
pub struct SearchSession {
    view: DocumentView,
    query: String,
    matches: Vec<SearchMatch>,
    /// 0 when nothing is selected, otherwise the 1-based position.
    current: usize,
    min_query_chars: usize,
}

impl SearchSession {
    pub fn new(view: DocumentView) -> Self {
        Self {
            view,
            min_query_chars: 1,
            ..Self::default()
        }
    }

    /// Require at least `chars` non-blank characters before searching.
    #[must_use]
    pub fn with_min_query_chars(mut self, chars: usize) -> Self {
        self.min_query_chars = chars.max(1);
        self
    }

    /// Switch to another document, dropping all match state.
    pub fn replace_view(&mut self, view: DocumentView) {
        self.clear();
        self.view = view;
    }

    /// Drop the query and all matches.
    pub fn clear(&mut self) {
        self.query.clear();
        self.matches.clear();
        self.current = 0;
    }

    /// Run `query` against the document.
    ///
    /// A blank query clears the matches. Otherwise the first match, if any,
    /// becomes current.
    pub fn set_query(&mut self, query: &str) -> Option<&SearchMatch> {
        self.query = query.to_owned();
        self.matches.clear();
        self.current = 0;

        if self.is_blank() {
            return None;
        }

        let pattern = literal_pattern(query)?;
        for node in self.view.text_nodes() {
            self.matches.extend(pattern.find_iter(node.text).map(|m| SearchMatch {
                node: node.index,
                range: m.range(),
            }));
        }
        if !self.matches.is_empty() {
            self.current = 1;
        }

        tracing::debug!(matches = self.matches.len(), "Search query updated");
        self.current_match()
    }

    /// Select the following match, wrapping to the first.
    pub fn next_match(&mut self) -> Option<&SearchMatch> {
        if self.matches.is_empty() {
            return None;
        }
        self.current = self.current % self.matches.len() + 1;
        self.current_match()
    }

    /// Select the preceding match, wrapping to the last.
    pub fn previous_match(&mut self) -> Option<&SearchMatch> {
        if self.matches.is_empty() {
            return None;
        }
        self.current = match self.current {
            0 | 1 => self.matches.len(),
            n => n - 1,
        };
        self.current_match()
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn matches(&self) -> &[SearchMatch] {
        &self.matches
    }

    /// 1-based position of the current match, 0 when none.
    pub fn current_index(&self) -> usize {
        self.current
    }

    pub fn current_match(&self) -> Option<&SearchMatch> {
        self.current
            .checked_sub(1)
            .and_then(|index| self.matches.get(index))
    }

    /// Status line: empty for a blank query, `No matches`, or `N of M`.
    pub fn status(&self) -> String {
        if self.is_blank() {
            String::new()
        } else if self.matches.is_empty() {
            "No matches".to_owned()
        } else {
            format!("{} of {}", self.current, self.matches.len())
        }
    }

    /// The document HTML with every match wrapped in a `<mark>`.
    ///
    /// The current match additionally carries [`ACTIVE_MARK_CLASS`] and a
    /// `data-match` index hosts can use to scroll it into view.
    pub fn highlighted_html(&self) -> String {
        if self.matches.is_empty() {
            return self.view.to_html();
        }

        let active = self.current.checked_sub(1);
        self.view.render_with(|node, text, out| {
            let first = self.matches.partition_point(|m| m.node < node);
            let mut cursor = 0;
            for (index, found) in self.matches[first..]
                .iter()
                .enumerate()
                .take_while(|(_, m)| m.node == node)
                .map(|(offset, m)| (first + offset, m))
            {
                out.push_str(&escape_text(&text[cursor..found.range.start]));
                if Some(index) == active {
                    let _ = write!(
                        out,
                        r#"<mark class="{MARK_CLASS} {ACTIVE_MARK_CLASS}" data-match="{index}">"#
                    );
                } else {
                    let _ = write!(out, r#"<mark class="{MARK_CLASS}">"#);
                }
                out.push_str(&escape_text(&text[found.range.clone()]));
                out.push_str("</mark>");
                cursor = found.range.end;
            }
            out.push_str(&escape_text(&text[cursor..]));
        })
    }

    /// Up to `radius` characters on each side of `found`, within its text node.
    pub fn match_context(&self, found: &SearchMatch, radius: usize) -> Option<MatchContext<'_>> {
        let Segment::Text(text) = self.view.segments().get(found.node)? else {
            return None;
        };
        let matched = text.get(found.range.clone())?;
        let before = &text[..found.range.start];
        let after = &text[found.range.end..];

        let start = before
            .char_indices()
            .rev()
            .take(radius)
            .last()
            .map_or(before.len(), |(i, _)| i);
        let end = after.char_indices().nth(radius).map_or(after.len(), |(i, _)| i);
        Some(MatchContext {
            before: &before[start..],
            matched,
            after: &after[..end],
        })
    }

    fn is_blank(&self) -> bool {
        let chars = self.query.trim().chars().count();
        chars == 0 || chars < self.min_query_chars
    }
}

fn literal_pattern(query: &str) -> Option<Regex> {
    match RegexBuilder::new(&regex::escape(query))
        .case_insensitive(true)
        .build()
    {
        Ok(pattern) => Some(pattern),
        Err(e) => {
            tracing::warn!(error = %e, "Search query rejected");
            None
        }
    }
}
