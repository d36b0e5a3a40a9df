//! Search query definition

use crate::config::{MAX_LIMIT, MIN_LIMIT};

/// What to look for, and where
///
/// Without a term the query lists the first `limit` records.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchQuery {
    term: Option<String>,
    columns: Vec<String>,
    limit: usize,
    match_whole: bool,
    case_sensitive: bool,
}

impl SearchQuery {
    /// Match every record (first `limit` of them)
    pub fn all() -> Self {
        Self::default()
    }

    /// Match records whose value contains (or equals) `term`
    pub fn term(term: impl Into<String>) -> Self {
        Self {
            term: Some(term.into()),
            ..Self::default()
        }
    }

    /// Restrict the scan to one more column (none given: all columns)
    pub fn column(mut self, name: impl Into<String>) -> Self {
        self.columns.push(name.into());
        self
    }

    pub fn columns<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.columns.extend(names.into_iter().map(Into::into));
        self
    }

    /// Maximum number of matches, clamped into `[MIN_LIMIT, MAX_LIMIT]`
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    /// Require the whole field to equal the term instead of containing it
    pub fn match_whole(mut self, whole: bool) -> Self {
        self.match_whole = whole;
        self
    }

    pub fn case_sensitive(mut self, sensitive: bool) -> Self {
        self.case_sensitive = sensitive;
        self
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn search_term(&self) -> Option<&str> {
        self.term.as_deref()
    }

    pub fn search_columns(&self) -> &[String] {
        &self.columns
    }

    pub fn effective_limit(&self) -> usize {
        self.limit.clamp(MIN_LIMIT, MAX_LIMIT)
    }

    pub fn is_match_whole(&self) -> bool {
        self.match_whole
    }

    pub fn is_case_sensitive(&self) -> bool {
        self.case_sensitive
    }

    /// Compare a decoded field against the term
    pub(crate) fn matches(&self, text: &str) -> bool {
        let Some(term) = self.term.as_deref() else {
            return true;
        };

        if self.case_sensitive {
            compare(text, term, self.match_whole)
        } else {
            compare(&text.to_lowercase(), &term.to_lowercase(), self.match_whole)
        }
    }
}

fn compare(text: &str, term: &str, whole: bool) -> bool {
    if whole {
        text == term
    } else {
        text.contains(term)
    }
}
