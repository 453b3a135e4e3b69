//! In-conversation search with cyclic navigation.

use chatsim_proto::message::Message;

/// One search match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchHit {
    /// Position of the message in the searched list.
    pub index: usize,
    /// The matching message.
    pub message: Message,
}

/// Search bar state over a message list.
#[derive(Debug, Clone, Default)]
pub struct MessageSearch {
    visible: bool,
    query: String,
    results: Vec<SearchHit>,
    cursor: Option<usize>,
}

impl MessageSearch {
    /// Creates a hidden search with no query.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the search bar is shown.
    #[must_use]
    pub const fn is_visible(&self) -> bool {
        self.visible
    }

    /// The current query.
    #[must_use]
    pub fn query(&self) -> &str {
        &self.query
    }

    /// Matches of the last search, in list order.
    #[must_use]
    pub fn results(&self) -> &[SearchHit] {
        &self.results
    }

    /// Position of the current match within [`results`](Self::results).
    #[must_use]
    pub const fn cursor(&self) -> Option<usize> {
        self.cursor
    }

    /// The current match.
    #[must_use]
    pub fn current(&self) -> Option<&SearchHit> {
        self.results.get(self.cursor?)
    }

    /// Shows or hides the search bar. Hiding clears the search.
    pub fn toggle(&mut self) {
        self.visible = !self.visible;
        if !self.visible {
            self.clear();
        }
    }

    /// Hides the search bar and clears the search.
    pub fn reset(&mut self) {
        self.visible = false;
        self.clear();
    }

    /// Replaces the query and re-runs the search over `messages`.
    pub fn set_query(&mut self, query: impl Into<String>, messages: &[Message]) {
        self.query = query.into();
        self.perform_search(messages);
    }

    /// Runs the current query over `messages`.
    ///
    /// A blank query clears the results. Otherwise every message whose
    /// text contains the query (case-insensitively) is a match, and the
    /// cursor moves to the first one.
    pub fn perform_search(&mut self, messages: &[Message]) {
        if self.query.trim().is_empty() {
            self.results.clear();
            self.cursor = None;
            return;
        }

        let needle = self.query.to_lowercase();
        self.results = messages
            .iter()
            .enumerate()
            .filter(|(_, msg)| msg.message.to_lowercase().contains(&needle))
            .map(|(index, msg)| SearchHit {
                index,
                message: msg.clone(),
            })
            .collect();
        self.cursor = if self.results.is_empty() { None } else { Some(0) };
    }

    /// Moves to the next match, wrapping to the first.
    ///
    /// Returns the message index of the new current match.
    pub fn next_match(&mut self) -> Option<usize> {
        let len = self.results.len();
        if len == 0 {
            return None;
        }
        let next = self.cursor.map_or(0, |c| (c + 1) % len);
        self.cursor = Some(next);
        Some(self.results[next].index)
    }

    /// Moves to the previous match, wrapping to the last.
    ///
    /// Returns the message index of the new current match.
    pub fn prev_match(&mut self) -> Option<usize> {
        let len = self.results.len();
        if len == 0 {
            return None;
        }
        let prev = self.cursor.map_or(len - 1, |c| (c + len - 1) % len);
        self.cursor = Some(prev);
        Some(self.results[prev].index)
    }

    fn clear(&mut self) {
        self.query.clear();
        self.results.clear();
        self.cursor = None;
    }
}
