//! Capped in-memory chat transcript with FIFO eviction.

use std::collections::VecDeque;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Assistant,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        };
        write!(f, "{s}")
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscriptEntry {
    pub role: Role,
    pub content: String,
}

#[derive(Debug, Clone)]
pub struct Transcript {
    entries: VecDeque<TranscriptEntry>,
    cap: usize,
}

impl Transcript {
    /// A `cap` of zero keeps nothing.
    pub fn new(cap: usize) -> Self {
        Self { entries: VecDeque::new(), cap }
    }

    pub fn append(&mut self, role: Role, content: impl Into<String>) {
        self.entries.push_back(TranscriptEntry { role, content: content.into() });
        while self.entries.len() > self.cap {
            self.entries.pop_front();
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> impl Iterator<Item = &TranscriptEntry> {
        self.entries.iter()
    }

    /// The most recent `n` entries, oldest first.
    pub fn last(&self, n: usize) -> impl Iterator<Item = &TranscriptEntry> {
        self.entries.iter().skip(self.entries.len().saturating_sub(n))
    }

    /// `"{role}: {content}"` per line for the most recent `n` entries.
    pub fn render_last(&self, n: usize) -> String {
        self.last(n)
            .map(|e| format!("{}: {}", e.role, e.content))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn evicts_oldest_past_cap() {
        let mut t = Transcript::new(2);
        t.append(Role::User, "one");
        t.append(Role::Assistant, "two");
        t.append(Role::User, "three");
        let contents: Vec<_> = t.entries().map(|e| e.content.as_str()).collect();
        assert_eq!(contents, vec!["two", "three"]);
    }

    #[test]
    fn zero_cap_keeps_nothing() {
        let mut t = Transcript::new(0);
        t.append(Role::User, "hi");
        assert!(t.is_empty());
    }

    #[test]
    fn render_last_takes_tail() {
        let mut t = Transcript::new(10);
        t.append(Role::User, "q1");
        t.append(Role::Assistant, "a1");
        t.append(Role::User, "q2");
        assert_eq!(t.render_last(2), "assistant: a1\nuser: q2");
        assert_eq!(t.render_last(0), "");
        assert_eq!(t.last(99).count(), 3);
    }
}
