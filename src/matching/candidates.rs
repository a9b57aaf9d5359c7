use std::collections::HashMap;

/// Passage text -> document id, iterated in insertion order.
///
/// Re-inserting an existing text overwrites its document id but keeps its
/// original position, so first-seen order decides ties in the matcher.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CandidateSet {
    entries: Vec<(String, u64)>,
    index: HashMap<String, usize>,
}

impl CandidateSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or updates `text`, returning the previous document id if any.
    pub fn insert(&mut self, text: impl Into<String>, document_id: u64) -> Option<u64> {
        let text = text.into();
        if let Some(&pos) = self.index.get(&text) {
            let previous = self.entries[pos].1;
            self.entries[pos].1 = document_id;
            return Some(previous);
        }
        self.index.insert(text.clone(), self.entries.len());
        self.entries.push((text, document_id));
        None
    }

    pub fn get(&self, text: &str) -> Option<u64> {
        self.index.get(text).map(|&pos| self.entries[pos].1)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, u64)> {
        self.entries.iter().map(|(text, id)| (text.as_str(), *id))
    }
}

impl<S: Into<String>> FromIterator<(S, u64)> for CandidateSet {
    fn from_iter<I: IntoIterator<Item = (S, u64)>>(iter: I) -> Self {
        let mut set = Self::new();
        for (text, document_id) in iter {
            set.insert(text, document_id);
        }
        set
    }
}

impl<S: Into<String>> Extend<(S, u64)> for CandidateSet {
    fn extend<I: IntoIterator<Item = (S, u64)>>(&mut self, iter: I) {
        for (text, document_id) in iter {
            self.insert(text, document_id);
        }
    }
}
