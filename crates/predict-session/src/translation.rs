use std::collections::VecDeque;

/// A candidate offered for a segment.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    /// Candidate type, e.g. `prediction`. Becomes the commit type when selected.
    pub kind: String,
    pub start: usize,
    pub end: usize,
    pub text: String,
}

impl Candidate {
    pub fn new(kind: &str, start: usize, end: usize, text: &str) -> Self {
        Self {
            kind: kind.to_string(),
            start,
            end,
            text: text.to_string(),
        }
    }
}

/// An ordered stream of candidates produced by one translator.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Translation {
    candidates: VecDeque<Candidate>,
}

impl Translation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, candidate: Candidate) {
        self.candidates.push_back(candidate);
    }

    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }
}

impl Iterator for Translation {
    type Item = Candidate;

    fn next(&mut self) -> Option<Candidate> {
        self.candidates.pop_front()
    }
}

impl FromIterator<Candidate> for Translation {
    fn from_iter<I: IntoIterator<Item = Candidate>>(iter: I) -> Self {
        Self {
            candidates: iter.into_iter().collect(),
        }
    }
}

/// Candidates gathered from all translations for a segment, in order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Menu {
    candidates: Vec<Candidate>,
}

impl Menu {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_translation(&mut self, translation: Translation) {
        self.candidates.extend(translation);
    }

    pub fn candidates(&self) -> &[Candidate] {
        &self.candidates
    }

    pub fn get(&self, index: usize) -> Option<&Candidate> {
        self.candidates.get(index)
    }

    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }
}

impl From<Translation> for Menu {
    fn from(translation: Translation) -> Self {
        let mut menu = Self::new();
        menu.add_translation(translation);
        menu
    }
}
