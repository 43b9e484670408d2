use std::collections::{BTreeSet, HashMap, VecDeque};

use tracing::trace;

use crate::translation::Menu;

/// Tag carried by segments that display predictions.
pub const PREDICTION_TAG: &str = "prediction";
/// Tag for zero-length segments that exist only to host a menu.
pub const PLACEHOLDER_TAG: &str = "placeholder";
/// Tag the host puts on plain input segments.
pub const RAW_TAG: &str = "raw";
/// Context option that turns prediction on or off.
pub const PREDICTION_OPTION: &str = "prediction";

const MAX_COMMIT_HISTORY: usize = 20;

/// Where a context update came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateSource {
    /// The host or the user changed the context.
    Host,
    /// The predictor published a prediction segment.
    Predictor,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SegmentStatus {
    #[default]
    Void,
    Guess,
    Selected,
    Confirmed,
}

/// A span of the input with tags and an optional candidate menu.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Segment {
    pub start: usize,
    pub end: usize,
    pub status: SegmentStatus,
    pub tags: BTreeSet<String>,
    pub menu: Option<Menu>,
}

impl Segment {
    pub fn new(start: usize, end: usize) -> Self {
        Self {
            start,
            end,
            ..Self::default()
        }
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.contains(tag)
    }

    pub fn add_tag(&mut self, tag: &str) {
        self.tags.insert(tag.to_string());
    }

    pub fn remove_tag(&mut self, tag: &str) {
        self.tags.remove(tag);
    }
}

/// Ordered segments of the current input.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Composition {
    segments: Vec<Segment>,
}

impl Composition {
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn push(&mut self, segment: Segment) {
        self.segments.push(segment);
    }

    pub fn pop(&mut self) -> Option<Segment> {
        self.segments.pop()
    }

    pub fn back(&self) -> Option<&Segment> {
        self.segments.last()
    }

    pub fn back_mut(&mut self) -> Option<&mut Segment> {
        self.segments.last_mut()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Segment> {
        self.segments.iter()
    }

    pub fn clear(&mut self) {
        self.segments.clear();
    }

    fn retain(&mut self, f: impl FnMut(&Segment) -> bool) {
        self.segments.retain(f);
    }
}

/// Kind of a committed text, as recorded in the commit history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommitType {
    Punct,
    Raw,
    Thru,
    Prediction,
    Other(String),
}

impl CommitType {
    /// Map a candidate or commit type tag to a kind.
    pub fn from_tag(tag: &str) -> Self {
        match tag {
            "punct" => Self::Punct,
            "raw" => Self::Raw,
            "thru" => Self::Thru,
            PREDICTION_TAG => Self::Prediction,
            other => Self::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Punct => "punct",
            Self::Raw => "raw",
            Self::Thru => "thru",
            Self::Prediction => PREDICTION_TAG,
            Self::Other(tag) => tag,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitRecord {
    pub commit_type: CommitType,
    pub text: String,
}

/// The host-owned edit state processors and translators operate on.
///
/// Mutations that other components should react to enqueue an
/// [`UpdateSource`]; the session drains the queue after each step, so
/// notifications never re-enter a component that is still running.
#[derive(Debug, Default)]
pub struct Context {
    input: String,
    composition: Composition,
    commit_history: VecDeque<CommitRecord>,
    commit_count: u64,
    options: HashMap<String, bool>,
    updates: VecDeque<UpdateSource>,
}

impl Context {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn composition(&self) -> &Composition {
        &self.composition
    }

    pub fn composition_mut(&mut self) -> &mut Composition {
        &mut self.composition
    }

    pub fn is_composing(&self) -> bool {
        !self.input.is_empty() || !self.composition.is_empty()
    }

    /// Append typed text. Placeholder segments are dropped and the input is
    /// covered by a single raw segment.
    pub fn push_input(&mut self, text: &str) {
        self.composition.retain(|s| !s.has_tag(PLACEHOLDER_TAG));
        self.input.push_str(text);
        self.resegment();
        self.request_update(UpdateSource::Host);
    }

    /// Remove the last character of the input. Returns false when there was
    /// nothing to remove.
    pub fn pop_input(&mut self) -> bool {
        if self.input.pop().is_none() {
            return false;
        }
        self.resegment();
        self.request_update(UpdateSource::Host);
        true
    }

    fn resegment(&mut self) {
        self.composition.clear();
        if !self.input.is_empty() {
            let mut segment = Segment::new(0, self.input.len());
            segment.add_tag(RAW_TAG);
            self.composition.push(segment);
        }
    }

    /// Record a commit, then clear the input and composition.
    pub fn commit(&mut self, commit_type: CommitType, text: &str) {
        trace!(kind = commit_type.as_str(), text, "commit");
        if self.commit_history.len() == MAX_COMMIT_HISTORY {
            self.commit_history.pop_front();
        }
        self.commit_history.push_back(CommitRecord {
            commit_type,
            text: text.to_string(),
        });
        self.commit_count += 1;
        self.clear();
    }

    pub fn commit_history(&self) -> impl Iterator<Item = &CommitRecord> {
        self.commit_history.iter()
    }

    /// Commits made so far, including those evicted from the history.
    pub fn commit_count(&self) -> u64 {
        self.commit_count
    }

    pub fn last_commit(&self) -> Option<&CommitRecord> {
        self.commit_history.back()
    }

    /// Discard input and composition.
    pub fn clear(&mut self) {
        self.input.clear();
        self.composition.clear();
        self.request_update(UpdateSource::Host);
    }

    /// Options default to off until set.
    pub fn get_option(&self, name: &str) -> bool {
        self.options.get(name).copied().unwrap_or(false)
    }

    pub fn set_option(&mut self, name: &str, value: bool) {
        self.options.insert(name.to_string(), value);
        self.request_update(UpdateSource::Host);
    }

    pub fn request_update(&mut self, source: UpdateSource) {
        self.updates.push_back(source);
    }

    pub fn take_update(&mut self) -> Option<UpdateSource> {
        self.updates.pop_front()
    }

    pub fn has_pending_updates(&self) -> bool {
        !self.updates.is_empty()
    }
}
