use std::cell::{Cell, RefCell};
use std::rc::Rc;

use predict_core::db::{CandidateSpan, PredictDb};
use predict_core::settings::PredictorSettings;
use tracing::{debug, trace};

use crate::context::{Context, Segment, SegmentStatus, PLACEHOLDER_TAG, PREDICTION_TAG, RAW_TAG};
use crate::translation::{Candidate, Translation};

#[derive(Debug, Clone)]
struct CachedPrediction {
    query: String,
    span: CandidateSpan,
}

/// Per-schema prediction state shared by the predictor and translator.
///
/// Holds the result of the last successful lookup as a span into the
/// database, so candidate texts are read from the mapping on demand and
/// never copied into the cache.
#[derive(Debug)]
pub struct PredictEngine {
    db: Rc<PredictDb>,
    max_iterations: usize,
    max_candidates: usize,
    cache: RefCell<Option<CachedPrediction>>,
    lookups: Cell<u64>,
}

impl PredictEngine {
    pub fn new(db: Rc<PredictDb>, max_iterations: usize, max_candidates: usize) -> Self {
        Self {
            db,
            max_iterations,
            max_candidates,
            cache: RefCell::new(None),
            lookups: Cell::new(0),
        }
    }

    pub fn with_settings(db: Rc<PredictDb>, settings: &PredictorSettings) -> Self {
        Self::new(db, settings.max_iterations, settings.max_candidates)
    }

    pub fn db(&self) -> &Rc<PredictDb> {
        &self.db
    }

    pub fn max_iterations(&self) -> usize {
        self.max_iterations
    }

    pub fn max_candidates(&self) -> usize {
        self.max_candidates
    }

    /// Look up `query`. On a hit the result replaces the cache and `true` is
    /// returned; on a miss the cache is cleared.
    pub fn predict(&self, query: &str) -> bool {
        self.lookups.set(self.lookups.get() + 1);
        match self.db.lookup(query) {
            Some(candidates) => {
                debug!(query, count = candidates.len(), "prediction hit");
                *self.cache.borrow_mut() = Some(CachedPrediction {
                    query: query.to_string(),
                    span: candidates.span(),
                });
                true
            }
            None => {
                trace!(query, "prediction miss");
                self.clear();
                false
            }
        }
    }

    pub fn clear(&self) {
        self.cache.borrow_mut().take();
    }

    /// Query of the cached prediction, if any.
    pub fn query(&self) -> Option<String> {
        self.cache.borrow().as_ref().map(|c| c.query.clone())
    }

    pub fn has_prediction(&self) -> bool {
        self.cache.borrow().is_some()
    }

    /// Candidates in the cached result, before truncation.
    pub fn num_candidates(&self) -> usize {
        self.cache.borrow().as_ref().map_or(0, |c| c.span.len as usize)
    }

    /// Text of the i-th cached candidate.
    pub fn candidate(&self, index: usize) -> Option<String> {
        let span = self.cache.borrow().as_ref()?.span;
        let entry = self.db.candidates_at(span)?.get(index)?;
        Some(self.db.entry_text(&entry).to_string())
    }

    /// Cached candidate texts in stored order, truncated to `max_candidates`.
    pub fn candidates(&self) -> Vec<String> {
        let Some(span) = self.cache.borrow().as_ref().map(|c| c.span) else {
            return Vec::new();
        };
        let Some(candidates) = self.db.candidates_at(span) else {
            return Vec::new();
        };
        let limit = match self.max_candidates {
            0 => usize::MAX,
            n => n,
        };
        candidates
            .iter()
            .take(limit)
            .map(|entry| self.db.entry_text(&entry).to_string())
            .collect()
    }

    /// Append a zero-length prediction segment at the end of the composition.
    pub fn create_predict_segment(&self, ctx: &mut Context) {
        let end = ctx.input().len();
        let mut segment = Segment::new(end, end);
        segment.status = SegmentStatus::Guess;
        segment.add_tag(PREDICTION_TAG);
        segment.add_tag(PLACEHOLDER_TAG);
        segment.remove_tag(RAW_TAG);
        ctx.composition_mut().push(segment);
    }

    /// Materialize the cached result as `prediction` candidates spanning
    /// `segment`. `None` when nothing is cached.
    pub fn translate(&self, segment: &Segment) -> Option<Translation> {
        if !self.has_prediction() {
            return None;
        }
        let translation: Translation = self
            .candidates()
            .into_iter()
            .map(|text| Candidate::new(PREDICTION_TAG, segment.start, segment.end, &text))
            .collect();
        Some(translation)
    }

    /// Number of `predict` calls so far.
    pub fn lookup_count(&self) -> u64 {
        self.lookups.get()
    }
}
