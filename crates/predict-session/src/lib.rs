//! Prediction orchestration on top of the host's edit context.
//!
//! `Predictor` watches commits and decides when to query the database;
//! `PredictEngine` holds the shared cached lookup; `PredictTranslator`
//! materializes that cache for segments tagged `prediction`. `Session` is a
//! small dispatch loop that wires processors and translators to a `Context`
//! and delivers update notifications through a queue.

mod component;
mod context;
mod engine;
mod predictor;
mod session;
mod translation;
mod translator;
mod types;

#[cfg(test)]
mod tests;

pub use component::{Processor, Translator};
pub use context::{
    CommitRecord, CommitType, Composition, Context, Segment, SegmentStatus, UpdateSource,
    PLACEHOLDER_TAG, PREDICTION_OPTION, PREDICTION_TAG, RAW_TAG,
};
pub use engine::PredictEngine;
pub use predictor::{Action, Predictor, PublishMode, START_OF_SESSION_KEY};
pub use session::Session;
pub use translation::{Candidate, Menu, Translation};
pub use translator::PredictTranslator;
pub use types::{KeyEvent, ProcessResult};
