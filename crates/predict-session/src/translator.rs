use std::rc::Rc;

use tracing::trace;

use crate::component::Translator;
use crate::context::{Segment, PREDICTION_TAG};
use crate::engine::PredictEngine;
use crate::translation::Translation;

/// Fills `prediction` segments from the engine's cached lookup.
#[derive(Debug)]
pub struct PredictTranslator {
    engine: Option<Rc<PredictEngine>>,
}

impl PredictTranslator {
    pub fn new(engine: Option<Rc<PredictEngine>>) -> Self {
        Self { engine }
    }
}

impl Translator for PredictTranslator {
    fn query(&self, _input: &str, segment: &Segment) -> Option<Translation> {
        let engine = self.engine.as_ref()?;
        if !segment.has_tag(PREDICTION_TAG) {
            return None;
        }
        let translation = engine.translate(segment)?;
        trace!(count = translation.len(), "prediction translation");
        Some(translation)
    }
}
