use crate::context::{Context, Segment, UpdateSource};
use crate::translation::Translation;
use crate::types::{KeyEvent, ProcessResult};

/// A key-event stage in the session's processor chain.
pub trait Processor {
    fn process_key_event(&mut self, ctx: &mut Context, key: &KeyEvent) -> ProcessResult;

    /// Called once per queued context update.
    fn on_context_update(&mut self, _ctx: &mut Context, _source: UpdateSource) {}

    /// Called when the user picks a candidate, before it is committed.
    fn on_select(&mut self, _ctx: &mut Context) {}
}

/// Produces candidates for a segment.
pub trait Translator {
    fn query(&self, input: &str, segment: &Segment) -> Option<Translation>;
}
