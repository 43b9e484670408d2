use std::rc::Rc;

use tracing::{debug, debug_span};

use crate::component::Processor;
use crate::context::{CommitType, Context, UpdateSource, PREDICTION_OPTION, PREDICTION_TAG};
use crate::engine::PredictEngine;
use crate::translation::Menu;
use crate::types::{KeyEvent, ProcessResult};

/// Lookup key used when nothing has been committed yet.
pub const START_OF_SESSION_KEY: &str = "$";

/// Last user action relevant to prediction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Action {
    #[default]
    Unspecified,
    Select,
    Delete,
}

/// How a prediction reaches the screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PublishMode {
    /// Only the tagged segment is published; a translator fills the menu.
    #[default]
    Placeholder,
    /// The predictor attaches the menu to the segment itself.
    Direct,
}

/// Decides when to predict, based on commits and key events.
///
/// Triggered by context updates: once the composition is empty it looks at
/// the most recent commit and, on a hit, publishes a `prediction` segment.
/// Delete-class keys cancel the chain; `max_iterations` bounds consecutive
/// prediction commits.
#[derive(Debug)]
pub struct Predictor {
    engine: Option<Rc<PredictEngine>>,
    mode: PublishMode,
    last_action: Action,
    iteration_counter: usize,
    self_updating: bool,
    /// Commit count last decided on, so each commit triggers one decision.
    handled_commits: Option<u64>,
}

impl Predictor {
    /// A predictor without an engine stays inert.
    pub fn new(engine: Option<Rc<PredictEngine>>, mode: PublishMode) -> Self {
        Self {
            engine,
            mode,
            last_action: Action::Unspecified,
            iteration_counter: 0,
            self_updating: false,
            handled_commits: None,
        }
    }

    pub fn engine(&self) -> Option<&Rc<PredictEngine>> {
        self.engine.as_ref()
    }

    pub fn last_action(&self) -> Action {
        self.last_action
    }

    pub fn iteration_counter(&self) -> usize {
        self.iteration_counter
    }

    fn predict_and_update(&mut self, ctx: &mut Context, engine: &PredictEngine, query: &str) {
        if !engine.predict(query) {
            return;
        }
        engine.create_predict_segment(ctx);
        if self.mode == PublishMode::Direct {
            let menu = ctx
                .composition()
                .back()
                .and_then(|segment| engine.translate(segment))
                .map(Menu::from);
            if let Some(segment) = ctx.composition_mut().back_mut() {
                segment.menu = menu;
            }
        }
        self.self_updating = true;
        ctx.request_update(UpdateSource::Predictor);
    }
}

impl Processor for Predictor {
    fn process_key_event(&mut self, ctx: &mut Context, key: &KeyEvent) -> ProcessResult {
        let Some(engine) = self.engine.as_ref() else {
            return ProcessResult::Noop;
        };
        if !key.is_delete() {
            self.last_action = Action::Unspecified;
            return ProcessResult::Noop;
        }
        self.last_action = Action::Delete;
        engine.clear();
        self.iteration_counter = 0;
        let shows_prediction = ctx
            .composition()
            .back()
            .is_some_and(|segment| segment.has_tag(PREDICTION_TAG));
        if shows_prediction {
            debug!(?key, "prediction cancelled");
            ctx.clear();
            return ProcessResult::Accepted;
        }
        ProcessResult::Noop
    }

    fn on_context_update(&mut self, ctx: &mut Context, source: UpdateSource) {
        let _span = debug_span!("predictor_update", ?source).entered();
        if source == UpdateSource::Predictor {
            self.self_updating = false;
            return;
        }
        if self.self_updating {
            return;
        }
        let Some(engine) = self.engine.clone() else {
            return;
        };
        if !ctx.composition().is_empty()
            || !ctx.get_option(PREDICTION_OPTION)
            || self.last_action == Action::Delete
        {
            return;
        }
        let commits = ctx.commit_count();
        if self.handled_commits == Some(commits) {
            return;
        }
        self.handled_commits = Some(commits);

        let Some(last) = ctx.last_commit().cloned() else {
            self.predict_and_update(ctx, &engine, START_OF_SESSION_KEY);
            return;
        };
        match last.commit_type {
            CommitType::Punct | CommitType::Raw | CommitType::Thru => {
                engine.clear();
                self.iteration_counter = 0;
                return;
            }
            CommitType::Prediction => {
                self.iteration_counter += 1;
                let max = engine.max_iterations();
                if max > 0 && self.iteration_counter >= max {
                    debug!(max, "prediction chain reached its limit");
                    engine.clear();
                    self.iteration_counter = 0;
                    return;
                }
            }
            CommitType::Other(_) => self.iteration_counter = 0,
        }
        self.predict_and_update(ctx, &engine, &last.text);
    }

    fn on_select(&mut self, _ctx: &mut Context) {
        self.last_action = Action::Select;
    }
}
