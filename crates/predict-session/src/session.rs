use tracing::{debug, warn};

use crate::component::{Processor, Translator};
use crate::context::{CommitType, Context, UpdateSource};
use crate::translation::Menu;
use crate::types::{KeyEvent, ProcessResult};

/// Upper bound on update rounds drained after one step.
const MAX_UPDATE_ROUNDS: usize = 64;

/// Minimal host loop: owns the context and routes key events, update
/// notifications, and translation requests to its components.
///
/// Update notifications are queued by the context and delivered here after
/// the current step returns, one source at a time, to every processor.
pub struct Session {
    ctx: Context,
    processors: Vec<Box<dyn Processor>>,
    translators: Vec<Box<dyn Translator>>,
}

impl Session {
    pub fn new(ctx: Context) -> Self {
        Self {
            ctx,
            processors: Vec::new(),
            translators: Vec::new(),
        }
    }

    pub fn add_processor(&mut self, processor: Box<dyn Processor>) {
        self.processors.push(processor);
    }

    pub fn add_translator(&mut self, translator: Box<dyn Translator>) {
        self.translators.push(translator);
    }

    pub fn context(&self) -> &Context {
        &self.ctx
    }

    /// Direct access for host-side edits. Call [`Session::dispatch_updates`]
    /// afterwards to deliver the resulting notifications.
    pub fn context_mut(&mut self) -> &mut Context {
        &mut self.ctx
    }

    /// Offer a key to the processor chain, falling back to default editing
    /// when no processor accepts it.
    pub fn process_key(&mut self, key: KeyEvent) -> ProcessResult {
        let mut result = ProcessResult::Noop;
        for processor in &mut self.processors {
            if processor.process_key_event(&mut self.ctx, &key) == ProcessResult::Accepted {
                result = ProcessResult::Accepted;
                break;
            }
        }
        if result == ProcessResult::Noop {
            result = self.default_key_handling(&key);
        }
        self.dispatch_updates();
        result
    }

    fn default_key_handling(&mut self, key: &KeyEvent) -> ProcessResult {
        match key {
            KeyEvent::Char(c) => {
                let mut buf = [0u8; 4];
                self.ctx.push_input(c.encode_utf8(&mut buf));
                ProcessResult::Accepted
            }
            KeyEvent::Backspace if self.ctx.pop_input() => ProcessResult::Accepted,
            KeyEvent::Escape if self.ctx.is_composing() => {
                self.ctx.clear();
                ProcessResult::Accepted
            }
            KeyEvent::Enter if !self.ctx.input().is_empty() => {
                let text = self.ctx.input().to_string();
                self.ctx.commit(CommitType::Raw, &text);
                ProcessResult::Accepted
            }
            KeyEvent::Space if self.has_menu() => {
                self.select_without_dispatch(0);
                ProcessResult::Accepted
            }
            KeyEvent::Space if !self.ctx.input().is_empty() => {
                let text = self.ctx.input().to_string();
                self.ctx.commit(CommitType::Other("abc".to_string()), &text);
                ProcessResult::Accepted
            }
            _ => ProcessResult::Noop,
        }
    }

    fn has_menu(&self) -> bool {
        self.ctx
            .composition()
            .back()
            .and_then(|segment| segment.menu.as_ref())
            .is_some_and(|menu| !menu.is_empty())
    }

    /// Commit text of the given kind, as the host would for punctuation or
    /// pass-through keys.
    pub fn commit(&mut self, commit_type: CommitType, text: &str) {
        self.ctx.commit(commit_type, text);
        self.dispatch_updates();
    }

    /// Select the `index`-th candidate of the last segment and commit it.
    /// Returns the committed text.
    pub fn select(&mut self, index: usize) -> Option<String> {
        let text = self.select_without_dispatch(index);
        self.dispatch_updates();
        text
    }

    fn select_without_dispatch(&mut self, index: usize) -> Option<String> {
        let candidate = self
            .ctx
            .composition()
            .back()?
            .menu
            .as_ref()?
            .get(index)?
            .clone();
        for processor in &mut self.processors {
            processor.on_select(&mut self.ctx);
        }
        self.ctx
            .commit(CommitType::from_tag(&candidate.kind), &candidate.text);
        Some(candidate.text)
    }

    /// Deliver queued update notifications until the queue is empty, filling
    /// menus of new segments in between.
    pub fn dispatch_updates(&mut self) {
        let mut rounds = 0;
        while let Some(source) = self.ctx.take_update() {
            rounds += 1;
            if rounds > MAX_UPDATE_ROUNDS {
                warn!(rounds, "update notifications did not settle");
                self.discard_updates(source);
                break;
            }
            debug!(?source, "context update");
            for processor in &mut self.processors {
                processor.on_context_update(&mut self.ctx, source);
            }
            self.translate_last_segment();
        }
    }

    /// Drop the rest of the queue, starting with `first`. A dropped
    /// predictor update is still delivered once, or the predictor would
    /// keep waiting for it.
    fn discard_updates(&mut self, first: UpdateSource) {
        let mut predictor_pending = first == UpdateSource::Predictor;
        while let Some(source) = self.ctx.take_update() {
            predictor_pending |= source == UpdateSource::Predictor;
        }
        if predictor_pending {
            for processor in &mut self.processors {
                processor.on_context_update(&mut self.ctx, UpdateSource::Predictor);
            }
            while self.ctx.take_update().is_some() {}
        }
    }

    fn translate_last_segment(&mut self) {
        let Some(segment) = self.ctx.composition().back() else {
            return;
        };
        if segment.menu.is_some() {
            return;
        }
        let mut menu = Menu::new();
        for translator in &self.translators {
            if let Some(translation) = translator.query(self.ctx.input(), segment) {
                menu.add_translation(translation);
            }
        }
        if menu.is_empty() {
            return;
        }
        if let Some(segment) = self.ctx.composition_mut().back_mut() {
            segment.menu = Some(menu);
        }
    }
}
