use std::collections::HashMap;
use std::path::PathBuf;
use std::rc::Rc;

use predict_core::db::PredictDb;
use predict_core::settings::{ConfigSource, PredictorSettings};
use predict_session::{PredictEngine, PredictTranslator, Predictor, PublishMode};
use tracing::{debug, error, info};

use super::{ResourceError, ResourceResolver};

/// A host schema: an id plus the configuration predictor settings come from.
pub struct Schema {
    id: String,
    config: Box<dyn ConfigSource>,
}

impl Schema {
    pub fn new(id: impl Into<String>, config: Box<dyn ConfigSource>) -> Self {
        Self {
            id: id.into(),
            config,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn config(&self) -> &dyn ConfigSource {
        self.config.as_ref()
    }
}

/// Shares one `PredictEngine` per schema id and one loaded `PredictDb` per
/// resolved path between sessions.
///
/// The pool keeps its entries alive until the host drops them with
/// `invalidate`, `invalidate_all` or `evict_unused`; an entry counts as in
/// use while anything besides the pool holds it.
pub struct EnginePool {
    resolver: Box<dyn ResourceResolver>,
    dbs: HashMap<PathBuf, Rc<PredictDb>>,
    engines: HashMap<String, Rc<PredictEngine>>,
}

impl EnginePool {
    pub fn new(resolver: Box<dyn ResourceResolver>) -> Self {
        Self {
            resolver,
            dbs: HashMap::new(),
            engines: HashMap::new(),
        }
    }

    /// The engine for `schema`, created (and its database loaded) on first use.
    pub fn engine(&mut self, schema: &Schema) -> Result<Rc<PredictEngine>, ResourceError> {
        if let Some(engine) = self.engines.get(schema.id()) {
            return Ok(Rc::clone(engine));
        }
        let settings = PredictorSettings::from_config(schema.config());
        if settings.db.is_empty() {
            return Err(ResourceError::EmptyDbName(schema.id().to_string()));
        }
        let db = self.db(&settings.db)?;
        let engine = Rc::new(PredictEngine::with_settings(db, &settings));
        debug!(
            schema = schema.id(),
            max_iterations = settings.max_iterations,
            max_candidates = settings.max_candidates,
            "created predict engine"
        );
        self.engines
            .insert(schema.id().to_string(), Rc::clone(&engine));
        Ok(engine)
    }

    fn db(&mut self, name: &str) -> Result<Rc<PredictDb>, ResourceError> {
        let path = self.resolver.resolve_path(name);
        if let Some(db) = self.dbs.get(&path) {
            return Ok(Rc::clone(db));
        }
        let mut db = PredictDb::new(&path);
        if let Err(source) = db.load() {
            error!(path = %path.display(), error = %source, "failed to load predict db: {name}");
            return Err(ResourceError::Load { path, source });
        }
        let db = Rc::new(db);
        self.dbs.insert(path, Rc::clone(&db));
        Ok(db)
    }

    /// A predictor for `schema`. Without a usable database it is inert.
    pub fn predictor(&mut self, schema: &Schema, mode: PublishMode) -> Predictor {
        Predictor::new(self.engine(schema).ok(), mode)
    }

    /// A translator sharing the predictor's engine for `schema`.
    pub fn translator(&mut self, schema: &Schema) -> PredictTranslator {
        PredictTranslator::new(self.engine(schema).ok())
    }

    /// Forget the engine of `schema_id`; holders keep theirs, later requests
    /// get a new one. Returns whether an entry existed.
    pub fn invalidate(&mut self, schema_id: &str) -> bool {
        self.engines.remove(schema_id).is_some()
    }

    /// Forget every engine and database, e.g. after a data redeploy.
    pub fn invalidate_all(&mut self) {
        info!(
            engines = self.engines.len(),
            dbs = self.dbs.len(),
            "invalidating predict engines"
        );
        self.engines.clear();
        self.dbs.clear();
    }

    /// Drop entries only the pool still holds. Engines go first, so a
    /// database freed by them is dropped in the same pass. Returns how many
    /// entries were removed.
    pub fn evict_unused(&mut self) -> usize {
        let before = self.engines.len() + self.dbs.len();
        self.engines.retain(|_, engine| Rc::strong_count(engine) > 1);
        self.dbs.retain(|_, db| Rc::strong_count(db) > 1);
        let evicted = before - self.engines.len() - self.dbs.len();
        if evicted > 0 {
            debug!(evicted, "evicted unused predict engines");
        }
        evicted
    }

    /// Whether anything besides the pool holds the engine of `schema_id`.
    pub fn is_in_use(&self, schema_id: &str) -> bool {
        self.engines
            .get(schema_id)
            .is_some_and(|engine| Rc::strong_count(engine) > 1)
    }

    pub fn engine_count(&self) -> usize {
        self.engines.len()
    }

    pub fn db_count(&self) -> usize {
        self.dbs.len()
    }
}
