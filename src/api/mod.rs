//! Schema-level wiring: resolve a schema's predict db, share it, and hand
//! out predictors and translators bound to one engine per schema.

mod pool;
mod resources;

pub use pool::{EnginePool, Schema};
pub use resources::{DirResolver, ResourceResolver, ResourceType, PREDICT_DB_RESOURCE};

use std::path::PathBuf;

use predict_core::db::DbError;

#[derive(Debug, thiserror::Error)]
pub enum ResourceError {
    #[error("predict db name is empty in schema '{0}'")]
    EmptyDbName(String),

    #[error("failed to load predict db '{path}': {source}")]
    Load {
        path: PathBuf,
        #[source]
        source: DbError,
    },
}
