use std::path::PathBuf;

use tracing::debug;

/// A kind of resource file: an id is mapped to `prefix + id + suffix`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResourceType {
    pub name: &'static str,
    pub prefix: &'static str,
    pub suffix: &'static str,
}

/// Predict databases are referenced by file name as-is.
pub const PREDICT_DB_RESOURCE: ResourceType = ResourceType {
    name: "predict_db",
    prefix: "",
    suffix: "",
};

impl ResourceType {
    pub fn file_name(&self, resource_id: &str) -> String {
        format!("{}{resource_id}{}", self.prefix, self.suffix)
    }
}

/// Maps a resource id to a file path.
pub trait ResourceResolver {
    fn resolve_path(&self, resource_id: &str) -> PathBuf;
}

/// Resolves ids under a root directory, optionally falling back to a second
/// directory when the file is missing from the first.
#[derive(Debug, Clone)]
pub struct DirResolver {
    resource_type: ResourceType,
    root: PathBuf,
    fallback: Option<PathBuf>,
}

impl DirResolver {
    pub fn new(resource_type: ResourceType, root: impl Into<PathBuf>) -> Self {
        Self {
            resource_type,
            root: root.into(),
            fallback: None,
        }
    }

    /// Typically a user directory first and the shared data directory second.
    pub fn with_fallback(mut self, fallback: impl Into<PathBuf>) -> Self {
        self.fallback = Some(fallback.into());
        self
    }
}

impl ResourceResolver for DirResolver {
    fn resolve_path(&self, resource_id: &str) -> PathBuf {
        let file_name = self.resource_type.file_name(resource_id);
        let primary = self.root.join(&file_name);
        if let Some(fallback) = &self.fallback {
            if !primary.exists() {
                let secondary = fallback.join(&file_name);
                if secondary.exists() {
                    debug!(
                        resource = self.resource_type.name,
                        path = %secondary.display(),
                        "resolved from fallback directory"
                    );
                    return secondary;
                }
            }
        }
        primary
    }
}
