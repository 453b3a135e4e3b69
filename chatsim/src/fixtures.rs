//! Sources for the static JSON fixtures backing `dummy` and `extended`
//! rooms.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use chatsim_proto::fixture::{self, FixtureDocument, FixtureError};
use chatsim_proto::room::DataSource;

/// Errors that can occur while loading a fixture.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    /// The data source has no fixture, or the source does not hold one.
    #[error("no fixture for data source {0}")]
    NotFound(DataSource),

    /// Reading the fixture file failed.
    #[error("failed to read fixture {path}: {source}")]
    Io {
        /// Path that was attempted.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The fixture contents are malformed.
    #[error(transparent)]
    Decode(#[from] FixtureError),
}

/// Something that can produce the fixture document for a data source.
pub trait FixtureSource: Send + Sync {
    /// Load the fixture for `source`.
    fn load(
        &self,
        source: DataSource,
    ) -> impl std::future::Future<Output = Result<FixtureDocument, LoadError>> + Send;
}

/// Reads fixtures from `<root>/<fixture file>` on disk.
#[derive(Debug, Clone)]
pub struct DirFixtureSource {
    root: PathBuf,
}

impl DirFixtureSource {
    /// Creates a source rooted at `root`.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The directory fixtures are read from.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl FixtureSource for DirFixtureSource {
    async fn load(&self, source: DataSource) -> Result<FixtureDocument, LoadError> {
        let file = source.fixture_file().ok_or(LoadError::NotFound(source))?;
        let path = self.root.join(file);
        let bytes = tokio::fs::read(&path)
            .await
            .map_err(|e| LoadError::Io { path, source: e })?;
        Ok(fixture::decode(&bytes)?)
    }
}

/// Serves fixture documents held in memory.
#[derive(Debug, Clone, Default)]
pub struct StaticFixtureSource {
    documents: HashMap<DataSource, FixtureDocument>,
}

impl StaticFixtureSource {
    /// Creates an empty source; every load fails with `NotFound`.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds (or replaces) the document served for `source`.
    #[must_use]
    pub fn with(mut self, source: DataSource, document: FixtureDocument) -> Self {
        self.documents.insert(source, document);
        self
    }
}

impl FixtureSource for StaticFixtureSource {
    async fn load(&self, source: DataSource) -> Result<FixtureDocument, LoadError> {
        self.documents
            .get(&source)
            .cloned()
            .ok_or(LoadError::NotFound(source))
    }
}
