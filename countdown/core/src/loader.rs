//! Sequential Module Loader
//!
//! Loads the celebration engine's modules exactly once per process, strictly
//! in order: module N+1 is not requested until module N has resolved, since
//! later modules depend on what earlier ones establish.
//!
//! # Idempotency
//!
//! Two layers keep work from being repeated:
//!
//! - The [`LoaderRegistry`] latch: once loading has been initiated, later
//!   invocations return [`LoadOutcome::AlreadyStarted`] without touching
//!   anything.
//! - Per-module dedup against the [`Document`]: a module whose request is
//!   already recorded there resolves immediately.
//!
//! # Failure
//!
//! The first failing module stops the chain with a [`LoadError`] naming it.
//! Nothing after it is requested, and the chain is never retried.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::document::Document;

/// Stable identifier of an external module (a path string)
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ModuleId(String);

impl ModuleId {
    /// Create a module id
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The identifier text
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ModuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ModuleId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// Why a single module failed
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ModuleFailure {
    /// The module could not be fetched
    #[error("fetch failed: {0}")]
    Fetch(String),

    /// The module was fetched but failed to execute
    #[error("execution failed: {0}")]
    Execute(String),
}

/// Failure of the load chain, naming the module that broke it
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("Failed to load {module}: {reason}")]
pub struct LoadError {
    /// The module that failed
    pub module: ModuleId,
    /// What went wrong
    pub reason: ModuleFailure,
}

/// Something that can fetch and execute a module
///
/// The loader's only contract with a module: it runs after being fully
/// fetched, and the call resolves with success or failure.
#[async_trait]
pub trait ModuleSource: Send + Sync {
    /// Fetch the module and execute it
    async fn load(&self, id: &ModuleId) -> Result<(), ModuleFailure>;
}

#[async_trait]
impl<T: ModuleSource + ?Sized> ModuleSource for Arc<T> {
    async fn load(&self, id: &ModuleId) -> Result<(), ModuleFailure> {
        (**self).load(id).await
    }
}

/// Loader progress
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LoaderState {
    /// Nothing has been requested
    NotStarted,
    /// The chain is running
    Loading,
    /// Every module loaded
    Loaded,
    /// The chain stopped at a failing module; never retried
    Failed(LoadError),
}

impl LoaderState {
    /// Whether the chain has finished, successfully or not
    pub fn is_settled(&self) -> bool {
        matches!(self, Self::Loaded | Self::Failed(_))
    }
}

/// What a call to [`SequentialLoader::load_all`] did
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LoadOutcome {
    /// This call ran the chain to completion
    Loaded,
    /// Loading had already been initiated; nothing was done
    AlreadyStarted,
}

/// Process-wide loader latch
///
/// Owned by the composition root and shared by handle. The latch moves
/// `NotStarted -> Loading -> Loaded | Failed` and is never reset outside
/// test harnesses.
#[derive(Clone, Debug)]
pub struct LoaderRegistry {
    state: Arc<Mutex<LoaderState>>,
}

impl Default for LoaderRegistry {
    fn default() -> Self {
        Self {
            state: Arc::new(Mutex::new(LoaderState::NotStarted)),
        }
    }
}

impl LoaderRegistry {
    /// Create a registry in the `NotStarted` state
    pub fn new() -> Self {
        Self::default()
    }

    /// Current state
    pub fn state(&self) -> LoaderState {
        self.state.lock().clone()
    }

    /// Claim the latch; returns false if loading was already initiated
    fn try_begin(&self) -> bool {
        let mut state = self.state.lock();
        if *state != LoaderState::NotStarted {
            return false;
        }
        *state = LoaderState::Loading;
        true
    }

    fn finish(&self, result: &Result<(), LoadError>) {
        *self.state.lock() = match result {
            Ok(()) => LoaderState::Loaded,
            Err(e) => LoaderState::Failed(e.clone()),
        };
    }

    /// Return the latch to `NotStarted`
    #[cfg(any(test, feature = "test-harness"))]
    pub fn reset(&self) {
        *self.state.lock() = LoaderState::NotStarted;
    }
}

/// Loads a fixed ordered module list
#[derive(Clone, Debug)]
pub struct SequentialLoader {
    modules: Vec<ModuleId>,
    registry: LoaderRegistry,
    document: Document,
}

impl SequentialLoader {
    /// Create a loader for `modules`, in the order given
    pub fn new(modules: Vec<ModuleId>, registry: LoaderRegistry, document: Document) -> Self {
        Self {
            modules,
            registry,
            document,
        }
    }

    /// Modules in request order
    pub fn modules(&self) -> &[ModuleId] {
        &self.modules
    }

    /// The registry this loader latches
    pub fn registry(&self) -> &LoaderRegistry {
        &self.registry
    }

    /// Load every module in order, once per process
    pub async fn load_all<S: ModuleSource + ?Sized>(
        &self,
        source: &S,
    ) -> Result<LoadOutcome, LoadError> {
        if !self.registry.try_begin() {
            tracing::debug!("Module loading already initiated, skipping");
            return Ok(LoadOutcome::AlreadyStarted);
        }

        tracing::info!(modules = self.modules.len(), "Loading celebration modules");
        let result = self.run_chain(source).await;
        self.registry.finish(&result);

        match &result {
            Ok(()) => tracing::info!("Celebration modules loaded"),
            Err(e) => tracing::error!(module = %e.module, error = %e.reason, "Celebration module failed to load"),
        }

        result.map(|()| LoadOutcome::Loaded)
    }

    async fn run_chain<S: ModuleSource + ?Sized>(&self, source: &S) -> Result<(), LoadError> {
        for module in &self.modules {
            self.load_one(source, module).await?;
        }
        Ok(())
    }

    async fn load_one<S: ModuleSource + ?Sized>(
        &self,
        source: &S,
        module: &ModuleId,
    ) -> Result<(), LoadError> {
        if !self.document.insert_module_request(module.as_str()) {
            tracing::debug!(%module, "Module already requested, treating as loaded");
            return Ok(());
        }

        tracing::debug!(%module, "Requesting module");
        source.load(module).await.map_err(|reason| LoadError {
            module: module.clone(),
            reason,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    struct CountingSource {
        calls: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl ModuleSource for CountingSource {
        async fn load(&self, id: &ModuleId) -> Result<(), ModuleFailure> {
            self.calls.lock().push(id.to_string());
            Ok(())
        }
    }

    fn loader(registry: LoaderRegistry, document: Document) -> SequentialLoader {
        SequentialLoader::new(
            vec!["a".into(), "b".into(), "c".into(), "d".into()],
            registry,
            document,
        )
    }

    #[tokio::test]
    async fn test_reset_allows_reload_in_harness() {
        let registry = LoaderRegistry::new();
        let source = CountingSource {
            calls: Mutex::new(Vec::new()),
        };

        let first = loader(registry.clone(), Document::new());
        assert_eq!(first.load_all(&source).await, Ok(LoadOutcome::Loaded));
        assert_eq!(first.load_all(&source).await, Ok(LoadOutcome::AlreadyStarted));

        registry.reset();
        assert_eq!(registry.state(), LoaderState::NotStarted);

        let second = loader(registry.clone(), Document::new());
        assert_eq!(second.load_all(&source).await, Ok(LoadOutcome::Loaded));
        assert_eq!(source.calls.lock().len(), 8);
    }

    #[test]
    fn test_requested_modules_land_in_document() {
        let document = Document::new();
        let source = CountingSource {
            calls: Mutex::new(Vec::new()),
        };

        let outcome = tokio_test::block_on(
            loader(LoaderRegistry::new(), document.clone()).load_all(&source),
        );
        assert_eq!(outcome, Ok(LoadOutcome::Loaded));
        assert_eq!(*source.calls.lock(), vec!["a", "b", "c", "d"]);
        assert!(document.has_module_request("c"));
    }

    #[test]
    fn test_load_error_names_module() {
        let err = LoadError {
            module: ModuleId::new("fireworks/stage.toml"),
            reason: ModuleFailure::Fetch("not found".into()),
        };
        assert_eq!(
            err.to_string(),
            "Failed to load fireworks/stage.toml: fetch failed: not found"
        );
    }
}
