//! Fireworks Module Source
//!
//! Fetches a module's text from the assets directory, or from the copies
//! compiled into the binary, then executes it against the shared
//! [`StageContext`].

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;

use countdown_core::{ModuleFailure, ModuleId, ModuleSource};

use super::StageContext;

/// Modules shipped with the binary
const BUILTIN: [(&str, &str); 4] = [
    (
        "fireworks/screen.toml",
        include_str!("../../../countdown/core/assets/fireworks/screen.toml"),
    ),
    (
        "fireworks/stage.toml",
        include_str!("../../../countdown/core/assets/fireworks/stage.toml"),
    ),
    (
        "fireworks/math.toml",
        include_str!("../../../countdown/core/assets/fireworks/math.toml"),
    ),
    (
        "fireworks/shells.toml",
        include_str!("../../../countdown/core/assets/fireworks/shells.toml"),
    ),
];

/// Loads fireworks modules into a stage context
pub struct AssetSource {
    assets_dir: Option<PathBuf>,
    context: Arc<Mutex<StageContext>>,
}

impl AssetSource {
    /// Source reading from `assets_dir`, or the built-in copies when `None`
    pub fn new(assets_dir: Option<PathBuf>, context: Arc<Mutex<StageContext>>) -> Self {
        Self {
            assets_dir,
            context,
        }
    }

    /// The context modules execute against
    pub fn context(&self) -> &Arc<Mutex<StageContext>> {
        &self.context
    }

    async fn fetch(&self, id: &ModuleId) -> Result<String, ModuleFailure> {
        match &self.assets_dir {
            Some(dir) => {
                let path = dir.join(id.as_str());
                tokio::fs::read_to_string(&path)
                    .await
                    .map_err(|e| ModuleFailure::Fetch(format!("{}: {e}", path.display())))
            }
            None => BUILTIN
                .iter()
                .find(|(name, _)| *name == id.as_str())
                .map(|(_, text)| (*text).to_string())
                .ok_or_else(|| ModuleFailure::Fetch("no built-in module with that name".into())),
        }
    }
}

#[async_trait]
impl ModuleSource for AssetSource {
    async fn load(&self, id: &ModuleId) -> Result<(), ModuleFailure> {
        let text = self.fetch(id).await?;
        self.context
            .lock()
            .execute(&text)
            .map_err(|e| ModuleFailure::Execute(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use countdown_core::{Document, LoaderRegistry, SequentialLoader, DEFAULT_MODULES};

    fn modules() -> Vec<ModuleId> {
        DEFAULT_MODULES.iter().map(|m| ModuleId::new(*m)).collect()
    }

    #[tokio::test]
    async fn test_builtin_modules_assemble_the_stage() {
        let context = Arc::new(Mutex::new(StageContext::new()));
        let source = AssetSource::new(None, context.clone());
        let loader = SequentialLoader::new(modules(), LoaderRegistry::new(), Document::new());

        loader.load_all(&source).await.unwrap();
        assert!(context.lock().settings().is_some());
    }

    #[tokio::test]
    async fn test_missing_file_is_a_fetch_failure() {
        let dir = tempfile::tempdir().unwrap();
        let source = AssetSource::new(
            Some(dir.path().to_path_buf()),
            Arc::new(Mutex::new(StageContext::new())),
        );

        let err = source
            .load(&ModuleId::new("fireworks/screen.toml"))
            .await
            .unwrap_err();
        assert!(matches!(err, ModuleFailure::Fetch(_)));
    }

    #[tokio::test]
    async fn test_assets_dir_overrides_builtin() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("fireworks")).unwrap();
        std::fs::write(
            dir.path().join("fireworks/screen.toml"),
            "provides = \"stage\"\nrequires = [\"screen\"]\n",
        )
        .unwrap();

        let source = AssetSource::new(
            Some(dir.path().to_path_buf()),
            Arc::new(Mutex::new(StageContext::new())),
        );
        let err = source
            .load(&ModuleId::new("fireworks/screen.toml"))
            .await
            .unwrap_err();
        assert!(matches!(err, ModuleFailure::Execute(_)));
    }
}
