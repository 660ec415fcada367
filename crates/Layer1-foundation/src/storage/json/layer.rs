//! JSON 설정 레이어 - one config file per scope, applied in order

use crate::{Error, Result};
use serde::de::DeserializeOwned;
use std::fmt;
use std::path::{Path, PathBuf};

/// Directory name used for both global and project layers
const LAYER_DIR: &str = "offload";

/// Where a layer lives; later scopes override earlier ones
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayerScope {
    /// `<config_dir>/offload/`
    Global,
    /// `<root>/.offload/`
    Project,
    /// A file named explicitly by the caller
    File,
}

impl fmt::Display for LayerScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LayerScope::Global => write!(f, "global"),
            LayerScope::Project => write!(f, "project"),
            LayerScope::File => write!(f, "file"),
        }
    }
}

/// A single JSON config file at a known scope
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigLayer {
    scope: LayerScope,
    path: PathBuf,
}

impl ConfigLayer {
    pub fn new(scope: LayerScope, path: impl Into<PathBuf>) -> Self {
        Self {
            scope,
            path: path.into(),
        }
    }

    /// `filename` under the user config dir; `None` when the platform has none
    pub fn global(filename: &str) -> Option<Self> {
        dirs::config_dir()
            .map(|dir| Self::new(LayerScope::Global, dir.join(LAYER_DIR).join(filename)))
    }

    /// `filename` under `<root>/.offload/`
    pub fn project(root: impl AsRef<Path>, filename: &str) -> Self {
        Self::new(
            LayerScope::Project,
            root.as_ref().join(format!(".{}", LAYER_DIR)).join(filename),
        )
    }

    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self::new(LayerScope::File, path)
    }

    /// Global then current-directory project layer, in override order
    pub fn standard(filename: &str) -> Vec<Self> {
        let mut layers: Vec<Self> = Self::global(filename).into_iter().collect();
        match std::env::current_dir() {
            Ok(cwd) => layers.push(Self::project(cwd, filename)),
            Err(e) => tracing::debug!("No project config layer: {}", e),
        }
        layers
    }

    pub fn scope(&self) -> LayerScope {
        self.scope
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Parse the layer. A missing global/project file is `None`; a missing
    /// explicit file is an error.
    pub fn read<T: DeserializeOwned>(&self) -> Result<Option<T>> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound && self.scope != LayerScope::File => {
                return Ok(None);
            }
            Err(e) => {
                return Err(Error::Config(format!(
                    "Failed to read {} config {}: {}",
                    self.scope,
                    self.path.display(),
                    e
                )));
            }
        };

        serde_json::from_str(&content).map(Some).map_err(|e| {
            Error::Config(format!(
                "Failed to parse {} config {}: {}",
                self.scope,
                self.path.display(),
                e
            ))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_project_layer_path() {
        let layer = ConfigLayer::project("/work/app", "config.json");
        assert_eq!(layer.scope(), LayerScope::Project);
        assert_eq!(layer.path(), Path::new("/work/app/.offload/config.json"));
    }

    #[test]
    fn test_missing_optional_layer() {
        let dir = tempfile::tempdir().unwrap();
        let layer = ConfigLayer::project(dir.path(), "config.json");
        let loaded: Option<HashMap<String, u64>> = layer.read().unwrap();
        assert!(loaded.is_none());
    }

    #[test]
    fn test_missing_explicit_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let layer = ConfigLayer::file(dir.path().join("nope.json"));
        let result: Result<Option<HashMap<String, u64>>> = layer.read();
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_invalid_json_names_scope() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.json");
        std::fs::write(&path, "{ not json").unwrap();

        let result: Result<Option<HashMap<String, u64>>> =
            ConfigLayer::new(LayerScope::Global, &path).read();
        match result {
            Err(Error::Config(msg)) => assert!(msg.contains("global config")),
            other => panic!("expected config error, got {:?}", other),
        }
    }

    #[test]
    fn test_read_present_layer() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"waitMs": 250}"#).unwrap();

        let loaded: Option<HashMap<String, u64>> = ConfigLayer::file(&path).read().unwrap();
        assert_eq!(loaded.unwrap().get("waitMs"), Some(&250));
    }
}
