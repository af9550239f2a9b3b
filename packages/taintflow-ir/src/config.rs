//! Analysis configuration and the endpoint class registry.
//!
//! The endpoint registry is process-wide and read-only after its first
//! use: it is filled exactly once, either explicitly or from a JSON
//! file holding a list of class names. A missing file means no endpoint
//! classes are configured; a file that exists but cannot be read or
//! parsed is a configuration error and fails the analysis instead of
//! silently disabling endpoint annotation.

use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{self, BufReader};
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use crate::errors::{Result, TaintflowError};

/// Tunables of a taint analysis run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaintAnalysisConfig {
    /// Upper bound on dynamic dispatch targets analyzed at one call
    /// site. Above the bound every dynamic target is dropped and only
    /// the static callee is analyzed. Bounding is deliberately unsound.
    pub max_dispatch_targets: usize,

    /// Worklist iteration bound per procedure; exceeding it is treated
    /// as divergence
    pub max_iterations: usize,

    /// JSON file with the endpoint class list (array of strings)
    pub endpoints_file: Option<PathBuf>,
}

impl Default for TaintAnalysisConfig {
    fn default() -> Self {
        Self {
            max_dispatch_targets: 3,
            max_iterations: 1000,
            endpoints_file: None,
        }
    }
}

static ENDPOINTS: OnceLock<FxHashSet<String>> = OnceLock::new();

/// Process-wide set of endpoint class names.
///
/// A source whose call-site class is in this set is annotated as an
/// endpoint in reports.
pub struct EndpointRegistry;

impl EndpointRegistry {
    /// Initialize from an explicit class list. First caller wins;
    /// later calls (including [`Self::ensure_loaded`]) see the same
    /// set.
    pub fn init<I, S>(classes: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let set: FxHashSet<String> = classes.into_iter().map(Into::into).collect();
        let _ = ENDPOINTS.set(set);
    }

    /// Populate the registry from the configured file, once. Called by
    /// the per-procedure checker before its first report can fire, so
    /// a broken endpoints file fails the analysis up front.
    pub fn ensure_loaded(config: &TaintAnalysisConfig) -> Result<()> {
        if ENDPOINTS.get().is_some() {
            return Ok(());
        }
        let classes = match &config.endpoints_file {
            Some(path) => Self::load(path)?,
            None => FxHashSet::default(),
        };
        let _ = ENDPOINTS.set(classes);
        Ok(())
    }

    /// The endpoint set. Empty until [`Self::init`] or
    /// [`Self::ensure_loaded`] has run.
    pub fn global() -> &'static FxHashSet<String> {
        ENDPOINTS.get_or_init(FxHashSet::default)
    }

    pub fn is_endpoint(class_name: &str) -> bool {
        Self::global().contains(class_name)
    }

    /// Parse a JSON array of class names into a set. A file that does
    /// not exist yields the empty set; any other failure is a
    /// configuration error.
    pub fn load(path: &Path) -> Result<FxHashSet<String>> {
        let file = match File::open(path) {
            Ok(file) => file,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                tracing::debug!(
                    "endpoint configuration {} not found; no endpoint classes",
                    path.display()
                );
                return Ok(FxHashSet::default());
            }
            Err(err) => {
                return Err(TaintflowError::EndpointConfig {
                    path: path.display().to_string(),
                    message: err.to_string(),
                })
            }
        };
        let classes: Vec<String> =
            serde_json::from_reader(BufReader::new(file)).map_err(|err| {
                TaintflowError::EndpointConfig {
                    path: path.display().to_string(),
                    message: err.to_string(),
                }
            })?;
        Ok(classes.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = TaintAnalysisConfig::default();
        assert_eq!(config.max_dispatch_targets, 3);
        assert!(config.endpoints_file.is_none());
    }

    #[test]
    fn test_load_endpoint_list() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"["HttpHandler", "RpcServer"]"#).unwrap();

        let set = EndpointRegistry::load(file.path()).unwrap();
        assert!(set.contains("HttpHandler"));
        assert!(set.contains("RpcServer"));
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_load_rejects_malformed_json() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"not": "a list"}}"#).unwrap();

        let err = EndpointRegistry::load(file.path()).unwrap_err();
        assert!(matches!(err, TaintflowError::EndpointConfig { .. }));
    }

    #[test]
    fn test_load_missing_file_yields_empty_set() {
        let set = EndpointRegistry::load(Path::new("/nonexistent/endpoints.json")).unwrap();
        assert!(set.is_empty());
    }
}
