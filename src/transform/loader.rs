//! Module loader hook wrapping [`transform_source`].
//!
//! Mirrors a loader that is handed the default load result for a module and
//! may replace its source. Anything that is not a target module comes back
//! exactly as it went in.

use std::path::{Component, Path};

use bytes::Bytes;
use metrics::counter;
use tracing::{debug, info};

use super::{
    TransformError,
    rewrite::{DEFAULT_RUNTIME_MODULE, has_target_directive, transform_source},
};

const SCRIPT_EXTENSIONS: [&str; 4] = ["js", "jsx", "ts", "tsx"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModuleFormat {
    Module,
    CommonJs,
    Json,
    Unknown,
}

impl ModuleFormat {
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("js" | "jsx" | "ts" | "tsx" | "mjs" | "mts") => Self::Module,
            Some("cjs" | "cts") => Self::CommonJs,
            Some("json") => Self::Json,
            _ => Self::Unknown,
        }
    }
}

/// Result of loading one module: its format and (optional) source bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadResult {
    pub format: ModuleFormat,
    pub source: Option<Bytes>,
}

/// A module read from disk and passed through the loader hook.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedModule {
    /// Path relative to the module root, `/`-separated; the id namespace.
    pub module_path: String,
    pub result: LoadResult,
    pub transformed: bool,
}

/// Whether `path` names a module type the transform looks at.
pub fn is_script_path(path: &str) -> bool {
    Path::new(path)
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| SCRIPT_EXTENSIONS.contains(&ext))
}

#[derive(Debug, Clone)]
pub struct ModuleLoader {
    runtime_module: String,
}

impl Default for ModuleLoader {
    fn default() -> Self {
        Self::new(DEFAULT_RUNTIME_MODULE)
    }
}

impl ModuleLoader {
    pub fn new(runtime_module: impl Into<String>) -> Self {
        Self {
            runtime_module: runtime_module.into(),
        }
    }

    pub fn runtime_module(&self) -> &str {
        &self.runtime_module
    }

    /// Apply the transform to a default load result.
    pub fn load(&self, module_path: &str, result: LoadResult) -> Result<LoadResult, TransformError> {
        Ok(self.load_inner(module_path, result)?.0)
    }

    fn load_inner(
        &self,
        module_path: &str,
        result: LoadResult,
    ) -> Result<(LoadResult, bool), TransformError> {
        if !is_script_path(module_path) {
            return Ok((result, false));
        }
        let Some(bytes) = result.source.as_ref() else {
            return Ok((result, false));
        };

        // Non-UTF-8 modules are only an error when they opt in.
        let text = match std::str::from_utf8(bytes) {
            Ok(text) => text,
            Err(source) => {
                let lossy = String::from_utf8_lossy(bytes);
                if has_target_directive(&lossy) {
                    return Err(TransformError::Encoding {
                        module_path: module_path.to_string(),
                        source,
                    });
                }
                return Ok((result, false));
            }
        };

        match transform_source(module_path, text, &self.runtime_module)? {
            Some(output) => {
                counter!("retarget_modules_transformed_total").increment(1);
                for target in &output.targets {
                    debug!(
                        module_path,
                        name = %target.name,
                        target_id = %target.id,
                        "registered target declaration"
                    );
                }
                Ok((
                    LoadResult {
                        format: result.format,
                        source: Some(Bytes::from(output.source)),
                    },
                    true,
                ))
            }
            None => Ok((result, false)),
        }
    }

    /// Read `path`, derive its module path relative to `root` and apply the hook.
    pub async fn load_file(&self, root: &Path, path: &Path) -> Result<LoadedModule, TransformError> {
        let root = tokio::fs::canonicalize(root)
            .await
            .map_err(|err| TransformError::io(root, err))?;
        let path = tokio::fs::canonicalize(path)
            .await
            .map_err(|err| TransformError::io(path, err))?;
        let module_path = relative_module_path(&root, &path)?;

        let source = tokio::fs::read(&path)
            .await
            .map_err(|err| TransformError::io(&path, err))?;
        let loaded = LoadResult {
            format: ModuleFormat::from_path(&path),
            source: Some(Bytes::from(source)),
        };

        let (result, transformed) = self.load_inner(&module_path, loaded)?;
        if transformed {
            info!(module_path = %module_path, "transformed target module");
        }

        Ok(LoadedModule {
            module_path,
            result,
            transformed,
        })
    }
}

fn relative_module_path(root: &Path, path: &Path) -> Result<String, TransformError> {
    let relative = path
        .strip_prefix(root)
        .map_err(|_| TransformError::OutsideRoot {
            path: path.to_path_buf(),
            root: root.to_path_buf(),
        })?;

    let segments: Vec<_> = relative
        .components()
        .filter_map(|component| match component {
            Component::Normal(segment) => Some(segment.to_string_lossy()),
            _ => None,
        })
        .collect();
    Ok(segments.join("/"))
}
