//! Source transform for modules that declare targets.
//!
//! A module opts in by starting with the `"use target"` directive. Each
//! top-level `export [async] function Name(..) {..}` in such a module is
//! rewritten into a `registerTarget` call keyed by the content-addressed id
//! of `(module path, Name)`.

mod loader;
mod rewrite;

use std::{io, path::PathBuf};

use thiserror::Error;

pub use loader::{LoadResult, LoadedModule, ModuleFormat, ModuleLoader, is_script_path};
pub use rewrite::{
    DEFAULT_RUNTIME_MODULE, DiscoveredTarget, REGISTER_FN, TransformOutput, has_target_directive,
    transform_source,
};

#[derive(Debug, Error)]
pub enum TransformError {
    #[error("failed to parse `{module_path}`: {}", messages.join("; "))]
    Parse {
        module_path: String,
        messages: Vec<String>,
    },
    #[error("`{module_path}` starts with the target directive outside a directive prologue")]
    MisplacedDirective { module_path: String },
    #[error("`{module_path}` is not valid UTF-8")]
    Encoding {
        module_path: String,
        #[source]
        source: std::str::Utf8Error,
    },
    #[error("io error on `{}`", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("`{}` is outside the module root `{}`", path.display(), root.display())]
    OutsideRoot { path: PathBuf, root: PathBuf },
}

impl TransformError {
    fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
