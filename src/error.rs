//! Error taxonomy for discovery and resolution.
//!
//! Both discovery failures are fatal to the pass that raised them. A failed
//! name lookup is not an error; see [`crate::Resolution`].

use serde_json::Value;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result alias used throughout the registry.
pub type Result<T> = std::result::Result<T, RegistryError>;

/// Errors raised while building the toolchain registry.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// A discovered or referenced module could not be loaded.
    #[error("unable to load toolchain module {}: {reason}", path.display())]
    ModuleLoad {
        /// File (or expected file) of the offending module.
        path: PathBuf,
        /// Human-readable reason for rejection.
        reason: String,
    },

    /// Two modules declare the same constant with different values.
    #[error(
        "constant {name} defined as '{existing}' by {existing_origin}, can't set it to '{value}' from {origin}"
    )]
    ConstantConflict {
        /// Canonical constant name (prefix stripped).
        name: String,
        /// Value already present in the table.
        existing: Value,
        /// Module that contributed the existing value.
        existing_origin: String,
        /// Conflicting value.
        value: Value,
        /// Module that attempted the redefinition.
        origin: String,
    },

    /// A search root's toolchain directory could not be enumerated.
    #[error("unable to scan search root {}: {source}", path.display())]
    SearchRoot {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl RegistryError {
    pub(crate) fn module_load(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        RegistryError::ModuleLoad {
            path: path.into(),
            reason: reason.into(),
        }
    }
}
