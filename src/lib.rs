//! Toolchain capability registry.
//!
//! The crate discovers toolchain implementations declared in module files on
//! a search path (plus implementations linked into the binary), resolves a
//! requested toolchain name to the implementation serving it, and merges the
//! constants those modules export into one conflict-checked table.
//!
//! Typical use goes through [`ToolchainResolver`], or through
//! [`search_toolchain`] for the process-wide instance configured from
//! `TOOLCHAIN_REGISTRY_PATH`.

pub mod catalog;
pub mod config;
pub mod constants;
pub mod error;
pub mod resolver;

pub use catalog::{
    BuiltinToolchainDef, BuiltinToolchainReg, CapabilityPredicate, DescriptorOrigin, MatchPolicy,
    ModulePath, ModuleSpec, TOOLCHAIN_BASE, ToolchainDescriptor, TypePath, TypeSpec,
};
pub use config::SearchPath;
pub use constants::{ConstantEntry, ConstantTable, MergeOutcome};
pub use error::{RegistryError, Result};
pub use resolver::{
    Registry, Resolution, ToolchainResolver, search_toolchain, toolchain_constants,
};

/// Split comma- or whitespace-delimited configuration lists into tokens.
pub fn split_list(value: &str) -> Vec<String> {
    value
        .replace(',', " ")
        .split_whitespace()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_list_accepts_commas_and_whitespace() {
        assert_eq!(split_list("GCC, foss  intel,,"), vec!["GCC", "foss", "intel"]);
        assert!(split_list(" , ").is_empty());
    }
}
