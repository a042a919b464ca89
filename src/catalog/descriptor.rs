//! Descriptors for discovered toolchain implementations and the capability
//! predicate the resolver evaluates against them.

use crate::catalog::identity::{ModulePath, TypePath};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// How a descriptor compares requested names with the names it claims.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchPolicy {
    /// Byte-for-byte equality.
    #[default]
    Exact,
    /// Case-insensitive, ignoring every non-alphanumeric character, so
    /// `GCC-core`, `gcccore` and `GCC_Core` are one equivalence class.
    Normalized,
}

impl MatchPolicy {
    pub fn matches(self, claimed: &str, requested: &str) -> bool {
        match self {
            MatchPolicy::Exact => claimed == requested,
            MatchPolicy::Normalized => normalize(claimed) == normalize(requested),
        }
    }
}

fn normalize(name: &str) -> String {
    name.chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_lowercase)
        .collect()
}

/// Answers whether an implementation serves a toolchain name.
///
/// `None` asks whether the implementation is concrete, i.e. selectable at
/// all. Implementations must be pure: the resolver may call them in any
/// order, repeatedly, from any thread.
pub trait CapabilityPredicate {
    fn is_toolchain_for(&self, name: Option<&str>) -> bool;
}

/// Where a descriptor came from.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DescriptorOrigin {
    /// Declared in a module file found on the search path.
    Module { module: ModulePath, file: PathBuf },
    /// Registered at link time via `inventory`.
    Builtin,
}

/// The registry's handle on one toolchain implementation type.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct ToolchainDescriptor {
    identity: TypePath,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    aliases: Vec<String>,
    matching: MatchPolicy,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    bases: Vec<TypePath>,
    origin: DescriptorOrigin,
}

impl ToolchainDescriptor {
    pub fn new(identity: TypePath, origin: DescriptorOrigin) -> Self {
        Self {
            identity,
            name: None,
            aliases: Vec::new(),
            matching: MatchPolicy::default(),
            bases: Vec::new(),
            origin,
        }
    }

    /// Claim a toolchain name, making the descriptor concrete.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn with_aliases<I, S>(mut self, aliases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.aliases = aliases.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn with_matching(mut self, matching: MatchPolicy) -> Self {
        self.matching = matching;
        self
    }

    #[must_use]
    pub fn with_bases(mut self, bases: Vec<TypePath>) -> Self {
        self.bases = bases;
        self
    }

    pub fn identity(&self) -> &TypePath {
        &self.identity
    }

    /// Toolchain name claimed by this implementation; `None` when abstract.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn aliases(&self) -> &[String] {
        &self.aliases
    }

    pub fn matching(&self) -> MatchPolicy {
        self.matching
    }

    pub fn bases(&self) -> &[TypePath] {
        &self.bases
    }

    pub fn origin(&self) -> &DescriptorOrigin {
        &self.origin
    }

    pub fn is_concrete(&self) -> bool {
        self.is_toolchain_for(None)
    }
}

impl CapabilityPredicate for ToolchainDescriptor {
    fn is_toolchain_for(&self, name: Option<&str>) -> bool {
        let Some(claimed) = self.name.as_deref() else {
            return false;
        };
        let Some(requested) = name else {
            return true;
        };
        std::iter::once(claimed)
            .chain(self.aliases.iter().map(String::as_str))
            .any(|candidate| self.matching.matches(candidate, requested))
    }
}
