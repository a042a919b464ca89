use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Component, Path, PathBuf};

/// Identity of the root toolchain type every implementation specializes.
///
/// It is built in: references to it never require a module file.
pub const TOOLCHAIN_BASE: &str = "toolchain.Toolchain";

/// Dotted module path (e.g., `toolchains.linalg.blacs`).
///
/// Module paths map one-to-one onto files below a search root, so the same
/// path found under two roots denotes the same module.
#[derive(Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ModulePath(pub String);

/// Stable identity of a type: its declaring module plus its name.
#[derive(Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TypePath(pub String);

impl ModulePath {
    /// Derive the module path of a file relative to a search root.
    ///
    /// Returns `None` when any segment is not a valid identifier, so files
    /// such as `gcc-core.json` are never importable.
    pub fn from_relative(relative: &Path) -> Option<Self> {
        let without_ext = relative.with_extension("");
        let mut segments = Vec::new();
        for component in without_ext.components() {
            let Component::Normal(segment) = component else {
                return None;
            };
            let segment = segment.to_str()?;
            if !is_identifier(segment) {
                return None;
            }
            segments.push(segment);
        }
        if segments.is_empty() {
            return None;
        }
        Some(Self(segments.join(".")))
    }

    /// Relative file location of this module below a search root.
    pub fn relative_file(&self, extension: &str) -> PathBuf {
        let mut path: PathBuf = self.0.split('.').collect();
        path.set_extension(extension);
        path
    }

    /// Identity of a type declared in this module.
    pub fn type_path(&self, type_name: &str) -> TypePath {
        TypePath(format!("{}.{}", self.0, type_name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TypePath {
    /// Split into declaring module and type name.
    pub fn split(&self) -> Option<(ModulePath, &str)> {
        let (module, name) = self.0.rsplit_once('.')?;
        if module.is_empty() || !is_identifier(name) {
            return None;
        }
        Some((ModulePath(module.to_string()), name))
    }

    pub fn is_toolchain_base(&self) -> bool {
        self.0 == TOOLCHAIN_BASE
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ModulePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for TypePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

fn is_identifier(segment: &str) -> bool {
    let mut chars = segment.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}
