//! Search-path configuration for the discovery pass.
//!
//! Roots are injected explicitly so tests can point discovery at a temporary
//! directory; `SearchPath::from_env` is the default used by the process-wide
//! resolver and mirrors the environment-driven configuration of the helper
//! binaries.

use std::env;
use std::path::{Path, PathBuf};

/// Platform path list of search roots used by the process-wide resolver.
pub const SEARCH_PATH_ENV: &str = "TOOLCHAIN_REGISTRY_PATH";
/// Disables built-in registrations when set to anything but empty or `0`.
pub const NO_BUILTINS_ENV: &str = "TOOLCHAIN_REGISTRY_NO_BUILTINS";

/// Subdirectory of every root that holds toolchain implementation modules.
pub const TOOLCHAIN_SUBDIR: &str = "toolchains";
/// Extension of module files.
pub const MODULE_EXTENSION: &str = "json";
/// Reserved package entry point; never treated as an implementation module.
pub const ENTRY_POINT_STEM: &str = "mod";
/// Symbols starting with this prefix are harvested into the constant table.
pub const CONSTANT_PREFIX: &str = "TC_CONSTANT_";

/// Ordered set of directories scanned during discovery.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SearchPath {
    roots: Vec<PathBuf>,
    include_builtins: bool,
}

impl SearchPath {
    /// Build a search path from explicit roots.
    ///
    /// Order is preserved; repeated roots keep their first position only.
    pub fn new<I, P>(roots: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        let mut unique: Vec<PathBuf> = Vec::new();
        for root in roots {
            let root = root.into();
            if !unique.contains(&root) {
                unique.push(root);
            }
        }
        Self {
            roots: unique,
            include_builtins: true,
        }
    }

    /// Read roots from `TOOLCHAIN_REGISTRY_PATH`.
    ///
    /// An unset variable yields an empty search path, which still resolves the
    /// built-in toolchains unless `TOOLCHAIN_REGISTRY_NO_BUILTINS` is set.
    pub fn from_env() -> Self {
        let roots: Vec<PathBuf> = env::var_os(SEARCH_PATH_ENV)
            .map(|paths| {
                env::split_paths(&paths)
                    .filter(|p| !p.as_os_str().is_empty())
                    .collect()
            })
            .unwrap_or_default();
        let disabled = builtins_disabled(env::var(NO_BUILTINS_ENV).ok().as_deref());
        Self::new(roots).with_builtins(!disabled)
    }

    /// Toggle link-time registered implementations.
    #[must_use]
    pub fn with_builtins(mut self, include: bool) -> Self {
        self.include_builtins = include;
        self
    }

    pub fn roots(&self) -> &[PathBuf] {
        &self.roots
    }

    pub fn includes_builtins(&self) -> bool {
        self.include_builtins
    }

    /// Directory scanned for implementation modules under `root`.
    pub fn toolchain_dir(root: &Path) -> PathBuf {
        root.join(TOOLCHAIN_SUBDIR)
    }
}

/// Value of `TOOLCHAIN_REGISTRY_NO_BUILTINS`: unset, blank or `"0"` keeps
/// built-ins enabled, anything else disables them.
fn builtins_disabled(value: Option<&str>) -> bool {
    value.map(str::trim).is_some_and(|v| !v.is_empty() && v != "0")
}

impl Default for SearchPath {
    fn default() -> Self {
        Self::new(Vec::<PathBuf>::new())
    }
}
