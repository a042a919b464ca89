//! Name-based lookup over a discovered catalog.
//!
//! `Registry` is the immutable product of one discovery pass.
//! `ToolchainResolver` builds it lazily, once, and hands out shared
//! references afterwards; concurrent first callers serialize on the build
//! lock and never observe a partially populated registry.

use crate::catalog::{CapabilityPredicate, ToolchainDescriptor, discover};
use crate::config::SearchPath;
use crate::constants::ConstantTable;
use crate::error::Result;
use std::sync::{Mutex, OnceLock};
use tracing::{info, warn};

/// Catalog plus constant table produced by one discovery pass.
#[derive(Debug)]
pub struct Registry {
    catalog: Vec<ToolchainDescriptor>,
    constants: ConstantTable,
}

/// Outcome of a name lookup.
///
/// `toolchain` is `None` when nothing claims the name; `catalog` is always
/// the full, unfiltered catalog so callers can list what is available.
#[derive(Clone, Copy, Debug)]
pub struct Resolution<'a> {
    pub toolchain: Option<&'a ToolchainDescriptor>,
    pub catalog: &'a [ToolchainDescriptor],
}

impl Registry {
    /// Run discovery over `search_path` and freeze the result.
    pub fn discover(search_path: &SearchPath) -> Result<Self> {
        let output = discover(search_path)?;
        info!(
            toolchains = output.catalog.len(),
            constants = output.constants.len(),
            "toolchain registry built"
        );
        Ok(Self {
            catalog: output.catalog,
            constants: output.constants,
        })
    }

    /// Find the first concrete descriptor, in catalog order, claiming `name`.
    ///
    /// When several concrete descriptors claim the name the first one wins
    /// and the overlap is logged.
    pub fn resolve(&self, name: &str) -> Resolution<'_> {
        let mut matches = self
            .concrete()
            .filter(|descriptor| descriptor.is_toolchain_for(Some(name)));
        let toolchain = matches.next();
        if let Some(chosen) = toolchain {
            let shadowed: Vec<&str> = matches.map(|d| d.identity().as_str()).collect();
            if !shadowed.is_empty() {
                warn!(
                    name,
                    chosen = %chosen.identity(),
                    ?shadowed,
                    "multiple toolchains claim the same name"
                );
            }
        }
        Resolution {
            toolchain,
            catalog: &self.catalog,
        }
    }

    /// All discovered descriptors in catalog order.
    pub fn catalog(&self) -> &[ToolchainDescriptor] {
        &self.catalog
    }

    /// Descriptors usable as toolchains, in catalog order.
    pub fn concrete(&self) -> impl Iterator<Item = &ToolchainDescriptor> {
        self.catalog
            .iter()
            .filter(|descriptor| descriptor.is_toolchain_for(None))
    }

    pub fn constants(&self) -> &ConstantTable {
        &self.constants
    }
}

/// Lazily built, memoized registry for one search path.
#[derive(Debug)]
pub struct ToolchainResolver {
    search_path: SearchPath,
    built: OnceLock<Registry>,
    build_lock: Mutex<()>,
}

impl ToolchainResolver {
    pub fn new(search_path: SearchPath) -> Self {
        Self {
            search_path,
            built: OnceLock::new(),
            build_lock: Mutex::new(()),
        }
    }

    pub fn search_path(&self) -> &SearchPath {
        &self.search_path
    }

    /// Whether discovery has completed successfully.
    pub fn is_built(&self) -> bool {
        self.built.get().is_some()
    }

    /// Return the registry, running discovery on first use.
    ///
    /// A failed discovery leaves the resolver unbuilt; the error goes to the
    /// caller, which decides whether to retry.
    pub fn registry(&self) -> Result<&Registry> {
        if let Some(registry) = self.built.get() {
            return Ok(registry);
        }

        let _guard = self
            .build_lock
            .lock()
            .unwrap_or_else(|err| err.into_inner());
        if let Some(registry) = self.built.get() {
            return Ok(registry);
        }

        let registry = Registry::discover(&self.search_path)?;
        Ok(self.built.get_or_init(|| registry))
    }

    /// Resolve `name`, building the registry first if needed.
    pub fn resolve(&self, name: &str) -> Result<Resolution<'_>> {
        Ok(self.registry()?.resolve(name))
    }

    pub fn constants(&self) -> Result<&ConstantTable> {
        Ok(self.registry()?.constants())
    }
}

fn global_resolver() -> &'static ToolchainResolver {
    static GLOBAL: OnceLock<ToolchainResolver> = OnceLock::new();
    GLOBAL.get_or_init(|| ToolchainResolver::new(SearchPath::from_env()))
}

/// Resolve a toolchain name against the process-wide registry.
///
/// The registry is configured from `TOOLCHAIN_REGISTRY_PATH` and built on the
/// first call.
pub fn search_toolchain(name: &str) -> Result<Resolution<'static>> {
    global_resolver().resolve(name)
}

/// Constants harvested by the process-wide registry.
pub fn toolchain_constants() -> Result<&'static ConstantTable> {
    global_resolver().constants()
}
