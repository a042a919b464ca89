//! Discovery pass: scan the search roots, load every implementation module
//! and the modules it references, harvest constants, and register each
//! toolchain type exactly once.
//!
//! Ordering is fully determined by the inputs. Roots are visited in the order
//! given, files inside `<root>/toolchains` in sorted order, referenced modules
//! depth-first at the point they are first needed. Catalog order follows
//! module load order with bases ahead of their specializations.

use crate::catalog::builtin::builtin_toolchains;
use crate::catalog::descriptor::{DescriptorOrigin, ToolchainDescriptor};
use crate::catalog::identity::{ModulePath, TypePath};
use crate::catalog::model::{LoadedModule, TypeSpec, load_module_file};
use crate::config::{
    CONSTANT_PREFIX, ENTRY_POINT_STEM, MODULE_EXTENSION, SearchPath, TOOLCHAIN_SUBDIR,
};
use crate::constants::ConstantTable;
use crate::error::{RegistryError, Result};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Everything a discovery pass produces.
#[derive(Debug)]
pub struct DiscoveryOutput {
    pub catalog: Vec<ToolchainDescriptor>,
    pub constants: ConstantTable,
}

/// Run a full discovery pass over `search_path`.
///
/// Each call starts from empty state, so repeating it with unchanged inputs
/// produces identical output. The first load failure or constant conflict
/// aborts the pass.
pub fn discover(search_path: &SearchPath) -> Result<DiscoveryOutput> {
    let mut pass = DiscoveryPass::new(search_path);
    for (module, file) in scan_search_path(search_path)? {
        pass.ensure_loaded(&module, &file)?;
        pass.harvest(&module)?;
    }

    let mut catalog = pass.build_catalog()?;
    if search_path.includes_builtins() {
        pass.append_builtins(&mut catalog)?;
    }

    Ok(DiscoveryOutput {
        catalog,
        constants: pass.constants,
    })
}

/// List implementation modules under every root's `toolchains/` directory.
///
/// A module path found under an earlier root shadows the same path under
/// later roots. Files whose names are not valid module identifiers are load
/// errors rather than silently skipped.
pub fn scan_search_path(search_path: &SearchPath) -> Result<Vec<(ModulePath, PathBuf)>> {
    let mut found: Vec<(ModulePath, PathBuf)> = Vec::new();
    let mut seen: BTreeSet<ModulePath> = BTreeSet::new();

    for root in search_path.roots() {
        let dir = SearchPath::toolchain_dir(root);
        if !dir.is_dir() {
            continue;
        }
        let entries = fs::read_dir(&dir).map_err(|source| RegistryError::SearchRoot {
            path: dir.clone(),
            source,
        })?;

        let mut files = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|source| RegistryError::SearchRoot {
                path: dir.clone(),
                source,
            })?;
            let path = entry.path();
            if !path.is_file() {
                continue;
            }
            if path.extension().and_then(|ext| ext.to_str()) != Some(MODULE_EXTENSION) {
                continue;
            }
            if path.file_stem().and_then(|stem| stem.to_str()) == Some(ENTRY_POINT_STEM) {
                continue;
            }
            files.push(path);
        }
        files.sort();

        for file in files {
            let relative = Path::new(TOOLCHAIN_SUBDIR).join(file.file_name().unwrap_or_default());
            let module = ModulePath::from_relative(&relative).ok_or_else(|| {
                RegistryError::module_load(&file, "file name is not a valid module name")
            })?;
            if !seen.insert(module.clone()) {
                warn!(
                    module = %module,
                    file = %file.display(),
                    "module shadowed by an earlier search root"
                );
                continue;
            }
            found.push((module, file));
        }
    }

    Ok(found)
}

struct DiscoveryPass<'a> {
    search_path: &'a SearchPath,
    modules: BTreeMap<ModulePath, LoadedModule>,
    load_order: Vec<ModulePath>,
    harvested: BTreeSet<ModulePath>,
    constants: ConstantTable,
    toolchain_types: BTreeMap<TypePath, bool>,
}

impl<'a> DiscoveryPass<'a> {
    fn new(search_path: &'a SearchPath) -> Self {
        Self {
            search_path,
            modules: BTreeMap::new(),
            load_order: Vec::new(),
            harvested: BTreeSet::new(),
            constants: ConstantTable::new(),
            toolchain_types: BTreeMap::new(),
        }
    }

    /// Load a module and, transitively, the modules of every type it references.
    fn ensure_loaded(&mut self, module: &ModulePath, file: &Path) -> Result<()> {
        if self.modules.contains_key(module) {
            return Ok(());
        }
        debug!(module = %module, file = %file.display(), "importing toolchain module");
        let loaded = load_module_file(module.clone(), file)?;
        let references: Vec<TypePath> = loaded
            .spec
            .referenced_types()
            .into_iter()
            .cloned()
            .collect();
        self.modules.insert(module.clone(), loaded);
        self.load_order.push(module.clone());

        for reference in &references {
            self.resolve_reference(reference, file)?;
        }
        Ok(())
    }

    fn resolve_reference(&mut self, reference: &TypePath, referrer: &Path) -> Result<()> {
        if reference.is_toolchain_base() {
            return Ok(());
        }
        let (module, type_name) = reference.split().ok_or_else(|| {
            RegistryError::module_load(referrer, format!("invalid type reference {reference}"))
        })?;

        if !self.modules.contains_key(&module) {
            let file = self.locate(&module).ok_or_else(|| {
                RegistryError::module_load(
                    referrer,
                    format!("cannot resolve {reference}: module {module} not found on search path"),
                )
            })?;
            self.ensure_loaded(&module, &file)?;
        }

        let declared = self
            .modules
            .get(&module)
            .is_some_and(|loaded| loaded.spec.find_type(type_name).is_some());
        if !declared {
            return Err(RegistryError::module_load(
                referrer,
                format!("cannot resolve {reference}: module {module} does not define {type_name}"),
            ));
        }
        Ok(())
    }

    fn locate(&self, module: &ModulePath) -> Option<PathBuf> {
        let relative = module.relative_file(MODULE_EXTENSION);
        self.search_path
            .roots()
            .iter()
            .map(|root| root.join(&relative))
            .find(|candidate| candidate.is_file())
    }

    /// Merge the constants visible from one scanned module: its own symbols
    /// plus those of every module declaring a type it references.
    fn harvest(&mut self, module: &ModulePath) -> Result<()> {
        if !self.harvested.insert(module.clone()) {
            return Ok(());
        }
        let Some(loaded) = self.modules.get(module) else {
            return Ok(());
        };

        let mut sources = vec![module.clone()];
        for reference in loaded.spec.referenced_types() {
            if reference.is_toolchain_base() {
                continue;
            }
            if let Some((declaring, _)) = reference.split() {
                if !sources.contains(&declaring) {
                    sources.push(declaring);
                }
            }
        }

        for source in &sources {
            let Some(source_module) = self.modules.get(source) else {
                continue;
            };
            let origin = source_module.origin_label();
            self.constants
                .harvest(&source_module.spec.symbols, CONSTANT_PREFIX, &origin)?;
        }
        Ok(())
    }

    fn type_spec(&self, ty: &TypePath) -> Result<(&LoadedModule, &TypeSpec)> {
        let missing = || {
            RegistryError::module_load(PathBuf::from(ty.as_str()), format!("unknown type {ty}"))
        };
        let (module, name) = ty.split().ok_or_else(missing)?;
        let loaded = self.modules.get(&module).ok_or_else(missing)?;
        let spec = loaded.spec.find_type(name).ok_or_else(missing)?;
        Ok((loaded, spec))
    }

    /// Whether `ty` is the toolchain base or transitively extends it.
    fn is_toolchain(&mut self, ty: &TypePath, visiting: &mut Vec<TypePath>) -> Result<bool> {
        if ty.is_toolchain_base() {
            return Ok(true);
        }
        if let Some(&known) = self.toolchain_types.get(ty) {
            return Ok(known);
        }
        let (loaded, spec) = self.type_spec(ty)?;
        if visiting.contains(ty) {
            return Err(RegistryError::module_load(
                &loaded.file,
                format!("inheritance cycle through {ty}"),
            ));
        }
        let bases = spec.extends.clone();

        visiting.push(ty.clone());
        let mut result = false;
        for base in &bases {
            // Every base is visited so cycles are reported even when an
            // earlier base already reached the toolchain root.
            if self.is_toolchain(base, visiting)? {
                result = true;
            }
        }
        visiting.pop();

        self.toolchain_types.insert(ty.clone(), result);
        Ok(result)
    }

    fn build_catalog(&mut self) -> Result<Vec<ToolchainDescriptor>> {
        let mut catalog = Vec::new();
        let mut registered = BTreeSet::new();
        for module in self.load_order.clone() {
            let declared: Vec<TypePath> = self.modules[&module]
                .spec
                .types
                .iter()
                .map(|ty| module.type_path(&ty.name))
                .collect();
            for ty in &declared {
                self.register(ty, &mut catalog, &mut registered)?;
            }
        }
        Ok(catalog)
    }

    fn register(
        &mut self,
        ty: &TypePath,
        catalog: &mut Vec<ToolchainDescriptor>,
        registered: &mut BTreeSet<TypePath>,
    ) -> Result<()> {
        if ty.is_toolchain_base() || registered.contains(ty) {
            return Ok(());
        }
        if !self.is_toolchain(ty, &mut Vec::new())? {
            return Ok(());
        }
        registered.insert(ty.clone());

        let (loaded, spec) = self.type_spec(ty)?;
        let mut descriptor = ToolchainDescriptor::new(
            ty.clone(),
            DescriptorOrigin::Module {
                module: loaded.path.clone(),
                file: loaded.file.clone(),
            },
        )
        .with_aliases(spec.aliases.iter().cloned())
        .with_matching(spec.matching)
        .with_bases(spec.extends.clone());
        if let Some(name) = &spec.toolchain_name {
            descriptor = descriptor.with_name(name.clone());
        }

        for base in descriptor.bases().to_vec() {
            self.register(&base, catalog, registered)?;
        }
        debug!(toolchain = %ty, concrete = descriptor.is_concrete(), "registering toolchain");
        catalog.push(descriptor);
        Ok(())
    }

    fn append_builtins(&mut self, catalog: &mut Vec<ToolchainDescriptor>) -> Result<()> {
        for def in builtin_toolchains() {
            if catalog.iter().any(|d| d.identity().as_str() == def.identity) {
                warn!(toolchain = def.identity, "builtin toolchain already provided by a module");
                continue;
            }
            let origin = def.origin_label();
            for (name, value) in def.constants {
                self.constants
                    .merge(name, Value::String((*value).to_string()), &origin)?;
            }
            debug!(toolchain = def.identity, "registering builtin toolchain");
            catalog.push(def.descriptor());
        }
        Ok(())
    }
}
