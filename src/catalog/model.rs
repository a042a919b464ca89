//! Deserializable representation of a toolchain module file.
//!
//! A module declares the types it defines, the types it imports from other
//! modules, and free-form symbols. Symbols carrying the constant prefix are
//! harvested into the shared constant table during discovery.

use crate::catalog::descriptor::MatchPolicy;
use crate::catalog::identity::{ModulePath, TypePath};
use crate::catalog::schema::validate_module_value;
use crate::error::{RegistryError, Result};
use serde::Deserialize;
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Clone, Debug, Default, Deserialize)]
/// Contents of one module file.
pub struct ModuleSpec {
    #[serde(default)]
    pub imports: Vec<TypePath>,
    #[serde(default)]
    pub symbols: BTreeMap<String, Value>,
    #[serde(default)]
    pub types: Vec<TypeSpec>,
}

#[derive(Clone, Debug, Deserialize)]
/// A type declared by a module.
pub struct TypeSpec {
    pub name: String,
    #[serde(default)]
    pub extends: Vec<TypePath>,
    /// Toolchain name served by this type; absent for intermediate types.
    #[serde(default)]
    pub toolchain_name: Option<String>,
    #[serde(default)]
    pub aliases: Vec<String>,
    #[serde(default)]
    pub matching: MatchPolicy,
}

#[derive(Clone, Debug)]
/// A module read from disk together with where it was found.
pub struct LoadedModule {
    pub path: ModulePath,
    pub file: PathBuf,
    pub spec: ModuleSpec,
}

impl ModuleSpec {
    /// Every type the module refers to, in declaration order without repeats:
    /// imports first, then the bases of its own types.
    pub fn referenced_types(&self) -> Vec<&TypePath> {
        let mut seen = BTreeSet::new();
        self.imports
            .iter()
            .chain(self.types.iter().flat_map(|ty| ty.extends.iter()))
            .filter(|ty| seen.insert(*ty))
            .collect()
    }

    pub fn find_type(&self, name: &str) -> Option<&TypeSpec> {
        self.types.iter().find(|ty| ty.name == name)
    }
}

impl LoadedModule {
    /// Label used as the origin of harvested constants.
    pub fn origin_label(&self) -> String {
        format!("{} ({})", self.path, self.file.display())
    }
}

/// Read, schema-check and parse a module file.
pub fn load_module_file(path: ModulePath, file: &Path) -> Result<LoadedModule> {
    let data = fs::read_to_string(file)
        .map_err(|err| RegistryError::module_load(file, format!("reading module: {err}")))?;
    let value: Value = serde_json::from_str(&data)
        .map_err(|err| RegistryError::module_load(file, format!("parsing module: {err}")))?;
    validate_module_value(&value).map_err(|reason| RegistryError::module_load(file, reason))?;
    let spec: ModuleSpec = serde_json::from_value(value)
        .map_err(|err| RegistryError::module_load(file, format!("decoding module: {err}")))?;

    let mut names = BTreeSet::new();
    for ty in &spec.types {
        if !names.insert(ty.name.as_str()) {
            return Err(RegistryError::module_load(
                file,
                format!("type {} declared more than once", ty.name),
            ));
        }
    }

    Ok(LoadedModule {
        path,
        file: file.to_path_buf(),
        spec,
    })
}
