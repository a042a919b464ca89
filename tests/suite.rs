// Integration suite for discovery, constant harvesting and name resolution;
// every test builds its own search root so runs stay independent.
mod support;

use serde_json::json;
use std::sync::Arc;
use std::thread;
use support::{SearchRoot, toolchain_module};
use toolchain_registry::{
    CapabilityPredicate, DescriptorOrigin, MatchPolicy, Registry, RegistryError, SearchPath,
    ToolchainResolver,
};

fn identity_of(resolution: &toolchain_registry::Resolution<'_>) -> Option<String> {
    resolution
        .toolchain
        .map(|descriptor| descriptor.identity().to_string())
}

// Alpha/Beta plus a third module re-exporting an equal LEVEL constant.
fn alpha_beta_root(third_level: i64) -> SearchRoot {
    let root = SearchRoot::new();
    root.module("toolchains.alpha", toolchain_module("Alpha", "Alpha"));
    root.module(
        "toolchains.beta",
        json!({
            "symbols": {"TC_CONSTANT_LEVEL": 2},
            "types": [{
                "name": "Beta",
                "extends": ["toolchain.Toolchain"],
                "toolchain_name": "Beta"
            }]
        }),
    );
    root.module(
        "toolchains.gamma_support",
        json!({"symbols": {"TC_CONSTANT_LEVEL": third_level}}),
    );
    root
}

#[test]
fn alpha_beta_scenario_resolves_and_exports_level() {
    let root = alpha_beta_root(2);
    let registry = Registry::discover(&root.search_path()).expect("discovery");

    assert_eq!(
        identity_of(&registry.resolve("Alpha")).as_deref(),
        Some("toolchains.alpha.Alpha")
    );
    assert_eq!(
        identity_of(&registry.resolve("Beta")).as_deref(),
        Some("toolchains.beta.Beta")
    );
    let gamma = registry.resolve("Gamma");
    assert!(gamma.toolchain.is_none());
    assert_eq!(gamma.catalog.len(), 2);

    assert_eq!(registry.constants().get_i64("LEVEL"), Some(2));
    assert_eq!(registry.constants().len(), 1);
    let origin = &registry.constants().entry("LEVEL").expect("LEVEL").origin;
    assert!(origin.starts_with("toolchains.beta"), "{origin}");
}

#[test]
fn alpha_beta_scenario_conflicting_level_aborts() {
    let root = alpha_beta_root(3);
    let err = Registry::discover(&root.search_path()).expect_err("conflict");
    match err {
        RegistryError::ConstantConflict {
            name,
            existing,
            existing_origin,
            value,
            origin,
        } => {
            assert_eq!(name, "LEVEL");
            assert_eq!(existing, json!(2));
            assert_eq!(value, json!(3));
            assert!(existing_origin.starts_with("toolchains.beta"));
            assert!(origin.starts_with("toolchains.gamma_support"));
        }
        other => panic!("unexpected error {other:?}"),
    }
}

#[test]
fn integer_and_float_spellings_of_a_constant_agree() {
    let root = SearchRoot::new();
    root.module("toolchains.a", json!({"symbols": {"TC_CONSTANT_LEVEL": 2}}));
    root.module("toolchains.b", json!({"symbols": {"TC_CONSTANT_LEVEL": 2.0}}));
    let registry = Registry::discover(&root.search_path()).expect("equal numbers merge");
    assert_eq!(registry.constants().len(), 1);
    let entry = registry.constants().entry("LEVEL").expect("LEVEL");
    assert_eq!(entry.value, json!(2));
    assert!(entry.origin.starts_with("toolchains.a"));

    root.module("toolchains.c", json!({"symbols": {"TC_CONSTANT_LEVEL": 2.5}}));
    let err = Registry::discover(&root.search_path()).expect_err("different number");
    assert!(matches!(err, RegistryError::ConstantConflict { ref name, .. } if name == "LEVEL"));
}

#[test]
fn discovery_is_idempotent_within_a_process() {
    let root = alpha_beta_root(2);
    let first = Registry::discover(&root.search_path()).expect("first pass");
    let second = Registry::discover(&root.search_path()).expect("second pass");
    assert_eq!(first.catalog(), second.catalog());
    assert_eq!(first.constants(), second.constants());

    // Listing the same root twice must not register or harvest anything twice.
    let doubled = SearchPath::new([root.path(), root.path()]).with_builtins(false);
    let third = Registry::discover(&doubled).expect("doubled root");
    assert_eq!(third.catalog(), first.catalog());
    assert_eq!(third.constants(), first.constants());
}

#[test]
fn module_referenced_by_several_toolchains_is_harvested_once() {
    let root = SearchRoot::new();
    root.module(
        "toolchains.mpi.openmpi",
        json!({
            "symbols": {"TC_CONSTANT_OPENMPI": "OpenMPI", "OPENMPI_LIB": ["mpi"]},
            "types": [{"name": "OpenMPI"}]
        }),
    );
    for (module, ty, name) in [
        ("toolchains.foss", "Foss", "foss"),
        ("toolchains.gompi", "Gompi", "gompi"),
    ] {
        root.module(
            module,
            json!({
                "types": [{
                    "name": ty,
                    "extends": ["toolchain.Toolchain", "toolchains.mpi.openmpi.OpenMPI"],
                    "toolchain_name": name
                }]
            }),
        );
    }

    let registry = Registry::discover(&root.search_path()).expect("discovery");
    assert_eq!(registry.constants().len(), 1);
    assert_eq!(registry.constants().get_str("OPENMPI"), Some("OpenMPI"));
    assert_eq!(registry.catalog().len(), 2);
}

#[test]
fn imported_types_contribute_constants() {
    let root = SearchRoot::new();
    root.module(
        "toolchains.compiler.gcc",
        json!({
            "symbols": {"TC_CONSTANT_GCC": "GCC", "COMPILER_UNIQUE_OPTS": ["loop"]},
            "types": [{"name": "Gcc"}]
        }),
    );
    root.module(
        "toolchains.gcc",
        json!({
            "imports": ["toolchains.compiler.gcc.Gcc"],
            "types": [{
                "name": "GccToolchain",
                "extends": ["toolchain.Toolchain"],
                "toolchain_name": "GCC"
            }]
        }),
    );

    let registry = Registry::discover(&root.search_path()).expect("discovery");
    assert_eq!(registry.constants().get_str("GCC"), Some("GCC"));
    assert!(!registry.constants().contains("COMPILER_UNIQUE_OPTS"));
}

#[test]
fn abstract_toolchains_are_catalogued_but_never_resolved() {
    let root = SearchRoot::new();
    root.module(
        "toolchains.compiler",
        json!({
            "types": [{
                "name": "CompilerToolchain",
                "extends": ["toolchain.Toolchain"],
                "aliases": ["GCC"]
            }]
        }),
    );
    root.module(
        "toolchains.gcc",
        json!({
            "types": [{
                "name": "Gcc",
                "extends": ["toolchains.compiler.CompilerToolchain"],
                "toolchain_name": "GCC"
            }]
        }),
    );

    let registry = Registry::discover(&root.search_path()).expect("discovery");
    let resolution = registry.resolve("GCC");
    assert_eq!(
        identity_of(&resolution).as_deref(),
        Some("toolchains.gcc.Gcc")
    );
    assert_eq!(resolution.catalog.len(), 2);
    let abstract_tc = &resolution.catalog[0];
    assert_eq!(abstract_tc.identity().as_str(), "toolchains.compiler.CompilerToolchain");
    assert!(!abstract_tc.is_toolchain_for(None));
    assert!(registry.concrete().all(|d| d.is_toolchain_for(None)));
}

#[test]
fn every_concrete_claim_resolves_to_itself_or_an_earlier_claimant() {
    let root = SearchRoot::new();
    root.module("toolchains.a_first", toolchain_module("First", "foss"));
    root.module("toolchains.b_second", toolchain_module("Second", "foss"));
    root.module(
        "toolchains.c_core",
        json!({
            "types": [{
                "name": "GCCcore",
                "extends": ["toolchain.Toolchain"],
                "toolchain_name": "GCCcore",
                "matching": "normalized"
            }]
        }),
    );

    let registry = Registry::discover(&root.search_path()).expect("discovery");
    let catalog = registry.catalog();
    for (position, descriptor) in catalog.iter().enumerate() {
        let Some(name) = descriptor.name() else {
            continue;
        };
        let resolved = registry.resolve(name).toolchain.expect("claimed name resolves");
        let resolved_position = catalog
            .iter()
            .position(|d| d.identity() == resolved.identity())
            .expect("resolved descriptor is catalogued");
        assert!(resolved_position <= position);
    }

    assert_eq!(
        identity_of(&registry.resolve("foss")).as_deref(),
        Some("toolchains.a_first.First")
    );
    let core = registry.resolve("gcc-core").toolchain.expect("normalized match");
    assert_eq!(core.matching(), MatchPolicy::Normalized);
}

#[test]
fn absent_name_returns_non_empty_catalog() {
    let root = alpha_beta_root(2);
    let registry = Registry::discover(&root.search_path()).expect("discovery");
    let resolution = registry.resolve("nonexistent-toolchain");
    assert!(resolution.toolchain.is_none());
    assert!(!resolution.catalog.is_empty());
}

#[test]
fn malformed_module_names_its_path() {
    let root = SearchRoot::new();
    root.module("toolchains.alpha", toolchain_module("Alpha", "Alpha"));
    let broken = root.raw_module("toolchains/broken.json", "{\"types\": [");
    let err = Registry::discover(&root.search_path()).expect_err("load error");
    match err {
        RegistryError::ModuleLoad { path, .. } => assert_eq!(path, broken),
        other => panic!("unexpected error {other:?}"),
    }

    let root = SearchRoot::new();
    let invalid = root.module(
        "toolchains.invalid",
        json!({"types": [{"name": "Invalid", "matching": "fuzzy"}]}),
    );
    let err = Registry::discover(&root.search_path()).expect_err("schema error");
    assert!(err.to_string().contains(&invalid.display().to_string()));
    assert!(err.to_string().contains("failed schema validation"));
}

#[test]
fn entry_point_module_is_never_loaded() {
    let root = SearchRoot::new();
    root.raw_module("toolchains/mod.json", "this is not json");
    root.module("toolchains.alpha", toolchain_module("Alpha", "Alpha"));
    let registry = Registry::discover(&root.search_path()).expect("entry point skipped");
    assert_eq!(registry.catalog().len(), 1);
}

#[test]
fn later_roots_supply_referenced_modules() {
    let toolchains = SearchRoot::new();
    let library = SearchRoot::new();
    library.module(
        "toolchains.linalg.blacs",
        json!({
            "symbols": {"TC_CONSTANT_BLACS_MODULE_NAME": ["BLACS"]},
            "types": [{"name": "Blacs"}]
        }),
    );
    toolchains.module(
        "toolchains.goalf",
        json!({
            "types": [{
                "name": "Goalf",
                "extends": ["toolchain.Toolchain", "toolchains.linalg.blacs.Blacs"],
                "toolchain_name": "goalf"
            }]
        }),
    );

    let search_path =
        SearchPath::new([toolchains.path(), library.path()]).with_builtins(false);
    let registry = Registry::discover(&search_path).expect("discovery");
    assert_eq!(
        registry.constants().get("BLACS_MODULE_NAME"),
        Some(&json!(["BLACS"]))
    );
    match registry.catalog()[0].origin() {
        DescriptorOrigin::Module { module, file } => {
            assert_eq!(module.as_str(), "toolchains.goalf");
            assert!(file.starts_with(toolchains.path()));
        }
        other => panic!("unexpected origin {other:?}"),
    }
}

#[test]
fn builtin_system_toolchain_is_available_by_default() {
    let root = alpha_beta_root(2);
    let registry =
        Registry::discover(&SearchPath::new([root.path()])).expect("discovery with builtins");
    let system = registry.resolve("dummy").toolchain.expect("system alias");
    assert_eq!(system.aliases(), ["dummy".to_string()]);
    assert_eq!(system.name(), Some("system"));
    assert_eq!(system.origin(), &DescriptorOrigin::Builtin);
    assert_eq!(
        registry.constants().get_str("SYSTEM_TOOLCHAIN_NAME"),
        Some("system")
    );
    assert_eq!(registry.catalog().last().map(|d| d.identity()), Some(system.identity()));
}

#[test]
fn module_can_override_builtin_identity() {
    let root = SearchRoot::new();
    root.module(
        "toolchain.system",
        json!({
            "types": [{
                "name": "SystemToolchain",
                "extends": ["toolchain.Toolchain"],
                "toolchain_name": "system"
            }]
        }),
    );
    root.module(
        "toolchains.local",
        json!({"imports": ["toolchain.system.SystemToolchain"]}),
    );
    let registry =
        Registry::discover(&SearchPath::new([root.path()])).expect("discovery with builtins");
    let system: Vec<_> = registry
        .catalog()
        .iter()
        .filter(|d| d.identity().as_str() == "toolchain.system.SystemToolchain")
        .collect();
    assert_eq!(system.len(), 1);
    assert!(matches!(system[0].origin(), DescriptorOrigin::Module { .. }));
    assert!(!registry.constants().contains("SYSTEM_TOOLCHAIN_NAME"));
}

#[test]
fn resolver_builds_once_and_serves_concurrent_callers() {
    let root = alpha_beta_root(2);
    let resolver = Arc::new(ToolchainResolver::new(root.search_path()));
    assert_eq!(resolver.search_path(), &root.search_path());
    assert!(!resolver.is_built());

    let handles: Vec<_> = (0..8)
        .map(|idx| {
            let resolver = Arc::clone(&resolver);
            thread::spawn(move || {
                let name = if idx % 2 == 0 { "Alpha" } else { "Beta" };
                let resolution = resolver.resolve(name).expect("resolve");
                (
                    resolution.toolchain.map(|d| d.identity().to_string()),
                    resolution.catalog.len(),
                )
            })
        })
        .collect();

    for (idx, handle) in handles.into_iter().enumerate() {
        let (identity, catalog_len) = handle.join().expect("thread");
        let expected = if idx % 2 == 0 {
            "toolchains.alpha.Alpha"
        } else {
            "toolchains.beta.Beta"
        };
        assert_eq!(identity.as_deref(), Some(expected));
        assert_eq!(catalog_len, 2);
    }

    let first = resolver.registry().expect("registry") as *const Registry;
    let second = resolver.registry().expect("registry") as *const Registry;
    assert_eq!(first, second);
    assert!(resolver.is_built());
}

#[test]
fn resolver_does_not_rescan_after_build() {
    let root = alpha_beta_root(2);
    let resolver = ToolchainResolver::new(root.search_path());
    assert!(resolver.resolve("Alpha").expect("resolve").toolchain.is_some());

    root.module("toolchains.delta", toolchain_module("Delta", "Delta"));
    let resolution = resolver.resolve("Delta").expect("resolve");
    assert!(resolution.toolchain.is_none());
    assert_eq!(resolution.catalog.len(), 2);
}

#[test]
fn failed_build_leaves_resolver_unbuilt() {
    let root = alpha_beta_root(3);
    let resolver = ToolchainResolver::new(root.search_path());
    assert!(matches!(
        resolver.resolve("Alpha"),
        Err(RegistryError::ConstantConflict { .. })
    ));
    assert!(!resolver.is_built());

    root.module(
        "toolchains.gamma_support",
        json!({"symbols": {"TC_CONSTANT_LEVEL": 2}}),
    );
    assert!(resolver.resolve("Alpha").expect("retry").toolchain.is_some());
    assert_eq!(resolver.constants().expect("constants").get_i64("LEVEL"), Some(2));
}
