//! Implementation catalog wiring.
//!
//! Module files under `<root>/toolchains/` are parsed into `ModuleSpec`s,
//! their types resolved across the search path, and every toolchain type
//! turned into a `ToolchainDescriptor`. `discover` runs the whole pass;
//! the other modules expose the pieces it is built from.

pub mod builtin;
pub mod descriptor;
pub mod discovery;
pub mod identity;
pub mod model;
mod schema;

pub use builtin::{BuiltinToolchainDef, BuiltinToolchainReg, builtin_toolchains};
pub use descriptor::{CapabilityPredicate, DescriptorOrigin, MatchPolicy, ToolchainDescriptor};
pub use discovery::{DiscoveryOutput, discover, scan_search_path};
pub use identity::{ModulePath, TOOLCHAIN_BASE, TypePath};
pub use model::{LoadedModule, ModuleSpec, TypeSpec, load_module_file};
