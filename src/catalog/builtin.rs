//! Toolchain implementations compiled into the binary.
//!
//! Each definition submits itself with `inventory::submit!`; the linker
//! gathers them so discovery can append them to the catalog without a
//! hand-maintained list.

use crate::catalog::descriptor::{DescriptorOrigin, MatchPolicy, ToolchainDescriptor};
use crate::catalog::identity::{TOOLCHAIN_BASE, TypePath};

/// A compiled-in toolchain implementation.
pub struct BuiltinToolchainDef {
    /// Dotted type identity, unique across the catalog.
    pub identity: &'static str,
    /// Claimed toolchain name; `None` registers an abstract type.
    pub name: Option<&'static str>,
    pub aliases: &'static [&'static str],
    pub matching: MatchPolicy,
    /// Constants exported into the shared table, already without prefix.
    pub constants: &'static [(&'static str, &'static str)],
}

/// Registry wrapper collected by `inventory`.
pub struct BuiltinToolchainReg(pub &'static BuiltinToolchainDef);
inventory::collect!(BuiltinToolchainReg);

pub static SYSTEM_TOOLCHAIN: BuiltinToolchainDef = BuiltinToolchainDef {
    identity: "toolchain.system.SystemToolchain",
    name: Some("system"),
    aliases: &["dummy"],
    matching: MatchPolicy::Exact,
    constants: &[("SYSTEM_TOOLCHAIN_NAME", "system")],
};

inventory::submit! { BuiltinToolchainReg(&SYSTEM_TOOLCHAIN) }

impl BuiltinToolchainDef {
    pub fn descriptor(&self) -> ToolchainDescriptor {
        let mut descriptor =
            ToolchainDescriptor::new(TypePath(self.identity.to_string()), DescriptorOrigin::Builtin)
                .with_aliases(self.aliases.iter().copied())
                .with_matching(self.matching)
                .with_bases(vec![TypePath(TOOLCHAIN_BASE.to_string())]);
        if let Some(name) = self.name {
            descriptor = descriptor.with_name(name);
        }
        descriptor
    }

    pub fn origin_label(&self) -> String {
        format!("builtin {}", self.identity)
    }
}

/// All linked built-ins, sorted by identity since link order is unspecified.
pub fn builtin_toolchains() -> Vec<&'static BuiltinToolchainDef> {
    let mut defs: Vec<_> = inventory::iter::<BuiltinToolchainReg>
        .into_iter()
        .map(|reg| reg.0)
        .collect();
    defs.sort_by_key(|def| def.identity);
    defs.dedup_by_key(|def| def.identity);
    defs
}
