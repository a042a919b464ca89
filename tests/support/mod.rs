#![allow(dead_code)]

use serde_json::{Value, json};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use toolchain_registry::SearchPath;

/// Temporary search root populated with module files.
pub struct SearchRoot {
    dir: TempDir,
}

impl SearchRoot {
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().expect("temp search root"),
        }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Write `module` (dotted path) as a module file below the root.
    pub fn module(&self, module: &str, contents: Value) -> PathBuf {
        let mut relative: PathBuf = module.split('.').collect();
        relative.set_extension("json");
        let path = self.dir.path().join(relative);
        fs::create_dir_all(path.parent().expect("module parent")).expect("create module dir");
        fs::write(&path, serde_json::to_vec_pretty(&contents).expect("encode module"))
            .expect("write module");
        path
    }

    pub fn raw_module(&self, relative: &str, contents: &str) -> PathBuf {
        let path = self.dir.path().join(relative);
        fs::create_dir_all(path.parent().expect("module parent")).expect("create module dir");
        fs::write(&path, contents).expect("write module");
        path
    }

    /// Search path over this root alone, without linked built-ins.
    pub fn search_path(&self) -> SearchPath {
        SearchPath::new([self.path()]).with_builtins(false)
    }
}

/// Module declaring one concrete toolchain type that extends the root base.
pub fn toolchain_module(type_name: &str, toolchain_name: &str) -> Value {
    json!({
        "types": [{
            "name": type_name,
            "extends": ["toolchain.Toolchain"],
            "toolchain_name": toolchain_name
        }]
    })
}
