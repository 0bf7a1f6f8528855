//! Shared E2E test helpers for `stagehand` binary tests.

use assert_cmd::cargo::cargo_bin_cmd;
use stagehand_component::ComponentDescriptor;
use stagehand_runtime::testing::{ArchiveBuilder, DirectoryOriginBuilder};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tempfile::TempDir;

/// Default timeout for CLI tests.
pub const TIMEOUT: Duration = Duration::from_secs(10);

/// Variables from the caller's shell that would leak into the config layers.
const LEAKY_VARS: &[&str] = &[
    "RUST_LOG",
    "STAGEHAND_DEBUG",
    "STAGEHAND_NAMESPACE",
    "STAGEHAND_EXPORT_ENV",
    "STAGEHAND_OVERLAY",
    "STAGEHAND_WEBROOT",
    "STAGEHAND_SETTINGS",
];

/// A throwaway project directory with its own global config home.
pub struct Project {
    tmp: TempDir,
}

impl Project {
    pub fn new() -> Self {
        Self {
            tmp: tempfile::tempdir().expect("create temp project dir"),
        }
    }

    pub fn root(&self) -> &Path {
        self.tmp.path()
    }

    pub fn components(&self) -> PathBuf {
        self.root().join("components")
    }

    pub fn webroot(&self) -> PathBuf {
        self.root().join("webroot")
    }

    pub fn settings_text(&self) -> String {
        std::fs::read_to_string(self.root().join(".stagehand/settings.toml"))
            .expect("settings file should exist")
    }

    /// Writes `components/<file>` declaring `component` with one web file.
    pub fn add_archive(&self, file: &str, component: ComponentDescriptor) -> PathBuf {
        let page = format!("webapp/{}/index.html", component.code);
        ArchiveBuilder::new()
            .descriptor(&[component])
            .file(page, "<h1>hello</h1>")
            .write_to(self.components().join(file))
            .expect("write archive fixture")
    }

    /// Lays out `components/<dir>/` declaring `component`.
    pub fn add_directory(&self, dir: &str, component: ComponentDescriptor) {
        DirectoryOriginBuilder::new(self.components().join(dir))
            .descriptor(&[component])
            .build()
            .expect("build directory fixture");
    }

    /// Builds a Command for the `stagehand` binary rooted at this project.
    pub fn cmd(&self) -> assert_cmd::Command {
        let mut cmd: assert_cmd::Command = cargo_bin_cmd!("stagehand");
        cmd.timeout(TIMEOUT);
        for var in LEAKY_VARS {
            cmd.env_remove(var);
        }
        cmd.env("STAGEHAND_HOME", self.root().join("home"));
        cmd.env("STAGEHAND_EXPORT_ENV", "false");
        cmd.arg("-C").arg(self.root());
        cmd
    }
}
