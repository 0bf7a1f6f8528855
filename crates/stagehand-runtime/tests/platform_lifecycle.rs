//! End-to-end lifecycle tests against real origins on disk.

use stagehand_component::testing::RecordingListener;
use stagehand_component::{ComponentDescriptor, ComponentState, LifecycleEvent, ListenerRef};
use stagehand_runtime::config::StageConfig;
use stagehand_runtime::listener::ListenerRegistry;
use stagehand_runtime::testing::{ArchiveBuilder, DirectoryOriginBuilder};
use stagehand_runtime::{Outcome, Platform, PlatformError, Step};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;

use LifecycleEvent::*;

struct Fixture {
    tmp: TempDir,
    rec: Arc<RecordingListener>,
}

impl Fixture {
    fn new() -> Self {
        Self::with_listener(RecordingListener::new())
    }

    fn with_listener(rec: RecordingListener) -> Self {
        Self {
            tmp: TempDir::new().expect("should create temp dir"),
            rec: Arc::new(rec),
        }
    }

    fn root(&self) -> &Path {
        self.tmp.path()
    }

    fn components(&self) -> PathBuf {
        self.root().join("components")
    }

    fn webroot(&self) -> PathBuf {
        self.root().join("webroot")
    }

    fn config(&self) -> StageConfig {
        let mut config = StageConfig::default().resolved(self.root());
        config.export_env = false;
        config
    }

    fn platform(&self) -> Platform {
        self.platform_with(self.config())
    }

    fn platform_with(&self, config: StageConfig) -> Platform {
        Platform::builder(config)
            .with_resolver(ListenerRegistry::new().with_bean("rec", self.rec.clone()))
            .build()
    }

    fn crm_jar(&self) -> PathBuf {
        let crm = ComponentDescriptor::new("CRM", "crm", "1.0")
            .with_entry_point("/crm/")
            .with_listener(ListenerRef::bean("rec"));
        ArchiveBuilder::new()
            .descriptor(&[crm])
            .file("webapp/crm/index.html", "<h1>crm</h1>")
            .deflated_file("webapp/crm/app.js", "console.log('crm');")
            .write_to(self.components().join("crm-1.0.jar"))
            .expect("should write archive")
    }
}

#[test]
fn first_start_deploys_then_activates() {
    let fx = Fixture::new();
    fx.crm_jar();
    let mut platform = fx.platform();

    let report = platform.start().expect("first start runs");

    assert!(report.is_success(), "{:?}", report.errors);
    assert_eq!(report.registered, vec!["crm".to_string()]);
    assert_eq!(report.started, vec!["crm".to_string()]);
    assert_eq!(
        fx.rec.events(),
        vec![BeforeDeploy, AfterDeploy, BeforeActive, AfterActive, OnStartup]
    );
    assert_eq!(platform.persisted_state("crm"), Some("active"));
    assert_eq!(platform.state_of("crm"), Some(ComponentState::Active));
    assert_eq!(
        std::fs::read_to_string(fx.webroot().join("crm/app.js")).expect("should read"),
        "console.log('crm');"
    );
}

#[test]
fn restart_restores_persisted_state_without_deploying() {
    let fx = Fixture::new();
    fx.crm_jar();
    {
        let mut first = fx.platform();
        first.start();
        assert!(first.disable("crm").is_success());
    }
    fx.rec.clear();

    let mut second = fx.platform();
    let report = second.start().expect("first start of this instance");

    assert!(report.operations.is_empty());
    assert_eq!(
        report.restored,
        vec![("crm".to_string(), ComponentState::Disabled)]
    );
    assert!(report.started.is_empty());
    assert!(fx.rec.events().is_empty());
    assert_eq!(second.state_of("crm"), Some(ComponentState::Disabled));
}

#[test]
fn refresh_is_idempotent() {
    let fx = Fixture::new();
    fx.crm_jar();
    let mut platform = fx.platform();
    platform.start();
    fx.rec.clear();

    let again = platform.refresh();

    assert!(again.registered.is_empty());
    assert!(again.operations.is_empty());
    assert_eq!(again.restored, vec![("crm".to_string(), ComponentState::Active)]);
    assert_eq!(fx.rec.events(), vec![OnStartup]);
    assert_eq!(platform.len(), 1);
}

#[test]
fn deploy_leaves_component_disabled() {
    let fx = Fixture::new();
    let jar = fx.root().join("elsewhere/notes.jar");
    ArchiveBuilder::new()
        .file("webapp/notes/index.html", "notes")
        .write_to(&jar)
        .expect("should write archive");
    let mut platform = fx.platform();
    platform.start();

    let notes = ComponentDescriptor::new("Notes", "notes", "2")
        .with_listener(ListenerRef::bean("rec"))
        .with_origin(stagehand_component::Origin::archive(&jar));
    let report = platform.deploy(notes);

    assert!(report.is_success(), "{report}");
    assert_eq!(platform.persisted_state("notes"), Some("disable"));
    assert_eq!(fx.rec.events(), vec![BeforeDeploy, AfterDeploy]);
    assert!(fx.webroot().join("notes/index.html").is_file());
}

#[test]
fn remove_clears_state_resources_and_config_file_keys() {
    let fx = Fixture::new();
    let reports = ComponentDescriptor::new("Reports", "reports", "0.3")
        .with_config_file("conf/reports.toml")
        .with_inline_config("reports.inline", "kept")
        .with_listener(ListenerRef::bean("rec"));
    ArchiveBuilder::new()
        .descriptor(&[reports])
        .file("conf/reports.toml", "[reports]\npage_size = 50\n")
        .file("webapp/reports/index.html", "r")
        .write_to(fx.components().join("reports.zip"))
        .expect("should write archive");
    let mut platform = fx.platform();
    platform.start();
    assert_eq!(platform.settings().get("reports.page_size"), Some("50"));
    assert!(!platform.settings().contains_key("reports.inline"));
    fx.rec.clear();

    let report = platform.remove("reports");

    assert!(report.is_success(), "{report}");
    assert_eq!(fx.rec.events(), vec![BeforeRemove, AfterRemove]);
    assert!(platform.component("reports").is_none());
    assert!(platform.persisted_state("reports").is_none());
    assert!(platform.settings().get("reports.page_size").is_none());
    assert!(!fx.webroot().join("reports/index.html").exists());
    assert!(fx.webroot().join("reports").is_dir());
}

#[test]
fn inline_config_never_overrides_existing_values() {
    let fx = Fixture::new();
    let settings = fx.root().join(".stagehand/settings.toml");
    std::fs::create_dir_all(settings.parent().expect("has parent")).expect("mkdir");
    std::fs::write(&settings, "\"crm.mail.host\" = \"mail.local\"\n").expect("seed settings");
    let crm = ComponentDescriptor::new("CRM", "crm", "1")
        .with_inline_config("crm.mail.host", "smtp.example.com")
        .with_inline_config("crm.mail.port", "25");
    DirectoryOriginBuilder::new(fx.components().join("crm"))
        .descriptor(&[crm])
        .build()
        .expect("should build origin");

    let mut platform = fx.platform();
    platform.start();

    assert_eq!(platform.settings().get("crm.mail.host"), Some("mail.local"));
    assert_eq!(platform.settings().get("crm.mail.port"), Some("25"));
    assert_eq!(
        platform.environment().get("crm.mail.host").map(String::as_str),
        Some("mail.local")
    );
}

#[test]
fn config_file_overwrites_existing_values() {
    let fx = Fixture::new();
    let settings = fx.root().join(".stagehand/settings.toml");
    std::fs::create_dir_all(settings.parent().expect("has parent")).expect("mkdir");
    std::fs::write(&settings, "\"crm.mail.host\" = \"mail.local\"\n").expect("seed settings");
    let crm = ComponentDescriptor::new("CRM", "crm", "1")
        .with_config_file("crm.toml")
        .with_inline_config("crm.mail.port", "25");
    DirectoryOriginBuilder::new(fx.components().join("crm"))
        .descriptor(&[crm])
        .file("crm.toml", "[crm.mail]\nhost = \"smtp.example.com\"\n")
        .build()
        .expect("should build origin");

    let mut platform = fx.platform();
    platform.start();

    assert_eq!(
        platform.settings().get("crm.mail.host"),
        Some("smtp.example.com")
    );
    // Inline items are ignored when the config file resolves.
    assert!(!platform.settings().contains_key("crm.mail.port"));
}

#[test]
fn dot_dot_archive_entry_stays_out_of_webroot() {
    let fx = Fixture::new();
    let crm = ComponentDescriptor::new("CRM", "crm", "1");
    ArchiveBuilder::new()
        .descriptor(&[crm])
        .file("webapp/ok.html", "ok")
        .file("webapp/../../../escaped.txt", "x")
        .write_to(fx.components().join("crm.jar"))
        .expect("should write archive");
    let mut platform = fx.platform();

    let report = platform.start().expect("first start");

    assert!(report.is_success());
    assert!(fx.webroot().join("ok.html").is_file());
    assert!(!fx.webroot().join("escaped.txt").exists());
    assert!(!fx.root().join("escaped.txt").exists());
    assert!(!fx.components().join("escaped.txt").exists());
    assert_eq!(platform.persisted_state("crm"), Some("active"));
}

#[test]
fn escaping_subtree_is_recorded_as_resource_failure() {
    let fx = Fixture::new();
    fx.crm_jar();
    let mut config = fx.config();
    config.resources.subtree = "../../etc".into();
    let mut platform = fx.platform_with(config);

    let report = platform.start().expect("first start");

    let deploy = &report.operations[0];
    assert_eq!(deploy.outcome, Outcome::Completed);
    assert!(deploy.errors.iter().any(|e| e.step == Step::Resources
        && matches!(&e.error, PlatformError::Resource(r) if r.is_escape())));
    assert!(!fx.webroot().exists());
    assert_eq!(platform.persisted_state("crm"), Some("active"));
}

#[test]
fn register_replaces_entry_without_hooks() {
    let fx = Fixture::new();
    fx.crm_jar();
    let mut platform = fx.platform();
    platform.start();
    fx.rec.clear();

    let replaced = platform
        .register(ComponentDescriptor::new("CRM", "crm", "2.0"))
        .expect("crm was registered");

    assert_eq!(replaced.version, "1.0");
    assert_eq!(platform.version("crm"), Some("2.0"));
    assert!(fx.rec.events().is_empty());
}

#[test]
fn unknown_component_is_a_noop() {
    let fx = Fixture::new();
    fx.crm_jar();
    let mut platform = fx.platform();
    platform.start();
    fx.rec.clear();

    for report in [
        platform.activate("ghost"),
        platform.disable("ghost"),
        platform.remove("ghost"),
        platform.redeploy("ghost"),
    ] {
        assert_eq!(report.outcome, Outcome::UnknownComponent);
    }

    assert!(fx.rec.events().is_empty());
    assert_eq!(platform.persisted_state("crm"), Some("active"));
}

#[test]
fn failed_before_deploy_skips_activation() {
    let fx = Fixture::with_listener(RecordingListener::new().failing_on(BeforeDeploy));
    fx.crm_jar();
    let mut platform = fx.platform();

    let report = platform.start().expect("first start");

    assert_eq!(report.operations.len(), 1);
    assert_eq!(report.operations[0].outcome, Outcome::Aborted);
    assert!(report.started.is_empty());
    assert!(platform.persisted_state("crm").is_none());
    assert!(!fx.webroot().join("crm/index.html").exists());
    assert_eq!(fx.rec.events(), vec![BeforeDeploy]);
}

#[test]
fn failed_after_hook_is_reported_but_completes() {
    let fx = Fixture::with_listener(RecordingListener::new().failing_on(AfterActive));
    fx.crm_jar();
    let mut platform = fx.platform();

    let report = platform.start().expect("first start");

    assert!(!report.is_success());
    assert_eq!(platform.persisted_state("crm"), Some("active"));
    assert_eq!(report.started, vec!["crm".to_string()]);
}

#[test]
fn unresolvable_listener_keeps_component() {
    let fx = Fixture::new();
    let crm = ComponentDescriptor::new("CRM", "crm", "1")
        .with_listener(ListenerRef::native("com.example.Missing"));
    ArchiveBuilder::new()
        .descriptor(&[crm])
        .write_to(fx.components().join("crm.jar"))
        .expect("should write archive");
    let mut platform = fx.platform();

    let report = platform.start().expect("first start");

    assert!(report
        .errors
        .iter()
        .any(|e| e.step == Step::ResolveListener));
    assert!(!platform.has_listener("crm"));
    assert_eq!(platform.persisted_state("crm"), Some("active"));
}

#[test]
fn malformed_descriptor_skips_only_that_origin() {
    let fx = Fixture::new();
    fx.crm_jar();
    DirectoryOriginBuilder::new(fx.components().join("broken"))
        .file("META-INF/components-def.xml", "<components><component>")
        .build()
        .expect("should build origin");

    let mut platform = fx.platform();
    let report = platform.start().expect("first start");

    assert_eq!(report.registered, vec!["crm".to_string()]);
    assert!(report.errors.iter().any(|e| e.step == Step::Descriptor));
}

#[test]
fn directory_origin_resources_stay_on_remove_by_default() {
    let fx = Fixture::new();
    let docs = ComponentDescriptor::new("Docs", "docs", "1");
    DirectoryOriginBuilder::new(fx.components().join("docs"))
        .descriptor(&[docs])
        .file("webapp/docs/index.html", "docs")
        .build()
        .expect("should build origin");
    let mut platform = fx.platform();
    platform.start();
    assert!(fx.webroot().join("docs/index.html").is_file());

    assert!(platform.remove("docs").is_success());

    assert!(fx.webroot().join("docs/index.html").is_file());
    assert!(platform.is_empty());
}

#[test]
fn later_declaration_of_a_code_replaces_earlier_in_one_scan() {
    let fx = Fixture::new();
    ArchiveBuilder::new()
        .descriptor(&[ComponentDescriptor::new("A", "dup", "1")])
        .write_to(fx.components().join("a.jar"))
        .expect("should write archive");
    ArchiveBuilder::new()
        .descriptor(&[ComponentDescriptor::new("B", "dup", "2")])
        .write_to(fx.components().join("b.jar"))
        .expect("should write archive");

    let mut platform = fx.platform();
    let report = platform.start().expect("first start");

    assert_eq!(report.registered, vec!["dup".to_string()]);
    assert_eq!(platform.len(), 1);
    assert_eq!(platform.version("dup"), Some("2"));

    // A second pass keeps the registered entry.
    platform.refresh();
    assert_eq!(platform.version("dup"), Some("2"));
}
