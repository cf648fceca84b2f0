//! Tests for override files merged into the environment before resolution.

use std::fs;

use plugin_env::{FieldRegistry, FileStatus, Provenance, testing::TestRun};
use tempfile::TempDir;

fn env_file(dir: &TempDir, name: &str, contents: &str) -> String {
    let path = dir.path().join(name);
    fs::write(&path, contents).unwrap();
    path.to_str().unwrap().to_string()
}

#[test]
fn test_earlier_file_wins_over_later() {
    let dir = tempfile::tempdir().unwrap();
    let f1 = env_file(&dir, "f1.env", "PLUGIN_SERVER=https://one\n");
    let f2 = env_file(&dir, "f2.env", "PLUGIN_SERVER=https://two\nPLUGIN_TOKEN=two\n");

    let mut reg = FieldRegistry::new();
    let server = reg.string("server", "", "");
    let token = reg.string("token", "", "");
    reg.env_files([f1.as_str(), f2.as_str()]);

    let out = TestRun::new().run(reg, |_| Ok(()));

    out.assert_success();
    assert_eq!(out.report().get(server), "https://one");
    assert_eq!(out.report().get(token), "two");
    assert_eq!(
        out.report().field(server).provenance(),
        &Provenance::env("PLUGIN_SERVER")
    );
    let files = out.report().files().unwrap();
    assert_eq!(files.paths[0].status, FileStatus::Loaded { merged: 1, skipped: 0 });
    assert_eq!(files.paths[1].status, FileStatus::Loaded { merged: 1, skipped: 1 });
}

#[test]
fn test_real_environment_wins_over_file() {
    let dir = tempfile::tempdir().unwrap();
    let f1 = env_file(&dir, "f1.env", "PLUGIN_SERVER=https://file\n");

    let mut reg = FieldRegistry::new();
    let server = reg.string("server", "", "");
    reg.env_files([f1.as_str()]);

    let out = TestRun::new()
        .plugin_vars([("server", "https://env")])
        .run(reg, |_| Ok(()));

    assert_eq!(out.report().get(server), "https://env");
}

#[test]
fn test_file_list_from_env_and_flag() {
    let dir = tempfile::tempdir().unwrap();
    let a = env_file(&dir, "a.env", "PLUGIN_SERVER=https://a\n");
    let b = env_file(&dir, "b.env", "PLUGIN_SERVER=https://b\n");

    let mut reg = FieldRegistry::new();
    let server = reg.string("server", "", "");
    reg.env_files(Vec::<String>::new());
    let out = TestRun::new()
        .plugin_vars([("env_file", a.as_str())])
        .run(reg, |_| Ok(()));
    out.assert_success();
    assert_eq!(out.report().get(server), "https://a");

    let mut reg = FieldRegistry::new();
    let server = reg.string("server", "", "");
    let files = reg.env_files(Vec::<String>::new());
    let out = TestRun::new()
        .plugin_vars([("env_file", a.as_str())])
        .args(["-env_file", b.as_str()])
        .run(reg, |_| Ok(()));
    out.assert_success();
    assert_eq!(out.report().get(server), "https://b");
    assert!(out.report().field(files).provenance().is_flag());
}

#[test]
fn test_missing_and_malformed_files_are_not_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("nope.env").to_str().unwrap().to_string();
    let bad = env_file(&dir, "bad.env", "PLUGIN_TOKEN=bad\nnot a valid line\n");
    let good = env_file(&dir, "good.env", "PLUGIN_SERVER=https://good\n");

    let mut reg = FieldRegistry::new();
    let server = reg.string("server", "", "");
    let token = reg.string("token", "", "");
    reg.env_files([missing.as_str(), bad.as_str(), good.as_str()]);

    let out = TestRun::new().debug().run(reg, |_| Ok(()));

    out.assert_success();
    assert_eq!(out.report().get(server), "https://good");
    assert_eq!(out.report().get(token), "");
    let statuses: Vec<bool> = out
        .report()
        .files()
        .unwrap()
        .paths
        .iter()
        .map(|p| matches!(p.status, FileStatus::Loaded { .. }))
        .collect();
    assert_eq!(statuses, [false, false, true]);
    assert!(out.output().contains("[envfile] read env files"));
    assert!(out.output().contains("[envfile] error loading env file"));
    assert!(out.output().contains("[envfile] setting PLUGIN_SERVER=https://good"));
    assert!(out.output().contains("env files:"));
}

#[test]
fn test_disabled_without_registration() {
    let mut reg = FieldRegistry::new();
    reg.string("server", "", "");
    let out = TestRun::new().run(reg, |_| Ok(()));
    assert!(out.report().files().is_none());
}

#[test]
fn test_sensitive_file_values_are_redacted_in_debug() {
    let dir = tempfile::tempdir().unwrap();
    let s = env_file(&dir, "s.env", "PLUGIN_TOKEN=hunter2\n");

    let mut reg = FieldRegistry::new();
    let token = reg.string("token", "", "API token");
    reg.sensitive(token);
    reg.env_files([s.as_str()]);

    let out = TestRun::new().debug().run(reg, |_| Ok(()));

    assert_eq!(out.report().get(token), "hunter2");
    assert!(out.output().contains("[envfile] setting PLUGIN_TOKEN=[REDACTED]"));
    assert!(!out.output().contains("hunter2"), "{}", out.output());
}

#[test]
fn test_env_file_after_positional_is_not_loaded() {
    let dir = tempfile::tempdir().unwrap();
    let x = env_file(&dir, "x.env", "PLUGIN_SERVER=https://x\n");

    let mut reg = FieldRegistry::new();
    let server = reg.string("server", "", "");
    reg.env_files(Vec::<String>::new());

    let out = TestRun::new()
        .args(["deploy", "-env_file", x.as_str()])
        .run(reg, |ctx| {
            assert_eq!(ctx.args(), ["deploy", "-env_file", x.as_str()]);
            Ok(())
        });

    out.assert_success();
    assert_eq!(out.report().get(server), "");
    assert!(out.report().files().unwrap().paths.is_empty());
}
