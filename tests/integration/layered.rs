//! Tests for precedence between defaults, environment variables and flags.

use chrono::{TimeZone, Utc};
use plugin_env::{
    Bucket, ExecError, FieldRegistry, Provenance, derive_env_name, testing::TestRun,
};

use crate::common::downstream;

#[test]
fn test_derived_env_names() {
    let mut reg = FieldRegistry::new();
    let owner = reg.string("repo.owner", "", "");
    let dashed = reg.string("commit-sha", "", "");
    assert_eq!(reg.field(owner).env_names(), ["PLUGIN_REPO_OWNER"]);
    assert_eq!(reg.field(dashed).env_names(), ["PLUGIN_COMMIT_SHA"]);
    assert_eq!(derive_env_name("DRONE_", "Build.Number"), "DRONE_BUILD_NUMBER");
}

#[test]
fn test_first_present_candidate_decides() {
    let mut reg = FieldRegistry::new();
    let value = reg.string("value", "", "");
    reg.env(value, ["A", "B"]);

    let out = TestRun::new()
        .vars([("A", "1"), ("B", "2")])
        .run(reg, |_| Ok(()));

    out.assert_success();
    assert_eq!(out.report().get(value), "1");
    assert_eq!(out.report().field(value).provenance(), &Provenance::env("A"));
}

#[test]
fn test_bad_first_candidate_does_not_fall_back() {
    let mut reg = FieldRegistry::new();
    let count = reg.int("count", 7, "");
    reg.env(count, ["A", "B"]);

    let out = TestRun::new().vars([("A", "bad-int")]).run(reg, |_| Ok(()));

    out.assert_failure();
    let field = out.report().field(count);
    assert_eq!(field.parse_error().map(|e| e.value.as_str()), Some("bad-int"));
    assert_eq!(*out.report().get(count), 7);
    assert_eq!(out.report().bucket(Bucket::Error), &[count.id()]);
    assert!(out.error().unwrap().has_field("count"));
}

#[test]
fn test_missing_required_field_fails() {
    let (reg, f) = downstream::registry();

    let out = TestRun::new().run(reg, |ctx| {
        if ctx.get(f.token).is_empty() {
            ctx.usage(f.token, "you must provide your Drone access token.");
            return Err(ExecError::Usage);
        }
        Ok(())
    });

    out.assert_failure();
    let report = out.report();
    assert_eq!(report.bucket(Bucket::Error), &[f.token.id()]);
    for bucket in [Bucket::Unset, Bucket::Default, Bucket::Set] {
        assert!(!report.bucket(bucket).contains(&f.token.id()));
    }
    assert_eq!(
        report.usage_errors(f.token),
        ["you must provide your Drone access token."]
    );
    assert_eq!(out.outcome().exit_code(), 1);
}

#[test]
fn test_flags_override_env_and_succeed() {
    let (reg, f) = downstream::registry();

    let out = TestRun::new()
        .plugin_vars([("server", "https://env.example.com"), ("token", "env-token")])
        .vars([("downstream_token", "alias-token")])
        .args([
            "-server",
            "https://flag.example.com",
            "--token=flag-token",
            "-repositories",
            "octocat/hello,octocat/world",
            "-fork",
        ])
        .run(reg, |ctx| {
            if ctx.get(f.token).is_empty() {
                ctx.usage(f.token, "token required");
                return Err(ExecError::Usage);
            }
            Ok(())
        });

    out.assert_success().assert_output("");
    let report = out.report();
    assert_eq!(report.get(f.server), "https://flag.example.com");
    assert_eq!(report.get(f.token), "flag-token");
    assert_eq!(
        report.get(f.repos),
        &vec!["octocat/hello".to_string(), "octocat/world".into()]
    );
    assert!(*report.get(f.fork));
    for id in [f.server.id(), f.token.id(), f.repos.id(), f.fork.id()] {
        assert!(report.field(id).provenance().is_flag(), "{}", report.field(id).name());
        assert_eq!(report.bucket_of(id), Bucket::Set);
    }
}

#[test]
fn test_alias_is_used_when_default_name_absent() {
    let (reg, f) = downstream::registry();

    let out = TestRun::new()
        .vars([("downstream_server2", "https://ci.example.com")])
        .run(reg, |_| Ok(()));

    out.assert_success();
    assert_eq!(
        out.report().field(f.server).provenance(),
        &Provenance::env("DOWNSTREAM_SERVER2")
    );
    assert!(out.report().field(f.another).env_match().is_none());
}

#[test]
fn test_flag_equal_to_default_still_wins() {
    let mut reg = FieldRegistry::new();
    let branch = reg.string("branch", "master", "");

    let out = TestRun::new()
        .plugin_vars([("branch", "develop")])
        .args(["-branch", "master"])
        .run(reg, |_| Ok(()));

    out.assert_success();
    assert_eq!(out.report().get(branch), "master");
    assert_eq!(out.report().field(branch).provenance(), &Provenance::flag("branch"));
}

#[test]
fn test_composite_and_timestamp_values() {
    let mut reg = FieldRegistry::new();
    let labels = reg.string_map("labels", Vec::<(String, String)>::new(), "");
    let started = reg.timestamp("build.started", None, "");
    let tags = reg.string_list("tags", ["latest"], "");

    let out = TestRun::new()
        .plugin_vars([
            ("labels", r#"{"team":"ci","tier":"1"}"#),
            ("build_started", "1700000000"),
            ("tags", ""),
        ])
        .run(reg, |_| Ok(()));

    out.assert_success();
    let report = out.report();
    assert_eq!(report.get(labels).get("team").map(String::as_str), Some("ci"));
    assert_eq!(
        *report.get(started),
        Some(Utc.timestamp_opt(1_700_000_000, 0).unwrap())
    );
    assert!(report.get(tags).is_empty());
    assert!(report.field(tags).provenance().is_env());
}

#[test]
fn test_list_round_trip_through_report() {
    let mut reg = FieldRegistry::new();
    let repos = reg.string_list("repos", Vec::<String>::new(), "");

    let first = TestRun::new()
        .args(["-repos", "x,y,z"])
        .run(reg, |_| Ok(()));
    let rendered = first.report().field(repos).rendered();
    assert_eq!(rendered, "x,y,z");

    let mut reg = FieldRegistry::new();
    let again = reg.string_list("repos", Vec::<String>::new(), "");
    let second = TestRun::new()
        .plugin_vars([("repos", rendered.as_str())])
        .run(reg, |_| Ok(()));
    assert_eq!(second.report().get(again), first.report().get(repos));
}

#[test]
fn test_unknown_flag_fails_but_still_resolves() {
    let mut reg = FieldRegistry::new();
    let server = reg.string("server", "", "");

    let out = TestRun::new()
        .plugin_vars([("server", "https://ci")])
        .args(["-colour", "red"])
        .run(reg, |ctx| {
            assert_eq!(ctx.get(server), "https://ci");
            Ok(())
        });

    out.assert_failure();
    assert_eq!(out.error().unwrap().arg_errors.len(), 1);
    assert!(out.output().contains("flag provided but not defined: -colour"));
}

#[test]
fn test_sensitive_parse_error_does_not_carry_value() {
    let mut reg = FieldRegistry::new();
    let pin = reg.int("pin", 0, "Unlock pin");
    reg.sensitive(pin);

    let out = TestRun::new()
        .plugin_vars([("pin", "s3cret")])
        .run(reg, |_| Ok(()));

    out.assert_failure();
    let err = out.error().unwrap();
    assert_eq!(err.parse_errors["pin"].value, "[REDACTED]");
    assert!(!err.to_string().contains("s3cret"));
    assert!(!out.output().contains("s3cret"), "{}", out.output());
}
