//! Tests for the rendered report: full table, compact listing, debug output.

use plugin_env::{Bucket, ExecError, testing::TestRun};

use crate::assert_report_snapshot;
use crate::common::downstream;

#[test]
fn test_failure_prints_full_report() {
    let (reg, f) = downstream::registry();

    let out = TestRun::new()
        .vars([("downstream_server", "https://ci.example.com")])
        .args(["-fork"])
        .run(reg, |ctx| {
            if ctx.get(f.token).is_empty() {
                ctx.usage(f.token, "you must provide your Drone access token.");
                return Err(ExecError::Usage);
            }
            Ok(())
        });

    out.assert_failure();
    assert_report_snapshot!(out.output(), @r"
    plugin usage:

    UNSET
      repositories ..... List of repositories to trigger
      another-option ... option without PLUGIN_ name
            envvar name: ANOTHER_OPTION

    SET
      fork ............. Trigger a new build for a repository
                 source: set by flag `fork`
                  value: true
      server, server2 .. Trigger a drone build on a custom server
            envvar name: DOWNSTREAM_SERVER, DOWNSTREAM_SERVER2
                 source: set by env `DOWNSTREAM_SERVER`
                  value: https://ci.example.com

    ERRORS
      token ............ Drone API token from your user settings
            envvar name: DOWNSTREAM_TOKEN
        **USAGE ERROR**: you must provide your Drone access token.
    ");
}

#[test]
fn test_compact_listing_on_success() {
    let (reg, _) = downstream::registry();

    let out = TestRun::new()
        .vars([("downstream_token", "t0k"), ("another_option", "x")])
        .plugin_vars([("server", "https://ci")])
        .compact_on_success()
        .run(reg, |_| Ok(()));

    out.assert_success();
    assert_report_snapshot!(out.output(), @r"
    fork = false (default)
    repositories (unset)
    server, server2 = https://ci (set by env `PLUGIN_SERVER`)
    token = t0k (set by env `DOWNSTREAM_TOKEN`)
    another-option = x (set by env `ANOTHER_OPTION`)
    ");
}

#[test]
fn test_parse_and_usage_errors_on_one_field() {
    let mut reg = plugin_env::FieldRegistry::new();
    let retries = reg.int("retries", 3, "how many times to retry");

    let out = TestRun::new()
        .plugin_vars([("retries", "many")])
        .run(reg, |ctx| {
            ctx.usage(retries, "retries must be between 1 and 10");
            Err(ExecError::Usage)
        });

    out.assert_failure();
    assert_eq!(out.report().bucket(Bucket::Error), &[retries.id()]);
    let err = out.error().unwrap();
    assert!(err.parse_errors.contains_key("retries"));
    assert_eq!(err.usage_errors["retries"], ["retries must be between 1 and 10"]);
    assert!(out.output().contains("**ERROR**: invalid int value \"many\""));
    assert!(out.output().contains("**USAGE ERROR**: retries must be between 1 and 10"));
}

#[test]
fn test_debug_run_logs_each_phase() {
    let (reg, _) = downstream::registry();

    let out = TestRun::new()
        .debug()
        .vars([("downstream_token", "t0k")])
        .plugin_vars([("server", "https://ci")])
        .args(["-fork"])
        .run(reg, |ctx| {
            ctx.log().println("success!");
            Ok(())
        });

    out.assert_success();
    let lines: Vec<&str> = out.output().lines().collect();
    let pos = |needle: &str| {
        lines
            .iter()
            .position(|l| *l == needle)
            .unwrap_or_else(|| panic!("missing line {needle:?} in:\n{}", out.output()))
    };

    let assign = pos("[assign] flag 'server' for env vars: PLUGIN_SERVER, PLUGIN_SERVER2, DOWNSTREAM_SERVER, DOWNSTREAM_SERVER2");
    let flag = pos("[flag] 'fork' set: true");
    let envflag = pos("[envflag] 'token' set by env var 'DOWNSTREAM_TOKEN': t0k");
    let before = pos("------ executing plugin func -----");
    let printed = pos("success!");
    let after = pos("------ plugin func done -----");
    let usage = pos("plugin usage:");
    assert!(assign < flag && flag < envflag && envflag < before);
    assert!(before < printed && printed < after && after < usage);
    assert!(lines.contains(&"[env] PLUGIN_SERVER=https://ci"));
}

#[test]
fn test_success_without_debug_is_silent() {
    let (reg, _) = downstream::registry();
    let out = TestRun::new()
        .vars([("downstream_token", "t0k")])
        .run(reg, |_| Ok(()));
    out.assert_success().assert_output("");
}
