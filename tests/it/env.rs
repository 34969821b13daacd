use std::collections::BTreeMap;

use runcheck::Cmd;

use crate::{mock_bin, setup};

#[test]
fn test_env() {
    let mut sh = setup();

    let v1 = "runcheck_test_123";
    let v2 = "runcheck_test_456";

    assert_env(sh.cmd("xecho").args(["-$", v1]).env(v1, "123"), &[(v1, Some("123"))]);

    assert_env(
        sh.cmd("xecho").args(["-$", v1, v2]).envs([(v1, "123"), (v2, "456")]),
        &[(v1, Some("123")), (v2, Some("456"))],
    );
    assert_env(
        sh.cmd("xecho").args(["-$", v1, v2]).envs([(v1, "123"), (v2, "456")]).env_remove(v2),
        &[(v1, Some("123")), (v2, None)],
    );
    assert_env(
        sh.cmd("xecho")
            .args(["-$", v1, v2])
            .envs([(v1, "123"), (v2, "456")])
            .env_remove("nothing"),
        &[(v1, Some("123")), (v2, Some("456"))],
    );

    sh.set_var(v1, "foobar");
    sh.set_var(v2, "quark");

    assert_env(sh.cmd("xecho").args(["-$", v1, v2]), &[(v1, Some("foobar")), (v2, Some("quark"))]);
    assert_env(
        sh.cmd("xecho").args(["-$", v1, v2]).env(v1, "wombo"),
        &[(v1, Some("wombo")), (v2, Some("quark"))],
    );
    assert_env(
        sh.cmd("xecho").args(["-$", v1, v2]).env_remove(v1),
        &[(v1, None), (v2, Some("quark"))],
    );
    assert_env(
        sh.cmd("xecho").args(["-$", v1, v2]).env_remove(v1).env(v1, "baz"),
        &[(v1, Some("baz")), (v2, Some("quark"))],
    );
    assert_env(
        sh.cmd("xecho").args(["-$", v1, v2]).env(v1, "baz").env_remove(v1),
        &[(v1, None), (v2, Some("quark"))],
    );

    sh.remove_var(v2);
    assert_env(sh.cmd("xecho").args(["-$", v1, v2]), &[(v1, Some("foobar")), (v2, None)]);
}

#[test]
fn shell_vars_shadow_process_env() {
    let mut sh = setup();

    // `setup` points `PATH` at the mock binaries.
    assert_eq!(sh.var_os("PATH"), Some(crate::mock_bin_dir().into_os_string()));

    sh.remove_var("PATH");
    assert!(sh.var("PATH").is_err());
}

#[test]
#[cfg(not(windows))]
fn test_env_clear() {
    let mut sh = setup();

    let v1 = "runcheck_test_123";
    let v2 = "runcheck_test_456";

    // `env_clear` also drops `PATH`, so spell out where the binary lives.
    let xecho = mock_bin("xecho");

    assert_env(
        sh.cmd(&xecho).args(["-$", v1, v2]).envs([(v1, "123"), (v2, "456")]).env_clear(),
        &[(v1, None), (v2, None)],
    );
    assert_env(
        sh.cmd(&xecho)
            .args(["-$", v1, v2])
            .envs([(v1, "123"), (v2, "456")])
            .env_clear()
            .env(v1, "789"),
        &[(v1, Some("789")), (v2, None)],
    );

    sh.set_var(v1, "foobar");
    sh.set_var(v2, "quark");

    assert_env(sh.cmd(&xecho).args(["-$", v1, v2]).env_clear(), &[(v1, None), (v2, None)]);
    assert_env(
        sh.cmd(&xecho).args(["-$", v1, v2]).env_clear().env(v1, "baz"),
        &[(v1, Some("baz")), (v2, None)],
    );
    assert_env(
        sh.cmd(&xecho).args(["-$", v1, v2]).env(v1, "baz").env_clear(),
        &[(v1, None), (v2, None)],
    );
}

#[track_caller]
fn assert_env(xecho_env_cmd: Cmd, want_env: &[(&str, Option<&str>)]) {
    let output = xecho_env_cmd.output().unwrap();
    let env = String::from_utf8_lossy(&output.stdout)
        .lines()
        .filter(|line| !line.is_empty())
        .map(|line| {
            let (key, val) = line.split_once('=').unwrap_or_else(|| {
                panic!("failed to parse line from `xecho -$` output: {:?}", line)
            });
            (key.to_owned(), val.to_owned())
        })
        .collect::<BTreeMap<_, _>>();
    check_env(&env, want_env);
}

#[track_caller]
fn check_env(env: &BTreeMap<String, String>, wanted_env: &[(&str, Option<&str>)]) {
    let mut failed = false;
    let mut seen = env.clone();
    for &(k, val) in wanted_env {
        match (seen.remove(k), val) {
            (Some(env_v), Some(want_v)) if env_v == want_v => {}
            (None, None) => {}
            (have, want) => {
                eprintln!("mismatch on env var {:?}: have `{:?}`, want `{:?}` ", k, have, want);
                failed = true;
            }
        }
    }
    for (k, v) in seen {
        eprintln!("Unexpected env key {:?} (value: {:?})", k, v);
        failed = true;
    }
    assert!(
        !failed,
        "env didn't match (see stderr for cleaner output):\nsaw: {:?}\n\nwanted: {:?}",
        env, wanted_env,
    );
}
