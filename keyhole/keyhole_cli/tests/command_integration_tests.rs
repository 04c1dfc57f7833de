use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

const CONFIG: &str = r#"
[session]
principal = "alice"
roles = ["EDITOR"]

[router]
mode = "eager"

[[routes]]
pattern = "admin"
target = "showDashboard"
restriction = "hasRole('ADMIN')"
body = "<h1>Dashboard</h1>"

[[routes]]
pattern = "docs/*page"
target = "showDocs"
restriction = "hasAnyRole(['EDITOR','ADMIN'])"
body = "<p>{{page}}</p>"
"#;

const MARKUP: &str = "<nav><a href=\"/\">Home</a>\
<a data-secure=\"hasRole('ADMIN')\" href=\"/admin\">Admin</a>\
<button data-secure=\"hasAllRoles(['ADMIN','EDITOR'])\" data-secure-action=\"disable\">Publish</button>\
</nav>";

fn keyhole() -> Command {
    Command::cargo_bin("keyhole").unwrap()
}

fn write_config(dir: &TempDir) -> String {
    let path = dir.path().join("keyhole.toml");
    fs::write(&path, CONFIG).unwrap();
    path.to_string_lossy().to_string()
}

#[test]
fn test_check_granted_and_denied() {
    keyhole()
        .args(["--principal", "x", "--role", "ADMIN", "check", "--restriction", "hasRole('ADMIN')"])
        .assert()
        .success()
        .stdout("granted\n");

    keyhole()
        .args(["check", "--restriction", "hasRole('ADMIN')"])
        .assert()
        .success()
        .stdout("denied\n");
}

#[test]
fn test_check_unknown_policy_fails() {
    keyhole()
        .args(["--principal", "x", "--role", "ADMIN", "check", "--restriction", "isAdmin('ADMIN')"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown policy: isAdmin"));
}

#[test]
fn test_check_uses_config_credential() {
    let dir = TempDir::new().unwrap();
    let config = write_config(&dir);

    keyhole()
        .args(["--config", &config, "check", "--restriction", "hasRole('EDITOR')"])
        .assert()
        .success()
        .stdout("granted\n");

    keyhole()
        .args(["--config", &config, "--anonymous", "check", "--restriction", "hasRole('EDITOR')"])
        .assert()
        .success()
        .stdout("denied\n");
}

#[test]
fn test_enforce_file() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("nav.html");
    fs::write(&input, MARKUP).unwrap();

    keyhole()
        .args(["--principal", "x", "--role", "EDITOR", "enforce", "--input"])
        .arg(&input)
        .assert()
        .success()
        .stdout(predicate::str::contains("Admin").not())
        .stdout(predicate::str::contains("data-secure-action=\"disable\" disabled=\"disabled\">Publish"));
}

#[test]
fn test_enforce_stdin_with_data() {
    keyhole()
        .args(["enforce", "--input", "-", "--data", r#"{"name": "Ada"}"#])
        .write_stdin("<p>Hi {{name}}</p><p data-secure=\"hasRole('A')\">secret</p>")
        .assert()
        .success()
        .stdout("<p>Hi Ada</p>\n");
}

#[test]
fn test_enforce_unknown_action_fails() {
    keyhole()
        .args(["enforce", "--input", "-"])
        .write_stdin("<p data-secure=\"hasRole('A')\" data-secure-action=\"hide\">x</p>")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown remediation action: hide"));
}

#[test]
fn test_routes_and_dispatch() {
    let dir = TempDir::new().unwrap();
    let config = write_config(&dir);

    keyhole()
        .args(["--config", &config, "routes"])
        .assert()
        .success()
        .stdout(predicate::str::contains("admin -> notAuthorized [hasRole('ADMIN')]"))
        .stdout(predicate::str::contains("docs/*page -> showDocs"));

    keyhole()
        .args(["--config", &config, "dispatch", "--path", "admin"])
        .assert()
        .success()
        .stdout("redirect /401.html\n");

    keyhole()
        .args(["--config", &config, "dispatch", "--path", "docs/guide/intro"])
        .assert()
        .success()
        .stdout("<p>guide/intro</p>\n");

    keyhole()
        .args(["--config", &config, "dispatch", "--path", "nowhere"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("No route matches path: nowhere"));
}

#[test]
fn test_malformed_config_fails() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("bad.toml");
    fs::write(&path, "[[routes]]\npattern = \"a\"\ntarget = \"b\"\nrestriction = \"hasRole(\"\n").unwrap();

    keyhole()
        .arg("--config")
        .arg(&path)
        .arg("routes")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to parse configuration file"));
}

#[test]
fn test_anonymous_conflicts_with_principal() {
    keyhole()
        .args(["--anonymous", "--principal", "x", "check", "--restriction", "hasRole('A')"])
        .assert()
        .failure();
}
