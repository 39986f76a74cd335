use assert_cmd::Command;
use predicates::str::contains;

fn cmd() -> Command {
    let mut cmd = Command::cargo_bin("cmmv").unwrap();
    cmd.env_remove("CMMV_BACKEND_URL").env("CMMV_LOG", "off");
    cmd
}

#[test]
fn help_lists_subcommands() {
    cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(contains("summary"))
        .stdout(contains("compare"))
        .stdout(contains("dashboard"));
}

#[test]
fn summary_requires_folder() {
    cmd()
        .args(["summary", "--server", "http://127.0.0.1:9"])
        .assert()
        .code(2)
        .stderr(contains("Please enter a folder path."));
}

#[test]
fn summary_rejects_bad_date() {
    cmd()
        .args(["summary", "--server", "http://127.0.0.1:9", "-f", "/data", "--start-date", "03/01/2024"])
        .assert()
        .code(2)
        .stderr(contains("Invalid start date"));
}

#[test]
fn summary_reports_unreachable_backend() {
    cmd()
        .args(["summary", "--server", "http://127.0.0.1:9", "-f", "/data"])
        .assert()
        .code(3)
        .stderr(contains("Scanning reports..."))
        .stderr(contains("Request failed:"));
}

#[test]
fn compare_reports_missing_documents() {
    cmd()
        .args(["compare", "--left", "no-such-left.pdf", "--right", "no-such-right.pdf"])
        .assert()
        .code(4)
        .stderr(contains("Error loading PDFs"));
}
