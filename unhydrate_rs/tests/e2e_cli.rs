//! End-to-End CLI Tests for unhydrate

use assert_cmd::Command;
use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

/// Get path to test fixtures
fn fixtures_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

fn next_app() -> PathBuf {
    fixtures_path().join("next_app")
}

/// Get a command pointing to the unhydrate binary
fn unhydrate() -> Command {
    cargo_bin_cmd!("unhydrate")
}

// ============================================
// Basic CLI Tests
// ============================================

mod cli_basics {
    use super::*;

    #[test]
    fn shows_help() {
        unhydrate()
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("unhydrate"))
            .stdout(predicate::str::contains("--dry-run"))
            .stdout(predicate::str::contains("--build-dir"));
    }

    #[test]
    fn shows_version() {
        unhydrate()
            .arg("--version")
            .assert()
            .success()
            .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
    }

    #[test]
    fn fails_without_build_output() {
        let tmp = TempDir::new().expect("temp dir");
        unhydrate()
            .arg(tmp.path())
            .args(["--dry-run", "--color", "never"])
            .assert()
            .code(2)
            .stderr(predicate::str::contains("No build output found"));
    }

    #[test]
    fn refuses_output_inside_build() {
        let fixture = next_app();
        unhydrate()
            .arg(&fixture)
            .arg("--out")
            .arg(fixture.join("out/stripped"))
            .assert()
            .code(2)
            .stderr(predicate::str::contains("must not be inside the build directory"));
    }
}

// ============================================
// Classification & Rewrite Tests
// ============================================

mod rewrite {
    use super::*;

    #[test]
    fn dry_run_reports_every_class() {
        unhydrate()
            .arg(next_app())
            .args(["--dry-run", "--color", "never"])
            .assert()
            .success()
            .stdout(predicate::str::contains("PURE_STATIC  index.html"))
            .stdout(predicate::str::contains("ROUTING_ONLY about.html"))
            .stdout(predicate::str::contains("INTERACTIVE  counter.html"))
            .stdout(predicate::str::contains("via components/Counter.tsx"))
            .stdout(predicate::str::contains("orphan.html (no entry source, skipped)"))
            .stdout(predicate::str::contains("dry run, nothing written"));
    }

    #[test]
    fn verbose_shows_indicators() {
        unhydrate()
            .arg(next_app())
            .args(["--dry-run", "--color", "never", "-v"])
            .assert()
            .success()
            .stdout(predicate::str::contains("nav=yes"));
    }

    #[test]
    fn writes_rewritten_pages() {
        let tmp = TempDir::new().expect("temp dir");
        let out = tmp.path().join("site");

        unhydrate()
            .arg(next_app())
            .arg("--out")
            .arg(&out)
            .args(["--color", "never"])
            .assert()
            .success()
            .stdout(predicate::str::contains("wrote 2 pages"));

        let index = fs::read_to_string(out.join("index.html")).expect("index.html");
        assert!(!index.contains("/_next/static/chunks/"));
        assert!(!index.contains("__next_f"));
        assert!(!index.contains("data-unhydrate-nav"));
        assert!(index.contains("/_next/static/css/app.css"));
        assert!(index.contains(r#"<script type="application/ld+json">"#));

        let about = fs::read_to_string(out.join("about.html")).expect("about.html");
        assert!(!about.contains("main.js"));
        assert_eq!(about.matches("data-unhydrate-nav").count(), 1);
        assert!(about.ends_with("</script></body></html>\n"));

        let original = fs::read_to_string(next_app().join("out/counter.html")).expect("fixture");
        let counter = fs::read_to_string(out.join("counter.html")).expect("counter.html");
        assert_eq!(counter, original);

        assert!(out.join("orphan.html").exists());
        assert!(out.join("_next/static/chunks/main.js").exists());
    }

    #[test]
    fn rerun_over_rewritten_output_keeps_one_helper() {
        let tmp = TempDir::new().expect("temp dir");
        let first = tmp.path().join("first");
        let second = tmp.path().join("second");

        unhydrate()
            .arg(next_app())
            .arg("--out")
            .arg(&first)
            .args(["--color", "never"])
            .assert()
            .success();
        unhydrate()
            .arg(next_app())
            .arg("--build-dir")
            .arg(&first)
            .arg("--out")
            .arg(&second)
            .args(["--color", "never"])
            .assert()
            .success();

        let before = fs::read_to_string(first.join("about.html")).expect("about.html");
        let after = fs::read_to_string(second.join("about.html")).expect("about.html");
        assert_eq!(after.matches("data-unhydrate-nav").count(), 1);
        assert_eq!(after, before);

        let index = fs::read_to_string(second.join("index.html")).expect("index.html");
        assert!(!index.contains("data-unhydrate-nav"));
    }

    #[test]
    fn json_report_is_machine_readable() {
        let output = unhydrate()
            .arg(next_app())
            .args(["--dry-run", "--json"])
            .output()
            .expect("run unhydrate");
        assert!(output.status.success());

        let json: serde_json::Value =
            serde_json::from_slice(&output.stdout).expect("stdout is JSON");
        assert_eq!(json["dry_run"], true);
        assert_eq!(json["stats"]["total_pages"], 3);
        assert_eq!(json["stats"]["pure_static"], 1);
        assert_eq!(json["stats"]["routing_only"], 1);
        assert_eq!(json["stats"]["interactive"], 1);
        assert_eq!(json["stats"]["skipped_pages"], 1);
        assert_eq!(json["stats"]["scripts_removed"], 6);
        assert_eq!(json["stats"]["preloads_removed"], 2);
        assert_eq!(json["stats"]["helpers_injected"], 1);
        assert_eq!(json["failures"].as_array().map(Vec::len), Some(0));

        let classes: Vec<&str> = json["pages"]
            .as_array()
            .expect("pages array")
            .iter()
            .filter_map(|p| p["classification"].as_str())
            .collect();
        assert_eq!(classes, vec!["ROUTING_ONLY", "INTERACTIVE", "PURE_STATIC"]);
    }

    #[test]
    fn malformed_page_exits_nonzero_but_writes_the_rest() {
        let tmp = TempDir::new().expect("temp dir");
        let project = tmp.path().join("project");
        fs::create_dir_all(project.join("app/broken")).unwrap();
        fs::create_dir_all(project.join("out")).unwrap();
        fs::write(
            project.join("app/page.tsx"),
            "export default () => <p>hi</p>;",
        )
        .unwrap();
        fs::write(
            project.join("app/broken/page.tsx"),
            "export default () => null;",
        )
        .unwrap();
        fs::write(
            project.join("out/index.html"),
            r#"<html><body><p>hi</p><script src="/_next/static/chunks/a.js"></script></body></html>"#,
        )
        .unwrap();
        fs::write(
            project.join("out/broken.html"),
            "<html><body><script>never closed",
        )
        .unwrap();

        let out = tmp.path().join("stripped");
        unhydrate()
            .arg(&project)
            .arg("--out")
            .arg(&out)
            .args(["--color", "never"])
            .assert()
            .code(1)
            .stdout(predicate::str::contains("[FAIL] broken.html"));

        assert_eq!(
            fs::read_to_string(out.join("index.html")).unwrap(),
            "<html><body><p>hi</p></body></html>"
        );
    }
}
