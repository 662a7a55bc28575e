//! CLI integration tests using assert_cmd.

use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

const RICH_REQUIREMENT: &str = "\
# 校园二手图书交易平台需求说明

## 功能需求
用户注册 登录 书籍搜索 发布图书 自提 自付款 分类浏览 订单管理 图书详情 个人中心

## 非功能需求
系统应当在 2 秒内响应，支持 1000 个并发用户。
";

/// A command isolated from user-level configuration.
fn rubricforge(home: &Path) -> Command {
    #[allow(deprecated)]
    let mut cmd = Command::cargo_bin("rubricforge").unwrap();
    cmd.env("HOME", home).env_remove("RUBRICFORGE_OUTPUT_DIR");
    cmd
}

fn write(dir: &Path, name: &str, content: &str) -> std::path::PathBuf {
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(&path, content).unwrap();
    path
}

// --- evaluation commands ---

#[test]
fn requirement_writes_markdown_report() {
    let dir = TempDir::new().unwrap();
    let input = write(dir.path(), "需求说明.md", RICH_REQUIREMENT);
    let output = dir.path().join("out").join("report.md");

    rubricforge(dir.path())
        .arg("requirement")
        .arg(&input)
        .arg(&output)
        .arg("--date")
        .arg("2026-05-04")
        .assert()
        .success()
        .stdout(predicate::str::contains("评估完成!"))
        .stdout(predicate::str::contains("总分: "))
        .stdout(predicate::str::contains("等级: "))
        .stdout(predicate::str::contains("report.md"));

    let report = std::fs::read_to_string(&output).unwrap();
    assert!(report.starts_with("# 需求分析评估报告\n"));
    assert!(report.contains("- **评估日期**: 2026-05-04"));
    assert!(report.contains("## 1. 功能点覆盖率 (20/20分)"));
    assert!(report.contains("## 改进建议"));
}

#[test]
fn identical_runs_produce_identical_reports() {
    let dir = TempDir::new().unwrap();
    let input = write(dir.path(), "需求说明.md", RICH_REQUIREMENT);
    let run = |name: &str| {
        let output = dir.path().join(name);
        rubricforge(dir.path())
            .args(["requirement", "--date", "2026-05-04"])
            .arg(&input)
            .arg(&output)
            .assert()
            .success();
        std::fs::read(output).unwrap()
    };
    assert_eq!(run("a.md"), run("b.md"));
}

#[test]
fn missing_input_fails_without_report() {
    let dir = TempDir::new().unwrap();
    let output = dir.path().join("report.md");

    rubricforge(dir.path())
        .arg("requirement")
        .arg(dir.path().join("nonexistent.md"))
        .arg(&output)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error"))
        .stderr(predicate::str::contains("not found"));

    assert!(!output.exists());
}

#[test]
fn default_output_uses_output_dir() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "需求说明.md", RICH_REQUIREMENT);

    rubricforge(dir.path())
        .current_dir(dir.path())
        .args(["requirement", "需求说明.md", "--format", "html"])
        .assert()
        .success();

    let html = std::fs::read_to_string(dir.path().join("output/需求分析评估报告.html")).unwrap();
    assert!(html.contains("<svg"));
}

#[test]
fn output_dir_env_override() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "需求说明.md", RICH_REQUIREMENT);

    rubricforge(dir.path())
        .current_dir(dir.path())
        .env("RUBRICFORGE_OUTPUT_DIR", "reports")
        .args(["requirement", "需求说明.md", "--format", "all"])
        .assert()
        .success();

    for ext in ["md", "html", "json"] {
        assert!(dir
            .path()
            .join(format!("reports/需求分析评估报告.{ext}"))
            .exists());
    }
}

#[test]
fn bug_with_recorded_probes() {
    let dir = TempDir::new().unwrap();
    let buggy = write(dir.path(), "buggy.js", "function add(a, b) { return a - b; }");
    let fixed = write(dir.path(), "fixed.js", "function add(a, b) { return a + b; }");
    let probes = write(
        dir.path(),
        "probes.toml",
        "[bugs]\nknown = 3\ndiscovered = 3\nfixed = 3\ncompletely_fixed = true\nintroduced_new_defects = false\n",
    );
    let output = dir.path().join("bug.md");

    rubricforge(dir.path())
        .arg("bug")
        .arg(&buggy)
        .arg(&fixed)
        .arg(&output)
        .arg("--probes")
        .arg(&probes)
        .args(["--elapsed-secs", "600"])
        .assert()
        .success()
        .stdout(predicate::str::contains("总分: 40/40"))
        .stdout(predicate::str::contains("得分率: 100%"))
        .stdout(predicate::str::contains("等级: 优秀 (A)"));

    let report = std::fs::read_to_string(&output).unwrap();
    assert!(report.contains("1. BUG修复质量良好，无需特别改进"));
}

#[test]
fn elapsed_options_conflict() {
    let dir = TempDir::new().unwrap();
    let file = write(dir.path(), "a.js", "");
    rubricforge(dir.path())
        .arg("bug")
        .arg(&file)
        .arg(&file)
        .args(["--elapsed-secs", "1", "--started-at", "2026-01-01T00:00:00Z"])
        .assert()
        .failure();
}

#[test]
fn backend_with_swagger_and_tests() {
    let dir = TempDir::new().unwrap();
    let backend = dir.path().join("backend");
    write(
        &backend,
        "app/main.py",
        "@router.get('/books')\ndef list_books(): ...\n@router.post('/books')\ndef add_book(): ...\n",
    );
    write(
        &backend,
        "tests/test_api.py",
        "def test_search_function(): pass\ndef test_auth_token(): pass\n",
    );
    let swagger = write(
        dir.path(),
        "swagger.json",
        r#"{"paths": {"/books": {"get": {}, "post": {}}}}"#,
    );
    let output = dir.path().join("backend.md");

    rubricforge(dir.path())
        .arg("backend")
        .arg(&backend)
        .arg(&output)
        .arg("--swagger")
        .arg(&swagger)
        .assert()
        .success();

    let report = std::fs::read_to_string(&output).unwrap();
    assert!(report.starts_with("# 后端开发评估报告\n"));
    assert!(report.contains("## 1. API完成率 (10/10分)"));
    assert!(report.contains("## 2. 测试通过率"));
}

#[test]
fn invalid_probes_file_fails() {
    let dir = TempDir::new().unwrap();
    let file = write(dir.path(), "proj/main.py", "print('hi')");
    let probes = write(dir.path(), "probes.yaml", "bugs: {}");

    rubricforge(dir.path())
        .arg("project")
        .arg(file.parent().unwrap())
        .arg(dir.path().join("p.md"))
        .arg("--probes")
        .arg(&probes)
        .assert()
        .failure()
        .stderr(predicate::str::contains("unsupported format"));
}

// --- batch and merge ---

#[test]
fn batch_ranks_inputs_and_writes_table() {
    let dir = TempDir::new().unwrap();
    let inputs = dir.path().join("docs");
    write(&inputs, "需求说明_strong.md", RICH_REQUIREMENT);
    write(&inputs, "需求说明_weak.md", "登录");
    write(&inputs, "notes.md", "ignored");
    let table = dir.path().join("scores.txt");

    rubricforge(dir.path())
        .arg("batch")
        .arg(&inputs)
        .arg("--table")
        .arg(&table)
        .args(["--date", "2026-05-04"])
        .assert()
        .success()
        .stdout(predicate::str::contains("strong"))
        .stdout(predicate::str::contains("平均分"))
        .stderr(predicate::str::contains("Complete: 2/2 evaluated, 0 failed"));

    let text = std::fs::read_to_string(&table).unwrap();
    let rows: Vec<&str> = text.lines().collect();
    assert!(rows[0].starts_with("需求文档"));
    assert!(rows[2].starts_with("strong "));
    assert!(rows[3].starts_with("weak "));
    assert!(rows.last().unwrap().starts_with("平均分"));
}

#[test]
fn batch_without_matches_fails() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "other.md", "x");
    rubricforge(dir.path())
        .arg("batch")
        .arg(dir.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("no files matching"));
}

#[test]
fn merge_adds_tables_and_ranks() {
    let dir = TempDir::new().unwrap();
    let a = write(
        dir.path(),
        "a.txt",
        "需求文档                 总分         得分率\n\
         --------------------------------------------------------------------------------\n\
         GLM-4.5              40.6       54.13\n\
         Kimi-k2              38.1       50.8\n",
    );
    let b = write(
        dir.path(),
        "b.txt",
        "Kimi-k2              53.6       71.47\nGLM-4.5              49.0       65.33\nnew-model 10.0 13.33\n",
    );

    let assert = rubricforge(dir.path())
        .arg("merge")
        .arg(&a)
        .arg(&b)
        .assert()
        .success();
    let stdout = String::from_utf8(assert.get_output().stdout.clone()).unwrap();
    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(lines[2], "Kimi-k2                91.7       122.27");
    assert_eq!(lines[3], "GLM-4.5                89.6       119.46");
    assert!(lines[4].starts_with("new-model"));
}

#[test]
fn merge_json_output() {
    let dir = TempDir::new().unwrap();
    let a = write(dir.path(), "a.txt", "x 1 2\n");
    let b = write(dir.path(), "b.txt", "x 3 4\n");

    rubricforge(dir.path())
        .arg("merge")
        .arg(&a)
        .arg(&b)
        .args(["--format", "json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"name\": \"x\""))
        .stdout(predicate::str::contains("\"total\": 4.0"));
}

#[test]
fn merge_missing_table_fails() {
    let dir = TempDir::new().unwrap();
    rubricforge(dir.path())
        .arg("merge")
        .arg(dir.path().join("missing.txt"))
        .arg(dir.path().join("also-missing.txt"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to read score table"));
}

// --- validate and init ---

#[test]
fn validate_builtin_rubrics() {
    let dir = TempDir::new().unwrap();
    rubricforge(dir.path())
        .arg("validate")
        .assert()
        .success()
        .stdout(predicate::str::contains("需求分析评估报告 (5 dimensions, max 75)"))
        .stdout(predicate::str::contains("综合项目开发评估报告 (4 dimensions, max 40)"))
        .stdout(predicate::str::contains("All rubrics valid"));
}

#[test]
fn validate_reports_warnings() {
    let dir = TempDir::new().unwrap();
    let rubric = write(
        dir.path(),
        "custom.toml",
        r#"
[rubric]
title = "自定义评估"
fallback = "无需改进"

[[dimensions]]
key = "coverage"
name = "覆盖率"
max_score = 10.0

[dimensions.scoring]
strategy = "weighted-keyword"
criteria = [{ keyword = "登录", weight = 1.0 }]

[dimensions.advice]
missing = "建议补充"
"#,
    );

    rubricforge(dir.path())
        .arg("validate")
        .arg("--rubric")
        .arg(&rubric)
        .assert()
        .success()
        .stdout(predicate::str::contains("[coverage] WARNING"))
        .stdout(predicate::str::contains("1 warning(s) found"));
}

#[test]
fn validate_nonexistent_rubric() {
    let dir = TempDir::new().unwrap();
    rubricforge(dir.path())
        .args(["validate", "--rubric", "nonexistent.toml"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error"));
}

#[test]
fn init_creates_files() {
    let dir = TempDir::new().unwrap();

    rubricforge(dir.path())
        .current_dir(dir.path())
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("Created rubricforge.toml"))
        .stdout(predicate::str::contains("rubrics/bug.toml"));

    assert!(dir.path().join("rubricforge.toml").exists());
    assert!(dir.path().join("rubrics/requirement.toml").exists());

    // exported rubrics validate cleanly
    rubricforge(dir.path())
        .current_dir(dir.path())
        .args(["validate", "--rubric", "rubrics/requirement.toml"])
        .assert()
        .success()
        .stdout(predicate::str::contains("All rubrics valid"));
}

#[test]
fn init_skips_existing() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("rubricforge.toml"), "# mine").unwrap();

    rubricforge(dir.path())
        .current_dir(dir.path())
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("rubricforge.toml already exists"));

    assert_eq!(
        std::fs::read_to_string(dir.path().join("rubricforge.toml")).unwrap(),
        "# mine"
    );
}

#[test]
fn config_rubric_override_is_used() {
    let dir = TempDir::new().unwrap();
    write(
        dir.path(),
        "rubrics/mini.toml",
        r#"
[rubric]
domain = "requirement"
title = "迷你评估"
fallback = "无需改进"

[[dimensions]]
key = "login"
name = "登录功能"
max_score = 5.0

[dimensions.scoring]
strategy = "binary-equal-weight"
criteria = [{ keyword = "登录", weight = 1.0 }]
"#,
    );
    write(
        dir.path(),
        "rubricforge.toml",
        "[rubrics]\nrequirement = \"rubrics/mini.toml\"\n",
    );
    write(dir.path(), "需求说明.md", "支持登录");

    rubricforge(dir.path())
        .current_dir(dir.path())
        .args(["requirement", "需求说明.md", "mini.md"])
        .assert()
        .success()
        .stdout(predicate::str::contains("总分: 5/5"));

    let report = std::fs::read_to_string(dir.path().join("mini.md")).unwrap();
    assert!(report.starts_with("# 迷你评估\n"));
}
