mod common;

use std::error::Error;
use std::fs;
use std::path::PathBuf;

use branchdag::config::{load_and_validate, load_from_path, parse_str};
use branchdag::dag::{DependencyResolver, TaskOutcome};
use branchdag::errors::BranchdagError;
use branchdag::types::{BranchDiscipline, Constraint};
use branchdag::{run_file, run_file_concurrent};
use tempfile::TempDir;

use common::{ExecutionLog, init_tracing, registry_with};

type TestResult = Result<(), Box<dyn Error>>;

const THRESHOLD: &str = r#"
[workflow]
name = "threshold"
max_in_flight = 2

[task.load]
params = { value = 42 }

[task.evaluate]
after = ["load"]
branches = { high = "process_high", low = "process_low" }
discipline = "exactly_one"
constraints = ["must_have_no_incoming_edges"]

[task.process_high]
func = "process"
params = { level = "high" }

[task.process_low]
func = "process"
params = { level = "low" }
"#;

fn write_config(dir: &TempDir, contents: &str) -> PathBuf {
    let path = dir.path().join("workflow.toml");
    fs::write(&path, contents).expect("write config");
    path
}

fn config_error(contents: &str) -> BranchdagError {
    let dir = TempDir::new().expect("tempdir");
    let path = write_config(&dir, contents);
    load_and_validate(&path).expect_err("config should be rejected")
}

#[test]
fn parses_sections_and_applies_defaults() -> TestResult {
    let raw = parse_str(THRESHOLD)?;
    assert_eq!(raw.workflow.name, "threshold");
    assert_eq!(raw.workflow.max_in_flight, 2);

    let evaluate = &raw.task["evaluate"];
    assert_eq!(evaluate.discipline, BranchDiscipline::ExactlyOne);
    assert_eq!(evaluate.constraints, vec![Constraint::MustHaveNoIncomingEdges]);
    assert_eq!(evaluate.effective_func("evaluate"), "evaluate");
    assert_eq!(raw.task["process_high"].effective_func("process_high"), "process");

    let minimal = parse_str("[task.only]\n")?;
    assert_eq!(minimal.workflow.name, "workflow");
    assert_eq!(minimal.workflow.max_in_flight, 1);
    assert_eq!(minimal.task["only"].discipline, BranchDiscipline::Free);
    Ok(())
}

#[test]
fn graph_from_file_is_ordered_by_task_id() -> TestResult {
    let dir = TempDir::new()?;
    let cfg = load_and_validate(write_config(&dir, THRESHOLD))?;
    let graph = cfg.to_graph()?;

    let ids: Vec<&str> = graph.tasks().map(|t| t.id.as_str()).collect();
    assert_eq!(ids, vec!["evaluate", "load", "process_high", "process_low"]);
    assert_eq!(cfg.runtime_options().max_in_flight, 2);

    let resolver = DependencyResolver::build(&graph);
    assert_eq!(resolver.initial_ready(), vec!["load"]);
    assert!(resolver.is_dynamic_only("process_low"));
    Ok(())
}

#[test]
fn run_file_follows_the_selected_branch() -> TestResult {
    init_tracing();
    let dir = TempDir::new()?;
    let path = write_config(&dir, THRESHOLD);
    let log = ExecutionLog::new();

    let registry = registry_with(&[
        (
            "load",
            branchdag::exec::body_fn(|ctx| Ok(ctx.param("value").cloned())),
        ),
        (
            "evaluate",
            branchdag::exec::branching_fn(|ctx| {
                let value = ctx.input("load").and_then(|v| v.as_integer()).unwrap_or(0);
                let label = if value > 10 { "high" } else { "low" };
                Ok(branchdag::engine::BranchSelection::one(label))
            }),
        ),
        ("process", log.recording()),
    ]);

    // evaluate declares must_have_no_incoming_edges but depends on load.
    let err = run_file(&path, registry.clone()).unwrap_err();
    assert!(matches!(
        err,
        BranchdagError::ConstraintViolation { ref task, .. } if task == "evaluate"
    ));

    let relaxed = THRESHOLD.replace("constraints = [\"must_have_no_incoming_edges\"]", "");
    let path = write_config(&dir, &relaxed);
    let report = run_file(&path, registry)?;

    assert_eq!(log.entries(), vec!["process_high"]);
    assert_eq!(report.status_of("process_high"), Some(TaskOutcome::Success));
    assert!(!report.ran("process_low"));
    Ok(())
}

#[tokio::test]
async fn run_file_concurrent_matches_the_synchronous_result() -> TestResult {
    init_tracing();
    let dir = TempDir::new()?;
    let path = write_config(
        &dir,
        r#"
[workflow]
max_in_flight = 3

[task.a]
func = "step"
[task.b]
func = "step"
[task.c]
func = "step"
[task.join]
func = "step"
after = ["a", "b", "c"]
"#,
    );
    let log = ExecutionLog::new();
    let registry = registry_with(&[("step", log.recording())]);

    let report = branchdag_test_utils::with_timeout(run_file_concurrent(&path, registry)).await?;

    assert_eq!(report.order.len(), 4);
    assert_eq!(report.order.last().map(String::as_str), Some("join"));
    assert!(report.succeeded());
    Ok(())
}

#[test]
fn missing_file_is_an_io_error() {
    let dir = TempDir::new().expect("tempdir");
    let err = load_from_path(dir.path().join("nope.toml")).unwrap_err();
    assert!(matches!(err, BranchdagError::IoError(_)));
}

#[test]
fn malformed_values_are_toml_errors() {
    assert!(matches!(
        parse_str("[task.a]\ndiscipline = \"sometimes\"\n"),
        Err(BranchdagError::TomlError(_))
    ));
    assert!(matches!(
        parse_str("[task.a]\nconstraints = [\"be_nice\"]\n"),
        Err(BranchdagError::TomlError(_))
    ));
    assert!(matches!(
        parse_str("[task.a\n"),
        Err(BranchdagError::TomlError(_))
    ));
}

#[test]
fn rejects_empty_workflow() {
    assert!(matches!(
        config_error("[workflow]\nname = \"empty\"\n"),
        BranchdagError::ConfigError(_)
    ));
}

#[test]
fn rejects_zero_max_in_flight() {
    assert!(matches!(
        config_error("[workflow]\nmax_in_flight = 0\n[task.a]\n"),
        BranchdagError::ConfigError(_)
    ));
}

#[test]
fn rejects_unknown_references() {
    assert!(matches!(
        config_error("[task.a]\nafter = [\"ghost\"]\n"),
        BranchdagError::ConfigError(msg) if msg.contains("ghost")
    ));
    assert!(matches!(
        config_error("[task.a]\nbranches = { go = \"ghost\" }\n"),
        BranchdagError::ConfigError(msg) if msg.contains("ghost")
    ));
}

#[test]
fn rejects_exactly_one_without_branches() {
    assert!(matches!(
        config_error("[task.a]\ndiscipline = \"exactly_one\"\n"),
        BranchdagError::ConfigError(msg) if msg.contains("exactly_one")
    ));
}

#[test]
fn rejects_self_references() {
    assert!(matches!(
        config_error("[task.a]\nafter = [\"a\"]\n"),
        BranchdagError::ConfigError(_)
    ));
    assert!(matches!(
        config_error("[task.a]\nbranches = { again = \"a\" }\n"),
        BranchdagError::ConfigError(_)
    ));
}

#[test]
fn rejects_malformed_identifiers() {
    assert!(matches!(
        config_error("[task.\"9lives\"]\n"),
        BranchdagError::ConfigError(_)
    ));
    assert!(matches!(
        config_error("[task.a]\nbranches = { \"no spaces\" = \"b\" }\n[task.b]\n"),
        BranchdagError::ConfigError(_)
    ));
}

#[test]
fn rejects_static_cycles() {
    let err = config_error(
        r#"
[task.a]
after = ["c"]
[task.b]
after = ["a"]
[task.c]
after = ["b"]
[task.d]
"#,
    );

    match err {
        BranchdagError::CycleOrDeadlock { pending } => assert_eq!(pending, vec!["a", "b", "c"]),
        other => panic!("expected CycleOrDeadlock, got {other:?}"),
    }
}
