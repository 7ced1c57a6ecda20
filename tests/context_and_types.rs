mod common;

use std::sync::Arc;

use branchdag::engine::{BranchSelection, ExecutionContext, SharedContext};
use branchdag::errors::BranchdagError;
use branchdag::exec::{FunctionRegistry, noop};
use branchdag::logging::{parse_level_str, resolve_level};
use branchdag::types::{BranchDiscipline, Constraint};
use tracing::Level;

use common::TaskSpecBuilder;

fn activator_context() -> ExecutionContext {
    let spec = TaskSpecBuilder::new("E")
        .name("evaluate")
        .branch("low", "B")
        .branch("high", "A")
        .param("threshold", 10_i64)
        .exactly_one()
        .build();
    let mut outputs = SharedContext::new();
    outputs.insert("load".to_string(), toml::Value::Integer(3));
    ExecutionContext::new(&spec, Arc::new(outputs))
}

#[test]
fn context_exposes_task_inputs() {
    let ctx = activator_context();

    assert_eq!(ctx.task_id(), "E");
    assert_eq!(ctx.task_name(), "evaluate");
    assert_eq!(ctx.param("threshold"), Some(&toml::Value::Integer(10)));
    assert_eq!(ctx.input("load"), Some(&toml::Value::Integer(3)));
    assert!(ctx.input("missing").is_none());
    assert!(ctx.is_activator());
    assert_eq!(ctx.discipline(), BranchDiscipline::ExactlyOne);
    assert_eq!(ctx.branch_labels().collect::<Vec<_>>(), vec!["high", "low"]);
}

#[test]
fn register_branch_records_known_labels_in_order() {
    let mut ctx = activator_context();

    ctx.register_branch("low").expect("known label");
    ctx.register_branches(["high", "low"]).expect("known labels");

    assert_eq!(ctx.registered(), &["low", "high", "low"]);
}

#[test]
fn register_branch_rejects_unknown_labels() {
    let mut ctx = activator_context();

    let err = ctx.register_branch("sideways").unwrap_err();
    assert!(matches!(
        err,
        BranchdagError::UnknownBranch { ref task, ref label } if task == "E" && label == "sideways"
    ));

    // Stops at the first unknown label.
    let err = ctx.register_branches(["low", "nope", "high"]).unwrap_err();
    assert!(matches!(err, BranchdagError::UnknownBranch { .. }));
    assert_eq!(ctx.registered(), &["low"]);
}

#[test]
fn plain_task_has_no_branches() {
    let spec = TaskSpecBuilder::new("plain").build();
    let mut ctx = ExecutionContext::new(&spec, Arc::new(SharedContext::new()));

    assert!(!ctx.is_activator());
    assert!(ctx.register_branch("any").is_err());
}

#[test]
fn branch_selection_labels() {
    assert!(BranchSelection::NoBranches.labels().is_empty());
    assert_eq!(BranchSelection::one("a").labels(), vec!["a"]);
    assert_eq!(BranchSelection::many(["b", "a"]).labels(), vec!["b", "a"]);
}

#[test]
fn discipline_parsing_and_acceptance() {
    assert_eq!("free".parse::<BranchDiscipline>(), Ok(BranchDiscipline::Free));
    assert_eq!(
        "Exactly-One".parse::<BranchDiscipline>(),
        Ok(BranchDiscipline::ExactlyOne)
    );
    assert!("some".parse::<BranchDiscipline>().is_err());
    assert_eq!(BranchDiscipline::default(), BranchDiscipline::Free);
    assert_eq!(BranchDiscipline::ExactlyOne.to_string(), "exactly_one");

    assert!(BranchDiscipline::Free.accepts(0));
    assert!(BranchDiscipline::Free.accepts(3));
    assert!(BranchDiscipline::ExactlyOne.accepts(1));
    assert!(!BranchDiscipline::ExactlyOne.accepts(0));
    assert!(!BranchDiscipline::ExactlyOne.accepts(2));
}

#[test]
fn constraint_parsing_accepts_short_names() {
    assert_eq!("static".parse::<Constraint>(), Ok(Constraint::MustBeStatic));
    assert_eq!(
        "no_outgoing".parse::<Constraint>(),
        Ok(Constraint::MustHaveNoOutgoingEdges)
    );
    assert_eq!(
        "must_have_no_incoming_edges".parse::<Constraint>(),
        Ok(Constraint::MustHaveNoIncomingEdges)
    );
    assert!("be_nice".parse::<Constraint>().is_err());
    assert_eq!(
        Constraint::MustHaveNoOutgoingEdges.to_string(),
        "must_have_no_outgoing_edges"
    );
}

#[test]
fn registry_compares_bodies_by_identity() {
    let mut registry = FunctionRegistry::new();
    let body = noop();

    registry.register("b", body.clone()).expect("first registration");
    registry.register("b", body).expect("same body again");
    registry.register("a", noop()).expect("other key");

    assert!(matches!(
        registry.register("a", noop()),
        Err(BranchdagError::DuplicateRegistration(_))
    ));
    assert_eq!(registry.keys(), vec!["a", "b"]);
    assert!(matches!(
        registry.get("c"),
        Err(BranchdagError::UnregisteredFunction(ref key)) if key == "c"
    ));
}

#[test]
fn log_level_resolution_order() {
    assert_eq!(resolve_level(Some(Level::WARN), Some("trace")), Level::WARN);
    assert_eq!(resolve_level(None, Some("debug")), Level::DEBUG);
    assert_eq!(resolve_level(None, Some("loud")), Level::INFO);
    assert_eq!(resolve_level(None, None), Level::INFO);

    assert_eq!(parse_level_str(" Warning "), Some(Level::WARN));
    assert_eq!(parse_level_str(""), None);
}
