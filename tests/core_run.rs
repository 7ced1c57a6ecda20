mod common;

use std::error::Error;

use branchdag::engine::report::result_key;
use branchdag::engine::{CoreRun, SharedContext};

use common::GraphBuilder;

type TestResult = Result<(), Box<dyn Error>>;

#[test]
fn completed_outputs_are_published_in_place() -> TestResult {
    let graph = GraphBuilder::new()
        .task("produce", &[])
        .task("consume", &["produce"])
        .build();
    let mut core = CoreRun::new(&graph, SharedContext::new());

    let dispatch = core.next_dispatch()?.expect("produce is ready");
    assert_eq!(dispatch.task, "produce");
    let before = core.outputs() as *const SharedContext;

    let step = core.complete(
        &dispatch.task,
        dispatch.ctx,
        Ok(Ok(Some(toml::Value::Integer(7)))),
    )?;

    assert!(std::ptr::eq(before, core.outputs()));
    assert_eq!(step.newly_ready, vec!["consume"]);
    assert_eq!(
        core.outputs().get(&result_key("produce")),
        Some(&toml::Value::Integer(7))
    );
    assert_eq!(core.outputs().get("produce"), Some(&toml::Value::Integer(7)));
    Ok(())
}

#[test]
fn contexts_still_in_flight_keep_their_snapshot() -> TestResult {
    let graph = GraphBuilder::new().task("a", &[]).task("b", &[]).build();
    let mut core = CoreRun::new(&graph, SharedContext::new());

    let first = core.next_dispatch()?.expect("a is ready");
    let second = core.next_dispatch()?.expect("b is ready");

    core.complete(&first.task, first.ctx, Ok(Ok(Some(toml::Value::Integer(1)))))?;

    assert_eq!(core.outputs().get("a"), Some(&toml::Value::Integer(1)));
    assert!(second.ctx.input("a").is_none());
    Ok(())
}
