mod common;

use std::collections::{BTreeSet, HashSet};

use branchdag::dag::resolver::dynamic_only_closure;
use branchdag::dag::{DependencyResolver, TaskGraph};
use branchdag::engine::Orchestrator;
use branchdag::errors::BranchdagError;
use proptest::prelude::*;

use common::{ExecutionLog, GraphBuilder, TaskSpecBuilder, recording_registry};

/// Raw shape of a generated graph: per task, candidate dep indices and
/// candidate spawn target indices.
type RawShape = Vec<(Vec<usize>, Vec<usize>)>;

fn raw_shape_strategy(max_tasks: usize) -> impl Strategy<Value = RawShape> {
    (1..=max_tasks).prop_flat_map(|num_tasks| {
        proptest::collection::vec(
            (
                proptest::collection::vec(any::<usize>(), 0..3),
                proptest::collection::vec(any::<usize>(), 0..2),
            ),
            num_tasks,
        )
    })
}

/// Build an acyclic graph: task `i` may only depend on tasks `0..i`, and may
/// spawn any other task.
fn graph_from_shape(shape: &RawShape) -> TaskGraph {
    let n = shape.len();
    let mut builder = GraphBuilder::new();

    for (i, (deps, spawns)) in shape.iter().enumerate() {
        let mut task = TaskSpecBuilder::new(&format!("t{i}"));

        if i > 0 {
            let unique: BTreeSet<usize> = deps.iter().map(|d| d % i).collect();
            for dep in unique {
                task = task.after(&format!("t{dep}"));
            }
        }

        for (k, target) in spawns.iter().enumerate() {
            let target = target % n;
            if target != i {
                task = task.branch(&format!("b{k}"), &format!("t{target}"));
            }
        }

        builder = builder.with_task(task.build());
    }

    builder.build()
}

/// Same graph with the branch edges of one activator removed.
fn without_spawns_of(graph: &TaskGraph, id: &str) -> TaskGraph {
    let specs = graph
        .tasks()
        .cloned()
        .map(|mut t| {
            if t.id == id {
                t.dynamic_spawns.clear();
            }
            t
        })
        .collect();
    TaskGraph::new(specs).expect("removing spawns keeps the graph valid")
}

proptest! {
    #[test]
    fn initial_ready_is_roots_minus_dynamic_only(shape in raw_shape_strategy(12)) {
        let graph = graph_from_shape(&shape);
        let resolver = DependencyResolver::build(&graph);
        let closure = dynamic_only_closure(&graph);

        let expected: HashSet<String> = graph
            .tasks()
            .filter(|t| t.deps.is_empty() && !closure.contains(&t.id))
            .map(|t| t.id.clone())
            .collect();
        let actual: HashSet<String> = resolver.initial_ready().into_iter().collect();

        prop_assert_eq!(actual, expected);
    }

    #[test]
    fn closure_contains_every_spawn_target(shape in raw_shape_strategy(12)) {
        let graph = graph_from_shape(&shape);
        let closure = dynamic_only_closure(&graph);

        for task in graph.tasks() {
            for target in task.dynamic_spawns.values() {
                prop_assert!(closure.contains(target));
            }
        }
    }

    #[test]
    fn closure_is_a_fixed_point(shape in raw_shape_strategy(12)) {
        let graph = graph_from_shape(&shape);
        let closure = dynamic_only_closure(&graph);

        // Re-applying the growth rule adds nothing.
        for task in graph.tasks() {
            if !task.deps.is_empty() && task.deps.iter().all(|d| closure.contains(d)) {
                prop_assert!(closure.contains(&task.id));
            }
        }
        prop_assert_eq!(dynamic_only_closure(&graph), closure);
    }

    #[test]
    fn closure_is_monotone_in_spawn_edges(shape in raw_shape_strategy(12), pick in any::<usize>()) {
        let graph = graph_from_shape(&shape);
        let ids: Vec<String> = graph.tasks().map(|t| t.id.clone()).collect();
        let victim = &ids[pick % ids.len()];

        let smaller = dynamic_only_closure(&without_spawns_of(&graph, victim));
        let full = dynamic_only_closure(&graph);

        prop_assert!(smaller.is_subset(&full));
    }

    #[test]
    fn activators_selecting_nothing_never_run_dynamic_only_tasks(
        shape in raw_shape_strategy(10)
    ) {
        let graph = graph_from_shape(&shape);
        let resolver = DependencyResolver::build(&graph);
        let log = ExecutionLog::new();
        let registry = recording_registry(&graph, &log, &[]);

        let result = Orchestrator::new(registry).run(&graph);

        for id in log.entries() {
            prop_assert!(!resolver.is_dynamic_only(&id));
        }

        match result {
            Ok(report) => {
                for task in graph.tasks() {
                    prop_assert_eq!(report.ran(&task.id), !resolver.is_dynamic_only(&task.id));
                }
                prop_assert!(report.succeeded());
            }
            // A static task waiting on a branch that never ran.
            Err(BranchdagError::CycleOrDeadlock { pending }) => {
                prop_assert!(!pending.is_empty());
                for id in pending.iter() {
                    prop_assert!(!resolver.is_dynamic_only(id));
                }
            }
            Err(other) => prop_assert!(false, "unexpected error: {}", other),
        }
    }
}
