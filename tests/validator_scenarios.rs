//! Validator scenarios against an in-memory store and commit DAG.
//!
//! Each test builds a small repository state by hand and checks the
//! classification, the store side effects, and the graph invariants.

use trellis::core::ancestry::CommitGraph;
use trellis::core::graph::{BranchGraph, ValidationStatus};
use trellis::core::metadata::{BranchMetadata, InMemoryMetadataStore, MetadataStore, PrInfo, PrState};
use trellis::core::types::{BranchName, Oid};
use trellis::core::verify::{verify_ancestry, verify_graph};
use trellis::engine::{validate, CacheSeed, RepairKind, ValidateError, Validation};

// =============================================================================
// Fixtures
// =============================================================================

fn name(s: &str) -> BranchName {
    BranchName::new(s).unwrap()
}

/// `r0`, `r1`, ... as distinct full-length object ids.
fn r(n: u32) -> Oid {
    Oid::new(format!("{:040x}", 0xa000 + n)).unwrap()
}

/// r0 <- r1, r0 <- r2, r0 <- r3 <- r4, and r5 on its own root.
fn history() -> CommitGraph {
    let mut dag = CommitGraph::new();
    dag.add_commit(r(0), &[]);
    dag.add_commit(r(1), &[r(0)]);
    dag.add_commit(r(2), &[r(0)]);
    dag.add_commit(r(3), &[r(0)]);
    dag.add_commit(r(4), &[r(3)]);
    dag.add_commit(r(5), &[]);
    dag
}

fn on(parent: &str, revision: Oid) -> BranchMetadata {
    BranchMetadata::default().with_parent(&name(parent), &revision)
}

/// Seed over `branches`, with a metadata name for each stored entry.
fn seed(branches: &[(&str, Oid)], store: &InMemoryMetadataStore) -> CacheSeed {
    let mut seed = CacheSeed::new(name("main"));
    for (branch, revision) in branches {
        seed = seed.with_branch(name(branch), revision.clone());
    }
    for stored in store.names() {
        seed = seed.with_metadata_name(stored);
    }
    seed
}

fn assert_invariants(graph: &BranchGraph, seed: &CacheSeed, dag: &CommitGraph) {
    let structural = verify_graph(graph, &seed.branch_names());
    assert!(structural.ok, "structural: {:?}", structural.errors);
    let ancestry = verify_ancestry(graph, dag).unwrap();
    assert!(ancestry.ok, "ancestry: {:?}", ancestry.errors);
}

// =============================================================================
// Scenarios
// =============================================================================

#[test]
fn scenario_1_valid_link() {
    let dag = history();
    let mut store = InMemoryMetadataStore::new();
    store.insert(name("a"), on("main", r(0)));
    let seed = seed(&[("main", r(0)), ("a", r(1))], &store);

    let Validation { graph, report } = validate(&seed, &mut store, &dag).unwrap();

    let a = graph.get(&name("a")).unwrap();
    assert_eq!(a.status(), ValidationStatus::Valid);
    assert_eq!(a.parent_branch_name(), Some(&name("main")));
    assert_eq!(a.parent_branch_revision(), Some(&r(0)));
    assert_eq!(graph.children(&name("main")), &[name("a")]);
    assert!(report.repaired.is_empty());
    assert_eq!(store.writes(), 0);
    assert_invariants(&graph, &seed, &dag);
}

#[test]
fn scenario_2_missing_parent_name() {
    let dag = history();
    let mut store = InMemoryMetadataStore::new();
    store.insert(
        name("b"),
        BranchMetadata {
            parent_branch_name: Some(String::new()),
            ..Default::default()
        },
    );
    let seed = seed(&[("main", r(0)), ("b", r(2))], &store);

    let graph = validate(&seed, &mut store, &dag).unwrap().graph;

    assert_eq!(graph.status(&name("b")), Some(ValidationStatus::BadParentName));
    assert!(graph.children(&name("main")).is_empty());
    assert_invariants(&graph, &seed, &dag);
}

#[test]
fn scenario_2_absent_parent_name() {
    let dag = history();
    let mut store = InMemoryMetadataStore::new();
    store.insert(name("b"), BranchMetadata::default());
    let seed = seed(&[("main", r(0)), ("b", r(2))], &store);

    let graph = validate(&seed, &mut store, &dag).unwrap().graph;
    assert_eq!(graph.status(&name("b")), Some(ValidationStatus::BadParentName));
}

#[test]
fn scenario_3_fast_forward_repair() {
    let dag = history();
    let mut store = InMemoryMetadataStore::new();
    store.insert(name("c"), on("main", r(0)));
    let seed = seed(&[("main", r(3)), ("c", r(4))], &store);

    let Validation { graph, report } = validate(&seed, &mut store, &dag).unwrap();

    let c = graph.get(&name("c")).unwrap();
    assert_eq!(c.status(), ValidationStatus::Valid);
    assert_eq!(c.parent_branch_revision(), Some(&r(3)));
    assert_eq!(store.writes(), 1);
    assert_eq!(report.repaired.len(), 1);
    assert_eq!(report.repaired[0].kind, RepairKind::FastForward);
    assert_eq!(report.repaired[0].from, Some(r(0)));

    let stored = store.read(&name("c")).unwrap().unwrap();
    assert_eq!(stored.parent_revision(), Some(r(3)));
    assert_eq!(stored.parent_branch_name.as_deref(), Some("main"));
    assert_invariants(&graph, &seed, &dag);
}

#[test]
fn scenario_4_bad_parent_revision() {
    let dag = history();
    let mut store = InMemoryMetadataStore::new();
    store.insert(name("d"), on("main", r(0)));
    let seed = seed(&[("main", r(3)), ("d", r(5))], &store);

    let graph = validate(&seed, &mut store, &dag).unwrap().graph;

    let d = graph.get(&name("d")).unwrap();
    assert_eq!(d.status(), ValidationStatus::BadParentRevision);
    assert_eq!(d.parent_branch_name(), Some(&name("main")));
    assert_eq!(d.parent_branch_revision(), None);
    assert_eq!(graph.children(&name("main")), &[name("d")]);
    assert_eq!(store.writes(), 0);
    assert_eq!(store.read(&name("d")).unwrap(), Some(on("main", r(0))));
    assert_invariants(&graph, &seed, &dag);
}

#[test]
fn scenario_5_two_cycle_is_fatal() {
    let dag = history();
    let mut store = InMemoryMetadataStore::new();
    store.insert(name("e"), on("f", r(2)));
    store.insert(name("f"), on("e", r(1)));
    let seed = seed(&[("main", r(0)), ("e", r(1)), ("f", r(2))], &store);

    let err = validate(&seed, &mut store, &dag).unwrap_err();

    assert_eq!(err.to_string(), "cycle detected in branch metadata");
    match err {
        ValidateError::CycleDetected { unresolved } => {
            assert_eq!(unresolved, vec![name("e"), name("f")]);
        }
        other => panic!("expected a cycle, got {other:?}"),
    }
    assert_eq!(store.writes(), 0);
}

#[test]
fn scenario_6_orphaned_metadata_is_deleted() {
    let dag = history();
    let mut store = InMemoryMetadataStore::new();
    store.insert(name("a"), on("main", r(0)));
    store.insert(name("g"), on("main", r(0)));
    let seed = seed(&[("main", r(0)), ("a", r(1))], &store);

    let Validation { graph, report } = validate(&seed, &mut store, &dag).unwrap();

    assert!(!store.contains(&name("g")));
    assert!(graph.get(&name("g")).is_none());
    assert_eq!(report.pruned, vec![name("g")]);
    assert_eq!(graph.len(), 2);
    assert_invariants(&graph, &seed, &dag);
}

// =============================================================================
// Beyond the basic scenarios
// =============================================================================

#[test]
fn invalidity_propagates_down_a_stack() {
    let mut dag = history();
    dag.add_commit(r(6), &[r(5)]);
    dag.add_commit(r(7), &[r(6)]);

    let mut store = InMemoryMetadataStore::new();
    store.insert(name("d"), on("main", r(0)));
    store.insert(name("d2"), on("d", r(5)));
    store.insert(name("d3"), on("d2", r(6)));
    let seed = seed(
        &[("d3", r(7)), ("d2", r(6)), ("d", r(5)), ("main", r(3))],
        &store,
    );

    let graph = validate(&seed, &mut store, &dag).unwrap().graph;

    assert_eq!(graph.status(&name("d")), Some(ValidationStatus::BadParentRevision));
    let d2 = graph.get(&name("d2")).unwrap();
    assert_eq!(d2.status(), ValidationStatus::InvalidParent);
    assert_eq!(d2.parent_branch_revision(), Some(&r(5)));
    assert_eq!(graph.status(&name("d3")), Some(ValidationStatus::InvalidParent));
    assert_eq!(graph.children(&name("d")), &[name("d2")]);
    assert_eq!(graph.children(&name("d2")), &[name("d3")]);
    assert_eq!(store.writes(), 0);
    assert_invariants(&graph, &seed, &dag);
}

#[test]
fn pr_info_passes_through_every_status() {
    let dag = history();
    let pr = |n: u64| PrInfo {
        number: Some(n),
        state: Some(PrState::Open),
        ..Default::default()
    };

    let mut store = InMemoryMetadataStore::new();
    store.insert(name("valid"), on("main", r(3)).with_pr_info(Some(pr(1))));
    store.insert(name("orphan"), on("ghost", r(0)).with_pr_info(Some(pr(2))));
    store.insert(name("bad-rev"), on("main", r(0)).with_pr_info(Some(pr(3))));
    store.insert(name("invalid"), on("orphan", r(2)).with_pr_info(Some(pr(4))));
    let seed = seed(
        &[
            ("main", r(3)),
            ("valid", r(4)),
            ("orphan", r(2)),
            ("bad-rev", r(5)),
            ("invalid", r(1)),
        ],
        &store,
    );

    let graph = validate(&seed, &mut store, &dag).unwrap().graph;

    for (branch, number, status) in [
        ("valid", 1, ValidationStatus::Valid),
        ("orphan", 2, ValidationStatus::BadParentName),
        ("bad-rev", 3, ValidationStatus::BadParentRevision),
        ("invalid", 4, ValidationStatus::InvalidParent),
    ] {
        let record = graph.get(&name(branch)).unwrap();
        assert_eq!(record.status(), status, "{branch}");
        assert_eq!(record.pr_info(), Some(&pr(number)), "{branch}");
    }
    assert_eq!(graph.pr_info(&name("main")), None);
}

#[test]
fn repaired_state_is_stable() {
    let dag = history();
    let mut store = InMemoryMetadataStore::new();
    store.insert(name("c"), on("main", r(0)));
    store.insert(name("x"), BranchMetadata {
        parent_branch_name: Some("main".into()),
        parent_branch_revision: Some("not-a-sha".into()),
        pr_info: None,
    });
    let seed = seed(&[("main", r(3)), ("c", r(4)), ("x", r(4))], &store);

    let first = validate(&seed, &mut store, &dag).unwrap();
    assert_eq!(store.writes(), 2);
    let relinked = first
        .report
        .repaired
        .iter()
        .find(|repair| repair.branch == name("x"))
        .unwrap();
    assert_eq!(relinked.kind, RepairKind::Relink);
    assert_eq!(relinked.from, None);

    store.reset_counters();
    let second = validate(&seed, &mut store, &dag).unwrap();
    assert_eq!(store.writes(), 0);
    assert_eq!(store.deletes(), 0);
    assert!(second.report.is_clean());
    assert_eq!(first.graph, second.graph);
}

#[test]
fn trunk_missing_from_seed_leaves_children_unparented() {
    let dag = history();
    let mut store = InMemoryMetadataStore::new();
    store.insert(name("a"), on("main", r(0)));
    let seed = seed(&[("a", r(1))], &store);

    let graph = validate(&seed, &mut store, &dag).unwrap().graph;
    assert_eq!(graph.status(&name("a")), Some(ValidationStatus::BadParentName));
    assert!(graph.get(&name("main")).is_none());
}
