//! Destroy undoes recorded operations, dependents first.

mod support;

use support::cluster::{index_of, node, TestCluster};

#[tokio::test]
async fn destroy_leaves_before_deleting_and_purges_last() {
    let cluster = TestCluster::new();
    cluster.orchestrator.up(3).await.unwrap();
    let first = cluster.fake.executed().len();

    let report = cluster.orchestrator.destroy().await.unwrap();

    assert!(report.is_complete(), "{:?}", report.failed);
    let commands = cluster.executed_since(first);
    for worker in [node(1), node(2)] {
        let leave = index_of(&commands, &format!("exec {worker} -- sudo microk8s leave"));
        let delete = index_of(&commands, &format!("multipass delete {worker}"));
        assert!(leave < delete, "{commands:#?}");
    }
    let purge = index_of(&commands, "multipass purge");
    assert!(commands[..purge]
        .iter()
        .any(|command| command.contains(&format!("multipass delete {}", node(0)))));
    assert!(commands[purge..].iter().all(|command| command == "multipass purge"));

    assert!(cluster.fake.vms().is_empty());
    assert!(cluster.store.snapshot().is_empty());
    assert!(cluster.store.snapshot().outputs.is_empty());
}

#[tokio::test]
async fn up_purges_before_creating() {
    let cluster = TestCluster::new();
    cluster.orchestrator.up(2).await.unwrap();

    let commands = cluster.fake.executed();
    for index in 0..2 {
        let purge = index_of(&commands, &format!("delete --purge {}", node(index)));
        let launch = index_of(&commands, &format!("-n {} ", node(index)));
        assert!(purge < launch);
    }
}

#[tokio::test]
async fn destroy_of_empty_state_does_nothing() {
    let cluster = TestCluster::new();
    let report = cluster.orchestrator.destroy().await.unwrap();

    assert!(report.is_complete());
    assert!(report.deleted.is_empty());
    assert!(cluster.fake.executed().is_empty());
}

#[tokio::test]
async fn up_after_destroy_forms_a_fresh_cluster() {
    let cluster = TestCluster::new();
    cluster.orchestrator.up(2).await.unwrap();
    cluster.orchestrator.destroy().await.unwrap();

    let report = cluster.orchestrator.up(2).await.unwrap();

    assert!(report.is_success(), "failures: {:?}", report.failures);
    assert_eq!(cluster.fake.tokens_issued().len(), 2);
    assert!(cluster.fake.is_joined(&node(1)));
}
