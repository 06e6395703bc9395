//! Re-running `up` converges instead of repeating work.

mod support;

use clusterforge::domain::JoinState;
use clusterforge::testkit::multipass::FakeMultipass;
use support::cluster::{node, TestCluster};

#[tokio::test]
async fn rerun_on_formed_cluster_runs_nothing() {
    let cluster = TestCluster::new();
    cluster.orchestrator.up(2).await.unwrap();
    let first = cluster.fake.executed().len();
    let recorded = cluster.store.snapshot().operations.len();

    let report = cluster.orchestrator.up(2).await.unwrap();

    assert!(report.is_success());
    assert_eq!(report.joined(), 1);
    assert!(cluster.executed_since(first).is_empty());
    assert_eq!(cluster.store.snapshot().operations.len(), recorded);
    assert_eq!(cluster.fake.tokens_issued().len(), 1);
    assert_eq!(cluster.fake.hosts(&node(1)).len(), 2);
    assert!(report.outputs.cluster_credential.is_some());
}

#[tokio::test]
async fn failed_join_is_retried_with_a_fresh_token() {
    let fake = FakeMultipass::new().fail_join(&node(1));
    let cluster = TestCluster::with_fake(fake);

    let report = cluster.orchestrator.up(2).await.unwrap();
    assert_eq!(report.nodes[1].join, Some(JoinState::JoinFailed));
    let first = cluster.fake.executed().len();

    cluster.fake.heal();
    let report = cluster.orchestrator.up(2).await.unwrap();

    assert!(report.is_success(), "failures: {:?}", report.failures);
    let rerun = cluster.executed_since(first);
    assert_eq!(rerun.len(), 2, "{rerun:#?}");
    assert!(rerun[0].contains("microk8s add-node"));
    assert!(rerun[1].contains("microk8s join"));

    let tokens = cluster.fake.tokens_issued();
    assert_eq!(tokens.len(), 2);
    assert_ne!(tokens[0], tokens[1]);
    assert!(rerun[1].ends_with(tokens[1].as_str()));
}

#[tokio::test]
async fn unresolved_address_is_retried_after_the_vm_reports_one() {
    let fake = FakeMultipass::new().with_info_payload(&node(1), r#"{"errors": [], "info": {}}"#);
    let cluster = TestCluster::with_fake(fake);

    let report = cluster.orchestrator.up(3).await.unwrap();
    assert!(!report.is_success());
    assert!(!cluster.store.snapshot().contains(&format!("{}GetIp", node(1))));
    let first = cluster.fake.executed().len();

    cluster.fake.heal();
    let report = cluster.orchestrator.up(3).await.unwrap();

    assert!(report.is_success(), "failures: {:?}", report.failures);
    let rerun = cluster.executed_since(first);
    assert!(
        rerun.iter().any(|command| command.contains(&format!("info {}", node(1)))),
        "{rerun:#?}"
    );
    assert!(rerun.iter().all(|command| !command.contains("launch")));
    assert_eq!(report.nodes[1].join, Some(JoinState::Joined));
    assert!(cluster.fake.is_joined(&node(1)));
    for target in 0..3 {
        assert_eq!(cluster.fake.hosts(&node(target)).len(), 3, "{}", node(target));
    }
}

#[tokio::test]
async fn growing_the_cluster_only_adds_the_new_node() {
    let cluster = TestCluster::new();
    cluster.orchestrator.up(2).await.unwrap();
    let first = cluster.fake.executed().len();

    let report = cluster.orchestrator.up(3).await.unwrap();

    assert!(report.is_success(), "failures: {:?}", report.failures);
    let rerun = cluster.executed_since(first);
    assert!(rerun.iter().all(|command| !command.contains(&format!("launch -m 8G -n {}", node(1)))));
    assert_eq!(
        rerun.iter().filter(|command| command.contains("launch")).count(),
        1
    );
    // node2 gets three entries, nodes 0 and 1 get node2's entry.
    assert_eq!(
        rerun.iter().filter(|command| command.contains("/etc/hosts")).count(),
        5
    );
    assert_eq!(cluster.fake.hosts(&node(0)).len(), 3);
    assert!(cluster.fake.is_joined(&node(2)));
}

#[tokio::test]
async fn outputs_survive_in_state() {
    let cluster = TestCluster::new();
    let report = cluster.orchestrator.up(1).await.unwrap();

    let outputs = cluster.orchestrator.outputs().await.unwrap();
    assert_eq!(outputs, report.outputs);
    assert_eq!(outputs.master_address, cluster.fake.address(&node(0)));
}
