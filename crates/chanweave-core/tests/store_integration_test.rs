//! Integration tests for the graph store
//!
//! Every test drives the public store API against a real file backend in a
//! temporary directory and checks the graph invariants after each step.

use std::sync::Arc;

use chanweave_core::api::{
    ConnectPin, CreateChannel, CreateNode, DeleteChannel, DeleteNode, DisconnectPin,
};
use chanweave_core::backend::{FileBackend, Persistence};
use chanweave_core::{ErrorCode, Graph, GraphStore, PartRegistry, Request};
use rstest::rstest;
use serde_json::json;
use tempfile::TempDir;

const KEY: &str = "demo.json";

fn setup() -> (TempDir, GraphStore) {
    let dir = TempDir::new().unwrap();
    let backend = Arc::new(FileBackend::new(dir.path()));
    let store = GraphStore::new(PartRegistry::builtin(), backend);
    (dir, store)
}

fn producer(name: &str) -> CreateNode {
    CreateNode::new(
        name,
        "Code",
        json!({
            "body": "for i := 0; i < 3; i++ {\n\tout <- i\n}",
            "pins": [{"name": "out", "type": "int", "direction": "output"}]
        }),
    )
}

fn consumer(name: &str) -> CreateNode {
    CreateNode::new(
        name,
        "Code",
        json!({
            "imports": ["fmt"],
            "body": "for v := range in {\n\tfmt.Println(v)\n}",
            "pins": [{"name": "in", "type": "int", "direction": "input"}]
        }),
    )
}

fn channel(name: &str, ty: &str, n1: &str, p1: &str, n2: &str, p2: &str) -> CreateChannel {
    CreateChannel {
        name: name.into(),
        ty: ty.into(),
        capacity: 0,
        anonymous: false,
        node1: n1.into(),
        pin1: p1.into(),
        node2: n2.into(),
        pin2: p2.into(),
    }
}

async fn assert_consistent(store: &GraphStore) {
    let problems = store.read(KEY, |g| g.check_consistency()).await.unwrap();
    assert!(problems.is_empty(), "inconsistent graph: {:?}", problems);
}

/// Every remaining channel has two or more pins with both directions present
async fn assert_channels_viable(store: &GraphStore) {
    store
        .read(KEY, |g| {
            for ch in g.channels() {
                assert!(ch.pins.len() >= 2, "channel {} has {} pins", ch.name, ch.pins.len());
                let dirs: Vec<_> = ch
                    .pins
                    .iter()
                    .map(|p| g.pin_definition(p).unwrap().direction)
                    .collect();
                assert!(dirs.contains(&chanweave_core::Direction::Input));
                assert!(dirs.contains(&chanweave_core::Direction::Output));
            }
        })
        .await
        .unwrap();
}

async fn scenario_a(store: &GraphStore) {
    store
        .create_graph(KEY, Graph::new("demo", "example.com/demo", true))
        .await
        .unwrap();
    store.create_node(KEY, producer("A")).await.unwrap();
    store.create_node(KEY, consumer("B")).await.unwrap();
    store
        .create_channel(KEY, channel("c", "int", "A", "out", "B", "in"))
        .await
        .unwrap();
    assert_consistent(store).await;
}

// =============================================================================
// Node Creation
// =============================================================================

#[rstest]
#[case("Code", json!({"pins": [{"name": "x", "type": "int", "direction": "input"}]}))]
#[case("Broadcast", json!({"type": "string", "outputs": 4}))]
#[case("Join", json!({"type": "string", "inputs": 3}))]
#[case("Filter", json!({"type": "int", "predicate": "v%2 == 0"}))]
#[case("Sink", json!({}))]
#[case("HTTPServer", json!({"addr": ":9000"}))]
#[tokio::test]
async fn test_created_nodes_start_unbound(#[case] part_type: &str, #[case] part: serde_json::Value) {
    let (_dir, store) = setup();
    store
        .create_graph(KEY, Graph::new("g", "g", false))
        .await
        .unwrap();
    store
        .create_node(KEY, CreateNode::new("N", part_type, part))
        .await
        .unwrap();

    store
        .read(KEY, |g| {
            let node = g.node("N").unwrap();
            assert_eq!(node.connections.len(), node.part.pins().len());
            assert!(node.connections.values().all(Option::is_none));
        })
        .await
        .unwrap();
    assert_consistent(&store).await;
}

#[tokio::test]
async fn test_duplicate_node_keeps_first() {
    let (_dir, store) = setup();
    store
        .create_graph(KEY, Graph::new("g", "g", false))
        .await
        .unwrap();
    store.create_node(KEY, producer("A")).await.unwrap();
    let err = store.create_node(KEY, consumer("A")).await.unwrap_err();
    assert_eq!(err.code(), ErrorCode::FailedPrecondition);

    store
        .read(KEY, |g| {
            assert_eq!(g.node_count(), 1);
            assert!(g.node("A").unwrap().connections.contains_key("out"));
        })
        .await
        .unwrap();
}

// =============================================================================
// Channels
// =============================================================================

#[tokio::test]
async fn test_channel_named_nil_is_rejected() {
    let (_dir, store) = setup();
    store
        .create_graph(KEY, Graph::new("demo", "example.com/demo", true))
        .await
        .unwrap();
    store.create_node(KEY, producer("A")).await.unwrap();
    store.create_node(KEY, consumer("B")).await.unwrap();
    let before = store.snapshot(KEY).await.unwrap();

    let err = store
        .create_channel(KEY, channel("nil", "int", "A", "out", "B", "in"))
        .await
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::InvalidArgument);
    assert_eq!(store.snapshot(KEY).await.unwrap(), before);
}

#[tokio::test]
async fn test_type_mismatch_changes_nothing() {
    let (_dir, store) = setup();
    scenario_a(&store).await;
    store
        .create_node(
            KEY,
            CreateNode::new(
                "S",
                "Code",
                json!({"pins": [{"name": "in", "type": "string", "direction": "input"}]}),
            ),
        )
        .await
        .unwrap();
    let before = store.snapshot(KEY).await.unwrap();

    let err = store
        .connect_pin(
            KEY,
            ConnectPin {
                node: "S".into(),
                pin: "in".into(),
                channel: "c".into(),
            },
        )
        .await
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::FailedPrecondition);

    let after = store.snapshot(KEY).await.unwrap();
    assert_eq!(after, before);
    assert_eq!(after.node("S").unwrap().binding("in"), None);
    assert_eq!(after.channel("c").unwrap().pins.len(), 2);
}

#[tokio::test]
async fn test_delete_node_cascades_channel() {
    let (_dir, store) = setup();
    scenario_a(&store).await;
    store
        .delete_node(KEY, DeleteNode { node: "A".into() })
        .await
        .unwrap();

    store
        .read(KEY, |g| {
            assert!(g.channel("c").is_none());
            assert_eq!(g.node("B").unwrap().connections.get("in"), Some(&None));
        })
        .await
        .unwrap();
    assert_consistent(&store).await;
}

#[tokio::test]
async fn test_cascades_keep_channels_viable() {
    let (_dir, store) = setup();
    scenario_a(&store).await;
    store.create_node(KEY, producer("A2")).await.unwrap();
    store.create_node(KEY, consumer("B2")).await.unwrap();
    for (node, pin) in [("A2", "out"), ("B2", "in")] {
        store
            .connect_pin(
                KEY,
                ConnectPin {
                    node: node.into(),
                    pin: pin.into(),
                    channel: "c".into(),
                },
            )
            .await
            .unwrap();
    }
    store.create_node(KEY, producer("P")).await.unwrap();
    store.create_node(KEY, consumer("Q")).await.unwrap();
    store
        .create_channel(KEY, channel("d", "int", "P", "out", "Q", "in"))
        .await
        .unwrap();

    // c loses both writers one at a time; d loses its only reader
    store
        .disconnect_pin(
            KEY,
            DisconnectPin {
                node: "A".into(),
                pin: "out".into(),
            },
        )
        .await
        .unwrap();
    assert_channels_viable(&store).await;
    assert!(store.read(KEY, |g| g.channel("c").is_some()).await.unwrap());

    store
        .delete_node(KEY, DeleteNode { node: "A2".into() })
        .await
        .unwrap();
    assert_channels_viable(&store).await;
    assert!(store.read(KEY, |g| g.channel("c").is_none()).await.unwrap());

    store
        .delete_node(KEY, DeleteNode { node: "Q".into() })
        .await
        .unwrap();
    assert_channels_viable(&store).await;
    assert_eq!(store.read(KEY, |g| g.channel_count()).await.unwrap(), 0);

    let err = store
        .delete_channel(KEY, DeleteChannel { channel: "d".into() })
        .await
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::NotFound);
    assert_consistent(&store).await;
}

// =============================================================================
// Persistence
// =============================================================================

#[tokio::test]
async fn test_saved_graph_reloads_identically() {
    let (dir, store) = setup();
    scenario_a(&store).await;
    store
        .create_node(KEY, CreateNode::new("Idle", "Sink", json!({"type": "int"})))
        .await
        .unwrap();
    store.save(KEY).await.unwrap();
    let saved = store.unload(KEY).await.unwrap();
    assert!(store.graph_keys().await.is_empty());

    let backend = FileBackend::new(dir.path());
    assert!(backend.exists(KEY).await.unwrap());
    let text = String::from_utf8(backend.read(KEY).await.unwrap()).unwrap();
    assert!(text.contains("\"input\": \"nil\""));

    store.load(KEY).await.unwrap();
    assert_eq!(store.snapshot(KEY).await.unwrap(), saved);
}

#[tokio::test]
async fn test_load_rejects_corrupt_file() {
    let (dir, store) = setup();
    std::fs::write(
        dir.path().join(KEY),
        json!({
            "name": "bad",
            "nodes": {"S": {"part_type": "Sink", "connections": {"input": "c"}}},
            "channels": {"c": {"type": "interface{}", "cap": 0}}
        })
        .to_string(),
    )
    .unwrap();
    let err = store.load(KEY).await.unwrap_err();
    assert_eq!(err.code(), ErrorCode::FailedPrecondition);
    assert!(store.graph_keys().await.is_empty());
}

#[tokio::test]
async fn test_request_stream() {
    let (dir, store) = setup();
    store
        .create_graph(KEY, Graph::new("demo", "example.com/demo", true))
        .await
        .unwrap();
    let lines = [
        json!({"op": "CreateNode", "name": "Gen", "part_type": "Code",
               "part": {"pins": [{"name": "out", "type": "int", "direction": "output"}]}}),
        json!({"op": "CreateNode", "name": "Drop", "part_type": "Sink", "part": {"type": "int"}}),
        json!({"op": "CreateChannel", "name": "nums", "type": "int", "cap": 4,
               "node1": "Gen", "pin1": "out", "node2": "Drop", "pin2": "input"}),
        json!({"op": "SetPosition", "node": "Drop", "x": 120, "y": 80}),
        json!({"op": "Save"}),
    ];
    for line in lines {
        let req: Request = serde_json::from_value(line).unwrap();
        store.apply(KEY, req).await.unwrap();
        assert_consistent(&store).await;
    }
    let saved: serde_json::Value =
        serde_json::from_slice(&std::fs::read(dir.path().join(KEY)).unwrap()).unwrap();
    assert_eq!(saved["channels"]["nums"]["cap"], 4);
    assert_eq!(saved["nodes"]["Drop"]["x"], 120);
}

// =============================================================================
// Concurrency
// =============================================================================

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_mutations_on_one_graph() {
    let (_dir, store) = setup();
    let store = Arc::new(store);
    store
        .create_graph(KEY, Graph::new("busy", "busy", false))
        .await
        .unwrap();

    let mut tasks = Vec::new();
    for i in 0..16 {
        let store = store.clone();
        tasks.push(tokio::spawn(async move {
            let a = format!("A{}", i);
            let b = format!("B{}", i);
            store.create_node(KEY, producer(&a)).await.unwrap();
            store.create_node(KEY, consumer(&b)).await.unwrap();
            store
                .create_channel(KEY, channel(&format!("c{}", i), "int", &a, "out", &b, "in"))
                .await
                .unwrap();
            if i % 2 == 0 {
                store.delete_node(KEY, DeleteNode { node: a }).await.unwrap();
            }
        }));
    }
    for task in futures::future::join_all(tasks).await {
        task.unwrap();
    }

    assert_consistent(&store).await;
    let (nodes, channels) = store
        .read(KEY, |g| (g.node_count(), g.channel_count()))
        .await
        .unwrap();
    assert_eq!(nodes, 24);
    assert_eq!(channels, 8);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_independent_graphs() {
    let (_dir, store) = setup();
    let store = Arc::new(store);
    let keys: Vec<String> = (0..4).map(|i| format!("g{}.json", i)).collect();
    for key in &keys {
        store
            .create_graph(key, Graph::new(key.as_str(), "g", false))
            .await
            .unwrap();
    }

    let tasks = keys.iter().cloned().map(|key| {
        let store = store.clone();
        tokio::spawn(async move {
            for n in 0..10 {
                store
                    .create_node(&key, CreateNode::new(format!("S{}", n), "Sink", json!({})))
                    .await
                    .unwrap();
            }
            store.save(&key).await.unwrap();
        })
    });
    for task in futures::future::join_all(tasks).await {
        task.unwrap();
    }

    assert_eq!(store.graph_keys().await, keys);
    for key in &keys {
        assert_eq!(store.read(key, |g| g.node_count()).await.unwrap(), 10);
    }
}
