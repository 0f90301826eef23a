//! End-to-end generation tests
//!
//! Graphs are built through the store, generated under its lock and checked
//! for the wiring the Go program relies on.

use std::sync::Arc;

use chanweave_codegen::{Generator, GeneratorOptions};
use chanweave_core::api::{ConnectPin, CreateChannel, CreateNode, SetNodeProperties};
use chanweave_core::backend::MemoryBackend;
use chanweave_core::{Graph, GraphStore, PartRegistry};
use serde_json::json;

const KEY: &str = "pipeline.json";

fn generator() -> Generator {
    Generator::new(GeneratorOptions {
        format: false,
        ..Default::default()
    })
}

async fn store(is_command: bool) -> GraphStore {
    let store = GraphStore::new(PartRegistry::builtin(), Arc::new(MemoryBackend::new()));
    store
        .create_graph(
            KEY,
            Graph::new("pipeline", "example.com/pipes/pipeline", is_command),
        )
        .await
        .unwrap();
    store
}

fn producer(name: &str) -> CreateNode {
    CreateNode::new(
        name,
        "Code",
        json!({
            "body": "out <- instanceNumber",
            "pins": [{"name": "out", "type": "int", "direction": "output"}]
        }),
    )
}

fn channel(name: &str, n1: &str, p1: &str, n2: &str, p2: &str) -> CreateChannel {
    CreateChannel {
        name: name.into(),
        ty: "int".into(),
        capacity: 4,
        anonymous: false,
        node1: n1.into(),
        pin1: p1.into(),
        node2: n2.into(),
        pin2: p2.into(),
    }
}

#[tokio::test]
async fn test_fan_in_merges_private_writers() {
    let store = store(true).await;
    store.create_node(KEY, producer("A")).await.unwrap();
    store.create_node(KEY, producer("B")).await.unwrap();
    store
        .create_node(KEY, CreateNode::new("Drain", "Sink", json!({"type": "int"})))
        .await
        .unwrap();
    store
        .create_channel(KEY, channel("nums", "A", "out", "Drain", "input"))
        .await
        .unwrap();
    store
        .connect_pin(
            KEY,
            ConnectPin {
                node: "B".into(),
                pin: "out".into(),
                channel: "nums".into(),
            },
        )
        .await
        .unwrap();

    let pkg = generator().generate_stored(&store, KEY).await.unwrap();
    let src = pkg.source();

    assert!(src.contains("\tchan_nums := make(chan int, 4)\n"));
    assert!(src.contains("\tchan_nums_w0 := make(chan int, 4)\n"));
    assert!(src.contains("\tchan_nums_w1 := make(chan int, 4)\n"));
    assert!(src.contains("range []chan int{chan_nums_w0, chan_nums_w1} {"));
    assert!(src.contains("\t\t\t\t\tchan_nums <- v\n"));
    assert!(src.contains("\t\tclose(chan_nums)\n"));
    assert!(src.contains("node_A(chan_nums_w0)"));
    assert!(src.contains("node_B(chan_nums_w1)"));
    assert!(src.contains("node_Drain(chan_nums)"));
    // each writer still closes only its own output
    assert_eq!(src.matches("\tclose(out)\n").count(), 2);
}

#[tokio::test]
async fn test_fire_and_forget_nodes() {
    let store = store(true).await;
    let mut server = CreateNode::new("Web", "HTTPServer", json!({"addr": ":9090"}));
    server.wait = false;
    store.create_node(KEY, server).await.unwrap();
    store
        .create_node(KEY, CreateNode::new("Drop", "Sink", json!({"type": "*HTTPRequest"})))
        .await
        .unwrap();
    store
        .create_channel(
            KEY,
            CreateChannel {
                ty: "*HTTPRequest".into(),
                ..channel("reqs", "Web", "requests", "Drop", "input")
            },
        )
        .await
        .unwrap();

    let pkg = generator().generate_stored(&store, KEY).await.unwrap();
    let src = pkg.source();

    assert!(src.contains("\tgo node_Web(chan_reqs)\n"));
    assert!(src.contains("\t\tnode_Drop(chan_reqs)\n"));
    assert_eq!(src.matches("nodeWG.Add(1)").count(), 1);
    assert_eq!(pkg.diagnostics.len(), 1);
    assert!(pkg.diagnostics[0].contains("Web"));

    // support code and imports from the HTTP server
    assert_eq!(src.matches("type HTTPRequest struct").count(), 1);
    assert!(src.contains("\t\"log\"\n\t\"net/http\"\n\t\"sync\"\n"));
    assert!(src.contains("Addr: \":9090\""));
}

#[tokio::test]
async fn test_disabled_nodes_are_left_out() {
    let store = store(true).await;
    store.create_node(KEY, producer("A")).await.unwrap();
    store
        .create_node(KEY, CreateNode::new("Drain", "Sink", json!({"type": "int"})))
        .await
        .unwrap();
    store
        .create_channel(KEY, channel("nums", "A", "out", "Drain", "input"))
        .await
        .unwrap();
    store
        .set_node_properties(
            KEY,
            SetNodeProperties {
                node: "Drain".into(),
                name: "Drain".into(),
                enabled: false,
                wait: true,
                multiplicity: 1,
                part_type: "Sink".into(),
                part: json!({"type": "int"}),
                x: 0,
                y: 0,
            },
        )
        .await
        .unwrap();

    let pkg = generator().generate_stored(&store, KEY).await.unwrap();
    let src = pkg.source();

    assert!(!src.contains("node_Drain"));
    assert!(!src.contains("chan_nums"));
    assert!(src.contains("\t\tnode_A(nil)\n"));
    assert!(!src.contains("close(out)"));
}

#[tokio::test]
async fn test_multiplicity_and_partial_broadcast() {
    let store = store(true).await;
    let mut gen_req = producer("Gen");
    gen_req.multiplicity = 4;
    store.create_node(KEY, gen_req).await.unwrap();
    store
        .create_node(
            KEY,
            CreateNode::new("Fan", "Broadcast", json!({"type": "int", "outputs": 3})),
        )
        .await
        .unwrap();
    store
        .create_node(KEY, CreateNode::new("Drain", "Sink", json!({"type": "int"})))
        .await
        .unwrap();
    store
        .create_channel(KEY, channel("in", "Gen", "out", "Fan", "input"))
        .await
        .unwrap();
    store
        .create_channel(KEY, channel("copy", "Fan", "output1", "Drain", "input"))
        .await
        .unwrap();

    let pkg = generator().generate_stored(&store, KEY).await.unwrap();
    let src = pkg.source();

    assert!(src.contains("\tmultiplicity := 4\n"));
    assert!(src.contains("func node_Fan(input <-chan int, output0 chan<- int, output1 chan<- int, output2 chan<- int) {"));
    assert!(src.contains("node_Fan(chan_in, nil, chan_copy, nil)"));
    assert!(src.contains("output1 <- v"));
    assert!(!src.contains("output0 <- v"));
    assert!(src.contains("\tclose(output1)\n"));
    assert!(!src.contains("close(output0)"));
}

#[tokio::test]
async fn test_library_package_from_store() {
    let store = store(false).await;
    store.create_node(KEY, producer("A")).await.unwrap();
    store
        .create_node(KEY, CreateNode::new("Drain", "Sink", json!({"type": "int"})))
        .await
        .unwrap();
    store
        .create_channel(KEY, channel("nums", "A", "out", "Drain", "input"))
        .await
        .unwrap();

    let first = generator().generate_stored(&store, KEY).await.unwrap();
    let second = generator().generate_stored(&store, KEY).await.unwrap();
    assert_eq!(first.files, second.files);
    assert_eq!(first.hash, second.hash);

    assert!(first.files.contains_key("pipeline.go"));
    assert!(first.files["run/main.go"].contains("\"example.com/pipes/pipeline\""));

    let dir = tempfile::tempdir().unwrap();
    let written = chanweave_codegen::Toolchain::default()
        .write_package(dir.path(), &first)
        .await
        .unwrap();
    assert_eq!(written.len(), 3);
    assert!(dir.path().join("run/main.go").exists());
}

#[tokio::test]
async fn test_generating_unknown_graph_fails() {
    let store = store(true).await;
    let err = generator()
        .generate_stored(&store, "missing.json")
        .await
        .unwrap_err();
    assert!(matches!(err, chanweave_codegen::Error::Graph(_)));
}
