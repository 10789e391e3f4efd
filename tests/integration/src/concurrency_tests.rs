//! One reconciler shared by several threads

use std::sync::Arc;
use std::thread;

use serde_json::json;

use confsync_client::MemoryStore;
use confsync_core::{ClientSet, ConfigNode, Reconciler, ReconcilerOptions, WriteMode};
use confsync_test_utils::fixtures::device_tree;
use confsync_value::get;

const DEVICES: [&str; 8] = ["ce0", "ce1", "ce2", "ce3", "ce4", "ce5", "ce6", "ce7"];

fn run_parallel_creates(write_mode: WriteMode) {
    let store = Arc::new(MemoryStore::from_tree(device_tree(&DEVICES)));
    let reconciler = Reconciler::new(
        ClientSet::single(store.clone()),
        ReconcilerOptions {
            write_mode,
            ..ReconcilerOptions::default()
        },
    );

    thread::scope(|scope| {
        for device in DEVICES {
            let reconciler = &reconciler;
            scope.spawn(move || {
                let plan = ConfigNode::new(device)
                    .with_path("svc")
                    .with_attribute("owner", device);
                let state = reconciler.create(&plan).unwrap();
                assert_eq!(reconciler.read(&state).unwrap(), state);
            });
        }
    });

    let tree = store.tree();
    for device in DEVICES {
        let expr = format!(r#"tailf-ncs:devices.device.#(name=="{}").config.svc.owner"#, device);
        assert_eq!(get(&tree, &expr), Some(&json!(device)), "{device}");
    }
}

#[test]
fn test_parallel_sequential_creates() {
    run_parallel_creates(WriteMode::Sequential);
}

#[test]
fn test_parallel_yang_patch_creates() {
    run_parallel_creates(WriteMode::YangPatch);
}
