//! Integration tests for the inventory projection
//!
//! These tests cover:
//! - Host naming and group layout
//! - Worker ordering
//! - Connection defaults
//! - JSON layout and parsing
//! - Property tests over arbitrary address lists

use kubelab::inventory::{
    project, worker_hostname, InventoryDocument, DEFAULT_ANSIBLE_USER, DEFAULT_PRIVATE_KEY_FILE,
    MASTER_HOSTNAME,
};
use pretty_assertions::assert_eq;
use proptest::prelude::*;
use serde_json::json;

// ============================================================================
// Projection Tests
// ============================================================================

#[test]
fn test_three_node_lab() {
    let doc = project("10.0.0.1", &["10.0.0.2", "10.0.0.3"]);

    assert_eq!(
        doc.to_value().unwrap(),
        json!({
            "all": {
                "vars": {
                    "ansible_user": "root",
                    "ansible_ssh_private_key_file": "~/.ssh/id_rsa"
                }
            },
            "masters": {
                "hosts": {
                    "k8s-master": {"ansible_host": "10.0.0.1"}
                }
            },
            "workers": {
                "hosts": {
                    "k8s-worker-1": {"ansible_host": "10.0.0.2"},
                    "k8s-worker-2": {"ansible_host": "10.0.0.3"}
                }
            }
        })
    );
}

#[test]
fn test_single_node_lab_has_empty_workers() {
    let doc = project::<String>("10.0.0.1", &[]);

    assert_eq!(doc.masters.host_count(), 1);
    assert_eq!(doc.workers.host_count(), 0);
    assert_eq!(doc.to_value().unwrap()["workers"], json!({"hosts": {}}));
}

#[test]
fn test_workers_keep_given_order() {
    let doc = project("10.0.0.1", &["10.0.0.9", "10.0.0.4", "10.0.0.7"]);

    let names: Vec<&str> = doc.workers.host_names().collect();
    assert_eq!(names, vec!["k8s-worker-1", "k8s-worker-2", "k8s-worker-3"]);
    assert_eq!(
        doc.worker_addresses(),
        vec!["10.0.0.9", "10.0.0.4", "10.0.0.7"]
    );
}

#[test]
fn test_empty_master_address_is_kept() {
    let doc = project::<&str>("", &[]);
    assert_eq!(doc.master_address(), Some(""));
}

#[test]
fn test_connection_defaults() {
    let doc = project::<&str>("10.0.0.1", &[]);
    assert_eq!(doc.all.vars.ansible_user, DEFAULT_ANSIBLE_USER);
    assert_eq!(
        doc.all.vars.ansible_ssh_private_key_file,
        DEFAULT_PRIVATE_KEY_FILE
    );
}

#[test]
fn test_worker_hostname_numbering() {
    assert_eq!(worker_hostname(1), "k8s-worker-1");
    assert_eq!(worker_hostname(12), "k8s-worker-12");
}

#[test]
fn test_group_order_in_json() {
    let text = project("1.1.1.1", &["2.2.2.2"]).to_json_pretty().unwrap();

    let all = text.find("\"all\"").unwrap();
    let masters = text.find("\"masters\"").unwrap();
    let workers = text.find("\"workers\"").unwrap();
    assert!(all < masters && masters < workers);
    assert!(text.starts_with("{\n  \"all\""));
}

#[test]
fn test_parse_published_inventory() {
    let text = r#"{
  "all": {"vars": {"ansible_user": "root", "ansible_ssh_private_key_file": "~/.ssh/id_rsa"}},
  "masters": {"hosts": {"k8s-master": {"ansible_host": "203.0.113.10"}}},
  "workers": {"hosts": {"k8s-worker-1": {"ansible_host": "203.0.113.11"}}}
}"#;

    let doc = InventoryDocument::from_json(text).unwrap();
    assert_eq!(doc.master_address(), Some("203.0.113.10"));
    assert_eq!(doc, project("203.0.113.10", &["203.0.113.11"]));
}

// ============================================================================
// Property Tests
// ============================================================================

fn ipv4() -> impl Strategy<Value = String> {
    (any::<u8>(), any::<u8>(), any::<u8>(), any::<u8>())
        .prop_map(|(a, b, c, d)| format!("{}.{}.{}.{}", a, b, c, d))
}

proptest! {
    #[test]
    fn prop_projection_shape(master in ipv4(), workers in prop::collection::vec(ipv4(), 0..8)) {
        let doc = project(&master, &workers);

        prop_assert_eq!(doc.masters.host_count(), 1);
        prop_assert_eq!(doc.master_address(), Some(master.as_str()));
        prop_assert_eq!(doc.workers.host_count(), workers.len());

        for (i, address) in workers.iter().enumerate() {
            let host = doc.workers.get(&worker_hostname(i + 1));
            prop_assert!(host.is_some());
            prop_assert_eq!(&host.unwrap().ansible_host, address);
        }
        prop_assert!(doc.masters.get(MASTER_HOSTNAME).is_some());
    }

    #[test]
    fn prop_published_text_parses_back(master in ipv4(), workers in prop::collection::vec(ipv4(), 0..8)) {
        let doc = project(&master, &workers);
        let parsed = InventoryDocument::from_json(&doc.to_json_pretty().unwrap()).unwrap();
        prop_assert_eq!(parsed, doc);
    }
}
