use crate::error::{FtreeError, TopologyViolation};
use crate::subnet::{Guid, Lid, NodeKind, Subnet};
use crate::test::fixtures::two_level;

#[test]
fn json_preserves_generated_subnet() {
    let (subnet, _topo) = two_level(2, 2, 2, 1);
    let raw = subnet.to_json_string().expect("serialize subnet");
    assert!(raw.contains("\"schema_version\": 1"));
    let loaded = Subnet::from_json_str(&raw).expect("load subnet");
    assert_eq!(loaded, subnet);
}

#[test]
fn one_sided_link_is_rejected() {
    let raw = r#"
{
    "schema_version": 1,
    "nodes": [
        {
            "guid": "0x10",
            "kind": "switch",
            "base_lid": 1,
            "num_ports": 3,
            "ports": {
                "1": { "port_guid": "0x10", "base_lid": 1, "remote": { "node": "0x20", "port": 1 } }
            }
        },
        { "guid": "0x20", "kind": "ca", "num_ports": 1, "ports": {} }
    ]
}
"#;
    let err = Subnet::from_json_str(raw).expect_err("dangling link");
    assert!(matches!(
        err,
        FtreeError::IllegalTopology(TopologyViolation::DanglingLink { node: Guid(0x10), port: 1 })
    ));
}

#[test]
fn unknown_node_kind_deserializes_as_unknown() {
    let raw = r#"{ "schema_version": 1, "nodes": [ { "guid": "7", "kind": "gateway", "num_ports": 1 } ] }"#;
    let subnet = Subnet::from_json_str(raw).expect("load subnet");
    assert_eq!(subnet.node(Guid(7)).map(|n| n.kind), Some(NodeKind::Unknown));
}

#[test]
fn unhealthy_link_hides_remote_on_both_ends() {
    let mut subnet = Subnet::new();
    subnet.add_switch(Guid(1), Lid(1), 4, "a");
    subnet.add_switch(Guid(2), Lid(2), 4, "b");
    subnet.connect(Guid(1), 1, Guid(2), 3).expect("connect");
    assert!(subnet.remote_of(Guid(1), 1).is_some());

    subnet.set_link_healthy(Guid(2), 3, false).expect("mark unhealthy");
    assert!(subnet.remote_of(Guid(1), 1).is_none());
    assert!(subnet.remote_of(Guid(2), 3).is_none());
    assert_eq!(subnet.node(Guid(1)).map(|n| n.linked_ports().count()), Some(0));
}

#[test]
fn connect_requires_both_nodes() {
    let mut subnet = Subnet::new();
    subnet.add_switch(Guid(1), Lid(1), 4, "a");
    assert!(subnet.connect(Guid(1), 1, Guid(9), 1).is_err());
    assert!(subnet.node(Guid(1)).and_then(|n| n.port(1)).is_none());
}
