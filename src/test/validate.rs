use crate::config::RoutingOptions;
use crate::error::FtreeError;
use crate::ftree::Fabric;
use crate::test::fixtures::{ca_port_lid, fat_tree, two_level, walk, with_roots};

#[test]
fn symmetric_trees_pass() {
    let (subnet, _topo) = two_level(4, 3, 5, 2);
    Fabric::build(&subnet, RoutingOptions::default()).expect("two-level");
    let (subnet, _topo) = fat_tree(6);
    Fabric::build(&subnet, RoutingOptions::default()).expect("k=6 fat-tree");
}

#[test]
fn uneven_host_counts_are_allowed_on_leaves() {
    let (mut subnet, topo) = two_level(2, 2, 3, 1);
    subnet
        .set_link_healthy(topo.leaves[1], 1, false)
        .expect("drop host link");
    Fabric::build(&subnet, RoutingOptions::default()).expect("leaf asymmetry is fine");
}

#[test]
fn extra_parallel_link_breaks_symmetry() {
    let (mut subnet, topo) = two_level(2, 2, 2, 1);
    subnet
        .connect(topo.leaves[0], 5, topo.spines[0], 5)
        .expect("extra link");

    let err = Fabric::build(&subnet, RoutingOptions::default()).expect_err("asymmetric");
    assert!(matches!(err, FtreeError::NotAFatTree(_)));

    // 给定根时不做结构校验
    Fabric::build(&subnet, with_roots(&topo.spines)).expect("roots skip validation");
}

#[test]
fn missing_uplink_breaks_symmetry() {
    let (mut subnet, topo) = two_level(2, 2, 2, 1);
    subnet
        .set_link_healthy(topo.leaves[1], 4, false)
        .expect("drop uplink");
    let err = Fabric::build(&subnet, RoutingOptions::default()).expect_err("asymmetric");
    assert!(matches!(err, FtreeError::NotAFatTree(_)));
}

#[test]
fn degraded_tree_still_routes_with_roots() {
    let (mut subnet, topo) = two_level(2, 2, 2, 1);
    subnet
        .set_link_healthy(topo.leaves[1], 4, false)
        .expect("drop uplink");
    let outcome = crate::ftree::route(&subnet, with_roots(&topo.spines)).expect("route");

    for leaf in 0..2 {
        for host in 0..2 {
            let lid = ca_port_lid(&subnet, topo.host(leaf, host), 1);
            for &start in topo.leaves.iter().chain(&topo.spines[..1]) {
                assert!(
                    walk(&subnet, &outcome.tables, start, lid).is_some(),
                    "{start} cannot reach {lid}"
                );
            }
        }
    }
}
