use crate::config::RoutingOptions;
use crate::error::{FtreeError, TopologyViolation};
use crate::ftree::Fabric;
use crate::subnet::{Guid, Lid};
use crate::test::fixtures::{fat_tree, two_level, with_roots};

fn rank_of(fabric: &Fabric, guid: Guid) -> u8 {
    fabric.switch_by_guid(guid).expect("switch").rank
}

#[test]
fn ranks_inferred_from_cas_on_two_levels() {
    let (subnet, topo) = two_level(2, 2, 2, 1);
    let fabric = Fabric::build(&subnet, RoutingOptions::default()).expect("build fabric");

    for &spine in &topo.spines {
        assert_eq!(rank_of(&fabric, spine), 0);
    }
    for &leaf in &topo.leaves {
        assert_eq!(rank_of(&fabric, leaf), 1);
        assert!(fabric.switch_by_guid(leaf).expect("leaf").is_leaf);
    }
    assert_eq!(fabric.max_switch_rank(), 1);
    assert_eq!(fabric.leaf_switch_rank(), 1);
    assert_eq!(fabric.tree_rank(), 2);
}

#[test]
fn ranks_inferred_from_cas_on_three_levels() {
    let (subnet, topo) = fat_tree(4);
    let fabric = Fabric::build(&subnet, RoutingOptions::default()).expect("build fabric");

    assert!(topo.core_switches.iter().all(|&g| rank_of(&fabric, g) == 0));
    assert!(topo.agg_switches.iter().all(|&g| rank_of(&fabric, g) == 1));
    assert!(topo.edge_switches.iter().all(|&g| rank_of(&fabric, g) == 2));
    assert_eq!(fabric.tree_rank(), 3);
}

#[test]
fn ranks_from_given_roots_match_inferred_ranks() {
    let (subnet, topo) = fat_tree(4);
    let inferred = Fabric::build(&subnet, RoutingOptions::default()).expect("inferred");
    let rooted = Fabric::build(&subnet, with_roots(&topo.core_switches)).expect("rooted");

    for (a, b) in inferred.switches().iter().zip(rooted.switches()) {
        assert_eq!(a.guid, b.guid);
        assert_eq!(a.rank, b.rank);
        assert_eq!(a.tuple, b.tuple);
    }
}

#[test]
fn unknown_roots_are_ignored_when_one_is_valid() {
    let (subnet, topo) = two_level(2, 2, 2, 1);
    let roots = [Guid(0xbad), topo.spines[0], topo.spines[1]];
    let fabric = Fabric::build(&subnet, with_roots(&roots)).expect("build fabric");
    assert_eq!(rank_of(&fabric, topo.spines[0]), 0);
    assert_eq!(rank_of(&fabric, topo.leaves[0]), 1);
}

#[test]
fn no_valid_roots_is_an_error() {
    let (subnet, _topo) = two_level(2, 2, 2, 1);
    let err = Fabric::build(&subnet, with_roots(&[Guid(0xbad)])).expect_err("no roots");
    assert!(matches!(err, FtreeError::NoValidRoots));
}

#[test]
fn same_rank_link_is_inconsistent() {
    let (mut subnet, topo) = two_level(2, 2, 2, 1);
    subnet
        .connect(topo.leaves[0], 9, topo.leaves[1], 9)
        .expect("leaf-leaf link");
    let err = Fabric::build(&subnet, with_roots(&topo.spines)).expect_err("leaf-leaf");
    assert!(matches!(
        err,
        FtreeError::IllegalTopology(TopologyViolation::RankInconsistency {
            local_rank: 1,
            remote_rank: 1,
            ..
        })
    ));
}

#[test]
fn compute_node_on_root_mismatches_leaf_rank() {
    let (mut subnet, topo) = two_level(2, 2, 2, 1);
    let stray = Guid(0x0002_c903_0000_1000);
    subnet.add_ca(stray, 1, "stray");
    subnet
        .add_ca_port(stray, 1, Guid(stray.0 + 1), Lid(100))
        .expect("ca port");
    subnet.connect(stray, 1, topo.spines[0], 9).expect("link");

    let err = Fabric::build(&subnet, with_roots(&topo.spines)).expect_err("stray cn");
    match err {
        FtreeError::LeafRankMismatch {
            port_guid,
            switch,
            rank,
            leaf_rank,
        } => {
            assert_eq!(port_guid, Guid(stray.0 + 1));
            assert_eq!(switch, topo.spines[0]);
            assert_eq!(rank, 0);
            assert_eq!(leaf_rank, 1);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn leaf_as_root_gives_too_shallow_tree() {
    let (subnet, topo) = two_level(2, 2, 2, 1);
    let err = Fabric::build(&subnet, with_roots(&[topo.leaves[0]])).expect_err("shallow");
    assert!(matches!(
        err,
        FtreeError::TreeRankOutOfBounds { rank: 1, .. }
    ));
}

#[test]
fn disconnected_switch_cannot_be_ranked() {
    let (mut subnet, _topo) = two_level(2, 2, 2, 1);
    subnet.add_switch(Guid(0x9000), Lid(90), 8, "island");
    let err = Fabric::build(&subnet, RoutingOptions::default()).expect_err("island");
    assert!(matches!(
        err,
        FtreeError::IllegalTopology(TopologyViolation::UnrankedSwitch(Guid(0x9000)))
    ));
}
