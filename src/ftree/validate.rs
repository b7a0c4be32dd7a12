//! 结构对称性校验
//!
//! 未给定根时才执行：同一层的交换机必须有相同数量的上/下行端口组，
//! 每个端口组的端口数与该层参考交换机的第一个端口组相同。
//! 最深一层允许下行端口组（CA）数量不同。

use tracing::{debug, error};

use super::fabric::Fabric;
use super::port::{Direction, PortGroup};
use super::switch::FtreeSwitch;
use crate::error::{FtreeError, Result};

impl Fabric {
    pub(crate) fn validate_topology(&self) -> Result<()> {
        // 每层按 GUID 顺序的第一台交换机作为参考
        let mut per_rank: Vec<Option<&FtreeSwitch>> = vec![None; self.max_switch_rank as usize + 1];

        for sw in &self.switches {
            let reference = *per_rank[sw.rank as usize].get_or_insert(sw);
            let deepest = sw.rank == self.leaf_switch_rank;

            if sw.up_groups.len() != reference.up_groups.len() {
                return Err(self.asymmetry(reference, sw, Direction::Up, "port group count"));
            }
            if !deepest && sw.down_groups.len() != reference.down_groups.len() {
                return Err(self.asymmetry(reference, sw, Direction::Down, "port group count"));
            }
            if !same_width(&reference.up_groups, &sw.up_groups) {
                return Err(self.asymmetry(reference, sw, Direction::Up, "ports per group"));
            }
            if !deepest && !same_width(&reference.down_groups, &sw.down_groups) {
                return Err(self.asymmetry(reference, sw, Direction::Down, "ports per group"));
            }
        }
        debug!("fat-tree 结构校验通过");
        Ok(())
    }

    fn asymmetry(
        &self,
        reference: &FtreeSwitch,
        sw: &FtreeSwitch,
        dir: Direction,
        what: &str,
    ) -> FtreeError {
        error!(
            reference = %reference.guid,
            switch = %sw.guid,
            rank = sw.rank,
            ?dir,
            what,
            "同层交换机结构不一致"
        );
        FtreeError::NotAFatTree(format!(
            "different {what} ({dir:?}) on switches {} ({}) and {} ({}) at rank {}",
            reference.guid, reference.tuple, sw.guid, sw.tuple, sw.rank
        ))
    }
}

/// 每个端口组的端口数都等于参考交换机第一个端口组的端口数
fn same_width(reference: &[PortGroup], groups: &[PortGroup]) -> bool {
    let Some(expected) = reference.first().map(|g| g.ports.len()) else {
        return groups.is_empty();
    };
    groups.iter().all(|g| g.ports.len() == expected)
}
