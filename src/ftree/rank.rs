//! 交换机分层
//!
//! 给定根交换机时从根 BFS；否则从连接 CA 的交换机反向 BFS，再翻转为"到根的距离"。
//! BFS 只在 rank 变小时重新入队，因此必然终止，且结果是到最近起点的最短距离。

use std::collections::VecDeque;

use tracing::{debug, info, warn};

use super::fabric::{Fabric, MAX_TREE_RANK, MIN_TREE_RANK};
use super::port::SwitchId;
use crate::error::{FtreeError, Result, TopologyViolation};
use crate::subnet::{Guid, NodeKind, Subnet};

impl Fabric {
    pub(crate) fn rank_switches(&mut self, subnet: &Subnet) -> Result<()> {
        let ranks = match self.options.roots.clone() {
            Some(roots) => self.rank_from_roots(subnet, &roots)?,
            None => self.rank_from_hcas(subnet)?,
        };
        self.commit_ranks(&ranks)?;
        info!(max_switch_rank = self.max_switch_rank, "交换机分层完成");
        Ok(())
    }

    fn rank_from_roots(&self, subnet: &Subnet, roots: &[Guid]) -> Result<Vec<Option<u32>>> {
        let mut ranks = vec![None; self.switches.len()];
        let mut queue = VecDeque::new();
        for guid in roots {
            match self.sw_by_guid.get(guid) {
                Some(&id) => {
                    if update_rank(&mut ranks, id, 0) {
                        queue.push_back(id);
                    }
                }
                None => warn!(guid = %guid, "根交换机不在拓扑中，忽略"),
            }
        }
        if queue.is_empty() {
            return Err(FtreeError::NoValidRoots);
        }
        debug!(roots = queue.len(), "有效根交换机");

        self.bfs_rank(subnet, &mut ranks, queue);
        Ok(ranks)
    }

    fn rank_from_hcas(&self, subnet: &Subnet) -> Result<Vec<Option<u32>>> {
        let mut ranks = vec![None; self.switches.len()];
        let mut queue = VecDeque::new();
        for hca in &self.hcas {
            let Some(node) = subnet.node(hca.guid) else {
                continue;
            };
            for (_, _, remote) in node.linked_ports() {
                let Some(remote_node) = subnet.node(remote.node) else {
                    continue;
                };
                match remote_node.kind {
                    NodeKind::Switch => {
                        let Some(&id) = self.sw_by_guid.get(&remote_node.guid) else {
                            continue;
                        };
                        if update_rank(&mut ranks, id, 0) {
                            debug!(ca = %hca.guid, switch = %remote_node.guid, "叶子交换机");
                            queue.push_back(id);
                        }
                    }
                    NodeKind::Router => {}
                    NodeKind::Ca => {
                        return Err(TopologyViolation::CaToCa {
                            local: hca.guid,
                            remote: remote_node.guid,
                        }
                        .into());
                    }
                    NodeKind::Unknown => {
                        return Err(FtreeError::UnrecognizedNodeType {
                            guid: remote_node.guid,
                        });
                    }
                }
            }
        }

        self.bfs_rank(subnet, &mut ranks, queue);

        // 到叶子的距离 -> 到根的距离
        let max = ranks.iter().flatten().copied().max().unwrap_or(0);
        for rank in ranks.iter_mut().flatten() {
            *rank = max - *rank;
        }
        Ok(ranks)
    }

    /// 只沿交换机-交换机链路扩展
    fn bfs_rank(&self, subnet: &Subnet, ranks: &mut [Option<u32>], mut queue: VecDeque<SwitchId>) {
        while let Some(id) = queue.pop_front() {
            let Some(current) = ranks[id.0] else {
                continue;
            };
            let guid = self.switches[id.0].guid;
            let Some(node) = subnet.node(guid) else {
                continue;
            };
            for (_, _, remote) in node.linked_ports() {
                if remote.node == guid {
                    continue;
                }
                let Some(&next) = self.sw_by_guid.get(&remote.node) else {
                    continue;
                };
                if update_rank(ranks, next, current + 1) {
                    queue.push_back(next);
                }
            }
        }
    }

    fn commit_ranks(&mut self, ranks: &[Option<u32>]) -> Result<()> {
        let mut max = 0u8;
        for (sw, rank) in self.switches.iter_mut().zip(ranks) {
            let Some(rank) = *rank else {
                return Err(TopologyViolation::UnrankedSwitch(sw.guid).into());
            };
            let rank = u8::try_from(rank).map_err(|_| FtreeError::TreeRankOutOfBounds {
                rank: rank.saturating_add(1),
                min: MIN_TREE_RANK,
                max: MAX_TREE_RANK,
            })?;
            sw.rank = rank;
            max = max.max(rank);
        }
        self.max_switch_rank = max;
        Ok(())
    }

    /// 叶子层：给定根时取第一个计算节点所连交换机的 rank，否则取最大 rank
    pub(crate) fn set_leaf_rank(&mut self) -> Result<()> {
        self.leaf_switch_rank = if self.options.roots_provided() {
            self.hcas
                .iter()
                .filter(|hca| hca.cn_num > 0)
                .find_map(|hca| hca.up_groups.iter().find(|g| g.is_cn))
                .and_then(|g| g.remote_switch())
                .map(|sw| self.switches[sw.0].rank)
                .ok_or_else(|| {
                    FtreeError::InsufficientFabric("no compute node reaches a switch".to_string())
                })?
        } else {
            self.max_switch_rank
        };

        let tree_rank = self.tree_rank();
        if !(MIN_TREE_RANK..=MAX_TREE_RANK).contains(&tree_rank) {
            return Err(FtreeError::TreeRankOutOfBounds {
                rank: tree_rank,
                min: MIN_TREE_RANK,
                max: MAX_TREE_RANK,
            });
        }
        info!(
            leaf_switch_rank = self.leaf_switch_rank,
            tree_rank, "叶子交换机层"
        );
        Ok(())
    }

    /// 标记所有连接计算节点的交换机为叶子
    pub(crate) fn mark_leaf_switches(&mut self) -> Result<()> {
        let leaf_rank = self.leaf_switch_rank;
        for hca in &self.hcas {
            if hca.cn_num == 0 {
                continue;
            }
            for group in hca.up_groups.iter().filter(|g| g.is_cn) {
                let Some(id) = group.remote_switch() else {
                    continue;
                };
                let sw = &mut self.switches[id.0];
                if sw.is_leaf {
                    continue;
                }
                if sw.rank != leaf_rank {
                    return Err(FtreeError::LeafRankMismatch {
                        port_guid: group.port_guid,
                        switch: sw.guid,
                        rank: sw.rank,
                        leaf_rank,
                    });
                }
                sw.is_leaf = true;
                debug!(switch = %sw.guid, lid = %sw.base_lid, "标记叶子交换机");
            }
        }
        Ok(())
    }
}

/// 未分层或新 rank 更小时更新，返回是否发生变化
fn update_rank(ranks: &mut [Option<u32>], id: SwitchId, rank: u32) -> bool {
    match ranks[id.0] {
        Some(current) if current <= rank => false,
        _ => {
            ranks[id.0] = Some(rank);
            true
        }
    }
}
