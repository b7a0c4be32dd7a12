//! 负载均衡的上/下行路由
//!
//! 对每个目标 LID，从目标所在叶子（或交换机自身）出发：
//! - `route_up`：在上行端口组中选负载最小的端口向上走，给上层交换机写入指向下方的表项；
//! - `route_down`：在每一层向下扇出，给下层交换机写入指向上方的表项。
//!
//! 目标顺序：计算节点（按叶子 tuple 顺序，不足 `max_cn_per_leaf` 的用占位目标补齐）、
//! 非计算节点 CA、交换机自身。

use tracing::{debug, info, trace};

use super::fabric::Fabric;
use super::port::{Direction, HcaId, SwitchId, least_by};
use super::stats::RoutingStats;
use crate::subnet::Lid;

/// 一次路由遍历的目标
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteTarget {
    /// 写转发表与跳数表；`primary` 时同时推进负载计数器
    Real { lid: Lid, rank: u8, primary: bool },
    /// 只推进负载计数器，不写任何表
    Placeholder,
}

impl RouteTarget {
    pub fn lid(self) -> Option<Lid> {
        match self {
            Self::Real { lid, .. } => Some(lid),
            Self::Placeholder => None,
        }
    }

    pub fn is_primary(self) -> bool {
        match self {
            Self::Real { primary, .. } => primary,
            Self::Placeholder => true,
        }
    }
}

/// 叶子交换机下的一个计算节点目标
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct LeafTarget {
    pub lid: Lid,
    pub hca: HcaId,
    /// 叶子上通向该 CA 的端口
    pub port: u8,
}

impl Fabric {
    /// 为全部目标计算转发表，返回本轮统计
    #[tracing::instrument(skip(self), fields(leaves = self.leaf_switches.len()))]
    pub fn route(&mut self) -> RoutingStats {
        self.route_to_cns();
        self.route_to_non_cns();
        self.route_to_switches();
        info!(
            cn = self.stats.cn_routes,
            dummy = self.stats.dummy_routes,
            non_cn = self.stats.non_cn_routes,
            switches = self.stats.switch_routes,
            lft_entries = self.stats.lft_entries,
            loops_skipped = self.stats.loops_skipped,
            "路由计算完成"
        );
        self.stats
    }

    /// 叶子下按端口组顺序排列的计算节点
    pub(crate) fn leaf_targets(&self, leaf: SwitchId) -> Vec<LeafTarget> {
        let mut targets = Vec::new();
        for group in &self.switches[leaf.0].down_groups {
            let Some(hca) = group.remote_hca() else {
                continue;
            };
            if self.hcas[hca.0].cn_num == 0 {
                continue;
            }
            let is_cn = self.hcas[hca.0]
                .group_by_remote_lid(group.base_lid)
                .is_some_and(|g| g.is_cn);
            if !is_cn {
                continue;
            }
            let Some(port) = group.ports.first() else {
                continue;
            };
            targets.push(LeafTarget {
                lid: group.remote_base_lid,
                hca,
                port: port.port_num,
            });
        }
        targets
    }

    pub(crate) fn route_to_cns(&mut self) {
        for leaf_idx in 0..self.leaf_switches.len() {
            let leaf = self.leaf_switches[leaf_idx];
            let rank = self.switches[leaf.0].rank;
            let targets = self.leaf_targets(leaf);

            for target in &targets {
                self.set_entry(leaf, target.lid, target.port, 1);
                trace!(
                    switch = %self.switches[leaf.0].tuple,
                    lid = %target.lid,
                    port = target.port,
                    "叶子直连计算节点"
                );
                self.route_up(
                    leaf,
                    None,
                    RouteTarget::Real {
                        lid: target.lid,
                        rank: rank + 1,
                        primary: true,
                    },
                );
                self.stats.cn_routes += 1;
            }

            let routed = targets.len() as u32;
            if self.max_cn_per_leaf > routed {
                debug!(
                    switch = %self.switches[leaf.0].tuple,
                    dummies = self.max_cn_per_leaf - routed,
                    "补齐占位目标"
                );
                for _ in routed..self.max_cn_per_leaf {
                    self.route_up(leaf, None, RouteTarget::Placeholder);
                    self.stats.dummy_routes += 1;
                }
            }
        }
    }

    pub(crate) fn route_to_non_cns(&mut self) {
        let mut targets = Vec::new();
        for hca in &self.hcas {
            for group in hca.up_groups.iter().filter(|g| !g.is_cn) {
                let (Some(sw), Some(port)) = (group.remote_switch(), group.ports.first()) else {
                    continue;
                };
                targets.push((sw, group.base_lid, port.remote_port_num));
            }
        }

        for (sw, lid, port) in targets {
            self.set_entry(sw, lid, port, 1);
            let rank = self.switches[sw.0].rank;
            trace!(switch = %self.switches[sw.0].tuple, lid = %lid, port, "直连非计算节点");
            self.route_up(
                sw,
                None,
                RouteTarget::Real {
                    lid,
                    rank: rank + 1,
                    primary: true,
                },
            );
            self.stats.non_cn_routes += 1;
        }
    }

    /// 交换机间路由不计入负载；根交换机之间互不生成表项
    pub(crate) fn route_to_switches(&mut self) {
        for idx in 0..self.switches.len() {
            let sw = SwitchId(idx);
            let (lid, rank) = (self.switches[idx].base_lid, self.switches[idx].rank);
            self.set_entry(sw, lid, 0, 0);
            self.route_up(
                sw,
                None,
                RouteTarget::Real {
                    lid,
                    rank,
                    primary: false,
                },
            );
            self.stats.switch_routes += 1;
        }
    }

    fn set_entry(&mut self, sw: SwitchId, lid: Lid, port: u8, hops: u8) {
        let sw = &mut self.switches[sw.0];
        if sw.lft.set(lid, port) {
            self.stats.lft_entries += 1;
        }
        sw.hops.set(lid, port, hops);
    }

    /// 从 `sw` 向下扇出，给下层交换机写入通往目标的上行表项
    pub(crate) fn route_down(
        &mut self,
        sw: SwitchId,
        prev: Option<SwitchId>,
        target: RouteTarget,
        highest_rank: u8,
    ) {
        let Some(start) = self.switches[sw.0].advance_down_cursor() else {
            return;
        };
        let n = self.switches[sw.0].down_groups.len();
        let prev_lid = prev.map(|p| self.switches[p.0].base_lid);

        for k in 0..n {
            let gi = (start + k) % n;
            let (remote, min_port) = {
                let group = &self.switches[sw.0].down_groups[gi];
                let Some(remote) = group.remote_switch() else {
                    continue;
                };
                // 不走回刚上来的那台交换机
                if prev_lid == Some(group.remote_base_lid) {
                    continue;
                }
                let Some(min_port) = group.least_loaded_up() else {
                    continue;
                };
                (remote, min_port)
            };

            if let Some(lid) = target.lid() {
                if self.switches[remote.0].least_hops(lid).is_some() {
                    // 上行时已经经过该交换机，物理拓扑中存在环
                    self.stats.loops_skipped += 1;
                    debug!(
                        len = self.switches[remote.0].rank.saturating_sub(highest_rank) as u32 * 2,
                        switch = %self.switches[remote.0].tuple,
                        through = %self.switches[sw.0].tuple,
                        lid = %lid,
                        "跳过环路"
                    );
                    continue;
                }
            }

            match target {
                RouteTarget::Real {
                    lid,
                    primary: false,
                    ..
                } if self.switches[remote.0].lft.is_set(lid) => continue,
                RouteTarget::Real { lid, rank, .. } => {
                    let remote_rank = self.switches[remote.0].rank;
                    let hops = (rank.saturating_sub(highest_rank))
                        + (remote_rank.saturating_sub(highest_rank));
                    self.write_through(sw, Direction::Down, gi, min_port, lid, hops);
                }
                RouteTarget::Placeholder => {}
            }

            // 上行计数记在链路上端（rank 较小一侧）的端口上
            if target.is_primary() {
                self.switches[sw.0].down_groups[gi].ports[min_port].counter_up += 1;
            }

            self.route_down(remote, None, target, highest_rank);
        }
    }

    /// 从 `sw` 向上走，给上层交换机写入通往目标的下行表项
    pub(crate) fn route_up(&mut self, sw: SwitchId, prev: Option<SwitchId>, target: RouteTarget) {
        let rank = self.switches[sw.0].rank;
        self.route_down(sw, prev, target, rank);

        if rank == 0 {
            return;
        }

        if target.is_primary() {
            let selected = {
                let groups = &self.switches[sw.0].up_groups;
                least_by(groups, |g| g.counter_down).and_then(|gi| {
                    let group = &groups[gi];
                    Some((gi, group.least_loaded_down()?, group.remote_switch()?))
                })
            };
            if let Some((gi, pi, remote)) = selected {
                if self.switches[sw.0].is_leaf {
                    debug!(
                        lid = ?target.lid(),
                        from = %self.switches[sw.0].tuple,
                        to = %self.switches[remote.0].tuple,
                        "主路径"
                    );
                }
                // 下行计数记在链路下端（rank 较大一侧）
                {
                    let group = &mut self.switches[sw.0].up_groups[gi];
                    group.counter_down += 1;
                    group.ports[pi].counter_down += 1;
                }
                if let RouteTarget::Real { lid, rank, .. } = target {
                    let hops = rank.saturating_sub(self.switches[remote.0].rank);
                    self.write_through(sw, Direction::Up, gi, pi, lid, hops);
                }
                self.route_up(remote, Some(sw), target);
            }
        }

        let RouteTarget::Real { lid, rank, .. } = target else {
            return;
        };

        // 次路径：其余上层交换机若还没有表项，经端口 0 补上
        for gi in 0..self.switches[sw.0].up_groups.len() {
            let Some(remote) = self.switches[sw.0].up_groups[gi].remote_switch() else {
                continue;
            };
            if self.switches[remote.0].lft.is_set(lid) {
                continue;
            }
            if self.switches[sw.0].is_leaf {
                debug!(
                    lid = %lid,
                    from = %self.switches[sw.0].tuple,
                    to = %self.switches[remote.0].tuple,
                    "次路径"
                );
            }
            let hops = rank.saturating_sub(self.switches[remote.0].rank);
            self.write_through(sw, Direction::Up, gi, 0, lid, hops);
            self.route_up(
                remote,
                Some(sw),
                RouteTarget::Real {
                    lid,
                    rank,
                    primary: false,
                },
            );
        }
    }

    /// 在端口组对端交换机上写转发表项（经 `port_idx` 端口），并在组内所有对端端口上写跳数
    fn write_through(
        &mut self,
        sw: SwitchId,
        dir: Direction,
        group_idx: usize,
        port_idx: usize,
        lid: Lid,
        hops: u8,
    ) {
        let (remote, out_port, back_ports): (SwitchId, u8, Vec<u8>) = {
            let group = &self.switches[sw.0].groups(dir)[group_idx];
            let (Some(remote), Some(selected)) = (group.remote_switch(), group.ports.get(port_idx))
            else {
                return;
            };
            (
                remote,
                selected.remote_port_num,
                group.ports.iter().map(|p| p.remote_port_num).collect(),
            )
        };

        let remote_sw = &mut self.switches[remote.0];
        if remote_sw.lft.set(lid, out_port) {
            self.stats.lft_entries += 1;
        }
        for p in back_ports {
            remote_sw.hops.set(lid, p, hops);
        }
        trace!(
            switch = %remote_sw.tuple,
            lid = %lid,
            port = out_port,
            hops,
            "写转发表项"
        );
    }
}
