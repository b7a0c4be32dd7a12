//! 由发现快照创建节点与端口组

use tracing::{debug, trace, warn};

use super::fabric::Fabric;
use super::hca::FtreeHca;
use super::port::{Direction, GroupEnds, HcaId, NodeRef, SwitchId, add_to_groups};
use super::switch::FtreeSwitch;
use crate::error::{FtreeError, Result, TopologyViolation};
use crate::subnet::{NodeKind, Subnet, SubnetNode};

impl Fabric {
    /// 为每个 CA / 交换机创建节点对象，跳过路由器
    pub(crate) fn populate_nodes(&mut self, subnet: &Subnet) -> Result<()> {
        for node in subnet.nodes() {
            match node.kind {
                NodeKind::Ca => {
                    let id = HcaId(self.hcas.len());
                    self.hcas.push(FtreeHca::new(node.guid, node.description.clone()));
                    self.hca_by_guid.insert(node.guid, id);
                }
                NodeKind::Switch => {
                    if node.num_ports <= 1 {
                        debug!(guid = %node.guid, "跳过只有管理端口的交换机");
                        continue;
                    }
                    let id = SwitchId(self.switches.len());
                    self.switches.push(FtreeSwitch::new(
                        node.guid,
                        node.base_lid,
                        port_width(node),
                        node.description.clone(),
                    ));
                    self.sw_by_guid.insert(node.guid, id);
                }
                NodeKind::Router => {
                    trace!(guid = %node.guid, "跳过路由器");
                }
                NodeKind::Unknown => {
                    return Err(FtreeError::UnrecognizedNodeType { guid: node.guid });
                }
            }
        }
        debug!(
            switches = self.switches.len(),
            hcas = self.hcas.len(),
            "节点创建完成"
        );
        Ok(())
    }

    /// CA 侧端口组：全部向上；CA 直连 CA 是非法拓扑
    pub(crate) fn construct_hca_ports(&mut self, subnet: &Subnet) -> Result<()> {
        for idx in 0..self.hcas.len() {
            let guid = self.hcas[idx].guid;
            let Some(node) = subnet.node(guid) else {
                continue;
            };
            for (port_num, phys, remote) in node.linked_ports() {
                let Some((remote_node, remote_phys)) = subnet.remote_of(guid, port_num) else {
                    continue;
                };
                match remote_node.kind {
                    NodeKind::Switch => {}
                    NodeKind::Router => continue,
                    NodeKind::Ca => {
                        return Err(TopologyViolation::CaToCa {
                            local: guid,
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
                let Some(&sw) = self.sw_by_guid.get(&remote_node.guid) else {
                    warn!(ca = %guid, switch = %remote_node.guid, "CA 连接到未知交换机，忽略");
                    continue;
                };

                let is_cn = self.options.is_compute_node(phys.port_guid);
                if is_cn {
                    self.cn_num += 1;
                    self.hcas[idx].cn_num += 1;
                }
                trace!(port_guid = %phys.port_guid, is_cn, "标记 CA 端口");

                let ends = GroupEnds {
                    base_lid: phys.base_lid,
                    remote_base_lid: remote_node.base_lid,
                    port_guid: phys.port_guid,
                    remote_port_guid: remote_phys.port_guid,
                    node_guid: guid,
                    remote_node_guid: remote_node.guid,
                    local: NodeRef::Hca(HcaId(idx)),
                    remote: NodeRef::Switch(sw),
                };
                add_to_groups(&mut self.hcas[idx].up_groups, ends, is_cn, port_num, remote.port);
            }
        }
        debug!(cn_num = self.cn_num, "CA 端口构建完成");
        Ok(())
    }

    /// 交换机侧端口组，方向由两端 rank 决定（需先分层）
    pub(crate) fn construct_sw_ports(&mut self, subnet: &Subnet) -> Result<()> {
        for idx in 0..self.switches.len() {
            let (guid, rank, base_lid) = {
                let sw = &self.switches[idx];
                (sw.guid, sw.rank, sw.base_lid)
            };
            if base_lid > self.lft_max_lid {
                self.lft_max_lid = base_lid;
            }
            let Some(node) = subnet.node(guid) else {
                continue;
            };
            for (port_num, phys, remote) in node.linked_ports() {
                if remote.node == guid {
                    debug!(guid = %guid, port = port_num, rank, "忽略交换机环回链路");
                    continue;
                }
                let Some((remote_node, remote_phys)) = subnet.remote_of(guid, port_num) else {
                    continue;
                };
                let (dir, remote_ref, remote_lid) = match remote_node.kind {
                    NodeKind::Router => continue,
                    NodeKind::Ca => {
                        let Some(&hca) = self.hca_by_guid.get(&remote_node.guid) else {
                            continue;
                        };
                        (Direction::Down, NodeRef::Hca(hca), remote_phys.base_lid)
                    }
                    NodeKind::Switch => {
                        let Some(&other) = self.sw_by_guid.get(&remote_node.guid) else {
                            continue;
                        };
                        let remote_rank = self.switches[other.0].rank;
                        if rank.abs_diff(remote_rank) != 1 {
                            return Err(TopologyViolation::RankInconsistency {
                                local: guid,
                                local_rank: rank,
                                remote: remote_node.guid,
                                remote_rank,
                            }
                            .into());
                        }
                        let dir = if rank > remote_rank {
                            Direction::Up
                        } else {
                            Direction::Down
                        };
                        // 交换机 LID 只在 port 0 上
                        (dir, NodeRef::Switch(other), remote_node.base_lid)
                    }
                    NodeKind::Unknown => {
                        return Err(FtreeError::UnrecognizedNodeType {
                            guid: remote_node.guid,
                        });
                    }
                };

                let ends = GroupEnds {
                    base_lid,
                    remote_base_lid: remote_lid,
                    port_guid: phys.port_guid,
                    remote_port_guid: remote_phys.port_guid,
                    node_guid: guid,
                    remote_node_guid: remote_node.guid,
                    local: NodeRef::Switch(SwitchId(idx)),
                    remote: remote_ref,
                };
                add_to_groups(
                    self.switches[idx].groups_mut(dir),
                    ends,
                    false,
                    port_num,
                    remote.port,
                );

                if remote_lid > self.lft_max_lid {
                    self.lft_max_lid = remote_lid;
                }
            }
        }
        debug!(max_lid = %self.lft_max_lid, "交换机端口构建完成");
        Ok(())
    }
}

/// 跳数矩阵宽度：声明的端口数与实际最大端口号取大
fn port_width(node: &SubnetNode) -> usize {
    let highest = node.ports.keys().next_back().map_or(0, |&p| p as usize + 1);
    highest.max(node.num_ports as usize)
}
