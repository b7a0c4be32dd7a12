//! Fabric 容器与构建流水线
//!
//! 每轮路由从发现快照重新构建一个 `Fabric`：
//! 创建节点 -> CA 端口 -> 分层 -> 交换机端口 -> 叶子层 -> 索引 -> 叶子数组 -> 校验。
//! 之后 `route` 填写所有交换机的转发表与跳数表。

use std::collections::{BTreeMap, HashMap};

use tracing::{debug, info};

use super::hca::FtreeHca;
use super::port::{HcaId, SwitchId};
use super::stats::RoutingStats;
use super::switch::FtreeSwitch;
use super::tables::{RoutingTables, SwitchTables};
use super::tuple::{TUPLE_LEN, Tuple};
use crate::config::RoutingOptions;
use crate::error::{FtreeError, Result};
use crate::subnet::{Guid, Lid, Subnet};

/// 最小树高（层数）
pub const MIN_TREE_RANK: u32 = 2;
/// 最大树高，受 tuple 长度限制
pub const MAX_TREE_RANK: u32 = TUPLE_LEN as u32;

#[derive(Debug, Clone, Default)]
pub struct Fabric {
    /// 按 GUID 升序创建
    pub(crate) switches: Vec<FtreeSwitch>,
    pub(crate) hcas: Vec<FtreeHca>,
    pub(crate) sw_by_guid: BTreeMap<Guid, SwitchId>,
    pub(crate) hca_by_guid: BTreeMap<Guid, HcaId>,
    /// 索引阶段填充
    pub(crate) sw_by_tuple: HashMap<u64, SwitchId>,
    /// 叶子交换机，按 tuple 排序
    pub(crate) leaf_switches: Vec<SwitchId>,
    pub(crate) options: RoutingOptions,
    pub(crate) cn_num: u32,
    pub(crate) leaf_switch_rank: u8,
    pub(crate) max_switch_rank: u8,
    pub(crate) max_cn_per_leaf: u32,
    pub(crate) lft_max_lid: Lid,
    pub(crate) stats: RoutingStats,
}

impl Fabric {
    /// 从发现快照构建并校验 fat-tree
    #[tracing::instrument(skip_all, fields(nodes = subnet.node_count()))]
    pub fn build(subnet: &Subnet, options: RoutingOptions) -> Result<Self> {
        if options.lmc > 0 {
            return Err(FtreeError::LmcNotSupported(options.lmc));
        }

        let switches = subnet.switch_count();
        let others = subnet.node_count() - switches;
        if switches < 2 {
            return Err(FtreeError::InsufficientFabric(format!(
                "{switches} switch(es) in the subnet, at least 2 required"
            )));
        }
        if others < 2 {
            return Err(FtreeError::InsufficientFabric(format!(
                "{others} non-switch node(s) in the subnet, at least 2 required"
            )));
        }

        let mut fabric = Self {
            options,
            ..Self::default()
        };

        fabric.populate_nodes(subnet)?;
        if fabric.hcas.len() < 2 {
            return Err(FtreeError::InsufficientFabric(format!(
                "{} CA(s) in the fabric, at least 2 required",
                fabric.hcas.len()
            )));
        }

        // CA 端口不依赖 rank，先构建以尽早发现 CA 直连
        fabric.construct_hca_ports(subnet)?;
        fabric.rank_switches(subnet)?;
        fabric.construct_sw_ports(subnet)?;

        if fabric.cn_num == 0 {
            return Err(FtreeError::InsufficientFabric(
                "no compute nodes found".to_string(),
            ));
        }

        fabric.set_leaf_rank()?;
        fabric.mark_leaf_switches()?;
        fabric.make_indexing()?;
        fabric.create_leaf_switch_array();
        fabric.set_max_cn_per_leaf();
        fabric.allocate_tables();

        fabric.dump_general_info();
        fabric.dump_topology();

        if !fabric.options.roots_provided() {
            fabric.validate_topology()?;
        }

        info!(
            switches = fabric.switches.len(),
            hcas = fabric.hcas.len(),
            leaves = fabric.leaf_switches.len(),
            "fat-tree 构建完成"
        );
        Ok(fabric)
    }

    fn allocate_tables(&mut self) {
        let max_lid = self.lft_max_lid;
        for sw in &mut self.switches {
            sw.allocate_tables(max_lid);
        }
        debug!(max_lid = %max_lid, "分配转发表");
    }

    pub fn switch(&self, id: SwitchId) -> &FtreeSwitch {
        &self.switches[id.0]
    }

    pub fn switches(&self) -> &[FtreeSwitch] {
        &self.switches
    }

    pub fn switch_id(&self, guid: Guid) -> Option<SwitchId> {
        self.sw_by_guid.get(&guid).copied()
    }

    pub fn switch_by_guid(&self, guid: Guid) -> Option<&FtreeSwitch> {
        self.switch_id(guid).map(|id| self.switch(id))
    }

    pub fn switch_by_tuple(&self, tuple: Tuple) -> Option<&FtreeSwitch> {
        self.sw_by_tuple
            .get(&tuple.to_key())
            .map(|&id| self.switch(id))
    }

    pub fn hca(&self, id: HcaId) -> &FtreeHca {
        &self.hcas[id.0]
    }

    pub fn hcas(&self) -> &[FtreeHca] {
        &self.hcas
    }

    pub fn hca_by_guid(&self, guid: Guid) -> Option<&FtreeHca> {
        self.hca_by_guid.get(&guid).map(|&id| self.hca(id))
    }

    pub fn leaf_switches(&self) -> &[SwitchId] {
        &self.leaf_switches
    }

    pub fn options(&self) -> &RoutingOptions {
        &self.options
    }

    pub fn cn_num(&self) -> u32 {
        self.cn_num
    }

    pub fn leaf_switch_rank(&self) -> u8 {
        self.leaf_switch_rank
    }

    pub fn max_switch_rank(&self) -> u8 {
        self.max_switch_rank
    }

    /// 树的层数（交换机层 + CA 层）
    pub fn tree_rank(&self) -> u32 {
        self.leaf_switch_rank as u32 + 1
    }

    pub fn max_cn_per_leaf(&self) -> u32 {
        self.max_cn_per_leaf
    }

    pub fn lft_max_lid(&self) -> Lid {
        self.lft_max_lid
    }

    pub fn stats(&self) -> RoutingStats {
        self.stats
    }

    /// 导出所有交换机的转发表与最小跳数表
    pub fn tables(&self) -> RoutingTables {
        let max_lid = self.lft_max_lid;
        let switches = self
            .switches
            .iter()
            .map(|sw| SwitchTables {
                guid: sw.guid,
                lid: sw.base_lid,
                rank: sw.rank,
                tuple: sw.tuple.to_string(),
                lft: sw.lft.entries(),
                min_hops: (0..=max_lid.0).map(|l| sw.least_hops(Lid(l))).collect(),
            })
            .collect();
        RoutingTables { max_lid, switches }
    }
}
