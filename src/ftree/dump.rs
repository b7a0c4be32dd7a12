//! 诊断输出
//!
//! - 概要信息（info/debug）
//! - 完整拓扑（trace）
//! - CA 路由顺序文件 `opensm-ftree-ca-order.dump`

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{Level, debug, info, trace};

use super::fabric::Fabric;
use super::port::{Direction, NodeRef, PortGroup};
use crate::error::{FtreeError, Result};
use crate::subnet::Lid;

/// CA 顺序文件名
pub const CA_ORDER_FILE: &str = "opensm-ftree-ca-order.dump";

/// CA 路由顺序中的一项
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaOrderEntry {
    Cn { lid: Lid, description: String },
    /// 为平衡计数器补齐的占位
    Dummy,
}

impl fmt::Display for CaOrderEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cn { lid, description } => write!(f, "0x{:04x}\t{}", lid.0, description),
            Self::Dummy => f.write_str("0xFFFF\tDUMMY"),
        }
    }
}

impl Fabric {
    pub(crate) fn dump_general_info(&self) {
        info!(
            tree_rank = self.tree_rank(),
            max_switch_rank = self.max_switch_rank,
            hcas = self.hcas.len(),
            cns = self.cn_num,
            switches = self.switches.len(),
            leaves = self.leaf_switches.len(),
            max_cn_per_leaf = self.max_cn_per_leaf,
            "fat-tree 概要"
        );
        for rank in 0..=self.max_switch_rank {
            let count = self.switches.iter().filter(|sw| sw.rank == rank).count();
            debug!(rank, count, "每层交换机数");
        }

        if !tracing::enabled!(Level::DEBUG) {
            return;
        }
        for sw in self.switches.iter().filter(|sw| sw.rank == 0) {
            debug!(guid = %sw.guid, lid = %sw.base_lid, tuple = %sw.tuple, "根交换机");
        }
        for &id in &self.leaf_switches {
            let sw = &self.switches[id.0];
            debug!(
                guid = %sw.guid,
                lid = %sw.base_lid,
                tuple = %sw.tuple,
                is_leaf = sw.is_leaf,
                "叶子交换机"
            );
        }
    }

    pub(crate) fn dump_topology(&self) {
        if !tracing::enabled!(Level::TRACE) {
            return;
        }
        for sw in &self.switches {
            trace!(
                tuple = %sw.tuple,
                guid = %sw.guid,
                lid = %sw.base_lid,
                rank = sw.rank,
                down = sw.down_groups.len(),
                up = sw.up_groups.len(),
                "交换机"
            );
            for group in &sw.down_groups {
                self.dump_group(group, Direction::Down);
            }
            for group in &sw.up_groups {
                self.dump_group(group, Direction::Up);
            }
        }
        for hca in &self.hcas {
            trace!(guid = %hca.guid, cn_num = hca.cn_num, groups = hca.up_groups.len(), "CA");
            for group in &hca.up_groups {
                self.dump_group(group, Direction::Up);
            }
        }
    }

    fn dump_group(&self, group: &PortGroup, dir: Direction) {
        let remote = match group.remote {
            NodeRef::Switch(id) => self.switches[id.0].tuple.to_string(),
            NodeRef::Hca(_) => "CA".to_string(),
        };
        let ports: Vec<u8> = group.port_nums().collect();
        trace!(
            ?dir,
            local = %group.node_guid,
            local_lid = %group.base_lid,
            remote_guid = %group.remote_node_guid,
            remote_lid = %group.remote_base_lid,
            remote = %remote,
            ?ports,
            is_cn = group.is_cn,
            "  端口组"
        );
    }

    /// 按路由顺序列出每个叶子下的计算节点，不足 `max_cn_per_leaf` 的补占位
    pub fn ca_ordering(&self) -> Vec<CaOrderEntry> {
        let mut entries = Vec::new();
        for &leaf in &self.leaf_switches {
            let targets = self.leaf_targets(leaf);
            let routed = targets.len();
            entries.extend(targets.into_iter().map(|t| CaOrderEntry::Cn {
                lid: t.lid,
                description: self.hcas[t.hca.0].description.clone(),
            }));
            let missing = (self.max_cn_per_leaf as usize).saturating_sub(routed);
            entries.extend(std::iter::repeat_n(CaOrderEntry::Dummy, missing));
        }
        entries
    }
}

/// 把 CA 顺序写到 `dir/opensm-ftree-ca-order.dump`
pub fn write_ca_ordering(dir: &Path, entries: &[CaOrderEntry]) -> Result<PathBuf> {
    let path = dir.join(CA_ORDER_FILE);
    let mut out = String::new();
    for entry in entries {
        out.push_str(&entry.to_string());
        out.push('\n');
    }
    fs::create_dir_all(dir)
        .and_then(|_| fs::write(&path, out))
        .map_err(|source| FtreeError::DumpIo {
            path: path.clone(),
            source,
        })?;
    debug!(path = %path.display(), entries = entries.len(), "写出 CA 顺序");
    Ok(path)
}
