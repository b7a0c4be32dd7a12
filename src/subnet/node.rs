//! 节点类型
//!
//! 发现阶段得到的节点、物理端口与链路端点，只读快照。

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::id::{Guid, Lid};

/// 节点类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    /// 主机通道适配器（HCA）
    Ca,
    Switch,
    Router,
    /// 发现到的未知类型，fat-tree 路由会拒绝
    #[serde(other)]
    Unknown,
}

/// 链路对端
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteEnd {
    pub node: Guid,
    pub port: u8,
}

/// 物理端口
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhysPort {
    pub port_guid: Guid,
    /// CA 端口自身的 LID；交换机端口沿用交换机 port 0 的 LID
    pub base_lid: Lid,
    #[serde(default)]
    pub remote: Option<RemoteEnd>,
    #[serde(default = "default_healthy")]
    pub healthy: bool,
}

fn default_healthy() -> bool {
    true
}

impl PhysPort {
    pub fn new(port_guid: Guid, base_lid: Lid) -> Self {
        Self {
            port_guid,
            base_lid,
            remote: None,
            healthy: true,
        }
    }

    /// 链路存在且健康时返回对端
    pub fn healthy_remote(&self) -> Option<RemoteEnd> {
        if self.healthy { self.remote } else { None }
    }
}

/// 发现到的节点
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubnetNode {
    pub guid: Guid,
    pub kind: NodeKind,
    #[serde(default)]
    pub description: String,
    /// 交换机的 base LID（port 0）；CA 为 `Lid(0)`
    #[serde(default = "zero_lid")]
    pub base_lid: Lid,
    /// 物理端口数（交换机含 port 0）
    pub num_ports: u8,
    /// 端口号 -> 端口
    #[serde(default)]
    pub ports: BTreeMap<u8, PhysPort>,
}

fn zero_lid() -> Lid {
    Lid(0)
}

impl SubnetNode {
    pub fn new(guid: Guid, kind: NodeKind, description: impl Into<String>, num_ports: u8) -> Self {
        Self {
            guid,
            kind,
            description: description.into(),
            base_lid: Lid(0),
            num_ports,
            ports: BTreeMap::new(),
        }
    }

    pub fn port(&self, num: u8) -> Option<&PhysPort> {
        self.ports.get(&num)
    }

    /// 按端口号升序遍历存在健康链路的端口（交换机跳过 port 0）
    pub fn linked_ports(&self) -> impl Iterator<Item = (u8, &PhysPort, RemoteEnd)> + '_ {
        let skip_mgmt = self.kind == NodeKind::Switch;
        self.ports.iter().filter_map(move |(&num, port)| {
            if skip_mgmt && num == 0 {
                return None;
            }
            port.healthy_remote().map(|remote| (num, port, remote))
        })
    }
}
