//! 子网拓扑快照
//!
//! 发现子系统产出的节点/端口/链路数据库，路由引擎只读使用。

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use tracing::{debug, trace};

use super::id::{Guid, Lid};
use super::node::{NodeKind, PhysPort, RemoteEnd, SubnetNode};
use super::spec::SubnetSpec;
use crate::error::{FtreeError, Result, TopologyViolation};

/// 子网：按节点 GUID 有序
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Subnet {
    nodes: BTreeMap<Guid, SubnetNode>,
}

impl Subnet {
    pub fn new() -> Self {
        Self::default()
    }

    /// 添加交换机（自动创建 port 0）
    pub fn add_switch(
        &mut self,
        guid: Guid,
        lid: Lid,
        num_ports: u8,
        description: impl Into<String>,
    ) -> Guid {
        let mut node = SubnetNode::new(guid, NodeKind::Switch, description, num_ports);
        node.base_lid = lid;
        node.ports.insert(0, PhysPort::new(guid, lid));
        self.nodes.insert(guid, node);
        guid
    }

    /// 添加 CA（端口由 `add_ca_port` 添加）
    pub fn add_ca(&mut self, guid: Guid, num_ports: u8, description: impl Into<String>) -> Guid {
        self.nodes
            .insert(guid, SubnetNode::new(guid, NodeKind::Ca, description, num_ports));
        guid
    }

    /// 添加路由器或其它类型节点
    pub fn add_node(&mut self, guid: Guid, kind: NodeKind, num_ports: u8, description: impl Into<String>) -> Guid {
        self.nodes
            .insert(guid, SubnetNode::new(guid, kind, description, num_ports));
        guid
    }

    /// 为 CA 添加带 LID 的端口
    pub fn add_ca_port(&mut self, ca: Guid, port: u8, port_guid: Guid, lid: Lid) -> Result<()> {
        let node = self.node_mut(ca)?;
        node.ports.insert(port, PhysPort::new(port_guid, lid));
        Ok(())
    }

    /// 连接两个端口（双向链路）
    ///
    /// 端口不存在时自动创建：交换机端口继承交换机 GUID/LID。
    pub fn connect(&mut self, a: Guid, a_port: u8, b: Guid, b_port: u8) -> Result<()> {
        // 先确认两端都存在，避免只写了一半
        self.node_mut(b)?;
        self.ensure_port(a, a_port)?.remote = Some(RemoteEnd { node: b, port: b_port });
        self.ensure_port(b, b_port)?.remote = Some(RemoteEnd { node: a, port: a_port });
        trace!(a = %a, a_port, b = %b, b_port, "连接端口");
        Ok(())
    }

    /// 设置链路健康状态（两端同时设置）
    pub fn set_link_healthy(&mut self, guid: Guid, port: u8, healthy: bool) -> Result<()> {
        let remote = {
            let p = self.port_mut(guid, port)?;
            p.healthy = healthy;
            p.remote
        };
        if let Some(r) = remote {
            self.port_mut(r.node, r.port)?.healthy = healthy;
        }
        Ok(())
    }

    pub fn node(&self, guid: Guid) -> Option<&SubnetNode> {
        self.nodes.get(&guid)
    }

    /// 按 GUID 升序遍历
    pub fn nodes(&self) -> impl Iterator<Item = &SubnetNode> + '_ {
        self.nodes.values()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn switch_count(&self) -> usize {
        self.nodes
            .values()
            .filter(|n| n.kind == NodeKind::Switch)
            .count()
    }

    /// 健康链路另一端的节点及端口
    pub fn remote_of(&self, guid: Guid, port: u8) -> Option<(&SubnetNode, &PhysPort)> {
        let remote = self.nodes.get(&guid)?.port(port)?.healthy_remote()?;
        let node = self.nodes.get(&remote.node)?;
        let phys = node.port(remote.port)?;
        Some((node, phys))
    }

    /// 检查每条链路两端都存在且互相指向
    pub fn validate_links(&self) -> Result<()> {
        for node in self.nodes.values() {
            for (&num, port) in &node.ports {
                let Some(remote) = port.remote else {
                    continue;
                };
                let back = self
                    .nodes
                    .get(&remote.node)
                    .and_then(|n| n.port(remote.port))
                    .and_then(|p| p.remote);
                if back != Some(RemoteEnd { node: node.guid, port: num }) {
                    return Err(FtreeError::IllegalTopology(TopologyViolation::DanglingLink {
                        node: node.guid,
                        port: num,
                    }));
                }
            }
        }
        debug!(nodes = self.nodes.len(), "链路校验通过");
        Ok(())
    }

    pub fn from_spec(spec: SubnetSpec) -> Result<Self> {
        let nodes = spec.nodes.into_iter().map(|n| (n.guid, n)).collect();
        let subnet = Self { nodes };
        subnet.validate_links()?;
        Ok(subnet)
    }

    pub fn to_spec(&self) -> SubnetSpec {
        SubnetSpec {
            schema_version: SubnetSpec::SCHEMA_VERSION,
            nodes: self.nodes.values().cloned().collect(),
        }
    }

    pub fn from_json_str(raw: &str) -> Result<Self> {
        let spec: SubnetSpec = serde_json::from_str(raw)?;
        Self::from_spec(spec)
    }

    pub fn from_json_file(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path).map_err(|source| FtreeError::SubnetIo {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&raw)
    }

    pub fn to_json_string(&self) -> Result<String> {
        serde_json::to_string_pretty(&self.to_spec()).map_err(FtreeError::export("subnet"))
    }

    fn node_mut(&mut self, guid: Guid) -> Result<&mut SubnetNode> {
        self.nodes
            .get_mut(&guid)
            .ok_or(FtreeError::IllegalTopology(TopologyViolation::DanglingLink {
                node: guid,
                port: 0,
            }))
    }

    fn port_mut(&mut self, guid: Guid, port: u8) -> Result<&mut PhysPort> {
        self.node_mut(guid)?
            .ports
            .get_mut(&port)
            .ok_or(FtreeError::IllegalTopology(TopologyViolation::DanglingLink {
                node: guid,
                port,
            }))
    }

    fn ensure_port(&mut self, guid: Guid, port: u8) -> Result<&mut PhysPort> {
        let node = self.node_mut(guid)?;
        let default_port = match node.kind {
            NodeKind::Switch => PhysPort::new(node.guid, node.base_lid),
            _ => PhysPort::new(Guid(node.guid.0.wrapping_add(port as u64)), Lid(0)),
        };
        Ok(node.ports.entry(port).or_insert(default_port))
    }
}
