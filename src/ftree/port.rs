//! 端口与端口组
//!
//! 同一对逻辑端点之间的多条并行物理链路折叠成一个端口组，
//! 端口组内的端口可互换使用，按负载最小选取。

use crate::subnet::{Guid, Lid};

/// 交换机在 fabric 中的下标
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SwitchId(pub usize);

/// CA 在 fabric 中的下标
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct HcaId(pub usize);

/// 端口组一端所指的节点
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeRef {
    Hca(HcaId),
    Switch(SwitchId),
}

impl NodeRef {
    pub fn switch(self) -> Option<SwitchId> {
        match self {
            Self::Switch(id) => Some(id),
            Self::Hca(_) => None,
        }
    }

    pub fn hca(self) -> Option<HcaId> {
        match self {
            Self::Hca(id) => Some(id),
            Self::Switch(_) => None,
        }
    }
}

/// 端口组方向
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// 朝向叶子（rank 增大）
    Down,
    /// 朝向根（rank 减小）
    Up,
}

/// 一个物理端口
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Port {
    pub port_num: u8,
    pub remote_port_num: u8,
    /// 经过该端口向上的路由数（记在链路上端交换机的端口上）
    pub counter_up: u32,
    /// 经过该端口向下的路由数（记在链路下端节点的端口上）
    pub counter_down: u32,
}

impl Port {
    pub fn new(port_num: u8, remote_port_num: u8) -> Self {
        Self {
            port_num,
            remote_port_num,
            counter_up: 0,
            counter_down: 0,
        }
    }
}

/// 端口组两端的标识（LID、GUID、节点）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GroupEnds {
    pub base_lid: Lid,
    pub remote_base_lid: Lid,
    pub port_guid: Guid,
    pub remote_port_guid: Guid,
    pub node_guid: Guid,
    pub remote_node_guid: Guid,
    pub local: NodeRef,
    pub remote: NodeRef,
}

/// 指向同一远端的端口组
#[derive(Debug, Clone)]
pub struct PortGroup {
    pub base_lid: Lid,
    pub remote_base_lid: Lid,
    pub port_guid: Guid,
    pub remote_port_guid: Guid,
    pub node_guid: Guid,
    pub remote_node_guid: Guid,
    pub local: NodeRef,
    pub remote: NodeRef,
    pub ports: Vec<Port>,
    /// CA 侧端口组：对端口是否为计算节点
    pub is_cn: bool,
    pub counter_down: u32,
}

impl PortGroup {
    pub fn new(ends: GroupEnds, is_cn: bool) -> Self {
        Self {
            base_lid: ends.base_lid,
            remote_base_lid: ends.remote_base_lid,
            port_guid: ends.port_guid,
            remote_port_guid: ends.remote_port_guid,
            node_guid: ends.node_guid,
            remote_node_guid: ends.remote_node_guid,
            local: ends.local,
            remote: ends.remote,
            ports: Vec::new(),
            is_cn,
            counter_down: 0,
        }
    }

    /// 添加端口；端口号已存在时忽略
    pub fn add_port(&mut self, port_num: u8, remote_port_num: u8) {
        if self.ports.iter().any(|p| p.port_num == port_num) {
            return;
        }
        self.ports.push(Port::new(port_num, remote_port_num));
    }

    pub fn remote_switch(&self) -> Option<SwitchId> {
        self.remote.switch()
    }

    pub fn remote_hca(&self) -> Option<HcaId> {
        self.remote.hca()
    }

    /// `counter_up` 最小的端口下标，并列时取先出现者
    pub fn least_loaded_up(&self) -> Option<usize> {
        least_by(&self.ports, |p| p.counter_up)
    }

    /// `counter_down` 最小的端口下标，并列时取先出现者
    pub fn least_loaded_down(&self) -> Option<usize> {
        least_by(&self.ports, |p| p.counter_down)
    }

    pub fn port_nums(&self) -> impl Iterator<Item = u8> + '_ {
        self.ports.iter().map(|p| p.port_num)
    }
}

/// 按远端 LID 查找端口组，不存在则新建，然后加入端口
///
/// 返回端口组是否为新建。
pub(crate) fn add_to_groups(
    groups: &mut Vec<PortGroup>,
    ends: GroupEnds,
    is_cn: bool,
    port_num: u8,
    remote_port_num: u8,
) -> bool {
    let (idx, created) = match groups
        .iter()
        .position(|g| g.remote_base_lid == ends.remote_base_lid)
    {
        Some(idx) => (idx, false),
        None => {
            groups.push(PortGroup::new(ends, is_cn));
            (groups.len() - 1, true)
        }
    };
    groups[idx].add_port(port_num, remote_port_num);
    created
}

/// 严格小于才替换，保证稳定的先出现者优先
pub(crate) fn least_by<T>(items: &[T], key: impl Fn(&T) -> u32) -> Option<usize> {
    let mut best: Option<(usize, u32)> = None;
    for (idx, item) in items.iter().enumerate() {
        let k = key(item);
        match best {
            Some((_, min)) if k >= min => {}
            _ => best = Some((idx, k)),
        }
    }
    best.map(|(idx, _)| idx)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ends(remote_lid: u16) -> GroupEnds {
        GroupEnds {
            base_lid: Lid(1),
            remote_base_lid: Lid(remote_lid),
            port_guid: Guid(1),
            remote_port_guid: Guid(remote_lid as u64),
            node_guid: Guid(1),
            remote_node_guid: Guid(remote_lid as u64),
            local: NodeRef::Switch(SwitchId(0)),
            remote: NodeRef::Switch(SwitchId(1)),
        }
    }

    fn group() -> PortGroup {
        PortGroup::new(ends(2), false)
    }

    #[test]
    fn add_port_ignores_duplicates() {
        let mut g = group();
        g.add_port(3, 7);
        g.add_port(4, 8);
        g.add_port(3, 9);
        assert_eq!(g.port_nums().collect::<Vec<_>>(), vec![3, 4]);
        assert_eq!(g.ports[0].remote_port_num, 7);
    }

    #[test]
    fn parallel_links_fold_into_one_group() {
        let mut groups = Vec::new();
        assert!(add_to_groups(&mut groups, ends(2), false, 1, 5));
        assert!(!add_to_groups(&mut groups, ends(2), false, 2, 6));
        assert!(add_to_groups(&mut groups, ends(3), false, 3, 5));
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].ports.len(), 2);
        assert_eq!(groups[1].remote_base_lid, Lid(3));
    }

    #[test]
    fn least_loaded_prefers_first_minimum() {
        let mut g = group();
        g.add_port(1, 1);
        g.add_port(2, 2);
        g.add_port(3, 3);
        assert_eq!(g.least_loaded_up(), Some(0));
        g.ports[0].counter_up = 2;
        g.ports[1].counter_up = 1;
        g.ports[2].counter_up = 1;
        assert_eq!(g.least_loaded_up(), Some(1));
        g.ports[1].counter_down = 5;
        assert_eq!(g.least_loaded_down(), Some(0));
    }
}
