//! fat-tree 交换机节点

use super::port::{Direction, PortGroup};
use super::tables::{ForwardingTable, HopMatrix};
use super::tuple::Tuple;
use crate::subnet::{Guid, Lid};

#[derive(Debug, Clone)]
pub struct FtreeSwitch {
    pub guid: Guid,
    pub base_lid: Lid,
    pub description: String,
    /// 到根的距离，根为 0
    pub rank: u8,
    pub tuple: Tuple,
    /// 索引后按远端 tuple 排序
    pub down_groups: Vec<PortGroup>,
    pub up_groups: Vec<PortGroup>,
    pub is_leaf: bool,
    /// 向下遍历的轮转起点；在整轮路由中持续推进，其取值只在内部使用
    pub(crate) down_cursor: usize,
    /// 物理端口数（含 port 0）
    pub(crate) num_ports: usize,
    pub lft: ForwardingTable,
    pub hops: HopMatrix,
}

impl FtreeSwitch {
    pub fn new(guid: Guid, base_lid: Lid, num_ports: usize, description: impl Into<String>) -> Self {
        Self {
            guid,
            base_lid,
            description: description.into(),
            rank: 0,
            tuple: Tuple::UNASSIGNED,
            down_groups: Vec::new(),
            up_groups: Vec::new(),
            is_leaf: false,
            down_cursor: 0,
            num_ports,
            lft: ForwardingTable::default(),
            hops: HopMatrix::default(),
        }
    }

    pub fn groups(&self, dir: Direction) -> &[PortGroup] {
        match dir {
            Direction::Down => &self.down_groups,
            Direction::Up => &self.up_groups,
        }
    }

    pub(crate) fn groups_mut(&mut self, dir: Direction) -> &mut Vec<PortGroup> {
        match dir {
            Direction::Down => &mut self.down_groups,
            Direction::Up => &mut self.up_groups,
        }
    }

    pub fn group_by_remote_lid(&self, dir: Direction, lid: Lid) -> Option<&PortGroup> {
        self.groups(dir).iter().find(|g| g.remote_base_lid == lid)
    }

    pub fn least_hops(&self, lid: Lid) -> Option<u8> {
        self.hops.least(lid)
    }

    pub(crate) fn allocate_tables(&mut self, max_lid: Lid) {
        self.lft = ForwardingTable::new(max_lid);
        self.hops = HopMatrix::new(max_lid, self.num_ports);
    }

    /// 推进轮转游标，返回本次遍历的起始下标
    pub(crate) fn advance_down_cursor(&mut self) -> Option<usize> {
        let n = self.down_groups.len();
        if n == 0 {
            return None;
        }
        self.down_cursor = (self.down_cursor + 1) % n;
        Some(self.down_cursor)
    }
}
