//! fat-tree CA 节点

use super::port::PortGroup;
use crate::subnet::{Guid, Lid};

#[derive(Debug, Clone)]
pub struct FtreeHca {
    pub guid: Guid,
    pub description: String,
    /// 全部指向交换机
    pub up_groups: Vec<PortGroup>,
    /// 被标记为计算节点的端口数
    pub cn_num: u32,
}

impl FtreeHca {
    pub fn new(guid: Guid, description: impl Into<String>) -> Self {
        Self {
            guid,
            description: description.into(),
            up_groups: Vec::new(),
            cn_num: 0,
        }
    }

    pub fn group_by_remote_lid(&self, lid: Lid) -> Option<&PortGroup> {
        self.up_groups.iter().find(|g| g.remote_base_lid == lid)
    }
}
