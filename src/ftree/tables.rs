//! 转发表与跳数表
//!
//! 交换机持有的两张表按 LID 索引，大小为 fabric 最大 LID + 1。
//! 导出结果 `RoutingTables` 可直接序列化为 JSON。

use serde::{Deserialize, Serialize};

use crate::error::{FtreeError, Result};
use crate::subnet::{Guid, Lid};

/// 转发表/跳数表中的"无路径"
pub const NO_PATH: u8 = 0xFF;

/// LID -> 出端口
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ForwardingTable {
    ports: Vec<u8>,
}

impl ForwardingTable {
    pub fn new(max_lid: Lid) -> Self {
        Self {
            ports: vec![NO_PATH; max_lid.index() + 1],
        }
    }

    pub fn get(&self, lid: Lid) -> Option<u8> {
        self.ports
            .get(lid.index())
            .copied()
            .filter(|&p| p != NO_PATH)
    }

    pub fn is_set(&self, lid: Lid) -> bool {
        self.get(lid).is_some()
    }

    /// 写入表项，返回该 LID 是否为新增；越界 LID 忽略
    pub(crate) fn set(&mut self, lid: Lid, port: u8) -> bool {
        match self.ports.get_mut(lid.index()) {
            Some(slot) => {
                let added = *slot == NO_PATH;
                *slot = port;
                added
            }
            None => false,
        }
    }

    /// 已设置的表项数
    pub fn populated(&self) -> usize {
        self.ports.iter().filter(|&&p| p != NO_PATH).count()
    }

    pub fn len(&self) -> usize {
        self.ports.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ports.is_empty()
    }

    pub fn entries(&self) -> Vec<Option<u8>> {
        self.ports
            .iter()
            .map(|&p| (p != NO_PATH).then_some(p))
            .collect()
    }
}

/// LID × 端口 的跳数矩阵
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HopMatrix {
    width: usize,
    hops: Vec<u8>,
}

impl HopMatrix {
    pub fn new(max_lid: Lid, num_ports: usize) -> Self {
        Self {
            width: num_ports,
            hops: vec![NO_PATH; (max_lid.index() + 1) * num_ports],
        }
    }

    fn row(&self, lid: Lid) -> Option<&[u8]> {
        let start = lid.index().checked_mul(self.width)?;
        self.hops.get(start..start + self.width)
    }

    pub fn get(&self, lid: Lid, port: u8) -> Option<u8> {
        self.row(lid)?
            .get(port as usize)
            .copied()
            .filter(|&h| h != NO_PATH)
    }

    pub(crate) fn set(&mut self, lid: Lid, port: u8, hops: u8) -> bool {
        if port as usize >= self.width {
            return false;
        }
        let idx = lid.index() * self.width + port as usize;
        match self.hops.get_mut(idx) {
            Some(slot) => {
                *slot = hops;
                true
            }
            None => false,
        }
    }

    /// 所有端口中的最小跳数
    pub fn least(&self, lid: Lid) -> Option<u8> {
        self.row(lid)?
            .iter()
            .copied()
            .filter(|&h| h != NO_PATH)
            .min()
    }
}

/// 单台交换机的路由结果
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwitchTables {
    pub guid: Guid,
    pub lid: Lid,
    pub rank: u8,
    pub tuple: String,
    /// 下标为 LID
    pub lft: Vec<Option<u8>>,
    /// 下标为 LID
    pub min_hops: Vec<Option<u8>>,
}

impl SwitchTables {
    pub fn next_port(&self, lid: Lid) -> Option<u8> {
        self.lft.get(lid.index()).copied().flatten()
    }

    pub fn min_hops(&self, lid: Lid) -> Option<u8> {
        self.min_hops.get(lid.index()).copied().flatten()
    }
}

/// 一轮路由的全部输出，交换机按 GUID 排序
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoutingTables {
    pub max_lid: Lid,
    pub switches: Vec<SwitchTables>,
}

impl RoutingTables {
    pub fn switch(&self, guid: Guid) -> Option<&SwitchTables> {
        self.switches
            .binary_search_by_key(&guid, |s| s.guid)
            .ok()
            .map(|idx| &self.switches[idx])
    }

    pub fn to_json_string(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(FtreeError::export("routing tables"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn forwarding_table_ignores_out_of_range() {
        let mut lft = ForwardingTable::new(Lid(4));
        assert_eq!(lft.len(), 5);
        assert!(lft.set(Lid(3), 7));
        assert!(!lft.set(Lid(9), 1));
        assert_eq!(lft.get(Lid(3)), Some(7));
        assert_eq!(lft.get(Lid(2)), None);
        assert_eq!(lft.get(Lid(9)), None);
        assert_eq!(lft.entries()[3], Some(7));
    }

    #[test]
    fn overwriting_an_entry_is_not_a_new_entry() {
        let mut lft = ForwardingTable::new(Lid(4));
        assert!(lft.set(Lid(2), 1));
        assert!(!lft.set(Lid(2), 3));
        assert_eq!(lft.get(Lid(2)), Some(3));
        assert!(lft.set(Lid(4), 0));
        assert_eq!(lft.populated(), 2);
    }

    #[test]
    fn hop_matrix_reports_minimum_over_ports() {
        let mut hops = HopMatrix::new(Lid(3), 4);
        assert_eq!(hops.least(Lid(2)), None);
        hops.set(Lid(2), 1, 3);
        hops.set(Lid(2), 3, 2);
        assert!(!hops.set(Lid(2), 4, 1));
        assert_eq!(hops.get(Lid(2), 1), Some(3));
        assert_eq!(hops.least(Lid(2)), Some(2));
        assert_eq!(hops.least(Lid(1)), None);
        assert_eq!(hops.least(Lid(10)), None);
    }
}
