//! 交换机多级坐标（tuple）
//!
//! 8 字节，字节 0 为 rank；`0xFF` 表示该位未使用，字节 0 为 `0xFF` 表示未分配。
//! 全序为逐字节字典序。

use std::fmt;

use serde::{Deserialize, Serialize};

pub const TUPLE_LEN: usize = 8;
const FREE: u8 = 0xFF;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Tuple([u8; TUPLE_LEN]);

impl Default for Tuple {
    fn default() -> Self {
        Self::UNASSIGNED
    }
}

impl Tuple {
    pub const UNASSIGNED: Tuple = Tuple([FREE; TUPLE_LEN]);

    /// 未分配的 tuple
    pub fn new() -> Self {
        Self::UNASSIGNED
    }

    pub fn from_bytes(bytes: [u8; TUPLE_LEN]) -> Self {
        Self(bytes)
    }

    pub fn bytes(&self) -> &[u8; TUPLE_LEN] {
        &self.0
    }

    /// 索引起点：`[rank, 0, .., 0]`（rank 之后的位保持空闲）
    pub fn first(rank: u8) -> Self {
        let mut t = Self::UNASSIGNED;
        t.0[0] = rank;
        for b in t.0.iter_mut().skip(1).take(rank as usize) {
            *b = 0;
        }
        t
    }

    pub fn is_assigned(&self) -> bool {
        self.0[0] != FREE
    }

    pub fn rank(&self) -> u8 {
        self.0[0]
    }

    /// 修改某一位，越界时返回 `None`
    pub fn with(mut self, idx: usize, value: u8) -> Option<Self> {
        *self.0.get_mut(idx)? = value;
        Some(self)
    }

    /// 作为 64 位 map key（小端，纯内部规范化）
    pub fn to_key(&self) -> u64 {
        u64::from_le_bytes(self.0)
    }

    pub fn from_key(key: u64) -> Self {
        Self(key.to_le_bytes())
    }
}

impl fmt::Display for Tuple {
    /// 点分十进制，遇到第一个 `0xFF` 停止
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.is_assigned() {
            return f.write_str("INDEX.NOT.ASSIGNED");
        }
        for (i, b) in self.0.iter().take_while(|&&b| b != FREE).enumerate() {
            if i != 0 {
                f.write_str(".")?;
            }
            write!(f, "{b}")?;
        }
        Ok(())
    }
}
