//! 标识符类型
//!
//! 定义节点/端口 GUID 与 LID。

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// 64 位全局唯一标识（节点 GUID 或端口 GUID）
///
/// JSON 中以 `"0x..."` 十六进制字符串表示。
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Guid(pub u64);

/// 本地标识（16 位），0 表示未分配
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Lid(pub u16);

impl Lid {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for Lid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for Guid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:016x}", self.0)
    }
}

impl FromStr for Guid {
    type Err = String;

    /// 接受 `0x` 前缀的十六进制或十进制。
    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let s = raw.trim();
        let parsed = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
            Some(hex) => u64::from_str_radix(hex, 16),
            None => s.parse::<u64>(),
        };
        parsed
            .map(Guid)
            .map_err(|e| format!("invalid guid {raw:?}: {e}"))
    }
}

impl TryFrom<String> for Guid {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Guid> for String {
    fn from(value: Guid) -> Self {
        value.to_string()
    }
}
