use serde::{Deserialize, Serialize};

use super::node::SubnetNode;

/// 子网 JSON 文件格式
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubnetSpec {
    pub schema_version: u32,
    #[serde(default)]
    pub nodes: Vec<SubnetNode>,
}

impl SubnetSpec {
    pub const SCHEMA_VERSION: u32 = 1;
}
