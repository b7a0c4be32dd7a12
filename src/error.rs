//! 错误类型
//!
//! fat-tree 路由任何一步失败都会中止整轮计算，调用方应回退到其它路由算法。

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::ftree::{Direction, Tuple};
use crate::subnet::Guid;

pub type Result<T, E = FtreeError> = std::result::Result<T, E>;

/// 拓扑结构上不可能出现在 fat-tree 中的情形
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TopologyViolation {
    #[error("CA {local} is connected directly to CA {remote}")]
    CaToCa { local: Guid, remote: Guid },

    #[error(
        "illegal link between switches with ranks {local_rank} and {remote_rank}: {local} <-> {remote}"
    )]
    RankInconsistency {
        local: Guid,
        local_rank: u8,
        remote: Guid,
        remote_rank: u8,
    },

    #[error("switch {0} could not be ranked (not connected to the tree)")]
    UnrankedSwitch(Guid),

    #[error("port {port} of node {node} has a dangling link")]
    DanglingLink { node: Guid, port: u8 },
}

#[derive(Debug, Error)]
pub enum FtreeError {
    #[error("node {guid}: unrecognized node type")]
    UnrecognizedNodeType { guid: Guid },

    #[error("illegal topology: {0}")]
    IllegalTopology(#[from] TopologyViolation),

    #[error("no valid root switches supplied")]
    NoValidRoots,

    #[error(
        "CN port {port_guid} is connected to switch {switch} with rank {rank}, while fat-tree leaf rank is {leaf_rank}"
    )]
    LeafRankMismatch {
        port_guid: Guid,
        switch: Guid,
        rank: u8,
        leaf_rank: u8,
    },

    #[error("fabric topology is not a fat-tree: {0}")]
    NotAFatTree(String),

    #[error("no free tuple left going {direction:?} from switch index {from}")]
    FanoutExhausted { from: Tuple, direction: Direction },

    #[error("fat-tree rank is {rank} (should be between {min} and {max})")]
    TreeRankOutOfBounds { rank: u32, min: u32, max: u32 },

    #[error("LMC {0} > 0 is not supported by fat-tree routing")]
    LmcNotSupported(u8),

    #[error("insufficient fabric: {0}")]
    InsufficientFabric(String),

    #[error("cannot read guid file {path}: {source}")]
    ConfigIo {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("guid file {path}, line {line}: cannot parse {content:?}")]
    ConfigParse {
        path: PathBuf,
        line: usize,
        content: String,
    },

    #[error("guid file {0} has no valid guids")]
    EmptyGuidList(PathBuf),

    #[error("invalid config json: {0}")]
    ConfigJson(String),

    #[error("cannot read subnet file {path}: {source}")]
    SubnetIo {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid generator options: {0}")]
    GeneratorOptions(String),

    #[error("cannot write dump file {path}: {source}")]
    DumpIo {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid subnet json: {0}")]
    SubnetJson(#[from] serde_json::Error),

    #[error("cannot serialize {what}: {source}")]
    Export {
        what: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

impl FtreeError {
    /// 输出结果序列化失败
    pub fn export(what: &'static str) -> impl FnOnce(serde_json::Error) -> Self {
        move |source| Self::Export { what, source }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn export_failures_are_not_reported_as_bad_input() {
        let source = serde_json::from_str::<u8>("x").expect_err("bad json");
        let err = FtreeError::export("routing tables")(source);
        let msg = err.to_string();
        assert!(msg.starts_with("cannot serialize routing tables"), "{msg}");
        assert!(!msg.contains("invalid subnet json"));
    }
}
