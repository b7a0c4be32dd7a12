//! 子网发现数据模块
//!
//! 路由引擎的输入：发现阶段得到的节点、端口与链路快照。

// 子模块声明
mod id;
mod node;
mod spec;
mod topology;

// 重新导出公共接口
pub use id::{Guid, Lid};
pub use node::{NodeKind, PhysPort, RemoteEnd, SubnetNode};
pub use spec::SubnetSpec;
pub use topology::Subnet;
