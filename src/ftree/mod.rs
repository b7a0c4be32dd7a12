//! fat-tree 单播路由引擎
//!
//! 输入为发现阶段的子网快照与路由选项，输出每台交换机的转发表与最小跳数表。
//! 任何一步失败都返回错误，不产出部分结果。

// 子模块声明
pub mod dump;
pub mod fabric;
pub mod hca;
pub mod port;
pub mod route;
pub mod stats;
pub mod switch;
pub mod tables;
pub mod tuple;

mod construct;
mod index;
mod rank;
mod validate;

// 重新导出公共接口
pub use dump::{CA_ORDER_FILE, CaOrderEntry, write_ca_ordering};
pub use fabric::{Fabric, MAX_TREE_RANK, MIN_TREE_RANK};
pub use hca::FtreeHca;
pub use port::{Direction, GroupEnds, HcaId, NodeRef, Port, PortGroup, SwitchId};
pub use route::RouteTarget;
pub use stats::RoutingStats;
pub use switch::FtreeSwitch;
pub use tables::{ForwardingTable, HopMatrix, NO_PATH, RoutingTables, SwitchTables};
pub use tuple::{TUPLE_LEN, Tuple};

use crate::config::RoutingOptions;
use crate::error::Result;
use crate::subnet::Subnet;

/// 一轮成功路由的全部结果
#[derive(Debug, Clone)]
pub struct RoutingOutcome {
    pub tables: RoutingTables,
    pub stats: RoutingStats,
    pub ca_order: Vec<CaOrderEntry>,
}

/// 构建 fabric 并计算全部路由
pub fn route(subnet: &Subnet, options: RoutingOptions) -> Result<RoutingOutcome> {
    let mut fabric = Fabric::build(subnet, options)?;
    let stats = fabric.route();
    Ok(RoutingOutcome {
        tables: fabric.tables(),
        stats,
        ca_order: fabric.ca_ordering(),
    })
}
