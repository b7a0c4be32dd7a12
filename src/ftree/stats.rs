//! 路由统计

use serde::Serialize;

/// 一轮路由的计数
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RoutingStats {
    /// 计算节点目标
    pub cn_routes: u64,
    /// 为平衡计数器补齐的占位目标
    pub dummy_routes: u64,
    pub non_cn_routes: u64,
    pub switch_routes: u64,
    /// 新增的转发表项（覆盖已有表项不计）
    pub lft_entries: u64,
    /// 向下遍历时遇到已有跳数而跳过的端口组
    pub loops_skipped: u64,
}
