//! 子网拓扑生成器
//!
//! 生成确定性的发现快照（GUID/LID 按创建顺序分配），供命令行工具与测试使用。

// 子模块声明
mod alloc;
pub mod fat_tree;
pub mod two_level;

// 重新导出公共接口
pub use fat_tree::{FatTreeOpts, FatTreeTopology, build_fat_tree};
pub use two_level::{TwoLevelOpts, TwoLevelTopology, build_two_level};
