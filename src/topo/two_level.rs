//! 两层 leaf/spine 拓扑构建

use tracing::debug;

use super::alloc::Allocator;
use super::fat_tree::port;
use crate::error::{FtreeError, Result};
use crate::subnet::{Guid, Subnet};

#[derive(Debug, Clone)]
pub struct TwoLevelOpts {
    pub leaves: usize,
    pub spines: usize,
    pub hosts_per_leaf: usize,
    /// 每对 leaf/spine 之间的并行链路数
    pub links_per_pair: usize,
}

impl Default for TwoLevelOpts {
    fn default() -> Self {
        Self {
            leaves: 2,
            spines: 2,
            hosts_per_leaf: 2,
            links_per_pair: 1,
        }
    }
}

#[derive(Debug, Clone)]
pub struct TwoLevelTopology {
    pub leaves: Vec<Guid>,
    pub spines: Vec<Guid>,
    /// 按 leaf 分组，组内按端口顺序
    pub hosts: Vec<Guid>,
    pub hosts_per_leaf: usize,
}

impl TwoLevelTopology {
    pub fn host(&self, leaf: usize, host: usize) -> Guid {
        self.hosts[leaf * self.hosts_per_leaf + host]
    }
}

/// 端口号：leaf 1..=hosts 接 CA，之后按 spine 顺序接上行；spine 按 leaf 顺序接下行
pub fn build_two_level(subnet: &mut Subnet, opts: &TwoLevelOpts) -> Result<TwoLevelTopology> {
    if opts.leaves == 0 || opts.spines == 0 {
        return Err(FtreeError::GeneratorOptions(
            "two-level tree needs at least one leaf and one spine".to_string(),
        ));
    }
    let links = opts.links_per_pair.max(1);
    let leaf_ports = opts.hosts_per_leaf + opts.spines * links;
    let spine_ports = opts.leaves * links;
    let num_ports = port(leaf_ports.max(spine_ports) + 1)?;

    let mut alloc = Allocator::default();
    let spines: Vec<Guid> = (0..opts.spines)
        .map(|s| alloc.switch(subnet, num_ports, format!("spine{s}")))
        .collect::<Result<_>>()?;
    let leaves: Vec<Guid> = (0..opts.leaves)
        .map(|l| alloc.switch(subnet, num_ports, format!("leaf{l}")))
        .collect::<Result<_>>()?;

    let mut hosts = Vec::with_capacity(opts.leaves * opts.hosts_per_leaf);
    for (leaf_idx, &leaf) in leaves.iter().enumerate() {
        for host in 0..opts.hosts_per_leaf {
            let ca = alloc.ca(subnet, 1, format!("h{leaf_idx}_{host}"))?;
            subnet.connect(ca, 1, leaf, port(host + 1)?)?;
            hosts.push(ca);
        }
        for (spine_idx, &spine) in spines.iter().enumerate() {
            for link in 0..links {
                let leaf_port = opts.hosts_per_leaf + spine_idx * links + link + 1;
                let spine_port = leaf_idx * links + link + 1;
                subnet.connect(leaf, port(leaf_port)?, spine, port(spine_port)?)?;
            }
        }
    }

    debug!(
        leaves = leaves.len(),
        spines = spines.len(),
        hosts = hosts.len(),
        "生成两层树"
    );

    Ok(TwoLevelTopology {
        leaves,
        spines,
        hosts,
        hosts_per_leaf: opts.hosts_per_leaf,
    })
}
