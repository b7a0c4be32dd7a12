//! k-ary fat-tree 拓扑构建
//!
//! 三层：`(k/2)^2` 台核心交换机、`k` 个 pod（每个 pod `k/2` 台汇聚 + `k/2` 台边缘交换机）、
//! 每台边缘交换机下 `k/2` 个 CA。

use tracing::debug;

use super::alloc::Allocator;
use crate::error::{FtreeError, Result};
use crate::subnet::{Guid, Subnet};

#[derive(Debug, Clone)]
pub struct FatTreeOpts {
    pub k: usize,
    /// 每对边缘/汇聚交换机之间的并行链路数
    pub links_per_pair: usize,
}

impl Default for FatTreeOpts {
    fn default() -> Self {
        Self {
            k: 4,
            links_per_pair: 1,
        }
    }
}

#[derive(Debug, Clone)]
pub struct FatTreeTopology {
    pub k: usize,
    pub hosts: Vec<Guid>,
    pub edge_switches: Vec<Guid>,
    pub agg_switches: Vec<Guid>,
    pub core_switches: Vec<Guid>,
}

impl FatTreeTopology {
    fn half(&self) -> usize {
        self.k / 2
    }

    pub fn host(&self, pod: usize, edge: usize, host: usize) -> Guid {
        let half = self.half();
        let idx = (pod * half + edge) * half + host;
        self.hosts[idx]
    }

    pub fn edge(&self, pod: usize, edge: usize) -> Guid {
        let half = self.half();
        let idx = pod * half + edge;
        self.edge_switches[idx]
    }

    pub fn agg(&self, pod: usize, agg: usize) -> Guid {
        let half = self.half();
        let idx = pod * half + agg;
        self.agg_switches[idx]
    }

    pub fn core(&self, group: usize, index: usize) -> Guid {
        let half = self.half();
        let idx = group * half + index;
        self.core_switches[idx]
    }
}

/// 端口号：边缘交换机 1..=k/2 接 CA，之后接汇聚；汇聚 1.. 接边缘，之后接核心；核心按 pod 编号
pub fn build_fat_tree(subnet: &mut Subnet, opts: &FatTreeOpts) -> Result<FatTreeTopology> {
    let k = opts.k;
    if k < 2 || k % 2 != 0 {
        return Err(FtreeError::GeneratorOptions(format!(
            "fat-tree k must be even and >= 2, got {k}"
        )));
    }
    let links = opts.links_per_pair.max(1);
    let half = k / 2;
    let edge_ports = half + half * links;
    let agg_ports = half * links + half;
    let max_ports = edge_ports.max(agg_ports).max(k);
    let num_ports = u8::try_from(max_ports + 1).map_err(|_| {
        FtreeError::GeneratorOptions(format!("fat-tree k={k} needs {max_ports} ports per switch"))
    })?;

    let mut alloc = Allocator::default();

    let mut core_switches = Vec::with_capacity(half * half);
    for group in 0..half {
        for index in 0..half {
            let name = format!("c{}_{}", group, index);
            core_switches.push(alloc.switch(subnet, num_ports, name)?);
        }
    }

    let mut hosts = Vec::with_capacity(k * half * half);
    let mut edge_switches = Vec::with_capacity(k * half);
    let mut agg_switches = Vec::with_capacity(k * half);

    for pod in 0..k {
        let mut edges = Vec::with_capacity(half);
        let mut aggs = Vec::with_capacity(half);
        for edge in 0..half {
            edges.push(alloc.switch(subnet, num_ports, format!("p{}_e{}", pod, edge))?);
        }
        for agg in 0..half {
            aggs.push(alloc.switch(subnet, num_ports, format!("p{}_a{}", pod, agg))?);
        }

        for (edge_idx, &edge_id) in edges.iter().enumerate() {
            for host in 0..half {
                let name = format!("h{}_{}_{}", pod, edge_idx, host);
                let host_id = alloc.ca(subnet, 1, name)?;
                subnet.connect(host_id, 1, edge_id, port(host + 1)?)?;
                hosts.push(host_id);
            }
        }

        for (edge_idx, &edge_id) in edges.iter().enumerate() {
            for (agg_idx, &agg_id) in aggs.iter().enumerate() {
                for link in 0..links {
                    let edge_port = half + agg_idx * links + link + 1;
                    let agg_port = edge_idx * links + link + 1;
                    subnet.connect(edge_id, port(edge_port)?, agg_id, port(agg_port)?)?;
                }
            }
        }

        for (agg_idx, &agg_id) in aggs.iter().enumerate() {
            for index in 0..half {
                let core_id = core_switches[agg_idx * half + index];
                let agg_port = half * links + index + 1;
                subnet.connect(agg_id, port(agg_port)?, core_id, port(pod + 1)?)?;
            }
        }

        edge_switches.extend(edges);
        agg_switches.extend(aggs);
    }

    debug!(
        k,
        hosts = hosts.len(),
        switches = core_switches.len() + edge_switches.len() + agg_switches.len(),
        "生成 fat-tree"
    );

    Ok(FatTreeTopology {
        k,
        hosts,
        edge_switches,
        agg_switches,
        core_switches,
    })
}

pub(crate) fn port(num: usize) -> Result<u8> {
    u8::try_from(num).map_err(|_| FtreeError::GeneratorOptions(format!("port {num} out of range")))
}
