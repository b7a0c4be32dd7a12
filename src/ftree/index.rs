//! 交换机索引（tuple 分配）与叶子数组
//!
//! 从第一个叶子交换机出发 BFS，为每台交换机分配唯一 tuple。
//! 向下一层时字节 0 加 1、改写字节 `rank + 1`；向上一层时字节 0 减 1、改写字节 `rank`。
//! 被改写的字节从 0 开始取第一个未被占用的值。

use std::collections::VecDeque;
use std::mem;

use tracing::{debug, trace};

use super::fabric::Fabric;
use super::port::{Direction, SwitchId};
use super::tuple::Tuple;
use crate::error::{FtreeError, Result};

impl Fabric {
    pub(crate) fn make_indexing(&mut self) -> Result<()> {
        let seed = self
            .switches
            .iter()
            .position(|sw| sw.is_leaf)
            .map(SwitchId)
            .ok_or_else(|| FtreeError::InsufficientFabric("no leaf switch".to_string()))?;

        let first = Tuple::first(self.switches[seed.0].rank);
        self.assign_tuple(seed, first);
        debug!(seed = %self.switches[seed.0].guid, tuple = %first, "索引起点");

        let mut queue = VecDeque::from([seed]);
        while let Some(id) = queue.pop_front() {
            let rank = self.switches[id.0].rank;
            if rank < self.leaf_switch_rank {
                self.index_neighbours(id, Direction::Down, &mut queue)?;
            }
            if rank != 0 {
                self.index_neighbours(id, Direction::Up, &mut queue)?;
            }
        }
        debug!(indexed = self.sw_by_tuple.len(), "交换机索引完成");
        Ok(())
    }

    fn assign_tuple(&mut self, id: SwitchId, tuple: Tuple) {
        self.switches[id.0].tuple = tuple;
        self.sw_by_tuple.insert(tuple.to_key(), id);
    }

    fn index_neighbours(
        &mut self,
        id: SwitchId,
        dir: Direction,
        queue: &mut VecDeque<SwitchId>,
    ) -> Result<()> {
        let from = self.switches[id.0].tuple;
        let remotes: Vec<SwitchId> = self.switches[id.0]
            .groups(dir)
            .iter()
            .filter_map(|g| g.remote_switch())
            .collect();

        for remote in remotes {
            if self.switches[remote.0].tuple.is_assigned() {
                continue;
            }
            let tuple = self.new_tuple(from, dir)?;
            self.assign_tuple(remote, tuple);
            trace!(
                from = %from,
                switch = %self.switches[remote.0].guid,
                tuple = %tuple,
                ?dir,
                "分配 tuple"
            );
            queue.push_back(remote);
        }

        self.sort_groups(id, dir);
        Ok(())
    }

    /// 相邻层第一个空闲的 tuple
    pub(crate) fn new_tuple(&self, from: Tuple, dir: Direction) -> Result<Tuple> {
        let exhausted = || FtreeError::FanoutExhausted {
            from,
            direction: dir,
        };
        let (rank, var_index) = match dir {
            Direction::Down => (from.rank().checked_add(1), from.rank() as usize + 1),
            Direction::Up => (from.rank().checked_sub(1), from.rank() as usize),
        };
        let base = rank
            .and_then(|r| from.with(0, r))
            .ok_or_else(exhausted)?;

        // 0xFF 保留为空闲标记
        for value in 0..u8::MAX {
            let candidate = base.with(var_index, value).ok_or_else(exhausted)?;
            if !self.sw_by_tuple.contains_key(&candidate.to_key()) {
                return Ok(candidate);
            }
        }
        Err(exhausted())
    }

    /// 按远端交换机 tuple 稳定排序，远端为 CA 的排在最后
    fn sort_groups(&mut self, id: SwitchId, dir: Direction) {
        let mut groups = mem::take(self.switches[id.0].groups_mut(dir));
        groups.sort_by_key(|g| {
            g.remote_switch()
                .map_or(Tuple::UNASSIGNED, |r| self.switches[r.0].tuple)
        });
        *self.switches[id.0].groups_mut(dir) = groups;
    }

    /// 叶子层交换机按 tuple 排序，去掉首尾不连接计算节点的交换机
    pub(crate) fn create_leaf_switch_array(&mut self) {
        let mut at_rank: Vec<SwitchId> = (0..self.switches.len())
            .map(SwitchId)
            .filter(|id| self.switches[id.0].rank == self.leaf_switch_rank)
            .collect();
        at_rank.sort_by_key(|id| self.switches[id.0].tuple);

        let first = at_rank.iter().position(|id| self.switches[id.0].is_leaf);
        let last = at_rank.iter().rposition(|id| self.switches[id.0].is_leaf);
        self.leaf_switches = match (first, last) {
            (Some(first), Some(last)) => at_rank[first..=last].to_vec(),
            _ => Vec::new(),
        };
        debug!(leaves = self.leaf_switches.len(), "叶子交换机数组");
    }

    /// 单个叶子交换机下计算节点数的最大值
    pub(crate) fn set_max_cn_per_leaf(&mut self) {
        self.max_cn_per_leaf = self
            .leaf_switches
            .iter()
            .map(|id| {
                self.switches[id.0]
                    .down_groups
                    .iter()
                    .filter_map(|g| g.remote_hca())
                    .map(|hca| self.hcas[hca.0].cn_num)
                    .sum::<u32>()
            })
            .max()
            .unwrap_or(0);
        debug!(max_cn_per_leaf = self.max_cn_per_leaf, "单叶子最大计算节点数");
    }
}
