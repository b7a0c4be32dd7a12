//! 路由配置
//!
//! 根交换机 / 计算节点 GUID 列表文件，以及可选的 JSON 配置。
//!
//! GUID 列表文件每行一个 GUID（`0x` 十六进制或十进制），`#` 开头的行与空行忽略，
//! GUID 之后的内容（通常是节点名）忽略。

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{FtreeError, Result};
use crate::subnet::Guid;

/// 用户配置（所有字段可缺省）
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FtreeConfig {
    #[serde(default)]
    pub root_guid_file: Option<PathBuf>,
    #[serde(default)]
    pub cn_guid_file: Option<PathBuf>,
    /// CA 排序文件输出目录
    #[serde(default)]
    pub dump_dir: Option<PathBuf>,
    #[serde(default)]
    pub lmc: u8,
}

/// 引擎实际消费的选项（不做任何 I/O）
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoutingOptions {
    /// `None` 表示从 CA 自动推断根
    pub roots: Option<Vec<Guid>>,
    /// `None` 表示所有 CA 端口都是计算节点
    pub compute_nodes: Option<BTreeSet<Guid>>,
    pub lmc: u8,
}

impl RoutingOptions {
    pub fn roots_provided(&self) -> bool {
        self.roots.is_some()
    }

    /// 端口是否为计算节点
    pub fn is_compute_node(&self, port_guid: Guid) -> bool {
        self.compute_nodes
            .as_ref()
            .is_none_or(|set| set.contains(&port_guid))
    }
}

impl FtreeConfig {
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path).map_err(|source| FtreeError::ConfigIo {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&raw).map_err(|e| FtreeError::ConfigJson(e.to_string()))
    }

    /// 读取 GUID 文件，生成 `RoutingOptions`
    pub fn resolve(&self) -> Result<RoutingOptions> {
        let roots = match &self.root_guid_file {
            Some(path) => {
                debug!(path = %path.display(), "读取根交换机列表");
                Some(load_guid_file(path)?)
            }
            None => None,
        };
        let compute_nodes = match &self.cn_guid_file {
            Some(path) => {
                debug!(path = %path.display(), "读取计算节点列表");
                Some(load_guid_file(path)?.into_iter().collect::<BTreeSet<_>>())
            }
            None => None,
        };
        info!(
            roots = roots.as_ref().map(Vec::len),
            compute_nodes = compute_nodes.as_ref().map(BTreeSet::len),
            lmc = self.lmc,
            "路由选项就绪"
        );
        Ok(RoutingOptions {
            roots,
            compute_nodes,
            lmc: self.lmc,
        })
    }
}

/// 读取 GUID 列表文件；空列表视为错误
pub fn load_guid_file(path: &Path) -> Result<Vec<Guid>> {
    let raw = fs::read_to_string(path).map_err(|source| FtreeError::ConfigIo {
        path: path.to_path_buf(),
        source,
    })?;
    let guids = parse_guid_list(&raw).map_err(|(line, content)| FtreeError::ConfigParse {
        path: path.to_path_buf(),
        line,
        content,
    })?;
    if guids.is_empty() {
        return Err(FtreeError::EmptyGuidList(path.to_path_buf()));
    }
    Ok(guids)
}

/// 解析 GUID 列表文本，出错时返回 (行号, 行内容)
pub fn parse_guid_list(raw: &str) -> std::result::Result<Vec<Guid>, (usize, String)> {
    let mut guids = Vec::new();
    for (idx, line) in raw.lines().enumerate() {
        let trimmed = line.trim_start();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let token = trimmed.split_whitespace().next().unwrap_or_default();
        let guid = token
            .parse::<Guid>()
            .map_err(|_| (idx + 1, line.to_string()))?;
        guids.push(guid);
    }
    Ok(guids)
}
