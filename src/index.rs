use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::error::{ImportError, Result};

/// 匹配索引要求的文档类型标签
const INDEX_TYPE: &str = "match_index";

/// 匹配索引文档，枚举所有图像配对及其匹配数据的位置
///
/// 两层映射都使用 BTreeMap，保证配对按图像路径的字典序迭代，
/// 相机和图像 ID 的分配顺序完全由索引内容决定
#[derive(Debug, Deserialize)]
pub struct MatchIndex {
    /// 文档类型标签，必须为 "match_index"
    #[serde(rename = "type")]
    pub kind: String,
    /// 外层按图像路径、内层按对侧图像路径索引的配对表
    pub matches: BTreeMap<String, BTreeMap<String, MatchRef>>,
}

/// 配对表中单个方向的条目
#[derive(Debug, Deserialize)]
pub struct MatchRef {
    /// 匹配数据文件的标识，即相对索引目录的路径
    pub id: String,
    /// 镜像条目标记，反向条目不参与导入
    pub reversed: bool,
}

impl MatchIndex {
    /// 从文件加载并校验匹配索引
    pub fn load(path: &Path) -> Result<Self> {
        let data = fs::read_to_string(path)?;
        let index: MatchIndex = serde_json::from_str(&data)?;
        if index.kind != INDEX_TYPE {
            return Err(ImportError::Format(format!(
                "匹配索引类型应为 {INDEX_TYPE}，实际为 {}",
                index.kind
            )));
        }
        Ok(index)
    }

    /// 按外层路径的字典序迭代所有非反向配对
    pub fn pairs(&self) -> impl Iterator<Item = (&str, &str, &MatchRef)> {
        self.matches.iter().flat_map(|(a, inner)| {
            inner
                .iter()
                .filter(|(_, m)| !m.reversed)
                .map(move |(b, m)| (a.as_str(), b.as_str(), m))
        })
    }

    /// 非反向配对的总数
    pub fn pair_count(&self) -> usize {
        self.pairs().count()
    }

    /// 索引中出现的图像数量
    pub fn image_count(&self) -> usize {
        self.matches.len()
    }
}
