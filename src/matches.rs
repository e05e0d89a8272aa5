use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use byteorder::{LittleEndian, WriteBytesExt};
use serde::{Deserialize, Serialize};

use crate::error::{ImportError, Result};

/// 图像 ID 上限，同时是配对 ID 公式的系数
///
/// 配对 ID = min(id) * MAX_IMAGE_ID + max(id)，图像 ID 必须严格
/// 小于该值，否则不同配对会折叠到同一个 ID
pub const MAX_IMAGE_ID: i64 = 2147483647;

/// 一个配对的匹配数据，由特征管线以 bincode 序列化
#[derive(Debug, Serialize, Deserialize)]
pub struct MatchRecord {
    /// 匹配的特征点下标，每行为 (前一图下标, 后一图下标)
    pub matches: Vec<[u32; 2]>,
    /// 与 matches 等长的匹配距离，越小越好
    pub distances: Vec<f32>,
    /// 前一图特征点文件的路径
    pub features_0: String,
    /// 后一图特征点文件的路径
    pub features_1: String,
}

impl MatchRecord {
    /// 从 bincode 文件加载匹配数据
    pub fn load(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        let record: MatchRecord = bincode::deserialize_from(BufReader::new(file))?;
        if record.matches.len() != record.distances.len() {
            return Err(ImportError::Format(format!(
                "匹配与距离的数量不一致: {} != {}",
                record.matches.len(),
                record.distances.len()
            )));
        }
        Ok(record)
    }
}

/// 按距离选出最优的 max 条匹配，保持原有相对顺序
///
/// max 为 None 或不小于总数时原样返回；距离相同时优先保留下标靠前的。
/// 调用方保证两个切片等长，[`MatchRecord::load`] 已做过校验
pub fn select_top_k(matches: &[[u32; 2]], distances: &[f32], max: Option<usize>) -> Vec<[u32; 2]> {
    debug_assert_eq!(matches.len(), distances.len(), "匹配与距离的数量必须一致");

    let Some(max) = max else {
        return matches.to_vec();
    };
    if max >= matches.len() {
        return matches.to_vec();
    }

    let mut order: Vec<usize> = (0..matches.len()).collect();
    order.sort_by(|&a, &b| distances[a].total_cmp(&distances[b]));
    order.truncate(max);
    order.sort_unstable();
    order.into_iter().map(|i| matches[i]).collect()
}

/// 规范化配对方向，使第一列总是对应 ID 较小的图像
///
/// id_a > id_b 时交换每行的两列，返回的配对 ID 与输入方向无关
pub fn canonicalize(id_a: i64, id_b: i64, mut matches: Vec<[u32; 2]>) -> (i64, Vec<[u32; 2]>) {
    if id_a > id_b {
        for m in &mut matches {
            m.swap(0, 1);
        }
    }
    (pair_id(id_a, id_b), matches)
}

/// 计算与方向无关的配对 ID
pub fn pair_id(id_a: i64, id_b: i64) -> i64 {
    let (lo, hi) = if id_a <= id_b { (id_a, id_b) } else { (id_b, id_a) };
    lo * MAX_IMAGE_ID + hi
}

/// 将匹配编码为 N×2 的 uint32 小端 blob
pub fn encode(matches: &[[u32; 2]]) -> Result<Vec<u8>> {
    let mut data = Vec::with_capacity(matches.len() * 8);
    for m in matches {
        data.write_u32::<LittleEndian>(m[0])?;
        data.write_u32::<LittleEndian>(m[1])?;
    }
    Ok(data)
}
