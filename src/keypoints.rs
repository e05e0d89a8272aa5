use std::fs::File;
use std::path::Path;

use byteorder::{LittleEndian, WriteBytesExt};
use ndarray::{Array2, ArrayView2};
use ndarray_npy::ReadNpyExt;

use crate::error::{ImportError, Result};

/// 编码后每个特征点的列数: (x, y, scale, orientation)
pub const KEYPOINT_COLS: usize = 4;

/// 编码完成的特征点表
#[derive(Debug)]
pub struct EncodedKeypoints {
    /// 特征点数量
    pub rows: usize,
    /// 每行列数，恒为 [`KEYPOINT_COLS`]
    pub cols: usize,
    /// rows × cols 的 float32 小端字节
    pub data: Vec<u8>,
}

/// 从 npy 文件读取 N×2 的特征点坐标
pub fn read_positions(path: &Path) -> Result<Array2<f32>> {
    let file = File::open(path)?;
    Ok(Array2::read_npy(file)?)
}

/// 将 N×2 坐标编码为 N×4 的 float32 小端 blob
///
/// 下游按 (x, y, scale, orientation) 解读每行，坐标之外
/// 统一填充 scale = 1.0、orientation = 0.0
pub fn encode(positions: ArrayView2<'_, f32>) -> Result<EncodedKeypoints> {
    if positions.ncols() != 2 {
        return Err(ImportError::Format(format!(
            "特征点坐标应为 N×2，实际为 {}×{}",
            positions.nrows(),
            positions.ncols()
        )));
    }

    let rows = positions.nrows();
    let mut data = Vec::with_capacity(rows * KEYPOINT_COLS * 4);
    for row in positions.rows() {
        data.write_f32::<LittleEndian>(row[0])?;
        data.write_f32::<LittleEndian>(row[1])?;
        data.write_f32::<LittleEndian>(1.0)?;
        data.write_f32::<LittleEndian>(0.0)?;
    }

    Ok(EncodedKeypoints { rows, cols: KEYPOINT_COLS, data })
}
