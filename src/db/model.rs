/// 针孔相机模型在下游工具中的编号
pub const CAMERA_MODEL_PINHOLE: i64 = 1;

/// 相机记录
pub struct CameraRecord {
    /// 相机模型编号
    pub model: i64,
    /// 图像宽度（像素）
    pub width: i64,
    /// 图像高度（像素）
    pub height: i64,
    /// (fx, fy, cx, cy) 的 float64 小端字节
    pub params: Vec<u8>,
    /// 焦距是否来自显式先验
    pub prior_focal_length: bool,
}

/// 图像记录
pub struct ImageRecord {
    /// 图像名，即源路径的文件名，全局唯一
    pub name: String,
    /// 所属相机 ID
    pub camera_id: i64,
    /// 先验旋转四元数 (qw, qx, qy, qz)，未知时为 NaN
    pub prior_q: [f64; 4],
    /// 先验平移 (tx, ty, tz)，未知时为 NaN
    pub prior_t: [f64; 3],
}

impl ImageRecord {
    /// 位姿未知的图像记录，位姿留给下游重建求解
    pub fn unposed(name: String, camera_id: i64) -> Self {
        Self { name, camera_id, prior_q: [f64::NAN; 4], prior_t: [f64::NAN; 3] }
    }
}

/// 特征点记录
pub struct KeypointsRecord {
    /// 图像 ID
    pub image_id: i64,
    /// 特征点数量
    pub rows: i64,
    /// 每行列数
    pub cols: i64,
    /// rows × cols 的 float32 小端字节
    pub data: Vec<u8>,
}

/// 匹配记录
pub struct MatchesRecord {
    /// 配对 ID
    pub pair_id: i64,
    /// 匹配数量
    pub rows: i64,
    /// 每行列数
    pub cols: i64,
    /// rows × cols 的 uint32 小端字节
    pub data: Vec<u8>,
}
