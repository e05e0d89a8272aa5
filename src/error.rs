use ndarray_npy::ReadNpyError;

/// 导入流程统一的 Result 别名
pub type Result<T> = std::result::Result<T, ImportError>;

/// 导入过程中所有可能的错误
///
/// 任何错误都会中止整次导入，没有按配对恢复或重试的逻辑
#[derive(Debug, thiserror::Error)]
pub enum ImportError {
    /// 输入文档或数组形状不合法
    #[error("格式错误: {0}")]
    Format(String),
    /// 违反单相机一致性等运行期校验
    #[error("校验错误: {0}")]
    Validation(String),
    /// 命令行参数不合法
    #[error("参数错误: {0}")]
    Argument(String),
    /// 图像名违反下游 pairs 文件的约束
    #[error("约束错误: {0}")]
    Constraint(String),
    /// 输入文件缺失或读取失败
    #[error("IO 错误: {0}")]
    Io(#[from] std::io::Error),
    /// 图像尺寸探测失败
    #[error("图像读取错误: {0}")]
    Image(#[from] image::ImageError),
    /// 数据库操作失败
    #[error("数据库错误: {0}")]
    Db(#[from] sqlx::Error),
}

impl From<serde_json::Error> for ImportError {
    fn from(e: serde_json::Error) -> Self {
        ImportError::Format(e.to_string())
    }
}

impl From<bincode::Error> for ImportError {
    fn from(e: bincode::Error) -> Self {
        ImportError::Format(e.to_string())
    }
}

impl From<ReadNpyError> for ImportError {
    fn from(e: ReadNpyError) -> Self {
        ImportError::Format(e.to_string())
    }
}
