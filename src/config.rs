use std::path::PathBuf;

use clap::Parser;

use crate::error::ImportError;

/// 将特征管线的匹配结果导入重建数据库
#[derive(Parser, Debug, Clone)]
#[command(name = "matchdb", version)]
pub struct Opts {
    /// 输出数据库路径，不存在时自动创建
    #[arg(value_name = "DATABASE")]
    pub database: PathBuf,
    /// 匹配索引文件路径，数据文件的相对路径以其所在目录为基准
    #[arg(value_name = "INDEX")]
    pub index: PathBuf,
    /// 每个配对最多保留的匹配数量，按距离取最优
    #[arg(long, value_name = "N")]
    pub max_matches: Option<usize>,
    /// 相机焦距，单值表示 fx = fy
    #[arg(long, value_name = "FX[,FY]", value_parser = parse_pair)]
    pub focal: Option<(f64, f64)>,
    /// 相机主点，单值表示 cx = cy，默认为图像中心
    #[arg(long, value_name = "CX[,CY]", value_parser = parse_pair)]
    pub center: Option<(f64, f64)>,
}

/// 解析 `X` 或 `X,Y` 形式的浮点参数对
fn parse_pair(s: &str) -> Result<(f64, f64), ImportError> {
    let parse = |v: &str| {
        v.trim()
            .parse::<f64>()
            .map_err(|_| ImportError::Argument(format!("无效的数值: {v}")))
    };
    match s.split(',').collect::<Vec<_>>().as_slice() {
        [v] => {
            let v = parse(v)?;
            Ok((v, v))
        }
        [x, y] => Ok((parse(x)?, parse(y)?)),
        _ => Err(ImportError::Argument(format!("无效的参数: {s}，应为 X 或 X,Y"))),
    }
}
