use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::Result;
use indicatif::{ProgressBar, ProgressIterator, ProgressStyle};
use log::{debug, info};

use crate::config::Opts;
use crate::db::{self, MatchesRecord, init_db};
use crate::index::MatchIndex;
use crate::matches::{self, MatchRecord};
use crate::pairs;
use crate::registry::{self, Registry};

/// 执行整个导入流程
///
/// 所有写入都在同一个事务中完成，任何一步失败都会整体回滚，
/// 不会留下导入了一半的数据库
pub async fn run(opts: &Opts) -> Result<()> {
    let index = MatchIndex::load(&opts.index)?;
    let base = opts.index.parent().unwrap_or(Path::new("")).to_path_buf();
    let total = index.pair_count();
    info!("匹配索引包含 {} 张图像、{} 个待导入配对", index.image_count(), total);

    let db = init_db(&opts.database).await?;
    let mut tx = db.begin().await?;
    let mut registry = Registry::new();

    let pb_style = ProgressStyle::default_bar()
        .template("{spinner:.green} [{elapsed_precise}] [{wide_bar:.cyan/blue}] {pos}/{len} ({eta}) {msg}")
        .unwrap()
        .progress_chars("#>-");
    let pb = ProgressBar::new(total as u64).with_style(pb_style);

    let stdout = io::stdout();
    let mut out = stdout.lock();

    for (path_a, path_b, mref) in index.pairs().progress_with(pb) {
        debug!("导入配对 {path_a} <-> {path_b} ({})", mref.id);
        let record = MatchRecord::load(&resolve(&base, &mref.id))?;
        let image_a = resolve(&base, path_a);
        let image_b = resolve(&base, path_b);

        // 相机参数取自字典序第一张图像
        if !registry.has_camera() {
            let (width, height) = registry::probe_dimensions(&image_a)?;
            registry.register_camera(&mut tx, width, height, opts.focal, opts.center).await?;
        }

        let features_a = resolve(&base, &record.features_0);
        let features_b = resolve(&base, &record.features_1);
        let id_a = registry.ensure_image(&mut tx, &image_a, &features_a).await?;
        let id_b = registry.ensure_image(&mut tx, &image_b, &features_b).await?;

        let selected = matches::select_top_k(&record.matches, &record.distances, opts.max_matches);
        let (pair_id, rows) = matches::canonicalize(id_a, id_b, selected);
        let row = MatchesRecord {
            pair_id,
            rows: rows.len() as i64,
            cols: 2,
            data: matches::encode(&rows)?,
        };
        db::crud::add_matches(&mut *tx, &row).await?;

        pairs::emit(&mut out, &registry::image_name(&image_a)?, &registry::image_name(&image_b)?)?;
    }

    tx.commit().await?;
    out.flush()?;

    info!("导入完成: {} 张图像、{} 个配对", registry.image_count(), total);
    Ok(())
}

/// 相对路径以索引文件所在目录为基准
fn resolve(base: &Path, path: &str) -> PathBuf {
    let path = Path::new(path);
    if path.is_absolute() { path.to_path_buf() } else { base.join(path) }
}
