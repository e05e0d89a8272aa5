use std::collections::HashMap;
use std::path::Path;

use byteorder::{LittleEndian, WriteBytesExt};
use image::ImageReader;
use log::{debug, info, warn};
use sqlx::SqliteConnection;

use crate::db::{self, CAMERA_MODEL_PINHOLE, CameraRecord, ImageRecord, KeypointsRecord};
use crate::error::{ImportError, Result};
use crate::keypoints;
use crate::matches::MAX_IMAGE_ID;

/// 已注册相机的运行期信息
#[derive(Debug, Clone, Copy)]
struct CameraInfo {
    id: i64,
    width: u32,
    height: u32,
}

/// 单次导入的相机与图像注册状态
///
/// 注册表不持有数据库连接，连接由调用方逐次传入，
/// 写入的生命周期与整个导入事务一致
#[derive(Debug, Default)]
pub struct Registry {
    camera: Option<CameraInfo>,
    images: HashMap<String, i64>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// 是否已注册相机
    pub fn has_camera(&self) -> bool {
        self.camera.is_some()
    }

    /// 已注册的图像数量
    pub fn image_count(&self) -> usize {
        self.images.len()
    }

    /// 注册唯一的共享相机
    ///
    /// # Arguments
    ///
    /// * `focal` - 焦距 (fx, fy)，未指定时为 (1.0, 1.0)
    /// * `center` - 主点 (cx, cy)，未指定时为图像中心
    pub async fn register_camera(
        &mut self,
        conn: &mut SqliteConnection,
        width: u32,
        height: u32,
        focal: Option<(f64, f64)>,
        center: Option<(f64, f64)>,
    ) -> Result<i64> {
        if self.camera.is_some() {
            return Err(ImportError::Validation("相机已注册，单次导入只使用一个相机".to_string()));
        }

        let (fx, fy) = focal.unwrap_or((1.0, 1.0));
        let default_center = (width as f64 / 2.0, height as f64 / 2.0);
        let (cx, cy) = center.unwrap_or(default_center);
        if (cx, cy) != default_center {
            warn!("主点 ({cx}, {cy}) 偏离图像中心 ({}, {})", default_center.0, default_center.1);
        }

        let camera = CameraRecord {
            model: CAMERA_MODEL_PINHOLE,
            width: width as i64,
            height: height as i64,
            params: encode_params(fx, fy, cx, cy)?,
            prior_focal_length: focal.is_some(),
        };
        let id = db::crud::add_camera(&mut *conn, &camera).await?;
        info!("注册相机 #{id}: {width}x{height} 针孔模型，焦距 ({fx}, {fy})");

        self.camera = Some(CameraInfo { id, width, height });
        Ok(id)
    }

    /// 确保图像已注册并返回其 ID
    ///
    /// 以文件名为唯一键，重复出现时直接返回已有 ID；首次出现时
    /// 探测图像尺寸、写入图像行并编码特征点
    pub async fn ensure_image(
        &mut self,
        conn: &mut SqliteConnection,
        image_path: &Path,
        keypoint_path: &Path,
    ) -> Result<i64> {
        let Some(camera) = self.camera else {
            return Err(ImportError::Validation("注册图像前必须先注册相机".to_string()));
        };

        let name = image_name(image_path)?;
        if let Some(&id) = self.images.get(&name) {
            return Ok(id);
        }

        let (width, height) = probe_dimensions(image_path)?;
        if (width, height) != (camera.width, camera.height) {
            return Err(ImportError::Validation(format!(
                "图像 {name} 的尺寸 {width}x{height} 与相机的 {}x{} 不一致",
                camera.width, camera.height
            )));
        }

        let next_id = db::crud::next_image_id(&mut *conn).await?;
        if next_id >= MAX_IMAGE_ID {
            return Err(ImportError::Validation(format!(
                "图像 ID {next_id} 达到上限 {MAX_IMAGE_ID}，配对 ID 会发生碰撞"
            )));
        }

        let image = ImageRecord::unposed(name.clone(), camera.id);
        let id = db::crud::add_image(&mut *conn, &image).await?;

        let positions = keypoints::read_positions(keypoint_path)?;
        let encoded = keypoints::encode(positions.view())?;
        debug!("图像 #{id} {name}: {} 个特征点", encoded.rows);
        let record = KeypointsRecord {
            image_id: id,
            rows: encoded.rows as i64,
            cols: encoded.cols as i64,
            data: encoded.data,
        };
        db::crud::add_keypoints(&mut *conn, &record).await?;

        self.images.insert(name, id);
        Ok(id)
    }
}

/// 图像名，即路径的文件名部分
pub fn image_name(path: &Path) -> Result<String> {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .ok_or_else(|| ImportError::Format(format!("无法从路径提取图像名: {}", path.display())))
}

/// 探测图像的像素尺寸
///
/// 按内容而非扩展名识别格式，只解码文件头
pub fn probe_dimensions(path: &Path) -> Result<(u32, u32)> {
    let reader = ImageReader::open(path)?.with_guessed_format()?;
    Ok(reader.into_dimensions()?)
}

/// 将 (fx, fy, cx, cy) 打包为 float64 小端字节
fn encode_params(fx: f64, fy: f64, cx: f64, cy: f64) -> Result<Vec<u8>> {
    let mut params = Vec::with_capacity(32);
    for v in [fx, fy, cx, cy] {
        params.write_f64::<LittleEndian>(v)?;
    }
    Ok(params)
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use ndarray::array;
    use ndarray_npy::write_npy;
    use sqlx::SqlitePool;
    use sqlx::pool::PoolConnection;
    use sqlx::sqlite::SqlitePoolOptions;
    use tempfile::{TempDir, tempdir};

    use super::*;

    async fn test_conn() -> PoolConnection<sqlx::Sqlite> {
        let pool: SqlitePool =
            SqlitePoolOptions::new().max_connections(1).connect("sqlite::memory:").await.unwrap();
        sqlx::migrate!().run(&pool).await.unwrap();
        pool.acquire().await.unwrap()
    }

    fn write_image(dir: &TempDir, name: &str, width: u32, height: u32) -> PathBuf {
        let path = dir.path().join(name);
        image::RgbImage::new(width, height)
            .save_with_format(&path, image::ImageFormat::Png)
            .unwrap();
        path
    }

    fn write_positions(dir: &TempDir, name: &str) -> PathBuf {
        let path = dir.path().join(name);
        write_npy(&path, &array![[1.0f32, 2.0], [3.0, 4.0]]).unwrap();
        path
    }

    #[tokio::test]
    async fn camera_registered_once() {
        let mut conn = test_conn().await;
        let mut registry = Registry::new();

        let id = registry.register_camera(&mut conn, 64, 48, None, None).await.unwrap();
        assert_eq!(id, 1);
        assert!(registry.has_camera());

        let err = registry.register_camera(&mut conn, 64, 48, None, None).await.unwrap_err();
        assert!(matches!(err, ImportError::Validation(_)));
    }

    #[tokio::test]
    async fn image_registration_is_idempotent() {
        let dir = tempdir().unwrap();
        let image = write_image(&dir, "a.png", 64, 48);
        let positions = write_positions(&dir, "a.npy");

        let mut conn = test_conn().await;
        let mut registry = Registry::new();
        registry.register_camera(&mut conn, 64, 48, None, None).await.unwrap();

        let first = registry.ensure_image(&mut conn, &image, &positions).await.unwrap();
        let second = registry.ensure_image(&mut conn, &image, &positions).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(registry.image_count(), 1);

        let images: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM images").fetch_one(&mut *conn).await.unwrap();
        assert_eq!(images, 1);
        let rows: i64 = sqlx::query_scalar("SELECT rows FROM keypoints WHERE image_id = ?")
            .bind(first)
            .fetch_one(&mut *conn)
            .await
            .unwrap();
        assert_eq!(rows, 2);
    }

    #[tokio::test]
    async fn image_size_must_match_camera() {
        let dir = tempdir().unwrap();
        let image = write_image(&dir, "b.png", 32, 32);
        let positions = write_positions(&dir, "b.npy");

        let mut conn = test_conn().await;
        let mut registry = Registry::new();
        registry.register_camera(&mut conn, 64, 48, None, None).await.unwrap();

        let err = registry.ensure_image(&mut conn, &image, &positions).await.unwrap_err();
        assert!(matches!(err, ImportError::Validation(_)));

        let images: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM images").fetch_one(&mut *conn).await.unwrap();
        assert_eq!(images, 0);
    }

    #[tokio::test]
    async fn image_requires_camera() {
        let dir = tempdir().unwrap();
        let image = write_image(&dir, "c.png", 8, 8);
        let positions = write_positions(&dir, "c.npy");

        let mut conn = test_conn().await;
        let mut registry = Registry::new();
        let err = registry.ensure_image(&mut conn, &image, &positions).await.unwrap_err();
        assert!(matches!(err, ImportError::Validation(_)));
    }

    #[tokio::test]
    async fn focal_prior_recorded() {
        let mut conn = test_conn().await;
        let mut registry = Registry::new();
        registry.register_camera(&mut conn, 10, 10, Some((1200.0, 800.0)), None).await.unwrap();

        let (prior, params): (i64, Vec<u8>) =
            sqlx::query_as("SELECT prior_focal_length, params FROM cameras")
                .fetch_one(&mut *conn)
                .await
                .unwrap();
        assert_eq!(prior, 1);
        assert_eq!(params, encode_params(1200.0, 800.0, 5.0, 5.0).unwrap());
    }

    #[tokio::test]
    async fn off_center_principal_point_is_nonfatal() {
        let mut conn = test_conn().await;
        let mut registry = Registry::new();
        registry.register_camera(&mut conn, 64, 48, None, Some((10.0, 10.0))).await.unwrap();

        let params: Vec<u8> = sqlx::query_scalar("SELECT params FROM cameras")
            .fetch_one(&mut *conn)
            .await
            .unwrap();
        assert_eq!(params, encode_params(1.0, 1.0, 10.0, 10.0).unwrap());
    }

    #[tokio::test]
    async fn image_id_ceiling_is_enforced() {
        let dir = tempdir().unwrap();
        let image = write_image(&dir, "d.png", 8, 8);
        let positions = write_positions(&dir, "d.npy");

        let mut conn = test_conn().await;
        let mut registry = Registry::new();
        registry.register_camera(&mut conn, 8, 8, None, None).await.unwrap();

        // 占据上限前最后一个可用 ID
        sqlx::query("INSERT INTO images (image_id, name, camera_id) VALUES (?, ?, ?)")
            .bind(MAX_IMAGE_ID - 1)
            .bind("occupied.png")
            .bind(1_i64)
            .execute(&mut *conn)
            .await
            .unwrap();

        let err = registry.ensure_image(&mut conn, &image, &positions).await.unwrap_err();
        assert!(matches!(err, ImportError::Validation(_)));

        let images: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM images")
            .fetch_one(&mut *conn)
            .await
            .unwrap();
        assert_eq!(images, 1);
    }

    #[test]
    fn image_name_is_basename() {
        assert_eq!(image_name(Path::new("frames/a.png")).unwrap(), "a.png");
        assert_eq!(image_name(Path::new("a.png")).unwrap(), "a.png");
        assert!(image_name(Path::new("/")).is_err());
    }

    #[test]
    fn probe_ignores_extension() {
        let dir = tempdir().unwrap();
        // 无扩展名的 PNG，按内容识别
        let path = write_image(&dir, "frame_a", 24, 16);
        assert_eq!(probe_dimensions(&path).unwrap(), (24, 16));
    }

    #[test]
    fn probe_missing_file() {
        let err = probe_dimensions(Path::new("/nonexistent/a.png")).unwrap_err();
        assert!(matches!(err, ImportError::Io(_)));
    }
}
