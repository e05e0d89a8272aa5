use sqlx::{Executor, Result, Sqlite};

use super::{CameraRecord, ImageRecord, KeypointsRecord, MatchesRecord};

/// 添加相机记录，返回自增的相机 ID
pub async fn add_camera<'c, E>(executor: E, camera: &CameraRecord) -> Result<i64>
where
    E: Executor<'c, Database = Sqlite>,
{
    let id: i64 = sqlx::query_scalar(
        r#"
        INSERT INTO cameras (model, width, height, params, prior_focal_length)
        VALUES (?, ?, ?, ?, ?)
        RETURNING camera_id
        "#,
    )
    .bind(camera.model)
    .bind(camera.width)
    .bind(camera.height)
    .bind(camera.params.as_slice())
    .bind(camera.prior_focal_length)
    .fetch_one(executor)
    .await?;

    Ok(id)
}

/// 下一个将被分配的图像 ID
///
/// images 表只插入不删除，AUTOINCREMENT 分配的下一个 ID
/// 总是当前最大 ID 加一
pub async fn next_image_id<'c, E>(executor: E) -> Result<i64>
where
    E: Executor<'c, Database = Sqlite>,
{
    let max: i64 = sqlx::query_scalar("SELECT COALESCE(MAX(image_id), 0) FROM images")
        .fetch_one(executor)
        .await?;

    Ok(max + 1)
}

/// 添加图像记录，返回自增的图像 ID
pub async fn add_image<'c, E>(executor: E, image: &ImageRecord) -> Result<i64>
where
    E: Executor<'c, Database = Sqlite>,
{
    let id: i64 = sqlx::query_scalar(
        r#"
        INSERT INTO images
            (name, camera_id, prior_qw, prior_qx, prior_qy, prior_qz, prior_tx, prior_ty, prior_tz)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
        RETURNING image_id
        "#,
    )
    .bind(image.name.as_str())
    .bind(image.camera_id)
    .bind(image.prior_q[0])
    .bind(image.prior_q[1])
    .bind(image.prior_q[2])
    .bind(image.prior_q[3])
    .bind(image.prior_t[0])
    .bind(image.prior_t[1])
    .bind(image.prior_t[2])
    .fetch_one(executor)
    .await?;

    Ok(id)
}

/// 添加特征点记录
pub async fn add_keypoints<'c, E>(executor: E, keypoints: &KeypointsRecord) -> Result<()>
where
    E: Executor<'c, Database = Sqlite>,
{
    sqlx::query(
        r#"
        INSERT INTO keypoints (image_id, rows, cols, data)
        VALUES (?, ?, ?, ?)
        "#,
    )
    .bind(keypoints.image_id)
    .bind(keypoints.rows)
    .bind(keypoints.cols)
    .bind(keypoints.data.as_slice())
    .execute(executor)
    .await?;

    Ok(())
}

/// 添加匹配记录
pub async fn add_matches<'c, E>(executor: E, matches: &MatchesRecord) -> Result<()>
where
    E: Executor<'c, Database = Sqlite>,
{
    sqlx::query(
        r#"
        INSERT INTO matches (pair_id, rows, cols, data)
        VALUES (?, ?, ?, ?)
        "#,
    )
    .bind(matches.pair_id)
    .bind(matches.rows)
    .bind(matches.cols)
    .bind(matches.data.as_slice())
    .execute(executor)
    .await?;

    Ok(())
}
