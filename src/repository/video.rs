//! Video store.

use chrono::Utc;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use super::models::{NewVideo, VideoChanges, VideoProductChanges, VideoRow};
use super::pool::{DbPool, DieselError};
use super::util::{format_datetime, parse_datetime_opt};
use crate::models::{ProductFields, ProductMetadata, VideoRecord};
use crate::schema::videos;
use crate::with_conn;

impl From<VideoRow> for VideoRecord {
    fn from(row: VideoRow) -> Self {
        VideoRecord {
            video_id: row.video_id,
            author: row.author,
            caption: row.caption,
            views: row.views,
            likes: row.likes,
            shares: row.shares,
            comments: row.comments,
            play_url: row.play_url,
            cover_url: row.cover_url,
            duration: row.duration,
            aspect_ratio: row.aspect_ratio,
            posted_at: parse_datetime_opt(row.posted_at),
            has_shop: row.has_shop,
            product_id: row.product_id,
            product: ProductFields {
                name: row.product_name,
                image: row.product_image,
                price: row.product_price,
                shop_name: row.shop_name,
            },
        }
    }
}

/// Repository for harvested videos.
#[derive(Clone)]
pub struct VideoRepository {
    pool: DbPool,
}

impl VideoRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Insert or update a video keyed on its platform identifier.
    ///
    /// Product display fields from the payload are only stored on first insert;
    /// afterwards they belong to enrichment. `source` records which hashtag or
    /// handle surfaced the video last.
    pub async fn upsert(&self, video: &VideoRecord, source: &str) -> Result<(), DieselError> {
        let now = format_datetime(&Utc::now());
        let posted_at = video.posted_at.as_ref().map(format_datetime);

        let new = NewVideo {
            video_id: &video.video_id,
            author: &video.author,
            caption: &video.caption,
            views: video.views,
            likes: video.likes,
            shares: video.shares,
            comments: video.comments,
            play_url: video.play_url.as_deref(),
            cover_url: video.cover_url.as_deref(),
            duration: video.duration,
            aspect_ratio: &video.aspect_ratio,
            posted_at: posted_at.clone(),
            has_shop: video.has_shop,
            product_id: video.product_id.as_deref(),
            product_name: video.product.name.as_deref(),
            product_image: video.product.image.as_deref(),
            product_price: video.product.price.as_deref(),
            shop_name: video.product.shop_name.as_deref(),
            source,
            first_seen_at: &now,
            updated_at: &now,
        };
        let changes = VideoChanges {
            author: &video.author,
            caption: &video.caption,
            views: video.views,
            likes: video.likes,
            shares: video.shares,
            comments: video.comments,
            play_url: video.play_url.as_deref(),
            cover_url: video.cover_url.as_deref(),
            duration: video.duration,
            aspect_ratio: &video.aspect_ratio,
            posted_at,
            has_shop: video.has_shop,
            product_id: video.product_id.as_deref(),
            source,
            updated_at: &now,
        };

        with_conn!(self.pool, conn => {
            diesel::insert_into(videos::table)
                .values(&new)
                .on_conflict(videos::video_id)
                .do_update()
                .set(&changes)
                .execute(&mut conn)
                .await?;
            Ok(())
        })
    }

    pub async fn get(&self, video_id: &str) -> Result<Option<VideoRecord>, DieselError> {
        with_conn!(self.pool, conn => {
            videos::table
                .find(video_id)
                .first::<VideoRow>(&mut conn)
                .await
                .optional()
                .map(|row| row.map(VideoRecord::from))
        })
    }

    pub async fn find_by_product(&self, product_id: &str) -> Result<Vec<VideoRecord>, DieselError> {
        with_conn!(self.pool, conn => {
            videos::table
                .filter(videos::product_id.eq(product_id))
                .order(videos::video_id.asc())
                .load::<VideoRow>(&mut conn)
                .await
                .map(|rows| rows.into_iter().map(VideoRecord::from).collect())
        })
    }

    /// Distinct product identifiers on shop videos missing any display field.
    pub async fn pending_product_ids(&self, limit: Option<i64>) -> Result<Vec<String>, DieselError> {
        let ids: Vec<Option<String>> = with_conn!(self.pool, conn => {
            let mut query = videos::table
                .filter(videos::has_shop.eq(true))
                .filter(videos::product_id.is_not_null())
                .filter(
                    videos::product_name
                        .is_null()
                        .or(videos::product_image.is_null())
                        .or(videos::product_price.is_null())
                        .or(videos::shop_name.is_null()),
                )
                .select(videos::product_id)
                .distinct()
                .order(videos::product_id.asc())
                .into_boxed();
            if let Some(limit) = limit {
                query = query.limit(limit);
            }
            query.load::<Option<String>>(&mut conn).await?
        });
        Ok(ids.into_iter().flatten().collect())
    }

    /// Copy product display fields onto every video referencing the product.
    pub async fn apply_product(&self, product: &ProductMetadata) -> Result<usize, DieselError> {
        let now = format_datetime(&Utc::now());
        let changes = VideoProductChanges {
            product_name: &product.name,
            product_image: &product.image,
            product_price: &product.price,
            shop_name: &product.shop_name,
            updated_at: &now,
        };

        with_conn!(self.pool, conn => {
            diesel::update(videos::table.filter(videos::product_id.eq(&product.product_id)))
                .set(&changes)
                .execute(&mut conn)
                .await
        })
    }

    /// Delete every video referencing the product.
    pub async fn delete_by_product(&self, product_id: &str) -> Result<usize, DieselError> {
        with_conn!(self.pool, conn => {
            diesel::delete(videos::table.filter(videos::product_id.eq(product_id)))
                .execute(&mut conn)
                .await
        })
    }

    /// Distinct author usernames across all stored videos.
    pub async fn distinct_authors(&self) -> Result<Vec<String>, DieselError> {
        with_conn!(self.pool, conn => {
            videos::table
                .filter(videos::author.ne(""))
                .select(videos::author)
                .distinct()
                .order(videos::author.asc())
                .load::<String>(&mut conn)
                .await
        })
    }

    pub async fn count(&self) -> Result<i64, DieselError> {
        with_conn!(self.pool, conn => {
            videos::table.count().get_result::<i64>(&mut conn).await
        })
    }
}
