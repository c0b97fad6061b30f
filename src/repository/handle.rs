//! Creator handle store.

use chrono::Utc;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use super::models::{HandleRecord, NewHandle};
use super::pool::{DbPool, DieselError};
use super::util::{format_datetime, parse_datetime, parse_datetime_opt};
use crate::models::{DiscoverySource, Handle, HandleStatus};
use crate::schema::handles;
use crate::with_conn;

impl From<HandleRecord> for Handle {
    fn from(record: HandleRecord) -> Self {
        Handle {
            username: record.username,
            status: HandleStatus::from_str(&record.status).unwrap_or(HandleStatus::Active),
            discovery_source: DiscoverySource::from_str(&record.discovery_source)
                .unwrap_or(DiscoverySource::Hashtag),
            last_scraped: parse_datetime_opt(record.last_scraped),
            total_videos: record.total_videos,
            shop_videos: record.shop_videos,
            no_shop_streak: record.no_shop_streak,
            no_posts_streak: record.no_posts_streak,
            created_at: parse_datetime(&record.created_at),
        }
    }
}

fn to_row(handle: &Handle) -> NewHandle<'_> {
    NewHandle {
        username: &handle.username,
        status: handle.status.as_str(),
        discovery_source: handle.discovery_source.as_str(),
        last_scraped: handle.last_scraped.as_ref().map(format_datetime),
        total_videos: handle.total_videos,
        shop_videos: handle.shop_videos,
        shop_ratio: handle.shop_ratio(),
        no_shop_streak: handle.no_shop_streak,
        no_posts_streak: handle.no_posts_streak,
        created_at: format_datetime(&handle.created_at),
        updated_at: format_datetime(&Utc::now()),
    }
}

/// Repository for tracked creator handles.
#[derive(Clone)]
pub struct HandleRepository {
    pool: DbPool,
}

impl HandleRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub async fn get(&self, username: &str) -> Result<Option<Handle>, DieselError> {
        with_conn!(self.pool, conn => {
            handles::table
                .find(username)
                .first::<HandleRecord>(&mut conn)
                .await
                .optional()
                .map(|record| record.map(Handle::from))
        })
    }

    /// Insert a handle unless the username is already tracked.
    /// Returns true if a new row was created.
    pub async fn insert_if_absent(&self, handle: &Handle) -> Result<bool, DieselError> {
        let row = to_row(handle);
        with_conn!(self.pool, conn => {
            let rows = diesel::insert_into(handles::table)
                .values(&row)
                .on_conflict_do_nothing()
                .execute(&mut conn)
                .await?;
            Ok(rows > 0)
        })
    }

    /// Persist the full state of a handle (insert or overwrite).
    pub async fn save(&self, handle: &Handle) -> Result<(), DieselError> {
        let row = to_row(handle);
        with_conn!(self.pool, conn => {
            diesel::insert_into(handles::table)
                .values(&row)
                .on_conflict(handles::username)
                .do_update()
                .set(&row)
                .execute(&mut conn)
                .await?;
            Ok(())
        })
    }

    /// Active handles, least recently scraped first (never-scraped handles lead).
    pub async fn active(&self, limit: Option<i64>) -> Result<Vec<Handle>, DieselError> {
        with_conn!(self.pool, conn => {
            let mut query = handles::table
                .filter(handles::status.eq(HandleStatus::Active.as_str()))
                .order((
                    handles::last_scraped.is_null().desc(),
                    handles::last_scraped.asc(),
                    handles::username.asc(),
                ))
                .into_boxed();
            if let Some(limit) = limit {
                query = query.limit(limit);
            }
            query
                .load::<HandleRecord>(&mut conn)
                .await
                .map(|records| records.into_iter().map(Handle::from).collect())
        })
    }

    pub async fn list(&self, status: Option<HandleStatus>) -> Result<Vec<Handle>, DieselError> {
        with_conn!(self.pool, conn => {
            let mut query = handles::table
                .order((handles::shop_ratio.desc(), handles::username.asc()))
                .into_boxed();
            if let Some(status) = status {
                query = query.filter(handles::status.eq(status.as_str()));
            }
            query
                .load::<HandleRecord>(&mut conn)
                .await
                .map(|records| records.into_iter().map(Handle::from).collect())
        })
    }

    /// All tracked usernames regardless of status.
    pub async fn usernames(&self) -> Result<Vec<String>, DieselError> {
        with_conn!(self.pool, conn => {
            handles::table
                .select(handles::username)
                .load::<String>(&mut conn)
                .await
        })
    }

    pub async fn count_by_status(&self) -> Result<Vec<(HandleStatus, i64)>, DieselError> {
        let rows: Vec<(String, i64)> = with_conn!(self.pool, conn => {
            handles::table
                .group_by(handles::status)
                .select((handles::status, diesel::dsl::count_star()))
                .load::<(String, i64)>(&mut conn)
                .await?
        });

        Ok(rows
            .into_iter()
            .filter_map(|(status, count)| HandleStatus::from_str(&status).map(|s| (s, count)))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::test_support::setup_test_db;
    use chrono::Duration;

    #[tokio::test]
    async fn test_insert_if_absent_keeps_existing_state() {
        let (repos, _dir) = setup_test_db().await;
        let handles = &repos.handles;

        let mut handle = Handle::new("alice", DiscoverySource::Manual);
        assert!(handles.insert_if_absent(&handle).await.unwrap());

        handle.total_videos = 12;
        handles.save(&handle).await.unwrap();

        let rediscovered = Handle::new("alice", DiscoverySource::Hashtag);
        assert!(!handles.insert_if_absent(&rediscovered).await.unwrap());

        let stored = handles.get("alice").await.unwrap().unwrap();
        assert_eq!(stored.total_videos, 12);
        assert_eq!(stored.discovery_source, DiscoverySource::Manual);
    }

    #[tokio::test]
    async fn test_active_orders_never_scraped_first() {
        let (repos, _dir) = setup_test_db().await;
        let handles = &repos.handles;
        let now = Utc::now();

        let mut old = Handle::new("old", DiscoverySource::Hashtag);
        old.last_scraped = Some(now - Duration::hours(5));
        let mut recent = Handle::new("recent", DiscoverySource::Hashtag);
        recent.last_scraped = Some(now - Duration::minutes(5));
        let fresh = Handle::new("fresh", DiscoverySource::Hashtag);
        let mut gone = Handle::new("gone", DiscoverySource::Hashtag);
        gone.status = HandleStatus::Removed;

        for handle in [&recent, &old, &fresh, &gone] {
            handles.save(handle).await.unwrap();
        }

        let active: Vec<String> = handles
            .active(None)
            .await
            .unwrap()
            .into_iter()
            .map(|h| h.username)
            .collect();
        assert_eq!(active, vec!["fresh", "old", "recent"]);

        let limited = handles.active(Some(1)).await.unwrap();
        assert_eq!(limited.len(), 1);
        assert_eq!(limited[0].username, "fresh");
    }

    #[tokio::test]
    async fn test_count_by_status() {
        let (repos, _dir) = setup_test_db().await;
        let handles = &repos.handles;

        let mut inactive = Handle::new("b", DiscoverySource::Hashtag);
        inactive.status = HandleStatus::Inactive;
        handles.save(&Handle::new("a", DiscoverySource::Hashtag)).await.unwrap();
        handles.save(&inactive).await.unwrap();

        let mut counts = handles.count_by_status().await.unwrap();
        counts.sort_by_key(|(status, _)| status.as_str());
        assert_eq!(
            counts,
            vec![(HandleStatus::Active, 1), (HandleStatus::Inactive, 1)]
        );
        assert_eq!(handles.list(Some(HandleStatus::Inactive)).await.unwrap().len(), 1);
        assert_eq!(handles.usernames().await.unwrap().len(), 2);
    }
}
