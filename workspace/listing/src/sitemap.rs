//! Sitemap planning.
//!
//! The index lists one static sitemap followed by the center sitemaps,
//! `CENTERS_PER_SITEMAP` centers each, numbered from zero. Every entry is
//! stamped with the newest change to what it lists. Rendering to XML happens
//! at the HTTP layer.

use chrono::{DateTime, Utc};
use model::entities::dialysis_center;
use sea_orm::{DatabaseConnection, EntityTrait, PaginatorTrait, QueryOrder, QuerySelect};
use tracing::{debug, instrument};

use crate::error::Result;
use crate::locations::{states_with_counts, towns_in_state};

pub const CENTERS_PER_SITEMAP: u64 = 1000;

pub const STATIC_SITEMAP_PATH: &str = "/sitemap-static.xml";

/// One `<url>` or `<sitemap>` entry. `path` is relative to the site root.
#[derive(Debug, Clone, PartialEq)]
pub struct SitemapEntry {
    pub path: String,
    pub last_modified: DateTime<Utc>,
}

pub fn center_path(slug: &str) -> String {
    format!("/centers/{}", slug)
}

pub fn center_sitemap_path(chunk: u64) -> String {
    format!("/sitemap-centers-{}.xml", chunk)
}

/// Number of center sitemaps needed for `total_centers`.
pub fn chunk_count(total_centers: u64) -> u64 {
    total_centers.div_ceil(CENTERS_PER_SITEMAP)
}

/// Entries of the sitemap index: the static sitemap, then one entry per
/// center chunk stamped with that chunk's newest update.
pub fn index_entries(static_modified: DateTime<Utc>, chunk_modified: &[DateTime<Utc>]) -> Vec<SitemapEntry> {
    std::iter::once(SitemapEntry {
        path: STATIC_SITEMAP_PATH.to_string(),
        last_modified: static_modified,
    })
    .chain(chunk_modified.iter().enumerate().map(|(chunk, at)| SitemapEntry {
        path: center_sitemap_path(chunk as u64),
        last_modified: *at,
    }))
    .collect()
}

/// Newest `updated_at` of every center chunk, in chunk order.
#[instrument(skip(db))]
pub async fn chunk_last_modified(db: &DatabaseConnection) -> Result<Vec<DateTime<Utc>>> {
    let stamps: Vec<DateTime<Utc>> = dialysis_center::Entity::find()
        .select_only()
        .column(dialysis_center::Column::UpdatedAt)
        .order_by_asc(dialysis_center::Column::Slug)
        .into_tuple()
        .all(db)
        .await?;

    Ok(stamps
        .chunks(CENTERS_PER_SITEMAP as usize)
        .filter_map(|chunk| chunk.iter().max().copied())
        .collect())
}

/// Stamp for the static sitemap: the newer of the latest center update and
/// `newest_post`, or `fallback` when there is neither.
#[instrument(skip(db))]
pub async fn static_last_modified(
    db: &DatabaseConnection,
    newest_post: Option<DateTime<Utc>>,
    fallback: DateTime<Utc>,
) -> Result<DateTime<Utc>> {
    let newest_center: Option<DateTime<Utc>> = dialysis_center::Entity::find()
        .select_only()
        .column(dialysis_center::Column::UpdatedAt)
        .order_by_desc(dialysis_center::Column::UpdatedAt)
        .into_tuple()
        .one(db)
        .await?;

    Ok(newest_center.max(newest_post).unwrap_or(fallback))
}

pub async fn count_centers(db: &DatabaseConnection) -> Result<u64> {
    Ok(dialysis_center::Entity::find().count(db).await?)
}

/// Center entries of one chunk, or `None` when the chunk is out of range.
#[instrument(skip(db))]
pub async fn center_entries(db: &DatabaseConnection, chunk: u64) -> Result<Option<Vec<SitemapEntry>>> {
    let total = count_centers(db).await?;
    if chunk >= chunk_count(total) {
        debug!("Sitemap chunk {} out of range for {} centers", chunk, total);
        return Ok(None);
    }

    let entries = dialysis_center::Entity::find()
        .order_by_asc(dialysis_center::Column::Slug)
        .offset(chunk * CENTERS_PER_SITEMAP)
        .limit(CENTERS_PER_SITEMAP)
        .all(db)
        .await?
        .into_iter()
        .map(|c| SitemapEntry {
            path: center_path(&c.slug),
            last_modified: c.updated_at,
        })
        .collect();

    Ok(Some(entries))
}

/// Home, the blog index, `blog_paths`, every state page and every town page,
/// all stamped with `last_modified`.
#[instrument(skip(db, blog_paths))]
pub async fn static_entries(
    db: &DatabaseConnection,
    blog_paths: &[String],
    last_modified: DateTime<Utc>,
) -> Result<Vec<SitemapEntry>> {
    let mut paths = vec!["/".to_string(), "/blog".to_string()];
    paths.extend(blog_paths.iter().cloned());

    for state in states_with_counts(db).await? {
        paths.push(format!("/{}", state.slug));
        for town in towns_in_state(db, state.id).await? {
            paths.push(format!("/{}/{}", state.slug, town.slug));
        }
    }

    Ok(paths
        .into_iter()
        .map(|path| SitemapEntry {
            path,
            last_modified,
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{seed_directory, setup_db};

    use chrono::{Duration, TimeZone};
    use model::entities::dialysis_center::{ActiveModel, Column, Entity};
    use sea_orm::{ActiveModelTrait, ColumnTrait, QueryFilter, Set};

    #[test]
    fn test_chunk_count() {
        assert_eq!(chunk_count(0), 0);
        assert_eq!(chunk_count(1), 1);
        assert_eq!(chunk_count(1000), 1);
        assert_eq!(chunk_count(1001), 2);
        assert_eq!(chunk_count(2500), 3);
    }

    #[test]
    fn test_index_entries_carry_chunk_stamps() {
        let static_at = Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap();
        let first = Utc.with_ymd_and_hms(2024, 4, 2, 8, 0, 0).unwrap();
        let second = Utc.with_ymd_and_hms(2024, 3, 9, 8, 0, 0).unwrap();

        assert_eq!(
            index_entries(static_at, &[]),
            vec![SitemapEntry {
                path: STATIC_SITEMAP_PATH.to_string(),
                last_modified: static_at,
            }]
        );

        let entries = index_entries(static_at, &[first, second]);
        let paths: Vec<&str> = entries.iter().map(|e| e.path.as_str()).collect();
        assert_eq!(
            paths,
            vec![STATIC_SITEMAP_PATH, "/sitemap-centers-0.xml", "/sitemap-centers-1.xml"]
        );
        assert_eq!(entries[1].last_modified, first);
        assert_eq!(entries[2].last_modified, second);
    }

    #[tokio::test]
    async fn test_chunk_stamp_is_newest_center_update() {
        let db = setup_db().await;
        let fixture = seed_directory(&db).await;

        let edited_at = Utc::now() + Duration::hours(1);
        let mut center: ActiveModel = Entity::find_by_id(fixture.shah_alam_id.clone())
            .one(&db)
            .await
            .unwrap()
            .unwrap()
            .into();
        center.updated_at = Set(edited_at);
        let edited = center.update(&db).await.unwrap();

        let stamps = chunk_last_modified(&db).await.unwrap();
        assert_eq!(stamps, vec![edited.updated_at]);
    }

    #[tokio::test]
    async fn test_static_stamp_prefers_newest_change() {
        let db = setup_db().await;
        let fallback = Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap();

        assert_eq!(static_last_modified(&db, None, fallback).await.unwrap(), fallback);

        let post_at = Utc.with_ymd_and_hms(2021, 6, 1, 0, 0, 0).unwrap();
        assert_eq!(
            static_last_modified(&db, Some(post_at), fallback).await.unwrap(),
            post_at
        );

        let fixture = seed_directory(&db).await;
        let newest_center = Entity::find()
            .filter(Column::Id.eq(fixture.kl_kidney_id.as_str()))
            .one(&db)
            .await
            .unwrap()
            .unwrap()
            .updated_at;
        assert_eq!(
            static_last_modified(&db, Some(post_at), fallback).await.unwrap(),
            newest_center
        );

        let later_post = newest_center + Duration::days(1);
        assert_eq!(
            static_last_modified(&db, Some(later_post), fallback).await.unwrap(),
            later_post
        );
    }

    #[tokio::test]
    async fn test_center_entries_chunks() {
        let db = setup_db().await;
        seed_directory(&db).await;

        let first = center_entries(&db, 0).await.unwrap().unwrap();
        let paths: Vec<&str> = first.iter().map(|e| e.path.as_str()).collect();
        assert_eq!(
            paths,
            vec![
                "/centers/kl-kidney-centre",
                "/centers/klang-care-dialysis",
                "/centers/premier-dialysis-klang",
                "/centers/shah-alam-renal-centre",
            ]
        );

        assert!(center_entries(&db, 1).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_static_entries_cover_locations() {
        let db = setup_db().await;
        seed_directory(&db).await;
        let now = Utc::now();

        let entries = static_entries(&db, &["/blog/first-visit".to_string()], now)
            .await
            .unwrap();
        let paths: Vec<&str> = entries.iter().map(|e| e.path.as_str()).collect();

        assert_eq!(&paths[..3], &["/", "/blog", "/blog/first-visit"]);
        assert!(paths.contains(&"/selangor/klang"));
        assert!(paths.contains(&"/kuala-lumpur/cheras"));
        assert!(paths.contains(&"/perlis"));
        assert!(entries.iter().all(|e| e.last_modified == now));
    }
}
