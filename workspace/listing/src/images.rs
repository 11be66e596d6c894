//! Center image ordering.
//!
//! Active images of a center always hold display orders 1..N. Every write
//! here runs in one transaction that first locks the center row, so two
//! writers on the same center cannot interleave their updates.

use std::collections::HashSet;

use chrono::Utc;
use common::CenterImageDto;
use model::entities::{center_image, dialysis_center};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DatabaseTransaction,
    DbBackend, EntityTrait, QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::error::{ListingError, Result};

fn to_image_dto(image: center_image::Model) -> CenterImageDto {
    CenterImageDto {
        id: image.id,
        storage_key: image.storage_key,
        display_order: image.display_order,
    }
}

/// Loads the center inside `txn`, taking a row lock where the backend has one.
/// SQLite serializes writers on its own.
async fn lock_center(txn: &DatabaseTransaction, center_id: &str) -> Result<dialysis_center::Model> {
    let mut query = dialysis_center::Entity::find_by_id(center_id.to_string());
    if txn.get_database_backend() != DbBackend::Sqlite {
        query = query.lock_exclusive();
    }

    query
        .one(txn)
        .await?
        .ok_or_else(|| ListingError::not_found("Center", center_id))
}

async fn active_image_models<C: ConnectionTrait>(
    conn: &C,
    center_id: &str,
) -> Result<Vec<center_image::Model>> {
    Ok(center_image::Entity::find()
        .filter(center_image::Column::CenterId.eq(center_id))
        .filter(center_image::Column::IsActive.eq(true))
        .order_by_asc(center_image::Column::DisplayOrder)
        .order_by_asc(center_image::Column::CreatedAt)
        .all(conn)
        .await?)
}

/// Writes orders 1..N following `ordered_ids`.
async fn assign_orders(txn: &DatabaseTransaction, ordered_ids: &[String]) -> Result<()> {
    let now = Utc::now();
    for (position, image_id) in ordered_ids.iter().enumerate() {
        center_image::Entity::update_many()
            .col_expr(center_image::Column::DisplayOrder, Expr::value(position as i32 + 1))
            .col_expr(center_image::Column::UpdatedAt, Expr::value(now))
            .filter(center_image::Column::Id.eq(image_id.as_str()))
            .exec(txn)
            .await?;
    }
    Ok(())
}

/// Active images of a center in display order.
pub async fn active_images(db: &DatabaseConnection, center_id: &str) -> Result<Vec<CenterImageDto>> {
    Ok(active_image_models(db, center_id)
        .await?
        .into_iter()
        .map(to_image_dto)
        .collect())
}

/// Appends an image after the center's current active images.
#[instrument(skip(db))]
pub async fn add_image(
    db: &DatabaseConnection,
    center_id: &str,
    storage_key: &str,
) -> Result<CenterImageDto> {
    let txn = db.begin().await?;
    let center = lock_center(&txn, center_id).await?;
    let next_order = active_image_models(&txn, &center.id).await?.len() as i32 + 1;

    let now = Utc::now();
    let image = center_image::ActiveModel {
        id: Set(Uuid::new_v4().to_string()),
        center_id: Set(center.id.clone()),
        storage_key: Set(storage_key.to_string()),
        display_order: Set(next_order),
        is_active: Set(true),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(&txn)
    .await?;

    txn.commit().await?;
    info!("Added image {} to center {} at position {}", image.id, center.id, next_order);
    Ok(to_image_dto(image))
}

/// Assigns display orders 1..N following the position of each id in
/// `image_ids`.
///
/// The list must name every active image of the center exactly once.
/// Reapplying the same list leaves the same ordering.
#[instrument(skip(db))]
pub async fn reorder_images(
    db: &DatabaseConnection,
    center_id: &str,
    image_ids: &[String],
) -> Result<Vec<CenterImageDto>> {
    let txn = db.begin().await?;
    let center = lock_center(&txn, center_id).await?;
    let active = active_image_models(&txn, &center.id).await?;

    let known: HashSet<&str> = active.iter().map(|i| i.id.as_str()).collect();
    let mut seen: HashSet<&str> = HashSet::with_capacity(image_ids.len());
    for id in image_ids {
        if !known.contains(id.as_str()) {
            warn!("Image {} is not an active image of center {}", id, center.id);
            return Err(ListingError::InvalidInput(format!(
                "Image '{}' is not an active image of this center",
                id
            )));
        }
        if !seen.insert(id.as_str()) {
            return Err(ListingError::InvalidInput(format!(
                "Image '{}' is listed more than once",
                id
            )));
        }
    }
    if seen.len() != known.len() {
        return Err(ListingError::InvalidInput(format!(
            "Expected {} image ids, got {}",
            known.len(),
            seen.len()
        )));
    }

    assign_orders(&txn, image_ids).await?;
    let reordered = active_image_models(&txn, &center.id).await?;
    txn.commit().await?;

    debug!("Reordered {} images of center {}", reordered.len(), center.id);
    Ok(reordered.into_iter().map(to_image_dto).collect())
}

/// Hides an image and closes the gap it leaves in the ordering.
///
/// Deactivating an already inactive image is a no-op.
#[instrument(skip(db))]
pub async fn deactivate_image(
    db: &DatabaseConnection,
    center_id: &str,
    image_id: &str,
) -> Result<Vec<CenterImageDto>> {
    let txn = db.begin().await?;
    let center = lock_center(&txn, center_id).await?;

    let image = center_image::Entity::find_by_id(image_id.to_string())
        .filter(center_image::Column::CenterId.eq(center.id.as_str()))
        .one(&txn)
        .await?
        .ok_or_else(|| ListingError::not_found("Image", image_id))?;

    if image.is_active {
        let mut hidden: center_image::ActiveModel = image.into();
        hidden.is_active = Set(false);
        hidden.display_order = Set(0);
        hidden.updated_at = Set(Utc::now());
        hidden.update(&txn).await?;

        let remaining: Vec<String> = active_image_models(&txn, &center.id)
            .await?
            .into_iter()
            .map(|i| i.id)
            .collect();
        assign_orders(&txn, &remaining).await?;
        info!("Deactivated image {} of center {}", image_id, center.id);
    } else {
        debug!("Image {} is already inactive", image_id);
    }

    let images = active_image_models(&txn, &center.id).await?;
    txn.commit().await?;
    Ok(images.into_iter().map(to_image_dto).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{seed_directory, seed_images, setup_db};

    fn orders(images: &[CenterImageDto]) -> Vec<(String, i32)> {
        images.iter().map(|i| (i.id.clone(), i.display_order)).collect()
    }

    #[tokio::test]
    async fn test_reorder_swaps_two_images() {
        let db = setup_db().await;
        let fixture = seed_directory(&db).await;
        let ids = seed_images(&db, &fixture.kl_kidney_id, 2).await;
        let (img1, img2) = (ids[0].clone(), ids[1].clone());

        let result = reorder_images(&db, &fixture.kl_kidney_id, &[img2.clone(), img1.clone()])
            .await
            .unwrap();
        assert_eq!(orders(&result), vec![(img2.clone(), 1), (img1.clone(), 2)]);

        // Reapplying the same list changes nothing
        let again = reorder_images(&db, &fixture.kl_kidney_id, &[img2.clone(), img1.clone()])
            .await
            .unwrap();
        assert_eq!(orders(&again), orders(&result));

        let stored = active_images(&db, &fixture.kl_kidney_id).await.unwrap();
        assert_eq!(orders(&stored), vec![(img2, 1), (img1, 2)]);
    }

    #[tokio::test]
    async fn test_reorder_rejects_partial_list() {
        let db = setup_db().await;
        let fixture = seed_directory(&db).await;
        let ids = seed_images(&db, &fixture.kl_kidney_id, 3).await;

        let result = reorder_images(&db, &fixture.kl_kidney_id, &ids[..2]).await;
        assert!(matches!(result, Err(ListingError::InvalidInput(_))));

        // Nothing was written
        let stored = active_images(&db, &fixture.kl_kidney_id).await.unwrap();
        let stored_ids: Vec<String> = stored.into_iter().map(|i| i.id).collect();
        assert_eq!(stored_ids, ids);
    }

    #[tokio::test]
    async fn test_reorder_rejects_duplicates_and_foreign_images() {
        let db = setup_db().await;
        let fixture = seed_directory(&db).await;
        let ids = seed_images(&db, &fixture.kl_kidney_id, 2).await;
        let other = seed_images(&db, &fixture.shah_alam_id, 1).await;

        let duplicate = reorder_images(&db, &fixture.kl_kidney_id, &[ids[0].clone(), ids[0].clone()]).await;
        assert!(matches!(duplicate, Err(ListingError::InvalidInput(_))));

        let foreign = reorder_images(&db, &fixture.kl_kidney_id, &[ids[0].clone(), other[0].clone()]).await;
        assert!(matches!(foreign, Err(ListingError::InvalidInput(_))));
    }

    #[tokio::test]
    async fn test_reorder_unknown_center() {
        let db = setup_db().await;
        seed_directory(&db).await;

        let result = reorder_images(&db, "missing", &[]).await;
        assert!(matches!(result, Err(ListingError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_add_image_appends() {
        let db = setup_db().await;
        let fixture = seed_directory(&db).await;
        seed_images(&db, &fixture.klang_care_id, 2).await;

        let added = add_image(&db, &fixture.klang_care_id, "centers/new.jpg").await.unwrap();
        assert_eq!(added.display_order, 3);
        assert_eq!(added.storage_key, "centers/new.jpg");
    }

    #[tokio::test]
    async fn test_deactivate_keeps_order_dense() {
        let db = setup_db().await;
        let fixture = seed_directory(&db).await;
        let ids = seed_images(&db, &fixture.klang_care_id, 3).await;

        let remaining = deactivate_image(&db, &fixture.klang_care_id, &ids[0]).await.unwrap();
        assert_eq!(
            orders(&remaining),
            vec![(ids[1].clone(), 1), (ids[2].clone(), 2)]
        );

        // A second call is a no-op
        let again = deactivate_image(&db, &fixture.klang_care_id, &ids[0]).await.unwrap();
        assert_eq!(orders(&again), orders(&remaining));

        // The hidden image can no longer take part in a reorder
        let result = reorder_images(
            &db,
            &fixture.klang_care_id,
            &[ids[0].clone(), ids[1].clone(), ids[2].clone()],
        )
        .await;
        assert!(matches!(result, Err(ListingError::InvalidInput(_))));
    }

    #[tokio::test]
    async fn test_deactivate_image_of_other_center() {
        let db = setup_db().await;
        let fixture = seed_directory(&db).await;
        let ids = seed_images(&db, &fixture.klang_care_id, 1).await;

        let result = deactivate_image(&db, &fixture.shah_alam_id, &ids[0]).await;
        assert!(matches!(result, Err(ListingError::NotFound { .. })));
    }
}
