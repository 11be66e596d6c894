//! Read-side queries behind the state, town and "nearby" listings.
//!
//! States and towns are matched on their slug form so that URL segments
//! like `kuala-lumpur` resolve to `Kuala Lumpur`. Results are ordered
//! explicitly: centers by featured first then name, locations by name.

use std::collections::{BTreeMap, HashMap};

use common::{
    CenterSummary, CentersByState, LocationKind, MapMarker, NeighboringLocation, StateSummary,
    TownSummary, slugify,
};
use model::entities::{dialysis_center, state};
use sea_orm::sea_query::Expr;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, QuerySelect};
use tracing::{debug, instrument, trace};

use crate::error::Result;

pub(crate) fn to_summary(center: dialysis_center::Model, state_name: &str) -> CenterSummary {
    CenterSummary {
        id: center.id,
        slug: center.slug,
        name: center.name,
        address: center.address,
        town: center.town,
        state: state_name.to_string(),
        sector: center.sector,
        tel: center.tel,
        featured: center.featured,
    }
}

/// Resolves a state from its display name or slug.
#[instrument(skip(db))]
pub async fn find_state(db: &DatabaseConnection, name_or_slug: &str) -> Result<Option<state::Model>> {
    let wanted = slugify(name_or_slug);
    if wanted.is_empty() {
        return Ok(None);
    }

    let states = state::Entity::find().all(db).await?;
    let found = states.into_iter().find(|s| slugify(&s.name) == wanted);
    trace!(found = found.is_some(), "State lookup for '{}'", name_or_slug);
    Ok(found)
}

/// Centers of one state, optionally narrowed to a town.
///
/// An unknown state or a state without centers yields an empty result with
/// `total == 0`.
#[instrument(skip(db))]
pub async fn centers_by_state(
    db: &DatabaseConnection,
    state_name: &str,
    town: Option<&str>,
) -> Result<CentersByState> {
    let Some(found) = find_state(db, state_name).await? else {
        debug!("No state matches '{}'", state_name);
        return Ok(CentersByState::empty());
    };

    let town_slug = town.map(slugify).filter(|t| !t.is_empty());

    let centers: Vec<CenterSummary> = dialysis_center::Entity::find()
        .filter(dialysis_center::Column::StateId.eq(found.id))
        .order_by_desc(dialysis_center::Column::Featured)
        .order_by_asc(dialysis_center::Column::Name)
        .all(db)
        .await?
        .into_iter()
        .filter(|c| town_slug.as_deref().is_none_or(|t| slugify(&c.town) == t))
        .map(|c| to_summary(c, &found.name))
        .collect();

    let total = centers.len() as u64;
    debug!("Found {} centers in {} (town filter: {:?})", total, found.name, town_slug);
    Ok(CentersByState { centers, total })
}

/// Every listed center with its state name.
#[instrument(skip(db))]
pub async fn all_centers(db: &DatabaseConnection) -> Result<Vec<CenterSummary>> {
    let rows = dialysis_center::Entity::find()
        .find_also_related(state::Entity)
        .order_by_desc(dialysis_center::Column::Featured)
        .order_by_asc(dialysis_center::Column::Name)
        .all(db)
        .await?;

    Ok(rows
        .into_iter()
        .map(|(center, state)| {
            let state_name = state.map(|s| s.name).unwrap_or_default();
            to_summary(center, &state_name)
        })
        .collect())
}

/// Centers that have both coordinates, for map pins.
#[instrument(skip(db))]
pub async fn centers_for_map(db: &DatabaseConnection) -> Result<Vec<MapMarker>> {
    let rows = dialysis_center::Entity::find()
        .filter(dialysis_center::Column::Latitude.is_not_null())
        .filter(dialysis_center::Column::Longitude.is_not_null())
        .find_also_related(state::Entity)
        .order_by_asc(dialysis_center::Column::Name)
        .all(db)
        .await?;

    Ok(rows
        .into_iter()
        .filter_map(|(center, state)| {
            Some(MapMarker {
                latitude: center.latitude?,
                longitude: center.longitude?,
                id: center.id,
                slug: center.slug,
                name: center.name,
                town: center.town,
                state: state.map(|s| s.name).unwrap_or_default(),
            })
        })
        .collect())
}

/// All states, alphabetically, with their center counts (zero included).
#[instrument(skip(db))]
pub async fn states_with_counts(db: &DatabaseConnection) -> Result<Vec<StateSummary>> {
    let counts: HashMap<i32, i64> = dialysis_center::Entity::find()
        .select_only()
        .column(dialysis_center::Column::StateId)
        .column_as(Expr::col(dialysis_center::Column::Id).count(), "center_count")
        .group_by(dialysis_center::Column::StateId)
        .into_tuple::<(i32, i64)>()
        .all(db)
        .await?
        .into_iter()
        .collect();

    let states = state::Entity::find()
        .order_by_asc(state::Column::Name)
        .all(db)
        .await?;

    Ok(states
        .into_iter()
        .map(|s| StateSummary {
            center_count: counts.get(&s.id).copied().unwrap_or(0).max(0) as u64,
            slug: slugify(&s.name),
            id: s.id,
            name: s.name,
        })
        .collect())
}

/// Towns of a state, alphabetically, with center counts.
///
/// Towns are grouped by slug; the first spelling seen is used for display.
#[instrument(skip(db))]
pub async fn towns_in_state(db: &DatabaseConnection, state_id: i32) -> Result<Vec<TownSummary>> {
    let centers = dialysis_center::Entity::find()
        .filter(dialysis_center::Column::StateId.eq(state_id))
        .order_by_asc(dialysis_center::Column::Town)
        .all(db)
        .await?;

    let mut towns: BTreeMap<String, TownSummary> = BTreeMap::new();
    for center in centers {
        let slug = slugify(&center.town);
        towns
            .entry(slug.clone())
            .and_modify(|t| t.center_count += 1)
            .or_insert(TownSummary {
                name: center.town,
                slug,
                center_count: 1,
            });
    }

    let mut towns: Vec<TownSummary> = towns.into_values().collect();
    towns.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(towns)
}

/// Other locations to suggest next to the current one.
///
/// With a city: the other towns of the same state. Without: the other
/// states. The current location and locations without centers are left
/// out. An unknown state yields an empty list.
#[instrument(skip(db))]
pub async fn neighboring_locations(
    db: &DatabaseConnection,
    state_name: &str,
    city: Option<&str>,
) -> Result<Vec<NeighboringLocation>> {
    let Some(current) = find_state(db, state_name).await? else {
        return Ok(Vec::new());
    };
    let state_slug = slugify(&current.name);

    match city.map(slugify).filter(|c| !c.is_empty()) {
        Some(city_slug) => {
            let towns = towns_in_state(db, current.id).await?;
            Ok(towns
                .into_iter()
                .filter(|t| t.slug != city_slug)
                .map(|t| NeighboringLocation {
                    kind: LocationKind::Town,
                    name: t.name,
                    slug: t.slug,
                    state_slug: state_slug.clone(),
                    center_count: t.center_count,
                })
                .collect())
        }
        None => {
            let states = states_with_counts(db).await?;
            Ok(states
                .into_iter()
                .filter(|s| s.id != current.id && s.center_count > 0)
                .map(|s| NeighboringLocation {
                    kind: LocationKind::State,
                    name: s.name,
                    state_slug: s.slug.clone(),
                    slug: s.slug,
                    center_count: s.center_count,
                })
                .collect())
        }
    }
}
