use std::collections::HashMap;

use chrono::Utc;
use common::LeadDto;
use model::entities::{dialysis_center, lead};
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set};
use tracing::{info, instrument, warn};

use crate::error::{ListingError, Result};

/// A contact request after request validation.
#[derive(Debug, Clone)]
pub struct NewLead {
    pub name: String,
    pub phone: String,
    pub email: Option<String>,
    pub message: Option<String>,
    pub center_id: Option<String>,
    pub source_ip: String,
}

/// Stores a lead. A `center_id` that matches no center is rejected.
#[instrument(skip(db, new), fields(center_id = ?new.center_id))]
pub async fn create_lead(db: &DatabaseConnection, new: NewLead) -> Result<LeadDto> {
    let center_name = match new.center_id.as_deref() {
        Some(center_id) => {
            let center = dialysis_center::Entity::find_by_id(center_id.to_string())
                .one(db)
                .await?;
            match center {
                Some(center) => Some(center.name),
                None => {
                    warn!("Lead references unknown center {}", center_id);
                    return Err(ListingError::InvalidInput(format!(
                        "Unknown center '{}'",
                        center_id
                    )));
                }
            }
        }
        None => None,
    };

    let saved = lead::ActiveModel {
        name: Set(new.name.trim().to_string()),
        phone: Set(new.phone.trim().to_string()),
        email: Set(new.email.filter(|e| !e.trim().is_empty())),
        message: Set(new.message.filter(|m| !m.trim().is_empty())),
        center_id: Set(new.center_id),
        source_ip: Set(new.source_ip),
        created_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(db)
    .await?;

    info!("Stored lead {}", saved.id);
    Ok(to_dto(saved, center_name))
}

fn to_dto(lead: lead::Model, center_name: Option<String>) -> LeadDto {
    LeadDto {
        id: lead.id,
        name: lead.name,
        phone: lead.phone,
        email: lead.email,
        message: lead.message,
        center_id: lead.center_id,
        center_name,
        created_at: lead.created_at,
    }
}

/// All leads, newest first.
#[instrument(skip(db))]
pub async fn list_leads(db: &DatabaseConnection) -> Result<Vec<LeadDto>> {
    let leads = lead::Entity::find()
        .order_by_desc(lead::Column::CreatedAt)
        .order_by_desc(lead::Column::Id)
        .all(db)
        .await?;

    let center_ids: Vec<String> = leads.iter().filter_map(|l| l.center_id.clone()).collect();
    let names: HashMap<String, String> = if center_ids.is_empty() {
        HashMap::new()
    } else {
        dialysis_center::Entity::find()
            .filter(dialysis_center::Column::Id.is_in(center_ids))
            .all(db)
            .await?
            .into_iter()
            .map(|c| (c.id, c.name))
            .collect()
    };

    Ok(leads
        .into_iter()
        .map(|l| {
            let center_name = l.center_id.as_ref().and_then(|id| names.get(id).cloned());
            to_dto(l, center_name)
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{seed_directory, setup_db};

    fn new_lead(name: &str, center_id: Option<&str>) -> NewLead {
        NewLead {
            name: name.to_string(),
            phone: "012-345 6789".to_string(),
            email: Some("patient@example.com".to_string()),
            message: Some("Looking for evening sessions".to_string()),
            center_id: center_id.map(str::to_string),
            source_ip: "203.0.113.7".to_string(),
        }
    }

    #[tokio::test]
    async fn test_create_lead_for_center() {
        let db = setup_db().await;
        let fixture = seed_directory(&db).await;

        let lead = create_lead(&db, new_lead("Siti", Some(&fixture.kl_kidney_id)))
            .await
            .unwrap();
        assert_eq!(lead.center_name.as_deref(), Some("KL Kidney Centre"));
        assert_eq!(lead.name, "Siti");
    }

    #[tokio::test]
    async fn test_create_lead_unknown_center() {
        let db = setup_db().await;
        seed_directory(&db).await;

        let result = create_lead(&db, new_lead("Siti", Some("missing"))).await;
        assert!(matches!(result, Err(ListingError::InvalidInput(_))));
        assert!(list_leads(&db).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_list_leads_newest_first() {
        let db = setup_db().await;
        let fixture = seed_directory(&db).await;

        create_lead(&db, new_lead("First", None)).await.unwrap();
        create_lead(&db, new_lead("Second", Some(&fixture.shah_alam_id)))
            .await
            .unwrap();

        let leads = list_leads(&db).await.unwrap();
        let names: Vec<&str> = leads.iter().map(|l| l.name.as_str()).collect();
        assert_eq!(names, vec!["Second", "First"]);
        assert_eq!(leads[0].center_name.as_deref(), Some("Shah Alam Renal Centre"));
        assert_eq!(leads[1].center_name, None);
    }
}
