use sea_orm::entity::prelude::*;

/// A dialysis service location, the primary listed entity.
///
/// `slug` is the external identifier used in URLs; `id` is a UUID string
/// assigned on creation.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "dialysis_centers")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    #[sea_orm(unique)]
    pub slug: String,
    pub name: String,
    pub address: String,
    pub town: String,
    /// Operator sector, e.g. "Government", "Private", "NGO".
    pub sector: Option<String>,
    pub tel: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub website: Option<String>,
    pub doctor_in_charge: Option<String>,
    /// Free-text list of offered services.
    pub services: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    #[sea_orm(default_value = "false")]
    pub featured: bool,
    pub state_id: i32,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::state::Entity",
        from = "Column::StateId",
        to = "super::state::Column::Id",
        on_delete = "Restrict"
    )]
    State,
    #[sea_orm(has_many = "super::center_image::Entity")]
    CenterImage,
    #[sea_orm(has_many = "super::lead::Entity")]
    Lead,
}

impl Related<super::state::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::State.def()
    }
}

impl Related<super::center_image::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::CenterImage.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
