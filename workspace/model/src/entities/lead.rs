use sea_orm::entity::prelude::*;

/// A contact request submitted from the public site.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "leads")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub name: String,
    pub phone: String,
    pub email: Option<String>,
    pub message: Option<String>,
    pub center_id: Option<String>,
    pub source_ip: String,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::dialysis_center::Entity",
        from = "Column::CenterId",
        to = "super::dialysis_center::Column::Id",
        on_delete = "SetNull"
    )]
    DialysisCenter,
}

impl Related<super::dialysis_center::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::DialysisCenter.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
