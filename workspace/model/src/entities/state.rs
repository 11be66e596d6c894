use sea_orm::entity::prelude::*;

/// A Malaysian state or federal territory.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "states")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(unique)]
    pub name: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// A state has many dialysis centers.
    #[sea_orm(has_many = "super::dialysis_center::Entity")]
    DialysisCenter,
}

impl Related<super::dialysis_center::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::DialysisCenter.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
