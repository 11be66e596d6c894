use sea_orm::entity::prelude::*;

/// An image attached to a dialysis center.
///
/// Active images of a center hold display orders 1..N with no gaps.
/// Deactivated images keep their row but hold order 0.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "center_images")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub center_id: String,
    /// Key of the object in image storage.
    pub storage_key: String,
    pub display_order: i32,
    #[sea_orm(default_value = "true")]
    pub is_active: bool,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::dialysis_center::Entity",
        from = "Column::CenterId",
        to = "super::dialysis_center::Column::Id",
        on_delete = "Cascade"
    )]
    DialysisCenter,
}

impl Related<super::dialysis_center::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::DialysisCenter.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
