//! Translated fragment entity

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "translated_chunks")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: i64,

    pub translated_resource_id: i64,

    pub original_chunk_id: i64,

    /// Human-stable tag, unique within the translated resource
    #[sea_orm(column_type = "Text")]
    pub external_chunk_id: String,

    /// Object store reference, "bucket/key"
    #[sea_orm(column_type = "Text")]
    pub storage_url: String,

    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::translated_resource::Entity",
        from = "Column::TranslatedResourceId",
        to = "super::translated_resource::Column::Id",
        on_delete = "Cascade"
    )]
    TranslatedResource,
}

impl Related<super::translated_resource::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::TranslatedResource.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
