//! Translated document entity
//!
//! At most one row is active per `(original_resource_id, target_lang,
//! country)`; the translation task deletes prior rows before writing.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "translated_resources")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: i64,

    pub original_resource_id: i64,

    #[sea_orm(column_type = "Text")]
    pub filename: String,

    /// Object store reference, "bucket/key"
    #[sea_orm(column_type = "Text")]
    pub storage_url: String,

    #[sea_orm(column_type = "Text")]
    pub source_lang: String,

    #[sea_orm(column_type = "Text")]
    pub target_lang: String,

    #[sea_orm(column_type = "Text")]
    pub country: String,

    pub created_at: DateTimeWithTimeZone,

    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::translated_chunk::Entity")]
    TranslatedChunk,
}

impl Related<super::translated_chunk::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::TranslatedChunk.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
