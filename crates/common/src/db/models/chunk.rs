//! Extracted document fragment entity
//!
//! `(resource_id, chunk_order)` is unique; `chunk_order` defines the
//! intra-resource sequence preserved at retrieval and translation assembly.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "chunks")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: i64,

    pub resource_id: i64,

    /// Human-stable tag, unique within the resource, e.g. "chunk_3"
    #[sea_orm(column_type = "Text")]
    pub external_chunk_id: String,

    /// Object store reference, "bucket/key"
    #[sea_orm(column_type = "Text")]
    pub storage_url: String,

    pub chunk_order: i32,

    pub created_at: DateTimeWithTimeZone,

    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::resource::Entity",
        from = "Column::ResourceId",
        to = "super::resource::Column::Id",
        on_delete = "Cascade"
    )]
    Resource,
}

impl Related<super::resource::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Resource.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
