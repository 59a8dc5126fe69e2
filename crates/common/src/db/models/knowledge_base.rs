//! Knowledge base entity

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "knowledge_bases")]
pub struct Model {
    /// External string identifier; also names the vector class
    #[sea_orm(primary_key, auto_increment = false, column_type = "Text")]
    pub id: String,

    #[sea_orm(column_type = "Text")]
    pub name: String,

    #[sea_orm(column_type = "Text")]
    pub embedding_model: String,

    #[sea_orm(column_type = "Text")]
    pub reasoning_model: String,

    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::kb_binding::Entity")]
    KbBinding,
}

impl Related<super::kb_binding::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::KbBinding.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
