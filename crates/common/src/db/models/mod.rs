//! SeaORM entity models

mod chat_message;
mod chunk;
mod job;
mod kb_binding;
mod knowledge_base;
mod resource;
mod translated_chunk;
mod translated_resource;

pub use resource::{
    ActiveModel as ResourceActiveModel, Column as ResourceColumn, Entity as ResourceEntity,
    Model as Resource,
};

pub use chunk::{
    ActiveModel as ChunkActiveModel, Column as ChunkColumn, Entity as ChunkEntity, Model as Chunk,
};

pub use knowledge_base::{
    ActiveModel as KnowledgeBaseActiveModel, Column as KnowledgeBaseColumn,
    Entity as KnowledgeBaseEntity, Model as KnowledgeBase,
};

pub use kb_binding::{
    ActiveModel as KbBindingActiveModel, Column as KbBindingColumn, Entity as KbBindingEntity,
    Model as KbBinding,
};

pub use translated_resource::{
    ActiveModel as TranslatedResourceActiveModel, Column as TranslatedResourceColumn,
    Entity as TranslatedResourceEntity, Model as TranslatedResource,
};

pub use translated_chunk::{
    ActiveModel as TranslatedChunkActiveModel, Column as TranslatedChunkColumn,
    Entity as TranslatedChunkEntity, Model as TranslatedChunk,
};

pub use job::{
    ActiveModel as JobActiveModel, Column as JobColumn, Entity as JobEntity, JobStatus,
    Model as Job,
};

pub use chat_message::{
    ActiveModel as ChatMessageActiveModel, Column as ChatMessageColumn,
    Entity as ChatMessageEntity, Model as ChatMessage,
};
