//! Repository pattern for database operations
//!
//! Provides a clean interface for all metadata access with proper error
//! handling. Row IDs for resources, chunks and translated artifacts come
//! from per-entity snowflake generators so concurrent writers cannot
//! collide.

use crate::db::models::*;
use crate::db::DbPool;
use crate::errors::{AppError, Result};
use crate::ids::{nodes, IdGenerator};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set,
};
use std::sync::Arc;

/// Repository for metadata access
#[derive(Clone)]
pub struct Repository {
    pool: DbPool,
    resource_ids: Arc<IdGenerator>,
    chunk_ids: Arc<IdGenerator>,
    translated_resource_ids: Arc<IdGenerator>,
    translated_chunk_ids: Arc<IdGenerator>,
    binding_ids: Arc<IdGenerator>,
}

impl Repository {
    /// Create a new repository with the given connection pool
    pub fn new(pool: DbPool) -> Self {
        Self {
            pool,
            resource_ids: Arc::new(IdGenerator::new(nodes::RESOURCE)),
            chunk_ids: Arc::new(IdGenerator::new(nodes::CHUNK)),
            translated_resource_ids: Arc::new(IdGenerator::new(nodes::TRANSLATED_RESOURCE)),
            translated_chunk_ids: Arc::new(IdGenerator::new(nodes::TRANSLATED_CHUNK)),
            binding_ids: Arc::new(IdGenerator::new(nodes::KB_BINDING)),
        }
    }

    fn read_conn(&self) -> &DatabaseConnection {
        self.pool.read()
    }

    fn write_conn(&self) -> &DatabaseConnection {
        self.pool.write()
    }

    /// Ping the database
    pub async fn ping(&self) -> Result<()> {
        self.pool.ping().await
    }

    // ========================================================================
    // Resource Operations
    // ========================================================================

    /// Create a new resource record
    pub async fn create_resource(&self, filename: &str, storage_url: &str) -> Result<Resource> {
        let now = chrono::Utc::now();

        let resource = ResourceActiveModel {
            id: Set(self.resource_ids.next_id()),
            filename: Set(filename.to_string()),
            storage_url: Set(storage_url.to_string()),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
        };

        resource.insert(self.write_conn()).await.map_err(Into::into)
    }

    /// Find resource by ID
    pub async fn find_resource_by_id(&self, id: i64) -> Result<Option<Resource>> {
        ResourceEntity::find_by_id(id)
            .one(self.read_conn())
            .await
            .map_err(Into::into)
    }

    /// List resources with pagination, newest first
    pub async fn list_resources(&self, limit: u64, offset: u64) -> Result<(Vec<Resource>, u64)> {
        let total = ResourceEntity::find().count(self.read_conn()).await?;

        let resources = ResourceEntity::find()
            .order_by_desc(ResourceColumn::CreatedAt)
            .offset(offset)
            .limit(limit)
            .all(self.read_conn())
            .await?;

        Ok((resources, total))
    }

    /// Delete a resource row
    pub async fn delete_resource(&self, id: i64) -> Result<bool> {
        let result = ResourceEntity::delete_by_id(id)
            .exec(self.write_conn())
            .await?;

        Ok(result.rows_affected > 0)
    }

    // ========================================================================
    // Chunk Operations
    // ========================================================================

    /// Create a chunk record
    pub async fn create_chunk(
        &self,
        resource_id: i64,
        external_chunk_id: &str,
        storage_url: &str,
        order: i32,
    ) -> Result<Chunk> {
        let now = chrono::Utc::now();

        let chunk = ChunkActiveModel {
            id: Set(self.chunk_ids.next_id()),
            resource_id: Set(resource_id),
            external_chunk_id: Set(external_chunk_id.to_string()),
            storage_url: Set(storage_url.to_string()),
            chunk_order: Set(order),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
        };

        chunk.insert(self.write_conn()).await.map_err(Into::into)
    }

    /// Find chunk by ID
    pub async fn find_chunk_by_id(&self, id: i64) -> Result<Option<Chunk>> {
        ChunkEntity::find_by_id(id)
            .one(self.read_conn())
            .await
            .map_err(Into::into)
    }

    /// Get chunks for a resource, in source order
    pub async fn chunks_by_resource(&self, resource_id: i64) -> Result<Vec<Chunk>> {
        ChunkEntity::find()
            .filter(ChunkColumn::ResourceId.eq(resource_id))
            .order_by_asc(ChunkColumn::ChunkOrder)
            .all(self.read_conn())
            .await
            .map_err(Into::into)
    }

    /// Delete all chunks for a resource in a single statement
    pub async fn delete_chunks_by_resource(&self, resource_id: i64) -> Result<u64> {
        let result = ChunkEntity::delete_many()
            .filter(ChunkColumn::ResourceId.eq(resource_id))
            .exec(self.write_conn())
            .await?;

        Ok(result.rows_affected)
    }

    // ========================================================================
    // Knowledge Base Operations
    // ========================================================================

    /// Create a knowledge base record
    pub async fn create_knowledge_base(
        &self,
        id: &str,
        name: &str,
        embedding_model: &str,
        reasoning_model: &str,
    ) -> Result<KnowledgeBase> {
        let kb = KnowledgeBaseActiveModel {
            id: Set(id.to_string()),
            name: Set(name.to_string()),
            embedding_model: Set(embedding_model.to_string()),
            reasoning_model: Set(reasoning_model.to_string()),
            created_at: Set(chrono::Utc::now().into()),
        };

        kb.insert(self.write_conn()).await.map_err(Into::into)
    }

    /// Find knowledge base by ID
    pub async fn find_knowledge_base(&self, id: &str) -> Result<Option<KnowledgeBase>> {
        KnowledgeBaseEntity::find_by_id(id)
            .one(self.read_conn())
            .await
            .map_err(Into::into)
    }

    /// List all knowledge bases, newest first
    pub async fn list_knowledge_bases(&self) -> Result<Vec<KnowledgeBase>> {
        KnowledgeBaseEntity::find()
            .order_by_desc(KnowledgeBaseColumn::CreatedAt)
            .all(self.read_conn())
            .await
            .map_err(Into::into)
    }

    /// Delete a knowledge base row
    pub async fn delete_knowledge_base(&self, id: &str) -> Result<bool> {
        let result = KnowledgeBaseEntity::delete_by_id(id)
            .exec(self.write_conn())
            .await?;

        Ok(result.rows_affected > 0)
    }

    // ========================================================================
    // KB Binding Operations
    // ========================================================================

    /// Bind a chunk into a knowledge base
    pub async fn create_binding(
        &self,
        kb_id: &str,
        resource_id: i64,
        chunk_id: i64,
        title: &str,
        context_description: &str,
    ) -> Result<KbBinding> {
        let binding = KbBindingActiveModel {
            id: Set(self.binding_ids.next_id()),
            kb_id: Set(kb_id.to_string()),
            resource_id: Set(resource_id),
            chunk_id: Set(chunk_id),
            title: Set(title.to_string()),
            context_description: Set(context_description.to_string()),
            created_at: Set(chrono::Utc::now().into()),
        };

        binding.insert(self.write_conn()).await.map_err(Into::into)
    }

    /// Count bindings in a knowledge base
    pub async fn count_bindings(&self, kb_id: &str) -> Result<u64> {
        KbBindingEntity::find()
            .filter(KbBindingColumn::KbId.eq(kb_id))
            .count(self.read_conn())
            .await
            .map_err(Into::into)
    }

    /// Distinct resource IDs bound into a knowledge base
    pub async fn resource_ids_in_kb(&self, kb_id: &str) -> Result<Vec<i64>> {
        let ids: Vec<i64> = KbBindingEntity::find()
            .select_only()
            .column(KbBindingColumn::ResourceId)
            .distinct()
            .filter(KbBindingColumn::KbId.eq(kb_id))
            .into_tuple()
            .all(self.read_conn())
            .await?;

        Ok(ids)
    }

    /// Delete all bindings for a resource within a knowledge base
    pub async fn delete_bindings(&self, kb_id: &str, resource_id: i64) -> Result<u64> {
        let result = KbBindingEntity::delete_many()
            .filter(KbBindingColumn::KbId.eq(kb_id))
            .filter(KbBindingColumn::ResourceId.eq(resource_id))
            .exec(self.write_conn())
            .await?;

        Ok(result.rows_affected)
    }

    /// Delete every binding of a knowledge base
    pub async fn delete_bindings_by_kb(&self, kb_id: &str) -> Result<u64> {
        let result = KbBindingEntity::delete_many()
            .filter(KbBindingColumn::KbId.eq(kb_id))
            .exec(self.write_conn())
            .await?;

        Ok(result.rows_affected)
    }

    // ========================================================================
    // Translated Artifact Operations
    // ========================================================================

    /// Create a translated resource record
    #[allow(clippy::too_many_arguments)]
    pub async fn create_translated_resource(
        &self,
        original_resource_id: i64,
        filename: &str,
        storage_url: &str,
        source_lang: &str,
        target_lang: &str,
        country: &str,
    ) -> Result<TranslatedResource> {
        let now = chrono::Utc::now();

        let translated = TranslatedResourceActiveModel {
            id: Set(self.translated_resource_ids.next_id()),
            original_resource_id: Set(original_resource_id),
            filename: Set(filename.to_string()),
            storage_url: Set(storage_url.to_string()),
            source_lang: Set(source_lang.to_string()),
            target_lang: Set(target_lang.to_string()),
            country: Set(country.to_string()),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
        };

        translated.insert(self.write_conn()).await.map_err(Into::into)
    }

    /// Translated resources derived from an original, optionally narrowed to
    /// one target language
    pub async fn translated_resources_by_original(
        &self,
        original_resource_id: i64,
        target_lang: Option<&str>,
    ) -> Result<Vec<TranslatedResource>> {
        let mut query = TranslatedResourceEntity::find()
            .filter(TranslatedResourceColumn::OriginalResourceId.eq(original_resource_id));

        if let Some(lang) = target_lang {
            query = query.filter(TranslatedResourceColumn::TargetLang.eq(lang));
        }

        query.all(self.read_conn()).await.map_err(Into::into)
    }

    /// Delete a translated resource row. Its chunks must already be gone;
    /// cascades run bottom-up.
    pub async fn delete_translated_resource(&self, id: i64) -> Result<bool> {
        let result = TranslatedResourceEntity::delete_by_id(id)
            .exec(self.write_conn())
            .await?;

        Ok(result.rows_affected > 0)
    }

    /// Create a translated chunk record
    pub async fn create_translated_chunk(
        &self,
        translated_resource_id: i64,
        original_chunk_id: i64,
        external_chunk_id: &str,
        storage_url: &str,
    ) -> Result<TranslatedChunk> {
        let chunk = TranslatedChunkActiveModel {
            id: Set(self.translated_chunk_ids.next_id()),
            translated_resource_id: Set(translated_resource_id),
            original_chunk_id: Set(original_chunk_id),
            external_chunk_id: Set(external_chunk_id.to_string()),
            storage_url: Set(storage_url.to_string()),
            created_at: Set(chrono::Utc::now().into()),
        };

        chunk.insert(self.write_conn()).await.map_err(Into::into)
    }

    /// Get translated chunks of a translated resource
    pub async fn translated_chunks_by_resource(
        &self,
        translated_resource_id: i64,
    ) -> Result<Vec<TranslatedChunk>> {
        TranslatedChunkEntity::find()
            .filter(TranslatedChunkColumn::TranslatedResourceId.eq(translated_resource_id))
            .all(self.read_conn())
            .await
            .map_err(Into::into)
    }

    /// Delete all translated chunks of a translated resource
    pub async fn delete_translated_chunks(&self, translated_resource_id: i64) -> Result<u64> {
        let result = TranslatedChunkEntity::delete_many()
            .filter(TranslatedChunkColumn::TranslatedResourceId.eq(translated_resource_id))
            .exec(self.write_conn())
            .await?;

        Ok(result.rows_affected)
    }

    // ========================================================================
    // Job Operations
    // ========================================================================

    /// Create a job in the pending state
    pub async fn create_job(&self, task_type: &str, payload: serde_json::Value) -> Result<Job> {
        let now = chrono::Utc::now();

        let job = JobActiveModel {
            id: sea_orm::NotSet,
            task_type: Set(task_type.to_string()),
            payload: Set(payload),
            status: Set(JobStatus::Pending.as_str().to_string()),
            error: Set(None),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
        };

        job.insert(self.write_conn()).await.map_err(Into::into)
    }

    /// Find job by ID
    pub async fn find_job_by_id(&self, id: i64) -> Result<Option<Job>> {
        JobEntity::find_by_id(id)
            .one(self.read_conn())
            .await
            .map_err(Into::into)
    }

    /// Compare-and-set status transition.
    ///
    /// Updates the job only when its current status equals `from`. Zero rows
    /// affected means another worker won the transition (`Conflict`) or the
    /// job does not exist (`NotFound`).
    pub async fn transition_job(
        &self,
        id: i64,
        from: JobStatus,
        to: JobStatus,
        error: Option<String>,
    ) -> Result<()> {
        let result = JobEntity::update_many()
            .col_expr(JobColumn::Status, Expr::value(to.as_str()))
            .col_expr(JobColumn::Error, Expr::value(error))
            .col_expr(
                JobColumn::UpdatedAt,
                Expr::value(chrono::Utc::now().fixed_offset()),
            )
            .filter(JobColumn::Id.eq(id))
            .filter(JobColumn::Status.eq(from.as_str()))
            .exec(self.write_conn())
            .await?;

        if result.rows_affected > 0 {
            return Ok(());
        }

        match self.find_job_by_id(id).await? {
            Some(job) => Err(AppError::Conflict {
                message: format!(
                    "job {} is {}, expected {}",
                    id,
                    job.status,
                    from.as_str()
                ),
            }),
            None => Err(AppError::not_found("job", id)),
        }
    }

    // ========================================================================
    // Chat Operations
    // ========================================================================

    /// Persist a chat message
    pub async fn save_chat_message(
        &self,
        session_id: &str,
        message_id: &str,
        role: &str,
        content: &str,
    ) -> Result<ChatMessage> {
        let message = ChatMessageActiveModel {
            message_id: Set(message_id.to_string()),
            session_id: Set(session_id.to_string()),
            role: Set(role.to_string()),
            content: Set(content.to_string()),
            created_at: Set(chrono::Utc::now().into()),
        };

        message.insert(self.write_conn()).await.map_err(Into::into)
    }

    /// Chat history for a session, oldest first
    pub async fn chat_history(&self, session_id: &str) -> Result<Vec<ChatMessage>> {
        ChatMessageEntity::find()
            .filter(ChatMessageColumn::SessionId.eq(session_id))
            .order_by_asc(ChatMessageColumn::CreatedAt)
            .all(self.read_conn())
            .await
            .map_err(Into::into)
    }
}
