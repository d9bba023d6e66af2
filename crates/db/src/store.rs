//! Injectable storage traits.
//!
//! Handlers and services depend on these traits rather than on a pool, so
//! the same code runs against PostgreSQL ([`PgStore`]) or the in-process
//! [`MemoryStore`](crate::memory::MemoryStore).

use std::sync::Arc;

use async_trait::async_trait;
use docflow_core::contract::HealthAnswer;
use docflow_core::types::{DbId, Timestamp};

use crate::models::customization::Customization;
use crate::models::document_template::{
    CreateDocumentTemplate, DocumentTemplate, UpdateDocumentTemplate,
};
use crate::models::notification::{CreateNotification, Notification};
use crate::models::pdf_template::{CreatePdfTemplate, PdfTemplate, UpdatePdfTemplate};
use crate::models::sales_request::{
    CreateSalesRequest, SalesRequest, SalesRequestFilter, UpdateSalesRequest,
};
use crate::models::session::{
    CreatePasswordResetToken, CreateSession, PasswordResetToken, UserSession,
};
use crate::models::user::{CreateUser, UpdateUser, User};
use crate::repositories::{
    CustomizationRepo, DocumentTemplateRepo, NotificationRepo, PasswordResetRepo,
    PdfTemplateRepo, SalesRequestRepo, SessionRepo, UserRepo,
};
use crate::DbPool;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A uniqueness rule was violated (in-memory backend; PostgreSQL reports
    /// these as [`StoreError::Database`] with code 23505).
    #[error("Conflict: {0}")]
    Conflict(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

// ---------------------------------------------------------------------------
// Traits
// ---------------------------------------------------------------------------

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn create(&self, input: &CreateUser) -> StoreResult<User>;
    async fn find_by_id(&self, id: DbId) -> StoreResult<Option<User>>;
    async fn find_by_email(&self, email: &str) -> StoreResult<Option<User>>;
    async fn list(&self) -> StoreResult<Vec<User>>;
    async fn list_active_ids(&self) -> StoreResult<Vec<DbId>>;
    async fn update(&self, id: DbId, input: &UpdateUser) -> StoreResult<Option<User>>;
    async fn deactivate(&self, id: DbId) -> StoreResult<bool>;
    /// Returns the new failed-attempt count.
    async fn increment_failed_login(&self, id: DbId) -> StoreResult<i32>;
    async fn lock_account(&self, id: DbId, until: Timestamp) -> StoreResult<()>;
    async fn record_successful_login(&self, id: DbId) -> StoreResult<()>;
    async fn update_password(&self, id: DbId, password_hash: &str) -> StoreResult<bool>;
}

/// Refresh sessions and password reset tokens.
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn create_session(&self, input: &CreateSession) -> StoreResult<UserSession>;
    /// Revoke and return the live session for a refresh token. A token can
    /// be consumed once.
    async fn consume_session(&self, refresh_token_hash: &str)
        -> StoreResult<Option<UserSession>>;
    async fn revoke_all_for_user(&self, user_id: DbId) -> StoreResult<u64>;
    async fn cleanup_expired_sessions(&self) -> StoreResult<u64>;

    async fn create_reset_token(
        &self,
        input: &CreatePasswordResetToken,
    ) -> StoreResult<PasswordResetToken>;
    async fn find_valid_reset_token(&self, token_hash: &str)
        -> StoreResult<Option<PasswordResetToken>>;
    async fn mark_reset_token_used(&self, id: DbId) -> StoreResult<bool>;
    async fn cleanup_expired_reset_tokens(&self) -> StoreResult<u64>;
}

#[async_trait]
pub trait PdfTemplateStore: Send + Sync {
    async fn create(&self, created_by: DbId, input: &CreatePdfTemplate)
        -> StoreResult<PdfTemplate>;
    async fn find_by_id(&self, id: DbId) -> StoreResult<Option<PdfTemplate>>;
    async fn list(&self) -> StoreResult<Vec<PdfTemplate>>;
    async fn update(&self, id: DbId, input: &UpdatePdfTemplate)
        -> StoreResult<Option<PdfTemplate>>;
    async fn deactivate(&self, id: DbId) -> StoreResult<bool>;
}

#[async_trait]
pub trait DocumentTemplateStore: Send + Sync {
    async fn create(
        &self,
        created_by: DbId,
        input: &CreateDocumentTemplate,
    ) -> StoreResult<DocumentTemplate>;
    async fn find_by_id(&self, id: DbId) -> StoreResult<Option<DocumentTemplate>>;
    async fn list(&self) -> StoreResult<Vec<DocumentTemplate>>;
    async fn update(
        &self,
        id: DbId,
        input: &UpdateDocumentTemplate,
    ) -> StoreResult<Option<DocumentTemplate>>;
    async fn delete(&self, id: DbId) -> StoreResult<bool>;
}

/// Sales requests. Status methods are compare-and-set on the expected
/// current status and return `None` when the request is missing or has
/// already moved on.
#[async_trait]
pub trait SalesRequestStore: Send + Sync {
    async fn create(&self, created_by: DbId, input: &CreateSalesRequest)
        -> StoreResult<SalesRequest>;
    async fn find_by_id(&self, id: DbId) -> StoreResult<Option<SalesRequest>>;
    async fn list(&self, filter: &SalesRequestFilter) -> StoreResult<Vec<SalesRequest>>;
    async fn update(&self, id: DbId, input: &UpdateSalesRequest)
        -> StoreResult<Option<SalesRequest>>;
    async fn submit(&self, id: DbId) -> StoreResult<Option<SalesRequest>>;
    async fn declare_health(
        &self,
        id: DbId,
        answers: &[HealthAnswer],
    ) -> StoreResult<Option<SalesRequest>>;
    async fn request_signature(
        &self,
        id: DbId,
        reference: Option<&str>,
    ) -> StoreResult<Option<SalesRequest>>;
    async fn record_signature(
        &self,
        id: DbId,
        signed_document_url: Option<&str>,
    ) -> StoreResult<Option<SalesRequest>>;
    async fn reject(&self, id: DbId, reason: &str) -> StoreResult<Option<SalesRequest>>;
}

#[async_trait]
pub trait NotificationStore: Send + Sync {
    async fn create(&self, input: &CreateNotification) -> StoreResult<Notification>;
    async fn list_for_user(
        &self,
        user_id: DbId,
        unread_only: bool,
        limit: i64,
        offset: i64,
    ) -> StoreResult<Vec<Notification>>;
    async fn unread_count(&self, user_id: DbId) -> StoreResult<i64>;
    /// Monotonic: an already-read notification keeps its `read_at`.
    async fn mark_read(&self, id: DbId, user_id: DbId) -> StoreResult<Option<Notification>>;
    async fn mark_all_read(&self, user_id: DbId) -> StoreResult<u64>;
    async fn delete(&self, id: DbId, user_id: DbId) -> StoreResult<bool>;
}

#[async_trait]
pub trait CustomizationStore: Send + Sync {
    async fn list(&self) -> StoreResult<Vec<Customization>>;
    async fn find(&self, key: &str) -> StoreResult<Option<Customization>>;
    async fn upsert(
        &self,
        key: &str,
        value: &serde_json::Value,
        updated_by: DbId,
    ) -> StoreResult<Customization>;
    async fn delete(&self, key: &str) -> StoreResult<bool>;
}

// ---------------------------------------------------------------------------
// Bundle
// ---------------------------------------------------------------------------

/// Every store the application needs, behind trait objects.
#[derive(Clone)]
pub struct Stores {
    pub users: Arc<dyn UserStore>,
    pub sessions: Arc<dyn SessionStore>,
    pub pdf_templates: Arc<dyn PdfTemplateStore>,
    pub document_templates: Arc<dyn DocumentTemplateStore>,
    pub sales_requests: Arc<dyn SalesRequestStore>,
    pub notifications: Arc<dyn NotificationStore>,
    pub customizations: Arc<dyn CustomizationStore>,
    /// Present only for the PostgreSQL backend.
    pub pool: Option<DbPool>,
}

impl Stores {
    /// All stores backed by one PostgreSQL pool.
    pub fn postgres(pool: DbPool) -> Self {
        let store = Arc::new(PgStore::new(pool.clone()));
        Self {
            users: store.clone(),
            sessions: store.clone(),
            pdf_templates: store.clone(),
            document_templates: store.clone(),
            sales_requests: store.clone(),
            notifications: store.clone(),
            customizations: store,
            pool: Some(pool),
        }
    }

    /// All stores backed by one shared in-memory state.
    pub fn in_memory() -> Self {
        let store = Arc::new(crate::memory::MemoryStore::default());
        Self {
            users: store.clone(),
            sessions: store.clone(),
            pdf_templates: store.clone(),
            document_templates: store.clone(),
            sales_requests: store.clone(),
            notifications: store.clone(),
            customizations: store,
            pool: None,
        }
    }

    pub fn backend_name(&self) -> &'static str {
        if self.pool.is_some() {
            "postgres"
        } else {
            "memory"
        }
    }
}

// ---------------------------------------------------------------------------
// PostgreSQL implementation
// ---------------------------------------------------------------------------

/// Delegates every store method to the matching repository.
#[derive(Clone)]
pub struct PgStore {
    pool: DbPool,
}

impl PgStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserStore for PgStore {
    async fn create(&self, input: &CreateUser) -> StoreResult<User> {
        Ok(UserRepo::create(&self.pool, input).await?)
    }

    async fn find_by_id(&self, id: DbId) -> StoreResult<Option<User>> {
        Ok(UserRepo::find_by_id(&self.pool, id).await?)
    }

    async fn find_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        Ok(UserRepo::find_by_email(&self.pool, email).await?)
    }

    async fn list(&self) -> StoreResult<Vec<User>> {
        Ok(UserRepo::list(&self.pool).await?)
    }

    async fn list_active_ids(&self) -> StoreResult<Vec<DbId>> {
        Ok(UserRepo::list_active_ids(&self.pool).await?)
    }

    async fn update(&self, id: DbId, input: &UpdateUser) -> StoreResult<Option<User>> {
        Ok(UserRepo::update(&self.pool, id, input).await?)
    }

    async fn deactivate(&self, id: DbId) -> StoreResult<bool> {
        Ok(UserRepo::deactivate(&self.pool, id).await?)
    }

    async fn increment_failed_login(&self, id: DbId) -> StoreResult<i32> {
        Ok(UserRepo::increment_failed_login(&self.pool, id).await?)
    }

    async fn lock_account(&self, id: DbId, until: Timestamp) -> StoreResult<()> {
        Ok(UserRepo::lock_account(&self.pool, id, until).await?)
    }

    async fn record_successful_login(&self, id: DbId) -> StoreResult<()> {
        Ok(UserRepo::record_successful_login(&self.pool, id).await?)
    }

    async fn update_password(&self, id: DbId, password_hash: &str) -> StoreResult<bool> {
        Ok(UserRepo::update_password(&self.pool, id, password_hash).await?)
    }
}

#[async_trait]
impl SessionStore for PgStore {
    async fn create_session(&self, input: &CreateSession) -> StoreResult<UserSession> {
        Ok(SessionRepo::create(&self.pool, input).await?)
    }

    async fn consume_session(
        &self,
        refresh_token_hash: &str,
    ) -> StoreResult<Option<UserSession>> {
        Ok(SessionRepo::consume(&self.pool, refresh_token_hash).await?)
    }

    async fn revoke_all_for_user(&self, user_id: DbId) -> StoreResult<u64> {
        Ok(SessionRepo::revoke_all_for_user(&self.pool, user_id).await?)
    }

    async fn cleanup_expired_sessions(&self) -> StoreResult<u64> {
        Ok(SessionRepo::purge_dead(&self.pool).await?)
    }

    async fn create_reset_token(
        &self,
        input: &CreatePasswordResetToken,
    ) -> StoreResult<PasswordResetToken> {
        Ok(PasswordResetRepo::create(&self.pool, input).await?)
    }

    async fn find_valid_reset_token(
        &self,
        token_hash: &str,
    ) -> StoreResult<Option<PasswordResetToken>> {
        Ok(PasswordResetRepo::find_valid(&self.pool, token_hash).await?)
    }

    async fn mark_reset_token_used(&self, id: DbId) -> StoreResult<bool> {
        Ok(PasswordResetRepo::mark_used(&self.pool, id).await?)
    }

    async fn cleanup_expired_reset_tokens(&self) -> StoreResult<u64> {
        Ok(PasswordResetRepo::cleanup_expired(&self.pool).await?)
    }
}

#[async_trait]
impl PdfTemplateStore for PgStore {
    async fn create(
        &self,
        created_by: DbId,
        input: &CreatePdfTemplate,
    ) -> StoreResult<PdfTemplate> {
        Ok(PdfTemplateRepo::create(&self.pool, created_by, input).await?)
    }

    async fn find_by_id(&self, id: DbId) -> StoreResult<Option<PdfTemplate>> {
        Ok(PdfTemplateRepo::find_by_id(&self.pool, id).await?)
    }

    async fn list(&self) -> StoreResult<Vec<PdfTemplate>> {
        Ok(PdfTemplateRepo::list(&self.pool).await?)
    }

    async fn update(
        &self,
        id: DbId,
        input: &UpdatePdfTemplate,
    ) -> StoreResult<Option<PdfTemplate>> {
        Ok(PdfTemplateRepo::update(&self.pool, id, input).await?)
    }

    async fn deactivate(&self, id: DbId) -> StoreResult<bool> {
        Ok(PdfTemplateRepo::deactivate(&self.pool, id).await?)
    }
}

#[async_trait]
impl DocumentTemplateStore for PgStore {
    async fn create(
        &self,
        created_by: DbId,
        input: &CreateDocumentTemplate,
    ) -> StoreResult<DocumentTemplate> {
        Ok(DocumentTemplateRepo::create(&self.pool, created_by, input).await?)
    }

    async fn find_by_id(&self, id: DbId) -> StoreResult<Option<DocumentTemplate>> {
        Ok(DocumentTemplateRepo::find_by_id(&self.pool, id).await?)
    }

    async fn list(&self) -> StoreResult<Vec<DocumentTemplate>> {
        Ok(DocumentTemplateRepo::list(&self.pool).await?)
    }

    async fn update(
        &self,
        id: DbId,
        input: &UpdateDocumentTemplate,
    ) -> StoreResult<Option<DocumentTemplate>> {
        Ok(DocumentTemplateRepo::update(&self.pool, id, input).await?)
    }

    async fn delete(&self, id: DbId) -> StoreResult<bool> {
        Ok(DocumentTemplateRepo::delete(&self.pool, id).await?)
    }
}

#[async_trait]
impl SalesRequestStore for PgStore {
    async fn create(
        &self,
        created_by: DbId,
        input: &CreateSalesRequest,
    ) -> StoreResult<SalesRequest> {
        Ok(SalesRequestRepo::create(&self.pool, created_by, input).await?)
    }

    async fn find_by_id(&self, id: DbId) -> StoreResult<Option<SalesRequest>> {
        Ok(SalesRequestRepo::find_by_id(&self.pool, id).await?)
    }

    async fn list(&self, filter: &SalesRequestFilter) -> StoreResult<Vec<SalesRequest>> {
        Ok(SalesRequestRepo::list(&self.pool, filter).await?)
    }

    async fn update(
        &self,
        id: DbId,
        input: &UpdateSalesRequest,
    ) -> StoreResult<Option<SalesRequest>> {
        Ok(SalesRequestRepo::update(&self.pool, id, input).await?)
    }

    async fn submit(&self, id: DbId) -> StoreResult<Option<SalesRequest>> {
        Ok(SalesRequestRepo::submit(&self.pool, id).await?)
    }

    async fn declare_health(
        &self,
        id: DbId,
        answers: &[HealthAnswer],
    ) -> StoreResult<Option<SalesRequest>> {
        Ok(SalesRequestRepo::declare_health(&self.pool, id, answers).await?)
    }

    async fn request_signature(
        &self,
        id: DbId,
        reference: Option<&str>,
    ) -> StoreResult<Option<SalesRequest>> {
        Ok(SalesRequestRepo::request_signature(&self.pool, id, reference).await?)
    }

    async fn record_signature(
        &self,
        id: DbId,
        signed_document_url: Option<&str>,
    ) -> StoreResult<Option<SalesRequest>> {
        Ok(SalesRequestRepo::record_signature(&self.pool, id, signed_document_url).await?)
    }

    async fn reject(&self, id: DbId, reason: &str) -> StoreResult<Option<SalesRequest>> {
        Ok(SalesRequestRepo::reject(&self.pool, id, reason).await?)
    }
}

#[async_trait]
impl NotificationStore for PgStore {
    async fn create(&self, input: &CreateNotification) -> StoreResult<Notification> {
        Ok(NotificationRepo::create(&self.pool, input).await?)
    }

    async fn list_for_user(
        &self,
        user_id: DbId,
        unread_only: bool,
        limit: i64,
        offset: i64,
    ) -> StoreResult<Vec<Notification>> {
        Ok(NotificationRepo::list_for_user(&self.pool, user_id, unread_only, limit, offset).await?)
    }

    async fn unread_count(&self, user_id: DbId) -> StoreResult<i64> {
        Ok(NotificationRepo::unread_count(&self.pool, user_id).await?)
    }

    async fn mark_read(&self, id: DbId, user_id: DbId) -> StoreResult<Option<Notification>> {
        Ok(NotificationRepo::mark_read(&self.pool, id, user_id).await?)
    }

    async fn mark_all_read(&self, user_id: DbId) -> StoreResult<u64> {
        Ok(NotificationRepo::mark_all_read(&self.pool, user_id).await?)
    }

    async fn delete(&self, id: DbId, user_id: DbId) -> StoreResult<bool> {
        Ok(NotificationRepo::delete(&self.pool, id, user_id).await?)
    }
}

#[async_trait]
impl CustomizationStore for PgStore {
    async fn list(&self) -> StoreResult<Vec<Customization>> {
        Ok(CustomizationRepo::list(&self.pool).await?)
    }

    async fn find(&self, key: &str) -> StoreResult<Option<Customization>> {
        Ok(CustomizationRepo::find(&self.pool, key).await?)
    }

    async fn upsert(
        &self,
        key: &str,
        value: &serde_json::Value,
        updated_by: DbId,
    ) -> StoreResult<Customization> {
        Ok(CustomizationRepo::upsert(&self.pool, key, value, updated_by).await?)
    }

    async fn delete(&self, key: &str) -> StoreResult<bool> {
        Ok(CustomizationRepo::delete(&self.pool, key).await?)
    }
}
