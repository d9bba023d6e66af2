//! In-process store backend.
//!
//! Implements every store trait over a single mutex-guarded state so that
//! the server can run without PostgreSQL (`STORAGE_BACKEND=memory`) and the
//! API integration tests need no database. Semantics mirror the SQL in
//! [`crate::repositories`]: soft delete for PDF templates, compare-and-set
//! status transitions, monotonic read flags, and a unique email.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::Utc;
use docflow_core::contract::{ContractStatus, HealthAnswer};
use docflow_core::types::{DbId, Timestamp};
use sqlx::types::Json;
use tokio::sync::Mutex;

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
use crate::store::{
    CustomizationStore, DocumentTemplateStore, NotificationStore, PdfTemplateStore,
    SalesRequestStore, SessionStore, StoreError, StoreResult, UserStore,
};

#[derive(Default)]
struct MemoryState {
    next_id: DbId,
    users: BTreeMap<DbId, User>,
    sessions: BTreeMap<DbId, UserSession>,
    reset_tokens: BTreeMap<DbId, PasswordResetToken>,
    pdf_templates: BTreeMap<DbId, PdfTemplate>,
    document_templates: BTreeMap<DbId, DocumentTemplate>,
    sales_requests: BTreeMap<DbId, SalesRequest>,
    notifications: BTreeMap<DbId, Notification>,
    customizations: BTreeMap<String, Customization>,
}

impl MemoryState {
    /// Ids are shared across tables, which keeps them unique and increasing.
    fn next_id(&mut self) -> DbId {
        self.next_id += 1;
        self.next_id
    }
}

#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<MemoryState>,
}

/// Newest first, ties broken by id, like the SQL `ORDER BY created_at DESC, id DESC`.
fn newest_first<T>(mut rows: Vec<T>, key: impl Fn(&T) -> (Timestamp, DbId)) -> Vec<T> {
    rows.sort_by_key(|r| std::cmp::Reverse(key(r)));
    rows
}

/// Apply a compare-and-set transition to a sales request.
fn transition_sales_request(
    state: &mut MemoryState,
    id: DbId,
    allowed: impl Fn(ContractStatus) -> bool,
    apply: impl FnOnce(&mut SalesRequest, Timestamp),
) -> Option<SalesRequest> {
    let req = state.sales_requests.get_mut(&id)?;
    let status = req.status().ok()?;
    if !allowed(status) {
        return None;
    }
    let now = Utc::now();
    apply(req, now);
    req.updated_at = now;
    Some(req.clone())
}

// ---------------------------------------------------------------------------
// Users
// ---------------------------------------------------------------------------

#[async_trait]
impl UserStore for MemoryStore {
    async fn create(&self, input: &CreateUser) -> StoreResult<User> {
        let mut state = self.state.lock().await;
        if state.users.values().any(|u| u.email == input.email) {
            return Err(StoreError::Conflict(format!(
                "A user with email '{}' already exists",
                input.email
            )));
        }
        let id = state.next_id();
        let now = Utc::now();
        let user = User {
            id,
            email: input.email.clone(),
            full_name: input.full_name.clone(),
            password_hash: input.password_hash.clone(),
            role: input.role.clone(),
            is_active: true,
            last_login_at: None,
            failed_login_count: 0,
            locked_until: None,
            created_at: now,
            updated_at: now,
        };
        state.users.insert(id, user.clone());
        Ok(user)
    }

    async fn find_by_id(&self, id: DbId) -> StoreResult<Option<User>> {
        Ok(self.state.lock().await.users.get(&id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let state = self.state.lock().await;
        Ok(state.users.values().find(|u| u.email == email).cloned())
    }

    async fn list(&self) -> StoreResult<Vec<User>> {
        let rows: Vec<User> = self.state.lock().await.users.values().cloned().collect();
        Ok(newest_first(rows, |u| (u.created_at, u.id)))
    }

    async fn list_active_ids(&self) -> StoreResult<Vec<DbId>> {
        let state = self.state.lock().await;
        Ok(state
            .users
            .values()
            .filter(|u| u.is_active)
            .map(|u| u.id)
            .collect())
    }

    async fn update(&self, id: DbId, input: &UpdateUser) -> StoreResult<Option<User>> {
        let mut state = self.state.lock().await;
        let Some(user) = state.users.get_mut(&id) else {
            return Ok(None);
        };
        if let Some(name) = &input.full_name {
            user.full_name = name.clone();
        }
        if let Some(role) = &input.role {
            user.role = role.clone();
        }
        if let Some(active) = input.is_active {
            user.is_active = active;
        }
        user.updated_at = Utc::now();
        Ok(Some(user.clone()))
    }

    async fn deactivate(&self, id: DbId) -> StoreResult<bool> {
        let mut state = self.state.lock().await;
        match state.users.get_mut(&id) {
            Some(user) if user.is_active => {
                user.is_active = false;
                user.updated_at = Utc::now();
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn increment_failed_login(&self, id: DbId) -> StoreResult<i32> {
        let mut state = self.state.lock().await;
        let user = state.users.get_mut(&id).ok_or(sqlx::Error::RowNotFound)?;
        user.failed_login_count += 1;
        Ok(user.failed_login_count)
    }

    async fn lock_account(&self, id: DbId, until: Timestamp) -> StoreResult<()> {
        if let Some(user) = self.state.lock().await.users.get_mut(&id) {
            user.locked_until = Some(until);
        }
        Ok(())
    }

    async fn record_successful_login(&self, id: DbId) -> StoreResult<()> {
        if let Some(user) = self.state.lock().await.users.get_mut(&id) {
            user.failed_login_count = 0;
            user.locked_until = None;
            user.last_login_at = Some(Utc::now());
        }
        Ok(())
    }

    async fn update_password(&self, id: DbId, password_hash: &str) -> StoreResult<bool> {
        let mut state = self.state.lock().await;
        let Some(user) = state.users.get_mut(&id) else {
            return Ok(false);
        };
        user.password_hash = password_hash.to_string();
        user.failed_login_count = 0;
        user.locked_until = None;
        user.updated_at = Utc::now();
        Ok(true)
    }
}

// ---------------------------------------------------------------------------
// Sessions and reset tokens
// ---------------------------------------------------------------------------

#[async_trait]
impl SessionStore for MemoryStore {
    async fn create_session(&self, input: &CreateSession) -> StoreResult<UserSession> {
        let mut state = self.state.lock().await;
        let id = state.next_id();
        let session = UserSession {
            id,
            user_id: input.user_id,
            refresh_token_hash: input.refresh_token_hash.clone(),
            expires_at: input.expires_at,
            is_revoked: false,
            user_agent: input.user_agent.clone(),
            created_at: Utc::now(),
        };
        state.sessions.insert(id, session.clone());
        Ok(session)
    }

    async fn consume_session(
        &self,
        refresh_token_hash: &str,
    ) -> StoreResult<Option<UserSession>> {
        let now = Utc::now();
        let mut state = self.state.lock().await;
        let live = state.sessions.values_mut().find(|s| {
            s.refresh_token_hash == refresh_token_hash && !s.is_revoked && s.expires_at > now
        });
        Ok(live.map(|s| {
            let before = s.clone();
            s.is_revoked = true;
            before
        }))
    }

    async fn revoke_all_for_user(&self, user_id: DbId) -> StoreResult<u64> {
        let mut state = self.state.lock().await;
        let mut count = 0;
        for s in state.sessions.values_mut() {
            if s.user_id == user_id && !s.is_revoked {
                s.is_revoked = true;
                count += 1;
            }
        }
        Ok(count)
    }

    async fn cleanup_expired_sessions(&self) -> StoreResult<u64> {
        let now = Utc::now();
        let mut state = self.state.lock().await;
        let before = state.sessions.len();
        state
            .sessions
            .retain(|_, s| !(s.expires_at < now || s.is_revoked));
        Ok((before - state.sessions.len()) as u64)
    }

    async fn create_reset_token(
        &self,
        input: &CreatePasswordResetToken,
    ) -> StoreResult<PasswordResetToken> {
        let mut state = self.state.lock().await;
        let id = state.next_id();
        let token = PasswordResetToken {
            id,
            user_id: input.user_id,
            token_hash: input.token_hash.clone(),
            expires_at: input.expires_at,
            used_at: None,
            created_at: Utc::now(),
        };
        state.reset_tokens.insert(id, token.clone());
        Ok(token)
    }

    async fn find_valid_reset_token(
        &self,
        token_hash: &str,
    ) -> StoreResult<Option<PasswordResetToken>> {
        let now = Utc::now();
        let state = self.state.lock().await;
        Ok(state
            .reset_tokens
            .values()
            .find(|t| t.token_hash == token_hash && t.used_at.is_none() && t.expires_at > now)
            .cloned())
    }

    async fn mark_reset_token_used(&self, id: DbId) -> StoreResult<bool> {
        let mut state = self.state.lock().await;
        match state.reset_tokens.get_mut(&id) {
            Some(t) if t.used_at.is_none() => {
                t.used_at = Some(Utc::now());
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn cleanup_expired_reset_tokens(&self) -> StoreResult<u64> {
        let now = Utc::now();
        let mut state = self.state.lock().await;
        let before = state.reset_tokens.len();
        state
            .reset_tokens
            .retain(|_, t| !(t.expires_at < now || t.used_at.is_some()));
        Ok((before - state.reset_tokens.len()) as u64)
    }
}

// ---------------------------------------------------------------------------
// Templates
// ---------------------------------------------------------------------------

#[async_trait]
impl PdfTemplateStore for MemoryStore {
    async fn create(
        &self,
        created_by: DbId,
        input: &CreatePdfTemplate,
    ) -> StoreResult<PdfTemplate> {
        let mut state = self.state.lock().await;
        let id = state.next_id();
        let now = Utc::now();
        let template = PdfTemplate {
            id,
            name: input
                .name
                .clone()
                .unwrap_or_else(|| input.file_name.clone()),
            file_name: input.file_name.clone(),
            file_size: input.file_size,
            file_url: input.file_url.clone(),
            fields: Json(input.fields.clone()),
            is_active: true,
            created_by,
            created_at: now,
            updated_at: now,
        };
        state.pdf_templates.insert(id, template.clone());
        Ok(template)
    }

    async fn find_by_id(&self, id: DbId) -> StoreResult<Option<PdfTemplate>> {
        let state = self.state.lock().await;
        Ok(state.pdf_templates.get(&id).filter(|t| t.is_active).cloned())
    }

    async fn list(&self) -> StoreResult<Vec<PdfTemplate>> {
        let state = self.state.lock().await;
        let rows: Vec<PdfTemplate> = state
            .pdf_templates
            .values()
            .filter(|t| t.is_active)
            .cloned()
            .collect();
        Ok(newest_first(rows, |t| (t.created_at, t.id)))
    }

    async fn update(
        &self,
        id: DbId,
        input: &UpdatePdfTemplate,
    ) -> StoreResult<Option<PdfTemplate>> {
        let mut state = self.state.lock().await;
        let Some(t) = state.pdf_templates.get_mut(&id).filter(|t| t.is_active) else {
            return Ok(None);
        };
        if let Some(name) = &input.name {
            t.name = name.clone();
        }
        if let Some(url) = &input.file_url {
            t.file_url = Some(url.clone());
        }
        if let Some(fields) = &input.fields {
            t.fields = Json(fields.clone());
        }
        t.updated_at = Utc::now();
        Ok(Some(t.clone()))
    }

    async fn deactivate(&self, id: DbId) -> StoreResult<bool> {
        let mut state = self.state.lock().await;
        match state.pdf_templates.get_mut(&id) {
            Some(t) if t.is_active => {
                t.is_active = false;
                t.updated_at = Utc::now();
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

#[async_trait]
impl DocumentTemplateStore for MemoryStore {
    async fn create(
        &self,
        created_by: DbId,
        input: &CreateDocumentTemplate,
    ) -> StoreResult<DocumentTemplate> {
        let mut state = self.state.lock().await;
        let id = state.next_id();
        let now = Utc::now();
        let template = DocumentTemplate {
            id,
            name: input.name.clone(),
            template_type: input.template_type.as_str().to_string(),
            fields: Json(input.fields.clone()),
            content: input.content.clone(),
            created_by,
            created_at: now,
            updated_at: now,
        };
        state.document_templates.insert(id, template.clone());
        Ok(template)
    }

    async fn find_by_id(&self, id: DbId) -> StoreResult<Option<DocumentTemplate>> {
        Ok(self.state.lock().await.document_templates.get(&id).cloned())
    }

    async fn list(&self) -> StoreResult<Vec<DocumentTemplate>> {
        let rows: Vec<DocumentTemplate> = self
            .state
            .lock()
            .await
            .document_templates
            .values()
            .cloned()
            .collect();
        Ok(newest_first(rows, |t| (t.created_at, t.id)))
    }

    async fn update(
        &self,
        id: DbId,
        input: &UpdateDocumentTemplate,
    ) -> StoreResult<Option<DocumentTemplate>> {
        let mut state = self.state.lock().await;
        let Some(t) = state.document_templates.get_mut(&id) else {
            return Ok(None);
        };
        if let Some(name) = &input.name {
            t.name = name.clone();
        }
        if let Some(kind) = input.template_type {
            t.template_type = kind.as_str().to_string();
        }
        if let Some(fields) = &input.fields {
            t.fields = Json(fields.clone());
        }
        if let Some(content) = &input.content {
            t.content = content.clone();
        }
        t.updated_at = Utc::now();
        Ok(Some(t.clone()))
    }

    async fn delete(&self, id: DbId) -> StoreResult<bool> {
        let mut state = self.state.lock().await;
        // Mirrors ON DELETE SET NULL.
        for r in state.sales_requests.values_mut() {
            if r.document_template_id == Some(id) {
                r.document_template_id = None;
            }
        }
        Ok(state.document_templates.remove(&id).is_some())
    }
}

// ---------------------------------------------------------------------------
// Sales requests
// ---------------------------------------------------------------------------

#[async_trait]
impl SalesRequestStore for MemoryStore {
    async fn create(
        &self,
        created_by: DbId,
        input: &CreateSalesRequest,
    ) -> StoreResult<SalesRequest> {
        let mut state = self.state.lock().await;
        let id = state.next_id();
        let now = Utc::now();
        let req = SalesRequest {
            id,
            client_name: input.client_name.clone(),
            client_email: input.client_email.clone(),
            client_phone: input.client_phone.clone(),
            client_document: input.client_document.clone(),
            plan_name: input.plan_name.clone(),
            monthly_amount: input.monthly_amount,
            document_template_id: input.document_template_id,
            pdf_template_id: input.pdf_template_id,
            status: ContractStatus::Draft.as_str().to_string(),
            health_answers: None,
            health_declared_at: None,
            signature_requested_at: None,
            signature_reference: None,
            signed_at: None,
            signed_document_url: None,
            rejection_reason: None,
            created_by,
            created_at: now,
            updated_at: now,
        };
        state.sales_requests.insert(id, req.clone());
        Ok(req)
    }

    async fn find_by_id(&self, id: DbId) -> StoreResult<Option<SalesRequest>> {
        Ok(self.state.lock().await.sales_requests.get(&id).cloned())
    }

    async fn list(&self, filter: &SalesRequestFilter) -> StoreResult<Vec<SalesRequest>> {
        let state = self.state.lock().await;
        let rows: Vec<SalesRequest> = state
            .sales_requests
            .values()
            .filter(|r| filter.created_by.is_none_or(|uid| r.created_by == uid))
            .filter(|r| filter.status.is_none_or(|st| r.status == st.as_str()))
            .cloned()
            .collect();
        Ok(newest_first(rows, |r| (r.created_at, r.id)))
    }

    async fn update(
        &self,
        id: DbId,
        input: &UpdateSalesRequest,
    ) -> StoreResult<Option<SalesRequest>> {
        let mut state = self.state.lock().await;
        Ok(transition_sales_request(
            &mut state,
            id,
            |st| st == ContractStatus::Draft,
            |r, _| {
                if let Some(v) = &input.client_name {
                    r.client_name = v.clone();
                }
                if let Some(v) = &input.client_email {
                    r.client_email = Some(v.clone());
                }
                if let Some(v) = &input.client_phone {
                    r.client_phone = v.clone();
                }
                if let Some(v) = &input.client_document {
                    r.client_document = Some(v.clone());
                }
                if let Some(v) = &input.plan_name {
                    r.plan_name = v.clone();
                }
                if let Some(v) = input.monthly_amount {
                    r.monthly_amount = Some(v);
                }
                if let Some(v) = input.document_template_id {
                    r.document_template_id = Some(v);
                }
                if let Some(v) = input.pdf_template_id {
                    r.pdf_template_id = Some(v);
                }
            },
        ))
    }

    async fn submit(&self, id: DbId) -> StoreResult<Option<SalesRequest>> {
        let mut state = self.state.lock().await;
        Ok(transition_sales_request(
            &mut state,
            id,
            |st| st == ContractStatus::Draft,
            |r, _| r.status = ContractStatus::PendingHealthDeclaration.as_str().to_string(),
        ))
    }

    async fn declare_health(
        &self,
        id: DbId,
        answers: &[HealthAnswer],
    ) -> StoreResult<Option<SalesRequest>> {
        let mut state = self.state.lock().await;
        Ok(transition_sales_request(
            &mut state,
            id,
            |st| st == ContractStatus::PendingHealthDeclaration,
            |r, now| {
                r.status = ContractStatus::PendingSignature.as_str().to_string();
                r.health_answers = Some(Json(answers.to_vec()));
                r.health_declared_at = Some(now);
            },
        ))
    }

    async fn request_signature(
        &self,
        id: DbId,
        reference: Option<&str>,
    ) -> StoreResult<Option<SalesRequest>> {
        let mut state = self.state.lock().await;
        Ok(transition_sales_request(
            &mut state,
            id,
            |st| st == ContractStatus::PendingSignature,
            |r, now| {
                r.signature_requested_at.get_or_insert(now);
                if let Some(reference) = reference {
                    r.signature_reference = Some(reference.to_string());
                }
            },
        ))
    }

    async fn record_signature(
        &self,
        id: DbId,
        signed_document_url: Option<&str>,
    ) -> StoreResult<Option<SalesRequest>> {
        let mut state = self.state.lock().await;
        Ok(transition_sales_request(
            &mut state,
            id,
            |st| st == ContractStatus::PendingSignature,
            |r, now| {
                r.status = ContractStatus::Completed.as_str().to_string();
                r.signed_at = Some(now);
                r.signed_document_url = signed_document_url.map(str::to_string);
            },
        ))
    }

    async fn reject(&self, id: DbId, reason: &str) -> StoreResult<Option<SalesRequest>> {
        let mut state = self.state.lock().await;
        Ok(transition_sales_request(
            &mut state,
            id,
            |st| !st.is_terminal(),
            |r, _| {
                r.status = ContractStatus::Rejected.as_str().to_string();
                r.rejection_reason = Some(reason.to_string());
            },
        ))
    }
}

// ---------------------------------------------------------------------------
// Notifications
// ---------------------------------------------------------------------------

#[async_trait]
impl NotificationStore for MemoryStore {
    async fn create(&self, input: &CreateNotification) -> StoreResult<Notification> {
        let mut state = self.state.lock().await;
        let id = state.next_id();
        let n = Notification {
            id,
            user_id: input.user_id,
            title: input.title.clone(),
            message: input.message.clone(),
            notification_type: input.kind.as_str().to_string(),
            is_read: false,
            read_at: None,
            created_at: Utc::now(),
        };
        state.notifications.insert(id, n.clone());
        Ok(n)
    }

    async fn list_for_user(
        &self,
        user_id: DbId,
        unread_only: bool,
        limit: i64,
        offset: i64,
    ) -> StoreResult<Vec<Notification>> {
        let state = self.state.lock().await;
        let rows: Vec<Notification> = state
            .notifications
            .values()
            .filter(|n| n.user_id == user_id && (!unread_only || !n.is_read))
            .cloned()
            .collect();
        Ok(newest_first(rows, |n| (n.created_at, n.id))
            .into_iter()
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .collect())
    }

    async fn unread_count(&self, user_id: DbId) -> StoreResult<i64> {
        let state = self.state.lock().await;
        Ok(state
            .notifications
            .values()
            .filter(|n| n.user_id == user_id && !n.is_read)
            .count() as i64)
    }

    async fn mark_read(&self, id: DbId, user_id: DbId) -> StoreResult<Option<Notification>> {
        let mut state = self.state.lock().await;
        let Some(n) = state
            .notifications
            .get_mut(&id)
            .filter(|n| n.user_id == user_id)
        else {
            return Ok(None);
        };
        n.is_read = true;
        n.read_at.get_or_insert_with(Utc::now);
        Ok(Some(n.clone()))
    }

    async fn mark_all_read(&self, user_id: DbId) -> StoreResult<u64> {
        let now = Utc::now();
        let mut state = self.state.lock().await;
        let mut count = 0;
        for n in state.notifications.values_mut() {
            if n.user_id == user_id && !n.is_read {
                n.is_read = true;
                n.read_at = Some(now);
                count += 1;
            }
        }
        Ok(count)
    }

    async fn delete(&self, id: DbId, user_id: DbId) -> StoreResult<bool> {
        let mut state = self.state.lock().await;
        let owned = state
            .notifications
            .get(&id)
            .is_some_and(|n| n.user_id == user_id);
        if owned {
            state.notifications.remove(&id);
        }
        Ok(owned)
    }
}

// ---------------------------------------------------------------------------
// Customizations
// ---------------------------------------------------------------------------

#[async_trait]
impl CustomizationStore for MemoryStore {
    async fn list(&self) -> StoreResult<Vec<Customization>> {
        Ok(self
            .state
            .lock()
            .await
            .customizations
            .values()
            .cloned()
            .collect())
    }

    async fn find(&self, key: &str) -> StoreResult<Option<Customization>> {
        Ok(self.state.lock().await.customizations.get(key).cloned())
    }

    async fn upsert(
        &self,
        key: &str,
        value: &serde_json::Value,
        updated_by: DbId,
    ) -> StoreResult<Customization> {
        let row = Customization {
            key: key.to_string(),
            value: value.clone(),
            updated_by: Some(updated_by),
            updated_at: Utc::now(),
        };
        self.state
            .lock()
            .await
            .customizations
            .insert(key.to_string(), row.clone());
        Ok(row)
    }

    async fn delete(&self, key: &str) -> StoreResult<bool> {
        Ok(self
            .state
            .lock()
            .await
            .customizations
            .remove(key)
            .is_some())
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use docflow_core::notification::NotificationKind;
    use docflow_core::pdf_field::{FieldType, NormalizedPoint, PdfField};

    use super::*;

    fn new_user(email: &str) -> CreateUser {
        CreateUser {
            email: email.to_string(),
            full_name: "Ana Test".to_string(),
            password_hash: "hash".to_string(),
            role: "user".to_string(),
        }
    }

    fn new_request() -> CreateSalesRequest {
        CreateSalesRequest {
            client_name: "Juan Pérez".to_string(),
            client_email: None,
            client_phone: "+54 11 5555-0000".to_string(),
            client_document: None,
            plan_name: "Plan Oro".to_string(),
            monthly_amount: Some(1500.0),
            document_template_id: None,
            pdf_template_id: None,
        }
    }

    #[tokio::test]
    async fn duplicate_email_is_conflict() {
        let store = MemoryStore::default();
        UserStore::create(&store, &new_user("a@x.com")).await.unwrap();
        let err = UserStore::create(&store, &new_user("a@x.com"))
            .await
            .unwrap_err();
        assert_matches!(err, StoreError::Conflict(_));
    }

    #[tokio::test]
    async fn pdf_template_soft_delete_hides_row() {
        let store = MemoryStore::default();
        let input = CreatePdfTemplate {
            name: Some("Contrato".into()),
            file_name: "contrato.pdf".into(),
            file_size: 10,
            file_url: None,
            fields: vec![PdfField::new(
                "f1",
                FieldType::Text,
                1,
                NormalizedPoint::new(0.1, 0.1),
            )],
        };
        let t = PdfTemplateStore::create(&store, 1, &input).await.unwrap();
        assert_eq!(t.fields.0.len(), 1);

        assert!(PdfTemplateStore::deactivate(&store, t.id).await.unwrap());
        assert!(!PdfTemplateStore::deactivate(&store, t.id).await.unwrap());
        assert!(PdfTemplateStore::find_by_id(&store, t.id).await.unwrap().is_none());
        assert!(PdfTemplateStore::list(&store).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn status_transitions_are_compare_and_set() {
        let store = MemoryStore::default();
        let req = SalesRequestStore::create(&store, 1, &new_request()).await.unwrap();
        assert_eq!(req.status, "draft");

        // Cannot skip the health declaration.
        assert!(store.record_signature(req.id, None).await.unwrap().is_none());

        let req = store.submit(req.id).await.unwrap().unwrap();
        assert_eq!(req.status, "pending_health_declaration");
        assert!(store.submit(req.id).await.unwrap().is_none());

        let answers = vec![HealthAnswer {
            question: "¿Fuma?".into(),
            answer: false,
            details: None,
        }];
        let req = store.declare_health(req.id, &answers).await.unwrap().unwrap();
        assert_eq!(req.status, "pending_signature");
        assert!(req.health_declared_at.is_some());

        let first = store.request_signature(req.id, Some("env-1")).await.unwrap().unwrap();
        let again = store.request_signature(req.id, None).await.unwrap().unwrap();
        assert_eq!(first.signature_requested_at, again.signature_requested_at);
        assert_eq!(again.signature_reference.as_deref(), Some("env-1"));

        let done = store
            .record_signature(req.id, Some("https://files/x.pdf"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(done.status, "completed");
        assert!(store.reject(req.id, "late").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn edits_only_in_draft() {
        let store = MemoryStore::default();
        let req = SalesRequestStore::create(&store, 1, &new_request()).await.unwrap();
        let patch = UpdateSalesRequest {
            plan_name: Some("Plan Plata".into()),
            ..Default::default()
        };
        let updated = SalesRequestStore::update(&store, req.id, &patch)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.plan_name, "Plan Plata");

        store.submit(req.id).await.unwrap();
        assert!(SalesRequestStore::update(&store, req.id, &patch)
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn mark_read_is_monotonic_and_owner_scoped() {
        let store = MemoryStore::default();
        let n = NotificationStore::create(
            &store,
            &CreateNotification {
                user_id: 7,
                title: "Hola".into(),
                message: String::new(),
                kind: NotificationKind::Info,
            },
        )
        .await
        .unwrap();

        assert!(store.mark_read(n.id, 8).await.unwrap().is_none());
        let first = store.mark_read(n.id, 7).await.unwrap().unwrap();
        let second = store.mark_read(n.id, 7).await.unwrap().unwrap();
        assert!(second.is_read);
        assert_eq!(first.read_at, second.read_at);
        assert_eq!(store.unread_count(7).await.unwrap(), 0);

        assert!(!NotificationStore::delete(&store, n.id, 8).await.unwrap());
        assert!(NotificationStore::delete(&store, n.id, 7).await.unwrap());
    }

    #[tokio::test]
    async fn notification_paging_is_newest_first() {
        let store = MemoryStore::default();
        for i in 0..5 {
            NotificationStore::create(
                &store,
                &CreateNotification {
                    user_id: 1,
                    title: format!("n{i}"),
                    message: String::new(),
                    kind: NotificationKind::Info,
                },
            )
            .await
            .unwrap();
        }
        let page = store.list_for_user(1, false, 2, 1).await.unwrap();
        assert_eq!(page.len(), 2);
        assert_eq!(page[0].title, "n3");
        assert_eq!(page[1].title, "n2");
    }

    #[tokio::test]
    async fn used_reset_token_is_not_valid() {
        let store = MemoryStore::default();
        let token = store
            .create_reset_token(&CreatePasswordResetToken {
                user_id: 1,
                token_hash: "abc".into(),
                expires_at: Utc::now() + chrono::Duration::hours(1),
            })
            .await
            .unwrap();
        assert!(store.find_valid_reset_token("abc").await.unwrap().is_some());
        assert!(store.mark_reset_token_used(token.id).await.unwrap());
        assert!(!store.mark_reset_token_used(token.id).await.unwrap());
        assert!(store.find_valid_reset_token("abc").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn refresh_session_is_single_use() {
        let store = MemoryStore::default();
        let session = store
            .create_session(&CreateSession {
                user_id: 7,
                refresh_token_hash: "rt".to_string(),
                expires_at: Utc::now() + chrono::Duration::days(1),
                user_agent: None,
            })
            .await
            .unwrap();

        let consumed = store.consume_session("rt").await.unwrap().expect("live session");
        assert_eq!(consumed.id, session.id);
        assert!(!consumed.is_revoked);
        assert!(store.consume_session("rt").await.unwrap().is_none());
        assert_eq!(store.cleanup_expired_sessions().await.unwrap(), 1);
    }
}
