//! Create/update/delete orchestration for PDF and HTML document templates.
//!
//! Every action validates its input, performs one store call, publishes a
//! `template.*` event, and returns the stored row together with the toast
//! the client should show. Failures are logged and returned as an
//! [`ActionError`], which renders the usual JSON error plus a destructive
//! toast. There is no retry and no version check: the last write wins.

use std::sync::Arc;

use axum::response::{IntoResponse, Response};
use axum::Json;
use docflow_core::document_render::{validate_content, validate_document_fields};
use docflow_core::feedback::Toast;
use docflow_core::field_editor::{FieldEdit, FieldEditor};
use docflow_core::naming::{resolve_template_name, validate_template_name};
use docflow_core::pdf_field::validate_fields;
use docflow_core::types::DbId;
use docflow_db::models::document_template::{
    CreateDocumentTemplate, DocumentTemplate, UpdateDocumentTemplate,
};
use docflow_db::models::pdf_template::{CreatePdfTemplate, PdfTemplate, UpdatePdfTemplate};
use docflow_db::store::{DocumentTemplateStore, PdfTemplateStore};
use docflow_events::{event_types, EventBus, PlatformEvent};
use serde::Serialize;

use crate::error::{AppError, AppResult};
use crate::state::AppState;

const PDF_TEMPLATE: &str = "pdf_template";
const DOCUMENT_TEMPLATE: &str = "document_template";

// ---------------------------------------------------------------------------
// Outcome types
// ---------------------------------------------------------------------------

/// Result of a successful action: the affected data plus a toast.
#[derive(Debug, Serialize)]
pub struct ActionOutcome<T: Serialize> {
    pub data: T,
    pub toast: Toast,
}

/// A failed action: the underlying error and the title of its toast.
#[derive(Debug)]
pub struct ActionError {
    pub title: &'static str,
    pub error: AppError,
}

pub type ActionResult<T> = Result<ActionOutcome<T>, ActionError>;

impl ActionError {
    /// Destructive toast describing the failure with the client-safe message.
    pub fn toast(&self) -> Toast {
        let (_, _, message) = self.error.parts();
        Toast::error(self.title, message)
    }
}

impl IntoResponse for ActionError {
    fn into_response(self) -> Response {
        let (status, code, message) = self.error.parts();
        let body = serde_json::json!({
            "error": message,
            "code": code,
            "toast": Toast::error(self.title, message.clone()),
        });
        (status, Json(body)).into_response()
    }
}

const CREATE_FAILED: &str = "No se pudo crear la plantilla";
const UPDATE_FAILED: &str = "No se pudo actualizar la plantilla";
const FIELDS_FAILED: &str = "No se pudieron guardar los campos";
const DELETE_FAILED: &str = "No se pudo eliminar la plantilla";

/// Payload of a delete action.
#[derive(Debug, Serialize)]
pub struct Deleted {
    pub id: DbId,
}

// ---------------------------------------------------------------------------
// TemplateActions
// ---------------------------------------------------------------------------

pub struct TemplateActions {
    pdf_templates: Arc<dyn PdfTemplateStore>,
    document_templates: Arc<dyn DocumentTemplateStore>,
    event_bus: Arc<EventBus>,
}

impl TemplateActions {
    pub fn new(
        pdf_templates: Arc<dyn PdfTemplateStore>,
        document_templates: Arc<dyn DocumentTemplateStore>,
        event_bus: Arc<EventBus>,
    ) -> Self {
        Self {
            pdf_templates,
            document_templates,
            event_bus,
        }
    }

    pub fn from_state(state: &AppState) -> Self {
        Self::new(
            Arc::clone(&state.stores.pdf_templates),
            Arc::clone(&state.stores.document_templates),
            Arc::clone(&state.event_bus),
        )
    }

    // -- PDF templates ------------------------------------------------------

    /// Store a new PDF template. Without an explicit name the file's base
    /// name is used.
    pub async fn create_pdf_template(
        &self,
        actor: DbId,
        input: CreatePdfTemplate,
    ) -> ActionResult<PdfTemplate> {
        let result = self.insert_pdf_template(actor, input).await;
        let template = log_failure("create_pdf_template", CREATE_FAILED, actor, result)?;
        self.publish(event_types::TEMPLATE_CREATED, PDF_TEMPLATE, template.id, actor, &template.name);

        Ok(ActionOutcome {
            toast: Toast::success(
                "Plantilla creada",
                format!("\"{}\" se guardó correctamente.", template.name),
            ),
            data: template,
        })
    }

    pub async fn update_pdf_template(
        &self,
        actor: DbId,
        id: DbId,
        input: UpdatePdfTemplate,
    ) -> ActionResult<PdfTemplate> {
        let result = self.patch_pdf_template(id, input).await;
        let template = log_failure("update_pdf_template", UPDATE_FAILED, actor, result)?;
        self.publish(event_types::TEMPLATE_UPDATED, PDF_TEMPLATE, id, actor, &template.name);

        Ok(ActionOutcome {
            toast: Toast::success(
                "Plantilla actualizada",
                format!("Los cambios en \"{}\" se guardaron.", template.name),
            ),
            data: template,
        })
    }

    /// Apply a batch of field edits to a template and persist the result.
    ///
    /// The batch is applied in order on a [`FieldEditor`]; the resulting
    /// field set is validated as a whole before anything is written.
    pub async fn apply_field_edits(
        &self,
        actor: DbId,
        id: DbId,
        edits: Vec<FieldEdit>,
    ) -> ActionResult<PdfTemplate> {
        let result = self.edit_pdf_fields(id, edits).await;
        let template = log_failure("apply_field_edits", FIELDS_FAILED, actor, result)?;
        self.publish(event_types::TEMPLATE_UPDATED, PDF_TEMPLATE, id, actor, &template.name);

        Ok(ActionOutcome {
            toast: Toast::success(
                "Campos guardados",
                format!("\"{}\" tiene {} campos.", template.name, template.fields.0.len()),
            ),
            data: template,
        })
    }

    /// Soft-delete a PDF template.
    pub async fn delete_pdf_template(
        &self,
        actor: DbId,
        id: DbId,
    ) -> ActionResult<Deleted> {
        let result = match self.pdf_templates.deactivate(id).await {
            Ok(true) => Ok(()),
            Ok(false) => Err(AppError::not_found("PdfTemplate", id)),
            Err(e) => Err(e.into()),
        };
        log_failure("delete_pdf_template", DELETE_FAILED, actor, result)?;
        self.publish(event_types::TEMPLATE_DELETED, PDF_TEMPLATE, id, actor, "");

        Ok(ActionOutcome {
            data: Deleted { id },
            toast: Toast::success("Plantilla eliminada", "La plantilla se eliminó."),
        })
    }

    // -- Document templates -------------------------------------------------

    pub async fn create_document_template(
        &self,
        actor: DbId,
        input: CreateDocumentTemplate,
    ) -> ActionResult<DocumentTemplate> {
        let result = self.insert_document_template(actor, input).await;
        let template = log_failure("create_document_template", CREATE_FAILED, actor, result)?;
        self.publish(
            event_types::TEMPLATE_CREATED,
            DOCUMENT_TEMPLATE,
            template.id,
            actor,
            &template.name,
        );

        Ok(ActionOutcome {
            toast: Toast::success(
                "Plantilla creada",
                format!("\"{}\" se guardó correctamente.", template.name),
            ),
            data: template,
        })
    }

    pub async fn update_document_template(
        &self,
        actor: DbId,
        id: DbId,
        input: UpdateDocumentTemplate,
    ) -> ActionResult<DocumentTemplate> {
        let result = self.patch_document_template(id, input).await;
        let template = log_failure("update_document_template", UPDATE_FAILED, actor, result)?;
        self.publish(
            event_types::TEMPLATE_UPDATED,
            DOCUMENT_TEMPLATE,
            id,
            actor,
            &template.name,
        );

        Ok(ActionOutcome {
            toast: Toast::success(
                "Plantilla actualizada",
                format!("Los cambios en \"{}\" se guardaron.", template.name),
            ),
            data: template,
        })
    }

    /// Hard-delete a document template. Sales requests linked to it keep
    /// their data and lose the link.
    pub async fn delete_document_template(
        &self,
        actor: DbId,
        id: DbId,
    ) -> ActionResult<Deleted> {
        let result = match self.document_templates.delete(id).await {
            Ok(true) => Ok(()),
            Ok(false) => Err(AppError::not_found("DocumentTemplate", id)),
            Err(e) => Err(e.into()),
        };
        log_failure("delete_document_template", DELETE_FAILED, actor, result)?;
        self.publish(event_types::TEMPLATE_DELETED, DOCUMENT_TEMPLATE, id, actor, "");

        Ok(ActionOutcome {
            data: Deleted { id },
            toast: Toast::success("Plantilla eliminada", "La plantilla se eliminó."),
        })
    }

    // -- Store steps --------------------------------------------------------

    async fn insert_pdf_template(
        &self,
        actor: DbId,
        input: CreatePdfTemplate,
    ) -> AppResult<PdfTemplate> {
        let name = resolve_template_name(input.name.as_deref(), &input.file_name);
        validate_template_name(&name)?;
        validate_fields(&input.fields)?;
        if input.file_size < 0 {
            return Err(AppError::BadRequest("file_size must not be negative".into()));
        }

        let input = CreatePdfTemplate {
            name: Some(name),
            ..input
        };
        Ok(self.pdf_templates.create(actor, &input).await?)
    }

    async fn patch_pdf_template(&self, id: DbId, input: UpdatePdfTemplate) -> AppResult<PdfTemplate> {
        let input = UpdatePdfTemplate {
            name: input.name.map(|n| n.trim().to_string()),
            ..input
        };
        if let Some(name) = &input.name {
            validate_template_name(name)?;
        }
        if let Some(fields) = &input.fields {
            validate_fields(fields)?;
        }
        self.pdf_templates
            .update(id, &input)
            .await?
            .ok_or_else(|| AppError::not_found("PdfTemplate", id))
    }

    async fn edit_pdf_fields(&self, id: DbId, edits: Vec<FieldEdit>) -> AppResult<PdfTemplate> {
        let template = self
            .pdf_templates
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found("PdfTemplate", id))?;

        let mut editor = FieldEditor::new(template.fields.0);
        for edit in edits {
            editor.apply(edit);
        }
        let fields = editor.into_fields();
        validate_fields(&fields)?;

        let input = UpdatePdfTemplate {
            fields: Some(fields),
            ..Default::default()
        };
        self.pdf_templates
            .update(id, &input)
            .await?
            .ok_or_else(|| AppError::not_found("PdfTemplate", id))
    }

    async fn insert_document_template(
        &self,
        actor: DbId,
        input: CreateDocumentTemplate,
    ) -> AppResult<DocumentTemplate> {
        let input = CreateDocumentTemplate {
            name: input.name.trim().to_string(),
            ..input
        };
        validate_template_name(&input.name)?;
        validate_document_fields(&input.fields)?;
        validate_content(&input.content)?;
        Ok(self.document_templates.create(actor, &input).await?)
    }

    async fn patch_document_template(
        &self,
        id: DbId,
        input: UpdateDocumentTemplate,
    ) -> AppResult<DocumentTemplate> {
        let input = UpdateDocumentTemplate {
            name: input.name.map(|n| n.trim().to_string()),
            ..input
        };
        if let Some(name) = &input.name {
            validate_template_name(name)?;
        }
        if let Some(fields) = &input.fields {
            validate_document_fields(fields)?;
        }
        if let Some(content) = &input.content {
            validate_content(content)?;
        }
        self.document_templates
            .update(id, &input)
            .await?
            .ok_or_else(|| AppError::not_found("DocumentTemplate", id))
    }

    fn publish(&self, event_type: &str, entity: &str, id: DbId, actor: DbId, name: &str) {
        self.event_bus.publish(
            PlatformEvent::new(event_type)
                .with_source(entity, id)
                .with_actor(actor)
                .with_payload(serde_json::json!({ "name": name })),
        );
    }
}

/// Log a failed action and attach its toast title.
fn log_failure<T>(
    action: &'static str,
    title: &'static str,
    actor: DbId,
    result: AppResult<T>,
) -> Result<T, ActionError> {
    result.map_err(|error| {
        tracing::error!(action, actor, error = %error, "Template action failed");
        ActionError { title, error }
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use docflow_core::document_render::{DocumentField, DocumentTemplateType};
    use docflow_core::error::CoreError;
    use docflow_core::feedback::ToastVariant;
    use docflow_core::pdf_field::{FieldPatch, FieldType, NormalizedPoint, PdfField};
    use docflow_db::Stores;

    use super::*;

    fn actions() -> (TemplateActions, Stores, Arc<EventBus>) {
        let stores = Stores::in_memory();
        let bus = Arc::new(EventBus::default());
        let actions = TemplateActions::new(
            stores.pdf_templates.clone(),
            stores.document_templates.clone(),
            Arc::clone(&bus),
        );
        (actions, stores, bus)
    }

    fn upload(name: Option<&str>, fields: Vec<PdfField>) -> CreatePdfTemplate {
        CreatePdfTemplate {
            name: name.map(str::to_string),
            file_name: "Contrato Plan Oro.pdf".to_string(),
            file_size: 2048,
            file_url: None,
            fields,
        }
    }

    fn text_field(id: &str) -> PdfField {
        PdfField::new(id, FieldType::Text, 1, NormalizedPoint::new(0.1, 0.1))
    }

    #[tokio::test]
    async fn unnamed_template_takes_file_base_name() {
        let (actions, _, bus) = actions();
        let mut rx = bus.subscribe();

        let outcome = actions
            .create_pdf_template(1, upload(None, vec![]))
            .await
            .expect("create succeeds");

        assert_eq!(outcome.data.name, "Contrato Plan Oro");
        assert_eq!(outcome.toast.variant, ToastVariant::Default);

        let event = rx.recv().await.expect("event published");
        assert_eq!(event.event_type, event_types::TEMPLATE_CREATED);
        assert_eq!(event.source_entity_id, Some(outcome.data.id));
    }

    #[tokio::test]
    async fn explicit_name_wins() {
        let (actions, _, _) = actions();
        let outcome = actions
            .create_pdf_template(1, upload(Some("  Anexo A "), vec![]))
            .await
            .expect("create succeeds");
        assert_eq!(outcome.data.name, "Anexo A");
    }

    #[tokio::test]
    async fn invalid_fields_are_not_persisted() {
        let (actions, stores, _) = actions();
        let mut bad = text_field("f1");
        bad.x = 0.95;
        bad.width = 0.2;

        let err = actions
            .create_pdf_template(1, upload(None, vec![bad]))
            .await
            .unwrap_err();

        assert_matches!(err.error, AppError::Core(CoreError::Validation(_)));
        assert_eq!(err.toast().variant, ToastVariant::Destructive);
        assert_eq!(err.toast().title, CREATE_FAILED);
        assert!(stores.pdf_templates.list().await.expect("list").is_empty());
    }

    #[tokio::test]
    async fn field_edits_are_applied_in_order() {
        let (actions, _, _) = actions();
        let created = actions
            .create_pdf_template(1, upload(None, vec![text_field("a"), text_field("b")]))
            .await
            .expect("create succeeds")
            .data;

        let edits = vec![
            FieldEdit::Delete { id: "a".into() },
            FieldEdit::Update {
                id: "b".into(),
                changes: FieldPatch {
                    required: Some(true),
                    ..Default::default()
                },
            },
            FieldEdit::Update {
                id: "missing".into(),
                changes: FieldPatch::default(),
            },
        ];
        let outcome = actions
            .apply_field_edits(2, created.id, edits)
            .await
            .expect("edits succeed");

        let fields = &outcome.data.fields.0;
        assert_eq!(fields.len(), 1);
        assert_eq!(fields[0].id, "b");
        assert!(fields[0].required);
    }

    #[tokio::test]
    async fn deleting_unknown_template_is_not_found() {
        let (actions, _, _) = actions();
        let err = actions.delete_pdf_template(1, 999).await.unwrap_err();
        assert_matches!(err.error, AppError::Core(CoreError::NotFound { id: 999, .. }));
        assert_eq!(err.toast().title, DELETE_FAILED);
        assert!(err.toast().description.contains("999"));
    }

    #[tokio::test]
    async fn deleted_pdf_template_is_hidden() {
        let (actions, stores, _) = actions();
        let created = actions
            .create_pdf_template(1, upload(None, vec![]))
            .await
            .expect("create succeeds")
            .data;

        actions
            .delete_pdf_template(1, created.id)
            .await
            .expect("delete succeeds");
        assert!(stores
            .pdf_templates
            .find_by_id(created.id)
            .await
            .expect("find")
            .is_none());
    }

    #[tokio::test]
    async fn document_template_validation_rejects_duplicate_fields() {
        let (actions, _, _) = actions();
        let field = DocumentField {
            name: "cliente".into(),
            label: "Cliente".into(),
            required: true,
        };
        let input = CreateDocumentTemplate {
            name: "Contrato".into(),
            template_type: DocumentTemplateType::Contrato,
            fields: vec![field.clone(), field],
            content: "<p>{{cliente}}</p>".into(),
        };

        let err = actions.create_document_template(1, input).await.unwrap_err();
        assert_matches!(err.error, AppError::Core(CoreError::Validation(_)));
    }
}
