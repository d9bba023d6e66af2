//! Editing state machine for the fields of one PDF template.
//!
//! [`FieldEditor`] owns the working set of [`PdfField`]s plus the transient
//! interaction state (selected field, active tool, drag/resize in progress).
//! Every operation is total over the in-memory collection: unknown ids are
//! no-ops, nothing here performs I/O, and persistence failures are the
//! caller's concern.

use serde::{Deserialize, Serialize};

use crate::pdf_field::{FieldPatch, FieldType, NormalizedPoint, PdfField, MIN_FIELD_SIZE};

// ---------------------------------------------------------------------------
// Tools and interactions
// ---------------------------------------------------------------------------

/// The tool currently active in the editor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "tool", content = "field_type", rename_all = "snake_case")]
pub enum Tool {
    /// Clicking selects, dragging moves.
    #[default]
    Select,
    /// The next placement creates a field of this type.
    Create(FieldType),
}

/// An in-progress pointer interaction.
#[derive(Debug, Clone, PartialEq)]
pub enum Interaction {
    Idle,
    Dragging {
        field_id: String,
        /// Pointer position minus field origin at drag start.
        offset: NormalizedPoint,
    },
    Resizing {
        field_id: String,
    },
}

/// A serialized edit, as received from a client batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum FieldEdit {
    Add { field: PdfField },
    Update { id: String, changes: FieldPatch },
    Delete { id: String },
}

// ---------------------------------------------------------------------------
// FieldEditor
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct FieldEditor {
    fields: Vec<PdfField>,
    selected: Option<String>,
    tool: Tool,
    interaction: Interaction,
    next_seq: u64,
}

impl FieldEditor {
    /// Start editing an existing field collection.
    pub fn new(fields: Vec<PdfField>) -> Self {
        let next_seq = fields.len() as u64 + 1;
        Self {
            fields,
            selected: None,
            tool: Tool::Select,
            interaction: Interaction::Idle,
            next_seq,
        }
    }

    pub fn fields(&self) -> &[PdfField] {
        &self.fields
    }

    pub fn into_fields(self) -> Vec<PdfField> {
        self.fields
    }

    pub fn field(&self, id: &str) -> Option<&PdfField> {
        self.fields.iter().find(|f| f.id == id)
    }

    fn field_mut(&mut self, id: &str) -> Option<&mut PdfField> {
        self.fields.iter_mut().find(|f| f.id == id)
    }

    pub fn selected(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    pub fn selected_field(&self) -> Option<&PdfField> {
        self.selected.as_deref().and_then(|id| self.field(id))
    }

    pub fn tool(&self) -> Tool {
        self.tool
    }

    pub fn interaction(&self) -> &Interaction {
        &self.interaction
    }

    /// Drag offset of the active drag, if one is in progress.
    pub fn drag_offset(&self) -> Option<NormalizedPoint> {
        match &self.interaction {
            Interaction::Dragging { offset, .. } => Some(*offset),
            _ => None,
        }
    }

    // -- selection / tools ---------------------------------------------------

    /// Select a field. Unknown ids leave the selection unchanged.
    pub fn select(&mut self, id: &str) {
        if self.field(id).is_some() {
            self.selected = Some(id.to_string());
        }
    }

    pub fn clear_selection(&mut self) {
        self.selected = None;
    }

    pub fn set_tool(&mut self, tool: Tool) {
        self.tool = tool;
    }

    // -- mutations -----------------------------------------------------------

    /// Append a field and select it. A colliding id is replaced with a
    /// freshly generated one. Returns the id the field was stored under.
    pub fn add_field(&mut self, mut field: PdfField) -> String {
        if field.id.trim().is_empty() || self.field(&field.id).is_some() {
            field.id = self.generate_id(field.field_type);
        }
        let id = field.id.clone();
        self.fields.push(field);
        self.selected = Some(id.clone());
        id
    }

    /// Merge `patch` into the named field. No-op if the id is absent.
    ///
    /// Bounds are not validated here; callers placing fields by pointer use
    /// the drag/resize operations, which clamp.
    pub fn update_field(&mut self, id: &str, patch: &FieldPatch) {
        if let Some(field) = self.field_mut(id) {
            field.apply_patch(patch);
        }
    }

    /// Remove the named field, clearing the selection and cancelling any
    /// interaction that referred to it.
    pub fn delete_field(&mut self, id: &str) {
        let before = self.fields.len();
        self.fields.retain(|f| f.id != id);
        if self.fields.len() == before {
            return;
        }
        if self.selected.as_deref() == Some(id) {
            self.selected = None;
        }
        let interacting = match &self.interaction {
            Interaction::Dragging { field_id, .. } | Interaction::Resizing { field_id } => {
                field_id == id
            }
            Interaction::Idle => false,
        };
        if interacting {
            self.interaction = Interaction::Idle;
        }
    }

    /// Apply a serialized edit.
    pub fn apply(&mut self, edit: FieldEdit) {
        match edit {
            FieldEdit::Add { field } => {
                self.add_field(field);
            }
            FieldEdit::Update { id, changes } => self.update_field(&id, &changes),
            FieldEdit::Delete { id } => self.delete_field(&id),
        }
    }

    /// Place a new field at `point` with the active create tool.
    ///
    /// Returns `None` when the select tool is active. The new field is
    /// clamped inside the page and selected, and the tool reverts to
    /// [`Tool::Select`].
    pub fn create_at(&mut self, page: u32, point: NormalizedPoint) -> Option<String> {
        let Tool::Create(field_type) = self.tool else {
            return None;
        };
        let id = self.generate_id(field_type);
        let mut field = PdfField::new(id, field_type, page.max(1), point);
        field.clamp_to_page();
        let id = self.add_field(field);
        self.tool = Tool::Select;
        Some(id)
    }

    // -- drag ------------------------------------------------------------------

    /// Start dragging a field. Selects it and records the pointer offset.
    pub fn begin_drag(&mut self, id: &str, pointer: NormalizedPoint) {
        let Some(origin) = self.field(id).map(PdfField::origin) else {
            return;
        };
        self.selected = Some(id.to_string());
        self.interaction = Interaction::Dragging {
            field_id: id.to_string(),
            offset: NormalizedPoint::new(pointer.x - origin.x, pointer.y - origin.y),
        };
    }

    /// Move the dragged field so it keeps its offset to the pointer,
    /// clamped inside the page.
    pub fn drag_to(&mut self, pointer: NormalizedPoint) {
        let Interaction::Dragging { field_id, offset } = self.interaction.clone() else {
            return;
        };
        if let Some(field) = self.field_mut(&field_id) {
            field.x = pointer.x - offset.x;
            field.y = pointer.y - offset.y;
            field.clamp_to_page();
        }
    }

    pub fn end_drag(&mut self) {
        if matches!(self.interaction, Interaction::Dragging { .. }) {
            self.interaction = Interaction::Idle;
        }
    }

    // -- resize ----------------------------------------------------------------

    /// Start resizing a field from its bottom-right handle.
    pub fn begin_resize(&mut self, id: &str) {
        if self.field(id).is_none() {
            return;
        }
        self.selected = Some(id.to_string());
        self.interaction = Interaction::Resizing {
            field_id: id.to_string(),
        };
    }

    /// Resize so the bottom-right corner follows the pointer. Size never
    /// drops below [`MIN_FIELD_SIZE`] and never crosses the page edge.
    pub fn resize_to(&mut self, pointer: NormalizedPoint) {
        let Interaction::Resizing { field_id } = self.interaction.clone() else {
            return;
        };
        if let Some(field) = self.field_mut(&field_id) {
            let max_w = (1.0 - field.x).max(MIN_FIELD_SIZE);
            let max_h = (1.0 - field.y).max(MIN_FIELD_SIZE);
            field.width = (pointer.x - field.x).clamp(MIN_FIELD_SIZE, max_w);
            field.height = (pointer.y - field.y).clamp(MIN_FIELD_SIZE, max_h);
        }
    }

    pub fn end_resize(&mut self) {
        if matches!(self.interaction, Interaction::Resizing { .. }) {
            self.interaction = Interaction::Idle;
        }
    }

    // -- helpers ---------------------------------------------------------------

    /// Topmost field on `page` under `point` (last added wins).
    pub fn hit_test(&self, page: u32, point: NormalizedPoint) -> Option<&PdfField> {
        self.fields
            .iter()
            .rev()
            .find(|f| f.page == page && f.contains(point))
    }

    fn generate_id(&mut self, field_type: FieldType) -> String {
        loop {
            let candidate = format!("{}_{}", field_type.as_str(), self.next_seq);
            self.next_seq += 1;
            if self.field(&candidate).is_none() {
                return candidate;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pdf_field::validate_fields;

    fn text_field(id: &str, x: f64, y: f64) -> PdfField {
        PdfField::new(id, FieldType::Text, 1, NormalizedPoint::new(x, y))
    }

    fn editor() -> FieldEditor {
        FieldEditor::new(vec![text_field("a", 0.1, 0.1), text_field("b", 0.1, 0.5)])
    }

    #[test]
    fn deleting_selected_field_clears_selection() {
        let mut ed = editor();
        ed.select("a");
        ed.delete_field("a");
        assert!(ed.selected().is_none());
        assert_eq!(ed.fields().len(), 1);
    }

    #[test]
    fn deleting_other_field_keeps_selection() {
        let mut ed = editor();
        ed.select("a");
        ed.delete_field("b");
        assert_eq!(ed.selected(), Some("a"));
        assert_eq!(ed.fields().len(), 1);
    }

    #[test]
    fn updating_unknown_field_is_noop() {
        let mut ed = editor();
        let before = ed.fields().to_vec();
        ed.update_field(
            "missing",
            &FieldPatch {
                x: Some(0.9),
                ..Default::default()
            },
        );
        assert_eq!(ed.fields(), before.as_slice());
    }

    #[test]
    fn update_does_not_validate_bounds() {
        let mut ed = editor();
        ed.update_field(
            "a",
            &FieldPatch {
                x: Some(2.0),
                ..Default::default()
            },
        );
        assert_eq!(ed.field("a").unwrap().x, 2.0);
    }

    #[test]
    fn selecting_unknown_id_keeps_previous_selection() {
        let mut ed = editor();
        ed.select("b");
        ed.select("nope");
        assert_eq!(ed.selected(), Some("b"));
    }

    #[test]
    fn add_with_colliding_id_generates_fresh_one() {
        let mut ed = editor();
        let id = ed.add_field(text_field("a", 0.3, 0.3));
        assert_ne!(id, "a");
        assert_eq!(ed.selected(), Some(id.as_str()));
        assert!(validate_fields(ed.fields()).is_ok());
    }

    #[test]
    fn create_tool_places_clamped_field_and_reverts_to_select() {
        let mut ed = FieldEditor::new(Vec::new());
        assert!(ed.create_at(1, NormalizedPoint::new(0.5, 0.5)).is_none());

        ed.set_tool(Tool::Create(FieldType::Signature));
        let id = ed.create_at(2, NormalizedPoint::new(0.95, 0.99)).unwrap();
        let field = ed.field(&id).unwrap();
        assert_eq!(field.field_type, FieldType::Signature);
        assert_eq!(field.page, 2);
        assert!(field.x + field.width <= 1.0 + 1e-9);
        assert!(field.y + field.height <= 1.0 + 1e-9);
        assert_eq!(ed.tool(), Tool::Select);
        assert_eq!(ed.selected(), Some(id.as_str()));
    }

    #[test]
    fn drag_keeps_pointer_offset_and_clamps() {
        let mut ed = editor();
        ed.begin_drag("a", NormalizedPoint::new(0.15, 0.12));
        let offset = ed.drag_offset().unwrap();
        assert!((offset.x - 0.05).abs() < 1e-12);
        assert!((offset.y - 0.02).abs() < 1e-12);

        ed.drag_to(NormalizedPoint::new(0.45, 0.42));
        let a = ed.field("a").unwrap();
        assert!((a.x - 0.4).abs() < 1e-12);
        assert!((a.y - 0.4).abs() < 1e-12);

        ed.drag_to(NormalizedPoint::new(5.0, 5.0));
        let a = ed.field("a").unwrap();
        assert!((a.x + a.width - 1.0).abs() < 1e-12);
        assert!((a.y + a.height - 1.0).abs() < 1e-12);

        ed.end_drag();
        assert!(ed.drag_offset().is_none());
    }

    #[test]
    fn deleting_dragged_field_cancels_drag() {
        let mut ed = editor();
        ed.begin_drag("b", NormalizedPoint::new(0.2, 0.5));
        ed.delete_field("b");
        assert_eq!(ed.interaction(), &Interaction::Idle);
    }

    #[test]
    fn resize_respects_minimum_and_page_edge() {
        let mut ed = editor();
        ed.begin_resize("a");
        ed.resize_to(NormalizedPoint::new(0.0, 0.0));
        let a = ed.field("a").unwrap();
        assert_eq!(a.width, MIN_FIELD_SIZE);
        assert_eq!(a.height, MIN_FIELD_SIZE);

        ed.resize_to(NormalizedPoint::new(3.0, 3.0));
        let a = ed.field("a").unwrap();
        assert!((a.x + a.width - 1.0).abs() < 1e-12);
        ed.end_resize();
        assert_eq!(ed.interaction(), &Interaction::Idle);
    }

    #[test]
    fn apply_runs_serialized_edits() {
        let mut ed = editor();
        let edits: Vec<FieldEdit> = serde_json::from_value(serde_json::json!([
            { "op": "update", "id": "a", "changes": { "label": "Nombre" } },
            { "op": "delete", "id": "b" },
            { "op": "add", "field": { "id": "c", "type": "checkbox", "x": 0.5, "y": 0.5, "width": 0.03, "height": 0.02 } }
        ]))
        .unwrap();
        for edit in edits {
            ed.apply(edit);
        }
        let ids: Vec<&str> = ed.fields().iter().map(|f| f.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "c"]);
        assert_eq!(ed.field("a").unwrap().label.as_deref(), Some("Nombre"));
    }

    #[test]
    fn hit_test_prefers_topmost() {
        let mut ed = editor();
        ed.add_field(text_field("top", 0.1, 0.1));
        let hit = ed.hit_test(1, NormalizedPoint::new(0.15, 0.11)).unwrap();
        assert_eq!(hit.id, "top");
        assert!(ed.hit_test(2, NormalizedPoint::new(0.15, 0.11)).is_none());
    }
}
