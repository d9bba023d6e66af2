//! HTTP-level integration tests for the `/pdf-templates` resource.

mod common;

use axum::http::header::CONTENT_DISPOSITION;
use axum::http::StatusCode;
use common::{body_json, delete_auth, get, get_auth, post_json_auth, put_json_auth, user_with_token};
use serde_json::json;

fn field(id: &str, kind: &str, required: bool) -> serde_json::Value {
    json!({
        "id": id,
        "type": kind,
        "page": 1,
        "x": 0.1,
        "y": 0.2,
        "width": 0.3,
        "height": 0.03,
        "required": required,
    })
}

/// Create a template through the API and return its id.
async fn create_template(state: &docflow_api::state::AppState, token: &str, body: serde_json::Value) -> i64 {
    let response =
        post_json_auth(common::build_test_app(state.clone()), "/api/v1/pdf-templates", body, token).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    body_json(response).await["data"]["id"]
        .as_i64()
        .expect("template id")
}

// ---------------------------------------------------------------------------
// CRUD
// ---------------------------------------------------------------------------

#[tokio::test]
async fn listing_requires_authentication() {
    let state = common::test_state();
    let response = get(common::build_test_app(state), "/api/v1/pdf-templates").await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn create_defaults_name_to_file_base_name() {
    let state = common::test_state();
    let (_user, token) = user_with_token(&state, "editor@example.com").await;

    let response = post_json_auth(
        common::build_test_app(state),
        "/api/v1/pdf-templates",
        json!({ "file_name": "uploads/Contrato Oro.pdf", "file_size": 2048 }),
        &token,
    )
    .await;

    assert_eq!(response.status(), StatusCode::CREATED);
    let json = body_json(response).await;
    assert_eq!(json["data"]["name"], "Contrato Oro");
    assert_eq!(json["data"]["fields"], json!([]));
    assert!(json["toast"]["title"].is_string());
}

#[tokio::test]
async fn create_rejects_out_of_page_fields() {
    let state = common::test_state();
    let (_user, token) = user_with_token(&state, "editor@example.com").await;

    let mut bad = field("f1", "text", false);
    bad["x"] = json!(-0.5);
    let response = post_json_auth(
        common::build_test_app(state),
        "/api/v1/pdf-templates",
        json!({ "name": "Bad", "file_name": "bad.pdf", "fields": [bad] }),
        &token,
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["code"], "VALIDATION_ERROR");
    assert_eq!(json["toast"]["variant"], "destructive");
    assert_eq!(json["toast"]["title"], "No se pudo crear la plantilla");
    assert_eq!(json["toast"]["description"], json["error"]);
}

#[tokio::test]
async fn failed_delete_carries_destructive_toast() {
    let state = common::test_state();
    let (_user, token) = user_with_token(&state, "editor@example.com").await;

    let response = delete_auth(common::build_test_app(state), "/api/v1/pdf-templates/4242", &token).await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let json = body_json(response).await;
    assert_eq!(json["code"], "NOT_FOUND");
    assert_eq!(json["toast"]["variant"], "destructive");
    assert_eq!(json["toast"]["title"], "No se pudo eliminar la plantilla");
    assert!(json["toast"]["description"].as_str().expect("description").contains("4242"));
}

#[tokio::test]
async fn search_filters_by_name_and_file_name() {
    let state = common::test_state();
    let (_user, token) = user_with_token(&state, "editor@example.com").await;
    create_template(&state, &token, json!({ "name": "Contrato Plata", "file_name": "plata.pdf" })).await;
    create_template(&state, &token, json!({ "name": "Anexo", "file_name": "anexo_salud.pdf" })).await;

    let response = get_auth(
        common::build_test_app(state.clone()),
        "/api/v1/pdf-templates?search=PLATA",
        &token,
    )
    .await;
    let json = body_json(response).await;
    let names: Vec<&str> = json["data"]
        .as_array()
        .expect("array")
        .iter()
        .filter_map(|t| t["name"].as_str())
        .collect();
    assert_eq!(names, vec!["Contrato Plata"]);

    let response =
        get_auth(common::build_test_app(state.clone()), "/api/v1/pdf-templates?search=salud", &token).await;
    let json = body_json(response).await;
    assert_eq!(json["data"][0]["name"], "Anexo");

    // A blank search returns everything.
    let response =
        get_auth(common::build_test_app(state), "/api/v1/pdf-templates?search=%20", &token).await;
    let json = body_json(response).await;
    assert_eq!(json["data"].as_array().expect("array").len(), 2);
}

#[tokio::test]
async fn update_renames_template() {
    let state = common::test_state();
    let (_user, token) = user_with_token(&state, "editor@example.com").await;
    let id = create_template(&state, &token, json!({ "name": "Viejo", "file_name": "v.pdf" })).await;

    let response = put_json_auth(
        common::build_test_app(state.clone()),
        &format!("/api/v1/pdf-templates/{id}"),
        json!({ "name": "  Nuevo  " }),
        &token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["data"]["name"], "Nuevo");

    let response = put_json_auth(
        common::build_test_app(state),
        &format!("/api/v1/pdf-templates/{id}"),
        json!({ "name": "   " }),
        &token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn deleted_template_is_gone() {
    let state = common::test_state();
    let (_user, token) = user_with_token(&state, "editor@example.com").await;
    let id = create_template(&state, &token, json!({ "name": "Temporal", "file_name": "t.pdf" })).await;

    let response = delete_auth(
        common::build_test_app(state.clone()),
        &format!("/api/v1/pdf-templates/{id}"),
        &token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["data"]["id"], id);

    let response = get_auth(
        common::build_test_app(state.clone()),
        &format!("/api/v1/pdf-templates/{id}"),
        &token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = delete_auth(
        common::build_test_app(state),
        &format!("/api/v1/pdf-templates/{id}"),
        &token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

// ---------------------------------------------------------------------------
// Field edits
// ---------------------------------------------------------------------------

#[tokio::test]
async fn field_edits_apply_in_order() {
    let state = common::test_state();
    let (_user, token) = user_with_token(&state, "editor@example.com").await;
    let id = create_template(
        &state,
        &token,
        json!({
            "name": "Campos",
            "file_name": "c.pdf",
            "fields": [field("nombre", "text", true), field("firma", "signature", false)],
        }),
    )
    .await;

    let edits = json!({
        "edits": [
            { "op": "add", "field": field("email", "email", false) },
            { "op": "update", "id": "nombre", "changes": { "label": "Nombre completo", "x": 0.5 } },
            { "op": "delete", "id": "firma" },
        ]
    });
    let response = post_json_auth(
        common::build_test_app(state),
        &format!("/api/v1/pdf-templates/{id}/fields"),
        edits,
        &token,
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    let fields = json["data"]["fields"].as_array().expect("fields array");
    let ids: Vec<&str> = fields.iter().filter_map(|f| f["id"].as_str()).collect();
    assert_eq!(ids, vec!["nombre", "email"]);
    assert_eq!(fields[0]["label"], "Nombre completo");
    assert_eq!(fields[0]["x"], 0.5);
}

// ---------------------------------------------------------------------------
// Generation
// ---------------------------------------------------------------------------

#[tokio::test]
async fn generate_reports_every_missing_required_field() {
    let state = common::test_state();
    let (_user, token) = user_with_token(&state, "editor@example.com").await;
    let id = create_template(
        &state,
        &token,
        json!({
            "name": "Solicitud",
            "file_name": "s.pdf",
            "fields": [field("nombre", "text", true), field("telefono", "phone", true)],
        }),
    )
    .await;

    let response = post_json_auth(
        common::build_test_app(state),
        &format!("/api/v1/pdf-templates/{id}/generate"),
        json!({ "values": {} }),
        &token,
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    let message = json["error"].as_str().expect("error message");
    assert!(message.contains("nombre"));
    assert!(message.contains("telefono"));
}

#[tokio::test]
async fn generate_returns_placements_as_download() {
    let state = common::test_state();
    let (_user, token) = user_with_token(&state, "editor@example.com").await;
    let id = create_template(
        &state,
        &token,
        json!({
            "name": "Contrato Oro",
            "file_name": "oro.pdf",
            "fields": [
                field("nombre", "text", true),
                field("acepta", "checkbox", false),
                field("fecha", "date", false),
            ],
        }),
    )
    .await;

    let response = post_json_auth(
        common::build_test_app(state),
        &format!("/api/v1/pdf-templates/{id}/generate"),
        json!({
            "values": { "nombre": "Juan Pérez", "acepta": "sí", "fecha": "2024-03-05" },
            "page_size": "letter",
        }),
        &token,
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    let disposition = response
        .headers()
        .get(CONTENT_DISPOSITION)
        .expect("content-disposition header")
        .to_str()
        .expect("ascii header")
        .to_string();
    assert_eq!(disposition, "attachment; filename=\"Contrato Oro.json\"");

    let json = body_json(response).await;
    assert_eq!(json["data"]["page_size"], "letter");
    let placements = json["data"]["pages"]["1"].as_array().expect("page 1 placements");
    assert_eq!(placements.len(), 3);
    assert_eq!(placements[0]["content"], json!({ "kind": "text", "value": "Juan Pérez" }));
    assert_eq!(placements[1]["content"], json!({ "kind": "checked", "value": true }));
    assert_eq!(placements[2]["content"]["kind"], "text");
}

#[tokio::test]
async fn generate_for_unknown_template_is_404() {
    let state = common::test_state();
    let (_user, token) = user_with_token(&state, "editor@example.com").await;

    let response = post_json_auth(
        common::build_test_app(state),
        "/api/v1/pdf-templates/999/generate",
        json!({}),
        &token,
    )
    .await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
