use docflow_core::document_render::DocumentTemplateType;
use docflow_db::models::document_template::{CreateDocumentTemplate, UpdateDocumentTemplate};
use docflow_db::repositories::DocumentTemplateRepo;
use sqlx::PgPool;

/// Every table named by the HTTP API exists after migrating.
#[sqlx::test(migrations = "./migrations")]
async fn test_expected_tables_exist(pool: PgPool) {
    for table in [
        "users",
        "user_sessions",
        "password_reset_tokens",
        "pdf_templates",
        "document_templates",
        "sales_requests",
        "notifications",
        "customizations",
    ] {
        let found: Option<(String,)> = sqlx::query_as(
            "SELECT table_name::text
             FROM information_schema.tables
             WHERE table_schema = 'public' AND table_name = $1",
        )
        .bind(table)
        .fetch_optional(&pool)
        .await
        .unwrap();
        assert!(found.is_some(), "Table {table} is missing");
    }
}

/// `document_templates` stores the template kind in a column named `type`.
#[sqlx::test(migrations = "./migrations")]
async fn test_document_template_kind_column_is_type(pool: PgPool) {
    let columns: Vec<(String,)> = sqlx::query_as(
        "SELECT column_name::text
         FROM information_schema.columns
         WHERE table_schema = 'public' AND table_name = 'document_templates'",
    )
    .fetch_all(&pool)
    .await
    .unwrap();
    let names: Vec<&str> = columns.iter().map(|(c,)| c.as_str()).collect();

    assert!(names.contains(&"type"), "columns: {names:?}");
    assert!(!names.contains(&"template_type"));
}

#[sqlx::test(migrations = "./migrations")]
async fn test_document_template_type_round_trips(pool: PgPool) {
    let (owner,): (i64,) = sqlx::query_as(
        "INSERT INTO users (email, full_name, password_hash, role)
         VALUES ('owner@example.com', 'Owner', 'x', 'user')
         RETURNING id",
    )
    .fetch_one(&pool)
    .await
    .unwrap();

    let created = DocumentTemplateRepo::create(
        &pool,
        owner,
        &CreateDocumentTemplate {
            name: "Anexo salud".into(),
            template_type: DocumentTemplateType::Anexo,
            fields: vec![],
            content: "<p>{{cliente}}</p>".into(),
        },
    )
    .await
    .unwrap();
    assert_eq!(created.template_type, "anexo");

    let updated = DocumentTemplateRepo::update(
        &pool,
        created.id,
        &UpdateDocumentTemplate {
            template_type: Some(DocumentTemplateType::Declaracion),
            ..Default::default()
        },
    )
    .await
    .unwrap()
    .expect("row exists");
    assert_eq!(updated.template_type, "declaracion");
}
