//! End-to-end: schema-bound identifiers through the builder into each dialect.

use docql::prelude::*;
use pretty_assertions::assert_eq;
use serde_json::json;

const SCHEMA: &str = r#"
[[collections]]
name = "users"

[[collections.fields]]
name = "status"
type = "string"
required = true

[[collections.fields]]
name = "createdAt"
type = "date"

[[collections.fields]]
name = "age"
type = "int"

[[collections]]
name = "orders"

[[collections.fields]]
name = "status"
type = "string"

[[collections.fields]]
name = "total"
type = "float"
"#;

fn db() -> DocQl<SchemaIndex> {
    let schema = Schema::from_toml_str(SCHEMA).unwrap();
    DocQl::from_schema(&schema).unwrap()
}

fn recent_active_users(db: &DocQl<SchemaIndex>) -> Builder {
    find(db.c("users"))
        .filter(eq(db.f("users", "status"), db.p("status")))
        .sort_desc(db.f("users", "createdAt"))
        .limit(10)
}

#[test]
fn full_dialect_find() {
    let db = db();
    let result = recent_active_users(&db).must_render(&MongoRenderer);
    let value = result.value().unwrap();

    assert_eq!(value["collection"], json!("users"));
    assert_eq!(value["operation"], json!("FIND"));
    assert_eq!(value["filter"], json!({ "status": { "$eq": ":status" } }));
    assert_eq!(value["sort"], json!({ "createdAt": -1 }));
    assert_eq!(value["limit"], json!(10));
    assert_eq!(result.required_params, vec!["status"]);
}

#[test]
fn mango_dialect_find() {
    let db = db();
    let result = recent_active_users(&db).must_render(&CouchRenderer);
    let value = result.value().unwrap();

    assert!(value.get("filter").is_none());
    assert_eq!(value["selector"], json!({ "status": { "$eq": ":status" } }));
    assert!(value["sort"].is_array());
    assert_eq!(value["sort"], json!([{ "createdAt": "desc" }]));
    assert_eq!(result.required_params, vec!["status"]);
}

#[test]
fn aggregate_needs_full_dialect() {
    let db = db();
    let ast = aggregate(db.c("orders"))
        .match_(eq(db.f("orders", "status"), db.p("status")))
        .must_build();

    let err = DynamoRenderer.render(&ast).unwrap_err();
    assert!(err.is_unsupported(), "{err}");

    let result = MongoRenderer.render(&ast).unwrap();
    let pipeline = &result.value().unwrap()["pipeline"];
    assert_eq!(pipeline.as_array().map(Vec::len), Some(1));
}

#[test]
fn native_filter_dialect_rejects_or() {
    let db = db();
    let err = find(db.c("users"))
        .filter(or([
            eq(db.f("users", "status"), db.p("status")),
            gte(db.f("users", "age"), db.p("min_age")),
        ]))
        .render(&FirestoreRenderer)
        .unwrap_err();
    assert!(err.is_unsupported(), "{err}");
}

#[test]
fn one_ast_renders_identically_every_time() {
    let db = db();
    let ast = recent_active_users(&db).must_build();
    for dialect in Dialect::ALL {
        let r = dialect.renderer();
        assert_eq!(r.render(&ast).unwrap(), r.render(&ast).unwrap());
    }
}

#[test]
fn bulk_writes_require_a_filter() {
    let db = db();

    let err = update_many(db.c("users"))
        .set(db.f("users", "status"), db.p("status"))
        .build()
        .unwrap_err();
    assert!(err.to_string().contains("UPDATE_MANY requires a filter for safety"), "{err}");

    let err = delete_many(db.c("users")).build().unwrap_err();
    assert!(matches!(err, DocqlError::Validation(ValidationError::MissingFilter(_))));

    let ok = update_many(db.c("users"))
        .filter(eq(db.f("users", "status"), db.p("old")))
        .set(db.f("users", "status"), db.p("new"))
        .build();
    assert!(ok.is_ok());
}

#[test]
fn limit_boundary() {
    let db = db();
    assert!(find(db.c("users")).limit(MAX_LIMIT).build().is_ok());

    let err = find(db.c("users")).limit(MAX_LIMIT + 1).build().unwrap_err();
    assert!(matches!(
        err,
        DocqlError::Validation(ValidationError::LimitTooLarge(n)) if n == MAX_LIMIT + 1
    ));
}

#[test]
fn unknown_names_are_caught_before_building() {
    let db = db();
    let err = db.try_f("users", "staus").unwrap_err();
    assert_eq!(
        err.to_string(),
        "Field 'staus' not found in collection 'users'. Did you mean 'status'?"
    );
}

#[test]
fn first_builder_error_wins() {
    let db = db();
    let err = find(db.c("users"))
        .set(db.f("users", "status"), db.p("status"))
        .document(doc().set(db.f("users", "age"), db.p("age")).build())
        .limit(10)
        .build()
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "set() can only be used with UPDATE operations (got FIND)"
    );
}
