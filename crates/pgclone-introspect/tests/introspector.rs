use pgclone_connect::testing::{ScriptedDatabase, catalog_rows, definition_row};
use pgclone_core::{ColumnDescriptor, Error, ObjectKind};
use pgclone_introspect::{Introspector, PostgresIntrospector};

fn users_columns() -> Vec<ColumnDescriptor> {
    vec![
        ColumnDescriptor::new("id", "integer", false).with_precision(32, Some(0)),
        ColumnDescriptor::new("name", "character varying", true).with_length(50),
        ColumnDescriptor::new("score", "numeric", true).with_precision(8, Some(2)),
    ]
}

#[tokio::test]
async fn create_table_lists_catalog_columns_in_order() {
    let db = ScriptedDatabase::new("source").respond(Some(catalog_rows(&users_columns())));

    let ddl = PostgresIntrospector
        .generate_create_table(&db, "public", "users")
        .await
        .expect("ddl");

    assert_eq!(
        ddl,
        "CREATE TABLE public.users (id integer NOT NULL, name character varying(50), score numeric(8,2));"
    );
    let statements = db.statements();
    assert_eq!(statements.len(), 1);
    assert!(statements[0].contains("information_schema.columns"));
    assert!(statements[0].contains("table_name = 'users'"));
    assert!(statements[0].contains("JOIN pg_tables"));
}

#[tokio::test]
async fn not_null_appears_only_for_non_nullable_columns() {
    let columns = vec![
        ColumnDescriptor::new("a", "text", true),
        ColumnDescriptor::new("b", "text", false),
        ColumnDescriptor::new("c", "boolean", true),
    ];
    let db = ScriptedDatabase::new("source").respond(Some(catalog_rows(&columns)));

    let ddl = PostgresIntrospector
        .generate_create_table(&db, "s", "t")
        .await
        .expect("ddl");

    assert_eq!(ddl.matches("NOT NULL").count(), 1);
    assert!(ddl.contains("b text NOT NULL"));
}

#[tokio::test]
async fn missing_table_is_not_found() {
    let db = ScriptedDatabase::new("source").respond(Some(Vec::new()));

    let err = PostgresIntrospector
        .generate_create_table(&db, "public", "test")
        .await
        .expect_err("missing table");

    assert!(matches!(
        err,
        Error::NotFound { kind: ObjectKind::Table, .. }
    ));
    assert!(err.to_string().contains("public.test"));
}

#[tokio::test]
async fn failed_catalog_query_is_not_found() {
    let db = ScriptedDatabase::new("source").respond(None);

    let err = PostgresIntrospector
        .generate_create_table(&db, "public", "test")
        .await
        .expect_err("failed query");

    assert_eq!(
        err.to_string(),
        "table public.test not found in source database"
    );
}

#[tokio::test]
async fn materialized_view_wraps_definition() {
    let db = ScriptedDatabase::new("source").respond(Some(definition_row(
        " SELECT user_id, count(*) AS total FROM users GROUP BY user_id;",
    )));

    let ddl = PostgresIntrospector
        .generate_create_materialized_view(&db, "public", "user_summary")
        .await
        .expect("ddl");

    assert_eq!(
        ddl,
        "CREATE MATERIALIZED VIEW public.user_summary AS SELECT user_id, count(*) AS total FROM users GROUP BY user_id;"
    );
    assert!(db.statements()[0].contains("pg_matviews"));
}

#[tokio::test]
async fn missing_materialized_view_is_not_found() {
    let db = ScriptedDatabase::new("source").respond(None);

    let err = PostgresIntrospector
        .generate_create_materialized_view(&db, "analytics", "stats")
        .await
        .expect_err("missing view");

    assert_eq!(
        err.to_string(),
        "materialized view analytics.stats not found in source database"
    );
}

#[tokio::test]
async fn table_from_materialized_view_uses_probe_and_cleans_up() {
    let columns = vec![
        ColumnDescriptor::new("id", "integer", false),
        ColumnDescriptor::new("cnt", "bigint", true),
    ];
    let db = ScriptedDatabase::new("source")
        .respond(Some(definition_row("SELECT id, cnt FROM t")))
        .respond(Some(catalog_rows(&columns)));

    let ddl = PostgresIntrospector
        .generate_create_table_from_materialized_view(&db, "public", "mv_stats")
        .await
        .expect("ddl");

    assert_eq!(
        ddl,
        "CREATE TABLE public.mv_stats (id integer NOT NULL, cnt bigint);"
    );

    let statements = db.statements();
    assert_eq!(statements.len(), 4);
    assert!(statements[0].contains("pg_matviews"));
    assert_eq!(
        statements[1],
        "CREATE OR REPLACE VIEW public.temp_analysis_mv_stats AS SELECT id, cnt FROM t;"
    );
    assert!(statements[2].contains("table_name = 'temp_analysis_mv_stats'"));
    assert!(!statements[2].contains("pg_tables"));
    assert_eq!(
        statements[3],
        "DROP VIEW IF EXISTS public.temp_analysis_mv_stats;"
    );
}

#[tokio::test]
async fn probe_is_dropped_once_when_structure_is_empty() {
    let db = ScriptedDatabase::new("source")
        .respond(Some(definition_row("SELECT id, user_count FROM users")))
        .respond(Some(Vec::new()));

    let err = PostgresIntrospector
        .generate_create_table_from_materialized_view(&db, "public", "no_definition_view")
        .await
        .expect_err("no columns");

    assert!(matches!(err, Error::StructureAnalysis { .. }));
    assert!(
        err.to_string()
            .contains("could not analyze structure of materialized view public.no_definition_view")
    );

    let drops: Vec<String> = db
        .statements()
        .into_iter()
        .filter(|sql| sql.starts_with("DROP VIEW IF EXISTS"))
        .collect();
    assert_eq!(
        drops,
        vec!["DROP VIEW IF EXISTS public.temp_analysis_no_definition_view;".to_string()]
    );
}

#[tokio::test]
async fn missing_materialized_view_never_creates_probe() {
    let db = ScriptedDatabase::new("source").respond(Some(Vec::new()));

    let err = PostgresIntrospector
        .generate_create_table_from_materialized_view(&db, "public", "nonexistent_view")
        .await
        .expect_err("missing view");

    assert!(err.to_string().contains("not found in source database"));
    assert_eq!(db.statements().len(), 1);
}

#[tokio::test]
async fn probe_is_dropped_when_describe_loses_the_connection() {
    let db = ScriptedDatabase::new("source")
        .respond(Some(definition_row("SELECT 1 AS one")))
        .respond_connection_lost();

    let err = PostgresIntrospector
        .generate_create_table_from_materialized_view(&db, "public", "flaky")
        .await
        .expect_err("connection lost");

    assert!(matches!(err, Error::Connection(_)));
    assert_eq!(
        db.statements().last().map(String::as_str),
        Some("DROP VIEW IF EXISTS public.temp_analysis_flaky;")
    );
}

#[tokio::test]
async fn plain_view_is_not_found_as_a_table() {
    // The view has catalog columns but no pg_tables row.
    let db = ScriptedDatabase::new("source")
        .respond_to("JOIN pg_tables", Some(Vec::new()))
        .respond_to("information_schema.columns", Some(catalog_rows(&users_columns())));

    let err = PostgresIntrospector
        .generate_create_table(&db, "public", "v_users")
        .await
        .expect_err("views are not tables");

    assert!(matches!(
        err,
        Error::NotFound { kind: ObjectKind::Table, ref name, .. } if name == "v_users"
    ));
    assert_eq!(db.statements().len(), 1);
    assert!(db.statements()[0].contains("JOIN pg_tables"));
}
