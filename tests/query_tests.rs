use std::sync::Arc;

use protosql::{MapperError, Repository, SqlRow, Value};


use mapper_utils::{Foo, RecordingExecutor};

#[tokio::test]
async fn test_get_by_key_selects_and_materializes_the_row() {
    let exec = Arc::new(RecordingExecutor::new());
    exec.push_row(Some(SqlRow::from_pairs(vec![
        ("col1", Value::Text("lxp1".to_string())),
        ("col2", Value::Long(42)),
        ("col3", Value::Double(1.5)),
    ])));
    let repo: Repository<Foo, _> = Repository::new(exec.clone());

    let found = repo.get_by_key("lxp1").await.unwrap().unwrap();
    assert_eq!(
        found,
        Foo {
            col1: Some("lxp1".to_string()),
            // Long narrows to the declared i32 runtime type.
            col2: Some(42),
            col3: Some(1.5),
        }
    );

    let (sql, params) = &exec.statements()[0];
    assert_eq!(sql, "SELECT * FROM foo WHERE col1 = ?");
    assert_eq!(params, &vec![Value::Text("lxp1".to_string())]);
}

#[tokio::test]
async fn test_get_by_key_missing_row_is_not_an_error() {
    let exec = Arc::new(RecordingExecutor::new());
    exec.push_row(None);
    let repo: Repository<Foo, _> = Repository::new(exec.clone());

    assert!(repo.get_by_key("absent").await.unwrap().is_none());
}

#[tokio::test]
async fn test_materialization_skips_unknown_and_differently_cased_labels() {
    let exec = Arc::new(RecordingExecutor::new());
    exec.push_row(Some(SqlRow::from_pairs(vec![
        ("col1", Value::Text("lxp1".to_string())),
        ("COL2", Value::Integer(7)),
        ("unknown_col", Value::Text("ignored".to_string())),
    ])));
    let repo: Repository<Foo, _> = Repository::new(exec.clone());

    let found = repo.get_by_key("lxp1").await.unwrap().unwrap();
    assert_eq!(found.col1.as_deref(), Some("lxp1"));
    assert_eq!(found.col2, None);
    assert_eq!(found.col3, None);
}

#[tokio::test]
async fn test_null_columns_leave_fields_unset() {
    let exec = Arc::new(RecordingExecutor::new());
    exec.push_row(Some(SqlRow::from_pairs(vec![
        ("col1", Value::Text("lxp1".to_string())),
        ("col2", Value::Null),
        ("col3", Value::Double(1.5)),
    ])));
    let repo: Repository<Foo, _> = Repository::new(exec.clone());

    let found = repo.get_by_key("lxp1").await.unwrap().unwrap();
    assert_eq!(found.col2, None);
    assert_eq!(found.col3, Some(1.5));
}

#[tokio::test]
async fn test_get_one_passes_custom_sql_through_verbatim() {
    let exec = Arc::new(RecordingExecutor::new());
    exec.push_row(Some(SqlRow::from_pairs(vec![(
        "col1",
        Value::Text("lxp1".to_string()),
    )])));
    let repo: Repository<Foo, _> = Repository::new(exec.clone());

    let sql = "SELECT * FROM foo WHERE col2 > ? ORDER BY col2 LIMIT 1";
    let found = repo
        .get_one(sql, &[Value::Integer(5)])
        .await
        .unwrap();
    assert!(found.is_some());

    let (recorded_sql, recorded_params) = &exec.statements()[0];
    assert_eq!(recorded_sql, sql);
    assert_eq!(recorded_params, &vec![Value::Integer(5)]);
}

#[tokio::test]
async fn test_query_many_materializes_rows_in_result_order() {
    let exec = Arc::new(RecordingExecutor::new());
    exec.push_rows(vec![
        SqlRow::from_pairs(vec![
            ("col1", Value::Text("a".to_string())),
            ("col2", Value::Integer(1)),
        ]),
        SqlRow::from_pairs(vec![
            ("col1", Value::Text("b".to_string())),
            ("col2", Value::Integer(2)),
        ]),
    ]);
    let repo: Repository<Foo, _> = Repository::new(exec.clone());

    let sql = format!("{} ORDER BY col2", repo.select_statement().unwrap());
    assert_eq!(sql, "SELECT * FROM foo ORDER BY col2");

    let found = repo.query_many(&sql, &[]).await.unwrap();
    assert_eq!(found.len(), 2);
    assert_eq!(found[0].col1.as_deref(), Some("a"));
    assert_eq!(found[1].col1.as_deref(), Some("b"));
}

#[tokio::test]
async fn test_query_many_propagates_coercion_failures() {
    let exec = Arc::new(RecordingExecutor::new());
    exec.push_rows(vec![SqlRow::from_pairs(vec![
        ("col1", Value::Text("lxp1".to_string())),
        ("col2", Value::Text("abc".to_string())),
    ])]);
    let repo: Repository<Foo, _> = Repository::new(exec.clone());

    let err = repo
        .query_many("SELECT * FROM foo", &[])
        .await
        .unwrap_err();
    assert!(matches!(err, MapperError::TypeCoercion { .. }));
}

#[tokio::test]
async fn test_execute_update_passes_raw_statements_through() {
    let exec = Arc::new(RecordingExecutor::new());
    exec.push_affected(3);
    let repo: Repository<Foo, _> = Repository::new(exec.clone());

    let affected = repo
        .execute_update("DELETE FROM foo WHERE col2 < ?", &[Value::Integer(0)])
        .await
        .unwrap();
    assert_eq!(affected, 3);

    let (sql, params) = &exec.statements()[0];
    assert_eq!(sql, "DELETE FROM foo WHERE col2 < ?");
    assert_eq!(params, &vec![Value::Integer(0)]);
}
