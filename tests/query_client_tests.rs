//! `SeaOrmQueryClient` against a migrated SQLite database.

mod test_utils;

use notifications::models::{SupportNotification, support_notification};
use notifications::query::{
    Filter, Patch, QueryClient, QueryError, SeaOrmQueryClient, SourceQuery, tables,
};
use sea_orm::EntityTrait;
use serde_json::json;
use test_utils::*;

const PAYMENT_NEEDLES: &[&str] = &["payment", "transaction"];

#[tokio::test]
async fn select_orders_newest_first_and_applies_limit() {
    let db = setup_test_db().await.unwrap();
    insert_support_notification(&db, "oldest", None, false, "2025-01-10T08:00:00+00:00")
        .await
        .unwrap();
    insert_support_notification(&db, "newest", None, false, "2025-01-10T12:00:00+00:00")
        .await
        .unwrap();
    insert_support_notification(&db, "middle", None, true, "2025-01-10T10:00:00+00:00")
        .await
        .unwrap();

    let client = SeaOrmQueryClient::new(db);
    let rows = client
        .select(&SourceQuery::new(tables::SUPPORT_NOTIFICATIONS).limit(2))
        .await
        .unwrap();

    let titles: Vec<_> = rows.iter().map(|r| r["title"].as_str().unwrap()).collect();
    assert_eq!(titles, vec!["newest", "middle"]);
    assert_eq!(rows[1]["is_read"], true);
    assert!(rows[0]["id"].is_string());
}

#[tokio::test]
async fn contains_any_filter_is_case_insensitive() {
    let db = setup_test_db().await.unwrap();
    insert_system_log(&db, "error", "PAYMENT declined", "2025-01-10T08:00:00+00:00")
        .await
        .unwrap();
    insert_system_log(&db, "info", "Transaction settled", "2025-01-10T09:00:00+00:00")
        .await
        .unwrap();
    insert_system_log(&db, "info", "Vehicle checked in", "2025-01-10T10:00:00+00:00")
        .await
        .unwrap();

    let client = SeaOrmQueryClient::new(db);
    let rows = client
        .select(&SourceQuery::new(tables::SYSTEM_LOGS).filter(Filter::ContainsAny {
            column: "message",
            needles: PAYMENT_NEEDLES,
        }))
        .await
        .unwrap();

    let messages: Vec<_> = rows
        .iter()
        .map(|r| r["message"].as_str().unwrap())
        .collect();
    assert_eq!(messages, vec!["Transaction settled", "PAYMENT declined"]);
}

#[tokio::test]
async fn update_applies_patch_to_one_row() {
    let db = setup_test_db().await.unwrap();
    let target = insert_support_notification(&db, "a", None, false, "2025-01-10T08:00:00+00:00")
        .await
        .unwrap();
    let other = insert_support_notification(&db, "b", None, false, "2025-01-10T09:00:00+00:00")
        .await
        .unwrap();

    let client = SeaOrmQueryClient::new(db.clone());
    let mut patch = Patch::new();
    patch.insert("is_read".to_string(), json!(true));
    patch.insert("updated_at".to_string(), json!("2025-01-11T09:30:00+00:00"));
    client
        .update(tables::SUPPORT_NOTIFICATIONS, &patch, &target.to_string())
        .await
        .unwrap();

    let updated: support_notification::Model = SupportNotification::find_by_id(target)
        .one(&db)
        .await
        .unwrap()
        .unwrap();
    assert!(updated.is_read);
    assert_eq!(updated.updated_at, Some(ts("2025-01-11T09:30:00+00:00")));

    let untouched = SupportNotification::find_by_id(other)
        .one(&db)
        .await
        .unwrap()
        .unwrap();
    assert!(!untouched.is_read);
}

#[tokio::test]
async fn update_rejects_unknown_columns_and_missing_rows() {
    let db = setup_test_db().await.unwrap();
    let id = insert_support_notification(&db, "a", None, false, "2025-01-10T08:00:00+00:00")
        .await
        .unwrap();
    let client = SeaOrmQueryClient::new(db);

    let mut patch = Patch::new();
    patch.insert("archived".to_string(), json!(true));
    let err = client
        .update(tables::SUPPORT_NOTIFICATIONS, &patch, &id.to_string())
        .await
        .unwrap_err();
    assert!(matches!(err, QueryError::UnknownColumn { .. }));

    let mut patch = Patch::new();
    patch.insert("is_read".to_string(), json!(true));
    let err = client
        .update(
            tables::SUPPORT_NOTIFICATIONS,
            &patch,
            "00000000-0000-4000-8000-000000000000",
        )
        .await
        .unwrap_err();
    assert!(matches!(err, QueryError::NotFound { .. }));

    let err = client
        .update(tables::SUPPORT_NOTIFICATIONS, &patch, "not-a-uuid")
        .await
        .unwrap_err();
    assert!(matches!(err, QueryError::InvalidId(_)));
}

#[tokio::test]
async fn delete_removes_the_row() {
    let db = setup_test_db().await.unwrap();
    let id = insert_support_notification(&db, "a", None, false, "2025-01-10T08:00:00+00:00")
        .await
        .unwrap();
    let client = SeaOrmQueryClient::new(db.clone());

    client
        .delete(tables::SUPPORT_NOTIFICATIONS, &id.to_string())
        .await
        .unwrap();
    assert!(
        SupportNotification::find_by_id(id)
            .one(&db)
            .await
            .unwrap()
            .is_none()
    );

    let err = client
        .delete(tables::SUPPORT_NOTIFICATIONS, &id.to_string())
        .await
        .unwrap_err();
    assert!(matches!(err, QueryError::NotFound { .. }));
}

#[tokio::test]
async fn unknown_table_is_rejected() {
    let db = setup_test_db().await.unwrap();
    let client = SeaOrmQueryClient::new(db);

    let err = client
        .select(&SourceQuery::new("invoices"))
        .await
        .unwrap_err();
    assert!(matches!(err, QueryError::UnknownTable(ref t) if t == "invoices"));

    let err = client.delete("invoices", "x").await.unwrap_err();
    assert!(matches!(err, QueryError::UnknownTable(_)));
}
