//! Trash bin endpoints

use axum::{
    extract::{Query, State},
    http::HeaderMap,
    routing::{delete, get, post},
    Json, Router,
};
use serde::Deserialize;
use uuid::Uuid;

use tb_core::trash::{BatchResult, PurgeResult, TrashPage};

use super::error::{current_user, map_core_error, RouteError};
use super::{check_bulk_limit, record_audit};
use crate::audit::{AuditAction, AuditEvent};
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrashListQuery {
    #[serde(default)]
    pub limit: Option<usize>,
    #[serde(default)]
    pub offset: Option<usize>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RestoreRequest {
    pub task_ids: Vec<Uuid>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CleanupQuery {
    #[serde(default)]
    pub older_than_days: Option<u32>,
}

/// GET /api/trash - The caller's trash, newest first
async fn list_trash(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<TrashListQuery>,
) -> Result<Json<TrashPage>, RouteError> {
    let user_id = current_user(&state, &headers)?;

    let page = state
        .trash()
        .list_trash(user_id, query.limit, query.offset)
        .await
        .map_err(map_core_error)?;

    Ok(Json(page))
}

/// POST /api/trash/restore - Bring tasks back out of the trash
async fn restore(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<RestoreRequest>,
) -> Result<Json<BatchResult>, RouteError> {
    let user_id = current_user(&state, &headers)?;
    check_bulk_limit(&state, user_id).await?;

    let result = state
        .trash()
        .restore_tasks(user_id, &req.task_ids)
        .await
        .map_err(map_core_error)?;

    record_audit(
        &state,
        AuditEvent::new(
            user_id,
            AuditAction::TrashRestore,
            result.updated_count,
            req.task_ids,
        ),
    )
    .await;

    Ok(Json(result))
}

/// DELETE /api/trash/cleanup - Permanently remove old entries
///
/// `olderThanDays` defaults to the configured retention.
async fn cleanup(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<CleanupQuery>,
) -> Result<Json<PurgeResult>, RouteError> {
    let user_id = current_user(&state, &headers)?;
    check_bulk_limit(&state, user_id).await?;

    let older_than_days = query.older_than_days.unwrap_or_else(|| {
        u32::try_from(state.trash().policy().retention.num_days()).unwrap_or(u32::MAX)
    });
    let result = state
        .trash()
        .cleanup_trash(user_id, older_than_days)
        .await
        .map_err(map_core_error)?;

    record_audit(
        &state,
        AuditEvent::new(user_id, AuditAction::TrashCleanup, result.purged_count, Vec::new())
            .with_detail(format!("olderThanDays={}", older_than_days)),
    )
    .await;

    Ok(Json(result))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/trash", get(list_trash))
        .route("/api/trash/restore", post(restore))
        .route("/api/trash/cleanup", delete(cleanup))
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use serde_json::{json, Value};
    use uuid::Uuid;

    use super::super::test_support::{bearer, build_state, send};
    use crate::state::AppState;

    fn app(state: AppState) -> axum::Router {
        super::router()
            .merge(super::super::task::router())
            .with_state(state)
    }

    async fn create_and_delete(app: &axum::Router, auth: &str, title: &str) -> Value {
        let (_, created) = send(
            app.clone(),
            "POST",
            "/api/tasks",
            Some(auth),
            Some(json!({ "title": title, "category": "home" })),
        )
        .await;
        let uri = format!("/api/tasks/{}", created["id"].as_str().unwrap());
        let (status, _) = send(app.clone(), "DELETE", &uri, Some(auth), None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        created["id"].clone()
    }

    #[tokio::test]
    async fn deleted_task_shows_in_trash_with_snapshot() {
        let (state, _tmp) = build_state().await;
        let auth = bearer(&state, Uuid::new_v4());
        let app = app(state);

        let id = create_and_delete(&app, &auth, "Water plants").await;

        let (status, page) = send(app, "GET", "/api/trash", Some(&auth), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(page["total"], 1);
        let item = &page["items"][0];
        assert_eq!(item["taskId"], id);
        assert_eq!(item["title"], "Water plants");
        assert_eq!(item["category"], "home");
        let days = item["daysUntilPurge"].as_i64().unwrap();
        assert!((29..=30).contains(&days));
    }

    #[tokio::test]
    async fn trash_is_private_to_owner() {
        let (state, _tmp) = build_state().await;
        let owner = bearer(&state, Uuid::new_v4());
        let stranger = bearer(&state, Uuid::new_v4());
        let app = app(state);

        let id = create_and_delete(&app, &owner, "Private").await;

        let (_, page) = send(app.clone(), "GET", "/api/trash", Some(&stranger), None).await;
        assert_eq!(page["total"], 0);

        let (status, payload) = send(
            app,
            "POST",
            "/api/trash/restore",
            Some(&stranger),
            Some(json!({ "taskIds": [id] })),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(payload["taskIds"], json!([id]));
    }

    #[tokio::test]
    async fn restore_then_restore_again_conflicts() {
        let (state, _tmp) = build_state().await;
        let user_id = Uuid::new_v4();
        let auth = bearer(&state, user_id);
        let app = app(state.clone());

        let id = create_and_delete(&app, &auth, "Come back").await;

        let (status, result) = send(
            app.clone(),
            "POST",
            "/api/trash/restore",
            Some(&auth),
            Some(json!({ "taskIds": [id] })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(result["updatedCount"], 1);

        let uri = format!("/api/tasks/{}", id.as_str().unwrap());
        let (status, task) = send(app.clone(), "GET", &uri, Some(&auth), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(task["softDeleted"], false);

        let (status, payload) = send(
            app,
            "POST",
            "/api/trash/restore",
            Some(&auth),
            Some(json!({ "taskIds": [id] })),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(payload["taskIds"], json!([id]));

        let (events, _) = state
            .audit_store()
            .list_paginated(user_id, &Default::default())
            .await;
        let actions: Vec<_> = events.iter().map(|e| e.action.as_str()).collect();
        assert_eq!(actions, vec!["trash.restore", "task.delete"]);
    }

    #[tokio::test]
    async fn cleanup_with_zero_days_purges_everything() {
        let (state, _tmp) = build_state().await;
        let auth = bearer(&state, Uuid::new_v4());
        let app = app(state);

        let id = create_and_delete(&app, &auth, "Gone").await;

        let (status, result) = send(
            app.clone(),
            "DELETE",
            "/api/trash/cleanup?olderThanDays=0",
            Some(&auth),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(result["purgedCount"], 1);

        let (_, page) = send(app.clone(), "GET", "/api/trash", Some(&auth), None).await;
        assert_eq!(page["total"], 0);

        let (status, _) = send(
            app,
            "POST",
            "/api/trash/restore",
            Some(&auth),
            Some(json!({ "taskIds": [id] })),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn cleanup_with_maximum_age_is_a_no_op() {
        let (state, _tmp) = build_state().await;
        let auth = bearer(&state, Uuid::new_v4());
        let app = app(state);

        create_and_delete(&app, &auth, "Kept").await;

        let (status, result) = send(
            app.clone(),
            "DELETE",
            "/api/trash/cleanup?olderThanDays=4294967295",
            Some(&auth),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(result["purgedCount"], 0);

        let (_, page) = send(app, "GET", "/api/trash", Some(&auth), None).await;
        assert_eq!(page["total"], 1);
    }

    #[tokio::test]
    async fn cleanup_defaults_to_retention() {
        let (state, _tmp) = build_state().await;
        let auth = bearer(&state, Uuid::new_v4());
        let app = app(state);

        create_and_delete(&app, &auth, "Recent").await;

        let (status, result) = send(app, "DELETE", "/api/trash/cleanup", Some(&auth), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(result["purgedCount"], 0);
    }
}
