//! Post service endpoints.

use axum::extract::{Query, State};
use axum::http::{HeaderMap, Method};
use axum::response::Response;

use crate::http::error::ApiError;
use crate::http::handlers::{parse_id, Params};
use crate::http::scope::{ok_json, RequestScope};
use crate::http::state::AppState;
use crate::store::Post;

/// `GET /posts?id=`
pub async fn get_post(
    State(state): State<AppState>,
    method: Method,
    headers: HeaderMap,
    Query(params): Query<Params>,
) -> Response {
    let scope = RequestScope::traced(&state, &method, "/posts", &headers);
    let result = find_post(&state, &scope, &params).await.map(|post| ok_json(&post));
    scope.finish(result)
}

async fn find_post(state: &AppState, scope: &RequestScope, params: &Params) -> Result<Post, ApiError> {
    let id = parse_id(params, "id", "post id")?;

    let mut span = scope.child_span("get_post");
    span.set_attribute("post.id", id);
    match state.store.post_by_id(id).await {
        Ok(Some(post)) => {
            span.set_status_ok();
            Ok(post)
        }
        Ok(None) => {
            span.set_attribute("post.found", false);
            Err(ApiError::NotFound("post"))
        }
        Err(e) => {
            span.record_error(format!("Failed to get post: {e}"), e.kind());
            Err(e.into())
        }
    }
}

/// `GET /posts/by-user?user_id=`, newest first. An unknown user has no posts.
pub async fn get_posts_by_user(
    State(state): State<AppState>,
    method: Method,
    headers: HeaderMap,
    Query(params): Query<Params>,
) -> Response {
    let scope = RequestScope::traced(&state, &method, "/posts/by-user", &headers);
    let result = posts_for_user(&state, &scope, &params).await.map(|posts| ok_json(&posts));
    scope.finish(result)
}

async fn posts_for_user(state: &AppState, scope: &RequestScope, params: &Params) -> Result<Vec<Post>, ApiError> {
    let user_id = parse_id(params, "user_id", "user_id")?;

    let mut span = scope.child_span("get_user_posts");
    span.set_attribute("user.id", user_id);
    match state.store.posts_by_user(user_id).await {
        Ok(posts) => {
            span.set_attribute("posts.count", posts.len() as i64);
            span.set_status_ok();
            Ok(posts)
        }
        Err(e) => {
            span.record_error(format!("Failed to get user posts: {e}"), e.kind());
            Err(e.into())
        }
    }
}
