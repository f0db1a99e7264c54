//! User service endpoints.

use axum::extract::{Query, State};
use axum::http::{HeaderMap, Method, StatusCode};
use axum::response::Response;
use serde::Serialize;

use crate::http::error::ApiError;
use crate::http::handlers::{parse_id, Params};
use crate::http::scope::{ok_json, RequestScope};
use crate::http::state::AppState;
use crate::store::{Post, User};

/// `GET /users?id=`
pub async fn get_user(
    State(state): State<AppState>,
    method: Method,
    headers: HeaderMap,
    Query(params): Query<Params>,
) -> Response {
    let scope = RequestScope::traced(&state, &method, "/users", &headers);
    let result = find_user(&state, &scope, &params).await.map(|user| ok_json(&user));
    scope.finish(result)
}

async fn find_user(state: &AppState, scope: &RequestScope, params: &Params) -> Result<User, ApiError> {
    let id = parse_id(params, "id", "user id")?;

    let mut span = scope.child_span("get_user");
    span.set_attribute("user.id", id);
    match state.store.user_by_id(id).await {
        Ok(Some(user)) => {
            span.set_status_ok();
            Ok(user)
        }
        Ok(None) => {
            span.set_attribute("user.found", false);
            Err(ApiError::NotFound("user"))
        }
        Err(e) => {
            span.record_error(format!("Failed to get user: {e}"), e.kind());
            Err(e.into())
        }
    }
}

#[derive(Debug, Serialize)]
struct UserPosts {
    user: User,
    posts: Vec<Post>,
}

/// `GET /users/posts?id=`: the user plus their posts from the post service.
pub async fn get_user_posts(
    State(state): State<AppState>,
    method: Method,
    headers: HeaderMap,
    Query(params): Query<Params>,
) -> Response {
    let scope = RequestScope::traced(&state, &method, "/users/posts", &headers);
    let result = user_with_posts(&state, &scope, &params).await.map(|body| ok_json(&body));
    scope.finish(result)
}

async fn user_with_posts(state: &AppState, scope: &RequestScope, params: &Params) -> Result<UserPosts, ApiError> {
    let user = find_user(state, scope, params).await?;

    let mut url = state
        .posts_by_user_url
        .clone()
        .ok_or(ApiError::Simulated {
            status: StatusCode::SERVICE_UNAVAILABLE,
            description: "post service is not configured",
            error_type: "configuration_error",
            body: "post service unavailable",
        })?;
    url.query_pairs_mut().append_pair("user_id", &user.id.to_string());

    let mut span = scope.child_span("fetch_user_posts");
    span.set_attribute("user.id", user.id);
    span.set_attribute("peer.service", "post-service");

    // The downstream request span is parented to the span timing the call.
    let fetched = state.client.get_json::<Vec<Post>>(url, Some(span.context())).await;
    match fetched {
        Ok(posts) => {
            span.set_attribute("posts.count", posts.len() as i64);
            span.set_status_ok();
            Ok(UserPosts { user, posts })
        }
        Err(e) => {
            span.record_error(e.to_string(), e.kind());
            Err(e.into())
        }
    }
}
