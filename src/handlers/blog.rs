use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{instrument, trace};
use utoipa::ToSchema;

use crate::content::BlogPost;
use crate::helpers::errors::{not_found, ApiError};
use crate::schemas::{ApiResponse, AppState, ErrorResponse};

/// Listing entry for a blog post
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct PostSummary {
    pub slug: String,
    pub title: String,
    pub description: String,
    pub date: NaiveDate,
    pub tags: Vec<String>,
}

/// A blog post with its markdown body
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct PostResponse {
    #[serde(flatten)]
    pub summary: PostSummary,
    pub body: String,
}

impl From<&BlogPost> for PostSummary {
    fn from(post: &BlogPost) -> Self {
        Self {
            slug: post.slug.clone(),
            title: post.title.clone(),
            description: post.description.clone(),
            date: post.date,
            tags: post.tags.clone(),
        }
    }
}

/// Published blog posts, newest first
#[utoipa::path(
    get,
    path = "/api/blog",
    tag = "blog",
    responses(
        (status = 200, description = "Posts retrieved successfully", body = ApiResponse<Vec<PostSummary>>)
    )
)]
#[instrument(skip(state))]
pub async fn get_posts(State(state): State<AppState>) -> (StatusCode, Json<ApiResponse<Vec<PostSummary>>>) {
    trace!("Entering get_posts function");
    let posts = state.content.posts().iter().map(PostSummary::from).collect();
    (StatusCode::OK, Json(ApiResponse::ok(posts, "Posts retrieved successfully")))
}

/// One blog post
#[utoipa::path(
    get,
    path = "/api/blog/{slug}",
    tag = "blog",
    params(
        ("slug" = String, Path, description = "Post slug")
    ),
    responses(
        (status = 200, description = "Post retrieved successfully", body = ApiResponse<PostResponse>),
        (status = 404, description = "Post not found", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn get_post(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<(StatusCode, Json<ApiResponse<PostResponse>>), ApiError> {
    trace!("Entering get_post function");
    let post = state
        .content
        .post(&slug)
        .ok_or_else(|| not_found("Post", &slug))?;

    let response = PostResponse {
        summary: PostSummary::from(post),
        body: post.body.clone(),
    };
    Ok((StatusCode::OK, Json(ApiResponse::ok(response, "Post retrieved successfully"))))
}
