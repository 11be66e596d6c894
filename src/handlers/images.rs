use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    response::Json,
};
use common::CenterImageDto;
use listing::{centers, images};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, instrument, trace, warn};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::auth::{AuthUser, Capability};
use crate::helpers::errors::{api_error, bad_request, from_listing, not_found, ApiError};
use crate::schemas::{ApiResponse, AppState, ErrorResponse};
use crate::storage::{image_extension, ObjectStorage, MAX_IMAGE_BYTES};

/// New image order for a center
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReorderImagesRequest {
    /// Every active image id of the center, in the desired order
    pub image_ids: Vec<String>,
}

/// A center image with its public URL
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ImageResponse {
    pub id: String,
    pub storage_key: String,
    pub display_order: i32,
    pub url: String,
}

fn with_url(storage: &dyn ObjectStorage, image: CenterImageDto) -> ImageResponse {
    ImageResponse {
        url: storage.public_url(&image.storage_key),
        id: image.id,
        storage_key: image.storage_key,
        display_order: image.display_order,
    }
}

/// Reorder the active images of a center
#[utoipa::path(
    put,
    path = "/api/centers/{id}/images/reorder",
    tag = "images",
    params(
        ("id" = String, Path, description = "Center id")
    ),
    request_body = ReorderImagesRequest,
    responses(
        (status = 200, description = "Images reordered", body = ApiResponse<Vec<ImageResponse>>),
        (status = 400, description = "The list is not a permutation of the active images", body = ErrorResponse),
        (status = 401, description = "Not signed in", body = ErrorResponse),
        (status = 403, description = "Missing permission", body = ErrorResponse),
        (status = 404, description = "Center not found", body = ErrorResponse)
    )
)]
#[instrument(skip(state, user), fields(user_id = user.user_id))]
pub async fn reorder_images(
    State(state): State<AppState>,
    user: AuthUser,
    Path(center_id): Path<String>,
    Json(request): Json<ReorderImagesRequest>,
) -> Result<(StatusCode, Json<ApiResponse<Vec<ImageResponse>>>), ApiError> {
    trace!("Entering reorder_images function");
    user.require(Capability::ManageImages)?;

    let reordered = images::reorder_images(&state.db, &center_id, &request.image_ids)
        .await
        .map_err(from_listing)?;

    info!("Reordered {} images of center {}", reordered.len(), center_id);
    let data = reordered
        .into_iter()
        .map(|image| with_url(state.storage.as_ref(), image))
        .collect();
    Ok((StatusCode::OK, Json(ApiResponse::ok(data, "Images reordered successfully"))))
}

/// Upload an image for a center
///
/// Multipart form with a single `file` field. The image is appended after the
/// existing ones.
#[utoipa::path(
    post,
    path = "/api/admin/centers/{id}/images",
    tag = "images",
    params(
        ("id" = String, Path, description = "Center id")
    ),
    responses(
        (status = 201, description = "Image uploaded", body = ApiResponse<ImageResponse>),
        (status = 400, description = "Missing file or unsupported type", body = ErrorResponse),
        (status = 401, description = "Not signed in", body = ErrorResponse),
        (status = 403, description = "Missing permission", body = ErrorResponse),
        (status = 404, description = "Center not found", body = ErrorResponse),
        (status = 413, description = "File larger than 10 MB", body = ErrorResponse)
    )
)]
#[instrument(skip(state, user, multipart), fields(user_id = user.user_id))]
pub async fn upload_image(
    State(state): State<AppState>,
    user: AuthUser,
    Path(center_id): Path<String>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<ApiResponse<ImageResponse>>), ApiError> {
    trace!("Entering upload_image function");
    user.require(Capability::ManageImages)?;

    let center = centers::find_center_model(&state.db, &center_id)
        .await
        .map_err(from_listing)?
        .ok_or_else(|| not_found("Center", &center_id))?;

    let mut upload: Option<(String, Vec<u8>)> = None;
    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() != Some("file") {
            debug!("Ignoring multipart field {:?}", field.name());
            continue;
        }
        let file_name = field.file_name().unwrap_or_default().to_string();
        let bytes = field.bytes().await.map_err(multipart_error)?;
        upload = Some((file_name, bytes.to_vec()));
        break;
    }

    let (file_name, bytes) = upload.ok_or_else(|| bad_request("Missing 'file' field"))?;
    if bytes.is_empty() {
        return Err(bad_request("Uploaded file is empty"));
    }
    if bytes.len() > MAX_IMAGE_BYTES {
        return Err(too_large());
    }
    let extension = image_extension(&file_name).ok_or_else(|| {
        bad_request("Only png, jpg, jpeg and webp images are accepted")
    })?;

    let key = format!("centers/{}/{}.{}", center.id, Uuid::new_v4(), extension);
    state.storage.put(&key, &bytes).await.map_err(|e| {
        error!("Failed to store upload for center {}: {}", center.id, e);
        api_error(StatusCode::INTERNAL_SERVER_ERROR, "STORAGE_ERROR", "Failed to store image")
    })?;

    let image = match images::add_image(&state.db, &center.id, &key).await {
        Ok(image) => image,
        Err(e) => {
            if let Err(cleanup) = state.storage.delete(&key).await {
                warn!("Failed to remove orphaned upload {}: {}", key, cleanup);
            }
            return Err(from_listing(e));
        }
    };

    info!("Uploaded image {} for center {}", image.id, center.id);
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok(
            with_url(state.storage.as_ref(), image),
            "Image uploaded successfully",
        )),
    ))
}

/// Hide an image of a center
#[utoipa::path(
    delete,
    path = "/api/admin/centers/{id}/images/{image_id}",
    tag = "images",
    params(
        ("id" = String, Path, description = "Center id"),
        ("image_id" = String, Path, description = "Image id")
    ),
    responses(
        (status = 200, description = "Image deactivated, remaining images returned", body = ApiResponse<Vec<ImageResponse>>),
        (status = 401, description = "Not signed in", body = ErrorResponse),
        (status = 403, description = "Missing permission", body = ErrorResponse),
        (status = 404, description = "Center or image not found", body = ErrorResponse)
    )
)]
#[instrument(skip(state, user), fields(user_id = user.user_id))]
pub async fn deactivate_image(
    State(state): State<AppState>,
    user: AuthUser,
    Path((center_id, image_id)): Path<(String, String)>,
) -> Result<(StatusCode, Json<ApiResponse<Vec<ImageResponse>>>), ApiError> {
    trace!("Entering deactivate_image function");
    user.require(Capability::ManageImages)?;

    let remaining = images::deactivate_image(&state.db, &center_id, &image_id)
        .await
        .map_err(from_listing)?;

    let data = remaining
        .into_iter()
        .map(|image| with_url(state.storage.as_ref(), image))
        .collect();
    Ok((StatusCode::OK, Json(ApiResponse::ok(data, "Image deactivated successfully"))))
}

fn too_large() -> ApiError {
    api_error(
        StatusCode::PAYLOAD_TOO_LARGE,
        "FILE_TOO_LARGE",
        "Images are limited to 10 MB",
    )
}

fn multipart_error(err: axum::extract::multipart::MultipartError) -> ApiError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        return too_large();
    }
    warn!("Malformed multipart upload: {}", err);
    bad_request(format!("Malformed upload: {}", err.body_text()))
}
