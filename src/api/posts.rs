//! Post endpoints

use axum::{
    Router,
    extract::{Multipart, State},
    http::StatusCode,
    response::Json,
    routing::get,
};

use crate::AppState;
use crate::data::{Post, PostImage};
use crate::error::AppError;
use crate::storage::ImageFile;

const SUPPORTED_IMAGE_TYPES: [&str; 5] = [
    "image/jpeg",
    "image/png",
    "image/gif",
    "image/webp",
    "image/heic",
];

/// Routes:
/// - GET /api/posts - All posts, newest first
/// - POST /api/posts - Create a post (multipart: `image`, `description`)
pub fn posts_router() -> Router<AppState> {
    Router::new().route("/posts", get(list_posts).post(create_post))
}

/// GET /api/posts
async fn list_posts(State(state): State<AppState>) -> Result<Json<Vec<Post>>, AppError> {
    Ok(Json(state.journal.get_posts().await?))
}

/// POST /api/posts
///
/// In cloud mode the image is uploaded first and the post stores its URL.
/// In local mode the bytes stay in the post and preview through a `data:` URL.
async fn create_post(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<Post>), AppError> {
    let max_size = state.config.upload.max_image_bytes;
    let mut image: Option<ImageFile> = None;
    let mut description = String::new();

    while let Some(mut field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Failed to parse multipart: {}", e)))?
    {
        let field_name = field.name().unwrap_or("").to_string();

        match field_name.as_str() {
            "image" => {
                let content_type = field
                    .content_type()
                    .map(|s| s.to_string())
                    .ok_or(AppError::Validation(
                        "Missing content type for uploaded image".to_string(),
                    ))?;
                if !SUPPORTED_IMAGE_TYPES.contains(&content_type.as_str()) {
                    return Err(AppError::Validation(format!(
                        "Unsupported MIME type: {}",
                        content_type
                    )));
                }
                let file_name = field.file_name().unwrap_or("").to_string();

                let mut bytes = Vec::new();
                while let Some(chunk) = field
                    .chunk()
                    .await
                    .map_err(|e| AppError::Validation(format!("Failed to read image: {}", e)))?
                {
                    if bytes.len() + chunk.len() > max_size {
                        return Err(AppError::Validation(format!(
                            "Image too large: exceeds {} bytes",
                            max_size
                        )));
                    }
                    bytes.extend_from_slice(&chunk);
                }

                image = Some(ImageFile {
                    file_name,
                    content_type,
                    data: bytes,
                });
            }
            "description" => {
                description = field.text().await.map_err(|e| {
                    AppError::Validation(format!("Failed to read description: {}", e))
                })?;
            }
            _ => {}
        }
    }

    let image = image.ok_or(AppError::Validation("No image provided".to_string()))?;
    if image.data.is_empty() {
        return Err(AppError::Validation("Image is empty".to_string()));
    }

    let image_url = state.journal.upload_post_image(&image).await?;
    let post_image = match &image_url {
        Some(url) => PostImage::remote(url.clone()),
        None => PostImage::embedded(image.data, &image.content_type),
    };

    let post = Post::new(post_image, description.trim().to_string(), image_url);
    if let Err(error) = state.journal.save_post(&post).await {
        if let Some(url) = &post.image_url {
            tracing::warn!(
                post_id = %post.id,
                image_url = %url,
                %error,
                "Post not saved, uploaded image is orphaned"
            );
        }
        return Err(error);
    }

    Ok((StatusCode::CREATED, Json(post)))
}
