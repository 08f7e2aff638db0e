//! Avatar and cover image uploads.

use axum::extract::{Multipart, State};
use axum::{Extension, Json};
use validator::{ValidationError, ValidationErrors};

use crate::error::Result;
use crate::user::User;
use crate::AppState;

const MAX_IMAGE_BYTES: usize = 2 * 1024 * 1024;

fn missing_field(name: &'static str) -> ValidationErrors {
    let mut errors = ValidationErrors::new();
    errors.add(
        name,
        ValidationError::new("missing_file")
            .with_message("Image file part is required.".into()),
    );
    errors
}

fn oversized_field(name: &'static str) -> ValidationErrors {
    let mut errors = ValidationErrors::new();
    errors.add(
        name,
        ValidationError::new("oversized_file")
            .with_message("Image exceeds the size limit.".into()),
    );
    errors
}

async fn read_image(
    mut multipart: Multipart,
    field_name: &'static str,
) -> Result<Vec<u8>> {
    while let Some(field) = multipart.next_field().await? {
        if field.name() == Some(field_name) {
            let data = field.bytes().await?;
            if data.is_empty() {
                break;
            }
            if data.len() > MAX_IMAGE_BYTES {
                return Err(oversized_field(field_name).into());
            }
            return Ok(data.to_vec());
        }
    }

    Err(missing_field(field_name).into())
}

/// Handler to replace the authenticated account's avatar.
pub async fn avatar(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    multipart: Multipart,
) -> Result<Json<User>> {
    let buffer = read_image(multipart, "avatar").await?;
    let url = state.storage.upload(&buffer).await?;

    Ok(Json(state.store.set_avatar(&user.id, &url).await?))
}

/// Handler to replace the authenticated account's cover image.
pub async fn cover(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    multipart: Multipart,
) -> Result<Json<User>> {
    let buffer = read_image(multipart, "coverImage").await?;
    let url = state.storage.upload(&buffer).await?;

    Ok(Json(state.store.set_cover_image(&user.id, &url).await?))
}
