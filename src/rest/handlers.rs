use axum::{
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use url::Url;

use crate::{
    points::{self, PointError, Registration},
    storage::{
        traits::{Item, Point},
        Storage,
    },
};

use super::{
    models::{
        ErrorResponse, HealthResponse, ItemResponse, ItemTitle, ListPointsQuery,
        PointDetailResponse, PointResponse,
    },
    AppState,
};

pub async fn health<S: Storage + Clone + Send + Sync + 'static>(
    State(state): State<AppState<S>>,
) -> impl IntoResponse {
    let uptime_secs = state.started_at.elapsed().map(|d| d.as_secs()).unwrap_or(0);
    (
        StatusCode::OK,
        Json(HealthResponse {
            status: "ok",
            uptime_secs,
        }),
    )
}

pub async fn list_items<S: Storage + Clone + Send + Sync + 'static>(
    State(state): State<AppState<S>>,
) -> impl IntoResponse {
    match state.storage.list_items() {
        Ok(items) => Json(
            items
                .into_iter()
                .map(|item| item_to_response(item, &state.public_url))
                .collect::<Vec<_>>(),
        )
        .into_response(),
        Err(err) => {
            log::error!("Failed to list items: {:?}", err);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

pub async fn list_points<S: Storage + Clone + Send + Sync + 'static>(
    State(state): State<AppState<S>>,
    Query(query): Query<ListPointsQuery>,
) -> impl IntoResponse {
    match points::list(&state.storage, &query.city, &query.uf, &query.items) {
        Ok(found) => Json(
            found
                .into_iter()
                .map(|point| point_to_response(point, &state.public_url))
                .collect::<Vec<_>>(),
        )
        .into_response(),
        Err(err @ PointError::MalformedInput { .. }) => {
            log::warn!("Rejected point listing: {}", err);
            (
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse {
                    message: err.to_string(),
                }),
            )
                .into_response()
        }
        Err(err) => {
            log::error!("Failed to list points: {:?}", err);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

pub async fn get_point<S: Storage + Clone + Send + Sync + 'static>(
    State(state): State<AppState<S>>,
    Path(id): Path<i64>,
) -> impl IntoResponse {
    match points::get(&state.storage, id) {
        Ok((point, titles)) => Json(PointDetailResponse {
            point: point_to_response(point, &state.public_url),
            items: titles
                .into_iter()
                .map(|title| ItemTitle { title })
                .collect(),
        })
        .into_response(),
        Err(PointError::NotFound(_)) => (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                message: "Point not found".to_string(),
            }),
        )
            .into_response(),
        Err(err) => {
            log::error!("Failed to load point {}: {:?}", id, err);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

pub async fn create_point<S: Storage + Clone + Send + Sync + 'static>(
    State(state): State<AppState<S>>,
    mut multipart: Multipart,
) -> impl IntoResponse {
    let mut submission = Registration::default();
    let mut image: Option<(String, axum::body::Bytes)> = None;

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(err) => {
                log::warn!("Invalid multipart payload: {}", err);
                return bad_multipart();
            }
        };
        let Some(name) = field.name().map(str::to_string) else {
            continue;
        };

        if name == "image" {
            let file_name = field.file_name().unwrap_or("upload").to_string();
            match field.bytes().await {
                Ok(data) => image = Some((file_name, data)),
                Err(err) => {
                    log::warn!("Invalid image part: {}", err);
                    return bad_multipart();
                }
            }
            continue;
        }

        let value = match field.text().await {
            Ok(value) => value,
            Err(err) => {
                log::warn!("Invalid form field {}: {}", name, err);
                return bad_multipart();
            }
        };
        match name.as_str() {
            "name" => submission.name = Some(value),
            "email" => submission.email = Some(value),
            "whatsapp" => submission.whatsapp = Some(value),
            "latitude" => submission.latitude = Some(value),
            "longitude" => submission.longitude = Some(value),
            "city" => submission.city = Some(value),
            "uf" => submission.uf = Some(value),
            "items" => submission.items = Some(value),
            _ => {}
        }
    }

    if let Some((file_name, data)) = image {
        match state.uploads.save(&file_name, &data) {
            Ok(stored) => submission.image = Some(stored),
            Err(err) => {
                log::error!("Failed to store uploaded image: {}", err);
                return StatusCode::INTERNAL_SERVER_ERROR.into_response();
            }
        }
    }

    match points::register(&state.storage, submission) {
        Ok(point) => Json(point_to_response(point, &state.public_url)).into_response(),
        Err(err @ PointError::MissingField(_)) => {
            log::warn!("Rejected point registration: {}", err);
            (StatusCode::NOT_FOUND, err.to_string()).into_response()
        }
        Err(err @ PointError::MalformedInput { .. }) => {
            log::warn!("Rejected point registration: {}", err);
            (
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse {
                    message: err.to_string(),
                }),
            )
                .into_response()
        }
        Err(err) => {
            // The cause stays in the log; callers get a fixed message.
            log::error!("Failed to store point: {:?}", err);
            (
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse {
                    message: err.to_string(),
                }),
            )
                .into_response()
        }
    }
}

pub async fn not_found() -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorResponse {
            message: "endpoint not found".to_string(),
        }),
    )
}

fn bad_multipart() -> axum::response::Response {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorResponse {
            message: "invalid multipart payload".to_string(),
        }),
    )
        .into_response()
}

fn image_url(base: &Url, filename: &str) -> String {
    format!("{}/uploads/{}", base.as_str().trim_end_matches('/'), filename)
}

fn item_to_response(item: Item, base: &Url) -> ItemResponse {
    ItemResponse {
        id: item.id,
        title: item.title,
        image_url: image_url(base, &item.image),
    }
}

fn point_to_response(point: Point, base: &Url) -> PointResponse {
    PointResponse {
        id: point.id,
        image_url: image_url(base, &point.image),
        image: point.image,
        name: point.name,
        email: point.email,
        whatsapp: point.whatsapp,
        latitude: point.latitude,
        longitude: point.longitude,
        city: point.city,
        uf: point.uf,
    }
}
