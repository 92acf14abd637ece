//! Collection-point registration and lookup.
//!
//! All validation runs before the first write: a failed registration never
//! leaves a partial point behind. Writes go through a single storage
//! transaction so the point row and its item associations land together or
//! not at all.

use thiserror::Error;

use crate::storage::traits::{NewPoint, Point, Storage, StorageRead, StorageTx, StorageWrite};

#[derive(Debug, Error)]
pub enum PointError {
    #[error("missing required field: {0}")]
    MissingField(&'static str),
    #[error("invalid {field}: {reason}")]
    MalformedInput {
        field: &'static str,
        reason: String,
    },
    #[error("point {0} not found")]
    NotFound(i64),
    /// The cause stays internal; callers only ever see the fixed message.
    #[error("could not store collection point")]
    Persistence(anyhow::Error),
}

/// Registration submission as it arrives from transport. Every field is
/// optional so absence can be told apart from an empty value.
#[derive(Clone, Debug, Default)]
pub struct Registration {
    pub name: Option<String>,
    pub email: Option<String>,
    pub whatsapp: Option<String>,
    pub latitude: Option<String>,
    pub longitude: Option<String>,
    pub city: Option<String>,
    pub uf: Option<String>,
    /// Stored filename of the already-persisted upload.
    pub image: Option<String>,
    /// Comma-separated item ids, e.g. `"1,2,6"`.
    pub items: Option<String>,
}

/// Keeps only digit characters, so `"(11) 99999-9999"` stores as
/// `"11999999999"`.
pub fn normalize_whatsapp(raw: &str) -> String {
    raw.chars().filter(|c| c.is_ascii_digit()).collect()
}

/// Parses the comma-separated item-id list. Any token that is not a
/// positive integer rejects the whole submission, as does an empty list.
/// Duplicate ids collapse to one.
pub fn parse_item_ids(raw: &str) -> Result<Vec<i64>, PointError> {
    let mut ids = Vec::new();
    for token in raw.split(',') {
        let token = token.trim();
        let id: i64 = token.parse().map_err(|_| PointError::MalformedInput {
            field: "items",
            reason: format!("{token:?} is not an item id"),
        })?;
        if id < 1 {
            return Err(PointError::MalformedInput {
                field: "items",
                reason: format!("{id} is not a positive item id"),
            });
        }
        if !ids.contains(&id) {
            ids.push(id);
        }
    }
    Ok(ids)
}

fn require(value: Option<String>, field: &'static str) -> Result<String, PointError> {
    value.ok_or(PointError::MissingField(field))
}

fn parse_coordinate(value: Option<String>, field: &'static str) -> Result<f64, PointError> {
    let raw = value.ok_or(PointError::MalformedInput {
        field,
        reason: "field missing".to_string(),
    })?;
    raw.trim().parse().map_err(|_| PointError::MalformedInput {
        field,
        reason: format!("{raw:?} is not a number"),
    })
}

fn require_text(value: Option<String>, field: &'static str) -> Result<String, PointError> {
    value.ok_or(PointError::MalformedInput {
        field,
        reason: "field missing".to_string(),
    })
}

/// Validates a submission and persists the point together with one
/// association row per selected item, atomically.
pub fn register<S: Storage>(storage: &S, submission: Registration) -> Result<Point, PointError> {
    let name = require(submission.name, "name")?;
    let email = require(submission.email, "email")?;
    let whatsapp = require(submission.whatsapp, "whatsapp")?;

    let latitude = parse_coordinate(submission.latitude, "latitude")?;
    let longitude = parse_coordinate(submission.longitude, "longitude")?;
    let city = require_text(submission.city, "city")?;
    let uf = require_text(submission.uf, "uf")?;
    let image = require_text(submission.image, "image")?;
    let item_ids = parse_item_ids(submission.items.as_deref().unwrap_or(""))?;

    let candidate = NewPoint {
        image,
        name,
        email,
        whatsapp: normalize_whatsapp(&whatsapp),
        latitude,
        longitude,
        city,
        uf,
    };

    // Any error below drops the transaction, which rolls back every insert.
    let tx = storage.begin_tx().map_err(PointError::Persistence)?;
    let id = tx.insert_point(&candidate).map_err(PointError::Persistence)?;
    for item_id in &item_ids {
        tx.insert_point_item(id, *item_id)
            .map_err(PointError::Persistence)?;
    }
    tx.commit().map_err(PointError::Persistence)?;

    Ok(Point {
        id,
        image: candidate.image,
        name: candidate.name,
        email: candidate.email,
        whatsapp: candidate.whatsapp,
        latitude: candidate.latitude,
        longitude: candidate.longitude,
        city: candidate.city,
        uf: candidate.uf,
    })
}

/// Stored point plus the titles of its associated items.
pub fn get<S: StorageRead>(storage: &S, id: i64) -> Result<(Point, Vec<String>), PointError> {
    let point = storage
        .load_point(id)
        .map_err(PointError::Persistence)?
        .ok_or(PointError::NotFound(id))?;
    let titles = storage
        .list_point_item_titles(id)
        .map_err(PointError::Persistence)?;
    Ok((point, titles))
}

/// Distinct points in `city`/`uf` accepting at least one of the requested
/// items. `items` is the transport form, parsed with the same rules as
/// registration.
pub fn list<S: StorageRead>(
    storage: &S,
    city: &str,
    uf: &str,
    items: &str,
) -> Result<Vec<Point>, PointError> {
    let item_ids = parse_item_ids(items)?;
    storage
        .list_points(city, uf, &item_ids)
        .map_err(PointError::Persistence)
}
