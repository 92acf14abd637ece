use serde::{Deserialize, Serialize};

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub uptime_secs: u64,
}

#[derive(Serialize, Deserialize)]
pub struct ErrorResponse {
    pub message: String,
}

#[derive(Serialize, Deserialize)]
pub struct ItemResponse {
    pub id: i64,
    pub title: String,
    pub image_url: String,
}

#[derive(Serialize, Deserialize)]
pub struct PointResponse {
    pub id: i64,
    pub image: String,
    pub image_url: String,
    pub name: String,
    pub email: String,
    pub whatsapp: String,
    pub latitude: f64,
    pub longitude: f64,
    pub city: String,
    pub uf: String,
}

#[derive(Serialize, Deserialize)]
pub struct ItemTitle {
    pub title: String,
}

#[derive(Serialize, Deserialize)]
pub struct PointDetailResponse {
    pub point: PointResponse,
    pub items: Vec<ItemTitle>,
}

/// Query string of `GET /points`. Absent parameters behave as empty
/// strings, which match no stored point.
#[derive(Deserialize)]
pub struct ListPointsQuery {
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub uf: String,
    #[serde(default)]
    pub items: String,
}
