use rocket::get;
use rocket::serde::json::Json;

#[get("/health")]
pub fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({"status": "ok"}))
}
