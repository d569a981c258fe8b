use std::sync::Arc;

use rocket::http::Status;
use rocket::serde::json::Json;
use rocket::{get, post, State};
use serde::{Deserialize, Serialize};

use crate::auth::{self, AuthUser};
use crate::config::Config;
use crate::db::Db;
use crate::error::{AppError, ErrorBody};
use crate::models::Role;
use crate::store::{TenantRepo, UserRepo};

use super::bad_request;

#[derive(Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub tenant_name: String,
}

#[derive(Serialize)]
pub struct AuthResponse {
    pub token: String,
    pub tenant_id: String,
    pub user_id: String,
}

#[post("/auth/register", format = "json", data = "<input>")]
pub fn register(
    input: Json<RegisterRequest>,
    db: &State<Arc<Db>>,
    config: &State<Config>,
) -> Result<Json<AuthResponse>, (Status, Json<ErrorBody>)> {
    let input = input.into_inner();
    if input.password.len() < 8 {
        return Err(bad_request("password must be at least 8 characters"));
    }
    if !input.email.contains('@') {
        return Err(bad_request("email is not valid"));
    }

    let conn = db.conn.lock().unwrap();

    if UserRepo::find_by_email(&conn, &input.email)
        .map_err(AppError::into_response)?
        .is_some()
    {
        return Err(bad_request("email is already registered"));
    }

    let password_hash = auth::hash_password(&input.password).map_err(AppError::into_response)?;
    let user = UserRepo::create(&conn, &input.email, &password_hash).map_err(AppError::into_response)?;
    let tenant = TenantRepo::create(&conn, &input.tenant_name).map_err(AppError::into_response)?;
    TenantRepo::add_membership(&conn, &user.id, &tenant.id, Role::Owner).map_err(AppError::into_response)?;

    let token = auth::issue_token(config, &user.id, &tenant.id).map_err(AppError::into_response)?;

    Ok(Json(AuthResponse {
        token,
        tenant_id: tenant.id,
        user_id: user.id,
    }))
}

#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[post("/auth/login", format = "json", data = "<input>")]
pub fn login(
    input: Json<LoginRequest>,
    db: &State<Arc<Db>>,
    config: &State<Config>,
) -> Result<Json<AuthResponse>, (Status, Json<ErrorBody>)> {
    let input = input.into_inner();
    let conn = db.conn.lock().unwrap();

    let user = UserRepo::find_by_email(&conn, &input.email)
        .map_err(AppError::into_response)?
        .ok_or_else(|| AppError::Auth.into_response())?;

    if !auth::verify_password(&input.password, &user.password_hash) {
        return Err(AppError::Auth.into_response());
    }

    let tenant_id = TenantRepo::get_tenant_for_user(&conn, &user.id).map_err(AppError::into_response)?;
    let token = auth::issue_token(config, &user.id, &tenant_id).map_err(AppError::into_response)?;

    Ok(Json(AuthResponse {
        token,
        tenant_id,
        user_id: user.id,
    }))
}

#[derive(Serialize)]
pub struct MeResponse {
    pub user_id: String,
    pub tenant_id: String,
    pub email: String,
}

#[get("/auth/me")]
pub fn me(
    auth: AuthUser,
    db: &State<Arc<Db>>,
) -> Result<Json<MeResponse>, (Status, Json<ErrorBody>)> {
    let conn = db.conn.lock().unwrap();
    let user = UserRepo::get(&conn, &auth.user_id).map_err(AppError::into_response)?;
    Ok(Json(MeResponse {
        user_id: user.id,
        tenant_id: auth.tenant_id,
        email: user.email,
    }))
}
