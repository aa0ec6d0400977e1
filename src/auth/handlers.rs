use crate::{
    auth::{jwt::generate_access_token, password::verify_password},
    config::Config,
    models::{LoginReqDto, LoginResponse},
    repository::user as user_repo,
};
use actix_web::{HttpResponse, Responder, web};
use serde_json::json;
use sqlx::MySqlPool;
use tracing::{debug, error, info, instrument};

fn invalid_credentials() -> HttpResponse {
    HttpResponse::Unauthorized().json(json!({
        "success": false,
        "message": "Invalid credentials"
    }))
}

#[utoipa::path(
    post,
    path = "/auth/login",
    tag = "Auth",
    request_body = LoginReqDto,
    responses(
        (status = 200, description = "Access token issued", body = LoginResponse),
        (status = 400, description = "Missing username or password"),
        (status = 401, description = "Invalid credentials or inactive account"),
        (status = 429, description = "Too many login attempts")
    )
)]
#[instrument(
    name = "auth_login",
    skip(pool, config, user),
    fields(username = %user.username)
)]
pub async fn login(
    user: web::Json<LoginReqDto>,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
) -> impl Responder {
    info!("Login request received");

    if user.username.trim().is_empty() || user.password.is_empty() {
        info!("Validation failed: empty username or password");
        return HttpResponse::BadRequest().json(json!({
            "success": false,
            "message": "Username and password are required"
        }));
    }

    let db_user = match user_repo::find_by_username(pool.get_ref(), user.username.trim()).await {
        Ok(Some(u)) => {
            debug!(user_id = u.id, "User found");
            u
        }
        Ok(None) => {
            info!("Invalid credentials: user not found");
            return invalid_credentials();
        }
        Err(e) => {
            error!(error = %e, "Database error while fetching user");
            return HttpResponse::InternalServerError().finish();
        }
    };

    if let Err(e) = verify_password(&user.password, &db_user.password) {
        info!(error = %e, "Invalid credentials: password mismatch");
        return invalid_credentials();
    }

    if !db_user.is_active {
        info!(user_id = db_user.id, "Login refused: account inactive");
        return HttpResponse::Unauthorized().json(json!({
            "success": false,
            "message": "Account is inactive"
        }));
    }

    let access_token = match generate_access_token(
        db_user.id,
        db_user.username.clone(),
        db_user.role_id,
        &config.jwt_secret,
        config.access_token_ttl,
    ) {
        Ok(t) => t,
        Err(e) => {
            error!(error = %e, "Failed to sign access token");
            return HttpResponse::InternalServerError().finish();
        }
    };

    // non-fatal
    if let Err(e) = user_repo::touch_last_login(pool.get_ref(), db_user.id).await {
        error!(error = %e, "Failed to update last_login_at");
    }

    info!(user_id = db_user.id, "Login successful");

    HttpResponse::Ok().json(LoginResponse {
        access_token,
        token_type: "Bearer".to_string(),
        expires_in: config.access_token_ttl,
    })
}
