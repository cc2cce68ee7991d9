use super::{incomplete, optional_text, required_text};
use crate::error::{run_blocking, ApiError, ApiJson};
use crate::state::AppState;
use api_shared::{CreatedRes, LoginReq, LoginRes, MessageRes, SignupReq};
use axum::{extract::State, http::StatusCode, response::Json};
use skinhub_core::validation::sanitize_text;
use skinhub_core::{NewUser, NonEmptyText, Role, UserService};

#[utoipa::path(
    post,
    path = "/auth/signup",
    request_body = SignupReq,
    responses(
        (status = 201, description = "User created", body = CreatedRes),
        (status = 400, description = "Incomplete data or email already registered", body = MessageRes),
        (status = 503, description = "Store unavailable", body = MessageRes)
    )
)]
/// Register a new account
///
/// `role` defaults to `user`. Doctors get an empty doctor profile alongside the account.
#[axum::debug_handler]
pub async fn signup(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<SignupReq>,
) -> Result<(StatusCode, Json<CreatedRes>), ApiError> {
    let email = required_text(req.email)?;
    let password = required_text(req.password)?;
    let name = required_text(req.name)?;
    let full_name = NonEmptyText::new(sanitize_text(name.as_str())).map_err(|_| incomplete())?;

    let role = match optional_text(req.role) {
        Some(role) => role.parse::<Role>()?,
        None => Role::default(),
    };

    let new_user = NewUser {
        email: email.into_string(),
        password,
        full_name,
        phone: optional_text(req.phone).map(|p| sanitize_text(&p)),
        role,
    };
    let users = UserService::new(state.cfg.clone());
    let id = run_blocking(move || {
        users
            .signup(new_user)
            .map_err(|e| ApiError::from_core(e, "Unable to create user."))
    })
    .await?;

    Ok((
        StatusCode::CREATED,
        Json(CreatedRes {
            message: "User created successfully.".into(),
            id,
        }),
    ))
}

#[utoipa::path(
    post,
    path = "/auth/login",
    request_body = LoginReq,
    responses(
        (status = 200, description = "Credentials accepted", body = LoginRes),
        (status = 400, description = "Incomplete data", body = MessageRes),
        (status = 401, description = "Unknown email or wrong password", body = MessageRes)
    )
)]
/// Check credentials and return the identity the client keeps
///
/// The server holds no session. Clients store the returned user and send its `id` with later
/// requests.
#[axum::debug_handler]
pub async fn login(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<LoginReq>,
) -> Result<Json<LoginRes>, ApiError> {
    let email = required_text(req.email)?;
    let password = required_text(req.password)?;

    let users = UserService::new(state.cfg.clone());
    let user = run_blocking(move || Ok(users.login(email.as_str(), password.as_str())?)).await?;
    tracing::info!(user_id = user.id, role = %user.role, "login");

    Ok(Json(LoginRes {
        message: "Login successful.".into(),
        user,
    }))
}
