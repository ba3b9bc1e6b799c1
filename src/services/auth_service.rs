use bcrypt::{hash, verify};
use diesel::prelude::*;
use uuid::Uuid;

use crate::{
    db::enums::UserRole,
    db::models::api::error_codes,
    db::models::user::{
        LoginRequest, LoginResponse, NewUser, RefreshTokenResponse, RegisterRequest,
        UpdateUserRequest, User, VerifyAccountRequest,
    },
    db::repositories::UserRepo,
    error::{AppError, AppResult},
    middleware::auth::{IssuedToken, RefreshClaims, TokenService},
    services::context::RequestContext,
};

pub struct AuthService;

/// `john.doe@example.com` -> `john.doe`
pub fn username_from_email(email: &str) -> String {
    email
        .split('@')
        .next()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or("user")
        .to_string()
}

impl AuthService {
    pub fn register(
        conn: &mut PgConnection,
        req: &RegisterRequest,
        bcrypt_cost: u32,
    ) -> AppResult<User> {
        let email = req.email.trim().to_lowercase();

        if UserRepo::exists_by_email(conn, &email)? {
            return Err(AppError::conflict_with_code(
                "Email already exists",
                Some("email".to_string()),
                error_codes::USER_EMAIL_EXISTS,
            ));
        }

        // local part collisions get a short random suffix
        let mut username = username_from_email(&email);
        if UserRepo::exists_by_username(conn, &username)? {
            let suffix = Uuid::new_v4().simple().to_string();
            username = format!("{}-{}", username, &suffix[..6]);
        }

        let password_hash = hash(&req.password, bcrypt_cost)?;

        let new_user = NewUser {
            email,
            display_name: username.clone(),
            username,
            password_hash,
            role: UserRole::Client,
            is_active: false,
            verify_token: Some(Uuid::new_v4().to_string()),
        };

        let user = UserRepo::insert(conn, &new_user)?;
        tracing::info!(user_id = %user.id, "User registered");
        Ok(user)
    }

    pub fn verify_account(conn: &mut PgConnection, req: &VerifyAccountRequest) -> AppResult<User> {
        let email = req.email.trim().to_lowercase();
        let user = UserRepo::find_by_email(conn, &email)?
            .ok_or_else(|| AppError::not_found("Account"))?;

        if user.is_active {
            return Err(AppError::not_acceptable("Your account is already active!"));
        }
        if user.verify_token.as_deref() != Some(req.token.as_str()) {
            return Err(AppError::not_acceptable("Token is invalid!"));
        }

        let user = UserRepo::activate(conn, user.id)?;
        tracing::info!(user_id = %user.id, "User verified");
        Ok(user)
    }

    /// Returns the login payload plus the refresh token lifetime for the cookies.
    pub fn login(
        conn: &mut PgConnection,
        tokens: &TokenService,
        req: &LoginRequest,
    ) -> AppResult<(LoginResponse, IssuedToken)> {
        let email = req.email.trim().to_lowercase();
        let user = UserRepo::find_by_email(conn, &email)?
            .ok_or_else(|| AppError::not_found("Account"))?;

        if !user.is_active {
            return Err(AppError::not_acceptable(
                "Your account is not active! Please verify your email",
            ));
        }
        if !verify(&req.password, &user.password_hash)? {
            return Err(AppError::not_acceptable("Your email or password is incorrect!"));
        }

        let access = tokens.generate_access_token(user.id, &user.email)?;
        let refresh = tokens.generate_refresh_token(user.id)?;
        tracing::info!(user_id = %user.id, "User logged in");

        Ok((
            LoginResponse {
                access_token: access.token,
                refresh_token: refresh.token.clone(),
                token_type: "Bearer".to_string(),
                expires_in: access.expires_in,
                user,
            },
            refresh,
        ))
    }

    pub fn refresh(
        conn: &mut PgConnection,
        tokens: &TokenService,
        claims: &RefreshClaims,
    ) -> AppResult<RefreshTokenResponse> {
        let user = UserRepo::find_by_id(conn, claims.sub)?
            .filter(|u| u.is_active)
            .ok_or_else(|| AppError::forbidden("Please sign in! (Error from refresh token)"))?;

        let access = tokens.generate_access_token(user.id, &user.email)?;
        Ok(RefreshTokenResponse {
            access_token: access.token,
            token_type: "Bearer".to_string(),
            expires_in: access.expires_in,
        })
    }

    pub fn profile(conn: &mut PgConnection, ctx: &RequestContext) -> AppResult<User> {
        UserRepo::find_by_id(conn, ctx.user_id)?.ok_or_else(|| AppError::not_found("User"))
    }

    pub fn update(
        conn: &mut PgConnection,
        ctx: &RequestContext,
        req: &UpdateUserRequest,
        bcrypt_cost: u32,
    ) -> AppResult<User> {
        if req.display_name.is_none() && req.new_password.is_none() {
            return Err(AppError::validation("Nothing to update"));
        }

        let user = Self::profile(conn, ctx)?;

        let new_password_hash = match &req.new_password {
            Some(new_password) => {
                let current = req.current_password.as_deref().ok_or_else(|| {
                    AppError::validation("current_password is required to change the password")
                })?;
                if !verify(current, &user.password_hash)? {
                    return Err(AppError::not_acceptable("Your current password is incorrect!"));
                }
                Some(hash(new_password, bcrypt_cost)?)
            }
            None => None,
        };

        let display_name = req.display_name.as_ref().map(|n| n.trim().to_string());
        let user = UserRepo::update_profile(conn, user.id, display_name, new_password_hash)?;
        tracing::info!(user_id = %user.id, "User profile updated");
        Ok(user)
    }

    /// Stores the new avatar and returns the public id of the one it replaced.
    pub fn set_avatar(
        conn: &mut PgConnection,
        ctx: &RequestContext,
        url: &str,
        public_id: &str,
    ) -> AppResult<(User, Option<String>)> {
        let user = Self::profile(conn, ctx)?;
        let previous = user.avatar_public_id.clone();
        let user = UserRepo::update_avatar(conn, user.id, url, public_id)?;
        Ok((user, previous))
    }
}
