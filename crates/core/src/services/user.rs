//! User service.

use std::sync::LazyLock;

use chrono::Utc;
use followers_common::{AppError, AppResult, IdGenerator};
use followers_db::{
    entities::{profile, user},
    repositories::UserRepository,
};
use regex::Regex;
use sea_orm::Set;
use serde::Deserialize;
use validator::{Validate, ValidationError};

#[allow(clippy::expect_used)]
static USERNAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_]+$").expect("valid username pattern"));

/// Input for provisioning a user.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateUserInput {
    #[validate(
        length(min = 1, max = 128),
        regex(path = *USERNAME_RE),
        custom(function = "not_all_digits")
    )]
    pub username: String,

    #[validate(length(max = 255))]
    pub name: Option<String>,
}

/// Purely numeric usernames would be read as edge ids in `/followers/<key>/`.
fn not_all_digits(username: &str) -> Result<(), ValidationError> {
    if username.chars().all(|c| c.is_ascii_digit()) {
        return Err(ValidationError::new("numeric_username"));
    }
    Ok(())
}

/// User service for business logic.
#[derive(Clone)]
pub struct UserService {
    user_repo: UserRepository,
    id_gen: IdGenerator,
}

impl UserService {
    /// Create a new user service.
    #[must_use]
    pub const fn new(user_repo: UserRepository) -> Self {
        Self {
            user_repo,
            id_gen: IdGenerator::new(),
        }
    }

    /// Authenticate a user by bearer token.
    pub async fn authenticate_by_token(&self, token: &str) -> AppResult<user::Model> {
        self.user_repo
            .find_by_token(token)
            .await?
            .ok_or(AppError::Unauthorized)
    }

    /// Find a user by exact username.
    pub async fn find_by_username(&self, username: &str) -> AppResult<Option<user::Model>> {
        self.user_repo.find_by_username(username).await
    }

    /// Provision a user together with an empty profile.
    pub async fn create(&self, input: CreateUserInput) -> AppResult<user::Model> {
        input.validate()?;

        if self.user_repo.username_taken(&input.username).await? {
            return Err(AppError::Conflict(format!(
                "username {} is already taken",
                input.username
            )));
        }

        let now = Utc::now();
        let user_id = self.id_gen.generate();
        let model = user::ActiveModel {
            id: Set(user_id.clone()),
            username: Set(input.username.clone()),
            username_lower: Set(input.username.to_lowercase()),
            token: Set(Some(self.id_gen.generate_token())),
            created_at: Set(now.into()),
            updated_at: Set(None),
        };
        let profile = profile::ActiveModel {
            owner_id: Set(user_id),
            name: Set(input.name.unwrap_or_default()),
            content: Set(String::new()),
            created_at: Set(now.into()),
            updated_at: Set(None),
            ..Default::default()
        };
        let user = self.user_repo.create_with_profile(model, profile).await?;

        tracing::info!(user_id = %user.id, username = %user.username, "Created user");
        Ok(user)
    }
}
