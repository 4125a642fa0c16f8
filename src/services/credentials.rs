//! Credential service
//!
//! Signup, sign-in and Google login. Every successful call ends with a
//! signed session token; every failure is one `CredentialError` kind whose
//! message is shown to the user as is.
//!
//! Uniqueness of usernames and emails is enforced by the store, so two
//! concurrent signups for the same email end with one `Conflict`.

use crate::db::repositories::{CreateUserError, UserRepository};
use crate::models::{DuplicateField, User};
use crate::services::password::{hash_password, verify_password, DEFAULT_COST};
use crate::services::token::{issue_token, Claims, TokenConfig};
use anyhow::Context;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

const MSG_MISSING_FIELDS: &str = "Bitte alle Felder ausfüllen.";
const MSG_EMAIL_REGISTERED: &str = "Benutzer mit dieser E-Mail existiert bereits.";
const MSG_USERNAME_TAKEN: &str = "Benutzername existiert bereits.";
const MSG_EMAIL_TAKEN: &str = "E-Mail existiert bereits.";
const MSG_USER_NOT_FOUND: &str = "Benutzer wurde nicht gefunden.";
const MSG_INVALID_PASSWORD: &str = "Ungültiges Passwort";
const MSG_EMAIL_REQUIRED: &str = "E-Mail ist erforderlich.";

/// Error types for credential operations
#[derive(Debug, thiserror::Error)]
pub enum CredentialError {
    /// Missing or empty input
    #[error("{0}")]
    Validation(String),

    /// Username or email already in use
    #[error("{0}")]
    Conflict(String),

    /// No account for this email
    #[error("{0}")]
    NotFound(String),

    /// Password does not match
    #[error("{0}")]
    InvalidCredentials(String),

    /// Store, hashing or signing failure
    #[error("Internal error: {0}")]
    Unexpected(#[from] anyhow::Error),
}

/// Signup request body. Fields are optional so a missing field is a
/// validation error rather than a rejected body.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SignupInput {
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

impl SignupInput {
    pub fn new(
        username: impl Into<String>,
        email: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            username: Some(username.into()),
            email: Some(email.into()),
            password: Some(password.into()),
        }
    }
}

/// Sign-in request body
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SigninInput {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

impl SigninInput {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: Some(email.into()),
            password: Some(password.into()),
        }
    }
}

/// Google login request body, as sent by the browser after the Google popup
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GoogleInput {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub google_photo_url: Option<String>,
}

/// A user record together with a freshly issued session token.
///
/// Serializes flat: the user fields plus `token`.
#[derive(Debug, Clone, Serialize)]
pub struct AuthOutcome {
    #[serde(flatten)]
    pub user: User,
    pub token: String,
}

/// Credential service
pub struct CredentialService {
    users: Arc<dyn UserRepository>,
    tokens: TokenConfig,
    bcrypt_cost: u32,
}

fn required(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

impl CredentialService {
    pub fn new(users: Arc<dyn UserRepository>, tokens: TokenConfig) -> Self {
        Self {
            users,
            tokens,
            bcrypt_cost: DEFAULT_COST,
        }
    }

    /// Override the bcrypt cost (tests use the minimum)
    pub fn with_bcrypt_cost(mut self, cost: u32) -> Self {
        self.bcrypt_cost = cost;
        self
    }

    /// Register a new user.
    ///
    /// # Errors
    ///
    /// - `Validation` if any field is missing or empty
    /// - `Conflict` if the email or username is taken
    /// - `Unexpected` for store and hashing failures
    pub async fn register(&self, input: SignupInput) -> Result<AuthOutcome, CredentialError> {
        let (Some(username), Some(email), Some(password)) = (
            required(input.username),
            required(input.email),
            required(input.password),
        ) else {
            return Err(CredentialError::Validation(MSG_MISSING_FIELDS.to_string()));
        };

        if self.users.get_by_email(&email).await?.is_some() {
            return Err(CredentialError::Conflict(MSG_EMAIL_REGISTERED.to_string()));
        }

        let password_hash = self.hash(password).await?;
        let user = self.insert(User::new(username, email, password_hash)).await?;

        let token = self.sign(Claims::for_signup(&user))?;
        tracing::info!(user_id = %user.id, "User registered");

        Ok(AuthOutcome { user, token })
    }

    /// Sign in with email and password.
    ///
    /// A wrong password is `InvalidCredentials`, an unknown email `NotFound`.
    pub async fn sign_in(&self, input: SigninInput) -> Result<AuthOutcome, CredentialError> {
        let (Some(email), Some(password)) = (required(input.email), required(input.password))
        else {
            return Err(CredentialError::Validation(MSG_MISSING_FIELDS.to_string()));
        };

        let user = self
            .users
            .get_by_email(&email)
            .await?
            .ok_or_else(|| CredentialError::NotFound(MSG_USER_NOT_FOUND.to_string()))?;

        if !self.verify(password, user.password_hash.clone()).await? {
            tracing::debug!(user_id = %user.id, "Sign-in rejected: wrong password");
            return Err(CredentialError::InvalidCredentials(
                MSG_INVALID_PASSWORD.to_string(),
            ));
        }

        let token = self.sign(Claims::for_session(&user))?;
        Ok(AuthOutcome { user, token })
    }

    /// Google login: sign in an existing account or provision a new one.
    ///
    /// A provisioned user gets a synthesized username and a random password
    /// that is hashed and never handed out.
    pub async fn google_auth(&self, input: GoogleInput) -> Result<AuthOutcome, CredentialError> {
        let Some(email) = required(input.email) else {
            return Err(CredentialError::Validation(MSG_EMAIL_REQUIRED.to_string()));
        };

        if let Some(user) = self.users.get_by_email(&email).await? {
            let token = self.sign(Claims::for_session(&user))?;
            return Ok(AuthOutcome { user, token });
        }

        let display_name = required(input.name)
            .unwrap_or_else(|| email.split('@').next().unwrap_or_default().to_string());
        let username = synthesize_username(&display_name);
        let password_hash = self.hash(generate_password()).await?;

        let user = User::new(username, email, password_hash)
            .with_profile_picture(input.google_photo_url);
        let user = self.insert(user).await?;

        let token = self.sign(Claims::for_session(&user))?;
        tracing::info!(user_id = %user.id, username = %user.username, "User provisioned via Google");

        Ok(AuthOutcome { user, token })
    }

    async fn insert(&self, user: User) -> Result<User, CredentialError> {
        match self.users.create(&user).await {
            Ok(user) => Ok(user),
            Err(CreateUserError::Duplicate(field)) => {
                tracing::debug!(%field, "Duplicate key on user insert");
                let message = match field {
                    DuplicateField::Username => MSG_USERNAME_TAKEN,
                    DuplicateField::Email => MSG_EMAIL_TAKEN,
                };
                Err(CredentialError::Conflict(message.to_string()))
            }
            Err(CreateUserError::Other(e)) => Err(CredentialError::Unexpected(e)),
        }
    }

    /// bcrypt is CPU-bound; keep it off the async workers
    async fn hash(&self, password: String) -> Result<String, CredentialError> {
        let cost = self.bcrypt_cost;
        let hash = tokio::task::spawn_blocking(move || hash_password(&password, cost))
            .await
            .context("Password hashing task failed")??;
        Ok(hash)
    }

    async fn verify(&self, password: String, hash: String) -> Result<bool, CredentialError> {
        let matches = tokio::task::spawn_blocking(move || verify_password(&password, &hash))
            .await
            .context("Password verification task failed")??;
        Ok(matches)
    }

    fn sign(&self, claims: Claims) -> Result<String, CredentialError> {
        issue_token(&self.tokens, claims)
            .context("Failed to issue session token")
            .map_err(CredentialError::Unexpected)
    }
}

/// Display name lower-cased with spaces removed, plus four random base-9 digits
pub fn synthesize_username(display_name: &str) -> String {
    let mut rng = rand::rng();
    let base: String = display_name
        .to_lowercase()
        .chars()
        .filter(|c| *c != ' ')
        .collect();
    let suffix: String = (0..4)
        .map(|_| char::from(b'0' + rng.random_range(0..9u8)))
        .collect();
    format!("{}{}", base, suffix)
}

/// Two random 8-character base-36 fragments
pub fn generate_password() -> String {
    const ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    let mut rng = rand::rng();
    (0..16)
        .map(|_| char::from(ALPHABET[rng.random_range(0..ALPHABET.len())]))
        .collect()
}


#[cfg(test)]
mod property_tests {
    use super::*;
    use crate::db::repositories::SqlxUserRepository;
    use crate::db::{create_test_pool, migrations};
    use crate::services::token::verify_token;
    use proptest::prelude::*;

    async fn setup_service() -> CredentialService {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");
        CredentialService::new(
            SqlxUserRepository::boxed(pool),
            TokenConfig {
                secret: "property-secret".to_string(),
                ttl_seconds: None,
            },
        )
        .with_bcrypt_cost(4)
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(20))]

        /// A unique triple registers once; the same email never registers
        /// again, whatever the username.
        #[test]
        fn register_once_per_email(
            username in "[a-z]{3,10}",
            other_username in "[a-z]{3,10}",
            email_prefix in "[a-z]{3,10}",
            password in "[a-zA-Z0-9]{8,20}",
        ) {
            let result: Result<(), TestCaseError> = tokio_test::block_on(async {
                let service = setup_service().await;
                let email = format!("{}@example.com", email_prefix);

                let first = service
                    .register(SignupInput::new(username, email.clone(), password.clone()))
                    .await;
                prop_assert!(first.is_ok());

                let second = service
                    .register(SignupInput::new(other_username, email, password))
                    .await;
                prop_assert!(matches!(second, Err(CredentialError::Conflict(_))));
                Ok(())
            });
            result?;
        }

        /// The right password yields a token for the stored id; any other
        /// password yields no token.
        #[test]
        fn sign_in_checks_password(
            username in "[a-z]{3,10}",
            password in "[a-zA-Z0-9]{8,20}",
            wrong in "[a-zA-Z0-9]{8,20}",
        ) {
            prop_assume!(password != wrong);
            let result: Result<(), TestCaseError> = tokio_test::block_on(async {
                let service = setup_service().await;
                let email = format!("{}@example.com", username);
                let registered = service
                    .register(SignupInput::new(username, email.clone(), password.clone()))
                    .await
                    .expect("Registration should succeed");

                let ok = service
                    .sign_in(SigninInput::new(email.clone(), password))
                    .await
                    .expect("Sign-in should succeed");
                let claims = verify_token(
                    &TokenConfig { secret: "property-secret".to_string(), ttl_seconds: None },
                    &ok.token,
                )
                .expect("Token should verify");
                prop_assert_eq!(claims.id, registered.user.id);

                let rejected = service.sign_in(SigninInput::new(email, wrong)).await;
                prop_assert!(matches!(rejected, Err(CredentialError::InvalidCredentials(_))));
                Ok(())
            });
            result?;
        }
    }
}
