//! Services layer - Business logic
//!
//! Services validate input, talk to repositories and return typed errors.
//! Mapping errors to HTTP status codes is left to the API layer.

pub mod comment;
pub mod credentials;
pub mod identity;
pub mod password;
pub mod token;

pub use comment::{CommentService, CommentServiceError, ListParams};
pub use credentials::{
    AuthOutcome, CredentialError, CredentialService, GoogleInput, SigninInput, SignupInput,
};
pub use identity::{ensure_initialized, IdentityProvider};
pub use password::{hash_password, verify_password};
pub use token::{issue_token, verify_token, Claims, TokenConfig, TokenError};
