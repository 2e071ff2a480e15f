//! Authentication domain types

mod types;

pub use types::{
    AuthError, LoginCredential, LoginPayload, LoginResponse, URL_TOKEN_PARAM, User, UserResponse,
    token_preview,
};
