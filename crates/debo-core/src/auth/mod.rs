//! Authentication: token storage, login/logout and redirect handling.
//!
//! This module provides:
//! - `TokenStore`: where the single access token lives (memory, file, keychain)
//! - `Navigator`: the redirect side effect used when the user must sign in again
//! - `AuthService`: login, logout and the authentication-status check
//!
//! The refresh token never passes through here; the server keeps it in an
//! HTTP-only cookie.

pub mod navigator;
pub mod service;
pub mod token_store;

pub use navigator::{Navigator, RecordingNavigator, TracingNavigator};
pub use service::{AuthService, LoginResponse};
pub use token_store::{
    FileTokenStore, KeyringTokenStore, MemoryTokenStore, TokenStore, TokenStoreError, TOKEN_KEY,
};
