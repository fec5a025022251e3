//! Authentication payloads exchanged with the backend

mod types;

pub use types::{
    ChangePasswordRequest, ConfirmResetRequest, Credentials, LoginResponse, RefreshRequest,
    RefreshResponse, RegisterRequest, RegisterResponse, RegisteredSchool, ResetPasswordRequest,
};
