pub mod auth;

pub use auth::{
    refresh_session_cookie, removal_cookie, request_meta, session_cookie, session_token, AuthUser,
};
