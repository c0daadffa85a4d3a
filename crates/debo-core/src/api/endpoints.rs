//! Fixed backend paths, relative to the API root.

pub const PROJECTS_PATH: &str = "/projects";
pub const USERS_PATH: &str = "/auth/users";
pub const LOGIN_PATH: &str = "/auth/jwt/create";
pub const REFRESH_PATH: &str = "/auth/jwt/refresh";
pub const LOGOUT_PATH: &str = "/auth/logout";
