//! API routes, relative to the configured base URL.

pub const USER_AUTHENTICATE: &str = "v1/user/authenticate";
pub const USER_SIGN_IN: &str = "v1/user/signin";
pub const USER_WORKSPACES: &str = "v1/user/workspaces";
pub const WORKSPACE_EVENT_CREATE: &str = "v1/workspace/event/create";
