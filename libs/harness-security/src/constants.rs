//! Well-known role and team names used by the demo realm.

/// Role that overrides every other rule.
pub const ADMIN_ROLE: &str = "admin";

/// Role allowed to manage files, vector stores and datasets.
pub const DEVELOPER_ROLE: &str = "developer";

/// Role with read access to free/shared models only.
pub const USER_ROLE: &str = "user";

pub const PLATFORM_TEAM: &str = "platform-team";
pub const ML_TEAM: &str = "ml-team";
pub const DATA_TEAM: &str = "data-team";

/// Username shown for requests issued without any bearer token.
pub const ANONYMOUS_USERNAME: &str = "(anonymous)";
