// Stable error codes returned to clients alongside the HTTP status.

pub mod validation {
    pub const INVALID_INPUT: &str = "VALIDATION_1001";
    pub const EMAIL_TAKEN: &str = "VALIDATION_1002";
}

pub mod authentication {
    pub const INVALID_CREDENTIALS: &str = "AUTH_2001";
    pub const TOKEN_EXPIRED: &str = "AUTH_2002";
    pub const TOKEN_MALFORMED: &str = "AUTH_2003";
    pub const TOKEN_REVOKED: &str = "AUTH_2004";
    pub const TOKEN_NOT_FOUND: &str = "AUTH_2005";
    pub const IDENTITY_MISMATCH: &str = "AUTH_2006";
    pub const MISSING_TOKEN: &str = "AUTH_2007";
}

pub mod authorization {
    pub const INSUFFICIENT_ROLE: &str = "AUTHZ_3002";
}

pub mod database {
    pub const STORE_UNAVAILABLE: &str = "DB_4001";
}
