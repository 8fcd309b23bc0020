use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Why a ledger entry stopped being usable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RevocationReason {
    /// Exchanged for a successor token.
    Rotated,
    /// Consumed without a successor.
    Consumed,
    Logout,
    LogoutAll,
    /// Revoked because an already-exchanged token was presented again.
    ReuseDetected,
}

impl RevocationReason {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Rotated => "rotated",
            Self::Consumed => "consumed",
            Self::Logout => "logout",
            Self::LogoutAll => "logout_all",
            Self::ReuseDetected => "reuse_detected",
        }
    }

    /// True when the token was spent by a legitimate exchange, so presenting it
    /// again means someone else holds a copy.
    #[must_use]
    pub const fn is_consumption(self) -> bool {
        matches!(self, Self::Rotated | Self::Consumed)
    }
}

impl fmt::Display for RevocationReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RevocationReason {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "rotated" => Ok(Self::Rotated),
            "consumed" => Ok(Self::Consumed),
            "logout" => Ok(Self::Logout),
            "logout_all" => Ok(Self::LogoutAll),
            "reuse_detected" => Ok(Self::ReuseDetected),
            other => Err(format!("unknown revocation reason: {other}")),
        }
    }
}

/// One issued refresh token, as the server remembers it.
///
/// Only the SHA-256 digest of the token is kept.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefreshTokenRecord {
    pub id: Uuid,
    pub identity_id: Uuid,
    pub token_hash: String,
    pub expires_at: DateTime<Utc>,
    pub revoked: bool,
    pub revoked_at: Option<DateTime<Utc>>,
    pub revocation_reason: Option<RevocationReason>,
    pub replaced_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl RefreshTokenRecord {
    #[must_use]
    pub fn is_active(&self, now: DateTime<Utc>) -> bool {
        !self.revoked && self.expires_at > now
    }
}

/// Input for a new ledger entry.
#[derive(Debug, Clone)]
pub struct NewRefreshToken {
    pub identity_id: Uuid,
    pub token_hash: String,
    pub expires_at: DateTime<Utc>,
}

impl NewRefreshToken {
    pub(crate) fn into_record(self, now: DateTime<Utc>) -> RefreshTokenRecord {
        RefreshTokenRecord {
            id: Uuid::new_v4(),
            identity_id: self.identity_id,
            token_hash: self.token_hash,
            expires_at: self.expires_at,
            revoked: false,
            revoked_at: None,
            revocation_reason: None,
            replaced_by: None,
            created_at: now,
        }
    }
}
