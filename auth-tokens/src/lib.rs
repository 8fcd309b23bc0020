//! Signed tokens and the refresh-token ledger.
//!
//! [`TokenCodec`] mints and verifies compact HS256 JWTs. Access and refresh
//! tokens are signed with different keys and carry a `typ` claim, so neither
//! can stand in for the other. Verification checks the signature before
//! anything else and treats `exp <= now` as expired.
//!
//! [`RefreshTokenLedger`] is the server-side record of every refresh token
//! issued. A refresh token is only honoured while its ledger entry is
//! unrevoked, unexpired and owned by the presenting identity, and rotation
//! revokes the presented entry and records its successor in one atomic step,
//! so a token can be exchanged at most once.

pub mod codec;
pub mod config;
pub mod error;
pub mod ledger;
pub mod models;
pub mod repository;

pub use codec::*;
pub use config::*;
pub use error::*;
pub use ledger::*;
pub use models::*;
