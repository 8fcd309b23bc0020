// Session lifecycle: settings, orchestration, refresh cookie
pub mod config;
pub mod cookies;
pub mod error;
pub mod session;

pub use config::{AuthSettings, SettingsError};
pub use error::SessionError;
pub use session::{LoginOutcome, SessionOrchestrator};
