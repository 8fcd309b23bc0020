use serde::{Deserialize, Serialize};

/// Argon2id cost and password policy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PasswordHashConfig {
    #[serde(default = "default_memory_kib")]
    pub memory_kib: u32,
    #[serde(default = "default_iterations")]
    pub iterations: u32,
    #[serde(default = "default_parallelism")]
    pub parallelism: u32,
    #[serde(default = "default_min_password_length")]
    pub min_password_length: usize,
}

impl PasswordHashConfig {
    /// Smallest parameters argon2 accepts. Unit and integration tests only.
    #[must_use]
    pub fn for_tests() -> Self {
        Self {
            memory_kib: 8,
            iterations: 1,
            parallelism: 1,
            min_password_length: default_min_password_length(),
        }
    }
}

impl Default for PasswordHashConfig {
    fn default() -> Self {
        Self {
            memory_kib: default_memory_kib(),
            iterations: default_iterations(),
            parallelism: default_parallelism(),
            min_password_length: default_min_password_length(),
        }
    }
}

// OWASP baseline for Argon2id: 19 MiB, 2 passes, 1 lane.
fn default_memory_kib() -> u32 {
    19_456
}

fn default_iterations() -> u32 {
    2
}

fn default_parallelism() -> u32 {
    1
}

fn default_min_password_length() -> usize {
    8
}
