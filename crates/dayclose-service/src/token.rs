//! # One-Time Security Tokens
//!
//! Every mutating operation consumes a single-use, time-bounded token. The
//! tokens themselves are issued and tracked by the surrounding auth/session
//! layer; this module defines the narrow contract the operations call, plus
//! an in-memory implementation with the same single-use and expiry
//! semantics for tests and development.
//!
//! ## Token Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  issue() ──► token handed to the client with the form/page              │
//! │                   │                                                     │
//! │                   ▼                                                     │
//! │  client calls a mutating operation with the token                       │
//! │                   │                                                     │
//! │                   ▼                                                     │
//! │  consume(token)                                                         │
//! │    ├── unknown / already used → false  (operation rejected, no writes) │
//! │    ├── expired                → false                                   │
//! │    └── live                   → true, token burned                      │
//! │                                                                         │
//! │  Snapshot saves return a FRESH token so repeated pastes keep working.   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use uuid::Uuid;

// =============================================================================
// Contract
// =============================================================================

/// The security-token collaborator contract.
///
/// Implementations must be thread-safe; operations call `consume` before
/// touching the database and reject the request if it returns false.
pub trait SecurityTokens: Send + Sync {
    /// Issues a fresh single-use token.
    fn issue(&self) -> String;

    /// Consumes a token. Returns true exactly once per live token;
    /// unknown, reused and expired tokens return false.
    fn consume(&self, token: &str) -> bool;
}

// =============================================================================
// In-Memory Implementation
// =============================================================================

/// In-memory token store with expiry.
///
/// Suitable for tests and single-process development. Production deploys
/// plug the real session layer in through the [`SecurityTokens`] trait.
pub struct MemoryTokens {
    ttl: Duration,
    live: Mutex<HashMap<String, Instant>>,
}

impl MemoryTokens {
    /// Creates a store whose tokens expire after `ttl`.
    pub fn new(ttl: Duration) -> Self {
        MemoryTokens {
            ttl,
            live: Mutex::new(HashMap::new()),
        }
    }
}

impl Default for MemoryTokens {
    /// Ten-minute tokens, matching a typical form lifetime.
    fn default() -> Self {
        MemoryTokens::new(Duration::from_secs(600))
    }
}

impl SecurityTokens for MemoryTokens {
    fn issue(&self) -> String {
        let token = Uuid::new_v4().to_string();
        let mut live = match self.live.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        live.insert(token.clone(), Instant::now() + self.ttl);
        token
    }

    fn consume(&self, token: &str) -> bool {
        let mut live = match self.live.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        // Removal makes the token single-use whether or not it was expired
        match live.remove(token) {
            Some(expires_at) => Instant::now() < expires_at,
            None => false,
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_is_single_use() {
        let tokens = MemoryTokens::default();
        let token = tokens.issue();

        assert!(tokens.consume(&token));
        assert!(!tokens.consume(&token), "second use must be rejected");
    }

    #[test]
    fn test_unknown_token_rejected() {
        let tokens = MemoryTokens::default();
        assert!(!tokens.consume("made-up-token"));
        assert!(!tokens.consume(""));
    }

    #[test]
    fn test_expired_token_rejected() {
        let tokens = MemoryTokens::new(Duration::from_secs(0));
        let token = tokens.issue();
        assert!(!tokens.consume(&token));
    }

    #[test]
    fn test_tokens_are_independent() {
        let tokens = MemoryTokens::default();
        let a = tokens.issue();
        let b = tokens.issue();

        assert!(tokens.consume(&a));
        assert!(tokens.consume(&b));
    }
}
