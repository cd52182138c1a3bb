/// Authentication utilities
///
/// This module provides the authentication primitives for Taskdeck:
///
/// # Modules
///
/// - [`password`]: Argon2id password hashing and verification
/// - [`token`]: Signed session tokens (issue, validate, revoke)
///
/// A session token is only live while all three hold: its signature
/// verifies, it has not expired, and it is still present in the owning
/// user's session list. The list membership check is what makes logout
/// effective before the token's embedded expiry.

pub mod password;
pub mod token;
