/// Database models for Taskdeck
///
/// This module contains all database models and their CRUD operations.
///
/// # Models
///
/// - `user`: User accounts and profile data
/// - `session`: Per-user session token list (server-side revocation)
/// - `task`: Owner-scoped tasks
///
/// Every task operation is keyed by `(id, owner)`; a task that exists but
/// belongs to another user is indistinguishable from one that does not
/// exist.

pub mod session;
pub mod task;
pub mod user;
