/// API route handlers
///
/// This module contains all route handlers organized by resource:
///
/// - `site`: public site pages and health check
/// - `users`: registration, login/logout, and profile management
/// - `files`: avatar and resume attachments
/// - `tasks`: owner-scoped task CRUD

pub mod files;
pub mod site;
pub mod tasks;
pub mod users;
