/// Database utilities
///
/// - [`pool`]: PostgreSQL connection pool with explicit lifecycle
///   (created once at startup, injected into services, closed at shutdown)
/// - [`migrations`]: embedded schema migrations

pub mod migrations;
pub mod pool;
