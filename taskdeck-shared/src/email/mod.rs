/// Best-effort email notifications
///
/// Account lifecycle events (create, update, delete) trigger a plain-text
/// email through the [`account`] module. Dispatch is fire-and-forget:
/// a failed or slow send is logged and never affects the HTTP response.

pub mod account;

pub use account::Mailer;
