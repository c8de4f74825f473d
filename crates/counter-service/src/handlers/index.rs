//! Homepage handler.

/// Greeting returned by `GET /`.
pub const GREETING: &str = "Hello, you've reached the homepage!";

/// Handler for GET /
pub async fn index() -> &'static str {
    GREETING
}
