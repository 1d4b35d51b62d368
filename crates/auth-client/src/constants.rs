//! Backend endpoints and client defaults

use std::time::Duration;

/// Production backend.
pub const DEFAULT_BASE_URL: &str = "https://vaibhavbansal1.pythonanywhere.com";

/// Exchanges `{ "refresh": R }` for `{ "access": A }`.
pub const REFRESH_PATH: &str = "api/token/refresh/";

/// Exchanges the refresh credential delivered by the login redirect for a
/// fresh `{ "access_token", "refresh_token" }` pair.
pub const LOGIN_EXCHANGE_PATH: &str = "api/get/refresh/";

/// Per-call timeout used by every screen in the app.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Header that skips the development tunnel's browser interstitial.
pub const TUNNEL_BYPASS_HEADER: &str = "ngrok-skip-browser-warning";
pub const TUNNEL_BYPASS_VALUE: &str = "69420";
