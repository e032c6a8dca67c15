//! Logging facilities for Horizon Select.
//!
//! Horizon Select uses the `tracing` crate for instrumentation. To see logs,
//! install a tracing subscriber in your application:
//!
//! ```ignore
//! fn main() {
//!     tracing_subscriber::fmt()
//!         .with_env_filter("horizon_select=debug")
//!         .init();
//!
//!     // Your application code...
//! }
//! ```
//!
//! Every subsystem logs under its own target so output can be filtered with
//! directives such as `horizon_select::remote=trace`.

/// Target names for log filtering.
///
/// Use these with `tracing` directives to filter logs by subsystem.
pub mod targets {
    /// Signal/slot system target.
    pub const SIGNAL: &str = "horizon_select_core::signal";
    /// Timer queue target.
    pub const TIMER: &str = "horizon_select_core::timer";
    /// HTTP transport target.
    pub const NET: &str = "horizon_select_net::http";
    /// Item store and selection target.
    pub const STORE: &str = "horizon_select::store";
    /// Local text matching target.
    pub const MATCHER: &str = "horizon_select::matcher";
    /// Remote source target.
    pub const REMOTE: &str = "horizon_select::remote";
    /// Query coordinator target.
    pub const COORDINATOR: &str = "horizon_select::coordinator";
    /// Highlight navigation target.
    pub const NAVIGATION: &str = "horizon_select::navigation";
    /// Caller-supplied callback fault boundary target.
    pub const CALLBACKS: &str = "horizon_select::callbacks";
    /// Select facade target.
    pub const SELECT: &str = "horizon_select::select";
}

/// Install a `fmt` subscriber honouring `RUST_LOG`, for tests.
///
/// Safe to call from every test; only the first call installs anything.
#[cfg(any(test, feature = "test-util"))]
pub fn init_test_subscriber() {
    use tracing_subscriber::EnvFilter;

    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_test_writer()
        .try_init();
}
