//! Application lifecycle trait.

use async_trait::async_trait;

use crate::error::VeltResult;

/// Lifecycle states of a controller application.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppState {
    /// Not registered with the host; no listener, no rules.
    Inactive,
    /// Registered and reacting to configuration events.
    Active,
}

impl AppState {
    /// Returns the state name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            AppState::Inactive => "inactive",
            AppState::Active => "active",
        }
    }
}

/// Base trait for controller applications.
///
/// # Example
///
/// ```ignore
/// use velt_common::{AppState, NetworkApp, VeltResult};
///
/// struct MyApp {
///     state: AppState,
/// }
///
/// #[async_trait]
/// impl NetworkApp for MyApp {
///     fn app_name(&self) -> &str { "org.example.myapp" }
///     fn config_key(&self) -> &str { "mycfg" }
///     fn state(&self) -> AppState { self.state }
///     async fn activate(&mut self) -> VeltResult<()> { /* ... */ Ok(()) }
///     async fn deactivate(&mut self) -> VeltResult<()> { /* ... */ Ok(()) }
/// }
/// ```
#[async_trait]
pub trait NetworkApp: Send {
    /// Returns the name the application registers with the core service.
    fn app_name(&self) -> &str;

    /// Returns the schema key of the application's configuration.
    fn config_key(&self) -> &str;

    /// Returns the current lifecycle state.
    fn state(&self) -> AppState;

    /// Returns true if the application is active.
    fn is_active(&self) -> bool {
        self.state() == AppState::Active
    }

    /// Registers with the host and starts reacting to configuration events.
    async fn activate(&mut self) -> VeltResult<()>;

    /// Withdraws everything the application installed and releases its
    /// host registrations.
    async fn deactivate(&mut self) -> VeltResult<()>;
}
