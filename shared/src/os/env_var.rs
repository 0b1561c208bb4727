use mockall::automock;
use std::{env, env::VarError};

/// Mockable way to query process environment variables.
///
/// Kept as a trait (rather than calling `std::env::var` directly) so discoverers that
/// branch on environment state — the in-cluster Kubernetes auth probe, most notably —
/// can be tested without mutating the test process's real environment.
#[automock]
pub trait EnvVarQuery {
    fn get_env_var(&self, name: &'static str) -> Result<String, VarError>;
    fn get_env_vars(&self) -> Vec<(String, String)>;
}

pub struct ActualEnvVarQuery;

impl EnvVarQuery for ActualEnvVarQuery {
    /// Gets an environment variable using `std::env::var`.
    ///
    /// ```
    /// use fleetwatch_shared::os::env_var::EnvVarQuery;
    ///
    /// let env_query = fleetwatch_shared::os::env_var::ActualEnvVarQuery {};
    /// assert_eq!(std::env::var("HOSTNAME"), env_query.get_env_var("HOSTNAME"));
    /// ```
    fn get_env_var(&self, name: &'static str) -> Result<String, VarError> {
        env::var(name)
    }

    fn get_env_vars(&self) -> Vec<(String, String)> {
        env::vars().collect::<Vec<(String, String)>>()
    }
}
