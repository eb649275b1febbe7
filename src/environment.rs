use std::fmt::{Debug, Display, Formatter};
use std::str::FromStr;

/// Represents the deployments of the portfolio server the client can talk to.
#[derive(Clone, Default, Copy, PartialEq, Eq)]
pub enum Environment {
    /// Development server on the local machine.
    #[default]
    Local,
    /// Staging deployment for pre-production testing.
    Staging,
    /// Production deployment.
    Production,
}

impl Environment {
    /// Returns the portfolio server URL associated with the environment.
    pub fn server_url(&self) -> String {
        match self {
            Environment::Local => "http://localhost:5000".to_string(),
            Environment::Staging => "https://staging.portfolio-assistant.app".to_string(),
            Environment::Production => "https://portfolio-assistant.app".to_string(),
        }
    }

    /// Reads `PORTFOLIO_ENVIRONMENT`, falling back to the default when unset or unknown.
    pub fn from_env() -> Self {
        std::env::var("PORTFOLIO_ENVIRONMENT")
            .unwrap_or_default()
            .parse::<Environment>()
            .unwrap_or_default()
    }
}

impl FromStr for Environment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "local" => Ok(Environment::Local),
            "staging" => Ok(Environment::Staging),
            "production" | "prod" => Ok(Environment::Production),
            other => Err(format!("unknown environment: {}", other)),
        }
    }
}

impl Display for Environment {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Local => write!(f, "Local"),
            Environment::Staging => write!(f, "Staging"),
            Environment::Production => write!(f, "Production"),
        }
    }
}

impl Debug for Environment {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "Environment::{}, URL: {}", self, self.server_url())
    }
}
