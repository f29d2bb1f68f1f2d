//! Role model and related functionality

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Role of a system user
///
/// Rows carrying any other stored value (such as the retired `visitor` role)
/// deserialize to `Unsupported` and are refused at sign-in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Guard,
    Host,
    #[serde(other)]
    Unsupported,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Guard => "guard",
            Role::Host => "host",
            Role::Unsupported => "unsupported",
        }
    }

    pub fn is_supported(&self) -> bool {
        !matches!(self, Role::Unsupported)
    }

    /// Admins and guards act on every visit; hosts only on their own
    pub fn is_staff(&self) -> bool {
        matches!(self, Role::Admin | Role::Guard)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "admin" => Ok(Role::Admin),
            "guard" => Ok(Role::Guard),
            "host" => Ok(Role::Host),
            other => Err(format!("Unknown role: {}", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_deserialization() {
        let role: Role = serde_json::from_str("\"guard\"").unwrap();
        assert_eq!(role, Role::Guard);

        let retired: Role = serde_json::from_str("\"visitor\"").unwrap();
        assert_eq!(retired, Role::Unsupported);
        assert!(!retired.is_supported());
    }

    #[test]
    fn test_role_from_str() {
        assert_eq!("Admin".parse::<Role>(), Ok(Role::Admin));
        assert!("unsupported".parse::<Role>().is_err());
        assert!(Role::Guard.is_staff());
        assert!(!Role::Host.is_staff());
    }
}
