/// Shared types used across the codebase

use serde::{Deserialize, Serialize};

/// Kinds of group-scoped content tracked by the group index.
/// Each kind has its own membership list on a `GroupInfo`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentKind {
    Json,
    File,
}

impl ContentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentKind::Json => "json",
            ContentKind::File => "file",
        }
    }
}

impl std::fmt::Display for ContentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Roles carried in issued tokens.
/// `Admin` may read and write content, `Web` may only read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    Admin,
    Web,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "Admin",
            Role::Web => "Web",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "admin" => Ok(Role::Admin),
            "web" => Ok(Role::Web),
            other => Err(format!("unknown role '{}'", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_roles_case_insensitively() {
        assert_eq!("admin".parse::<Role>(), Ok(Role::Admin));
        assert_eq!(" Web ".parse::<Role>(), Ok(Role::Web));
        assert!("root".parse::<Role>().is_err());
    }

    #[test]
    fn content_kind_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&ContentKind::File).unwrap(), "\"file\"");
        assert_eq!(ContentKind::Json.to_string(), "json");
    }
}
