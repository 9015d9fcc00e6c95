use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::ValidationError;

/// Identifiers of the two content backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendId {
    /// WordPress REST API (backend A).
    WordPress,
    /// Supabase content tables (backend B).
    Supabase,
}

impl BackendId {
    pub const ALL: [Self; 2] = [Self::WordPress, Self::Supabase];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::WordPress => "wordpress",
            Self::Supabase => "supabase",
        }
    }

    /// The backend that is not `self`.
    pub const fn other(self) -> Self {
        match self {
            Self::WordPress => Self::Supabase,
            Self::Supabase => Self::WordPress,
        }
    }
}

impl Display for BackendId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Backend selection mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceMode {
    WordPress,
    Supabase,
    #[default]
    Auto,
}

impl ServiceMode {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::WordPress => "wordpress",
            Self::Supabase => "supabase",
            Self::Auto => "auto",
        }
    }

    /// The backend an explicit mode pins, `None` for `auto`.
    pub const fn pinned(self) -> Option<BackendId> {
        match self {
            Self::WordPress => Some(BackendId::WordPress),
            Self::Supabase => Some(BackendId::Supabase),
            Self::Auto => None,
        }
    }
}

impl Display for ServiceMode {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ServiceMode {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "wordpress" => Ok(Self::WordPress),
            "supabase" => Ok(Self::Supabase),
            "auto" => Ok(Self::Auto),
            other => Err(ValidationError::InvalidServiceMode {
                value: other.to_owned(),
            }),
        }
    }
}
