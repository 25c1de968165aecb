use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Employee,
    Manager,
    Hr,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Employee => "employee",
            Self::Manager => "manager",
            Self::Hr => "hr",
            Self::Admin => "admin",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "employee" => Some(Self::Employee),
            "manager" => Some(Self::Manager),
            "hr" => Some(Self::Hr),
            "admin" => Some(Self::Admin),
            _ => None,
        }
    }
}

/// Identity claims for one call, supplied by the caller on every operation.
/// The engine never looks claims up itself; the portal's identity provider
/// (or the CLI flags standing in for it) owns them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Actor {
    pub id: String,
    pub role: Role,
    pub department_id: Option<String>,
}

impl Actor {
    pub fn new(id: impl Into<String>, role: Role, department_id: Option<String>) -> Self {
        Self {
            id: id.into(),
            role,
            department_id,
        }
    }

    /// Whether this actor holds management authority over a department.
    /// HR and admin manage every department; a manager only their own.
    pub fn manages(&self, department_id: &str) -> bool {
        match self.role {
            Role::Hr | Role::Admin => true,
            Role::Manager => self.department_id.as_deref() == Some(department_id),
            Role::Employee => false,
        }
    }

    pub fn is_elevated(&self) -> bool {
        matches!(self.role, Role::Hr | Role::Admin)
    }
}
