use chrono::{NaiveDate, Utc};

use crate::error::EngineError;
use crate::models::{Actor, Role};

/// Global identity and reporting-date flags, the CLI stand-in for the
/// portal's identity provider.
#[derive(Debug, Clone, Default)]
pub struct Claims {
    pub actor: Option<String>,
    pub role: Option<String>,
    pub dept: Option<String>,
    pub as_of: Option<String>,
}

impl Claims {
    pub fn resolve_actor(&self) -> Result<Actor, EngineError> {
        let id = self
            .actor
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or_else(|| {
                EngineError::validation("Identity claims are required: pass --actor and --role")
            })?;
        let role = self
            .role
            .as_deref()
            .ok_or_else(|| {
                EngineError::validation("Identity claims are required: pass --actor and --role")
            })
            .and_then(|r| {
                Role::from_str(r).ok_or_else(|| {
                    EngineError::validation(format!(
                        "Unknown role '{r}' (expected employee, manager, hr, or admin)"
                    ))
                })
            })?;
        Ok(Actor::new(id, role, self.dept.clone()))
    }

    /// The date used for deadline validation and overdue counting. Captured
    /// once per invocation; only this edge ever reads the clock.
    pub fn resolve_as_of(&self) -> Result<NaiveDate, EngineError> {
        match self.as_of.as_deref() {
            Some(raw) => raw.parse().map_err(|_| {
                EngineError::validation(format!("Invalid date '{raw}' (expected YYYY-MM-DD)"))
            }),
            None => Ok(Utc::now().date_naive()),
        }
    }
}
