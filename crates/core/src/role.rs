//! Caller roles
//!
//! Membership identifiers look like `TrRegionMSP_marie`: the organisation
//! prefix before the first `_` names the role. It is parsed exactly once,
//! when the caller is authenticated, and carried as a typed `Actor`.

use serde::{Deserialize, Serialize};
use strum_macros::Display;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RoleError {
    #[error("Empty membership identifier")]
    EmptyIdentity,

    #[error("Unknown membership prefix '{0}'")]
    UnknownPrefix(String),
}

/// Actor tier in the treasury workflow
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Treasurer: registers operations and submits them to the ledger
    Treasurer,
    /// Regional Treasurer: first approval tier (aggregation)
    RegionalTreasurer,
    /// Principal State Accountant: final validation tier
    PrincipalAccountant,
}

impl Role {
    pub const ALL: [Role; 3] = [Role::Treasurer, Role::RegionalTreasurer, Role::PrincipalAccountant];

    /// Membership service prefix for this role
    pub fn msp_prefix(&self) -> &'static str {
        match self {
            Role::Treasurer => "TMSP",
            Role::RegionalTreasurer => "TrRegionMSP",
            Role::PrincipalAccountant => "CpeMSP",
        }
    }

    /// Resolve the role from a membership identifier such as `CpeMSP_pierre`
    pub fn from_msp_id(identity: &str) -> Result<Self, RoleError> {
        let prefix = identity.split('_').next().unwrap_or_default();
        if prefix.is_empty() {
            return Err(RoleError::EmptyIdentity);
        }
        Role::ALL
            .into_iter()
            .find(|role| role.msp_prefix() == prefix)
            .ok_or_else(|| RoleError::UnknownPrefix(prefix.to_string()))
    }
}

/// Authenticated caller
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Actor {
    pub id: String,
    pub role: Role,
}

impl Actor {
    pub fn new(id: impl Into<String>, role: Role) -> Self {
        Self { id: id.into(), role }
    }

    /// Authenticate from a membership identifier; the identifier is the actor id
    pub fn from_msp_id(identity: &str) -> Result<Self, RoleError> {
        let role = Role::from_msp_id(identity)?;
        Ok(Self::new(identity, role))
    }

    pub fn has_role(&self, role: Role) -> bool {
        self.role == role
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_from_msp_id() {
        assert_eq!(Role::from_msp_id("TMSP_jean").unwrap(), Role::Treasurer);
        assert_eq!(Role::from_msp_id("TrRegionMSP_marie").unwrap(), Role::RegionalTreasurer);
        assert_eq!(Role::from_msp_id("CpeMSP").unwrap(), Role::PrincipalAccountant);
    }

    #[test]
    fn test_unknown_prefix_rejected() {
        assert_eq!(
            Role::from_msp_id("AdminMSP_root"),
            Err(RoleError::UnknownPrefix("AdminMSP".to_string()))
        );
        assert_eq!(Role::from_msp_id(""), Err(RoleError::EmptyIdentity));
        // Prefix match is exact, not a substring match
        assert!(Role::from_msp_id("TMSPX_jean").is_err());
    }

    #[test]
    fn test_actor_keeps_identity() {
        let actor = Actor::from_msp_id("CpeMSP_pierre").unwrap();
        assert_eq!(actor.id, "CpeMSP_pierre");
        assert!(actor.has_role(Role::PrincipalAccountant));
        assert!(!actor.has_role(Role::RegionalTreasurer));
    }

    #[test]
    fn test_prefix_roundtrip() {
        for role in Role::ALL {
            assert_eq!(Role::from_msp_id(role.msp_prefix()).unwrap(), role);
        }
    }
}
