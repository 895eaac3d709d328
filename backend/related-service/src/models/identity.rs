use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// What a federated identity stands for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IdentityKind {
    User,
    Group,
    Circle,
}

impl IdentityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            IdentityKind::User => "user",
            IdentityKind::Group => "group",
            IdentityKind::Circle => "circle",
        }
    }
}

impl FromStr for IdentityKind {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(IdentityKind::User),
            "group" => Ok(IdentityKind::Group),
            "circle" => Ok(IdentityKind::Circle),
            _ => Err(()),
        }
    }
}

/// A share recipient or actor, owned by the identity subsystem.
///
/// `single_id` is the stable unique id across the whole platform;
/// `user_id` is the source-local id (uid for users, group name for
/// groups). The ranking engine never mutates identities.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FederatedIdentity {
    pub single_id: String,
    pub user_id: String,
    pub kind: IdentityKind,
    #[serde(default)]
    pub display_name: String,
}

impl FederatedIdentity {
    pub fn user(single_id: impl Into<String>, user_id: impl Into<String>) -> Self {
        Self {
            single_id: single_id.into(),
            user_id: user_id.into(),
            kind: IdentityKind::User,
            display_name: String::new(),
        }
    }

    pub fn group(single_id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            single_id: single_id.into(),
            user_id: name.into(),
            kind: IdentityKind::Group,
            display_name: String::new(),
        }
    }

    pub fn circle(single_id: impl Into<String>) -> Self {
        let single_id = single_id.into();
        Self {
            user_id: single_id.clone(),
            single_id,
            kind: IdentityKind::Circle,
            display_name: String::new(),
        }
    }

    pub fn is_user(&self) -> bool {
        self.kind == IdentityKind::User
    }
}
