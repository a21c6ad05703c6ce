#![forbid(unsafe_code)]

use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub(crate) enum Role {
    Viewer,
    Editor,
}

impl Role {
    pub(crate) fn as_str(self) -> &'static str {
        match self {
            Self::Viewer => "viewer",
            Self::Editor => "editor",
        }
    }

    pub(crate) fn can_mutate(self) -> bool {
        matches!(self, Self::Editor)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Caller identity handed to the server at construction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct IdentityContext {
    actor: String,
    role: Role,
}

impl IdentityContext {
    pub(crate) fn new(actor: &str, role: Role) -> Result<Self, String> {
        let actor = actor.trim();
        if actor.is_empty() {
            return Err("actor must not be empty".to_string());
        }
        if actor.chars().any(char::is_control) {
            return Err("actor contains control characters".to_string());
        }
        Ok(Self {
            actor: actor.to_string(),
            role,
        })
    }

    pub(crate) fn actor(&self) -> &str {
        &self.actor
    }

    pub(crate) fn role(&self) -> Role {
        self.role
    }
}
