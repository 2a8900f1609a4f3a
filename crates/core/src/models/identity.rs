use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::errors::SchedulingError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserKind {
    Teacher,
    Student,
}

impl UserKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserKind::Teacher => "teacher",
            UserKind::Student => "student",
        }
    }
}

impl fmt::Display for UserKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UserKind {
    type Err = SchedulingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "teacher" => Ok(UserKind::Teacher),
            "student" => Ok(UserKind::Student),
            other => Err(SchedulingError::Validation(format!(
                "Unknown user kind: {}",
                other
            ))),
        }
    }
}

/// A verified reference to a teacher or a student.
///
/// Identities are produced by the upstream identity layer; nothing in this
/// workspace verifies them. Every operation that acts on behalf of a user
/// takes one of these instead of a bare id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Identity {
    pub kind: UserKind,
    pub id: Uuid,
}

impl Identity {
    pub fn teacher(id: Uuid) -> Self {
        Self {
            kind: UserKind::Teacher,
            id,
        }
    }

    pub fn student(id: Uuid) -> Self {
        Self {
            kind: UserKind::Student,
            id,
        }
    }

    pub fn is_teacher(&self) -> bool {
        self.kind == UserKind::Teacher
    }

    /// Returns the id if this identity is a teacher, `Forbidden` otherwise.
    pub fn require_teacher(&self) -> Result<Uuid, SchedulingError> {
        match self.kind {
            UserKind::Teacher => Ok(self.id),
            UserKind::Student => Err(SchedulingError::Forbidden(
                "Only teachers may perform this action".to_string(),
            )),
        }
    }

    /// Returns the id if this identity is a student, `Forbidden` otherwise.
    pub fn require_student(&self) -> Result<Uuid, SchedulingError> {
        match self.kind {
            UserKind::Student => Ok(self.id),
            UserKind::Teacher => Err(SchedulingError::Forbidden(
                "Only students may perform this action".to_string(),
            )),
        }
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind, self.id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: Uuid,
    pub kind: UserKind,
    pub name: String,
    pub email: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpsertProfileRequest {
    pub name: String,
    pub email: String,
}
