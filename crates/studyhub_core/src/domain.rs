//! crates/studyhub_core/src/domain.rs
//!
//! Defines the pure, core data structures for the application.
//! These structs are independent of any database or web framework; serde
//! derives exist because the same shapes cross the API boundary verbatim.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

//=========================================================================================
// Roles and Statuses
//=========================================================================================

/// A user's role. The authoritative value lives in the user record, not in
/// any credential the caller presents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Student,
    Tutor,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Student => "student",
            Role::Tutor => "tutor",
            Role::Admin => "admin",
        }
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
        match s {
            "student" => Ok(Role::Student),
            "tutor" => Ok(Role::Tutor),
            "admin" => Ok(Role::Admin),
            other => Err(format!("'{}' is not a valid role", other)),
        }
    }
}

/// Moderation state of a study session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApprovalStatus {
    Pending,
    Approved,
    Rejected,
}

impl ApprovalStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ApprovalStatus::Pending => "pending",
            ApprovalStatus::Approved => "approved",
            ApprovalStatus::Rejected => "rejected",
        }
    }
}

impl fmt::Display for ApprovalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ApprovalStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(ApprovalStatus::Pending),
            "approved" => Ok(ApprovalStatus::Approved),
            "rejected" => Ok(ApprovalStatus::Rejected),
            other => Err(format!("'{}' is not a valid approval status", other)),
        }
    }
}

//=========================================================================================
// Entities
//=========================================================================================

/// Represents a registered user. Identity key is the email, which is unique.
#[derive(Debug, Clone, Serialize)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

/// A tutoring session offered by one tutor.
#[derive(Debug, Clone, Serialize)]
pub struct StudySession {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub tutor_name: String,
    pub tutor_email: String,
    pub registration_fee: f64,
    pub status: ApprovalStatus,
    /// Set by an admin when the session is rejected.
    pub rejection_reason: Option<String>,
    /// Incremented only by the booking workflow.
    pub participant_count: i64,
    pub created_at: DateTime<Utc>,
}

/// Links one student to one study session. At most one booking exists per
/// (session, student email) pair; bookings are never updated or deleted.
#[derive(Debug, Clone, Serialize)]
pub struct Booking {
    pub id: Uuid,
    pub session_id: Uuid,
    pub session_title: String,
    pub tutor_email: String,
    pub student_email: String,
    pub student_name: String,
    pub registration_fee: f64,
    pub payment_intent_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A student's review of a session.
#[derive(Debug, Clone, Serialize)]
pub struct Review {
    pub id: Uuid,
    pub session_id: Uuid,
    pub student_email: String,
    pub student_name: String,
    pub rating: i32,
    pub comment: String,
    pub created_at: DateTime<Utc>,
}

/// A personal study note. Readable and writable only by its owner.
#[derive(Debug, Clone, Serialize)]
pub struct Note {
    pub id: Uuid,
    pub owner_email: String,
    pub title: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

/// A material (link) a tutor attaches to one of their sessions.
#[derive(Debug, Clone, Serialize)]
pub struct Material {
    pub id: Uuid,
    pub session_id: Uuid,
    pub tutor_email: String,
    pub title: String,
    pub url: String,
    pub created_at: DateTime<Utc>,
}

//=========================================================================================
// Write Payloads
//=========================================================================================

#[derive(Debug, Clone)]
pub struct NewStudySession {
    pub title: String,
    pub description: String,
    pub tutor_name: String,
    pub tutor_email: String,
    pub registration_fee: f64,
}

#[derive(Debug, Clone)]
pub struct NewBooking {
    pub session_id: Uuid,
    pub session_title: String,
    pub tutor_email: String,
    pub student_email: String,
    pub student_name: String,
    pub registration_fee: f64,
    pub payment_intent_id: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewReview {
    pub session_id: Uuid,
    pub student_email: String,
    pub student_name: String,
    pub rating: i32,
    pub comment: String,
}

#[derive(Debug, Clone)]
pub struct NewNote {
    pub owner_email: String,
    pub title: String,
    pub content: String,
}

#[derive(Debug, Clone)]
pub struct NewMaterial {
    pub session_id: Uuid,
    pub tutor_email: String,
    pub title: String,
    pub url: String,
}

/// Fields a tutor or admin may change on an existing session. `None` fields
/// are left untouched.
#[derive(Debug, Clone, Default)]
pub struct StudySessionUpdate {
    pub status: Option<ApprovalStatus>,
    pub registration_fee: Option<f64>,
    pub rejection_reason: Option<String>,
}

//=========================================================================================
// Money
//=========================================================================================

/// Converts a registration fee in major currency units to integer minor
/// units for the payment processor. Returns `None` for zero, negative, or
/// non-finite amounts so callers can short-circuit before any external call.
pub fn fee_to_minor_units(fee: f64) -> Option<i64> {
    if !fee.is_finite() || fee <= 0.0 {
        return None;
    }
    Some((fee * 100.0).round() as i64)
}
