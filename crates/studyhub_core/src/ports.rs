//! crates/studyhub_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the application's core logic.
//! These traits form the boundary of the hexagonal architecture, allowing the core
//! to be independent of specific external implementations like databases or APIs.

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::{
    ApprovalStatus, Booking, Material, NewBooking, NewMaterial, NewNote, NewReview,
    NewStudySession, Note, Review, Role, StudySession, StudySessionUpdate, User,
};

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
/// This abstracts away the specific errors from external services (e.g., database, network).
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("Item not found: {0}")]
    NotFound(String),
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
    #[error("Unauthorized")]
    Unauthorized,
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Pagination
//=========================================================================================

/// A 1-based page request. `page=1,size=10` covers the first ten records in
/// store order; `page=2` the next ten.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub page: u32,
    pub size: u32,
}

impl Page {
    pub fn new(page: u32, size: u32) -> Self {
        Self {
            page: page.max(1),
            size,
        }
    }

    /// The zero-based number of records to skip: `(page - 1) * size`.
    pub fn offset(&self) -> i64 {
        (i64::from(self.page) - 1) * i64::from(self.size)
    }

    pub fn limit(&self) -> i64 {
        i64::from(self.size)
    }
}

impl Default for Page {
    fn default() -> Self {
        Self { page: 1, size: 10 }
    }
}

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

#[async_trait]
pub trait DatabaseService: Send + Sync {
    // --- User Management ---

    /// Inserts the user if no record with that email exists; returns the
    /// stored record either way. Existing records are left untouched.
    async fn upsert_user(&self, name: &str, email: &str) -> PortResult<User>;

    async fn get_user_by_email(&self, email: &str) -> PortResult<User>;

    async fn list_users(&self, page: Page) -> PortResult<Vec<User>>;

    async fn count_users(&self) -> PortResult<i64>;

    async fn update_user_role(&self, email: &str, role: Role) -> PortResult<User>;

    // --- Study Sessions ---

    async fn create_session(&self, session: NewStudySession) -> PortResult<StudySession>;

    async fn get_session_by_id(&self, session_id: Uuid) -> PortResult<StudySession>;

    /// Lists sessions in creation order, optionally filtered by approval
    /// status. `None` lists every session.
    async fn list_sessions(
        &self,
        status: Option<ApprovalStatus>,
        page: Page,
    ) -> PortResult<Vec<StudySession>>;

    async fn count_sessions(&self, status: Option<ApprovalStatus>) -> PortResult<i64>;

    async fn list_sessions_by_tutor(&self, tutor_email: &str) -> PortResult<Vec<StudySession>>;

    async fn update_session(
        &self,
        session_id: Uuid,
        update: StudySessionUpdate,
    ) -> PortResult<StudySession>;

    // --- Bookings ---

    /// The booking workflow. Inserting the booking and incrementing the
    /// session's participant count happen as one logical transaction:
    /// a duplicate (session, student email) pair fails with `Conflict`, a
    /// missing session with `NotFound`, and neither leaves partial state.
    async fn create_booking(&self, booking: NewBooking) -> PortResult<Booking>;

    async fn list_bookings_by_student(&self, student_email: &str) -> PortResult<Vec<Booking>>;

    // --- Reviews ---

    async fn create_review(&self, review: NewReview) -> PortResult<Review>;

    async fn list_reviews_for_session(&self, session_id: Uuid) -> PortResult<Vec<Review>>;

    // --- Notes (owner-scoped) ---

    async fn create_note(&self, note: NewNote) -> PortResult<Note>;

    async fn list_notes_by_owner(&self, owner_email: &str) -> PortResult<Vec<Note>>;

    /// Updates a note only when `owner_email` matches the stored owner;
    /// a known id with the wrong owner is indistinguishable from absent.
    async fn update_note(
        &self,
        note_id: Uuid,
        owner_email: &str,
        title: &str,
        content: &str,
    ) -> PortResult<Note>;

    async fn delete_note(&self, note_id: Uuid, owner_email: &str) -> PortResult<()>;

    // --- Materials ---

    async fn create_material(&self, material: NewMaterial) -> PortResult<Material>;

    async fn list_materials_by_tutor(&self, tutor_email: &str) -> PortResult<Vec<Material>>;

    async fn list_materials(&self, page: Page) -> PortResult<Vec<Material>>;

    async fn count_materials(&self) -> PortResult<i64>;

    /// Owner-scoped like `update_note`.
    async fn update_material(
        &self,
        material_id: Uuid,
        tutor_email: &str,
        title: &str,
        url: &str,
    ) -> PortResult<Material>;

    /// `owner_email = None` deletes regardless of owner (admin path);
    /// `Some(email)` deletes only the owner's own material.
    async fn delete_material(
        &self,
        material_id: Uuid,
        owner_email: Option<&str>,
    ) -> PortResult<()>;
}

#[async_trait]
pub trait PaymentService: Send + Sync {
    /// Creates a payment intent for `amount_minor` minor currency units and
    /// returns the processor's opaque client secret.
    async fn create_payment_intent(&self, amount_minor: i64, currency: &str)
        -> PortResult<String>;
}
