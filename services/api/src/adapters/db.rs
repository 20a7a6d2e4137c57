//! services/api/src/adapters/db.rs
//!
//! This module contains the database adapter, which is the concrete implementation
//! of the `DatabaseService` port from the `core` crate. It handles all interactions
//! with the PostgreSQL database using `sqlx`.
//!
//! Queries use the runtime-checked `sqlx::query_as` API (not the compile-time
//! macros) so the workspace builds without a live DATABASE_URL.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use studyhub_core::domain::{
    ApprovalStatus, Booking, Material, NewBooking, NewMaterial, NewNote, NewReview,
    NewStudySession, Note, Review, Role, StudySession, StudySessionUpdate, User,
};
use studyhub_core::ports::{DatabaseService, Page, PortError, PortResult};
use uuid::Uuid;

// PostgreSQL error codes surfaced through constraint violations.
const PG_UNIQUE_VIOLATION: &str = "23505";
const PG_FOREIGN_KEY_VIOLATION: &str = "23503";

/// Maps a sqlx error to a port error, translating constraint violations into
/// the domain outcomes they represent.
fn map_db_err(e: sqlx::Error) -> PortError {
    if let sqlx::Error::Database(db_err) = &e {
        match db_err.code().as_deref() {
            Some(PG_UNIQUE_VIOLATION) => {
                return PortError::Conflict("record already exists".to_string())
            }
            Some(PG_FOREIGN_KEY_VIOLATION) => {
                return PortError::NotFound("referenced record does not exist".to_string())
            }
            _ => {}
        }
    }
    PortError::Unexpected(e.to_string())
}

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A database adapter that implements the `DatabaseService` port.
#[derive(Clone)]
pub struct DbAdapter {
    pool: PgPool,
}

impl DbAdapter {
    /// Creates a new `DbAdapter`.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// A helper function to run database migrations at startup.
    pub async fn run_migrations(&self) -> Result<(), sqlx::Error> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }
}

//=========================================================================================
// "Impure" Database Record Structs
//=========================================================================================

#[derive(FromRow)]
struct UserRecord {
    id: Uuid,
    name: String,
    email: String,
    role: String,
    created_at: DateTime<Utc>,
}
impl UserRecord {
    fn to_domain(self) -> PortResult<User> {
        let role = self
            .role
            .parse::<Role>()
            .map_err(PortError::Unexpected)?;
        Ok(User {
            id: self.id,
            name: self.name,
            email: self.email,
            role,
            created_at: self.created_at,
        })
    }
}

#[derive(FromRow)]
struct SessionRecord {
    id: Uuid,
    title: String,
    description: String,
    tutor_name: String,
    tutor_email: String,
    registration_fee: f64,
    status: String,
    rejection_reason: Option<String>,
    participant_count: i64,
    created_at: DateTime<Utc>,
}
impl SessionRecord {
    fn to_domain(self) -> PortResult<StudySession> {
        let status = self
            .status
            .parse::<ApprovalStatus>()
            .map_err(PortError::Unexpected)?;
        Ok(StudySession {
            id: self.id,
            title: self.title,
            description: self.description,
            tutor_name: self.tutor_name,
            tutor_email: self.tutor_email,
            registration_fee: self.registration_fee,
            status,
            rejection_reason: self.rejection_reason,
            participant_count: self.participant_count,
            created_at: self.created_at,
        })
    }
}

#[derive(FromRow)]
struct BookingRecord {
    id: Uuid,
    session_id: Uuid,
    session_title: String,
    tutor_email: String,
    student_email: String,
    student_name: String,
    registration_fee: f64,
    payment_intent_id: Option<String>,
    created_at: DateTime<Utc>,
}
impl BookingRecord {
    fn to_domain(self) -> Booking {
        Booking {
            id: self.id,
            session_id: self.session_id,
            session_title: self.session_title,
            tutor_email: self.tutor_email,
            student_email: self.student_email,
            student_name: self.student_name,
            registration_fee: self.registration_fee,
            payment_intent_id: self.payment_intent_id,
            created_at: self.created_at,
        }
    }
}

#[derive(FromRow)]
struct ReviewRecord {
    id: Uuid,
    session_id: Uuid,
    student_email: String,
    student_name: String,
    rating: i32,
    comment: String,
    created_at: DateTime<Utc>,
}
impl ReviewRecord {
    fn to_domain(self) -> Review {
        Review {
            id: self.id,
            session_id: self.session_id,
            student_email: self.student_email,
            student_name: self.student_name,
            rating: self.rating,
            comment: self.comment,
            created_at: self.created_at,
        }
    }
}

#[derive(FromRow)]
struct NoteRecord {
    id: Uuid,
    owner_email: String,
    title: String,
    content: String,
    created_at: DateTime<Utc>,
}
impl NoteRecord {
    fn to_domain(self) -> Note {
        Note {
            id: self.id,
            owner_email: self.owner_email,
            title: self.title,
            content: self.content,
            created_at: self.created_at,
        }
    }
}

#[derive(FromRow)]
struct MaterialRecord {
    id: Uuid,
    session_id: Uuid,
    tutor_email: String,
    title: String,
    url: String,
    created_at: DateTime<Utc>,
}
impl MaterialRecord {
    fn to_domain(self) -> Material {
        Material {
            id: self.id,
            session_id: self.session_id,
            tutor_email: self.tutor_email,
            title: self.title,
            url: self.url,
            created_at: self.created_at,
        }
    }
}

const USER_COLUMNS: &str = "id, name, email, role, created_at";
const SESSION_COLUMNS: &str = "id, title, description, tutor_name, tutor_email, \
     registration_fee, status, rejection_reason, participant_count, created_at";
const BOOKING_COLUMNS: &str = "id, session_id, session_title, tutor_email, \
     student_email, student_name, registration_fee, payment_intent_id, created_at";

//=========================================================================================
// `DatabaseService` Trait Implementation
//=========================================================================================

#[async_trait]
impl DatabaseService for DbAdapter {
    // --- User Management ---

    async fn upsert_user(&self, name: &str, email: &str) -> PortResult<User> {
        sqlx::query("INSERT INTO users (id, name, email) VALUES ($1, $2, $3) ON CONFLICT (email) DO NOTHING")
            .bind(Uuid::new_v4())
            .bind(name)
            .bind(email)
            .execute(&self.pool)
            .await
            .map_err(map_db_err)?;

        let record = sqlx::query_as::<_, UserRecord>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1"
        ))
        .bind(email)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => PortError::NotFound(format!("User {} not found", email)),
            _ => map_db_err(e),
        })?;

        record.to_domain()
    }

    async fn get_user_by_email(&self, email: &str) -> PortResult<User> {
        let record = sqlx::query_as::<_, UserRecord>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_err)?
        .ok_or_else(|| PortError::NotFound(format!("User {} not found", email)))?;

        record.to_domain()
    }

    async fn list_users(&self, page: Page) -> PortResult<Vec<User>> {
        let records = sqlx::query_as::<_, UserRecord>(&format!(
            "SELECT {USER_COLUMNS} FROM users ORDER BY created_at LIMIT $1 OFFSET $2"
        ))
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_err)?;

        records.into_iter().map(|r| r.to_domain()).collect()
    }

    async fn count_users(&self) -> PortResult<i64> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await
            .map_err(map_db_err)
    }

    async fn update_user_role(&self, email: &str, role: Role) -> PortResult<User> {
        let record = sqlx::query_as::<_, UserRecord>(&format!(
            "UPDATE users SET role = $1 WHERE email = $2 RETURNING {USER_COLUMNS}"
        ))
        .bind(role.as_str())
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_err)?
        .ok_or_else(|| PortError::NotFound(format!("User {} not found", email)))?;

        record.to_domain()
    }

    // --- Study Sessions ---

    async fn create_session(&self, session: NewStudySession) -> PortResult<StudySession> {
        let record = sqlx::query_as::<_, SessionRecord>(&format!(
            "INSERT INTO study_sessions (id, title, description, tutor_name, tutor_email, registration_fee) \
             VALUES ($1, $2, $3, $4, $5, $6) RETURNING {SESSION_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(&session.title)
        .bind(&session.description)
        .bind(&session.tutor_name)
        .bind(&session.tutor_email)
        .bind(session.registration_fee)
        .fetch_one(&self.pool)
        .await
        .map_err(map_db_err)?;

        record.to_domain()
    }

    async fn get_session_by_id(&self, session_id: Uuid) -> PortResult<StudySession> {
        let record = sqlx::query_as::<_, SessionRecord>(&format!(
            "SELECT {SESSION_COLUMNS} FROM study_sessions WHERE id = $1"
        ))
        .bind(session_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_err)?
        .ok_or_else(|| PortError::NotFound(format!("Session {} not found", session_id)))?;

        record.to_domain()
    }

    async fn list_sessions(
        &self,
        status: Option<ApprovalStatus>,
        page: Page,
    ) -> PortResult<Vec<StudySession>> {
        let records = sqlx::query_as::<_, SessionRecord>(&format!(
            "SELECT {SESSION_COLUMNS} FROM study_sessions \
             WHERE ($1::TEXT IS NULL OR status = $1) \
             ORDER BY created_at LIMIT $2 OFFSET $3"
        ))
        .bind(status.map(|s| s.as_str()))
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_err)?;

        records.into_iter().map(|r| r.to_domain()).collect()
    }

    async fn count_sessions(&self, status: Option<ApprovalStatus>) -> PortResult<i64> {
        sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM study_sessions WHERE ($1::TEXT IS NULL OR status = $1)",
        )
        .bind(status.map(|s| s.as_str()))
        .fetch_one(&self.pool)
        .await
        .map_err(map_db_err)
    }

    async fn list_sessions_by_tutor(&self, tutor_email: &str) -> PortResult<Vec<StudySession>> {
        let records = sqlx::query_as::<_, SessionRecord>(&format!(
            "SELECT {SESSION_COLUMNS} FROM study_sessions WHERE tutor_email = $1 ORDER BY created_at"
        ))
        .bind(tutor_email)
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_err)?;

        records.into_iter().map(|r| r.to_domain()).collect()
    }

    async fn update_session(
        &self,
        session_id: Uuid,
        update: StudySessionUpdate,
    ) -> PortResult<StudySession> {
        let record = sqlx::query_as::<_, SessionRecord>(&format!(
            "UPDATE study_sessions SET \
                 status = COALESCE($1, status), \
                 registration_fee = COALESCE($2, registration_fee), \
                 rejection_reason = COALESCE($3, rejection_reason) \
             WHERE id = $4 RETURNING {SESSION_COLUMNS}"
        ))
        .bind(update.status.map(|s| s.as_str()))
        .bind(update.registration_fee)
        .bind(update.rejection_reason)
        .bind(session_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_err)?
        .ok_or_else(|| PortError::NotFound(format!("Session {} not found", session_id)))?;

        record.to_domain()
    }

    // --- Bookings ---

    /// The booking workflow. The unique index on (session_id, student_email)
    /// is the correctness guarantee under concurrent duplicate submissions;
    /// the conditional insert just turns the violation into a clean miss.
    /// Insert and counter increment share one transaction, so a failure in
    /// either leaves no partial effect.
    async fn create_booking(&self, booking: NewBooking) -> PortResult<Booking> {
        let mut tx = self.pool.begin().await.map_err(map_db_err)?;

        let record = sqlx::query_as::<_, BookingRecord>(&format!(
            "INSERT INTO bookings (id, session_id, session_title, tutor_email, \
                 student_email, student_name, registration_fee, payment_intent_id) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
             ON CONFLICT (session_id, student_email) DO NOTHING \
             RETURNING {BOOKING_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(booking.session_id)
        .bind(&booking.session_title)
        .bind(&booking.tutor_email)
        .bind(&booking.student_email)
        .bind(&booking.student_name)
        .bind(booking.registration_fee)
        .bind(&booking.payment_intent_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(map_db_err)?
        .ok_or_else(|| {
            PortError::Conflict(format!(
                "{} already booked session {}",
                booking.student_email, booking.session_id
            ))
        })?;

        let updated = sqlx::query(
            "UPDATE study_sessions SET participant_count = participant_count + 1 WHERE id = $1",
        )
        .bind(booking.session_id)
        .execute(&mut *tx)
        .await
        .map_err(map_db_err)?;

        if updated.rows_affected() == 0 {
            // Dropping the transaction rolls back the booking insert.
            return Err(PortError::NotFound(format!(
                "Session {} not found",
                booking.session_id
            )));
        }

        tx.commit().await.map_err(map_db_err)?;
        Ok(record.to_domain())
    }

    async fn list_bookings_by_student(&self, student_email: &str) -> PortResult<Vec<Booking>> {
        let records = sqlx::query_as::<_, BookingRecord>(&format!(
            "SELECT {BOOKING_COLUMNS} FROM bookings WHERE student_email = $1 ORDER BY created_at"
        ))
        .bind(student_email)
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_err)?;

        Ok(records.into_iter().map(|r| r.to_domain()).collect())
    }

    // --- Reviews ---

    async fn create_review(&self, review: NewReview) -> PortResult<Review> {
        let record = sqlx::query_as::<_, ReviewRecord>(
            "INSERT INTO reviews (id, session_id, student_email, student_name, rating, comment) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             RETURNING id, session_id, student_email, student_name, rating, comment, created_at",
        )
        .bind(Uuid::new_v4())
        .bind(review.session_id)
        .bind(&review.student_email)
        .bind(&review.student_name)
        .bind(review.rating)
        .bind(&review.comment)
        .fetch_one(&self.pool)
        .await
        .map_err(map_db_err)?;

        Ok(record.to_domain())
    }

    async fn list_reviews_for_session(&self, session_id: Uuid) -> PortResult<Vec<Review>> {
        let records = sqlx::query_as::<_, ReviewRecord>(
            "SELECT id, session_id, student_email, student_name, rating, comment, created_at \
             FROM reviews WHERE session_id = $1 ORDER BY created_at",
        )
        .bind(session_id)
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_err)?;

        Ok(records.into_iter().map(|r| r.to_domain()).collect())
    }

    // --- Notes ---

    async fn create_note(&self, note: NewNote) -> PortResult<Note> {
        let record = sqlx::query_as::<_, NoteRecord>(
            "INSERT INTO notes (id, owner_email, title, content) VALUES ($1, $2, $3, $4) \
             RETURNING id, owner_email, title, content, created_at",
        )
        .bind(Uuid::new_v4())
        .bind(&note.owner_email)
        .bind(&note.title)
        .bind(&note.content)
        .fetch_one(&self.pool)
        .await
        .map_err(map_db_err)?;

        Ok(record.to_domain())
    }

    async fn list_notes_by_owner(&self, owner_email: &str) -> PortResult<Vec<Note>> {
        let records = sqlx::query_as::<_, NoteRecord>(
            "SELECT id, owner_email, title, content, created_at FROM notes \
             WHERE owner_email = $1 ORDER BY created_at",
        )
        .bind(owner_email)
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_err)?;

        Ok(records.into_iter().map(|r| r.to_domain()).collect())
    }

    async fn update_note(
        &self,
        note_id: Uuid,
        owner_email: &str,
        title: &str,
        content: &str,
    ) -> PortResult<Note> {
        // Filtering on the owner as well as the id means a foreign note id
        // behaves exactly like a missing one.
        let record = sqlx::query_as::<_, NoteRecord>(
            "UPDATE notes SET title = $1, content = $2 \
             WHERE id = $3 AND owner_email = $4 \
             RETURNING id, owner_email, title, content, created_at",
        )
        .bind(title)
        .bind(content)
        .bind(note_id)
        .bind(owner_email)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_err)?
        .ok_or_else(|| PortError::NotFound(format!("Note {} not found", note_id)))?;

        Ok(record.to_domain())
    }

    async fn delete_note(&self, note_id: Uuid, owner_email: &str) -> PortResult<()> {
        let result = sqlx::query("DELETE FROM notes WHERE id = $1 AND owner_email = $2")
            .bind(note_id)
            .bind(owner_email)
            .execute(&self.pool)
            .await
            .map_err(map_db_err)?;

        if result.rows_affected() == 0 {
            return Err(PortError::NotFound(format!("Note {} not found", note_id)));
        }
        Ok(())
    }

    // --- Materials ---

    async fn create_material(&self, material: NewMaterial) -> PortResult<Material> {
        let record = sqlx::query_as::<_, MaterialRecord>(
            "INSERT INTO materials (id, session_id, tutor_email, title, url) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING id, session_id, tutor_email, title, url, created_at",
        )
        .bind(Uuid::new_v4())
        .bind(material.session_id)
        .bind(&material.tutor_email)
        .bind(&material.title)
        .bind(&material.url)
        .fetch_one(&self.pool)
        .await
        .map_err(map_db_err)?;

        Ok(record.to_domain())
    }

    async fn list_materials_by_tutor(&self, tutor_email: &str) -> PortResult<Vec<Material>> {
        let records = sqlx::query_as::<_, MaterialRecord>(
            "SELECT id, session_id, tutor_email, title, url, created_at FROM materials \
             WHERE tutor_email = $1 ORDER BY created_at",
        )
        .bind(tutor_email)
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_err)?;

        Ok(records.into_iter().map(|r| r.to_domain()).collect())
    }

    async fn list_materials(&self, page: Page) -> PortResult<Vec<Material>> {
        let records = sqlx::query_as::<_, MaterialRecord>(
            "SELECT id, session_id, tutor_email, title, url, created_at FROM materials \
             ORDER BY created_at LIMIT $1 OFFSET $2",
        )
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_err)?;

        Ok(records.into_iter().map(|r| r.to_domain()).collect())
    }

    async fn count_materials(&self) -> PortResult<i64> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM materials")
            .fetch_one(&self.pool)
            .await
            .map_err(map_db_err)
    }

    async fn update_material(
        &self,
        material_id: Uuid,
        tutor_email: &str,
        title: &str,
        url: &str,
    ) -> PortResult<Material> {
        let record = sqlx::query_as::<_, MaterialRecord>(
            "UPDATE materials SET title = $1, url = $2 \
             WHERE id = $3 AND tutor_email = $4 \
             RETURNING id, session_id, tutor_email, title, url, created_at",
        )
        .bind(title)
        .bind(url)
        .bind(material_id)
        .bind(tutor_email)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_err)?
        .ok_or_else(|| PortError::NotFound(format!("Material {} not found", material_id)))?;

        Ok(record.to_domain())
    }

    async fn delete_material(
        &self,
        material_id: Uuid,
        owner_email: Option<&str>,
    ) -> PortResult<()> {
        let result = sqlx::query(
            "DELETE FROM materials WHERE id = $1 AND ($2::TEXT IS NULL OR tutor_email = $2)",
        )
        .bind(material_id)
        .bind(owner_email)
        .execute(&self.pool)
        .await
        .map_err(map_db_err)?;

        if result.rows_affected() == 0 {
            return Err(PortError::NotFound(format!(
                "Material {} not found",
                material_id
            )));
        }
        Ok(())
    }
}
