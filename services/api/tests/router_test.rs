//! Integration tests for the API router: authentication and role gates,
//! the booking workflow, note ownership, pagination, and the payment
//! short-circuit. The router runs against in-memory mock ports, so no
//! database or network is involved.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use chrono::Utc;
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;

use api_lib::config::Config;
use api_lib::web::{auth::TokenIssuer, build_router, state::AppState};
use studyhub_core::domain::{
    ApprovalStatus, Booking, Material, NewBooking, NewMaterial, NewNote, NewReview,
    NewStudySession, Note, Review, Role, StudySession, StudySessionUpdate, User,
};
use studyhub_core::ports::{DatabaseService, Page, PaymentService, PortError, PortResult};

const TEST_SECRET: &str = "integration-test-secret-at-least-32-chars";

//=========================================================================================
// Mock Ports
//=========================================================================================

#[derive(Default)]
struct MockDb {
    users: Mutex<HashMap<String, User>>,
    sessions: Mutex<Vec<StudySession>>,
    bookings: Mutex<Vec<Booking>>,
    notes: Mutex<Vec<Note>>,
    materials: Mutex<Vec<Material>>,
    reviews: Mutex<Vec<Review>>,
}

impl MockDb {
    fn add_user(&self, email: &str, role: Role) {
        let mut users = self.users.lock().unwrap();
        users.insert(
            email.to_string(),
            User {
                id: Uuid::new_v4(),
                name: email.split('@').next().unwrap_or("user").to_string(),
                email: email.to_string(),
                role,
                created_at: Utc::now(),
            },
        );
    }

    fn set_role(&self, email: &str, role: Role) {
        let mut users = self.users.lock().unwrap();
        if let Some(user) = users.get_mut(email) {
            user.role = role;
        }
    }

    fn add_session(&self, title: &str, status: ApprovalStatus) -> Uuid {
        let id = Uuid::new_v4();
        self.sessions.lock().unwrap().push(StudySession {
            id,
            title: title.to_string(),
            description: "desc".to_string(),
            tutor_name: "Tutor".to_string(),
            tutor_email: "tutor@example.com".to_string(),
            registration_fee: 10.0,
            status,
            rejection_reason: None,
            participant_count: 0,
            created_at: Utc::now(),
        });
        id
    }

    fn participant_count(&self, session_id: Uuid) -> i64 {
        self.sessions
            .lock()
            .unwrap()
            .iter()
            .find(|s| s.id == session_id)
            .map(|s| s.participant_count)
            .unwrap()
    }

    fn booking_count(&self) -> usize {
        self.bookings.lock().unwrap().len()
    }
}

fn unexercised<T>() -> PortResult<T> {
    Err(PortError::Unexpected(
        "not exercised by this test".to_string(),
    ))
}

#[async_trait]
impl DatabaseService for MockDb {
    async fn upsert_user(&self, name: &str, email: &str) -> PortResult<User> {
        let mut users = self.users.lock().unwrap();
        let user = users.entry(email.to_string()).or_insert_with(|| User {
            id: Uuid::new_v4(),
            name: name.to_string(),
            email: email.to_string(),
            role: Role::Student,
            created_at: Utc::now(),
        });
        Ok(user.clone())
    }

    async fn get_user_by_email(&self, email: &str) -> PortResult<User> {
        self.users
            .lock()
            .unwrap()
            .get(email)
            .cloned()
            .ok_or_else(|| PortError::NotFound(format!("User {} not found", email)))
    }

    async fn list_users(&self, page: Page) -> PortResult<Vec<User>> {
        let mut users: Vec<User> = self.users.lock().unwrap().values().cloned().collect();
        users.sort_by_key(|u| u.created_at);
        Ok(users
            .into_iter()
            .skip(page.offset() as usize)
            .take(page.limit() as usize)
            .collect())
    }

    async fn count_users(&self) -> PortResult<i64> {
        Ok(self.users.lock().unwrap().len() as i64)
    }

    async fn update_user_role(&self, email: &str, role: Role) -> PortResult<User> {
        let mut users = self.users.lock().unwrap();
        let user = users
            .get_mut(email)
            .ok_or_else(|| PortError::NotFound(format!("User {} not found", email)))?;
        user.role = role;
        Ok(user.clone())
    }

    async fn create_session(&self, session: NewStudySession) -> PortResult<StudySession> {
        let created = StudySession {
            id: Uuid::new_v4(),
            title: session.title,
            description: session.description,
            tutor_name: session.tutor_name,
            tutor_email: session.tutor_email,
            registration_fee: session.registration_fee,
            status: ApprovalStatus::Pending,
            rejection_reason: None,
            participant_count: 0,
            created_at: Utc::now(),
        };
        self.sessions.lock().unwrap().push(created.clone());
        Ok(created)
    }

    async fn get_session_by_id(&self, session_id: Uuid) -> PortResult<StudySession> {
        self.sessions
            .lock()
            .unwrap()
            .iter()
            .find(|s| s.id == session_id)
            .cloned()
            .ok_or_else(|| PortError::NotFound(format!("Session {} not found", session_id)))
    }

    async fn list_sessions(
        &self,
        status: Option<ApprovalStatus>,
        page: Page,
    ) -> PortResult<Vec<StudySession>> {
        let sessions = self.sessions.lock().unwrap();
        Ok(sessions
            .iter()
            .filter(|s| status.map_or(true, |wanted| s.status == wanted))
            .skip(page.offset() as usize)
            .take(page.limit() as usize)
            .cloned()
            .collect())
    }

    async fn count_sessions(&self, status: Option<ApprovalStatus>) -> PortResult<i64> {
        let sessions = self.sessions.lock().unwrap();
        Ok(sessions
            .iter()
            .filter(|s| status.map_or(true, |wanted| s.status == wanted))
            .count() as i64)
    }

    async fn list_sessions_by_tutor(&self, _tutor_email: &str) -> PortResult<Vec<StudySession>> {
        unexercised()
    }

    async fn update_session(
        &self,
        _session_id: Uuid,
        _update: StudySessionUpdate,
    ) -> PortResult<StudySession> {
        unexercised()
    }

    async fn create_booking(&self, booking: NewBooking) -> PortResult<Booking> {
        // One lock guards both collections, mirroring the adapter's single
        // transaction: no partial effect is observable.
        let mut sessions = self.sessions.lock().unwrap();
        let mut bookings = self.bookings.lock().unwrap();

        if bookings
            .iter()
            .any(|b| b.session_id == booking.session_id && b.student_email == booking.student_email)
        {
            return Err(PortError::Conflict("already booked".to_string()));
        }

        let session = sessions
            .iter_mut()
            .find(|s| s.id == booking.session_id)
            .ok_or_else(|| PortError::NotFound("session not found".to_string()))?;
        session.participant_count += 1;

        let created = Booking {
            id: Uuid::new_v4(),
            session_id: booking.session_id,
            session_title: booking.session_title,
            tutor_email: booking.tutor_email,
            student_email: booking.student_email,
            student_name: booking.student_name,
            registration_fee: booking.registration_fee,
            payment_intent_id: booking.payment_intent_id,
            created_at: Utc::now(),
        };
        bookings.push(created.clone());
        Ok(created)
    }

    async fn list_bookings_by_student(&self, student_email: &str) -> PortResult<Vec<Booking>> {
        Ok(self
            .bookings
            .lock()
            .unwrap()
            .iter()
            .filter(|b| b.student_email == student_email)
            .cloned()
            .collect())
    }

    async fn create_review(&self, review: NewReview) -> PortResult<Review> {
        let created = Review {
            id: Uuid::new_v4(),
            session_id: review.session_id,
            student_email: review.student_email,
            student_name: review.student_name,
            rating: review.rating,
            comment: review.comment,
            created_at: Utc::now(),
        };
        self.reviews.lock().unwrap().push(created.clone());
        Ok(created)
    }

    async fn list_reviews_for_session(&self, session_id: Uuid) -> PortResult<Vec<Review>> {
        Ok(self
            .reviews
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.session_id == session_id)
            .cloned()
            .collect())
    }

    async fn create_note(&self, note: NewNote) -> PortResult<Note> {
        let created = Note {
            id: Uuid::new_v4(),
            owner_email: note.owner_email,
            title: note.title,
            content: note.content,
            created_at: Utc::now(),
        };
        self.notes.lock().unwrap().push(created.clone());
        Ok(created)
    }

    async fn list_notes_by_owner(&self, owner_email: &str) -> PortResult<Vec<Note>> {
        Ok(self
            .notes
            .lock()
            .unwrap()
            .iter()
            .filter(|n| n.owner_email == owner_email)
            .cloned()
            .collect())
    }

    async fn update_note(
        &self,
        note_id: Uuid,
        owner_email: &str,
        title: &str,
        content: &str,
    ) -> PortResult<Note> {
        let mut notes = self.notes.lock().unwrap();
        let note = notes
            .iter_mut()
            .find(|n| n.id == note_id && n.owner_email == owner_email)
            .ok_or_else(|| PortError::NotFound(format!("Note {} not found", note_id)))?;
        note.title = title.to_string();
        note.content = content.to_string();
        Ok(note.clone())
    }

    async fn delete_note(&self, note_id: Uuid, owner_email: &str) -> PortResult<()> {
        let mut notes = self.notes.lock().unwrap();
        let before = notes.len();
        notes.retain(|n| !(n.id == note_id && n.owner_email == owner_email));
        if notes.len() == before {
            return Err(PortError::NotFound(format!("Note {} not found", note_id)));
        }
        Ok(())
    }

    async fn create_material(&self, material: NewMaterial) -> PortResult<Material> {
        let created = Material {
            id: Uuid::new_v4(),
            session_id: material.session_id,
            tutor_email: material.tutor_email,
            title: material.title,
            url: material.url,
            created_at: Utc::now(),
        };
        self.materials.lock().unwrap().push(created.clone());
        Ok(created)
    }

    async fn list_materials_by_tutor(&self, tutor_email: &str) -> PortResult<Vec<Material>> {
        Ok(self
            .materials
            .lock()
            .unwrap()
            .iter()
            .filter(|m| m.tutor_email == tutor_email)
            .cloned()
            .collect())
    }

    async fn list_materials(&self, page: Page) -> PortResult<Vec<Material>> {
        let materials = self.materials.lock().unwrap();
        Ok(materials
            .iter()
            .skip(page.offset() as usize)
            .take(page.limit() as usize)
            .cloned()
            .collect())
    }

    async fn count_materials(&self) -> PortResult<i64> {
        Ok(self.materials.lock().unwrap().len() as i64)
    }

    async fn update_material(
        &self,
        material_id: Uuid,
        tutor_email: &str,
        title: &str,
        url: &str,
    ) -> PortResult<Material> {
        let mut materials = self.materials.lock().unwrap();
        let material = materials
            .iter_mut()
            .find(|m| m.id == material_id && m.tutor_email == tutor_email)
            .ok_or_else(|| PortError::NotFound(format!("Material {} not found", material_id)))?;
        material.title = title.to_string();
        material.url = url.to_string();
        Ok(material.clone())
    }

    async fn delete_material(
        &self,
        material_id: Uuid,
        owner_email: Option<&str>,
    ) -> PortResult<()> {
        let mut materials = self.materials.lock().unwrap();
        let before = materials.len();
        materials.retain(|m| {
            !(m.id == material_id && owner_email.map_or(true, |owner| m.tutor_email == owner))
        });
        if materials.len() == before {
            return Err(PortError::NotFound(format!(
                "Material {} not found",
                material_id
            )));
        }
        Ok(())
    }
}

/// Counts calls so tests can assert the collaborator was never reached.
#[derive(Default)]
struct MockPayments {
    calls: AtomicUsize,
}

#[async_trait]
impl PaymentService for MockPayments {
    async fn create_payment_intent(
        &self,
        amount_minor: i64,
        _currency: &str,
    ) -> PortResult<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(format!("pi_secret_{amount_minor}"))
    }
}

//=========================================================================================
// Test Harness
//=========================================================================================

struct Harness {
    router: Router,
    db: Arc<MockDb>,
    payments: Arc<MockPayments>,
    tokens: TokenIssuer,
}

fn harness() -> Harness {
    let db = Arc::new(MockDb::default());
    let payments = Arc::new(MockPayments::default());
    let tokens = TokenIssuer::new(TEST_SECRET.to_string());

    let config = Arc::new(Config {
        bind_address: "127.0.0.1:0".parse().unwrap(),
        database_url: "postgres://unused".to_string(),
        log_level: tracing::Level::INFO,
        jwt_secret: TEST_SECRET.to_string(),
        stripe_secret_key: "sk_test_unused".to_string(),
        allowed_origins: vec![],
    });

    let state = Arc::new(AppState {
        db: db.clone(),
        payments: payments.clone(),
        tokens: tokens.clone(),
        config,
    });

    Harness {
        router: build_router(state),
        db,
        payments,
        tokens,
    }
}

impl Harness {
    fn token_for(&self, email: &str, role: Role) -> String {
        self.tokens.issue(email, role).unwrap()
    }

    async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, body)
    }
}

fn get(path: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri(path);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(Body::empty()).unwrap()
}

fn send_json(method: &str, path: &str, token: Option<&str>, body: &Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(path)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

//=========================================================================================
// Authentication & Role Gates
//=========================================================================================

#[tokio::test]
async fn protected_route_rejects_missing_or_invalid_token() {
    let h = harness();
    h.db.add_user("a@example.com", Role::Student);

    let (status, _) = h.send(get("/user/a@example.com", None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = h.send(get("/user/a@example.com", Some("garbage"))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn valid_token_reaches_protected_route() {
    let h = harness();
    h.db.add_user("a@example.com", Role::Student);
    let token = h.token_for("a@example.com", Role::Student);

    let (status, body) = h.send(get("/user/a@example.com", Some(&token))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["email"], "a@example.com");
}

#[tokio::test]
async fn role_gate_reads_the_store_not_the_token() {
    let h = harness();
    // The token claims tutor, but the store says student.
    h.db.add_user("t@example.com", Role::Student);
    let token = h.token_for("t@example.com", Role::Tutor);

    let payload = json!({
        "title": "Algebra",
        "description": "Basics",
        "tutorName": "T",
        "tutorEmail": "t@example.com",
        "registrationFee": 5.0
    });

    let (status, _) = h
        .send(send_json("POST", "/create-study-session", Some(&token), &payload))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // Promote in the store; the very same token now passes.
    h.db.set_role("t@example.com", Role::Tutor);
    let (status, body) = h
        .send(send_json("POST", "/create-study-session", Some(&token), &payload))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["status"], "pending");
    assert_eq!(body["participant_count"], 0);
}

#[tokio::test]
async fn admin_routes_reject_non_admins() {
    let h = harness();
    h.db.add_user("s@example.com", Role::Student);
    h.db.add_user("boss@example.com", Role::Admin);

    let student = h.token_for("s@example.com", Role::Student);
    let (status, _) = h.send(get("/allUsers", Some(&student))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let admin = h.token_for("boss@example.com", Role::Admin);
    let (status, body) = h.send(get("/allUsers", Some(&admin))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn jwt_endpoint_issues_a_usable_token() {
    let h = harness();
    h.db.add_user("new@example.com", Role::Student);

    let (status, body) = h
        .send(send_json(
            "POST",
            "/jwt",
            None,
            &json!({ "email": "new@example.com" }),
        ))
        .await;
    assert_eq!(status, StatusCode::OK);
    let token = body["token"].as_str().unwrap().to_string();

    let (status, body) = h.send(get("/user/new@example.com", Some(&token))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["email"], "new@example.com");
}

//=========================================================================================
// Booking Workflow
//=========================================================================================

fn booking_payload(session_id: Uuid) -> Value {
    json!({
        "sessionId": session_id,
        "sessionTitle": "Algebra",
        "tutorEmail": "tutor@example.com",
        "studentName": "Student",
        "registrationFee": 10.0
    })
}

#[tokio::test]
async fn booking_succeeds_once_and_conflicts_after() {
    let h = harness();
    h.db.add_user("s@example.com", Role::Student);
    let session_id = h.db.add_session("Algebra", ApprovalStatus::Approved);
    let token = h.token_for("s@example.com", Role::Student);

    let (status, body) = h
        .send(send_json("POST", "/booking", Some(&token), &booking_payload(session_id)))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    // The student identity comes from the credential, not the payload.
    assert_eq!(body["student_email"], "s@example.com");
    assert_eq!(h.db.participant_count(session_id), 1);

    // A duplicate for the same (session, student) pair mutates nothing.
    let (status, _) = h
        .send(send_json("POST", "/booking", Some(&token), &booking_payload(session_id)))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(h.db.participant_count(session_id), 1);
    assert_eq!(h.db.booking_count(), 1);
}

#[tokio::test]
async fn distinct_students_each_increment_the_counter() {
    let h = harness();
    let session_id = h.db.add_session("Algebra", ApprovalStatus::Approved);

    for i in 0..3 {
        let email = format!("s{i}@example.com");
        h.db.add_user(&email, Role::Student);
        let token = h.token_for(&email, Role::Student);
        let (status, _) = h
            .send(send_json("POST", "/booking", Some(&token), &booking_payload(session_id)))
            .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    assert_eq!(h.db.participant_count(session_id), 3);
}

#[tokio::test]
async fn booking_unknown_session_is_not_found() {
    let h = harness();
    h.db.add_user("s@example.com", Role::Student);
    let token = h.token_for("s@example.com", Role::Student);

    let (status, _) = h
        .send(send_json(
            "POST",
            "/booking",
            Some(&token),
            &booking_payload(Uuid::new_v4()),
        ))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(h.db.booking_count(), 0);
}

//=========================================================================================
// Notes: Ownership Isolation
//=========================================================================================

#[tokio::test]
async fn note_crud_never_crosses_owners() {
    let h = harness();
    h.db.add_user("alice@example.com", Role::Student);
    h.db.add_user("bob@example.com", Role::Student);
    let alice = h.token_for("alice@example.com", Role::Student);
    let bob = h.token_for("bob@example.com", Role::Student);

    let (status, body) = h
        .send(send_json(
            "POST",
            "/note",
            Some(&alice),
            &json!({ "title": "Vocab", "content": "irregular verbs" }),
        ))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let note_id = body["id"].as_str().unwrap().to_string();

    // Bob cannot list Alice's notes even by naming her email.
    let (status, _) = h.send(get("/notes/alice@example.com", Some(&bob))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // Bob cannot update or delete Alice's note even with its id.
    let (status, _) = h
        .send(send_json(
            "PUT",
            &format!("/note/{note_id}"),
            Some(&bob),
            &json!({ "title": "stolen", "content": "stolen" }),
        ))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = h
        .send(send_json(
            "DELETE",
            &format!("/note/{note_id}"),
            Some(&bob),
            &json!({}),
        ))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // Alice still sees her untouched note and may delete it.
    let (status, body) = h.send(get("/notes/alice@example.com", Some(&alice))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);
    assert_eq!(body[0]["title"], "Vocab");

    let (status, _) = h
        .send(send_json(
            "DELETE",
            &format!("/note/{note_id}"),
            Some(&alice),
            &json!({}),
        ))
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);
}

//=========================================================================================
// Materials: Ownership & Admin Override
//=========================================================================================

#[tokio::test]
async fn material_crud_never_crosses_tutors() {
    let h = harness();
    h.db.add_user("anna@example.com", Role::Tutor);
    h.db.add_user("ben@example.com", Role::Tutor);
    let anna = h.token_for("anna@example.com", Role::Tutor);
    let ben = h.token_for("ben@example.com", Role::Tutor);
    let session_id = h.db.add_session("Algebra", ApprovalStatus::Approved);

    let (status, body) = h
        .send(send_json(
            "POST",
            "/material",
            Some(&anna),
            &json!({ "sessionId": session_id, "title": "Slides", "url": "https://example.com/slides" }),
        ))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    // Ownership comes from the credential, not the payload.
    assert_eq!(body["tutor_email"], "anna@example.com");
    let material_id = body["id"].as_str().unwrap().to_string();

    // Another tutor cannot update or delete it even with its id.
    let (status, _) = h
        .send(send_json(
            "PUT",
            &format!("/material/{material_id}"),
            Some(&ben),
            &json!({ "title": "stolen", "url": "https://example.com/stolen" }),
        ))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = h
        .send(send_json(
            "DELETE",
            &format!("/material/{material_id}"),
            Some(&ben),
            &json!({}),
        ))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // Nor list the owner's materials by naming her email.
    let (status, _) = h
        .send(get("/tutorMaterials/anna@example.com", Some(&ben)))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // The owner still sees the untouched material and may update it.
    let (status, body) = h
        .send(get("/tutorMaterials/anna@example.com", Some(&anna)))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);
    assert_eq!(body[0]["title"], "Slides");

    let (status, body) = h
        .send(send_json(
            "PUT",
            &format!("/material/{material_id}"),
            Some(&anna),
            &json!({ "title": "Slides v2", "url": "https://example.com/slides" }),
        ))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["title"], "Slides v2");
}

#[tokio::test]
async fn admin_may_delete_any_material() {
    let h = harness();
    h.db.add_user("anna@example.com", Role::Tutor);
    h.db.add_user("boss@example.com", Role::Admin);
    let anna = h.token_for("anna@example.com", Role::Tutor);
    let admin = h.token_for("boss@example.com", Role::Admin);
    let session_id = h.db.add_session("Algebra", ApprovalStatus::Approved);

    let (status, body) = h
        .send(send_json(
            "POST",
            "/material",
            Some(&anna),
            &json!({ "sessionId": session_id, "title": "Slides", "url": "https://example.com/slides" }),
        ))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let material_id = body["id"].as_str().unwrap().to_string();

    // The admin owns nothing, but the stored role widens the delete to any
    // owner.
    let (status, _) = h
        .send(send_json(
            "DELETE",
            &format!("/material/{material_id}"),
            Some(&admin),
            &json!({}),
        ))
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, body) = h
        .send(get("/tutorMaterials/anna@example.com", Some(&anna)))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 0);
}

//=========================================================================================
// Reviews
//=========================================================================================

#[tokio::test]
async fn review_create_and_list_round_trip() {
    let h = harness();
    h.db.add_user("s@example.com", Role::Student);
    let token = h.token_for("s@example.com", Role::Student);
    let session_id = h.db.add_session("Algebra", ApprovalStatus::Approved);

    // An out-of-range rating is rejected before the store is touched.
    let (status, _) = h
        .send(send_json(
            "POST",
            "/review",
            Some(&token),
            &json!({ "sessionId": session_id, "studentName": "S", "rating": 6, "comment": "!" }),
        ))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = h
        .send(send_json(
            "POST",
            "/review",
            Some(&token),
            &json!({ "sessionId": session_id, "studentName": "S", "rating": 4, "comment": "solid" }),
        ))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["student_email"], "s@example.com");

    let (status, body) = h
        .send(get(&format!("/reviews/{session_id}"), Some(&token)))
        .await;
    assert_eq!(status, StatusCode::OK);
    let reviews = body.as_array().unwrap();
    assert_eq!(reviews.len(), 1);
    assert_eq!(reviews[0]["rating"], 4);

    // Another session has no reviews.
    let other = h.db.add_session("Geometry", ApprovalStatus::Approved);
    let (status, body) = h.send(get(&format!("/reviews/{other}"), Some(&token))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 0);
}

//=========================================================================================
// Payments
//=========================================================================================

#[tokio::test]
async fn payment_intent_short_circuits_on_non_positive_fee() {
    let h = harness();
    h.db.add_user("s@example.com", Role::Student);
    let token = h.token_for("s@example.com", Role::Student);

    for fee in [json!(0), json!(-3.5), json!("0")] {
        let (status, body) = h
            .send(send_json(
                "POST",
                "/create-payment-intent",
                Some(&token),
                &json!({ "registrationFee": fee }),
            ))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body.get("clientSecret").is_none());
    }

    // The collaborator was never reached.
    assert_eq!(h.payments.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn payment_intent_accepts_number_or_numeric_string() {
    let h = harness();
    h.db.add_user("s@example.com", Role::Student);
    let token = h.token_for("s@example.com", Role::Student);

    let (status, body) = h
        .send(send_json(
            "POST",
            "/create-payment-intent",
            Some(&token),
            &json!({ "registrationFee": "12.50" }),
        ))
        .await;
    assert_eq!(status, StatusCode::OK);
    // 12.50 major units -> 1250 minor units.
    assert_eq!(body["clientSecret"], "pi_secret_1250");

    let (status, _) = h
        .send(send_json(
            "POST",
            "/create-payment-intent",
            Some(&token),
            &json!({ "registrationFee": 7 }),
        ))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(h.payments.calls.load(Ordering::SeqCst), 2);
}

//=========================================================================================
// Resource Handlers
//=========================================================================================

#[tokio::test]
async fn malformed_session_id_is_bad_request() {
    let h = harness();
    h.db.add_user("s@example.com", Role::Student);
    let token = h.token_for("s@example.com", Role::Student);

    let (status, _) = h.send(get("/session/not-a-uuid", Some(&token))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = h
        .send(get(&format!("/session/{}", Uuid::new_v4()), Some(&token)))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn session_list_paginates_and_count_ignores_paging() {
    let h = harness();
    for i in 0..25 {
        h.db.add_session(&format!("Session {i}"), ApprovalStatus::Approved);
    }
    h.db.add_session("Pending one", ApprovalStatus::Pending);

    let (status, body) = h.send(get("/sessions/approved?page=1&size=10", None)).await;
    assert_eq!(status, StatusCode::OK);
    let first = body.as_array().unwrap();
    assert_eq!(first.len(), 10);
    assert_eq!(first[0]["title"], "Session 0");

    let (status, body) = h.send(get("/sessions/approved?page=3&size=10", None)).await;
    assert_eq!(status, StatusCode::OK);
    let third = body.as_array().unwrap();
    assert_eq!(third.len(), 5);
    assert_eq!(third[0]["title"], "Session 20");

    let (status, body) = h.send(get("/sessions/approved/count", None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 25);

    // The pending session only shows up without the status filter.
    let (status, body) = h.send(get("/sessions/all/count", None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 26);

    let (status, _) = h.send(get("/sessions/bogus", None)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn upsert_user_is_idempotent_and_keeps_role() {
    let h = harness();

    let payload = json!({ "name": "Carol", "email": "carol@example.com" });
    let (status, body) = h.send(send_json("PUT", "/users", None, &payload)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["role"], "student");

    // Promote, then upsert again: the existing record is left untouched.
    h.db.set_role("carol@example.com", Role::Tutor);
    let (status, body) = h.send(send_json("PUT", "/users", None, &payload)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["role"], "tutor");
}
