pub mod domain;
pub mod ports;

pub use domain::{
    ApprovalStatus, Booking, Material, NewBooking, NewMaterial, NewNote, NewReview,
    NewStudySession, Note, Review, Role, StudySession, StudySessionUpdate, User,
};
pub use ports::{DatabaseService, Page, PaymentService, PortError, PortResult};
