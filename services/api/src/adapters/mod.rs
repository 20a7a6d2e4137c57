pub mod db;
pub mod payment;

pub use db::DbAdapter;
pub use payment::StripeAdapter;
