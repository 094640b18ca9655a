//! PostgreSQL-backed store implementations.

pub mod message;
pub mod user;

pub use message::PgMessageStore;
pub use user::UserRepository;
