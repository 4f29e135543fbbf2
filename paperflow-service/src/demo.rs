//! Demo mode: a self-contained student error log persisted as one JSON
//! document in a local key-value store, with no remote backend.
//!
//! The repository is constructed once with an injected storage backend;
//! documents are upgraded by a versioned migration at load and reseeded
//! from defaults whenever they fail to parse.

mod migrations;
mod models;
mod repository;
mod store;

pub use models::{
    DashboardData, DashboardFilters, DashboardStats, DemoDatabase, DemoLoginRequest,
    DemoLoginResponse, Difficulty, NewWrongQuestion, PracticeRecord, PracticeResult,
    QuestionStatus, Student, StudentPayload, StudentProfile, WrongQuestion,
};
pub use repository::{DemoRepository, default_school_term};
pub use store::{KeyValueStore, MemoryStore, SqliteStore};
