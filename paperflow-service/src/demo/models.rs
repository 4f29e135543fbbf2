//! Demo document models and API payloads.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Review lifecycle of a wrong question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuestionStatus {
    New,
    Reviewing,
    Mastered,
}

/// Outcome of one practice attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PracticeResult {
    Correct,
    Incorrect,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Default for Difficulty {
    fn default() -> Self {
        Difficulty::Medium
    }
}

/// One demo student.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Student {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub student_no: String,
    #[serde(default)]
    pub grade: String,
    #[serde(default)]
    pub class_name: String,
    #[serde(default)]
    pub school_name: String,
    pub created_at: DateTime<Utc>,
}

/// One logged wrong question.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WrongQuestion {
    pub id: i64,
    pub student_id: i64,
    pub title: String,
    pub content: String,
    pub subject: String,
    pub term: String,
    pub grade: String,
    pub category: String,
    pub error_reason: String,
    pub status: QuestionStatus,
    #[serde(default)]
    pub difficulty: Difficulty,
    #[serde(default)]
    pub review_count: u32,
    #[serde(default)]
    pub last_result: Option<PracticeResult>,
    #[serde(default)]
    pub image_data: Option<String>,
    #[serde(default)]
    pub image_name: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One practice-log entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PracticeRecord {
    pub id: i64,
    pub student_id: i64,
    pub wrong_question_id: i64,
    pub result: PracticeResult,
    pub created_at: DateTime<Utc>,
}

/// The entire demo dataset, serialized as one document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DemoDatabase {
    pub schema_version: u32,
    pub next_student_id: i64,
    pub next_wrong_question_id: i64,
    pub next_practice_id: i64,
    pub students: Vec<Student>,
    pub wrong_questions: Vec<WrongQuestion>,
    #[serde(default)]
    pub practices: Vec<PracticeRecord>,
}

// ==================== API payloads ====================

/// Demo login request
#[derive(Debug, Clone, Deserialize)]
pub struct DemoLoginRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub student_no: Option<String>,
    #[serde(default)]
    pub grade: Option<String>,
}

/// Demo login response, mirroring the real backend's user payload shape.
#[derive(Debug, Clone, Serialize)]
pub struct DemoLoginResponse {
    pub success: bool,
    pub created: bool,
    pub message: String,
    pub session_token: String,
    pub student: StudentPayload,
}

#[derive(Debug, Clone, Serialize)]
pub struct StudentPayload {
    pub id: i64,
    pub name: String,
    pub role: &'static str,
    pub status: &'static str,
    pub created_at: DateTime<Utc>,
    pub student_profile: StudentProfile,
}

#[derive(Debug, Clone, Serialize)]
pub struct StudentProfile {
    pub student_no: Option<String>,
    pub grade: String,
    pub class_name: Option<String>,
    pub school_name: Option<String>,
}

/// Dashboard query filters; all optional, combined with AND.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DashboardFilters {
    #[serde(default)]
    pub keyword: Option<String>,
    #[serde(default)]
    pub subject: Option<String>,
    #[serde(default)]
    pub term: Option<String>,
    #[serde(default)]
    pub status: Option<QuestionStatus>,
}

/// Aggregated statistics over one student's wrong questions.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct DashboardStats {
    pub total: usize,
    pub new_count: usize,
    pub reviewing_count: usize,
    pub mastered_count: usize,
    /// Integer percentage of mastered questions.
    pub mastery_rate: u32,
    pub total_reviews: u32,
    pub by_subject: BTreeMap<String, u32>,
    pub by_term: BTreeMap<String, u32>,
    pub by_category: BTreeMap<String, u32>,
    pub by_reason: BTreeMap<String, u32>,
}

/// Dashboard response: stats over everything, filtered items, and distinct
/// option lists for the filter controls.
#[derive(Debug, Clone, Serialize)]
pub struct DashboardData {
    pub stats: DashboardStats,
    pub items: Vec<WrongQuestion>,
    pub subject_options: Vec<String>,
    pub term_options: Vec<String>,
    pub category_options: Vec<String>,
}

/// Wrong-question creation payload; most fields fall back to placeholders.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewWrongQuestion {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub subject: Option<String>,
    #[serde(default)]
    pub term: Option<String>,
    #[serde(default)]
    pub grade: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub error_reason: Option<String>,
    #[serde(default)]
    pub difficulty: Option<Difficulty>,
    #[serde(default)]
    pub image_data: Option<String>,
    #[serde(default)]
    pub image_name: Option<String>,
}
