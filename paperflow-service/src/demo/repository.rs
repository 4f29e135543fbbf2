//! Demo repository: all demo-mode operations over the single stored
//! document.
//!
//! Every operation loads the document, mutates it, and writes it back.
//! Corruption is never surfaced to the caller; the document is reseeded
//! from defaults instead.

use chrono::{DateTime, Datelike, Utc};
use tracing::{info, warn};

use crate::error::{ServiceError, ServiceResult, StoreError};

use super::migrations;
use super::models::{
    DashboardData, DashboardFilters, DashboardStats, DemoDatabase, DemoLoginRequest,
    DemoLoginResponse, Difficulty, NewWrongQuestion, PracticeRecord, PracticeResult,
    QuestionStatus, Student, StudentPayload, StudentProfile, WrongQuestion,
};
use super::store::KeyValueStore;

/// Store key of the single demo document.
const DEMO_DB_KEY: &str = "paperflow_demo_db";

/// Placeholder grade for students who never provided one.
const DEFAULT_GRADE: &str = "未设置";

/// Consecutive correct reviews required before a question counts as mastered.
const MASTERY_REVIEW_COUNT: u32 = 3;

/// Derive the school term for a date: spring term through July, autumn term
/// for the rest of the year.
pub fn default_school_term(date: DateTime<Utc>) -> String {
    let season = if date.month() <= 7 {
        "春学期"
    } else {
        "秋学期"
    };
    format!("{}{}", date.year(), season)
}

fn sanitize(value: &str) -> String {
    value.trim().to_string()
}

fn normalize_student_no(value: &str) -> String {
    value
        .trim()
        .to_uppercase()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .collect()
}

/// Loose student-number comparison: exact after normalization, with a
/// digits-only fallback for numbers entered with different prefixes.
fn student_no_matches(left: &str, right: &str) -> bool {
    let a = normalize_student_no(left);
    let b = normalize_student_no(right);
    if a.is_empty() || b.is_empty() {
        return false;
    }
    if a == b {
        return true;
    }
    let digits_a: String = a.chars().filter(|c| c.is_ascii_digit()).collect();
    let digits_b: String = b.chars().filter(|c| c.is_ascii_digit()).collect();
    !digits_a.is_empty() && digits_a == digits_b
}

/// Demo data repository with an injected storage backend.
pub struct DemoRepository {
    store: Box<dyn KeyValueStore>,
}

impl DemoRepository {
    pub fn new(store: Box<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Load the document, upgrading old schemas and reseeding defaults on
    /// corruption. The normalized document is written back so migrations
    /// run once.
    fn load(&self) -> Result<DemoDatabase, StoreError> {
        match self.store.get(DEMO_DB_KEY)? {
            None => {
                let seeded = seed_database();
                self.save(&seeded)?;
                Ok(seeded)
            }
            Some(raw) => match parse_document(&raw) {
                Ok(db) => {
                    self.save(&db)?;
                    Ok(db)
                }
                Err(e) => {
                    warn!(error = %e, "Demo document failed to parse, reseeding defaults");
                    let seeded = seed_database();
                    self.save(&seeded)?;
                    Ok(seeded)
                }
            },
        }
    }

    fn save(&self, db: &DemoDatabase) -> Result<(), StoreError> {
        let raw = serde_json::to_string(db).map_err(StoreError::Serialization)?;
        self.store.put(DEMO_DB_KEY, &raw)
    }

    /// Discard the entire demo dataset; the next load reseeds defaults.
    pub fn reset(&self) -> Result<(), StoreError> {
        info!("Resetting demo dataset");
        self.store.remove(DEMO_DB_KEY)
    }

    /// Demo login: match an existing student by name (and student number
    /// when names collide), or create one on the fly.
    pub fn login(&self, request: DemoLoginRequest) -> ServiceResult<DemoLoginResponse> {
        let name = sanitize(&request.name);
        let student_no = request.student_no.as_deref().map(sanitize).unwrap_or_default();
        let grade = request.grade.as_deref().map(sanitize).unwrap_or_default();

        if name.is_empty() {
            return Err(ServiceError::InvalidRequest {
                message: "Student name is required".to_string(),
            });
        }

        let mut db = self.load().map_err(ServiceError::Store)?;

        let candidates: Vec<usize> = db
            .students
            .iter()
            .enumerate()
            .filter(|(_, s)| s.name == name)
            .map(|(index, _)| index)
            .collect();

        let mut created = false;
        let index = match candidates.len() {
            0 => {
                let student = Student {
                    id: db.next_student_id,
                    name: name.clone(),
                    student_no: student_no.clone(),
                    grade: if grade.is_empty() {
                        DEFAULT_GRADE.to_string()
                    } else {
                        grade.clone()
                    },
                    class_name: String::new(),
                    school_name: String::new(),
                    created_at: Utc::now(),
                };
                db.next_student_id += 1;
                db.students.push(student);
                created = true;
                db.students.len() - 1
            }
            1 => {
                let index = candidates[0];
                // Demo leniency: adopt or overwrite the student number from
                // the current input rather than hard-failing the login.
                if !student_no.is_empty()
                    && !student_no_matches(&db.students[index].student_no, &student_no)
                {
                    db.students[index].student_no = student_no.clone();
                }
                index
            }
            _ => {
                if student_no.is_empty() {
                    return Err(ServiceError::InvalidRequest {
                        message: "Multiple students share this name, a student number is required"
                            .to_string(),
                    });
                }
                *candidates
                    .iter()
                    .find(|&&index| {
                        student_no_matches(&db.students[index].student_no, &student_no)
                    })
                    .ok_or_else(|| ServiceError::InvalidRequest {
                        message: "Student number does not match the name".to_string(),
                    })?
            }
        };

        if !grade.is_empty()
            && (db.students[index].grade.is_empty() || db.students[index].grade == DEFAULT_GRADE)
        {
            db.students[index].grade = grade;
        }

        let student = db.students[index].clone();
        self.save(&db).map_err(ServiceError::Store)?;

        let session_token = format!(
            "demo-{}-{:06x}",
            Utc::now().timestamp_millis(),
            rand::random::<u32>() & 0xff_ffff
        );

        Ok(DemoLoginResponse {
            success: true,
            created,
            message: if created {
                "First login succeeded (demo)".to_string()
            } else {
                "Login succeeded (demo)".to_string()
            },
            session_token,
            student: student_payload(&student),
        })
    }

    /// Dashboard data for one student: stats over everything, the filtered
    /// item list sorted by last update, and distinct filter options.
    pub fn dashboard(
        &self,
        student_id: i64,
        filters: &DashboardFilters,
    ) -> ServiceResult<DashboardData> {
        let db = self.load().map_err(ServiceError::Store)?;

        let all: Vec<&WrongQuestion> = db
            .wrong_questions
            .iter()
            .filter(|q| q.student_id == student_id)
            .collect();

        let keyword = filters
            .keyword
            .as_deref()
            .map(|k| k.trim().to_lowercase())
            .filter(|k| !k.is_empty());
        let subject = filters.subject.as_deref().map(sanitize).filter(|s| !s.is_empty());
        let term = filters.term.as_deref().map(sanitize).filter(|t| !t.is_empty());

        let mut items: Vec<WrongQuestion> = all
            .iter()
            .filter(|q| match &keyword {
                None => true,
                Some(k) => {
                    q.title.to_lowercase().contains(k)
                        || q.content.to_lowercase().contains(k)
                        || q.term.to_lowercase().contains(k)
                        || q.error_reason.to_lowercase().contains(k)
                        || q.image_name
                            .as_deref()
                            .map(|n| n.to_lowercase().contains(k))
                            .unwrap_or(false)
                }
            })
            .filter(|q| subject.as_deref().is_none_or(|s| q.subject == s))
            .filter(|q| term.as_deref().is_none_or(|t| q.term == t))
            .filter(|q| filters.status.is_none_or(|s| q.status == s))
            .map(|q| (*q).clone())
            .collect();
        items.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));

        Ok(DashboardData {
            stats: compute_stats(&all),
            items,
            subject_options: distinct(all.iter().map(|q| q.subject.as_str())),
            term_options: distinct(all.iter().map(|q| q.term.as_str())),
            category_options: distinct(all.iter().map(|q| q.category.as_str())),
        })
    }

    /// Log a new wrong question; most fields fall back to placeholders.
    pub fn create_wrong_question(
        &self,
        student_id: i64,
        payload: NewWrongQuestion,
    ) -> ServiceResult<WrongQuestion> {
        let content = payload.content.as_deref().map(sanitize).unwrap_or_default();
        let image_data = payload.image_data.as_deref().map(sanitize).unwrap_or_default();
        let image_name = payload.image_name.as_deref().map(sanitize).unwrap_or_default();

        if content.is_empty() && image_data.is_empty() {
            return Err(ServiceError::InvalidRequest {
                message: "Provide a photo or the question content".to_string(),
            });
        }

        let mut db = self.load().map_err(ServiceError::Store)?;
        if !db.students.iter().any(|s| s.id == student_id) {
            return Err(ServiceError::StudentNotFound { student_id });
        }

        let now = Utc::now();
        let non_empty = |value: Option<&str>, fallback: &str| {
            let value = value.map(sanitize).unwrap_or_default();
            if value.is_empty() {
                fallback.to_string()
            } else {
                value
            }
        };

        let item = WrongQuestion {
            id: db.next_wrong_question_id,
            student_id,
            title: non_empty(payload.title.as_deref(), "未命名错题"),
            content: if content.is_empty() {
                "已通过照片录入，待补充文字内容".to_string()
            } else {
                content
            },
            subject: non_empty(payload.subject.as_deref(), "未分类学科"),
            term: non_empty(payload.term.as_deref(), &default_school_term(now)),
            grade: non_empty(payload.grade.as_deref(), DEFAULT_GRADE),
            category: non_empty(payload.category.as_deref(), "未分类"),
            error_reason: non_empty(payload.error_reason.as_deref(), "待分析"),
            status: QuestionStatus::New,
            difficulty: payload.difficulty.unwrap_or_default(),
            review_count: 0,
            last_result: None,
            image_data: (!image_data.is_empty()).then_some(image_data),
            image_name: (!image_name.is_empty()).then_some(image_name),
            created_at: now,
            updated_at: now,
        };

        db.next_wrong_question_id += 1;
        db.wrong_questions.push(item.clone());
        self.save(&db).map_err(ServiceError::Store)?;

        Ok(item)
    }

    /// Set the review status of one question.
    pub fn set_question_status(
        &self,
        student_id: i64,
        question_id: i64,
        status: QuestionStatus,
    ) -> ServiceResult<WrongQuestion> {
        let mut db = self.load().map_err(ServiceError::Store)?;

        let question = db
            .wrong_questions
            .iter_mut()
            .find(|q| q.id == question_id && q.student_id == student_id)
            .ok_or(ServiceError::QuestionNotFound { question_id })?;

        question.status = status;
        question.updated_at = Utc::now();
        let updated = question.clone();

        self.save(&db).map_err(ServiceError::Store)?;
        Ok(updated)
    }

    /// Record one practice attempt and advance the review lifecycle:
    /// a correct answer promotes to mastered after enough reviews,
    /// anything else keeps the question in review.
    pub fn record_practice(
        &self,
        student_id: i64,
        question_id: i64,
        result: PracticeResult,
    ) -> ServiceResult<WrongQuestion> {
        let mut db = self.load().map_err(ServiceError::Store)?;

        let question = db
            .wrong_questions
            .iter_mut()
            .find(|q| q.id == question_id && q.student_id == student_id)
            .ok_or(ServiceError::QuestionNotFound { question_id })?;

        let now = Utc::now();
        question.review_count += 1;
        question.last_result = Some(result);
        question.updated_at = now;
        question.status = match result {
            PracticeResult::Correct if question.review_count >= MASTERY_REVIEW_COUNT => {
                QuestionStatus::Mastered
            }
            _ => QuestionStatus::Reviewing,
        };
        let updated = question.clone();

        db.practices.push(PracticeRecord {
            id: db.next_practice_id,
            student_id,
            wrong_question_id: question_id,
            result,
            created_at: now,
        });
        db.next_practice_id += 1;

        self.save(&db).map_err(ServiceError::Store)?;
        Ok(updated)
    }
}

fn parse_document(raw: &str) -> Result<DemoDatabase, serde_json::Error> {
    let value: serde_json::Value = serde_json::from_str(raw)?;
    serde_json::from_value(migrations::upgrade(value))
}

fn student_payload(student: &Student) -> StudentPayload {
    StudentPayload {
        id: student.id,
        name: student.name.clone(),
        role: "student",
        status: "active",
        created_at: student.created_at,
        student_profile: StudentProfile {
            student_no: (!student.student_no.is_empty()).then(|| student.student_no.clone()),
            grade: if student.grade.is_empty() {
                DEFAULT_GRADE.to_string()
            } else {
                student.grade.clone()
            },
            class_name: (!student.class_name.is_empty()).then(|| student.class_name.clone()),
            school_name: (!student.school_name.is_empty()).then(|| student.school_name.clone()),
        },
    }
}

fn distinct<'a>(values: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut seen = Vec::new();
    for value in values {
        if !value.is_empty() && !seen.iter().any(|s: &String| s == value) {
            seen.push(value.to_string());
        }
    }
    seen
}

fn compute_stats(items: &[&WrongQuestion]) -> DashboardStats {
    let total = items.len();
    let count_status =
        |status: QuestionStatus| items.iter().filter(|q| q.status == status).count();
    let mastered_count = count_status(QuestionStatus::Mastered);

    let mut stats = DashboardStats {
        total,
        new_count: count_status(QuestionStatus::New),
        reviewing_count: count_status(QuestionStatus::Reviewing),
        mastered_count,
        mastery_rate: if total > 0 {
            ((mastered_count as f64 / total as f64) * 100.0).round() as u32
        } else {
            0
        },
        total_reviews: items.iter().map(|q| q.review_count).sum(),
        by_subject: Default::default(),
        by_term: Default::default(),
        by_category: Default::default(),
        by_reason: Default::default(),
    };

    for question in items {
        *stats.by_subject.entry(question.subject.clone()).or_insert(0) += 1;
        *stats.by_term.entry(question.term.clone()).or_insert(0) += 1;
        *stats
            .by_category
            .entry(question.category.clone())
            .or_insert(0) += 1;
        *stats
            .by_reason
            .entry(question.error_reason.clone())
            .or_insert(0) += 1;
    }

    stats
}

/// Default dataset: one student with a handful of wrong questions across
/// subjects and terms, used for first runs and after corruption or reset.
fn seed_database() -> DemoDatabase {
    let created_at = Utc::now();

    let question = |id: i64,
                    title: &str,
                    content: &str,
                    subject: &str,
                    term: &str,
                    category: &str,
                    error_reason: &str,
                    status: QuestionStatus,
                    difficulty: Difficulty,
                    review_count: u32,
                    last_result: Option<PracticeResult>| {
        WrongQuestion {
            id,
            student_id: 1,
            title: title.to_string(),
            content: content.to_string(),
            subject: subject.to_string(),
            term: term.to_string(),
            grade: "二年级".to_string(),
            category: category.to_string(),
            error_reason: error_reason.to_string(),
            status,
            difficulty,
            review_count,
            last_result,
            image_data: None,
            image_name: None,
            created_at,
            updated_at: created_at,
        }
    };

    DemoDatabase {
        schema_version: migrations::SCHEMA_VERSION,
        next_student_id: 2,
        next_wrong_question_id: 5,
        next_practice_id: 1,
        students: vec![Student {
            id: 1,
            name: "小红".to_string(),
            student_no: "S1001".to_string(),
            grade: "二年级".to_string(),
            class_name: "2班".to_string(),
            school_name: "实验小学".to_string(),
            created_at,
        }],
        wrong_questions: vec![
            question(
                1,
                "竖式进位加法",
                "38 + 27 = ?",
                "数学",
                "2025春学期",
                "计算错误",
                "粗心抄错",
                QuestionStatus::Reviewing,
                Difficulty::Easy,
                2,
                Some(PracticeResult::Correct),
            ),
            question(
                2,
                "看图写话",
                "用 3 句话描述图中的春游场景。",
                "语文",
                "2025春学期",
                "表达不完整",
                "审题不清",
                QuestionStatus::New,
                Difficulty::Medium,
                0,
                None,
            ),
            question(
                3,
                "乘法口诀应用",
                "6 x 7 = ?",
                "数学",
                "2025秋学期",
                "基础不牢",
                "口诀不熟",
                QuestionStatus::New,
                Difficulty::Easy,
                0,
                None,
            ),
            question(
                4,
                "时态选择",
                "Yesterday I ___ to school by bus.",
                "英语",
                "2025秋学期",
                "语法错误",
                "规则混淆",
                QuestionStatus::Mastered,
                Difficulty::Medium,
                3,
                Some(PracticeResult::Correct),
            ),
        ],
        practices: Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::demo::store::MemoryStore;
    use chrono::TimeZone;

    fn repository() -> DemoRepository {
        DemoRepository::new(Box::new(MemoryStore::new()))
    }

    #[test]
    fn test_default_school_term_by_season() {
        let spring = Utc.with_ymd_and_hms(2025, 3, 10, 0, 0, 0).unwrap();
        let autumn = Utc.with_ymd_and_hms(2025, 9, 1, 0, 0, 0).unwrap();
        assert_eq!(default_school_term(spring), "2025春学期");
        assert_eq!(default_school_term(autumn), "2025秋学期");
    }

    #[test]
    fn test_student_no_matching_is_loose() {
        assert!(student_no_matches("S1001", "s1001"));
        assert!(student_no_matches("S-1001", "no.1001"));
        assert!(!student_no_matches("S1001", "S1002"));
        assert!(!student_no_matches("", "S1001"));
    }

    #[test]
    fn test_login_requires_name() {
        let err = repository()
            .login(DemoLoginRequest {
                name: "   ".to_string(),
                student_no: None,
                grade: None,
            })
            .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidRequest { .. }));
    }

    #[test]
    fn test_login_matches_seeded_student() {
        let response = repository()
            .login(DemoLoginRequest {
                name: "小红".to_string(),
                student_no: None,
                grade: None,
            })
            .unwrap();
        assert!(!response.created);
        assert_eq!(response.student.id, 1);
        assert!(response.session_token.starts_with("demo-"));
    }

    #[test]
    fn test_login_creates_unknown_student() {
        let repo = repository();
        let response = repo
            .login(DemoLoginRequest {
                name: "小明".to_string(),
                student_no: Some("S2001".to_string()),
                grade: Some("三年级".to_string()),
            })
            .unwrap();
        assert!(response.created);
        assert_eq!(response.student.id, 2);
        assert_eq!(response.student.student_profile.grade, "三年级");

        // Logging in again finds the same student.
        let again = repo
            .login(DemoLoginRequest {
                name: "小明".to_string(),
                student_no: None,
                grade: None,
            })
            .unwrap();
        assert!(!again.created);
        assert_eq!(again.student.id, 2);
    }

    #[test]
    fn test_login_adopts_student_no_for_single_match() {
        let repo = repository();
        repo.login(DemoLoginRequest {
            name: "小刚".to_string(),
            student_no: None,
            grade: None,
        })
        .unwrap();

        // A later login with a number adopts it instead of failing.
        let response = repo
            .login(DemoLoginRequest {
                name: "小刚".to_string(),
                student_no: Some("S3001".to_string()),
                grade: None,
            })
            .unwrap();
        assert!(!response.created);
        assert_eq!(
            response.student.student_profile.student_no.as_deref(),
            Some("S3001")
        );
    }

    #[test]
    fn test_login_with_duplicate_names_requires_student_no() {
        // Duplicate names can only exist in a pre-populated dataset; build
        // one by cloning the seeded student under a new id.
        let store = MemoryStore::new();
        let mut db = seed_database();
        let mut twin = db.students[0].clone();
        twin.id = db.next_student_id;
        twin.student_no = "S1002".to_string();
        db.next_student_id += 1;
        db.students.push(twin);
        store
            .put(DEMO_DB_KEY, &serde_json::to_string(&db).unwrap())
            .unwrap();
        let repo = DemoRepository::new(Box::new(store));

        let err = repo
            .login(DemoLoginRequest {
                name: "小红".to_string(),
                student_no: None,
                grade: None,
            })
            .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidRequest { .. }));

        let mismatched = repo
            .login(DemoLoginRequest {
                name: "小红".to_string(),
                student_no: Some("S9999".to_string()),
                grade: None,
            })
            .unwrap_err();
        assert!(matches!(mismatched, ServiceError::InvalidRequest { .. }));

        let matched = repo
            .login(DemoLoginRequest {
                name: "小红".to_string(),
                student_no: Some("s-1002".to_string()),
                grade: None,
            })
            .unwrap();
        assert!(!matched.created);
        assert_eq!(matched.student.id, 2);
    }

    #[test]
    fn test_dashboard_stats_over_seed_data() {
        let data = repository()
            .dashboard(1, &DashboardFilters::default())
            .unwrap();

        assert_eq!(data.stats.total, 4);
        assert_eq!(data.stats.new_count, 2);
        assert_eq!(data.stats.reviewing_count, 1);
        assert_eq!(data.stats.mastered_count, 1);
        assert_eq!(data.stats.mastery_rate, 25);
        assert_eq!(data.stats.total_reviews, 5);
        assert_eq!(data.stats.by_subject.get("数学"), Some(&2));
        assert_eq!(data.subject_options, vec!["数学", "语文", "英语"]);
        assert_eq!(data.items.len(), 4);
    }

    #[test]
    fn test_dashboard_filters_combine() {
        let repo = repository();

        let by_subject = repo
            .dashboard(
                1,
                &DashboardFilters {
                    subject: Some("数学".to_string()),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(by_subject.items.len(), 2);
        // Stats always cover the unfiltered set.
        assert_eq!(by_subject.stats.total, 4);

        let by_keyword = repo
            .dashboard(
                1,
                &DashboardFilters {
                    keyword: Some("yesterday".to_string()),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(by_keyword.items.len(), 1);
        assert_eq!(by_keyword.items[0].id, 4);

        let by_status = repo
            .dashboard(
                1,
                &DashboardFilters {
                    status: Some(QuestionStatus::New),
                    term: Some("2025秋学期".to_string()),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(by_status.items.len(), 1);
        assert_eq!(by_status.items[0].id, 3);
    }

    #[test]
    fn test_dashboard_for_unknown_student_is_empty() {
        let data = repository()
            .dashboard(99, &DashboardFilters::default())
            .unwrap();
        assert_eq!(data.stats.total, 0);
        assert_eq!(data.stats.mastery_rate, 0);
        assert!(data.items.is_empty());
    }

    #[test]
    fn test_create_wrong_question_applies_placeholders() {
        let repo = repository();
        let created = repo
            .create_wrong_question(
                1,
                NewWrongQuestion {
                    image_data: Some("data:image/png;base64,AA==".to_string()),
                    image_name: Some("photo.png".to_string()),
                    ..Default::default()
                },
            )
            .unwrap();

        assert_eq!(created.id, 5);
        assert_eq!(created.title, "未命名错题");
        assert_eq!(created.content, "已通过照片录入，待补充文字内容");
        assert_eq!(created.status, QuestionStatus::New);
        assert_eq!(created.difficulty, Difficulty::Medium);
        assert_eq!(created.term, default_school_term(created.created_at));
        assert_eq!(created.image_name.as_deref(), Some("photo.png"));
    }

    #[test]
    fn test_create_wrong_question_requires_content_or_image() {
        let err = repository()
            .create_wrong_question(1, NewWrongQuestion::default())
            .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidRequest { .. }));
    }

    #[test]
    fn test_create_wrong_question_for_unknown_student() {
        let err = repository()
            .create_wrong_question(
                42,
                NewWrongQuestion {
                    content: Some("content".to_string()),
                    ..Default::default()
                },
            )
            .unwrap_err();
        assert!(matches!(err, ServiceError::StudentNotFound { .. }));
    }

    #[test]
    fn test_practice_promotes_to_mastered_after_three_correct() {
        let repo = repository();

        // Seed question 2 starts at review_count 0.
        let first = repo
            .record_practice(1, 2, PracticeResult::Correct)
            .unwrap();
        assert_eq!(first.status, QuestionStatus::Reviewing);
        assert_eq!(first.review_count, 1);

        repo.record_practice(1, 2, PracticeResult::Correct).unwrap();
        let third = repo
            .record_practice(1, 2, PracticeResult::Correct)
            .unwrap();
        assert_eq!(third.status, QuestionStatus::Mastered);
        assert_eq!(third.review_count, 3);
        assert_eq!(third.last_result, Some(PracticeResult::Correct));
    }

    #[test]
    fn test_incorrect_practice_keeps_reviewing() {
        let repo = repository();
        // Question 4 already has three correct reviews; an incorrect answer
        // still drops it back to reviewing.
        let updated = repo
            .record_practice(1, 4, PracticeResult::Incorrect)
            .unwrap();
        assert_eq!(updated.status, QuestionStatus::Reviewing);
        assert_eq!(updated.review_count, 4);
        assert_eq!(updated.last_result, Some(PracticeResult::Incorrect));
    }

    #[test]
    fn test_practice_on_missing_question() {
        let err = repository()
            .record_practice(1, 99, PracticeResult::Correct)
            .unwrap_err();
        assert!(matches!(err, ServiceError::QuestionNotFound { .. }));
    }

    #[test]
    fn test_set_status_checks_ownership() {
        let repo = repository();
        let updated = repo
            .set_question_status(1, 2, QuestionStatus::Mastered)
            .unwrap();
        assert_eq!(updated.status, QuestionStatus::Mastered);

        let err = repo
            .set_question_status(42, 2, QuestionStatus::New)
            .unwrap_err();
        assert!(matches!(err, ServiceError::QuestionNotFound { .. }));
    }

    #[test]
    fn test_corrupt_document_is_reseeded() {
        let store = MemoryStore::new();
        store.put(DEMO_DB_KEY, "{ not json").unwrap();
        let repo = DemoRepository::new(Box::new(store));

        let data = repo.dashboard(1, &DashboardFilters::default()).unwrap();
        assert_eq!(data.stats.total, 4);
    }

    #[test]
    fn test_legacy_document_is_migrated_on_load() {
        let store = MemoryStore::new();
        let legacy = serde_json::json!({
            "next_student_id": 2,
            "next_wrong_question_id": 2,
            "next_practice_id": 1,
            "students": [{
                "id": 1,
                "name": "小红",
                "created_at": "2025-03-10T08:00:00Z"
            }],
            "wrong_questions": [{
                "id": 1,
                "student_id": 1,
                "title": "t",
                "content": "c",
                "subject": "数学",
                "term": "未分期",
                "grade": "二年级",
                "category": "计算错误",
                "error_reason": "粗心",
                "status": "new",
                "created_at": "2025-03-10T08:00:00Z",
                "updated_at": "2025-03-10T08:00:00Z"
            }]
        });
        store.put(DEMO_DB_KEY, &legacy.to_string()).unwrap();
        let repo = DemoRepository::new(Box::new(store));

        let data = repo.dashboard(1, &DashboardFilters::default()).unwrap();
        assert_eq!(data.items[0].term, "2025春学期");
    }

    #[test]
    fn test_reset_discards_changes() {
        let repo = repository();
        repo.create_wrong_question(
            1,
            NewWrongQuestion {
                content: Some("extra".to_string()),
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(
            repo.dashboard(1, &DashboardFilters::default())
                .unwrap()
                .stats
                .total,
            5
        );

        repo.reset().unwrap();
        assert_eq!(
            repo.dashboard(1, &DashboardFilters::default())
                .unwrap()
                .stats
                .total,
            4
        );
    }
}
