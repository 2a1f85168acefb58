//! In-memory forum and store used by unit tests.

use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use sea_orm::{DbErr, RuntimeErr};
use uuid::Uuid;

use crate::forum::{
    CreateTopicOutcome, ForumApi, ForumCategory, ForumError, ForumTopic, TopicDraft, TopicPage,
};
use crate::question::{LicenseTier, Question};
use crate::repository::{Pagination, QuestionStore, RepositoryError, Result};
use crate::sync::DEFAULT_TOPIC_PAGE_SIZE;

/// A question named `display_name` with predictable text.
pub fn question(display_name: &str) -> Question {
    Question {
        id: Uuid::new_v4(),
        display_name: display_name.to_string(),
        question: format!("Question {display_name}?"),
        options: vec![
            "Option A".to_string(),
            "Option B".to_string(),
            "Option C".to_string(),
            "Option D".to_string(),
        ],
        correct_answer: 0,
        explanation: None,
        forum_url: None,
    }
}

pub fn questions(names: &[&str]) -> Vec<Question> {
    names.iter().map(|n| question(n)).collect()
}

fn standard_categories() -> Vec<ForumCategory> {
    vec![
        ForumCategory {
            id: 5,
            name: "Technician Questions".to_string(),
            slug: "technician-questions".to_string(),
        },
        ForumCategory {
            id: 6,
            name: "General Questions".to_string(),
            slug: "general-questions".to_string(),
        },
        ForumCategory {
            id: 7,
            name: "Extra Questions".to_string(),
            slug: "extra-questions".to_string(),
        },
        ForumCategory {
            id: 1,
            name: "Site Feedback".to_string(),
            slug: "site-feedback".to_string(),
        },
    ]
}

/// Category id holding a tier's topics in [`FakeForum::standard`].
pub fn category_id(tier: LicenseTier) -> i64 {
    match tier {
        LicenseTier::Technician => 5,
        LicenseTier::General => 6,
        LicenseTier::Extra => 7,
    }
}

/// A forum that keeps topics in memory.
pub struct FakeForum {
    categories: Vec<ForumCategory>,
    topics: Mutex<BTreeMap<i64, Vec<ForumTopic>>>,
    failures: Mutex<HashMap<String, (Option<u16>, String)>>,
    next_id: AtomicUsize,
    per_page: usize,
    hidden_from_search: bool,
    fail_listing: AtomicBool,
    create_calls: AtomicUsize,
    search_calls: AtomicUsize,
    list_calls: AtomicUsize,
}

impl FakeForum {
    pub fn new(categories: Vec<ForumCategory>) -> Self {
        Self {
            categories,
            topics: Mutex::new(BTreeMap::new()),
            failures: Mutex::new(HashMap::new()),
            next_id: AtomicUsize::new(100),
            per_page: DEFAULT_TOPIC_PAGE_SIZE,
            hidden_from_search: false,
            fail_listing: AtomicBool::new(false),
            create_calls: AtomicUsize::new(0),
            search_calls: AtomicUsize::new(0),
            list_calls: AtomicUsize::new(0),
        }
    }

    /// The three tier categories (ids 5, 6, 7) plus an unrelated one.
    pub fn standard() -> Self {
        Self::new(standard_categories())
    }

    pub fn with_per_page(mut self, per_page: usize) -> Self {
        self.per_page = per_page;
        self
    }

    /// Search never returns anything.
    pub fn hidden_from_search(mut self) -> Self {
        self.hidden_from_search = true;
        self
    }

    pub fn category(&self, id: i64) -> ForumCategory {
        self.categories
            .iter()
            .find(|c| c.id == id)
            .cloned()
            .expect("unknown test category")
    }

    fn allocate_id(&self) -> i64 {
        self.next_id.fetch_add(1, Ordering::SeqCst) as i64
    }

    /// Add a topic directly, as another client would. Returns its id.
    pub fn add_topic(&self, category_id: i64, title: &str) -> i64 {
        let id = self.allocate_id();
        self.topics
            .lock()
            .unwrap()
            .entry(category_id)
            .or_default()
            .push(ForumTopic {
                id,
                slug: format!("topic-{id}"),
                title: title.to_string(),
                category_id: Some(category_id),
            });
        id
    }

    /// Make creating a topic with `title` fail.
    pub fn fail_title(&self, title: &str, status: Option<u16>, message: &str) {
        self.failures
            .lock()
            .unwrap()
            .insert(title.to_string(), (status, message.to_string()));
    }

    pub fn fail_listing(&self) {
        self.fail_listing.store(true, Ordering::SeqCst);
    }

    pub fn topic_count(&self) -> usize {
        self.topics.lock().unwrap().values().map(Vec::len).sum()
    }

    pub fn titles(&self, category_id: i64) -> Vec<String> {
        self.topics
            .lock()
            .unwrap()
            .get(&category_id)
            .map(|topics| topics.iter().map(|t| t.title.clone()).collect())
            .unwrap_or_default()
    }

    pub fn create_calls(&self) -> usize {
        self.create_calls.load(Ordering::SeqCst)
    }

    pub fn search_calls(&self) -> usize {
        self.search_calls.load(Ordering::SeqCst)
    }

    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    fn all_topics(&self) -> Vec<ForumTopic> {
        self.topics
            .lock()
            .unwrap()
            .values()
            .flatten()
            .cloned()
            .collect()
    }
}

#[async_trait]
impl ForumApi for FakeForum {
    async fn list_categories(&self) -> std::result::Result<Vec<ForumCategory>, ForumError> {
        Ok(self.categories.clone())
    }

    async fn list_category_topics(
        &self,
        category: &ForumCategory,
        page: u32,
    ) -> std::result::Result<TopicPage, ForumError> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_listing.load(Ordering::SeqCst) {
            return Err(ForumError::Api {
                status: 500,
                message: "listing failed".to_string(),
            });
        }

        let topics = self.topics.lock().unwrap();
        let all = topics.get(&category.id).map(Vec::as_slice).unwrap_or(&[]);
        let start = (page as usize * self.per_page).min(all.len());
        let end = (start + self.per_page).min(all.len());
        Ok(TopicPage {
            topics: all[start..end].to_vec(),
            per_page: self.per_page,
        })
    }

    async fn search_topics(&self, query: &str) -> std::result::Result<Vec<ForumTopic>, ForumError> {
        self.search_calls.fetch_add(1, Ordering::SeqCst);
        if self.hidden_from_search {
            return Ok(Vec::new());
        }
        let needle = query.trim_end_matches(" in:title");
        Ok(self
            .all_topics()
            .into_iter()
            .filter(|t| t.title.contains(needle))
            .collect())
    }

    async fn create_topic(&self, draft: &TopicDraft) -> CreateTopicOutcome {
        self.create_calls.fetch_add(1, Ordering::SeqCst);

        if let Some((status, message)) = self.failures.lock().unwrap().get(&draft.title) {
            return CreateTopicOutcome::Failed {
                status: *status,
                message: message.clone(),
            };
        }
        if self.all_topics().iter().any(|t| t.title == draft.title) {
            return CreateTopicOutcome::Conflict {
                message: "Title has already been used".to_string(),
            };
        }

        let id = self.add_topic(draft.category_id, &draft.title);
        CreateTopicOutcome::Created(ForumTopic {
            id,
            slug: format!("topic-{id}"),
            title: draft.title.clone(),
            category_id: Some(draft.category_id),
        })
    }

    fn topic_url(&self, topic: &ForumTopic) -> String {
        format!("https://forum.test/t/{}/{}", topic.slug, topic.id)
    }
}

#[derive(Debug, Clone)]
struct StoredQuestion {
    question: Question,
    synced: bool,
    sync_error: Option<String>,
}

fn transient_error() -> RepositoryError {
    RepositoryError::Database(DbErr::Conn(RuntimeErr::Internal(
        "database is locked".to_string(),
    )))
}

/// A question store that keeps rows in memory and can fail on demand.
#[derive(Default)]
pub struct FakeStore {
    rows: Mutex<BTreeMap<Uuid, StoredQuestion>>,
    failing_syncs: AtomicUsize,
    sync_attempts: AtomicUsize,
    fetch_calls: AtomicUsize,
    writes: AtomicUsize,
}

impl FakeStore {
    pub fn with_questions(questions: Vec<Question>) -> Self {
        let store = Self::default();
        {
            let mut rows = store.rows.lock().unwrap();
            for question in questions {
                rows.insert(
                    question.id,
                    StoredQuestion {
                        question,
                        synced: false,
                        sync_error: None,
                    },
                );
            }
        }
        store
    }

    /// The next `n` `mark_synced` calls fail with a transient error.
    pub fn fail_next_syncs(&self, n: usize) {
        self.failing_syncs.store(n, Ordering::SeqCst);
    }

    pub fn sync_attempts(&self) -> usize {
        self.sync_attempts.load(Ordering::SeqCst)
    }

    pub fn fetch_calls(&self) -> usize {
        self.fetch_calls.load(Ordering::SeqCst)
    }

    /// Successful writes of any kind.
    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    pub fn synced_url(&self, id: Uuid) -> Option<String> {
        let rows = self.rows.lock().unwrap();
        let row = rows.get(&id)?;
        row.synced.then(|| row.question.forum_url.clone()).flatten()
    }

    pub fn sync_error(&self, id: Uuid) -> Option<String> {
        self.rows.lock().unwrap().get(&id)?.sync_error.clone()
    }

    pub fn explanation(&self, id: Uuid) -> Option<String> {
        self.rows.lock().unwrap().get(&id)?.question.explanation.clone()
    }

    pub fn synced_count(&self) -> usize {
        self.rows.lock().unwrap().values().filter(|r| r.synced).count()
    }
}

#[async_trait]
impl QuestionStore for FakeStore {
    async fn fetch_page(
        &self,
        tier: Option<LicenseTier>,
        pagination: Pagination,
    ) -> Result<Vec<Question>> {
        self.fetch_calls.fetch_add(1, Ordering::SeqCst);
        let rows = self.rows.lock().unwrap();
        let mut matching: Vec<Question> = rows
            .values()
            .map(|r| r.question.clone())
            .filter(|q| tier.is_none() || q.tier() == tier)
            .collect();
        matching.sort_by(|a, b| a.display_name.cmp(&b.display_name));
        Ok(matching
            .into_iter()
            .skip(pagination.offset() as usize)
            .take(pagination.per_page as usize)
            .collect())
    }

    async fn mark_synced(&self, id: Uuid, forum_url: &str) -> Result<()> {
        self.sync_attempts.fetch_add(1, Ordering::SeqCst);
        let failing = self.failing_syncs.load(Ordering::SeqCst);
        if failing > 0 {
            self.failing_syncs.store(failing - 1, Ordering::SeqCst);
            return Err(transient_error());
        }

        let mut rows = self.rows.lock().unwrap();
        let row = rows
            .get_mut(&id)
            .ok_or_else(|| RepositoryError::not_found_by_id(id))?;
        row.question.forum_url = Some(forum_url.to_string());
        row.synced = true;
        row.sync_error = None;
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn mark_error(&self, id: Uuid, message: &str) -> Result<()> {
        let mut rows = self.rows.lock().unwrap();
        let row = rows
            .get_mut(&id)
            .ok_or_else(|| RepositoryError::not_found_by_id(id))?;
        row.sync_error = Some(message.to_string());
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn find_by_topic_id(&self, topic_id: i64) -> Result<Option<Question>> {
        let suffix = format!("/{topic_id}");
        Ok(self
            .rows
            .lock()
            .unwrap()
            .values()
            .find(|r| {
                r.question
                    .forum_url
                    .as_deref()
                    .is_some_and(|url| url.ends_with(&suffix))
            })
            .map(|r| r.question.clone()))
    }

    async fn update_explanation(&self, id: Uuid, explanation: &str) -> Result<()> {
        let mut rows = self.rows.lock().unwrap();
        let row = rows
            .get_mut(&id)
            .ok_or_else(|| RepositoryError::not_found_by_id(id))?;
        row.question.explanation = Some(explanation.to_string());
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
