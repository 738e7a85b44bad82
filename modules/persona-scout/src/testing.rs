// Test mocks for the persona pipeline.
//
// Three mocks matching the three trait boundaries:
// - MockGateway (ModelGateway): replies chosen by the task phrase in the prompt
// - MockFetcher (DocumentFetcher): HashMap-based URL→page
// - RecordingStore (CollectionStore): in-memory collection that keeps every checkpoint
//
// Plus fixture helpers for building persisted entries.

use std::collections::HashMap;
use std::sync::Mutex;

use anyhow::{bail, Result};
use async_trait::async_trait;
use serde_json::json;

use persona_common::{ActorEntry, FetchError, GatewayError};

use crate::fetcher::{DocumentFetcher, FetchedDocument};
use crate::gateway::ModelGateway;
use crate::store::{CollectionStore, Loaded};

/// Phrases that identify which extractor rendered a prompt. Each appears in
/// exactly one extractor's prompt.
pub mod task {
    pub const IDENTITY: &str = "outward image";
    pub const PROFILE_IMAGE: &str = "profile image URL";
    pub const PERSONALITY: &str = "personality spectrum";
    pub const EMOTIONAL: &str = "emotional spectrum";
    pub const NARRATIVE: &str = "narrative role";

    pub const ALL: [&str; 5] = [IDENTITY, PROFILE_IMAGE, PERSONALITY, EMOTIONAL, NARRATIVE];

    /// The task phrase contained in `prompt`, if any.
    pub fn of(prompt: &str) -> Option<&'static str> {
        ALL.into_iter().find(|phrase| prompt.contains(phrase))
    }
}

// ---------------------------------------------------------------------------
// Canned answers
// ---------------------------------------------------------------------------

pub fn identity_answer(name: &str) -> String {
    json!({
        "name": name,
        "age_range": "mid 30s",
        "gender": "male",
        "height_build": "182cm, lean",
        "voice": "low and calm",
        "impression": "sharp eyes, restrained presence"
    })
    .to_string()
}

pub fn emotional_answer() -> String {
    json!({
        "cold_warm": 3,
        "cold_warm_description": "reserved",
        "active_passive": 4,
        "active_passive_description": "drives scenes",
        "intensity": 8,
        "intensity_description": "explosive when pushed",
        "extrovert_introvert": 6,
        "extrovert_introvert_description": "inward",
        "comic_level": 2,
        "comic_level_description": "rarely comic"
    })
    .to_string()
}

pub fn narrative_answer() -> String {
    format!(
        "```json\n{}\n```",
        json!({
            "narrative_roles": [{
                "work_title": "Hamlet (2019)",
                "character_name": "Hamlet",
                "role_type": "lead",
                "character_description": "grieving prince",
                "emotional_experiences": ["grief", "anger"]
            }],
            "recurring_pattern": "brooding intellectuals"
        })
    )
}

pub const IMAGE_ANSWER: &str = "https://i.namu.wiki/i/profile.webp";
pub const PERSONALITY_ANSWER: &str = "Often cast as cold, calculating leads.";

// ---------------------------------------------------------------------------
// MockGateway
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
enum Reply {
    Text(String),
    Authentication,
    Service(String),
}

#[derive(Debug, Clone)]
struct Rule {
    task: &'static str,
    /// Only match prompts that also contain this text.
    marker: Option<String>,
    reply: Reply,
}

/// One recorded gateway call.
#[derive(Debug, Clone)]
pub struct GatewayCall {
    pub task: Option<&'static str>,
    pub model: String,
    pub prompt: String,
}

/// Scripted model gateway. Rules registered later win, so a base script such
/// as [`MockGateway::actor`] can be overridden per task. Prompts no rule
/// matches get a generation error.
pub struct MockGateway {
    rules: Vec<Rule>,
    calls: Mutex<Vec<GatewayCall>>,
}

impl Default for MockGateway {
    fn default() -> Self {
        Self::new()
    }
}

impl MockGateway {
    pub fn new() -> Self {
        Self {
            rules: Vec::new(),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Valid answers for every extractor, naming the actor `name`.
    pub fn actor(name: &str) -> Self {
        Self::new().with_actor(None, name)
    }

    /// Valid answers for every extractor, only for prompts containing `marker`.
    pub fn actor_on(self, marker: &str, name: &str) -> Self {
        self.with_actor(Some(marker), name)
    }

    fn with_actor(self, marker: Option<&str>, name: &str) -> Self {
        self.rule(task::IDENTITY, marker, Reply::Text(identity_answer(name)))
            .rule(task::PROFILE_IMAGE, marker, Reply::Text(IMAGE_ANSWER.into()))
            .rule(task::PERSONALITY, marker, Reply::Text(PERSONALITY_ANSWER.into()))
            .rule(task::EMOTIONAL, marker, Reply::Text(emotional_answer()))
            .rule(task::NARRATIVE, marker, Reply::Text(narrative_answer()))
    }

    pub fn on(self, task: &'static str, text: &str) -> Self {
        self.rule(task, None, Reply::Text(text.to_string()))
    }

    pub fn on_page(self, marker: &str, task: &'static str, text: &str) -> Self {
        self.rule(task, Some(marker), Reply::Text(text.to_string()))
    }

    pub fn fail_auth(self, task: &'static str) -> Self {
        self.rule(task, None, Reply::Authentication)
    }

    pub fn fail_service(self, task: &'static str, message: &str) -> Self {
        self.rule(task, None, Reply::Service(message.to_string()))
    }

    pub fn fail_service_on_page(self, marker: &str, task: &'static str, message: &str) -> Self {
        self.rule(task, Some(marker), Reply::Service(message.to_string()))
    }

    fn rule(mut self, task: &'static str, marker: Option<&str>, reply: Reply) -> Self {
        self.rules.push(Rule {
            task,
            marker: marker.map(str::to_string),
            reply,
        });
        self
    }

    pub fn calls(&self) -> Vec<GatewayCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn tasks_called(&self) -> Vec<&'static str> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .map(|call| call.task.unwrap_or("unknown"))
            .collect()
    }

    pub fn models_called(&self) -> Vec<String> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .map(|call| call.model.clone())
            .collect()
    }

    /// The most recent prompt sent for `task`.
    pub fn prompt_for(&self, task: &str) -> Option<String> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find(|call| call.task == Some(task))
            .map(|call| call.prompt.clone())
    }
}

#[async_trait]
impl ModelGateway for MockGateway {
    async fn invoke(&self, prompt: &str, model: &str) -> Result<String, GatewayError> {
        let task = task::of(prompt);
        self.calls.lock().unwrap().push(GatewayCall {
            task,
            model: model.to_string(),
            prompt: prompt.to_string(),
        });

        let rule = self.rules.iter().rev().find(|rule| {
            Some(rule.task) == task
                && rule
                    .marker
                    .as_deref()
                    .map_or(true, |marker| prompt.contains(marker))
        });

        match rule.map(|rule| &rule.reply) {
            Some(Reply::Text(text)) => Ok(text.clone()),
            Some(Reply::Authentication) => Err(GatewayError::Authentication(
                "GEMINI_API_KEY is not set".into(),
            )),
            Some(Reply::Service(message)) => Err(GatewayError::Generation(message.clone())),
            None => Err(GatewayError::Generation(format!(
                "MockGateway: no reply scripted for task {task:?}"
            ))),
        }
    }
}

// ---------------------------------------------------------------------------
// MockFetcher
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
enum Page {
    Rendered(FetchedDocument),
    Loading,
}

/// HashMap-based page fetcher. Returns a render error for unregistered URLs.
pub struct MockFetcher {
    pages: HashMap<String, Page>,
    fetched: Mutex<Vec<String>>,
}

impl Default for MockFetcher {
    fn default() -> Self {
        Self::new()
    }
}

impl MockFetcher {
    pub fn new() -> Self {
        Self {
            pages: HashMap::new(),
            fetched: Mutex::new(Vec::new()),
        }
    }

    pub fn on_page(mut self, url: &str, text: &str, markup: &str) -> Self {
        self.pages.insert(
            url.to_string(),
            Page::Rendered(FetchedDocument {
                text: text.to_string(),
                markup: markup.to_string(),
            }),
        );
        self
    }

    /// `url` never gets past its loading placeholder.
    pub fn on_loading(mut self, url: &str) -> Self {
        self.pages.insert(url.to_string(), Page::Loading);
        self
    }

    pub fn fetched(&self) -> Vec<String> {
        self.fetched.lock().unwrap().clone()
    }

    pub fn fetch_count(&self) -> usize {
        self.fetched.lock().unwrap().len()
    }
}

#[async_trait]
impl DocumentFetcher for MockFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchedDocument, FetchError> {
        self.fetched.lock().unwrap().push(url.to_string());
        match self.pages.get(url) {
            Some(Page::Rendered(document)) => Ok(document.clone()),
            Some(Page::Loading) => Err(FetchError::StillLoading {
                url: url.to_string(),
            }),
            None => Err(FetchError::Render {
                url: url.to_string(),
                message: "MockFetcher: no page registered".into(),
            }),
        }
    }
}

// ---------------------------------------------------------------------------
// RecordingStore
// ---------------------------------------------------------------------------

struct RecordingStoreInner {
    current: Loaded,
    saves: Vec<Vec<ActorEntry>>,
    fail_saves: bool,
}

/// In-memory collection. Every save becomes the new contents and is also
/// kept as a snapshot, so tests can check each checkpoint in order.
pub struct RecordingStore {
    inner: Mutex<RecordingStoreInner>,
}

impl RecordingStore {
    fn with(current: Loaded) -> Self {
        Self {
            inner: Mutex::new(RecordingStoreInner {
                current,
                saves: Vec::new(),
                fail_saves: false,
            }),
        }
    }

    pub fn with_entries(entries: Vec<ActorEntry>) -> Self {
        Self::with(Loaded::Entries(entries))
    }

    pub fn missing() -> Self {
        Self::with(Loaded::Missing)
    }

    pub fn corrupt() -> Self {
        Self::with(Loaded::Corrupt("expected value at line 1 column 1".into()))
    }

    /// Every save fails, as a full disk would.
    pub fn failing_saves(self) -> Self {
        self.inner.lock().unwrap().fail_saves = true;
        self
    }

    pub fn saves(&self) -> Vec<Vec<ActorEntry>> {
        self.inner.lock().unwrap().saves.clone()
    }

    pub fn save_count(&self) -> usize {
        self.inner.lock().unwrap().saves.len()
    }

    /// Current contents; empty when missing or corrupt.
    pub fn entries(&self) -> Vec<ActorEntry> {
        match &self.inner.lock().unwrap().current {
            Loaded::Entries(entries) => entries.clone(),
            Loaded::Missing | Loaded::Corrupt(_) => Vec::new(),
        }
    }
}

impl CollectionStore for RecordingStore {
    fn load(&self) -> Result<Loaded> {
        Ok(self.inner.lock().unwrap().current.clone())
    }

    fn save(&self, entries: &[ActorEntry]) -> Result<()> {
        let mut inner = self.inner.lock().unwrap();
        if inner.fail_saves {
            bail!("RecordingStore: disk full");
        }
        inner.current = Loaded::Entries(entries.to_vec());
        inner.saves.push(entries.to_vec());
        Ok(())
    }

    fn location(&self) -> String {
        "memory".to_string()
    }
}

// ---------------------------------------------------------------------------
// Entry fixtures
// ---------------------------------------------------------------------------

pub fn ok_entry(name: &str, link: &str) -> ActorEntry {
    entry(json!({
        "name": name,
        "age_range": "40s",
        "link": link,
        "agency": "Acme",
        "status": "success"
    }))
}

pub fn failed_entry(link: &str) -> ActorEntry {
    entry(json!({
        "link": link,
        "agency": "Acme",
        "status": "failed",
        "error_message": "Page still loading after settle budget"
    }))
}

pub fn incomplete_entry(link: &str) -> ActorEntry {
    entry(json!({
        "name": "no information",
        "impression": "no information",
        "link": link,
        "agency": "Acme",
        "status": "success"
    }))
}

pub fn entry(value: serde_json::Value) -> ActorEntry {
    serde_json::from_value(value).expect("fixture must be a valid entry")
}
