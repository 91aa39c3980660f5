use anyhow::{Context, Result};
use manga_translator_core::{AppConfig, MangaTranslator, Normalizer, PageSequence, ScratchDir};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use uuid::Uuid;

/// Sessions older than this are dropped by the cleanup task
pub const SESSION_MAX_AGE: Duration = Duration::from_secs(60 * 60);

/// How often the cleanup task runs
pub const CLEANUP_INTERVAL: Duration = Duration::from_secs(5 * 60);

/// One anonymous upload and its decoded pages
pub struct Session {
    /// Shared so page rendering and OCR can run outside the lock
    pub pages: Arc<PageSequence>,
    pub original_filename: String,
    pub created_at: Instant,
    /// Advisory shown on the viewer when the upload was over the soft limit
    pub size_warning: Option<String>,
}

/// Global application state
pub struct AppState {
    /// Active sessions indexed by UUID
    sessions: RwLock<HashMap<Uuid, Session>>,
    pub normalizer: Normalizer,
    pub translator: Arc<MangaTranslator>,
    pub config: AppConfig,
}

impl AppState {
    /// Build the production services: one scratch directory for the whole
    /// process, the normalizer, and the OCR + translation pipeline.
    pub fn new(config: AppConfig) -> Result<Self> {
        let scratch = Arc::new(ScratchDir::new().context("Failed to create scratch directory")?);
        let normalizer = Normalizer::new(Arc::clone(&scratch), config.normalize.clone());
        let translator = MangaTranslator::new(&config, scratch)
            .context("Failed to initialize the translation pipeline")?;

        Ok(Self::with_components(config, normalizer, Arc::new(translator)))
    }

    pub fn with_components(
        config: AppConfig,
        normalizer: Normalizer,
        translator: Arc<MangaTranslator>,
    ) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            normalizer,
            translator,
            config,
        }
    }

    /// Register a freshly normalized upload.
    ///
    /// Returns the session ID as a string (for URL embedding).
    pub async fn create_session(
        &self,
        pages: PageSequence,
        filename: String,
        size_warning: Option<String>,
    ) -> String {
        let id = Uuid::new_v4();

        let session = Session {
            pages: Arc::new(pages),
            original_filename: filename,
            created_at: Instant::now(),
            size_warning,
        };

        self.sessions.write().await.insert(id, session);
        id.to_string()
    }

    /// Get a session by ID string.
    ///
    /// Returns `None` if the ID is not a valid UUID or session doesn't exist.
    pub async fn get_session(&self, id: &str) -> Option<SessionRef<'_>> {
        let uuid = Uuid::parse_str(id).ok()?;
        let sessions = self.sessions.read().await;
        if sessions.contains_key(&uuid) {
            Some(SessionRef {
                id: uuid,
                state: self,
            })
        } else {
            None
        }
    }

    /// Drop sessions older than [`SESSION_MAX_AGE`]. Returns how many were removed.
    pub async fn cleanup_old_sessions(&self) -> usize {
        self.cleanup_sessions_older_than(SESSION_MAX_AGE).await
    }

    #[cfg(test)]
    pub async fn session_count(&self) -> usize {
        self.sessions.read().await.len()
    }

    async fn cleanup_sessions_older_than(&self, max_age: Duration) -> usize {
        let mut sessions = self.sessions.write().await;
        let now = Instant::now();
        let before = sessions.len();

        sessions.retain(|_, session| now.duration_since(session.created_at) < max_age);

        before - sessions.len()
    }
}

/// A borrowed reference to a session that provides safe access patterns.
///
/// Locks are only taken inside synchronous closures, so no guard is ever
/// held across an `.await`:
///
/// ```ignore
/// let pages = session.with_session(|s| Arc::clone(&s.pages)).await?;
/// do_async_work(&pages).await;
/// ```
pub struct SessionRef<'a> {
    id: Uuid,
    state: &'a AppState,
}

impl SessionRef<'_> {
    /// Access session data immutably within a closure.
    pub async fn with_session<F, R>(&self, f: F) -> Option<R>
    where
        F: FnOnce(&Session) -> R,
    {
        let sessions = self.state.sessions.read().await;
        sessions.get(&self.id).map(f)
    }
}
