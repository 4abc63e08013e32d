use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use calendar_events::{
    builtin_events, list_events, parse_events, Event, EventFilter, Loaded, Rules, Validator,
};
use log::{debug, info, warn};
use reqwest::{Client, Url};
use thiserror::Error;
use tokio::fs;
use tokio::sync::RwLock;

use crate::cache::{self, Cache};

/// Where event records come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
    Builtin,
    File(PathBuf),
    Http(Url),
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Builtin => f.write_str("built-in events"),
            Self::File(path) => write!(f, "{}", path.display()),
            Self::Http(url) => write!(f, "{url}"),
        }
    }
}

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("event source {location} is unavailable: {reason}")]
    SourceUnavailable { location: String, reason: String },
}

pub struct EventStore {
    source: Source,
    rules: Rules,
    client: Client,
    cache: Cache<String, Loaded>,
    last_good: RwLock<Option<Arc<Loaded>>>,
}

impl EventStore {
    pub fn new(source: Source, rules: Rules, cache: cache::Config) -> Self {
        Self {
            source,
            rules,
            client: Client::new(),
            cache: Cache::new(cache),
            last_good: RwLock::new(None),
        }
    }

    pub fn source(&self) -> &Source {
        &self.source
    }

    /// Current snapshot of the source, validated against the store's rules.
    pub async fn load(&self) -> Result<Arc<Loaded>, StoreError> {
        let key = self.source.to_string();
        if let Some(loaded) = self.cache.get(&key).await {
            debug!("Serving cached events from {key}");
            return Ok(loaded);
        }

        let loaded = match &self.source {
            Source::Builtin => self.builtin(),
            Source::File(path) => {
                let json = fs::read_to_string(path)
                    .await
                    .map_err(|err| self.unavailable(err))?;
                parse_events(json, &self.rules).map_err(|err| self.unavailable(err))?
            }
            Source::Http(url) => {
                let json = self.fetch(url).await.map_err(|err| self.unavailable(err))?;
                parse_events(json, &self.rules).map_err(|err| self.unavailable(err))?
            }
        };

        info!(
            "Loaded {} events from {} ({} skipped)",
            loaded.events.len(),
            self.source,
            loaded.skipped.len()
        );

        let loaded = self.cache.insert(key, loaded).await;
        *self.last_good.write().await = Some(Arc::clone(&loaded));

        Ok(loaded)
    }

    pub async fn list_events(&self, filter: &EventFilter) -> Result<Vec<Event>, StoreError> {
        let loaded = self.load().await?;
        Ok(list_events(&loaded.events, filter))
    }

    /// Like [`EventStore::load`], but never fails.
    ///
    /// Falls back to the last snapshot that loaded, then to the built-in
    /// events, then to nothing.
    pub async fn events_or_fallback(&self) -> Arc<Loaded> {
        let err = match self.load().await {
            Ok(loaded) => return loaded,
            Err(err) => err,
        };

        if let Some(last_good) = self.last_good.read().await.as_ref() {
            warn!("{err}, serving last loaded events");
            return Arc::clone(last_good);
        }

        if self.source != Source::Builtin {
            warn!("{err}, serving built-in events");
            return Arc::new(self.builtin());
        }

        warn!("{err}, serving no events");
        Arc::new(Loaded::default())
    }

    fn builtin(&self) -> Loaded {
        let mut validator = Validator::new(&self.rules);
        let mut loaded = Loaded::default();

        for event in builtin_events().iter().cloned() {
            match validator.normalize(event) {
                Ok(event) => loaded.events.push(event),
                Err(err) => loaded.skipped.push(err),
            }
        }

        loaded
    }

    async fn fetch(&self, url: &Url) -> reqwest::Result<String> {
        self.client
            .get(url.clone())
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await?
            .error_for_status()?
            .text()
            .await
    }

    fn unavailable<E: fmt::Display>(&self, err: E) -> StoreError {
        StoreError::SourceUnavailable {
            location: self.source.to_string(),
            reason: err.to_string(),
        }
    }
}
