//! Resolving one tracked subject into its cacheable projection.

use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::bangumi::Client;
use crate::cache::{Cache, subject_key};
use crate::constants::{
    LONG_TTL_MAX_EPISODES, NOT_FOUND_SUBJECT_TTL, SUBJECT_LONG_TTL, SUBJECT_SHORT_TTL,
};
use crate::episode::{ParsedEpisode, display_name, filter_future, parse_episodes};
use crate::error::{CalendarError, CalendarResult};

/// A subject reduced to what the feed renders. This is the cached unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlimSubject {
    pub id: u64,
    pub name: String,
    pub future_episodes: Vec<ParsedEpisode>,
}

/// Outcome of a resolution, as far as cache lifetime is concerned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolution {
    pub found: bool,
    pub has_future_episodes: bool,
    /// Episodes with a parseable air date.
    pub episode_count: usize,
}

/// How long a resolved subject stays cached.
///
/// | outcome | ttl |
/// |---|---|
/// | not found | 1 day |
/// | episodes known, none upcoming, at most 200 of them | 7 days |
/// | anything else | 3 days |
pub fn ttl_for(resolution: &Resolution) -> Duration {
    if !resolution.found {
        return NOT_FOUND_SUBJECT_TTL;
    }

    if resolution.episode_count > 0
        && !resolution.has_future_episodes
        && resolution.episode_count <= LONG_TTL_MAX_EPISODES
    {
        return SUBJECT_LONG_TTL;
    }

    SUBJECT_SHORT_TTL
}

/// Resolves subject ids through the cache, falling back to the API.
#[derive(Clone)]
pub struct SubjectResolver {
    client: Client,
    cache: Arc<dyn Cache>,
    future_grace_days: i64,
}

impl SubjectResolver {
    pub fn new(client: Client, cache: Arc<dyn Cache>, future_grace_days: i64) -> Self {
        Self {
            client,
            cache,
            future_grace_days,
        }
    }

    /// `Ok(None)` means the subject does not exist upstream (possibly a cached answer).
    pub async fn resolve(
        &self,
        subject_id: u64,
        today: NaiveDate,
    ) -> CalendarResult<Option<SlimSubject>> {
        let key = subject_key(subject_id);

        if let Some(raw) = self.cache.get(&key).await? {
            match serde_json::from_str::<Option<SlimSubject>>(&raw) {
                Ok(cached) => return Ok(cached),
                Err(e) => {
                    tracing::debug!(subject_id, error = %e, "ignoring undecodable subject cache entry")
                }
            }
        }

        let subject = match self.client.subject(subject_id).await {
            Ok(subject) => subject,
            Err(CalendarError::NotFound(_)) => {
                let resolution = Resolution {
                    found: false,
                    has_future_episodes: false,
                    episode_count: 0,
                };
                self.store(&key, &None, ttl_for(&resolution)).await?;
                tracing::debug!(subject_id, "subject not found upstream");
                return Ok(None);
            }
            Err(e) => return Err(e),
        };

        let mut slim = SlimSubject {
            id: subject.id,
            name: display_name(&subject.name_cn, &subject.name),
            future_episodes: Vec::new(),
        };

        let mut episode_count = 0;
        if subject.total_episodes > 0 {
            let episodes = parse_episodes(self.client.episodes(subject_id).await?);
            episode_count = episodes.len();
            slim.future_episodes = filter_future(&episodes, today, self.future_grace_days);
        }

        let ttl = ttl_for(&Resolution {
            found: true,
            has_future_episodes: !slim.future_episodes.is_empty(),
            episode_count,
        });

        tracing::debug!(
            subject_id,
            episodes = episode_count,
            upcoming = slim.future_episodes.len(),
            ttl_secs = ttl.as_secs(),
            "resolved subject"
        );

        let slim = Some(slim);
        self.store(&key, &slim, ttl).await?;
        Ok(slim)
    }

    async fn store(
        &self,
        key: &str,
        value: &Option<SlimSubject>,
        ttl: Duration,
    ) -> CalendarResult<()> {
        let payload = serde_json::to_string(value)?;
        self.cache.set(key, &payload, ttl).await
    }
}
