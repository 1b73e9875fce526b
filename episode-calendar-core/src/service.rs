//! The collection-to-calendar pipeline.

use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use futures::{StreamExt, TryStreamExt, stream};

use crate::bangumi::{Client, UserCollection};
use crate::cache::{Cache, feed_key};
use crate::constants::{
    DEFAULT_FUTURE_GRACE_DAYS, DEFAULT_MAX_CONCURRENCY, FEED_CACHE_TTL, FEED_COLLECTION_TYPES,
};
use crate::error::{CalendarError, CalendarResult};
use crate::ics::generate_ics;
use crate::subject::{SlimSubject, SubjectResolver};

/// Knobs for [`CalendarService`].
#[derive(Debug, Clone, Copy)]
pub struct ServiceOptions {
    /// Upper bound on subject resolutions in flight for one feed build.
    pub max_concurrency: usize,
    /// Days an aired episode keeps counting as upcoming.
    pub future_grace_days: i64,
}

impl Default for ServiceOptions {
    fn default() -> Self {
        ServiceOptions {
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
            future_grace_days: DEFAULT_FUTURE_GRACE_DAYS,
        }
    }
}

/// Builds episode feeds for users, caching both subjects and rendered feeds.
#[derive(Clone)]
pub struct CalendarService {
    client: Client,
    cache: Arc<dyn Cache>,
    resolver: SubjectResolver,
    max_concurrency: usize,
}

impl CalendarService {
    pub fn new(client: Client, cache: Arc<dyn Cache>, options: ServiceOptions) -> Self {
        let max_concurrency = if options.max_concurrency == 0 {
            DEFAULT_MAX_CONCURRENCY
        } else {
            options.max_concurrency
        };

        let resolver =
            SubjectResolver::new(client.clone(), cache.clone(), options.future_grace_days);

        Self {
            client,
            cache,
            resolver,
            max_concurrency,
        }
    }

    pub fn max_concurrency(&self) -> usize {
        self.max_concurrency
    }

    /// The rendered feed for `username`, served from the feed cache when possible.
    ///
    /// Fails with `NotFound` when the user does not exist. Any other error while
    /// resolving a subject fails the whole feed; no partial calendar is returned.
    pub async fn build_ics(&self, username: &str) -> CalendarResult<String> {
        if username.is_empty() {
            return Err(CalendarError::NotFound("empty username".into()));
        }

        let key = feed_key(username);
        if let Some(cached) = self.cache.get(&key).await? {
            tracing::debug!(username, "serving cached feed");
            return Ok(cached);
        }

        let now = Utc::now();
        let subjects = self.upcoming_subjects(username, now.date_naive()).await?;
        let ics = generate_ics(&subjects, now);

        if let Err(e) = self.cache.set(&key, &ics, FEED_CACHE_TTL).await {
            tracing::warn!(username, error = %e, "failed to cache rendered feed");
        }

        Ok(ics)
    }

    /// Subjects in the user's collection that have at least one upcoming episode.
    pub async fn upcoming_subjects(
        &self,
        username: &str,
        today: NaiveDate,
    ) -> CalendarResult<Vec<SlimSubject>> {
        let collections = self.fetch_collections(username).await?;
        let subject_ids = unique_subject_ids(&collections);

        tracing::info!(
            username,
            subjects = subject_ids.len(),
            concurrency = self.max_concurrency,
            "resolving collection"
        );

        let resolved: Vec<Option<SlimSubject>> = stream::iter(subject_ids)
            .map(|subject_id| {
                let resolver = self.resolver.clone();
                async move { resolver.resolve(subject_id, today).await }
            })
            .buffer_unordered(self.max_concurrency)
            .try_collect()
            .await?;

        let mut subjects: Vec<SlimSubject> = resolved
            .into_iter()
            .flatten()
            .filter(|s| !s.future_episodes.is_empty())
            .collect();
        subjects.sort_by_key(|s| s.id);

        Ok(subjects)
    }

    /// Anime and real-world subjects across every scanned collection status.
    async fn fetch_collections(&self, username: &str) -> CalendarResult<Vec<UserCollection>> {
        let mut data = Vec::new();

        for collection_type in FEED_COLLECTION_TYPES {
            let page = match self.client.user_collections(username, collection_type).await {
                Ok(page) => page,
                Err(CalendarError::NotFound(_)) => {
                    return Err(CalendarError::NotFound(format!("user {username}")));
                }
                Err(e) => return Err(e),
            };

            data.extend(page.into_iter().filter(|c| c.subject_type().has_episodes()));
        }

        Ok(data)
    }
}

fn unique_subject_ids(collections: &[UserCollection]) -> Vec<u64> {
    collections
        .iter()
        .map(|c| c.subject_id)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}
