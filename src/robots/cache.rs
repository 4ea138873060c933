//! Robots.txt caching implementation
//!
//! Rules live on the Domain record itself. They are fetched lazily the first
//! time a domain is checked and again once the refresh interval has passed.

use crate::config::CrawlerConfig;
use crate::crawler::Fetcher;
use crate::robots::RobotsRules;
use crate::state::Domain;
use crate::storage::Storage;
use crate::url::{authority, robots_txt_url};
use crate::{CrawlError, Result};
use chrono::{DateTime, Duration, Utc};
use url::Url;

/// Schemes tried in order when acquiring robots.txt
const ROBOTS_SCHEMES: [&str; 2] = ["https", "http"];

/// Per-domain robots.txt policy, backed by storage
#[derive(Debug, Clone)]
pub struct RobotsCache {
    user_agent: String,
    refresh_interval: Duration,
}

impl RobotsCache {
    pub fn new(user_agent: impl Into<String>, refresh_interval: Duration) -> Self {
        Self {
            user_agent: user_agent.into(),
            refresh_interval,
        }
    }

    pub fn from_config(config: &CrawlerConfig) -> Self {
        Self::new(config.user_agent.clone(), config.robots_refresh_interval())
    }

    /// Fetches robots.txt for `domain` and persists the filtered rules
    ///
    /// HTTPS is tried before HTTP and the first 2xx response wins. When
    /// neither scheme answers, an empty rule set is stored so the domain is
    /// not retried until the refresh interval passes again.
    pub async fn refresh<S, F>(
        &self,
        storage: &mut S,
        fetcher: &F,
        domain: &mut Domain,
        now: DateTime<Utc>,
    ) -> Result<RobotsRules>
    where
        S: Storage + ?Sized,
        F: Fetcher + ?Sized,
    {
        let mut rules = None;

        for scheme in ROBOTS_SCHEMES {
            let robots_url = robots_txt_url(scheme, &domain.hostname);
            match fetcher.get(&robots_url).await {
                Ok(response) if (200..300).contains(&response.status) => {
                    rules = Some(RobotsRules::parse(&response.body, &self.user_agent));
                    break;
                }
                Ok(response) => {
                    tracing::debug!(
                        "robots.txt at {} returned HTTP {}",
                        robots_url,
                        response.status
                    );
                }
                Err(e) => {
                    tracing::debug!("Failed to fetch {}: {}", robots_url, e);
                }
            }
        }

        let rules = match rules {
            Some(rules) => {
                tracing::debug!(
                    "Refreshed robots.txt for {} ({} rules)",
                    domain.hostname,
                    rules.rules().len()
                );
                rules
            }
            None => {
                tracing::debug!(
                    "No robots.txt available for {}, allowing everything",
                    domain.hostname
                );
                RobotsRules::allow_all()
            }
        };

        let stored = rules.to_stored_text();
        storage.set_domain_robots(domain.id, &stored, now)?;
        domain.robots_txt = Some(stored);
        domain.robots_txt_updated_at = Some(now);

        Ok(rules)
    }

    /// Checks whether robots.txt permits crawling `url` on `domain`
    ///
    /// Refreshes the domain's rules first when they are missing or stale.
    /// `url` must belong to `domain`; anything else is reported as
    /// [`CrawlError::DomainMismatch`].
    pub async fn is_allowed<S, F>(
        &self,
        storage: &mut S,
        fetcher: &F,
        domain: &mut Domain,
        url: &Url,
        now: DateTime<Utc>,
    ) -> Result<bool>
    where
        S: Storage + ?Sized,
        F: Fetcher + ?Sized,
    {
        if authority(url).as_deref() != Some(domain.hostname.as_str()) {
            return Err(CrawlError::DomainMismatch {
                url: url.to_string(),
                hostname: domain.hostname.clone(),
            });
        }

        let rules = if domain.is_robots_stale(self.refresh_interval, now) {
            self.refresh(storage, fetcher, domain, now).await?
        } else {
            RobotsRules::from_stored_text(domain.robots_txt.as_deref().unwrap_or_default())
        };

        let allowed = rules.is_allowed(url.path());
        if !allowed {
            tracing::debug!("robots.txt disallows {}", url);
        }

        Ok(allowed)
    }
}
