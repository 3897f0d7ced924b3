//! Player-profile extraction with per-field fallback strategies.
//!
//! The source's markup is not a stable contract, so every field has one
//! primary anchor and at least one fallback. The club's competition and
//! country are not on the player page at all; they resolve through a
//! chained fetch of the club page (and, for the country, the competition
//! page), stopping at the first strategy that yields a value.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::NaiveDate;
use scraper::{ElementRef, Html, Selector};

use crate::client::FetchClient;
use crate::errors::ScrapeError;
use crate::policy::RequestPolicy;
use crate::text::{clean_text, find_birth_date, parse_fr_date, strip_jersey};

const DEFAULT_BASE_URL: &str = "https://www.transfermarkt.fr";

/// Words that identify the position line among the header labels.
const POSITION_KEYWORDS: [&str; 5] = ["Arrière", "Milieu", "Attaquant", "Gardien", "Défenseur"];

/// Competition anchors tried in order on a club page.
const CLUB_COMPETITION_SELECTORS: [&str; 2] =
    ["span.data-header__club a", "span.data-header__league a"];

/// Biographical fields extracted from one player page.
///
/// Fields the page did not yield stay `None`; defaults belong to the
/// cleaning stage, not here.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlayerProfile {
    pub url: String,
    pub name: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub nationality: Option<String>,
    pub position: Option<String>,
    pub current_club: Option<String>,
    pub current_competition: Option<String>,
    pub competition_country: Option<String>,
}

/// League context resolved for a club, shared by every player of that club.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClubContext {
    pub competition: Option<String>,
    pub country: Option<String>,
}

/// Fetches player pages and extracts profiles and statistics.
pub struct ProfileScraper {
    client: FetchClient,
    policy: Arc<dyn RequestPolicy>,
    base_url: String,
    /// Club pages already resolved this run, keyed by club href. Failed
    /// lookups are cached too, for the rest of the run.
    club_cache: Mutex<HashMap<String, ClubContext>>,
}

impl ProfileScraper {
    pub fn new(client: FetchClient, policy: Arc<dyn RequestPolicy>) -> Self {
        Self::with_base_url(client, policy, DEFAULT_BASE_URL)
    }

    /// Custom base for chained club/competition links. Used for testing
    /// with wiremock.
    pub fn with_base_url(
        client: FetchClient,
        policy: Arc<dyn RequestPolicy>,
        base_url: &str,
    ) -> Self {
        Self {
            client,
            policy,
            base_url: base_url.trim_end_matches('/').to_string(),
            club_cache: Mutex::new(HashMap::new()),
        }
    }

    /// Fetches and extracts one player profile.
    ///
    /// The page fetch retries up to the policy's bound; on exhaustion the
    /// profile is reported unavailable and the caller moves on. A failed
    /// chained club lookup only degrades the competition and country
    /// fields to `None`.
    pub async fn fetch_profile(&self, url: &str) -> Result<PlayerProfile, ScrapeError> {
        let html = self.fetch_with_retry(url, false).await?;
        let (mut profile, club_href) = parse_profile(url, &html)?;

        if let Some(href) = club_href {
            let context = self.resolve_club_context(&href).await?;
            profile.current_competition = context.competition;
            profile.competition_country = context.country;
        }

        tracing::debug!("extracted profile for {:?} ({})", profile.name, url);
        Ok(profile)
    }

    /// One page fetch with bounded retry. Transient faults retry with the
    /// policy's growing pause; permanent ones (a 404, say) fail straight
    /// away since no identity rotation will fix them.
    pub(crate) async fn fetch_with_retry(
        &self,
        url: &str,
        chained: bool,
    ) -> Result<String, ScrapeError> {
        let max_attempts = self.policy.max_attempts().max(1);
        let mut attempt = 0usize;
        loop {
            attempt += 1;
            if attempt > 1 {
                let pause = self.policy.retry_delay(attempt - 1);
                tracing::warn!(
                    "retrying {} (attempt {}/{}) in {:.1}s",
                    url,
                    attempt,
                    max_attempts,
                    pause.as_secs_f64()
                );
                tokio::time::sleep(pause).await;
            }

            let result = if chained {
                self.client.get_chained(url).await
            } else {
                self.client.get(url).await
            };
            match result {
                Ok(html) => return Ok(html),
                Err(err) if !err.is_retryable() => {
                    tracing::warn!("fetch of {} failed permanently: {}", url, err);
                    return Err(err.into());
                }
                Err(err) => {
                    tracing::warn!("fetch of {} failed: {}", url, err);
                    if attempt >= max_attempts {
                        return Err(ScrapeError::Unavailable {
                            url: url.to_string(),
                            attempts: max_attempts,
                        });
                    }
                }
            }
        }
    }

    /// Resolves a club's competition and country. Strategy order: club
    /// page header for both, then the competition page's flag for a
    /// country the club page did not show. Transport failures leave the
    /// fields unresolved instead of failing the profile.
    async fn resolve_club_context(&self, club_href: &str) -> Result<ClubContext, ScrapeError> {
        if let Some(cached) = self.cached_club(club_href) {
            tracing::debug!("club context for {} served from cache", club_href);
            return Ok(cached);
        }

        let club_url = format!("{}{}", self.base_url, club_href);
        let mut context = ClubContext::default();

        match self.fetch_with_retry(&club_url, true).await {
            Ok(html) => {
                let page = parse_club_page(&html)?;
                context.competition = page.competition;
                context.country = page.country;

                if context.country.is_none() {
                    if let Some(comp_href) = page.competition_href {
                        let comp_url = format!("{}{}", self.base_url, comp_href);
                        match self.fetch_with_retry(&comp_url, true).await {
                            Ok(comp_html) => {
                                let doc = Html::parse_document(&comp_html);
                                context.country = parse_flag_title(&doc)?;
                            }
                            Err(err) => {
                                tracing::warn!("competition page unavailable: {}", err);
                            }
                        }
                    }
                }
            }
            Err(err) => {
                tracing::warn!("club page unavailable: {}", err);
            }
        }

        self.cache_club(club_href, context.clone());
        Ok(context)
    }

    fn cached_club(&self, href: &str) -> Option<ClubContext> {
        self.club_cache
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(href)
            .cloned()
    }

    fn cache_club(&self, href: &str, context: ClubContext) {
        self.club_cache
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(href.to_string(), context);
    }
}

struct ClubPage {
    competition: Option<String>,
    competition_href: Option<String>,
    country: Option<String>,
}

/// Extracts the biographical fields plus the club-page link.
fn parse_profile(url: &str, html: &str) -> Result<(PlayerProfile, Option<String>), ScrapeError> {
    let doc = Html::parse_document(html);

    let name_selector = sel("h1.data-header__headline-wrapper")?;
    let name = doc
        .select(&name_selector)
        .next()
        .and_then(|el| strip_jersey(&element_text(&el)));

    // Birth date: dedicated markup first, then a document-wide pattern scan.
    let birth_selector = sel(r#"span[itemprop="birthDate"]"#)?;
    let mut birth_date = doc
        .select(&birth_selector)
        .next()
        .and_then(|el| parse_fr_date(&element_text(&el)));
    if birth_date.is_none() {
        birth_date = find_birth_date(&document_text(&doc));
    }

    // Nationality: dedicated markup first, then the first flag icon's alt.
    let nationality_selector = sel(r#"span[itemprop="nationality"]"#)?;
    let mut nationality = doc
        .select(&nationality_selector)
        .next()
        .and_then(|el| clean_text(&element_text(&el)));
    if nationality.is_none() {
        let flag_selector = sel("img.flaggenrahmen")?;
        nationality = doc
            .select(&flag_selector)
            .find_map(|img| img.value().attr("alt").and_then(clean_text));
    }

    // Position: the first header label mentioning a known position word.
    let label_selector = sel("li.data-header__label")?;
    let position = doc.select(&label_selector).find_map(|label| {
        let text = element_text(&label);
        if POSITION_KEYWORDS.iter().any(|kw| text.contains(kw)) {
            clean_text(&text)
        } else {
            None
        }
    });

    // Club: the header club anchor; its href leads to the club page.
    let club_selector = sel("span.data-header__club a")?;
    let club_anchor = doc.select(&club_selector).next();
    let current_club = club_anchor.and_then(|a| clean_text(&element_text(&a)));
    let club_href = club_anchor
        .and_then(|a| a.value().attr("href"))
        .filter(|href| !href.is_empty())
        .map(str::to_string);

    let profile = PlayerProfile {
        url: url.to_string(),
        name,
        birth_date,
        nationality,
        position,
        current_club,
        current_competition: None,
        competition_country: None,
    };

    Ok((profile, club_href))
}

fn parse_club_page(html: &str) -> Result<ClubPage, ScrapeError> {
    let doc = Html::parse_document(html);

    let mut competition = None;
    let mut competition_href = None;
    for css in CLUB_COMPETITION_SELECTORS {
        let selector = sel(css)?;
        if let Some(anchor) = doc.select(&selector).next() {
            if let Some(text) = clean_text(&element_text(&anchor)) {
                competition = Some(text);
                competition_href = anchor
                    .value()
                    .attr("href")
                    .filter(|href| !href.is_empty())
                    .map(str::to_string);
                break;
            }
        }
    }

    let country = parse_flag_title(&doc)?;

    Ok(ClubPage {
        competition,
        competition_href,
        country,
    })
}

/// Title of the first flag icon that carries one.
fn parse_flag_title(doc: &Html) -> Result<Option<String>, ScrapeError> {
    let selector = sel("img.flaggenrahmen")?;
    Ok(doc
        .select(&selector)
        .find_map(|img| img.value().attr("title").and_then(clean_text)))
}

pub(crate) fn sel(css: &str) -> Result<Selector, ScrapeError> {
    Selector::parse(css).map_err(|e| ScrapeError::Selector(e.to_string()))
}

pub(crate) fn element_text(el: &ElementRef) -> String {
    el.text().collect::<String>()
}

fn document_text(doc: &Html) -> String {
    doc.root_element().text().collect::<String>()
}
