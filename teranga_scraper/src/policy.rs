//! Request pacing and identity rotation for the scraping session.
//!
//! The source site blocks clients that look automated, so politeness is part
//! of the contract: every request presents a rotated browser identity and is
//! preceded by a randomized pause. The policy is injected into the client so
//! tests can swap in a deterministic, zero-delay variant.

use std::time::Duration;

use rand::Rng;

/// Browser user agents rotated across requests.
const USER_AGENTS: [&str; 8] = [
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/119.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.1 Safari/605.1.15",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:121.0) Gecko/20100101 Firefox/121.0",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/119.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Edge/120.0.0.0",
];

/// Accept-Language values rotated alongside the user agent. French first,
/// matching the locale of the pages being scraped.
const ACCEPT_LANGUAGES: [&str; 3] = [
    "fr-FR,fr;q=0.9,en;q=0.8",
    "en-US,en;q=0.9",
    "fr;q=0.9,en-US;q=0.8,en;q=0.7",
];

/// The identity headers presented on one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Identity {
    pub user_agent: &'static str,
    pub accept_language: &'static str,
}

/// How the session paces itself and which identity it presents.
///
/// One policy instance is shared between the client (pre-request and chained
/// pauses), the retry loop (backoff) and the batch driver (between-item
/// pauses), so the whole run's politeness is controlled in one place.
pub trait RequestPolicy: Send + Sync {
    /// Identity headers for the next request.
    fn identity(&self) -> Identity;

    /// Pause taken before every primary page request.
    fn request_delay(&self) -> Duration;

    /// Shorter pause before a chained fetch (club or competition page).
    fn chained_delay(&self) -> Duration;

    /// Pause between work-list items.
    fn item_delay(&self) -> Duration;

    /// Pause before retry number `attempt` (1-based count of failures so far).
    fn retry_delay(&self, attempt: usize) -> Duration;

    /// Bound on fetch attempts per page, including the first.
    fn max_attempts(&self) -> usize;
}

/// Production policy: random identity per request, uniform random delays.
///
/// The pre-request delay bounds and the retry cap can be overridden through
/// `TERANGA_DELAY_MIN_MS` / `TERANGA_DELAY_MAX_MS` / `TERANGA_RETRY_MAX`.
pub struct RotatingIdentity {
    retry_max: usize,
    request_delay_min_ms: u64,
    request_delay_max_ms: u64,
}

impl RotatingIdentity {
    pub fn from_env() -> Self {
        let min = env_u64("TERANGA_DELAY_MIN_MS", 3_000);
        Self {
            retry_max: env_usize("TERANGA_RETRY_MAX", 3),
            request_delay_min_ms: min,
            request_delay_max_ms: env_u64("TERANGA_DELAY_MAX_MS", 7_000).max(min),
        }
    }
}

impl RequestPolicy for RotatingIdentity {
    fn identity(&self) -> Identity {
        let mut rng = rand::thread_rng();
        Identity {
            user_agent: USER_AGENTS[rng.gen_range(0..USER_AGENTS.len())],
            accept_language: ACCEPT_LANGUAGES[rng.gen_range(0..ACCEPT_LANGUAGES.len())],
        }
    }

    fn request_delay(&self) -> Duration {
        let ms = rand::thread_rng().gen_range(self.request_delay_min_ms..=self.request_delay_max_ms);
        Duration::from_millis(ms)
    }

    fn chained_delay(&self) -> Duration {
        Duration::from_millis(rand::thread_rng().gen_range(2_000..=4_000))
    }

    fn item_delay(&self) -> Duration {
        Duration::from_millis(rand::thread_rng().gen_range(4_000..=8_000))
    }

    fn retry_delay(&self, attempt: usize) -> Duration {
        Duration::from_millis(5_000 + 2_000 * attempt as u64)
    }

    fn max_attempts(&self) -> usize {
        self.retry_max
    }
}

/// Zero-delay policy with a fixed identity, for tests.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixedPolicy;

impl RequestPolicy for FixedPolicy {
    fn identity(&self) -> Identity {
        Identity {
            user_agent: USER_AGENTS[0],
            accept_language: ACCEPT_LANGUAGES[0],
        }
    }

    fn request_delay(&self) -> Duration {
        Duration::ZERO
    }

    fn chained_delay(&self) -> Duration {
        Duration::ZERO
    }

    fn item_delay(&self) -> Duration {
        Duration::ZERO
    }

    fn retry_delay(&self, _attempt: usize) -> Duration {
        Duration::ZERO
    }

    fn max_attempts(&self) -> usize {
        3
    }
}

fn env_u64(key: &str, default: u64) -> u64 {
    std::env::var(key)
        .ok()
        .and_then(|val| val.parse::<u64>().ok())
        .unwrap_or(default)
}

fn env_usize(key: &str, default: usize) -> usize {
    std::env::var(key)
        .ok()
        .and_then(|val| val.parse::<usize>().ok())
        .unwrap_or(default)
}
