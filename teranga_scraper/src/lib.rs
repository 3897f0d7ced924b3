mod client;
mod errors;
mod policy;
mod profile;
mod stats;
pub mod text;

pub use self::client::FetchClient;
pub use self::errors::{FetchError, ScrapeError};
pub use self::policy::{FixedPolicy, Identity, RequestPolicy, RotatingIdentity};
pub use self::profile::{ClubContext, PlayerProfile, ProfileScraper};
pub use self::stats::{stats_url, Totals};
