pub mod ideas;
pub mod memory;
pub mod mentor_matches;
pub mod mentors;
pub mod migrations;
pub mod pool;
pub mod store;
pub mod util;

// Keep re-exports unique so downstream crates see a single symbol per helper.
pub use ideas::fetch_idea;
pub use memory::{InMemoryMatchStore, StoreCallCounts};
pub use mentor_matches::{MentorMatchInsert, insert_mentor_matches};
pub use mentors::{fetch_mentor_profiles, fetch_mentor_user_ids};
pub use migrations::{MigrationError, run_migrations};
pub use pool::{DbPoolError, PgPool, create_pool_from_url, create_pool_from_url_checked};
pub use store::{MatchStore, PgMatchStore, StoreError};
