pub mod metrics;
pub mod pipeline;
pub mod prefilter;
pub mod ranking;

pub use pipeline::{MatchError, MatchingConfig, MentorMatcher, RankedMatches};
pub use prefilter::{MentorPreFilter, PrefilterReason};
pub use ranking::{RankingConfig, ScoredCandidate, rank_scored};
