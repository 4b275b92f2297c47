use serde::Serialize;
use uuid::Uuid;

use crate::Idea;
use crate::db::MentorMatchInsert;
use crate::scoring::ScoreCard;

pub const DEFAULT_SCORE_THRESHOLD: f64 = 40.0;
pub const DEFAULT_TOP_K: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RankingConfig {
    /// Candidates must score strictly above this to be kept.
    pub score_threshold: f64,
    pub top_k: usize,
}

impl Default for RankingConfig {
    fn default() -> Self {
        Self {
            score_threshold: DEFAULT_SCORE_THRESHOLD,
            top_k: DEFAULT_TOP_K,
        }
    }
}

/// A mentor paired with the score card the scorer returned for it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredCandidate {
    pub mentor_id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mentor_name: Option<String>,
    #[serde(flatten)]
    pub card: ScoreCard,
}

impl ScoredCandidate {
    /// Row to insert into mentor_matches for this candidate.
    pub fn to_insert(&self, idea: &Idea) -> MentorMatchInsert {
        MentorMatchInsert {
            idea_id: idea.id,
            mentor_id: self.mentor_id,
            student_id: idea.user_id,
            domain_match_score: self.card.domain_match_score,
            tech_match_score: self.card.tech_match_score,
            stage_match_score: self.card.stage_match_score,
            overall_score: self.card.overall_score,
            match_reason: self.card.match_reason.clone(),
        }
    }
}

/// Drop candidates at or below the threshold, order by overall score
/// descending and keep the first `top_k`. Ties keep scoring order.
pub fn rank_scored(mut scored: Vec<ScoredCandidate>, config: &RankingConfig) -> Vec<ScoredCandidate> {
    scored.retain(|candidate| candidate.card.overall_score > config.score_threshold);

    scored.sort_by(|a, b| b.card.overall_score.total_cmp(&a.card.overall_score));

    scored.truncate(config.top_k);
    scored
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(overall: f64) -> ScoredCandidate {
        ScoredCandidate {
            mentor_id: Uuid::new_v4(),
            mentor_name: None,
            card: ScoreCard {
                domain_match_score: overall,
                tech_match_score: overall,
                stage_match_score: overall,
                overall_score: overall,
                match_reason: format!("scored {overall}"),
            },
        }
    }

    fn overall_scores(ranked: &[ScoredCandidate]) -> Vec<f64> {
        ranked.iter().map(|c| c.card.overall_score).collect()
    }

    #[test]
    fn keeps_top_five_above_threshold() {
        let scored = [45.0, 91.0, 60.0, 41.0, 87.0, 76.0]
            .into_iter()
            .map(candidate)
            .collect();

        let ranked = rank_scored(scored, &RankingConfig::default());

        assert_eq!(overall_scores(&ranked), vec![91.0, 87.0, 76.0, 60.0, 45.0]);

        // 41 clears the threshold and only loses to the top-k cut.
        let scored = [45.0, 91.0, 60.0, 41.0, 87.0, 76.0]
            .into_iter()
            .map(candidate)
            .collect();
        let widened = RankingConfig {
            top_k: 6,
            ..RankingConfig::default()
        };

        let ranked = rank_scored(scored, &widened);

        assert_eq!(overall_scores(&ranked), vec![91.0, 87.0, 76.0, 60.0, 45.0, 41.0]);
    }

    #[test]
    fn threshold_is_exclusive() {
        let scored = vec![candidate(40.0), candidate(41.0), candidate(12.0)];

        let ranked = rank_scored(scored, &RankingConfig::default());

        assert_eq!(overall_scores(&ranked), vec![41.0]);
    }

    #[test]
    fn ties_keep_input_order() {
        let first = candidate(70.0);
        let second = candidate(70.0);
        let scored = vec![candidate(55.0), first.clone(), second.clone()];

        let ranked = rank_scored(scored, &RankingConfig::default());

        assert_eq!(ranked[0].mentor_id, first.mentor_id);
        assert_eq!(ranked[1].mentor_id, second.mentor_id);
    }

    #[test]
    fn result_is_sorted_descending_for_custom_config() {
        let config = RankingConfig {
            score_threshold: 10.0,
            top_k: 3,
        };
        let scored = [11.0, 99.0, 50.0, 75.0, 10.0].into_iter().map(candidate).collect();

        let ranked = rank_scored(scored, &config);

        assert_eq!(overall_scores(&ranked), vec![99.0, 75.0, 50.0]);
        assert!(
            ranked
                .windows(2)
                .all(|pair| pair[0].card.overall_score >= pair[1].card.overall_score)
        );
    }

    #[test]
    fn insert_row_carries_idea_owner_as_student() {
        let idea = Idea {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            title: "Campus marketplace".into(),
            tags: vec![],
            tech_stack: vec![],
            stage: None,
        };
        let scored = candidate(82.0);

        let row = scored.to_insert(&idea);

        assert_eq!(row.idea_id, idea.id);
        assert_eq!(row.student_id, idea.user_id);
        assert_eq!(row.mentor_id, scored.mentor_id);
        assert_eq!(row.overall_score, 82.0);
        assert_eq!(row.match_reason, "scored 82");
    }
}
