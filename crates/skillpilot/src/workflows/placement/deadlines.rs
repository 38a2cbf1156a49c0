use chrono::{Duration, NaiveDate};
use serde::Serialize;

/// Dated cut-offs for one placement round. A deadline has passed from its own date onwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RankingDeadlines {
    details: NaiveDate,
    student_ranking: NaiveDate,
    opportunity_ranking: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DeadlineOrderError {
    #[error("Details deadline cannot be later than Student Ranking deadline.")]
    DetailsAfterStudentRanking,
    #[error("Student Ranking deadline cannot be later than Opportunities Ranking deadline.")]
    StudentAfterOpportunityRanking,
}

impl RankingDeadlines {
    pub fn new(
        details: NaiveDate,
        student_ranking: NaiveDate,
        opportunity_ranking: NaiveDate,
    ) -> Result<Self, DeadlineOrderError> {
        if details > student_ranking {
            return Err(DeadlineOrderError::DetailsAfterStudentRanking);
        }
        if student_ranking > opportunity_ranking {
            return Err(DeadlineOrderError::StudentAfterOpportunityRanking);
        }
        Ok(Self {
            details,
            student_ranking,
            opportunity_ranking,
        })
    }

    /// Student ranking closes a week after details, employer ranking a week after that.
    pub fn following(details: NaiveDate) -> Self {
        let student_ranking = details + Duration::weeks(1);
        Self {
            details,
            student_ranking,
            opportunity_ranking: student_ranking + Duration::weeks(1),
        }
    }

    pub fn details(&self) -> NaiveDate {
        self.details
    }

    pub fn student_ranking(&self) -> NaiveDate {
        self.student_ranking
    }

    pub fn opportunity_ranking(&self) -> NaiveDate {
        self.opportunity_ranking
    }

    pub fn student_ranking_open(&self, today: NaiveDate) -> bool {
        today < self.student_ranking
    }

    pub fn opportunity_ranking_open(&self, today: NaiveDate) -> bool {
        today < self.opportunity_ranking
    }

    /// Match emails go out only once every ranking has closed.
    pub fn matching_open(&self, today: NaiveDate) -> bool {
        today >= self.opportunity_ranking
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(raw: &str) -> NaiveDate {
        NaiveDate::parse_from_str(raw, "%Y-%m-%d").expect("date")
    }

    #[test]
    fn following_spaces_deadlines_a_week_apart() {
        let deadlines = RankingDeadlines::following(date("2026-03-02"));
        assert_eq!(deadlines.student_ranking(), date("2026-03-09"));
        assert_eq!(deadlines.opportunity_ranking(), date("2026-03-16"));
    }

    #[test]
    fn out_of_order_deadlines_are_rejected() {
        assert_eq!(
            RankingDeadlines::new(date("2026-03-10"), date("2026-03-09"), date("2026-03-16")),
            Err(DeadlineOrderError::DetailsAfterStudentRanking)
        );
        assert_eq!(
            RankingDeadlines::new(date("2026-03-02"), date("2026-03-17"), date("2026-03-16")),
            Err(DeadlineOrderError::StudentAfterOpportunityRanking)
        );
    }

    #[test]
    fn a_deadline_has_passed_on_its_own_date() {
        let deadlines = RankingDeadlines::following(date("2026-03-02"));

        assert!(deadlines.student_ranking_open(date("2026-03-08")));
        assert!(!deadlines.student_ranking_open(date("2026-03-09")));
        assert!(deadlines.opportunity_ranking_open(date("2026-03-15")));
        assert!(!deadlines.matching_open(date("2026-03-15")));
        assert!(deadlines.matching_open(date("2026-03-16")));
        assert!(!deadlines.opportunity_ranking_open(date("2026-03-16")));
    }
}
