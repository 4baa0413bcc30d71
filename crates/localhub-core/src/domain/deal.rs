//! CRM deal entity and sales pipeline stages

use chrono::{DateTime, NaiveDate, Utc};
use localhub_shared::utils::normalize_optional;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::error::DomainError;
use crate::validation::{validate_currency, FieldErrors, Validated};

string_enum! {
    /// Pipeline stages in the order a deal normally moves through them.
    PipelineStage {
        Lead => "lead",
        Qualified => "qualified",
        Proposal => "proposal",
        Negotiation => "negotiation",
        ClosedWon => "closed_won",
        ClosedLost => "closed_lost",
    }
}

impl PipelineStage {
    /// Default win probability in percent.
    pub fn probability(&self) -> i32 {
        match self {
            PipelineStage::Lead => 10,
            PipelineStage::Qualified => 25,
            PipelineStage::Proposal => 50,
            PipelineStage::Negotiation => 75,
            PipelineStage::ClosedWon => 100,
            PipelineStage::ClosedLost => 0,
        }
    }

    pub fn is_closed(&self) -> bool {
        matches!(self, PipelineStage::ClosedWon | PipelineStage::ClosedLost)
    }
}

impl Default for PipelineStage {
    fn default() -> Self {
        PipelineStage::Lead
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Deal {
    pub id: Uuid,
    pub workspace_id: Uuid,
    pub customer_id: Uuid,
    pub title: String,
    pub amount_cents: i64,
    pub currency: String,
    pub stage: PipelineStage,
    pub probability: i32,
    pub expected_close_date: Option<NaiveDate>,
    pub notes: Option<String>,
    pub closed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub created_by: Option<Uuid>,
    pub modified_at: Option<DateTime<Utc>>,
    pub removed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct NewDeal {
    pub customer_id: Uuid,

    #[validate(length(min = 3, max = 255, message = "Title must be between 3 and 255 characters"))]
    pub title: String,

    #[serde(default)]
    #[validate(range(min = 0, message = "Amount may not be negative"))]
    pub amount_cents: i64,

    #[validate(custom(function = "validate_currency"))]
    pub currency: String,

    #[serde(default)]
    pub stage: PipelineStage,

    pub expected_close_date: Option<NaiveDate>,

    #[validate(length(max = 5000, message = "Notes may not exceed 5000 characters"))]
    pub notes: Option<String>,
}

impl Validated for NewDeal {
    fn cross_field_rules(&self, errors: &mut FieldErrors) {
        if self.stage.is_closed() {
            errors.add("stage", "A new deal cannot start in a closed stage");
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct DealUpdate {
    #[validate(length(min = 3, max = 255, message = "Title must be between 3 and 255 characters"))]
    pub title: Option<String>,

    #[validate(range(min = 0, message = "Amount may not be negative"))]
    pub amount_cents: Option<i64>,

    #[validate(custom(function = "validate_currency"))]
    pub currency: Option<String>,

    pub expected_close_date: Option<NaiveDate>,

    #[validate(length(max = 5000, message = "Notes may not exceed 5000 characters"))]
    pub notes: Option<String>,
}

impl Validated for DealUpdate {}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct MoveDealStage {
    pub stage: PipelineStage,
}

impl Validated for MoveDealStage {}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DealFilter {
    pub stage: Option<PipelineStage>,
    pub customer_id: Option<Uuid>,
}

/// One row of the pipeline report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageSummary {
    pub stage: PipelineStage,
    pub count: i64,
    pub total_amount_cents: i64,
}

impl StageSummary {
    /// Fills stages without deals so the report always lists every stage, in order.
    pub fn complete(rows: Vec<StageSummary>) -> Vec<StageSummary> {
        PipelineStage::ALL
            .iter()
            .map(|stage| {
                rows.iter()
                    .find(|row| row.stage == *stage)
                    .cloned()
                    .unwrap_or(StageSummary { stage: *stage, count: 0, total_amount_cents: 0 })
            })
            .collect()
    }
}

impl Deal {
    pub fn create(workspace_id: Uuid, input: NewDeal, created_by: Uuid) -> Self {
        Self {
            id: Uuid::new_v4(),
            workspace_id,
            customer_id: input.customer_id,
            title: input.title.trim().to_string(),
            amount_cents: input.amount_cents,
            currency: input.currency,
            stage: input.stage,
            probability: input.stage.probability(),
            expected_close_date: input.expected_close_date,
            notes: normalize_optional(input.notes),
            closed_at: None,
            created_at: Utc::now(),
            created_by: Some(created_by),
            modified_at: None,
            removed_at: None,
        }
    }

    pub fn apply(&mut self, update: DealUpdate) {
        if let Some(title) = update.title {
            self.title = title.trim().to_string();
        }
        if let Some(amount) = update.amount_cents {
            self.amount_cents = amount;
        }
        if let Some(currency) = update.currency {
            self.currency = currency;
        }
        if update.expected_close_date.is_some() {
            self.expected_close_date = update.expected_close_date;
        }
        if update.notes.is_some() {
            self.notes = normalize_optional(update.notes);
        }
        self.modified_at = Some(Utc::now());
    }

    pub fn move_to(&mut self, stage: PipelineStage, now: DateTime<Utc>) -> Result<(), DomainError> {
        if self.stage.is_closed() {
            return Err(DomainError::transition("deal", self.stage, "move"));
        }
        self.stage = stage;
        self.probability = stage.probability();
        if stage.is_closed() {
            self.closed_at = Some(now);
        }
        self.modified_at = Some(now);
        Ok(())
    }

    pub fn is_won(&self) -> bool {
        self.stage == PipelineStage::ClosedWon
    }

    /// Amount weighted by win probability.
    pub fn weighted_amount_cents(&self) -> i64 {
        self.amount_cents * i64::from(self.probability) / 100
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn deal() -> Deal {
        Deal::create(
            Uuid::new_v4(),
            NewDeal {
                customer_id: Uuid::new_v4(),
                title: "Annual sponsorship".into(),
                amount_cents: 120_000,
                currency: "USD".into(),
                stage: PipelineStage::Lead,
                expected_close_date: None,
                notes: None,
            },
            Uuid::new_v4(),
        )
    }

    #[test]
    fn test_stage_probabilities() {
        let expected = [10, 25, 50, 75, 100, 0];
        for (stage, probability) in PipelineStage::ALL.iter().zip(expected) {
            assert_eq!(stage.probability(), probability, "{stage}");
        }
    }

    #[test]
    fn test_move_sets_probability_and_closes() {
        let mut deal = deal();
        assert_eq!(deal.probability, 10);
        deal.move_to(PipelineStage::Proposal, Utc::now()).unwrap();
        assert_eq!(deal.probability, 50);
        assert_eq!(deal.weighted_amount_cents(), 60_000);
        assert!(deal.closed_at.is_none());

        deal.move_to(PipelineStage::ClosedWon, Utc::now()).unwrap();
        assert!(deal.is_won());
        assert!(deal.closed_at.is_some());
        assert!(matches!(
            deal.move_to(PipelineStage::Negotiation, Utc::now()),
            Err(DomainError::InvalidStateTransition { .. })
        ));
    }

    #[test]
    fn test_deal_rules() {
        let input = NewDeal {
            customer_id: Uuid::new_v4(),
            title: "x".into(),
            amount_cents: -1,
            currency: "usd".into(),
            stage: PipelineStage::ClosedLost,
            expected_close_date: None,
            notes: None,
        };
        let errors = input.field_errors();
        for field in ["title", "amount_cents", "currency", "stage"] {
            assert!(errors.contains(field), "expected error on {field}");
        }
    }

    #[test]
    fn test_summary_lists_every_stage() {
        let rows = vec![StageSummary { stage: PipelineStage::Proposal, count: 2, total_amount_cents: 500 }];
        let summary = StageSummary::complete(rows);
        assert_eq!(summary.len(), PipelineStage::ALL.len());
        assert_eq!(summary[0].stage, PipelineStage::Lead);
        assert_eq!(summary[0].count, 0);
        assert_eq!(summary[2].count, 2);
    }
}
