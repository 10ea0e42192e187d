//! Directional accuracy of a backtest.
//!
//! All accuracies are percentages in `[0, 100]`.

use chrono::NaiveDate;

use super::backtest::BacktestRecord;
use super::vote::ModelId;

#[derive(Debug, Clone, PartialEq)]
pub struct ModelAccuracy {
    pub model: ModelId,
    /// Dates on which the model cast a non-zero vote.
    pub predictions: usize,
    pub correct: usize,
    /// `None` when the model never voted.
    pub accuracy: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BacktestSummary {
    pub total: usize,
    pub correct: usize,
    pub incorrect: usize,
    pub accuracy: f64,
    /// Running accuracy after each record, in date order.
    pub cumulative: Vec<(NaiveDate, f64)>,
    pub per_model: Vec<ModelAccuracy>,
}

impl BacktestSummary {
    pub fn compute(records: &[BacktestRecord], models: &[ModelId]) -> Self {
        let total = records.len();
        let mut correct = 0usize;
        let cumulative = records
            .iter()
            .enumerate()
            .map(|(i, r)| {
                if r.correct {
                    correct += 1;
                }
                (r.date, percent(correct, i + 1))
            })
            .collect();

        let per_model = models
            .iter()
            .map(|&model| model_accuracy(records, model))
            .collect();

        Self {
            total,
            correct,
            incorrect: total - correct,
            accuracy: if total > 0 { percent(correct, total) } else { 0.0 },
            cumulative,
            per_model,
        }
    }

    pub fn for_model(&self, model: ModelId) -> Option<&ModelAccuracy> {
        self.per_model.iter().find(|m| m.model == model)
    }
}

fn model_accuracy(records: &[BacktestRecord], model: ModelId) -> ModelAccuracy {
    let mut predictions = 0usize;
    let mut correct = 0usize;
    for record in records {
        let Some(vote) = record.result.vote_of(model).filter(|v| *v != 0) else {
            continue;
        };
        predictions += 1;
        if (vote > 0) == (record.next.return_pct > 0.0) {
            correct += 1;
        }
    }
    ModelAccuracy {
        model,
        predictions,
        correct,
        accuracy: (predictions > 0).then(|| percent(correct, predictions)),
    }
}

fn percent(part: usize, whole: usize) -> f64 {
    part as f64 / whole as f64 * 100.0
}
