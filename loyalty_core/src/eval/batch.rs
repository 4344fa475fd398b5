use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::adapter::ModelAdapter;
use crate::index::LoyaltyMetrics;
use crate::model_store::LoyaltyModels;
use crate::parallel::Parallelism;
use crate::{CustomerRecord, Error, Result, Str};

/// An input record with its loyalty metrics appended.
///
/// Serializes as a single flat object: the record's fields followed by the four metric fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredRecord {
    #[serde(flatten)]
    pub record: CustomerRecord,
    #[serde(flatten)]
    pub metrics: LoyaltyMetrics,
}

/// Result of scoring a population. Records are in input order.
///
/// Owned by the caller and passed explicitly to population-level operations such as
/// [`risk_summary`](super::risk_summary) and [`segment_risk`](super::segment_risk).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoredPopulation {
    pub scored_at: DateTime<Utc>,
    pub records: Vec<ScoredRecord>,
}

impl ScoredPopulation {
    /// Look up a scored customer by identifier.
    pub fn find(&self, customer_id: &str) -> Option<&ScoredRecord> {
        self.records
            .iter()
            .find(|scored| &*scored.record.customer_id == customer_id)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ScoredRecord> {
        self.records.iter()
    }
}

impl<'a> IntoIterator for &'a ScoredPopulation {
    type Item = &'a ScoredRecord;
    type IntoIter = std::slice::Iter<'a, ScoredRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

/// A record that could not be scored.
#[derive(Debug, Clone)]
pub struct RecordFailure {
    /// Position of the record in the input.
    pub index: usize,
    pub customer_id: Str,
    pub error: Error,
}

/// Result of [`score_population_partial`]: one entry per input record, in input order.
#[derive(Debug, Clone)]
pub struct BatchReport {
    pub scored_at: DateTime<Utc>,
    pub entries: Vec<std::result::Result<ScoredRecord, RecordFailure>>,
}

impl BatchReport {
    pub fn failures(&self) -> impl Iterator<Item = &RecordFailure> {
        self.entries.iter().filter_map(|entry| entry.as_ref().err())
    }

    pub fn has_failures(&self) -> bool {
        self.failures().next().is_some()
    }

    /// Split the report into the population of successfully scored records and the failures.
    pub fn into_parts(self) -> (ScoredPopulation, Vec<RecordFailure>) {
        let mut records = Vec::with_capacity(self.entries.len());
        let mut failures = Vec::new();
        for entry in self.entries {
            match entry {
                Ok(scored) => records.push(scored),
                Err(failure) => failures.push(failure),
            }
        }
        (
            ScoredPopulation {
                scored_at: self.scored_at,
                records,
            },
            failures,
        )
    }
}

/// Score every record of a population.
///
/// Each model is invoked once for the whole population. Records are independent of each other,
/// so they may be spread across threads according to `parallelism`; the output order always
/// matches the input order.
///
/// # Errors
///
/// Fails the whole batch with the error of the first (lowest-index) invalid record, or with
/// [`Error::ModelNotLoaded`] if either model is missing.
pub fn score_population(
    models: &LoyaltyModels,
    records: &[CustomerRecord],
    parallelism: Parallelism,
    now: DateTime<Utc>,
) -> Result<ScoredPopulation> {
    let p_subscribe = models
        .subscription
        .predict_probability_batch(records, parallelism)?;
    let freq_raw = models.frequency.predict_value_batch(records, parallelism)?;

    log::debug!(target: "loyalty",
                records = records.len(),
                threads = parallelism.get();
                "scored population");

    Ok(ScoredPopulation {
        scored_at: now,
        records: assemble(records.iter().cloned(), &p_subscribe, &freq_raw),
    })
}

/// Score every valid record of a population and report the invalid ones instead of failing.
///
/// # Errors
///
/// [`Error::ModelNotLoaded`] if either model is missing. Record-level errors never fail the
/// call; they are reported in [`BatchReport::entries`].
pub fn score_population_partial(
    models: &LoyaltyModels,
    records: &[CustomerRecord],
    parallelism: Parallelism,
    now: DateTime<Utc>,
) -> Result<BatchReport> {
    models.subscription.loaded()?;
    models.frequency.loaded()?;

    let mut valid = Vec::with_capacity(records.len());
    let mut failures = Vec::new();
    for (index, record) in records.iter().enumerate() {
        match record.validate() {
            Ok(()) => valid.push(record.clone()),
            Err(error) => {
                log::debug!(target: "loyalty",
                            index = index,
                            customer_id = record.customer_id;
                            "skipping invalid record: {error}");
                failures.push(RecordFailure {
                    index,
                    customer_id: record.customer_id.clone(),
                    error,
                });
            }
        }
    }

    let p_subscribe = models
        .subscription
        .predict_probability_batch(&valid, parallelism)?;
    let freq_raw = models.frequency.predict_value_batch(&valid, parallelism)?;
    let mut scored = assemble(valid, &p_subscribe, &freq_raw).into_iter();

    // Merge back by input index: failures are sorted by index already.
    let mut failures = failures.into_iter().peekable();
    let mut entries = Vec::with_capacity(records.len());
    for index in 0..records.len() {
        match failures.next_if(|failure| failure.index == index) {
            Some(failure) => entries.push(Err(failure)),
            None => {
                if let Some(record) = scored.next() {
                    entries.push(Ok(record));
                }
            }
        }
    }

    log::debug!(target: "loyalty",
                records = records.len(),
                failed = entries.iter().filter(|entry| entry.is_err()).count();
                "scored population with partial failures");

    Ok(BatchReport {
        scored_at: now,
        entries,
    })
}

fn assemble(
    records: impl IntoIterator<Item = CustomerRecord>,
    p_subscribe: &[f64],
    freq_raw: &[f64],
) -> Vec<ScoredRecord> {
    records
        .into_iter()
        .zip(p_subscribe.iter().zip(freq_raw))
        .map(|(record, (p, f))| ScoredRecord {
            record,
            metrics: LoyaltyMetrics::compute(*p, *f),
        })
        .collect()
}
