/*!
 * Batch planning: chunking text lists into provider-shaped batches and
 * reassembling results in submission order.
 *
 * Native batches join their items with the provider delimiter into one
 * combined payload; simulated batches keep their items separate and are
 * only scheduled as a unit. Splitting a combined result repairs count
 * mismatches by padding or truncating, never by failing.
 */

use log::warn;
use uuid::Uuid;

use crate::providers::registry::ProviderProfile;

/// How a planned batch will be executed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchMethod {
    /// One delimiter-joined provider call for the whole batch
    Native,
    /// Sequential individual calls, scheduled as a unit
    Simulated,
    /// A single-item batch
    Individual,
}

/// One batch of consecutive input items
#[derive(Debug, Clone)]
pub struct PlannedBatch {
    /// Batch id, for logging and metrics correlation
    pub id: Uuid,
    /// Index of the batch's first item in the original input
    pub first_index: usize,
    /// The batch's items, in input order
    pub texts: Vec<String>,
    /// Execution method
    pub method: BatchMethod,
    /// Delimiter-joined payload; only present for native batches
    pub combined: Option<String>,
}

impl PlannedBatch {
    /// Number of items in this batch
    pub fn len(&self) -> usize {
        self.texts.len()
    }

    /// Whether the batch holds no items
    pub fn is_empty(&self) -> bool {
        self.texts.is_empty()
    }
}

/// The full batching plan for one input list
#[derive(Debug, Clone)]
pub struct BatchPlan {
    /// Planned batches covering the input, in input order
    pub batches: Vec<PlannedBatch>,
    /// Total number of input items
    pub item_count: usize,
}

/// Chunk an input list into provider-shaped batches
///
/// A batch size of 1 (or a single-item input) yields one Individual
/// batch per item. Larger chunks become Native batches when the profile
/// supports it, Simulated otherwise.
pub fn plan(texts: &[String], profile: &ProviderProfile, batch_size: usize) -> BatchPlan {
    let item_count = texts.len();
    if item_count == 0 {
        return BatchPlan { batches: Vec::new(), item_count: 0 };
    }

    let batch_size = batch_size.max(1);
    let mut batches = Vec::new();

    if batch_size == 1 || item_count == 1 {
        for (index, text) in texts.iter().enumerate() {
            batches.push(PlannedBatch {
                id: Uuid::new_v4(),
                first_index: index,
                texts: vec![text.clone()],
                method: BatchMethod::Individual,
                combined: None,
            });
        }
        return BatchPlan { batches, item_count };
    }

    for (chunk_index, chunk) in texts.chunks(batch_size).enumerate() {
        let first_index = chunk_index * batch_size;
        let (method, combined) = if chunk.len() > 1 && profile.supports_native_batch {
            (BatchMethod::Native, Some(chunk.join(&profile.batch_delimiter)))
        } else if chunk.len() > 1 {
            (BatchMethod::Simulated, None)
        } else {
            (BatchMethod::Individual, None)
        };

        batches.push(PlannedBatch {
            id: Uuid::new_v4(),
            first_index,
            texts: chunk.to_vec(),
            method,
            combined,
        });
    }

    BatchPlan { batches, item_count }
}

/// Split a combined translated string back into exactly `expected` items
///
/// Pieces are trimmed. A count mismatch is repaired by padding with
/// empty strings or truncating, and logged as a discrepancy; it is
/// never an error.
pub fn split_combined(combined: &str, delimiter: &str, expected: usize) -> Vec<String> {
    let mut pieces: Vec<String> = combined
        .split(delimiter)
        .map(|piece| piece.trim().to_string())
        .collect();

    if pieces.len() != expected {
        warn!(
            "Batch count mismatch: expected {} segments, provider returned {}; repairing",
            expected,
            pieces.len()
        );
    }

    if pieces.len() < expected {
        pieces.resize(expected, String::new());
    } else {
        pieces.truncate(expected);
    }

    pieces
}
