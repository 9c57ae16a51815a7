/*!
 * Priority-aware batch scheduler.
 *
 * Accepts a continuous stream of subtitle cues, prioritizes them
 * against the current playback position, and drains them into
 * rate-limit-respecting batches without unbounded concurrency. A single
 * drain loop runs per scheduler; kicking an already-draining scheduler
 * is a no-op. Dispatched batches run to completion.
 */

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use log::{debug, error};
use parking_lot::{Mutex, RwLock};
use tokio::sync::{mpsc, Semaphore};

use crate::app_config::BatchingConfig;

use super::core::{TranslateOptions, TranslationService};

/// One subtitle cue submitted for translation
#[derive(Debug, Clone)]
pub struct CueItem {
    /// Cue text
    pub text: String,
    /// Cue start time, seconds into playback
    pub start: f64,
    /// Cue end time, seconds into playback
    pub end: f64,
}

/// Scheduling context supplied alongside enqueued cues
#[derive(Debug, Clone)]
pub struct EnqueueContext {
    /// Current playback position, seconds
    pub playback_position: f64,
    /// Source language of the cues
    pub source_language: String,
    /// Target language for the cues
    pub target_language: String,
}

/// A translated cue delivered back to the embedder
#[derive(Debug, Clone)]
pub struct TranslatedCue {
    /// Original cue text
    pub text: String,
    /// Translated text (equal to `text` when translation degraded)
    pub translation: String,
    /// Cue start time, seconds
    pub start: f64,
    /// Cue end time, seconds
    pub end: f64,
    /// Target language
    pub target_language: String,
}

/// A cue waiting in the scheduler queue
#[derive(Debug, Clone)]
struct QueueItem {
    text: String,
    start: f64,
    end: f64,
    source_language: String,
    target_language: String,
    /// Arrival order, for stable tie-breaking
    seq: u64,
}

/// Compute a cue's urgency against the playback position
///
/// Base priority 1, a tiered bonus for proximity of the cue start to
/// the playback position, and +20 on top when the cue's time span
/// contains the position. Higher is more urgent.
pub fn compute_priority(start: f64, end: f64, playback_position: f64) -> i32 {
    let mut priority = 1;

    let distance = (start - playback_position).abs();
    if distance < 5.0 {
        priority += 10;
    } else if distance < 15.0 {
        priority += 5;
    } else if distance < 30.0 {
        priority += 2;
    }

    if start <= playback_position && playback_position <= end {
        priority += 20;
    }

    priority
}

struct SchedulerInner {
    service: Arc<TranslationService>,
    config: Arc<RwLock<BatchingConfig>>,
    queue: Mutex<Vec<QueueItem>>,
    playback_position: Mutex<f64>,
    next_seq: AtomicU64,
    drain_active: AtomicBool,
    batch_permits: Arc<Semaphore>,
    results: mpsc::UnboundedSender<TranslatedCue>,
}

/// Priority queue draining cues into concurrency-bounded batches
pub struct BatchScheduler {
    inner: Arc<SchedulerInner>,
}

impl BatchScheduler {
    /// Create a scheduler over a translation service; translated cues
    /// arrive on the returned receiver
    pub fn new(
        service: Arc<TranslationService>,
        config: Arc<RwLock<BatchingConfig>>,
    ) -> (Self, mpsc::UnboundedReceiver<TranslatedCue>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let max_concurrent = config.read().max_concurrent_batches.max(1);
        let inner = Arc::new(SchedulerInner {
            service,
            config,
            queue: Mutex::new(Vec::new()),
            playback_position: Mutex::new(0.0),
            next_seq: AtomicU64::new(0),
            drain_active: AtomicBool::new(false),
            batch_permits: Arc::new(Semaphore::new(max_concurrent)),
            results: tx,
        });
        (Self { inner }, rx)
    }

    /// Update the playback position used for prioritization
    pub fn update_playback(&self, position: f64) {
        *self.inner.playback_position.lock() = position;
    }

    /// Enqueue cues for translation and kick the drain loop
    ///
    /// Must be called from within a tokio runtime; results are
    /// delivered asynchronously on the scheduler's channel.
    pub fn enqueue(&self, items: Vec<CueItem>, context: &EnqueueContext) {
        if items.is_empty() {
            return;
        }
        self.update_playback(context.playback_position);
        {
            let mut queue = self.inner.queue.lock();
            for item in items {
                let seq = self.inner.next_seq.fetch_add(1, Ordering::Relaxed);
                queue.push(QueueItem {
                    text: item.text,
                    start: item.start,
                    end: item.end,
                    source_language: context.source_language.clone(),
                    target_language: context.target_language.clone(),
                    seq,
                });
            }
        }
        Self::kick(&self.inner);
    }

    /// Number of cues waiting to be dispatched
    pub fn queue_len(&self) -> usize {
        self.inner.queue.lock().len()
    }

    /// Start the drain loop unless one is already running
    fn kick(inner: &Arc<SchedulerInner>) {
        if inner.drain_active.swap(true, Ordering::AcqRel) {
            return;
        }
        let inner = inner.clone();
        tokio::spawn(async move {
            SchedulerInner::drain(inner).await;
        });
    }
}

impl SchedulerInner {
    /// Take the highest-priority run of same-language-pair cues
    fn take_batch(&self, batch_size: usize) -> Vec<QueueItem> {
        let playback = *self.playback_position.lock();
        let mut queue = self.queue.lock();
        if queue.is_empty() {
            return Vec::new();
        }

        // Stable sort: priority descending, arrival order breaking ties
        queue.sort_by(|a, b| {
            compute_priority(b.start, b.end, playback)
                .cmp(&compute_priority(a.start, a.end, playback))
                .then(a.seq.cmp(&b.seq))
        });

        // A batch goes to one provider call chain, so it must share one
        // language pair; skip mismatching cues for later passes.
        let lead = queue[0].clone();
        let mut batch = Vec::with_capacity(batch_size);
        let mut index = 0;
        while index < queue.len() && batch.len() < batch_size {
            if queue[index].source_language == lead.source_language
                && queue[index].target_language == lead.target_language
            {
                batch.push(queue.remove(index));
            } else {
                index += 1;
            }
        }
        batch
    }

    /// Single active drain loop: form batches, dispatch them under the
    /// concurrency bound, pause between formations
    async fn drain(inner: Arc<Self>) {
        loop {
            let provider = inner.service.active_provider();
            let batch_size = match inner.service.effective_batch_size(&provider) {
                Ok(size) => size,
                Err(err) => {
                    // Configuration defect; drop nothing, deliver originals
                    error!("Scheduler cannot size batches: {}", err);
                    1
                }
            };

            let batch = inner.take_batch(batch_size);
            if batch.is_empty() {
                inner.drain_active.store(false, Ordering::Release);
                // An enqueue may have raced the shutdown; reclaim the
                // drain if items appeared and nobody else took it.
                if inner.queue.lock().is_empty()
                    || inner.drain_active.swap(true, Ordering::AcqRel)
                {
                    return;
                }
                continue;
            }

            debug!(
                "Dispatching batch of {} cues ({} still queued)",
                batch.len(),
                inner.queue.lock().len()
            );

            let permit = inner
                .batch_permits
                .clone()
                .acquire_owned()
                .await
                .expect("scheduler semaphore closed");
            let task_inner = inner.clone();
            tokio::spawn(async move {
                task_inner.run_batch(batch).await;
                drop(permit);
                // A completed batch may free capacity for queued cues
                BatchScheduler::kick(&task_inner);
            });

            let delay = Duration::from_millis(inner.config.read().inter_batch_delay_ms);
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
        }
    }

    /// Translate one formed batch and deliver its results
    async fn run_batch(&self, batch: Vec<QueueItem>) {
        let source = batch[0].source_language.clone();
        let target = batch[0].target_language.clone();
        let texts: Vec<String> = batch.iter().map(|item| item.text.clone()).collect();

        let translations = match self
            .service
            .translate_batch(&texts, &source, &target, &TranslateOptions::default())
            .await
        {
            Ok(translations) => translations,
            Err(err) => {
                // Only configuration errors reach here; degrade to the
                // original texts so no cue is left unresolved.
                error!("Batch translation failed outright: {}", err);
                texts.clone()
            }
        };

        for (item, translation) in batch.into_iter().zip(translations) {
            let delivered = TranslatedCue {
                text: item.text,
                translation,
                start: item.start,
                end: item.end,
                target_language: target.clone(),
            };
            if self.results.send(delivered).is_err() {
                debug!("Result receiver dropped, discarding translated cue");
            }
        }
    }
}
