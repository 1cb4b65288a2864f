use std::fmt;
use std::future::Future;
use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use crate::llm::{CompletionRequest, PromptTemplates, TextBackend};
use crate::models::{Chunk, ChunkRevision};

/// Sampling and iteration settings for the revision pipeline
#[derive(Debug, Clone)]
pub struct RevisionSettings {
    /// Temperature of the initial revise step
    pub revise_temperature: f64,
    /// Number of check-difference / supply-missing rounds
    pub revise_iteration: u32,
    /// Run the polish step after the rounds
    pub enable_polish: bool,
    pub difference_temperature: Option<f64>,
    pub supply_temperature: Option<f64>,
    /// `None` uses the backend default
    pub polish_temperature: Option<f64>,
    pub refinement_temperature: Option<f64>,
}

impl Default for RevisionSettings {
    fn default() -> Self {
        Self {
            revise_temperature: 0.7,
            revise_iteration: 1,
            enable_polish: true,
            difference_temperature: Some(1.0),
            supply_temperature: Some(0.2),
            polish_temperature: None,
            refinement_temperature: Some(0.7),
        }
    }
}

/// One remote call of the pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Refine,
    Revise,
    CheckDifference,
    SupplyMissing,
    Polish,
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Step::Refine => "refine-introduction",
            Step::Revise => "revise",
            Step::CheckDifference => "check-difference",
            Step::SupplyMissing => "supply-missing",
            Step::Polish => "polish",
        };
        f.write_str(name)
    }
}

/// Make a single backend call, converting failure into `None`.
///
/// Exactly one attempt; the error is logged here and not propagated.
async fn attempt(
    backend: &dyn TextBackend,
    label: &str,
    step: Step,
    system: &str,
    user: &str,
    temperature: Option<f64>,
) -> Option<String> {
    let request = CompletionRequest {
        system,
        user,
        temperature,
    };

    match backend.complete(&request).await {
        Ok(text) => {
            debug!("{} {} output:\n{}", label, step, text);
            Some(text)
        }
        Err(e) => {
            warn!("{} {} failed: {:#}", label, step, e);
            None
        }
    }
}

/// Condense the interviewee introduction once at startup.
///
/// Falls back to the raw introduction when the backend call fails.
pub async fn refine_introduction(
    backend: &dyn TextBackend,
    templates: &PromptTemplates,
    introduction: &str,
    settings: &RevisionSettings,
) -> String {
    match attempt(
        backend,
        "Introduction",
        Step::Refine,
        &templates.refinement_system_prompt,
        introduction,
        settings.refinement_temperature,
    )
    .await
    {
        Some(refined) => refined,
        None => {
            warn!("Using the unrefined interviewee introduction");
            introduction.to_string()
        }
    }
}

/// Per-chunk revise → (check-difference → supply-missing)* → polish sequence
pub struct RevisionPipeline {
    backend: Arc<dyn TextBackend>,
    templates: PromptTemplates,
    /// Rendered revise instruction (interviewee identity filled in)
    transcript_system: String,
    settings: RevisionSettings,
}

impl RevisionPipeline {
    pub fn new(
        backend: Arc<dyn TextBackend>,
        templates: PromptTemplates,
        transcript_system: String,
        settings: RevisionSettings,
    ) -> Self {
        Self {
            backend,
            templates,
            transcript_system,
            settings,
        }
    }

    /// Revise one chunk. `None` means the chunk failed irrecoverably.
    ///
    /// - revise fails: `None`, nothing else is called
    /// - check-difference fails: the current revision is returned as-is
    /// - supply-missing or polish fails: `None`
    pub async fn revise_chunk(&self, chunk: &Chunk) -> Option<String> {
        let label = format!("Chunk {}", chunk.index);
        let backend = self.backend.as_ref();
        let unrevised = chunk.text.as_str();

        let mut revised = attempt(
            backend,
            &label,
            Step::Revise,
            &self.transcript_system,
            unrevised,
            Some(self.settings.revise_temperature),
        )
        .await?;

        for round in 1..=self.settings.revise_iteration {
            let difference = attempt(
                backend,
                &label,
                Step::CheckDifference,
                &self.templates.check_difference_system_prompt,
                &self.templates.check_difference_user(unrevised, &revised),
                self.settings.difference_temperature,
            )
            .await;

            let Some(difference) = difference else {
                info!(
                    "{}: stopping at round {} of {}, keeping last revision",
                    label, round, self.settings.revise_iteration
                );
                return Some(revised);
            };

            revised = attempt(
                backend,
                &label,
                Step::SupplyMissing,
                &self.templates.supply_missing_information_system_prompt,
                &self.templates.supply_missing_information_user(
                    unrevised,
                    &revised,
                    &difference,
                ),
                self.settings.supply_temperature,
            )
            .await?;
        }

        if self.settings.enable_polish {
            revised = attempt(
                backend,
                &label,
                Step::Polish,
                &self.templates.polish_system_prompt,
                &revised,
                self.settings.polish_temperature,
            )
            .await?;
        }

        Some(revised)
    }
}

/// Apply `f` to every item with at most `max_workers` running at once.
///
/// Output slot `i` holds the result for `items[i]` whatever the completion
/// order. A slot stays `None` only if its task panicked.
pub async fn map_bounded<T, R, F, Fut>(items: Vec<T>, max_workers: usize, f: F) -> Vec<Option<R>>
where
    T: Send + 'static,
    R: Send + 'static,
    F: Fn(T) -> Fut,
    Fut: Future<Output = R> + Send + 'static,
{
    let semaphore = Arc::new(Semaphore::new(max_workers.max(1)));
    let mut slots: Vec<Option<R>> = std::iter::repeat_with(|| None).take(items.len()).collect();
    let mut tasks = JoinSet::new();

    for (index, item) in items.into_iter().enumerate() {
        let semaphore = semaphore.clone();
        let work = f(item);
        tasks.spawn(async move {
            // Held until the work finishes
            let _permit = semaphore.acquire_owned().await;
            (index, work.await)
        });
    }

    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok((index, result)) => slots[index] = Some(result),
            Err(e) => warn!("Worker task failed: {}", e),
        }
    }

    slots
}

/// Result of Stage 2 processing
#[derive(Debug, Default)]
pub struct Stage2Result {
    /// One entry per input chunk, in chunk order
    pub revisions: Vec<ChunkRevision>,
    pub succeeded: usize,
    pub failed: usize,
}

impl Stage2Result {
    pub fn failed_indices(&self) -> Vec<usize> {
        self.revisions
            .iter()
            .filter(|r| r.is_failed())
            .map(|r| r.index)
            .collect()
    }
}

/// Execute Stage 2: revise all chunks on a bounded worker pool
pub async fn execute_stage2(
    pipeline: Arc<RevisionPipeline>,
    chunks: Vec<Chunk>,
    max_workers: usize,
) -> Stage2Result {
    let total = chunks.len();
    info!(
        "Stage 2: Revising {} chunks with up to {} workers",
        total, max_workers
    );

    let sources: Vec<(usize, String)> = chunks
        .iter()
        .map(|c| (c.index, c.line_separated()))
        .collect();

    let outputs = map_bounded(chunks, max_workers, move |chunk| {
        let pipeline = pipeline.clone();
        async move {
            let revised = pipeline.revise_chunk(&chunk).await;
            match &revised {
                Some(_) => info!("Chunk {}/{}: revised", chunk.index + 1, total),
                None => warn!("Chunk {}/{}: revision failed", chunk.index + 1, total),
            }
            revised
        }
    })
    .await;

    let revisions: Vec<ChunkRevision> = sources
        .into_iter()
        .zip(outputs)
        .map(|((index, source), output)| ChunkRevision {
            index,
            source,
            revised: output.flatten(),
        })
        .collect();

    let failed = revisions.iter().filter(|r| r.is_failed()).count();

    Stage2Result {
        succeeded: revisions.len() - failed,
        failed,
        revisions,
    }
}
