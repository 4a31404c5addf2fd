//! Pipeline driver: chunk, extract with checkpoints, reconcile, categorize

use crate::config::PipelineConfig;
use crate::error::PipelineError;
use crate::metrics::RunSummary;
use crate::records::RecordSets;
use crate::resume::ResumePrompt;
use factsheet_categorizer::{CacheStats, CategorizationCache, Categorizer};
use factsheet_domain::traits::LlmProvider;
use factsheet_domain::{Categorization, Fact};
use factsheet_extractor::{Chunk, ExtractionOutcome, FactExtractor};
use factsheet_llm::{check_health, LlmError};
use factsheet_reconciler::{ClusterSet, ConflictDetector};
use factsheet_store::{CheckpointManager, RunIdentity};
use futures::stream::{self, StreamExt};
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Everything a completed run produces
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    /// Mentions, consolidated rows and factsheet rows
    pub records: RecordSets,
    /// Clusters after conflict detection
    pub clusters: ClusterSet,
    /// Counters for the run
    pub summary: RunSummary,
}

/// Runs the whole engine over one document
///
/// Chunks are extracted in document order with up to `concurrency` calls in
/// flight. Completions are consumed in order, so the checkpoint always
/// records a contiguous prefix of chunks. The checkpoint is saved every
/// `checkpoint_every_n_chunks`, on shutdown, and once extraction finishes;
/// it is deleted only when the run completes.
pub struct Pipeline<L> {
    llm: Arc<L>,
    config: PipelineConfig,
    extractor: FactExtractor<L>,
    categorizer: Categorizer<L>,
    checkpoints: CheckpointManager,
}

impl<L> Pipeline<L>
where
    L: LlmProvider<Error = LlmError> + Send + Sync + 'static,
{
    /// Create a pipeline with a fresh categorization cache
    pub fn new(llm: Arc<L>, config: PipelineConfig) -> Result<Self, PipelineError> {
        Self::with_cache(llm, Arc::new(CategorizationCache::new()), config)
    }

    /// Create a pipeline sharing an existing categorization cache
    pub fn with_cache(
        llm: Arc<L>,
        cache: Arc<CategorizationCache>,
        config: PipelineConfig,
    ) -> Result<Self, PipelineError> {
        config.validate().map_err(PipelineError::Config)?;

        let extractor = FactExtractor::new(Arc::clone(&llm), config.extractor.clone())
            .map_err(|e| PipelineError::Config(e.to_string()))?;
        let categorizer = Categorizer::with_cache(Arc::clone(&llm), cache, config.categorizer.clone());
        let checkpoints = CheckpointManager::new(&config.checkpoint_path);

        Ok(Self {
            llm,
            config,
            extractor,
            categorizer,
            checkpoints,
        })
    }

    /// Get the configuration
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Checkpoint file used by this pipeline
    pub fn checkpoints(&self) -> &CheckpointManager {
        &self.checkpoints
    }

    /// Categorization cache statistics so far
    pub fn cache_stats(&self) -> CacheStats {
        self.categorizer.stats()
    }

    /// Split a document the way a run would
    pub fn chunk(&self, document: &str) -> Vec<Chunk> {
        self.extractor.chunk(document)
    }

    /// Run to completion
    pub async fn run(
        &self,
        document: &str,
        resume: &dyn ResumePrompt,
    ) -> Result<PipelineOutput, PipelineError> {
        self.run_until(document, resume, std::future::pending::<()>()).await
    }

    /// Run until completion or until `shutdown` resolves
    ///
    /// On shutdown the facts extracted so far are saved and
    /// [`PipelineError::Interrupted`] is returned; in-flight LLM calls are
    /// abandoned.
    ///
    /// # Errors
    ///
    /// - `Checkpoint` if the checkpoint cannot be read or written
    /// - `ProviderUnavailable` if the health check fails after retries
    /// - `Interrupted` after a shutdown signal
    pub async fn run_until<F>(
        &self,
        document: &str,
        resume: &dyn ResumePrompt,
        shutdown: F,
    ) -> Result<PipelineOutput, PipelineError>
    where
        F: Future<Output = ()>,
    {
        let started = Instant::now();
        let mut shutdown = std::pin::pin!(shutdown);

        let chunks = self.extractor.chunk(document);
        let (run, mut facts, start) = self.starting_point(document, chunks.len(), resume)?;

        check_health(&self.llm, &self.config.extractor.call)
            .await
            .map_err(PipelineError::ProviderUnavailable)?;

        let mut summary = RunSummary::new(&run.run_id, self.llm.model_name());
        summary.chunks_total = chunks.len();
        summary.chunks_resumed = start;
        summary.facts_extracted = facts.len();

        info!(
            run_id = %run.run_id,
            chunks = chunks.len(),
            start,
            concurrency = self.config.concurrency,
            "Starting extraction"
        );

        let every = self.config.checkpoint_every_n_chunks;
        let mut processed = start;
        let mut extractions = std::pin::pin!(stream::iter(chunks.iter().skip(start))
            .map(|chunk| self.extractor.extract(chunk))
            .buffered(self.config.concurrency));

        loop {
            tokio::select! {
                biased;
                _ = &mut shutdown => {
                    warn!(processed_chunks = processed, "Shutdown requested, saving checkpoint");
                    self.checkpoints.save(&run, &facts, processed)?;
                    return Err(PipelineError::Interrupted { processed_chunks: processed });
                }
                next = extractions.next() => {
                    let Some(outcome) = next else { break };
                    match outcome {
                        ExtractionOutcome::Facts(found) => {
                            summary.record_chunk(found.len());
                            facts.extend(found);
                        }
                        ExtractionOutcome::SchemaViolation { .. } | ExtractionOutcome::LlmFailure { .. } => {
                            summary.record_skipped_chunk();
                        }
                    }
                    processed += 1;

                    if processed % every == 0 {
                        self.checkpoints.save(&run, &facts, processed)?;
                        info!(
                            processed_chunks = processed,
                            total = chunks.len(),
                            facts = facts.len(),
                            "Checkpoint saved"
                        );
                    }
                }
            }
        }

        // Extraction is complete; keep it even if categorization is cut short
        if processed % every != 0 {
            self.checkpoints.save(&run, &facts, processed)?;
        }

        let mut clusters = ClusterSet::new(ConflictDetector::new(self.config.conflict.clone()));
        clusters.extend(facts.iter().cloned());
        summary.clusters = clusters.len();
        summary.conflicted_clusters = clusters.conflicted_count();
        info!(
            facts = facts.len(),
            clusters = clusters.len(),
            conflicted = clusters.conflicted_count(),
            "Facts reconciled"
        );

        let mut categorizations = HashMap::new();
        if self.config.categorizer.enabled {
            let results = tokio::select! {
                biased;
                _ = &mut shutdown => {
                    warn!(processed_chunks = processed, "Shutdown requested during categorization");
                    return Err(PipelineError::Interrupted { processed_chunks: processed });
                }
                results = self.categorize_clusters(&clusters) => results,
            };
            for (signature, result) in results {
                summary.record_categorization(result.is_some());
                if let Some(categorization) = result {
                    categorizations.insert(signature, categorization);
                }
            }
        }
        summary.cache = self.categorizer.stats();

        let records = RecordSets::build(&facts, &clusters, &categorizations);
        self.checkpoints.clear()?;

        summary.elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
        info!(
            run_id = %summary.run_id,
            skipped_chunks = summary.chunks_skipped,
            categorization_failures = summary.categorization_failures,
            "Run complete"
        );

        Ok(PipelineOutput {
            records,
            clusters,
            summary,
        })
    }

    /// Decide where the chunk loop starts
    fn starting_point(
        &self,
        document: &str,
        chunk_count: usize,
        resume: &dyn ResumePrompt,
    ) -> Result<(RunIdentity, Vec<Fact>, usize), PipelineError> {
        let fresh = || (RunIdentity::for_document(document), Vec::new(), 0);

        let checkpoint = match self.checkpoints.load() {
            Ok(checkpoint) => checkpoint,
            Err(e) if e.is_unreadable_checkpoint() => {
                warn!(path = %self.checkpoints.path().display(), error = %e, "Ignoring unreadable checkpoint");
                None
            }
            Err(e) => return Err(e.into()),
        };
        let Some(checkpoint) = checkpoint else {
            return Ok(fresh());
        };

        if !checkpoint.matches_document(document) {
            warn!(
                run_id = %checkpoint.run_id,
                "Checkpoint was taken over a different document, starting from chunk 0"
            );
            return Ok(fresh());
        }
        if checkpoint.processed_chunk_count > chunk_count {
            warn!(
                processed_chunk_count = checkpoint.processed_chunk_count,
                chunk_count,
                "Checkpoint covers more chunks than the document has, starting from chunk 0"
            );
            return Ok(fresh());
        }
        if !resume.should_resume(&checkpoint) {
            info!(run_id = %checkpoint.run_id, "Checkpoint discarded, starting from chunk 0");
            return Ok(fresh());
        }

        info!(
            run_id = %checkpoint.run_id,
            processed_chunk_count = checkpoint.processed_chunk_count,
            facts = checkpoint.facts.len(),
            "Resuming from checkpoint"
        );
        Ok((
            RunIdentity::resumed(&checkpoint),
            checkpoint.facts,
            checkpoint.processed_chunk_count,
        ))
    }

    /// One categorization per cluster, from its first occurrence
    async fn categorize_clusters(&self, clusters: &ClusterSet) -> Vec<(String, Option<Categorization>)> {
        let representatives = clusters
            .iter()
            .filter_map(|cluster| cluster.first().map(|fact| (cluster.signature(), fact)));

        let results: Vec<(String, Option<Categorization>)> = stream::iter(representatives)
            .map(|(signature, fact)| async move {
                let result = self
                    .categorizer
                    .try_categorize(signature, &fact.name, &fact.raw_value, &fact.raw_unit)
                    .await;
                (signature.to_string(), result)
            })
            .buffer_unordered(self.config.concurrency)
            .collect()
            .await;

        debug!(clusters = results.len(), "Categorization finished");
        results
    }
}
