//! Pipeline orchestration: chunk, dispatch, parse, merge
//!
//! One document at a time, chunk-category calls fan out across a bounded
//! worker pool. The model call is the only suspension point; everything else
//! is synchronous. Completions can arrive in any order; the per-document
//! merger restores chunk order before records are appended.

use crate::chunker::chunk_text;
use crate::config::PipelineConfig;
use crate::error::ExtractorError;
use crate::merge::DocumentMerger;
use crate::parser::parse_response;
use crate::prompt::PromptLibrary;
use std::sync::Arc;
use textmine_llm::{complete_with_retry, LlmError, ModelBackend};
use textmine_schema::{AggregateOutput, DegradedEntry, Document, ExtractionResult, RunMetadata, SchemaRegistry};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// The extraction pipeline: turns documents into an [`AggregateOutput`]
pub struct Extractor {
    backend: Arc<dyn ModelBackend>,
    registry: Arc<SchemaRegistry>,
    prompts: Arc<PromptLibrary>,
    config: PipelineConfig,
    cancel: CancellationToken,
}

/// Tracks run-wide backend health for the fatal-abort escalation
struct RunState {
    any_success: bool,
    consecutive_failures: usize,
}

struct DocumentOutcome {
    result: ExtractionResult,
    degraded: Vec<DegradedEntry>,
    discarded_lines: usize,
}

enum CallReply {
    Completed {
        chunk_index: usize,
        category: String,
        response: Result<String, LlmError>,
    },
    Skipped,
}

impl Extractor {
    /// Create a pipeline; validates the configuration
    pub fn new(
        backend: Arc<dyn ModelBackend>,
        registry: SchemaRegistry,
        prompts: PromptLibrary,
        config: PipelineConfig,
    ) -> Result<Self, ExtractorError> {
        config.validate()?;
        Ok(Self {
            backend,
            registry: Arc::new(registry),
            prompts: Arc::new(prompts),
            config,
            cancel: CancellationToken::new(),
        })
    }

    /// Token that stops the run when cancelled
    ///
    /// Cancellation stops new model calls promptly; in-flight calls complete
    /// or time out, and partial results are still finalized.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Run the pipeline over a set of documents
    ///
    /// Documents are processed sequentially; chunk-category calls within a
    /// document run concurrently up to `max_workers`. Per-call failures
    /// degrade the affected chunk-category pair; the run only fails when
    /// `failure_threshold` consecutive calls fail before any call has ever
    /// succeeded.
    pub async fn run(&self, documents: Vec<Document>) -> Result<AggregateOutput, ExtractorError> {
        let mut metadata = RunMetadata::new(self.backend.model());
        metadata.total_documents = documents.len();
        let mut aggregate = AggregateOutput::new(metadata);

        let mut state = RunState {
            any_success: false,
            consecutive_failures: 0,
        };

        for document in documents {
            if self.cancel.is_cancelled() {
                info!("cancellation requested, stopping before '{}'", document.id);
                break;
            }

            info!(
                document = %document.id,
                text_length = document.text.len(),
                "processing document"
            );

            let outcome = self.process_document(&document, &mut state).await?;
            info!(
                document = %document.id,
                records = outcome.result.record_count(),
                degraded = outcome.degraded.len(),
                "document finalized"
            );

            aggregate.metadata.degraded.extend(outcome.degraded);
            aggregate.metadata.discarded_lines += outcome.discarded_lines;
            aggregate.add_document(document.id, outcome.result);
        }

        Ok(aggregate)
    }

    async fn process_document(
        &self,
        document: &Document,
        state: &mut RunState,
    ) -> Result<DocumentOutcome, ExtractorError> {
        let chunks = chunk_text(&document.text, &self.config)?;
        debug!(
            document = %document.id,
            chunks = chunks.len(),
            categories = self.registry.len(),
            "dispatching chunk-category calls"
        );

        let semaphore = Arc::new(Semaphore::new(self.config.max_workers));
        let policy = self.config.retry_policy();
        let mut join_set: JoinSet<CallReply> = JoinSet::new();

        'spawn: for chunk in &chunks {
            for category in self.registry.categories() {
                if self.cancel.is_cancelled() {
                    break 'spawn;
                }

                let prompt = self.prompts.build(category, &chunk.text)?;
                let backend = Arc::clone(&self.backend);
                let semaphore = Arc::clone(&semaphore);
                let cancel = self.cancel.clone();
                let policy = policy.clone();
                let chunk_index = chunk.index;
                let category = category.name.clone();

                join_set.spawn(async move {
                    let _permit = tokio::select! {
                        _ = cancel.cancelled() => return CallReply::Skipped,
                        permit = semaphore.acquire_owned() => match permit {
                            Ok(permit) => permit,
                            Err(_) => return CallReply::Skipped,
                        },
                    };
                    if cancel.is_cancelled() {
                        return CallReply::Skipped;
                    }
                    let response = complete_with_retry(backend.as_ref(), &prompt, &policy).await;
                    CallReply::Completed {
                        chunk_index,
                        category,
                        response,
                    }
                });
            }
        }

        let mut merger = DocumentMerger::new(&document.id, Arc::clone(&self.registry));
        let mut degraded = Vec::new();
        let mut discarded_lines = 0;

        while let Some(joined) = join_set.join_next().await {
            let reply = joined.map_err(|e| ExtractorError::Worker(e.to_string()))?;
            let CallReply::Completed {
                chunk_index,
                category,
                response,
            } = reply
            else {
                continue;
            };

            match response {
                Ok(raw) => {
                    state.any_success = true;
                    state.consecutive_failures = 0;

                    let Some(category_def) = self.registry.get(&category) else {
                        continue;
                    };
                    let (records, dropped) =
                        parse_response(&raw, category_def, &document.id, chunk_index).into_parts();
                    if dropped > 0 {
                        debug!(
                            document = %document.id,
                            category = %category,
                            chunk_index,
                            dropped,
                            "response repaired with discarded lines"
                        );
                    }
                    discarded_lines += dropped;
                    merger.insert(chunk_index, category, records);
                }
                Err(error) => {
                    warn!(
                        document = %document.id,
                        category = %category,
                        chunk_index,
                        "chunk-category call failed after retries: {}",
                        error
                    );
                    degraded.push(DegradedEntry {
                        document_id: document.id.clone(),
                        category,
                        chunk_index,
                    });

                    if !state.any_success {
                        state.consecutive_failures += 1;
                        if state.consecutive_failures >= self.config.failure_threshold {
                            join_set.abort_all();
                            return Err(ExtractorError::NoUsableBackend {
                                consecutive: state.consecutive_failures,
                            });
                        }
                    }
                }
            }
        }

        Ok(DocumentOutcome {
            result: merger.finalize(),
            degraded,
            discarded_lines,
        })
    }
}
