//! Parallel pipeline runs over many documents.

use std::collections::HashMap;
use std::path::PathBuf;

use parking_lot::Mutex;
use rayon::prelude::*;
use remold_tree::{Document, print_document};
use tracing::{debug, info, warn};

use crate::context::{CancellationToken, ExecutionContext, Message};
use crate::{Pipeline, PipelineError, RunError};

/// Outcome of running the pipeline on one document.
#[derive(Debug)]
pub struct DocumentReport {
    /// Position of the document in the input batch.
    pub index: usize,
    pub path: Option<PathBuf>,
    /// Last fully produced document.
    pub document: Document,
    /// Whether any stage replaced the document.
    pub changed: bool,
    /// New printed text. Only set when the run succeeded and the text differs
    /// from the input.
    pub output: Option<String>,
    pub cycles: usize,
    pub converged: bool,
    pub messages: Vec<Message>,
    pub counters: HashMap<String, u64>,
    pub error: Option<RunError>,
}

impl DocumentReport {
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }

    /// Returns `true` if the printed text changed.
    pub fn has_output(&self) -> bool {
        self.output.is_some()
    }
}

/// Reports for a whole batch, in input order.
#[derive(Debug)]
pub struct BatchReport {
    pub documents: Vec<DocumentReport>,
    /// Index of the document whose failure aborted the batch under fail-fast.
    pub aborted_by: Option<usize>,
}

impl BatchReport {
    pub fn is_aborted(&self) -> bool {
        self.aborted_by.is_some()
    }

    pub fn failures(&self) -> impl Iterator<Item = &DocumentReport> {
        self.documents.iter().filter(|report| !report.is_ok())
    }

    pub fn changed(&self) -> impl Iterator<Item = &DocumentReport> {
        self.documents.iter().filter(|report| report.has_output())
    }
}

/// Runs `pipeline` on every document in parallel.
///
/// Each worker thread owns one [`ExecutionContext`], reset before every
/// document. With `fail_fast`, the first failing document cancels the batch
/// and documents that had not finished report [`RunError::Aborted`].
pub fn run_documents(pipeline: &Pipeline, documents: &[Document], fail_fast: bool) -> BatchReport {
    run_documents_with_cancellation(pipeline, documents, fail_fast, CancellationToken::new())
}

/// Like [`run_documents`], observing an external cancellation token.
pub fn run_documents_with_cancellation(
    pipeline: &Pipeline,
    documents: &[Document],
    fail_fast: bool,
    cancellation: CancellationToken,
) -> BatchReport {
    let first_failure: Mutex<Option<usize>> = Mutex::new(None);

    let mut reports: Vec<DocumentReport> = documents
        .par_iter()
        .enumerate()
        .map_init(
            || ExecutionContext::with_cancellation(cancellation.clone()),
            |ctx, (index, document)| {
                ctx.reset();
                let report = run_one(pipeline, index, document, ctx);

                if fail_fast && is_genuine_failure(&report) {
                    let mut first = first_failure.lock();
                    if first.is_none() {
                        warn!("Aborting batch after failure in document {}", index);
                        *first = Some(index);
                        cancellation.cancel();
                    }
                }
                report
            },
        )
        .collect();

    let aborted_by = *first_failure.lock();
    if aborted_by.is_some() {
        for report in &mut reports {
            if matches!(
                report.error,
                Some(RunError::Pipeline(PipelineError::Cancelled { .. }))
            ) {
                report.error = Some(RunError::Aborted);
                report.output = None;
            }
        }
    }

    let changed = reports.iter().filter(|r| r.has_output()).count();
    let failed = reports.iter().filter(|r| !r.is_ok()).count();
    info!(
        "Processed {} documents: {} changed, {} failed",
        reports.len(),
        changed,
        failed
    );

    BatchReport {
        documents: reports,
        aborted_by,
    }
}

fn run_one(
    pipeline: &Pipeline,
    index: usize,
    document: &Document,
    ctx: &mut ExecutionContext,
) -> DocumentReport {
    let path = document.source_path().map(|p| p.to_path_buf());
    debug!(index, path = ?path, "running pipeline");

    let outcome = pipeline.run(document, ctx);

    let output = match (&outcome.error, outcome.changed) {
        (None, true) => {
            let printed = print_document(&outcome.document);
            (printed != print_document(document)).then_some(printed)
        }
        _ => None,
    };

    DocumentReport {
        index,
        path,
        document: outcome.document,
        changed: outcome.changed,
        output,
        cycles: outcome.cycles,
        converged: outcome.converged,
        messages: ctx.messages().to_vec(),
        counters: ctx.counters().clone(),
        error: outcome.error.map(RunError::from),
    }
}

fn is_genuine_failure(report: &DocumentReport) -> bool {
    match &report.error {
        None => false,
        Some(RunError::Pipeline(PipelineError::Cancelled { .. })) => false,
        Some(_) => true,
    }
}
