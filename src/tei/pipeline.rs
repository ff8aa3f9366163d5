//! Request pipeline and service facade
//!
//! One request flows left to right exactly once: parse both trees, extract
//! units, resolve correspondences through the adapter, mint identifiers,
//! mutate both trees, compose the corpus. Nothing is retained across
//! requests and nothing is shared between them except the read-only backend
//! handle, so no locking of document state is ever needed. A request either
//! completes fully or fails atomically; no partial corpus is emitted.

use std::sync::Arc;
use std::time::Instant;

use tokio::sync::Semaphore;
use tracing::{debug, info};

use crate::tei::align::{adapter, AlignConfig, Aligner, Side};
use crate::tei::annotate;
use crate::tei::compose;
use crate::tei::error::{AlignError, AlignmentPipelineError};
use crate::tei::extract::{self, ExtractConfig};
use crate::tei::group::{build_groups, IdMinter, UuidMinter};
use crate::tei::model;
use crate::tei::segment::{RuleSplitter, SentenceSplitter};
use crate::tei::xml::Document;

/// One annotation request. Languages left as `None` fall back to the
/// document's own header declaration, then to `en`.
#[derive(Debug, Clone)]
pub struct AnnotateRequest<'a> {
    pub source_xml: &'a str,
    pub target_xml: &'a str,
    pub source_lang: Option<&'a str>,
    pub target_lang: Option<&'a str>,
    pub config: AlignConfig,
    pub extract: ExtractConfig,
}

impl<'a> AnnotateRequest<'a> {
    pub fn new(source_xml: &'a str, target_xml: &'a str) -> Self {
        Self {
            source_xml,
            target_xml,
            source_lang: None,
            target_lang: None,
            config: AlignConfig::default(),
            extract: ExtractConfig::default(),
        }
    }
}

/// The composed corpus plus request metadata for summaries.
#[derive(Debug, Clone)]
pub struct ComposedOutput {
    pub xml: String,
    pub source_lang: String,
    pub target_lang: String,
    pub group_count: usize,
    pub source_units: usize,
    pub target_units: usize,
    pub source_title: Option<String>,
    pub target_title: Option<String>,
    pub elapsed_ms: u128,
}

fn resolve_lang(requested: Option<&str>, doc: &Document) -> String {
    requested
        .map(str::to_string)
        .or_else(|| extract::document_language(doc))
        .unwrap_or_else(|| "en".to_string())
}

/// Run the whole pipeline for one request.
pub fn annotate(
    request: &AnnotateRequest<'_>,
    aligner: &dyn Aligner,
    splitter: &dyn SentenceSplitter,
    minter: &mut dyn IdMinter,
) -> Result<ComposedOutput, AlignmentPipelineError> {
    let started = Instant::now();

    let mut source = Document::parse(request.source_xml)?;
    let mut target = Document::parse(request.target_xml)?;
    let source_lang = resolve_lang(request.source_lang, &source);
    let target_lang = resolve_lang(request.target_lang, &target);
    let source_title = extract::document_title(&source);
    let target_title = extract::document_title(&target);

    let source_units = extract::extract_units(&source, &request.extract);
    let target_units = extract::extract_units(&target, &request.extract);
    debug!(
        source_units = source_units.len(),
        target_units = target_units.len(),
        %source_lang,
        %target_lang,
        "extracted alignable units"
    );

    let resolved = adapter::resolve(
        aligner,
        splitter,
        &source_units,
        &target_units,
        &source_lang,
        &target_lang,
        &request.config,
    )?;
    let groups = build_groups(resolved, minter)?;

    annotate::apply(&mut source, &source_units, &groups, Side::Source)?;
    annotate::apply(&mut target, &target_units, &groups, Side::Target)?;

    let xml = compose::compose(&source, &target, &source_lang, &target_lang, &groups);
    info!(
        groups = groups.len(),
        source_units = source_units.len(),
        target_units = target_units.len(),
        "alignment complete"
    );

    Ok(ComposedOutput {
        xml,
        source_lang,
        target_lang,
        group_count: groups.len(),
        source_units: source_units.len(),
        target_units: target_units.len(),
        source_title,
        target_title,
        elapsed_ms: started.elapsed().as_millis(),
    })
}

/// Service facade bounding the number of in-flight alignment computations.
/// The unit-embedding step dominates memory and CPU, so the semaphore here
/// is the system's admission-control point; there is no mid-computation
/// cancellation, timeouts belong to the transport boundary.
pub struct AlignmentService {
    aligner: Arc<dyn Aligner>,
    splitter: Arc<dyn SentenceSplitter>,
    permits: Semaphore,
}

impl AlignmentService {
    pub fn new(
        aligner: Arc<dyn Aligner>,
        splitter: Arc<dyn SentenceSplitter>,
        max_in_flight: usize,
    ) -> Self {
        Self {
            aligner,
            splitter,
            permits: Semaphore::new(max_in_flight),
        }
    }

    /// Process-wide backend handle, rule splitter, two concurrent requests.
    pub fn with_defaults() -> Self {
        Self::new(model::handle(), Arc::new(RuleSplitter::new()), 2)
    }

    pub async fn annotate(
        &self,
        request: &AnnotateRequest<'_>,
    ) -> Result<ComposedOutput, AlignmentPipelineError> {
        let _permit = self.permits.acquire().await.map_err(|e| {
            AlignmentPipelineError::Alignment(AlignError::new(e.to_string()))
        })?;
        let mut minter = UuidMinter::new();
        annotate(
            request,
            self.aligner.as_ref(),
            self.splitter.as_ref(),
            &mut minter,
        )
    }
}
