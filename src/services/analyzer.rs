//! Document analysis service.
//!
//! `DocumentAnalyzer` owns the extraction engine, the analysis pipeline and
//! a result cache. Analyses are cached by operation, text and parameters;
//! extractions by a hash of the file contents. Failures are never cached.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use sha2::{Digest, Sha256};
use thiserror::Error;

use crate::analysis::AnalysisPipeline;
use crate::backend::{BackendError, BackendManager, ConfiguredFactory};
use crate::cache::{CacheKey, ResultCache};
use crate::config::{AnalysisConfig, Config};
use crate::extract::{ExtractionEngine, ExtractionError};
use crate::models::{
    AnalysisParams, AnalysisRequest, AnalysisResult, DocumentKind, ExtractedDocument,
    ExtractionDetail,
};

/// Errors from the analyzer service.
#[derive(Debug, Error)]
pub enum AnalyzerError {
    #[error(transparent)]
    Extraction(#[from] ExtractionError),

    #[error(transparent)]
    Backend(#[from] BackendError),

    #[error("Background task failed: {0}")]
    Task(String),
}

/// Values stored in the analyzer's cache.
#[derive(Debug, Clone)]
pub enum CachedValue {
    Analysis(AnalysisResult),
    Document(ExtractedDocument),
}

/// Extraction, analysis and caching behind one entry point.
pub struct DocumentAnalyzer {
    extraction: ExtractionEngine,
    pipeline: AnalysisPipeline,
    cache: ResultCache<CachedValue>,
    defaults: AnalysisConfig,
}

impl DocumentAnalyzer {
    pub fn new(
        extraction: ExtractionEngine,
        backends: Arc<BackendManager>,
        cache: ResultCache<CachedValue>,
    ) -> Self {
        Self {
            extraction,
            pipeline: AnalysisPipeline::new(backends),
            cache,
            defaults: AnalysisConfig::default(),
        }
    }

    /// Default parameters for the convenience methods.
    pub fn with_defaults(mut self, defaults: AnalysisConfig) -> Self {
        self.defaults = defaults;
        self
    }

    /// Build an analyzer from configuration. Backends are not constructed
    /// until first use.
    pub fn from_config(config: &Config) -> Self {
        let factory = ConfiguredFactory::new(
            config.backends.sentiment.clone(),
            config.backends.summary.clone(),
        );
        Self::new(
            ExtractionEngine::from_config(&config.extraction),
            Arc::new(BackendManager::new(Arc::new(factory))),
            ResultCache::new(config.cache.ttl(), config.cache.capacity),
        )
        .with_defaults(config.analysis.clone())
    }

    pub fn backends(&self) -> &Arc<BackendManager> {
        self.pipeline.backends()
    }

    pub fn defaults(&self) -> &AnalysisConfig {
        &self.defaults
    }

    pub fn cache_len(&self) -> usize {
        self.cache.len()
    }

    /// Run an analysis, answering from the cache when possible.
    pub fn analyze(&self, request: &AnalysisRequest) -> Result<AnalysisResult, AnalyzerError> {
        let key = CacheKey::derive(
            request.operation().as_str(),
            &request.text,
            &request.params.to_sorted_map(),
        );
        if let Some(CachedValue::Analysis(hit)) = self.cache.get(&key) {
            tracing::debug!("Cache hit for {} analysis", request.operation());
            return Ok(hit);
        }

        let result = self.pipeline.analyze(request)?;
        if !result.is_failure() {
            self.cache.insert(key, CachedValue::Analysis(result.clone()));
        }
        Ok(result)
    }

    pub fn sentiment(&self, text: &str) -> Result<AnalysisResult, AnalyzerError> {
        self.analyze(&AnalysisRequest::sentiment(text))
    }

    /// Summarize with the configured length bounds.
    pub fn summarize(&self, text: &str) -> Result<AnalysisResult, AnalyzerError> {
        self.analyze(&AnalysisRequest::summary(
            text,
            self.defaults.max_length,
            self.defaults.min_length,
        ))
    }

    /// Top keywords using the configured count.
    pub fn keywords(&self, text: &str) -> Result<AnalysisResult, AnalyzerError> {
        self.analyze(&AnalysisRequest::keywords(text, self.defaults.top_n))
    }

    /// Extract a document of a declared kind, cached by content hash.
    pub fn extract(
        &self,
        path: &Path,
        kind: DocumentKind,
        detail: ExtractionDetail,
    ) -> Result<ExtractedDocument, AnalyzerError> {
        let key = extraction_key(path, kind, detail)?;
        if let Some(CachedValue::Document(hit)) = self.cache.get(&key) {
            tracing::debug!("Cache hit for extraction of {}", path.display());
            return Ok(hit);
        }

        let doc = self.extraction.extract(path, kind, detail)?;
        self.cache.insert(key, CachedValue::Document(doc.clone()));
        Ok(doc)
    }

    /// Extract a document, detecting its kind from the path or contents.
    pub fn extract_path(
        &self,
        path: &Path,
        detail: ExtractionDetail,
    ) -> Result<ExtractedDocument, AnalyzerError> {
        let kind = ExtractionEngine::resolve_kind(path)?;
        self.extract(path, kind, detail)
    }

    /// Extract a document and analyze its text.
    pub fn analyze_document(
        &self,
        path: &Path,
        kind: Option<DocumentKind>,
        params: AnalysisParams,
    ) -> Result<AnalysisResult, AnalyzerError> {
        let kind = match kind {
            Some(kind) => kind,
            None => ExtractionEngine::resolve_kind(path)?,
        };
        let doc = self.extract(path, kind, ExtractionDetail::Summary)?;
        self.analyze(&AnalysisRequest::new(doc.text, params))
    }

    /// [`analyze`](Self::analyze) on the blocking thread pool.
    pub async fn analyze_async(
        self: &Arc<Self>,
        request: AnalysisRequest,
    ) -> Result<AnalysisResult, AnalyzerError> {
        let analyzer = Arc::clone(self);
        tokio::task::spawn_blocking(move || analyzer.analyze(&request))
            .await
            .map_err(|e| AnalyzerError::Task(e.to_string()))?
    }

    /// [`extract`](Self::extract) on the blocking thread pool.
    pub async fn extract_async(
        self: &Arc<Self>,
        path: PathBuf,
        kind: Option<DocumentKind>,
        detail: ExtractionDetail,
    ) -> Result<ExtractedDocument, AnalyzerError> {
        let analyzer = Arc::clone(self);
        tokio::task::spawn_blocking(move || match kind {
            Some(kind) => analyzer.extract(&path, kind, detail),
            None => analyzer.extract_path(&path, detail),
        })
        .await
        .map_err(|e| AnalyzerError::Task(e.to_string()))?
    }

    /// [`analyze_document`](Self::analyze_document) on the blocking thread pool.
    pub async fn analyze_document_async(
        self: &Arc<Self>,
        path: PathBuf,
        kind: Option<DocumentKind>,
        params: AnalysisParams,
    ) -> Result<AnalysisResult, AnalyzerError> {
        let analyzer = Arc::clone(self);
        tokio::task::spawn_blocking(move || analyzer.analyze_document(&path, kind, params))
            .await
            .map_err(|e| AnalyzerError::Task(e.to_string()))?
    }

    /// Release backends and drop cached results.
    pub fn shutdown(&self) {
        self.backends().shutdown();
        self.cache.clear();
        tracing::info!("Analyzer shut down");
    }
}

fn extraction_key(
    path: &Path,
    kind: DocumentKind,
    detail: ExtractionDetail,
) -> Result<CacheKey, ExtractionError> {
    let bytes = std::fs::read(path)?;
    let digest = hex::encode(Sha256::digest(&bytes));

    let mut params = BTreeMap::new();
    params.insert("kind".to_string(), kind.as_str().to_string());
    let detail = match detail {
        ExtractionDetail::Summary => "summary",
        ExtractionDetail::Full => "full",
    };
    params.insert("detail".to_string(), detail.to_string());
    Ok(CacheKey::derive("extract", &digest, &params))
}
