use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, OnceLock};

use regqa_core::error::{codes, AppError};

pub mod ollama_embed;

/// External "text -> fixed-length vector" function.
pub trait Embedder: Send + Sync {
    /// One vector per input, in input order.
    fn embed(&self, model: &str, inputs: &[String]) -> Result<Vec<Vec<f32>>, AppError>;

    /// Expensive one-time initialisation (model load, connectivity check).
    fn warm_up(&self, _model: &str) -> Result<(), AppError> {
        Ok(())
    }
}

/// Owned wrapper around an [`Embedder`] backend for one configured model.
///
/// The backend is warmed up on first use. Every vector the adapter hands out
/// has the same width; a backend that changes width mid-process is rejected.
pub struct EmbedderAdapter {
    backend: Box<dyn Embedder>,
    model: String,
    ready: OnceLock<()>,
    warm_lock: Mutex<()>,
    dims: OnceLock<usize>,
}

impl EmbedderAdapter {
    pub fn new(backend: Box<dyn Embedder>, model: impl Into<String>) -> Self {
        Self {
            backend,
            model: model.into(),
            ready: OnceLock::new(),
            warm_lock: Mutex::new(()),
            dims: OnceLock::new(),
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Width observed so far, if any call has completed.
    pub fn dims(&self) -> Option<usize> {
        self.dims.get().copied()
    }

    fn ensure_ready(&self) -> Result<(), AppError> {
        if self.ready.get().is_some() {
            return Ok(());
        }
        let _guard = self.warm_lock.lock().unwrap_or_else(|p| p.into_inner());
        if self.ready.get().is_none() {
            self.backend.warm_up(&self.model)?;
            tracing::debug!(model = %self.model, "embedding backend ready");
            let _ = self.ready.set(());
        }
        Ok(())
    }

    pub fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, AppError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        self.ensure_ready()?;
        let vectors = self.backend.embed(&self.model, texts)?;
        if vectors.len() != texts.len() {
            return Err(AppError::new(
                codes::REMOTE_BAD_RESPONSE,
                "Embedding backend returned the wrong number of vectors",
            )
            .with_details(format!("expected={}; got={}", texts.len(), vectors.len())));
        }
        for (i, v) in vectors.iter().enumerate() {
            if v.is_empty() {
                return Err(AppError::new(
                    codes::REMOTE_BAD_RESPONSE,
                    "Embedding backend returned an empty vector",
                )
                .with_details(format!("model={}; input={i}", self.model)));
            }
            if v.iter().any(|x| !x.is_finite()) {
                return Err(AppError::new(
                    codes::REMOTE_BAD_RESPONSE,
                    "Embedding backend returned NaN or infinite values",
                )
                .with_details(format!("model={}; input={i}", self.model)));
            }
            let expected = *self.dims.get_or_init(|| v.len());
            if v.len() != expected {
                return Err(AppError::new(
                    codes::CONFIG_DIMENSION_MISMATCH,
                    "Embedding width changed within one model",
                )
                .with_details(format!(
                    "model={}; expected={}; got={}",
                    self.model,
                    expected,
                    v.len()
                )));
            }
        }
        Ok(vectors)
    }

    pub fn embed_one(&self, text: &str) -> Result<Vec<f32>, AppError> {
        let mut out = self.embed(&[text.to_string()])?;
        out.pop().ok_or_else(|| {
            AppError::new(codes::REMOTE_BAD_RESPONSE, "Embedding backend returned no vector")
        })
    }

    /// Embed `texts` in batches of `batch_size`, spread over `workers` threads.
    ///
    /// Output order always matches input order regardless of completion order.
    pub fn embed_batched(
        &self,
        texts: &[String],
        batch_size: usize,
        workers: usize,
    ) -> Result<Vec<Vec<f32>>, AppError> {
        let batch_size = batch_size.max(1);
        let batches: Vec<&[String]> = texts.chunks(batch_size).collect();
        let total = batches.len();
        let workers = workers.clamp(1, total.max(1));

        if workers == 1 {
            let mut out = Vec::with_capacity(texts.len());
            for (i, batch) in batches.iter().enumerate() {
                out.extend(self.embed(batch)?);
                tracing::debug!(batch = i + 1, total, "embedded batch");
            }
            return Ok(out);
        }

        let next = AtomicUsize::new(0);
        let results: Vec<Mutex<Option<Result<Vec<Vec<f32>>, AppError>>>> =
            (0..total).map(|_| Mutex::new(None)).collect();
        std::thread::scope(|scope| {
            for _ in 0..workers {
                scope.spawn(|| loop {
                    let i = next.fetch_add(1, Ordering::SeqCst);
                    if i >= total {
                        break;
                    }
                    let res = self.embed(batches[i]);
                    let failed = res.is_err();
                    *results[i].lock().unwrap_or_else(|p| p.into_inner()) = Some(res);
                    if failed {
                        // Stop handing out work; the build is aborting anyway.
                        next.store(total, Ordering::SeqCst);
                        break;
                    }
                    tracing::debug!(batch = i + 1, total, "embedded batch");
                });
            }
        });

        let mut out = Vec::with_capacity(texts.len());
        for (i, slot) in results.into_iter().enumerate() {
            match slot.into_inner().unwrap_or_else(|p| p.into_inner()) {
                Some(Ok(vs)) => out.extend(vs),
                Some(Err(e)) => return Err(e),
                None => {
                    return Err(AppError::new(
                        codes::REMOTE_UNAVAILABLE,
                        "Embedding batch was not computed",
                    )
                    .with_details(format!("batch={}", i + 1))
                    .with_retryable(true))
                }
            }
        }
        Ok(out)
    }
}
