//! Diagnostic modules: a collector bound to a pure scorer.
//!
//! - [`Collector`] gathers a raw snapshot through the [`PageContext`]; it is
//!   the only stage allowed to do I/O.
//! - [`Scorer`] turns that snapshot into findings; pure and synchronous, so
//!   it can be tested against fixed fixtures.
//! - [`ModuleDescriptor`] type-erases the pair so heterogeneous modules can
//!   live in one [`crate::Registry`].

use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use async_trait::async_trait;

use crate::context::PageContext;
use crate::error::{CollectionError, CollectionResult, ModuleError, ScoringError, ScoringResult};
use crate::finding::Finding;

/// A raw snapshot plus the reasons it may be incomplete.
///
/// A non-empty `degraded` list turns an otherwise successful report into a
/// `partial` one.
#[derive(Debug, Clone, PartialEq)]
pub struct Collected<T> {
    pub data: T,
    pub degraded: Vec<String>,
}

impl<T> Collected<T> {
    pub fn complete(data: T) -> Self {
        Self {
            data,
            degraded: Vec::new(),
        }
    }

    pub fn degraded(data: T, reasons: Vec<String>) -> Self {
        Self {
            data,
            degraded: reasons,
        }
    }

    pub fn is_degraded(&self) -> bool {
        !self.degraded.is_empty()
    }
}

/// Gathers raw environment facts for one check.
///
/// Must not mutate the environment. Probes go through [`crate::probe::head`].
#[async_trait]
pub trait Collector: Send + Sync + 'static {
    type Raw: Send + Sync + 'static;

    async fn collect(&self, ctx: &dyn PageContext) -> CollectionResult<Collected<Self::Raw>>;
}

/// Turns a raw snapshot into findings. No I/O.
pub trait Scorer: Send + Sync + 'static {
    type Raw;

    fn score(&self, raw: &Self::Raw) -> ScoringResult<Vec<Finding>>;
}

/// What a successful module execution yields.
#[derive(Debug, Clone, PartialEq)]
pub struct ModuleOutput {
    pub findings: Vec<Finding>,
    pub degraded: Vec<String>,
}

#[async_trait]
trait ModuleExec: Send + Sync {
    async fn execute(&self, ctx: &dyn PageContext) -> Result<ModuleOutput, ModuleError>;
}

struct Bound<C, S> {
    collector: C,
    scorer: S,
}

#[async_trait]
impl<C, S> ModuleExec for Bound<C, S>
where
    C: Collector,
    S: Scorer<Raw = C::Raw>,
{
    async fn execute(&self, ctx: &dyn PageContext) -> Result<ModuleOutput, ModuleError> {
        let token = ctx.cancellation();
        let collected = tokio::select! {
            biased;
            _ = token.cancelled() => Err(CollectionError::cancelled()),
            res = self.collector.collect(ctx) => res,
        }?;

        let findings = score_guarded(&self.scorer, &collected.data)?;
        Ok(ModuleOutput {
            findings,
            degraded: collected.degraded,
        })
    }
}

/// Run a scorer, converting a panic into [`ScoringError::Panicked`].
fn score_guarded<S: Scorer>(scorer: &S, raw: &S::Raw) -> ScoringResult<Vec<Finding>> {
    catch_unwind(AssertUnwindSafe(|| scorer.score(raw)))
        .unwrap_or_else(|payload| Err(ScoringError::Panicked(panic_message(payload.as_ref()))))
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

/// A collector/scorer pair ready for registration.
#[derive(Clone)]
pub struct ModuleDescriptor {
    title: Option<String>,
    exec: Arc<dyn ModuleExec>,
}

impl ModuleDescriptor {
    pub fn new<C, S>(collector: C, scorer: S) -> Self
    where
        C: Collector,
        S: Scorer<Raw = C::Raw>,
    {
        Self {
            title: None,
            exec: Arc::new(Bound { collector, scorer }),
        }
    }

    /// Human-readable heading, e.g. "SEO & Link Health Audit".
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    /// Collect, then score. Cancellation of the context aborts collection.
    pub async fn execute(&self, ctx: &dyn PageContext) -> Result<ModuleOutput, ModuleError> {
        self.exec.execute(ctx).await
    }
}

impl std::fmt::Debug for ModuleDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModuleDescriptor")
            .field("title", &self.title)
            .finish_non_exhaustive()
    }
}
