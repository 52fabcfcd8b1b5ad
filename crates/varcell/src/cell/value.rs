#![forbid(unsafe_code)]

//! The base change-detecting cell.
//!
//! # Design
//!
//! [`ValueCell<S, R, A>`] keeps the last snapshot of an externally owned
//! source and of an externally produced result. Each update operation takes a
//! fresh snapshot through a caller-supplied accessor, compares it with the
//! stored one, and only on inequality runs the producer and stores the value
//! through the cell's [`Apply`] strategy.
//!
//! Two update paths exist:
//!
//! - **source path** (`apply_source_change*`): snapshot `S`, derive `R` with a
//!   converter.
//! - **result path** (`apply_result_change*`): snapshot `R`, store it as is.
//!
//! Each path comes in four shapes: plain, `_with` a callback, fallible
//! (`try_`), and `async`.
//!
//! # Invariants
//!
//! 1. The converter is never called when the snapshot equals the stored one.
//! 2. `on_processed` runs exactly once per call, after every slot is written.
//! 3. `version` increments by exactly 1 per recomputation.
//! 4. `None` snapshots mean "never observed"; the first update always counts
//!    as a change.
//!
//! # Failure Modes
//!
//! - **Producer fails** (`try_` forms): under [`Commit::AfterProduce`] the
//!   cell is unchanged and the next update retries. Under
//!   [`Commit::BeforeProduce`] the snapshot stays committed while the result
//!   is stale; the error reports `committed: true`.
//! - **Async update dropped mid-flight**: same split as above. A drop while
//!   the callback is pending leaves a fully updated cell.
//! - **Producer panics**: the panic propagates; the cell is in the same state
//!   as after a failure at that point.

use std::convert::Infallible;

use super::apply::{self, Apply, ResultOnly};
use crate::config::{CellConfig, Commit};
use crate::error::{CellError, infallible};
use crate::logging::{log_debug, log_trace, log_warn};
use crate::outcome::Outcome;

/// A value cell with change detection and memoized derivation.
///
/// `S` is the source type, `R` the result type and `A` the strategy that
/// stores produced values. The cell is owned by exactly one component; every
/// mutation takes `&mut self`.
#[derive(Debug, Clone)]
pub struct ValueCell<S, R, A = ResultOnly> {
    /// Owner-side source value. Never change-detected by itself.
    source: Option<S>,
    /// Snapshot from the last source-path change.
    last_source: Option<S>,
    result: R,
    /// Snapshot from the last result-path (or work-path) change.
    last_result: Option<R>,
    pub(super) apply: A,
    config: CellConfig,
    version: u64,
}

impl<S, R> ValueCell<S, R> {
    /// Create a cell that derives only a result.
    #[must_use]
    pub fn new(result: R) -> Self {
        Self::with_strategy(result, ResultOnly)
    }
}

impl<S, R, A> ValueCell<S, R, A> {
    /// Create a cell storing produced values through `apply`.
    #[must_use]
    pub fn with_strategy(result: R, apply: A) -> Self
    where
        A: Apply<R>,
    {
        Self {
            source: None,
            last_source: None,
            result,
            last_result: None,
            apply,
            config: CellConfig::default(),
            version: 0,
        }
    }

    /// Replace the cell's configuration.
    #[must_use]
    pub fn with_config(mut self, config: CellConfig) -> Self {
        self.config = config;
        self
    }

    #[must_use]
    pub fn config(&self) -> &CellConfig {
        &self.config
    }

    /// The owner-side source value, if one was set.
    #[must_use]
    pub fn source(&self) -> Option<&S> {
        self.source.as_ref()
    }

    /// Store a source value. This does not trigger change detection; feed a
    /// copy of it through [`apply_source_change`](Self::apply_source_change).
    pub fn set_source(&mut self, source: S) {
        self.source = Some(source);
    }

    pub fn take_source(&mut self) -> Option<S> {
        self.source.take()
    }

    /// The snapshot observed by the last source-path change.
    #[must_use]
    pub fn last_source(&self) -> Option<&S> {
        self.last_source.as_ref()
    }

    #[must_use]
    pub fn result(&self) -> &R {
        &self.result
    }

    /// The snapshot observed by the last result-path or work-path change.
    #[must_use]
    pub fn last_result(&self) -> Option<&R> {
        self.last_result.as_ref()
    }

    #[must_use]
    pub fn strategy(&self) -> &A {
        &self.apply
    }

    pub fn strategy_mut(&mut self) -> &mut A {
        &mut self.apply
    }

    /// Current version number. Increments by 1 on each recomputation.
    #[must_use]
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Forget both snapshots. The next update on either path recomputes.
    pub fn invalidate(&mut self) {
        self.last_source = None;
        self.last_result = None;
    }
}

impl<S, R, A> ValueCell<S, R, A>
where
    S: PartialEq,
    R: Clone + PartialEq,
    A: Apply<R>,
{
    // -----------------------------------------------------------------------
    // Source path
    // -----------------------------------------------------------------------

    /// Recompute the result if the copied source differs from the last one.
    pub fn apply_source_change(
        &mut self,
        copy_source: impl FnOnce() -> S,
        convert: impl FnMut(&S) -> R,
    ) -> Outcome {
        self.apply_source_change_with(copy_source, convert, |_, _| {})
    }

    /// Like [`apply_source_change`](Self::apply_source_change), then call
    /// `on_processed(old, new)` on both the changed and unchanged path.
    pub fn apply_source_change_with(
        &mut self,
        copy_source: impl FnOnce() -> S,
        mut convert: impl FnMut(&S) -> R,
        on_processed: impl FnOnce(Option<&S>, &S),
    ) -> Outcome {
        infallible(self.try_apply_source_change(
            || Ok(copy_source()),
            |source| Ok(convert(source)),
            on_processed,
        ))
    }

    /// Fallible source-path update.
    ///
    /// # Errors
    ///
    /// [`CellError::Snapshot`] if `copy_source` fails, [`CellError::Produce`]
    /// if `convert` fails. The callback is not called on error.
    pub fn try_apply_source_change<E>(
        &mut self,
        copy_source: impl FnOnce() -> Result<S, E>,
        convert: impl FnMut(&S) -> Result<R, E>,
        on_processed: impl FnOnce(Option<&S>, &S),
    ) -> Result<Outcome, CellError<E>> {
        let new = copy_source().map_err(CellError::Snapshot)?;
        if self.last_source.as_ref() == Some(&new) {
            log_trace!(
                message = "varcell.unchanged",
                path = "source",
                label = self.config.label(),
                version = self.version
            );
            on_processed(self.last_source.as_ref(), &new);
            return Ok(Outcome::Unchanged);
        }

        let produce = self.config.produce;
        let (old, new) = match self.config.commit {
            Commit::BeforeProduce => {
                let old = self.last_source.take();
                let new = &*self.last_source.insert(new);
                if let Err(source) =
                    apply::derive_into(&mut self.apply, &mut self.result, produce, new, convert)
                {
                    return Err(self.produce_failed("source", true, source));
                }
                (old, new)
            }
            Commit::AfterProduce => {
                if let Err(source) =
                    apply::derive_into(&mut self.apply, &mut self.result, produce, &new, convert)
                {
                    return Err(self.produce_failed("source", false, source));
                }
                let old = self.last_source.take();
                (old, &*self.last_source.insert(new))
            }
        };

        self.version += 1;
        log_debug!(
            message = "varcell.changed",
            path = "source",
            label = self.config.label(),
            version = self.version
        );
        on_processed(old.as_ref(), new);
        Ok(Outcome::Changed)
    }

    /// Async source-path update without a callback.
    pub async fn apply_source_change_async(
        &mut self,
        copy_source: impl AsyncFnOnce() -> S,
        convert: impl AsyncFnMut(&S) -> R,
    ) -> Outcome {
        self.apply_source_change_async_with(copy_source, convert, async |_: Option<&S>, _: &S| {})
            .await
    }

    /// Async source-path update. Suspends at `copy_source`, at `convert` and
    /// at `on_processed`; the result is stored before `on_processed` starts.
    pub async fn apply_source_change_async_with(
        &mut self,
        copy_source: impl AsyncFnOnce() -> S,
        mut convert: impl AsyncFnMut(&S) -> R,
        on_processed: impl AsyncFnOnce(Option<&S>, &S),
    ) -> Outcome {
        infallible(
            self.try_apply_source_change_async(
                async move || Ok::<S, Infallible>(copy_source().await),
                async |source: &S| Ok::<R, Infallible>(convert(source).await),
                on_processed,
            )
            .await,
        )
    }

    /// Fallible async source-path update.
    ///
    /// # Errors
    ///
    /// Same as [`try_apply_source_change`](Self::try_apply_source_change).
    pub async fn try_apply_source_change_async<E>(
        &mut self,
        copy_source: impl AsyncFnOnce() -> Result<S, E>,
        convert: impl AsyncFnMut(&S) -> Result<R, E>,
        on_processed: impl AsyncFnOnce(Option<&S>, &S),
    ) -> Result<Outcome, CellError<E>> {
        let new = copy_source().await.map_err(CellError::Snapshot)?;
        if self.last_source.as_ref() == Some(&new) {
            log_trace!(
                message = "varcell.unchanged",
                path = "source",
                label = self.config.label(),
                version = self.version
            );
            on_processed(self.last_source.as_ref(), &new).await;
            return Ok(Outcome::Unchanged);
        }

        let produce = self.config.produce;
        let (old, new) = match self.config.commit {
            Commit::BeforeProduce => {
                let old = self.last_source.take();
                let new = &*self.last_source.insert(new);
                if let Err(source) = apply::derive_into_async(
                    &mut self.apply,
                    &mut self.result,
                    produce,
                    new,
                    convert,
                )
                .await
                {
                    return Err(self.produce_failed("source", true, source));
                }
                (old, new)
            }
            Commit::AfterProduce => {
                if let Err(source) = apply::derive_into_async(
                    &mut self.apply,
                    &mut self.result,
                    produce,
                    &new,
                    convert,
                )
                .await
                {
                    return Err(self.produce_failed("source", false, source));
                }
                let old = self.last_source.take();
                (old, &*self.last_source.insert(new))
            }
        };

        self.version += 1;
        log_debug!(
            message = "varcell.changed",
            path = "source",
            label = self.config.label(),
            version = self.version
        );
        on_processed(old.as_ref(), new).await;
        Ok(Outcome::Changed)
    }

    /// Unconditionally derive and store a result from `source`.
    ///
    /// Snapshots are left alone, so a later source-path update with the same
    /// value as the last snapshot still counts as unchanged.
    pub fn set_result_from_source(&mut self, source: &S, mut convert: impl FnMut(&S) -> R) {
        let Ok(()) = apply::derive_into(
            &mut self.apply,
            &mut self.result,
            self.config.produce,
            source,
            |source| Ok::<R, Infallible>(convert(source)),
        );
        self.version += 1;
    }

    // -----------------------------------------------------------------------
    // Result path
    // -----------------------------------------------------------------------

    /// Store the copied result if it differs from the last result snapshot.
    pub fn apply_result_change(&mut self, copy_result: impl FnMut() -> R) -> Outcome {
        self.apply_result_change_with(copy_result, |_, _| {})
    }

    pub fn apply_result_change_with(
        &mut self,
        mut copy_result: impl FnMut() -> R,
        on_processed: impl FnOnce(Option<&R>, &R),
    ) -> Outcome {
        infallible(self.gate_result("result", || Ok(copy_result()), on_processed))
    }

    /// Fallible result-path update.
    ///
    /// # Errors
    ///
    /// [`CellError::Snapshot`] if the first copy fails, [`CellError::Produce`]
    /// if a repeated copy under [`Produce::PerSlot`](crate::Produce::PerSlot)
    /// fails.
    pub fn try_apply_result_change<E>(
        &mut self,
        copy_result: impl FnMut() -> Result<R, E>,
        on_processed: impl FnOnce(Option<&R>, &R),
    ) -> Result<Outcome, CellError<E>> {
        self.gate_result("result", copy_result, on_processed)
    }

    pub async fn apply_result_change_async(
        &mut self,
        copy_result: impl AsyncFnMut() -> R,
    ) -> Outcome {
        self.apply_result_change_async_with(copy_result, async |_: Option<&R>, _: &R| {})
            .await
    }

    pub async fn apply_result_change_async_with(
        &mut self,
        mut copy_result: impl AsyncFnMut() -> R,
        on_processed: impl AsyncFnOnce(Option<&R>, &R),
    ) -> Outcome {
        infallible(
            self.gate_result_async(
                "result",
                async || Ok::<R, Infallible>(copy_result().await),
                on_processed,
            )
            .await,
        )
    }

    /// Fallible async result-path update.
    ///
    /// # Errors
    ///
    /// Same as [`try_apply_result_change`](Self::try_apply_result_change).
    pub async fn try_apply_result_change_async<E>(
        &mut self,
        copy_result: impl AsyncFnMut() -> Result<R, E>,
        on_processed: impl AsyncFnOnce(Option<&R>, &R),
    ) -> Result<Outcome, CellError<E>> {
        self.gate_result_async("result", copy_result, on_processed)
            .await
    }

    /// Unconditionally store `copy_result()` into every slot.
    pub fn set_result(&mut self, mut copy_result: impl FnMut() -> R) {
        let Ok(()) = apply::derive_into(
            &mut self.apply,
            &mut self.result,
            self.config.produce,
            &(),
            |_| Ok::<R, Infallible>(copy_result()),
        );
        self.version += 1;
    }

    /// Equality gate shared by the result and work paths.
    pub(super) fn gate_result<E>(
        &mut self,
        path: &'static str,
        mut copy: impl FnMut() -> Result<R, E>,
        on_processed: impl FnOnce(Option<&R>, &R),
    ) -> Result<Outcome, CellError<E>> {
        let new = copy().map_err(CellError::Snapshot)?;
        if self.last_result.as_ref() == Some(&new) {
            log_trace!(
                message = "varcell.unchanged",
                path,
                label = self.config.label(),
                version = self.version
            );
            on_processed(self.last_result.as_ref(), &new);
            return Ok(Outcome::Unchanged);
        }

        let produce = self.config.produce;
        let (old, new) = match self.config.commit {
            Commit::BeforeProduce => {
                let old = self.last_result.take();
                let new = &*self.last_result.insert(new);
                if let Err(source) =
                    apply::recopy_into(&mut self.apply, &mut self.result, produce, new, copy)
                {
                    return Err(self.produce_failed(path, true, source));
                }
                (old, new)
            }
            Commit::AfterProduce => {
                if let Err(source) =
                    apply::recopy_into(&mut self.apply, &mut self.result, produce, &new, copy)
                {
                    return Err(self.produce_failed(path, false, source));
                }
                let old = self.last_result.take();
                (old, &*self.last_result.insert(new))
            }
        };

        self.version += 1;
        log_debug!(
            message = "varcell.changed",
            path,
            label = self.config.label(),
            version = self.version
        );
        on_processed(old.as_ref(), new);
        Ok(Outcome::Changed)
    }

    pub(super) async fn gate_result_async<E>(
        &mut self,
        path: &'static str,
        mut copy: impl AsyncFnMut() -> Result<R, E>,
        on_processed: impl AsyncFnOnce(Option<&R>, &R),
    ) -> Result<Outcome, CellError<E>> {
        let new = copy().await.map_err(CellError::Snapshot)?;
        if self.last_result.as_ref() == Some(&new) {
            log_trace!(
                message = "varcell.unchanged",
                path,
                label = self.config.label(),
                version = self.version
            );
            on_processed(self.last_result.as_ref(), &new).await;
            return Ok(Outcome::Unchanged);
        }

        let produce = self.config.produce;
        let (old, new) = match self.config.commit {
            Commit::BeforeProduce => {
                let old = self.last_result.take();
                let new = &*self.last_result.insert(new);
                if let Err(source) =
                    apply::recopy_into_async(&mut self.apply, &mut self.result, produce, new, copy)
                        .await
                {
                    return Err(self.produce_failed(path, true, source));
                }
                (old, new)
            }
            Commit::AfterProduce => {
                if let Err(source) =
                    apply::recopy_into_async(&mut self.apply, &mut self.result, produce, &new, copy)
                        .await
                {
                    return Err(self.produce_failed(path, false, source));
                }
                let old = self.last_result.take();
                (old, &*self.last_result.insert(new))
            }
        };

        self.version += 1;
        log_debug!(
            message = "varcell.changed",
            path,
            label = self.config.label(),
            version = self.version
        );
        on_processed(old.as_ref(), new).await;
        Ok(Outcome::Changed)
    }

    #[cfg_attr(not(feature = "tracing"), allow(unused_variables))]
    fn produce_failed<E>(&self, path: &'static str, committed: bool, source: E) -> CellError<E> {
        log_warn!(
            message = "varcell.produce.failed",
            path,
            label = self.config.label(),
            committed
        );
        CellError::Produce { committed, source }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
