#![forbid(unsafe_code)]

//! A cell whose result is mirrored into an editable work value.
//!
//! [`WorkValueCell<S, R>`] is a [`ValueCell`] with the [`WorkMirror`]
//! strategy, so every recomputation on the source or result path writes the
//! work value as well. The work path added here is the result path gate fed
//! from the owner's copy of the work value: an owner edits the work value
//! (through [`work_mut`](ValueCell::work_mut) or its own buffer) and then
//! calls [`apply_work_change`](ValueCell::apply_work_change) to publish it.
//!
//! Under [`Produce::Once`](crate::Produce::Once) `work == result` holds after
//! every update. Under [`Produce::PerSlot`](crate::Produce::PerSlot) the
//! producer runs once per slot and a non-deterministic producer can make them
//! diverge.

use std::convert::Infallible;

use super::apply::WorkMirror;
use super::value::ValueCell;
use crate::error::{CellError, infallible};
use crate::outcome::Outcome;

/// A [`ValueCell`] keeping a work value in lock-step with its result.
pub type WorkValueCell<S, R> = ValueCell<S, R, WorkMirror<R>>;

impl<S, R: Clone> ValueCell<S, R, WorkMirror<R>> {
    /// Create a cell whose work value starts as a copy of `result`.
    #[must_use]
    pub fn mirrored(result: R) -> Self {
        Self::with_strategy(result.clone(), WorkMirror::new(result))
    }

    #[must_use]
    pub fn work(&self) -> &R {
        self.apply.work()
    }

    /// Edit the work value in place. The result is untouched until the
    /// edited value is published through the work path.
    pub fn work_mut(&mut self) -> &mut R {
        self.apply.work_mut()
    }
}

impl<S, R> ValueCell<S, R, WorkMirror<R>>
where
    S: PartialEq,
    R: Clone + PartialEq,
{
    /// Store the copied work value into work and result if it differs from
    /// the last result snapshot.
    pub fn apply_work_change(&mut self, copy_work: impl FnMut() -> R) -> Outcome {
        self.apply_work_change_with(copy_work, |_, _| {})
    }

    pub fn apply_work_change_with(
        &mut self,
        mut copy_work: impl FnMut() -> R,
        on_processed: impl FnOnce(Option<&R>, &R),
    ) -> Outcome {
        infallible(self.gate_result("work", || Ok(copy_work()), on_processed))
    }

    /// Fallible work-path update.
    ///
    /// # Errors
    ///
    /// [`CellError::Snapshot`] if the first copy fails, [`CellError::Produce`]
    /// if a repeated copy under [`Produce::PerSlot`](crate::Produce::PerSlot)
    /// fails.
    pub fn try_apply_work_change<E>(
        &mut self,
        copy_work: impl FnMut() -> Result<R, E>,
        on_processed: impl FnOnce(Option<&R>, &R),
    ) -> Result<Outcome, CellError<E>> {
        self.gate_result("work", copy_work, on_processed)
    }

    pub async fn apply_work_change_async(&mut self, copy_work: impl AsyncFnMut() -> R) -> Outcome {
        self.apply_work_change_async_with(copy_work, async |_: Option<&R>, _: &R| {})
            .await
    }

    pub async fn apply_work_change_async_with(
        &mut self,
        mut copy_work: impl AsyncFnMut() -> R,
        on_processed: impl AsyncFnOnce(Option<&R>, &R),
    ) -> Outcome {
        infallible(
            self.gate_result_async(
                "work",
                async || Ok::<R, Infallible>(copy_work().await),
                on_processed,
            )
            .await,
        )
    }

    /// Fallible async work-path update.
    ///
    /// # Errors
    ///
    /// Same as [`try_apply_work_change`](Self::try_apply_work_change).
    pub async fn try_apply_work_change_async<E>(
        &mut self,
        copy_work: impl AsyncFnMut() -> Result<R, E>,
        on_processed: impl AsyncFnOnce(Option<&R>, &R),
    ) -> Result<Outcome, CellError<E>> {
        self.gate_result_async("work", copy_work, on_processed)
            .await
    }

    /// Unconditionally store `copy_work()` into work and result.
    pub fn set_work(&mut self, copy_work: impl FnMut() -> R) {
        self.set_result(copy_work);
    }
}
