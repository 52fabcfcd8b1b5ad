#![forbid(unsafe_code)]

//! Strategies deciding where a freshly produced value is stored.
//!
//! A cell never writes its result directly. Every recomputation asks its
//! [`Apply`] strategy for the list of [`Slot`]s to fill, obtains a value for
//! each (once, or once per slot, depending on
//! [`Produce`](crate::config::Produce)), and hands each value back to the
//! strategy to store. Values are stored only after every producer call has
//! succeeded, so a failure never leaves some slots written and others not.

use crate::config::Produce;

/// A field a produced value is written into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Slot {
    /// The intermediate work value of a [`WorkValueCell`](crate::WorkValueCell).
    Work,
    /// The cell's result.
    Result,
}

/// Stores produced values into a cell's slots.
///
/// `result` is the cell's own result field; any other slot lives inside the
/// strategy.
pub trait Apply<R> {
    /// Slots written on every recomputation, in write order. Must not be
    /// empty.
    fn slots(&self) -> &'static [Slot];

    /// Store `value` into `slot`.
    fn store(&mut self, slot: Slot, result: &mut R, value: R);
}

/// Writes the result and nothing else.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResultOnly;

impl<R> Apply<R> for ResultOnly {
    fn slots(&self) -> &'static [Slot] {
        &[Slot::Result]
    }

    fn store(&mut self, slot: Slot, result: &mut R, value: R) {
        debug_assert_eq!(slot, Slot::Result, "ResultOnly has a single slot");
        *result = value;
    }
}

/// Keeps a work value in lock-step with the result.
///
/// Every recomputation writes [`Slot::Work`] first and [`Slot::Result`]
/// second.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorkMirror<R> {
    work: R,
}

impl<R> WorkMirror<R> {
    #[must_use]
    pub fn new(work: R) -> Self {
        Self { work }
    }

    #[must_use]
    pub fn work(&self) -> &R {
        &self.work
    }

    pub fn work_mut(&mut self) -> &mut R {
        &mut self.work
    }
}

impl<R> Apply<R> for WorkMirror<R> {
    fn slots(&self) -> &'static [Slot] {
        &[Slot::Work, Slot::Result]
    }

    fn store(&mut self, slot: Slot, result: &mut R, value: R) {
        match slot {
            Slot::Work => self.work = value,
            Slot::Result => *result = value,
        }
    }
}

// ---------------------------------------------------------------------------
// Store helpers shared by the update paths
// ---------------------------------------------------------------------------

/// Store one value into every slot, cloning for all but the last.
pub(crate) fn store_all<R: Clone, A: Apply<R>>(apply: &mut A, result: &mut R, value: R) {
    let slots = apply.slots();
    debug_assert!(!slots.is_empty(), "Apply::slots must not be empty");
    if let Some((last, rest)) = slots.split_last() {
        for &slot in rest {
            apply.store(slot, result, value.clone());
        }
        apply.store(*last, result, value);
    }
}

/// Store `values[i]` into the `i`-th slot.
fn store_each<R, A: Apply<R>>(apply: &mut A, result: &mut R, values: Vec<R>) {
    let slots = apply.slots();
    debug_assert!(!slots.is_empty(), "Apply::slots must not be empty");
    debug_assert_eq!(slots.len(), values.len());
    for (&slot, value) in slots.iter().zip(values) {
        apply.store(slot, result, value);
    }
}

/// Fill every slot from `convert(source)`.
///
/// Under [`Produce::PerSlot`] every value is produced before the first store,
/// so a failing call leaves all slots untouched.
pub(crate) fn derive_into<S, R, E, A, F>(
    apply: &mut A,
    result: &mut R,
    produce: Produce,
    source: &S,
    mut convert: F,
) -> Result<(), E>
where
    R: Clone,
    A: Apply<R>,
    F: FnMut(&S) -> Result<R, E>,
{
    match produce {
        Produce::Once => store_all(apply, result, convert(source)?),
        Produce::PerSlot => {
            let values = apply
                .slots()
                .iter()
                .map(|_| convert(source))
                .collect::<Result<Vec<_>, E>>()?;
            store_each(apply, result, values);
        }
    }
    Ok(())
}

/// Async form of [`derive_into`]. Suspends only inside `convert`; dropping
/// the future before it completes stores nothing.
pub(crate) async fn derive_into_async<S, R, E, A, F>(
    apply: &mut A,
    result: &mut R,
    produce: Produce,
    source: &S,
    mut convert: F,
) -> Result<(), E>
where
    R: Clone,
    A: Apply<R>,
    F: AsyncFnMut(&S) -> Result<R, E>,
{
    match produce {
        Produce::Once => {
            let value = convert(source).await?;
            store_all(apply, result, value);
        }
        Produce::PerSlot => {
            let slots = apply.slots();
            let mut values = Vec::with_capacity(slots.len());
            for _ in slots {
                values.push(convert(source).await?);
            }
            store_each(apply, result, values);
        }
    }
    Ok(())
}

/// Fill every slot from an externally copied value.
///
/// Under [`Produce::Once`] the already taken `snapshot` is reused; under
/// [`Produce::PerSlot`] `copy` is called again for each slot, and the slots
/// are written only once every copy succeeded.
pub(crate) fn recopy_into<R, E, A, F>(
    apply: &mut A,
    result: &mut R,
    produce: Produce,
    snapshot: &R,
    mut copy: F,
) -> Result<(), E>
where
    R: Clone,
    A: Apply<R>,
    F: FnMut() -> Result<R, E>,
{
    match produce {
        Produce::Once => store_all(apply, result, snapshot.clone()),
        Produce::PerSlot => {
            let values = apply
                .slots()
                .iter()
                .map(|_| copy())
                .collect::<Result<Vec<_>, E>>()?;
            store_each(apply, result, values);
        }
    }
    Ok(())
}

/// Async form of [`recopy_into`]. Suspends only inside `copy`.
pub(crate) async fn recopy_into_async<R, E, A, F>(
    apply: &mut A,
    result: &mut R,
    produce: Produce,
    snapshot: &R,
    mut copy: F,
) -> Result<(), E>
where
    R: Clone,
    A: Apply<R>,
    F: AsyncFnMut() -> Result<R, E>,
{
    match produce {
        Produce::Once => store_all(apply, result, snapshot.clone()),
        Produce::PerSlot => {
            let slots = apply.slots();
            let mut values = Vec::with_capacity(slots.len());
            for _ in slots {
                values.push(copy().await?);
            }
            store_each(apply, result, values);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::convert::Infallible;

    /// Records every stored value alongside the result.
    #[derive(Default)]
    struct History {
        seen: Vec<(Slot, i32)>,
    }

    impl Apply<i32> for History {
        fn slots(&self) -> &'static [Slot] {
            &[Slot::Result]
        }

        fn store(&mut self, slot: Slot, result: &mut i32, value: i32) {
            self.seen.push((slot, value));
            *result = value;
        }
    }

    #[test]
    fn result_only_writes_result() {
        let mut result = 0;
        store_all(&mut ResultOnly, &mut result, 7);
        assert_eq!(result, 7);
    }

    #[test]
    fn work_mirror_writes_both_slots() {
        let mut mirror = WorkMirror::new(0);
        let mut result = 0;
        store_all(&mut mirror, &mut result, 9);
        assert_eq!(*mirror.work(), 9);
        assert_eq!(result, 9);
    }

    #[test]
    fn custom_strategy_sees_each_store() {
        let mut history = History::default();
        let mut result = 0;
        derive_into(&mut history, &mut result, Produce::Once, &2, |v| {
            Ok::<_, Infallible>(v * 10)
        })
        .unwrap();
        assert_eq!(result, 20);
        assert_eq!(history.seen, vec![(Slot::Result, 20)]);
    }

    #[test]
    fn once_calls_converter_once_for_two_slots() {
        let mut calls = 0;
        let mut mirror = WorkMirror::new(0);
        let mut result = 0;
        derive_into(&mut mirror, &mut result, Produce::Once, &3, |v| {
            calls += 1;
            Ok::<_, Infallible>(v + calls)
        })
        .unwrap();
        assert_eq!(calls, 1);
        assert_eq!(*mirror.work(), 4);
        assert_eq!(result, 4);
    }

    #[test]
    fn per_slot_calls_converter_per_slot() {
        let mut calls = 0;
        let mut mirror = WorkMirror::new(0);
        let mut result = 0;
        derive_into(&mut mirror, &mut result, Produce::PerSlot, &3, |v| {
            calls += 1;
            Ok::<_, Infallible>(v + calls)
        })
        .unwrap();
        assert_eq!(calls, 2);
        // Work is written first.
        assert_eq!(*mirror.work(), 4);
        assert_eq!(result, 5);
    }

    #[test]
    fn per_slot_failure_stores_nothing() {
        let mut calls = 0;
        let mut mirror = WorkMirror::new(0);
        let mut result = 0;
        let err = derive_into(&mut mirror, &mut result, Produce::PerSlot, &3, |v| {
            calls += 1;
            if calls == 2 { Err("second call") } else { Ok(*v) }
        });
        assert_eq!(err, Err("second call"));
        assert_eq!(calls, 2);
        assert_eq!((*mirror.work(), result), (0, 0));
    }

    #[test]
    fn per_slot_recopy_failure_stores_nothing() {
        let mut copies = 0;
        let mut mirror = WorkMirror::new(1);
        let mut result = 1;
        let err = recopy_into(&mut mirror, &mut result, Produce::PerSlot, &5, || {
            copies += 1;
            if copies == 2 { Err("second copy") } else { Ok(copies) }
        });
        assert_eq!(err, Err("second copy"));
        assert_eq!((*mirror.work(), result), (1, 1));
    }

    #[test]
    #[should_panic(expected = "must not be empty")]
    #[cfg(debug_assertions)]
    fn empty_slot_list_is_rejected() {
        struct Nowhere;
        impl Apply<i32> for Nowhere {
            fn slots(&self) -> &'static [Slot] {
                &[]
            }
            fn store(&mut self, _slot: Slot, _result: &mut i32, _value: i32) {}
        }
        let mut result = 0;
        store_all(&mut Nowhere, &mut result, 1);
    }

    #[test]
    fn recopy_once_reuses_snapshot() {
        let mut calls = 0;
        let mut mirror = WorkMirror::new(0);
        let mut result = 0;
        recopy_into(&mut mirror, &mut result, Produce::Once, &5, || {
            calls += 1;
            Ok::<_, Infallible>(99)
        })
        .unwrap();
        assert_eq!(calls, 0);
        assert_eq!((*mirror.work(), result), (5, 5));
    }

    #[test]
    fn recopy_per_slot_copies_again() {
        let mut calls = 0;
        let mut mirror = WorkMirror::new(0);
        let mut result = 0;
        recopy_into(&mut mirror, &mut result, Produce::PerSlot, &5, || {
            calls += 1;
            Ok::<_, Infallible>(calls)
        })
        .unwrap();
        assert_eq!(calls, 2);
        assert_eq!((*mirror.work(), result), (1, 2));
    }

    #[test]
    fn async_derive_matches_sync() {
        let mut mirror = WorkMirror::new(0);
        let mut result = 0;
        pollster::block_on(derive_into_async(
            &mut mirror,
            &mut result,
            Produce::Once,
            &4,
            async |v: &i32| Ok::<_, Infallible>(v * v),
        ))
        .unwrap();
        assert_eq!((*mirror.work(), result), (16, 16));
    }
}
