#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use varcell::{CellConfig, Commit, Produce, WorkValueCell};

#[derive(Arbitrary, Debug)]
enum FuzzOp {
    Source(u8),
    Result(u8),
    Work(u8),
    FailingSource(u8),
    EditWork(u8),
    Invalidate,
}

fuzz_target!(|input: (bool, bool, Vec<FuzzOp>)| {
    let (before, per_slot, ops) = input;
    let commit = if before {
        Commit::BeforeProduce
    } else {
        Commit::AfterProduce
    };
    let produce = if per_slot {
        Produce::PerSlot
    } else {
        Produce::Once
    };
    let fail_at = if per_slot { 2 } else { 1 };
    let mut cell: WorkValueCell<u8, u16> = WorkValueCell::mirrored(0)
        .with_config(CellConfig::default().with_commit(commit).with_produce(produce));

    for op in ops.into_iter().take(512) {
        let version = cell.version();
        let mut edited = false;
        match op {
            FuzzOp::Source(v) => {
                cell.apply_source_change(|| v, |x| u16::from(*x) << 2);
            }
            FuzzOp::Result(v) => {
                cell.apply_result_change(|| u16::from(v));
            }
            FuzzOp::Work(v) => {
                cell.apply_work_change(|| u16::from(v));
            }
            FuzzOp::FailingSource(v) => {
                let (work, result) = (*cell.work(), *cell.result());
                let mut calls = 0;
                let outcome = cell.try_apply_source_change(
                    || Ok(v),
                    |x| {
                        calls += 1;
                        if calls == fail_at { Err(()) } else { Ok(u16::from(*x)) }
                    },
                    |_, _| {},
                );
                assert_eq!(cell.version(), version);
                if outcome.is_err() {
                    assert_eq!((*cell.work(), *cell.result()), (work, result));
                }
            }
            FuzzOp::EditWork(v) => {
                *cell.work_mut() = u16::from(v);
                edited = true;
            }
            FuzzOp::Invalidate => cell.invalidate(),
        }
        assert!(cell.version() - version <= 1);
        if !edited && cell.version() != version {
            assert_eq!(cell.work(), cell.result());
        }
    }
});
