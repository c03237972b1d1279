//! Randomized workloads over two tasks
//!
//! Each case runs a random mix of references, pins and unpins on a small
//! machine and checks the structural invariants after every step.

use std::collections::HashMap;

use nos_api::{AccessKind, FaultStatus, IoRequest, PageId};
use proptest::prelude::*;

use crate::common::{PAGES, PAGE_SIZE, assert_consistent, setup};

#[derive(Debug, Clone)]
enum Op {
    Refer { thread: u32, address: usize, write: bool },
    Pin { thread: u32, number: usize },
    Unpin { thread: u32, number: usize },
    Cursor(usize),
}

fn thread() -> impl Strategy<Value = u32> {
    prop_oneof![Just(1u32), Just(2u32), Just(3u32)]
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        6 => (thread(), 0..PAGES * PAGE_SIZE, any::<bool>())
            .prop_map(|(thread, address, write)| Op::Refer { thread, address, write }),
        1 => (thread(), 0..PAGES).prop_map(|(thread, number)| Op::Pin { thread, number }),
        1 => (thread(), 0..PAGES).prop_map(|(thread, number)| Op::Unpin { thread, number }),
        1 => (0..8usize).prop_map(Op::Cursor),
    ]
}

fn task_of(thread: u32) -> u32 {
    if thread == 3 { 2 } else { 1 }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn invariants_hold_under_random_workload(
        frames in 1usize..6,
        ops in prop::collection::vec(op(), 1..80),
    ) {
        let (_host, manager) = setup(frames);
        let mut pins: HashMap<PageId, u32> = HashMap::new();

        for op in ops {
            match op {
                Op::Refer { thread, address, write } => {
                    let access = if write { AccessKind::Write } else { AccessKind::Read };
                    let page = manager.refer(address, access, thread).unwrap();
                    prop_assert_eq!(page, PageId::new(task_of(thread), address / PAGE_SIZE));

                    let entry = manager.page(page).unwrap();
                    if entry.valid {
                        let frame = manager.frame(entry.frame.unwrap()).unwrap();
                        prop_assert!(frame.referenced);
                        if write {
                            prop_assert!(frame.dirty);
                        }
                    } else {
                        // only when every frame is pinned
                        prop_assert!(manager.frames().iter().all(|frame| frame.lock_count > 0));
                    }
                }
                Op::Pin { thread, number } => {
                    let page = PageId::new(task_of(thread), number);
                    if manager.pin(&IoRequest::new(thread, page)).unwrap() == FaultStatus::Success {
                        *pins.entry(page).or_default() += 1;
                    }
                }
                Op::Unpin { thread, number } => {
                    let page = PageId::new(task_of(thread), number);
                    if let Some(count) = pins.get_mut(&page).filter(|count| **count > 0) {
                        manager.unpin(page).unwrap();
                        *count -= 1;
                    }
                }
                Op::Cursor(hand) => manager.set_cursor(hand % frames),
            }

            assert_consistent(&manager, &[1, 2]);
            for (&page, &count) in &pins {
                if count > 0 {
                    let entry = manager.page(page).unwrap();
                    prop_assert!(entry.valid, "pinned page {} was evicted", page);
                    let frame = manager.frame(entry.frame.unwrap()).unwrap();
                    prop_assert_eq!(frame.lock_count, count);
                }
            }
            prop_assert!(manager.frames().iter().all(|frame| frame.reserved_by.is_none()));
        }
    }

    #[test]
    fn resident_set_never_exceeds_frames(
        frames in 1usize..5,
        pages in prop::collection::vec(0..PAGES, 1..60),
    ) {
        let (host, manager) = setup(frames);
        for number in pages {
            manager.refer(number * PAGE_SIZE, AccessKind::Write, 1).unwrap();
            let resident = (0..PAGES)
                .filter(|&number| manager.page(PageId::new(1, number)).unwrap().valid)
                .count();
            prop_assert!(resident <= frames);
            prop_assert!(manager.page(PageId::new(1, number)).unwrap().valid);
        }
        // every write-back names a page that was resident and dirty
        let outs = host.swap_outs().len() as u64;
        prop_assert_eq!(manager.stats().swap_outs, outs);
        prop_assert!(outs <= manager.stats().evictions);
    }
}
