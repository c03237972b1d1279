//! Fault resolver tests

use std::sync::Arc;

use mockall::Sequence;
use mockall::predicate::eq;
use nos_api::{AccessKind, Error, Event, FaultStatus, IoRequest, PageId};
use nos_demand_paging::MemoryManager;

use crate::common::{Call, MockSwap, SimHost, Trigger, addr, assert_consistent, config, page, setup};

#[test]
fn spurious_fault_fails_and_dispatches() {
    let (host, manager) = setup(4);
    manager.refer(addr(1), AccessKind::Read, 1).unwrap();
    host.clear_calls();
    let before = manager.frames();

    let status = manager.handle_page_fault(2, AccessKind::Write, page(1)).unwrap();

    assert_eq!(status, FaultStatus::Failure);
    assert_eq!(host.calls(), [Call::Dispatch]);
    assert_eq!(manager.frames(), before);
    assert_eq!(manager.stats().spurious_faults, 1);
}

#[test]
fn unknown_page_or_thread_is_an_error() {
    let (_host, manager) = setup(4);
    assert!(matches!(
        manager.handle_page_fault(1, AccessKind::Read, PageId::new(5, 0)),
        Err(Error::NotFound(_))
    ));
    assert!(matches!(
        manager.handle_page_fault(1, AccessKind::Read, page(99)),
        Err(Error::NotFound(_))
    ));
    assert!(matches!(
        manager.handle_page_fault(42, AccessKind::Read, page(0)),
        Err(Error::NotFound(_))
    ));
}

#[test]
fn lock_access_loads_clean_frame() {
    let (_host, manager) = setup(4);
    let status = manager.handle_page_fault(1, AccessKind::Lock, page(8)).unwrap();
    assert_eq!(status, FaultStatus::Success);
    let frame = manager.frame(0).unwrap();
    assert_eq!(frame.page, Some(page(8)));
    assert!(!frame.dirty);
    assert!(frame.referenced);
    assert_eq!(frame.lock_count, 0);
}

#[test]
fn validating_thread_is_set_for_the_whole_transfer() {
    let (host, manager) = setup(4);
    let parked = manager.clone();
    let loading = manager.clone();
    host.on(Trigger::Fault(1), move |_| {
        assert_eq!(parked.page(page(2)).unwrap().validating_thread, Some(1));
    });
    host.on(Trigger::SwapIn(1), move |_| {
        let entry = loading.page(page(2)).unwrap();
        assert_eq!(entry.validating_thread, Some(1));
        assert_eq!(entry.frame, Some(0));
        assert!(!entry.valid);
        assert_eq!(loading.frame(0).unwrap().reserved_by, Some(1));
    });

    assert_eq!(
        manager.handle_page_fault(1, AccessKind::Read, page(2)).unwrap(),
        FaultStatus::Success
    );
    assert_eq!(host.pending_hooks(), 0);
    assert_eq!(manager.page(page(2)).unwrap().validating_thread, None);
    assert_eq!(manager.frame(0).unwrap().reserved_by, None);
}

#[test]
fn killed_while_parked_on_fault_event_touches_no_frame() {
    let (host, manager) = setup(4);
    host.on(Trigger::Fault(1), |host| host.kill(1));

    let status = manager.handle_page_fault(1, AccessKind::Read, page(0)).unwrap();

    assert_eq!(status, FaultStatus::Failure);
    assert!(host.swap_ins().is_empty());
    assert_eq!(manager.free_frame_count(), 4);
    let entry = manager.page(page(0)).unwrap();
    assert_eq!(entry.validating_thread, None);
    assert_eq!(entry.frame, None);
}

#[test]
fn killed_during_swap_out_keeps_victim_mapped() {
    let (host, manager) = setup(2);
    manager.refer(addr(0), AccessKind::Write, 1).unwrap();
    manager.refer(addr(1), AccessKind::Write, 1).unwrap();
    host.on(Trigger::SwapOut(2), |host| host.kill(2));

    let status = manager.handle_page_fault(2, AccessKind::Read, page(5)).unwrap();

    assert_eq!(status, FaultStatus::Failure);
    assert!(host.swap_ins().iter().all(|(loaded, _)| *loaded != page(5)));
    let victim = manager.frame(0).unwrap();
    assert_eq!(victim.page, Some(page(0)));
    assert!(victim.dirty);
    assert_eq!(victim.reserved_by, None);
    assert!(manager.page(page(0)).unwrap().valid);

    let entry = manager.page(page(5)).unwrap();
    assert!(!entry.valid);
    assert_eq!(entry.frame, None);
    assert_eq!(entry.validating_thread, None);

    assert_eq!(
        manager.handle_page_fault(1, AccessKind::Read, page(5)).unwrap(),
        FaultStatus::Success
    );
    assert_consistent(&manager, &[1, 2]);
}

#[test]
fn killed_fault_gives_its_frame_back_to_the_task() {
    let (host, manager) = setup(2);
    host.on(Trigger::SwapIn(1), |host| host.kill(1));
    assert_eq!(
        manager.handle_page_fault(1, AccessKind::Read, page(0)).unwrap(),
        FaultStatus::Failure
    );
    assert_eq!(manager.free_frame_count(), 2);

    // a sibling thread of the same task can still use both frames
    assert_eq!(manager.pin(&IoRequest::new(2, page(1))).unwrap(), FaultStatus::Success);
    assert_eq!(
        manager.handle_page_fault(2, AccessKind::Read, page(2)).unwrap(),
        FaultStatus::Success
    );

    assert_eq!(manager.frame(0).unwrap().page, Some(page(1)));
    assert_eq!(manager.frame(0).unwrap().lock_count, 1);
    assert_eq!(manager.frame(1).unwrap().page, Some(page(2)));
    assert!(manager.frames().iter().all(|frame| frame.reserved_by.is_none()));
    assert_eq!(manager.stats().not_enough_memory, 0);
    assert_consistent(&manager, &[1, 2]);
}

#[test]
fn second_fault_on_page_in_flight_waits_for_the_first() {
    let (host, manager) = setup(4);
    let pager = manager.clone();
    host.on(Trigger::Fault(1), move |host| {
        let status = pager.handle_page_fault(2, AccessKind::Read, page(0)).unwrap();
        // the first transfer has not started yet
        assert_eq!(status, FaultStatus::Failure);
        assert!(host.calls().contains(&Call::Suspend(2, Event::Page(page(0)))));
        assert!(pager.page_waiters(page(0)).is_empty());
        assert_eq!(pager.page(page(0)).unwrap().validating_thread, Some(1));
        assert_eq!(pager.free_frame_count(), 4);
    });

    let status = manager.handle_page_fault(1, AccessKind::Read, page(0)).unwrap();

    assert_eq!(status, FaultStatus::Success);
    assert_eq!(host.pending_hooks(), 0);
    assert_eq!(host.swap_ins(), [(page(0), 0)]);
    let mapping: Vec<_> = manager
        .frames()
        .into_iter()
        .filter(|frame| frame.page == Some(page(0)))
        .map(|frame| frame.id)
        .collect();
    assert_eq!(mapping, [0]);
    assert_eq!(manager.page(page(0)).unwrap().frame, Some(0));
    assert_eq!(manager.stats().faults, 1);
    assert_consistent(&manager, &[1, 2]);
}

#[test]
fn nested_fault_by_the_validating_thread_fails() {
    let (host, manager) = setup(4);
    let pager = manager.clone();
    host.on(Trigger::SwapIn(1), move |_| {
        assert_eq!(
            pager.handle_page_fault(1, AccessKind::Write, page(7)).unwrap(),
            FaultStatus::Failure
        );
        assert_eq!(pager.page(page(7)).unwrap().validating_thread, Some(1));
    });

    assert_eq!(
        manager.handle_page_fault(1, AccessKind::Read, page(7)).unwrap(),
        FaultStatus::Success
    );
    assert_eq!(host.swap_ins().len(), 1);
    assert!(!manager.frame(0).unwrap().dirty);
    assert_consistent(&manager, &[1, 2]);
}

#[test]
fn waiter_outlives_killed_validator() {
    let (host, manager) = setup(4);
    let pager = manager.clone();
    // thread 1 dies while thread 2 is parked on the page
    host.on(Trigger::SwapIn(1), move |host| {
        host.on(Trigger::PageWait(2), |host| host.kill(1));
        assert_eq!(pager.refer(addr(3), AccessKind::Read, 2).unwrap(), page(3));
    });

    let status = manager.handle_page_fault(1, AccessKind::Read, page(3)).unwrap();

    assert_eq!(status, FaultStatus::Failure);
    let calls = host.calls();
    assert!(calls.contains(&Call::Suspend(2, Event::Page(page(3)))));
    assert!(calls.contains(&Call::Resume(1, Event::Fault(0))));
    assert!(manager.page_waiters(page(3)).is_empty());
    let entry = manager.page(page(3)).unwrap();
    assert!(!entry.valid);
    assert_eq!(entry.validating_thread, None);

    // the page can be faulted in again by the survivor
    manager.refer(addr(3), AccessKind::Read, 2).unwrap();
    assert!(manager.page(page(3)).unwrap().valid);
}

#[test]
fn every_fault_outcome_dispatches() {
    let (host, manager) = setup(1);
    manager.handle_page_fault(1, AccessKind::Read, page(0)).unwrap();
    manager.handle_page_fault(1, AccessKind::Read, page(0)).unwrap();
    manager.pin(&IoRequest::new(1, page(0))).unwrap();
    manager.handle_page_fault(1, AccessKind::Read, page(1)).unwrap();
    host.on(Trigger::Fault(3), |host| host.kill(3));
    manager.unpin(page(0)).unwrap();
    manager.handle_page_fault(3, AccessKind::Read, PageId::new(2, 0)).unwrap();
    assert_eq!(host.dispatches(), 4);
}

#[test]
fn dirty_victim_is_written_back_before_reading() {
    let host = SimHost::new();
    host.spawn(1, 1);
    let mut swap = MockSwap::new();
    let mut order = Sequence::new();
    swap.expect_read()
        .with(eq(page(0)), eq(0), eq(1))
        .times(1)
        .in_sequence(&mut order)
        .return_const(());
    swap.expect_write()
        .with(eq(page(0)), eq(0), eq(1))
        .times(1)
        .in_sequence(&mut order)
        .return_const(());
    swap.expect_read()
        .with(eq(page(1)), eq(0), eq(1))
        .times(1)
        .in_sequence(&mut order)
        .return_const(());
    let manager = MemoryManager::new(config(1), host.clone(), Arc::new(swap)).unwrap();
    manager.create_page_table(1).unwrap();

    manager.refer(addr(0), AccessKind::Write, 1).unwrap();
    manager.refer(addr(1), AccessKind::Read, 1).unwrap();

    assert!(!manager.page(page(0)).unwrap().valid);
    let stats = manager.stats();
    assert_eq!(stats.swap_outs, 1);
    assert_eq!(stats.swap_ins, 2);
    assert_eq!(stats.evictions, 1);
}

#[test]
fn clean_victim_is_never_written_back() {
    let host = SimHost::new();
    host.spawn(1, 1);
    let mut swap = MockSwap::new();
    swap.expect_read().times(3).return_const(());
    swap.expect_write().never();
    let manager = MemoryManager::new(config(2), host.clone(), Arc::new(swap)).unwrap();
    manager.create_page_table(1).unwrap();

    for number in 0..3 {
        manager.refer(addr(number), AccessKind::Read, 1).unwrap();
    }
    assert_eq!(manager.stats().free_frame_hits, 2);
}
