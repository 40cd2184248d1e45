// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025-2026 natyamatsya contributors
//
// Deadline handling: timeouts surface as LockTimeout and leave no trace in
// the lock word or the wait queue.

use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use reslock::{LockMode, LockState, ResourceLock};

fn wait_until(what: &str, cond: impl Fn() -> bool) {
    let deadline = Instant::now() + Duration::from_secs(5);
    while !cond() {
        assert!(Instant::now() < deadline, "timed out waiting for {what}");
        thread::sleep(Duration::from_millis(1));
    }
}

#[test]
fn exclusive_times_out_against_held_exclusive() {
    let lock = Arc::new(ResourceLock::named("blk"));
    lock.acquire_exclusive(Duration::ZERO).unwrap();
    let before = lock.state();

    let remote = Arc::clone(&lock);
    let t = thread::spawn(move || {
        let start = Instant::now();
        let res = remote.acquire_exclusive(Duration::from_millis(100));
        (res, start.elapsed())
    });
    let (res, waited) = t.join().unwrap();

    let err = res.unwrap_err();
    assert_eq!(err.mode(), LockMode::Exclusive);
    assert_eq!(err.lock_name(), "blk");
    assert_eq!(err.timeout(), Duration::from_millis(100));
    assert!(waited >= Duration::from_millis(100));
    assert!(waited < Duration::from_secs(2), "took {waited:?}");

    assert_eq!(lock.state(), before);
    assert_eq!(lock.stats().timeouts, 1);

    lock.release_exclusive();
    assert!(lock.state().is_free());
}

// Two readers hold; a writer times out; the readers keep their access and no
// exclusive marker is left behind.
#[test]
fn writer_times_out_against_readers() {
    let lock = Arc::new(ResourceLock::new());
    lock.acquire_shared(Duration::from_secs(1)).unwrap();
    lock.acquire_shared(Duration::from_secs(1)).unwrap();
    assert_eq!(lock.state().shared, 2);

    let remote = Arc::clone(&lock);
    let writer = thread::spawn(move || remote.acquire_exclusive(Duration::from_millis(50)));
    let err = writer.join().unwrap().unwrap_err();
    assert_eq!(err.mode(), LockMode::Exclusive);

    assert_eq!(
        lock.state(),
        LockState {
            shared: 2,
            exclusive: false,
            waiters: 0
        }
    );
    // A new reader is admitted on the fast path again.
    assert!(lock.try_acquire_shared());

    for _ in 0..3 {
        lock.release_shared();
    }
    assert!(lock.state().is_free());
}

#[test]
fn shared_times_out_against_writer() {
    let lock = Arc::new(ResourceLock::new());
    lock.acquire_exclusive(Duration::ZERO).unwrap();

    let remote = Arc::clone(&lock);
    let reader = thread::spawn(move || remote.acquire_shared(Duration::from_millis(30)));
    let err = reader.join().unwrap().unwrap_err();
    assert_eq!(err.mode(), LockMode::Shared);
    assert!(err.to_string().contains("shared"));

    let s = lock.state();
    assert!(s.exclusive);
    assert_eq!(s.waiters, 0);
    lock.release_exclusive();
    assert!(lock.state().is_free());
}

#[test]
fn zero_timeout_still_takes_free_lock() {
    let lock = ResourceLock::new();
    lock.acquire_shared(Duration::ZERO).unwrap();
    lock.release_shared();
    lock.acquire_exclusive(Duration::ZERO).unwrap();
    lock.release_exclusive();
    assert_eq!(lock.stats().timeouts, 0);
}

#[test]
fn zero_timeout_fails_fast_when_held() {
    let lock = ResourceLock::new();
    lock.acquire_exclusive(Duration::ZERO).unwrap();

    let start = Instant::now();
    assert!(lock.acquire_shared(Duration::ZERO).is_err());
    assert!(lock.acquire_exclusive(Duration::ZERO).is_err());
    assert!(start.elapsed() < Duration::from_millis(100));

    assert_eq!(lock.state().waiters, 0);
    assert_eq!(lock.stats().parked, 0);
    assert_eq!(lock.stats().timeouts, 2);
    lock.release_exclusive();
}

// A writer that gives up must not keep readers queued behind it waiting.
#[test]
fn timed_out_writer_lets_queued_reader_in() {
    let lock = Arc::new(ResourceLock::new());
    lock.acquire_shared(Duration::ZERO).unwrap();

    let remote = Arc::clone(&lock);
    let writer = thread::spawn(move || remote.acquire_exclusive(Duration::from_millis(100)));
    wait_until("writer to queue", || lock.state().waiters == 1);

    let remote = Arc::clone(&lock);
    let reader = thread::spawn(move || {
        let start = Instant::now();
        remote.acquire_shared(Duration::from_secs(5)).unwrap();
        let waited = start.elapsed();
        remote.release_shared();
        waited
    });
    wait_until("reader to queue", || lock.state().waiters == 2);

    assert!(writer.join().unwrap().is_err());
    // The first reader still holds; the queued one got in anyway.
    let waited = reader.join().unwrap();
    assert!(waited < Duration::from_secs(2), "reader waited {waited:?}");
    assert_eq!(lock.state().shared, 1);

    lock.release_shared();
    assert!(lock.state().is_free());
}

#[test]
fn retry_after_timeout_succeeds() {
    let lock = Arc::new(ResourceLock::new());
    lock.acquire_exclusive(Duration::ZERO).unwrap();

    let remote = Arc::clone(&lock);
    let t = thread::spawn(move || {
        assert!(remote.acquire_exclusive(Duration::from_millis(20)).is_err());
        remote.acquire_exclusive(Duration::from_secs(5)).unwrap();
        remote.release_exclusive();
    });

    wait_until("first attempt to give up", || lock.stats().timeouts == 1);
    wait_until("second attempt to queue", || lock.state().waiters == 1);
    lock.release_exclusive();
    t.join().unwrap();
    assert!(lock.state().is_free());
}

#[test]
fn many_timeouts_leave_lock_clean() {
    let lock = Arc::new(ResourceLock::new());
    lock.acquire_exclusive(Duration::ZERO).unwrap();

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let lock = Arc::clone(&lock);
            thread::spawn(move || {
                let timeout = Duration::from_millis(10 + 5 * i);
                if i % 2 == 0 {
                    lock.acquire_shared(timeout).is_err()
                } else {
                    lock.acquire_exclusive(timeout).is_err()
                }
            })
        })
        .collect();

    for h in handles {
        assert!(h.join().unwrap());
    }

    let s = lock.state();
    assert!(s.exclusive);
    assert_eq!(s.waiters, 0);
    assert_eq!(s.shared, 0);
    lock.release_exclusive();
    assert!(lock.state().is_free());
}

// Unparks that do not come from a grant are absorbed: the reader keeps
// waiting until its own deadline and then withdraws cleanly.
#[test]
fn stray_unpark_does_not_end_the_wait() {
    let lock = Arc::new(ResourceLock::new());
    lock.acquire_exclusive(Duration::ZERO).unwrap();
    let timeout = Duration::from_millis(200);

    let remote = Arc::clone(&lock);
    let reader = thread::spawn(move || {
        let start = Instant::now();
        let res = remote.acquire_shared(timeout);
        (res, start.elapsed())
    });
    wait_until("reader to queue", || lock.state().waiters == 1);

    while !reader.is_finished() {
        reader.thread().unpark();
        thread::sleep(Duration::from_millis(1));
    }
    let (res, waited) = reader.join().unwrap();

    assert_eq!(res.unwrap_err().mode(), LockMode::Shared);
    assert!(waited >= timeout, "gave up after {waited:?}");
    assert_eq!(
        lock.state(),
        LockState {
            shared: 0,
            exclusive: true,
            waiters: 0
        }
    );
    lock.release_exclusive();
    assert!(lock.state().is_free());
}

// A timeout past what `Instant` can represent waits without a deadline.
#[test]
fn unrepresentable_timeout_waits_for_release() {
    let lock = Arc::new(ResourceLock::new());
    lock.acquire_exclusive(Duration::ZERO).unwrap();

    let remote = Arc::clone(&lock);
    let reader = thread::spawn(move || {
        remote.acquire_shared(Duration::MAX).unwrap();
        remote.release_shared();
    });
    wait_until("reader to queue", || lock.state().waiters == 1);

    lock.release_exclusive();
    reader.join().unwrap();
    assert_eq!(lock.stats().timeouts, 0);
    assert!(lock.state().is_free());
}
