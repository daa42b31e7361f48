use semaphore_emulator::error::SemaphoreError;
use semaphore_emulator::locking::timestamp;
use semaphore_emulator::{AcquireOptions, LockManager, LockTimeoutValue};
use std::fs;
use std::sync::{Arc, Barrier};
use std::thread;
use std::time::{Duration, Instant};
use tempfile::TempDir;

fn manager(temp: &TempDir) -> LockManager {
    LockManager::with_default_directory(temp.path()).unwrap()
}

#[test]
fn job_scenario_blocks_then_carries_timestamp() {
    let temp = TempDir::new().unwrap();
    let manager = manager(&temp);
    let non_blocking = AcquireOptions::non_blocking();

    let mut process_a = manager.obtain_lock("job_42", &non_blocking).unwrap();
    let lock_path = temp.path().join("job_42.lock");
    let content = fs::read_to_string(&lock_path).unwrap();
    assert_eq!(content, timestamp::format(process_a.acquired_timestamp()));
    assert_eq!(content.split('.').nth(1).map(str::len), Some(6));

    let err = manager.obtain_lock("job_42", &non_blocking).unwrap_err();
    assert!(matches!(err, SemaphoreError::ConcurrentRequestBlocked { .. }));
    assert!(err.is_contention());

    let a_stamp = process_a.acquired_timestamp();
    process_a.release().unwrap();

    let process_b = manager.obtain_lock("job_42", &non_blocking).unwrap();
    let carried = process_b.last_timestamp().unwrap();
    assert!((carried - a_stamp).abs() < 1e-3);
}

#[test]
fn invalid_identifiers_never_create_files() {
    let temp = TempDir::new().unwrap();
    let manager = manager(&temp);

    for identifier in ["", "job-42", "job 42", "../job", "job.lock", "jöb", "a/b", "a\\b"] {
        let err = manager
            .obtain_lock(identifier, &AcquireOptions::default())
            .unwrap_err();
        assert!(
            matches!(err, SemaphoreError::InvalidIdentifier(_)),
            "{identifier:?} gave {err:?}"
        );
    }
    assert_eq!(fs::read_dir(temp.path()).unwrap().count(), 0);
}

#[test]
fn at_most_one_thread_holds_the_lock() {
    let temp = TempDir::new().unwrap();
    let manager = Arc::new(manager(&temp));
    let contenders = 8;
    let barrier = Arc::new(Barrier::new(contenders));

    let handles: Vec<_> = (0..contenders)
        .map(|_| {
            let manager = Arc::clone(&manager);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                let result = manager.obtain_lock("shared", &AcquireOptions::non_blocking());
                // Hold long enough for every contender to attempt
                thread::sleep(Duration::from_millis(200));
                result.is_ok()
            })
        })
        .collect();

    let winners = handles
        .into_iter()
        .map(|handle| handle.join().unwrap())
        .filter(|won| *won)
        .count();
    assert_eq!(winners, 1);
}

#[test]
fn polling_serializes_all_contenders() {
    let temp = TempDir::new().unwrap();
    let manager = Arc::new(manager(&temp));
    let counter_path = temp.path().join("counter.txt");
    fs::write(&counter_path, "0").unwrap();

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let manager = Arc::clone(&manager);
            let counter_path = counter_path.clone();
            thread::spawn(move || {
                let options = AcquireOptions::polling(
                    Duration::from_millis(5),
                    LockTimeoutValue::from_secs(30),
                );
                for _ in 0..5 {
                    let mut lock = manager.obtain_lock("counter", &options).unwrap();
                    let value: u32 = fs::read_to_string(&counter_path).unwrap().parse().unwrap();
                    thread::sleep(Duration::from_millis(2));
                    fs::write(&counter_path, (value + 1).to_string()).unwrap();
                    lock.release().unwrap();
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }
    assert_eq!(fs::read_to_string(&counter_path).unwrap(), "20");
}

#[test]
fn release_twice_is_harmless() {
    let temp = TempDir::new().unwrap();
    let manager = manager(&temp);

    let mut lock = manager.obtain_lock("twice", &AcquireOptions::default()).unwrap();
    assert!(lock.release().is_ok());
    assert!(lock.release().is_ok());
    assert!(!lock.is_locked());
}

#[test]
fn elapsed_time_first_use_and_subsequent() {
    let temp = TempDir::new().unwrap();
    let manager = manager(&temp);

    let mut first = manager.obtain_lock("cron", &AcquireOptions::default()).unwrap();
    assert_eq!(first.last_timestamp(), None);
    assert!(first.check_elapsed_time(1_000_000.0));
    first.release().unwrap();

    thread::sleep(Duration::from_millis(50));
    let second = manager.obtain_lock("cron", &AcquireOptions::default()).unwrap();
    assert!(second.check_elapsed_time(0.04));
    assert!(!second.check_elapsed_time(60.0));
}

#[test]
fn polling_times_out_within_bound() {
    let temp = TempDir::new().unwrap();
    let manager = manager(&temp);
    let _holder = manager
        .obtain_lock("busy", &AcquireOptions::default())
        .unwrap();

    let options = AcquireOptions::polling(
        Duration::from_millis(10),
        LockTimeoutValue::Finite(Duration::from_millis(200)),
    );
    let started = Instant::now();
    let err = manager.obtain_lock("busy", &options).unwrap_err();
    let elapsed = started.elapsed();

    match err {
        SemaphoreError::ConcurrentRequestTimeout {
            resource,
            waited_secs,
        } => {
            assert_eq!(resource, "busy");
            assert!(waited_secs >= 0.2);
        }
        other => panic!("Expected timeout error, got {other:?}"),
    }
    assert!(elapsed >= Duration::from_millis(200));
    assert!(elapsed < Duration::from_millis(1_500), "took {elapsed:?}");
}

#[test]
fn delete_on_release_controls_file_persistence() {
    let temp = TempDir::new().unwrap();
    let manager = manager(&temp);

    let mut kept = manager.obtain_lock("kept", &AcquireOptions::default()).unwrap();
    kept.release().unwrap();
    assert!(temp.path().join("kept.lock").exists());

    let mut removed = manager
        .obtain_lock("removed", &AcquireOptions::default())
        .unwrap();
    removed.enable_delete_on_release();
    removed.release().unwrap();
    assert!(!temp.path().join("removed.lock").exists());
}

#[test]
fn garbage_lock_content_counts_as_first_use() {
    let temp = TempDir::new().unwrap();
    fs::write(temp.path().join("legacy.lock"), "not a timestamp").unwrap();
    let manager = manager(&temp);

    let lock = manager.obtain_lock("legacy", &AcquireOptions::default()).unwrap();
    assert_eq!(lock.last_timestamp(), None);
    assert!(lock.check_elapsed_time(10.0));
    assert_eq!(
        fs::read_to_string(lock.path()).unwrap(),
        timestamp::format(lock.acquired_timestamp())
    );
}
