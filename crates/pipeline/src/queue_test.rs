//! Tests for the bounded job queue

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use super::*;

fn job(seq: u64) -> Job {
    Job {
        seq,
        text: format!("<r>{seq}</r>"),
        source_name: "test".into(),
        start_line: 1,
        end_line: 1,
    }
}

#[test]
fn push_then_pop_round_trips() {
    let queue = JobQueue::new(1);
    queue.push(job(0)).unwrap();
    queue.push(job(1)).unwrap();
    match queue.pop() {
        PopOutcome::Job(j) => assert_eq!(j.seq, 0),
        other => panic!("expected a job, got {other:?}"),
    }
    assert_eq!(queue.len(), 1);
}

#[test]
fn drained_queue_retires_workers_once() {
    let queue = JobQueue::new(2);
    queue.push(job(0)).unwrap();
    queue.finish();

    assert!(matches!(queue.pop(), PopOutcome::Job(_)));
    assert!(matches!(
        queue.pop(),
        PopOutcome::Drained { last_worker: false }
    ));
    assert!(matches!(
        queue.pop(),
        PopOutcome::Drained { last_worker: true }
    ));
}

#[test]
fn push_after_finish_is_an_internal_error() {
    let queue = JobQueue::new(1);
    queue.finish();
    assert!(matches!(queue.push(job(0)), Err(EngineError::Bug(_))));
}

#[test]
fn producer_blocks_at_high_mark_and_resumes_at_low_mark() {
    let queue = Arc::new(JobQueue::new(1));
    for seq in 0..queue.high_mark() as u64 {
        assert!(matches!(queue.push(job(seq)), Ok(PushOutcome::Pushed)));
    }
    assert_eq!(queue.len(), queue.high_mark());

    // The next push must block until consumers drain to the low mark.
    let producer = {
        let queue = Arc::clone(&queue);
        thread::spawn(move || queue.push(job(10_000)))
    };
    thread::sleep(Duration::from_millis(50));
    assert!(!producer.is_finished(), "push returned above the high mark");

    // Draining one job reaches the low mark for a single-worker queue only
    // after many pops; drain until the producer wakes.
    while queue.len() > LOW_WATERMARK {
        assert!(matches!(queue.pop(), PopOutcome::Job(_)));
    }
    assert!(matches!(producer.join().unwrap(), Ok(PushOutcome::Pushed)));
}

#[test]
fn cancel_wakes_blocked_producer() {
    let queue = Arc::new(JobQueue::new(1));
    for seq in 0..queue.high_mark() as u64 {
        queue.push(job(seq)).unwrap();
    }
    let producer = {
        let queue = Arc::clone(&queue);
        thread::spawn(move || queue.push(job(10_000)))
    };
    thread::sleep(Duration::from_millis(20));
    queue.cancel();
    assert!(matches!(
        producer.join().unwrap(),
        Ok(PushOutcome::Cancelled)
    ));
}

#[test]
fn cancel_wakes_parked_consumer() {
    let queue = Arc::new(JobQueue::new(1));
    let consumer = {
        let queue = Arc::clone(&queue);
        thread::spawn(move || queue.pop())
    };
    thread::sleep(Duration::from_millis(20));
    queue.cancel();
    assert!(matches!(consumer.join().unwrap(), PopOutcome::Cancelled));
}

#[test]
fn finish_wakes_parked_consumer() {
    let queue = Arc::new(JobQueue::new(1));
    let consumer = {
        let queue = Arc::clone(&queue);
        thread::spawn(move || queue.pop())
    };
    thread::sleep(Duration::from_millis(20));
    queue.finish();
    assert!(matches!(
        consumer.join().unwrap(),
        PopOutcome::Drained { last_worker: true }
    ));
}
