//! Behavioural tests for message commit and rollback on the send queue.

use std::cell::RefCell;

use ca_sendq::{
    FreeListPool,
    RequestWriter,
    SendError,
    SendQueue,
    dbr::DBR_DOUBLE,
    request_code::CA_MINOR_PROTOCOL_REVISION,
    test_helpers::drain_stream,
};
use rstest::fixture;
use rstest_bdd::assert_step_err;
use rstest_bdd_macros::{given, scenario, then, when};

#[derive(Default)]
struct QueueWorld {
    queue: RefCell<Option<SendQueue<FreeListPool>>>,
    outcome: RefCell<Option<Result<(), SendError>>>,
    drained: RefCell<Vec<u8>>,
}

impl QueueWorld {
    fn with_queue<R>(&self, f: impl FnOnce(&mut SendQueue<FreeListPool>) -> R) -> R {
        let mut slot = self.queue.borrow_mut();
        let Some(queue) = slot.as_mut() else {
            panic!("send queue not initialised");
        };
        f(queue)
    }

    fn record(&self, outcome: Result<(), SendError>) { self.outcome.borrow_mut().replace(outcome); }
}

#[expect(
    unused_braces,
    reason = "rstest fixture macro expansion triggers unused_braces on expression bodies"
)]
#[fixture]
fn world() -> QueueWorld { QueueWorld::default() }

#[given("an empty send queue with a pool of {limit} buffers")]
fn given_queue(world: &QueueWorld, limit: usize) {
    world
        .queue
        .borrow_mut()
        .replace(SendQueue::new(FreeListPool::new(limit)));
}

#[when("I queue a committed echo request")]
fn when_echo(world: &QueueWorld) {
    let outcome = world.with_queue(|queue| {
        RequestWriter::new(queue, CA_MINOR_PROTOCOL_REVISION).echo()
    });
    world.record(outcome);
}

#[when("I begin a message and push {len} bytes without committing")]
fn when_open_message(world: &QueueWorld, len: usize) {
    let outcome = world.with_queue(|queue| {
        queue.begin_msg();
        queue.push_string(&vec![0x5A; len])
    });
    world.record(outcome);
}

#[when("I request {count} doubles from a peer at minor revision {minor}")]
fn when_large_read(world: &QueueWorld, count: u32, minor: u16) {
    let outcome = world.with_queue(|queue| {
        RequestWriter::new(queue, minor).read_notify(1, 1, DBR_DOUBLE, count)
    });
    world.record(outcome);
}

#[when("I drain the queue")]
fn when_drain(world: &QueueWorld) {
    let stream = world.with_queue(drain_stream);
    *world.drained.borrow_mut() = stream;
}

#[then("the drained stream is {len} bytes long")]
fn then_drained_len(world: &QueueWorld, len: usize) {
    assert_eq!(world.drained.borrow().len(), len);
}

#[then("the queue holds {bytes} bytes")]
fn then_queue_holds(world: &QueueWorld, bytes: usize) {
    assert_eq!(world.with_queue(|queue| queue.occupied_bytes()), bytes);
}

#[then("the chain has {count} buffers")]
fn then_chain_len(world: &QueueWorld, count: usize) {
    assert_eq!(world.with_queue(|queue| queue.buffer_count()), count);
}

#[expect(
    clippy::needless_pass_by_value,
    reason = "rstest-bdd captures String by value"
)]
#[then("the request fails with \"{message}\"")]
fn then_failure(world: &QueueWorld, message: String) {
    let outcome_ref = world.outcome.borrow();
    let Some(outcome) = outcome_ref.as_ref() else {
        panic!("no request recorded");
    };
    let text = assert_step_err!(outcome.as_ref().map(|_| ()).map_err(ToString::to_string));
    assert!(
        text.contains(&message),
        "expected '{text}' to contain '{message}'"
    );
}

#[scenario(path = "tests/features/message_commit.feature", index = 0)]
fn committed_request_is_sent(world: QueueWorld) { let _ = world; }

#[scenario(path = "tests/features/message_commit.feature", index = 1)]
fn abandoned_message_is_discarded(world: QueueWorld) { let _ = world; }

#[scenario(path = "tests/features/message_commit.feature", index = 2)]
fn begin_rolls_back_open_message(world: QueueWorld) { let _ = world; }

#[scenario(path = "tests/features/message_commit.feature", index = 3)]
fn oversized_read_is_refused(world: QueueWorld) { let _ = world; }

#[scenario(path = "tests/features/message_commit.feature", index = 4)]
fn exhausted_pool_is_reported(world: QueueWorld) { let _ = world; }
