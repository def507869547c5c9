mod common;

use common::test_loop;
use pulse::{Error, Future, Loop, Result, Task, WaitItem, wait, yield_now};
use std::cell::Cell;
use std::rc::Rc;

async fn some_result(event_loop: Loop, value: i32) -> Result<i32> {
    let future = Future::new(&event_loop, "some result");
    future.set_result(value)?;
    future.await
}

async fn cancelled_result(event_loop: Loop) -> Result<i32> {
    let future = Future::new(&event_loop, "cancelled result");
    future.cancel();
    future.await
}

#[test]
fn test_run_adds_sequentially_awaited_results() {
    let event_loop = test_loop();
    let handle = event_loop.clone();

    let sum = event_loop.run(async move {
        let x = some_result(handle.clone(), 1).await?;
        let y = some_result(handle, 2).await?;
        Ok(x + y)
    });

    assert_eq!(sum.unwrap(), 3);
    assert!(!event_loop.is_running());
}

#[test]
fn test_run_adds_results_of_awaited_tasks() {
    let event_loop = test_loop();
    let handle = event_loop.clone();

    let sum = event_loop.run(async move {
        let x = Task::spawn(&handle, "add x", some_result(handle.clone(), 1));
        let y = Task::spawn(&handle, "add y", some_result(handle.clone(), 2));
        Ok(x.await? + y.await?)
    });

    assert_eq!(sum.unwrap(), 3);
}

#[test]
fn test_run_adds_results_gathered_by_wait() {
    let event_loop = test_loop();
    let handle = event_loop.clone();

    let sum = event_loop.run(async move {
        let values = wait(
            &handle,
            [
                WaitItem::computation(some_result(handle.clone(), 1)),
                WaitItem::computation(some_result(handle.clone(), 2)),
            ],
        )
        .await?;
        Ok(values.iter().sum::<i32>())
    });

    assert_eq!(sum.unwrap(), 3);
}

#[test]
fn test_run_surfaces_cancellation_from_wait() {
    let event_loop = test_loop();
    let handle = event_loop.clone();

    let sum = event_loop.run(async move {
        let values = wait(
            &handle,
            [
                WaitItem::computation(some_result(handle.clone(), 1)),
                WaitItem::computation(cancelled_result(handle.clone())),
            ],
        )
        .await?;
        Ok(values[0] + values[1])
    });

    assert!(matches!(sum, Err(Error::Cancelled)));
    assert!(!event_loop.is_running());
}

#[test]
fn test_run_on_already_cancelled_future_raises_cancellation() {
    let event_loop = test_loop();
    let handle = event_loop.clone();

    let result = event_loop.run(cancelled_result(handle));

    assert!(matches!(result, Err(Error::Cancelled)));
    assert!(!event_loop.is_running());
}

#[test]
fn test_run_propagates_computation_failure() {
    let event_loop = test_loop();

    let result: Result<i32> = event_loop.run(async {
        yield_now().await?;
        Err(Error::failed("computation exploded"))
    });

    let err = result.unwrap_err();
    assert_eq!(err.to_string(), "computation exploded");
    assert!(!event_loop.is_running());
}

#[test]
fn test_run_propagates_failure_of_nested_task() {
    let event_loop = test_loop();
    let handle = event_loop.clone();

    let result = event_loop.run(async move {
        let child: Task<i32> = Task::spawn(&handle, "child", async {
            Err(Error::failed("child failed"))
        });
        child.await
    });

    assert_eq!(result.unwrap_err().to_string(), "child failed");
}

#[test]
fn test_run_stalls_on_future_nobody_completes() {
    let event_loop = test_loop();
    let handle = event_loop.clone();

    let result = event_loop.run(async move {
        let never = Future::<()>::new(&handle, "never");
        never.await
    });

    assert!(matches!(result, Err(Error::Stalled)));
}

struct DropFlag(Rc<Cell<bool>>);

impl Drop for DropFlag {
    fn drop(&mut self) {
        self.0.set(true);
    }
}

#[test]
fn test_stalled_run_releases_its_computation() {
    let event_loop = test_loop();
    let released = Rc::new(Cell::new(false));

    let handle = event_loop.clone();
    let flag = DropFlag(released.clone());
    let result = event_loop.run(async move {
        let _flag = flag;
        let never = Future::<()>::new(&handle, "never");
        never.await
    });

    assert!(matches!(result, Err(Error::Stalled)));
    assert!(released.get());
}

#[test]
fn test_loops_are_isolated() {
    let first = test_loop();
    let second = test_loop();

    let foreign = Future::new(&second, "foreign");
    foreign.add_done_callback(|_| Ok(()));
    foreign.set_result(1).unwrap();

    let handle = first.clone();
    let value = first.run(async move { some_result(handle, 5).await });

    assert_eq!(value.unwrap(), 5);
    assert_eq!(second.pending(), 1);
    assert_eq!(second.ticks(), 0);
}

#[test]
fn test_loop_can_run_again_after_completion() {
    let event_loop = test_loop();

    let first = event_loop.run(async { Ok(1) });
    let second = event_loop.run(async { Ok(2) });

    assert_eq!(first.unwrap(), 1);
    assert_eq!(second.unwrap(), 2);
}

#[pulse::test]
async fn test_attribute_runs_body_on_a_loop() {
    let event_loop = Loop::current().expect("body runs inside a tick");
    assert_eq!(event_loop.name(), "test");

    let value = some_result(event_loop.clone(), 42).await?;
    assert_eq!(value, 42);
}

#[pulse::test]
async fn test_attribute_supports_wait() {
    let event_loop = Loop::current().expect("body runs inside a tick");

    let values = wait(
        &event_loop,
        [
            WaitItem::computation(some_result(event_loop.clone(), 1)),
            WaitItem::computation(some_result(event_loop.clone(), 2)),
        ],
    )
    .await?;

    assert_eq!(values, vec![1, 2]);
}
