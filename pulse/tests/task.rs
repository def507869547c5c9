mod common;

use common::{drive_until, test_loop};
use pulse::task::{Coroutine, CoroutineState, Resume, Yielded, ensure_future};
use pulse::{Error, Future, FutureState, Task, yield_now};
use std::cell::Cell;
use std::rc::Rc;

#[test]
fn test_task_completes_with_value() {
    let event_loop = test_loop();
    let task = Task::spawn(&event_loop, "value", async { Ok(7) });

    assert!(task.is_pending());
    assert_eq!(task.name(), "value");

    drive_until(&event_loop, 5, || !task.is_pending());

    assert!(task.done());
    assert_eq!(task.result().unwrap(), 7);
}

#[test]
fn test_first_step_is_scheduled_not_run() {
    let event_loop = test_loop();
    let started = Rc::new(Cell::new(false));

    let flag = started.clone();
    let _task = Task::spawn(&event_loop, "lazy", async move {
        flag.set(true);
        Ok(())
    });

    assert!(!started.get());
    assert_eq!(event_loop.pending(), 1);

    event_loop.run_step().unwrap();

    assert!(started.get());
}

#[test]
fn test_task_waits_for_future_without_rescheduling() {
    let event_loop = test_loop();
    let gate = Future::new(&event_loop, "gate");

    let awaited = gate.clone();
    let task = Task::spawn(&event_loop, "waiter", async move { awaited.await });

    event_loop.run_step().unwrap();

    // Suspended on the gate: nothing is scheduled until it completes.
    assert_eq!(event_loop.pending(), 0);
    assert!(task.is_pending());

    gate.set_result("open").unwrap();
    drive_until(&event_loop, 5, || !task.is_pending());

    assert_eq!(task.result().unwrap(), "open");
}

#[test]
fn test_yield_now_reschedules_each_tick() {
    let event_loop = test_loop();
    let resumes = Rc::new(Cell::new(0));

    let counter = resumes.clone();
    let task = Task::spawn(&event_loop, "yielder", async move {
        for _ in 0..3 {
            counter.set(counter.get() + 1);
            yield_now().await?;
        }
        Ok(counter.get())
    });

    for expected in 1..=3 {
        event_loop.run_step().unwrap();
        assert_eq!(resumes.get(), expected);
        assert_eq!(event_loop.pending(), 1);
    }

    event_loop.run_step().unwrap();

    assert_eq!(task.result().unwrap(), 3);
}

#[test]
fn test_cancel_while_awaiting_cancels_inner_future() {
    let event_loop = test_loop();
    let inner = Future::<i32>::new(&event_loop, "inner");
    let resumed = Rc::new(Cell::new(false));

    let awaited = inner.clone();
    let flag = resumed.clone();
    let task = Task::spawn(&event_loop, "worker", async move {
        let value = awaited.await?;
        flag.set(true);
        Ok(value)
    });

    event_loop.run_step().unwrap();

    assert!(task.cancel());
    assert!(inner.cancelled());
    // Cancellation reaches the task through the loop, not inline.
    assert!(task.is_pending());

    drive_until(&event_loop, 5, || !task.is_pending());

    assert!(task.cancelled());
    assert!(!resumed.get());
    assert!(matches!(task.result(), Err(Error::Cancelled)));
}

#[test]
fn test_cancelling_task_through_its_future_cancels_awaited_future() {
    let event_loop = test_loop();
    let gate = Future::<i32>::new(&event_loop, "gate");

    let awaited = gate.clone();
    let task = Task::spawn(&event_loop, "gated", async move { awaited.await });

    event_loop.run_step().unwrap();

    let future = ensure_future(&event_loop, task.clone().into());
    assert!(future.cancel());
    assert!(gate.cancelled());

    drive_until(&event_loop, 5, || !task.is_pending());

    assert!(task.cancelled());
    assert!(future.cancelled());
    assert_eq!(event_loop.pending(), 0);
}

#[test]
fn test_result_of_task_cannot_be_set_from_outside() {
    let event_loop = test_loop();
    let gate = Future::<i32>::new(&event_loop, "gate");

    let awaited = gate.clone();
    let task = Task::spawn(&event_loop, "gated", async move { awaited.await });
    let future = ensure_future(&event_loop, task.clone().into());

    assert!(matches!(future.set_result(5), Err(Error::InvalidState(_))));
    assert!(task.is_pending());

    gate.set_result(1).unwrap();
    drive_until(&event_loop, 5, || !task.is_pending());

    assert_eq!(task.result().unwrap(), 1);
}

#[test]
fn test_cancel_before_first_step_is_latched() {
    let event_loop = test_loop();
    let started = Rc::new(Cell::new(false));

    let flag = started.clone();
    let task = Task::spawn(&event_loop, "never started", async move {
        flag.set(true);
        Ok(1)
    });

    assert!(task.cancel());
    assert!(task.is_pending());

    event_loop.run_step().unwrap();

    assert!(task.cancelled());
    assert!(!started.get());
}

#[test]
fn test_latched_cancel_is_raised_at_suspension_point() {
    let event_loop = test_loop();

    let task = Task::spawn(&event_loop, "cleanup", async {
        match yield_now().await {
            Err(Error::Cancelled) => Ok("cleaned up"),
            Err(err) => Err(err),
            Ok(()) => Ok("finished"),
        }
    });

    event_loop.run_step().unwrap();
    assert!(task.cancel());

    drive_until(&event_loop, 5, || !task.is_pending());

    // The computation caught the cancellation and completed normally.
    assert!(task.done());
    assert_eq!(task.result().unwrap(), "cleaned up");
}

#[test]
fn test_cancel_latched_while_suspending_cancels_new_awaited_future() {
    let event_loop = test_loop();
    let target = Future::<u8>::new(&event_loop, "target");
    let task_slot: Rc<Cell<Option<Task<u8>>>> = Rc::new(Cell::new(None));

    let awaited = target.clone();
    let slot = task_slot.clone();
    let task = Task::spawn(&event_loop, "self cancelling", async move {
        if let Some(me) = slot.take() {
            assert!(me.cancel());
        }
        awaited.await
    });
    task_slot.set(Some(task.clone()));

    drive_until(&event_loop, 5, || !task.is_pending());

    assert!(target.cancelled());
    assert!(task.cancelled());
}

#[test]
fn test_cancel_finished_task_returns_false() {
    let event_loop = test_loop();
    let task = Task::spawn(&event_loop, "quick", async { Ok(()) });

    drive_until(&event_loop, 5, || !task.is_pending());

    assert!(!task.cancel());
    assert!(task.done());
}

#[test]
fn test_double_cancel_on_cancelled_task_returns_false() {
    let event_loop = test_loop();
    let task = Task::spawn(&event_loop, "twice", async { Ok(()) });

    assert!(task.cancel());
    drive_until(&event_loop, 5, || !task.is_pending());

    assert!(task.cancelled());
    assert!(!task.cancel());
}

#[test]
fn test_nested_tasks_propagate_cancellation() {
    let event_loop = test_loop();
    let leaf = Future::<i32>::new(&event_loop, "leaf");

    let awaited = leaf.clone();
    let inner = Task::spawn(&event_loop, "inner", async move { awaited.await });

    let child = inner.clone();
    let outer = Task::spawn(&event_loop, "outer", async move { Ok(child.await? + 1) });

    event_loop.run_step().unwrap();

    assert!(outer.cancel());
    assert!(leaf.cancelled());

    drive_until(&event_loop, 10, || !outer.is_pending());

    assert!(inner.cancelled());
    assert!(outer.cancelled());
}

#[test]
fn test_awaiting_a_task_returns_its_value() {
    let event_loop = test_loop();

    let inner = Task::spawn(&event_loop, "inner", async {
        yield_now().await?;
        Ok(20)
    });
    let outer = Task::spawn(&event_loop, "outer", async move { Ok(inner.await? + 1) });

    drive_until(&event_loop, 10, || !outer.is_pending());

    assert_eq!(outer.result().unwrap(), 21);
}

#[test]
fn test_failure_escapes_the_tick_and_leaves_task_pending() {
    let event_loop = test_loop();
    let task: Task<()> = Task::spawn(&event_loop, "broken", async { Err(Error::failed("broken")) });

    let err = event_loop.run_step().unwrap_err();

    assert_eq!(err.to_string(), "broken");
    assert_eq!(task.state(), FutureState::Pending);
}

/// Hand-written computation: counts down, yielding the marker each time.
struct Countdown {
    remaining: u32,
}

impl Coroutine for Countdown {
    type Output = &'static str;

    fn resume(&mut self, input: Resume) -> CoroutineState<Self::Output> {
        if let Resume::Throw(err) = input {
            return CoroutineState::Failed(err);
        }

        if self.remaining == 0 {
            return CoroutineState::Complete("liftoff");
        }

        self.remaining -= 1;
        CoroutineState::Suspended(Yielded::Marker)
    }
}

#[test]
fn test_hand_written_coroutine() {
    let event_loop = test_loop();
    let task = Task::new(&event_loop, "countdown", Countdown { remaining: 3 });

    drive_until(&event_loop, 10, || !task.is_pending());

    assert_eq!(task.result().unwrap(), "liftoff");
    assert_eq!(event_loop.ticks(), 4);
}

#[test]
fn test_hand_written_coroutine_receives_cancellation() {
    let event_loop = test_loop();
    let task = Task::new(&event_loop, "countdown", Countdown { remaining: 100 });

    event_loop.run_step().unwrap();
    assert!(task.cancel());
    event_loop.run_step().unwrap();

    assert!(task.cancelled());
}
