//! Task supervisor.
//!
//! Runs the four background loops of the [`AppService`] on one
//! `edge-executor` and stops them cleanly on request.
//!
//! ```text
//!  ┌──────────────────────────────────────────────────────────────┐
//!  │  futures_lite::block_on                                      │
//!  │  ┌────────────────────────────────────────────────────────┐  │
//!  │  │  edge_executor::LocalExecutor                          │  │
//!  │  │                                                        │  │
//!  │  │  ┌───────────┐ ┌───────────┐ ┌───────────┐ ┌─────────┐ │  │
//!  │  │  │ time sync │ │ schedule  │ │door check │ │ display │ │  │
//!  │  │  │ 3600s/1s  │ │ 3600s/5s  │ │ 300s/5s   │ │   1s    │ │  │
//!  │  │  └─────┬─────┘ └─────┬─────┘ └─────┬─────┘ └────┬────┘ │  │
//!  │  │        └──── sleep ◀─┴── or ──▶ Shutdown ───────┘      │  │
//!  │  └────────────────────────────────────────────────────────┘  │
//!  └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! Each loop calls its step, then sleeps for the returned duration or
//! until shutdown, whichever comes first.  A step is never interrupted:
//! a door pulse in progress always finishes before its task exits.

use core::future::Future;
use core::sync::atomic::{AtomicBool, Ordering};
use core::time::Duration;

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::signal::Signal;
use log::info;

use crate::app::ports::{ActuatorPort, ClockPort, DisplayPort, EventSink, NetworkPort, StoragePort};
use crate::app::service::AppService;

// ═══════════════════════════════════════════════════════════════
//  Task identity
// ═══════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskId {
    TimeSync,
    Schedule,
    DoorCheck,
    Display,
}

impl TaskId {
    pub const ALL: [Self; 4] = [Self::TimeSync, Self::Schedule, Self::DoorCheck, Self::Display];

    const fn index(self) -> usize {
        match self {
            Self::TimeSync => 0,
            Self::Schedule => 1,
            Self::DoorCheck => 2,
            Self::Display => 3,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::TimeSync => "time-sync",
            Self::Schedule => "schedule",
            Self::DoorCheck => "door-check",
            Self::Display => "display",
        }
    }
}

// ═══════════════════════════════════════════════════════════════
//  Shutdown
// ═══════════════════════════════════════════════════════════════

/// Stop request that wakes every sleeping task.
pub struct Shutdown {
    requested: AtomicBool,
    wake: [Signal<CriticalSectionRawMutex, ()>; 4],
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}

impl Shutdown {
    pub const fn new() -> Self {
        Self {
            requested: AtomicBool::new(false),
            wake: [const { Signal::new() }; 4],
        }
    }

    pub fn request(&self) {
        self.requested.store(true, Ordering::Release);
        for signal in &self.wake {
            signal.signal(());
        }
    }

    pub fn is_requested(&self) -> bool {
        self.requested.load(Ordering::Acquire)
    }

    async fn wait(&self, id: TaskId) {
        if self.is_requested() {
            return;
        }
        self.wake[id.index()].wait().await;
    }
}

// ═══════════════════════════════════════════════════════════════
//  Supervisor
// ═══════════════════════════════════════════════════════════════

pub struct Supervisor<'a, S, C, N, D, A, E>
where
    S: StoragePort,
    C: ClockPort,
    N: NetworkPort,
    D: DisplayPort,
    A: ActuatorPort,
    E: EventSink,
{
    svc: &'a AppService<S, C, N, D, A, E>,
    shutdown: Shutdown,
}

impl<'a, S, C, N, D, A, E> Supervisor<'a, S, C, N, D, A, E>
where
    S: StoragePort,
    C: ClockPort,
    N: NetworkPort,
    D: DisplayPort,
    A: ActuatorPort,
    E: EventSink,
{
    pub fn new(svc: &'a AppService<S, C, N, D, A, E>) -> Self {
        Self {
            svc,
            shutdown: Shutdown::new(),
        }
    }

    pub fn shutdown(&self) -> &Shutdown {
        &self.shutdown
    }

    /// Run all four tasks until `until` resolves, then request shutdown
    /// and wait for every task to return.
    ///
    /// The stop watcher is a task of its own: the future handed to
    /// `LocalExecutor::run` is only polled once every task is idle, and
    /// the loops need not ever be idle.
    pub fn run(&self, until: impl Future<Output = ()>) {
        let executor: edge_executor::LocalExecutor<'_, 8> = edge_executor::LocalExecutor::new();

        let tasks = [
            executor.spawn(self.time_sync_loop()),
            executor.spawn(self.schedule_loop()),
            executor.spawn(self.door_check_loop()),
            executor.spawn(self.display_loop()),
        ];
        executor
            .spawn(async {
                until.await;
                info!("Supervisor: shutdown requested");
                self.shutdown.request();
            })
            .detach();
        info!("Supervisor: {} tasks started", tasks.len());

        futures_lite::future::block_on(executor.run(async {
            for task in tasks {
                task.await;
            }
        }));
        info!("Supervisor: all tasks stopped");
    }

    async fn pause(&self, id: TaskId, duration: Duration) {
        futures_lite::future::or(self.svc.clock().sleep(duration), self.shutdown.wait(id)).await;
    }

    async fn time_sync_loop(&self) {
        while !self.shutdown.is_requested() {
            let next = self.svc.time_sync_step();
            self.pause(TaskId::TimeSync, next).await;
        }
        info!("Task[{}]: stopped", TaskId::TimeSync.name());
    }

    async fn schedule_loop(&self) {
        while !self.shutdown.is_requested() {
            let next = self.svc.schedule_step();
            self.pause(TaskId::Schedule, next).await;
        }
        info!("Task[{}]: stopped", TaskId::Schedule.name());
    }

    async fn door_check_loop(&self) {
        while !self.shutdown.is_requested() {
            let next = self.svc.door_check_step().await;
            self.pause(TaskId::DoorCheck, next).await;
        }
        info!("Task[{}]: stopped", TaskId::DoorCheck.name());
    }

    async fn display_loop(&self) {
        self.svc.show_splash();
        while !self.shutdown.is_requested() {
            let next = self.svc.display_step();
            self.pause(TaskId::Display, next).await;
        }
        info!("Task[{}]: stopped", TaskId::Display.name());
    }
}

/// Convenience wrapper: supervise `svc` until `until` resolves.
pub fn run<S, C, N, D, A, E>(svc: &AppService<S, C, N, D, A, E>, until: impl Future<Output = ()>)
where
    S: StoragePort,
    C: ClockPort,
    N: NetworkPort,
    D: DisplayPort,
    A: ActuatorPort,
    E: EventSink,
{
    Supervisor::new(svc).run(until);
}
