//! Supervisor tests: the four loops on one executor, and shutdown.
//!
//! The mock clock's `sleep` only yields, so every loop spins as fast as
//! the executor polls it; the `until` futures bound the run.

use futures_lite::future::yield_now;

use crate::mock_hw::{winter_utc, MemStorage, Rig};

use dawndoor::app::events::AppEvent;
use dawndoor::app::ports::DoorOutput;
use dawndoor::app::store::DataStore;
use dawndoor::config::Location;
use dawndoor::door::DoorStatus;
use dawndoor::scheduler::{self, Shutdown, Supervisor, TaskId};

const MAX_ROUNDS: usize = 10_000;

#[test]
fn tasks_open_the_door_then_stop() {
    let storage = MemStorage::default();
    DataStore::new(storage.clone())
        .save_location(&Location::new(40.7128, -74.0060, "EST"))
        .unwrap();
    let rig = Rig::with_storage(storage, winter_utc(17, 0)); // 12:00 local
    rig.net.state.borrow_mut().connected = true;

    let supervisor = Supervisor::new(&rig.svc);
    supervisor.run(async {
        for _ in 0..MAX_ROUNDS {
            if rig.svc.door_view().status == DoorStatus::Open {
                break;
            }
            yield_now().await;
        }
        // A few more rounds so a second door check would have fired.
        for _ in 0..50 {
            yield_now().await;
        }
    });

    assert!(supervisor.shutdown().is_requested());
    assert_eq!(rig.svc.door_view().status, DoorStatus::Open);

    let bank = rig.relays.bank.borrow();
    assert_eq!(bank.energize_count(DoorOutput::Open), 1);
    assert!(!bank.open && !bank.close, "no relay left energised");

    assert!(rig.sink.count(|e| *e == AppEvent::TimeSynced) >= 1);
    assert_eq!(rig.sink.count(|e| matches!(e, AppEvent::ScheduleComputed(_))), 1);

    let commits = rig.display.commits.borrow();
    assert_eq!(commits[0], vec![("DawnDoor".to_string(), 32, 28)], "splash first");
    assert!(commits.len() > 1, "status screen drawn after the splash");
}

#[test]
fn immediate_stop_only_shows_splash() {
    let rig = Rig::new(winter_utc(17, 0));

    scheduler::run(&rig.svc, core::future::ready(()));

    assert_eq!(rig.clock.syncs.get(), 0, "offline: never synced");
    assert_eq!(rig.relays.bank.borrow().energize_count(DoorOutput::Open), 0);
    let commits = rig.display.commits.borrow();
    assert_eq!(commits.len(), 1);
    assert_eq!(commits[0], vec![("DawnDoor".to_string(), 32, 28)]);
}

#[test]
fn shutdown_is_sticky_for_every_task() {
    let shutdown = Shutdown::new();
    shutdown.request();
    for id in TaskId::ALL {
        assert!(shutdown.is_requested(), "{} should see the request", id.name());
    }
}
