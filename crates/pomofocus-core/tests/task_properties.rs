//! Property tests for dependency locks, deletion and the finish-time estimate.

use chrono::{Duration, TimeZone, Utc};
use pomofocus_core::{estimate_finish, is_locked, Priority, ScheduleDate, Settings, Task, TaskBoard};
use proptest::prelude::*;

fn make_task(index: usize, completed: bool, deps: Vec<usize>, estimate: u32, done: u32) -> Task {
    Task {
        id: format!("t{index}"),
        title: format!("Task {index}"),
        estimated_pomos: estimate,
        completed_pomos: done,
        is_completed: completed,
        priority: Priority::Medium,
        is_pinned: false,
        created_at: Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap() + Duration::milliseconds(index as i64),
        schedule_date: ScheduleDate::Today,
        depends_on: deps.into_iter().map(|d| format!("t{d}")).collect(),
    }
}

/// Up to eight tasks whose dependencies may point at any index below 12,
/// so some ids refer to tasks that do not exist.
fn task_list() -> impl Strategy<Value = Vec<Task>> {
    prop::collection::vec(
        (any::<bool>(), prop::collection::vec(0usize..12, 0..4), 1u32..6, 0u32..7),
        1..8,
    )
    .prop_map(|specs| {
        specs
            .into_iter()
            .enumerate()
            .map(|(i, (completed, deps, est, done))| make_task(i, completed, deps, est, done))
            .collect()
    })
}

proptest! {
    #[test]
    fn locked_iff_existing_incomplete_dependency(tasks in task_list()) {
        for task in &tasks {
            let expected = task.depends_on.iter().any(|dep| {
                tasks.iter().any(|t| &t.id == dep && !t.is_completed)
            });
            prop_assert_eq!(is_locked(task, &tasks), expected);
        }
    }

    #[test]
    fn deletion_leaves_no_dangling_dependency(tasks in task_list(), pick in any::<prop::sample::Index>()) {
        let victim = tasks[pick.index(tasks.len())].id.clone();
        let mut board = TaskBoard::new(tasks, vec![], None, None);
        let now = Utc::now();
        board.delete(&victim, now);

        prop_assert!(board.get(&victim).is_none());
        for task in board.tasks() {
            prop_assert!(!task.depends_on.contains(&victim));
        }
    }

    #[test]
    fn estimate_break_counts_add_up(tasks in task_list(), interval in 1u32..8) {
        let settings = Settings { long_break_interval: interval, ..Settings::default() };
        let now = Utc::now();
        let left: u64 = tasks
            .iter()
            .filter(|t| !t.is_completed)
            .map(|t| u64::from(t.estimated_pomos.saturating_sub(t.completed_pomos)))
            .sum();

        match estimate_finish(&tasks, &settings, now) {
            None => prop_assert_eq!(left, 0),
            Some(est) => {
                prop_assert_eq!(est.pomos_left, left);
                prop_assert_eq!(est.short_breaks + est.long_breaks, left - 1);
                prop_assert_eq!(est.long_breaks, (left - 1) / u64::from(interval));
                prop_assert_eq!(est.finish_at, now + Duration::seconds(est.total_secs() as i64));
            }
        }
    }
}

#[test]
fn deleting_incomplete_dependency_unlocks() {
    let a = make_task(0, false, vec![], 2, 0);
    let b = make_task(1, false, vec![0], 2, 0);
    let mut board = TaskBoard::new(vec![a, b], vec![], None, None);
    assert!(!board.set_active("t1"));

    board.delete("t0", Utc::now());
    let b = board.get("t1").unwrap();
    assert!(!board.is_locked(b));
    assert!(board.set_active("t1"));
}

#[test]
fn five_pomos_interval_four() {
    let tasks = vec![make_task(0, false, vec![], 5, 0)];
    let est = estimate_finish(&tasks, &Settings::default(), Utc::now()).unwrap();
    assert_eq!((est.long_breaks, est.short_breaks), (1, 3));
}

#[test]
fn archive_restore_round_trip() {
    let original = Task {
        is_pinned: true,
        ..make_task(0, true, vec![], 3, 3)
    };
    let mut board = TaskBoard::new(vec![original.clone()], vec![], None, None);
    board.archive("t0");
    board.restore("t0");
    let restored = board.get("t0").unwrap();
    assert_eq!(
        restored,
        &Task {
            completed_pomos: 0,
            is_completed: false,
            ..original
        }
    );
}
