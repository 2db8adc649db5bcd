//! End-to-end scheduling tests: persistence snapshot in, conflict-free
//! study blocks out.

use chrono::{DateTime, Datelike, Duration, TimeZone, Timelike, Utc};
use studyplan_core::{
    BlockKind, Course, CourseSession, Event, EventKind, PlannerDb, Preferences, Scheduler,
    SessionKind, Task, TaskKind, TaskStatus, TimeBlock,
};

// 2026-03-02 is a Monday.
fn fixed_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 2, 8, 0, 0).unwrap()
}

fn make_task(id: &str, kind: TaskKind, due_in_days: i64, hours: f64) -> Task {
    Task {
        id: id.to_string(),
        title: format!("Task {id}"),
        kind,
        course_id: "c1".to_string(),
        due_date: fixed_now() + Duration::days(due_in_days),
        difficulty: 3,
        estimated_hours: hours,
        is_hard_deadline: false,
        buffer_days: Some(1),
        status: TaskStatus::NotStarted,
        description: None,
        created_at: fixed_now(),
    }
}

fn overlapping(a: &TimeBlock, b: &TimeBlock) -> bool {
    a.start_time < b.end_time && b.start_time < a.end_time
}

#[test]
fn full_run_avoids_courses_events_and_itself() {
    let prefs = Preferences::default();
    let courses = vec![Course {
        id: "c1".to_string(),
        name: "Pathophysiology".to_string(),
        code: "NUR301".to_string(),
        color: None,
        credits: 3,
        sessions: vec![
            // Monday and Wednesday lectures, 0=Sunday convention.
            CourseSession {
                day_of_week: 1,
                start_time: "10:00".to_string(),
                end_time: "12:00".to_string(),
                kind: SessionKind::Lecture,
                room: None,
            },
            CourseSession {
                day_of_week: 3,
                start_time: "10:00".to_string(),
                end_time: "12:00".to_string(),
                kind: SessionKind::Lecture,
                room: None,
            },
        ],
    }];
    let events = vec![Event {
        id: "e1".to_string(),
        title: "Skills lab".to_string(),
        kind: EventKind::Lab,
        course_id: Some("c1".to_string()),
        start_time: fixed_now() + Duration::days(1) + Duration::hours(5),
        end_time: fixed_now() + Duration::days(1) + Duration::hours(9),
        location: None,
        task_id: None,
    }];
    let tasks = vec![
        make_task("a", TaskKind::Exam, 7, 8.0),
        make_task("b", TaskKind::Assignment, 5, 6.0),
        make_task("c", TaskKind::Reading, 4, 3.0),
    ];

    let mut scheduler = Scheduler::new(&courses, &events, &prefs, fixed_now()).unwrap();
    let outcome = scheduler.reschedule_all(&tasks);
    assert!(!outcome.blocks.is_empty());
    assert!(outcome.failed_task_ids.is_empty());

    for (i, a) in outcome.blocks.iter().enumerate() {
        // No block collides with another block.
        for b in &outcome.blocks[i + 1..] {
            assert!(!overlapping(a, b), "{a:?} overlaps {b:?}");
        }
        // No block collides with a fixed commitment.
        for event in &events {
            assert!(a.end_time <= event.start_time || a.start_time >= event.end_time);
        }
        let weekday = a.start_time.weekday().num_days_from_sunday();
        if weekday == 1 || weekday == 3 {
            let lecture_start = a
                .start_time
                .date_naive()
                .and_hms_opt(10, 0, 0)
                .unwrap()
                .and_utc();
            let lecture_end = lecture_start + Duration::hours(2);
            assert!(a.end_time <= lecture_start || a.start_time >= lecture_end);
        }
        // Every block sits inside the study window and is marked generated.
        assert!(a.start_time.hour() >= 9);
        assert!(a.end_time.hour() <= 22 || (a.end_time.hour() == 22 && a.end_time.minute() == 0));
        assert!(!a.is_manual);
    }
}

#[test]
fn effort_is_conserved_but_never_exceeded() {
    let prefs = Preferences::default();
    let tasks = vec![make_task("a", TaskKind::Project, 12, 9.0)];
    let mut scheduler = Scheduler::new(&[], &[], &prefs, fixed_now()).unwrap();
    let outcome = scheduler.reschedule_all(&tasks);

    let study_minutes: i64 = outcome
        .blocks
        .iter()
        .filter(|b| b.kind == BlockKind::Study)
        .map(|b| b.duration_minutes())
        .sum();
    assert_eq!(study_minutes, 9 * 60);
    assert_eq!(outcome.summaries[0].shortfall_hours(), 0.0);
}

#[test]
fn default_exam_estimate_matches_difficulty_scaling() {
    // Exam due in ten days, difficulty 5, no explicit estimate: 10h base
    // doubled to 20h, finished a week early by default.
    let prefs = Preferences::default();
    let mut task = make_task("exam", TaskKind::Exam, 10, 0.0);
    task.difficulty = 5;
    task.buffer_days = None;

    let mut scheduler = Scheduler::new(&[], &[], &prefs, fixed_now()).unwrap();
    let schedule = scheduler.schedule_task(&task).unwrap();
    let summary = schedule.summary.unwrap();
    assert_eq!(summary.required_hours, 20.0);
    // Half-hour alignment can strand a sub-minimum sliver at the tail, so
    // allow a small shortfall but require the bulk to be placed.
    assert!(summary.scheduled_hours > 19.0);
    assert!(summary.scheduled_hours <= 20.0);

    let soft_limit = (task.due_date - Duration::days(7)).date_naive();
    for block in schedule.blocks.iter().filter(|b| b.kind == BlockKind::Study) {
        assert!(block.start_time.date_naive() <= soft_limit);
    }
    // Review sessions are the exception: they sit right before the exam.
    let reviews: Vec<_> = schedule
        .blocks
        .iter()
        .filter(|b| b.kind == BlockKind::Review)
        .collect();
    assert_eq!(reviews.len(), 2);
    for review in reviews {
        assert!(review.start_time.date_naive() > soft_limit);
        assert!(review.end_time <= task.due_date);
    }
}

#[test]
fn tight_deadline_is_under_scheduled_not_rejected() {
    let prefs = Preferences::default();
    // Six hours due tomorrow morning: the single evening cannot hold it.
    let mut task = make_task("cram", TaskKind::Assignment, 1, 6.0);
    task.due_date = fixed_now() + Duration::hours(26);

    let mut scheduler = Scheduler::new(&[], &[], &prefs, fixed_now()).unwrap();
    let schedule = scheduler.schedule_task(&task).unwrap();
    let summary = schedule.summary.unwrap();
    assert!(summary.scheduled_hours > 0.0);
    assert!(summary.shortfall_hours() > 0.0);
    for block in &schedule.blocks {
        assert!(block.end_time <= task.due_date);
    }
}

#[test]
fn sooner_due_task_claims_the_earlier_slots() {
    let prefs = Preferences::default();
    let tasks = vec![
        make_task("later", TaskKind::Assignment, 9, 4.0),
        make_task("sooner", TaskKind::Assignment, 3, 4.0),
    ];
    let mut scheduler = Scheduler::new(&[], &[], &prefs, fixed_now()).unwrap();
    let outcome = scheduler.reschedule_all(&tasks);

    let earliest = |task_id: &str| {
        outcome
            .blocks
            .iter()
            .filter(|b| b.task_id == task_id)
            .map(|b| b.start_time)
            .min()
            .unwrap()
    };
    assert!(earliest("sooner") <= earliest("later"));
}

#[test]
fn rescheduling_is_idempotent_for_a_fixed_clock() {
    let prefs = Preferences::default();
    let tasks = vec![
        make_task("a", TaskKind::Exam, 8, 6.0),
        make_task("b", TaskKind::Reading, 5, 2.0),
        make_task("c", TaskKind::Project, 14, 10.0),
    ];

    let run = || {
        let mut scheduler = Scheduler::new(&[], &[], &prefs, fixed_now()).unwrap();
        let mut shape: Vec<(String, DateTime<Utc>, DateTime<Utc>)> = scheduler
            .reschedule_all(&tasks)
            .blocks
            .into_iter()
            .map(|b| (b.task_id, b.start_time, b.end_time))
            .collect();
        shape.sort();
        shape
    };
    assert_eq!(run(), run());
}

#[test]
fn persisted_manual_blocks_survive_a_rerun() {
    let dir = tempfile::tempdir().unwrap();
    let mut db = PlannerDb::open_at(&dir.path().join("studyplan.db")).unwrap();
    let prefs = Preferences::default();

    let task = make_task("t1", TaskKind::Assignment, 5, 4.0);
    db.upsert_task(&task).unwrap();

    let mut manual = TimeBlock::generated(
        "t1",
        fixed_now() + Duration::hours(2),
        fixed_now() + Duration::hours(4),
        BlockKind::Study,
    );
    manual.is_manual = true;
    db.insert_block(&manual).unwrap();

    // First run.
    let tasks = db.list_tasks().unwrap();
    let manual_blocks: Vec<TimeBlock> = db
        .list_blocks()
        .unwrap()
        .into_iter()
        .filter(|b| b.is_manual)
        .collect();
    let mut scheduler = Scheduler::new(&[], &[], &prefs, fixed_now()).unwrap();
    scheduler.reserve(&manual_blocks);
    let outcome = scheduler.reschedule_all(&tasks);
    db.replace_generated_blocks(&outcome.blocks, &outcome.failed_task_ids)
        .unwrap();

    // Second run over the stored state.
    let manual_blocks: Vec<TimeBlock> = db
        .list_blocks()
        .unwrap()
        .into_iter()
        .filter(|b| b.is_manual)
        .collect();
    assert_eq!(manual_blocks.len(), 1);
    let mut scheduler = Scheduler::new(&[], &[], &prefs, fixed_now()).unwrap();
    scheduler.reserve(&manual_blocks);
    let outcome = scheduler.reschedule_all(&tasks);
    db.replace_generated_blocks(&outcome.blocks, &outcome.failed_task_ids)
        .unwrap();

    let blocks = db.list_blocks().unwrap();
    let kept: Vec<_> = blocks.iter().filter(|b| b.is_manual).collect();
    assert_eq!(kept.len(), 1);
    assert_eq!(kept[0].id, manual.id);
    for block in blocks.iter().filter(|b| !b.is_manual) {
        assert!(!overlapping(block, &manual));
    }
}

#[test]
fn completed_tasks_get_no_blocks() {
    let prefs = Preferences::default();
    let mut done = make_task("done", TaskKind::Exam, 6, 8.0);
    done.status = TaskStatus::Completed;
    let open = make_task("open", TaskKind::Reading, 6, 2.0);

    let mut scheduler = Scheduler::new(&[], &[], &prefs, fixed_now()).unwrap();
    let outcome = scheduler.reschedule_all(&[done, open]);
    assert!(outcome.blocks.iter().all(|b| b.task_id == "open"));
    assert_eq!(outcome.summaries.len(), 1);
}

#[test]
fn clinical_days_hold_no_study_blocks() {
    let prefs = Preferences::default();
    // Falls inside the exam's scheduling window.
    let clinical_day = fixed_now() + Duration::days(5);
    let events = vec![Event {
        id: "e1".to_string(),
        title: "Clinical rotation".to_string(),
        kind: EventKind::Clinical,
        course_id: None,
        start_time: clinical_day,
        end_time: clinical_day + Duration::hours(10),
        location: Some("County General".to_string()),
        task_id: None,
    }];
    let tasks = vec![make_task("a", TaskKind::Exam, 6, 10.0)];

    let mut scheduler = Scheduler::new(&[], &events, &prefs, fixed_now()).unwrap();
    let outcome = scheduler.reschedule_all(&tasks);
    assert!(!outcome.blocks.is_empty());
    for block in &outcome.blocks {
        assert_ne!(block.start_time.date_naive(), clinical_day.date_naive());
    }
}
