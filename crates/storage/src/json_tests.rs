// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use calarm_core::AlarmAction;

fn config(path: &str) -> AlarmConfig {
    AlarmConfig::new(
        AlarmAction::Email,
        path,
        "uid-1",
        "2030-01-09T09:00:00Z".parse().unwrap(),
        "BEGIN:VCALENDAR\r\n",
    )
    .attendee("user1@example.com")
}

#[tokio::test]
async fn rows_survive_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("alarms.json");

    let alarm = {
        let store = JsonAlarmStore::open(&file).unwrap();
        let alarm = store.create(config("/cal/e.ics")).await.unwrap();
        assert!(store.claim(&alarm.id).await.unwrap());
        store.set_state(&alarm.id, AlarmState::Done, None).await.unwrap()
    };

    let reopened = JsonAlarmStore::open(&file).unwrap();
    let loaded = reopened.get(&alarm.id).await.unwrap();
    assert_eq!(loaded.state, AlarmState::Done);
    assert_eq!(loaded.event_path, "/cal/e.ics");
    assert_eq!(loaded.due_date, alarm.due_date);
}

#[tokio::test]
async fn open_missing_file_starts_empty() {
    let dir = tempfile::tempdir().unwrap();
    let store = JsonAlarmStore::open(dir.path().join("none.json")).unwrap();
    let due = store.find_due("2040-01-01T00:00:00Z".parse().unwrap()).await.unwrap();
    assert!(due.is_empty());
}

#[tokio::test]
async fn open_rejects_corrupt_file() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("alarms.json");
    std::fs::write(&file, b"not json").unwrap();
    assert!(matches!(JsonAlarmStore::open(&file), Err(StoreError::Serde(_))));
}

#[tokio::test]
async fn removal_persists() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("alarms.json");

    {
        let store = JsonAlarmStore::open(&file).unwrap();
        store.create(config("/cal/e.ics")).await.unwrap();
        store.create(config("/cal/e.ics")).await.unwrap();
        assert_eq!(store.remove_by_event_path("/cal/e.ics", None).await.unwrap(), 2);
    }

    let reopened = JsonAlarmStore::open(&file).unwrap();
    assert_eq!(reopened.remove_by_event_path("/cal/e.ics", None).await.unwrap(), 0);
}
