// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use calarm_core::Alarm;

#[test]
fn handlers_for_unknown_action_is_empty() {
    let registry = HandlerRegistry::new();
    assert!(registry.handlers_for(AlarmAction::Email).is_empty());
}

#[test]
fn register_keeps_order_and_allows_multiple_per_action() {
    let mut registry = HandlerRegistry::new();
    registry.register(Arc::new(FakeHandler::new("email-notification", AlarmAction::Email))).unwrap();
    registry.register(Arc::new(FakeHandler::new("email-debug", AlarmAction::Email))).unwrap();
    registry.register(Arc::new(FakeHandler::new("display", AlarmAction::Display))).unwrap();

    let email = registry.handlers_for(AlarmAction::Email);
    assert_eq!(email.len(), 2);
    assert_eq!(email[0].unique_id(), "email-notification");
    assert_eq!(email[1].unique_id(), "email-debug");
    assert_eq!(registry.handlers_for(AlarmAction::Display).len(), 1);
    assert_eq!(registry.all().len(), 3);
}

#[test]
fn register_rejects_empty_unique_id() {
    let mut registry = HandlerRegistry::new();
    let err = registry.register(Arc::new(FakeHandler::new("", AlarmAction::Email))).unwrap_err();
    assert!(matches!(err, EngineError::InvalidHandler(_)));
}

#[test]
fn register_rejects_duplicate_id_per_action() {
    let mut registry = HandlerRegistry::new();
    registry.register(Arc::new(FakeHandler::new("h1", AlarmAction::Email))).unwrap();
    let err = registry.register(Arc::new(FakeHandler::new("h1", AlarmAction::Email))).unwrap_err();
    assert!(matches!(err, EngineError::InvalidHandler(_)));

    // same id under a different action is a different worker
    registry.register(Arc::new(FakeHandler::new("h1", AlarmAction::Display))).unwrap();
}

#[tokio::test]
async fn fake_handler_records_and_fails_on_demand() {
    let handler = FakeHandler::new("h", AlarmAction::Email);
    let alarm = Alarm::builder().build();

    handler.handle(&alarm).await.unwrap();
    assert_eq!(handler.handled(), vec![alarm.id.clone()]);

    handler.fail_with("boom");
    let err = handler.handle(&alarm).await.unwrap_err();
    assert_eq!(err, HandlerError::Failed("boom".to_string()));
    assert_eq!(handler.handled().len(), 2);
}
