// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::dispatch::{AlarmDispatchQueue, FakeJobQueue};
use crate::handler::{FakeHandler, HandlerRegistry};
use calarm_core::{AlarmAction, FakeClock};
use calarm_storage::MemoryAlarmStore;

struct MapConfig(Option<String>);

#[async_trait]
impl ConfigSource for MapConfig {
    async fn get(&self, _key: &str) -> Result<Option<String>, ConfigError> {
        Ok(self.0.clone())
    }
}

struct BrokenConfig;

#[async_trait]
impl ConfigSource for BrokenConfig {
    async fn get(&self, _key: &str) -> Result<Option<String>, ConfigError> {
        Err(ConfigError("backend offline".to_string()))
    }
}

#[tokio::test]
async fn configured_expression_wins() {
    let config = MapConfig(Some("0 */5 * * * *".to_string()));
    assert_eq!(resolve_cron_expression(&config).await, "0 */5 * * * *");
}

#[tokio::test]
async fn unset_key_falls_back_to_default() {
    let config = MapConfig(None);
    assert_eq!(resolve_cron_expression(&config).await, DEFAULT_CRON_EXPRESSION);
}

#[tokio::test]
async fn unreadable_config_falls_back_to_default() {
    let config = BrokenConfig;
    assert_eq!(resolve_cron_expression(&config).await, DEFAULT_CRON_EXPRESSION);
}

fn engine(
    clock: FakeClock,
    handler: FakeHandler,
) -> Arc<AlarmLifecycleEngine<FakeClock>> {
    let mut registry = HandlerRegistry::new();
    registry.register(Arc::new(handler)).unwrap();
    Arc::new(AlarmLifecycleEngine::new(
        Arc::new(MemoryAlarmStore::with_clock(clock.clone())),
        registry,
        AlarmDispatchQueue::new(Arc::new(FakeJobQueue::new())),
        clock,
    ))
}

#[tokio::test]
async fn start_rejects_a_malformed_expression() {
    let clock = FakeClock::new();
    let handler = FakeHandler::new("email-notification", AlarmAction::Email);
    let err = CronScheduler::start(engine(clock, handler), "every tuesday").unwrap_err();
    assert!(matches!(err, SchedulingError::InvalidExpression { .. }));
}

#[tokio::test(start_paused = true)]
async fn scheduler_ticks_and_stops_cleanly() {
    let clock = FakeClock::at("2029-01-01T00:00:00Z".parse().unwrap());
    let handler = FakeHandler::new("email-notification", AlarmAction::Email);
    let engine = engine(clock.clone(), handler.clone());
    engine.initialize().await.unwrap();

    let ics = "BEGIN:VCALENDAR\r\nBEGIN:VEVENT\r\nUID:uid-1\r\n\
DTSTART:20300110T090000Z\r\n\
BEGIN:VALARM\r\nACTION:EMAIL\r\nTRIGGER:-P1D\r\n\
ATTENDEE:mailto:user1@example.com\r\nEND:VALARM\r\n\
END:VEVENT\r\nEND:VCALENDAR\r\n";
    engine.on_event_created("/cal/e.ics", ics).await.unwrap();
    clock.set("2030-01-09T09:00:00Z".parse().unwrap());

    // every-second cadence; paused time auto-advances the sleeps
    let scheduler = CronScheduler::start(Arc::clone(&engine), "* * * * * *").unwrap();
    for _ in 0..200 {
        if !handler.handled().is_empty() {
            break;
        }
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
    }
    scheduler.stop().await;

    assert_eq!(handler.handled().len(), 1);
}
