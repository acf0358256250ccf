//! Deferral grant integration tests, including the concurrent-grant race.

mod common;

use std::sync::Arc;

use common::{annual_type, balance, ctx, sick_type};
use furlough_core::leave::LeaveError;
use furlough_jobs::JobError;
use furlough_jobs::deferral::grant;
use furlough_shared::types::EmployeeId;
use furlough_store::LeaveStore;
use furlough_store::memory::InMemoryStore;

#[tokio::test]
async fn test_grant_writes_log_and_deferred_pool() {
    let store = Arc::new(InMemoryStore::new());
    let lt = annual_type();
    let employee = EmployeeId::new();
    let target = balance(employee, &lt, 2026, 20, 0, 0);
    let target_id = target.id;
    store.seed_leave_type(lt.clone());
    store.seed_balance(target);

    let context = ctx(store.clone());
    let log = grant(&context, employee, lt.id, 2025, 5).await.unwrap();

    assert_eq!(log.from_year, 2025);
    assert_eq!(log.days, 5);
    assert_eq!(store.balance(target_id).unwrap().deferred_days, 5);
}

#[tokio::test]
async fn test_grant_creates_missing_target_row_from_defaults() {
    let store = Arc::new(InMemoryStore::new());
    let lt = annual_type();
    let employee = EmployeeId::new();
    store.seed_leave_type(lt.clone());

    let context = ctx(store.clone());
    grant(&context, employee, lt.id, 2025, 7).await.unwrap();

    let created = context
        .store
        .find_balance(employee, lt.id, 2026)
        .await
        .unwrap()
        .expect("target row should exist");
    assert_eq!(created.total_days, lt.default_days);
    assert_eq!(created.deferred_days, 7);
    assert_eq!(created.used_days, 0);
}

#[tokio::test]
async fn test_second_grant_fails_and_leaves_pool_unchanged() {
    let store = Arc::new(InMemoryStore::new());
    let lt = annual_type();
    let employee = EmployeeId::new();
    let target = balance(employee, &lt, 2026, 20, 0, 0);
    let target_id = target.id;
    store.seed_leave_type(lt.clone());
    store.seed_balance(target);

    let context = ctx(store.clone());
    grant(&context, employee, lt.id, 2025, 5).await.unwrap();
    let second = grant(&context, employee, lt.id, 2025, 9).await;

    assert!(matches!(
        second,
        Err(JobError::AlreadyDeferred { from_year: 2025, .. })
    ));
    assert_eq!(store.balance(target_id).unwrap().deferred_days, 5);
}

#[tokio::test]
async fn test_concurrent_grants_have_one_winner() {
    let store = Arc::new(InMemoryStore::new());
    let lt = annual_type();
    let employee = EmployeeId::new();
    store.seed_leave_type(lt.clone());
    store.seed_balance(balance(employee, &lt, 2026, 20, 0, 0));

    let context = ctx(store.clone());
    let (first, second) = tokio::join!(
        grant(&context, employee, lt.id, 2025, 4),
        grant(&context, employee, lt.id, 2025, 6),
    );

    let winners = [&first, &second].iter().filter(|r| r.is_ok()).count();
    assert_eq!(winners, 1);

    let loser = if first.is_ok() { second } else { first };
    assert!(matches!(loser, Err(JobError::AlreadyDeferred { .. })));

    let log = context
        .store
        .find_deferral(employee, 2025)
        .await
        .unwrap()
        .expect("exactly one log row");
    let pool = context
        .store
        .find_balance(employee, lt.id, 2026)
        .await
        .unwrap()
        .unwrap()
        .deferred_days;
    assert_eq!(pool, log.days);
}

#[tokio::test]
async fn test_grant_requires_deferrable_leave_type() {
    let store = Arc::new(InMemoryStore::new());
    let lt = sick_type();
    store.seed_leave_type(lt.clone());

    let context = ctx(store);
    let result = grant(&context, EmployeeId::new(), lt.id, 2025, 3).await;

    assert!(matches!(
        result,
        Err(JobError::Validation(LeaveError::DeferralNotAllowed(_)))
    ));
}

#[tokio::test]
async fn test_grant_rejects_non_positive_days() {
    let store = Arc::new(InMemoryStore::new());
    let lt = annual_type();
    store.seed_leave_type(lt.clone());

    let context = ctx(store);
    let result = grant(&context, EmployeeId::new(), lt.id, 2025, 0).await;

    assert!(matches!(
        result,
        Err(JobError::Validation(LeaveError::InvalidDays(0)))
    ));
}

#[tokio::test]
async fn test_grant_requires_known_leave_type() {
    let store = Arc::new(InMemoryStore::new());
    let context = ctx(store);

    let result = grant(
        &context,
        EmployeeId::new(),
        furlough_shared::types::LeaveTypeId::new(),
        2025,
        3,
    )
    .await;

    assert!(matches!(result, Err(JobError::NotFound(_))));
}
