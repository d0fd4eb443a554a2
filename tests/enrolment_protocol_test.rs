mod common;

use std::sync::atomic::Ordering;

use sales_backoffice::{
    models::enrolment::EnrolmentState,
    services::{
        polling::{PollConfig, PollSlot},
        provisioning::ProvisioningConfig,
        EnrolmentProtocol,
    },
};

use common::{operator, FakeBackend, TOKEN};

fn provisioning() -> ProvisioningConfig {
    ProvisioningConfig {
        admin_component: "com.financing.agent/.AdminReceiver".into(),
        package_download_url: "https://downloads.example.com/agent.apk".into(),
        package_checksum: "c2hhMjU2".into(),
    }
}

// Intervalo real de 3s com o relógio pausado: as esperas avançam sozinhas
#[tokio::test(start_paused = true)]
async fn resolves_on_the_last_allowed_attempt() {
    let backend = FakeBackend::resolving_after(99);
    let protocol = EnrolmentProtocol::new(backend.clone(), PollConfig::enrolment(), provisioning());
    let mut slot = PollSlot::default();
    let (_, cancel) = slot.begin();

    let state = protocol.run(TOKEN, &operator(), &cancel).await;

    match state {
        Some(EnrolmentState::Resolved { device, .. }) => {
            assert_eq!(device.serial_number, "R58N123ABC");
            assert_eq!(device.imeis.len(), 2);
        }
        other => panic!("esperava Resolved, veio {:?}", other),
    }
    assert_eq!(backend.enrolment_polls.load(Ordering::SeqCst), 100);
}

#[tokio::test(start_paused = true)]
async fn times_out_after_exactly_the_attempt_budget() {
    let backend = FakeBackend::never_resolving();
    let protocol = EnrolmentProtocol::new(backend.clone(), PollConfig::enrolment(), provisioning());
    let mut slot = PollSlot::default();
    let (_, cancel) = slot.begin();

    let state = protocol.run(TOKEN, &operator(), &cancel).await;

    assert!(matches!(state, Some(EnrolmentState::TimedOut { attempts: 100, .. })));
    assert_eq!(backend.count("get_enrolment"), 100);
}

#[tokio::test]
async fn request_failure_becomes_failed_without_polling() {
    let backend = FakeBackend::new();
    backend.fail("create_enrolment");
    let protocol = EnrolmentProtocol::new(backend.clone(), common::fast_poll(5), provisioning());
    let mut slot = PollSlot::default();
    let (_, cancel) = slot.begin();

    let state = protocol.run(TOKEN, &operator(), &cancel).await;

    assert!(matches!(state, Some(EnrolmentState::Failed { .. })));
    assert_eq!(backend.calls(), vec!["create_enrolment"]);
}

#[tokio::test]
async fn request_carries_operator_and_builds_payload() {
    let backend = FakeBackend::new();
    let protocol = EnrolmentProtocol::new(backend.clone(), common::fast_poll(5), provisioning());
    let operator = operator();

    let pending = protocol.request(TOKEN, &operator).await.unwrap();

    let sent = backend.enrolment_requests.lock().unwrap().clone();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].user_id, operator.user_id);
    assert_eq!(sent[0].vendor_id, operator.vendor_id);
    assert_eq!(pending.payload.enrolment_id(), Some(pending.enrolment_id));
    assert_eq!(pending.state().payload(), Some(&pending.payload));
}

#[tokio::test]
async fn cancelled_wait_leaves_state_to_the_canceller() {
    let backend = FakeBackend::never_resolving();
    let protocol = EnrolmentProtocol::new(backend.clone(), common::fast_poll(1_000), provisioning());
    let pending = protocol.request(TOKEN, &operator()).await.unwrap();

    let mut slot = PollSlot::default();
    let (_, cancel) = slot.begin();
    slot.cancel();

    let state = protocol.await_device(TOKEN, pending.enrolment_id, &cancel).await;
    assert_eq!(state, None);
    assert_eq!(backend.count("get_enrolment"), 0);
}

#[tokio::test]
async fn token_is_forwarded_on_every_call() {
    let backend = FakeBackend::resolving_after(3);
    let protocol = EnrolmentProtocol::new(backend.clone(), common::fast_poll(10), provisioning());
    let mut slot = PollSlot::default();
    let (_, cancel) = slot.begin();

    protocol.run(TOKEN, &operator(), &cancel).await;

    let tokens = backend.tokens.lock().unwrap().clone();
    assert_eq!(tokens.len(), 5);
    assert!(tokens.iter().all(|t| t == TOKEN));
}
