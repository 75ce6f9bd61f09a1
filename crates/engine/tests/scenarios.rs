//! End-to-end lifecycle scenarios over the in-memory backend.

use std::collections::BTreeMap;
use std::sync::Arc;

use time::macros::datetime;
use time::OffsetDateTime;

use convene_core::{
    Actor, Agency, AgencyRights, AgencyRole, Convention, ConventionStatus, Credential,
    DomainError, EventTopicTable, FixedClock, Role, Signatories, TransitionPolicy, User,
};
use convene_engine::{EditInput, Engine, EngineError, SignInput, TransferInput, UpdateStatusInput};
use convene_links::{decode_signing_key, generate_keypair, CapabilityTokenIssuer, LinkConfig};
use convene_storage::{
    AgencyRepository, AssessmentRecord, AssessmentRepository, ConventionRepository,
    InMemoryStore, NotificationRecord, NotificationRepository, OutboxRepository, Recipient,
    StorageError, UserRepository,
};

const T0: OffsetDateTime = datetime!(2024-03-01 09:00 UTC);
const T1: OffsetDateTime = datetime!(2024-03-02 10:00 UTC);

fn actor(role: Role, email: &str) -> Actor {
    Actor {
        role,
        email: email.to_string(),
        phone: Some("0612345678".to_string()),
        first_name: "Test".to_string(),
        last_name: role.as_str().to_string(),
        signed_at: None,
    }
}

fn convention(id: &str, agency_id: &str) -> Convention {
    Convention {
        id: id.to_string(),
        status: ConventionStatus::ReadyToSign,
        agency_id: agency_id.to_string(),
        signatories: Signatories {
            beneficiary: actor(Role::Beneficiary, "bob@beneficiary.example"),
            establishment_representative: actor(
                Role::EstablishmentRepresentative,
                "rep@establishment.example",
            ),
            beneficiary_representative: None,
            beneficiary_current_employer: None,
        },
        establishment_tutor: actor(Role::EstablishmentTutor, "tutor@establishment.example"),
        updated_at: T0,
        status_justification: None,
        date_approval: None,
        date_validation: None,
        agency_counsellor: None,
        agency_validator: None,
    }
}

fn agency(id: &str, refers_to: Option<&str>) -> Agency {
    Agency {
        id: id.to_string(),
        name: "Mission locale".to_string(),
        refers_to_agency_id: refers_to.map(str::to_owned),
        user_rights: BTreeMap::new(),
    }
}

fn agency_user(id: &str, agency_id: &str, roles: Vec<AgencyRole>) -> User {
    let mut user = User {
        id: id.to_string(),
        email: format!("{id}@agency.example"),
        first_name: "Val".to_string(),
        last_name: "Idator".to_string(),
        is_backoffice_admin: false,
        agency_rights: BTreeMap::new(),
    };
    user.agency_rights.insert(
        agency_id.to_string(),
        AgencyRights {
            roles,
            is_notified_by_email: true,
        },
    );
    user
}

fn link(convention_id: &str, role: Role, email: &str) -> Credential {
    Credential::ConventionMagicLink {
        convention_id: convention_id.to_string(),
        role,
        email: email.to_string(),
    }
}

async fn engine_at(now: OffsetDateTime) -> (Engine<InMemoryStore>, Arc<InMemoryStore>) {
    let store = Arc::new(InMemoryStore::new());
    store.insert(&convention("conv-1", "agency-1")).await.unwrap();
    store.insert_agency(&agency("agency-1", None)).await.unwrap();

    let keypair = generate_keypair();
    let tokens = CapabilityTokenIssuer::new(
        decode_signing_key(&keypair.secret_b64).unwrap(),
        LinkConfig::default(),
    );
    let engine = Engine::new(
        Arc::clone(&store),
        Arc::new(FixedClock(now)),
        tokens,
        TransitionPolicy::default(),
        EventTopicTable::default(),
    );
    (engine, store)
}

// ── Scenario A: full signing flow ────────────────────────────────────

#[tokio::test]
async fn both_signatures_walk_the_convention_into_review() {
    let (engine, store) = engine_at(T1).await;

    let outcome = engine
        .sign(
            SignInput {
                convention_id: "conv-1".to_string(),
            },
            &link("conv-1", Role::Beneficiary, "bob@beneficiary.example"),
        )
        .await
        .unwrap();
    assert_eq!(outcome.status, ConventionStatus::PartiallySigned);

    let outcome = engine
        .sign(
            SignInput {
                convention_id: "conv-1".to_string(),
            },
            &link(
                "conv-1",
                Role::EstablishmentRepresentative,
                "rep@establishment.example",
            ),
        )
        .await
        .unwrap();
    assert_eq!(outcome.status, ConventionStatus::InReview);

    let stored = store.get_by_id("conv-1").await.unwrap().unwrap();
    assert_eq!(stored.status, ConventionStatus::InReview);
    assert!(stored.signatories.all_signed());

    // Exactly one fully-signed event, carrying the updated convention.
    let events = store.pending_events().await.unwrap();
    let fully_signed: Vec<_> = events
        .iter()
        .filter(|e| e.topic == "ConventionFullySigned")
        .collect();
    assert_eq!(fully_signed.len(), 1);
    assert_eq!(
        fully_signed[0].payload["convention"]["status"],
        "IN_REVIEW"
    );
    assert_eq!(
        events.iter().filter(|e| e.topic == "ConventionPartiallySigned").count(),
        1
    );
}

// ── Scenario B: stranger cannot update status ────────────────────────

#[tokio::test]
async fn user_without_rights_is_rejected_before_any_write() {
    let (engine, store) = engine_at(T1).await;
    store
        .insert_user(&User {
            id: "stranger".to_string(),
            email: "stranger@nowhere.example".to_string(),
            first_name: "No".to_string(),
            last_name: "Body".to_string(),
            is_backoffice_admin: false,
            agency_rights: BTreeMap::new(),
        })
        .await
        .unwrap();

    let err = engine
        .update_status(
            UpdateStatusInput {
                convention_id: "conv-1".to_string(),
                target: ConventionStatus::Rejected,
                justification: Some("nope".to_string()),
            },
            &Credential::ConnectedUser {
                user_id: "stranger".to_string(),
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        EngineError::Domain(DomainError::NoRightsOnAgency { .. })
    ));

    // Nothing was written.
    let stored = store.get_by_id("conv-1").await.unwrap().unwrap();
    assert_eq!(stored.status, ConventionStatus::ReadyToSign);
    assert_eq!(stored.updated_at, T0);
    assert!(store.pending_events().await.unwrap().is_empty());
}

// ── Scenario C: cross-convention token ───────────────────────────────

#[tokio::test]
async fn token_for_another_convention_is_forbidden() {
    let (engine, _store) = engine_at(T1).await;
    let err = engine
        .sign(
            SignInput {
                convention_id: "conv-1".to_string(),
            },
            &link("conv-other", Role::Beneficiary, "bob@beneficiary.example"),
        )
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        EngineError::Domain(DomainError::ForbiddenMissingRights { .. })
    ));
}

// ── Scenario D: cancellation blocked by assessment ───────────────────

#[tokio::test]
async fn cancellation_is_blocked_once_an_assessment_exists() {
    let (engine, store) = engine_at(T1).await;

    let mut validated = convention("conv-1", "agency-1");
    validated.status = ConventionStatus::AcceptedByValidator;
    validated.updated_at = T0;
    store.insert(&validated).await.unwrap();
    store
        .insert_user(&agency_user("val-1", "agency-1", vec![AgencyRole::Validator]))
        .await
        .unwrap();
    store
        .insert_assessment(&AssessmentRecord {
            convention_id: "conv-1".to_string(),
            created_at: "2024-03-01T12:00:00Z".to_string(),
        })
        .await
        .unwrap();

    let err = engine
        .update_status(
            UpdateStatusInput {
                convention_id: "conv-1".to_string(),
                target: ConventionStatus::Cancelled,
                justification: Some("employer closed".to_string()),
            },
            &Credential::ConnectedUser {
                user_id: "val-1".to_string(),
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        EngineError::Domain(DomainError::CancellationBlockedByAssessment { .. })
    ));
}

// ── Scenario E: optimistic concurrency ───────────────────────────────

#[tokio::test]
async fn stale_writer_conflicts_and_winner_sticks() {
    let (engine, store) = engine_at(T1).await;
    let original = store.get_by_id("conv-1").await.unwrap().unwrap();

    let mut fresh_signatories = original.signatories.clone();
    fresh_signatories.beneficiary.first_name = "Robert".to_string();
    let first = EditInput {
        convention_id: "conv-1".to_string(),
        expected_updated_at: original.updated_at,
        edit: convene_engine::ConventionEdit {
            signatories: fresh_signatories.clone(),
            establishment_tutor: original.establishment_tutor.clone(),
        },
    };
    engine
        .edit(
            first,
            &link("conv-1", Role::Beneficiary, "bob@beneficiary.example"),
        )
        .await
        .unwrap();

    // Second writer still presents the pre-edit updated_at.
    let mut rival_signatories = original.signatories.clone();
    rival_signatories.beneficiary.first_name = "Bobby".to_string();
    let second = EditInput {
        convention_id: "conv-1".to_string(),
        expected_updated_at: original.updated_at,
        edit: convene_engine::ConventionEdit {
            signatories: rival_signatories,
            establishment_tutor: original.establishment_tutor.clone(),
        },
    };
    let err = engine
        .edit(
            second,
            &link("conv-1", Role::Beneficiary, "bob@beneficiary.example"),
        )
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        EngineError::Storage(StorageError::ConcurrentConflict { .. })
    ));

    let stored = store.get_by_id("conv-1").await.unwrap().unwrap();
    assert_eq!(stored.signatories.beneficiary.first_name, "Robert");
}

// ── Agency decisions ─────────────────────────────────────────────────

#[tokio::test]
async fn validator_acceptance_stamps_dates_names_and_event() {
    let (engine, store) = engine_at(T1).await;
    let mut in_review = convention("conv-1", "agency-1");
    in_review.status = ConventionStatus::InReview;
    store.insert(&in_review).await.unwrap();
    store
        .insert_user(&agency_user("val-1", "agency-1", vec![AgencyRole::Validator]))
        .await
        .unwrap();

    engine
        .update_status(
            UpdateStatusInput {
                convention_id: "conv-1".to_string(),
                target: ConventionStatus::AcceptedByValidator,
                justification: None,
            },
            &Credential::ConnectedUser {
                user_id: "val-1".to_string(),
            },
        )
        .await
        .unwrap();

    let stored = store.get_by_id("conv-1").await.unwrap().unwrap();
    assert_eq!(stored.status, ConventionStatus::AcceptedByValidator);
    assert_eq!(stored.date_validation, Some(T1));
    assert_eq!(stored.updated_at, T1);
    assert_eq!(
        stored.agency_validator.as_ref().map(|n| n.last_name.as_str()),
        Some("Idator")
    );

    let events = store.pending_events().await.unwrap();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].topic, "ConventionAcceptedByValidator");
    // Event time equals entity time.
    assert_eq!(events[0].occurred_at, "2024-03-02T10:00:00Z");
}

#[tokio::test]
async fn rejection_requires_a_justification() {
    let (engine, store) = engine_at(T1).await;
    let mut in_review = convention("conv-1", "agency-1");
    in_review.status = ConventionStatus::InReview;
    store.insert(&in_review).await.unwrap();
    store
        .insert_user(&agency_user("c-1", "agency-1", vec![AgencyRole::Counsellor]))
        .await
        .unwrap();

    let err = engine
        .update_status(
            UpdateStatusInput {
                convention_id: "conv-1".to_string(),
                target: ConventionStatus::Rejected,
                justification: None,
            },
            &Credential::ConnectedUser {
                user_id: "c-1".to_string(),
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        EngineError::Domain(DomainError::MissingJustification { .. })
    ));
}

// ── Transfer ─────────────────────────────────────────────────────────

#[tokio::test]
async fn delegating_agency_transfer_refuses_validators() {
    let (engine, store) = engine_at(T1).await;
    store
        .insert_agency(&agency("agency-delegating", Some("agency-parent")))
        .await
        .unwrap();
    store.insert_agency(&agency("agency-2", None)).await.unwrap();

    let mut conv = convention("conv-1", "agency-delegating");
    conv.status = ConventionStatus::InReview;
    store.insert(&conv).await.unwrap();

    store
        .insert_user(&agency_user(
            "val-1",
            "agency-delegating",
            vec![AgencyRole::Validator],
        ))
        .await
        .unwrap();
    store
        .insert_user(&agency_user(
            "c-1",
            "agency-delegating",
            vec![AgencyRole::Counsellor],
        ))
        .await
        .unwrap();

    let input = TransferInput {
        convention_id: "conv-1".to_string(),
        target_agency_id: "agency-2".to_string(),
    };
    let err = engine
        .transfer_to_agency(
            input.clone(),
            &Credential::ConnectedUser {
                user_id: "val-1".to_string(),
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        EngineError::Domain(DomainError::TransferNotAllowedForDelegatingAgency { .. })
    ));

    engine
        .transfer_to_agency(
            input,
            &Credential::ConnectedUser {
                user_id: "c-1".to_string(),
            },
        )
        .await
        .unwrap();
    let stored = store.get_by_id("conv-1").await.unwrap().unwrap();
    assert_eq!(stored.agency_id, "agency-2");

    let events = store.pending_events().await.unwrap();
    assert_eq!(events.last().map(|e| e.topic.as_str()), Some("ConventionTransferredToAgency"));
}

// ── Fan-out ──────────────────────────────────────────────────────────

#[tokio::test]
async fn reminder_fan_out_throttles_one_recipient_without_blocking_the_other() {
    let (engine, store) = engine_at(T1).await;

    // Bob already got a reminder two hours ago; the representative
    // never did.
    store
        .save_notification(&NotificationRecord {
            id: "n1".to_string(),
            kind: convene_engine::SIGNATURE_REMINDER_KIND.to_string(),
            convention_id: "conv-1".to_string(),
            recipient: Recipient::Email("bob@beneficiary.example".to_string()),
            created_at: "2024-03-02T08:00:00Z".to_string(),
        })
        .await
        .unwrap();

    let report = engine
        .send_signature_reminders(
            "conv-1",
            &link("conv-1", Role::Beneficiary, "bob@beneficiary.example"),
            24,
        )
        .await
        .unwrap();

    assert_eq!(report.sent.len(), 1);
    assert_eq!(report.sent[0].email, "rep@establishment.example");
    assert!(report.sent[0].short_url.is_some(), "phone present, SMS short link expected");
    let bob_error = report
        .errors
        .get("bob@beneficiary.example")
        .expect("bob should be throttled");
    assert!(bob_error.contains("22h00"), "remaining wait in message: {bob_error}");
}

#[tokio::test]
async fn signature_links_go_to_every_unsigned_signatory() {
    let (engine, store) = engine_at(T1).await;
    let report = engine
        .send_signature_links(
            "conv-1",
            &link("conv-1", Role::Beneficiary, "bob@beneficiary.example"),
        )
        .await
        .unwrap();
    assert_eq!(report.sent.len(), 2);
    assert!(report.errors.is_empty());
    for sent in &report.sent {
        assert!(sent.long_url.contains("signer-convention?jwt="));
    }

    // Email + SMS notification recorded per recipient.
    let last = store
        .last_of_kind(
            convene_engine::SIGNATURE_LINK_KIND,
            "conv-1",
            &Recipient::Email("rep@establishment.example".to_string()),
        )
        .await
        .unwrap();
    assert!(last.is_some());
}

// ── Edit ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn edit_resets_signatures_and_returns_to_ready_to_sign() {
    let (engine, store) = engine_at(T1).await;

    // Beneficiary signs first.
    engine
        .sign(
            SignInput {
                convention_id: "conv-1".to_string(),
            },
            &link("conv-1", Role::Beneficiary, "bob@beneficiary.example"),
        )
        .await
        .unwrap();
    let signed = store.get_by_id("conv-1").await.unwrap().unwrap();
    assert_eq!(signed.status, ConventionStatus::PartiallySigned);

    let mut edited = signed.signatories.clone();
    edited.beneficiary.phone = Some("0798765432".to_string());
    engine
        .edit(
            EditInput {
                convention_id: "conv-1".to_string(),
                expected_updated_at: signed.updated_at,
                edit: convene_engine::ConventionEdit {
                    signatories: edited,
                    establishment_tutor: signed.establishment_tutor.clone(),
                },
            },
            &link("conv-1", Role::Beneficiary, "bob@beneficiary.example"),
        )
        .await
        .unwrap();

    let stored = store.get_by_id("conv-1").await.unwrap().unwrap();
    assert_eq!(stored.status, ConventionStatus::ReadyToSign);
    assert!(stored.signatories.unsigned().len() == 2);
    assert_eq!(
        stored.signatories.beneficiary.phone.as_deref(),
        Some("0798765432")
    );

    // Re-entry into READY_TO_SIGN publishes nothing: only the earlier
    // partially-signed event is queued.
    let events = store.pending_events().await.unwrap();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].topic, "ConventionPartiallySigned");
}

// ── Token authentication ─────────────────────────────────────────────

#[tokio::test]
async fn magic_link_token_authenticates_and_signs() {
    let (engine, _store) = engine_at(T1).await;

    let token = engine.tokens().issue_for_convention(
        "conv-1",
        Role::Beneficiary,
        "bob@beneficiary.example",
        "signer-convention",
        convene_links::LinkLifetime::Short,
        T0,
    );
    let credential = engine.authenticate(&token).await.unwrap();
    assert!(matches!(
        credential,
        Credential::ConventionMagicLink {
            role: Role::Beneficiary,
            ..
        }
    ));

    let outcome = engine
        .sign(
            SignInput {
                convention_id: "conv-1".to_string(),
            },
            &credential,
        )
        .await
        .unwrap();
    assert_eq!(outcome.status, ConventionStatus::PartiallySigned);
}

#[tokio::test]
async fn connected_user_token_requires_a_live_account() {
    let (engine, store) = engine_at(T1).await;

    let token =
        engine
            .tokens()
            .issue_for_user("user-1", "agency-dashboard", convene_links::LinkLifetime::Long, T0);

    // Account does not exist yet.
    let err = engine.authenticate(&token).await.unwrap_err();
    assert!(matches!(
        err,
        EngineError::Domain(DomainError::UserNotFound { .. })
    ));

    store
        .insert_user(&agency_user("user-1", "agency-1", vec![AgencyRole::Counsellor]))
        .await
        .unwrap();
    let credential = engine.authenticate(&token).await.unwrap();
    assert_eq!(
        credential,
        Credential::ConnectedUser {
            user_id: "user-1".to_string()
        }
    );
}

#[tokio::test]
async fn expired_token_cannot_authenticate() {
    let (engine, _store) = engine_at(T1).await;
    // Minted 40 days before "now" with a 31-day long lifetime.
    let minted_at = datetime!(2024-01-22 10:00 UTC);
    let token = engine.tokens().issue_for_convention(
        "conv-1",
        Role::Beneficiary,
        "bob@beneficiary.example",
        "signer-convention",
        convene_links::LinkLifetime::Long,
        minted_at,
    );
    let err = engine.authenticate(&token).await.unwrap_err();
    assert!(matches!(
        err,
        EngineError::Link(convene_links::LinkError::Expired { .. })
    ));
}
