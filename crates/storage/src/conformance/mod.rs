//! Conformance test suite for convention storage backends.
//!
//! Backend-agnostic: any type implementing the repository traits can run
//! the suite to verify it honors the contracts the engine relies on:
//!
//! - **conventions**: typed absence on unknown ids, OCC conflict on a
//!   stale `updated_at`, read-model agency join
//! - **shortlinks**: write-once ids, single-use redemption
//! - **notifications**: most-recent-of-kind query semantics
//! - **outbox**: append order preserved
//!
//! # Usage
//!
//! Backend crates call [`run_conformance_suite`] with a factory that
//! creates a fresh, empty store per test:
//!
//! ```ignore
//! use convene_storage::conformance::run_conformance_suite;
//!
//! #[tokio::test]
//! async fn postgres_conformance() {
//!     let report = run_conformance_suite(|| async {
//!         create_test_postgres_store().await
//!     }).await;
//!     assert!(report.failed == 0, "{report}");
//! }
//! ```

mod conventions;
mod notifications;
mod outbox;
mod shortlinks;

use std::collections::BTreeMap;
use std::fmt;
use std::future::Future;

use convene_core::{Actor, Agency, Convention, ConventionStatus, Role, Signatories};
use time::macros::datetime;

use crate::traits::Store;

/// Result of a single conformance test.
#[derive(Debug, Clone)]
pub struct TestResult {
    /// Test category (e.g. "conventions", "shortlinks").
    pub category: String,
    /// Test name.
    pub name: String,
    /// Whether the test passed.
    pub passed: bool,
    /// Error message if the test failed.
    pub message: Option<String>,
}

impl TestResult {
    fn from_result(category: &str, name: &str, result: Result<(), String>) -> Self {
        let (passed, message) = match result {
            Ok(()) => (true, None),
            Err(msg) => (false, Some(msg)),
        };
        Self {
            category: category.to_string(),
            name: name.to_string(),
            passed,
            message,
        }
    }
}

/// Aggregated report from a full conformance suite run.
#[derive(Debug, Clone)]
pub struct ConformanceReport {
    pub results: Vec<TestResult>,
    pub passed: usize,
    pub failed: usize,
    pub total: usize,
}

impl fmt::Display for ConformanceReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Conformance: {}/{} passed ({} failed)",
            self.passed, self.total, self.failed
        )?;
        for r in &self.results {
            if !r.passed {
                writeln!(
                    f,
                    "  FAIL [{}/{}]: {}",
                    r.category,
                    r.name,
                    r.message.as_deref().unwrap_or("(no message)")
                )?;
            }
        }
        Ok(())
    }
}

/// Run the full conformance suite against a storage backend.
///
/// The `factory` is called once per test to create a fresh, empty store,
/// ensuring test isolation.
pub async fn run_conformance_suite<S, F, Fut>(factory: F) -> ConformanceReport
where
    S: Store,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let mut results = Vec::new();

    results.extend(conventions::run_convention_tests(&factory).await);
    results.extend(shortlinks::run_shortlink_tests(&factory).await);
    results.extend(notifications::run_notification_tests(&factory).await);
    results.extend(outbox::run_outbox_tests(&factory).await);

    let passed = results.iter().filter(|r| r.passed).count();
    let total = results.len();

    ConformanceReport {
        results,
        passed,
        failed: total - passed,
        total,
    }
}

// ── Helpers: fixture constructors with sensible defaults ─────────────────────

fn make_actor(role: Role, email: &str) -> Actor {
    Actor {
        role,
        email: email.to_string(),
        phone: Some("0612345678".to_string()),
        first_name: "Test".to_string(),
        last_name: role.as_str().to_string(),
        signed_at: None,
    }
}

fn make_convention(id: &str, agency_id: &str) -> Convention {
    Convention {
        id: id.to_string(),
        status: ConventionStatus::ReadyToSign,
        agency_id: agency_id.to_string(),
        signatories: Signatories {
            beneficiary: make_actor(Role::Beneficiary, "bob@beneficiary.example"),
            establishment_representative: make_actor(
                Role::EstablishmentRepresentative,
                "rep@establishment.example",
            ),
            beneficiary_representative: None,
            beneficiary_current_employer: None,
        },
        establishment_tutor: make_actor(Role::EstablishmentTutor, "tutor@establishment.example"),
        updated_at: datetime!(2024-03-01 09:00 UTC),
        status_justification: None,
        date_approval: None,
        date_validation: None,
        agency_counsellor: None,
        agency_validator: None,
    }
}

fn make_agency(id: &str, refers_to: Option<&str>) -> Agency {
    Agency {
        id: id.to_string(),
        name: "Test agency".to_string(),
        refers_to_agency_id: refers_to.map(str::to_owned),
        user_rights: BTreeMap::new(),
    }
}
