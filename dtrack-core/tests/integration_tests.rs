//! Integration tests for dtrack-core services
//!
//! These tests verify the custody workflow end to end using a real DuckDB
//! database in a temp directory. Every operation goes through the service
//! layer with an explicit session, exactly as a presentation layer would.
//!
//! Run with: cargo test --test integration_tests -- --nocapture

use chrono::{Duration, NaiveDate, Utc};
use tempfile::TempDir;

use dtrack_core::config::Config;
use dtrack_core::domain::credential::hash_password;
use dtrack_core::services::{
    AdminUpdate, AnalysisRequest, DataEntry, ExtractionRequest, NewCustodyRecord, OptionKind,
    RecordFilter,
};
use dtrack_core::{Account, CustodyStatus, DtrackContext, Error, Role, Session};

// ============================================================================
// Test Helpers
// ============================================================================

/// Create a context backed by a fresh database
fn create_test_context() -> (TempDir, DtrackContext) {
    let temp_dir = TempDir::new().unwrap();
    let ctx = DtrackContext::new(temp_dir.path()).expect("Failed to create context");
    (temp_dir, ctx)
}

/// Log in as the bootstrapped admin
fn admin_session(ctx: &DtrackContext) -> Session {
    ctx.auth_service
        .login("admin", &Config::initial_admin_password())
        .expect("admin login failed")
}

/// Create and approve a conducting team, returning its session
fn approved_team(ctx: &DtrackContext, admin: &Session, name: &str) -> Session {
    ctx.account_service
        .create_account(admin, name, "secret123", Role::User)
        .unwrap();
    ctx.auth_service.login(name, "secret123").unwrap()
}

/// Create a subuser under a team and return its session
fn subuser_of(ctx: &DtrackContext, team: &Session, name: &str) -> Session {
    ctx.account_service
        .create_subuser(team, name, "secret123", None)
        .unwrap();
    ctx.auth_service.login(name, "secret123").unwrap()
}

fn intake_available(ctx: &DtrackContext, admin: &Session, serial: &str) {
    ctx.custody_service
        .intake(
            admin,
            NewCustodyRecord {
                serial_no: serial.to_string(),
                unit: Some("4(1) Delhi".to_string()),
                unit_space: Some("2TB SSD".to_string()),
                holder: None,
            },
        )
        .unwrap();
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

// ============================================================================
// Account Lifecycle
// ============================================================================

#[test]
fn test_registration_requires_approval_before_login() {
    let (_tmp, ctx) = create_test_context();

    ctx.auth_service
        .register("teamA", "secret123", "secret123")
        .unwrap();

    // Correct credentials, but the approval gate comes first
    let err = ctx.auth_service.login("teamA", "secret123").unwrap_err();
    assert!(matches!(err, Error::Unauthorized(_)));
    assert!(err.to_string().contains("pending"));

    let admin = admin_session(&ctx);
    ctx.account_service
        .set_approval(&admin, "teamA", true)
        .unwrap();
    assert!(ctx.auth_service.login("teamA", "secret123").is_ok());
}

#[test]
fn test_duplicate_username_is_conflict() {
    let (_tmp, ctx) = create_test_context();
    ctx.auth_service
        .register("teamA", "secret123", "secret123")
        .unwrap();
    let err = ctx
        .auth_service
        .register("teamA", "other-pass", "other-pass")
        .unwrap_err();
    assert!(matches!(err, Error::Conflict(_)));
}

#[test]
fn test_short_password_rejected() {
    let (_tmp, ctx) = create_test_context();
    let err = ctx
        .auth_service
        .register("teamA", "short", "short")
        .unwrap_err();
    assert!(matches!(err, Error::Validation(_)));
}

#[test]
fn test_expired_subuser_cannot_login() {
    let (_tmp, ctx) = create_test_context();
    let admin = admin_session(&ctx);
    let team = approved_team(&ctx, &admin, "teamA");

    // Within the validity window the subuser works
    let sub = subuser_of(&ctx, &team, "teamA-1");
    assert_eq!(sub.parent_user.as_deref(), Some("teamA"));

    // An already-expired subuser is a hard stop even with correct creds
    ctx.repository
        .insert_account(&Account {
            username: "teamA-2".to_string(),
            password_hash: hash_password("secret123"),
            role: Role::Subuser,
            approved: true,
            valid_till: Some(Utc::now() - Duration::hours(1)),
            password_expiry: None,
            parent_user: Some("teamA".to_string()),
            created_on: Utc::now() - Duration::days(8),
        })
        .unwrap();
    let err = ctx.auth_service.login("teamA-2", "secret123").unwrap_err();
    assert!(matches!(err, Error::AccountExpired));
}

#[test]
fn test_expired_password_is_distinct_outcome() {
    let (_tmp, ctx) = create_test_context();
    ctx.repository
        .insert_account(&Account {
            username: "teamB".to_string(),
            password_hash: hash_password("secret123"),
            role: Role::User,
            approved: true,
            valid_till: None,
            password_expiry: Some(Utc::now() - Duration::days(1)),
            parent_user: None,
            created_on: Utc::now() - Duration::days(91),
        })
        .unwrap();

    let err = ctx.auth_service.login("teamB", "secret123").unwrap_err();
    assert!(matches!(err, Error::PasswordExpired));

    // Admin reset clears the condition
    let admin = admin_session(&ctx);
    ctx.account_service
        .reset_password(&admin, "teamB", "newsecret")
        .unwrap();
    assert!(ctx.auth_service.login("teamB", "newsecret").is_ok());
}

#[test]
fn test_subuser_creation_requires_parent_team() {
    let (_tmp, ctx) = create_test_context();
    let admin = admin_session(&ctx);
    let team = approved_team(&ctx, &admin, "teamA");
    let sub = subuser_of(&ctx, &team, "teamA-1");

    // Subusers may not create accounts at all
    let err = ctx
        .account_service
        .create_subuser(&sub, "teamA-1-1", "secret123", None)
        .unwrap_err();
    assert!(matches!(err, Error::Unauthorized(_)));

    // Admin must name the parent
    let err = ctx
        .account_service
        .create_subuser(&admin, "orphan", "secret123", None)
        .unwrap_err();
    assert!(matches!(err, Error::Validation(_)));

    // Naming a nonexistent parent fails
    let err = ctx
        .account_service
        .create_subuser(&admin, "orphan", "secret123", Some("ghost"))
        .unwrap_err();
    assert!(matches!(err, Error::NotFound(_)));
}

// ============================================================================
// Custody State Machine
// ============================================================================

#[test]
fn test_duplicate_serial_is_conflict_and_first_record_unaffected() {
    let (_tmp, ctx) = create_test_context();
    let admin = admin_session(&ctx);
    let team = approved_team(&ctx, &admin, "teamA");

    let outcome = ctx
        .custody_service
        .intake(
            &admin,
            NewCustodyRecord {
                serial_no: "SN001".to_string(),
                unit_space: Some("4TB".to_string()),
                holder: Some("teamA".to_string()),
                ..Default::default()
            },
        )
        .unwrap();
    assert_eq!(outcome.record.status, CustodyStatus::Issued);

    let err = ctx
        .custody_service
        .intake(
            &admin,
            NewCustodyRecord {
                serial_no: "SN001".to_string(),
                ..Default::default()
            },
        )
        .unwrap_err();
    assert!(matches!(err, Error::Conflict(_)));

    // First record untouched
    let record = ctx.custody_service.get(&team, "SN001").unwrap();
    assert_eq!(record.status, CustodyStatus::Issued);
    assert_eq!(record.team_code.as_deref(), Some("teamA"));
    assert_eq!(record.unit_space.as_deref(), Some("4TB"));
}

#[test]
fn test_status_never_skips_states() {
    let (_tmp, ctx) = create_test_context();
    let admin = admin_session(&ctx);
    let team = approved_team(&ctx, &admin, "teamA");
    intake_available(&ctx, &admin, "SN010");

    // available: cannot seal, cannot extract
    let err = ctx.custody_service.seal(&team, "SN010", "note").unwrap_err();
    assert!(matches!(err, Error::Unauthorized(_) | Error::Conflict(_)));
    let err = ctx
        .disbursement_service
        .send_to_extraction(
            &admin,
            ExtractionRequest {
                serial_no: "SN010".to_string(),
                vendor: "Cyint".to_string(),
                extracted_serial_no: "SN010-X".to_string(),
                ..Default::default()
            },
        )
        .unwrap_err();
    assert!(matches!(err, Error::Conflict(_)));

    // issued: extraction still blocked
    ctx.custody_service
        .assign_to_team(&admin, "SN010", "teamA")
        .unwrap();
    let err = ctx
        .disbursement_service
        .send_to_extraction(
            &admin,
            ExtractionRequest {
                serial_no: "SN010".to_string(),
                vendor: "Cyint".to_string(),
                extracted_serial_no: "SN010-X".to_string(),
                ..Default::default()
            },
        )
        .unwrap_err();
    assert!(matches!(err, Error::Conflict(_)));

    // sealed: extraction now allowed, sealing again is not
    ctx.custody_service.seal(&team, "SN010", "done").unwrap();
    let err = ctx.custody_service.seal(&team, "SN010", "again").unwrap_err();
    assert!(matches!(err, Error::Conflict(_)));
    ctx.disbursement_service
        .send_to_extraction(
            &admin,
            ExtractionRequest {
                serial_no: "SN010".to_string(),
                vendor: "Cyint".to_string(),
                extracted_serial_no: "SN010-X".to_string(),
                ..Default::default()
            },
        )
        .unwrap();

    let record = ctx.custody_service.get(&team, "SN010").unwrap();
    assert_eq!(record.status, CustodyStatus::InExtraction);
}

#[test]
fn test_assign_unknown_serial_is_not_found() {
    let (_tmp, ctx) = create_test_context();
    let admin = admin_session(&ctx);
    approved_team(&ctx, &admin, "teamA");

    let err = ctx
        .custody_service
        .assign_to_team(&admin, "NOPE", "teamA")
        .unwrap_err();
    assert!(matches!(err, Error::NotFound(_)));
}

#[test]
fn test_busy_holder_is_soft_warning_not_block() {
    let (_tmp, ctx) = create_test_context();
    let admin = admin_session(&ctx);
    approved_team(&ctx, &admin, "teamA");
    intake_available(&ctx, &admin, "SN020");
    intake_available(&ctx, &admin, "SN021");

    let first = ctx
        .custody_service
        .assign_to_team(&admin, "SN020", "teamA")
        .unwrap();
    assert!(!first.holder_already_active);

    // Second assignment to the same team succeeds, but carries the warning
    let second = ctx
        .custody_service
        .assign_to_team(&admin, "SN021", "teamA")
        .unwrap();
    assert!(second.holder_already_active);
    assert_eq!(second.record.status, CustodyStatus::Issued);
}

#[test]
fn test_record_cannot_gain_second_holder() {
    let (_tmp, ctx) = create_test_context();
    let admin = admin_session(&ctx);
    approved_team(&ctx, &admin, "teamA");
    approved_team(&ctx, &admin, "teamB");
    intake_available(&ctx, &admin, "SN030");

    ctx.custody_service
        .assign_to_team(&admin, "SN030", "teamA")
        .unwrap();
    let err = ctx
        .custody_service
        .assign_to_team(&admin, "SN030", "teamB")
        .unwrap_err();
    assert!(matches!(err, Error::Conflict(_)));

    let record = ctx.custody_service.get(&admin, "SN030").unwrap();
    assert_eq!(record.team_code.as_deref(), Some("teamA"));
}

#[test]
fn test_subuser_edit_authorization_matrix() {
    let (_tmp, ctx) = create_test_context();
    let admin = admin_session(&ctx);
    let team_a = approved_team(&ctx, &admin, "teamA");
    let team_b = approved_team(&ctx, &admin, "teamB");
    let sub_a = subuser_of(&ctx, &team_a, "teamA-1");
    let sub_b = subuser_of(&ctx, &team_b, "teamB-1");

    intake_available(&ctx, &admin, "SN040");
    ctx.custody_service
        .assign_to_team(&admin, "SN040", "teamA")
        .unwrap();
    ctx.custody_service
        .assign_to_subuser(&team_a, "SN040", "teamA-1", "enter everything")
        .unwrap();

    let entry = || DataEntry {
        premise_name: "Office of Mr. ABC".to_string(),
        date_search: Some(date(2024, 3, 1)),
        date_seized: Some(date(2024, 3, 2)),
        details: "Email dump of xyz.com".to_string(),
    };

    // Wrong subuser (different team) is rejected
    let err = ctx
        .custody_service
        .enter_details(&sub_b, "SN040", entry())
        .unwrap_err();
    assert!(matches!(err, Error::Unauthorized(_)));

    // The assigned subuser succeeds and status stays issued
    ctx.custody_service
        .enter_details(&sub_a, "SN040", entry())
        .unwrap();
    let record = ctx.custody_service.get(&team_a, "SN040").unwrap();
    assert_eq!(record.status, CustodyStatus::Issued);
    assert_eq!(record.premise_name.as_deref(), Some("Office of Mr. ABC"));

    // After sealing, the record is closed to the subuser
    ctx.custody_service.seal(&team_a, "SN040", "done").unwrap();
    let err = ctx
        .custody_service
        .enter_details(&sub_a, "SN040", entry())
        .unwrap_err();
    assert!(matches!(err, Error::Unauthorized(_)));
}

#[test]
fn test_subuser_slot_must_be_empty() {
    let (_tmp, ctx) = create_test_context();
    let admin = admin_session(&ctx);
    let team = approved_team(&ctx, &admin, "teamA");
    subuser_of(&ctx, &team, "teamA-1");
    subuser_of(&ctx, &team, "teamA-2");

    intake_available(&ctx, &admin, "SN050");
    ctx.custody_service
        .assign_to_team(&admin, "SN050", "teamA")
        .unwrap();
    ctx.custody_service
        .assign_to_subuser(&team, "SN050", "teamA-1", "first")
        .unwrap();

    let err = ctx
        .custody_service
        .assign_to_subuser(&team, "SN050", "teamA-2", "second")
        .unwrap_err();
    assert!(matches!(err, Error::Conflict(_)));
}

#[test]
fn test_foreign_subuser_cannot_be_assigned() {
    let (_tmp, ctx) = create_test_context();
    let admin = admin_session(&ctx);
    let team_a = approved_team(&ctx, &admin, "teamA");
    let team_b = approved_team(&ctx, &admin, "teamB");
    subuser_of(&ctx, &team_b, "teamB-1");

    intake_available(&ctx, &admin, "SN051");
    ctx.custody_service
        .assign_to_team(&admin, "SN051", "teamA")
        .unwrap();

    let err = ctx
        .custody_service
        .assign_to_subuser(&team_a, "SN051", "teamB-1", "not mine")
        .unwrap_err();
    assert!(matches!(err, Error::Unauthorized(_)));
}

#[test]
fn test_detail_log_only_grows() {
    let (_tmp, ctx) = create_test_context();
    let admin = admin_session(&ctx);
    let team = approved_team(&ctx, &admin, "teamA");
    let sub = subuser_of(&ctx, &team, "teamA-1");

    intake_available(&ctx, &admin, "SN060");
    ctx.custody_service
        .assign_to_team(&admin, "SN060", "teamA")
        .unwrap();

    let mut last_len = ctx
        .custody_service
        .get(&team, "SN060")
        .unwrap()
        .data_details
        .len();

    ctx.custody_service
        .assign_to_subuser(&team, "SN060", "teamA-1", "handoff")
        .unwrap();
    let after_assign = ctx.custody_service.get(&team, "SN060").unwrap().data_details;
    assert!(after_assign.len() > last_len);
    last_len = after_assign.len();

    for i in 0..3 {
        ctx.custody_service
            .enter_details(
                &sub,
                "SN060",
                DataEntry {
                    premise_name: "Premise".to_string(),
                    details: format!("batch {}", i),
                    ..Default::default()
                },
            )
            .unwrap();
        let details = ctx.custody_service.get(&team, "SN060").unwrap().data_details;
        assert!(details.len() > last_len, "detail log must never shrink");
        assert!(details.contains(&format!("batch {}", i)));
        last_len = details.len();
    }

    ctx.custody_service.seal(&team, "SN060", "closing").unwrap();
    let sealed = ctx.custody_service.get(&team, "SN060").unwrap().data_details;
    assert!(sealed.len() > last_len);
    // Earlier entries are still present verbatim
    assert!(sealed.contains("batch 0"));
    assert!(sealed.contains("handoff"));
}

#[test]
fn test_admin_override_bypasses_transition_table() {
    let (_tmp, ctx) = create_test_context();
    let admin = admin_session(&ctx);
    intake_available(&ctx, &admin, "SN070");

    // No guarded path reaches `returned`, but the override may set it
    let record = ctx
        .custody_service
        .admin_update(
            &admin,
            "SN070",
            AdminUpdate {
                status: Some(CustodyStatus::Returned),
                premise_name: Some("corrected premise".to_string()),
                ..Default::default()
            },
        )
        .unwrap();
    assert_eq!(record.status, CustodyStatus::Returned);

    // Unknown statuses survive as-is and never default
    let record = ctx
        .custody_service
        .admin_update(
            &admin,
            "SN070",
            AdminUpdate {
                status: Some(CustodyStatus::parse("quarantined")),
                ..Default::default()
            },
        )
        .unwrap();
    assert_eq!(record.status.as_str(), "quarantined");
    let reread = ctx.custody_service.get(&admin, "SN070").unwrap();
    assert_eq!(reread.status.as_str(), "quarantined");

    // Non-admin cannot touch the override
    let team = approved_team(&ctx, &admin, "teamA");
    let err = ctx
        .custody_service
        .admin_update(&team, "SN070", AdminUpdate::default())
        .unwrap_err();
    assert!(matches!(err, Error::Unauthorized(_)));
}

#[test]
fn test_role_scoped_listing_and_export() {
    let (_tmp, ctx) = create_test_context();
    let admin = admin_session(&ctx);
    let team_a = approved_team(&ctx, &admin, "teamA");
    let team_b = approved_team(&ctx, &admin, "teamB");

    intake_available(&ctx, &admin, "SN080");
    intake_available(&ctx, &admin, "SN081");
    ctx.custody_service
        .assign_to_team(&admin, "SN080", "teamA")
        .unwrap();
    ctx.custody_service
        .assign_to_team(&admin, "SN081", "teamB")
        .unwrap();

    let all = ctx
        .custody_service
        .list(&admin, RecordFilter::default())
        .unwrap();
    assert_eq!(all.len(), 2);

    let mine = ctx
        .custody_service
        .list(&team_a, RecordFilter::default())
        .unwrap();
    assert_eq!(mine.len(), 1);
    assert_eq!(mine[0].serial_no, "SN080");

    // A team cannot read another team's record
    let err = ctx.custody_service.get(&team_a, "SN081").unwrap_err();
    assert!(matches!(err, Error::Unauthorized(_)));

    // Search filter narrows by serial/team substring
    let hits = ctx
        .custody_service
        .list(
            &admin,
            RecordFilter {
                search: Some("SN081".to_string()),
                ..Default::default()
            },
        )
        .unwrap();
    assert_eq!(hits.len(), 1);

    // Admin can filter by holder; other roles stay pinned to their scope
    let held = ctx
        .custody_service
        .list(
            &admin,
            RecordFilter {
                holder: Some("teamB".to_string()),
                ..Default::default()
            },
        )
        .unwrap();
    assert_eq!(held.len(), 1);
    assert_eq!(held[0].serial_no, "SN081");
    let still_mine = ctx
        .custody_service
        .list(
            &team_a,
            RecordFilter {
                holder: Some("teamB".to_string()),
                ..Default::default()
            },
        )
        .unwrap();
    assert_eq!(still_mine.len(), 1);
    assert_eq!(still_mine[0].serial_no, "SN080");

    // Bulk export is admin-only
    assert_eq!(ctx.custody_service.export_all(&admin).unwrap().len(), 2);
    let err = ctx.custody_service.export_all(&team_b).unwrap_err();
    assert!(matches!(err, Error::Unauthorized(_)));
}

// ============================================================================
// Disbursement Chain
// ============================================================================

#[test]
fn test_analysis_requires_existing_extraction() {
    let (_tmp, ctx) = create_test_context();
    let admin = admin_session(&ctx);

    let err = ctx
        .disbursement_service
        .send_to_analysis(
            &admin,
            AnalysisRequest {
                extracted_serial_no: "GHOST-X".to_string(),
                analyst_name: "Jane".to_string(),
                ..Default::default()
            },
        )
        .unwrap_err();
    assert!(matches!(err, Error::NotFound(_)));
}

#[test]
fn test_extraction_snapshot_is_immune_to_later_edits() {
    let (_tmp, ctx) = create_test_context();
    let admin = admin_session(&ctx);
    let team = approved_team(&ctx, &admin, "teamA");

    intake_available(&ctx, &admin, "SN090");
    ctx.custody_service
        .assign_to_team(&admin, "SN090", "teamA")
        .unwrap();
    ctx.custody_service.seal(&team, "SN090", "ready").unwrap();

    let extraction = ctx
        .disbursement_service
        .send_to_extraction(
            &admin,
            ExtractionRequest {
                serial_no: "SN090".to_string(),
                vendor: "Cyint".to_string(),
                date_extraction_start: Some(date(2024, 4, 1)),
                date_receiving: Some(date(2024, 4, 10)),
                extracted_serial_no: "SN090-X".to_string(),
                working_copies: vec!["WC-1".to_string(), "WC-2".to_string()],
                assigned_user: None,
            },
        )
        .unwrap();
    let snapshot_details = extraction.data_details.clone().unwrap();

    // Admin later rewrites the source record
    ctx.custody_service
        .admin_update(
            &admin,
            "SN090",
            AdminUpdate {
                data_details: Some("rewritten".to_string()),
                ..Default::default()
            },
        )
        .unwrap();

    let stored = ctx.disbursement_service.list_extractions(&admin).unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].data_details.as_deref(), Some(snapshot_details.as_str()));
    assert_eq!(stored[0].working_copy_sns, vec!["WC-1", "WC-2"]);
}

// ============================================================================
// Full Workflow Scenario
// ============================================================================

#[test]
fn test_full_custody_workflow_scenario() {
    let (_tmp, ctx) = create_test_context();
    let admin = admin_session(&ctx);

    // teamA registers; login fails until approved
    ctx.auth_service
        .register("teamA", "secret123", "secret123")
        .unwrap();
    assert!(ctx.auth_service.login("teamA", "secret123").is_err());
    ctx.account_service
        .set_approval(&admin, "teamA", true)
        .unwrap();
    let team = ctx.auth_service.login("teamA", "secret123").unwrap();

    // Admin intakes SN001 (available), then issues it to teamA
    intake_available(&ctx, &admin, "SN001");
    let outcome = ctx
        .custody_service
        .assign_to_team(&admin, "SN001", "teamA")
        .unwrap();
    assert_eq!(outcome.record.status, CustodyStatus::Issued);
    assert_eq!(outcome.record.team_code.as_deref(), Some("teamA"));

    // teamA creates a subuser and hands the record over for data entry
    let sub = subuser_of(&ctx, &team, "teamA-1");
    ctx.custody_service
        .assign_to_subuser(&team, "SN001", "teamA-1", "enter seizure data")
        .unwrap();

    ctx.custody_service
        .enter_details(
            &sub,
            "SN001",
            DataEntry {
                premise_name: "Office of Mr. ABC".to_string(),
                date_search: Some(date(2024, 5, 1)),
                date_seized: Some(date(2024, 5, 2)),
                details: "WhatsApp backup, financial spreadsheets".to_string(),
            },
        )
        .unwrap();
    let record = ctx.custody_service.get(&team, "SN001").unwrap();
    assert_eq!(record.status, CustodyStatus::Issued);

    // teamA seals; team_code survives
    ctx.custody_service
        .seal(&team, "SN001", "data entry complete")
        .unwrap();
    let record = ctx.custody_service.get(&team, "SN001").unwrap();
    assert_eq!(record.status, CustodyStatus::Sealed);
    assert_eq!(record.team_code.as_deref(), Some("teamA"));

    // Admin sends to vendor Cyint; status flips to in_extraction
    ctx.disbursement_service
        .send_to_extraction(
            &admin,
            ExtractionRequest {
                serial_no: "SN001".to_string(),
                vendor: "Cyint".to_string(),
                date_extraction_start: Some(date(2024, 5, 10)),
                date_receiving: Some(date(2024, 5, 20)),
                extracted_serial_no: "SN001-X".to_string(),
                working_copies: vec!["WC-001".to_string()],
                assigned_user: Some("teamA".to_string()),
            },
        )
        .unwrap();
    let record = ctx.custody_service.get(&team, "SN001").unwrap();
    assert_eq!(record.status, CustodyStatus::InExtraction);

    // Admin disburses the extraction output to analyst Jane
    ctx.disbursement_service
        .send_to_analysis(
            &admin,
            AnalysisRequest {
                extracted_serial_no: "SN001-X".to_string(),
                analyst_name: "Jane".to_string(),
                date_disburse: Some(date(2024, 5, 21)),
                notes: Some("full timeline reconstruction".to_string()),
            },
        )
        .unwrap();

    // teamA's analysis view shows exactly one row, for Jane
    let analyses = ctx.disbursement_service.list_analysis(&team).unwrap();
    assert_eq!(analyses.len(), 1);
    assert_eq!(analyses[0].analyst_name, "Jane");
    assert_eq!(analyses[0].extracted_serial_no, "SN001-X");
    assert_eq!(analyses[0].status.as_str(), "in_progress");

    // And the extraction view shows the Cyint handoff
    let extractions = ctx.disbursement_service.list_extractions(&team).unwrap();
    assert_eq!(extractions.len(), 1);
    assert_eq!(extractions[0].vendor, "Cyint");
}

// ============================================================================
// Options & Action Log
// ============================================================================

#[test]
fn test_options_are_seeded_and_admin_managed() {
    let (_tmp, ctx) = create_test_context();
    let admin = admin_session(&ctx);

    let vendors = ctx.options_service.list(OptionKind::Vendor).unwrap();
    assert!(vendors.contains(&"Cyint".to_string()));
    let units = ctx.options_service.list(OptionKind::Unit).unwrap();
    assert_eq!(units.len(), 8);

    ctx.options_service
        .add(&admin, OptionKind::Unit, "4(9) Pune")
        .unwrap();
    let err = ctx
        .options_service
        .add(&admin, OptionKind::Unit, "4(9) Pune")
        .unwrap_err();
    assert!(matches!(err, Error::Conflict(_)));

    ctx.options_service
        .remove(&admin, OptionKind::Unit, "4(9) Pune")
        .unwrap();
    let err = ctx
        .options_service
        .remove(&admin, OptionKind::Unit, "4(9) Pune")
        .unwrap_err();
    assert!(matches!(err, Error::NotFound(_)));

    let team = approved_team(&ctx, &admin, "teamA");
    let err = ctx
        .options_service
        .add(&team, OptionKind::Vendor, "ShadyCo")
        .unwrap_err();
    assert!(matches!(err, Error::Unauthorized(_)));
}

#[test]
fn test_action_log_records_workflow_and_is_admin_only() {
    let (_tmp, ctx) = create_test_context();
    let admin = admin_session(&ctx);
    let team = approved_team(&ctx, &admin, "teamA");

    intake_available(&ctx, &admin, "SN100");
    ctx.custody_service
        .assign_to_team(&admin, "SN100", "teamA")
        .unwrap();
    ctx.custody_service.seal(&team, "SN100", "done").unwrap();

    let entries = ctx.audit_service.list(&admin, None, 100).unwrap();
    let actions: Vec<&str> = entries.iter().map(|e| e.action.as_str()).collect();
    assert!(actions.contains(&"seal_hdd:SN100"));
    assert!(actions.contains(&"assign_hdd:SN100:teamA"));
    assert!(actions.contains(&"add_hdd:SN100"));

    // Newest first
    assert_eq!(entries[0].action, "seal_hdd:SN100");

    // Filter by username
    let team_only = ctx.audit_service.list(&admin, Some("teamA"), 100).unwrap();
    assert!(team_only.iter().all(|e| e.username.contains("teamA")));

    let err = ctx.audit_service.list(&team, None, 100).unwrap_err();
    assert!(matches!(err, Error::Unauthorized(_)));
}
