use super::common::*;
use crate::workflows::inspection::mapping::store::MappingStoreError;
use crate::workflows::inspection::mapping::{RegistryError, TradeMappingEntry, UpsertOutcome};
use crate::workflows::inspection::parser::IngestError;
use crate::workflows::inspection::{
    InspectionService, InspectionServiceError, OverallStatus, PropertyOutcome, Trade,
};
use std::io::Cursor;
use std::sync::{mpsc, Arc};
use std::thread;
use std::time::Duration;

#[test]
fn empty_store_is_seeded_with_standard_labels() {
    let (service, store) = build_service();
    assert!(!service.registry().is_empty());
    assert_eq!(service.registry().lookup("Plumber"), Ok(Trade::Plumbing));
    assert_eq!(store.save_count(), 0, "seeding never writes to the store");
}

#[test]
fn stored_mappings_replace_the_standard_labels() {
    let store = Arc::new(MemoryMappingStore::with_entries(vec![TradeMappingEntry {
        raw_label: "Sparky".to_string(),
        canonical_trade: Trade::Electrical,
        active: true,
    }]));
    let service = InspectionService::from_store(store, policy()).expect("store loads");

    assert_eq!(service.registry().len(), 1);
    assert_eq!(service.registry().lookup("sparky"), Ok(Trade::Electrical));
    assert!(service.registry().lookup("Electrical").is_err());
}

#[test]
fn from_store_propagates_load_failures() {
    match InspectionService::from_store(Arc::new(UnavailableMappingStore), policy()) {
        Err(InspectionServiceError::Store(MappingStoreError::Unavailable(_))) => {}
        Err(other) => panic!("expected store error, got {other:?}"),
        Ok(_) => panic!("expected store error"),
    }
}

#[test]
fn evaluate_csv_judges_every_property() {
    let (service, _) = build_service();
    let evaluation = service
        .evaluate_csv(Cursor::new(EXPORT), evaluated_at())
        .expect("export evaluates");

    let summary = &evaluation.summary;
    assert_eq!(summary.rows_read, 7);
    assert_eq!(summary.records, 6);
    assert_eq!(summary.skipped_rows, 1);
    assert_eq!(
        (summary.ready, summary.not_ready, summary.incomplete, summary.failed),
        (1, 1, 1, 0)
    );
    assert_eq!(summary.unmapped_terms.len(), 1);
    assert_eq!(summary.unmapped_terms[0].raw_label, "HVAC-old");

    let status = |id: &str| {
        evaluation
            .property(id)
            .and_then(PropertyOutcome::verdict)
            .map(|verdict| verdict.overall_status)
    };
    assert_eq!(status("P1"), Some(OverallStatus::Ready));
    assert_eq!(status("P2"), Some(OverallStatus::NotReady));
    assert_eq!(status("P3"), Some(OverallStatus::Incomplete));

    let p3 = evaluation
        .property("P3")
        .and_then(PropertyOutcome::report)
        .expect("P3 report");
    assert!(p3.mapping_warning);
    assert_eq!(p3.appendix.skipped_rows.len(), 1);
    assert_eq!(p3.appendix.skipped_rows[0].kind, "Invalid Severity");
}

#[test]
fn evaluate_csv_rejects_exports_without_headers() {
    let (service, _) = build_service();
    let result = service.evaluate_csv(Cursor::new("P1,VIC,Electrical,E-01,Minor\n"), evaluated_at());
    assert!(matches!(
        result,
        Err(InspectionServiceError::Ingest(IngestError::MissingHeader(_)))
    ));
}

#[test]
fn mapping_an_unmapped_label_changes_the_next_evaluation() {
    let (service, store) = build_service();

    let before = service.unmapped_terms(Cursor::new(EXPORT)).expect("analysis runs");
    assert_eq!(before.occurrences("hvac-old"), 1);

    let outcome = service
        .upsert_mapping("HVAC-old", Trade::Plumbing)
        .expect("admin edit");
    assert_eq!(outcome, UpsertOutcome::Inserted);
    assert_eq!(store.save_count(), 1);
    assert!(store
        .saved()
        .iter()
        .any(|entry| entry.raw_label == "hvac-old" && entry.canonical_trade == Trade::Plumbing));

    let after = service.unmapped_terms(Cursor::new(EXPORT)).expect("analysis runs");
    assert!(after.is_empty());

    // P3's HVAC-old Major finding now covers the expected plumbing trade.
    let evaluation = service
        .evaluate_csv(Cursor::new(EXPORT), evaluated_at())
        .expect("export evaluates");
    let p3 = evaluation
        .property("P3")
        .and_then(PropertyOutcome::verdict)
        .expect("P3 verdict");
    assert_eq!(p3.overall_status, OverallStatus::Ready);
    assert!(!p3.mapping_warning);
}

#[test]
fn unchanged_upsert_is_not_persisted() {
    let (service, store) = build_service();
    let outcome = service
        .upsert_mapping("Electrical", Trade::Electrical)
        .expect("no-op edit");
    assert_eq!(outcome, UpsertOutcome::Unchanged);
    assert_eq!(store.save_count(), 0);
}

#[test]
fn deactivate_persists_and_unknown_labels_fail() {
    let (service, store) = build_service();
    service.deactivate_mapping("Plumber").expect("deactivate");
    assert_eq!(store.save_count(), 1);
    assert!(service.registry().lookup("plumber").is_err());

    match service.deactivate_mapping("Roofer") {
        Err(InspectionServiceError::Registry(RegistryError::UnknownLabel(label))) => {
            assert_eq!(label, "Roofer")
        }
        other => panic!("expected unknown label, got {other:?}"),
    }
    assert_eq!(store.save_count(), 1);
}

#[test]
fn failed_save_reports_error_but_keeps_the_edit() {
    let service =
        InspectionService::from_store(Arc::new(ReadOnlyMappingStore), policy()).expect("loads");

    match service.upsert_mapping("HVAC-old", Trade::Electrical) {
        Err(InspectionServiceError::Store(MappingStoreError::Unavailable(_))) => {}
        other => panic!("expected store error, got {other:?}"),
    }
    assert_eq!(service.registry().lookup("HVAC-old"), Ok(Trade::Electrical));
}

#[test]
fn undecodable_row_is_skipped_and_the_export_still_evaluates() {
    let (service, _) = build_service();
    let mut export = b"property_id,jurisdiction,raw_trade_label,finding_code,severity,description,inspected_at\n".to_vec();
    export.extend_from_slice(b"P1,VIC,Electrical,E-01,Minor,Loose plate,2025-03-02 09:00:00\n");
    export.extend_from_slice(b"P1,VIC,Plumbing,P-01,Critical,Leak \xff at valve,2025-03-02 09:30:00\n");
    export.extend_from_slice(b"P1,VIC,Plumbing,P-02,Minor,Dripping tap,2025-03-02 09:45:00\n");

    let evaluation = service
        .evaluate_csv(Cursor::new(export), evaluated_at())
        .expect("one bad row does not fail the export");

    assert_eq!(evaluation.summary.rows_read, 3);
    assert_eq!(evaluation.summary.records, 2);
    assert_eq!(evaluation.summary.skipped_rows, 1);

    let report = evaluation
        .property("P1")
        .and_then(PropertyOutcome::report)
        .expect("P1 report");
    assert_eq!(report.overall_status, OverallStatus::Ready);
    assert_eq!(report.appendix.skipped_rows.len(), 1);
    assert_eq!(report.appendix.skipped_rows[0].line, 3);
    assert_eq!(report.appendix.skipped_rows[0].kind, "Malformed Row");
}

#[test]
fn concurrent_edits_are_saved_in_the_order_they_were_made() {
    let (entered_tx, entered_rx) = mpsc::channel();
    let (release_tx, release_rx) = mpsc::channel();
    let store = Arc::new(GatedMappingStore::new(entered_tx, release_rx));
    let service = Arc::new(
        InspectionService::from_store(store.clone(), policy()).expect("store loads"),
    );

    let first = {
        let service = Arc::clone(&service);
        thread::spawn(move || service.upsert_mapping("Pool Fence", Trade::CarpentryAndJoinery))
    };
    entered_rx.recv().expect("first save started");

    let second = {
        let service = Arc::clone(&service);
        thread::spawn(move || service.upsert_mapping("Sparky", Trade::Electrical))
    };
    thread::sleep(Duration::from_millis(50));
    release_tx.send(()).expect("first save waiting");

    first.join().expect("first edit thread").expect("first edit saved");
    second.join().expect("second edit thread").expect("second edit saved");

    let persisted = store.saved();
    assert_eq!(persisted, service.mappings());
    assert!(persisted.iter().any(|entry| entry.raw_label == "pool fence"));
    assert!(persisted.iter().any(|entry| entry.raw_label == "sparky"));
}
