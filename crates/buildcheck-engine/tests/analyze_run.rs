//! End-to-end runs against the in-memory store.

use std::sync::Arc;

use buildcheck_engine::{run_analysis, AnalyzeOptions, EngineError};
use buildcheck_store::{MemoryStore, Session, StaticSessionProvider};
use buildcheck_types::record::{collections, fields, record_types};
use buildcheck_types::Record;

const RT_BUILD: &str = "rt-build";
const RT_JOB: &str = "rt-job";
const RT_SINGLE: &str = "rt-single";
const RT_MULTI: &str = "rt-multi";

fn with_id(mut record: Record, id: &str) -> Record {
    record.id = Some(id.into());
    record
}

fn record_type(id: &str, name: &str) -> Record {
    with_id(
        Record::named(name).with(fields::COLLECTION, collections::ANALYSIS_RESULTS),
        id,
    )
}

fn assignment(id: &str, job_name: &str, operation: &str) -> Record {
    with_id(
        Record::named(format!("{job_name} assignment"))
            .with(fields::APP_ID, "app-1")
            .with(fields::JOB_ID, format!("job-{job_name}"))
            .with(fields::JOB_NAME, job_name)
            .with(fields::OPERATION, operation),
        id,
    )
}

/// Store with one build, two well-prefixed components, and no assignments.
fn fixture_store() -> Arc<MemoryStore> {
    let store = Arc::new(MemoryStore::new("u-1"));
    store.seed(
        collections::RECORD_TYPES,
        vec![
            record_type(RT_BUILD, record_types::BUILD_SUMMARY),
            record_type(RT_JOB, record_types::JOB_SUMMARY),
            record_type(RT_SINGLE, record_types::JOB_RESULT_SINGLE),
            record_type(RT_MULTI, record_types::JOB_RESULT_MULTI),
        ],
    );
    store.seed(
        collections::BUILDS,
        vec![with_id(
            Record::named("Build A")
                .with(fields::APP_ID, "app-1")
                .with(fields::APP_NAME, "Billing")
                .with(fields::DEV_PREFIX, "BIL")
                .with(fields::ALLOWED_PREFIX, "BIL"),
            "b-1",
        )],
    );
    store.seed(
        collections::BUILD_COMPONENTS,
        vec![
            Record::named("BIL_Invoice").with(fields::BUILD_ID, "b-1"),
            Record::named("BIL_Ledger").with(fields::BUILD_ID, "b-1"),
        ],
    );
    store
}

fn control(store: Arc<MemoryStore>) -> Session {
    Session::new("control", "ops@example.com", "u-1".into(), store)
}

fn options(build_name: &str) -> AnalyzeOptions {
    AnalyzeOptions {
        build_name: build_name.to_string(),
        ..AnalyzeOptions::default()
    }
}

fn results_of_type(store: &MemoryStore, record_type_id: &str) -> Vec<Record> {
    store
        .rows(collections::ANALYSIS_RESULTS)
        .into_iter()
        .filter(|r| r.get_str(fields::RECORD_TYPE_ID) == Some(record_type_id))
        .collect()
}

#[tokio::test]
async fn dummy_and_prefix_run_end_to_end() {
    let store = fixture_store();
    store.seed(
        collections::JOB_ASSIGNMENTS,
        vec![
            assignment("as-1", "Dummy", "Insert"),
            assignment("as-2", "Prefix", "Insert"),
        ],
    );
    let provider = StaticSessionProvider::new();

    let report = run_analysis(control(store.clone()), &provider, &options("Build A"))
        .await
        .unwrap();

    assert!(report.passed);
    assert_eq!(report.outcomes.len(), 2);
    let expected_total: i64 = report
        .outcomes
        .iter()
        .map(|o| o.summary.exec_time_ms.unwrap())
        .sum();
    assert_eq!(report.total_time_ms, expected_total);
    let times: Vec<i64> = report
        .outcomes
        .iter()
        .map(|o| o.summary.exec_time_ms.unwrap())
        .collect();
    assert_eq!(
        report.fastest.as_ref().unwrap().exec_time_ms,
        *times.iter().min().unwrap()
    );
    assert_eq!(
        report.slowest.as_ref().unwrap().exec_time_ms,
        *times.iter().max().unwrap()
    );
    assert_eq!(
        report.slowest_time_ms,
        report.slowest.as_ref().unwrap().exec_time_ms
    );
    assert!(report.message.contains("Fastest Job:"));
    assert!(report.message.contains("Slowest Job:"));

    // Build summary row was created first and completed last.
    let build_summaries = results_of_type(&store, RT_BUILD);
    assert_eq!(build_summaries.len(), 1);
    let build_summary = &build_summaries[0];
    assert_eq!(build_summary.get_bool(fields::PASSED), Some(true));
    assert_eq!(
        build_summary.get_i64(fields::TOTAL_TIME_MS),
        Some(report.total_time_ms)
    );
    assert_eq!(
        build_summary.get_i64(fields::EXEC_TIME_MS),
        Some(report.slowest_time_ms)
    );

    // One job summary per job, linked to the build summary.
    let parent_id = build_summary.id.as_ref().unwrap().as_str();
    let job_summaries = results_of_type(&store, RT_JOB);
    assert_eq!(job_summaries.len(), 2);
    for row in &job_summaries {
        assert_eq!(row.get_str(fields::PARENT_ID), Some(parent_id));
        assert_eq!(row.get_bool(fields::PASSED), Some(true));
        assert_eq!(row.get_str(fields::MESSAGE), Some(""));
        assert!(row.get_i64(fields::EXEC_TIME_MS).unwrap() > 0);
    }

    // Payload rows carry every common lookup field.
    let singles = results_of_type(&store, RT_SINGLE);
    assert_eq!(singles.len(), 1);
    let dummy_row = &singles[0];
    assert_eq!(dummy_row.name(), Some("DUMMY"));
    assert_eq!(dummy_row.get_str(fields::ASSIGNMENT_ID), Some("as-1"));
    assert_eq!(dummy_row.get_str(fields::JOB_ID), Some("job-Dummy"));
    assert_eq!(dummy_row.get_str(fields::BUILD_ID), Some("b-1"));
    assert_eq!(dummy_row.get_str(fields::APP_ID), Some("app-1"));
    assert_eq!(dummy_row.get_str(fields::PARENT_ID), Some(parent_id));

    let multis = results_of_type(&store, RT_MULTI);
    assert_eq!(multis.len(), 2, "one row per component");
    assert!(multis.iter().all(|r| r.get_bool(fields::PASSED) == Some(true)));
}

#[tokio::test]
async fn replace_run_twice_converges_to_latest_record_set() {
    let store = fixture_store();
    store.seed(
        collections::JOB_ASSIGNMENTS,
        vec![assignment("as-1", "Prefix", "Replace")],
    );
    let provider = StaticSessionProvider::new();

    for _ in 0..2 {
        let report = run_analysis(control(store.clone()), &provider, &options("Build A"))
            .await
            .unwrap();
        assert!(report.passed);
    }

    // Two runs, but exactly one record set: the second run's.
    let multis = results_of_type(&store, RT_MULTI);
    assert_eq!(multis.len(), 2, "no duplicates, no orphans");
    // Job summaries are a different record type and accumulate per run.
    assert_eq!(results_of_type(&store, RT_JOB).len(), 2);
}

#[tokio::test]
async fn unknown_operation_is_contained_and_leaves_only_the_bootstrap_row() {
    let store = fixture_store();
    store.seed(
        collections::JOB_ASSIGNMENTS,
        vec![
            assignment("as-1", "Dummy", "Merge"),
            assignment("as-2", "Prefix", "Insert"),
        ],
    );
    let provider = StaticSessionProvider::new();

    let report = run_analysis(control(store.clone()), &provider, &options("Build A"))
        .await
        .unwrap();

    assert!(!report.passed);
    assert!(report.message.contains("Unknown Job Operation"));
    let dummy = &report.outcomes[0];
    assert_eq!(dummy.job_name, "Dummy");
    assert!(!dummy.summary.completed);

    // The sibling ran to completion.
    assert!(report.outcomes[1].summary.passed);

    // No payload was written for the bad assignment; its step-1 summary row
    // remains.
    assert!(results_of_type(&store, RT_SINGLE).is_empty());
    assert_eq!(results_of_type(&store, RT_JOB).len(), 2);
    // The build summary still completed.
    let build_summary = &results_of_type(&store, RT_BUILD)[0];
    assert_eq!(build_summary.get_bool(fields::PASSED), Some(false));
    assert!(build_summary.get_i64(fields::TOTAL_TIME_MS).is_some());
}

#[tokio::test]
async fn unknown_job_name_fails_the_run_before_any_job_executes() {
    let store = fixture_store();
    store.seed(
        collections::JOB_ASSIGNMENTS,
        vec![
            assignment("as-1", "Mystery", "Insert"),
            assignment("as-2", "Dummy", "Insert"),
        ],
    );
    let provider = StaticSessionProvider::new();

    let err = run_analysis(control(store.clone()), &provider, &options("Build A"))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Config(m) if m.contains("'Mystery'")));

    // Nothing launched: no job summaries, no payload rows.
    assert!(results_of_type(&store, RT_JOB).is_empty());
    assert!(results_of_type(&store, RT_SINGLE).is_empty());
}

#[tokio::test]
async fn payload_write_failure_is_soft_and_does_not_stop_siblings() {
    let store = fixture_store();
    store.fail_writes_for_record_type(RT_SINGLE);
    store.seed(
        collections::JOB_ASSIGNMENTS,
        vec![
            assignment("as-1", "Dummy", "Insert"),
            assignment("as-2", "Prefix", "Insert"),
        ],
    );
    let provider = StaticSessionProvider::new();

    let report = run_analysis(control(store.clone()), &provider, &options("Build A"))
        .await
        .unwrap();

    assert!(!report.passed);
    let dummy = &report.outcomes[0];
    assert!(!dummy.summary.completed);
    assert!(dummy.summary.message.contains("WRITE_FAILED"));
    assert!(report.message.contains("Dummy:"));
    assert!(report.outcomes[1].summary.passed, "sibling unaffected");

    // The failed job's summary row still carries the captured message.
    let job_summaries = results_of_type(&store, RT_JOB);
    let dummy_summary = job_summaries
        .iter()
        .find(|r| r.get_str(fields::JOB_ID) == Some("job-Dummy"))
        .unwrap();
    assert_eq!(dummy_summary.get_bool(fields::PASSED), Some(false));
    assert!(dummy_summary
        .get_str(fields::MESSAGE)
        .unwrap()
        .contains("WRITE_FAILED"));
    assert!(dummy_summary.get_str(fields::SHORT_MESSAGE).is_some());

    // The build summary still completed.
    let build_summary = &results_of_type(&store, RT_BUILD)[0];
    assert_eq!(build_summary.get_bool(fields::PASSED), Some(false));
}

#[tokio::test]
async fn multi_record_pass_is_and_over_every_record() {
    let store = fixture_store();
    // One component violates the prefix.
    store.seed(
        collections::BUILD_COMPONENTS,
        vec![Record::named("CRM_Lead").with(fields::BUILD_ID, "b-1")],
    );
    store.seed(
        collections::JOB_ASSIGNMENTS,
        vec![assignment("as-1", "Prefix", "Insert")],
    );
    let provider = StaticSessionProvider::new();

    let report = run_analysis(control(store.clone()), &provider, &options("Build A"))
        .await
        .unwrap();

    // The check completed (empty message) but one record failed the AND.
    let prefix = &report.outcomes[0];
    assert!(prefix.summary.completed);
    assert!(!prefix.summary.passed);
    assert!(!report.passed);

    let multis = results_of_type(&store, RT_MULTI);
    assert_eq!(multis.len(), 3);
    let failing: Vec<_> = multis
        .iter()
        .filter(|r| r.get_bool(fields::PASSED) == Some(false))
        .collect();
    assert_eq!(failing.len(), 1);
    assert_eq!(failing[0].name(), Some("CRM_Lead"));
}

#[tokio::test]
async fn zero_assignments_is_a_vacuous_pass() {
    let store = fixture_store();
    let provider = StaticSessionProvider::new();

    let report = run_analysis(control(store.clone()), &provider, &options("Build A"))
        .await
        .unwrap();

    assert!(report.passed);
    assert!(report.outcomes.is_empty());
    assert_eq!(report.total_time_ms, 0);
    assert!(report.fastest.is_none());

    let build_summary = &results_of_type(&store, RT_BUILD)[0];
    assert_eq!(build_summary.get_bool(fields::PASSED), Some(true));
    assert_eq!(build_summary.get_i64(fields::TOTAL_TIME_MS), Some(0));
}

#[tokio::test]
async fn deadline_does_not_abort_a_healthy_run() {
    let store = fixture_store();
    store.seed(
        collections::JOB_ASSIGNMENTS,
        vec![assignment("as-1", "Dummy", "Upsert")],
    );
    let provider = StaticSessionProvider::new();

    let opts = AnalyzeOptions {
        deadline: Some(std::time::Duration::from_secs(30)),
        ..options("Build A")
    };
    let report = run_analysis(control(store.clone()), &provider, &opts)
        .await
        .unwrap();
    assert!(report.passed);
    assert!(!report.deadline_exceeded);
    assert_eq!(results_of_type(&store, RT_SINGLE).len(), 1);
}

#[tokio::test]
async fn missing_build_aborts_with_no_rows_written() {
    let store = fixture_store();
    let provider = StaticSessionProvider::new();

    let err = run_analysis(control(store.clone()), &provider, &options("Build Z"))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Config(m) if m == "No Build Found"));
    assert!(store.rows(collections::ANALYSIS_RESULTS).is_empty());
}
