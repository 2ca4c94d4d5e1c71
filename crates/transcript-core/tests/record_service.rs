//! Record operations against in-memory collaborators.

use async_trait::async_trait;
use transcript_core::{
    FetchedItem, FetchedTerm, IncomingItem, IncomingTerm, RecordError, RecordService,
    ResultsSource, SourceError, ValidationError, MISSING_TEXT,
};
use transcript_state::fakes::{MemoryProfileDirectory, MemoryRecordStore};
use transcript_state::Provenance;

const OWNER: &str = "user-1";
const REG: &str = "1CR24IS069";

/// Source returning a fixed set of terms, or `NoDataFound` when empty.
struct StaticSource {
    terms: Vec<FetchedTerm>,
}

#[async_trait]
impl ResultsSource for StaticSource {
    fn name(&self) -> &str {
        "static"
    }

    async fn fetch_all_terms(
        &self,
        registration_number: &str,
    ) -> Result<Vec<FetchedTerm>, SourceError> {
        if self.terms.is_empty() {
            return Err(SourceError::NoDataFound {
                registration_number: registration_number.to_string(),
            });
        }
        Ok(self.terms.clone())
    }
}

fn fetched_item(code: &str, score: u32, credits: u32) -> FetchedItem {
    FetchedItem {
        code: code.to_string(),
        name: format!("Course {code}"),
        score: Some(score),
        credits,
        result: "P".to_string(),
        grade: MISSING_TEXT.to_string(),
        attempt: "1".to_string(),
        passing_date: MISSING_TEXT.to_string(),
    }
}

fn service(
    terms: Vec<FetchedTerm>,
) -> RecordService<MemoryRecordStore, MemoryProfileDirectory, StaticSource> {
    RecordService::new(
        MemoryRecordStore::new(),
        MemoryProfileDirectory::new().with_profile(OWNER, REG),
        StaticSource { terms },
    )
}

fn first_term() -> IncomingTerm {
    IncomingTerm::new(
        1,
        vec![
            IncomingItem::new("CS101", "Programming in C", 4).with_components(48, 42),
            IncomingItem::new("CS102", "Data Structures", 4).with_components(45, 38),
            IncomingItem::new("CS103", "Digital Electronics", 4).with_components(42, 35),
            IncomingItem::new("CS104", "Physics", 3).with_components(35, 30),
        ],
    )
}

#[tokio::test]
async fn manual_submission_creates_record() {
    let svc = service(vec![]);

    let record = svc
        .submit_manual_terms(OWNER, "1cr24is069", &[first_term()])
        .await
        .unwrap();

    assert_eq!(record.registration_number, REG);
    assert_eq!(record.provenance, Provenance::Manual);
    assert!((record.cumulative_average - 8.6).abs() < 1e-9);

    let stored = svc.get_record(OWNER).await.unwrap();
    assert_eq!(stored, record);
}

#[tokio::test]
async fn invalid_submission_leaves_record_untouched() {
    let svc = service(vec![]);
    let before = svc
        .submit_manual_terms(OWNER, REG, &[first_term()])
        .await
        .unwrap();

    let bad = IncomingTerm::new(
        2,
        vec![
            IncomingItem::new("CS201", "Algorithms", 4).with_total(85),
            IncomingItem::new("CS202", "", 4).with_total(70),
        ],
    );
    let err = svc
        .submit_manual_terms(OWNER, REG, &[bad])
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        RecordError::Validation(ValidationError::MissingField { field: "name", .. })
    ));
    assert!(err.is_client_error());
    assert_eq!(svc.get_record(OWNER).await.unwrap(), before);
}

#[tokio::test]
async fn submission_for_another_registration_is_rejected() {
    let svc = service(vec![]);

    let err = svc
        .submit_manual_terms(OWNER, "1CR24IS070", &[first_term()])
        .await
        .unwrap_err();

    assert!(matches!(err, RecordError::RecordMismatch { .. }));
    assert!(matches!(
        svc.get_record(OWNER).await,
        Err(RecordError::RecordNotFound { .. })
    ));
}

#[tokio::test]
async fn submission_without_profile_is_rejected() {
    let svc = service(vec![]);

    let err = svc
        .submit_manual_terms("user-2", REG, &[first_term()])
        .await
        .unwrap_err();

    assert!(matches!(err, RecordError::ProfileNotFound { .. }));
    assert!(err.is_not_found());
}

#[tokio::test]
async fn short_registration_is_rejected_before_lookup() {
    let svc = service(vec![]);

    let err = svc
        .submit_manual_terms(OWNER, "1CR24", &[first_term()])
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        RecordError::Validation(ValidationError::RegistrationTooShort { .. })
    ));
}

#[tokio::test]
async fn update_term_requires_existing_record() {
    let svc = service(vec![]);

    let err = svc.update_term(OWNER, 1, first_term()).await.unwrap_err();

    assert!(matches!(err, RecordError::RecordNotFound { .. }));
}

#[tokio::test]
async fn update_term_uses_path_number_and_keeps_other_terms() {
    let svc = service(vec![]);
    svc.submit_manual_terms(OWNER, REG, &[first_term()])
        .await
        .unwrap();

    let body = IncomingTerm::new(
        7,
        vec![IncomingItem::new("CS201", "Algorithms", 4).with_total(86)],
    );
    let record = svc.update_term(OWNER, 2, body).await.unwrap();

    assert_eq!(
        record.terms.iter().map(|t| t.number).collect::<Vec<_>>(),
        vec![1, 2]
    );
    assert!((record.terms[0].average - 8.6).abs() < 1e-9);
    assert_eq!(record.terms[1].average, 9.0);
    assert_eq!(record.provenance, Provenance::Manual);
}

#[tokio::test]
async fn get_term_and_summary() {
    let svc = service(vec![]);
    svc.submit_manual_terms(OWNER, REG, &[first_term()])
        .await
        .unwrap();

    let term = svc.get_term(OWNER, 1).await.unwrap();
    assert_eq!(term.items.len(), 4);

    let missing = svc.get_term(OWNER, 3).await.unwrap_err();
    assert!(matches!(missing, RecordError::TermNotFound { term: 3, .. }));

    let summary = svc.get_summary(OWNER).await.unwrap();
    assert_eq!(summary.registration_number, REG);
    assert_eq!(summary.total_terms, 1);
    assert_eq!(summary.per_term[0].item_count, 4);
}

#[tokio::test]
async fn delete_record_then_not_found() {
    let svc = service(vec![]);
    svc.submit_manual_terms(OWNER, REG, &[first_term()])
        .await
        .unwrap();

    svc.delete_record(OWNER).await.unwrap();

    assert!(matches!(
        svc.delete_record(OWNER).await,
        Err(RecordError::RecordNotFound { .. })
    ));
}

#[tokio::test]
async fn fetch_external_without_results_is_no_data_found() {
    let svc = service(vec![]);

    let err = svc.fetch_external(REG).await.unwrap_err();

    assert!(matches!(err, RecordError::NoDataFound { .. }));
    assert!(err.to_string().contains("published"));
}

#[tokio::test]
async fn fetch_external_is_read_only() {
    let store = MemoryRecordStore::new();
    let svc = RecordService::new(
        store,
        MemoryProfileDirectory::new().with_profile(OWNER, REG),
        StaticSource {
            terms: vec![FetchedTerm {
                term_number: 1,
                items: vec![fetched_item("CS101", 91, 4)],
                average: Some(10.0),
            }],
        },
    );

    let results = svc.fetch_external("1cr24is069").await.unwrap();

    assert_eq!(results.registration_number, REG);
    assert_eq!(results.source, "static");
    assert_eq!(results.per_term.len(), 1);
    assert!(matches!(
        svc.get_record(OWNER).await,
        Err(RecordError::RecordNotFound { .. })
    ));
}

#[tokio::test]
async fn import_external_merges_fetched_terms() {
    let svc = service(vec![
        FetchedTerm {
            term_number: 1,
            items: vec![fetched_item("CS101", 91, 4), fetched_item("CS102", 84, 4)],
            average: Some(9.5),
        },
        FetchedTerm {
            term_number: 3,
            items: vec![fetched_item("CS301", 72, 3)],
            average: Some(8.0),
        },
    ]);

    let record = svc.import_external(OWNER, REG).await.unwrap();

    assert_eq!(record.provenance, Provenance::Automated);
    assert_eq!(
        record.terms.iter().map(|t| t.number).collect::<Vec<_>>(),
        vec![1, 3]
    );
    assert_eq!(record.terms[0].average, 9.5);
    assert!(record.terms.iter().all(|t| t.fetched_at.is_some()));
    assert!((record.cumulative_average - 8.75).abs() < 1e-9);
}

#[tokio::test]
async fn import_ignores_terms_past_the_last() {
    let svc = service(vec![
        FetchedTerm {
            term_number: 2,
            items: vec![fetched_item("CS201", 80, 4)],
            average: Some(9.0),
        },
        FetchedTerm {
            term_number: 9,
            items: vec![fetched_item("CS901", 95, 4)],
            average: Some(10.0),
        },
    ]);

    let record = svc.import_external(OWNER, REG).await.unwrap();

    assert_eq!(
        record.terms.iter().map(|t| t.number).collect::<Vec<_>>(),
        vec![2]
    );
    assert!((record.cumulative_average - 9.0).abs() < 1e-9);
}

#[tokio::test]
async fn fetch_with_only_unknown_terms_is_no_data_found() {
    let svc = service(vec![FetchedTerm {
        term_number: 10,
        items: vec![fetched_item("CSX01", 70, 4)],
        average: None,
    }]);

    let err = svc.fetch_external(REG).await.unwrap_err();
    assert!(matches!(err, RecordError::NoDataFound { .. }));
}

#[tokio::test]
async fn import_keeps_manual_names_on_existing_items() {
    let svc = service(vec![FetchedTerm {
        term_number: 1,
        items: vec![fetched_item("CS101", 75, 4)],
        average: None,
    }]);
    svc.submit_manual_terms(OWNER, REG, &[first_term()])
        .await
        .unwrap();

    let record = svc.import_external(OWNER, REG).await.unwrap();
    let item = record.terms[0].item("CS101").unwrap();

    assert_eq!(item.name, "Programming in C");
    assert_eq!(item.total_score, Some(75));
    assert_eq!(record.terms[0].items.len(), 4);
}

#[tokio::test]
async fn concurrent_submissions_for_one_owner_both_land() {
    let svc = std::sync::Arc::new(service(vec![]));
    let term_two = IncomingTerm::new(
        2,
        vec![IncomingItem::new("CS201", "Algorithms", 4).with_total(86)],
    );

    let a = {
        let svc = svc.clone();
        tokio::spawn(async move { svc.submit_manual_terms(OWNER, REG, &[first_term()]).await })
    };
    let b = {
        let svc = svc.clone();
        tokio::spawn(async move { svc.submit_manual_terms(OWNER, REG, &[term_two]).await })
    };
    a.await.unwrap().unwrap();
    b.await.unwrap().unwrap();

    let record = svc.get_record(OWNER).await.unwrap();
    assert_eq!(record.terms.len(), 2);
}

#[tokio::test]
async fn store_is_untouched_on_rejected_import() {
    let store = MemoryRecordStore::new();
    let svc = RecordService::new(
        store,
        MemoryProfileDirectory::new().with_profile(OWNER, "1CR24IS070"),
        StaticSource { terms: vec![] },
    );

    let err = svc.import_external(OWNER, REG).await.unwrap_err();
    assert!(matches!(err, RecordError::RecordMismatch { .. }));
    assert!(svc.get_record(OWNER).await.is_err());
}
