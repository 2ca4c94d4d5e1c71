//! Merge engine properties: idempotence, isolation of unrelated terms, and
//! the unweighted cross-term average.

use transcript_core::{
    cumulative_average, merge_term, merge_terms, IncomingItem, IncomingTerm,
};
use transcript_state::{AcademicRecord, Grade, Item, Provenance, Term};

fn record() -> AcademicRecord {
    AcademicRecord::new("user-1", "1CR24IS069", Provenance::Manual)
}

/// First term of the sample record: credits 4+4+4+3, points 10+9+8+7.
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

fn stored_term(number: u8, average: f64, items: &[(&str, u32, Grade)]) -> Term {
    let mut term = Term::new(number);
    term.items = items
        .iter()
        .map(|(code, credits, grade)| {
            let mut item = Item::new(*code, *code, *credits);
            item.grade = Some(*grade);
            item.grade_point = Some(grade.point());
            item
        })
        .collect();
    term.average = average;
    term
}

#[test]
fn first_sample_term_averages_8_6() {
    let merged = merge_term(&record(), &first_term());
    let term = &merged.terms[0];

    let points: Vec<u8> = term.items.iter().filter_map(|i| i.grade_point).collect();
    assert_eq!(points, vec![10, 9, 8, 7]);
    assert!((term.average - 8.6).abs() < 1e-9);
    assert!((merged.cumulative_average - 8.6).abs() < 1e-9);
}

#[test]
fn merge_is_idempotent() {
    let incoming = first_term();
    let once = merge_term(&record(), &incoming);
    let twice = merge_term(&once, &incoming);

    assert_eq!(once.terms, twice.terms);
    assert_eq!(once.cumulative_average, twice.cumulative_average);
    assert_eq!(once.registration_number, twice.registration_number);
    assert_eq!(once.provenance, twice.provenance);
}

#[test]
fn merge_into_term_two_leaves_term_one_untouched() {
    let base = merge_term(&record(), &first_term());
    let base = merge_term(
        &base,
        &IncomingTerm::new(
            2,
            vec![IncomingItem::new("CS201", "Algorithms", 4).with_total(86)],
        ),
    );
    let term_one_before = serde_json::to_vec(&base.terms[0]).unwrap();

    let updated = merge_term(
        &base,
        &IncomingTerm::new(
            2,
            vec![IncomingItem::new("CS202", "Operating Systems", 4).with_total(80)],
        ),
    );

    assert_eq!(serde_json::to_vec(&updated.terms[0]).unwrap(), term_one_before);
    assert_eq!(updated.terms[1].items.len(), 2);
    assert_eq!(updated.terms[1].average, 9.0);
}

#[test]
fn sample_record_cumulative_is_unweighted_mean_of_stored_averages() {
    let mut sample = record();
    sample.terms = vec![
        stored_term(
            1,
            8.6,
            &[
                ("CS101", 4, Grade::O),
                ("CS102", 4, Grade::APlus),
                ("CS103", 4, Grade::A),
                ("CS104", 3, Grade::BPlus),
            ],
        ),
        stored_term(
            2,
            8.83,
            &[
                ("CS201", 4, Grade::APlus),
                ("CS202", 4, Grade::APlus),
                ("CS203", 4, Grade::APlus),
                ("CS204", 3, Grade::A),
            ],
        ),
        stored_term(
            3,
            8.83,
            &[
                ("CS301", 4, Grade::APlus),
                ("CS302", 4, Grade::APlus),
                ("CS303", 4, Grade::APlus),
                ("CS304", 3, Grade::A),
            ],
        ),
    ];

    let cgpa = cumulative_average(&sample.terms);
    assert!((cgpa - 8.753).abs() < 1e-3);

    // A credit-weighted figure over all 45 credits would differ.
    let weighted = (129.0 + 132.0 + 132.0) / 45.0;
    assert!((cgpa - weighted).abs() > 1e-3);
}

#[test]
fn merge_recomputes_only_the_touched_term_average() {
    let mut sample = record();
    sample.terms = vec![
        stored_term(1, 8.6, &[("CS101", 4, Grade::O)]),
        stored_term(2, 8.83, &[("CS201", 4, Grade::APlus)]),
    ];

    let merged = merge_term(
        &sample,
        &IncomingTerm::new(
            3,
            vec![IncomingItem::new("CS301", "Compilers", 4).with_total(91)],
        ),
    );

    assert_eq!(merged.terms[0].average, 8.6);
    assert_eq!(merged.terms[1].average, 8.83);
    assert_eq!(merged.terms[2].average, 10.0);
    assert!((merged.cumulative_average - (8.6 + 8.83 + 10.0) / 3.0).abs() < 1e-9);
}

#[test]
fn merge_terms_stamps_provenance() {
    let merged = merge_terms(&record(), &[first_term()], Provenance::Automated);
    assert_eq!(merged.provenance, Provenance::Automated);
    assert_eq!(merged.terms.len(), 1);
}
