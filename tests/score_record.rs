//! Score record invariants and export shape.

use gradekit::{Format, Report, ScoreRecord, Scoring, Status, ValidationError, Visibility};
use proptest::prelude::*;
use serde_json::json;

fn points_strategy() -> impl Strategy<Value = f64> {
    prop_oneof![(1i32..=100).prop_map(f64::from), (-100i32..=-1).prop_map(f64::from)]
}

proptest! {
    #[test]
    fn in_range_scores_are_accepted(points in points_strategy(), frac in 0.0f64..=1.0) {
        let (low, high) = (points.min(0.0), points.max(0.0));
        let score = low + (high - low) * frac;

        let r = ScoreRecord::with_budget("t", Some(points), Some(score)).unwrap();
        let expected = if points > 0.0 { score == points } else { score == 0.0 };
        prop_assert_eq!(r.passing(), expected);
        prop_assert_eq!(r.failing(), !expected);
    }

    #[test]
    fn out_of_range_scores_leave_state_unchanged(
        points in points_strategy(),
        over in 0.001f64..1000.0,
        below in any::<bool>(),
    ) {
        let (low, high) = (points.min(0.0), points.max(0.0));
        let bad = if below { low - over } else { high + over };

        let mut r = ScoreRecord::with_budget("t", Some(points), None).unwrap();
        r.set_passing(true);
        let before = r.clone();

        let err = r.set_score(bad).unwrap_err();
        let is_range_error = matches!(err, ValidationError::ScoreOutOfRange { .. });
        prop_assert!(is_range_error);
        prop_assert_eq!(r, before);
    }

    #[test]
    fn boolean_mode_follows_truthiness(score in -1000.0f64..1000.0) {
        let r = ScoreRecord::with_budget("t", Some(0.0), Some(score)).unwrap();
        prop_assert_eq!(r.passing(), score != 0.0);
        prop_assert_eq!(r.points(), None);
    }

    #[test]
    fn passing_and_failing_setters_are_idempotent(points in points_strategy(), pass in any::<bool>()) {
        let mut r = ScoreRecord::with_budget("t", Some(points), None).unwrap();
        r.set_passing(pass);
        let once = r.clone();
        r.set_passing(pass);
        prop_assert_eq!(&r, &once);
        prop_assert_eq!(r.passing(), pass);

        r.set_failing(pass);
        prop_assert_eq!(r.passing(), !pass);
    }

    #[test]
    fn max_score_only_for_positive_budgets(points in points_strategy()) {
        let r = ScoreRecord::with_budget("t", Some(points), None).unwrap();
        let e = r.export();
        prop_assert_eq!(e.max_score.is_some(), points > 0.0);
        prop_assert_eq!(e.score, Some(points.min(0.0)));
        prop_assert_eq!(e.name, "t");
    }
}

#[test]
fn full_marks_scenario() {
    let r = ScoreRecord::with_budget("Sum", Some(10.0), Some(10.0)).unwrap();
    assert!(r.passing());

    let value = serde_json::to_value(r.export()).unwrap();
    assert_eq!(
        value,
        json!({ "name": "Sum", "status": "passed", "score": 10.0, "max_score": 10.0 })
    );
}

#[test]
fn penalty_scenario() {
    let mut r = ScoreRecord::with_budget("Style", Some(10.0), None).unwrap();
    r.set_raw_score(-2.0);
    assert!(r.failing());

    let value = serde_json::to_value(r.export()).unwrap();
    assert_eq!(
        value,
        json!({ "name": "Style (-2)", "status": "failed", "score": -2.0 })
    );
}

#[test]
fn boolean_scenario() {
    let r = ScoreRecord::with_budget("Compiles", Some(0.0), Some(1.0)).unwrap();
    assert!(r.passing());
    assert_eq!(r.scoring(), Scoring::Boolean { passed: true });

    let value = serde_json::to_value(r.export()).unwrap();
    assert_eq!(value, json!({ "name": "Compiles", "status": "passed" }));
}

#[test]
fn negative_budget_has_no_suffix() {
    let r = ScoreRecord::with_budget("Leaks", Some(-5.0), Some(-5.0)).unwrap();
    let e = r.export();
    assert_eq!(e.name, "Leaks");
    assert_eq!(e.status, Status::Failed);
    assert_eq!(e.score, Some(-5.0));
    assert_eq!(e.max_score, None);
}

#[test]
fn optional_fields_in_export() {
    let r = ScoreRecord::new("Docs")
        .unwrap()
        .with_passing(true)
        .with_output("all good")
        .with_output_format(Format::Md)
        .with_name_format(Format::Text)
        .with_visibility(Visibility::Hidden);

    let value = serde_json::to_value(r.export()).unwrap();
    assert_eq!(
        value,
        json!({
            "name": "Docs",
            "status": "passed",
            "output": "all good",
            "output_format": "md",
            "name_format": "text",
            "visibility": "hidden"
        })
    );
}

#[test]
fn builder_propagates_validation_errors() {
    let err = ScoreRecord::new("t")
        .and_then(|r| r.with_points(4.0))
        .and_then(|r| r.with_score(5.0))
        .unwrap_err();
    assert_eq!(err.to_string(), "score 5 not in range [0, 4]");

    assert_eq!(
        "bogus".parse::<Visibility>().unwrap_err().to_string(),
        "Invalid visibility setting `bogus'"
    );
    assert_eq!(
        "pdf".parse::<Format>().unwrap_err().to_string(),
        "Invalid format `pdf'"
    );
}

#[test]
fn report_sums_counted_tests() {
    let mut report = Report::new();
    report.push(ScoreRecord::with_budget("a", Some(10.0), Some(10.0)).unwrap());
    report.push(ScoreRecord::with_budget("b", Some(5.0), Some(2.5)).unwrap());
    report.push(ScoreRecord::new("c").unwrap().with_passing(true));

    let value = serde_json::to_value(report.export()).unwrap();
    assert_eq!(value["score"], 12.5);
    assert_eq!(value["tests"].as_array().unwrap().len(), 3);

    report.score = Some(100.0);
    assert_eq!(report.export().score, 100.0);
}
