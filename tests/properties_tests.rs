// Propiedades del motor sobre listas de cursos generadas.

use chrono::{TimeZone, Utc};
use degreeaudit::algorithm::matcher::{match_code, MatchKind};
use degreeaudit::algorithm::{run_audit, MatchOptions, NoopObserver};
use degreeaudit::models::{Fulfillment, MatchType, Program, StudentCourse};
use degreeaudit::requirements::Course;
use proptest::prelude::*;
use serde_json::json;

fn fixture_program() -> Program {
    Program::new(
        "p",
        "Fixture",
        "major",
        json!({"programRequirements": [
            {"requirementId": 1, "description": "Core", "type": "allOf",
             "courses": [{"code": "CS 142"}, {"code": "CS 235"}]},
            {"requirementId": 2, "description": "Upper", "type": "chooseNOf", "constraints": {"n": 2},
             "courses": [{"code": "CS 3XX"}, {"code": "CS 4XX"}]},
            {"requirementId": 3, "description": "Math", "type": "creditBucket",
             "constraints": {"minTotalCredits": 6, "maxTotalCredits": 9},
             "courses": [{"code": "MATH 1XX"}, {"code": "MATH 2XX"}]},
            {"requirementId": 4, "description": "Science", "type": "optionGroup", "options": [
                {"trackId": "a", "requirements": [{"requirementId": 1, "description": "Stats", "type": "allOf", "courses": [{"code": "STAT 201"}]}]},
                {"trackId": "b", "requirements": [{"requirementId": 1, "description": "Physics", "type": "allOf", "courses": [{"code": "PHYS 121"}]}]}
            ]},
            {"requirementId": 5, "description": "Meet your advisor", "type": "noteOnly"}
        ]}),
    )
}

fn options() -> MatchOptions {
    MatchOptions::default().with_matched_at(Utc.with_ymd_and_hms(2024, 9, 1, 8, 0, 0).unwrap())
}

fn course_strategy() -> impl Strategy<Value = StudentCourse> {
    (
        prop::sample::select(vec!["CS", "MATH", "STAT", "PHYS", "ART"]),
        100u32..500,
        prop::option::of(0u32..6),
    )
        .prop_map(|(subject, number, credits)| {
            StudentCourse::new(subject, &number.to_string(), credits.map(f64::from), Some("B"))
        })
}

fn courses_strategy() -> impl Strategy<Value = Vec<StudentCourse>> {
    prop::collection::vec(course_strategy(), 0..12)
}

fn percentage(courses: &[StudentCourse]) -> f64 {
    run_audit(courses, &[fixture_program()], &options(), &NoopObserver).programs[0].progress.percentage
}

proptest! {
    #[test]
    fn prop_percentage_is_bounded(courses in courses_strategy()) {
        let out = run_audit(&courses, &[fixture_program()], &options(), &NoopObserver);
        let progress = out.programs[0].progress;
        prop_assert!((0.0..=100.0).contains(&progress.percentage));
        prop_assert!(progress.fulfilled <= progress.total);
    }

    #[test]
    fn prop_rematch_is_idempotent(courses in courses_strategy()) {
        let first = run_audit(&courses, &[fixture_program()], &options(), &NoopObserver);
        let second = run_audit(&first.annotated_courses(), &[fixture_program()], &options(), &NoopObserver);
        prop_assert_eq!(first.annotated_courses(), second.annotated_courses());
        prop_assert_eq!(first.programs[0].progress, second.programs[0].progress);
    }

    #[test]
    fn prop_adding_a_course_never_lowers_progress(courses in courses_strategy(), extra in course_strategy()) {
        let before = percentage(&courses);
        let mut more = courses.clone();
        more.push(extra);
        prop_assert!(percentage(&more) + 1e-9 >= before);
    }

    #[test]
    fn prop_identical_code_is_exact(subject in "[A-Z]{2,4}", number in "[0-9]{3}[A-Z]?") {
        let code = format!("{} {}", subject, number);
        prop_assert_eq!(match_code(&code, &Course::new(&code, 3.0), true), Some(MatchKind::Exact));
    }

    #[test]
    fn prop_wildcard_matches_its_hundred(number in 0u32..1000) {
        let code = format!("CS {:03}", number);
        let hit = match_code(&code, &Course::new("CS 1XX", 3.0), false).is_some();
        prop_assert_eq!(hit, (100..200).contains(&number));
    }

    #[test]
    fn prop_credit_bucket_never_exceeds_max(courses in courses_strategy()) {
        let out = run_audit(&courses, &[fixture_program()], &options(), &NoopObserver);
        let bucket = &out.programs[0].results[2];
        prop_assert!(bucket.applied_credits.unwrap_or(0.0) <= 9.0);
        prop_assert!(bucket.applied_credits <= bucket.earned_credits);
    }

    #[test]
    fn prop_choose_n_without_n_behaves_like_all_of(courses in courses_strategy()) {
        let listed = json!([{"code": "CS 1XX"}, {"code": "MATH 2XX"}, {"code": "STAT 201"}]);
        let all_of = Program::new("a", "A", "gen_ed", json!({"programRequirements": [
            {"requirementId": 1, "description": "x", "type": "allOf", "courses": listed.clone()}]}));
        let choose = Program::new("c", "C", "gen_ed", json!({"programRequirements": [
            {"requirementId": 1, "description": "x", "type": "chooseNOf", "courses": listed}]}));
        let out = run_audit(&courses, &[all_of, choose], &options(), &NoopObserver);
        prop_assert_eq!(out.programs[0].results[0].met, out.programs[1].results[0].met);
        prop_assert_eq!(out.programs[0].progress.percentage, out.programs[1].progress.percentage);
    }

    #[test]
    fn prop_manual_fulfillments_survive(courses in prop::collection::vec(course_strategy(), 1..8), target in 0usize..8) {
        let mut courses = courses;
        let index = target % courses.len();
        courses[index].fulfills_requirements.push(Fulfillment {
            program_id: "p".into(),
            program_name: "Fixture".into(),
            requirement_id: "2".into(),
            requirement_description: "Upper".into(),
            match_type: MatchType::Manual,
            matched_at: None,
            matched_course_code: None,
            requirement_type: None,
        });
        let out = run_audit(&courses, &[fixture_program()], &options(), &NoopObserver);
        let kept = &out.courses[index].course.fulfills_requirements;
        prop_assert_eq!(kept.iter().filter(|f| f.key() == "p:2").count(), 1);
        prop_assert!(kept.iter().any(|f| f.key() == "p:2" && f.is_manual()));
    }
}
