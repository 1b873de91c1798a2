use chrono::{TimeZone, Utc};
use degreeaudit::algorithm::{run_audit, MatchOptions, NoopObserver, RecordingObserver};
use degreeaudit::models::{Program, StudentCourse};
use serde_json::json;

fn taken(subject: &str, number: &str, credits: f64) -> StudentCourse {
    StudentCourse::new(subject, number, Some(credits), Some("A"))
}

fn options() -> MatchOptions {
    MatchOptions::default().with_matched_at(Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap())
}

#[test]
fn test_scenario_all_of_is_binary() {
    let program = Program::new(
        "cs",
        "Computer Science",
        "major",
        json!({"programRequirements": [
            {"requirementId": 1, "description": "Intro", "type": "allOf",
             "courses": [{"code": "CS 142"}, {"code": "CS 235"}]}
        ]}),
    );

    let partial = run_audit(&[taken("CS", "142", 3.0)], std::slice::from_ref(&program), &options(), &NoopObserver);
    let audit = &partial.programs[0];
    assert!(!audit.results[0].met);
    assert_eq!(audit.progress.percentage, 0.0);
    // el curso igual queda atribuido
    assert_eq!(partial.courses[0].course.fulfills_requirements.len(), 1);

    let full = run_audit(&[taken("CS", "142", 3.0), taken("CS", "235", 3.0)], &[program], &options(), &NoopObserver);
    assert!((full.programs[0].progress.percentage - 100.0).abs() < 1e-9);
    assert_eq!(full.programs[0].progress.fulfilled, 1);
    assert_eq!(full.programs[0].progress.total, 1);
}

#[test]
fn test_scenario_choose_n_of() {
    let program = Program::new(
        "stats",
        "Statistics",
        "minor",
        json!({"programRequirements": [
            {"requirementId": 1, "description": "Math foundation", "type": "chooseNOf", "constraints": {"n": 2},
             "courses": [{"code": "MATH 110"}, {"code": "MATH 112"}, {"code": "STAT 121"}]}
        ]}),
    );
    let out = run_audit(&[taken("MATH", "110", 3.0), taken("STAT", "121", 3.0)], &[program], &options(), &NoopObserver);
    let audit = &out.programs[0];
    assert!(audit.results[0].met);
    assert_eq!(audit.results[0].matched_count, Some(2));
    assert!((audit.progress.percentage - 100.0).abs() < 1e-9);
}

#[test]
fn test_scenario_credit_bucket() {
    let program = Program::new(
        "art",
        "Art History",
        "minor",
        json!({"programRequirements": [
            {"requirementId": 1, "description": "Electives", "type": "creditBucket",
             "constraints": {"minTotalCredits": 9}, "courses": [{"code": "ARTH 2XX"}, {"code": "ARTH 3XX"}]}
        ]}),
    );

    let nine = run_audit(
        &[taken("ARTH", "201", 3.0), taken("ARTH", "250", 3.0), taken("ARTH", "310", 3.0)],
        std::slice::from_ref(&program),
        &options(),
        &NoopObserver,
    );
    assert!((nine.programs[0].progress.percentage - 100.0).abs() < 1e-9);
    assert_eq!(nine.programs[0].results[0].earned_credits, Some(9.0));

    let six = run_audit(&[taken("ARTH", "201", 3.0), taken("ARTH", "250", 3.0)], &[program], &options(), &NoopObserver);
    let progress = six.programs[0].progress;
    assert!((progress.percentage / 100.0 - 0.667).abs() < 1e-3);
    // round(0.667 * 1) = 1
    assert_eq!(progress.total, 1);
    assert_eq!(progress.fulfilled, 1);
    assert!(!six.programs[0].results[0].met);
}

#[test]
fn test_scenario_double_count_is_recorded_and_flagged() {
    let major = Program::new(
        "hist",
        "History",
        "major",
        json!({
            "programRequirements": [
                {"requirementId": 1, "description": "Survey", "type": "allOf", "courses": [{"code": "HIST 201"}]}
            ],
            "metadata": {"noDoubleCount": true}
        }),
    );
    let gen_ed = Program::new(
        "ge",
        "General Education",
        "gen_ed",
        json!({"programRequirements": [
            {"requirementId": 4, "description": "Civilization", "type": "creditBucket",
             "constraints": {"minTotalCredits": 3, "subjects": ["HIST", "PHIL"]}, "courses": []}
        ]}),
    );

    let out = run_audit(&[taken("HIST", "201", 3.0)], &[major, gen_ed], &options(), &NoopObserver);
    let keys: Vec<String> = out.courses[0].course.fulfills_requirements.iter().map(|f| f.key()).collect();
    assert_eq!(keys, vec!["hist:1", "ge:4"]);
    assert_eq!(out.double_counts.len(), 1);
    assert_eq!(out.double_counts[0].programs.len(), 2);
    assert!((out.programs[1].progress.percentage - 100.0).abs() < 1e-9);
}

#[test]
fn test_weighted_mix_and_display_counts() {
    // 2 binarios + chooseNOf(n=2) a medias + noteOnly (peso 0)
    let program = Program::new(
        "is",
        "Information Systems",
        "major",
        json!({"programRequirements": [
            {"requirementId": 1, "description": "A", "type": "allOf", "courses": [{"code": "IS 201"}]},
            {"requirementId": 2, "description": "B", "type": "allOf", "courses": [{"code": "IS 303"}]},
            {"requirementId": 3, "description": "C", "type": "chooseNOf", "constraints": {"n": 2},
             "courses": [{"code": "IS 4XX"}, {"code": "CS 4XX"}]},
            {"requirementId": 4, "description": "Advising", "type": "noteOnly", "steps": ["Meet advisor"]}
        ]}),
    );
    let out = run_audit(&[taken("IS", "201", 3.0), taken("IS", "455", 3.0)], &[program], &options(), &NoopObserver);
    let p = out.programs[0].progress;
    // (1*1 + 0*1 + 0.5*2) / 4 = 50%
    assert!((p.percentage - 50.0).abs() < 1e-9);
    assert_eq!(p.total, 4);
    assert_eq!(p.fulfilled, 2);
}

#[test]
fn test_unparsable_program_uses_coarse_progress() {
    let broken = Program::new("x", "Broken", "major", json!("{\"0\": {\"requirementId\": 1}, \"1\": "));
    let mut course = taken("CS", "142", 3.0);
    course.fulfills_requirements = serde_json::from_value(json!([
        {"programId": "x", "requirementId": "1", "matchType": "manual"}
    ]))
    .unwrap();

    let observer = RecordingObserver::new();
    let out = run_audit(&[course], &[broken], &options(), &observer);
    let audit = &out.programs[0];
    assert!(!audit.parsed);
    assert!(audit.parse_error.is_some());
    // sin conteo de primer nivel visible: 0%
    assert_eq!(audit.progress.percentage, 0.0);
    assert_eq!(audit.progress.fulfilled, 1);
    assert!(observer.events().iter().any(|e| e.starts_with("unparsed x")));
    // el fulfillment manual sigue ahí
    assert!(out.courses[0].course.fulfills_requirements[0].is_manual());
}

#[test]
fn test_one_bad_program_does_not_block_others() {
    let good = Program::new(
        "ok",
        "Good",
        "major",
        json!({"programRequirements": [{"requirementId": 1, "description": "A", "type": "allOf", "courses": [{"code": "CS 142"}]}]}),
    );
    let bad = Program::new("bad", "Bad", "major", json!(42));
    let out = run_audit(&[taken("CS", "142", 3.0)], &[bad, good], &options(), &NoopObserver);
    assert_eq!(out.programs.len(), 2);
    assert!(!out.programs[0].parsed);
    assert!((out.programs[1].progress.percentage - 100.0).abs() < 1e-9);
}

#[test]
fn test_nested_fulfillment_counts_for_parent_without_prefix_collisions() {
    let program = Program::new(
        "eng",
        "Engineering",
        "major",
        json!({"programRequirements": [
            {"requirementId": 1, "description": "Core", "type": "chooseNOf", "constraints": {"n": 1}, "courses": [{"code": "EE 101"}],
             "subRequirements": [{"requirementId": 1, "description": "Lab", "type": "allOf", "courses": [{"code": "EE 101L"}]}]},
            {"requirementId": 10, "description": "Capstone", "type": "allOf", "courses": [{"code": "EE 499"}]}
        ]}),
    );
    let out = run_audit(&[taken("EE", "499", 3.0)], &[program], &options(), &NoopObserver);
    let audit = &out.programs[0];
    // "10" no cuenta para "1"
    assert!(!audit.results[0].met);
    assert!(audit.results[1].met);
    let keys: Vec<String> = out.courses[0].course.fulfills_requirements.iter().map(|f| f.key()).collect();
    assert_eq!(keys, vec!["eng:10"]);
    // (0*1 + 1*1) / 2
    assert!((audit.progress.percentage - 50.0).abs() < 1e-9);
}

#[test]
fn test_option_group_reports_best_track() {
    let program = Program::new(
        "bus",
        "Business",
        "major",
        json!({"programRequirements": [
            {"requirementId": 1, "description": "Emphasis", "type": "optionGroup", "options": [
                {"trackId": "fin", "trackName": "Finance", "requirements": [
                    {"requirementId": 1, "description": "Fin core", "type": "allOf", "courses": [{"code": "FIN 401"}, {"code": "FIN 402"}]}]},
                {"trackId": "mkt", "trackName": "Marketing", "requirements": [
                    {"requirementId": 1, "description": "Mkt core", "type": "chooseNOf", "constraints": {"n": 2},
                     "courses": [{"code": "MKTG 401"}, {"code": "MKTG 402"}, {"code": "MKTG 403"}]}]}
            ]}
        ]}),
    );
    let out = run_audit(&[taken("MKTG", "401", 3.0)], &[program], &options(), &NoopObserver);
    let audit = &out.programs[0];
    assert!(!audit.results[0].met);
    assert_eq!(audit.selected_tracks.len(), 1);
    assert_eq!(audit.selected_tracks[0].track_id, "mkt");
    assert!(!audit.selected_tracks[0].met);
    assert_eq!(out.courses[0].course.fulfills_requirements[0].requirement_id, "1.mkt.1");
}

#[test]
fn test_choose_n_without_n_progress_matches_all_of() {
    let listed = json!([{"code": "CS 1XX"}, {"code": "MATH 2XX"}]);
    let all_of = Program::new("a", "A", "major", json!({"programRequirements": [
        {"requirementId": 1, "description": "x", "type": "allOf", "courses": listed.clone()}]}));
    let choose = Program::new("c", "C", "major", json!({"programRequirements": [
        {"requirementId": 1, "description": "x", "type": "chooseNOf", "courses": listed}]}));

    // dos cursos llenan el mismo comodín: el requisito sigue sin cumplirse
    let courses = [taken("CS", "142", 3.0), taken("CS", "150", 3.0)];
    let out = run_audit(&courses, &[all_of, choose], &options(), &NoopObserver);
    assert!(!out.programs[1].results[0].met);
    assert_eq!(out.programs[0].progress.percentage, 0.0);
    assert_eq!(out.programs[1].progress.percentage, 0.0);
}
