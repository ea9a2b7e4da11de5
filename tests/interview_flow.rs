use std::sync::Arc;

use pretty_assertions::assert_eq;
use serde_json::json;

use techhire_lib::config::InterviewSettings;
use techhire_lib::database::MemoryResultStore;
use techhire_lib::generation::StructuredGenerationClient;
use techhire_lib::interview::{
    InterviewError, InterviewOrchestrator, Language, PersistenceStatus, Role, Round, RoundStatus,
    Verdict,
};
use techhire_lib::proctoring::Visibility;
use techhire_lib::session::Stage;
use techhire_lib::testing::ScriptedBackend;

fn aptitude_reply() -> serde_json::Value {
    let questions: Vec<_> = (1..=5)
        .map(|n| {
            json!({
                "id": format!("apt-{n}"),
                "category": (["Quantitative", "Logical", "Verbal"][n % 3]),
                "questionText": format!("Question {n}"),
                "options": ["10", "20", "30", "40"],
                "correctAnswer": "20",
            })
        })
        .collect();
    json!({ "questions": questions })
}

fn coding_reply() -> serde_json::Value {
    json!({
        "title": "Reverse a String",
        "description": "Return the input string reversed.",
        "examples": [
            { "input": "\"abc\"", "output": "\"cba\"" },
            { "input": "\"\"", "output": "\"\"", "explanation": "Empty stays empty." }
        ],
        "constraints": ["0 <= s.length <= 10^5"],
        "starterCode": {
            "javascript": "function reverse(s) {\n}",
            "python": "def reverse(s):\n    pass",
            "java": "class Solution { String reverse(String s) { return s; } }",
            "cpp": "string reverse(string s) { return s; }"
        },
        "difficulty": "Easy"
    })
}

fn report_reply(verdict: &str) -> serde_json::Value {
    json!({
        "overallScore": 78,
        "strengths": ["Fast learner", "Clear code", "Calm under pressure"],
        "weaknesses": ["Could test edge cases more"],
        "verdict": verdict,
        "summary": "Solid candidate. Worth a second conversation."
    })
}

fn orchestrator(
    backend: &Arc<ScriptedBackend>,
    store: &Arc<MemoryResultStore>,
) -> InterviewOrchestrator {
    InterviewOrchestrator::new(
        StructuredGenerationClient::new(backend.clone(), "scripted"),
        store.clone(),
        &InterviewSettings::default(),
    )
}

#[tokio::test]
async fn test_candidate_walks_every_stage() {
    let backend = ScriptedBackend::new();
    let store = Arc::new(MemoryResultStore::new());
    let interview = orchestrator(&backend, &store);
    let monitor = interview.monitor();

    // Switching away before login is not a strike.
    monitor.observe(Visibility::Hidden);
    monitor.observe(Visibility::Visible);

    interview.login("Grace Hopper").unwrap();
    assert_eq!(interview.stage(), Stage::Aptitude);

    backend.push_json(&aptitude_reply());
    let questions = interview.start_aptitude().await.unwrap();
    assert_eq!(questions.len(), 5);
    for (n, question) in questions.iter().enumerate() {
        let option = if n == 0 { "40" } else { "20" };
        interview.answer(&question.id, option).unwrap();
    }
    monitor.observe(Visibility::Hidden);
    monitor.observe(Visibility::Visible);

    let outcome = interview.submit_aptitude().unwrap();
    assert_eq!(outcome.score.score, 80.0);
    assert_eq!(outcome.stage, Stage::Coding);

    backend.push_json(&coding_reply());
    let problem = interview.start_coding().await.unwrap();
    assert_eq!(problem.title, "Reverse a String");
    assert_eq!(interview.coding_language(), Language::JavaScript);
    assert_eq!(interview.coding_source(), "function reverse(s) {\n}");

    let starter = interview.set_language(Language::Python).unwrap();
    assert_eq!(starter, "def reverse(s):\n    pass");

    backend.push_json(&json!({ "score": 40, "feedback": "Returns None.", "passed": false }));
    let first = interview.run_code("def reverse(s):\n    pass").await.unwrap();
    assert_eq!(first.stage, Stage::Coding);

    backend.push_json(&json!({ "score": 95, "feedback": "Correct and linear.", "passed": true }));
    let second = interview.run_code("def reverse(s):\n    return s[::-1]").await.unwrap();
    assert_eq!(second.stage, Stage::Hr);
    assert_eq!(interview.coding_attempts(), 2);

    backend.push_raw("What would you do differently next time?");
    let reply = interview.send_hr("I learned Rust in two weeks for a launch.").await.unwrap();
    assert_eq!(reply, "What would you do differently next time?");
    assert_eq!(interview.transcript().len(), 3);

    monitor.observe(Visibility::Hidden);

    backend.push_json(&report_reply("Hire"));
    let completion = interview.finish().await.unwrap();
    assert_eq!(completion.report.verdict, Verdict::Hire);
    assert_eq!(completion.persistence, PersistenceStatus::Saved);
    assert_eq!(completion.strikes, 2);
    assert_eq!(interview.stage(), Stage::Report);

    // Disarmed after the report.
    monitor.observe(Visibility::Visible);
    monitor.observe(Visibility::Hidden);
    assert_eq!(interview.strikes(), 2);

    let prompt = backend.prompts().pop().unwrap();
    assert!(prompt.contains("Aptitude Score: 80%"));
    assert!(prompt.contains("Coding Feedback: Correct and linear."));
    assert!(prompt.contains("candidate: I learned Rust in two weeks for a launch."));

    let records = store.records();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].candidate_name, "Grace Hopper");
    assert_eq!(records[0].round, "Final");
    assert_eq!(records[0].score, 78.0);
    assert!(records[0].passed);

    assert_eq!(interview.finish().await.unwrap(), completion);
    assert_eq!(backend.calls(), 6);
    assert_eq!(store.records().len(), 1);
}

#[tokio::test]
async fn test_low_aptitude_score_ends_interview() {
    let backend = ScriptedBackend::new();
    let store = Arc::new(MemoryResultStore::new());
    let interview = orchestrator(&backend, &store);

    interview.login("Bob").unwrap();
    backend.push_json(&aptitude_reply());
    let questions = interview.start_aptitude().await.unwrap();

    let first = &questions[0].id;
    assert!(matches!(
        interview.submit_aptitude(),
        Err(InterviewError::InvalidInput(_))
    ));
    interview.answer(first, "20").unwrap();
    for question in &questions[1..] {
        let option = if question.id.ends_with('2') || question.id.ends_with('3') {
            "20"
        } else {
            "10"
        };
        interview.answer(&question.id, option).unwrap();
    }

    let outcome = interview.submit_aptitude().unwrap();
    assert_eq!(outcome.score.score, 60.0);
    assert_eq!(outcome.stage, Stage::Failed);
    assert!(!interview.monitor().is_armed());

    assert!(matches!(
        interview.start_coding().await,
        Err(InterviewError::WrongStage { .. })
    ));
    assert!(matches!(
        interview.finish().await,
        Err(InterviewError::WrongStage { .. })
    ));
    assert!(store.records().is_empty());
    assert_eq!(backend.calls(), 1);
}

#[tokio::test]
async fn test_rapid_hr_sends_keep_transcript_alternating() {
    let backend = ScriptedBackend::new();
    let store = Arc::new(MemoryResultStore::new());
    let interview = orchestrator(&backend, &store);

    interview.login("Linus").unwrap();
    backend.push_json(&aptitude_reply());
    for question in interview.start_aptitude().await.unwrap() {
        interview.answer(&question.id, "20").unwrap();
    }
    interview.submit_aptitude().unwrap();
    backend.push_json(&coding_reply());
    interview.start_coding().await.unwrap();
    backend.push_json(&json!({ "score": 70, "feedback": "Just enough.", "passed": true }));
    interview.run_code("function reverse(s) { return [...s].reverse().join(''); }").await.unwrap();

    backend.push_raw("Tell me more.");
    let (first, second) = tokio::join!(
        interview.send_hr("First answer"),
        interview.send_hr("Second answer")
    );
    assert_eq!(first.unwrap(), "Tell me more.");
    assert_eq!(second, Err(InterviewError::Busy));

    let transcript = interview.transcript();
    assert_eq!(transcript.len(), 3);
    let roles: Vec<Role> = transcript.turns().iter().map(|turn| turn.role).collect();
    assert_eq!(roles, vec![Role::Interviewer, Role::Candidate, Role::Interviewer]);
    assert_eq!(interview.round_status(Round::Hr), RoundStatus::Succeeded);

    assert!(matches!(
        interview.send_hr("   ").await,
        Err(InterviewError::InvalidInput(_))
    ));
    assert_eq!(interview.transcript().len(), 3);
}

#[tokio::test]
async fn test_fenced_evaluation_and_finish_after_opening_line() {
    let backend = ScriptedBackend::new();
    let store = Arc::new(MemoryResultStore::new());
    let interview = orchestrator(&backend, &store);

    interview.login("Ada").unwrap();
    backend.push_json(&aptitude_reply());
    for question in interview.start_aptitude().await.unwrap() {
        interview.answer(&question.id, "20").unwrap();
    }
    interview.submit_aptitude().unwrap();
    backend.push_json(&coding_reply());
    interview.start_coding().await.unwrap();
    backend.push_raw(
        "```json\n{\"score\": 100, \"feedback\": \"Perfect.\", \"passed\": true}\n```",
    );
    interview.run_code("solution").await.unwrap();

    backend.push_json(&report_reply("No Hire"));
    let completion = interview.finish().await.unwrap();
    assert_eq!(completion.report.verdict, Verdict::NoHire);
    assert_eq!(interview.transcript().len(), 1);
    assert!(!store.records()[0].passed);
}
