//! Line-oriented presentation adapter. It only forwards the candidate's input
//! to the orchestrator and prints what comes back; every rule lives in the
//! interview module.
//!
//! `:away` and `:back` stand in for the host's visibility signal.

use anyhow::{bail, Result};
use log::debug;
use tokio::io::{stdin, AsyncBufReadExt, BufReader, Lines, Stdin};
use tokio::sync::mpsc;

use crate::interview::{Completion, InterviewOrchestrator, Language};
use crate::proctoring::Visibility;
use crate::session::Stage;

pub struct Console {
    lines: Lines<BufReader<Stdin>>,
    visibility: mpsc::Sender<Visibility>,
}

impl Console {
    pub fn new(visibility: mpsc::Sender<Visibility>) -> Self {
        Self {
            lines: BufReader::new(stdin()).lines(),
            visibility,
        }
    }

    /// Next line of real input. Visibility commands are forwarded and skipped.
    async fn read(&mut self, label: &str) -> Result<String> {
        loop {
            if !label.is_empty() {
                println!("{}", label);
            }
            let Some(line) = self.lines.next_line().await? else {
                bail!("input closed");
            };
            match line.trim() {
                ":away" => self.visibility.send(Visibility::Hidden).await?,
                ":back" => self.visibility.send(Visibility::Visible).await?,
                _ => return Ok(line),
            }
            debug!("Forwarded visibility command {:?}", line.trim());
        }
    }
}

pub async fn drive(orchestrator: &InterviewOrchestrator, mut console: Console) -> Result<()> {
    println!("\n=== TechHire Assessment ===");
    loop {
        let name = console.read("Candidate name:").await?;
        match orchestrator.login(&name) {
            Ok(()) => break,
            Err(e) => println!("❌ {}", e),
        }
    }

    aptitude(orchestrator, &mut console).await?;
    if orchestrator.stage() == Stage::Failed {
        println!("\nThe aptitude score is below the threshold. Thank you for your time.");
        return Ok(());
    }

    coding(orchestrator, &mut console).await?;
    hr(orchestrator, &mut console).await?;

    let completion = loop {
        println!("\n⏳ Generating final report...");
        match orchestrator.finish().await {
            Ok(completion) => break completion,
            Err(e) => {
                println!("❌ {}", e);
                console.read("Press enter to retry.").await?;
            }
        }
    };
    print_report(&completion);
    Ok(())
}

async fn aptitude(orchestrator: &InterviewOrchestrator, console: &mut Console) -> Result<()> {
    println!("\n--- Round 1: Aptitude ---");
    let questions = loop {
        match orchestrator.start_aptitude().await {
            Ok(questions) => break questions,
            Err(e) => {
                println!("❌ {}", e);
                console.read("Press enter to retry.").await?;
            }
        }
    };

    for (n, question) in questions.iter().enumerate() {
        println!("\nQ{} [{:?}] {}", n + 1, question.category, question.question_text);
        for (i, option) in question.options.iter().enumerate() {
            println!("  {}) {}", i + 1, option);
        }
        loop {
            let choice = console.read("Your answer (1-4):").await?;
            let option = choice
                .trim()
                .parse::<usize>()
                .ok()
                .and_then(|i| i.checked_sub(1))
                .and_then(|i| question.options.get(i));
            let Some(option) = option else {
                println!("Pick a number between 1 and {}.", question.options.len());
                continue;
            };
            match orchestrator.answer(&question.id, option) {
                Ok(()) => break,
                Err(e) => println!("❌ {}", e),
            }
        }
    }

    let outcome = orchestrator.submit_aptitude()?;
    println!(
        "\n📊 Aptitude: {}/{} correct ({}%)",
        outcome.score.correct, outcome.score.total, outcome.score.score
    );
    Ok(())
}

async fn coding(orchestrator: &InterviewOrchestrator, console: &mut Console) -> Result<()> {
    println!("\n--- Round 2: Coding ---");
    let problem = loop {
        match orchestrator.start_coding().await {
            Ok(problem) => break problem,
            Err(e) => {
                println!("❌ {}", e);
                console.read("Press enter to retry.").await?;
            }
        }
    };

    println!("\n{}\n\n{}", problem.title, problem.description);
    for (n, example) in problem.examples.iter().enumerate() {
        println!("\nExample {}:\n  Input: {}\n  Output: {}", n + 1, example.input, example.output);
        if let Some(explanation) = &example.explanation {
            println!("  Explanation: {}", explanation);
        }
    }
    if !problem.constraints.is_empty() {
        println!("\nConstraints:");
        for constraint in &problem.constraints {
            println!("  - {}", constraint);
        }
    }
    println!(
        "\nType your solution. Commands: :lang <javascript|python|java|cpp>, :show, :run\n\n{}",
        orchestrator.coding_source()
    );

    let mut draft = String::new();
    while orchestrator.stage() == Stage::Coding {
        let line = console.read("").await?;
        let command = line.trim();

        if let Some(lang) = command.strip_prefix(":lang") {
            match lang.parse::<Language>().and_then(|lang| orchestrator.set_language(lang)) {
                Ok(starter) => {
                    draft.clear();
                    println!("{}", starter);
                }
                Err(e) => println!("❌ {}", e),
            }
        } else if command == ":show" {
            println!("{}", orchestrator.coding_source());
        } else if command == ":run" {
            if !draft.is_empty() {
                orchestrator.edit_source(&draft)?;
                draft.clear();
            }
            println!("⏳ Evaluating...");
            match orchestrator.run_code(&orchestrator.coding_source()).await {
                Ok(outcome) => {
                    println!(
                        "📊 Score {} ({}): {}",
                        outcome.result.score,
                        if outcome.result.passed { "passed" } else { "not passed" },
                        outcome.result.feedback
                    );
                }
                Err(e) => println!("❌ {}", e),
            }
        } else {
            draft.push_str(&line);
            draft.push('\n');
        }
    }
    Ok(())
}

async fn hr(orchestrator: &InterviewOrchestrator, console: &mut Console) -> Result<()> {
    println!("\n--- Round 3: HR ---");
    if let Some(opening) = orchestrator.transcript().last() {
        println!("HR: {}", opening.content);
    }
    println!("(type :finish to end the interview)");

    loop {
        let line = console.read("").await?;
        if line.trim() == ":finish" {
            return Ok(());
        }
        match orchestrator.send_hr(&line).await {
            Ok(reply) => println!("HR: {}", reply),
            Err(e) => println!("❌ {}", e),
        }
    }
}

fn print_report(completion: &Completion) {
    let report = &completion.report;
    println!("\n=== Final Report ===");
    println!("Verdict: {}", report.verdict);
    println!("Overall score: {}", report.overall_score);
    println!("Strengths:");
    for strength in &report.strengths {
        println!("  + {}", strength);
    }
    println!("Areas for improvement:");
    for weakness in &report.weaknesses {
        println!("  - {}", weakness);
    }
    println!("\n{}", report.summary);
    println!("\nProctoring strikes: {}", completion.strikes);
    println!("Result storage: {:?}", completion.persistence);
}
