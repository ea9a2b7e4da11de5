use super::{Language, Transcript};

pub fn aptitude_set() -> String {
    "Generate exactly 5 challenging multiple-choice questions for a Software Engineering Aptitude Test.
Include a mix of Quantitative, Logical and Verbal reasoning and make them moderately difficult.
Give every question a unique id, a category, exactly 4 distinct options and a correctAnswer that matches one option exactly.
Return the questions in a `questions` array."
        .to_string()
}

pub fn coding_problem() -> String {
    format!(
        "Generate an Easy-difficulty Data Structures and Algorithms coding interview question (similar to LeetCode Easy).
Provide a clear problem statement without examples, 2 to 3 worked examples with input and output,
technical constraints (e.g. 1 <= nums.length <= 10^4), and starter function templates for {}.",
        Language::ALL
            .iter()
            .map(|lang| lang.display_name())
            .collect::<Vec<_>>()
            .join(", ")
    )
}

pub fn evaluation(problem_description: &str, source: &str, language: Language) -> String {
    format!(
        "You are an expert technical interviewer. Review this candidate's {lang} code for the following problem:
Problem: {problem_description}
Candidate Code:
{source}

Does this code correctly solve the problem? Evaluate edge cases, logic and {lang} syntax.
Score it out of 100 for correctness and efficiency, explain briefly what works or what failed,
and set passed to true if and only if the score is 70 or higher.",
        lang = language.display_name(),
    )
}

pub fn hr_turn(transcript: &Transcript, candidate_text: &str) -> String {
    format!(
        "You are an empathetic but professional HR Manager.
Conversation so far:
{}

Candidate just said: \"{}\"
Respond with exactly ONE behavioral question. Keep it under 3 sentences.",
        transcript.render_upper(),
        candidate_text
    )
}

pub fn final_report(aptitude_score: f64, coding_feedback: &str, transcript: &Transcript) -> String {
    format!(
        "Review this candidate's entire file and generate a final report:
1. Aptitude Score: {aptitude_score}%
2. Coding Feedback: {coding_feedback}
3. HR Transcript:
{}

Give an overall score out of 100, 3-4 key strengths, 1-2 areas for improvement,
a verdict of \"Strong Hire\", \"Hire\" or \"No Hire\", and a 2-sentence executive summary.",
        transcript.render()
    )
}
