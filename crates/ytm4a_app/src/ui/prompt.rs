use std::io::{self, BufRead, Write};

/// Asks the user a yes/no question.
pub trait Confirm {
    fn confirm(&mut self, question: &str) -> bool;
}

/// Accepts everything (`--yes`).
pub struct AssumeYes;

impl Confirm for AssumeYes {
    fn confirm(&mut self, _question: &str) -> bool {
        true
    }
}

/// Prompts on stderr and reads the answer from stdin. EOF counts as "no".
pub struct StdinConfirm {
    stdin: io::Stdin,
}

impl StdinConfirm {
    pub fn new() -> Self {
        Self { stdin: io::stdin() }
    }
}

impl Default for StdinConfirm {
    fn default() -> Self {
        Self::new()
    }
}

impl Confirm for StdinConfirm {
    fn confirm(&mut self, question: &str) -> bool {
        let mut stderr = io::stderr();
        let _ = write!(stderr, "{question} [y/N] ");
        let _ = stderr.flush();

        let mut answer = String::new();
        match self.stdin.lock().read_line(&mut answer) {
            Ok(0) | Err(_) => false,
            Ok(_) => is_yes(&answer),
        }
    }
}

fn is_yes(answer: &str) -> bool {
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}

#[cfg(test)]
pub struct ScriptedConfirm {
    pub answers: std::collections::VecDeque<bool>,
    pub asked: Vec<String>,
}

#[cfg(test)]
impl ScriptedConfirm {
    pub fn new(answers: &[bool]) -> Self {
        Self {
            answers: answers.iter().copied().collect(),
            asked: Vec::new(),
        }
    }
}

#[cfg(test)]
impl Confirm for ScriptedConfirm {
    fn confirm(&mut self, question: &str) -> bool {
        self.asked.push(question.to_string());
        self.answers.pop_front().unwrap_or(false)
    }
}
