//! Terminal presentation of run events.
//!
//! This is the only place that maps run decisions to user-facing hints; the
//! executor and gates stay free of presentation concerns.
use crate::classify::LineClass;
use crate::executor::{RunEvent, RunState, RunSummary};
use std::io::IsTerminal;

const RED: &str = "\x1b[31m";
const GREEN: &str = "\x1b[32m";
const DIM: &str = "\x1b[2m";
const RESET: &str = "\x1b[0m";

pub struct Console {
    color: bool,
    state: RunState,
}

impl Console {
    pub fn new() -> Self {
        let color = std::io::stdout().is_terminal() && std::env::var_os("NO_COLOR").is_none();
        Self {
            color,
            state: RunState::Idle,
        }
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    pub fn render(&mut self, event: &RunEvent) {
        self.state = self.state.advance(event);
        match event {
            RunEvent::StepStarted {
                index,
                total,
                name,
                command,
            } => {
                println!();
                println!("{}", step_marker(name, *index, *total));
                if !command.is_empty() {
                    println!("{}", self.paint(DIM, &format!("$ {command}")));
                }
            }
            RunEvent::Line { class, text, .. } => self.line(*class, text),
            RunEvent::StepFinished(_) => {}
            RunEvent::RunFinished(summary) => {
                println!();
                print!("{}", format_summary(summary));
            }
        }
    }

    pub fn line(&self, class: LineClass, text: &str) {
        let painted = match class {
            LineClass::Info => text.to_string(),
            LineClass::Success => self.paint(GREEN, text),
            LineClass::Error => self.paint(RED, text),
        };
        println!("{painted}");
    }

    pub fn section(&self, title: &str) {
        println!();
        println!("=== {title} ===");
    }

    pub fn warn(&self, message: &str) {
        eprintln!("warning: {message}");
    }

    fn paint(&self, code: &str, text: &str) -> String {
        if self.color {
            format!("{code}{text}{RESET}")
        } else {
            text.to_string()
        }
    }
}

impl Default for Console {
    fn default() -> Self {
        Self::new()
    }
}

pub fn step_marker(name: &str, index: usize, total: usize) -> String {
    let number = index + 1;
    format!("=== [{number}/{total}] {name} ===")
}

/// Summary block listing every executed step with its outcome.
pub fn format_summary(summary: &RunSummary) -> String {
    let mut out = String::from("=== Summary ===\n");
    if summary.results.is_empty() {
        out.push_str("  (no steps ran)\n");
    }
    for result in &summary.results {
        let mark = if result.succeeded { "✅" } else { "❌" };
        out.push_str(&format!("  {}: {}", result.step_name, mark));
        if !result.succeeded {
            match result.exit_code {
                Some(code) => out.push_str(&format!(" (exit {code})")),
                None => out.push_str(" (not run to completion)"),
            }
        }
        out.push('\n');
    }
    out
}

/// Follow-up hints derived from the summary.
pub fn summary_hints(summary: &RunSummary, report_present: bool) -> Vec<String> {
    let mut hints = Vec::new();
    if summary.report_available && report_present {
        hints.push("report ready: run `stepq report` to open it".to_string());
    } else if summary.report_available {
        hints.push("report step succeeded but the report file is missing".to_string());
    }
    if summary.followup_offered {
        hints.push("lint failures can be baselined: run `stepq baseline`".to_string());
    }
    hints
}
