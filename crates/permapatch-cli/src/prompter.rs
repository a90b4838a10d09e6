//! Terminal prompts for the interactive toggle flow

use std::io::{self, BufRead, Write};

/// Source of yes/no answers
pub trait Prompter {
    fn confirm(&self, question: &str) -> bool;

    fn display_message(&self, message: &str);
}

/// Prompter reading answers from stdin
pub struct CliPrompter;

impl Prompter for CliPrompter {
    fn confirm(&self, question: &str) -> bool {
        read_confirmation(&mut io::stdin().lock(), question)
    }

    fn display_message(&self, message: &str) {
        println!("{}", message);
    }
}

/// Ask `question` until `input` yields a y/n answer; EOF or a read error means no
pub fn read_confirmation(input: &mut impl BufRead, question: &str) -> bool {
    loop {
        print!("{} [y/N] ", question);
        io::stdout().flush().ok();
        let mut line = String::new();
        match input.read_line(&mut line) {
            Ok(0) => return false,
            Ok(_) => {}
            Err(e) => {
                eprintln!("Failed to read input: {}", e);
                return false;
            }
        }
        match parse_answer(&line) {
            Some(answer) => return answer,
            None => eprintln!("Please answer y or n"),
        }
    }
}

/// Interpret a yes/no answer; an empty line means no
pub fn parse_answer(line: &str) -> Option<bool> {
    match line.trim().to_ascii_lowercase().as_str() {
        "y" | "yes" => Some(true),
        "" | "n" | "no" => Some(false),
        _ => None,
    }
}
