//! Yes/no console prompt

use std::io::{self, BufRead, Write};
use tracing::warn;

use crate::constants::prompt::MAX_ATTEMPTS;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Answer {
    Yes,
    No,
    Default,
    Invalid,
}

fn classify(line: &str) -> Answer {
    match line.trim_end_matches(['\r', '\n']) {
        "" => Answer::Default,
        "y" | "Y" => Answer::Yes,
        "n" | "N" => Answer::No,
        _ => Answer::Invalid,
    }
}

/// Interactive prompt, or a fixed answer in quiet mode
#[derive(Debug, Clone, Copy)]
pub struct Prompt {
    quiet: bool,
}

impl Prompt {
    pub fn new(quiet: bool) -> Self {
        Self { quiet }
    }

    /// Ask on stdin/stdout
    pub fn ask(&self, question: &str, default_answer: bool, quiet_answer: bool) -> bool {
        if self.quiet {
            return quiet_answer;
        }
        let stdin = io::stdin();
        ask_with(&mut stdin.lock(), &mut io::stdout(), question, default_answer)
    }
}

/// Ask `question` until a valid answer is read
///
/// Empty input or end of input selects `default_answer`. After
/// [`MAX_ATTEMPTS`] invalid answers the default is used as well.
pub fn ask_with<R, W>(input: &mut R, output: &mut W, question: &str, default_answer: bool) -> bool
where
    R: BufRead,
    W: Write,
{
    for _ in 0..MAX_ATTEMPTS {
        let _ = write!(output, "{question}");
        let _ = output.flush();

        let mut line = String::new();
        match input.read_line(&mut line) {
            Ok(0) | Err(_) => return default_answer,
            Ok(_) => {}
        }

        match classify(&line) {
            Answer::Yes => return true,
            Answer::No => return false,
            Answer::Default => return default_answer,
            Answer::Invalid => continue,
        }
    }

    warn!(attempts = MAX_ATTEMPTS, default = default_answer, "Too many invalid answers, using default");
    default_answer
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn ask(input: &str, default_answer: bool) -> (bool, String) {
        let mut output = Vec::new();
        let answer = ask_with(&mut Cursor::new(input), &mut output, "Restart? [Y/n] ", default_answer);
        (answer, String::from_utf8(output).unwrap())
    }

    #[test]
    fn test_explicit_answers() {
        assert!(ask("y\n", false).0);
        assert!(ask("Y\r\n", false).0);
        assert!(!ask("n\n", true).0);
        assert!(!ask("N\n", true).0);
    }

    #[test]
    fn test_empty_and_eof_use_default() {
        assert!(ask("\n", true).0);
        assert!(!ask("\n", false).0);
        assert!(ask("", true).0);
    }

    #[test]
    fn test_invalid_answer_asks_again() {
        let (answer, output) = ask("maybe\nyes please\nn\n", true);
        assert!(!answer);
        assert_eq!(output.matches("Restart?").count(), 3);
    }

    #[test]
    fn test_repeated_invalid_input_is_bounded() {
        let input = "x\n".repeat(MAX_ATTEMPTS * 10);
        let (answer, output) = ask(&input, true);
        assert!(answer);
        assert_eq!(output.matches("Restart?").count(), MAX_ATTEMPTS);
    }

    #[test]
    fn test_quiet_mode_skips_input() {
        assert!(Prompt::new(true).ask("unused", false, true));
        assert!(!Prompt::new(true).ask("unused", true, false));
    }
}
