//! Line-oriented question/answer loop

use super::question::{Answer, Question};
use crate::error::{InstallError, Result};
use std::io::{self, BufRead, Stdin, StdinLock, Stdout, Write};

/// Message printed before re-asking a bounded choice
pub const INVALID_CHOICE_MESSAGE: &str = "You must select one of the following answers";

/// Asks questions on a line reader and writes prompts to a writer
///
/// Invalid input is handled entirely here by asking again, so callers only
/// ever see a usable [`Answer`], a cancellation (input closed) or an I/O error.
pub struct PromptEngine<R, W> {
    reader: R,
    writer: W,
}

impl PromptEngine<StdinLock<'static>, Stdout> {
    /// Engine bound to the process standard input and output
    pub fn stdio() -> Self {
        let stdin: Stdin = io::stdin();
        Self::new(stdin.lock(), io::stdout())
    }
}

impl<R: BufRead, W: Write> PromptEngine<R, W> {
    pub fn new(reader: R, writer: W) -> Self {
        Self { reader, writer }
    }

    /// Ask until the operator gives an acceptable answer
    pub fn ask(&mut self, question: &Question) -> Result<Answer> {
        let mut prompt = question.render();
        loop {
            self.writer.write_all(prompt.as_bytes())?;
            self.writer.flush()?;

            let line = self.read_line()?;
            if let Some(answer) = question.resolve(&line) {
                return Ok(answer);
            }

            // Re-ask with the explanation in place of the question text
            let retry = Question::choice(
                INVALID_CHOICE_MESSAGE,
                question.allowed_values().iter().cloned(),
                question.default(),
            )?;
            prompt = retry.render();
        }
    }

    /// Yes/no convenience form
    pub fn ask_bool(&mut self, prompt: &str, default: bool) -> Result<bool> {
        let answer = self.ask(&Question::yes_no(prompt, default))?;
        Ok(answer.is_yes())
    }

    /// Free text with a default
    pub fn ask_text(&mut self, prompt: &str, default: &str) -> Result<String> {
        let answer = self.ask(&Question::text_with_default(prompt, default))?;
        Ok(answer.into_string())
    }

    /// Write an informational line between questions
    pub fn say(&mut self, line: &str) -> Result<()> {
        writeln!(self.writer, "{}", line)?;
        Ok(())
    }

    /// Give back the reader and writer (used by tests to inspect output)
    pub fn into_parts(self) -> (R, W) {
        (self.reader, self.writer)
    }

    fn read_line(&mut self) -> Result<String> {
        let mut buf = Vec::new();
        let read = self.reader.read_until(b'\n', &mut buf)?;
        if read == 0 {
            // Input closed (Ctrl+D or end of a scripted transcript)
            self.writer.write_all(b"\n")?;
            return Err(InstallError::Cancelled);
        }

        if buf.ends_with(b"\n") {
            buf.pop();
            if buf.ends_with(b"\r") {
                buf.pop();
            }
        }
        // Undecodable bytes never match a bounded choice, so those re-prompt
        Ok(String::from_utf8_lossy(&buf).into_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn engine(input: &str) -> PromptEngine<Cursor<Vec<u8>>, Vec<u8>> {
        PromptEngine::new(Cursor::new(input.as_bytes().to_vec()), Vec::new())
    }

    fn output(engine: PromptEngine<Cursor<Vec<u8>>, Vec<u8>>) -> String {
        let (_, out) = engine.into_parts();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_empty_input_yields_default_for_every_choice() {
        let cases: &[(&[&str], &str)] = &[
            (&["y", "n"], "y"),
            (&["y", "n"], "n"),
            (&["manual", "auto"], "auto"),
            (&["debug", "info", "warning", "error"], "info"),
            (&["only"], "only"),
        ];

        for (allowed, default) in cases {
            let q = Question::choice("Pick", allowed.iter().copied(), Some(*default)).unwrap();
            let mut e = engine("\n");
            assert_eq!(e.ask(&q).unwrap().as_str(), *default);
        }
    }

    #[test]
    fn test_invalid_choice_is_never_accepted() {
        let q = Question::yes_no("Install binary ?", true);
        let mut e = engine("yes\nmaybe\nN\nn\n");
        assert_eq!(e.ask(&q).unwrap().as_str(), "n");

        let out = output(e);
        assert_eq!(out.matches(INVALID_CHOICE_MESSAGE).count(), 3);
        assert!(out.starts_with(" * Install binary ? [y/n] (default: y) : "));
    }

    #[test]
    fn test_invalid_then_empty_resolves_default() {
        let q = Question::yes_no("Continue ?", false);
        let mut e = engine("o\n\n");
        assert_eq!(e.ask(&q).unwrap().as_str(), "n");
        assert_eq!(output(e).matches(INVALID_CHOICE_MESSAGE).count(), 1);
    }

    #[test]
    fn test_choice_without_default_reprompts_on_empty() {
        let q = Question::choice("Mode", ["manual", "auto"], None).unwrap();
        let mut e = engine("\nmanual\n");
        assert_eq!(e.ask(&q).unwrap().as_str(), "manual");
        assert_eq!(output(e).matches(INVALID_CHOICE_MESSAGE).count(), 1);
    }

    #[test]
    fn test_free_text_with_default() {
        let q = Question::text_with_default("Where ?", "/usr/bin");
        let mut e = engine("\n  /opt/archipel \n");
        assert_eq!(e.ask(&q).unwrap().as_str(), "/usr/bin");
        // Anything else is taken verbatim, whitespace included
        assert_eq!(e.ask(&q).unwrap().as_str(), "  /opt/archipel ");
    }

    #[test]
    fn test_free_text_without_default_accepts_empty() {
        let q = Question::text("Credentials");
        let mut e = engine("\n");
        assert_eq!(e.ask(&q).unwrap().as_str(), "");
    }

    #[test]
    fn test_crlf_is_stripped() {
        let mut e = engine("n\r\n");
        assert!(!e.ask_bool("Continue ?", true).unwrap());
    }

    #[test]
    fn test_closed_input_cancels() {
        let mut e = engine("");
        let err = e.ask_bool("Continue ?", true).unwrap_err();
        assert!(err.is_cancelled());
    }

    #[test]
    fn test_undecodable_input_reprompts() {
        let mut e = PromptEngine::new(Cursor::new(vec![0xff, 0xfe, b'\n', b'y', b'\n']), Vec::new());
        assert!(e.ask_bool("Continue ?", false).unwrap());
        assert_eq!(output(e).matches(INVALID_CHOICE_MESSAGE).count(), 1);

        let mut e = PromptEngine::new(Cursor::new(b"/srv/\xffdata\n".to_vec()), Vec::new());
        assert_eq!(e.ask_text("Where ?", "/var/lib").unwrap(), "/srv/\u{fffd}data");
    }

    #[test]
    fn test_last_line_without_newline_is_read() {
        let mut e = engine("/srv/data");
        assert_eq!(e.ask_text("Where ?", "/var/lib").unwrap(), "/srv/data");
    }
}
