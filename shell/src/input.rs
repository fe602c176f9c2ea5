//! Line-reading collaborator.

use anyhow::Result;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use std::io::{self, BufRead, IsTerminal, Write};

/// One outcome of asking for a line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    Line(String),
    /// The read was cut short (^C, or a signal landed mid-read). The caller
    /// simply prompts again.
    Interrupted,
    Eof,
}

/// Source of command lines for the interpreter loop.
pub trait LineSource {
    fn read_line(&mut self, prompt: &str) -> Result<Input>;
}

/// Reads from the controlling terminal through `rustyline`, or plainly
/// from stdin when it is a pipe or file.
pub struct Terminal {
    editor: Option<DefaultEditor>,
}

impl Terminal {
    pub fn new() -> Result<Self> {
        let editor = if io::stdin().is_terminal() {
            Some(DefaultEditor::new()?)
        } else {
            None
        };
        Ok(Self { editor })
    }
}

impl LineSource for Terminal {
    fn read_line(&mut self, prompt: &str) -> Result<Input> {
        match &mut self.editor {
            Some(editor) => read_edited(editor, prompt),
            None => read_plain(prompt),
        }
    }
}

fn read_edited(editor: &mut DefaultEditor, prompt: &str) -> Result<Input> {
    match editor.readline(prompt) {
        Ok(line) => {
            if !line.trim().is_empty() {
                let _ = editor.add_history_entry(line.as_str());
            }
            Ok(Input::Line(line))
        }
        Err(ReadlineError::Interrupted) => Ok(Input::Interrupted),
        Err(ReadlineError::Eof) => Ok(Input::Eof),
        Err(ReadlineError::Io(e)) if e.kind() == io::ErrorKind::Interrupted => {
            Ok(Input::Interrupted)
        }
        Err(e) => Err(e.into()),
    }
}

fn read_plain(prompt: &str) -> Result<Input> {
    let mut stdout = io::stdout();
    stdout.write_all(prompt.as_bytes())?;
    stdout.flush()?;

    let mut buf = Vec::new();
    match io::stdin().lock().read_until(b'\n', &mut buf) {
        Ok(0) => Ok(Input::Eof),
        Ok(_) => Ok(Input::Line(String::from_utf8_lossy(&buf).into_owned())),
        Err(e) if e.kind() == io::ErrorKind::Interrupted => Ok(Input::Interrupted),
        Err(e) => Err(e.into()),
    }
}

/// Replays a fixed list of lines, then reports end of input.
pub struct Script {
    lines: std::vec::IntoIter<String>,
}

impl Script {
    pub fn new<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let lines: Vec<String> = lines.into_iter().map(Into::into).collect();
        Self {
            lines: lines.into_iter(),
        }
    }
}

impl LineSource for Script {
    fn read_line(&mut self, _prompt: &str) -> Result<Input> {
        Ok(self.lines.next().map_or(Input::Eof, Input::Line))
    }
}
