use std::io::{self, Write};

use crate::surface::Surface;

const CLEAR_SCREEN: &str = "\x1b[2J\x1b[1;1H";

/// Surface that renders to a terminal-like sink.
///
/// Contents are tracked so deletions can be rendered as backspaces. The first
/// write error is kept and later output is skipped; see
/// [`TerminalSurface::take_error`].
pub struct TerminalSurface<W: Write> {
    out: W,
    contents: String,
    error: Option<io::Error>,
}

impl TerminalSurface<io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write> TerminalSurface<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            contents: String::new(),
            error: None,
        }
    }

    pub fn take_error(&mut self) -> Option<io::Error> {
        self.error.take()
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn emit(&mut self, bytes: &[u8]) {
        if self.error.is_some() {
            return;
        }
        let res = self.out.write_all(bytes).and_then(|_| self.out.flush());
        if let Err(err) = res {
            self.error = Some(err);
        }
    }
}

impl<W: Write> Surface for TerminalSurface<W> {
    fn contents(&self) -> String {
        self.contents.clone()
    }

    fn replace_contents(&mut self, contents: &str) {
        self.contents = contents.to_string();
        let mut frame = String::from(CLEAR_SCREEN);
        frame.push_str(contents);
        self.emit(frame.as_bytes());
    }

    fn append_contents(&mut self, text: &str) {
        self.contents.push_str(text);
        self.emit(text.as_bytes());
    }

    fn remove_trailing(&mut self, count: usize) {
        let keep = self.contents.chars().count().saturating_sub(count);
        let split = self
            .contents
            .char_indices()
            .nth(keep)
            .map_or(self.contents.len(), |(i, _)| i);
        let removed = self.contents.split_off(split);

        // A backspace cannot cross a line break; redraw instead.
        if removed.contains('\n') {
            let contents = self.contents.clone();
            self.replace_contents(&contents);
        } else {
            let erase = "\x08 \x08".repeat(removed.chars().count());
            self.emit(erase.as_bytes());
        }
    }
}
