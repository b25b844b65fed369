use std::borrow::Cow;
use std::cell::RefCell;
use std::rc::Rc;

pub trait Surface {
    /// Current rendered contents, line breaks included.
    fn contents(&self) -> String;

    fn replace_contents(&mut self, contents: &str);

    /// Append `text`, rendering each `'\n'` as this surface's line break.
    fn append_contents(&mut self, text: &str);

    /// Remove `count` trailing characters, `0 < count < contents().chars().count()`.
    fn remove_trailing(&mut self, count: usize) {
        let contents = self.contents();
        let keep = contents.chars().count().saturating_sub(count);
        let kept: String = contents.chars().take(keep).collect();
        self.replace_contents(&kept);
    }

    /// Whether the surface can still be rendered to. Detached targets are
    /// rejected when a request is admitted.
    fn is_attached(&self) -> bool {
        true
    }
}

/// A surface shared between the caller and the jobs that target it.
pub type SharedSurface = Rc<RefCell<dyn Surface>>;

pub fn shared<S: Surface + 'static>(surface: S) -> Rc<RefCell<S>> {
    Rc::new(RefCell::new(surface))
}

/// Delete the last `count` characters of the surface.
///
/// Non-positive counts leave it unchanged; counts reaching the current length
/// clear it.
pub fn delete_trailing(surface: &mut dyn Surface, count: i64) {
    if count <= 0 {
        return;
    }
    let len = surface.contents().chars().count();
    if count as u64 >= len as u64 {
        surface.replace_contents("");
    } else {
        surface.remove_trailing(count as usize);
    }
}

/// Replace each real newline in `text` with `line_break`. A backslash followed
/// by `n` is left alone.
pub fn translate_newlines<'a>(text: &'a str, line_break: &str) -> Cow<'a, str> {
    if line_break != "\n" && text.contains('\n') {
        Cow::Owned(text.replace('\n', line_break))
    } else {
        Cow::Borrowed(text)
    }
}

/// In-memory surface, used by tests and the frame recorder.
#[derive(Debug, Clone)]
pub struct BufferSurface {
    contents: String,
    line_break: String,
    attached: bool,
}

impl Default for BufferSurface {
    fn default() -> Self {
        Self::with_line_break("\n")
    }
}

impl BufferSurface {
    pub fn new() -> Self {
        Self::default()
    }

    /// A buffer rendering newlines as `<br>`, like an HTML element.
    pub fn html() -> Self {
        Self::with_line_break("<br>")
    }

    pub fn with_line_break(line_break: impl Into<String>) -> Self {
        Self {
            contents: String::new(),
            line_break: line_break.into(),
            attached: true,
        }
    }

    pub fn with_contents(mut self, contents: impl Into<String>) -> Self {
        self.contents = contents.into();
        self
    }

    pub fn detach(&mut self) {
        self.attached = false;
    }

    pub fn as_str(&self) -> &str {
        &self.contents
    }
}

impl Surface for BufferSurface {
    fn contents(&self) -> String {
        self.contents.clone()
    }

    fn replace_contents(&mut self, contents: &str) {
        self.contents.clear();
        self.contents.push_str(contents);
    }

    fn append_contents(&mut self, text: &str) {
        self.contents
            .push_str(&translate_newlines(text, &self.line_break));
    }

    fn remove_trailing(&mut self, count: usize) {
        for _ in 0..count {
            if self.contents.pop().is_none() {
                break;
            }
        }
    }

    fn is_attached(&self) -> bool {
        self.attached
    }
}
