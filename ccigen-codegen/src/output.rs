//! Indentation-aware text sink.

/// An output stream of generated lines.
///
/// Also owns the loop counter used to name conversion loop variables, so
/// nested loops within one generated method never collide.
#[derive(Debug, Clone)]
pub struct Stream {
    buffer: String,
    level: usize,
    width: usize,
    counter: usize,
}

impl Stream {
    /// Creates an empty stream indenting by `width` spaces per level.
    #[must_use]
    pub fn new(width: usize) -> Self {
        Self {
            buffer: String::new(),
            level: 0,
            width,
            counter: 0,
        }
    }

    /// Writes one line at the current indentation.
    ///
    /// Text containing newlines is written line by line, each indented.
    pub fn write_line(&mut self, text: &str) {
        for line in text.split('\n') {
            if !line.is_empty() {
                self.buffer
                    .push_str(&" ".repeat(self.level * self.width));
                self.buffer.push_str(line);
            }
            self.buffer.push('\n');
        }
    }

    /// Writes an empty line.
    pub fn blank(&mut self) {
        self.buffer.push('\n');
    }

    /// Increases the indentation by one level.
    pub fn indent(&mut self) {
        self.level += 1;
    }

    /// Decreases the indentation by one level.
    pub fn dedent(&mut self) {
        self.level = self.level.saturating_sub(1);
    }

    /// Returns the current indentation level.
    #[must_use]
    pub fn level(&self) -> usize {
        self.level
    }

    /// Returns a fresh conversion loop variable name.
    pub fn next_loop_var(&mut self) -> String {
        let name = format!("_ci{}", self.counter);
        self.counter += 1;
        name
    }

    /// Restarts loop variable numbering for a new method body.
    pub fn reset_loop_vars(&mut self) {
        self.counter = 0;
    }

    /// Returns the text written so far.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.buffer
    }

    /// Consumes the stream and returns its text.
    #[must_use]
    pub fn into_string(self) -> String {
        self.buffer
    }
}
