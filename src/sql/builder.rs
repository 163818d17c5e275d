//! Word-oriented SQL text builder used to render DDL fragments.

/// Accumulates SQL words separated by single spaces.
#[derive(Debug, Clone, Default)]
pub struct StatementBuilder {
    buf: String,
}

impl StatementBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a word, separated from the previous one by a space.
    pub fn word(&mut self, word: &str) -> &mut Self {
        let word = word.trim();
        if word.is_empty() {
            return self;
        }
        if !self.buf.is_empty() {
            self.buf.push(' ');
        }
        self.buf.push_str(word);
        self
    }

    /// Append an expression between brackets: `(exp)`.
    pub fn bracketed(&mut self, exp: &str) -> &mut Self {
        self.word(&format!("({})", exp.trim()))
    }

    /// Append a bracketed, comma separated list: `(a, b, c)`.
    pub fn list<I, S>(&mut self, items: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let joined = items
            .into_iter()
            .map(|s| s.as_ref().trim().to_string())
            .collect::<Vec<_>>()
            .join(", ");
        self.bracketed(&joined)
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn build(&self) -> String {
        self.buf.clone()
    }
}
