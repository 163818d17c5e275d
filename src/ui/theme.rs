use owo_colors::{OwoColorize, Style};
use std::sync::OnceLock;

static THEME: OnceLock<Theme> = OnceLock::new();

/// Role of a piece of terminal text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    Heading,
    Ok,
    Failed,
    Caution,
    Note,
    Faint,
    Sql,
}

impl Tone {
    fn style(self) -> Style {
        match self {
            Tone::Heading => Style::new().cyan().bold(),
            Tone::Ok => Style::new().green().bold(),
            Tone::Failed => Style::new().red().bold(),
            Tone::Caution => Style::new().yellow().bold(),
            Tone::Note => Style::new().magenta(),
            Tone::Faint => Style::new().bright_black(),
            Tone::Sql => Style::new().blue(),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Theme {
    colored: bool,
}

impl Theme {
    /// Colored on a terminal unless `NO_COLOR` is set.
    pub fn detect() -> Self {
        let no_color = std::env::var_os("NO_COLOR").is_some_and(|v| !v.is_empty());
        Self {
            colored: !no_color && console::Term::stdout().is_term(),
        }
    }

    pub fn plain() -> Self {
        Self { colored: false }
    }

    pub fn paint(&self, tone: Tone, text: &str) -> String {
        if self.colored {
            text.style(tone.style()).to_string()
        } else {
            text.to_string()
        }
    }
}

pub fn theme() -> &'static Theme {
    THEME.get_or_init(Theme::detect)
}

pub fn paint(tone: Tone, text: &str) -> String {
    theme().paint(tone, text)
}
