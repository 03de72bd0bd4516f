use std::io::{self, Write};

use crate::error::{ErrorKind, Notice};
use crate::models::{NormalizedResult, WordInfo};
use crate::normalize::normalize;
use crate::upload::UploadOutcome;

/// Display surfaces a router can drive.
pub trait Presenter {
    fn summary(&mut self, result: &NormalizedResult) -> io::Result<()>;
    fn detail(&mut self, word: &str, info: &WordInfo) -> io::Result<()>;
    fn no_results(&mut self) -> io::Result<()>;
    fn word_not_found(&mut self, word: &str) -> io::Result<()>;
    fn notice(&mut self, notice: &Notice) -> io::Result<()>;
}

/// What the router ended up showing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Screen {
    Summary,
    Detail(String),
    NoResults,
    WordNotFound(String),
    Notice(ErrorKind),
    /// Cancelled attempts leave the previous screen as it was.
    Unchanged,
}

/// Hands upload outcomes to a [`Presenter`].
pub struct PresentationRouter<P> {
    presenter: P,
    result: Option<NormalizedResult>,
}

impl<P: Presenter> PresentationRouter<P> {
    pub fn new(presenter: P) -> Self {
        Self {
            presenter,
            result: None,
        }
    }

    pub fn result(&self) -> Option<&NormalizedResult> {
        self.result.as_ref()
    }

    pub fn presenter(&self) -> &P {
        &self.presenter
    }

    /// Normalizes a successful outcome and shows its summary, or shows the
    /// notice for a failure. A failure clears any earlier result.
    pub fn deliver(&mut self, outcome: UploadOutcome) -> io::Result<Screen> {
        match outcome {
            UploadOutcome::Success(payload) => self.show(normalize(payload)),
            UploadOutcome::Failure(kind, _) => {
                let Some(notice) = kind.notice() else {
                    return Ok(Screen::Unchanged);
                };
                self.result = None;
                self.presenter.notice(&notice)?;
                Ok(Screen::Notice(kind))
            }
        }
    }

    pub fn show(&mut self, result: NormalizedResult) -> io::Result<Screen> {
        self.result = Some(result);
        self.show_summary()
    }

    pub fn show_summary(&mut self) -> io::Result<Screen> {
        match &self.result {
            Some(result) if !result.is_empty() => {
                self.presenter.summary(result)?;
                Ok(Screen::Summary)
            }
            _ => {
                self.presenter.no_results()?;
                Ok(Screen::NoResults)
            }
        }
    }

    pub fn show_detail(&mut self, word: &str) -> io::Result<Screen> {
        let Some(result) = &self.result else {
            self.presenter.no_results()?;
            return Ok(Screen::NoResults);
        };
        match result.word(word) {
            Some(info) => {
                self.presenter.detail(word, info)?;
                Ok(Screen::Detail(word.to_string()))
            }
            None => {
                self.presenter.word_not_found(word)?;
                Ok(Screen::WordNotFound(word.to_string()))
            }
        }
    }
}

/// Spells out WordNet-style part-of-speech codes.
pub fn expand_pos(pos: &str) -> &str {
    match pos {
        "n" => "noun",
        "v" => "verb",
        "a" => "adjective",
        "r" => "adverb",
        other => other,
    }
}

// ── Terminal rendering ───────────────────────────────────────────────────────

/// Plain-text presenter for a terminal or any other writer.
pub struct TerminalPresenter<W> {
    out: W,
}

impl<W: Write> TerminalPresenter<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> Presenter for TerminalPresenter<W> {
    fn summary(&mut self, result: &NormalizedResult) -> io::Result<()> {
        let detected = result.original_text.trim();
        if !detected.is_empty() {
            writeln!(self.out, "Detected Text:")?;
            writeln!(self.out, "  {detected}")?;
            writeln!(self.out)?;
        }
        writeln!(self.out, "Complex Words & Definitions")?;
        writeln!(self.out)?;
        for (word, info) in &result.words {
            writeln!(self.out, "{}: {}", word, info.definition)?;
        }
        if let Some(seconds) = result.processing_time {
            writeln!(self.out)?;
            writeln!(self.out, "Processed in {seconds}")?;
        }
        Ok(())
    }

    fn detail(&mut self, word: &str, info: &WordInfo) -> io::Result<()> {
        writeln!(self.out, "{word}")?;
        if let Some(pos) = &info.pos {
            writeln!(self.out, "({})", expand_pos(pos))?;
        }
        writeln!(self.out)?;
        writeln!(self.out, "Meaning")?;
        writeln!(self.out, "  {}", info.definition)?;
        if let Some(example) = info.example.as_ref().filter(|e| !e.is_empty()) {
            writeln!(self.out, "Example")?;
            writeln!(self.out, "  \"{example}\"")?;
        }
        if let Some(synonyms) = info.synonyms.as_ref().filter(|s| !s.is_empty()) {
            writeln!(self.out, "Similar Words")?;
            writeln!(self.out, "  {}", synonyms.join(", "))?;
        }
        if let Some(antonyms) = info.antonyms.as_ref().filter(|a| !a.is_empty()) {
            writeln!(self.out, "Opposite Words")?;
            writeln!(self.out, "  {}", antonyms.join(", "))?;
        }
        Ok(())
    }

    fn no_results(&mut self) -> io::Result<()> {
        writeln!(self.out, "No results found. Take or choose a photo and scan again.")
    }

    fn word_not_found(&mut self, word: &str) -> io::Result<()> {
        writeln!(self.out, "No word details found for \"{word}\".")
    }

    fn notice(&mut self, notice: &Notice) -> io::Result<()> {
        writeln!(self.out, "{}: {}", notice.title, notice.message)
    }
}
