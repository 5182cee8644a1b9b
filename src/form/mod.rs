//! Record form: field buffers, the actions bound to them, and the log pane they write to.
//!
//! The form knows nothing about terminals. Each action returns a [`Feedback`] telling the
//! front end whether to show a modal; everything else lands in the [`OutputLog`].

mod backend;
mod output;

pub use backend::{CollectionBackend, RecordBackend};
pub use output::{DEFAULT_LOG_CAPACITY, OutputLog};

use crate::errors::DbError;
use crate::record::{COLUMNS, Record};

/// Default content of the row-count field.
pub const DEFAULT_ROW_COUNT: &str = "5";

/// What the front end should do after an action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Feedback {
    /// Outcome (if any) was written to the log.
    Logged,
    Warning { title: String, message: String },
    /// Ask yes/no, then call [`Form::answer`].
    Confirm { title: String, message: String },
}

impl Feedback {
    fn warning(title: &str, message: impl Into<String>) -> Self {
        Self::Warning { title: title.to_string(), message: message.into() }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PendingAction {
    Delete { id: String },
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Phase {
    #[default]
    Idle,
    AwaitingConfirmation(PendingAction),
}

/// Label shown next to a column's input.
#[must_use]
pub fn label(column: &str) -> String {
    let mut chars = column.chars();
    chars.next().map_or_else(String::new, |c| format!("{}{}:", c.to_uppercase(), chars.as_str()))
}

pub struct Form<B: RecordBackend> {
    backend: B,
    fields: [String; COLUMNS.len()],
    row_count: String,
    log: OutputLog,
    phase: Phase,
}

impl<B: RecordBackend> std::fmt::Debug for Form<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Form")
            .field("fields", &self.fields)
            .field("row_count", &self.row_count)
            .field("phase", &self.phase)
            .field("log_lines", &self.log.len())
            .finish_non_exhaustive()
    }
}

impl<B: RecordBackend> Form<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            fields: Default::default(),
            row_count: DEFAULT_ROW_COUNT.to_string(),
            log: OutputLog::default(),
            phase: Phase::Idle,
        }
    }

    pub const fn backend(&self) -> &B {
        &self.backend
    }

    pub const fn fields(&self) -> &[String; COLUMNS.len()] {
        &self.fields
    }

    /// Buffer of the `index`-th column, in [`COLUMNS`] order.
    pub fn field_mut(&mut self, index: usize) -> Option<&mut String> {
        self.fields.get_mut(index)
    }

    /// Current value of a column; `None` for unknown names.
    pub fn field(&self, column: &str) -> Option<&str> {
        COLUMNS.iter().position(|c| *c == column).map(|i| self.fields[i].as_str())
    }

    pub fn set_field(&mut self, column: &str, value: impl Into<String>) -> bool {
        match COLUMNS.iter().position(|c| *c == column) {
            Some(i) => {
                self.fields[i] = value.into();
                true
            }
            None => false,
        }
    }

    pub fn row_count(&self) -> &str {
        &self.row_count
    }

    pub const fn row_count_mut(&mut self) -> &mut String {
        &mut self.row_count
    }

    pub const fn log(&self) -> &OutputLog {
        &self.log
    }

    pub const fn log_mut(&mut self) -> &mut OutputLog {
        &mut self.log
    }

    pub const fn phase(&self) -> &Phase {
        &self.phase
    }

    /// The record the fields currently describe, values trimmed.
    pub fn record(&self) -> Record {
        let trimmed = self.fields.clone().map(|v| v.trim().to_string());
        Record::from_values(&trimmed)
    }

    fn id(&self) -> String {
        self.fields[0].trim().to_string()
    }

    fn fail(&mut self, context: &str, err: &DbError) {
        log::warn!("{context}: {err}");
        self.log.push(format!("{context}: {err}"));
    }

    pub fn insert(&mut self) -> Feedback {
        self.phase = Phase::Idle;
        let record = self.record();
        if !record.missing_fields().is_empty() {
            self.log.push("Wszystkie pola muszą być wypełnione.");
            return Feedback::warning("Brak danych", "Wszystkie pola muszą być wypełnione.");
        }
        match self.backend.insert(&record) {
            Ok(()) => self.log.push(format!("Dodano: {record}")),
            Err(DbError::DuplicateKey { .. }) => {
                self.log.push(format!("Błąd podczas dodawania danych: rekord o ID={} już istnieje.", record.id));
            }
            Err(e) => self.fail("Błąd podczas dodawania danych", &e),
        }
        Feedback::Logged
    }

    /// Start a delete. Nothing is removed until [`Form::answer`] confirms.
    pub fn delete(&mut self) -> Feedback {
        let id = self.id();
        if id.is_empty() {
            self.phase = Phase::Idle;
            return Feedback::warning("Brak ID", "Wprowadź ID do usunięcia.");
        }
        let message = format!("Czy na pewno usunąć ID={id}?");
        self.phase = Phase::AwaitingConfirmation(PendingAction::Delete { id });
        Feedback::Confirm { title: "Potwierdzenie".into(), message }
    }

    /// Resolve a pending confirmation. A no-op when nothing is pending.
    pub fn answer(&mut self, yes: bool) -> Feedback {
        let Phase::AwaitingConfirmation(action) = std::mem::take(&mut self.phase) else {
            return Feedback::Logged;
        };
        if yes {
            match action {
                PendingAction::Delete { id } => self.run_delete(&id),
            }
        }
        Feedback::Logged
    }

    pub fn confirm_delete(&mut self) -> Feedback {
        self.answer(true)
    }

    pub fn cancel_pending(&mut self) {
        self.phase = Phase::Idle;
    }

    fn run_delete(&mut self, id: &str) {
        match self.backend.delete(id) {
            Ok(0) => self.log.push(format!("Brak rekordu o ID={id}")),
            Ok(_) => self.log.push(format!("Usunięto rekord ID={id}")),
            Err(e) => self.fail("Błąd podczas usuwania", &e),
        }
    }

    /// Look a record up by id and load it into the fields.
    pub fn find(&mut self) -> Feedback {
        self.phase = Phase::Idle;
        let id = self.id();
        if id.is_empty() {
            return Feedback::warning("Brak ID", "Wprowadź ID do wyszukania.");
        }
        match self.backend.find(&id) {
            Ok(Some(doc)) => {
                self.log.push(format!("Znaleziono: {doc}"));
                let found = Record::from_document(&doc);
                self.fields = [found.id, found.nazwa, found.opis, found.kategoria];
            }
            Ok(None) => self.log.push(format!("Nie znaleziono rekordu o ID={id}")),
            Err(e) => self.fail("Błąd podczas wyszukiwania", &e),
        }
        Feedback::Logged
    }

    pub fn update(&mut self) -> Feedback {
        self.phase = Phase::Idle;
        let record = self.record();
        if record.id.is_empty() {
            self.log.push("Musisz podać ID do aktualizacji.");
            return Feedback::warning("Brak ID", "Musisz podać ID do aktualizacji.");
        }
        if !record.missing_fields().is_empty() {
            self.log.push("Wszystkie pola muszą być wypełnione.");
            return Feedback::warning("Brak danych", "Wszystkie pola muszą być wypełnione.");
        }
        match self.backend.update(&record) {
            Ok(_) => self.log.push(format!("Zaktualizowano dane: {record}")),
            Err(DbError::NotFound(_)) => {
                self.log.push(format!("Nie udało się zaktualizować rekordu o ID={}", record.id));
            }
            Err(e) => {
                log::warn!("update of id={} failed: {e}", record.id);
                self.log.push(format!("Nie udało się zaktualizować rekordu o ID={}: {e}", record.id));
            }
        }
        Feedback::Logged
    }

    /// Print the last N records, N taken from the row-count field.
    pub fn show_last_rows(&mut self) -> Feedback {
        self.phase = Phase::Idle;
        let text = self.row_count.trim();
        let limit = match text.parse::<usize>() {
            Ok(n) if text.bytes().all(|b| b.is_ascii_digit()) => n,
            _ => {
                self.log.push("Błąd: Wpisz poprawną liczbę wierszy.");
                return Feedback::Logged;
            }
        };
        let docs = match self.backend.all() {
            Ok(docs) => docs,
            Err(e) => {
                self.fail("Błąd podczas odczytu kolekcji", &e);
                return Feedback::Logged;
            }
        };
        if docs.is_empty() {
            self.log.push("Brak wyników w kolekcji.");
            return Feedback::Logged;
        }
        self.log.push(format!("Ostatnie {limit} rekordów:"));
        for doc in &docs[docs.len().saturating_sub(limit)..] {
            self.log.push(doc.to_string());
        }
        Feedback::Logged
    }

    /// Empty every input field.
    pub fn clear(&mut self) -> Feedback {
        self.phase = Phase::Idle;
        for f in &mut self.fields {
            f.clear();
        }
        Feedback::Logged
    }
}
