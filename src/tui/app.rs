//! Terminal-side state around the record form: focus ring, open modal, quit flag.

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use crate::form::{Feedback, Form, RecordBackend};
use crate::record::COLUMNS;

/// Number of record inputs, for layout.
pub const FIELD_COUNT: usize = COLUMNS.len();

/// Lines moved per PageUp/PageDown in the log pane.
const SCROLL_STEP: usize = 5;

/// Buttons under the fields, in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Button {
    Add,
    Delete,
    Find,
    Update,
    LastRows,
}

impl Button {
    pub const ALL: [Self; 5] = [Self::Add, Self::Delete, Self::Find, Self::Update, Self::LastRows];

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Add => "Dodaj",
            Self::Delete => "Usuń",
            Self::Find => "Szukaj",
            Self::Update => "Aktualizuj",
            Self::LastRows => "Ostatnie",
        }
    }

    #[must_use]
    pub const fn shortcut(self) -> &'static str {
        match self {
            Self::Add => "F2",
            Self::Delete => "F3",
            Self::Find => "F4",
            Self::Update => "F5",
            Self::LastRows => "F6",
        }
    }
}

/// Focusable widget
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    /// Input for `COLUMNS[i]`
    Field(usize),
    RowCount,
    Button(Button),
}

const FOCUS_RING: [Focus; 10] = [
    Focus::Field(0),
    Focus::Field(1),
    Focus::Field(2),
    Focus::Field(3),
    Focus::Button(Button::Add),
    Focus::Button(Button::Delete),
    Focus::Button(Button::Find),
    Focus::Button(Button::Update),
    Focus::RowCount,
    Focus::Button(Button::LastRows),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModalKind {
    Warning,
    Confirm,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Modal {
    pub kind: ModalKind,
    pub title: String,
    pub message: String,
}

/// Result of handling a key event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandleResult {
    Continue,
    Quit,
}

pub struct App<B: RecordBackend> {
    pub form: Form<B>,
    pub focus: Focus,
    pub modal: Option<Modal>,
    pub should_quit: bool,
    /// Shown in the title bar, e.g. `mem:// NoName/mycollection`.
    pub title: String,
}

impl<B: RecordBackend> App<B> {
    pub fn new(form: Form<B>, title: impl Into<String>) -> Self {
        Self { form, focus: Focus::Field(0), modal: None, should_quit: false, title: title.into() }
    }

    fn focus_index(&self) -> usize {
        FOCUS_RING.iter().position(|f| *f == self.focus).unwrap_or(0)
    }

    pub fn focus_next(&mut self) {
        self.focus = FOCUS_RING[(self.focus_index() + 1) % FOCUS_RING.len()];
    }

    pub fn focus_prev(&mut self) {
        self.focus = FOCUS_RING[(self.focus_index() + FOCUS_RING.len() - 1) % FOCUS_RING.len()];
    }

    /// Buffer behind the focused widget, if it is a text input.
    fn focused_input(&mut self) -> Option<&mut String> {
        match self.focus {
            Focus::Field(i) => self.form.field_mut(i),
            Focus::RowCount => Some(self.form.row_count_mut()),
            Focus::Button(_) => None,
        }
    }

    pub fn press(&mut self, button: Button) {
        log::debug!("button pressed: {}", button.label());
        let feedback = match button {
            Button::Add => self.form.insert(),
            Button::Delete => self.form.delete(),
            Button::Find => self.form.find(),
            Button::Update => self.form.update(),
            Button::LastRows => self.form.show_last_rows(),
        };
        self.show(feedback);
    }

    fn show(&mut self, feedback: Feedback) {
        self.modal = match feedback {
            Feedback::Logged => None,
            Feedback::Warning { title, message } => Some(Modal { kind: ModalKind::Warning, title, message }),
            Feedback::Confirm { title, message } => Some(Modal { kind: ModalKind::Confirm, title, message }),
        };
    }

    fn answer(&mut self, yes: bool) {
        self.modal = None;
        let feedback = self.form.answer(yes);
        self.show(feedback);
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> HandleResult {
        if key.kind == KeyEventKind::Release {
            return HandleResult::Continue;
        }
        if key.modifiers.contains(KeyModifiers::CONTROL) {
            match key.code {
                KeyCode::Char('c') => return self.quit(),
                KeyCode::Char('l') => {
                    let feedback = self.form.clear();
                    self.show(feedback);
                    return HandleResult::Continue;
                }
                // AltGr arrives as Ctrl+Alt on some platforms and still types text.
                _ if !key.modifiers.contains(KeyModifiers::ALT) => return HandleResult::Continue,
                _ => {}
            }
        }
        if let Some(modal) = &self.modal {
            match (modal.kind, key.code) {
                (ModalKind::Confirm, KeyCode::Char('t' | 'T' | 'y' | 'Y') | KeyCode::Enter) => self.answer(true),
                (ModalKind::Confirm, KeyCode::Char('n' | 'N') | KeyCode::Esc) => self.answer(false),
                (ModalKind::Confirm, _) => {}
                (ModalKind::Warning, _) => self.modal = None,
            }
            return HandleResult::Continue;
        }
        match key.code {
            KeyCode::Esc => return self.quit(),
            KeyCode::Tab | KeyCode::Down => self.focus_next(),
            KeyCode::BackTab | KeyCode::Up => self.focus_prev(),
            KeyCode::F(n) => {
                if let Some(button) = Button::ALL.get(usize::from(n).wrapping_sub(2)) {
                    self.press(*button);
                }
            }
            KeyCode::PageUp => self.form.log_mut().scroll_up(SCROLL_STEP),
            KeyCode::PageDown => self.form.log_mut().scroll_down(SCROLL_STEP),
            KeyCode::Enter => match self.focus {
                Focus::Button(button) => self.press(button),
                Focus::RowCount => self.press(Button::LastRows),
                Focus::Field(_) => self.focus_next(),
            },
            KeyCode::Backspace => {
                if let Some(input) = self.focused_input() {
                    input.pop();
                }
            }
            KeyCode::Char(c) => {
                if let Some(input) = self.focused_input() {
                    input.push(c);
                }
            }
            _ => {}
        }
        HandleResult::Continue
    }

    fn quit(&mut self) -> HandleResult {
        self.should_quit = true;
        HandleResult::Quit
    }
}
