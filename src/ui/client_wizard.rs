use anyhow::Result;
use chrono::{DateTime, Utc};
use crossterm::event::{self, Event, KeyCode};
use tui::{
    backend::Backend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Span, Spans},
    widgets::{Block, Borders, List, ListItem, Paragraph},
    Frame,
};

use crate::error::{Field, ValidationError};
use crate::models::{Client, NewClient, FIRSTNAME_MAX_LEN, LASTNAME_MAX_LEN, PHONE_MAX_LEN};

#[derive(Debug, PartialEq)]
pub enum ClientWizardAction {
    Cancel,
    /// `id` is `None` for a new client
    Save { id: Option<i32>, client: NewClient },
}

const FIELDS: [Field; 3] = [Field::Firstname, Field::Lastname, Field::Phone];

fn label(field: Field) -> &'static str {
    match field {
        Field::Firstname => "First name",
        Field::Lastname => "Last name",
        Field::Phone => "Phone",
    }
}

fn max_len(field: Field) -> usize {
    match field {
        Field::Firstname => FIRSTNAME_MAX_LEN,
        Field::Lastname => LASTNAME_MAX_LEN,
        Field::Phone => PHONE_MAX_LEN,
    }
}

pub struct ClientWizardState {
    client_id: Option<i32>,
    created_at: Option<DateTime<Utc>>,
    firstname: String,
    lastname: String,
    phone: String,
    current_field: Field,
    editing: bool,
    error: Option<ValidationError>,
}

impl ClientWizardState {
    pub fn new() -> Self {
        Self {
            client_id: None,
            created_at: None,
            firstname: String::new(),
            lastname: String::new(),
            phone: String::new(),
            current_field: Field::Firstname,
            editing: false,
            error: None,
        }
    }

    pub fn from_existing(client: &Client) -> Self {
        Self {
            client_id: Some(client.id()),
            created_at: Some(client.created_at()),
            firstname: client.firstname().to_string(),
            lastname: client.lastname().to_string(),
            phone: client.phone().unwrap_or_default().to_string(),
            ..Self::new()
        }
    }

    pub fn client_id(&self) -> Option<i32> {
        self.client_id
    }

    pub fn error(&self) -> Option<&ValidationError> {
        self.error.as_ref()
    }

    pub fn toggle_editing(&mut self) {
        self.editing = !self.editing;
    }

    pub fn next_field(&mut self) {
        self.current_field = match self.current_field {
            Field::Firstname => Field::Lastname,
            Field::Lastname => Field::Phone,
            Field::Phone => Field::Firstname,
        };
    }

    pub fn previous_field(&mut self) {
        self.current_field = match self.current_field {
            Field::Firstname => Field::Phone,
            Field::Lastname => Field::Firstname,
            Field::Phone => Field::Lastname,
        };
    }

    fn value(&self, field: Field) -> &str {
        match field {
            Field::Firstname => &self.firstname,
            Field::Lastname => &self.lastname,
            Field::Phone => &self.phone,
        }
    }

    pub fn edit_current_field(&mut self, key: KeyCode) {
        if !self.editing {
            return;
        }

        let field_value = match self.current_field {
            Field::Firstname => &mut self.firstname,
            Field::Lastname => &mut self.lastname,
            Field::Phone => &mut self.phone,
        };

        match key {
            KeyCode::Char(c) => {
                field_value.push(c);
            }
            KeyCode::Backspace => {
                field_value.pop();
            }
            _ => {}
        }
    }

    /// Validate the form. An empty phone is stored as absent.
    pub fn to_new_client(&self) -> Result<NewClient, ValidationError> {
        let phone = Some(self.phone.clone()).filter(|p| !p.is_empty());
        NewClient::new(self.firstname.clone(), self.lastname.clone(), phone)
    }

    /// Try to save; on a validation failure the wizard stays open on the offending field
    pub fn submit(&mut self) -> Option<ClientWizardAction> {
        match self.to_new_client() {
            Ok(client) => {
                self.error = None;
                Some(ClientWizardAction::Save {
                    id: self.client_id,
                    client,
                })
            }
            Err(err) => {
                self.current_field = err.field();
                self.error = Some(err);
                None
            }
        }
    }
}

impl Default for ClientWizardState {
    fn default() -> Self {
        Self::new()
    }
}

pub fn render_client_wizard<B: Backend>(f: &mut Frame<B>, state: &mut ClientWizardState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(2)
        .constraints(
            [
                Constraint::Length(3),
                Constraint::Min(6),
                Constraint::Length(3),
                Constraint::Length(3),
            ]
            .as_ref(),
        )
        .split(f.size());

    let title_text = match state.client_id {
        None => "New Client".to_string(),
        Some(id) => format!("Edit Client #{}", id),
    };

    let title = Paragraph::new(title_text)
        .style(Style::default().fg(Color::Cyan))
        .block(Block::default().borders(Borders::ALL));
    f.render_widget(title, chunks[0]);

    render_form(f, state, chunks[1]);

    let status = match (state.error(), state.created_at) {
        (Some(err), _) => Paragraph::new(err.to_string()).style(Style::default().fg(Color::Red)),
        (None, Some(created_at)) => Paragraph::new(format!(
            "Created {}",
            created_at.format("%Y-%m-%d %H:%M:%S UTC")
        ))
        .style(Style::default().fg(Color::Gray)),
        (None, None) => Paragraph::new(""),
    };
    f.render_widget(status.block(Block::default().borders(Borders::ALL)), chunks[2]);

    let help_text = if state.editing {
        "Enter - Save field | Esc - Stop editing"
    } else {
        "Enter - Edit field | Up/Down - Navigate fields | S - Save client | Esc - Cancel"
    };

    let help = Paragraph::new(help_text)
        .style(Style::default().fg(Color::Gray))
        .block(Block::default().borders(Borders::ALL));
    f.render_widget(help, chunks[3]);
}

fn render_form<B: Backend>(f: &mut Frame<B>, state: &ClientWizardState, area: Rect) {
    let items: Vec<ListItem> = FIELDS
        .iter()
        .map(|&field| {
            let value = state.value(field);
            let counter = format!("  ({}/{})", value.chars().count(), max_len(field));
            let selected = field == state.current_field;

            let label_style = if selected {
                Style::default().fg(Color::Yellow)
            } else {
                Style::default()
            };
            let value_span = if selected && state.editing {
                Span::styled(format!("{}|", value), Style::default().add_modifier(Modifier::BOLD))
            } else {
                Span::raw(value.to_string())
            };

            ListItem::new(Spans::from(vec![
                Span::styled(format!("{}: ", label(field)), label_style),
                value_span,
                Span::styled(counter, Style::default().fg(Color::DarkGray)),
            ]))
        })
        .collect();

    let form_list = List::new(items)
        .block(Block::default().borders(Borders::ALL).title("Client Details"));

    f.render_widget(form_list, area);
}

pub fn handle_key(state: &mut ClientWizardState, key: KeyCode) -> Option<ClientWizardAction> {
    match key {
        KeyCode::Esc => {
            if state.editing {
                state.toggle_editing();
            } else {
                return Some(ClientWizardAction::Cancel);
            }
        }
        KeyCode::Enter => state.toggle_editing(),
        KeyCode::Up if !state.editing => state.previous_field(),
        KeyCode::Down | KeyCode::Tab if !state.editing => state.next_field(),
        KeyCode::Char('s') | KeyCode::Char('S') if !state.editing => return state.submit(),
        _ if state.editing => state.edit_current_field(key),
        _ => {}
    }
    None
}

pub fn handle_input(state: &mut ClientWizardState) -> Result<Option<ClientWizardAction>> {
    if let Event::Key(key) = event::read()? {
        return Ok(handle_key(state, key.code));
    }
    Ok(None)
}
