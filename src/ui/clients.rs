use anyhow::Result;
use crossterm::event::{self, Event, KeyCode};
use tui::{
    backend::Backend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Span, Spans},
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph},
    Frame,
};

use crate::models::{Client, ClientQuery};

// Represents the state of the client list screen
pub struct ClientsState {
    clients: Vec<Client>,
    query: ClientQuery,
    visible: Vec<Client>,
    list_state: ListState,
    searching: bool,
    show_delete_confirmation: bool,
}

impl ClientsState {
    pub fn new(clients: Vec<Client>) -> Self {
        Self::with_query(clients, ClientQuery::default())
    }

    pub fn with_query(clients: Vec<Client>, query: ClientQuery) -> Self {
        let mut state = Self {
            clients,
            query,
            visible: Vec::new(),
            list_state: ListState::default(),
            searching: false,
            show_delete_confirmation: false,
        };
        state.refresh();
        state
    }

    /// Keep the cursor on `id` if it is still listed
    pub fn with_selection(mut self, id: i32) -> Self {
        if let Some(i) = self.visible.iter().position(|c| c.id() == id) {
            self.list_state.select(Some(i));
        }
        self
    }

    pub fn query(&self) -> &ClientQuery {
        &self.query
    }

    pub fn visible(&self) -> &[Client] {
        &self.visible
    }

    pub fn is_searching(&self) -> bool {
        self.searching
    }

    // Re-filter and re-sort, keeping the selected client when it is still visible
    fn refresh(&mut self) {
        let selected = self.selected_client_id();
        self.visible = self.query.apply(&self.clients);

        let index = selected
            .and_then(|id| self.visible.iter().position(|c| c.id() == id))
            .or(if self.visible.is_empty() { None } else { Some(0) });
        self.list_state.select(index);
    }

    pub fn push_search(&mut self, c: char) {
        self.query.search.push(c);
        self.refresh();
    }

    pub fn pop_search(&mut self) {
        self.query.search.pop();
        self.refresh();
    }

    pub fn clear_search(&mut self) {
        self.query.search.clear();
        self.refresh();
    }

    pub fn cycle_sort(&mut self) {
        self.query.cycle_sort();
        self.refresh();
    }

    pub fn next(&mut self) {
        if self.visible.is_empty() {
            return;
        }

        let i = match self.list_state.selected() {
            Some(i) if i + 1 < self.visible.len() => i + 1,
            _ => 0,
        };
        self.list_state.select(Some(i));
    }

    pub fn previous(&mut self) {
        if self.visible.is_empty() {
            return;
        }

        let i = match self.list_state.selected() {
            Some(0) | None => self.visible.len() - 1,
            Some(i) => i - 1,
        };
        self.list_state.select(Some(i));
    }

    pub fn toggle_delete_confirmation(&mut self) {
        self.show_delete_confirmation = !self.show_delete_confirmation;
    }

    pub fn selected_client(&self) -> Option<&Client> {
        self.list_state.selected().and_then(|i| self.visible.get(i))
    }

    pub fn selected_client_id(&self) -> Option<i32> {
        self.selected_client().map(|c| c.id())
    }
}

#[derive(Debug, PartialEq, Eq)]
pub enum ClientAction {
    Quit,
    NewClient,
    EditClient(i32),
    DeleteClient(i32),
}

pub fn render_clients<B: Backend>(frame: &mut Frame<B>, state: &mut ClientsState) {
    let size = frame.size();

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints(
            [
                Constraint::Length(3),
                Constraint::Min(1),
                Constraint::Length(3),
            ]
            .as_ref(),
        )
        .split(size);

    let search_style = if state.is_searching() {
        Style::default().fg(Color::Yellow)
    } else {
        Style::default()
    };
    let cursor = if state.is_searching() { "|" } else { "" };
    let search = Paragraph::new(format!("/{}{}", state.query.search, cursor))
        .style(search_style)
        .block(
            Block::default()
                .title(format!("Search | Sort: {}", state.query))
                .borders(Borders::ALL),
        );
    frame.render_widget(search, chunks[0]);

    let items: Vec<ListItem> = state
        .visible
        .iter()
        .map(|client| {
            ListItem::new(Spans::from(vec![
                Span::styled(
                    format!("{:<40}", client.to_string()),
                    Style::default().add_modifier(Modifier::BOLD),
                ),
                Span::raw(format!("{:<32}", client.phone().unwrap_or("-"))),
                Span::styled(
                    client.created_at().format("%Y-%m-%d %H:%M").to_string(),
                    Style::default().fg(Color::Gray),
                ),
            ]))
        })
        .collect();

    let title = format!("Clients ({} of {})", state.visible().len(), state.clients.len());
    let clients_list = List::new(items)
        .block(Block::default().title(title).borders(Borders::ALL))
        .highlight_style(
            Style::default()
                .bg(Color::Blue)
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        );

    frame.render_stateful_widget(clients_list, chunks[1], &mut state.list_state);

    let buttons_text = if state.is_searching() {
        "Type to filter | <Enter> Keep filter | <Esc> Clear filter"
    } else if state.selected_client().is_some() {
        "<N> New | <E> Edit | <D> Delete | </> Search | <S> Sort | <Q> Quit"
    } else {
        "<N> New | </> Search | <S> Sort | <Q> Quit"
    };

    let buttons = Paragraph::new(buttons_text)
        .block(Block::default().borders(Borders::TOP))
        .style(Style::default().fg(Color::White));

    frame.render_widget(buttons, chunks[2]);

    if state.show_delete_confirmation {
        let name = state
            .selected_client()
            .map(|c| c.to_string())
            .unwrap_or_default();
        render_delete_confirmation(frame, size, &name);
    }
}

fn render_delete_confirmation<B: Backend>(frame: &mut Frame<B>, size: Rect, name: &str) {
    let popup_area = centered_rect(50, 20, size);

    let popup = Paragraph::new(vec![
        Spans::from(""),
        Spans::from(format!("Delete client {}?", name)),
        Spans::from(""),
        Spans::from("<Y> Yes  <N> No"),
    ])
    .block(Block::default().title("Confirm Delete").borders(Borders::ALL))
    .style(Style::default().fg(Color::White).bg(Color::Black));

    frame.render_widget(Clear, popup_area);
    frame.render_widget(popup, popup_area);
}

pub(crate) fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}

pub fn handle_key(state: &mut ClientsState, key: KeyCode) -> Option<ClientAction> {
    if state.show_delete_confirmation {
        match key {
            KeyCode::Char('y') | KeyCode::Char('Y') => {
                state.toggle_delete_confirmation();
                return state.selected_client_id().map(ClientAction::DeleteClient);
            }
            KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Char('q') | KeyCode::Esc => {
                state.toggle_delete_confirmation();
            }
            _ => {}
        }
        return None;
    }

    if state.searching {
        match key {
            KeyCode::Enter => state.searching = false,
            KeyCode::Esc => {
                state.searching = false;
                state.clear_search();
            }
            KeyCode::Backspace => state.pop_search(),
            KeyCode::Char(c) => state.push_search(c),
            KeyCode::Down => state.next(),
            KeyCode::Up => state.previous(),
            _ => {}
        }
        return None;
    }

    match key {
        // Esc drops an active filter before it quits
        KeyCode::Esc if !state.query.search.is_empty() => state.clear_search(),
        KeyCode::Char('q') | KeyCode::Esc => return Some(ClientAction::Quit),
        KeyCode::Char('/') => state.searching = true,
        KeyCode::Char('s') => state.cycle_sort(),
        KeyCode::Char('n') => return Some(ClientAction::NewClient),
        KeyCode::Char('e') | KeyCode::Enter => {
            return state.selected_client_id().map(ClientAction::EditClient);
        }
        KeyCode::Char('d') => {
            if state.selected_client().is_some() {
                state.toggle_delete_confirmation();
            }
        }
        KeyCode::Down => state.next(),
        KeyCode::Up => state.previous(),
        _ => {}
    }
    None
}

pub fn handle_input(state: &mut ClientsState) -> Result<Option<ClientAction>> {
    if let Event::Key(key) = event::read()? {
        return Ok(handle_key(state, key.code));
    }
    Ok(None)
}
