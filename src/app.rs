use crate::companion::{Companion, DataEvent, ViewState};
use crate::event::{Event, EventHandler};
use crate::remote::AuthProvider;
use crate::ui;
use crate::ui::components::{KeyResult, SearchEvent, SearchInput};
use color_eyre::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use crossterm::terminal::{
  disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use crossterm::ExecutableCommand;
use ratatui::prelude::*;
use ratatui::widgets::ListState;
use std::io::{stdout, Stdout};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{info, warn};

/// Account used for the "sign in again" action
#[derive(Clone)]
pub struct Credentials {
  pub email: String,
  pub password: String,
}

/// Main application state
pub struct App {
  companion: Companion,
  data_rx: mpsc::UnboundedReceiver<DataEvent>,
  auth: Arc<dyn AuthProvider>,
  credentials: Option<Credentials>,
  backend_url: String,

  /// Highlighted row in the patient list
  list_state: ListState,
  search: SearchInput,

  /// Transient status message (sign-in progress and results)
  notice: Option<String>,

  /// Event sender for async tasks
  event_tx: Option<mpsc::UnboundedSender<Event>>,

  should_quit: bool,
}

impl App {
  pub fn new(
    (companion, data_rx): (Companion, mpsc::UnboundedReceiver<DataEvent>),
    auth: Arc<dyn AuthProvider>,
    credentials: Option<Credentials>,
    backend_url: String,
  ) -> Self {
    Self {
      companion,
      data_rx,
      auth,
      credentials,
      backend_url,
      list_state: ListState::default(),
      search: SearchInput::new(),
      notice: None,
      event_tx: None,
      should_quit: false,
    }
  }

  pub async fn run(&mut self) -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout()))?;

    let mut events = EventHandler::new(Duration::from_millis(250));
    self.event_tx = Some(events.sender());

    if self.auth.current_session().is_some() {
      self.companion.start();
    } else {
      self.sign_in();
    }

    let result = self.event_loop(&mut terminal, &mut events).await;

    // Cleanup terminal
    disable_raw_mode()?;
    stdout().execute(LeaveAlternateScreen)?;

    self.auth.sign_out().await;
    result
  }

  async fn event_loop(
    &mut self,
    terminal: &mut Terminal<CrosstermBackend<Stdout>>,
    events: &mut EventHandler,
  ) -> Result<()> {
    while !self.should_quit {
      terminal.draw(|frame| ui::draw(frame, self))?;

      tokio::select! {
        Some(event) = events.next() => self.handle_event(event),
        Some(data) = self.data_rx.recv() => self.companion.handle(data),
        else => break,
      }
    }
    Ok(())
  }

  fn handle_event(&mut self, event: Event) {
    match event {
      Event::Key(key) => self.handle_key(key),
      Event::Tick => {} // UI refresh happens automatically
      Event::SignedIn(result) => {
        match result {
          Ok(session) => {
            info!(email = %session.email, "signed in");
            self.notice = Some(format!("Signed in as {}", session.email));
          }
          Err(e) => {
            warn!(error = %e, "sign-in failed");
            self.notice = Some(format!("Sign-in failed: {}", e));
          }
        }
        self.reload();
      }
    }
  }

  fn handle_key(&mut self, key: KeyEvent) {
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
      self.should_quit = true;
      return;
    }

    // Let search component try to handle first
    match self.search.handle_key(key) {
      KeyResult::Event(SearchEvent::Changed(text)) => {
        self.companion.change_search_text(text);
        return;
      }
      KeyResult::Event(SearchEvent::Submitted) | KeyResult::Handled => return,
      KeyResult::NotHandled => {}
    }

    self.notice = None;
    match key.code {
      KeyCode::Char('q') => self.should_quit = true,

      // Navigation
      KeyCode::Up | KeyCode::Char('k') => self.list_state.select_previous(),
      KeyCode::Down | KeyCode::Char('j') => self.move_down(),
      KeyCode::Enter => self.open_selected(),
      KeyCode::Esc => self.companion.clear_selection(),

      // Data
      KeyCode::Char('t') => self.companion.toggle_recent(),
      KeyCode::Char('r') => self.companion.refresh(),
      KeyCode::Char('R') => self.companion.retry(),
      KeyCode::Char('m') => self.companion.load_more(),
      KeyCode::Char('L') => self.sign_in(),
      _ => {}
    }
  }

  /// Move down one row; moving past the last row loads the next page.
  fn move_down(&mut self) {
    let len = self.companion.view().patients().items().len();
    match self.list_state.selected() {
      Some(i) if i + 1 >= len => self.companion.load_more(),
      _ => self.list_state.select_next(),
    }
  }

  fn open_selected(&mut self) {
    let id = self
      .list_state
      .selected()
      .and_then(|i| self.companion.view().patients().items().get(i))
      .map(|p| p.id);
    if let Some(id) = id {
      self.companion.select_patient(id);
    }
  }

  fn sign_in(&mut self) {
    let (Some(credentials), Some(tx)) = (self.credentials.clone(), self.event_tx.clone()) else {
      self.notice = Some("Set CLINIC_PASSWORD to sign in".to_string());
      self.companion.start();
      return;
    };

    self.notice = Some(format!("Signing in as {}...", credentials.email));
    let auth = Arc::clone(&self.auth);
    tokio::spawn(async move {
      let result = auth
        .sign_in(&credentials.email, &credentials.password)
        .await;
      let _ = tx.send(Event::SignedIn(result));
    });
  }

  /// Reload everything on screen after the session changed
  fn reload(&mut self) {
    self.companion.start();
    if self.companion.view().selected_id().is_some() {
      self.companion.refresh();
    }
  }

  // Accessors for UI rendering
  pub fn companion(&self) -> &Companion {
    &self.companion
  }

  pub fn search(&self) -> &SearchInput {
    &self.search
  }

  pub fn search_text(&self) -> &str {
    self.companion.search_text()
  }

  pub fn recent_only(&self) -> bool {
    self.companion.recent_only()
  }

  pub fn backend_url(&self) -> &str {
    &self.backend_url
  }

  pub fn notice(&self) -> Option<&str> {
    self.notice.as_deref()
  }

  /// The view together with the list selection it is drawn with
  pub fn list_parts(&mut self) -> (&ViewState, &mut ListState) {
    (self.companion.view(), &mut self.list_state)
  }
}
