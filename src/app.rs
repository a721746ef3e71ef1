//! Application controller wiring the game engine, local storage, and the
//! online session adapter to a presenter.

use anyhow::Result;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

use crate::game::{GameState, Outcome};
use crate::online::{OnlineSession, SessionError};
use crate::present::{Presenter, Screen};
use crate::remote::GameStore;
use crate::storage::{KeyValueStore, ScoreStore, Theme};

/// Top-level controller. One instance per front end.
///
/// Local play runs entirely against the in-memory [`GameState`]; online
/// play delegates every move to the [`OnlineSession`] and lets the
/// subscription repaint the screen.
#[derive(Debug)]
pub struct App {
    presenter: Arc<dyn Presenter>,
    kv: Arc<dyn KeyValueStore>,
    scores: ScoreStore,
    remote: Arc<dyn GameStore>,
    game: GameState,
    online: Option<OnlineSession>,
    screen: Screen,
}

impl App {
    /// Wires a controller to its presenter, local store, and remote store.
    pub fn new(
        presenter: Arc<dyn Presenter>,
        kv: Arc<dyn KeyValueStore>,
        remote: Arc<dyn GameStore>,
    ) -> Self {
        let scores = ScoreStore::new(Arc::clone(&kv));
        Self {
            presenter,
            kv,
            scores,
            remote,
            game: GameState::new(),
            online: None,
            screen: Screen::ModeSelection,
        }
    }

    /// The screen the controller last requested.
    pub fn screen(&self) -> Screen {
        self.screen
    }

    /// The current game state: the session's remote projection during
    /// online play, the local engine otherwise.
    pub fn game(&self) -> GameState {
        match &self.online {
            Some(session) => session.projection(),
            None => self.game.clone(),
        }
    }

    /// Whether an online session is live.
    pub fn is_online(&self) -> bool {
        self.online.is_some()
    }

    /// Starts the application: applies the stored theme, then resumes a
    /// cached online session if one exists, otherwise lands on mode
    /// selection.
    ///
    /// # Errors
    ///
    /// Returns an error if local storage fails.
    #[instrument(skip(self))]
    pub async fn start(&mut self) -> Result<()> {
        let theme = Theme::load(self.kv.as_ref())?;
        self.presenter.apply_theme(theme);

        if self.resume_online_session().await? {
            return Ok(());
        }

        self.show_screen(Screen::ModeSelection);
        Ok(())
    }

    /// Flips between light and dark and persists the choice.
    ///
    /// # Errors
    ///
    /// Returns an error if the theme cannot be persisted.
    #[instrument(skip(self))]
    pub fn toggle_theme(&self) -> Result<()> {
        let theme = Theme::load(self.kv.as_ref())?.toggled();
        theme.store(self.kv.as_ref())?;
        self.presenter.apply_theme(theme);
        debug!(theme = theme.as_str(), "Theme toggled");
        Ok(())
    }

    /// Starts a local two-player game.
    ///
    /// Both names are required; stored scores are adopted when the pairing
    /// matches the saved record exactly.
    ///
    /// # Errors
    ///
    /// Returns an error if the score store fails.
    #[instrument(skip(self))]
    pub fn start_local_game(&mut self, name_x: &str, name_o: &str) -> Result<()> {
        let name_x = name_x.trim();
        let name_o = name_o.trim();
        if name_x.is_empty() || name_o.is_empty() {
            self.presenter.show_notice("Please enter both player names.");
            return Ok(());
        }

        let stored = self.scores.load()?;
        self.game.initialize_players(name_x, name_o, stored.as_ref());
        self.game.reset_game();

        self.presenter.clear_board();
        self.presenter.update_status(self.game.current_turn());
        self.presenter
            .update_scores(self.game.score_x(), self.game.score_o());
        self.show_screen(Screen::Game);
        info!(name_x, name_o, "Local game started");
        Ok(())
    }

    /// Creates an online session as the host and starts listening for the
    /// opponent. A store failure is surfaced as a notice.
    ///
    /// # Errors
    ///
    /// Returns an error if the session keys cannot be cached locally.
    #[instrument(skip(self))]
    pub async fn create_game(&mut self, name: &str) -> Result<()> {
        let name = name.trim();
        if name.is_empty() {
            self.presenter.show_notice("Please enter your name.");
            return Ok(());
        }

        let mut session = match OnlineSession::create(Arc::clone(&self.remote), name).await {
            Ok(session) => session,
            Err(err) => {
                warn!(error = %err, "Create failed");
                self.presenter.show_notice("Could not create the game.");
                return Ok(());
            }
        };
        session.remember(self.kv.as_ref())?;
        if let Err(err) = session.start_listener(Arc::clone(&self.presenter)).await {
            warn!(error = %err, "Subscribe failed");
            self.presenter.show_notice("Could not reach the game.");
            return Ok(());
        }

        self.presenter.clear_board();
        self.presenter.update_scores(0, 0);
        self.presenter.show_session_id(session.id());
        self.presenter
            .show_notice("Waiting for an opponent to join.");
        self.online = Some(session);
        self.show_screen(Screen::Game);
        Ok(())
    }

    /// Joins an existing online session as O.
    ///
    /// A missing or full session, like any store failure, is a user-facing
    /// notice rather than an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the session keys cannot be cached locally.
    #[instrument(skip(self))]
    pub async fn join_game(&mut self, name: &str, session_id: &str) -> Result<()> {
        let name = name.trim();
        let session_id = session_id.trim();
        if name.is_empty() || session_id.is_empty() {
            self.presenter
                .show_notice("Please enter your name and a game ID.");
            return Ok(());
        }

        let (mut session, _record) =
            match OnlineSession::join(Arc::clone(&self.remote), session_id, name).await {
                Ok(joined) => joined,
                Err(err @ (SessionError::NotFound | SessionError::SessionFull)) => {
                    self.presenter.show_notice(&err.to_string());
                    return Ok(());
                }
                Err(SessionError::Store(err)) => {
                    warn!(error = %err, "Join failed");
                    self.presenter.show_notice("Could not join the game.");
                    return Ok(());
                }
            };

        session.remember(self.kv.as_ref())?;
        if let Err(err) = session.start_listener(Arc::clone(&self.presenter)).await {
            warn!(error = %err, "Subscribe failed");
            self.presenter.show_notice("Could not reach the game.");
            return Ok(());
        }

        self.presenter.show_session_id(session.id());
        self.online = Some(session);
        self.show_screen(Screen::Game);
        Ok(())
    }

    /// Handles a click on board cell `cell`.
    ///
    /// Local play applies the move directly and repaints; online play
    /// submits it to the session and lets the subscription repaint.
    ///
    /// # Errors
    ///
    /// Returns an error if the score store fails while persisting a win.
    #[instrument(skip(self))]
    pub async fn handle_cell_click(&mut self, cell: usize) -> Result<()> {
        if let Some(session) = &self.online {
            match session.make_move(cell).await {
                Ok(_committed) => {}
                Err(err) => {
                    warn!(error = %err, cell, "Online move failed");
                    self.presenter.show_notice("Could not reach the game.");
                }
            }
            return Ok(());
        }

        let mover = self.game.current_turn();
        let outcome = match self.game.play(cell) {
            Ok(outcome) => outcome,
            // Occupied, out of range, or finished: silently ignored.
            Err(err) => {
                debug!(%err, cell, "Move ignored");
                return Ok(());
            }
        };

        self.presenter.update_cell(cell, mover);
        match outcome {
            Outcome::Win { mark, line } => {
                self.presenter.show_winner(mark, line);
                self.presenter
                    .update_scores(self.game.score_x(), self.game.score_o());
                self.scores.save(&self.game.score_record())?;
            }
            Outcome::Draw => self.presenter.show_draw(),
            Outcome::Ongoing => self.presenter.update_status(self.game.current_turn()),
        }
        Ok(())
    }

    /// Starts a new round on the same board.
    ///
    /// Local play resets in place; online play overwrites the shared record
    /// and the rematch arrives through the subscription. A store failure is
    /// surfaced as a notice.
    #[instrument(skip(self))]
    pub async fn handle_restart(&mut self) -> Result<()> {
        if let Some(session) = &self.online {
            if let Err(err) = session.restart().await {
                warn!(error = %err, "Restart failed");
                self.presenter.show_notice("Could not reach the game.");
            }
            return Ok(());
        }

        self.game.reset_game();
        self.presenter.clear_board();
        self.presenter.update_status(self.game.current_turn());
        Ok(())
    }

    /// Zeroes the stored and in-memory scores.
    ///
    /// # Errors
    ///
    /// Returns an error if the score store fails.
    #[instrument(skip(self))]
    pub fn clear_scores(&mut self) -> Result<()> {
        self.scores.clear()?;
        self.game.reset_scores();
        self.presenter.update_scores(0, 0);
        info!("Scores cleared");
        Ok(())
    }

    /// Returns to mode selection, disposing any online session.
    ///
    /// The cached session keys stay behind so the session can be resumed;
    /// only the live subscription is dropped.
    #[instrument(skip(self))]
    pub fn back_to_mode_selection(&mut self) {
        if self.online.take().is_some() {
            debug!("Online session disposed");
        }
        self.show_screen(Screen::ModeSelection);
    }

    /// Shows the local two-player setup screen.
    pub fn show_local_setup(&mut self) {
        self.show_screen(Screen::LocalSetup);
    }

    /// Shows the online create/join screen.
    pub fn show_online_setup(&mut self) {
        self.show_screen(Screen::OnlineSetup);
    }

    /// Resumes a cached online session, if the cache holds one. Returns
    /// whether a session was resumed.
    ///
    /// # Errors
    ///
    /// Returns an error if local storage or the subscription fails.
    #[instrument(skip(self))]
    pub async fn resume_online_session(&mut self) -> Result<bool> {
        let Some((id, mark)) = OnlineSession::recall(self.kv.as_ref())? else {
            return Ok(false);
        };

        let mut session = OnlineSession::resume(Arc::clone(&self.remote), id, mark);
        session.start_listener(Arc::clone(&self.presenter)).await?;

        self.presenter.show_session_id(session.id());
        self.online = Some(session);
        self.show_screen(Screen::Game);
        Ok(true)
    }

    /// Leaves the online session for good, removing the cached keys.
    ///
    /// # Errors
    ///
    /// Returns an error if local storage fails.
    #[instrument(skip(self))]
    pub fn leave_online_session(&mut self) -> Result<()> {
        self.online = None;
        OnlineSession::forget(self.kv.as_ref())?;
        self.show_screen(Screen::ModeSelection);
        Ok(())
    }

    fn show_screen(&mut self, screen: Screen) {
        self.screen = screen;
        self.presenter.show_screen(screen);
    }
}
