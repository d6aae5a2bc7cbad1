use std::io::stdout;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use crossterm::event::{
    self, DisableBracketedPaste, DisableMouseCapture, EnableBracketedPaste, EnableMouseCapture,
};
use crossterm::execute;
use ratatui::DefaultTerminal;

use crate::app::{App, Message, Model};

/// Milliseconds between spinner steps while a request is pending.
const BUSY_POLL_MS: u64 = 120;
const IDLE_POLL_MS: u64 = 250;

impl App {
    /// Run the main event loop.
    ///
    /// # Errors
    ///
    /// Returns an error if terminal initialization or the event loop
    /// encounters an I/O failure.
    pub fn run(&self) -> Result<()> {
        // Create image picker BEFORE initializing terminal (queries stdio)
        let picker = if self.images_enabled {
            crate::preview::create_picker(self.force_half_cell)
        } else {
            None
        };

        let mut terminal = ratatui::try_init()
            .context("Failed to initialize terminal - scanlens requires an interactive terminal")?;
        let size = terminal.size()?;

        let mut model = self
            .init_model((size.width, size.height))
            .with_picker(picker);
        if let Some(path) = self.initial_image.clone() {
            model = self.dispatch(model, Message::LoadImage(path));
        }

        let result = execute!(stdout(), EnableMouseCapture, EnableBracketedPaste)
            .context("Failed to enable mouse capture")
            .and_then(|()| self.event_loop(&mut terminal, &mut model));

        // Restore terminal
        let _ = execute!(stdout(), DisableBracketedPaste, DisableMouseCapture);
        ratatui::restore();

        result
    }

    fn event_loop(&self, terminal: &mut DefaultTerminal, model: &mut Model) -> Result<()> {
        let mut needs_render = true;
        let mut last_spin = Instant::now();

        loop {
            if model.expire_toast(Instant::now()) {
                needs_render = true;
            }

            if self.drain_responses(model) {
                needs_render = true;
            }

            if model.is_busy() && last_spin.elapsed() >= Duration::from_millis(BUSY_POLL_MS) {
                model.spinner_tick = model.spinner_tick.wrapping_add(1);
                last_spin = Instant::now();
                needs_render = true;
            }

            // Handle events
            let poll_ms = if needs_render {
                0
            } else if model.is_busy() {
                BUSY_POLL_MS
            } else {
                IDLE_POLL_MS
            };
            if event::poll(Duration::from_millis(poll_ms))? {
                if let Some(msg) = Self::handle_event(&event::read()?, model) {
                    tracing::trace!(?msg, "event");
                    *model = self.dispatch(std::mem::take(model), msg);
                    needs_render = true;
                }

                // Coalesce key repeat bursts into a single render.
                while event::poll(Duration::from_millis(0))? {
                    if let Some(msg) = Self::handle_event(&event::read()?, model) {
                        *model = self.dispatch(std::mem::take(model), msg);
                        needs_render = true;
                    }
                }
            }

            if needs_render {
                terminal.draw(|frame| crate::ui::render(model, frame))?;
                needs_render = false;
            }

            if model.should_quit {
                break;
            }
        }
        Ok(())
    }
}
