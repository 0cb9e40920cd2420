use std::io::{self, Stdout};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use anyhow::Result;
use crossbeam_channel::{unbounded, Receiver, Sender};
use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use crossterm::ExecutableCommand;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};
use ratatui::{Frame, Terminal};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use crate::carousel::{self, CarouselEvent, CarouselState, Ticker};
use crate::catalog::CatalogService;
use crate::config::PlayerConfig;
use crate::manifest::{LoadError, Manifest, VideoEntry};
use crate::player::{self, PlaybackRequest};

const COLOR_BG: Color = Color::Rgb(30, 30, 46);
const COLOR_PANEL_BG: Color = Color::Rgb(24, 24, 36);
const COLOR_PANEL_FOCUSED_BG: Color = Color::Rgb(49, 50, 68);
const COLOR_PANEL_SELECTED_BG: Color = Color::Rgb(69, 71, 90);
const COLOR_BORDER_IDLE: Color = Color::Rgb(49, 50, 68);
const COLOR_BORDER_FOCUSED: Color = Color::Rgb(137, 180, 250);
const COLOR_TEXT_PRIMARY: Color = Color::Rgb(205, 214, 244);
const COLOR_TEXT_SECONDARY: Color = Color::Rgb(166, 173, 200);
const COLOR_ERROR: Color = Color::Rgb(243, 139, 168);

const SPINNER_FRAMES: [&str; 10] = ["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];
const CARD_WIDTH: u16 = 36;
const CARD_HEIGHT: u16 = 4;
const BILLBOARD_HEIGHT: u16 = 6;

fn accent_color(theme: &str) -> Color {
    match theme {
        "mono" => Color::Gray,
        _ => Color::Rgb(137, 180, 250),
    }
}

pub struct Options {
    pub status_message: String,
    pub catalog_service: Arc<dyn CatalogService>,
    pub player: PlayerConfig,
    pub carousel_interval: Duration,
    pub theme: String,
}

enum LoadState {
    Loading,
    Ready,
    Failed(LoadError),
}

enum AsyncResponse {
    Manifest {
        request_id: u64,
        result: Result<Manifest, LoadError>,
    },
}

struct Card {
    video: VideoEntry,
    request: Option<PlaybackRequest>,
}

struct Catalog {
    background_image: String,
    banners: Vec<String>,
    cards: Vec<Card>,
}

struct Spinner {
    index: usize,
    last_tick: Instant,
}

impl Spinner {
    fn new() -> Self {
        Self {
            index: 0,
            last_tick: Instant::now(),
        }
    }

    fn frame(&self) -> &'static str {
        SPINNER_FRAMES[self.index % SPINNER_FRAMES.len()]
    }

    fn advance(&mut self) -> bool {
        let now = Instant::now();
        if now.duration_since(self.last_tick) >= Duration::from_millis(120) {
            self.index = (self.index + 1) % SPINNER_FRAMES.len();
            self.last_tick = now;
            true
        } else {
            false
        }
    }

    fn reset(&mut self) {
        self.index = 0;
        self.last_tick = Instant::now();
    }
}

pub struct Model {
    service: Arc<dyn CatalogService>,
    player_cfg: PlayerConfig,
    carousel_interval: Duration,
    accent: Color,
    load: LoadState,
    catalog: Option<Catalog>,
    billboard: CarouselState,
    ticker: Option<Ticker>,
    selected: usize,
    scroll_row: usize,
    grid_cols: usize,
    spinner: Spinner,
    status_message: String,
    needs_redraw: bool,
    response_tx: Sender<AsyncResponse>,
    response_rx: Receiver<AsyncResponse>,
    pending_request: Option<u64>,
    next_request_id: u64,
}

impl Model {
    pub fn new(options: Options) -> Self {
        let (response_tx, response_rx) = unbounded();
        Self {
            service: options.catalog_service,
            player_cfg: options.player,
            carousel_interval: options.carousel_interval,
            accent: accent_color(&options.theme),
            load: LoadState::Ready,
            catalog: None,
            billboard: CarouselState::default(),
            ticker: None,
            selected: 0,
            scroll_row: 0,
            grid_cols: 1,
            spinner: Spinner::new(),
            status_message: options.status_message,
            needs_redraw: true,
            response_tx,
            response_rx,
            pending_request: None,
            next_request_id: 0,
        }
    }

    pub fn run(&mut self) -> Result<()> {
        self.start_load();

        let mut stdout = io::stdout();
        enable_raw_mode()?;
        stdout.execute(EnterAlternateScreen)?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;
        terminal.clear()?;

        let result = self.event_loop(&mut terminal);

        disable_raw_mode()?;
        terminal.backend_mut().execute(LeaveAlternateScreen)?;
        terminal.show_cursor()?;

        result
    }

    fn event_loop(&mut self, terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
        let mut last_tick = Instant::now();
        let tick_rate = Duration::from_millis(120);

        loop {
            if self.poll_async() {
                self.mark_dirty();
            }

            if self.billboard_tick() {
                self.mark_dirty();
            }

            if self.needs_redraw {
                terminal.draw(|frame| self.draw(frame))?;
                self.needs_redraw = false;
            }

            let timeout = tick_rate
                .checked_sub(last_tick.elapsed())
                .unwrap_or_else(|| Duration::from_millis(16));

            if event::poll(timeout)? {
                match event::read()? {
                    Event::Key(key) if key.kind == KeyEventKind::Press => {
                        match self.handle_key(key.code) {
                            Ok(true) => break,
                            Ok(false) => {}
                            Err(err) => {
                                self.status_message = format!("Error: {}", err);
                                self.mark_dirty();
                            }
                        }
                    }
                    Event::Resize(_, _) => self.mark_dirty(),
                    _ => {}
                }
            }

            if last_tick.elapsed() >= tick_rate {
                last_tick = Instant::now();
                if self.is_loading() && self.spinner.advance() {
                    self.mark_dirty();
                } else if !self.is_loading() {
                    self.spinner.reset();
                }
            }
        }

        // The billboard leaves view with the terminal; release its schedule.
        self.teardown_billboard();
        Ok(())
    }

    fn mark_dirty(&mut self) {
        self.needs_redraw = true;
    }

    fn is_loading(&self) -> bool {
        matches!(self.load, LoadState::Loading)
    }

    fn start_load(&mut self) {
        self.next_request_id += 1;
        let request_id = self.next_request_id;
        self.pending_request = Some(request_id);
        self.load = LoadState::Loading;

        let service = Arc::clone(&self.service);
        let tx = self.response_tx.clone();
        thread::spawn(move || {
            let result = service.load_catalog();
            let _ = tx.send(AsyncResponse::Manifest { request_id, result });
        });
    }

    fn poll_async(&mut self) -> bool {
        let mut changed = false;
        while let Ok(message) = self.response_rx.try_recv() {
            self.handle_async_response(message);
            changed = true;
        }
        changed
    }

    fn handle_async_response(&mut self, message: AsyncResponse) {
        match message {
            AsyncResponse::Manifest { request_id, result } => {
                if self.pending_request != Some(request_id) {
                    return;
                }
                self.pending_request = None;

                match result {
                    Ok(manifest) => {
                        let videos = manifest.videos.len();
                        let banners = manifest.banners.len();
                        self.install_manifest(manifest);
                        self.load = LoadState::Ready;
                        self.status_message = if banners > 0 {
                            format!("Loaded {} videos and {} banners.", videos, banners)
                        } else {
                            format!("Loaded {} videos.", videos)
                        };
                    }
                    Err(err) => {
                        if self.catalog.is_some() {
                            self.load = LoadState::Ready;
                            self.status_message = format!("Refresh failed: {}", err);
                        } else {
                            self.load = LoadState::Failed(err);
                        }
                    }
                }
                self.mark_dirty();
            }
        }
    }

    fn install_manifest(&mut self, manifest: Manifest) {
        let cards = manifest
            .videos
            .iter()
            .map(|video| Card {
                request: player::playback_request(video),
                video: video.clone(),
            })
            .collect();
        let banner_count = manifest.banners.len();

        self.catalog = Some(Catalog {
            background_image: manifest.background_image,
            banners: manifest.banners,
            cards,
        });
        self.billboard = carousel::step(self.billboard, CarouselEvent::Reload { count: banner_count });
        self.ticker = if self.billboard.is_active() {
            Some(Ticker::new(self.carousel_interval))
        } else {
            None
        };
        self.selected = 0;
        self.scroll_row = 0;
    }

    fn billboard_tick(&mut self) -> bool {
        if let Some(ticker) = self.ticker.as_mut() {
            if ticker.due() {
                self.billboard = carousel::step(self.billboard, CarouselEvent::Tick);
                return true;
            }
        }
        false
    }

    // The state goes dormant, not destroyed; the next reload re-activates it.
    fn teardown_billboard(&mut self) {
        self.ticker = None;
    }

    fn handle_key(&mut self, code: KeyCode) -> Result<bool> {
        match code {
            KeyCode::Char('q') | KeyCode::Esc => return Ok(true),
            KeyCode::Char('r') | KeyCode::Char('R') => {
                if !self.is_loading() {
                    self.status_message = "Refreshing catalog…".into();
                    self.start_load();
                }
                self.mark_dirty();
            }
            KeyCode::Char('[') => self.rotate_billboard(-1),
            KeyCode::Char(']') => self.rotate_billboard(1),
            KeyCode::Left | KeyCode::Char('h') => self.move_selection(-1),
            KeyCode::Right | KeyCode::Char('l') => self.move_selection(1),
            KeyCode::Up | KeyCode::Char('k') => self.move_selection(-(self.grid_cols as isize)),
            KeyCode::Down | KeyCode::Char('j') => self.move_selection(self.grid_cols as isize),
            KeyCode::Enter => self.play_selected()?,
            _ => {}
        }
        Ok(false)
    }

    fn rotate_billboard(&mut self, direction: isize) {
        let count = self.billboard.count();
        let Some(index) = self.billboard.index() else {
            return;
        };
        let target = (index as isize + direction).rem_euclid(count as isize) as usize;
        self.billboard = carousel::step(self.billboard, CarouselEvent::Select(target));
        self.mark_dirty();
    }

    fn move_selection(&mut self, delta: isize) {
        let Some(catalog) = self.catalog.as_ref() else {
            return;
        };
        if catalog.cards.is_empty() {
            return;
        }
        let last = catalog.cards.len() - 1;
        let target = (self.selected as isize + delta).clamp(0, last as isize) as usize;
        if target != self.selected {
            self.selected = target;
            self.mark_dirty();
        }
    }

    fn play_selected(&mut self) -> Result<()> {
        let Some(catalog) = self.catalog.as_ref() else {
            return Ok(());
        };
        let Some(card) = catalog.cards.get(self.selected) else {
            return Ok(());
        };
        match &card.request {
            Some(request) => {
                player::launch(&self.player_cfg, request)?;
                self.status_message = format!("Playing {}.", card.video.title);
            }
            None => {
                self.status_message = format!("{} has no playable stream URL.", card.video.title);
            }
        }
        self.mark_dirty();
        Ok(())
    }

    fn draw(&mut self, frame: &mut Frame<'_>) {
        let full = frame.size();
        frame.render_widget(Block::default().style(Style::default().bg(COLOR_BG)), full);

        if self.catalog.is_none() {
            let failure = match &self.load {
                LoadState::Failed(err) => Some(err.to_string()),
                _ => None,
            };
            match failure {
                Some(reason) => self.draw_failed(frame, full, &reason),
                None => self.draw_loading(frame, full),
            }
            return;
        }

        self.draw_catalog(frame, full);
    }

    fn draw_loading(&self, frame: &mut Frame<'_>, area: Rect) {
        let message = format!("{} Loading catalog…", self.spinner.frame());
        let body = Paragraph::new(vec![
            Line::default(),
            Line::from(Span::styled(
                message,
                Style::default().fg(COLOR_TEXT_PRIMARY),
            )),
            Line::from(Span::styled(
                "q to quit",
                Style::default().fg(COLOR_TEXT_SECONDARY),
            )),
        ])
        .alignment(Alignment::Center);
        frame.render_widget(body, centered_band(area));
    }

    fn draw_failed(&self, frame: &mut Frame<'_>, area: Rect, reason: &str) {
        let body = Paragraph::new(vec![
            Line::default(),
            Line::from(Span::styled(
                "Catalog unavailable",
                Style::default().fg(COLOR_ERROR).add_modifier(Modifier::BOLD),
            )),
            Line::from(Span::styled(
                reason.to_string(),
                Style::default().fg(COLOR_TEXT_SECONDARY),
            )),
            Line::default(),
            Line::from(Span::styled(
                "Press r to retry or q to quit.",
                Style::default().fg(COLOR_TEXT_PRIMARY),
            )),
        ])
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true });
        frame.render_widget(body, centered_band(area));
    }

    fn draw_catalog(&mut self, frame: &mut Frame<'_>, full: Rect) {
        let show_billboard = self.billboard.is_active();
        let constraints = if show_billboard {
            vec![
                Constraint::Length(1),
                Constraint::Length(BILLBOARD_HEIGHT),
                Constraint::Min(0),
                Constraint::Length(1),
            ]
        } else {
            vec![
                Constraint::Length(1),
                Constraint::Min(0),
                Constraint::Length(1),
            ]
        };
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints(constraints)
            .split(full);
        let header_area = chunks[0];
        let (billboard_area, grid_area, status_area) = if show_billboard {
            (Some(chunks[1]), chunks[2], chunks[3])
        } else {
            (None, chunks[1], chunks[2])
        };

        let cols = (grid_area.width / CARD_WIDTH).max(1) as usize;
        let visible_rows = (grid_area.height / CARD_HEIGHT).max(1) as usize;
        self.grid_cols = cols;
        let row = self.selected / cols;
        if row < self.scroll_row {
            self.scroll_row = row;
        } else if row >= self.scroll_row + visible_rows {
            self.scroll_row = row + 1 - visible_rows;
        }

        self.draw_header(frame, header_area);
        if let Some(area) = billboard_area {
            self.draw_billboard(frame, area);
        }
        self.draw_grid(frame, grid_area, visible_rows);
        self.draw_status(frame, status_area);
    }

    fn draw_header(&self, frame: &mut Frame<'_>, area: Rect) {
        let backdrop = self
            .catalog
            .as_ref()
            .map(|catalog| catalog.background_image.clone())
            .unwrap_or_default();
        let header = Paragraph::new(Line::from(vec![
            Span::styled(
                "streamgrid",
                Style::default().fg(self.accent).add_modifier(Modifier::BOLD),
            ),
            Span::raw("  "),
            Span::styled(backdrop, Style::default().fg(COLOR_TEXT_SECONDARY)),
        ]))
        .style(Style::default().bg(COLOR_PANEL_BG));
        frame.render_widget(header, area);
    }

    fn draw_billboard(&self, frame: &mut Frame<'_>, area: Rect) {
        let Some(catalog) = self.catalog.as_ref() else {
            return;
        };
        let Some(index) = self.billboard.index() else {
            return;
        };
        let count = self.billboard.count();
        let banner = catalog.banners.get(index).map(String::as_str).unwrap_or("");

        let mut dots = String::new();
        for position in 0..count {
            if !dots.is_empty() {
                dots.push(' ');
            }
            dots.push(if position == index { '●' } else { '○' });
        }

        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(COLOR_BORDER_IDLE))
            .style(Style::default().bg(COLOR_PANEL_BG))
            .title(Span::styled(
                format!(" Featured {}/{} ", index + 1, count),
                Style::default().fg(self.accent),
            ));
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let body = Paragraph::new(vec![
            Line::default(),
            Line::from(Span::styled(
                banner.to_string(),
                Style::default()
                    .fg(COLOR_TEXT_PRIMARY)
                    .add_modifier(Modifier::BOLD),
            )),
            Line::from(Span::styled(dots, Style::default().fg(self.accent))),
        ])
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true });
        frame.render_widget(body, inner);
    }

    fn draw_grid(&self, frame: &mut Frame<'_>, area: Rect, visible_rows: usize) {
        let Some(catalog) = self.catalog.as_ref() else {
            return;
        };
        if catalog.cards.is_empty() {
            let empty = Paragraph::new("No videos in this catalog.")
                .style(Style::default().fg(COLOR_TEXT_SECONDARY))
                .alignment(Alignment::Center);
            frame.render_widget(empty, centered_band(area));
            return;
        }

        let cols = self.grid_cols.max(1);
        let card_width = area.width / cols as u16;

        for (position, card) in catalog.cards.iter().enumerate() {
            let row = position / cols;
            if row < self.scroll_row || row >= self.scroll_row + visible_rows {
                continue;
            }
            let col = position % cols;
            let x = area.x + col as u16 * card_width;
            let y = area.y + (row - self.scroll_row) as u16 * CARD_HEIGHT;
            let cell = Rect {
                x,
                y,
                width: card_width.min(area.right().saturating_sub(x)),
                height: CARD_HEIGHT.min(area.bottom().saturating_sub(y)),
            };
            if cell.width < 8 || cell.height < 3 {
                continue;
            }
            self.draw_card(frame, cell, card, position == self.selected);
        }
    }

    fn draw_card(&self, frame: &mut Frame<'_>, area: Rect, card: &Card, selected: bool) {
        let border = if selected {
            COLOR_BORDER_FOCUSED
        } else {
            COLOR_BORDER_IDLE
        };
        let background = if selected {
            COLOR_PANEL_SELECTED_BG
        } else {
            COLOR_PANEL_BG
        };
        let title_style = if card.request.is_some() {
            Style::default()
                .fg(COLOR_TEXT_PRIMARY)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default()
                .fg(COLOR_TEXT_SECONDARY)
                .add_modifier(Modifier::DIM)
        };

        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(border))
            .style(Style::default().bg(background));
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let width = inner.width as usize;
        let mut lines = vec![Line::from(Span::styled(
            truncate(&card.video.title, width),
            title_style,
        ))];
        if card.request.is_some() {
            lines.push(Line::from(Span::styled(
                truncate(&card.video.thumbnail, width),
                Style::default().fg(COLOR_TEXT_SECONDARY),
            )));
        } else {
            lines.push(Line::from(Span::styled(
                "not playable",
                Style::default().fg(COLOR_ERROR),
            )));
        }
        frame.render_widget(Paragraph::new(lines), inner);
    }

    fn draw_status(&self, frame: &mut Frame<'_>, area: Rect) {
        let text = if self.is_loading() {
            format!("{} {}", self.spinner.frame(), self.status_message)
                .trim()
                .to_string()
        } else {
            self.status_message.clone()
        };
        let line = Line::from(vec![
            Span::styled(
                text,
                Style::default()
                    .fg(COLOR_TEXT_PRIMARY)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::raw("  "),
            Span::styled(
                "q quit · r refresh · enter play · [ ] featured",
                Style::default().fg(COLOR_TEXT_SECONDARY),
            ),
        ]);
        frame.render_widget(
            Paragraph::new(line).style(Style::default().bg(COLOR_PANEL_FOCUSED_BG)),
            area,
        );
    }
}

fn centered_band(area: Rect) -> Rect {
    let band_height = area.height.min(6);
    let top = area.y + area.height.saturating_sub(band_height) / 2;
    Rect {
        x: area.x,
        y: top,
        width: area.width,
        height: band_height,
    }
}

fn truncate(text: &str, max_width: usize) -> String {
    if max_width == 0 {
        return String::new();
    }
    if text.width() <= max_width {
        return text.to_string();
    }
    let mut out = String::new();
    let mut used = 0usize;
    for ch in text.chars() {
        let w = ch.width().unwrap_or(0);
        if used + w + 1 > max_width {
            break;
        }
        used += w;
        out.push(ch);
    }
    out.push('…');
    out
}
