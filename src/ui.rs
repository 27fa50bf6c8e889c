use crate::app::App;
use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget, Wrap},
    Frame,
};
use tracing::warn;
use tui_polarmap::map::MapLayers;

/// Render the UI
pub fn render(frame: &mut Frame, app: &App) {
    let area = frame.area();

    // Split into map area and status bar
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(3),    // Map
            Constraint::Length(1), // Status bar
        ])
        .split(area);

    render_map(frame, app, chunks[0]);
    render_status_bar(frame, app, chunks[1]);
}

fn render_map(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(Span::styled(
            format!(" {} ", app.frame.projection().name()),
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        ));

    let inner = block.inner(area);
    frame.render_widget(block, area);

    let layers = match app.render_layers(inner.width as usize, inner.height as usize) {
        Ok(layers) => layers,
        Err(e) => {
            warn!(error = %e, "failed to draw map");
            let text = Paragraph::new(format!("cannot draw map: {e}"))
                .style(Style::default().fg(Color::Red))
                .wrap(Wrap { trim: true });
            frame.render_widget(text, inner);
            return;
        }
    };

    let cursor_pos = app.mouse_pixel_pos().and_then(|(px, py)| {
        let cx = (px / 2) as u16;
        let cy = (py / 4) as u16;
        (cx < inner.width && cy < inner.height).then_some((cx, cy))
    });

    frame.render_widget(MapWidget { layers, cursor_pos }, inner);
}

/// Renders cell backgrounds, braille dot layers and text labels
struct MapWidget {
    layers: MapLayers,
    cursor_pos: Option<(u16, u16)>,
}

impl Widget for MapWidget {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let cols = (self.layers.width as u16).min(area.width);
        let rows = (self.layers.height as u16).min(area.height);

        // Fills first, so dots and text keep them as background
        for row in 0..rows {
            for col in 0..cols {
                if let Some(bg) = self.layers.background_at(col as usize, row as usize) {
                    buf[(area.x + col, area.y + row)].set_bg(bg);
                }
            }
        }

        for layer in &self.layers.dots {
            for row in 0..rows {
                for col in 0..cols {
                    if let Some(ch) = layer.canvas.char_at(col as usize, row as usize) {
                        buf[(area.x + col, area.y + row)].set_char(ch).set_fg(layer.color);
                    }
                }
            }
        }

        for label in &self.layers.labels {
            if label.row < 0 || label.row >= rows as i32 {
                continue;
            }
            let y = area.y + label.row as u16;
            for (i, ch) in label.text.chars().enumerate() {
                let col = label.col + i as i32;
                if col < 0 || col >= cols as i32 {
                    continue;
                }
                buf[(area.x + col as u16, y)].set_char(ch).set_fg(label.color);
            }
        }

        if let Some((cx, cy)) = self.cursor_pos {
            let x = area.x + cx;
            let y = area.y + cy;
            if x < area.x + area.width && y < area.y + area.height {
                buf[(x, y)].set_char('╋').set_fg(Color::Red);
            }
        }
    }
}

fn toggle_span(on: bool, on_text: &'static str, off_text: &'static str) -> Span<'static> {
    Span::styled(
        if on { on_text } else { off_text },
        Style::default().fg(if on { Color::Green } else { Color::DarkGray }),
    )
}

fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    let layers = &app.layers;

    let mut spans = vec![
        Span::styled(" ", Style::default()),
        Span::styled(app.frame.projection().name(), Style::default().fg(Color::Magenta)),
        Span::styled(" Zoom: ", Style::default().fg(Color::DarkGray)),
        Span::styled(app.zoom_level(), Style::default().fg(Color::Yellow)),
        Span::styled(" ", Style::default()),
        toggle_span(layers.coastlines, "[C]oast ", "[c]oast "),
        toggle_span(layers.fill, "[F]ill ", "[f]ill "),
        toggle_span(layers.graticule, "[G]rid ", "[g]rid "),
        toggle_span(layers.labels, "[L]abels ", "[l]abels "),
        Span::styled("| ", Style::default().fg(Color::DarkGray)),
    ];

    match &app.message {
        Some(msg) => spans.push(Span::styled(msg.clone(), Style::default().fg(Color::Red))),
        None => spans.push(Span::styled(app.cursor_readout(), Style::default().fg(Color::Cyan))),
    }
    spans.push(Span::styled(
        " | hjkl:pan +/-:zoom p:projection r:reset q:quit",
        Style::default().fg(Color::DarkGray),
    ));

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}
