use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Layout, Position, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};
use crate::app::App;
use crate::conversation::{Row, Sender};

const BRAND: Color = Color::Rgb(0x83, 0x00, 0x51);
const CHAT_BACKGROUND: Color = Color::Rgb(0xE5, 0xDD, 0xD5);
const PLACEHOLDER: &str = "Type your message";
const SEND_LABEL: &str = " Send ";

/// Split a word into pieces no wider than `width` columns.
/// Always makes progress, even when a single character is wider than the line.
fn split_to_width(word: &str, width: usize) -> Vec<String> {
    let mut pieces = Vec::new();
    let mut current = String::new();
    let mut cols = 0;

    for c in word.chars() {
        let w = c.width().unwrap_or(0);
        if cols + w > width && !current.is_empty() {
            pieces.push(std::mem::take(&mut current));
            cols = 0;
        }
        current.push(c);
        cols += w;
    }

    if !current.is_empty() || pieces.is_empty() {
        pieces.push(current);
    }
    pieces
}

/// Wrap text to fit within a given number of terminal columns
/// Uses word boundaries for wrapping; words longer than a line are split.
fn wrap_text_to_width(text: &str, width: usize) -> Vec<String> {
    if width == 0 {
        return vec![text.to_string()];
    }

    let mut lines = Vec::new();
    let mut current_line = String::new();
    let mut current_len = 0;

    for word in text.split_whitespace() {
        let mut pieces = split_to_width(word, width);
        let word = pieces.pop().unwrap_or_default();

        // Pieces that fill a whole line go out on their own
        for piece in pieces {
            if current_len > 0 {
                lines.push(std::mem::take(&mut current_line));
                current_len = 0;
            }
            lines.push(piece);
        }
        let word_len = word.width();

        if current_len == 0 {
            current_line = word;
            current_len = word_len;
        } else if current_len + 1 + word_len <= width {
            current_line.push(' ');
            current_line.push_str(&word);
            current_len += 1 + word_len;
        } else {
            lines.push(std::mem::replace(&mut current_line, word));
            current_len = word_len;
        }
    }

    if !current_line.is_empty() {
        lines.push(current_line);
    }

    if lines.is_empty() {
        lines.push(String::new());
    }

    lines
}

fn bubble_style(sender: Sender) -> Style {
    match sender {
        Sender::User => Style::default().bg(Color::White).fg(Color::Black),
        Sender::Bot => Style::default().bg(BRAND).fg(Color::White),
    }
}

fn bubble_alignment(sender: Sender) -> Alignment {
    match sender {
        Sender::User => Alignment::Right,
        Sender::Bot => Alignment::Left,
    }
}

/// Lay out message rows as terminal lines for a chat area `width` columns wide.
///
/// Each message becomes a padded bubble, aligned and colored by sender, with a
/// blank line after it. The typing row animates through one to three dots.
pub fn chat_lines<'a>(rows: impl Iterator<Item = Row<'a>>, width: usize, animation_frame: u8) -> Vec<Line<'static>> {
    // Bubbles take at most three quarters of the width, minus one column of padding per side
    let text_width = (width * 3 / 4).saturating_sub(2).max(1);
    let mut lines: Vec<Line> = Vec::new();

    for row in rows {
        match row {
            Row::Message(message) => {
                let style = bubble_style(message.sender);
                let alignment = bubble_alignment(message.sender);

                let mut wrapped = Vec::new();
                for paragraph in message.content.lines() {
                    wrapped.extend(wrap_text_to_width(paragraph, text_width));
                }
                if wrapped.is_empty() {
                    wrapped.push(String::new());
                }

                // Pad every line of a bubble to the same width so it reads as a block
                let bubble_width = wrapped.iter().map(|l| l.width()).max().unwrap_or(0);
                for text in wrapped {
                    let padding = bubble_width - text.width();
                    let padded = format!(" {}{} ", text, " ".repeat(padding));
                    lines.push(Line::from(Span::styled(padded, style)).alignment(alignment));
                }
                lines.push(Line::default());
            }
            Row::Typing => {
                let dots = "•".repeat((animation_frame as usize % 3) + 1);
                lines.push(
                    Line::from(vec![
                        Span::styled("Bot is typing", Style::default().fg(Color::DarkGray)),
                        Span::styled(
                            format!(" {}", dots),
                            Style::default().fg(BRAND).add_modifier(Modifier::BOLD),
                        ),
                    ])
                    .alignment(Alignment::Left),
                );
            }
        }
    }

    lines
}

pub fn render(app: &mut App, frame: &mut Frame) {
    let [header_area, chat_area, input_row] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(0),
        Constraint::Length(3),
    ])
    .areas(frame.area());

    render_header(app, frame, header_area);
    render_chat(app, frame, chat_area);
    render_input(app, frame, input_row);
}

fn render_header(app: &App, frame: &mut Frame, area: Rect) {
    let header = Paragraph::new(Line::from(Span::styled(
        format!(" {} ", app.title),
        Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
    )))
    .style(Style::default().bg(BRAND));

    frame.render_widget(header, area);
}

fn render_chat(app: &mut App, frame: &mut Frame, area: Rect) {
    app.chat_area = Some(area);

    let block = Block::default().style(Style::default().bg(CHAT_BACKGROUND));
    let inner = block.inner(area);

    let lines = chat_lines(app.conversation.rows(), inner.width as usize, app.animation_frame);
    app.set_chat_viewport(lines.len(), inner.height);

    let chat = Paragraph::new(lines)
        .block(block)
        .scroll((app.chat_scroll, 0));

    frame.render_widget(chat, area);
}

fn render_input(app: &mut App, frame: &mut Frame, area: Rect) {
    let send_width = SEND_LABEL.width() as u16 + 2;
    let [input_area, send_area] = Layout::horizontal([
        Constraint::Min(0),
        Constraint::Length(send_width),
    ])
    .areas(area);

    app.send_area = Some(send_area);

    let input_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(CHAT_BACKGROUND));
    let inner = input_block.inner(input_area);

    let (text, cursor_col) = app.input.visible_window(inner.width as usize);
    let content = if app.input.as_str().is_empty() {
        Line::from(Span::styled(PLACEHOLDER, Style::default().fg(Color::DarkGray)))
    } else {
        Line::from(text)
    };

    frame.render_widget(Paragraph::new(content).block(input_block), input_area);
    frame.set_cursor_position(Position::new(inner.x + cursor_col as u16, inner.y));

    let send = Paragraph::new(Line::from(Span::styled(
        SEND_LABEL,
        Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
    )))
    .alignment(Alignment::Center)
    .block(Block::default().borders(Borders::ALL).border_style(Style::default().fg(BRAND)))
    .style(Style::default().bg(BRAND));

    frame.render_widget(send, send_area);
}
