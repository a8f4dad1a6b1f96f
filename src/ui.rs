use itertools::Itertools;
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Gauge, Paragraph, Wrap},
    Frame,
};

use crate::audio::PlayerSnapshot;
use crate::game::GameSnapshot;
use crate::section::{Phase, Section};

const HORIZONTAL_MARGIN: u16 = 4;
const VERTICAL_MARGIN: u16 = 1;

/// Render one frame from the immutable snapshots.
pub fn draw(f: &mut Frame, snap: &GameSnapshot, player: &PlayerSnapshot) {
    let area = f.area();

    if snap.is_game_over {
        draw_game_over(f, area, snap);
        return;
    }

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .vertical_margin(VERTICAL_MARGIN)
        .constraints(
            [
                Constraint::Length(1), // header
                Constraint::Length(3), // section timer
                Constraint::Min(5),    // phase / status area
                Constraint::Length(5), // challenge area
                Constraint::Length(1), // footer tallies
            ]
            .as_ref(),
        )
        .split(area);

    draw_header(f, chunks[0], snap);
    draw_section_timer(f, chunks[1], snap);
    draw_status(f, chunks[2], snap, player);
    draw_challenge(f, chunks[3], snap);
    draw_footer(f, chunks[4], snap, player);

    if player.pending_play {
        draw_pending_play(f, area);
    }
}

fn draw_header(f: &mut Frame, area: Rect, snap: &GameSnapshot) {
    let bold = Style::default().add_modifier(Modifier::BOLD);
    let error_style = if snap.error_level >= 3 {
        bold.fg(Color::Red)
    } else if snap.error_level >= 1 {
        bold.fg(Color::Yellow)
    } else {
        bold.fg(Color::DarkGray)
    };

    let header = Line::from(vec![
        Span::styled(format!("SECTION {}/4", snap.section), bold.fg(Color::Cyan)),
        Span::raw("   "),
        Span::styled(format!("ERROR LEVEL {}", snap.error_level), error_style),
    ]);
    f.render_widget(Paragraph::new(header).alignment(Alignment::Center), area);
}

fn draw_section_timer(f: &mut Frame, area: Rect, snap: &GameSnapshot) {
    let total = snap
        .section
        .config()
        .map(|c| c.section_duration_secs)
        .unwrap_or(1.0);
    let remaining = snap.section_time_remaining.max(0.0);
    let gauge = Gauge::default()
        .block(Block::default().borders(Borders::ALL).title("section time"))
        .gauge_style(Style::default().fg(Color::Blue))
        .ratio((remaining / total).clamp(0.0, 1.0))
        .label(format!("{:.0}s", remaining.ceil()));
    f.render_widget(gauge, area);
}

fn draw_status(f: &mut Frame, area: Rect, snap: &GameSnapshot, player: &PlayerSnapshot) {
    let bold = Style::default().add_modifier(Modifier::BOLD);
    let lines = match snap.phase {
        Phase::ChallengeFailed => vec![
            Line::from(Span::styled(
                "ERROR!",
                bold.fg(Color::Red).add_modifier(Modifier::SLOW_BLINK),
            )),
            Line::from(Span::styled("error level raised", bold.fg(Color::Yellow))),
        ],
        Phase::Exploding => vec![
            Line::from(Span::styled("SYSTEM FAILING...", bold.fg(Color::Red))),
            Line::from(Span::styled(
                format!("hits: {}/{}", snap.correct_hits, snap.total_challenges),
                Style::default().fg(Color::Gray),
            )),
        ],
        Phase::Playing if !snap.challenges_active && snap.section == Section::One => {
            vec![
                Line::from(Span::styled("LISTEN...", bold.fg(Color::Cyan))),
                Line::from(Span::styled(
                    "challenges begin at the midpoint",
                    Style::default().fg(Color::DarkGray),
                )),
            ]
        }
        Phase::Playing => {
            let audio = if player.playing {
                format!(
                    "♪ {:.0}s / {:.0}s",
                    player.position_ms as f64 / 1000.0,
                    player.duration_ms as f64 / 1000.0
                )
            } else {
                "· silent ·".to_string()
            };
            vec![Line::from(Span::styled(
                audio,
                Style::default().fg(Color::DarkGray),
            ))]
        }
    };

    f.render_widget(
        Paragraph::new(lines)
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true }),
        area,
    );
}

fn draw_challenge(f: &mut Frame, area: Rect, snap: &GameSnapshot) {
    if !snap.challenges_active || snap.phase != Phase::Playing {
        return;
    }
    let bold = Style::default().add_modifier(Modifier::BOLD);

    let key_spans: Vec<Span> = snap
        .target_keys
        .iter()
        .flat_map(|k| {
            let style = if snap.pressed_keys.contains(k) {
                bold.fg(Color::Green)
            } else {
                bold.fg(Color::White).bg(Color::DarkGray)
            };
            [Span::styled(format!(" {k} "), style), Span::raw(" ")]
        })
        .collect();

    let timer = Line::from(Span::styled(
        format!("{:.1}s", snap.challenge_time_remaining.max(0.0)),
        if snap.challenge_time_remaining < 1.0 {
            bold.fg(Color::Red)
        } else {
            Style::default().fg(Color::Gray)
        },
    ));

    let lines = vec![
        Line::from(Span::styled(
            "PRESS TOGETHER",
            Style::default().fg(Color::DarkGray),
        )),
        Line::from(key_spans),
        timer,
    ];
    f.render_widget(Paragraph::new(lines).alignment(Alignment::Center), area);
}

fn draw_footer(f: &mut Frame, area: Rect, snap: &GameSnapshot, player: &PlayerSnapshot) {
    let mut text = format!(
        "challenges {}  hits {}  misses {}",
        snap.completed_challenges, snap.correct_hits, snap.incorrect_hits
    );
    if player.muted {
        text.push_str("  [muted]");
    }
    let footer = Line::from(Span::styled(text, Style::default().fg(Color::DarkGray)));
    f.render_widget(Paragraph::new(footer).alignment(Alignment::Center), area);
}

fn draw_game_over(f: &mut Frame, area: Rect, snap: &GameSnapshot) {
    let bold = Style::default().add_modifier(Modifier::BOLD);
    let lines = vec![
        Line::from(""),
        Line::from(Span::styled("SIGNAL LOST", bold.fg(Color::Red))),
        Line::from(""),
        Line::from(Span::styled(
            format!(
                "hits {}  misses {}  challenges {}",
                snap.correct_hits, snap.incorrect_hits, snap.completed_challenges
            ),
            Style::default().fg(Color::Gray),
        )),
        Line::from(""),
        Line::from(Span::styled(
            "(r)estart  (esc)ape",
            Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
        )),
    ];
    f.render_widget(
        Paragraph::new(lines)
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true }),
        area,
    );
}

/// Full-width banner shown while autoplay is blocked; any key retries.
fn draw_pending_play(f: &mut Frame, area: Rect) {
    let banner_area = Rect {
        x: area.x,
        y: area.y + area.height / 2,
        width: area.width,
        height: 3.min(area.height),
    };
    let bold = Style::default().add_modifier(Modifier::BOLD);
    let lines = vec![
        Line::from(Span::styled("AUDIO BLOCKED", bold.fg(Color::Yellow))),
        Line::from(Span::styled(
            "press any key to enable sound",
            Style::default().fg(Color::Gray),
        )),
    ];
    f.render_widget(
        Paragraph::new(lines)
            .alignment(Alignment::Center)
            .style(Style::default().bg(Color::Black)),
        banner_area,
    );
}

/// Compact one-line summary used by the results log and quit message.
pub fn summary_line(snap: &GameSnapshot) -> String {
    [
        format!("section {}", snap.section),
        format!("error level {}", snap.error_level),
        format!("{} hits", snap.correct_hits),
        format!("{} misses", snap.incorrect_hits),
    ]
    .iter()
    .join(" / ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::GameSession;
    use ratatui::{backend::TestBackend, Terminal};

    fn rendered(snap: &GameSnapshot, player: &PlayerSnapshot) -> String {
        let mut terminal = Terminal::new(TestBackend::new(80, 24)).unwrap();
        terminal.draw(|f| draw(f, snap, player)).unwrap();
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|cell| cell.symbol())
            .collect()
    }

    fn player_snapshot() -> PlayerSnapshot {
        PlayerSnapshot {
            playing: true,
            pending_play: false,
            position_ms: 3_000,
            duration_ms: 50_000,
            muted: false,
        }
    }

    #[test]
    fn test_summary_line() {
        let snap = GameSession::new().snapshot();
        assert_eq!(
            summary_line(&snap),
            "section 1 / error level 0 / 0 hits / 0 misses"
        );
    }

    #[test]
    fn test_footer_shows_mute_indicator() {
        let snap = GameSession::new().snapshot();
        let mut player = player_snapshot();
        assert!(!rendered(&snap, &player).contains("[muted]"));
        player.muted = true;
        assert!(rendered(&snap, &player).contains("[muted]"));
    }

    #[test]
    fn test_status_shows_position_against_duration() {
        let mut session = GameSession::new();
        session.start_section_challenges(Section::One);
        let rendered = rendered(&session.snapshot(), &player_snapshot());
        assert!(rendered.contains("3s / 50s"));
    }
}
