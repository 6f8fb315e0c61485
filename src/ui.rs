use std::rc::Rc;

use ratatui::Frame;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span, Text};
use ratatui::widgets::{Block, BorderType, Borders, Clear, Padding, Paragraph, Wrap};

use crate::app::AppState;
use crate::layout::PANE_GUTTER;
use crate::model::{ConfirmRequest, DialogState, ResourceCategory, Tab};
use crate::pane::{ListPane, truncate_to_width};

const BG: Color = Color::Rgb(9, 15, 25);
const PANEL: Color = Color::Rgb(16, 27, 44);
const ACCENT: Color = Color::Rgb(52, 211, 153);
const MUTED: Color = Color::Rgb(140, 156, 178);
const WARN: Color = Color::Rgb(251, 191, 36);
const ERROR: Color = Color::Rgb(248, 113, 113);
const TITLE: Color = Color::Rgb(103, 232, 249);

pub const APP_TITLE: &str = "lazystack - Kubernetes TUI";
pub const HELP_HINT: &str = "?: help • tab/shift-tab: cycle • 1-4: jump • l: logs • s: stats • e: env • c: config • +/-: scale • p: port-fwd • P: stop • d: delete • r: refresh • q: quit";

const HELP_LINES: &[(&str, &[(&str, &str)])] = &[
    (
        "NAVIGATION",
        &[
            ("tab / shift+tab", "Cycle through sections"),
            ("1-4", "Jump to section (1:Namespaces 2:Deployments 3:Pods 4:Services)"),
            ("j / down, k / up", "Move in list"),
            ("g / G, PgUp / PgDn", "First, last, page"),
            ("enter", "Select (switch namespace, reload content)"),
        ],
    ),
    (
        "TABS",
        &[
            ("l", "Logs"),
            ("s", "Stats (resource metrics)"),
            ("e", "Environment variables"),
            ("c", "Config (YAML view)"),
            ("t", "Top (pods by restarts)"),
            ("x", "Exec"),
            ("J / K, ctrl+d / ctrl+u", "Scroll content"),
            ("a", "Toggle auto-follow"),
        ],
    ),
    (
        "ACTIONS",
        &[
            ("+ / -", "Scale deployment up or down"),
            ("p", "Start port-forward for the selected pod"),
            ("P", "Stop all port-forwards"),
            ("d", "Delete selected pod or deployment"),
            ("r / F5", "Refresh lists"),
        ],
    ),
    (
        "GENERAL",
        &[
            ("?", "Toggle this help screen"),
            ("q / ctrl+c", "Quit"),
            ("esc", "Close dialog or help"),
        ],
    ),
];

/// Draws the base frame, then the active dialog (if any) on top of it.
pub fn render(frame: &mut Frame, state: &AppState) {
    let root = frame_rows(frame.area());

    frame.render_widget(Block::default().style(Style::default().bg(BG)), frame.area());
    render_title(frame, root[0], state);
    render_main(frame, root[1], state);
    render_status(frame, root[2], state);
    render_help_hint(frame, root[3]);

    match state.dialog() {
        DialogState::None => {}
        DialogState::Help => render_help_overlay(frame),
        DialogState::Confirm(request) => render_confirm_overlay(frame, request),
    }
}

/// Title, main, status and help hint rows.
fn frame_rows(area: Rect) -> Rc<[Rect]> {
    Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(0),
            Constraint::Length(1),
            Constraint::Length(1),
        ])
        .split(area)
}

fn main_columns(area: Rect, left_width: u16) -> Rc<[Rect]> {
    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Length(left_width),
            Constraint::Length(PANE_GUTTER),
            Constraint::Min(0),
        ])
        .split(area)
}

fn render_title(frame: &mut Frame, area: Rect, state: &AppState) {
    let mut spans = vec![Span::styled(
        format!(" {APP_TITLE} "),
        Style::default().fg(TITLE).add_modifier(Modifier::BOLD),
    )];
    if !state.context().is_empty() {
        spans.push(Span::styled(
            format!(" ctx:{} ", state.context()),
            Style::default().fg(MUTED),
        ));
    }
    if state.port_forward_count() > 0 {
        spans.push(Span::styled(
            format!(" pf:{} ", state.port_forward_count()),
            Style::default().fg(WARN),
        ));
    }
    if let Some(refreshed) = state.last_refresh() {
        spans.push(Span::styled(
            format!(" refreshed {} ", refreshed.format("%H:%M:%S")),
            Style::default().fg(MUTED),
        ));
    }
    frame.render_widget(
        Paragraph::new(Line::from(spans)).style(Style::default().bg(BG)),
        area,
    );
}

fn render_main(frame: &mut Frame, area: Rect, state: &AppState) {
    let columns = main_columns(area, state.geometry().left_width);

    render_left(frame, columns[0], state);
    render_right(frame, columns[2], state);
}

fn render_left(frame: &mut Frame, area: Rect, state: &AppState) {
    let geometry = state.geometry();
    let pane_height = geometry.pane_height;
    let mut constraints = vec![Constraint::Length(pane_height); ResourceCategory::ALL.len()];
    constraints.push(Constraint::Min(0));
    let sections = Layout::default()
        .direction(Direction::Vertical)
        .constraints(constraints)
        .split(area);

    for (category, section) in ResourceCategory::ALL.into_iter().zip(sections.iter()) {
        render_pane(
            frame,
            *section,
            state.pane(category),
            category == state.category(),
            geometry.pane_inner_width(),
        );
    }
}

fn render_pane(
    frame: &mut Frame,
    area: Rect,
    pane: &ListPane,
    focused: bool,
    inner_width: usize,
) {
    let block = Block::default()
        .title(pane.title())
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(if focused {
            Style::default().fg(ACCENT)
        } else {
            Style::default().fg(MUTED)
        })
        .style(Style::default().bg(PANEL));

    let lines = if let Some(error) = pane.error() {
        vec![Line::from(Span::styled(
            truncate_to_width(error, inner_width),
            Style::default().fg(ERROR),
        ))]
    } else if pane.is_empty() {
        let text = if pane.is_loading() {
            "Loading..."
        } else {
            "No items"
        };
        vec![Line::from(Span::styled(text, Style::default().fg(MUTED)))]
    } else {
        pane.rows(inner_width)
            .into_iter()
            .map(|row| {
                let style = if row.selected && focused {
                    Style::default().fg(ACCENT).add_modifier(Modifier::BOLD)
                } else if row.selected {
                    Style::default().fg(Color::White).add_modifier(Modifier::BOLD)
                } else {
                    Style::default().fg(Color::White)
                };
                Line::from(Span::styled(row.text, style))
            })
            .collect()
    };

    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn content_block() -> Block<'static> {
    Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(MUTED))
        .padding(Padding::uniform(1))
        .style(Style::default().bg(PANEL))
}

fn render_right(frame: &mut Frame, area: Rect, state: &AppState) {
    let block = content_block();
    let rows = right_rows(block.inner(area));
    frame.render_widget(block, area);

    frame.render_widget(Paragraph::new(tab_header(state.tab())), rows[0]);

    let viewport = state.active_viewport();
    let text = if state.tab() == Tab::Config {
        highlight_yaml_text(viewport.content())
    } else {
        Text::from(viewport.content().to_string())
    };
    let offset = u16::try_from(viewport.offset()).unwrap_or(u16::MAX);
    frame.render_widget(
        Paragraph::new(text)
            .style(Style::default().fg(Color::White))
            .scroll((offset, 0)),
        rows[2],
    );
    frame.render_widget(
        Paragraph::new(viewport.status_line())
            .style(Style::default().fg(MUTED))
            .alignment(Alignment::Right),
        rows[3],
    );
}

/// Tab header, spacer, content and scroll status rows of the right pane.
fn right_rows(inner: Rect) -> Rc<[Rect]> {
    Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Min(0),
            Constraint::Length(1),
        ])
        .split(inner)
}

fn tab_header(active: Tab) -> Line<'static> {
    let mut spans = Vec::new();
    for tab in Tab::ALL {
        let label = format!(" [{}] {} ", tab.hotkey(), tab.title());
        let style = if tab == active {
            Style::default()
                .fg(Color::Black)
                .bg(ACCENT)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(MUTED)
        };
        spans.push(Span::styled(label, style));
        spans.push(Span::raw(" "));
    }
    Line::from(spans)
}

fn render_status(frame: &mut Frame, area: Rect, state: &AppState) {
    let text = format!(" Namespace: {} | {}", state.namespace(), state.status());
    let color = if state.last_error().is_some() {
        ERROR
    } else {
        TITLE
    };
    frame.render_widget(
        Paragraph::new(truncate_to_width(&text, usize::from(area.width)))
            .style(Style::default().fg(color).bg(BG).add_modifier(Modifier::BOLD)),
        area,
    );
}

fn render_help_hint(frame: &mut Frame, area: Rect) {
    let width = usize::from(area.width.saturating_sub(2));
    frame.render_widget(
        Paragraph::new(format!(" {}", truncate_to_width(HELP_HINT, width)))
            .style(Style::default().fg(MUTED).bg(BG)),
        area,
    );
}

fn render_help_overlay(frame: &mut Frame) {
    let area = centered_rect(70, 80, frame.area());
    frame.render_widget(Clear, area);

    let mut lines = vec![
        Line::from(Span::styled(
            "LAZYSTACK - KEYBOARD SHORTCUTS",
            Style::default().fg(TITLE).add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
    ];
    for (section, bindings) in HELP_LINES {
        lines.push(Line::from(Span::styled(
            *section,
            Style::default().fg(ACCENT).add_modifier(Modifier::BOLD),
        )));
        for (keys, meaning) in *bindings {
            lines.push(Line::from(vec![
                Span::styled(format!("  {keys:<24}"), Style::default().fg(WARN)),
                Span::raw(*meaning),
            ]));
        }
        lines.push(Line::from(""));
    }
    lines.push(Line::from(Span::styled(
        "Press ? or q to close this help screen",
        Style::default().fg(MUTED),
    )));

    let modal = Paragraph::new(lines)
        .wrap(Wrap { trim: false })
        .block(
            Block::default()
                .title("Help")
                .borders(Borders::ALL)
                .border_type(BorderType::Rounded)
                .border_style(Style::default().fg(TITLE))
                .padding(Padding::horizontal(1))
                .style(Style::default().bg(PANEL)),
        )
        .style(Style::default().fg(Color::White));
    frame.render_widget(modal, area);
}

fn render_confirm_overlay(frame: &mut Frame, request: &ConfirmRequest) {
    let area = centered_fixed(50, 7, frame.area());
    frame.render_widget(Clear, area);

    let color = if request.action.is_destructive() {
        ERROR
    } else {
        WARN
    };
    let lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            request.prompt(),
            Style::default().fg(color).add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(Span::styled("[Y] Yes  [N] No", Style::default().fg(MUTED))),
    ];
    let dialog = Paragraph::new(lines)
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true })
        .block(
            Block::default()
                .title("Confirm")
                .borders(Borders::ALL)
                .border_type(BorderType::Rounded)
                .border_style(Style::default().fg(color))
                .style(Style::default().bg(PANEL)),
        );
    frame.render_widget(dialog, area);
}

fn highlight_yaml_text(input: &str) -> Text<'static> {
    Text::from(input.lines().map(highlight_yaml_line).collect::<Vec<_>>())
}

fn highlight_yaml_line(line: &str) -> Line<'static> {
    let indent_len = line.len() - line.trim_start_matches([' ', '-']).len();
    let (indent, rest) = line.split_at(indent_len);
    let Some((key, value)) = rest.split_once(':') else {
        return Line::from(line.to_string());
    };
    if key.is_empty() || key.contains(' ') {
        return Line::from(line.to_string());
    }
    Line::from(vec![
        Span::styled(indent.to_string(), Style::default().fg(ACCENT)),
        Span::styled(key.to_string(), Style::default().fg(TITLE)),
        Span::styled(":", Style::default().fg(MUTED)),
        Span::styled(value.to_string(), Style::default().fg(yaml_value_color(value.trim()))),
    ])
}

fn yaml_value_color(value: &str) -> Color {
    if matches!(value, "true" | "false" | "null" | "~") {
        WARN
    } else if value.parse::<f64>().is_ok() {
        Color::Rgb(251, 146, 60)
    } else {
        Color::Rgb(147, 197, 253)
    }
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}

fn centered_fixed(width: u16, height: u16, area: Rect) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    }
}
