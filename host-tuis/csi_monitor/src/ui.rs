use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::symbols::Marker;
use ratatui::text::{Line, Span};
use ratatui::widgets::{Axis, Block, Borders, Chart, Dataset, Gauge, GraphType, List, ListItem, Paragraph, Sparkline};

use crate::monitor::{MonitorState, Snapshot};

pub fn render(frame: &mut Frame, state: &mut MonitorState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),  // Header
            Constraint::Length(3),  // Presence gauge
            Constraint::Length(5),  // Features
            Constraint::Min(10),    // Energy + motion
            Constraint::Length(10), // Messages
        ])
        .split(frame.area());

    render_header(frame, chunks[0], state);

    let thresholds = state.settings.thresholds;
    let has_baseline = state.baseline.is_some();
    match state.snapshot().cloned() {
        Some(snapshot) => {
            render_presence(frame, chunks[1], &snapshot, thresholds.crowd, has_baseline);
            render_features(frame, chunks[2], &snapshot);

            let plots = Layout::default()
                .direction(Direction::Horizontal)
                .constraints([Constraint::Percentage(40), Constraint::Percentage(60)])
                .split(chunks[3]);
            render_energy(frame, plots[0], &snapshot);
            render_motion(frame, plots[1], &snapshot);
        }
        None => {
            let waiting = Paragraph::new("Waiting for CSI_DATA lines...")
                .block(Block::default().borders(Borders::ALL).title("Presence"));
            frame.render_widget(waiting, chunks[1]);
        }
    }

    render_messages(frame, chunks[4], state);
}

fn render_header(frame: &mut Frame, area: Rect, state: &MonitorState) {
    let baseline = if state.baseline.is_some() { "baseline set" } else { "no baseline" };
    let header = Paragraph::new(format!(
        "ESP32 CSI Monitor | Port: {} | {} frames | {} | 'b' baseline, 'c' clear, 'q' quit",
        state.port_name, state.frames_seen, baseline
    ))
    .block(Block::default().borders(Borders::ALL).title("Status"))
    .style(Style::default().fg(Color::Cyan));
    frame.render_widget(header, area);
}

fn render_presence(frame: &mut Frame, area: Rect, snapshot: &Snapshot, crowd: f64, has_baseline: bool) {
    let block = Block::default().borders(Borders::ALL).title("Presence");

    let Some(assessment) = snapshot.assessment else {
        let hint = if has_baseline {
            "Computing..."
        } else {
            "Press 'b' in an empty room to capture a baseline"
        };
        frame.render_widget(Paragraph::new(hint).block(block), area);
        return;
    };

    let color = if assessment.detection.is_occupied() { Color::Red } else { Color::Green };
    let ratio = if crowd > 0.0 {
        (assessment.z_motion / crowd).clamp(0.0, 1.0)
    } else {
        1.0
    };
    let gauge = Gauge::default()
        .block(block)
        .gauge_style(Style::default().fg(color).add_modifier(Modifier::BOLD))
        .ratio(if ratio.is_nan() { 0.0 } else { ratio })
        .label(format!(
            "{} ({}) z={:.2}",
            assessment.detection, assessment.confidence, assessment.z_motion
        ));
    frame.render_widget(gauge, area);
}

fn render_features(frame: &mut Frame, area: Rect, snapshot: &Snapshot) {
    let features = &snapshot.features;
    let lines = vec![
        Line::from(vec![
            Span::raw("Window: "),
            Span::styled(
                format!("{} frames x {} subcarriers", snapshot.frames, snapshot.subcarriers),
                Style::default().fg(Color::White),
            ),
        ]),
        Line::from(format!(
            "Mean energy {:.2} | Temporal variance {:.2} | Motion variance {:.3}",
            features.mean_energy, features.temporal_variance, features.motion_variance
        )),
        Line::from(match snapshot.assessment {
            Some(assessment) => format!("Energy deviation {:+.2}", assessment.z_energy),
            None => String::from("Energy deviation n/a"),
        }),
    ];
    let paragraph =
        Paragraph::new(lines).block(Block::default().borders(Borders::ALL).title("Features"));
    frame.render_widget(paragraph, area);
}

fn render_energy(frame: &mut Frame, area: Rect, snapshot: &Snapshot) {
    // Sparkline bars are integers; keep two decimals of resolution.
    let visible = usize::from(area.width.saturating_sub(2));
    let skip = snapshot.energy.len().saturating_sub(visible);
    let data: Vec<u64> = snapshot.energy[skip..]
        .iter()
        .map(|e| (e * 100.0).round() as u64)
        .collect();
    let latest = snapshot.energy.last().copied().unwrap_or_default();

    let sparkline = Sparkline::default()
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(format!("CSI Energy ({latest:.2})")),
        )
        .data(&data)
        .style(Style::default().fg(Color::Yellow));
    frame.render_widget(sparkline, area);
}

fn render_motion(frame: &mut Frame, area: Rect, snapshot: &Snapshot) {
    let points: Vec<(f64, f64)> = snapshot
        .motion_path
        .iter()
        .enumerate()
        .map(|(t, &p)| (t as f64, p))
        .collect();
    let x_max = (points.len().max(2) - 1) as f64;
    let y_max = (snapshot.subcarriers.max(2) - 1) as f64;

    let dataset = Dataset::default()
        .name("centroid")
        .marker(Marker::Braille)
        .graph_type(GraphType::Line)
        .style(Style::default().fg(Color::Green))
        .data(&points);

    let chart = Chart::new(vec![dataset])
        .block(Block::default().borders(Borders::ALL).title("Motion Path"))
        .x_axis(
            Axis::default()
                .title("frame")
                .style(Style::default().fg(Color::Gray))
                .bounds([0.0, x_max]),
        )
        .y_axis(
            Axis::default()
                .title("subcarrier")
                .style(Style::default().fg(Color::Gray))
                .bounds([0.0, y_max])
                .labels(["0".to_string(), format!("{y_max:.0}")]),
        );
    frame.render_widget(chart, area);
}

fn render_messages(frame: &mut Frame, area: Rect, state: &MonitorState) {
    let messages: Vec<ListItem> = state
        .messages
        .iter()
        .rev()
        .take(8)
        .map(|m| ListItem::new(m.as_str()))
        .collect();

    let messages_widget = List::new(messages)
        .block(Block::default().borders(Borders::ALL).title("Event Log"))
        .style(Style::default().fg(Color::Gray));
    frame.render_widget(messages_widget, area);
}
