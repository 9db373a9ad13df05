//! Terminal rendering helpers: team colors and the results table, the
//! surviving half of the teacher's formatting utilities (lap-time parsing
//! and mechanical-failure rolls moved into `engine::reliability`, which
//! owns the actual DNF model now).

use colored::{Color, Colorize};
use tabled::{settings::Style, Table, Tabled};

use crate::models::SimulationSummary;

/// Color used for a constructor's name in terminal output, kept from the
/// teacher's team-name heuristics.
pub fn get_team_color(team: &str) -> Color {
    match team.to_lowercase().as_str() {
        team if team.contains("mercedes") => Color::BrightCyan,
        team if team.contains("red bull") => Color::Blue,
        team if team.contains("ferrari") => Color::Red,
        team if team.contains("mclaren") => Color::BrightYellow,
        team if team.contains("aston martin") => Color::Green,
        team if team.contains("alpine") => Color::Magenta,
        team if team.contains("williams") => Color::BrightBlue,
        team if team.contains("haas") => Color::White,
        team if team.contains("alfa") || team.contains("sauber") => Color::BrightRed,
        _ => Color::White,
    }
}

fn colorize_team(team: &str) -> colored::ColoredString {
    match get_team_color(team) {
        Color::BrightCyan => team.bright_cyan(),
        Color::Blue => team.blue(),
        Color::Red => team.red(),
        Color::BrightYellow => team.bright_yellow(),
        Color::Green => team.green(),
        Color::Magenta => team.magenta(),
        Color::BrightBlue => team.bright_blue(),
        Color::White => team.white(),
        Color::BrightRed => team.bright_red(),
        _ => team.normal(),
    }
}

#[derive(Tabled)]
struct ResultRow {
    #[tabled(rename = "Pos")]
    position: String,
    #[tabled(rename = "Driver")]
    driver: String,
    #[tabled(rename = "Team")]
    team: String,
    #[tabled(rename = "Win %")]
    win_probability: String,
    #[tabled(rename = "Podium %")]
    podium_probability: String,
    #[tabled(rename = "DNF %")]
    dnf_probability: String,
    #[tabled(rename = "Avg Finish")]
    average_finish: String,
    #[tabled(rename = "Exp. Pts")]
    expected_points: String,
}

/// Render a `SimulationSummary` as a results table, sorted as the summary
/// already is (win probability descending, average finish ascending).
pub fn format_summary_table(summary: &SimulationSummary) -> String {
    let rows: Vec<ResultRow> = summary
        .results
        .iter()
        .enumerate()
        .map(|(index, r)| ResultRow {
            position: (index + 1).to_string(),
            driver: r.name.clone(),
            team: colorize_team(&r.team).to_string(),
            win_probability: format!("{:.1}%", r.win_probability * 100.0),
            podium_probability: format!("{:.1}%", r.podium_probability * 100.0),
            dnf_probability: format!("{:.1}%", r.dnf_probability * 100.0),
            average_finish: format!("{:.2}", r.average_finish),
            expected_points: format!("{:.1}", r.expected_points),
        })
        .collect();

    Table::new(rows).with(Style::rounded()).to_string()
}
