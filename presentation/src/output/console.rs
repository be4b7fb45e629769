//! Console output formatter for problem markers

use crate::output::formatter::OutputFormatter;
use colored::{ColoredString, Colorize};
use zeladoria_application::{ErrorCategory, MarkerView, StallSweepReport, WorkflowError};
use zeladoria_domain::{
    ColorToken, ProblemId, ProblemStatus, ProblemType, grouped_by_category, validations_needed,
};

/// Formats results for terminal display
pub struct ConsoleFormatter;

impl ConsoleFormatter {
    /// Format one marker with all of its details
    pub fn format_marker(marker: &MarkerView) -> String {
        let p = &marker.problem;
        let mut output = String::new();

        output.push_str(&Self::header(&format!(
            "{} {} {}",
            marker.display.icon, p.id, marker.display.title
        )));
        output.push('\n');

        output.push_str(&format!(
            "{} {}\n",
            "Status:".cyan().bold(),
            Self::status_label(p.status, marker.style.color)
        ));
        if let Some(category) = &marker.display.category {
            output.push_str(&format!("{} {}\n", "Category:".cyan().bold(), category));
        }
        output.push_str(&format!(
            "{} {:.5}, {:.5}\n",
            "Location:".cyan().bold(),
            p.location.lat,
            p.location.lng
        ));
        output.push_str(&format!("{} {}\n", "Reported by:".cyan().bold(), p.reported_by));
        output.push_str(&format!(
            "{} {}\n",
            "Reported at:".cyan().bold(),
            p.created_at.format("%Y-%m-%d %H:%M UTC")
        ));

        output.push_str(&format!("\n{}\n", p.description));

        output.push_str(&Self::section_header("Votes"));
        output.push_str(&format!("  Confirmations: {}\n", p.confirmation_count));
        if p.status == ProblemStatus::Resolved {
            output.push_str(&format!(
                "  Validations:   {}/{}",
                p.validation_count, p.validation_quorum
            ));
            match validations_needed(p.validation_count) {
                0 => output.push_str(" (final)\n"),
                needed => output.push_str(&format!(" ({} more needed)\n", needed)),
            }
            if let Some(resolved_at) = p.resolved_at {
                output.push_str(&format!(
                    "  Resolved at:   {}\n",
                    resolved_at.format("%Y-%m-%d %H:%M UTC")
                ));
            }
        }

        if let Some(note) = &p.official_note {
            output.push_str(&Self::section_header("Official note"));
            output.push_str(&Self::indent(note, "  "));
            output.push('\n');
        }

        output.push_str(&format!(
            "\n{} {}\n",
            "Marker:".dimmed(),
            format!(
                "size {} font {:.1} color {}",
                marker.style.size,
                marker.style.font_size,
                marker.style.color.hex()
            )
            .dimmed()
        ));
        output.push_str(&format!(
            "{} {}\n",
            "Actions:".cyan().bold(),
            Self::actions_line(marker)
        ));

        output.push_str(&Self::footer());
        output
    }

    /// One line per marker
    pub fn format_markers(markers: &[MarkerView]) -> String {
        if markers.is_empty() {
            return format!("{}\n", "No problems reported.".dimmed());
        }

        let mut output = String::new();
        for marker in markers {
            let p = &marker.problem;
            let votes = match p.status {
                ProblemStatus::Resolved => format!(
                    "{} conf, {}/{} val",
                    p.confirmation_count, p.validation_count, p.validation_quorum
                ),
                _ => format!("{} conf", p.confirmation_count),
            };
            output.push_str(&format!(
                "{:>5}  {} {:<11} {:<24} {:<20} {}\n",
                p.id.to_string().bold(),
                marker.display.icon,
                Self::status_label(p.status, marker.style.color),
                Self::truncate(&marker.display.title, 24),
                votes,
                Self::truncate(&p.description, 40).dimmed()
            ));
        }
        output.push_str(&format!("\n{} problem(s)\n", markers.len()));
        output
    }

    /// Types grouped by category, categories in alphabetical order
    pub fn format_types(types: &[ProblemType]) -> String {
        if types.is_empty() {
            return format!("{}\n", "The type catalog is empty.".dimmed());
        }

        let mut output = String::new();
        for (category, entries) in grouped_by_category(types) {
            output.push_str(&Self::section_header(category));
            for entry in entries {
                output.push_str(&format!(
                    "  {} {:<16} {}\n",
                    entry.icon,
                    entry.key.as_str().yellow(),
                    entry.title
                ));
            }
        }
        output
    }

    pub fn format_deleted(id: ProblemId, existed: bool) -> String {
        if existed {
            format!("{} Problem {} deleted\n", "✓".green().bold(), id)
        } else {
            format!(
                "{} Problem {} did not exist, nothing to delete\n",
                "✓".green().bold(),
                id
            )
        }
    }

    pub fn format_sweep(report: &StallSweepReport) -> String {
        let ids = |list: &[ProblemId]| {
            list.iter()
                .map(ProblemId::to_string)
                .collect::<Vec<_>>()
                .join(", ")
        };

        if report.contested.is_empty() && report.skipped.is_empty() {
            return format!("{}\n", "No stalled resolutions.".dimmed());
        }

        let mut output = String::new();
        if !report.contested.is_empty() {
            output.push_str(&format!(
                "{} {}\n",
                "Sent back to review:".yellow().bold(),
                ids(&report.contested)
            ));
        }
        if !report.skipped.is_empty() {
            output.push_str(&format!(
                "{} {}\n",
                "Changed during sweep:".dimmed(),
                ids(&report.skipped)
            ));
        }
        output
    }

    pub fn format_error(error: &WorkflowError) -> String {
        let label = match error.category() {
            ErrorCategory::Denied => "Denied",
            ErrorCategory::Conflict => "Conflict",
            ErrorCategory::NotFound => "Not found",
            ErrorCategory::Transient => "Unavailable",
            ErrorCategory::Invalid => "Invalid input",
            ErrorCategory::Cancelled => "Cancelled",
            ErrorCategory::Internal => "Internal error",
        };
        let mut output = format!("{} {}\n", format!("{}:", label).red().bold(), error);
        if error.is_retryable() {
            output.push_str(&format!("{}\n", "The store is busy; try again shortly.".dimmed()));
        } else if error.requires_resync() {
            output.push_str(&format!("{}\n", "Refresh the problem before retrying.".dimmed()));
        }
        output
    }

    fn status_label(status: ProblemStatus, color: ColorToken) -> ColoredString {
        let label = status.as_str();
        match color {
            ColorToken::Alert => label.red().bold(),
            ColorToken::Warning => label.yellow().bold(),
            ColorToken::Success => label.green().bold(),
        }
    }

    fn actions_line(marker: &MarkerView) -> String {
        if marker.actions.is_empty() {
            return "none".dimmed().to_string();
        }
        marker
            .actions
            .iter()
            .map(|a| a.to_string())
            .collect::<Vec<_>>()
            .join(", ")
    }

    fn header(title: &str) -> String {
        let line = "=".repeat(60);
        format!("{}\n{}\n{}", line.cyan(), title.bold(), line.cyan())
    }

    fn section_header(title: &str) -> String {
        format!("\n{}\n{}\n", title.cyan().bold(), "-".repeat(40))
    }

    fn footer() -> String {
        format!("{}\n", "=".repeat(60).cyan())
    }

    fn truncate(text: &str, max_chars: usize) -> String {
        if text.chars().count() <= max_chars {
            return text.to_string();
        }
        let cut: String = text.chars().take(max_chars.saturating_sub(1)).collect();
        format!("{}…", cut)
    }

    /// Indent a multi-line string
    pub fn indent(text: &str, prefix: &str) -> String {
        text.lines()
            .map(|line| format!("{}{}", prefix, line))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl OutputFormatter for ConsoleFormatter {
    fn format_marker(&self, marker: &MarkerView) -> String {
        Self::format_marker(marker)
    }

    fn format_markers(&self, markers: &[MarkerView]) -> String {
        Self::format_markers(markers)
    }

    fn format_types(&self, types: &[ProblemType]) -> String {
        Self::format_types(types)
    }

    fn format_deleted(&self, id: ProblemId, existed: bool) -> String {
        Self::format_deleted(id, existed)
    }

    fn format_sweep(&self, report: &StallSweepReport) -> String {
        Self::format_sweep(report)
    }

    fn format_error(&self, error: &WorkflowError) -> String {
        Self::format_error(error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use zeladoria_application::ProblemSummary;
    use zeladoria_domain::{
        ActionKind, Location, MarkerStyle, Rejection, Role, TypeDisplay, TypeKey, Unauthorized,
        VALIDATION_QUORUM,
    };

    fn marker(status: ProblemStatus, confirmations: u32, validations: u32) -> MarkerView {
        let at = Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap();
        MarkerView {
            problem: ProblemSummary {
                id: ProblemId::new(7),
                type_key: "buraco".into(),
                description: "Cratera na esquina".into(),
                location: Location {
                    lat: -23.55052,
                    lng: -46.63331,
                },
                status,
                confirmation_count: confirmations,
                validation_count: validations,
                validation_quorum: VALIDATION_QUORUM,
                official_note: Some("Equipe agendada".into()),
                reported_by: "maria".into(),
                created_at: at,
                updated_at: at,
                resolved_at: (status == ProblemStatus::Resolved).then_some(at),
            },
            style: MarkerStyle::new(confirmations, status),
            display: TypeDisplay {
                icon: "🕳️".into(),
                title: "Buraco na via".into(),
                category: Some("Vias".into()),
            },
            actions: vec![ActionKind::Validate],
        }
    }

    #[test]
    fn test_marker_shows_votes_and_note() {
        let text = ConsoleFormatter::format_marker(&marker(ProblemStatus::Resolved, 4, 1));
        assert!(text.contains("#7"));
        assert!(text.contains("Buraco na via"));
        assert!(text.contains("Confirmations: 4"));
        assert!(text.contains("Validations:   1/3 (2 more needed)"));
        assert!(text.contains("Equipe agendada"));
        assert!(text.contains("-23.55052, -46.63331"));
    }

    #[test]
    fn test_validated_marker_is_final() {
        let text = ConsoleFormatter::format_marker(&marker(ProblemStatus::Resolved, 4, 3));
        assert!(text.contains("Validations:   3/3 (final)"));
        assert!(!text.contains("more needed"));
    }

    #[test]
    fn test_stale_view_error_suggests_refresh() {
        let stale = WorkflowError::from(Rejection::QuorumReached { required: 3 });
        assert!(ConsoleFormatter::format_error(&stale).contains("Refresh the problem"));

        let denied = WorkflowError::Unauthorized(Unauthorized {
            role: Role::Citizen,
            action: ActionKind::MarkResolved,
        });
        assert!(!ConsoleFormatter::format_error(&denied).contains("Refresh the problem"));
    }

    #[test]
    fn test_open_marker_hides_validations() {
        let text = ConsoleFormatter::format_marker(&marker(ProblemStatus::Open, 1, 0));
        assert!(!text.contains("Validations"));
    }

    #[test]
    fn test_empty_feed() {
        assert!(ConsoleFormatter::format_markers(&[]).contains("No problems reported."));
    }

    #[test]
    fn test_feed_counts_problems() {
        let markers = vec![
            marker(ProblemStatus::Open, 2, 0),
            marker(ProblemStatus::Resolved, 5, 2),
        ];
        let text = ConsoleFormatter::format_markers(&markers);
        assert!(text.contains("2 problem(s)"));
        assert!(text.contains("5 conf, 2/3 val"));
    }

    #[test]
    fn test_types_grouped_by_category() {
        let key = |k: &str| TypeKey::new(k).unwrap();
        let types = vec![
            ProblemType::new(key("lixo"), "Lixo acumulado", "Limpeza", "🗑️"),
            ProblemType::new(key("buraco"), "Buraco na via", "Vias", "🕳️"),
            ProblemType::new(key("entulho"), "Entulho", "Limpeza", "🧱"),
        ];
        let text = ConsoleFormatter::format_types(&types);
        let limpeza = text.find("Limpeza").unwrap();
        let vias = text.find("Vias").unwrap();
        assert!(limpeza < vias);
        assert!(text.find("Lixo acumulado").unwrap() < text.find("Entulho").unwrap());
    }

    #[test]
    fn test_error_label_follows_category() {
        let text = ConsoleFormatter::format_error(&WorkflowError::NotFound(ProblemId::new(9)));
        assert!(text.contains("Not found:"));
        assert!(text.contains("#9"));
    }

    #[test]
    fn test_sweep_lists_contested() {
        let report = StallSweepReport {
            contested: vec![ProblemId::new(1), ProblemId::new(3)],
            skipped: vec![],
        };
        let text = ConsoleFormatter::format_sweep(&report);
        assert!(text.contains("#1, #3"));
        assert!(!text.contains("Changed during sweep"));
    }

    #[test]
    fn test_truncate_counts_chars() {
        assert_eq!(ConsoleFormatter::truncate("calçada", 10), "calçada");
        assert_eq!(ConsoleFormatter::truncate("calçada quebrada", 8), "calçada…");
    }
}
