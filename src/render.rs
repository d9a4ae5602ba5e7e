//! Colored terminal rendering for conversion results.

use owo_colors::OwoColorize;
use plan2ical_core::ConversionReport;
use plan2ical_core::convert::RowRejection;
use plan2ical_core::ics::EmitFailure;

pub trait Render {
    fn render(&self) -> String;
}

impl Render for RowRejection {
    fn render(&self) -> String {
        format!(
            "   {} row {}: {}",
            "✗".yellow(),
            self.index + 1,
            self.reason.to_string().dimmed()
        )
    }
}

impl Render for EmitFailure {
    fn render(&self) -> String {
        format!(
            "   {} event '{}': {}",
            "✗".red(),
            self.title,
            self.error.to_string().dimmed()
        )
    }
}

impl Render for ConversionReport {
    fn render(&self) -> String {
        let mut lines: Vec<String> = Vec::new();

        for rejection in &self.rejected {
            lines.push(rejection.render());
        }
        for failure in &self.encode_failures {
            lines.push(failure.render());
        }

        let mut summary = format!("Converted {} events", self.events_written);
        let dropped = [
            (self.skipped.len(), "skipped"),
            (self.rejected.len(), "rejected"),
            (self.encode_failures.len(), "failed"),
        ];
        let dropped: Vec<String> = dropped
            .iter()
            .filter(|(count, _)| *count > 0)
            .map(|(count, what)| format!("{count} {what}"))
            .collect();
        if !dropped.is_empty() {
            summary.push_str(&format!(" ({})", dropped.join(", ")));
        }
        lines.push(summary);

        lines.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use plan2ical_core::normalize::Rejection;

    #[test]
    fn test_report_summary() {
        let report = ConversionReport {
            table_rows: 4,
            candidates: 3,
            rejected: vec![RowRejection {
                index: 2,
                reason: Rejection::DateParse {
                    text: "31.02.2026 10:00".to_string(),
                },
            }],
            events_written: 2,
            ..Default::default()
        };

        let text = report.render();
        assert!(text.contains("row 3"), "Got: {text}");
        assert!(text.contains("31.02.2026 10:00"));
        assert!(text.ends_with("Converted 2 events (1 rejected)"), "Got: {text}");
    }

    #[test]
    fn test_clean_report_has_no_details() {
        let report = ConversionReport {
            events_written: 5,
            ..Default::default()
        };
        assert_eq!(report.render(), "Converted 5 events");
    }
}
