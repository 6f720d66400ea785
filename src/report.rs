//! Session feedback report
//!
//! Built from a completed session's violation log and rendered as plain text
//! (CLI, logs) or a standalone HTML document (dashboard download). An empty
//! log still renders a complete document with a zero total.

use serde::Serialize;

use crate::types::{ViolationLog, ViolationRecord};

pub const REPORT_TITLE: &str = "Pilot Training Feedback Report";

/// One table row per violation, in detection order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportRow {
    pub time: f64,
    pub rule_id: String,
    pub severity: u8,
    pub details: String,
}

impl From<&ViolationRecord> for ReportRow {
    fn from(record: &ViolationRecord) -> Self {
        Self {
            time: record.timestamp,
            rule_id: record.rule_id.clone(),
            severity: record.severity,
            details: record.details.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionReport {
    pub title: String,
    pub scenario_id: String,
    pub total_violations: usize,
    pub rows: Vec<ReportRow>,
}

impl SessionReport {
    pub fn from_log(log: &ViolationLog, scenario_id: &str) -> Self {
        Self {
            title: REPORT_TITLE.to_string(),
            scenario_id: scenario_id.to_string(),
            total_violations: log.len(),
            rows: log.iter().map(ReportRow::from).collect(),
        }
    }

    pub fn render_text(&self) -> String {
        let mut out = format!(
            "{}\nScenario: {}\nTotal Violations: {}\n",
            self.title, self.scenario_id, self.total_violations
        );
        if self.rows.is_empty() {
            out.push_str("No SOP violations recorded.\n");
            return out;
        }
        out.push('\n');
        out.push_str(&format!("{:>8}  {:<16}  {:>8}  {}\n", "Time", "Rule", "Severity", "Details"));
        for row in &self.rows {
            out.push_str(&format!(
                "{:>8.1}  {:<16}  {:>8}  {}\n",
                row.time, row.rule_id, row.severity, row.details
            ));
        }
        out
    }

    pub fn render_html(&self) -> String {
        let mut body = String::new();
        for row in &self.rows {
            body.push_str(&format!(
                "      <tr><td>{:.1}</td><td>{}</td><td>{}</td><td>{}</td></tr>\n",
                row.time,
                escape_html(&row.rule_id),
                row.severity,
                escape_html(&row.details)
            ));
        }

        format!(
            "<!DOCTYPE html>\n\
             <html>\n\
             <head>\n  <meta charset=\"utf-8\">\n  <title>{title}</title>\n</head>\n\
             <body>\n\
             \x20 <h1>{title}</h1>\n\
             \x20 <p>Scenario: {scenario}</p>\n\
             \x20 <p>Total Violations: {total}</p>\n\
             \x20 <table border=\"1\">\n\
             \x20   <thead><tr><th>Time</th><th>Rule</th><th>Severity</th><th>Details</th></tr></thead>\n\
             \x20   <tbody>\n{body}    </tbody>\n\
             \x20 </table>\n\
             </body>\n\
             </html>\n",
            title = escape_html(&self.title),
            scenario = escape_html(&self.scenario_id),
            total = self.total_violations,
            body = body,
        )
    }
}

fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
