//! Server-rendered HTML for the dashboard and history pages.

use sheetwatch_core::types::HistoryEntry;
use sheetwatch_scheduler::ServiceStatus;

const STYLE: &str = r#"
body { font-family: system-ui, sans-serif; max-width: 860px; margin: 2rem auto; padding: 0 1rem; color: #222; }
h1 { font-size: 1.5rem; }
.badge { display: inline-block; padding: 2px 10px; border-radius: 10px; color: #fff; }
.active { background: #2e7d32; }
.inactive { background: #757575; }
.result { font-size: 1.1rem; padding: .75rem; background: #f5f5f5; border-radius: 6px; }
form { display: inline; }
button { margin-right: .5rem; padding: .4rem 1rem; }
table { border-collapse: collapse; width: 100%; margin-top: 1rem; }
th, td { text-align: left; padding: .35rem .5rem; border-bottom: 1px solid #ddd; }
tr.departed td { background: #fff3e0; font-weight: bold; }
tr.error td { color: #c62828; }
"#;

/// Escape text for HTML bodies and attribute values.
fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

fn page(title: &str, body: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n\
         <title>{title}</title>\n<style>{STYLE}</style>\n</head>\n<body>\n{body}</body>\n</html>\n"
    )
}

fn status_badge(is_active: bool) -> &'static str {
    if is_active {
        r#"<span class="badge active">Active</span>"#
    } else {
        r#"<span class="badge inactive">Inactive</span>"#
    }
}

/// Newest entries first.
fn history_table(history: &[HistoryEntry]) -> String {
    if history.is_empty() {
        return "<p>No checks recorded yet.</p>\n".into();
    }

    let mut rows = String::new();
    for entry in history.iter().rev() {
        rows.push_str(&format!(
            "<tr class=\"{}\"><td>{}</td><td>{}</td><td>{}</td></tr>\n",
            entry.status,
            escape_html(&entry.timestamp),
            entry.status,
            escape_html(&entry.message),
        ));
    }
    format!(
        "<table>\n<thead><tr><th>Time</th><th>Status</th><th>Message</th></tr></thead>\n\
         <tbody>\n{rows}</tbody>\n</table>\n"
    )
}

pub fn render_index(status: &ServiceStatus, polling_interval_secs: u64) -> String {
    let body = format!(
        "<h1>Spreadsheet Monitor</h1>\n\
         <p>Monitoring: {badge} &middot; every {polling_interval_secs}s</p>\n\
         <p class=\"result\">{result}</p>\n\
         <p><small>{time}</small></p>\n\
         <p>\n\
         <form method=\"post\" action=\"/start\"><button type=\"submit\">Start</button></form>\n\
         <form method=\"post\" action=\"/stop\"><button type=\"submit\">Stop</button></form>\n\
         <form method=\"post\" action=\"/check_now\"><button type=\"submit\">Check now</button></form>\n\
         <a href=\"/history\">Full history</a>\n\
         </p>\n\
         <h2>Recent checks</h2>\n{table}",
        badge = status_badge(status.is_active),
        result = escape_html(&status.last_result),
        time = escape_html(&status.last_check_time),
        table = history_table(&status.history),
    );
    page("Spreadsheet Monitor", &body)
}

pub fn render_history(status: &ServiceStatus) -> String {
    let body = format!(
        "<h1>Check History</h1>\n\
         <p>Monitoring: {badge} &middot; <a href=\"/\">Back to dashboard</a></p>\n{table}",
        badge = status_badge(status.is_active),
        table = history_table(&status.history),
    );
    page("Check History", &body)
}
