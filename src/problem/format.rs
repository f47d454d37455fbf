//! Output rendering for problems: syslog-style lines, severity summary and
//! the static HTML table.

use chrono::{DateTime, Local, TimeZone};

use crate::api::Severity;

use super::EnrichedProblem;

/// Render the event age as `DDd HHh MMm`, days omitted when zero.
pub fn format_age(clock: i64, now: i64) -> String {
    let delta = (now - clock).max(0);
    let days = delta / 86_400;
    let hours = (delta % 86_400) / 3_600;
    let minutes = (delta % 3_600) / 60;
    if days > 0 {
        format!("{days:02}d {hours:02}h {minutes:02}m")
    } else {
        format!("{hours:02}h {minutes:02}m")
    }
}

/// Event creation time in the machine-local zone.
pub fn format_timestamp(clock: i64) -> String {
    match Local.timestamp_opt(clock, 0).single() {
        Some(ts) => ts.format("%Y-%m-%d %H:%M:%S%:z").to_string(),
        None => clock.to_string(),
    }
}

fn header_date(now: DateTime<Local>) -> String {
    now.format("%a %Y-%m-%d H%H:%M").to_string()
}

/// One line per problem, syslog style.
pub fn syslog_line(problem: &EnrichedProblem, now: i64) -> String {
    let ack = if problem.acknowledged { "Ack: Yes" } else { "Ack: No" };
    format!(
        "{} [{}] {} [{}] {} ({}) [{}] [Age: {}]",
        format_timestamp(problem.clock),
        problem.severity_label(),
        problem.host_label(),
        problem.eventid,
        problem.trigger_label(),
        problem.triggerid,
        ack,
        format_age(problem.clock, now),
    )
}

/// Count problems per severity level. Unclassifiable problems (failed
/// trigger lookup) are counted in the total only.
pub fn severity_counts(problems: &[EnrichedProblem]) -> [usize; 6] {
    let mut counts = [0usize; 6];
    for problem in problems {
        if let Some(severity) = problem.severity {
            counts[severity as usize] += 1;
        }
    }
    counts
}

/// One-line summary: total plus per-severity counts.
pub fn summary_line(problems: &[EnrichedProblem], now: DateTime<Local>) -> String {
    let c = severity_counts(problems);
    format!(
        "Zabbix Open Problems: {} || NC={} I={} W={} A={} H={} D={} - At: {}",
        problems.len(),
        c[0],
        c[1],
        c[2],
        c[3],
        c[4],
        c[5],
        header_date(now),
    )
}

fn html_escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(ch),
        }
    }
    out
}

const HTML_STYLE: &str = r#"        <style>
            table {
                width: 80%;
                border-collapse: collapse;
                margin: 20px 0;
                font-size: 12px;
                text-align: left;
            }
            th, td {
                padding: 8px;
                border: 1px solid black;
            }
            th {
                background-color: #f2f2f2;
            }
            .INFORMATION { background-color: #7499FF; }
            .WARNING { background-color: #FFC859; }
            .AVERAGE { background-color: #FFA059; }
            .HIGH { background-color: #E97659; }
            .DISASTER { background-color: #E45959; }
        </style>
"#;

/// Render the problem list as a static HTML table.
///
/// An empty list produces the friendly no-problems page instead.
pub fn html_table(problems: &[EnrichedProblem], now: DateTime<Local>) -> String {
    let date = header_date(now);
    if problems.is_empty() {
        return format!(
            "<html><body><h2>Urrah! No open problems at {date}</h2>\n\
             <br><hr>Sincerely, Your kind Zabbix majordomo\n\
             </body></html>\n"
        );
    }

    let now_secs = now.timestamp();
    let mut html = String::new();
    html.push_str("<html>\n<head>\n");
    html.push_str(HTML_STYLE);
    html.push_str("</head>\n<body>\n");
    html.push_str(&format!("<h2>Zabbix Open Problems Status - {date}</h2>\n"));
    html.push_str(
        "<table>\n<tr>\n    <th>Timestamp</th>\n    <th>Severity</th>\n    \
         <th>Host</th>\n    <th>Problem</th>\n    <th>Age</th>\n</tr>\n",
    );
    for problem in problems {
        let class = problem.severity.map(Severity::css_class).unwrap_or("");
        html.push_str(&format!(
            "<tr class=\"{}\">\n    <td>{}</td>\n    <td>{}</td>\n    <td>{}</td>\n    \
             <td>{}</td>\n    <td>{}</td>\n</tr>\n",
            class,
            html_escape(&format_timestamp(problem.clock)),
            html_escape(problem.severity_label()),
            html_escape(problem.host_label()),
            html_escape(problem.trigger_label()),
            format_age(problem.clock, now_secs),
        ));
    }
    html.push_str("</table>\n<br><hr>Sincerely, Your kind Zabbix majordomo\n</body>\n</html>\n");
    html
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(eventid: u64, severity: Option<Severity>) -> EnrichedProblem {
        EnrichedProblem {
            eventid,
            clock: 1_700_000_000,
            triggerid: 33,
            acknowledged: false,
            severity,
            host_name: severity.map(|_| "web01".to_string()),
            description: severity.map(|_| "High CPU".to_string()),
        }
    }

    #[test]
    fn test_age_rendering() {
        assert_eq!(format_age(0, 3 * 3600 + 7 * 60), "03h 07m");
        assert_eq!(format_age(0, 2 * 86_400 + 3600 + 60), "02d 01h 01m");
        assert_eq!(format_age(100, 100), "00h 00m");
        // Clock skew never renders negative ages
        assert_eq!(format_age(200, 100), "00h 00m");
    }

    #[test]
    fn test_syslog_line_with_enrichment() {
        let p = sample(4723, Some(Severity::High));
        let line = syslog_line(&p, p.clock + 120);
        assert!(line.contains("[HIGH] web01 [4723] High CPU (33) [Ack: No] [Age: 00h 02m]"));
    }

    #[test]
    fn test_syslog_line_with_sentinels() {
        let p = sample(1, None);
        let line = syslog_line(&p, p.clock);
        assert!(line.contains("<Unknown Severity>"));
        assert!(line.contains("<Unknown Host>"));
        assert!(line.contains("<Unknown Trigger>"));
    }

    #[test]
    fn test_summary_counts() {
        let problems = vec![
            sample(1, Some(Severity::Warning)),
            sample(2, Some(Severity::Warning)),
            sample(3, Some(Severity::Disaster)),
            sample(4, None),
        ];
        let line = summary_line(&problems, Local::now());
        assert!(line.starts_with("Zabbix Open Problems: 4 || NC=0 I=0 W=2 A=0 H=0 D=1"));
    }

    #[test]
    fn test_html_table_rows_and_classes() {
        let problems = vec![sample(1, Some(Severity::Average))];
        let html = html_table(&problems, Local::now());
        assert!(html.contains("<tr class=\"AVERAGE\">"));
        assert!(html.contains("<td>High CPU</td>"));
    }

    #[test]
    fn test_html_empty_page() {
        let html = html_table(&[], Local::now());
        assert!(html.contains("No open problems"));
        assert!(!html.contains("<table>"));
    }

    #[test]
    fn test_html_escaping() {
        let mut p = sample(1, Some(Severity::Warning));
        p.description = Some("load > 5 & rising".into());
        let html = html_table(&[p], Local::now());
        assert!(html.contains("load &gt; 5 &amp; rising"));
    }
}
