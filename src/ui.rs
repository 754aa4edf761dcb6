use crate::models::{CalendarDay, CalendarProgress, Challenge, DayStatus, NextAvailableDay};

pub fn render_index(challenges: &[Challenge]) -> String {
    let rows = if challenges.is_empty() {
        r#"<li class="empty">No challenges yet.</li>"#.to_string()
    } else {
        challenges
            .iter()
            .map(|challenge| {
                let training = challenge
                    .training_days
                    .iter()
                    .filter(|day| !day.is_rest_day)
                    .count();
                format!(
                    r#"<li><strong>{}</strong><span>{} days, {} training</span><code>{}</code></li>"#,
                    escape(&challenge.title),
                    challenge.training_days.len(),
                    training,
                    challenge.id
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    };

    PAGE_HTML
        .replace("{{TITLE}}", "Challenges")
        .replace("{{SUMMARY}}", "")
        .replace("{{BODY}}", &format!(r#"<ul class="challenges">{rows}</ul>"#))
}

pub fn render_calendar(
    days: &[CalendarDay],
    progress: &CalendarProgress,
    next: Option<&NextAvailableDay>,
) -> String {
    let summary = format!(
        r#"<p class="summary">{} of {} training days done ({:.0}%), streak {}{}</p>"#,
        progress.completed_training_days,
        progress.total_training_days,
        progress.completion_percent,
        progress.current_streak,
        match next {
            Some(day) => format!(", next up: day {} on {}", day.day_number, day.calendar_date),
            None => String::new(),
        }
    );

    let cells = days
        .iter()
        .map(|day| {
            let mut classes = vec![status_class(day)];
            if day.is_today {
                classes.push("today");
            }
            if !day.is_accessible && day.status == DayStatus::Pending {
                classes.push("locked");
            }
            let attempt = if day.is_retry {
                format!(r#"<em>attempt {}</em>"#, day.attempt_number)
            } else {
                String::new()
            };
            let exercises = if day.is_rest_day {
                String::new()
            } else {
                format!("<small>{}/{}</small>", day.exercises_completed, day.total_exercises)
            };
            format!(
                r#"<div class="day {}"><span class="date">{}</span><span class="num">Day {}</span><b>{}</b>{}{}</div>"#,
                classes.join(" "),
                day.calendar_date.format("%b %d"),
                day.day_number,
                escape(&day.title),
                attempt,
                exercises
            )
        })
        .collect::<Vec<_>>()
        .join("\n");

    PAGE_HTML
        .replace("{{TITLE}}", "Challenge calendar")
        .replace("{{SUMMARY}}", &summary)
        .replace("{{BODY}}", &format!(r#"<section class="grid">{cells}</section>"#))
}

fn status_class(day: &CalendarDay) -> &'static str {
    match day.status {
        DayStatus::Pending if day.is_rest_day => "rest-pending",
        status => status.as_str(),
    }
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

const PAGE_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="UTF-8" />
  <meta name="viewport" content="width=device-width, initial-scale=1.0" />
  <title>{{TITLE}}</title>
  <style>
    :root {
      --bg: #f4f1fb;
      --ink: #272238;
      --card: rgba(255, 255, 255, 0.9);
      --done: #3fa07a;
      --fail: #d9534f;
      --rest: #8c8aa8;
      --accent: #7b5cff;
    }

    body {
      margin: 0;
      min-height: 100vh;
      background: linear-gradient(160deg, var(--bg), #ffffff 70%);
      color: var(--ink);
      font-family: "Trebuchet MS", sans-serif;
      padding: 32px 18px;
    }

    main {
      width: min(900px, 100%);
      margin: 0 auto;
      background: var(--card);
      border-radius: 24px;
      padding: 28px;
      box-shadow: 0 20px 50px rgba(39, 34, 56, 0.12);
    }

    .grid {
      display: grid;
      grid-template-columns: repeat(auto-fill, minmax(120px, 1fr));
      gap: 12px;
    }

    .day {
      border-radius: 14px;
      padding: 12px;
      display: flex;
      flex-direction: column;
      gap: 4px;
      background: #ece8f7;
    }

    .day.completed { background: var(--done); color: #fff; }
    .day.failed { background: var(--fail); color: #fff; }
    .day.rest, .day.rest-pending { background: var(--rest); color: #fff; }
    .day.today { outline: 3px solid var(--accent); }
    .day.locked { opacity: 0.5; }

    .challenges li {
      display: flex;
      gap: 16px;
      padding: 8px 0;
    }
  </style>
</head>
<body>
  <main>
    <h1>{{TITLE}}</h1>
    {{SUMMARY}}
    {{BODY}}
  </main>
</body>
</html>
"#;
