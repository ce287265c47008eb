use std::{fmt::Write, io::IsTerminal};

use ansi_term::Colour;
use anyhow::Result;

use crate::{
    activity::{
        log::{ActivityLogEntry, DailyLog},
        template::DEFAULT_ACTIVITIES,
    },
    app::Dasho,
    storage::kv::KeyValueStore,
};

use super::DayArgs;

pub async fn show<S: KeyValueStore + Clone>(app: &Dasho<S>, day: &DayArgs) -> Result<()> {
    let user = app.session.require_user()?;
    let date = day.resolve(app.clock())?;
    let log = app.logs.load(&user.id, date).await?;
    print!("{}", render_log(&log, std::io::stdout().is_terminal()));
    Ok(())
}

/// Loads the day, applies `apply` and saves the result. Nothing is saved if `apply` fails.
pub async fn edit<S: KeyValueStore + Clone>(
    app: &Dasho<S>,
    day: &DayArgs,
    apply: impl FnOnce(&mut DailyLog) -> Result<()>,
) -> Result<()> {
    let user = app.session.require_user()?;
    let date = day.resolve(app.clock())?;
    let mut log = app.logs.load(&user.id, date).await?;
    apply(&mut log)?;
    let record = app.logs.save(&user.id, date, log.activities()).await?;
    let saved = DailyLog::from(record);
    print!("{}", render_log(&saved, std::io::stdout().is_terminal()));
    Ok(())
}

fn format_amount(value: Option<f64>, unit: Option<&str>) -> String {
    match (value, unit) {
        (Some(value), Some(unit)) => format!("{value} {unit}"),
        (Some(value), None) => value.to_string(),
        (None, Some(unit)) => format!("- {unit}"),
        (None, None) => String::new(),
    }
}

fn render_entry(entry: &ActivityLogEntry, colored: bool) -> String {
    let mark = if entry.completed { "[x]" } else { "[ ]" };
    let name = if colored && entry.completed {
        Colour::Green.paint(entry.name.as_str()).to_string()
    } else {
        entry.name.clone()
    };
    let mut line = format!(
        "{mark}\t{}\t{name}\t{}\t{}",
        entry.id,
        entry.category,
        format_amount(entry.value, entry.unit.as_deref())
    );
    if !entry.notes.is_empty() {
        line.push('\t');
        line.push_str(&entry.notes);
    }
    line
}

/// Header with the day's completion followed by one line per activity.
pub fn render_log(log: &DailyLog, colored: bool) -> String {
    let summary = log.summary();
    let mut output = format!(
        "{}\t{} of {} activities completed\t{}",
        log.date(),
        summary.completed,
        summary.total,
        summary.percentage()
    );
    if log.saved_at().is_none() {
        output.push_str("\t(not saved yet)");
    }
    output.push('\n');
    for entry in log.activities() {
        output.push_str(&render_entry(entry, colored));
        output.push('\n');
    }
    output
}

pub fn render_templates() -> String {
    let mut output = String::new();
    for template in DEFAULT_ACTIVITIES.iter() {
        // Writing into a String can't fail.
        let _ = writeln!(
            output,
            "{}\t{}\t{}\t{}",
            template.id,
            template.name,
            template.category,
            format_amount(template.default_value, template.unit)
        );
    }
    output
}

#[cfg(test)]
mod tests {
    use anyhow::Result;
    use chrono::NaiveDate;

    use crate::activity::log::DailyLog;

    use super::{render_log, render_templates};

    #[test]
    fn test_render_fresh_log() {
        let log = DailyLog::fresh(NaiveDate::from_ymd_opt(2025, 3, 15).unwrap());
        let output = render_log(&log, false);
        let lines = output.lines().collect::<Vec<_>>();

        assert_eq!(lines.len(), 9);
        assert_eq!(
            lines[0],
            "2025-03-15\t0 of 8 activities completed\t0%\t(not saved yet)"
        );
        assert_eq!(lines[1], "[ ]\t1\tGym Workout\tFitness\t1 session");
    }

    #[test]
    fn test_render_edited_log() -> Result<()> {
        let mut log = DailyLog::fresh(NaiveDate::from_ymd_opt(2025, 3, 15).unwrap());
        log.toggle("6")?;
        log.set_value("6", 90.)?;
        log.set_notes("6", "parser work")?;

        let output = render_log(&log, false);
        assert!(output.starts_with("2025-03-15\t1 of 8 activities completed\t13%"));
        assert!(output.contains("[x]\t6\tCoding Session\tCareer\t90 minutes\tparser work\n"));
        Ok(())
    }

    #[test]
    fn test_render_templates() {
        let output = render_templates();
        assert_eq!(output.lines().count(), 8);
        assert!(output.contains("4\tTake Creatine\tHealth\t5 grams"));
    }
}
