use anyhow::Result;

use crate::{
    activity::aggregate::{DailySummary, DayHistory},
    app::Dasho,
    storage::kv::KeyValueStore,
    utils::percentage::Percentage,
};

pub async fn summary<S: KeyValueStore + Clone>(app: &Dasho<S>) -> Result<()> {
    let user = app.session.require_user()?;
    let today = app.aggregator.todays_summary(&user.id).await?;
    let lifetime = app.aggregator.lifetime_completed_count(&user.id).await?;
    print!("{}", render_summary(user.greeting_name(), today, lifetime));
    Ok(())
}

pub async fn history<S: KeyValueStore + Clone>(
    app: &Dasho<S>,
    min_percentage: Option<Percentage>,
) -> Result<()> {
    let user = app.session.require_user()?;
    let days = app.aggregator.history(&user.id).await?;
    print!("{}", render_history(&days, min_percentage));
    Ok(())
}

pub async fn reindex<S: KeyValueStore + Clone>(app: &Dasho<S>) -> Result<()> {
    let user = app.session.require_user()?;
    let dates = app.logs.reindex(&user.id).await?;
    println!("Indexed {} saved days", dates.len());
    Ok(())
}

pub fn render_summary(name: &str, today: DailySummary, lifetime: usize) -> String {
    format!(
        "Welcome back, {name}!\n\
         Today\t{} / {}\t{} complete\n\
         All time\t{lifetime} activities completed\n",
        today.completed,
        today.total,
        today.percentage(),
    )
}

pub fn render_history(days: &[DayHistory], min_percentage: Option<Percentage>) -> String {
    days.iter()
        .filter(|v| min_percentage.map_or(true, |min| v.summary.percentage() >= min))
        .map(|v| {
            format!(
                "{}\t{}/{}\t{}\n",
                v.date,
                v.summary.completed,
                v.summary.total,
                v.summary.percentage()
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use crate::activity::aggregate::{DailySummary, DayHistory};

    use super::{render_history, render_summary};

    fn history() -> Vec<DayHistory> {
        [(1, 2), (2, 8), (3, 4)]
            .into_iter()
            .map(|(d, completed)| DayHistory {
                date: NaiveDate::from_ymd_opt(2025, 3, d).unwrap(),
                summary: DailySummary { completed, total: 8 },
            })
            .collect()
    }

    #[test]
    fn test_render_summary() {
        let output = render_summary("Demo User", DailySummary { completed: 3, total: 8 }, 41);
        assert_eq!(
            output,
            "Welcome back, Demo User!\nToday\t3 / 8\t38% complete\nAll time\t41 activities completed\n"
        );
    }

    #[test]
    fn test_render_summary_of_empty_day() {
        let output = render_summary("User", DailySummary::default(), 0);
        assert!(output.contains("0 / 0\t0% complete"));
    }

    #[test]
    fn test_render_history_filters_by_percentage() {
        let all = render_history(&history(), None);
        assert_eq!(all.lines().count(), 3);
        assert!(all.starts_with("2025-03-01\t2/8\t25%\n"));

        let filtered = render_history(&history(), Some("50%".parse().unwrap()));
        assert_eq!(filtered, "2025-03-02\t8/8\t100%\n2025-03-03\t4/8\t50%\n");
    }
}
