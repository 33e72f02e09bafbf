use crate::model::task::{Priority, Status, Task};
use crate::service::dto::{format_date, AnalyticsReport, CompletedTask, PriorityCount, StatusCount};

const RECENT_COMPLETED_LIMIT: usize = 5;

/// Dashboard figures. Status and priority counts match raw strings exactly,
/// so a task with an unknown status only counts toward the total.
pub fn build_report<'a, I>(tasks: I) -> AnalyticsReport
where
    I: IntoIterator<Item = &'a Task>,
{
    let tasks: Vec<&Task> = tasks.into_iter().collect();
    let total = tasks.len();

    let count_status = |status: Status| {
        tasks
            .iter()
            .filter(|t| t.status.as_deref() == Some(status.label()))
            .count()
    };

    let by_status: Vec<StatusCount> = Status::ALL
        .into_iter()
        .map(|status| StatusCount {
            status,
            count: count_status(status),
        })
        .collect();

    let by_priority = [Priority::High, Priority::Medium, Priority::Low]
        .into_iter()
        .map(|priority| PriorityCount {
            priority,
            count: tasks.iter().filter(|t| t.priority == priority.label()).count(),
        })
        .collect();

    let completed: Vec<&Task> = tasks
        .iter()
        .copied()
        .filter(|t| t.status.as_deref() == Some(Status::Completed.label()))
        .collect();

    let completion_rate = if total == 0 {
        0
    } else {
        ((completed.len() as f64 / total as f64) * 100.0).round() as u32
    };

    let spans: Vec<i64> = completed.iter().filter_map(|t| days_taken(t)).collect();
    let avg_completion_days = if spans.is_empty() {
        0.0
    } else {
        spans.iter().sum::<i64>() as f64 / spans.len() as f64
    };

    // The first few completed tasks, newest due date first.
    let mut recent: Vec<&Task> = completed
        .iter()
        .copied()
        .take(RECENT_COMPLETED_LIMIT)
        .collect();
    recent.sort_by(|a, b| b.due_date.cmp(&a.due_date));

    let recently_completed = recent
        .into_iter()
        .map(|t| CompletedTask {
            id: t.id,
            title: t.title.clone(),
            completed_on: format_date(t.due_date),
            days_taken: days_taken(t),
        })
        .collect();

    AnalyticsReport {
        total,
        completion_rate,
        by_status,
        by_priority,
        avg_completion_days,
        overdue: count_status(Status::Expired),
        recently_completed,
    }
}

fn days_taken(task: &Task) -> Option<i64> {
    match (task.start_date, task.due_date) {
        (Some(start), Some(due)) => Some((due - start).num_days()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::task::TaskId;
    use chrono::NaiveDate;

    fn task(id: u64, status: &str, priority: &str, span: Option<(u32, u32)>) -> Task {
        let mut t = Task::new(TaskId(id), format!("t{}", id));
        t.status = Some(status.to_string());
        t.priority = priority.to_string();
        if let Some((start, due)) = span {
            t.start_date = NaiveDate::from_ymd_opt(2025, 1, start);
            t.due_date = NaiveDate::from_ymd_opt(2025, 1, due);
        }
        t
    }

    #[test]
    fn test_empty_collection() {
        let report = build_report(&Vec::<Task>::new());
        assert_eq!(report.total, 0);
        assert_eq!(report.completion_rate, 0);
        assert_eq!(report.avg_completion_days, 0.0);
        assert!(report.by_status.iter().all(|s| s.count == 0));
        assert!(report.recently_completed.is_empty());
    }

    #[test]
    fn test_report_figures() {
        let tasks = vec![
            task(1, "Completed", "High", Some((1, 5))),
            task(2, "Completed", "Low", Some((2, 4))),
            task(3, "To Do", "Medium", None),
            task(4, "Expired", "High", None),
            task(5, "Blocked", "urgent", None),
            task(6, "Completed", "Medium", None),
        ];

        let report = build_report(&tasks);
        assert_eq!(report.total, 6);
        assert_eq!(report.completion_rate, 50);
        assert_eq!(report.overdue, 1);
        assert_eq!(report.avg_completion_days, 3.0);

        let statuses: Vec<usize> = report.by_status.iter().map(|s| s.count).collect();
        assert_eq!(statuses, vec![1, 0, 3, 1]);
        let priorities: Vec<usize> = report.by_priority.iter().map(|p| p.count).collect();
        assert_eq!(priorities, vec![2, 2, 1]);

        let recent: Vec<u64> = report.recently_completed.iter().map(|c| c.id.0).collect();
        assert_eq!(recent, vec![1, 2, 6]);
        assert_eq!(report.recently_completed[0].days_taken, Some(4));
        assert_eq!(report.recently_completed[0].completed_on, "Jan 5, 2025");
        assert_eq!(report.recently_completed[2].days_taken, None);
    }

    #[test]
    fn test_completion_rate_rounds() {
        let tasks = vec![
            task(1, "Completed", "Low", None),
            task(2, "To Do", "Low", None),
            task(3, "To Do", "Low", None),
        ];
        assert_eq!(build_report(&tasks).completion_rate, 33);
    }

    #[test]
    fn test_recent_list_takes_first_five_completed() {
        let tasks: Vec<Task> = (1..=7)
            .map(|i| task(i, "Completed", "Low", Some((1, i as u32 + 1))))
            .collect();
        let report = build_report(&tasks);
        let recent: Vec<u64> = report.recently_completed.iter().map(|c| c.id.0).collect();
        assert_eq!(recent, vec![5, 4, 3, 2, 1]);
    }
}
