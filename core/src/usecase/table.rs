use crate::model::task::Task;
use crate::service::dto::TaskRow;

pub struct TableView {
    pub rows: Vec<TaskRow>,
}

impl TableView {
    pub fn from_tasks<'a, I>(tasks: I) -> Self
    where
        I: IntoIterator<Item = &'a Task>,
    {
        Self {
            rows: tasks.into_iter().map(TaskRow::from_entity).collect(),
        }
    }

    pub fn summary(&self) -> String {
        let n = self.rows.len();
        if n == 0 {
            return "Showing 0 results".to_string();
        }
        format!("Showing 1 to {} of {} results", n, n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::collection::TaskCollection;
    use crate::model::task::{Status, TaskId};

    #[test]
    fn test_every_task_gets_a_row() {
        let mut odd = Task::new(TaskId(2), "No status");
        odd.status = None;
        let collection = TaskCollection::new(vec![Task::new(TaskId(1), "Normal"), odd]);

        let view = TableView::from_tasks(&collection);
        assert_eq!(view.rows.len(), 2);
        assert_eq!(view.rows[1].status, Status::ToDo);
        assert_eq!(view.summary(), "Showing 1 to 2 of 2 results");
    }

    #[test]
    fn test_empty_summary() {
        let view = TableView::from_tasks(&TaskCollection::default());
        assert_eq!(view.summary(), "Showing 0 results");
    }
}
