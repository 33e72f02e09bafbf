use crate::model::task::{Status, Task};

/// One kanban column.
#[derive(Debug, Clone, PartialEq)]
pub struct BoardColumn<'a> {
    pub status: Status,
    pub tasks: Vec<&'a Task>,
}

/// Groups tasks into one column per status, in `Status::ALL` order.
///
/// Matching is exact on the raw status string, so a task with a missing or
/// unrecognized status lands in no column.
pub fn project_board<'a, I>(tasks: I) -> Vec<BoardColumn<'a>>
where
    I: IntoIterator<Item = &'a Task> + Copy,
{
    Status::ALL
        .into_iter()
        .map(|status| BoardColumn {
            status,
            tasks: tasks
                .into_iter()
                .filter(|t| t.status.as_deref() == Some(status.label()))
                .collect(),
        })
        .collect()
}

/// Tasks the board cannot place.
pub fn unplaced<'a, I>(tasks: I) -> Vec<&'a Task>
where
    I: IntoIterator<Item = &'a Task>,
{
    tasks.into_iter().filter(|t| t.status().is_none()).collect()
}
