//! Bookkeeping for in-flight mutations.
//!
//! Every mutation takes a ticket when it is issued and settles it when the
//! server answers. Tickets on the same task id are ordered by `seq`; only the
//! newest one may write server data back into the collection, so the last
//! issued write wins no matter which response arrives first.

use std::collections::HashMap;

use uuid::Uuid;

use crate::model::task::TaskId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationKind {
    Load,
    Create,
    Update,
    Move,
    Remove,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Target {
    /// The whole collection.
    All,
    Task(TaskId),
    /// Placeholder identity of a task the server has not assigned an id to yet.
    Draft(Uuid),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket {
    pub seq: u64,
    pub kind: MutationKind,
    pub target: Target,
}

/// How a mutation ended once the server answered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationOutcome {
    /// Server data was written into the collection.
    Confirmed,
    /// A newer mutation on the same task was issued meanwhile; the response
    /// was dropped.
    Superseded,
    /// The task was no longer in the collection when the response arrived.
    Vanished,
    Failed { rolled_back: bool },
}

/// Whether failures undo optimistic edits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ReconcilePolicy {
    pub rollback_failed_moves: bool,
}

#[derive(Debug, Default)]
pub struct MutationLedger {
    next_seq: u64,
    pending: Vec<Ticket>,
    newest: HashMap<TaskId, u64>,
}

impl MutationLedger {
    pub fn issue(&mut self, kind: MutationKind, target: Target) -> Ticket {
        self.next_seq += 1;
        let ticket = Ticket {
            seq: self.next_seq,
            kind,
            target,
        };
        if let Target::Task(id) = target {
            self.newest.insert(id, ticket.seq);
        }
        self.pending.push(ticket);
        ticket
    }

    /// Marks the ticket done. Returns true when no newer ticket touches the
    /// same task.
    pub fn settle(&mut self, ticket: &Ticket) -> bool {
        self.pending.retain(|t| t.seq != ticket.seq);
        match ticket.target {
            Target::Task(id) => {
                let newest = self.newest.get(&id) == Some(&ticket.seq);
                if newest {
                    self.newest.remove(&id);
                }
                newest
            }
            Target::All | Target::Draft(_) => true,
        }
    }

    pub fn pending(&self) -> &[Ticket] {
        &self.pending
    }

    pub fn is_pending(&self, id: TaskId) -> bool {
        self.pending.iter().any(|t| t.target == Target::Task(id))
    }
}
