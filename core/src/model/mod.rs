pub mod collection;
pub mod form;
pub mod task;
