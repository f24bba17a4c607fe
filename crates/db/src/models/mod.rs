//! Board records: columns, the tasks they hold, and the images attached to
//! tasks.
//!
//! Relationships are plain foreign-key fields. Aggregates such as
//! [`column::ColumnWithTasks`] and [`task::TaskWithImages`] are assembled by
//! explicit fetches rather than held as live back-references.

pub mod column;
pub mod task;
pub mod task_image;
