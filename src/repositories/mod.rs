pub(crate) mod comments;
pub(crate) mod grading_store;
pub(crate) mod health;
pub(crate) mod progress;
pub(crate) mod questions;
pub(crate) mod responses;
pub(crate) mod worksheets;
