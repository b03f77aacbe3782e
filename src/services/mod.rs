pub(crate) mod broadcaster;
pub(crate) mod inference;
pub(crate) mod objective_grading;
