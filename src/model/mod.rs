pub mod attendance;
pub mod document;
pub mod leave;
pub mod payroll;
pub mod performance;
pub mod project;
pub mod review;
pub mod role;
pub mod statistics;
pub mod user;

/// Case-insensitive substring match against any of the fields.
pub(crate) fn contains_ignore_case(fields: &[&str], term: &str) -> bool {
    let term = term.trim().to_lowercase();
    term.is_empty() || fields.iter().any(|f| f.to_lowercase().contains(&term))
}
