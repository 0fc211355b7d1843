pub mod aggregate;
pub mod command;
pub mod history;
pub mod schedule;
pub mod selection;
pub mod tree;

#[cfg(test)]
pub mod test_support;
