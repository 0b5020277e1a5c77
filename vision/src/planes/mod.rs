pub mod control;
pub mod data;

#[cfg(test)]
pub(crate) mod test_support;
