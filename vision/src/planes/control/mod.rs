pub mod admin_operations;
