pub mod automation_operations;
pub mod cms_operations;
