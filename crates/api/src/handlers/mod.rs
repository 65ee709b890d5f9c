pub mod display;
pub mod print_agent;
pub mod print_jobs;
pub mod queue;
pub mod service_types;
pub mod settings;
