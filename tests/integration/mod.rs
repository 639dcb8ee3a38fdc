mod embedded_tests;
mod process_tests;
mod service_tests;
