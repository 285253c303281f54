mod engine_flow_tests;
mod main_flow_tests;
