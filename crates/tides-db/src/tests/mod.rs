mod classification_flow_tests;
mod config_tests;
