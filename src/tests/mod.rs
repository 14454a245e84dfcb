
mod config_tests;
mod contract_tests;
mod measurement_tests;
