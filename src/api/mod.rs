pub mod sleeper_api;
