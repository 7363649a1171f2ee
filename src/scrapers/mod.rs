pub mod fantasypros;
pub mod news;
