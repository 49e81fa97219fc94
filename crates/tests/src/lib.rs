pub mod fixtures;

#[cfg(test)]
mod live_tests;
