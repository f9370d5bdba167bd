pub mod banner;
pub mod coach;
pub mod config;
pub mod consts;
pub mod display;
pub mod events;
pub mod leaderboard;
pub mod logging;
pub mod prompts;
pub mod repl;
pub mod score;
pub mod spinner;
pub mod store;
pub mod submission;
