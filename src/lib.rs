//! XKeys GW - X-keys panel to video switcher gateway
//!
//! Synchronizes a backlit X-keys panel with T-bar and a video production
//! switcher: switcher state drives the key backlights, key presses and T-bar
//! motion drive switcher commands.

pub mod cli;
pub mod config;
pub mod gateway;
pub mod led;
pub mod link;
pub mod mapping;
pub mod mode;
pub mod panel;
pub mod switcher;
pub mod tbar;

pub use config::AppConfig;
pub use gateway::Gateway;
