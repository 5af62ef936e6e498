pub mod oauth_app;
pub mod setup_workshop;

pub use oauth_app::cmd_oauth_app;
pub use setup_workshop::cmd_setup_workshop;
