pub mod cli;
pub mod config;
pub mod editor;
pub mod error;
pub mod geometry;
pub mod input;
pub mod logging;
pub mod notification;
pub mod page;
pub mod state;
pub mod storage;
pub use error::{AppError, AppResult};

use editor::{SessionObserver, ToolCoordinator};

/// Entrypoint used by the command-line binary.
pub fn run<I>(args: I) -> AppResult<()>
where
    I: IntoIterator<Item = String>,
{
    let command = cli::PageCommand::parse(args)?;
    command.execute()
}

/// Interactive session with the built-in tools, configured from
/// `config.json`. Notices are also shown as desktop notifications.
pub fn open_session<O>(observer: O) -> ToolCoordinator
where
    O: SessionObserver + 'static,
{
    let config = config::load_app_config();
    tracing::debug!(?config, "configuration loaded");
    ToolCoordinator::with_default_tools(
        Box::new(notification::DesktopNotices::new(observer)),
        config.editor_settings(),
    )
}
