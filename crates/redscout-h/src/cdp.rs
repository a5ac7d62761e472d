use chromiumoxide::cdp::browser_protocol::page::{
    EventJavascriptDialogOpening, HandleJavaScriptDialogParams,
};
use chromiumoxide::cdp::js_protocol::runtime::EventConsoleApiCalled;
use chromiumoxide::{Browser, Page};
use futures::StreamExt;
use redscout_common::BackendError;
use redscout_engine::config::BrowserConfig;
use std::path::PathBuf;
use tokio::task::JoinHandle;

/// A launched Chromium with one page, bound to a persistent profile so the
/// login survives restarts.
pub struct CdpClient {
    pub browser: Browser,
    pub handler_task: JoinHandle<()>,
    pub page: Page,
    profile_dir: PathBuf,
}

impl CdpClient {
    pub async fn launch(config: &BrowserConfig) -> Result<Self, BackendError> {
        let profile_dir = config.resolved_profile_dir();
        std::fs::create_dir_all(&profile_dir).map_err(|e| {
            BackendError::Launch(format!(
                "Cannot create profile dir {}: {}",
                profile_dir.display(),
                e
            ))
        })?;
        tracing::info!("Using browser profile: {}", profile_dir.display());

        // No emulated viewport: the page uses the real window size.
        let mut builder = chromiumoxide::BrowserConfig::builder()
            .no_sandbox()
            .user_data_dir(&profile_dir)
            .window_size(config.viewport_width, config.viewport_height)
            .viewport(None);

        if config.headless {
            tracing::info!("Launching browser in headless mode");
        } else {
            tracing::info!("Launching browser in visible mode");
            builder = builder.with_head();
        }

        // CHROME_BIN wins over the configured path.
        let executable = std::env::var_os("CHROME_BIN")
            .map(PathBuf::from)
            .or_else(|| config.chrome_executable.clone());
        if let Some(executable) = executable {
            tracing::info!("Using custom Chrome binary: {}", executable.display());
            builder = builder.chrome_executable(executable);
        }

        let cdp_config = builder
            .build()
            .map_err(|e| BackendError::Launch(format!("Failed to build browser config: {}", e)))?;
        let (browser, mut handler) = Browser::launch(cdp_config)
            .await
            .map_err(|e| BackendError::Launch(e.to_string()))?;

        let handler_task = tokio::spawn(async move {
            while let Some(h) = handler.next().await {
                if let Err(e) = h {
                    tracing::debug!("Browser handler error (ignoring): {}", e);
                }
            }
            tracing::info!("Browser handler task ended");
        });

        let page = browser
            .new_page("about:blank")
            .await
            .map_err(|e| BackendError::Launch(format!("Failed to create page: {}", e)))?;

        watch_console(&page).await?;
        accept_dialogs(&page).await?;

        Ok(Self {
            browser,
            handler_task,
            page,
            profile_dir,
        })
    }

    pub fn profile_dir(&self) -> &PathBuf {
        &self.profile_dir
    }

    pub async fn close(mut self) -> Result<(), BackendError> {
        self.browser
            .close()
            .await
            .map_err(|e| BackendError::Other(format!("Error closing browser: {}", e)))?;
        self.handler_task
            .await
            .map_err(|e| BackendError::Other(format!("Error awaiting handler: {}", e)))?;
        Ok(())
    }
}

async fn watch_console(page: &Page) -> Result<(), BackendError> {
    let mut console_events = page
        .event_listener::<EventConsoleApiCalled>()
        .await
        .map_err(|e| BackendError::Launch(format!("Failed to subscribe to console: {}", e)))?;

    tokio::spawn(async move {
        while let Some(event) = console_events.next().await {
            let args: Vec<String> = event
                .args
                .iter()
                .map(|arg| {
                    arg.description
                        .clone()
                        .or_else(|| arg.value.as_ref().map(|v| v.to_string()))
                        .unwrap_or_else(|| "unknown".to_string())
                })
                .collect();
            tracing::debug!("Browser console [{:?}]: {}", event.r#type, args.join(" "));
        }
    });
    Ok(())
}

/// Alerts and confirms would block every script until dismissed.
async fn accept_dialogs(page: &Page) -> Result<(), BackendError> {
    let mut dialog_events = page
        .event_listener::<EventJavascriptDialogOpening>()
        .await
        .map_err(|e| BackendError::Launch(format!("Failed to subscribe to dialogs: {}", e)))?;

    let page = page.clone();
    tokio::spawn(async move {
        while let Some(event) = dialog_events.next().await {
            tracing::info!(
                "Accepting JavaScript dialog: {} ({:?})",
                event.message,
                event.r#type
            );
            if let Err(e) = page.execute(HandleJavaScriptDialogParams::new(true)).await {
                tracing::warn!("Failed to accept dialog: {}", e);
            }
        }
    });
    Ok(())
}
