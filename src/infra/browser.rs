use std::io;
use std::path::Path;
use tokio::process::Command;

/// Opens `path` in the default browser using the platform launcher.
pub async fn open_in_browser(path: &Path) -> io::Result<()> {
    let absolute = tokio::fs::canonicalize(path).await?;
    let url = file_url(&absolute);

    let status = launcher(&url).status().await?;
    if !status.success() {
        return Err(io::Error::new(
            io::ErrorKind::Other,
            format!("browser launcher exited with {}", status),
        ));
    }
    Ok(())
}

fn file_url(path: &Path) -> String {
    let display = path.to_string_lossy().replace('\\', "/");
    if display.starts_with('/') {
        format!("file://{}", display)
    } else {
        format!("file:///{}", display)
    }
}

#[cfg(target_os = "macos")]
fn launcher(url: &str) -> Command {
    let mut command = Command::new("open");
    command.arg(url);
    command
}

#[cfg(target_os = "windows")]
fn launcher(url: &str) -> Command {
    let mut command = Command::new("cmd");
    // The empty string is the window title `start` expects first.
    command.args(["/C", "start", ""]).arg(url);
    command
}

#[cfg(not(any(target_os = "macos", target_os = "windows")))]
fn launcher(url: &str) -> Command {
    let mut command = Command::new("xdg-open");
    command.arg(url);
    command
}
