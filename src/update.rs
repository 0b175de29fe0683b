use crate::error::{Error, Result};
use log::{info, warn};
use serde::Deserialize;
use std::fs::File;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

pub const CURRENT_VERSION: &str = env!("CARGO_PKG_VERSION");

/// `owner/name` of the GitHub repository publishing releases. Update checks
/// are disabled when the build did not set it.
pub const RELEASES_REPO: Option<&str> = option_env!("PINYIN_HELPER_RELEASES");

#[derive(Debug, Clone, Deserialize)]
pub struct Release {
    pub tag_name: String,
    #[serde(default)]
    pub assets: Vec<Asset>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Asset {
    pub name: String,
    pub browser_download_url: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateStatus {
    UpToDate,
    Available { version: String, url: String },
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DownloadEvent {
    Progress(u8),
    Finished(PathBuf),
    Failed(String),
    Cancelled,
}

/// A running download. Dropping it does not stop the worker; call
/// [`Download::cancel`].
pub struct Download {
    pub events: Receiver<DownloadEvent>,
    cancel: Arc<AtomicBool>,
}

impl Download {
    pub fn cancel(&self) {
        self.cancel.store(true, Ordering::Relaxed);
    }
}

fn client(timeout: Option<Duration>) -> Result<reqwest::blocking::Client> {
    let mut builder = reqwest::blocking::Client::builder()
        .user_agent(concat!("pinyin-helper/", env!("CARGO_PKG_VERSION")))
        .connect_timeout(Duration::from_secs(10));
    if let Some(timeout) = timeout {
        builder = builder.timeout(timeout);
    }
    Ok(builder.build()?)
}

/// Queries the latest release on a worker thread.
pub fn check_async(repo: &str, current: &str) -> Receiver<UpdateStatus> {
    let (tx, rx) = mpsc::channel();
    let repo = repo.to_string();
    let current = current.to_string();
    thread::spawn(move || {
        let status = check_sync(&repo, &current).unwrap_or_else(|e| UpdateStatus::Failed(e.to_string()));
        let _ = tx.send(status);
    });
    rx
}

fn check_sync(repo: &str, current: &str) -> Result<UpdateStatus> {
    let url = format!("https://api.github.com/repos/{}/releases/latest", repo);
    let response = client(Some(Duration::from_secs(5)))?.get(&url).send()?;
    if !response.status().is_success() {
        return Err(Error::Update(format!("GitHub API error: {}", response.status())));
    }
    let release: Release = response.json()?;
    Ok(evaluate(&release, current))
}

/// Compares a release against the running version and picks the installer
/// for this platform. A newer release without an installer counts as up to
/// date.
pub fn evaluate(release: &Release, current: &str) -> UpdateStatus {
    let latest = release.tag_name.trim_start_matches('v');
    if !is_newer(latest, current) {
        return UpdateStatus::UpToDate;
    }
    let Some(suffix) = installer_suffix() else {
        return UpdateStatus::UpToDate;
    };
    match release.assets.iter().find(|a| a.name.ends_with(suffix)) {
        Some(asset) => UpdateStatus::Available {
            version: latest.to_string(),
            url: asset.browser_download_url.clone(),
        },
        None => UpdateStatus::UpToDate,
    }
}

fn installer_suffix() -> Option<&'static str> {
    if cfg!(target_os = "windows") {
        Some(".exe")
    } else if cfg!(target_os = "macos") {
        Some(".dmg")
    } else {
        None
    }
}

/// Dotted numeric comparison; versions that do not parse are compared for
/// inequality only.
pub fn is_newer(latest: &str, current: &str) -> bool {
    let parse = |v: &str| -> Option<Vec<u64>> {
        v.trim_start_matches('v')
            .split('.')
            .map(|part| part.parse().ok())
            .collect()
    };
    match (parse(latest), parse(current)) {
        (Some(mut l), Some(mut c)) => {
            let len = l.len().max(c.len());
            l.resize(len, 0);
            c.resize(len, 0);
            l > c
        }
        _ => latest.trim_start_matches('v') != current.trim_start_matches('v'),
    }
}

/// Streams `url` into the temp directory, reporting whole percents.
pub fn download_async(url: &str) -> Download {
    let (tx, rx) = mpsc::channel();
    let cancel = Arc::new(AtomicBool::new(false));
    let flag = cancel.clone();
    let url = url.to_string();
    thread::spawn(move || {
        let event = match download_sync(&url, &flag, &tx) {
            Ok(Some(path)) => DownloadEvent::Finished(path),
            Ok(None) => DownloadEvent::Cancelled,
            Err(e) => DownloadEvent::Failed(e.to_string()),
        };
        let _ = tx.send(event);
    });
    Download { events: rx, cancel }
}

fn download_sync(url: &str, cancel: &AtomicBool, tx: &Sender<DownloadEvent>) -> Result<Option<PathBuf>> {
    let filename = url
        .rsplit('/')
        .next()
        .filter(|name| !name.is_empty())
        .unwrap_or("pinyin-helper-update");
    let path = std::env::temp_dir().join(filename);

    let mut response = client(None)?.get(url).send()?;
    if !response.status().is_success() {
        return Err(Error::Update(format!("download failed: {}", response.status())));
    }
    let total = response.content_length().unwrap_or(0);
    let mut file = File::create(&path)?;
    let mut buf = [0u8; 8192];
    let mut downloaded = 0u64;
    let mut last_percent = None;
    loop {
        if cancel.load(Ordering::Relaxed) {
            drop(file);
            let _ = std::fs::remove_file(&path);
            info!("update download cancelled");
            return Ok(None);
        }
        let n = response.read(&mut buf)?;
        if n == 0 {
            break;
        }
        file.write_all(&buf[..n])?;
        downloaded += n as u64;
        if total > 0 {
            let percent = (downloaded * 100 / total).min(100) as u8;
            if last_percent != Some(percent) {
                last_percent = Some(percent);
                let _ = tx.send(DownloadEvent::Progress(percent));
            }
        }
    }
    file.flush()?;
    info!("update downloaded to {}", path.display());
    Ok(Some(path))
}

/// Starts the downloaded installer. The caller quits afterwards so the
/// installer can replace the executable.
pub fn launch_installer(path: &Path) -> Result<()> {
    #[cfg(target_os = "macos")]
    let child = Command::new("open").arg(path).spawn();
    #[cfg(not(target_os = "macos"))]
    let child = Command::new(path).spawn();
    child.map(|_| ()).map_err(|e| {
        warn!("failed to launch {}: {}", path.display(), e);
        Error::Update(e.to_string())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_ordering() {
        assert!(is_newer("1.2.0", "1.1.9"));
        assert!(is_newer("v1.10", "1.9.3"));
        assert!(!is_newer("1.2", "1.2.0"));
        assert!(!is_newer("0.9.0", "1.0.0"));
        assert!(is_newer("1.0-beta", "1.0"));
        assert!(!is_newer("1.0-beta", "v1.0-beta"));
    }

    #[test]
    fn evaluate_release() {
        let release: Release = serde_json::from_str(
            r#"{
                "tag_name": "v99.0.0",
                "assets": [
                    {"name": "notes.txt", "browser_download_url": "https://example.invalid/notes.txt"},
                    {"name": "setup.exe", "browser_download_url": "https://example.invalid/setup.exe"},
                    {"name": "setup.dmg", "browser_download_url": "https://example.invalid/setup.dmg"}
                ]
            }"#,
        )
        .unwrap();
        let status = evaluate(&release, CURRENT_VERSION);
        match installer_suffix() {
            Some(suffix) => assert_eq!(
                status,
                UpdateStatus::Available {
                    version: "99.0.0".into(),
                    url: format!("https://example.invalid/setup{}", suffix),
                }
            ),
            None => assert_eq!(status, UpdateStatus::UpToDate),
        }
        assert_eq!(evaluate(&release, "99.0.0"), UpdateStatus::UpToDate);
    }

    #[test]
    fn release_without_assets() {
        let release: Release = serde_json::from_str(r#"{"tag_name": "v99.0.0"}"#).unwrap();
        assert_eq!(evaluate(&release, "0.1.0"), UpdateStatus::UpToDate);
    }
}
