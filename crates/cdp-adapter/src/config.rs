use std::env;
use std::path::PathBuf;
use std::time::Duration;

use busflow_core_types::Viewport;
use which::which;

/// Launch parameters for the single Chromium instance of a run.
#[derive(Clone, Debug)]
pub struct CdpConfig {
    pub executable: Option<PathBuf>,
    pub headless: bool,
    pub window: Viewport,
    /// Explicit profile directory. A throwaway one is created when unset.
    pub user_data_dir: Option<PathBuf>,
    pub launch_timeout: Duration,
    pub request_timeout: Duration,
}

impl Default for CdpConfig {
    fn default() -> Self {
        Self {
            executable: detect_chrome_executable(),
            headless: false,
            window: Viewport::default(),
            user_data_dir: None,
            launch_timeout: Duration::from_secs(20),
            request_timeout: Duration::from_secs(30),
        }
    }
}

impl CdpConfig {
    pub fn headless(mut self, flag: bool) -> Self {
        self.headless = flag;
        self
    }

    pub fn with_window(mut self, window: Viewport) -> Self {
        self.window = window;
        self
    }

    pub fn with_executable(mut self, path: impl Into<PathBuf>) -> Self {
        self.executable = Some(path.into());
        self
    }
}

/// Finds a Chromium-family binary: `CHROME_BIN` first, then `PATH`, then
/// the usual install locations for the host OS.
pub fn detect_chrome_executable() -> Option<PathBuf> {
    if let Ok(raw) = env::var("CHROME_BIN") {
        let trimmed = raw.trim();
        if !trimmed.is_empty() {
            let candidate = PathBuf::from(trimmed);
            if candidate.exists() {
                return Some(candidate);
            }
        }
    }

    for name in chrome_executable_names() {
        if let Ok(path) = which(name) {
            return Some(path);
        }
    }

    os_specific_chrome_paths()
        .into_iter()
        .find(|candidate| candidate.exists())
}

fn chrome_executable_names() -> &'static [&'static str] {
    #[cfg(target_os = "windows")]
    {
        &["chrome.exe", "chromium.exe", "msedge.exe"]
    }

    #[cfg(not(target_os = "windows"))]
    {
        &[
            "google-chrome-stable",
            "google-chrome",
            "chromium",
            "chromium-browser",
        ]
    }
}

fn os_specific_chrome_paths() -> Vec<PathBuf> {
    #[cfg(target_os = "windows")]
    {
        let mut paths = Vec::new();
        for var in ["PROGRAMFILES", "PROGRAMFILES(X86)", "LOCALAPPDATA"] {
            if let Ok(base) = env::var(var) {
                paths.push(PathBuf::from(&base).join("Google/Chrome/Application/chrome.exe"));
            }
        }
        paths
    }

    #[cfg(target_os = "macos")]
    {
        vec![
            PathBuf::from("/Applications/Google Chrome.app/Contents/MacOS/Google Chrome"),
            PathBuf::from("/Applications/Chromium.app/Contents/MacOS/Chromium"),
        ]
    }

    #[cfg(not(any(target_os = "windows", target_os = "macos")))]
    {
        vec![
            PathBuf::from("/usr/bin/google-chrome"),
            PathBuf::from("/usr/bin/chromium"),
            PathBuf::from("/usr/bin/chromium-browser"),
            PathBuf::from("/snap/bin/chromium"),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_methods_override_defaults() {
        let cfg = CdpConfig::default()
            .headless(true)
            .with_window(Viewport::new(800, 600))
            .with_executable("/opt/chrome");
        assert!(cfg.headless);
        assert_eq!(cfg.window, Viewport::new(800, 600));
        assert_eq!(cfg.executable, Some(PathBuf::from("/opt/chrome")));
    }
}
