use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use log::info;
use std::io::{self, IsTerminal};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Receiver of progress events from long-running operations.
///
/// Operations announce a stage with its expected number of steps, advance
/// after each unit of work and finish with a summary message.
pub trait ProgressSink: Send + Sync {
    fn stage(&self, name: &str, total: u64);
    fn advance(&self, steps: u64);
    fn finish(&self, message: &str);
}

/// Sink that drops every event
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn stage(&self, _name: &str, _total: u64) {}
    fn advance(&self, _steps: u64) {}
    fn finish(&self, _message: &str) {}
}

/// Progress indicator manager
pub struct ProgressManager {
    multi: Arc<MultiProgress>,
    enabled: bool,
    quiet: bool,
    verbose: bool,
}

impl ProgressManager {
    /// Create a new progress manager
    pub fn new(quiet: bool, verbose: bool) -> Self {
        // Only enable progress if we're in a terminal and not in quiet mode
        let enabled = !quiet && io::stdout().is_terminal();

        Self {
            multi: Arc::new(MultiProgress::new()),
            enabled,
            quiet,
            verbose,
        }
    }

    /// Create a spinner for a single request
    pub fn create_spinner(&self, message: &str) -> Option<ProgressBar> {
        if !self.enabled {
            return None;
        }

        let pb = self.multi.add(ProgressBar::new_spinner());
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner())
                .tick_strings(&["⣾", "⣽", "⣻", "⢿", "⡿", "⣟", "⣯", "⣷"]),
        );
        pb.set_message(message.to_string());
        pb.enable_steady_tick(Duration::from_millis(100));

        Some(pb)
    }

    /// Create a bar for a stage of known length
    pub fn create_bar(&self, total: u64, message: &str) -> Option<ProgressBar> {
        if !self.enabled {
            return None;
        }

        let pb = self.multi.add(ProgressBar::new(total));
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{msg}\n{bar:40.cyan/blue} {pos}/{len} ({percent}%)")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("█▓░"),
        );
        pb.set_message(message.to_string());

        Some(pb)
    }

    /// Show a simple message in verbose mode when no bar or spinner is
    /// drawn; a visible indicator already carries the same text
    pub fn show_message(&self, message: &str) {
        if self.shows_text_lines() {
            eprintln!("🔍 {}", message);
        }
    }

    fn shows_text_lines(&self) -> bool {
        self.verbose && !self.quiet && !self.enabled
    }

    /// Check if progress is enabled
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }
}

/// Spinner shown while a single upstream call is in flight
pub struct ApiProgress {
    spinner: Option<ProgressBar>,
    manager: Arc<ProgressManager>,
}

impl ApiProgress {
    pub fn new(manager: Arc<ProgressManager>, api_name: &str) -> Self {
        let spinner = manager.create_spinner(&messages::searching_api(api_name));
        Self { spinner, manager }
    }

    pub fn set_message(&self, message: &str) {
        if let Some(ref pb) = self.spinner {
            pb.set_message(message.to_string());
        }
        self.manager.show_message(message);
    }

    pub fn finish_with_message(&self, message: &str) {
        if let Some(ref pb) = self.spinner {
            pb.finish_with_message(format!("✅ {}", message));
        }
        self.manager.show_message(&format!("완료: {}", message));
    }

    pub fn finish_and_clear(&self) {
        if let Some(ref pb) = self.spinner {
            pb.finish_and_clear();
        }
    }
}

impl Drop for ApiProgress {
    fn drop(&mut self) {
        if let Some(ref pb) = self.spinner {
            pb.finish_and_clear();
        }
    }
}

/// [`ProgressSink`] that draws one bar per stage
pub struct BarProgress {
    manager: Arc<ProgressManager>,
    current: Mutex<Option<ProgressBar>>,
}

impl BarProgress {
    pub fn new(manager: Arc<ProgressManager>) -> Self {
        Self {
            manager,
            current: Mutex::new(None),
        }
    }

    fn with_bar(&self, f: impl FnOnce(&ProgressBar)) {
        if let Ok(guard) = self.current.lock() {
            if let Some(ref pb) = *guard {
                f(pb);
            }
        }
    }
}

impl ProgressSink for BarProgress {
    fn stage(&self, name: &str, total: u64) {
        info!("{} ({} steps)", name, total);
        self.manager.show_message(name);
        let bar = self.manager.create_bar(total, name);
        if let Ok(mut guard) = self.current.lock() {
            if let Some(previous) = guard.take() {
                previous.finish_and_clear();
            }
            *guard = bar;
        }
    }

    fn advance(&self, steps: u64) {
        self.with_bar(|pb| pb.inc(steps));
    }

    fn finish(&self, message: &str) {
        info!("{}", message);
        self.with_bar(|pb| pb.finish_with_message(format!("✅ {}", message)));
        self.manager.show_message(&format!("완료: {}", message));
    }
}

/// Progress messages for different operations
pub mod messages {
    pub const COUNTING: &str = "전체 데이터 개수 확인 중...";
    pub const COLLECTING_LIST: &str = "관광지 목록 수집 중";
    pub const COLLECTING_DETAILS: &str = "상세 정보 조회 및 데이터 구성 중";
    pub const DETAIL_LOOKUP: &str = "상세 정보 조회 중";
    pub const TREND_LOOKUP: &str = "검색 트렌드 조회 중";

    pub fn searching_api(api_name: &str) -> String {
        format!("{} 검색 중...", api_name)
    }

    pub fn search_complete(api_name: &str, count: usize) -> String {
        format!("{}: {}개 결과", api_name, count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quiet_manager_is_disabled() {
        let manager = ProgressManager::new(true, false);
        assert!(!manager.is_enabled());
        assert!(manager.create_bar(10, "x").is_none());
        assert!(manager.create_spinner("x").is_none());
    }

    fn manager(enabled: bool, quiet: bool, verbose: bool) -> ProgressManager {
        ProgressManager {
            multi: Arc::new(MultiProgress::new()),
            enabled,
            quiet,
            verbose,
        }
    }

    #[test]
    fn test_text_lines_only_without_indicators() {
        // Bars and spinners already show the stage name
        assert!(!manager(true, false, true).shows_text_lines());
        assert!(manager(false, false, true).shows_text_lines());
        assert!(!manager(false, true, true).shows_text_lines());
        assert!(!manager(false, false, false).shows_text_lines());
    }

    #[test]
    fn test_progress_messages() {
        assert_eq!(messages::searching_api("한국관광공사 TourAPI"), "한국관광공사 TourAPI 검색 중...");
        assert_eq!(messages::search_complete("SerpAPI", 10), "SerpAPI: 10개 결과");
    }

    #[test]
    fn test_disabled_sinks_accept_events() {
        let manager = Arc::new(ProgressManager::new(true, false));
        let bar = BarProgress::new(manager.clone());
        bar.stage("stage", 3);
        bar.advance(1);
        bar.finish("done");

        let progress = ApiProgress::new(manager, "테스트 API");
        progress.set_message("테스트 메시지");
        progress.finish_with_message("완료");

        NoProgress.stage("ignored", 1);
    }
}
