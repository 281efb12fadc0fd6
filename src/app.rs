// src/app.rs

use std::path::PathBuf;

use color_eyre::eyre::Result;
use ratatui::widgets::{ListState, ScrollbarState};
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use url::Url;

use crate::core::knowledge_base::{
    RISKY_SERVICE_EXPOSED, SCRIPT_VULNERABLE, SUBDOMAIN_WAF_MISSING, WAF_MISSING,
    ZONE_TRANSFER_ALLOWED,
};
use crate::core::models::{AnalysisFinding, ReconReport, Severity};
use crate::core::target::Domain;
use crate::logging;

pub const SPINNER_CHARS: [char; 10] = ['⠋', '⠙', '⠹', '⠸', '⠼', '⠴', '⠦', '⠧', '⠇', '⠏'];
const LOG_TAIL_LINES: usize = 200;

pub enum ExportStatus {
    Idle,
    Success(String),
    Error(String),
}

pub enum AppState {
    Idle,
    Scanning,
    Finished,
}

/// Which panel fills the report area once a scan has finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportView {
    Findings,
    Data,
}

#[derive(Debug, Default, PartialEq)]
pub struct ScanSummary {
    pub score: u8,
    pub critical_issues: usize,
    pub warning_issues: usize,
    pub zone_transfer_check_passed: bool,
    pub root_waf_check_passed: bool,
    pub subdomain_waf_check_passed: bool,
    pub services_check_passed: bool,
}

impl ScanSummary {
    pub fn from_findings(findings: &[AnalysisFinding]) -> Self {
        let criticals = findings.iter().filter(|a| a.severity == Severity::Critical).count();
        let warnings = findings.iter().filter(|a| a.severity == Severity::Warning).count();
        let absent = |code: &str| !findings.iter().any(|f| f.code == code);

        let score = 100_i16
            .saturating_sub((criticals * 15) as i16)
            .saturating_sub((warnings * 5) as i16);

        Self {
            score: score.max(0) as u8,
            critical_issues: criticals,
            warning_issues: warnings,
            zone_transfer_check_passed: absent(ZONE_TRANSFER_ALLOWED),
            root_waf_check_passed: absent(WAF_MISSING),
            subdomain_waf_check_passed: absent(SUBDOMAIN_WAF_MISSING),
            services_check_passed: absent(RISKY_SERVICE_EXPOSED) && absent(SCRIPT_VULNERABLE),
        }
    }
}

pub struct App {
    pub should_quit: bool,
    pub show_disclaimer: bool,
    pub state: AppState,
    pub input: String,
    pub input_error: Option<String>,
    pub scan_report: Option<ReconReport>,
    pub all_findings: Vec<AnalysisFinding>,
    pub analysis_list_state: ListState,
    pub summary: ScanSummary,
    pub displayed_score: u8,
    pub spinner_frame: usize,
    pub view: ReportView,
    pub scroll_offset: usize,
    pub report_scroll_state: ScrollbarState,
    pub export_status: ExportStatus,
    pub show_logs: bool,
    pub log_content: Vec<String>,
    pub log_horizontal_scroll: usize,
    pub log_horizontal_scroll_state: ScrollbarState,
    pub cancel: Option<CancellationToken>,
}

impl App {
    pub fn new() -> Self {
        Self {
            should_quit: false,
            show_disclaimer: true,
            state: AppState::Idle,
            input: String::new(),
            input_error: None,
            scan_report: None,
            all_findings: Vec::new(),
            analysis_list_state: ListState::default(),
            summary: ScanSummary::default(),
            displayed_score: 0,
            spinner_frame: 0,
            view: ReportView::Findings,
            scroll_offset: 0,
            report_scroll_state: ScrollbarState::default(),
            export_status: ExportStatus::Idle,
            show_logs: false,
            log_content: Vec::new(),
            log_horizontal_scroll: 0,
            log_horizontal_scroll_state: ScrollbarState::default(),
            cancel: None,
        }
    }

    /// Validates the input box. A pasted URL is reduced to its host. On
    /// failure the reason is shown in the input title.
    pub fn validated_target(&mut self) -> Option<Domain> {
        let raw = self.input.trim();
        let host = if raw.contains("://") {
            Url::parse(raw)
                .ok()
                .and_then(|url| url.host_str().map(String::from))
                .unwrap_or_else(|| raw.to_string())
        } else {
            raw.to_string()
        };
        match Domain::parse(&host) {
            Ok(domain) => {
                self.input_error = None;
                Some(domain)
            }
            Err(e) => {
                self.input_error = Some(e.to_string());
                None
            }
        }
    }

    pub fn start_scan(&mut self, cancel: CancellationToken) {
        self.state = AppState::Scanning;
        self.cancel = Some(cancel);
        self.export_status = ExportStatus::Idle;
    }

    pub fn finish_scan(&mut self, report: ReconReport) {
        self.all_findings = report.analysis.clone();
        self.summary = ScanSummary::from_findings(&self.all_findings);
        self.analysis_list_state = ListState::default();
        if !self.all_findings.is_empty() {
            self.analysis_list_state.select(Some(0));
        }
        self.scan_report = Some(report);
        self.cancel = None;
        self.state = AppState::Finished;
    }

    pub fn scroll_up(&mut self) {
        match self.view {
            ReportView::Findings => self.analysis_list_state.select_previous(),
            ReportView::Data => {
                self.scroll_offset = self.scroll_offset.saturating_sub(1);
                self.report_scroll_state = self.report_scroll_state.position(self.scroll_offset);
            }
        }
    }

    pub fn scroll_down(&mut self) {
        match self.view {
            ReportView::Findings => {
                let last = self.all_findings.len().saturating_sub(1);
                let next = self.analysis_list_state.selected().map_or(0, |i| (i + 1).min(last));
                if !self.all_findings.is_empty() {
                    self.analysis_list_state.select(Some(next));
                }
            }
            ReportView::Data => {
                self.scroll_offset = self.scroll_offset.saturating_add(1);
                self.report_scroll_state = self.report_scroll_state.position(self.scroll_offset);
            }
        }
    }

    pub fn toggle_view(&mut self) {
        self.view = match self.view {
            ReportView::Findings => ReportView::Data,
            ReportView::Data => ReportView::Findings,
        };
        self.scroll_offset = 0;
        self.report_scroll_state = ScrollbarState::default();
    }

    pub fn toggle_logs(&mut self) {
        self.show_logs = !self.show_logs;
        if self.show_logs {
            self.log_content = logging::read_log_tail(LOG_TAIL_LINES);
        }
    }

    pub fn scroll_logs_left(&mut self) {
        self.log_horizontal_scroll = self.log_horizontal_scroll.saturating_sub(4);
        self.log_horizontal_scroll_state =
            self.log_horizontal_scroll_state.position(self.log_horizontal_scroll);
    }

    pub fn scroll_logs_right(&mut self) {
        self.log_horizontal_scroll = self.log_horizontal_scroll.saturating_add(4);
        self.log_horizontal_scroll_state =
            self.log_horizontal_scroll_state.position(self.log_horizontal_scroll);
    }

    /// Advances the spinner, eases the gauge toward the final score and
    /// refreshes the log panel.
    pub fn on_tick(&mut self) {
        self.spinner_frame = (self.spinner_frame + 1) % SPINNER_CHARS.len();
        if matches!(self.state, AppState::Finished) && self.displayed_score < self.summary.score {
            self.displayed_score = (self.displayed_score + 2).min(self.summary.score);
        }
        if self.show_logs {
            self.log_content = logging::read_log_tail(LOG_TAIL_LINES);
        }
    }

    /// Writes the current report as JSON into the data directory.
    pub fn export_report(&mut self) {
        let Some(report) = &self.scan_report else { return };
        self.export_status = match write_report(report) {
            Ok(path) => {
                info!(path = %path.display(), "Report exported.");
                ExportStatus::Success(path.display().to_string())
            }
            Err(e) => {
                error!(error = %e, "Report export failed.");
                ExportStatus::Error(e.to_string())
            }
        };
    }

    pub fn quit(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel.cancel();
        }
        self.should_quit = true;
    }

    pub fn reset(&mut self) {
        self.state = AppState::Idle;
        self.input = String::new();
        self.input_error = None;
        self.scan_report = None;
        self.all_findings = Vec::new();
        self.analysis_list_state = ListState::default();
        self.summary = ScanSummary::default();
        self.displayed_score = 0;
        self.view = ReportView::Findings;
        self.scroll_offset = 0;
        self.report_scroll_state = ScrollbarState::default();
        self.export_status = ExportStatus::Idle;
    }
}

fn write_report(report: &ReconReport) -> Result<PathBuf> {
    let dir = logging::get_data_dir().join("reports");
    std::fs::create_dir_all(&dir)?;
    let file = format!(
        "recon_{}_{}.json",
        report.target,
        report.finished_at.format("%Y%m%d_%H%M%S")
    );
    let path = dir.join(file);
    std::fs::write(&path, serde_json::to_string_pretty(report)?)?;
    Ok(path)
}
