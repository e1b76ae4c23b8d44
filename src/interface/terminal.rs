//! Plain-text dashboard for the `watch` command

use std::cmp::Ordering;
use std::fmt::Write;

use clap::ValueEnum;

use crate::application::DashboardState;
use crate::domain::{ContainerRecord, ContainerStatus, MemoryReport};

const TOP_N: usize = 5;
const NAME_WIDTH: usize = 15;

/// Client-side container list filter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum StatusFilter {
    #[default]
    All,
    Running,
    Exited,
    Paused,
}

impl StatusFilter {
    fn matches(self, status: ContainerStatus) -> bool {
        match self {
            StatusFilter::All => true,
            StatusFilter::Running => status == ContainerStatus::Running,
            StatusFilter::Exited => status == ContainerStatus::Exited,
            StatusFilter::Paused => status == ContainerStatus::Paused,
        }
    }
}

/// Binary units, at most two decimals, trailing zeros dropped
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: [&str; 6] = ["Bytes", "KB", "MB", "GB", "TB", "PB"];
    if bytes == 0 {
        return "0 Bytes".to_string();
    }

    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }

    let fixed = format!("{:.2}", value);
    let trimmed = fixed.trim_end_matches('0').trim_end_matches('.');
    format!("{} {}", trimmed, UNITS[unit])
}

fn short_name(name: &str) -> String {
    if name.chars().count() > NAME_WIDTH {
        let head: String = name.chars().take(NAME_WIDTH).collect();
        format!("{}...", head)
    } else {
        name.to_string()
    }
}

fn memory_label(memory: &MemoryReport) -> String {
    match memory.percentage {
        Some(p) => format!("{:.2}%", p),
        None => "n/a".to_string(),
    }
}

fn top_by<'a>(
    containers: &'a [ContainerRecord],
    key: impl Fn(&ContainerRecord) -> Option<f64>,
) -> Vec<(&'a ContainerRecord, f64)> {
    let mut ranked: Vec<_> = containers
        .iter()
        .filter(|c| c.status.is_running())
        .filter_map(|c| key(c).map(|value| (c, value)))
        .collect();
    // stable sort keeps list order among ties
    ranked.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));
    ranked.truncate(TOP_N);
    ranked
}

fn write_top(out: &mut String, title: &str, ranked: &[(&ContainerRecord, f64)]) {
    let _ = writeln!(out, "{}", title);
    if ranked.is_empty() {
        let _ = writeln!(out, "  No running containers");
        return;
    }
    for (record, value) in ranked {
        let _ = writeln!(out, "  {:<18} {:>8.2}%", short_name(&record.name), value);
    }
}

fn write_record(out: &mut String, record: &ContainerRecord) {
    let disk = record.disk.as_ref().map(|d| d.name.as_str()).unwrap_or("N/A");
    let network = if record.network.is_empty() {
        "N/A".to_string()
    } else {
        record.network.keys().cloned().collect::<Vec<_>>().join(", ")
    };

    let _ = writeln!(out, "* {} [{}] {}", record.name, record.status, record.image);
    let _ = writeln!(
        out,
        "    cpu {:.2}%  memory {} ({} / {})  disk {}  network {}{}",
        record.cpu,
        memory_label(&record.memory),
        format_bytes(record.memory.usage),
        format_bytes(record.memory.limit),
        disk,
        network,
        if record.gpu.is_some() { "  gpu" } else { "" },
    );
}

/// Render one frame of the dashboard.
pub fn render(state: &DashboardState, filter: StatusFilter) -> String {
    let mut out = String::new();

    let updated = state
        .last_updated
        .map(|t| format!("updated {}", t.format("%H:%M:%S UTC")))
        .unwrap_or_else(|| "never updated".to_string());
    let _ = writeln!(
        out,
        "DockPulse  {}{}",
        updated,
        if state.loading { "  (loading...)" } else { "" }
    );

    if let Some(error) = &state.error {
        let _ = writeln!(out, "! {}", error);
    }
    if state.is_stale() && !state.containers.is_empty() {
        let _ = writeln!(out, "! Showing last known data.");
    }
    let _ = writeln!(out);

    let containers = &state.containers;
    let count = |status: ContainerStatus| containers.iter().filter(|c| c.status == status).count();
    let _ = writeln!(
        out,
        "Status: running {}  exited {}  paused {}",
        count(ContainerStatus::Running),
        count(ContainerStatus::Exited),
        count(ContainerStatus::Paused),
    );
    let _ = writeln!(out);

    write_top(&mut out, "CPU top 5", &top_by(containers, |c| Some(c.cpu)));
    let _ = writeln!(out);
    write_top(&mut out, "Memory top 5", &top_by(containers, |c| c.memory.percentage));
    let _ = writeln!(out);

    let shown: Vec<_> = containers.iter().filter(|c| filter.matches(c.status)).collect();
    let _ = writeln!(out, "Containers ({})", shown.len());
    if shown.is_empty() && !state.loading {
        let _ = writeln!(out, "  No containers to show");
    }
    for record in shown {
        write_record(&mut out, record);
    }

    out
}
