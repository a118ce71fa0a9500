//! The status subcommand: observe, never mutate

use anyhow::Result;
use command_runner::backends::LocalRunner;
use comfy_table::{Cell, Color, Table};
use provision::{ComposeRuntime, StatusReport, StatusReporter};
use std::path::Path;

pub async fn run(stack_dir: &Path) -> Result<()> {
    let compose_file = stack_dir.join("docker-compose.yml");
    let runtime = ComposeRuntime::new(compose_file, Box::new(LocalRunner));
    let reporter = StatusReporter::new(Box::new(LocalRunner));

    let report = reporter.gather(&runtime).await;
    render_report(&report);
    Ok(())
}

/// Render a gathered report to the terminal
pub fn render_report(report: &StatusReport) {
    if report.services.is_empty() {
        println!("No services reported (stack not running, or engine unavailable)");
    } else {
        let mut table = Table::new();
        table.set_header(vec!["SERVICE", "STATE", "STATUS"]);
        for service in &report.services {
            let state_cell = if service.state == "running" {
                Cell::new(&service.state).fg(Color::Green)
            } else {
                Cell::new(&service.state).fg(Color::Red)
            };
            table.add_row(vec![
                Cell::new(&service.service),
                state_cell,
                Cell::new(&service.status),
            ]);
        }
        println!("{table}");
    }

    for (label, url) in &report.endpoints {
        println!("{label}: {url}");
    }
}
