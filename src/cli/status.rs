use crate::Result;
use crate::procs::PROCS;
use crate::supervisor::SUPERVISOR;
use itertools::Itertools;

/// Display the live status of a server
#[derive(Debug, clap::Args)]
#[clap(
    visible_alias = "stat",
    verbatim_doc_comment,
    long_about = "\
Display the live status of a server

Probes every configured port and reports whether anything is listening on
it. The answer always comes from the OS, never from what portwarden last
launched.

Examples:
  portwarden status api
  portwarden status api --json

Output:
  Name: api
  Status: running
  Port: 3000
  PID: 12345 (node)"
)]
pub struct Status {
    /// Identity of the server
    pub id: String,
    /// Print the status report as JSON
    #[clap(long)]
    json: bool,
}

impl Status {
    pub async fn run(&self) -> Result<()> {
        let report = SUPERVISOR.status(&self.id).await;
        if self.json {
            return super::print_json(&report);
        }

        println!("Name: {}", report.id);
        println!("Status: {}", report.status.style());
        if let Some(port) = report.primary_port {
            println!("Port: {port}");
        }
        if let Some(pid) = report.pid {
            match PROCS.titles(&[pid]).into_iter().flatten().next() {
                Some(title) => println!("PID: {pid} ({title})"),
                None => println!("PID: {pid}"),
            }
        }
        if report.per_port_detail.len() > 1 {
            for detail in &report.per_port_detail {
                let pids = if detail.running {
                    detail.pids.iter().join(", ")
                } else {
                    "-".to_string()
                };
                println!("  {}: {pids}", detail.port);
            }
        }
        if let Some(launch) = &report.launch {
            println!(
                "Launched: pid {} at {}",
                launch.pid,
                launch.started_at.format("%Y-%m-%d %H:%M:%S")
            );
        }
        if let Some(err) = &report.error_message {
            println!("Error: {err}");
        }
        Ok(())
    }
}
