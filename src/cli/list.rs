use crate::Result;
use crate::supervisor::SUPERVISOR;
use crate::ui::table::{or_dash, print_table};
use comfy_table::{Cell, ContentArrangement, Table};
use itertools::Itertools;

/// List all configured servers
#[derive(Debug, clap::Args)]
#[clap(
    visible_alias = "ls",
    verbatim_doc_comment,
    long_about = "\
List all configured servers

Displays a table of every server in the store with its live status, the
port it was found on and the PID listening there.

Example:
  portwarden list
  portwarden ls                    Alias for 'list'
  portwarden list --hide-header    Output without column headers

Output:
  Name    Port  PID    Status
  api     3000  12345  running
  web     5173  -      stopped"
)]
pub struct List {
    /// Hide the table header row
    #[clap(long)]
    hide_header: bool,
}

impl List {
    pub async fn run(&self) -> Result<()> {
        let mut table = Table::new();
        table
            .load_preset(comfy_table::presets::NOTHING)
            .set_content_arrangement(ContentArrangement::Dynamic);
        if !self.hide_header && console::user_attended() {
            table.set_header(vec!["Name", "Port", "PID", "Status", ""]);
        }

        for report in SUPERVISOR.list().await? {
            let pids = report
                .per_port_detail
                .iter()
                .flat_map(|d| d.pids.iter())
                .unique()
                .join(",");
            let pids = (!pids.is_empty()).then_some(pids);
            table.add_row(vec![
                Cell::new(&report.id),
                Cell::new(or_dash(report.primary_port)),
                Cell::new(or_dash(pids)),
                Cell::new(report.status.style()),
                Cell::new(report.error_message.unwrap_or_default()),
            ]);
        }

        print_table(table)
    }
}
