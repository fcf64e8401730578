use beholder_core::{Backend, Failure};
use clap::Args;

use crate::output::{exit_code, failure_error, print_candidates};
use crate::util::{EXIT_OK, print_error, usage_error};

#[derive(Args)]
pub struct SearchArgs {
    /// Name, address, ID or PPPoE user
    #[arg(required = true, num_args = 1..)]
    pub query: Vec<String>,

    /// Print candidates as JSON
    #[arg(long)]
    pub json: bool,
}

/// List candidates for a query without diagnosing any of them.
pub async fn run<B: Backend>(backend: &B, args: SearchArgs) -> i32 {
    let query = args.query.join(" ");
    let query = query.trim();
    if query.is_empty() {
        usage_error("Query is empty", Some("Pass a name, address, ID or PPPoE user"));
    }

    let failure = match backend.search(query).await {
        Ok(candidates) if !candidates.is_empty() => {
            print_candidates(&candidates, args.json);
            return EXIT_OK;
        }
        Ok(_) => Failure::NoMatch,
        Err(e) => {
            tracing::warn!(error = %e, %query, "search request failed");
            Failure::Connection
        }
    };
    print_error(&failure_error(failure));
    exit_code(failure)
}
