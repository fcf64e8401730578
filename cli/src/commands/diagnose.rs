use beholder_core::{Backend, ResolutionController};
use clap::Args;

use crate::output::{OutputArgs, finish};
use crate::util::usage_error;

#[derive(Args)]
pub struct DiagnoseArgs {
    /// PPPoE username to diagnose
    pub username: String,

    /// Node IP the username is bound to, when it exists on several nodes
    #[arg(long)]
    pub ip: Option<String>,

    #[command(flatten)]
    pub output: OutputArgs,
}

pub async fn run<B: Backend>(controller: &ResolutionController<B>, args: DiagnoseArgs) -> i32 {
    if args.username.trim().is_empty() {
        usage_error("Username is empty", Some("e.g. `beholder diagnose jperez01 --ip 10.0.0.2`"));
    }

    if !(args.output.json || args.output.report) {
        eprintln!("Interrogando equipos para {}...", args.username.trim());
    }
    let state = controller.diagnose(&args.username, args.ip.as_deref()).await;
    finish(&state, &args.output)
}
