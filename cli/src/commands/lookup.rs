use beholder_core::{Backend, Phase, ResolutionController, ResolutionState};
use clap::Args;
use tokio::io::{self, AsyncBufReadExt, AsyncWriteExt, BufReader};

use crate::output::{OutputArgs, ambiguous_error, candidate_entry, finish};
use crate::util::{EXIT_AMBIGUOUS, print_error, usage_error};

#[derive(Args)]
pub struct LookupArgs {
    /// Name, address, ID or PPPoE user
    #[arg(required = true, num_args = 1..)]
    pub query: Vec<String>,

    /// Pick the N-th candidate (1-based) when the search is ambiguous
    #[arg(long)]
    pub pick: Option<usize>,

    /// Never prompt; list candidates and exit when the search is ambiguous
    #[arg(long, conflicts_with = "pick")]
    pub no_input: bool,

    #[command(flatten)]
    pub output: OutputArgs,
}

pub async fn run<B: Backend>(controller: &ResolutionController<B>, args: LookupArgs) -> i32 {
    let query = args.query.join(" ");
    if query.trim().is_empty() {
        usage_error(
            "Query is empty",
            Some("Pass a name, address, ID or PPPoE user, e.g. `beholder lookup jperez01`"),
        );
    }

    let quiet = args.output.json || args.output.report;
    progress(quiet, "Escaneando padrón...");
    let mut state = controller.search(&query).await;

    if state.phase() == Phase::Disambiguating {
        let index = if let Some(pick) = args.pick {
            match pick_index(pick, state.candidates().len()) {
                Some(index) => index,
                None => usage_error(
                    &format!(
                        "--pick {pick} is out of range: {} candidates found",
                        state.candidates().len()
                    ),
                    Some("Candidates are numbered from 1"),
                ),
            }
        } else if args.no_input {
            return finish(&state, &args.output);
        } else {
            match prompt_selection(&state).await {
                Some(index) => index,
                None => {
                    print_error(&ambiguous_error(state.candidates().len()));
                    return EXIT_AMBIGUOUS;
                }
            }
        };

        state = match controller.select_index(index).await {
            Ok(state) => state,
            Err(e) => usage_error(&e.to_string(), None),
        };
    }

    finish(&state, &args.output)
}

fn progress(quiet: bool, message: &str) {
    if !quiet {
        eprintln!("{message}");
    }
}

/// Convert a 1-based pick into a list index.
pub fn pick_index(pick: usize, count: usize) -> Option<usize> {
    (1..=count).contains(&pick).then(|| pick - 1)
}

/// Parse an operator's answer. `None` means the answer was not a valid pick.
pub fn parse_selection(input: &str, count: usize) -> Option<usize> {
    input
        .trim()
        .parse::<usize>()
        .ok()
        .and_then(|pick| pick_index(pick, count))
}

/// Ask on stderr/stdin which candidate to diagnose. Returns `None` when the
/// operator quits or stdin closes.
async fn prompt_selection(state: &ResolutionState) -> Option<usize> {
    let candidates = state.candidates();
    let mut stderr = io::stderr();
    let mut listing = format!("{}\n", state.status_message());
    for (position, candidate) in candidates.iter().enumerate() {
        listing.push_str(&candidate_entry(position + 1, candidate));
        listing.push('\n');
    }
    stderr.write_all(listing.as_bytes()).await.ok()?;

    let mut lines = BufReader::new(io::stdin()).lines();
    loop {
        let prompt = format!("Seleccione [1-{}] (q para salir): ", candidates.len());
        stderr.write_all(prompt.as_bytes()).await.ok()?;
        stderr.flush().await.ok()?;

        let line = lines.next_line().await.ok().flatten()?;
        if matches!(line.trim(), "q" | "Q") {
            return None;
        }
        if let Some(index) = parse_selection(&line, candidates.len()) {
            return Some(index);
        }
        tracing::debug!(input = %line.trim(), "invalid candidate selection");
    }
}

#[cfg(test)]
mod tests {
    use super::{parse_selection, pick_index};

    #[test]
    fn pick_index_is_one_based_and_bounded() {
        assert_eq!(pick_index(1, 2), Some(0));
        assert_eq!(pick_index(2, 2), Some(1));
        assert_eq!(pick_index(0, 2), None);
        assert_eq!(pick_index(3, 2), None);
    }

    #[test]
    fn parse_selection_trims_and_validates() {
        assert_eq!(parse_selection(" 2\n", 3), Some(1));
        assert_eq!(parse_selection("two", 3), None);
        assert_eq!(parse_selection("-1", 3), None);
        assert_eq!(parse_selection("", 3), None);
    }
}
