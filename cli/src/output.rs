use beholder_core::error::{ErrorBody, codes};
use beholder_core::report::{self, ReportField, ReportLine, STANDARD_LAYOUT};
use beholder_core::status::{Health, PLACEHOLDER};
use beholder_core::{Candidate, DiagnosisRecord, Failure, Phase, ResolutionState};
use clap::Args;
use serde_json::json;

use crate::util::{
    EXIT_AMBIGUOUS, EXIT_CONNECTION, EXIT_DIAGNOSIS, EXIT_NO_MATCH, EXIT_OK, print_error,
    print_json,
};

#[derive(Args, Debug, Clone, Default)]
pub struct OutputArgs {
    /// Print JSON (record plus rendered fields) instead of the terminal view
    #[arg(long, conflicts_with = "report")]
    pub json: bool,

    /// Print only the plain-text report, ready to paste into a ticket
    #[arg(long)]
    pub report: bool,

    /// Report fields to show, in order (e.g. customer,session,onu-status)
    #[arg(long, value_delimiter = ',')]
    pub fields: Vec<ReportField>,
}

impl OutputArgs {
    pub fn layout(&self) -> Vec<ReportField> {
        if self.fields.is_empty() {
            STANDARD_LAYOUT.to_vec()
        } else {
            self.fields.clone()
        }
    }
}

pub fn exit_code(failure: Failure) -> i32 {
    match failure {
        Failure::NoMatch => EXIT_NO_MATCH,
        Failure::Diagnosis => EXIT_DIAGNOSIS,
        Failure::Connection => EXIT_CONNECTION,
    }
}

pub fn failure_error(failure: Failure) -> ErrorBody {
    let hint = match failure {
        Failure::NoMatch => "Refine the query: name, address, ID or PPPoE user.",
        Failure::Connection => {
            "Is the API reachable? Check BEHOLDER_API_URL; run with -v for details."
        }
        Failure::Diagnosis => "Retry the lookup; run with -v for details.",
    };
    ErrorBody::new(failure.code(), failure.message()).with_docs_hint(hint)
}

/// Render the final state of a flow and return the process exit code.
pub fn finish(state: &ResolutionState, output: &OutputArgs) -> i32 {
    match (state.phase(), state.result(), state.failure()) {
        (Phase::Resolved, Some(record), _) => {
            print_record(record, output);
            EXIT_OK
        }
        (_, _, Some(failure)) => {
            print_error(&failure_error(failure));
            exit_code(failure)
        }
        (Phase::Disambiguating, _, _) => {
            print_candidates(state.candidates(), output.json);
            print_error(&ambiguous_error(state.candidates().len()));
            EXIT_AMBIGUOUS
        }
        _ => EXIT_OK,
    }
}

/// Error body for a search that matched several subscribers and none was
/// picked.
pub fn ambiguous_error(count: usize) -> ErrorBody {
    ErrorBody::new(
        codes::AMBIGUOUS,
        format!("Se encontraron {count} coincidencias. Seleccione una:"),
    )
    .with_docs_hint("Pick one with --pick N, or run `beholder diagnose <username> --ip <node ip>`.")
}

pub fn print_record(record: &DiagnosisRecord, output: &OutputArgs) {
    let layout = output.layout();
    if output.json {
        print_json(&json!({
            "record": record,
            "fields": report::render(record, &layout),
        }));
    } else if output.report {
        print!("{}", report::format_report(record, &layout));
    } else {
        println!("Diagnóstico normalizado");
        for line in report::render(record, &layout) {
            println!("{}", view_line(&line));
        }
    }
}

/// Terminal line for the structured view, with a health marker on
/// classified fields.
pub fn view_line(line: &ReportLine) -> String {
    let label = format!("{}:", line.label);
    let marker = match line.health {
        Some(Health::Ok) => " [ok]",
        Some(Health::Error) => " [error]",
        None => "",
    };
    format!("  {label:<29}{}{marker}", line.value)
}

pub fn print_candidates(candidates: &[Candidate], as_json: bool) {
    if as_json {
        print_json(&json!({ "candidates": candidates }));
        return;
    }
    for (position, candidate) in candidates.iter().enumerate() {
        println!("{}", candidate_entry(position + 1, candidate));
    }
}

pub fn candidate_entry(number: usize, candidate: &Candidate) -> String {
    let name = candidate.name.as_deref().unwrap_or(PLACEHOLDER);
    let address = candidate.address.as_deref().unwrap_or(PLACEHOLDER);
    let node = candidate
        .node_ip
        .as_deref()
        .map(|ip| format!(" @ {ip}"))
        .unwrap_or_default();
    format!(
        "{number:>3}. {name} [{}]\n     usuario: {}{node}\n     domicilio: {address}",
        candidate.origin.label(),
        candidate.username
    )
}
