// src/core/parsers/nameserver.rs

use tracing::{debug, warn};

use crate::core::models::{CommandResult, NameserverStatus, ZoneTransferStatus};

const TRANSFER_FAILED: &str = "Transfer failed";
const UNREACHABLE: &str = "no servers could be reached";

/// Reads one `dig axfr` output. `None` means no failure phrase was found.
pub fn classify_axfr_output(output: &str) -> Option<ZoneTransferStatus> {
    if output.contains(UNREACHABLE) {
        Some(ZoneTransferStatus::Unreachable)
    } else if output.contains(TRANSFER_FAILED) {
        Some(ZoneTransferStatus::Refused)
    } else {
        None
    }
}

/// The nameserver a dig command queried, taken from its `@server` argument.
fn queried_server(result: &CommandResult) -> Option<&str> {
    result.command.args.iter().find_map(|a| a.strip_prefix('@'))
}

/// Builds the zone-transfer status map for `nameservers`.
///
/// Each nameserver is judged only on the output of the dig run that queried
/// it. A nameserver is left out of the map, meaning the transfer went
/// through, only when its dig run exited cleanly without a failure phrase.
/// Transfers that never ran, failed to run, or exited non-zero without a
/// recognizable phrase count as unreachable.
pub fn parse_nameserver_status(nameservers: &[String], results: &[CommandResult]) -> NameserverStatus {
    let mut statuses = NameserverStatus::new();

    for ns in nameservers {
        let attempt = results
            .iter()
            .find(|r| queried_server(r).is_some_and(|s| s.eq_ignore_ascii_case(ns)));

        let status = match attempt {
            None => {
                warn!(nameserver = %ns, "No zone transfer attempt found for nameserver.");
                Some(ZoneTransferStatus::Unreachable)
            }
            Some(r) => match (&r.failure, classify_axfr_output(&r.output)) {
                (_, Some(status)) => Some(status),
                (None, None) => None,
                (Some(failure), None) => {
                    debug!(nameserver = %ns, %failure, "Zone transfer attempt failed without a verdict.");
                    Some(ZoneTransferStatus::Unreachable)
                }
            },
        };

        match status {
            Some(status) => {
                statuses.insert(ns.clone(), status);
            }
            None => warn!(nameserver = %ns, "Nameserver allowed a zone transfer."),
        }
    }
    statuses
}
