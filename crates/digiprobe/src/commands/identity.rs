//! Public IP / ISP lookup.

use digiprobe_core::{IdentityState, NetworkIdentity, RuntimeConfig};

use crate::cli::GlobalOpts;
use crate::error::CliError;
use crate::output;

fn detail(identity: &NetworkIdentity) -> String {
    let place = [&identity.city, &identity.region, &identity.country]
        .into_iter()
        .flatten()
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join(", ");
    output::detail_lines(&[
        ("IP", identity.ip.clone()),
        ("ISP", identity.isp.clone()),
        ("Location", if place.is_empty() { "-".into() } else { place }),
    ])
}

pub async fn handle(runtime: &RuntimeConfig, global: &GlobalOpts) -> Result<(), CliError> {
    let info = runtime.network_info()?;
    match info.refetch().await {
        IdentityState::Ready(identity) => {
            let out = output::render_single(&global.output, &identity, detail, |i| i.ip.clone())?;
            output::print_output(&out, global.quiet);
            Ok(())
        }
        IdentityState::Failed { message } => Err(CliError::IdentityUnavailable { message }),
        IdentityState::Loading => Err(CliError::OperationFailed {
            message: "identity lookup did not finish".into(),
        }),
    }
}
