//! Interactive API key setup.

use std::io::{BufRead, Write};

use anyhow::{bail, Result};
use tracing::info;

use crate::models::ConfigUpdate;
use crate::provider::ContentProvider;
use crate::store::Store;

/// Asks for a key until the provider accepts it, then saves it.
///
/// The stored key is offered as a masked default: an empty answer keeps it.
/// Leaving the key empty is accepted and saved as "not configured". Returns
/// whether a key is configured afterwards.
pub async fn run_key_setup<R: BufRead, W: Write>(
    input: &mut R,
    output: &mut W,
    store: &Store,
    provider: &dyn ContentProvider,
) -> Result<bool> {
    let existing = store.get_config().await?;
    let preview = existing.key_preview();

    let key = loop {
        if preview.is_empty() {
            write!(output, "Enter your {} API key: ", provider.name())?;
        } else {
            write!(output, "Enter your {} API key [{preview}]: ", provider.name())?;
        }
        output.flush()?;

        let mut answer = String::new();
        if input.read_line(&mut answer)? == 0 {
            bail!("Input ended before an API key was accepted");
        }
        let candidate = match answer.trim() {
            "" => existing.api_key.trim().to_string(),
            entered => entered.to_string(),
        };

        if candidate.is_empty() || provider.validate_key(&candidate).await {
            break candidate;
        }
        writeln!(output, "Invalid {} API key. Please try again.", provider.name())?;
    };

    store
        .save_config(ConfigUpdate {
            api_key: Some(key.clone()),
            ..Default::default()
        })
        .await?;

    if key.is_empty() {
        writeln!(output, "No API key saved. Run `cvgenx auth` again before generating.")?;
    } else {
        info!("Saved {} API key", provider.name());
        writeln!(output, "API key saved. You can now generate resumes and cover letters.")?;
    }
    Ok(!key.is_empty())
}
