//! Final expansion pass over a fully merged store.

use super::properties::Properties;
use crate::error::ConfigResult;
use tracing::trace;

/// Rewrite every value through [`Properties::set`] so all `${...}`
/// placeholders are replaced by literal text.
///
/// Must run after every layer is merged: references resolve against the whole
/// store, wherever the referenced key was defined. The first failure is
/// returned and the caller must discard the store.
pub fn expand_all(props: &mut Properties) -> ConfigResult<()> {
    let keys: Vec<String> = props.keys().map(str::to_string).collect();
    for key in keys {
        let Some(raw) = props.get(&key).map(str::to_string) else {
            continue;
        };
        if !raw.contains("${") {
            continue;
        }
        props.set(key.as_str(), &raw)?;
        trace!(key = %key, "Expanded value");
    }
    Ok(())
}
