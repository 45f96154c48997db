#![forbid(unsafe_code)]

//! Share links: graph state carried in the `data` query parameter.

use linkpad_core::{Editor, GraphState};
use linkpad_transfer::{
    DecompressionFallback, TOKEN_QUERY_PARAM, TransferDecoder, TransferEncoder, TransferError,
};
use url::Url;

/// `base` with its `data` parameter set to the token for `state`.
///
/// Other query parameters are kept in order; an existing `data` is replaced.
pub fn share_url(base: &Url, state: &GraphState, encoder: &TransferEncoder) -> Url {
    let token = encoder.encode(state);
    let kept: Vec<(String, String)> = base
        .query_pairs()
        .filter(|(name, _)| name != TOKEN_QUERY_PARAM)
        .map(|(name, value)| (name.into_owned(), value.into_owned()))
        .collect();

    let mut url = base.clone();
    url.query_pairs_mut()
        .clear()
        .extend_pairs(kept)
        .append_pair(TOKEN_QUERY_PARAM, &token);
    url
}

/// The share token in `url`, if any.
pub fn token_from_url(url: &Url) -> Option<String> {
    url.query_pairs()
        .find(|(name, _)| name == TOKEN_QUERY_PARAM)
        .map(|(_, value)| value.into_owned())
}

/// Restore the editor from a share link.
///
/// Returns `Ok(false)` when `url` carries no token. On error the editor is
/// left as it was and the error is returned so the page can surface it.
pub async fn restore_from_url<F: DecompressionFallback>(
    url: &Url,
    decoder: &TransferDecoder<F>,
    editor: &mut Editor,
) -> Result<bool, TransferError> {
    let Some(token) = token_from_url(url) else {
        return Ok(false);
    };
    match decoder.decode(&token).await {
        Ok(state) => {
            tracing::debug!(nodes = state.nodes.len(), "restored state from share link");
            editor.replace_state(state);
            Ok(true)
        }
        Err(err) => {
            tracing::warn!(error = %err, "share link could not be restored, keeping current state");
            Err(err)
        }
    }
}
