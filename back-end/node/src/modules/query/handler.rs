//! Server side of the query protocol.

use super::local_search::LocalSearch;
use super::messages::{QueryFrame, QueryResponse};
use tracing::{info, warn};

pub const DECODE_FAILURE: &str = "Failed to decode request";

/// Build the response for one inbound frame.
///
/// Never fails: every outcome becomes a well-formed [`QueryResponse`].
pub async fn answer(frame: QueryFrame, search: &dyn LocalSearch) -> QueryResponse {
    let request = match frame {
        QueryFrame::Request(request) => request,
        QueryFrame::Undecodable { reason } => {
            warn!(reason = %reason, "Rejecting undecodable query");
            return QueryResponse::failure(DECODE_FAILURE);
        }
    };

    match search.search(&request).await {
        Ok(result) => {
            info!(query_id = %request.query_id, "Query answered from local search");
            QueryResponse::success(result)
        }
        Err(e) => {
            warn!(query_id = %request.query_id, error = %e, "Local search failed");
            QueryResponse::failure(format!("Failed to process query: {e}"))
        }
    }
}
