//! Transport seam between the coordinator and the portal's REST endpoints.

mod gateway;
mod http;

pub use gateway::{
    BulkDispatchReply, BulkDispatchRequest, GatewayError, PairResult, PortalGateway, PortalReply,
};
pub use http::HttpPortalGateway;

#[cfg(test)]
pub(crate) mod testing;
