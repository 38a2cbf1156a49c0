use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Url};
use tracing::{debug, warn};

use super::gateway::{BulkDispatchReply, BulkDispatchRequest, GatewayError, PortalGateway, PortalReply};
use crate::config::PortalConfig;
use crate::workflows::matching::MatchPair;
use crate::workflows::ranking::{RankSubmission, RankingActor};
use crate::workflows::rows::EntityRef;

/// `reqwest`-backed gateway. Every request carries the configured timeout; the portal
/// itself never enforced one.
#[derive(Debug, Clone)]
pub struct HttpPortalGateway {
    client: Client,
    base_url: Url,
}

impl HttpPortalGateway {
    pub fn new(config: &PortalConfig) -> Result<Self, GatewayError> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|err| GatewayError::Transport(err.to_string()))?;
        Self::with_client(client, &config.base_url)
    }

    pub fn with_client(client: Client, base_url: &str) -> Result<Self, GatewayError> {
        let base_url = Url::parse(base_url)
            .map_err(|err| GatewayError::InvalidBaseUrl(format!("{base_url}: {err}")))?;
        if base_url.cannot_be_a_base() {
            return Err(GatewayError::InvalidBaseUrl(base_url.to_string()));
        }
        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Appends each segment percent-encoded, so ids cannot introduce `/`, `?` or `#`.
    fn url<S: AsRef<str>>(&self, segments: &[S]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty()
                .extend(segments.iter().map(|segment| segment.as_ref()));
        }
        url
    }

    async fn execute(
        &self,
        request: RequestBuilder,
        expect_json: bool,
    ) -> Result<PortalReply, GatewayError> {
        let response = request.send().await.map_err(map_transport)?;
        let status = response.status();
        let body = response.text().await.map_err(map_transport)?;
        let trimmed = body.trim();

        let parsed = if trimmed.is_empty() {
            Some(PortalReply::default())
        } else {
            serde_json::from_str::<PortalReply>(trimmed).ok()
        };

        if !status.is_success() {
            let message = parsed
                .and_then(|reply| reply.error.or(reply.message))
                .unwrap_or_else(|| {
                    if trimmed.is_empty() {
                        status
                            .canonical_reason()
                            .unwrap_or("request failed")
                            .to_string()
                    } else {
                        trimmed.to_string()
                    }
                });
            warn!(status = status.as_u16(), %message, "portal request failed");
            return Err(GatewayError::Status {
                status: status.as_u16(),
                message,
            });
        }

        let reply = match parsed {
            Some(reply) => reply,
            None if expect_json => {
                return Err(GatewayError::Decode(format!(
                    "expected a JSON body, got {} bytes of something else",
                    trimmed.len()
                )))
            }
            None => PortalReply::default(),
        };

        if let Some(error) = reply.error.clone() {
            warn!(%error, "portal returned an error inside a successful response");
            return Err(GatewayError::Rejected(error));
        }

        Ok(reply)
    }
}

fn map_transport(err: reqwest::Error) -> GatewayError {
    if err.is_timeout() {
        GatewayError::Transport(format!("request timed out: {err}"))
    } else {
        GatewayError::Transport(err.to_string())
    }
}

#[async_trait]
impl PortalGateway for HttpPortalGateway {
    async fn submit_ranking(&self, submission: &RankSubmission) -> Result<(), GatewayError> {
        let ranks = submission.ranks_field();
        let request = match &submission.actor {
            RankingActor::Student(student) => self
                .client
                .post(self.url(&["students", "rank_preferences", student.0.as_str()])),
            RankingActor::Opportunity(opportunity) => self
                .client
                .post(self.url(&["employers", "rank_students"]))
                .query(&[("opportunity_id", opportunity.0.as_str())]),
        };

        debug!(
            actor = submission.actor.label(),
            ranked = submission.targets.len(),
            "submitting ranking"
        );
        self.execute(request.form(&[("ranks", ranks)]), false)
            .await
            .map(|_| ())
    }

    async fn send_match_notification(&self, pair: &MatchPair) -> Result<String, GatewayError> {
        let request = self.client.post(self.url(&["user", "send_match_email"])).form(&[
            ("student", pair.student.0.as_str()),
            ("opportunity", pair.opportunity.0.as_str()),
        ]);

        let reply = self.execute(request, true).await?;
        Ok(reply
            .message
            .unwrap_or_else(|| "Match email sent".to_string()))
    }

    async fn send_bulk_notifications(
        &self,
        pairs: &[MatchPair],
    ) -> Result<BulkDispatchReply, GatewayError> {
        let body = BulkDispatchRequest {
            students: pairs.to_vec(),
        };
        let request = self
            .client
            .post(self.url(&["user", "send_match_emails"]))
            .json(&body);

        let reply = self.execute(request, true).await?;
        Ok(BulkDispatchReply {
            message: reply
                .message
                .unwrap_or_else(|| "Match emails sent".to_string()),
            results: reply.results,
        })
    }

    async fn delete_entity(&self, entity: &EntityRef) -> Result<(), GatewayError> {
        let route = entity.delete_route();
        let mut request = self.client.delete(self.url(route.segments.as_slice()));
        if let Some((key, value)) = &route.query {
            request = request.query(&[(*key, value.as_str())]);
        }

        self.execute(request, false).await.map(|_| ())
    }
}
