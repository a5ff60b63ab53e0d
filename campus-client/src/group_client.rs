use campus_api::*;
use reqwest::{Client, Method, RequestBuilder, Response, Url};
use serde::de::DeserializeOwned;

use crate::{ClientConfig, ClientError};

/// HTTP client for the `/api/groups` endpoints.
///
/// Only serializes parameters and decodes responses. Failed requests are
/// never retried.
#[derive(Debug, Clone)]
pub struct GroupClient {
    http: Client,
    base_url: Url,
    token: Option<String>,
}

impl GroupClient {
    pub fn new(config: ClientConfig) -> Result<Self, ClientError> {
        let base_url = Url::parse(&config.base_url)
            .map_err(|e| ClientError::InvalidBaseUrl(format!("{}: {}", config.base_url, e)))?;

        if base_url.cannot_be_a_base() {
            return Err(ClientError::InvalidBaseUrl(config.base_url));
        }

        Ok(Self {
            http: Client::new(),
            base_url,
            token: config.token,
        })
    }

    /// `{base}/api/groups/{segments..}` with every segment percent-encoded.
    pub fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(["api", "groups"]).extend(segments);
        }
        url
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        log::debug!("{} {}", method, url);

        let builder = self.http.request(method, url);
        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn send(&self, builder: RequestBuilder) -> Result<Response, ClientError> {
        let response = builder.send().await?;
        let status = response.status();

        if status.is_success() {
            return Ok(response);
        }

        let body = response.bytes().await.unwrap_or_default();
        let error = ClientError::from_response(status.as_u16(), &body);
        log::warn!("request failed with {}: {}", status, error);

        Err(error)
    }

    async fn read<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T, ClientError> {
        let body = self.send(builder).await?.bytes().await?;

        Ok(serde_json::from_slice(&body)?)
    }

    pub async fn search_groups(
        &self,
        query: &str,
        group_type: GroupType,
        options: &SearchOptions,
    ) -> Result<Vec<Group>, ClientError> {
        let url = self.endpoint(&[group_type.as_str(), "search"]);
        let builder = self
            .request(Method::GET, url)
            .query(&SearchParams::new(query, options));

        self.read(builder).await
    }

    pub async fn list_by_category(
        &self,
        group_type: GroupType,
        category: &str,
        options: &PageOptions,
    ) -> Result<Vec<Group>, ClientError> {
        let url = self.endpoint(&[group_type.as_str(), "category", category]);
        let builder = self
            .request(Method::GET, url)
            .query(&PageParams::from(options));

        self.read(builder).await
    }

    pub async fn get_popular_groups(
        &self,
        group_type: GroupType,
        limit: Option<u32>,
    ) -> Result<Vec<Group>, ClientError> {
        let params = PopularParams {
            limit: Some(limit.unwrap_or(DEFAULT_LIMIT)),
        };

        let url = self.endpoint(&[group_type.as_str(), "popular"]);
        self.read(self.request(Method::GET, url).query(&params)).await
    }

    pub async fn get_categories(&self, group_type: GroupType) -> Result<Vec<String>, ClientError> {
        let url = self.endpoint(&[group_type.as_str(), "categories"]);

        self.read(self.request(Method::GET, url)).await
    }

    pub async fn join_group(
        &self,
        group_id: &str,
        group_type: GroupType,
    ) -> Result<(), ClientError> {
        let url = self.endpoint(&[group_type.as_str(), group_id, "join"]);
        self.send(self.request(Method::POST, url)).await?;

        Ok(())
    }

    pub async fn create_group(
        &self,
        group_type: GroupType,
        request: &CreateGroupRequest,
    ) -> Result<Group, ClientError> {
        let url = self.endpoint(&[group_type.as_str()]);

        self.read(self.request(Method::POST, url).json(request)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(base_url: &str) -> GroupClient {
        GroupClient::new(ClientConfig {
            base_url: base_url.to_string(),
            token: None,
        })
        .unwrap()
    }

    #[test]
    fn test_endpoint_encodes_segments() {
        let client = client("http://localhost:3000/");

        assert_eq!(
            client
                .endpoint(&["classroom", "category", "arts & crafts/2"])
                .as_str(),
            "http://localhost:3000/api/groups/classroom/category/arts%20&%20crafts%2F2"
        );
    }

    #[test]
    fn test_endpoint_keeps_base_path() {
        let client = client("http://localhost:3000/campus");

        assert_eq!(
            client.endpoint(&["community", "popular"]).as_str(),
            "http://localhost:3000/campus/api/groups/community/popular"
        );
    }

    #[test]
    fn test_invalid_base_url_is_rejected() {
        for base_url in ["not a url", "mailto:someone@example.com"] {
            let result = GroupClient::new(ClientConfig {
                base_url: base_url.to_string(),
                token: None,
            });

            assert!(matches!(result, Err(ClientError::InvalidBaseUrl(_))));
        }
    }
}
