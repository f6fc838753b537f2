//! IPFS Cluster REST API client

use std::time::Duration;

use anyhow::{bail, Context, Result};
use reqwest::multipart::{Form, Part};
use reqwest::StatusCode;
use serde::Deserialize;
use tracing::debug;

use super::ContentStore;

/// Connection settings for an IPFS Cluster proxy
#[derive(Debug, Clone)]
pub struct IpfsClusterConfig {
    pub url: String,
    pub username: Option<String>,
    pub password: Option<String>,
}

/// CID as returned by the cluster API, either plain or `{"/": cid}`
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Cid {
    Plain(String),
    Link {
        #[serde(rename = "/")]
        link: String,
    },
}

#[derive(Debug, Deserialize)]
struct AddedOutput {
    cid: Cid,
}

pub struct IpfsClusterClient {
    http: reqwest::Client,
    config: IpfsClusterConfig,
}

impl IpfsClusterClient {
    pub fn new(config: IpfsClusterConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .context("Failed to create HTTP client")?;
        Ok(Self { http, config })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.config.url.trim_end_matches('/'), path)
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.config.username {
            Some(user) => request.basic_auth(user, self.config.password.as_ref()),
            None => request,
        }
    }
}

#[async_trait::async_trait]
impl ContentStore for IpfsClusterClient {
    async fn add(&self, bytes: Vec<u8>, content_type: &str) -> Result<String> {
        let part = Part::bytes(bytes)
            .file_name("blob")
            .mime_str(content_type)
            .with_context(|| format!("invalid content type `{content_type}`"))?;
        let form = Form::new().part("file", part);

        let response = self
            .authorize(self.http.post(self.endpoint("add?stream-channels=false")))
            .multipart(form)
            .send()
            .await
            .context("Failed to reach IPFS cluster")?;

        if !response.status().is_success() {
            bail!("IPFS cluster add returned status {}", response.status());
        }

        let added: Vec<AddedOutput> = response
            .json()
            .await
            .context("Failed to parse IPFS cluster add response")?;

        let cid = match added.into_iter().last().map(|out| out.cid) {
            Some(Cid::Plain(cid)) | Some(Cid::Link { link: cid }) => cid,
            None => bail!("IPFS cluster add returned no CID"),
        };
        debug!(%cid, content_type, "added blob");
        Ok(cid)
    }

    async fn remove(&self, reference: &str) -> Result<()> {
        let response = self
            .authorize(self.http.delete(self.endpoint(&format!("pins/{reference}"))))
            .send()
            .await
            .context("Failed to reach IPFS cluster")?;

        match response.status() {
            status if status.is_success() => Ok(()),
            StatusCode::NOT_FOUND => {
                debug!(cid = reference, "blob already unpinned");
                Ok(())
            }
            status => bail!("IPFS cluster unpin of {reference} returned status {status}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(url: &str) -> IpfsClusterClient {
        IpfsClusterClient::new(IpfsClusterConfig {
            url: url.to_string(),
            username: None,
            password: None,
        })
        .unwrap()
    }

    #[test]
    fn test_endpoint_joins_paths() {
        assert_eq!(client("http://127.0.0.1:9094/").endpoint("pins/bafy"), "http://127.0.0.1:9094/pins/bafy");
        assert_eq!(client("http://cluster").endpoint("add"), "http://cluster/add");
    }

    #[test]
    fn test_parse_add_output_shapes() {
        let plain: Vec<AddedOutput> =
            serde_json::from_str(r#"[{"name": "blob", "cid": "bafyplain", "size": 12}]"#).unwrap();
        assert!(matches!(&plain[0].cid, Cid::Plain(cid) if cid == "bafyplain"));

        let linked: Vec<AddedOutput> =
            serde_json::from_str(r#"[{"name": "blob", "cid": {"/": "Qmlinked"}}]"#).unwrap();
        assert!(matches!(&linked[0].cid, Cid::Link { link } if link == "Qmlinked"));
    }
}
