pub mod parser;

use crate::core::config::SourceConfig;
use crate::core::{Exchange, ExchangeSource, FetchError};
use async_trait::async_trait;
use futures::TryStreamExt;
use parser::ExchangeParser;
use std::time::Duration;
use tokio::io::AsyncBufReadExt;
use tokio_util::io::StreamReader;
use tracing::{debug, instrument};

/// Fetches the HNB exchange list over HTTP.
pub struct HnbProvider {
    url: String,
    client: reqwest::Client,
}

impl HnbProvider {
    /// The timeout bounds the whole request, body included.
    pub fn new(url: &str, timeout: Duration) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .user_agent("tecaj/1.0")
            .timeout(timeout)
            .build()
            .map_err(|source| FetchError::Request {
                url: url.to_string(),
                source,
            })?;

        Ok(HnbProvider {
            url: url.to_string(),
            client,
        })
    }

    pub fn from_config(config: &SourceConfig) -> Result<Self, FetchError> {
        Self::new(&config.url, config.timeout())
    }
}

#[async_trait]
impl ExchangeSource for HnbProvider {
    #[instrument(name = "HnbFetch", skip(self), fields(url = %self.url))]
    async fn fetch_exchange(&self) -> Result<Exchange, FetchError> {
        debug!("Requesting exchange list");

        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|source| FetchError::Request {
                url: self.url.clone(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: self.url.clone(),
                status,
            });
        }

        let body = Box::pin(response.bytes_stream().map_err(std::io::Error::other));
        let mut lines = StreamReader::new(body).lines();
        let mut parser = ExchangeParser::new();

        while let Some(line) = lines.next_line().await.map_err(|source| FetchError::Read {
            url: self.url.clone(),
            source,
        })? {
            parser.feed_line(&line)?;
        }

        let exchange = parser.finish()?;
        debug!(
            date = %exchange.date,
            currencies = exchange.rates.len(),
            "Parsed exchange list"
        );
        Ok(exchange)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const LIST_PATH: &str = "/tecajn/htecajn.htm";

    const FULL_LIST: &str = "
059240320172503201713
036AUD001       5,207988       5,223659       5,239330
124CAD001       5,119576       5,134981       5,150386
203CZK001       0,273458       0,274281       0,275104
208DKK001       0,993382       0,996371       0,999360
348HUF100       2,388187       2,395373       2,402559
392JPY100       6,161252       6,179791       6,198330
578NOK001       0,806093       0,808519       0,810945
752SEK001       0,775638       0,777972       0,780306
756CHF001       6,900694       6,921458       6,942222
826GBP001       8,539728       8,565424       8,591120
840USD001       6,839371       6,859951       6,880531
978EUR001       7,388573       7,410805       7,433037
985PLN001       1,730993       1,736202       1,741411
";

    // Helper function to create a mock server for the HNB exchange list
    async fn create_hnb_mock_server(body: &str, status_code: u16) -> MockServer {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path(LIST_PATH))
            .respond_with(ResponseTemplate::new(status_code).set_body_string(body))
            .mount(&mock_server)
            .await;
        mock_server
    }

    fn provider_for(server: &MockServer) -> HnbProvider {
        HnbProvider::new(
            &format!("{}{}", server.uri(), LIST_PATH),
            Duration::from_secs(10),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_successful_fetch() {
        let mock_server = create_hnb_mock_server(FULL_LIST, 200).await;
        let provider = provider_for(&mock_server);

        let exchange = provider.fetch_exchange().await.unwrap();

        assert_eq!(exchange.date.to_string(), "2017-03-25");
        assert_eq!(exchange.rates.len(), 13);
        assert_eq!(exchange.rate("CHF").unwrap().middle, dec!(6.921458));
        assert_eq!(exchange.rate("GBP").unwrap().sell, dec!(8.59112));
        assert_eq!(exchange.rate("JPY").unwrap().buy, dec!(0.06161252));
        assert_eq!(exchange.rate("HUF").unwrap().sell, dec!(0.02402559));
    }

    #[tokio::test]
    async fn test_error_status() {
        let mock_server = create_hnb_mock_server("Server Error", 500).await;
        let provider = provider_for(&mock_server);

        let err = provider.fetch_exchange().await.unwrap_err();
        match err {
            FetchError::Status { status, .. } => assert_eq!(status.as_u16(), 500),
            other => panic!("Expected status error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_malformed_payload() {
        let body = "059240320172503201713\n840USD001       6,839371\n";
        let mock_server = create_hnb_mock_server(body, 200).await;
        let provider = provider_for(&mock_server);

        let err = provider.fetch_exchange().await.unwrap_err();
        assert!(err.is_format(), "{err:?}");
        assert!(err.to_string().starts_with("Unknown exchange format on line 2"));
    }

    #[tokio::test]
    async fn test_timeout() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(LIST_PATH))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(FULL_LIST)
                    .set_delay(Duration::from_secs(5)),
            )
            .mount(&mock_server)
            .await;

        let provider = HnbProvider::new(
            &format!("{}{}", mock_server.uri(), LIST_PATH),
            Duration::from_millis(200),
        )
        .unwrap();

        let err = provider.fetch_exchange().await.unwrap_err();
        match err {
            FetchError::Request { source, .. } => assert!(source.is_timeout()),
            other => panic!("Expected request timeout, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_unreachable_remote() {
        // Nothing listens on the discard port locally
        let provider =
            HnbProvider::new("http://127.0.0.1:9/tecajn/htecajn.htm", Duration::from_secs(2))
                .unwrap();

        let err = provider.fetch_exchange().await.unwrap_err();
        assert!(matches!(err, FetchError::Request { .. }), "{err:?}");
        assert!(!err.is_format());
    }
}
