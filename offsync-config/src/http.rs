//! HTTP client construction for the network transport.
//!
//! The client carries the only deadlines in the system: strategies do not
//! impose timeouts of their own, so a hung request fails here and then
//! follows the connectivity-failure path.

use crate::config::HttpConfig;

/// Parameters for building the transport's HTTP client.
#[derive(Debug)]
pub struct HttpClientParams<'a> {
    pub timeout: u64,
    pub connect_timeout: u64,
    pub user_agent: &'a str,
}

impl<'a> HttpClientParams<'a> {
    pub fn from_config(config: &'a HttpConfig) -> Self {
        Self {
            timeout: config.timeout,
            connect_timeout: config.connect_timeout,
            user_agent: &config.user_agent,
        }
    }
}

/// Builds a reqwest client with TLS, timeout and user-agent settings.
pub fn build_http_client(
    params: HttpClientParams,
) -> Result<reqwest::Client, reqwest::Error> {
    reqwest::ClientBuilder::new()
        .use_rustls_tls()
        .timeout(std::time::Duration::from_secs(params.timeout))
        .connect_timeout(std::time::Duration::from_secs(params.connect_timeout))
        .user_agent(params.user_agent)
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_client() {
        let client = build_http_client(HttpClientParams {
            timeout: 10,
            connect_timeout: 5,
            user_agent: "hello",
        });
        assert!(client.is_ok());
    }

    #[test]
    fn params_from_config() {
        let config = HttpConfig {
            timeout: 15,
            connect_timeout: 5,
            user_agent: "finance-app/2.0".to_string(),
        };
        let params = HttpClientParams::from_config(&config);
        assert_eq!(params.timeout, 15);
        assert_eq!(params.connect_timeout, 5);
        assert_eq!(params.user_agent, "finance-app/2.0");
    }
}
