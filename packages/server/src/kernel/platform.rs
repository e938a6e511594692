// Platform credential validation
//
// Validates store credentials against the e-commerce platform's admin API
// once during onboarding, before any job starts.

use anyhow::{Context, Result};
use async_trait::async_trait;

use super::BasePlatformValidator;

/// Supported e-commerce platforms.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    Shopify,
    WooCommerce,
}

impl Platform {
    /// Parse a platform name from an onboarding payload. Unknown names are a
    /// validation error at the boundary, so this returns Option.
    pub fn parse(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "shopify" => Some(Platform::Shopify),
            "woocommerce" => Some(Platform::WooCommerce),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Shopify => "shopify",
            Platform::WooCommerce => "woocommerce",
        }
    }
}

fn credential_str<'a>(credentials: &'a serde_json::Value, field: &str) -> Result<&'a str> {
    credentials
        .get(field)
        .and_then(|v| v.as_str())
        .with_context(|| format!("credentials are missing '{}'", field))
}

/// Validator that calls each platform's admin API over HTTP
pub struct HttpPlatformValidator {
    client: reqwest::Client,
}

impl HttpPlatformValidator {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }
}

impl Default for HttpPlatformValidator {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BasePlatformValidator for HttpPlatformValidator {
    async fn validate(&self, platform: &str, credentials: &serde_json::Value) -> Result<bool> {
        let platform =
            Platform::parse(platform).with_context(|| format!("unknown platform: {}", platform))?;

        match platform {
            Platform::Shopify => {
                let shop_domain = credential_str(credentials, "shop_domain")?;
                let access_token = credential_str(credentials, "access_token")?;

                let response = self
                    .client
                    .get(format!("https://{}/admin/api/2024-01/shop.json", shop_domain))
                    .header("X-Shopify-Access-Token", access_token)
                    .send()
                    .await
                    .context("Failed to reach Shopify admin API")?;

                Ok(response.status().is_success())
            }
            Platform::WooCommerce => {
                let site_url = credential_str(credentials, "site_url")?;
                let consumer_key = credential_str(credentials, "consumer_key")?;
                let consumer_secret = credential_str(credentials, "consumer_secret")?;

                let response = self
                    .client
                    .get(format!(
                        "{}/wp-json/wc/v3/system_status",
                        site_url.trim_end_matches('/')
                    ))
                    .basic_auth(consumer_key, Some(consumer_secret))
                    .send()
                    .await
                    .context("Failed to reach WooCommerce API")?;

                Ok(response.status().is_success())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_known_platforms() {
        assert_eq!(Platform::parse("shopify"), Some(Platform::Shopify));
        assert_eq!(Platform::parse("Shopify"), Some(Platform::Shopify));
        assert_eq!(Platform::parse("woocommerce"), Some(Platform::WooCommerce));
    }

    #[test]
    fn parse_unknown_platform_is_none() {
        assert_eq!(Platform::parse("magento"), None);
        assert_eq!(Platform::parse(""), None);
    }

    #[test]
    fn credential_str_reports_missing_field() {
        let creds = serde_json::json!({"shop_domain": "x.myshopify.com"});
        assert!(credential_str(&creds, "shop_domain").is_ok());
        let err = credential_str(&creds, "access_token").unwrap_err();
        assert!(err.to_string().contains("access_token"));
    }
}
