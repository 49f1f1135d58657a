//! Service configuration, read from the environment (`.env` is loaded first
//! by the binary).

use anyhow::{bail, Result};

use crate::media::CloudinaryConfig;
use crate::payments::VnPayConfig;

const DEFAULT_PORT: u16 = 8083;
const DEFAULT_MAX_CONNECTIONS: u32 = 10;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub port: u16,
    /// Postgres URL; without it documents are kept in memory.
    pub database_url: Option<String>,
    pub max_connections: u32,
    pub nats_url: Option<String>,
    /// Without it images are kept in memory.
    pub cloudinary: Option<CloudinaryConfig>,
    /// Without it the payment routes answer 503.
    pub vnpay: Option<VnPayConfig>,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> { Self::from_lookup(|name| std::env::var(name).ok()) }

    /// Builds the configuration from any variable source. Empty values count
    /// as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let var = |name: &str| lookup(name).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let port = match var("PORT") {
            Some(p) => p.parse().map_err(|_| anyhow::anyhow!("PORT must be a port number, got {p}"))?,
            None => DEFAULT_PORT,
        };
        let max_connections = var("DATABASE_MAX_CONNECTIONS").and_then(|n| n.parse().ok()).unwrap_or(DEFAULT_MAX_CONNECTIONS);

        let cloudinary = match (var("CLOUDINARY_CLOUD_NAME"), var("CLOUDINARY_UPLOAD_PRESET")) {
            (None, None) => None,
            (Some(cloud_name), Some(upload_preset)) => Some(CloudinaryConfig {
                cloud_name,
                upload_preset,
                api_key: var("CLOUDINARY_API_KEY"),
                api_secret: var("CLOUDINARY_API_SECRET"),
            }),
            (Some(_), None) => bail!("CLOUDINARY_UPLOAD_PRESET must be set when CLOUDINARY_CLOUD_NAME is set"),
            (None, Some(_)) => bail!("CLOUDINARY_CLOUD_NAME must be set when CLOUDINARY_UPLOAD_PRESET is set"),
        };

        let vnpay = match (var("VNPAY_TMN_CODE"), var("VNPAY_HASH_SECRET")) {
            (None, None) => None,
            (Some(tmn_code), Some(hash_secret)) => Some(VnPayConfig {
                tmn_code,
                hash_secret,
                url: var("VNPAY_URL").unwrap_or_else(|| "https://sandbox.vnpayment.vn/paymentv2/vpcpay.html".into()),
                return_url: var("VNPAY_RETURN_URL").unwrap_or_else(|| "http://localhost:3000/vnpay-return".into()),
            }),
            _ => bail!("VNPAY_TMN_CODE and VNPAY_HASH_SECRET must be set together"),
        };

        Ok(Self { port, database_url: var("DATABASE_URL"), max_connections, nats_url: var("NATS_URL"), cloudinary, vnpay })
    }
}
