//! VNPay bank-redirect payments
//!
//! The field set, ordering and signing are fixed by the provider: parameters
//! sorted by key, joined as `key=value` with `&`, signed with HMAC-SHA512 and
//! hex-encoded. Outgoing URLs sign the percent-encoded values; callbacks are
//! verified over the raw values.

use chrono::{DateTime, Duration, FixedOffset, Utc};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha512;
use std::collections::BTreeMap;
use thiserror::Error;

type HmacSha512 = Hmac<Sha512>;

const VERSION: &str = "2.1.0";
const EXPIRY_MINUTES: i64 = 15;
const DEFAULT_IP: &str = "127.0.0.1";
/// Provider timestamps are Vietnam local time (GMT+7).
const PROVIDER_OFFSET_SECS: i32 = 7 * 3600;

#[derive(Clone, Debug, Deserialize)]
pub struct VnPayConfig {
    pub tmn_code: String,
    pub hash_secret: String,
    pub url: String,
    pub return_url: String,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentOrder {
    /// Amount in VND; the provider expects it multiplied by 100.
    pub amount: u64,
    pub order_id: String,
    pub order_info: String,
    #[serde(default)]
    pub ip_addr: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CallbackOutcome {
    Success {
        transaction_no: Option<String>,
        order_id: Option<String>,
        amount: u64,
        bank_code: Option<String>,
        pay_date: Option<String>,
    },
    Declined { response_code: String, message: &'static str },
    InvalidSignature,
}

#[derive(Error, Debug)]
pub enum PaymentError {
    #[error("Invalid signing key")]
    InvalidKey,

    #[error("Amount {0} is too large for the provider")]
    AmountOutOfRange(u64),
}

fn sign(data: &str, secret: &str) -> Result<String, PaymentError> {
    let mut mac = HmacSha512::new_from_slice(secret.as_bytes()).map_err(|_| PaymentError::InvalidKey)?;
    mac.update(data.as_bytes());
    Ok(hex::encode(mac.finalize().into_bytes()))
}

fn constant_time_eq(a: &str, b: &str) -> bool {
    if a.len() != b.len() { return false; }
    let mut res = 0u8;
    for (x, y) in a.as_bytes().iter().zip(b.as_bytes()) { res |= x ^ y; }
    res == 0
}

/// Percent-encoding with the unreserved set `A-Z a-z 0-9 - _ . ! ~ * ' ( )`.
pub fn encode_component(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for byte in value.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9'
            | b'-' | b'_' | b'.' | b'!' | b'~' | b'*' | b'\'' | b'(' | b')' => out.push(byte as char),
            _ => out.push_str(&format!("%{byte:02X}")),
        }
    }
    out
}

fn provider_time(at: DateTime<Utc>) -> String {
    match FixedOffset::east_opt(PROVIDER_OFFSET_SECS) {
        Some(offset) => at.with_timezone(&offset).format("%Y%m%d%H%M%S").to_string(),
        None => at.format("%Y%m%d%H%M%S").to_string(),
    }
}

/// Builds the signed redirect URL for an order.
pub fn build_payment_url(config: &VnPayConfig, order: &PaymentOrder, now: DateTime<Utc>) -> Result<String, PaymentError> {
    let amount = order.amount.checked_mul(100).ok_or(PaymentError::AmountOutOfRange(order.amount))?;
    let params: BTreeMap<&str, String> = BTreeMap::from([
        ("vnp_Version", VERSION.to_string()),
        ("vnp_Command", "pay".to_string()),
        ("vnp_TmnCode", config.tmn_code.clone()),
        ("vnp_Locale", "vn".to_string()),
        ("vnp_CurrCode", "VND".to_string()),
        ("vnp_TxnRef", order.order_id.clone()),
        ("vnp_OrderInfo", order.order_info.clone()),
        ("vnp_OrderType", "other".to_string()),
        ("vnp_Amount", amount.to_string()),
        ("vnp_ReturnUrl", config.return_url.clone()),
        ("vnp_IpAddr", order.ip_addr.clone().filter(|ip| !ip.is_empty()).unwrap_or_else(|| DEFAULT_IP.to_string())),
        ("vnp_CreateDate", provider_time(now)),
        ("vnp_ExpireDate", provider_time(now + Duration::minutes(EXPIRY_MINUTES))),
    ]);

    let query = params
        .iter()
        .map(|(key, value)| format!("{key}={}", encode_component(value)))
        .collect::<Vec<_>>()
        .join("&");
    let signature = sign(&query, &config.hash_secret)?;
    Ok(format!("{}?{query}&vnp_SecureHash={signature}", config.url))
}

/// Verifies a return/callback query and classifies the transaction.
pub fn verify_callback(config: &VnPayConfig, params: &BTreeMap<String, String>) -> Result<CallbackOutcome, PaymentError> {
    let Some(secure_hash) = params.get("vnp_SecureHash") else {
        return Ok(CallbackOutcome::InvalidSignature);
    };
    let sign_data = params
        .iter()
        .filter(|(key, _)| key.as_str() != "vnp_SecureHash" && key.as_str() != "vnp_SecureHashType")
        .map(|(key, value)| format!("{key}={value}"))
        .collect::<Vec<_>>()
        .join("&");

    let expected = sign(&sign_data, &config.hash_secret)?;
    if !constant_time_eq(&expected, secure_hash) {
        return Ok(CallbackOutcome::InvalidSignature);
    }

    let response_code = params.get("vnp_ResponseCode").cloned().unwrap_or_default();
    if response_code != "00" {
        return Ok(CallbackOutcome::Declined { message: response_message(&response_code), response_code });
    }
    Ok(CallbackOutcome::Success {
        transaction_no: params.get("vnp_TransactionNo").cloned(),
        order_id: params.get("vnp_TxnRef").cloned(),
        amount: params.get("vnp_Amount").and_then(|a| a.parse::<u64>().ok()).unwrap_or(0) / 100,
        bank_code: params.get("vnp_BankCode").cloned(),
        pay_date: params.get("vnp_PayDate").cloned(),
    })
}

/// Provider response codes, in the provider's wording.
pub fn response_message(code: &str) -> &'static str {
    match code {
        "00" => "Giao dịch thành công",
        "07" => "Trừ tiền thành công. Giao dịch bị nghi ngờ (liên quan tới lừa đảo, giao dịch bất thường).",
        "09" => "Giao dịch không thành công do: Thẻ/Tài khoản của khách hàng chưa đăng ký dịch vụ InternetBanking tại ngân hàng.",
        "10" => "Giao dịch không thành công do: Khách hàng xác thực thông tin thẻ/tài khoản không đúng quá 3 lần",
        "11" => "Giao dịch không thành công do: Đã hết hạn chờ thanh toán. Xin quý khách vui lòng thực hiện lại giao dịch.",
        "12" => "Giao dịch không thành công do: Thẻ/Tài khoản của khách hàng bị khóa.",
        "13" => "Giao dịch không thành công do Quý khách nhập sai mật khẩu xác thực giao dịch (OTP). Xin quý khách vui lòng thực hiện lại giao dịch.",
        "24" => "Giao dịch không thành công do: Khách hàng hủy giao dịch",
        "51" => "Giao dịch không thành công do: Tài khoản của quý khách không đủ số dư để thực hiện giao dịch.",
        "65" => "Giao dịch không thành công do: Tài khoản của Quý khách đã vượt quá hạn mức giao dịch trong ngày.",
        "75" => "Ngân hàng thanh toán đang bảo trì.",
        "79" => "Giao dịch không thành công do: KH nhập sai mật khẩu thanh toán quá số lần quy định. Xin quý khách vui lòng thực hiện lại giao dịch",
        "99" => "Các lỗi khác (lỗi còn lại, không có trong danh sách mã lỗi đã liệt kê)",
        _ => "Lỗi không xác định",
    }
}
