//! PA-API 5.0 的 AWS Signature V4 簽章。
//!
//! 簽章內含 UTC 時間戳，只在短時間內有效，因此每次嘗試都要重新簽。

use crate::utils::error::{DiscountError, Result};
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256};

type HmacSha256 = Hmac<Sha256>;

const ALGORITHM: &str = "AWS4-HMAC-SHA256";
const SERVICE: &str = "ProductAdvertisingAPI";
const TARGET_PREFIX: &str = "com.amazon.paapi5.v1.ProductAdvertisingAPIv1";

#[derive(Debug, Clone)]
pub struct RequestSigner {
    access_key: String,
    secret_key: String,
    region: String,
}

/// 已簽章的標頭，包含 `Authorization`
#[derive(Debug, Clone)]
pub struct SignedHeaders {
    pub headers: Vec<(String, String)>,
    pub signature: String,
}

impl SignedHeaders {
    pub fn get(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

impl RequestSigner {
    pub fn new(access_key: &str, secret_key: &str, region: &str) -> Self {
        Self {
            access_key: access_key.to_string(),
            secret_key: secret_key.to_string(),
            region: region.to_string(),
        }
    }

    pub fn target_for(operation: &str) -> String {
        format!("{}.{}", TARGET_PREFIX, operation)
    }

    /// 對 POST 請求簽章
    pub fn sign(
        &self,
        host: &str,
        path: &str,
        operation: &str,
        payload: &str,
        now: DateTime<Utc>,
    ) -> Result<SignedHeaders> {
        let amz_date = now.format("%Y%m%dT%H%M%SZ").to_string();
        let datestamp = now.format("%Y%m%d").to_string();

        // 標頭名稱已是小寫且依字母排序
        let mut headers: Vec<(String, String)> = vec![
            ("content-encoding".to_string(), "amz-1.0".to_string()),
            (
                "content-type".to_string(),
                "application/json; charset=utf-8".to_string(),
            ),
            ("host".to_string(), host.to_string()),
            ("x-amz-date".to_string(), amz_date.clone()),
            ("x-amz-target".to_string(), Self::target_for(operation)),
        ];

        let canonical_headers: String = headers
            .iter()
            .map(|(key, value)| format!("{}:{}\n", key, value))
            .collect();
        let signed_headers = headers
            .iter()
            .map(|(key, _)| key.as_str())
            .collect::<Vec<_>>()
            .join(";");

        let canonical_request = [
            "POST",
            path,
            "",
            &canonical_headers,
            &signed_headers,
            &sha256_hex(payload.as_bytes()),
        ]
        .join("\n");

        let credential_scope = format!("{}/{}/{}/aws4_request", datestamp, self.region, SERVICE);
        let string_to_sign = [
            ALGORITHM,
            &amz_date,
            &credential_scope,
            &sha256_hex(canonical_request.as_bytes()),
        ]
        .join("\n");

        let mut signing_key = hmac_sha256(
            format!("AWS4{}", self.secret_key).as_bytes(),
            datestamp.as_bytes(),
        )?;
        for part in [self.region.as_str(), SERVICE, "aws4_request"] {
            signing_key = hmac_sha256(&signing_key, part.as_bytes())?;
        }
        let signature = hex::encode(hmac_sha256(&signing_key, string_to_sign.as_bytes())?);

        let authorization = format!(
            "{} Credential={}/{}, SignedHeaders={}, Signature={}",
            ALGORITHM, self.access_key, credential_scope, signed_headers, signature
        );
        headers.push(("Authorization".to_string(), authorization));

        Ok(SignedHeaders { headers, signature })
    }
}

fn sha256_hex(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}

fn hmac_sha256(key: &[u8], msg: &[u8]) -> Result<Vec<u8>> {
    let mut mac = HmacSha256::new_from_slice(key).map_err(|e| {
        DiscountError::InvalidConfigValueError {
            field: "PA_API_SECRET".to_string(),
            value: "<redacted>".to_string(),
            reason: format!("Invalid signing key: {}", e),
        }
    })?;
    mac.update(msg);
    Ok(mac.finalize().into_bytes().to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn fixed_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 15, 9, 30, 0).unwrap()
    }

    #[test]
    fn test_payload_hash() {
        assert_eq!(
            sha256_hex(br#"{"ItemIds":["B000TEST01"]}"#),
            "16cb36eaa3abbca9e9356b4ad96d6931f2ac6b937640e45af31d74d30a3c675a"
        );
    }

    #[test]
    fn test_known_signature() {
        let signer = RequestSigner::new("AKIDEXAMPLE", "test-secret", "us-west-2");
        let signed = signer
            .sign(
                "webservices.amazon.co.jp",
                "/paapi5/getitems",
                "GetItems",
                r#"{"ItemIds":["B000TEST01"]}"#,
                fixed_time(),
            )
            .unwrap();

        assert_eq!(
            signed.signature,
            "5edf804da8539339cdd3bed8af36e0ac306d32384e1027ed9e77caa7d0430ca9"
        );
        assert_eq!(
            signed.get("Authorization").unwrap(),
            "AWS4-HMAC-SHA256 Credential=AKIDEXAMPLE/20240115/us-west-2/ProductAdvertisingAPI/aws4_request, \
             SignedHeaders=content-encoding;content-type;host;x-amz-date;x-amz-target, \
             Signature=5edf804da8539339cdd3bed8af36e0ac306d32384e1027ed9e77caa7d0430ca9"
        );
        assert_eq!(signed.get("x-amz-date").unwrap(), "20240115T093000Z");
        assert_eq!(
            signed.get("x-amz-target").unwrap(),
            "com.amazon.paapi5.v1.ProductAdvertisingAPIv1.GetItems"
        );
    }

    #[test]
    fn test_signature_changes_with_time_and_payload() {
        let signer = RequestSigner::new("AKID", "secret", "us-west-2");
        let base = signer
            .sign("h", "/p", "SearchItems", "{}", fixed_time())
            .unwrap();
        let later = signer
            .sign(
                "h",
                "/p",
                "SearchItems",
                "{}",
                fixed_time() + chrono::Duration::seconds(1),
            )
            .unwrap();
        let other_payload = signer
            .sign("h", "/p", "SearchItems", "{\"a\":1}", fixed_time())
            .unwrap();

        assert_ne!(base.signature, later.signature);
        assert_ne!(base.signature, other_payload.signature);

        let again = signer
            .sign("h", "/p", "SearchItems", "{}", fixed_time())
            .unwrap();
        assert_eq!(base.signature, again.signature);
    }
}
