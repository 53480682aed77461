//! Ready-made interceptors.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::error::{Error, Result};
use crate::interceptor::{RequestInterceptor, ResponseInterceptor};
use crate::types::{RequestConfig, RequestOverride, ResponseMeta};

/// Resolve every request to its parsed body instead of the envelope.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnwrapData;

#[async_trait]
impl ResponseInterceptor for UnwrapData {
    async fn on_response(&self, data: &Value, _meta: &ResponseMeta) -> Result<Option<Value>> {
        Ok(Some(data.clone()))
    }
}

/// Older server contract: bodies shaped `{statusCode, data, usrMsg, errMsg}`.
///
/// Fails with [`Error::Application`] when the HTTP status is not 2xx or the
/// body's `statusCode` is 400 or above; otherwise resolves to
/// `{success: true, data, errMsg, statusCode, usrMsg}`.
#[derive(Debug, Clone, Copy, Default)]
pub struct LegacyEnvelope;

fn string_field(data: &Value, key: &str) -> Option<String> {
    data.get(key).and_then(Value::as_str).map(str::to_string)
}

#[async_trait]
impl ResponseInterceptor for LegacyEnvelope {
    async fn on_response(&self, data: &Value, meta: &ResponseMeta) -> Result<Option<Value>> {
        let status_code = data
            .get("statusCode")
            .and_then(Value::as_u64)
            .and_then(|code| u16::try_from(code).ok())
            .unwrap_or(meta.status);

        if !meta.is_success() || status_code >= 400 {
            let payload = data.get("data").filter(|d| !d.is_null()).cloned();
            return Err(Error::application(
                status_code,
                string_field(data, "usrMsg"),
                string_field(data, "errMsg"),
                payload,
            ));
        }

        Ok(Some(json!({
            "success": true,
            "data": data.get("data").cloned().unwrap_or(Value::Null),
            "errMsg": data.get("errMsg").cloned().unwrap_or(Value::Null),
            "statusCode": data.get("statusCode").cloned().unwrap_or(Value::Null),
            "usrMsg": data.get("usrMsg").cloned().unwrap_or(Value::Null),
        })))
    }
}

/// Bound each request by a transport timeout.
#[derive(Debug, Clone, Copy)]
pub struct Timeout(pub Duration);

#[async_trait]
impl RequestInterceptor for Timeout {
    async fn on_request(
        &self,
        _url: &str,
        config: &RequestConfig,
    ) -> Result<Option<RequestOverride>> {
        let mut config = config.clone();
        config.timeout = Some(self.0);
        Ok(Some(RequestOverride::config(config)))
    }
}
