pub mod endpoint;
pub mod error;
pub mod response;

use crate::model;
pub use error::Error;
use model::{Field, FieldMap, Timezone};
use response::getjp::GetJp;
use serde::Deserialize;
use serde_json::Value;

use std::collections::BTreeMap;

pub fn api(host: String, timezone: Timezone) -> Result<model::Api, Error> {
    let client = reqwest::ClientBuilder::new()
        .build()
        .or(Err(Error::InternalError))?;

    Ok(api_with_client(host, timezone, client))
}

/// Like `api()`, with a caller-configured HTTP client (timeouts, proxy).
pub fn api_with_client(host: String, timezone: Timezone, client: reqwest::Client) -> model::Api {
    model::Api {
        host: host.trim_end_matches('/').to_owned(),
        timezone,
        client,
    }
}

/// Map transport failures and non-2xx device responses to Error
fn map_api_err(error: reqwest::Error) -> Error {
    match error.status() {
        Some(http::StatusCode::NOT_FOUND) => Error::DeviceUnreachable(format!(
            "device does not serve {} (is the JSON interface enabled?): {}",
            endpoint::GETJP,
            error
        )),
        Some(status) => Error::DeviceUnreachable(format!("device responded {}", status)),
        None => Error::DeviceUnreachable(error.to_string()),
    }
}

async fn post(api: &model::Api, endpoint: &endpoint::Endpoint) -> Result<Value, Error> {
    let url = format!("{}{}", api.host, endpoint);

    log::debug!("POST {}", url);

    let text = api
        .client
        .post(url)
        .json(&endpoint::GETJP_QUERY)
        .send()
        .await
        .and_then(reqwest::Response::error_for_status)
        .map_err(map_api_err)?
        .text()
        .await
        .map_err(map_api_err)?;

    log::trace!("endpoint: {}, response_text: {}", endpoint, text);

    serde_json::from_str::<Value>(&text).map_err(|e| Error::InvalidResponse(text, e.to_string()))
}

/// Remap a raw `getjp` response to named fields. Codes outside the known set are skipped.
pub fn remap(value: Value) -> Result<FieldMap, Error> {
    let response = GetJp::deserialize(&value)
        .map_err(|e| Error::InvalidResponse(value.to_string(), e.to_string()))?;

    let mut fields = BTreeMap::new();
    for (code, value) in response.group.readings {
        match Field::from_code(&code) {
            Some(field) => {
                fields.insert(field, value);
            }
            None => log::trace!("ignoring unknown field code {}: {}", code, value),
        }
    }

    FieldMap::new(fields)
}

/// Query current readings from the device.
pub async fn fetch(api: &model::Api) -> Result<FieldMap, Error> {
    post(api, endpoint::GETJP).await.and_then(remap)
}
