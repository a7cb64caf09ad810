/*
 *  weather/http.rs
 *
 *  wxstation - weather at a glance
 *  (c) 2020-26 Stuart Hunter
 *
 *  Shared HTTP client and JSON fetch for the providers
 *
 *  This program is free software: you can redistribute it and/or modify
 *  it under the terms of the GNU General Public License as published by
 *  the Free Software Foundation, either version 3 of the License, or
 *  (at your option) any later version.
 *
 *  This program is distributed in the hope that it will be useful,
 *  but WITHOUT ANY WARRANTY; without even the implied warranty of
 *  MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 *  GNU General Public License for more details.
 *
 *  See <http://www.gnu.org/licenses/> to get a copy of the GNU General
 *  Public License.
 *
 */

use std::io::Read;

use flate2::read::GzDecoder;
use log::{error, info};
use reqwest::{Client, header};
use serde_json::Value;

use super::WeatherApiError;

const VERSION: &str = concat!("wxstation v", env!("CARGO_PKG_VERSION"));

/// Client with the headers every provider request carries. No timeout or retry:
/// a failed request surfaces immediately and aborts the render.
pub fn build_client() -> Result<Client, WeatherApiError> {
    let mut headers = header::HeaderMap::new();
    headers.insert("User-Agent", header::HeaderValue::from_static(VERSION));
    headers.insert("Accept", header::HeaderValue::from_static("application/json"));
    headers.insert("Accept-Encoding", header::HeaderValue::from_static("deflate, gzip"));
    headers.insert("Connection", header::HeaderValue::from_static("close"));

    Ok(Client::builder().default_headers(headers).build()?)
}

/// GET `url` and decode the body as JSON. `what` names the request in logs so the
/// URL, which carries the API key, never does.
pub async fn fetch_json(client: &Client, url: &str, what: &str) -> Result<Value, WeatherApiError> {
    info!("Fetching {}", what);
    let response = client.get(url).send().await.map_err(|e| {
        error!("Fetching {} failed: {}", what, e);
        WeatherApiError::Http(e.without_url())
    })?;

    let status = response.status();
    if !status.is_success() {
        error!("Fetching {} returned {}", what, status);
        return Err(WeatherApiError::Status { what: what.to_string(), status: status.as_u16() });
    }

    let raw = response.bytes().await?;
    Ok(serde_json::from_str(&decode_body(&raw))?)
}

/// Bodies may arrive gzipped since we advertise it; fall back to plain text.
fn decode_body(raw: &[u8]) -> String {
    let mut decoder = GzDecoder::new(raw);
    let mut decoded = String::new();
    match decoder.read_to_string(&mut decoded) {
        Ok(_) => decoded,
        Err(_) => String::from_utf8_lossy(raw).to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::Compression;
    use flate2::write::GzEncoder;
    use std::io::Write;

    #[test]
    fn test_decode_plain_body() {
        assert_eq!(decode_body(br#"{"a":1}"#), r#"{"a":1}"#);
    }

    #[test]
    fn test_decode_gzip_body() {
        let mut enc = GzEncoder::new(Vec::new(), Compression::default());
        enc.write_all(br#"{"a":1}"#).unwrap();
        let gz = enc.finish().unwrap();
        assert_eq!(decode_body(&gz), r#"{"a":1}"#);
    }

    #[tokio::test]
    async fn test_fetch_json_maps_http_status() {
        use wiremock::matchers::method;
        use wiremock::{Mock, MockServer, ResponseTemplate};

        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let client = build_client().unwrap();
        let err = fetch_json(&client, &server.uri(), "current weather").await.unwrap_err();
        assert!(matches!(err, WeatherApiError::Status { status: 401, .. }));
    }
}
