// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Request body encoders

use reqwest::header::HeaderValue;
use reqwest::multipart::{Form, Part};
use reqwest::RequestBuilder;

use super::request::{ApiRequest, BodyKind, Param};
use super::{headers, JSON_CONTENT_TYPE};
use crate::error::Result;

/// Attach the body for `request` according to its [`BodyKind`]
pub(crate) async fn apply<R>(builder: RequestBuilder, request: &ApiRequest<R>) -> Result<RequestBuilder> {
    match request.body_kind {
        BodyKind::Multipart => Ok(builder.multipart(multipart_form(request).await?)),
        BodyKind::Json => {
            let json = json_body(request)?;
            tracing::debug!(body = %json, "Request body");
            Ok(builder
                .header(headers::CONTENT_TYPE, HeaderValue::from_static(JSON_CONTENT_TYPE))
                .body(json))
        }
        BodyKind::Form => Ok(builder.form(&request.string_params())),
    }
}

/// Serialize the whole parameter map as one JSON object
pub(crate) fn json_body<R>(request: &ApiRequest<R>) -> Result<String> {
    Ok(serde_json::to_string(&request.params)?)
}

/// Build a multipart form; byte and file values become file parts
pub(crate) async fn multipart_form<R>(request: &ApiRequest<R>) -> Result<Form> {
    let mut form = Form::new();

    for (name, value) in &request.params {
        let content = match value {
            Param::Bytes(bytes) => bytes.to_vec(),
            Param::File(path) => tokio::fs::read(path).await?,
            other => {
                form = form.text(name.clone(), other.to_string());
                continue;
            }
        };

        let mut part = Part::bytes(content).mime_str(&request.content_type)?;
        if let Some(ref file_name) = request.file_name {
            part = part.file_name(file_name.clone());
        }
        form = form.part(name.clone(), part);
    }

    Ok(form)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::BaseResponse;

    #[test]
    fn test_json_body() {
        let req = ApiRequest::<BaseResponse>::post("https://wx.qq.com/webwxsendmsg")
            .param("Scene", 0)
            .param("BaseRequest", serde_json::json!({"Uin": 7, "Sid": "s"}))
            .json_body();

        let body: serde_json::Value = serde_json::from_str(&json_body(&req).unwrap()).unwrap();
        assert_eq!(body["Scene"], 0);
        assert_eq!(body["BaseRequest"]["Sid"], "s");
    }

    #[tokio::test]
    async fn test_multipart_missing_file() {
        let req = ApiRequest::<BaseResponse>::post("https://wx.qq.com/upload")
            .param("filename", std::path::PathBuf::from("/nonexistent/wxdispatch/file.bin"))
            .multipart("file.bin", "application/octet-stream");

        let err = multipart_form(&req).await.unwrap_err();
        assert!(matches!(err, crate::Error::Io(_)));
    }

    #[tokio::test]
    async fn test_multipart_invalid_content_type() {
        let req = ApiRequest::<BaseResponse>::post("https://wx.qq.com/upload")
            .param("filename", vec![1u8, 2, 3])
            .multipart("file.bin", "not a mime type");

        assert!(multipart_form(&req).await.is_err());
    }
}
