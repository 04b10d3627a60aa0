// Copyright (c) James Kassemi, SC, US. All rights reserved.
use std::env;

use async_trait::async_trait;
use aws_sdk_s3::{
    Client,
    config::{BehaviorVersion, Credentials, Region},
    error::{ProvideErrorMetadata, SdkError},
};
use bytes::Bytes;
use core_types::{RetryPolicy, config::S3Settings};
use log::debug;

use crate::{errors::SourceError, store::ObjectStore};

/// S3-backed store. Each request is wrapped in the configured retry policy;
/// missing objects fail immediately.
#[derive(Clone)]
pub struct S3ObjectStore {
    client: Client,
    retry: RetryPolicy,
}

impl S3ObjectStore {
    pub fn new(settings: &S3Settings, retry: RetryPolicy) -> Result<Self, SourceError> {
        Ok(Self {
            client: make_s3_client(settings)?,
            retry,
        })
    }

    pub fn from_client(client: Client, retry: RetryPolicy) -> Self {
        Self { client, retry }
    }
}

fn make_s3_client(settings: &S3Settings) -> Result<Client, SourceError> {
    let credentials = match (&settings.access_key_id, &settings.secret_access_key) {
        (Some(id), Some(secret)) => Credentials::new(id, secret, None, None, "exporter-config"),
        _ => {
            let id = env::var("AWS_ACCESS_KEY_ID").map_err(|_| {
                SourceError::Config("no s3 credentials configured and AWS_ACCESS_KEY_ID unset".into())
            })?;
            let secret = env::var("AWS_SECRET_ACCESS_KEY").map_err(|_| {
                SourceError::Config("AWS_SECRET_ACCESS_KEY unset".into())
            })?;
            let token = env::var("AWS_SESSION_TOKEN").ok();
            Credentials::new(id, secret, token, None, "exporter-env")
        }
    };
    let mut builder = aws_sdk_s3::Config::builder()
        .behavior_version(BehaviorVersion::latest())
        .region(Region::new(settings.region.clone()))
        .force_path_style(settings.force_path_style)
        .credentials_provider(credentials);
    if let Some(endpoint) = &settings.endpoint {
        builder = builder.endpoint_url(endpoint.clone());
    }
    Ok(Client::from_conf(builder.build()))
}

fn sdk_error<E, R>(err: &SdkError<E, R>) -> SourceError
where
    E: ProvideErrorMetadata + std::error::Error + 'static,
    R: std::fmt::Debug,
{
    match err.as_service_error() {
        Some(service) => SourceError::Sdk(format!(
            "{}: {}",
            service.code().unwrap_or("unknown"),
            service.message().unwrap_or("no message")
        )),
        None => SourceError::Sdk(err.to_string()),
    }
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    async fn get_object(&self, bucket: &str, key: &str) -> Result<Bytes, SourceError> {
        let resp = self
            .retry
            .retry_async_when(
                |_| async move {
                    self.client
                        .get_object()
                        .bucket(bucket)
                        .key(key)
                        .send()
                        .await
                },
                |err| {
                    !err.as_service_error()
                        .map(|service| service.is_no_such_key())
                        .unwrap_or(false)
                },
            )
            .await
            .map_err(|err| {
                if err
                    .as_service_error()
                    .map(|service| service.is_no_such_key())
                    .unwrap_or(false)
                {
                    SourceError::NotFound {
                        bucket: bucket.to_string(),
                        key: key.to_string(),
                    }
                } else {
                    sdk_error(&err)
                }
            })?;
        let body = resp
            .body
            .collect()
            .await
            .map_err(|err| SourceError::Sdk(format!("reading s3://{bucket}/{key}: {err}")))?;
        let bytes = body.into_bytes();
        debug!("fetched s3://{}/{} ({} bytes)", bucket, key, bytes.len());
        Ok(bytes)
    }

    async fn list_objects(&self, bucket: &str, prefix: &str) -> Result<Vec<String>, SourceError> {
        let mut keys = Vec::new();
        let mut continuation: Option<String> = None;
        loop {
            let token = continuation.clone();
            let resp = self
                .retry
                .retry_async(|_| {
                    let token = token.clone();
                    async move {
                        self.client
                            .list_objects_v2()
                            .bucket(bucket)
                            .prefix(prefix)
                            .set_continuation_token(token)
                            .send()
                            .await
                    }
                })
                .await
                .map_err(|err| sdk_error(&err))?;
            keys.extend(
                resp.contents()
                    .iter()
                    .filter_map(|obj| obj.key().map(str::to_string)),
            );
            match resp.next_continuation_token() {
                Some(next) if resp.is_truncated().unwrap_or(false) => {
                    continuation = Some(next.to_string());
                }
                _ => break,
            }
        }
        keys.sort();
        Ok(keys)
    }
}
