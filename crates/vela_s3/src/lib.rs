use aws_sdk_s3::Client;
use aws_sdk_s3::error::SdkError;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::ObjectCannedAcl;
use bytes::Bytes;
use futures::stream;
use tracing::{debug, error, instrument};
use vela_core::prelude::*;

/// Public URL of an object in a versioned bucket.
///
/// An empty revision (unversioned bucket) drops the query string.
pub fn object_url(region: &str, bucket: &str, key: &str, revision: &str) -> String {
    if revision.is_empty() {
        format!("https://s3.{region}.amazonaws.com/{bucket}/{key}")
    } else {
        format!("https://s3.{region}.amazonaws.com/{bucket}/{key}?versionId={revision}")
    }
}

#[derive(Clone)]
pub struct S3Store {
    client: Client,
    bucket: String,
    region: String,
}

impl S3Store {
    pub fn new(client: Client, bucket: impl Into<String>, region: impl Into<String>) -> Self {
        Self {
            client,
            bucket: bucket.into(),
            region: region.into(),
        }
    }
}

impl ObjectStore for S3Store {
    #[instrument(skip(self, data, opts), fields(bucket = %self.bucket, key = %key))]
    async fn put(&self, key: &str, data: Bytes, opts: PutOptions) -> Result<(), StoreError> {
        debug!("Uploading object to S3...");
        let mut req = self
            .client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .acl(ObjectCannedAcl::PublicRead)
            .content_type(&opts.content_type)
            .set_metadata(Some(opts.metadata))
            .body(ByteStream::from(data));
        if let Some(encoding) = &opts.content_encoding {
            req = req.content_encoding(encoding);
        }

        req.send().await.map_err(|e| {
            error!("Failed to upload object: {e:?}");
            StoreError::Generic(format!("S3 Upload Error: {e:?}"))
        })?;

        debug!("Upload successful");
        Ok(())
    }

    #[instrument(skip(self), fields(bucket = %self.bucket, key = %key))]
    async fn get(&self, key: &str) -> Result<StoredObject, StoreError> {
        debug!("Reading object from S3...");
        let res = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await;

        match res {
            Ok(output) => {
                let size = output.content_length().unwrap_or_default().max(0) as u64;
                let metadata = output.metadata().cloned().unwrap_or_default();
                let revision = output.version_id().unwrap_or_default().to_string();
                let data = output.body.collect().await.map_err(|e| {
                    error!("Failed to stream body: {:?}", e);
                    StoreError::Generic(format!("Failed to stream S3 body: {}", e))
                })?;
                let bytes = data.into_bytes();
                Ok(StoredObject {
                    size: if size > 0 { size } else { bytes.len() as u64 },
                    bytes,
                    metadata,
                    revision,
                })
            }
            Err(SdkError::ServiceError(err)) => {
                let inner = err.err();
                if inner.is_no_such_key() {
                    debug!("Object not found in S3");
                    Err(StoreError::NotFound(key.to_string()))
                } else {
                    error!("S3 Service Error during read: {:?}", err);
                    Err(StoreError::Generic(format!(
                        "S3 Service Error: {:?}",
                        inner
                    )))
                }
            }
            Err(e) => {
                error!("Unexpected S3 Error: {:?}", e);
                Err(StoreError::Generic(format!("S3 Error: {:?}", e)))
            }
        }
    }

    #[instrument(skip(self), fields(bucket = %self.bucket, prefix = %prefix))]
    async fn list(&self, prefix: &str) -> Result<KeyStream, StoreError> {
        let mut pages = self
            .client
            .list_objects_v2()
            .bucket(&self.bucket)
            .prefix(prefix)
            .into_paginator()
            .send();

        let mut keys = Vec::new();
        while let Some(page) = pages.next().await {
            let page = page.map_err(|e| {
                error!("S3 list error: {e:?}");
                StoreError::Generic(format!("S3 List Error: {e:?}"))
            })?;
            for object in page.contents() {
                if let Some(key) = object.key() {
                    keys.push(key.to_string());
                }
            }
        }
        debug!(count = keys.len(), "Listed objects");

        Ok(Box::pin(stream::iter(keys.into_iter().map(Ok))))
    }

    fn url(&self, key: &str, revision: &str) -> String {
        object_url(&self.region, &self.bucket, key, revision)
    }
}
