//! Bucket-level operations served by the emulation layer.

/// All supported bucket operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum S3Operation {
    /// `HEAD /{bucket}`.
    HeadBucket,
    /// `PUT /{bucket}`.
    CreateBucket,
    /// `DELETE /{bucket}`, including segment container teardown.
    DeleteBucket,
    /// `GET /{bucket}` without `list-type=2` or `versions`.
    ListObjects,
    /// `GET /{bucket}?list-type=2`.
    ListObjectsV2,
    /// `GET /{bucket}?versions`.
    ListObjectVersions,
    /// `POST /{bucket}` (browser form upload, not supported).
    PostBucket,
    /// `OPTIONS /{bucket}` CORS preflight.
    OptionsBucket,
}

impl S3Operation {
    /// Returns the AWS operation name string.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::HeadBucket => "HeadBucket",
            Self::CreateBucket => "CreateBucket",
            Self::DeleteBucket => "DeleteBucket",
            Self::ListObjects => "ListObjects",
            Self::ListObjectsV2 => "ListObjectsV2",
            Self::ListObjectVersions => "ListObjectVersions",
            Self::PostBucket => "PostBucket",
            Self::OptionsBucket => "OptionsBucket",
        }
    }

    /// Parse an operation from its AWS name.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "HeadBucket" => Some(Self::HeadBucket),
            "CreateBucket" => Some(Self::CreateBucket),
            "DeleteBucket" => Some(Self::DeleteBucket),
            "ListObjects" => Some(Self::ListObjects),
            "ListObjectsV2" => Some(Self::ListObjectsV2),
            "ListObjectVersions" => Some(Self::ListObjectVersions),
            "PostBucket" => Some(Self::PostBucket),
            "OptionsBucket" => Some(Self::OptionsBucket),
            _ => None,
        }
    }

    /// Whether this operation is one of the three listing variants.
    #[must_use]
    pub fn is_listing(&self) -> bool {
        matches!(
            self,
            Self::ListObjects | Self::ListObjectsV2 | Self::ListObjectVersions
        )
    }
}

impl std::fmt::Display for S3Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_should_round_trip_operation_names() {
        for op in [
            S3Operation::HeadBucket,
            S3Operation::CreateBucket,
            S3Operation::DeleteBucket,
            S3Operation::ListObjects,
            S3Operation::ListObjectsV2,
            S3Operation::ListObjectVersions,
            S3Operation::PostBucket,
            S3Operation::OptionsBucket,
        ] {
            assert_eq!(S3Operation::from_name(op.as_str()), Some(op));
        }
        assert_eq!(S3Operation::from_name("GetObject"), None);
    }

    #[test]
    fn test_should_flag_listing_operations() {
        assert!(S3Operation::ListObjectVersions.is_listing());
        assert!(!S3Operation::HeadBucket.is_listing());
    }
}
