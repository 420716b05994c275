use serde_json::{json, Value};

pub const PAGE_SIZE: u32 = 100;

pub const ALL_ASSETS: &str = r#"
    query GetAllAssets($filter: AssetFilter!, $after: String, $first: Int) {
        allAssets(filter: $filter, after: $after, first: $first) {
            _cursor
            id
            name
            createdAt
            createdBy {
                id
                email
            }
            group {
                id
                name
            }
            ctx {
                asset
                businessUnits
                products
            }
        }
    }
"#;

pub fn all_assets_variables(asset_id: Option<&str>, business_unit_id: Option<&str>) -> Value {
    let mut filter = serde_json::Map::new();
    if let Some(id) = asset_id {
        filter.insert("id".to_string(), json!(id));
    }
    if let Some(id) = business_unit_id {
        filter.insert("group".to_string(), json!({ "id": id }));
    }

    json!({
        "filter": filter,
        "after": null,
        "first": PAGE_SIZE,
    })
}

pub const CREATE_ASSET_VERSION: &str = r#"
    mutation BapiCreateAssetVersion($assetVersionName: String!, $assetId: ID!, $createdByUserId: ID) {
        createNewAssetVersionOnAsset(assetVersionName: $assetVersionName, assetId: $assetId, createdByUserId: $createdByUserId) {
            id
            assetVersion {
                id
            }
        }
    }
"#;

pub const CREATE_ARTIFACT: &str = r#"
    mutation CreateArtifactMutation($input: CreateArtifactInput!) {
        createArtifact(input: $input) {
            id
            name
            assetVersion {
                id
                name
                asset {
                    id
                    name
                }
            }
            createdBy {
                id
                email
            }
            ctx {
                asset
                products
                businessUnits
            }
        }
    }
"#;

pub const CREATE_TEST: &str = r#"
    mutation CreateTestMutation($input: CreateTestInput!) {
        createTest(input: $input) {
            id
            name
            artifactUnderTest {
                id
                name
                assetVersion {
                    id
                    name
                    asset {
                        id
                        name
                        dependentProducts {
                            id
                            name
                        }
                    }
                }
            }
            createdBy {
                id
                email
            }
            ctx {
                asset
                products
                businessUnits
            }
            uploadMethod
        }
    }
"#;

pub const START_MULTIPART_UPLOAD: &str = r#"
    mutation Start($testId: ID!) {
        startMultipartUploadV2(testId: $testId) {
            uploadId
            key
        }
    }
"#;

pub const GENERATE_UPLOAD_PART_URL: &str = r#"
    mutation GenerateUploadPartUrl($partNumber: Int!, $uploadId: ID!, $uploadKey: String!) {
        generateUploadPartUrlV2(partNumber: $partNumber, uploadId: $uploadId, uploadKey: $uploadKey) {
            key
            uploadUrl
        }
    }
"#;

pub const COMPLETE_MULTIPART_UPLOAD: &str = r#"
    mutation CompleteMultipartUpload($partData: [PartInput!]!, $uploadId: ID!, $uploadKey: String!) {
        completeMultipartUploadV2(partData: $partData, uploadId: $uploadId, uploadKey: $uploadKey) {
            key
        }
    }
"#;

pub const LAUNCH_BINARY_UPLOAD: &str = r#"
    mutation LaunchBinaryUploadProcessing($key: String!, $testId: ID!) {
        launchBinaryUploadProcessing(key: $key, testId: $testId) {
            key
        }
    }
"#;

pub const LAUNCH_BINARY_UPLOAD_WITH_OPTIONS: &str = r#"
    mutation LaunchBinaryUploadProcessing($key: String!, $testId: ID!, $configurationOptions: [BinaryAnalysisConfigurationOption]) {
        launchBinaryUploadProcessing(key: $key, testId: $testId, configurationOptions: $configurationOptions) {
            key
        }
    }
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_assets_variables_filters() {
        assert_eq!(
            all_assets_variables(Some("123"), Some("bu-1")),
            json!({
                "filter": { "id": "123", "group": { "id": "bu-1" } },
                "after": null,
                "first": 100
            })
        );
        assert_eq!(all_assets_variables(None, None)["filter"], json!({}));
    }
}
