//! AppSync lookups: GraphQL API data sources.
//!
//! A data source is addressed by the id of its API plus its own name, so it
//! uses a composite key persisted as `<api-id>#<name>`.

use serde::{Deserialize, Serialize};

use crate::error::{KeyError, RemoteError};
use crate::finder::LookupKind;
use crate::key::{KeyShape, LookupKey};

/// Request for `GetDataSource`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetDataSourceInput {
    /// The GraphQL API id.
    pub api_id: String,
    /// The data source name.
    pub name: String,
}

/// Response of `GetDataSource`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetDataSourceOutput {
    /// The data source, if the service returned one.
    #[serde(default)]
    pub data_source: Option<DataSource>,
}

/// The type of a data source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DataSourceType {
    /// An AWS Lambda function.
    AwsLambda,
    /// An Amazon DynamoDB table.
    AmazonDynamodb,
    /// An Amazon Elasticsearch Service domain.
    AmazonElasticsearch,
    /// An HTTP endpoint.
    Http,
    /// A relational database.
    RelationalDatabase,
    /// A local resolver with no backing service.
    #[default]
    None,
}

/// An AppSync data source.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataSource {
    /// The data source ARN.
    #[serde(default)]
    pub data_source_arn: String,
    /// The data source name.
    pub name: String,
    /// Free-form description.
    #[serde(default)]
    pub description: Option<String>,
    /// The data source type.
    #[serde(rename = "type", default)]
    pub data_source_type: DataSourceType,
    /// The role AppSync assumes to reach the backing service.
    #[serde(default)]
    pub service_role_arn: Option<String>,
    /// DynamoDB settings.
    #[serde(default)]
    pub dynamodb_config: Option<DynamodbConfig>,
    /// Elasticsearch settings.
    #[serde(default)]
    pub elasticsearch_config: Option<ElasticsearchConfig>,
    /// HTTP settings.
    #[serde(default)]
    pub http_config: Option<HttpConfig>,
    /// Lambda settings.
    #[serde(default)]
    pub lambda_config: Option<LambdaConfig>,
}

/// DynamoDB data source settings.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DynamodbConfig {
    /// Table name.
    pub table_name: String,
    /// Table region.
    pub aws_region: String,
    /// Whether to call DynamoDB with the caller's credentials.
    #[serde(default)]
    pub use_caller_credentials: bool,
}

/// Elasticsearch data source settings.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElasticsearchConfig {
    /// Domain endpoint.
    pub endpoint: String,
    /// Domain region.
    pub aws_region: String,
}

/// HTTP data source settings.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct HttpConfig {
    /// Endpoint URL.
    pub endpoint: String,
}

/// Lambda data source settings.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LambdaConfig {
    /// Function ARN.
    pub lambda_function_arn: String,
}

/// The AppSync control-plane operations the lookups need.
#[async_trait::async_trait]
pub trait AppSyncApi: Send + Sync {
    /// Get one data source of an API.
    async fn get_data_source(
        &self,
        input: &GetDataSourceInput,
    ) -> Result<GetDataSourceOutput, RemoteError>;
}

/// Data source by API id and name.
#[derive(Debug, Clone, Copy, Default)]
pub struct DataSourceByApiIdAndName;

/// Kind name of [`DataSourceByApiIdAndName`].
pub const DATA_SOURCE_KIND: &str = "DataSource";

/// Error code AppSync returns for a missing data source.
pub const DATA_SOURCE_NOT_FOUND: &str = "NotFoundException";

#[async_trait::async_trait]
impl LookupKind for DataSourceByApiIdAndName {
    type Client = dyn AppSyncApi;
    type Request = GetDataSourceInput;
    type Item = DataSource;

    fn name(&self) -> &str {
        DATA_SOURCE_KIND
    }

    fn resource_type(&self) -> &str {
        "aws_appsync_datasource"
    }

    fn key_shape(&self) -> KeyShape {
        KeyShape::Composite
    }

    fn not_found_code(&self) -> &str {
        DATA_SOURCE_NOT_FOUND
    }

    fn build_request(&self, key: &LookupKey) -> Result<Self::Request, KeyError> {
        let container = key.container().ok_or(KeyError::ShapeMismatch {
            expected: KeyShape::Composite,
            found: KeyShape::Simple,
        })?;
        Ok(GetDataSourceInput {
            api_id: container.to_string(),
            name: key.name_part().to_string(),
        })
    }

    async fn invoke(
        &self,
        client: &Self::Client,
        request: &Self::Request,
    ) -> Result<Vec<Option<DataSource>>, RemoteError> {
        let output = client.get_data_source(request).await?;
        Ok(vec![output.data_source])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LookupError;
    use crate::finder::{not_found_code, Finder, LookupContext};
    use crate::testing::{assert_empty_result, assert_not_found, StubControlPlane};
    use serde_json::json;
    use std::sync::Arc;

    fn finder(stub: StubControlPlane) -> Finder<dyn AppSyncApi> {
        let client: Arc<dyn AppSyncApi> = Arc::new(stub);
        Finder::new(client)
    }

    #[test]
    fn test_not_found_code_is_registered() {
        let kind = DataSourceByApiIdAndName;
        assert_eq!(kind.not_found_code(), "NotFoundException");
        assert_eq!(not_found_code(kind.name()), Some(kind.not_found_code()));
    }

    #[test]
    fn test_build_request_from_identity() {
        let key = LookupKey::decode_composite("api123#mySource").unwrap();
        let request = DataSourceByApiIdAndName.build_request(&key).unwrap();
        assert_eq!(
            request,
            GetDataSourceInput {
                api_id: "api123".to_string(),
                name: "mySource".to_string(),
            }
        );
    }

    #[test]
    fn test_data_source_deserializes_service_json() {
        let output: GetDataSourceOutput = serde_json::from_value(json!({
            "dataSource": {
                "dataSourceArn": "arn:aws:appsync:us-west-2:123456789012:apis/api123/datasources/mySource",
                "name": "mySource",
                "type": "AMAZON_DYNAMODB",
                "serviceRoleArn": "arn:aws:iam::123456789012:role/appsync",
                "dynamodbConfig": {
                    "tableName": "users",
                    "awsRegion": "us-west-2",
                    "useCallerCredentials": true
                }
            }
        }))
        .unwrap();

        let ds = output.data_source.unwrap();
        assert_eq!(ds.data_source_type, DataSourceType::AmazonDynamodb);
        let dynamodb = ds.dynamodb_config.unwrap();
        assert_eq!(dynamodb.aws_region, "us-west-2");
        assert!(dynamodb.use_caller_credentials);
        assert!(ds.http_config.is_none());
    }

    #[tokio::test]
    async fn test_data_source_lookup() {
        let stub = StubControlPlane::new()
            .with_items(
                "api123#mySource",
                vec![json!({"name": "mySource", "type": "NONE"})],
            )
            .with_error(
                "api123#gone",
                RemoteError::new("NotFoundException", "No data source found"),
            )
            .with_items("api123#blank", vec![serde_json::Value::Null]);
        let finder = finder(stub);
        let ctx = LookupContext::new();

        let ds = finder
            .find(
                &DataSourceByApiIdAndName,
                &LookupKey::decode_composite("api123#mySource").unwrap(),
                &ctx,
            )
            .await
            .unwrap();
        assert_eq!(ds.name, "mySource");
        assert_eq!(ds.data_source_type, DataSourceType::None);

        let outcome = finder
            .lookup(
                &DataSourceByApiIdAndName,
                &LookupKey::decode_composite("api123#gone").unwrap(),
                &ctx,
            )
            .await
            .unwrap();
        assert_not_found(&outcome);

        let outcome = finder
            .lookup(
                &DataSourceByApiIdAndName,
                &LookupKey::decode_composite("api123#blank").unwrap(),
                &ctx,
            )
            .await
            .unwrap();
        assert_empty_result(&outcome);
    }

    #[tokio::test]
    async fn test_simple_key_is_rejected() {
        let finder = finder(StubControlPlane::new());
        let err = finder
            .find(
                &DataSourceByApiIdAndName,
                &LookupKey::name("mySource").unwrap(),
                &LookupContext::new(),
            )
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            LookupError::MalformedKey(KeyError::ShapeMismatch { .. })
        ));
    }
}
